// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! filenode Rust SDK
//!
//! The panel side of the node protocol: learn the node key, pair, then send
//! sealed file operations and open the sealed replies.

pub mod client;
pub mod types;

pub use client::PanelClient;
pub use filenode_core::domain::protocol::Reply;
pub use types::*;
