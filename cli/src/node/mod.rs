// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Node runtime: configuration resolution and the HTTP server.

pub mod overrides;
pub mod server;

pub use overrides::NodeOverrides;
pub use server::start_node;
