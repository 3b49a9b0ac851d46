// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain Layer
//!
//! Types and contracts shared by every other layer. Nothing in here touches the
//! network.

pub mod envelope;
pub mod identity;
pub mod node_config;
pub mod path_sanitizer;
pub mod protocol;
pub mod storage;
