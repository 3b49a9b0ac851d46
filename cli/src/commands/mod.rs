// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the filenode CLI

pub mod config;
pub mod identity;

pub use self::config::ConfigCommand;
pub use self::identity::IdentityCommand;
