// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`filenode-core`)
//!
//! HTTP surface that translates panel requests into application service
//! calls. Envelope bodies are read leniently here; everything else is
//! delegated to `crate::application`.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | Landing page, pairing, file operations, health |

pub mod api;

pub use api::{app, AppState};
