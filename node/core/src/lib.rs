// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `filenode-core`
//!
//! Pairing protocol, sealed request/response envelopes and the sandboxed file
//! operations that ride on them.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | identity, envelope, protocol replies, path sanitizer, storage traits, node config |
//! | [`application`] | Application | `PairingService`, `FileOperationService` |
//! | [`infrastructure`] | Infrastructure | RSA/AES envelope codec, file-backed identity store, local file store |
//! | [`presentation`] | Presentation | axum router exposing the node HTTP API |

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
