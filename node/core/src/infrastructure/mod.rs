// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure Layer
//!
//! Concrete implementations of the domain contracts:
//!
//! | Module | Implements |
//! |--------|------------|
//! | [`crypto`] | `EnvelopeCodec` (RSA-OAEP + AES-256-GCM) |
//! | [`identity_store`] | `IdentityRepository` backed by PEM files |
//! | [`storage`] | `FileStore` over a local sandbox directory |

pub mod crypto;
pub mod identity_store;
pub mod storage;
