// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Node Identity & Pairing Record
//!
//! The node owns one keypair for its whole lifetime and is bound to at most
//! one controller ("panel") public key. The binding is set once by a
//! successful pairing and never replaced by a different key.
//!
//! | Type | Role |
//! |------|------|
//! | [`NodeIdentity`] | node keypair, created on first start |
//! | [`PairingState`] | `Unpaired` or `Paired(controller key)` |
//! | [`IdentityRepository`] | persistence contract, implemented by `FileIdentityStore` |

use crate::domain::envelope::{CodecError, PublicKeyPem};
use std::path::PathBuf;
use thiserror::Error;

pub use crate::domain::envelope::NodeIdentity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingState {
    Unpaired,
    Paired(PublicKeyPem),
}

impl PairingState {
    pub fn is_paired(&self) -> bool {
        matches!(self, PairingState::Paired(_))
    }

    pub fn controller_key(&self) -> Option<&PublicKeyPem> {
        match self {
            PairingState::Paired(key) => Some(key),
            PairingState::Unpaired => None,
        }
    }
}

impl From<Option<PublicKeyPem>> for PairingState {
    fn from(key: Option<PublicKeyPem>) -> Self {
        key.map(PairingState::Paired).unwrap_or(PairingState::Unpaired)
    }
}

/// Result of a check-and-set on the pairing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    /// No controller was bound; the presented key is now persisted.
    Bound,
    /// The presented key is already the bound controller key.
    AlreadyBound,
    /// A different controller is bound; nothing was written.
    Conflict,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Failed to read key material {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write key material {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt key material in {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Persistence contract for the node keypair and the pairing record.
///
/// `bind_pairing` must be atomic with respect to other calls: the decision
/// between `Bound`, `AlreadyBound` and `Conflict` and the write that follows a
/// `Bound` happen under one exclusive guard.
pub trait IdentityRepository: Send + Sync {
    fn identity(&self) -> &NodeIdentity;

    fn load_pairing(&self) -> Option<PublicKeyPem>;

    fn bind_pairing(&self, controller_key: &PublicKeyPem) -> Result<BindOutcome, IdentityError>;

    fn pairing_state(&self) -> PairingState {
        PairingState::from(self.load_pairing())
    }
}
