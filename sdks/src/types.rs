// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use filenode_core::domain::envelope::{CodecError, PublicKeyPem};
use thiserror::Error;

/// What the node landing page revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Landing {
    /// Node is waiting for a panel; this is its public key
    Unpaired { node_key: PublicKeyPem },
    /// Node is already bound to some panel
    Connected,
}

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Envelope error: {0}")]
    Codec(#[from] CodecError),

    #[error("Invalid JSON from node: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Node public key unknown; call landing() or with_node_key() first")]
    NodeKeyUnknown,

    #[error("Unexpected landing page: {0}")]
    UnexpectedLanding(String),
}

pub type Result<T> = std::result::Result<T, PanelError>;
