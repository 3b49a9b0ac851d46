// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application Layer
//!
//! Use cases driven by the HTTP surface: pairing with a panel and the file
//! operations that require a pairing.

pub mod file_operations;
pub mod pairing;

pub use file_operations::FileOperationService;
pub use pairing::{LandingInfo, PairingService};

use std::sync::Arc;

use crate::domain::envelope::{EnvelopeCodec, PublicKeyPem};
use crate::domain::protocol::{NodeResponse, Reply, MSG_SEAL_FAILED};

/// Run RSA work or blocking key-file I/O on the blocking pool. `None` when
/// the task panicked or was cancelled.
pub(crate) async fn run_blocking<T, F>(task: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!(error = %e, "Blocking task failed");
            None
        }
    }
}

/// [`seal`] on the blocking pool.
pub(crate) async fn seal_blocking(codec: Arc<dyn EnvelopeCodec>, recipient: PublicKeyPem, reply: Reply) -> NodeResponse {
    run_blocking(move || seal(codec.as_ref(), &recipient, &reply))
        .await
        .unwrap_or_else(|| NodeResponse::Plain(Reply::fail(MSG_SEAL_FAILED)))
}

/// Seal `reply` for `recipient`, falling back to a plaintext failure when the
/// recipient key cannot be used.
pub(crate) fn seal(codec: &dyn EnvelopeCodec, recipient: &PublicKeyPem, reply: &Reply) -> NodeResponse {
    let body = match serde_json::to_vec(reply) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize reply");
            return NodeResponse::Plain(Reply::fail(MSG_SEAL_FAILED));
        }
    };

    match codec.wrap(recipient, &body) {
        Ok(envelope) => NodeResponse::Sealed(envelope),
        Err(e) => {
            tracing::error!(error = %e, "Failed to seal reply");
            NodeResponse::Plain(Reply::fail(MSG_SEAL_FAILED))
        }
    }
}
