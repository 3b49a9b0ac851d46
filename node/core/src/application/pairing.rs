// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Pairing use case
//!
//! `UNPAIRED -> PAIRED` on the first successful `pair`; `PAIRED` is terminal.
//! A pairing attempt with a different panel key is refused, and the refusal
//! is sealed to the key that attempt presented since no other recipient is
//! available for it.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::application::{run_blocking, seal};
use crate::domain::envelope::{Envelope, EnvelopeCodec, PublicKeyPem};
use crate::domain::identity::{BindOutcome, IdentityRepository};
use crate::domain::protocol::{
    NodeResponse, PairRequest, Reply, MSG_ALREADY_PAIRED, MSG_CONNECTED, MSG_INVALID_PUBLIC_KEY,
    MSG_INTERNAL_ERROR, MSG_MISSING_MESSAGE, MSG_MISSING_PUBLIC_KEY, MSG_PAIRING_NOT_PERSISTED, MSG_UNDECRYPTABLE,
};

/// What `GET /` may show to an anonymous visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LandingInfo {
    /// Operator copies this key into the panel to start pairing
    Unpaired { public_key: PublicKeyPem },
    AlreadyConnected,
}

pub struct PairingService {
    identity: Arc<dyn IdentityRepository>,
    codec: Arc<dyn EnvelopeCodec>,
}

impl PairingService {
    pub fn new(identity: Arc<dyn IdentityRepository>, codec: Arc<dyn EnvelopeCodec>) -> Self {
        Self { identity, codec }
    }

    pub fn landing_info(&self) -> LandingInfo {
        if self.identity.pairing_state().is_paired() {
            LandingInfo::AlreadyConnected
        } else {
            LandingInfo::Unpaired {
                public_key: self.identity.identity().public_key.clone(),
            }
        }
    }

    /// Decrypt and decide a pairing request. Key operations and the pairing
    /// write run on the blocking pool.
    pub async fn pair(&self, envelope: Option<Envelope>) -> NodeResponse {
        let Some(envelope) = envelope else {
            record("missing_message");
            return NodeResponse::Plain(Reply::fail(MSG_MISSING_MESSAGE));
        };

        let identity = self.identity.clone();
        let codec = self.codec.clone();
        run_blocking(move || decide(identity.as_ref(), codec.as_ref(), &envelope))
            .await
            .unwrap_or_else(|| NodeResponse::Plain(Reply::fail(MSG_INTERNAL_ERROR)))
    }
}

fn decide(identity: &dyn IdentityRepository, codec: &dyn EnvelopeCodec, envelope: &Envelope) -> NodeResponse {
    let plaintext = match codec.unwrap(&identity.identity().private_key, envelope) {
        Ok(plaintext) => plaintext,
        Err(e) => {
            debug!(error = %e, "Pairing envelope could not be opened");
            record("undecryptable");
            return NodeResponse::Plain(Reply::fail(MSG_UNDECRYPTABLE));
        }
    };

    let claimed = match serde_json::from_slice::<PairRequest>(&plaintext) {
        Ok(request) => request.publickey,
        Err(e) => {
            debug!(error = %e, "Pairing request carries no public key");
            record("missing_public_key");
            return NodeResponse::Plain(Reply::fail(MSG_MISSING_PUBLIC_KEY));
        }
    };

    if let Err(e) = codec.validate_public_key(&claimed) {
        warn!(error = %e, "Pairing request presented an unusable public key");
        record("invalid_public_key");
        return NodeResponse::Plain(Reply::fail(MSG_INVALID_PUBLIC_KEY));
    }

    let reply = match identity.bind_pairing(&claimed) {
        Ok(BindOutcome::Bound) => {
            info!("Node paired with panel");
            record("bound");
            Reply::ok(MSG_CONNECTED)
        }
        Ok(BindOutcome::AlreadyBound) => {
            debug!("Panel repeated pairing with the bound key");
            record("already_bound");
            Reply::ok(MSG_CONNECTED)
        }
        Ok(BindOutcome::Conflict) => {
            warn!("Pairing refused: node is bound to a different panel");
            record("conflict");
            Reply::fail(MSG_ALREADY_PAIRED)
        }
        Err(e) => {
            error!(error = %e, "Failed to persist pairing");
            record("persist_failed");
            return NodeResponse::Plain(Reply::fail(MSG_PAIRING_NOT_PERSISTED));
        }
    };

    seal(codec, &claimed, &reply)
}

fn record(outcome: &'static str) {
    metrics::counter!("filenode_pairing_requests_total", "outcome" => outcome).increment(1);
}
