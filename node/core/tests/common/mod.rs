// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Shared fixtures: a node wired over temp directories, and a panel that
//! talks to it through sealed envelopes.

#![allow(dead_code)]

use serde::Serialize;
use std::sync::Arc;
use tempfile::TempDir;

use filenode_core::application::{FileOperationService, PairingService};
use filenode_core::domain::envelope::{Envelope, EnvelopeCodec, NodeIdentity, PublicKeyPem};
use filenode_core::domain::protocol::{NodeResponse, PairRequest, Reply};
use filenode_core::infrastructure::crypto::RsaEnvelopeCodec;
use filenode_core::infrastructure::identity_store::FileIdentityStore;
use filenode_core::infrastructure::storage::LocalFileStore;
use filenode_core::presentation::AppState;

/// Small keys keep the suite fast; the envelope format does not depend on size.
pub const TEST_KEY_BITS: usize = 1024;

pub fn codec() -> Arc<dyn EnvelopeCodec> {
    Arc::new(RsaEnvelopeCodec::with_key_bits(TEST_KEY_BITS))
}

pub struct TestNode {
    pub keys: TempDir,
    pub sandbox: TempDir,
    pub codec: Arc<dyn EnvelopeCodec>,
    pub identity: Arc<FileIdentityStore>,
    pub pairing: Arc<PairingService>,
    pub files: Arc<FileOperationService>,
}

impl TestNode {
    pub fn start() -> Self {
        let keys = TempDir::new().unwrap();
        let sandbox = TempDir::new().unwrap();
        Self::open(keys, sandbox)
    }

    /// Open a node over existing directories, as a restart would.
    pub fn open(keys: TempDir, sandbox: TempDir) -> Self {
        Self::open_with_codec(keys, sandbox, codec())
    }

    pub fn with_codec(codec: Arc<dyn EnvelopeCodec>) -> Self {
        Self::open_with_codec(TempDir::new().unwrap(), TempDir::new().unwrap(), codec)
    }

    pub fn open_with_codec(keys: TempDir, sandbox: TempDir, codec: Arc<dyn EnvelopeCodec>) -> Self {
        let identity = Arc::new(FileIdentityStore::open(keys.path(), codec.clone()).unwrap());
        let store = Arc::new(LocalFileStore::new(sandbox.path()).unwrap());

        let pairing = Arc::new(PairingService::new(identity.clone(), codec.clone()));
        let files = Arc::new(FileOperationService::new(identity.clone(), codec.clone(), store));

        Self {
            keys,
            sandbox,
            codec,
            identity,
            pairing,
            files,
        }
    }

    pub fn restart(self) -> Self {
        let Self { keys, sandbox, .. } = self;
        Self::open(keys, sandbox)
    }

    pub fn public_key(&self) -> PublicKeyPem {
        use filenode_core::domain::identity::IdentityRepository;
        self.identity.identity().public_key.clone()
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(self.pairing.clone(), self.files.clone())
    }
}

pub struct TestPanel {
    pub codec: Arc<dyn EnvelopeCodec>,
    pub identity: NodeIdentity,
}

impl TestPanel {
    pub fn new() -> Self {
        let codec = codec();
        let identity = codec.generate_keypair().unwrap();
        Self { codec, identity }
    }

    pub fn public_key(&self) -> PublicKeyPem {
        self.identity.public_key.clone()
    }

    /// Seal a JSON request body to the node.
    pub fn seal<T: Serialize>(&self, node_key: &PublicKeyPem, body: &T) -> Envelope {
        let plaintext = serde_json::to_vec(body).unwrap();
        self.codec.wrap(node_key, &plaintext).unwrap()
    }

    pub fn pair_request(&self, node_key: &PublicKeyPem) -> Envelope {
        self.seal(
            node_key,
            &PairRequest {
                publickey: self.public_key(),
            },
        )
    }

    /// Open a sealed reply; panics on a plaintext one.
    pub fn open(&self, response: &NodeResponse) -> Reply {
        match response {
            NodeResponse::Sealed(envelope) => {
                let plaintext = self.codec.unwrap(&self.identity.private_key, envelope).unwrap();
                serde_json::from_slice(&plaintext).unwrap()
            }
            NodeResponse::Plain(reply) => panic!("expected a sealed reply, got {:?}", reply),
        }
    }
}

pub fn plain(response: &NodeResponse) -> &Reply {
    match response {
        NodeResponse::Plain(reply) => reply,
        NodeResponse::Sealed(_) => panic!("expected a plaintext reply"),
    }
}

/// A node already paired with a fresh panel.
pub async fn paired() -> (TestNode, TestPanel) {
    let node = TestNode::start();
    let panel = TestPanel::new();
    let response = node.pairing.pair(Some(panel.pair_request(&node.public_key()))).await;
    assert!(panel.open(&response).success);
    (node, panel)
}
