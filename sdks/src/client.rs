// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use filenode_core::domain::envelope::{Envelope, EnvelopeCodec, NodeIdentity, PublicKeyPem};
use filenode_core::domain::protocol::{
    DeleteRequest, ListRequest, PairRequest, Reply, UploadDescriptor, UploadFileField, UploadRequest, MSG_USE_PANEL,
};

use crate::types::{Landing, PanelError, Result};

/// Body of the landing page while the node is unpaired.
#[derive(Deserialize)]
struct LandingBody {
    publickey: PublicKeyPem,
}

/// Node replies arrive sealed once a trusted key is available, plaintext
/// otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireReply {
    Sealed(Envelope),
    Plain(Reply),
}

/// Client a panel uses to pair with and drive one node.
pub struct PanelClient {
    base_url: String,
    client: Client,
    codec: Arc<dyn EnvelopeCodec>,
    identity: NodeIdentity,
    node_key: Option<PublicKeyPem>,
}

impl PanelClient {
    /// Create a client acting as the panel owning `identity`.
    pub fn new(base_url: impl Into<String>, codec: Arc<dyn EnvelopeCodec>, identity: NodeIdentity) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
            codec,
            identity,
            node_key: None,
        }
    }

    /// Use a node key obtained out of band, e.g. from `filenode identity show`.
    pub fn with_node_key(mut self, node_key: PublicKeyPem) -> Self {
        self.node_key = Some(node_key);
        self
    }

    pub fn node_key(&self) -> Option<&PublicKeyPem> {
        self.node_key.as_ref()
    }

    /// Fetch the landing page, remembering the node key when it is shown.
    pub async fn landing(&mut self) -> Result<Landing> {
        let text = self.client.get(self.url("/")).send().await?.text().await?;

        if let Ok(body) = serde_json::from_str::<LandingBody>(&text) {
            self.node_key = Some(body.publickey.clone());
            return Ok(Landing::Unpaired {
                node_key: body.publickey,
            });
        }
        if text == MSG_USE_PANEL {
            return Ok(Landing::Connected);
        }
        Err(PanelError::UnexpectedLanding(text))
    }

    /// Offer this panel's public key to the node.
    pub async fn pair(&self) -> Result<Reply> {
        let request = PairRequest {
            publickey: self.identity.public_key.clone(),
        };
        self.call("/init", &request).await
    }

    pub async fn list(&self, path: &str) -> Result<Reply> {
        let request = ListRequest {
            path: Some(path.to_string()),
        };
        self.call("/files/view", &request).await
    }

    pub async fn delete(&self, path: &str, file: &str, is_dir: bool) -> Result<Reply> {
        let request = DeleteRequest {
            path: Some(path.to_string()),
            file: Some(file.to_string()),
            is_dir: Some(is_dir),
        };
        self.call("/files/delete", &request).await
    }

    /// Upload `bytes` as `path/name`. The descriptor travels JSON-encoded,
    /// the way the panel UI sends it.
    pub async fn upload(&self, path: &str, name: &str, bytes: Vec<u8>) -> Result<Reply> {
        let descriptor = serde_json::to_string(&UploadDescriptor::new(name, bytes))?;
        let request = UploadRequest {
            path: Some(path.to_string()),
            file: Some(UploadFileField::Encoded(descriptor)),
        };
        self.call("/files/upload", &request).await
    }

    async fn call<T: Serialize>(&self, route: &str, request: &T) -> Result<Reply> {
        let node_key = self.node_key.as_ref().ok_or(PanelError::NodeKeyUnknown)?;
        let envelope = self.codec.wrap(node_key, &serde_json::to_vec(request)?)?;

        let bytes = self
            .client
            .post(self.url(route))
            .json(&envelope)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        match serde_json::from_slice::<WireReply>(&bytes)? {
            WireReply::Sealed(envelope) => {
                let plaintext = self.codec.unwrap(&self.identity.private_key, &envelope)?;
                Ok(serde_json::from_slice(&plaintext)?)
            }
            WireReply::Plain(reply) => {
                debug!(route, "Node answered in plaintext");
                Ok(reply)
            }
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }
}
