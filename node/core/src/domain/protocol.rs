// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Wire protocol shared by the node and the panel.
//!
//! Every outcome is reported in the body as a [`Reply`] with a `success`
//! flag. Whether that reply is sent in plaintext or sealed into an
//! [`Envelope`] is decided by the handler, see [`NodeResponse`].

use serde::{Deserialize, Serialize};

use crate::domain::envelope::{Envelope, PublicKeyPem};

pub const MSG_MISSING_MESSAGE: &str = "Missing the message!";
pub const MSG_UNDECRYPTABLE: &str = "Unable to decrypt the message!";
pub const MSG_NOT_CONNECTED: &str = "Please visit the panel and try again (node is not (yet) connected)!";
pub const MSG_MALFORMED_REQUEST: &str = "Malformed request!";
pub const MSG_SEAL_FAILED: &str = "Unable to encrypt the response!";
pub const MSG_INTERNAL_ERROR: &str = "Unable to process the request!";

pub const MSG_CONNECTED: &str = "Connected";
pub const MSG_ALREADY_PAIRED: &str = "Node is already connected to different panel!";
pub const MSG_MISSING_PUBLIC_KEY: &str = "Missing the public key!";
pub const MSG_INVALID_PUBLIC_KEY: &str = "Invalid public key!";
pub const MSG_PAIRING_NOT_PERSISTED: &str = "Unable to persist the pairing!";

pub const MSG_MISSING_PATH: &str = "Missing the path";
pub const MSG_OUTSIDE_SANDBOX: &str = "Path is outside of the sandbox!";
pub const MSG_INVALID_PATH: &str = "Invalid path!";
pub const MSG_DIRECTORY_MISSING: &str = "Directory doesn't exist!";
pub const MSG_NOT_A_DIRECTORY: &str = "Not a directory!";
pub const MSG_DIRECTORY_EMPTY: &str = "This directory is empty";
pub const MSG_LIST_FAILED: &str = "Unable to read the directory!";
pub const MSG_NO_FILE: &str = "No file selected!";
pub const MSG_FILE_MISSING: &str = "File doesn't exist!";
pub const MSG_FILE_DELETED: &str = "File deleted!";
pub const MSG_DELETE_FAILED: &str = "Unable to delete the file!";
pub const MSG_INVALID_FILE: &str = "Invalid file!";
pub const MSG_FILE_EXISTS: &str = "File already exists!";
pub const MSG_FILE_SAVED: &str = "File saved!";
pub const MSG_SAVE_FAILED: &str = "Unable to save the file!";

pub const MSG_USE_PANEL: &str = "Please use the panel!";

/// Plaintext response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub success: bool,

    /// Set when the caller must redo pairing before retrying
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directories: Option<Vec<String>>,
}

impl Reply {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { message: Some(message.into()), success: true, ..Default::default() }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self { message: Some(message.into()), success: false, ..Default::default() }
    }

    pub fn reconnect() -> Self {
        Self {
            message: Some(MSG_NOT_CONNECTED.to_string()),
            success: false,
            reconnect: Some(true),
            ..Default::default()
        }
    }

    pub fn listing(files: Vec<String>, directories: Vec<String>) -> Self {
        Self {
            success: true,
            files: Some(files),
            directories: Some(directories),
            ..Default::default()
        }
    }

    pub fn needs_reconnect(&self) -> bool {
        self.reconnect.unwrap_or(false)
    }
}

/// What a handler hands back to the HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NodeResponse {
    /// Sent as-is; used when no trusted recipient key is available
    Plain(Reply),
    /// Reply sealed to a recipient public key
    Sealed(Envelope),
}

impl NodeResponse {
    pub fn is_sealed(&self) -> bool {
        matches!(self, NodeResponse::Sealed(_))
    }
}

/// Decrypted body of `POST /init`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PairRequest {
    pub publickey: PublicKeyPem,
}

/// Decrypted body of `POST /files/view`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ListRequest {
    #[serde(default)]
    pub path: Option<String>,
}

/// Decrypted body of `POST /files/delete`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default, rename = "isDir")]
    pub is_dir: Option<bool>,
}

/// Decrypted body of `POST /files/upload`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub file: Option<UploadFileField>,
}

/// The `file` field of an upload: the panel sends the descriptor as a JSON
/// encoded string, an inline object is accepted too.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum UploadFileField {
    Encoded(String),
    Inline(UploadDescriptor),
}

impl UploadFileField {
    pub fn descriptor(&self) -> Result<UploadDescriptor, serde_json::Error> {
        match self {
            UploadFileField::Encoded(json) => serde_json::from_str(json),
            UploadFileField::Inline(descriptor) => Ok(descriptor.clone()),
        }
    }
}

/// Target name plus raw content, in Node.js `Buffer` JSON shape
/// (`{"name": "a.txt", "data": {"type": "Buffer", "data": [104, 105]}}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UploadDescriptor {
    pub name: String,
    pub data: BufferPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BufferPayload {
    #[serde(default)]
    pub data: Vec<u8>,
}

impl UploadDescriptor {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), data: BufferPayload { data: bytes } }
    }
}
