// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! File operation use cases: list, delete, upload.
//!
//! Each operation first passes the shared gate in [`FileOperationService::open`]:
//!
//! 1. both envelope fields present, else plaintext "Missing the message!"
//! 2. node paired, else plaintext `reconnect: true` (storage is not touched)
//! 3. envelope opens with the node key, else plaintext "Unable to decrypt"
//! 4. body parses as the operation's request, else a sealed "Malformed request!"
//!
//! From step 4 on every reply is sealed to the bound panel key. Envelope
//! opening and sealing run on the blocking pool.

use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::application::{run_blocking, seal_blocking};
use crate::domain::envelope::{Envelope, EnvelopeCodec, PublicKeyPem};
use crate::domain::identity::IdentityRepository;
use crate::domain::path_sanitizer::{PathSanitizer, PathSanitizerError};
use crate::domain::protocol::*;
use crate::domain::storage::{FileStore, FileType, StorageError};

/// A request that made it through the gate.
struct OpenedRequest<T> {
    body: T,
    controller: PublicKeyPem,
}

pub struct FileOperationService {
    identity: Arc<dyn IdentityRepository>,
    codec: Arc<dyn EnvelopeCodec>,
    store: Arc<dyn FileStore>,
    sanitizer: PathSanitizer,
}

impl FileOperationService {
    pub fn new(
        identity: Arc<dyn IdentityRepository>,
        codec: Arc<dyn EnvelopeCodec>,
        store: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            identity,
            codec,
            store,
            sanitizer: PathSanitizer::new(),
        }
    }

    pub async fn list(&self, envelope: Option<Envelope>) -> NodeResponse {
        match self.open::<ListRequest>("list", envelope).await {
            Ok(opened) => {
                let reply = self.list_directory(opened.body).await;
                self.respond("list", opened.controller, reply).await
            }
            Err(response) => response,
        }
    }

    pub async fn delete(&self, envelope: Option<Envelope>) -> NodeResponse {
        match self.open::<DeleteRequest>("delete", envelope).await {
            Ok(opened) => {
                let reply = self.delete_entry(opened.body).await;
                self.respond("delete", opened.controller, reply).await
            }
            Err(response) => response,
        }
    }

    pub async fn upload(&self, envelope: Option<Envelope>) -> NodeResponse {
        match self.open::<UploadRequest>("upload", envelope).await {
            Ok(opened) => {
                let reply = self.upload_file(opened.body).await;
                self.respond("upload", opened.controller, reply).await
            }
            Err(response) => response,
        }
    }

    /// List the immediate entries of `path`, split into files and directories.
    ///
    /// Entries keep the order the filesystem yields them in.
    pub async fn list_directory(&self, request: ListRequest) -> Reply {
        let Some(path) = request.path.filter(|p| !p.is_empty()) else {
            return Reply::fail(MSG_MISSING_PATH);
        };

        let relative = match self.sanitizer.relative(&path) {
            Ok(relative) => relative,
            Err(e) => return sanitizer_reply(e),
        };

        let entries = match self.store.read_dir(&relative).await {
            Ok(entries) => entries,
            Err(e) => return storage_reply(e, MSG_DIRECTORY_MISSING, MSG_LIST_FAILED),
        };

        if entries.is_empty() {
            return Reply::fail(MSG_DIRECTORY_EMPTY);
        }

        let (dirs, files): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|entry| entry.file_type == FileType::Directory);

        debug!(path = %relative.display(), files = files.len(), directories = dirs.len(), "Listed directory");
        Reply::listing(
            files.into_iter().map(|e| e.name).collect(),
            dirs.into_iter().map(|e| e.name).collect(),
        )
    }

    /// Delete `file` under `path` (default: the sandbox root); recursively
    /// when `isDir` is set.
    pub async fn delete_entry(&self, request: DeleteRequest) -> Reply {
        let Some(file) = request.file.filter(|f| !f.is_empty()) else {
            return Reply::fail(MSG_NO_FILE);
        };

        let target = match self.target(request.path.as_deref(), &file) {
            Ok(target) => target,
            Err(reply) => return reply,
        };

        match self.store.kind(&target).await {
            Ok(Some(_)) => {}
            Ok(None) => return Reply::fail(MSG_FILE_MISSING),
            Err(e) => return storage_reply(e, MSG_FILE_MISSING, MSG_DELETE_FAILED),
        }

        let result = if request.is_dir.unwrap_or(false) {
            self.store.delete_directory(&target).await
        } else {
            self.store.delete_file(&target).await
        };

        match result {
            Ok(()) => {
                debug!(target = %target.display(), "Deleted entry");
                Reply::ok(MSG_FILE_DELETED)
            }
            Err(e) => storage_reply(e, MSG_FILE_MISSING, MSG_DELETE_FAILED),
        }
    }

    /// Store an uploaded file. Existing files are never overwritten.
    pub async fn upload_file(&self, request: UploadRequest) -> Reply {
        let Some(field) = request.file else {
            return Reply::fail(MSG_NO_FILE);
        };

        let descriptor = match field.descriptor() {
            Ok(descriptor) => descriptor,
            Err(e) => {
                debug!(error = %e, "Upload descriptor could not be parsed");
                return Reply::fail(MSG_INVALID_FILE);
            }
        };
        if descriptor.name.is_empty() {
            return Reply::fail(MSG_NO_FILE);
        }

        let target = match self.target(request.path.as_deref(), &descriptor.name) {
            Ok(target) => target,
            Err(reply) => return reply,
        };

        match self.store.create_file(&target, &descriptor.data.data).await {
            Ok(()) => {
                debug!(target = %target.display(), bytes = descriptor.data.data.len(), "Saved upload");
                Reply::ok(MSG_FILE_SAVED)
            }
            Err(StorageError::AlreadyExists(_)) => Reply::fail(MSG_FILE_EXISTS),
            Err(e) => storage_reply(e, MSG_DIRECTORY_MISSING, MSG_SAVE_FAILED),
        }
    }

    /// Whether the sandbox root is present and usable.
    pub async fn storage_healthy(&self) -> bool {
        match self.store.health_check().await {
            Ok(()) => true,
            Err(e) => {
                warn!(root = %self.store.root().display(), error = %e, "Sandbox health check failed");
                false
            }
        }
    }

    /// Resolve an entry strictly below `dir`. A name that normalizes to
    /// nothing (`.`, `./`, `/`) would name `dir` itself and is refused.
    fn target(&self, dir: Option<&str>, name: &str) -> Result<PathBuf, Reply> {
        let entry = self.sanitizer.relative(name).map_err(sanitizer_reply)?;
        if entry.as_os_str().is_empty() {
            return Err(Reply::fail(MSG_NO_FILE));
        }
        self.sanitizer.resolve(dir, name).map_err(sanitizer_reply)
    }

    async fn open<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        envelope: Option<Envelope>,
    ) -> Result<OpenedRequest<T>, NodeResponse> {
        let Some(envelope) = envelope else {
            record(operation, "missing_message");
            return Err(NodeResponse::Plain(Reply::fail(MSG_MISSING_MESSAGE)));
        };

        let Some(controller) = self.identity.load_pairing() else {
            record(operation, "not_paired");
            return Err(NodeResponse::Plain(Reply::reconnect()));
        };

        let identity = self.identity.clone();
        let codec = self.codec.clone();
        let opened = run_blocking(move || codec.unwrap(&identity.identity().private_key, &envelope)).await;
        let plaintext = match opened {
            Some(Ok(plaintext)) => plaintext,
            None => return Err(NodeResponse::Plain(Reply::fail(MSG_INTERNAL_ERROR))),
            Some(Err(e)) => {
                debug!(operation, error = %e, "Request envelope could not be opened");
                record(operation, "undecryptable");
                return Err(NodeResponse::Plain(Reply::fail(MSG_UNDECRYPTABLE)));
            }
        };

        match serde_json::from_slice::<T>(&plaintext) {
            Ok(body) => Ok(OpenedRequest { body, controller }),
            Err(e) => {
                debug!(operation, error = %e, "Request body is malformed");
                record(operation, "malformed");
                Err(seal_blocking(self.codec.clone(), controller, Reply::fail(MSG_MALFORMED_REQUEST)).await)
            }
        }
    }

    async fn respond(&self, operation: &'static str, controller: PublicKeyPem, reply: Reply) -> NodeResponse {
        record(operation, if reply.success { "success" } else { "rejected" });
        seal_blocking(self.codec.clone(), controller, reply).await
    }
}

fn sanitizer_reply(err: PathSanitizerError) -> Reply {
    match err {
        PathSanitizerError::PathTraversal(_) | PathSanitizerError::OutsideSandbox(_) => {
            Reply::fail(MSG_OUTSIDE_SANDBOX)
        }
        PathSanitizerError::InvalidPath(_) | PathSanitizerError::PathTooLong(_) => Reply::fail(MSG_INVALID_PATH),
    }
}

fn storage_reply(err: StorageError, not_found: &str, failed: &str) -> Reply {
    match err {
        StorageError::NotFound(_) => Reply::fail(not_found),
        StorageError::NotADirectory(_) => Reply::fail(MSG_NOT_A_DIRECTORY),
        StorageError::OutsideSandbox(path) => {
            warn!(path = %path, "Refused file operation outside the sandbox");
            Reply::fail(MSG_OUTSIDE_SANDBOX)
        }
        other => {
            error!(error = %other, "File operation failed");
            Reply::fail(failed)
        }
    }
}

fn record(operation: &'static str, outcome: &'static str) {
    metrics::counter!(
        "filenode_file_operations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}
