// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! File Store Trait
//!
//! Abstraction over the sandbox directory tree that file operations act on.
//! All paths passed to a [`FileStore`] are relative to its root and have
//! already been through the `PathSanitizer`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Kind of a directory entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
}

/// One immediate child of a listed directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name (not including path)
    pub name: String,
    pub file_type: FileType,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Host path of the sandbox root
    fn root(&self) -> &Path;

    /// Kind of the entry at `path`, or `None` if nothing exists there.
    async fn kind(&self, path: &Path) -> Result<Option<FileType>, StorageError>;

    /// Immediate entries of a directory, in the order the filesystem yields them.
    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>, StorageError>;

    /// Remove a single file.
    async fn delete_file(&self, path: &Path) -> Result<(), StorageError>;

    /// Remove a directory and everything beneath it.
    async fn delete_directory(&self, path: &Path) -> Result<(), StorageError>;

    /// Create a new file with `data`. Fails with `AlreadyExists` instead of
    /// overwriting.
    async fn create_file(&self, path: &Path, data: &[u8]) -> Result<(), StorageError>;

    /// Check the root exists, is listable and not read-only, without
    /// modifying anything under it.
    async fn health_check(&self) -> Result<(), StorageError>;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Path outside sandbox: {0}")]
    OutsideSandbox(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl StorageError {
    /// Map an `std::io::Error` raised while operating on `path`.
    pub fn from_io(err: std::io::Error, path: &Path) -> Self {
        let shown = path.display().to_string();
        match err.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(shown),
            std::io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(shown),
            std::io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(shown),
            std::io::ErrorKind::NotADirectory => StorageError::NotADirectory(shown),
            _ => StorageError::IoError(format!("{}: {}", shown, err)),
        }
    }
}
