// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local Filesystem File Store
//!
//! Exposes one host directory (the sandbox root) to the file operations.
//! Paths arrive already sanitized; this layer additionally resolves symlinks
//! on the existing part of every target and refuses anything whose real
//! location lies outside the root.
//!
//! **Limitations:**
//! - Recursive deletes are not transactional; a failure can leave a partly
//!   removed tree
//! - No per-path locking between concurrent requests

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::domain::path_sanitizer::PathSanitizer;
use crate::domain::storage::{DirEntry, FileStore, FileType, StorageError};

pub struct LocalFileStore {
    /// Sandbox root as configured
    root: PathBuf,
    /// Sandbox root with symlinks resolved, used for containment checks
    canonical_root: PathBuf,
    sanitizer: PathSanitizer,
}

impl LocalFileStore {
    /// Open the store, creating the root directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();

        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::IoError(format!("Failed to create sandbox root {}: {}", root.display(), e))
        })?;
        let canonical_root = std::fs::canonicalize(&root).map_err(|e| StorageError::from_io(e, &root))?;

        Ok(Self {
            root,
            canonical_root,
            sanitizer: PathSanitizer::new(),
        })
    }

    /// Host path for a sandbox-relative path, after checking that its real
    /// location stays inside the root.
    async fn resolve(&self, relative: &Path) -> Result<PathBuf, StorageError> {
        let full = self
            .sanitizer
            .within(&self.canonical_root, relative)
            .map_err(|e| StorageError::OutsideSandbox(e.to_string()))?;
        if relative.as_os_str().is_empty() {
            return Ok(full);
        }

        // Canonicalize the deepest existing ancestor; the remainder cannot
        // contain links since it does not exist yet.
        let mut ancestor = full.parent().map(Path::to_path_buf);
        while let Some(candidate) = ancestor {
            match tokio::fs::canonicalize(&candidate).await {
                Ok(real) => {
                    if !real.starts_with(&self.canonical_root) {
                        warn!(path = %relative.display(), "Sandbox escape through symlink refused");
                        return Err(StorageError::OutsideSandbox(relative.display().to_string()));
                    }
                    break;
                }
                Err(_) => ancestor = candidate.parent().map(Path::to_path_buf),
            }
        }

        Ok(full)
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn kind(&self, path: &Path) -> Result<Option<FileType>, StorageError> {
        let full = self.resolve(path).await?;

        match tokio::fs::symlink_metadata(&full).await {
            Ok(meta) if meta.is_dir() => Ok(Some(FileType::Directory)),
            Ok(_) => Ok(Some(FileType::File)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from_io(e, path)),
        }
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>, StorageError> {
        let full = self.resolve(path).await?;
        let real = tokio::fs::canonicalize(&full)
            .await
            .map_err(|e| StorageError::from_io(e, path))?;
        if !real.starts_with(&self.canonical_root) {
            return Err(StorageError::OutsideSandbox(path.display().to_string()));
        }

        let mut reader = tokio::fs::read_dir(&real)
            .await
            .map_err(|e| StorageError::from_io(e, path))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| StorageError::from_io(e, path))?
        {
            // Follows links like `stat`; a dangling link lists as a file
            let file_type = match tokio::fs::metadata(entry.path()).await {
                Ok(meta) if meta.is_dir() => FileType::Directory,
                _ => FileType::File,
            };

            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                file_type,
            });
        }

        Ok(entries)
    }

    async fn delete_file(&self, path: &Path) -> Result<(), StorageError> {
        let full = self.resolve(path).await?;
        tokio::fs::remove_file(&full)
            .await
            .map_err(|e| StorageError::from_io(e, path))
    }

    async fn delete_directory(&self, path: &Path) -> Result<(), StorageError> {
        let full = self.resolve(path).await?;
        if full == self.canonical_root {
            return Err(StorageError::OutsideSandbox("refusing to delete the sandbox root".to_string()));
        }

        tokio::fs::remove_dir_all(&full)
            .await
            .map_err(|e| StorageError::from_io(e, path))
    }

    async fn create_file(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        use tokio::io::AsyncWriteExt;

        let full = self.resolve(path).await?;

        // create_new closes the exists-then-write race
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .await
            .map_err(|e| StorageError::from_io(e, path))?;

        file.write_all(data).await.map_err(|e| StorageError::from_io(e, path))?;
        file.flush().await.map_err(|e| StorageError::from_io(e, path))?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        // Never writes into the sandbox
        let meta = tokio::fs::metadata(&self.root).await.map_err(|e| {
            StorageError::IoError(format!("Sandbox root {} is unavailable: {}", self.root.display(), e))
        })?;
        if !meta.is_dir() {
            return Err(StorageError::NotADirectory(self.root.display().to_string()));
        }
        if meta.permissions().readonly() {
            return Err(StorageError::PermissionDenied(self.root.display().to_string()));
        }

        tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| StorageError::from_io(e, &self.root))?;

        Ok(())
    }
}
