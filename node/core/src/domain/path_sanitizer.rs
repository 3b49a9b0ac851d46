// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Path Sanitizer Domain Service
//!
//! Turns caller-supplied directory and file names into a path relative to the
//! sandbox root, refusing anything that could resolve outside of it. Path
//! containment is a protocol rule, so it lives in the domain and not in the
//! storage backend.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathSanitizerError {
    #[error("Path traversal attempt detected: {0}")]
    PathTraversal(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Path outside sandbox: {0}")]
    OutsideSandbox(String),

    #[error("Path too long: {0}")]
    PathTooLong(String),
}

/// Resolves caller paths against the sandbox root.
///
/// # Guarantees
/// - Rejects any `..` component, wherever it appears
/// - Rejects NUL bytes and platform prefixes (`C:`, `\\server\share`)
/// - Treats a leading `/` as the sandbox root, not the host root
/// - Drops `.` components and redundant separators
#[derive(Debug, Clone)]
pub struct PathSanitizer {
    /// Maximum allowed path length (default: 4096)
    max_path_len: usize,
}

impl PathSanitizer {
    pub fn new() -> Self {
        Self { max_path_len: 4096 }
    }

    pub fn with_max_length(max_path_len: usize) -> Self {
        Self { max_path_len }
    }

    /// Normalize one caller path into a sandbox-relative path.
    ///
    /// An empty result means the sandbox root itself.
    ///
    /// ```
    /// use filenode_core::domain::path_sanitizer::PathSanitizer;
    /// use std::path::PathBuf;
    ///
    /// let sanitizer = PathSanitizer::new();
    /// assert_eq!(sanitizer.relative("/docs/./2024").unwrap(), PathBuf::from("docs/2024"));
    /// assert!(sanitizer.relative("/docs/../../etc").is_err());
    /// ```
    pub fn relative(&self, path: &str) -> Result<PathBuf, PathSanitizerError> {
        if path.len() > self.max_path_len {
            return Err(PathSanitizerError::PathTooLong(path.to_string()));
        }

        if path.contains('\0') {
            tracing::warn!(path = %path.escape_debug(), "Path contains null byte");
            return Err(PathSanitizerError::InvalidPath("Path contains null byte".to_string()));
        }

        let mut normalized = PathBuf::new();
        for component in Path::new(path).components() {
            match component {
                Component::RootDir | Component::CurDir => {}
                Component::Normal(part) => normalized.push(part),
                Component::ParentDir => {
                    tracing::warn!(path = %path, "Path traversal attempt detected: contains '..' component");
                    return Err(PathSanitizerError::PathTraversal(path.to_string()));
                }
                Component::Prefix(_) => {
                    tracing::warn!(path = %path, "Path carries a platform prefix");
                    return Err(PathSanitizerError::OutsideSandbox(path.to_string()));
                }
            }
        }

        Ok(normalized)
    }

    /// Resolve a directory (defaulting to the root) plus an entry name.
    pub fn resolve(&self, dir: Option<&str>, name: &str) -> Result<PathBuf, PathSanitizerError> {
        let dir = self.relative(dir.unwrap_or(""))?;
        let name = self.relative(name)?;
        let joined = dir.join(name);

        if joined.as_os_str().len() > self.max_path_len {
            return Err(PathSanitizerError::PathTooLong(joined.display().to_string()));
        }

        Ok(joined)
    }

    /// Map a sandbox-relative path onto the host filesystem.
    pub fn within(&self, root: &Path, relative: &Path) -> Result<PathBuf, PathSanitizerError> {
        let full = root.join(relative);
        if !full.starts_with(root) {
            return Err(PathSanitizerError::OutsideSandbox(relative.display().to_string()));
        }
        Ok(full)
    }
}

impl Default for PathSanitizer {
    fn default() -> Self {
        Self::new()
    }
}
