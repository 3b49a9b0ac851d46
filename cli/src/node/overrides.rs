// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command-line overrides layered on top of the config manifest.

use anyhow::{Context, Result};
use std::path::PathBuf;

use filenode_core::domain::node_config::NodeConfigManifest;

/// Values given on the command line (or their env fallbacks). Anything left
/// unset keeps the value from the manifest.
#[derive(Debug, Clone, Default)]
pub struct NodeOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub keys_dir: Option<PathBuf>,
    pub sandbox_root: Option<PathBuf>,
    pub log_level: Option<String>,
    pub metrics_port: Option<u16>,
}

impl NodeOverrides {
    pub fn apply(&self, config: &mut NodeConfigManifest) {
        if let Some(host) = &self.host {
            config.spec.network.host = host.clone();
        }
        if let Some(port) = self.port {
            config.spec.network.port = port;
        }
        if let Some(keys_dir) = &self.keys_dir {
            config.spec.storage.keys_dir = keys_dir.clone();
        }
        if let Some(sandbox_root) = &self.sandbox_root {
            config.spec.storage.sandbox_root = sandbox_root.clone();
        }
        if let Some(level) = &self.log_level {
            config.spec.observability.log_level = level.clone();
        }
        if let Some(port) = self.metrics_port {
            config.spec.observability.metrics_port = Some(port);
        }
    }

    /// Discover the manifest, apply the overrides and validate the result.
    pub fn resolve(&self, config_path: Option<PathBuf>) -> Result<NodeConfigManifest> {
        let mut config =
            NodeConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;
        self.apply(&mut config);
        config.validate().context("Configuration validation failed")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_overrides_keep_manifest_values() {
        let mut config = NodeConfigManifest::default();
        let before = config.bind_address();

        NodeOverrides::default().apply(&mut config);

        assert_eq!(config.bind_address(), before);
        assert_eq!(config.spec.storage.sandbox_root, PathBuf::from("./files"));
    }

    #[test]
    fn test_overrides_replace_manifest_values() {
        let mut config = NodeConfigManifest::default();
        let overrides = NodeOverrides {
            host: Some("127.0.0.1".into()),
            port: Some(4000),
            keys_dir: Some(PathBuf::from("/var/lib/filenode")),
            sandbox_root: Some(PathBuf::from("/srv/share")),
            log_level: Some("debug".into()),
            metrics_port: Some(9100),
        };

        overrides.apply(&mut config);

        assert_eq!(config.bind_address(), "127.0.0.1:4000");
        assert_eq!(config.spec.storage.keys_dir, PathBuf::from("/var/lib/filenode"));
        assert_eq!(config.spec.storage.sandbox_root, PathBuf::from("/srv/share"));
        assert_eq!(config.spec.observability.log_level, "debug");
        assert_eq!(config.spec.observability.metrics_port, Some(9100));
    }

    #[test]
    fn test_resolve_rejects_invalid_result() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("filenode-config.yaml");
        NodeConfigManifest::default().to_yaml_file(&path).unwrap();

        let overrides = NodeOverrides {
            port: Some(0),
            ..Default::default()
        };

        assert!(overrides.resolve(Some(path.clone())).is_err());
        assert!(NodeOverrides::default().resolve(Some(path)).is_ok());
    }
}
