// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Node bootstrap and HTTP server.
//!
//! Startup order: identity material, sandbox, optional metrics exporter,
//! listener. Any failure before the listener is bound aborts startup.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use filenode_core::application::{FileOperationService, PairingService};
use filenode_core::domain::envelope::EnvelopeCodec;
use filenode_core::domain::identity::IdentityRepository;
use filenode_core::domain::node_config::NodeConfigManifest;
use filenode_core::infrastructure::crypto::RsaEnvelopeCodec;
use filenode_core::infrastructure::identity_store::FileIdentityStore;
use filenode_core::infrastructure::storage::LocalFileStore;
use filenode_core::presentation::{app, AppState};

/// Wire the node from `config` into an axum router.
pub fn build_router(config: &NodeConfigManifest, codec: Arc<dyn EnvelopeCodec>) -> Result<axum::Router> {
    let storage = &config.spec.storage;

    let identity = Arc::new(
        FileIdentityStore::open(&storage.keys_dir, codec.clone())
            .with_context(|| format!("Failed to load node identity from {}", storage.keys_dir.display()))?,
    );
    if identity.pairing_state().is_paired() {
        info!("Node is paired, waiting for panel requests");
    } else {
        info!("Node is not paired yet, open the landing page to get its public key");
    }

    let store = Arc::new(
        LocalFileStore::new(&storage.sandbox_root)
            .with_context(|| format!("Failed to open sandbox {}", storage.sandbox_root.display()))?,
    );
    info!(sandbox = %storage.sandbox_root.display(), "Sandbox ready");

    let pairing = Arc::new(PairingService::new(identity.clone(), codec.clone()));
    let files = Arc::new(FileOperationService::new(identity, codec, store));

    Ok(app(AppState::new(pairing, files), config.spec.network.max_body_bytes))
}

pub async fn start_node(config: NodeConfigManifest) -> Result<()> {
    info!(name = %config.metadata.name, "Starting filenode");

    let router = build_router(&config, Arc::new(RsaEnvelopeCodec::new()))?;

    if let Some(port) = config.spec.observability.metrics_port {
        install_metrics_exporter(&config.spec.network.host, port)?;
    }

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Node listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Node shutting down");

    Ok(())
}

fn install_metrics_exporter(host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid metrics address {}:{}", host, port))?;

    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;

    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
