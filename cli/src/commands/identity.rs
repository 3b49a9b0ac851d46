// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Identity commands
//!
//! Commands: show

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::sync::Arc;

use filenode_core::domain::identity::{IdentityRepository, PairingState};
use filenode_core::domain::node_config::NodeConfigManifest;
use filenode_core::infrastructure::crypto::RsaEnvelopeCodec;
use filenode_core::infrastructure::identity_store::FileIdentityStore;

#[derive(Subcommand)]
pub enum IdentityCommand {
    /// Print the node public key and pairing state. Generates the keypair
    /// when none exists yet, as the first start would.
    Show,
}

pub async fn handle_command(command: IdentityCommand, config: &NodeConfigManifest) -> Result<()> {
    match command {
        IdentityCommand::Show => show(config),
    }
}

fn show(config: &NodeConfigManifest) -> Result<()> {
    let keys_dir = &config.spec.storage.keys_dir;
    let store = FileIdentityStore::open(keys_dir, Arc::new(RsaEnvelopeCodec::new()))
        .with_context(|| format!("Failed to load node identity from {}", keys_dir.display()))?;

    println!("{}", "Node identity:".bold());
    println!("  Keys directory: {}", store.keys_dir().display());
    match store.pairing_state() {
        PairingState::Unpaired => println!("  Pairing: {}", "not paired".yellow()),
        PairingState::Paired(_) => println!("  Pairing: {}", "paired".green()),
    }
    println!();
    println!("{}", "Public key:".bold());
    println!("{}", store.identity().public_key.as_str().trim_end());

    Ok(())
}
