// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! File-backed Identity Store
//!
//! Key material lives in three files inside `keys_dir`:
//!
//! | File | Contents |
//! |------|----------|
//! | `rsa_key` | node private key (PKCS#8 PEM, mode 0600 on Unix) |
//! | `rsa_key.pub` | node public key |
//! | `server_rsa_key.pub` | bound panel public key, absent while unpaired |
//!
//! The pairing record is loaded once at startup and afterwards only changed
//! through [`IdentityRepository::bind_pairing`], which holds the record lock
//! across the decision and the write.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::envelope::{EnvelopeCodec, PrivateKeyPem, PublicKeyPem};
use crate::domain::identity::{BindOutcome, IdentityError, IdentityRepository, NodeIdentity};

pub const PRIVATE_KEY_FILE: &str = "rsa_key";
pub const PUBLIC_KEY_FILE: &str = "rsa_key.pub";
pub const CONTROLLER_KEY_FILE: &str = "server_rsa_key.pub";

pub struct FileIdentityStore {
    keys_dir: PathBuf,
    identity: NodeIdentity,
    pairing: Mutex<Option<PublicKeyPem>>,
}

impl FileIdentityStore {
    /// Load (or create) the node identity and the pairing record.
    ///
    /// Any error here means the node cannot serve requests.
    pub fn open(keys_dir: impl Into<PathBuf>, codec: Arc<dyn EnvelopeCodec>) -> Result<Self, IdentityError> {
        let keys_dir = keys_dir.into();
        let identity = Self::ensure_identity(&keys_dir, codec.as_ref())?;
        let pairing = Self::read_pairing(&keys_dir, codec.as_ref())?;

        match &pairing {
            Some(_) => info!(keys_dir = %keys_dir.display(), "Node is paired with a panel"),
            None => info!(keys_dir = %keys_dir.display(), "Node is not paired yet"),
        }

        Ok(Self {
            keys_dir,
            identity,
            pairing: Mutex::new(pairing),
        })
    }

    /// Return the persisted keypair, generating and persisting one when no
    /// private key exists yet.
    pub fn ensure_identity(keys_dir: &Path, codec: &dyn EnvelopeCodec) -> Result<NodeIdentity, IdentityError> {
        let private_path = keys_dir.join(PRIVATE_KEY_FILE);
        let public_path = keys_dir.join(PUBLIC_KEY_FILE);

        let Some(private_pem) = read_optional(&private_path)? else {
            if public_path.exists() {
                warn!(path = %public_path.display(), "Public key without private key, regenerating keypair");
            }
            return Self::generate_identity(keys_dir, codec);
        };

        let private_key = PrivateKeyPem::new(private_pem);
        let derived = codec.derive_public_key(&private_key).map_err(|e| IdentityError::Corrupt {
            path: private_path.clone(),
            reason: e.to_string(),
        })?;

        match read_optional(&public_path)? {
            Some(public_pem) => {
                let public_key = PublicKeyPem::new(public_pem);
                if !public_key.same_key(&derived) {
                    return Err(IdentityError::Corrupt {
                        path: public_path,
                        reason: "public key does not match the private key".to_string(),
                    });
                }
                info!(keys_dir = %keys_dir.display(), "Loaded node identity");
                Ok(NodeIdentity { private_key, public_key })
            }
            None => {
                warn!(path = %public_path.display(), "Public key missing, restoring it from the private key");
                write_file(&public_path, derived.as_str().as_bytes())?;
                Ok(NodeIdentity { private_key, public_key: derived })
            }
        }
    }

    fn generate_identity(keys_dir: &Path, codec: &dyn EnvelopeCodec) -> Result<NodeIdentity, IdentityError> {
        std::fs::create_dir_all(keys_dir).map_err(|source| IdentityError::Write {
            path: keys_dir.to_path_buf(),
            source,
        })?;

        let identity = codec.generate_keypair()?;
        write_private_file(&keys_dir.join(PRIVATE_KEY_FILE), identity.private_key.as_str().as_bytes())?;
        write_file(&keys_dir.join(PUBLIC_KEY_FILE), identity.public_key.as_str().as_bytes())?;

        info!(keys_dir = %keys_dir.display(), "Generated new node identity");
        Ok(identity)
    }

    fn read_pairing(keys_dir: &Path, codec: &dyn EnvelopeCodec) -> Result<Option<PublicKeyPem>, IdentityError> {
        let path = keys_dir.join(CONTROLLER_KEY_FILE);
        let Some(pem) = read_optional(&path)? else {
            return Ok(None);
        };

        let key = PublicKeyPem::new(pem);
        codec.validate_public_key(&key).map_err(|e| IdentityError::Corrupt {
            path,
            reason: e.to_string(),
        })?;
        Ok(Some(key))
    }

    pub fn keys_dir(&self) -> &Path {
        &self.keys_dir
    }
}

impl IdentityRepository for FileIdentityStore {
    fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    fn load_pairing(&self) -> Option<PublicKeyPem> {
        self.pairing.lock().clone()
    }

    fn bind_pairing(&self, controller_key: &PublicKeyPem) -> Result<BindOutcome, IdentityError> {
        let mut pairing = self.pairing.lock();

        match pairing.as_ref() {
            Some(bound) if bound.same_key(controller_key) => Ok(BindOutcome::AlreadyBound),
            Some(_) => Ok(BindOutcome::Conflict),
            None => {
                let path = self.keys_dir.join(CONTROLLER_KEY_FILE);
                write_file(&path, controller_key.as_str().as_bytes())?;
                *pairing = Some(controller_key.clone());
                info!(path = %path.display(), "Bound node to panel key");
                Ok(BindOutcome::Bound)
            }
        }
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, IdentityError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(IdentityError::Read { path: path.to_path_buf(), source }),
    }
}

/// Write through a sibling temp file so a crash never leaves a half-written key.
fn write_file(path: &Path, contents: &[u8]) -> Result<(), IdentityError> {
    write_atomic(path, contents, false)
}

fn write_private_file(path: &Path, contents: &[u8]) -> Result<(), IdentityError> {
    write_atomic(path, contents, true)
}

fn write_atomic(path: &Path, contents: &[u8], owner_only: bool) -> Result<(), IdentityError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let to_err = |source: std::io::Error| IdentityError::Write { path: path.to_path_buf(), source };

    std::fs::write(&tmp, contents).map_err(to_err)?;

    #[cfg(unix)]
    if owner_only {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600)).map_err(to_err)?;
    }
    #[cfg(not(unix))]
    let _ = owner_only;

    std::fs::rename(&tmp, path).map_err(to_err)
}
