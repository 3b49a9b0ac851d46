// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Hybrid RSA / AES-GCM envelope codec
//!
//! `wrap` seals the body with a fresh AES-256-GCM key and wraps that key with
//! RSA-OAEP (SHA-256) for the recipient:
//!
//! ```text
//! encrypted = base64(nonce[12] || aes_gcm(body))
//! key       = base64(rsa_oaep(aes_key[32]))
//! ```
//!
//! Private keys are PKCS#8 PEM, public keys SPKI PEM.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand_core::{OsRng, RngCore};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::domain::envelope::{
    CodecError, Envelope, EnvelopeCodec, NodeIdentity, PrivateKeyPem, PublicKeyPem,
};

pub const DEFAULT_KEY_BITS: usize = 2048;

const NONCE_LEN: usize = 12;
const CONTENT_KEY_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct RsaEnvelopeCodec {
    key_bits: usize,
}

impl RsaEnvelopeCodec {
    pub fn new() -> Self {
        Self { key_bits: DEFAULT_KEY_BITS }
    }

    /// Codec generating keys of a different modulus size. OAEP with SHA-256
    /// needs at least 1024 bits to carry the 32-byte content key.
    pub fn with_key_bits(key_bits: usize) -> Self {
        Self { key_bits }
    }

    pub fn key_bits(&self) -> usize {
        self.key_bits
    }

    fn parse_private(private_key: &PrivateKeyPem) -> Result<RsaPrivateKey, CodecError> {
        RsaPrivateKey::from_pkcs8_pem(private_key.as_str().trim())
            .map_err(|e| CodecError::InvalidPrivateKey(e.to_string()))
    }

    fn parse_public(public_key: &PublicKeyPem) -> Result<RsaPublicKey, CodecError> {
        RsaPublicKey::from_public_key_pem(public_key.as_str().trim())
            .map_err(|e| CodecError::InvalidPublicKey(e.to_string()))
    }

    fn encode_public(public_key: &RsaPublicKey) -> Result<PublicKeyPem, CodecError> {
        public_key
            .to_public_key_pem(LineEnding::LF)
            .map(PublicKeyPem::new)
            .map_err(|e| CodecError::InvalidPublicKey(e.to_string()))
    }
}

impl Default for RsaEnvelopeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeCodec for RsaEnvelopeCodec {
    fn generate_keypair(&self) -> Result<NodeIdentity, CodecError> {
        let private = RsaPrivateKey::new(&mut OsRng, self.key_bits)
            .map_err(|e| CodecError::KeyGeneration(e.to_string()))?;
        let public = RsaPublicKey::from(&private);

        let private_pem = private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CodecError::KeyGeneration(e.to_string()))?;

        Ok(NodeIdentity {
            private_key: PrivateKeyPem::new(private_pem.as_str()),
            public_key: Self::encode_public(&public)?,
        })
    }

    fn derive_public_key(&self, private_key: &PrivateKeyPem) -> Result<PublicKeyPem, CodecError> {
        let private = Self::parse_private(private_key)?;
        Self::encode_public(&RsaPublicKey::from(&private))
    }

    fn validate_public_key(&self, public_key: &PublicKeyPem) -> Result<(), CodecError> {
        Self::parse_public(public_key).map(|_| ())
    }

    fn wrap(&self, recipient: &PublicKeyPem, plaintext: &[u8]) -> Result<Envelope, CodecError> {
        let public = Self::parse_public(recipient)?;

        let mut content_key = [0u8; CONTENT_KEY_LEN];
        OsRng.fill_bytes(&mut content_key);
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let cipher = Aes256Gcm::new_from_slice(&content_key)
            .map_err(|e| CodecError::EncryptionFailed(e.to_string()))?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| CodecError::EncryptionFailed(e.to_string()))?;

        let wrapped_key = public
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &content_key)
            .map_err(|e| CodecError::EncryptionFailed(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);

        Ok(Envelope {
            encrypted: STANDARD.encode(sealed),
            key: STANDARD.encode(wrapped_key),
        })
    }

    fn unwrap(&self, private_key: &PrivateKeyPem, envelope: &Envelope) -> Result<Vec<u8>, CodecError> {
        let private = Self::parse_private(private_key)?;

        let wrapped_key = STANDARD
            .decode(envelope.key.trim())
            .map_err(|e| CodecError::MalformedEnvelope(format!("key: {}", e)))?;
        let sealed = STANDARD
            .decode(envelope.encrypted.trim())
            .map_err(|e| CodecError::MalformedEnvelope(format!("encrypted: {}", e)))?;

        if sealed.len() <= NONCE_LEN {
            return Err(CodecError::MalformedEnvelope("ciphertext too short".to_string()));
        }

        let content_key = private
            .decrypt(Oaep::new::<Sha256>(), &wrapped_key)
            .map_err(|_| CodecError::DecryptionFailed)?;
        if content_key.len() != CONTENT_KEY_LEN {
            return Err(CodecError::DecryptionFailed);
        }

        let cipher = Aes256Gcm::new_from_slice(&content_key).map_err(|_| CodecError::DecryptionFailed)?;
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CodecError::DecryptionFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codec() -> RsaEnvelopeCodec {
        RsaEnvelopeCodec::with_key_bits(1024)
    }

    #[test]
    fn test_envelope_roundtrip() {
        let codec = codec();
        let recipient = codec.generate_keypair().unwrap();

        let body = serde_json::to_vec(&json!({
            "path": "/docs",
            "nested": {"list": [1, 2, 3], "unicode": "héllo"},
        }))
        .unwrap();

        let envelope = codec.wrap(&recipient.public_key, &body).unwrap();
        assert_ne!(envelope.encrypted.as_bytes(), body.as_slice());

        let opened = codec.unwrap(&recipient.private_key, &envelope).unwrap();
        assert_eq!(opened, body);
    }

    #[test]
    fn test_each_wrap_uses_fresh_key() {
        let codec = codec();
        let recipient = codec.generate_keypair().unwrap();

        let a = codec.wrap(&recipient.public_key, b"same body").unwrap();
        let b = codec.wrap(&recipient.public_key, b"same body").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_fails() {
        let codec = codec();
        let recipient = codec.generate_keypair().unwrap();
        let stranger = codec.generate_keypair().unwrap();

        let envelope = codec.wrap(&recipient.public_key, b"{}").unwrap();
        let result = codec.unwrap(&stranger.private_key, &envelope);
        assert!(matches!(result, Err(CodecError::DecryptionFailed)));
    }

    #[test]
    fn test_malformed_envelope_fails() {
        let codec = codec();
        let recipient = codec.generate_keypair().unwrap();

        let garbage = Envelope { encrypted: "%%%".into(), key: "%%%".into() };
        assert!(matches!(
            codec.unwrap(&recipient.private_key, &garbage),
            Err(CodecError::MalformedEnvelope(_))
        ));

        let mut tampered = codec.wrap(&recipient.public_key, b"{\"a\":1}").unwrap();
        let mut sealed = STANDARD.decode(&tampered.encrypted).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        tampered.encrypted = STANDARD.encode(sealed);
        assert!(matches!(
            codec.unwrap(&recipient.private_key, &tampered),
            Err(CodecError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_derive_and_validate_public_key() {
        let codec = codec();
        let identity = codec.generate_keypair().unwrap();

        let derived = codec.derive_public_key(&identity.private_key).unwrap();
        assert!(derived.same_key(&identity.public_key));

        assert!(codec.validate_public_key(&identity.public_key).is_ok());
        assert!(matches!(
            codec.validate_public_key(&PublicKeyPem::new("not a key")),
            Err(CodecError::InvalidPublicKey(_))
        ));
        assert!(matches!(
            codec.derive_public_key(&PrivateKeyPem::new("not a key")),
            Err(CodecError::InvalidPrivateKey(_))
        ));
    }
}
