//! Encrypted envelope and record payload encoding.
//!
//! An envelope is `salt (16 bytes) || fernet token`. The Fernet key is
//! derived per envelope with PBKDF2-HMAC-SHA256 over the shared secret and
//! the envelope's own salt, so encrypting the same payload twice never
//! yields the same bytes.
//!
//! Payloads are JSON normalized to Unicode NFC before encryption and again
//! after decryption, so records compare equal across platforms that disagree
//! on normalization.

use std::sync::LazyLock;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use fernet::Fernet;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::Sha256;
use unicode_normalization::UnicodeNormalization;

use crate::error::CodecError;

/// Length of the random salt prefixed to every envelope.
pub const SALT_LEN: usize = 16;

/// PBKDF2 rounds used to stretch the secret.
pub const KDF_ITERATIONS: u32 = 100_000;

/// Secret shared by every install that predates configurable secrets.
static LEGACY_SECRET: LazyLock<Vec<u8>> = LazyLock::new(|| {
    STANDARD
        .decode("ZnVja3k0MmZ1bmt5NDJmdWM0Mmtpbmc0MndvcmxkNDI=")
        .expect("legacy secret is valid base64")
});

/// Encrypts and decrypts record envelopes with one secret.
#[derive(Clone)]
pub struct Envelope {
    secret: Vec<u8>,
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope").field("secret", &"***").finish()
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::legacy()
    }
}

impl Envelope {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// The built-in secret, able to open files written by earlier installs.
    pub fn legacy() -> Self {
        Self::new(LEGACY_SECRET.clone())
    }

    fn cipher(&self, salt: &[u8]) -> Result<Fernet, CodecError> {
        let key = pbkdf2::pbkdf2_hmac_array::<Sha256, 32>(&self.secret, salt, KDF_ITERATIONS);
        Fernet::new(&URL_SAFE.encode(key)).ok_or(CodecError::Key)
    }

    /// Encrypt `plaintext` under a fresh random salt.
    pub fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>, CodecError> {
        let salt: [u8; SALT_LEN] = rand::random();
        let token = self.cipher(&salt)?.encrypt(plaintext.as_bytes());

        let mut out = Vec::with_capacity(SALT_LEN + token.len());
        out.extend_from_slice(&salt);
        out.extend_from_slice(token.as_bytes());
        Ok(out)
    }

    /// Decrypt an envelope produced by [`Envelope::encrypt`].
    pub fn decrypt(&self, data: &[u8]) -> Result<String, CodecError> {
        if data.len() <= SALT_LEN {
            tracing::debug!(len = data.len(), "envelope shorter than its salt");
            return Err(CodecError::Authentication);
        }
        let (salt, token) = data.split_at(SALT_LEN);
        let token = std::str::from_utf8(token).map_err(|_| CodecError::Authentication)?;
        let plaintext = self.cipher(salt)?.decrypt(token.trim_end()).map_err(|_| {
            tracing::debug!("envelope failed to authenticate");
            CodecError::Authentication
        })?;
        Ok(String::from_utf8(plaintext)?)
    }
}

/// Encode records as NFC-normalized JSON.
pub fn to_payload<T: Serialize>(records: &[T]) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(records)?;
    Ok(json.nfc().collect())
}

/// Decode NFC-normalized JSON records. Blank input is an empty collection.
pub fn from_payload<T: DeserializeOwned>(payload: &str) -> Result<Vec<T>, CodecError> {
    if payload.trim().is_empty() {
        return Ok(Vec::new());
    }
    let normalized: String = payload.nfc().collect();
    Ok(serde_json::from_str(&normalized)?)
}

/// Serialize and encrypt records.
pub fn seal<T: Serialize>(envelope: &Envelope, records: &[T]) -> Result<Vec<u8>, CodecError> {
    envelope.encrypt(&to_payload(records)?)
}

/// Decrypt and deserialize records. Empty input is an empty collection and
/// is never decrypted.
pub fn open<T: DeserializeOwned>(envelope: &Envelope, data: &[u8]) -> Result<Vec<T>, CodecError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    from_payload(&envelope.decrypt(data)?)
}
