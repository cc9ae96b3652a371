//! Per-peer key material and the onion layer wrap.
//!
//! Each peer registers a long-lived x25519 public key. One onion layer is a
//! sealed box against that key: a fresh ephemeral key pair per layer, an
//! x25519 agreement, and AES-256-CTR over the plaintext under a key derived
//! from the shared secret. The ephemeral public key travels in front of the
//! ciphertext, so every layer costs a fixed [`LAYER_OVERHEAD`] bytes and
//! the stream cipher adds none; the length discipline of the onion builder
//! depends on both properties.
use std::fmt;

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use thiserror::Error;
use x25519_dalek::{PublicKey, StaticSecret};

/// The length in bytes of a peer public key.
pub const PUBLIC_KEY_BYTES_LEN: usize = 32;

/// The fixed number of bytes one layer adds: the ephemeral public key that
/// precedes the layer ciphertext.
pub const LAYER_OVERHEAD: usize = 32;

type LayerCipher = Ctr128BE<Aes256>;

// One key encrypts exactly one layer, so a fixed IV cannot repeat a
// (key, IV) pair.
const LAYER_IV: [u8; 16] = [0u8; 16];

/// A peer's public key as registered with the tracker.
///
/// The tracker stores keys opaquely; it validates only the length.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct OnionPublicKey(PublicKey);

impl OnionPublicKey {
    /// Returns the raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_BYTES_LEN] {
        self.0.as_bytes()
    }

    /// Encrypts `plaintext` so only the holder of the matching secret can
    /// read it.
    ///
    /// The output is `ephemeral_public ‖ ciphertext` and is exactly
    /// [`LAYER_OVERHEAD`] bytes longer than the input.
    pub fn wrap<R: RngCore + CryptoRng>(&self, plaintext: &[u8], rng: &mut R) -> Vec<u8> {
        let ephemeral = StaticSecret::random_from_rng(&mut *rng);
        let ephemeral_public = PublicKey::from(&ephemeral);
        let shared = ephemeral.diffie_hellman(&self.0);

        let key = derive_layer_key(shared.as_bytes(), ephemeral_public.as_bytes(), self.as_bytes());

        let mut output = Vec::with_capacity(LAYER_OVERHEAD + plaintext.len());
        output.extend_from_slice(ephemeral_public.as_bytes());
        output.extend_from_slice(plaintext);

        let mut cipher = LayerCipher::new(&key.into(), &LAYER_IV.into());
        cipher.apply_keystream(&mut output[LAYER_OVERHEAD..]);

        output
    }
}

impl From<[u8; PUBLIC_KEY_BYTES_LEN]> for OnionPublicKey {
    fn from(bytes: [u8; PUBLIC_KEY_BYTES_LEN]) -> Self {
        Self(PublicKey::from(bytes))
    }
}

impl TryFrom<&[u8]> for OnionPublicKey {
    type Error = InvalidKeyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; PUBLIC_KEY_BYTES_LEN] = bytes
            .try_into()
            .map_err(|_| InvalidKeyError::InvalidLength { len: bytes.len() })?;
        Ok(Self::from(bytes))
    }
}

impl fmt::Debug for OnionPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.as_bytes();
        write!(
            f,
            "OnionPublicKey({:02x}{:02x}{:02x}{:02x}..)",
            bytes[0], bytes[1], bytes[2], bytes[3]
        )
    }
}

/// A full key pair, held by peers (and by tests standing in for peers).
///
/// The tracker itself only ever sees public halves; this type exists so the
/// unwrap side of a layer lives next to the wrap side.
pub struct OnionKeyPair {
    secret: StaticSecret,
    public: OnionPublicKey,
}

impl OnionKeyPair {
    /// Draws a fresh key pair from the given RNG.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let secret = StaticSecret::random_from_rng(&mut *rng);
        let public = OnionPublicKey(PublicKey::from(&secret));
        Self { secret, public }
    }

    /// Returns the public half.
    #[must_use]
    pub fn public(&self) -> &OnionPublicKey {
        &self.public
    }

    /// Decrypts one layer produced by [`OnionPublicKey::wrap`].
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is too short to carry an ephemeral key.
    pub fn unwrap(&self, blob: &[u8]) -> Result<Vec<u8>, UnwrapError> {
        if blob.len() < LAYER_OVERHEAD {
            return Err(UnwrapError::TooShort { len: blob.len() });
        }

        let ephemeral_bytes: [u8; PUBLIC_KEY_BYTES_LEN] =
            blob[..LAYER_OVERHEAD].try_into().expect("slice has the exact size");
        let ephemeral_public = PublicKey::from(ephemeral_bytes);
        let shared = self.secret.diffie_hellman(&ephemeral_public);

        let key = derive_layer_key(shared.as_bytes(), &ephemeral_bytes, self.public.as_bytes());

        let mut plaintext = blob[LAYER_OVERHEAD..].to_vec();
        let mut cipher = LayerCipher::new(&key.into(), &LAYER_IV.into());
        cipher.apply_keystream(&mut plaintext);

        Ok(plaintext)
    }
}

fn derive_layer_key(shared: &[u8; 32], ephemeral_public: &[u8; 32], recipient_public: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(shared);
    hasher.update(ephemeral_public);
    hasher.update(recipient_public);
    hasher.finalize().into()
}

/// Error raised when raw bytes cannot be used as a public key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidKeyError {
    #[error("invalid public key length: {len}, expected {PUBLIC_KEY_BYTES_LEN}")]
    InvalidLength { len: usize },
}

/// Error raised when a blob cannot be unwrapped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnwrapError {
    #[error("blob of {len} bytes is too short to be a layer")]
    TooShort { len: usize },
}
