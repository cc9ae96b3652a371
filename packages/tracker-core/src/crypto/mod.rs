//! Crypto primitives for the anonymizing tracker.
//!
//! The tracker composes onion layers but never reads plaintext inside one
//! beyond the single outermost layer it constructs. Three primitives cover
//! everything it needs:
//!
//! - [`keys`]: per-peer public keys and the fixed-overhead layer
//!   wrap/unwrap used by the onion builder.
//! - [`transfer`]: the symmetric key material handed out alongside each
//!   tracking code, for the end-to-end transfer the code sets up.
//! - [`random_padding`]: cryptographic random fill used to pad every onion
//!   to the fixed message length.
pub mod keys;
pub mod transfer;

use rand::{CryptoRng, RngCore};

/// Returns `len` cryptographic random bytes.
///
/// Onions shorter than the fixed message length are padded with this, so a
/// relay cannot tell how many layers remain from the blob it forwards.
pub fn random_padding<R: RngCore + CryptoRng>(len: usize, rng: &mut R) -> Vec<u8> {
    let mut padding = vec![0u8; len];
    rng.fill_bytes(&mut padding);
    padding
}
