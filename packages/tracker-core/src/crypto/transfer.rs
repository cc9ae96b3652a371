//! Symmetric key material for the transfer a tracking code sets up.
//!
//! Every tracking code is paired with a freshly generated AES-256 key and
//! IV. The pair travels back to the announcing peer in the clear half of
//! the `(key ‖ iv, onion)` tuple and, inside the onion payload, to the
//! anonymous destination, giving both ends a shared secret no relay ever
//! sees.
use rand::{CryptoRng, Rng};

/// The length in bytes of a transfer key.
pub const TRANSFER_KEY_BYTES_LEN: usize = 32;

/// The length in bytes of a transfer IV.
pub const TRANSFER_IV_BYTES_LEN: usize = 16;

/// A fresh AES-256 key and IV.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TransferKey {
    key: [u8; TRANSFER_KEY_BYTES_LEN],
    iv: [u8; TRANSFER_IV_BYTES_LEN],
}

impl TransferKey {
    /// Draws fresh key material from the given RNG.
    pub fn generate<R: Rng + CryptoRng>(rng: &mut R) -> Self {
        let mut key = [0u8; TRANSFER_KEY_BYTES_LEN];
        let mut iv = [0u8; TRANSFER_IV_BYTES_LEN];
        rng.fill(&mut key);
        rng.fill(&mut iv);
        Self { key, iv }
    }

    /// Returns `key ‖ iv` as one buffer, the form used on the wire and in
    /// onion payloads.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(TRANSFER_KEY_BYTES_LEN + TRANSFER_IV_BYTES_LEN);
        bytes.extend_from_slice(&self.key);
        bytes.extend_from_slice(&self.iv);
        bytes
    }
}

#[cfg(test)]
mod tests {

    mod the_transfer_key {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        use crate::crypto::transfer::{TransferKey, TRANSFER_IV_BYTES_LEN, TRANSFER_KEY_BYTES_LEN};

        #[test]
        fn its_wire_form_should_be_key_then_iv() {
            let mut rng = StdRng::seed_from_u64(7);

            let transfer_key = TransferKey::generate(&mut rng);

            assert_eq!(transfer_key.to_bytes().len(), TRANSFER_KEY_BYTES_LEN + TRANSFER_IV_BYTES_LEN);
        }

        #[test]
        fn two_draws_should_differ() {
            let mut rng = StdRng::seed_from_u64(7);

            let first = TransferKey::generate(&mut rng);
            let second = TransferKey::generate(&mut rng);

            assert_ne!(first.to_bytes(), second.to_bytes());
        }
    }
}
