//! Raw query-string parsing.
//!
//! Announce parameters are not UTF-8: `info_hash` and `peer_id` are raw
//! 20-byte values, percent-encoded. The standard form decoders all insist
//! on strings, so this parser keeps values as byte buffers and only
//! treats the *keys* as text. Duplicate keys are kept because the
//! `failed` parameter repeats.
use percent_encoding::percent_decode_str;

/// A parsed query string with byte-valued parameters.
#[derive(Debug, Clone, Default)]
pub struct Query {
    params: Vec<(String, Vec<u8>)>,
}

impl Query {
    /// Parses a raw query string (without the leading `?`).
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut params = Vec::new();

        for pair in raw.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = match pair.split_once('=') {
                Some((key, value)) => (key, value),
                None => (pair, ""),
            };
            let key = percent_decode_str(key).decode_utf8_lossy().into_owned();
            let value: Vec<u8> = percent_decode_str(value).collect();
            params.push((key, value));
        }

        Self { params }
    }

    /// The first value of `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.params
            .iter()
            .find(|(param_key, _)| param_key == key)
            .map(|(_, value)| value.as_slice())
    }

    /// All values of `key`, in request order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Vec<&[u8]> {
        self.params
            .iter()
            .filter(|(param_key, _)| param_key == key)
            .map(|(_, value)| value.as_slice())
            .collect()
    }

    /// Whether `key` appears at all, with or without a value.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.params.iter().any(|(param_key, _)| param_key == key)
    }

    /// The first value of `key` as UTF-8 text.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|value| std::str::from_utf8(value).ok())
    }
}
