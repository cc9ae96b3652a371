//! Whitelist manager: fills the allowed list from the allowed directory.
//!
//! The directory is walked recursively for `.torrent` files. For each
//! file, the info hash is the SHA-1 of the raw bencoded `info` dictionary:
//! the exact byte span from the original file, not a re-encoding, so the
//! hash matches what clients compute. Files that do not parse are skipped
//! with a log line; a bad torrent in the directory must not take the
//! rescan down.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anomos_tracker_primitives::info_hash::InfoHash;
use serde::Deserialize;
use sha1::{Digest, Sha1};

use super::repository::{AllowedTorrent, InMemoryWhitelist};

/// Keeps the in-memory allowed list in sync with the allowed directory.
pub struct WhitelistManager {
    allowed_dir: Option<PathBuf>,
    in_memory_whitelist: Arc<InMemoryWhitelist>,
}

impl WhitelistManager {
    #[must_use]
    pub fn new(allowed_dir: Option<&Path>, in_memory_whitelist: &Arc<InMemoryWhitelist>) -> Self {
        Self {
            allowed_dir: allowed_dir.map(Path::to_path_buf),
            in_memory_whitelist: in_memory_whitelist.clone(),
        }
    }

    /// Rescans the allowed directory and replaces the allowed list with
    /// what was found. Returns the number of allowed torrents.
    ///
    /// A tracker without an allowed directory has nothing to scan; the
    /// list is left untouched then.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory itself cannot be read.
    /// Individual unreadable or unparsable torrent files are skipped.
    pub async fn rescan(&self) -> Result<usize, std::io::Error> {
        let Some(allowed_dir) = &self.allowed_dir else {
            return Ok(0);
        };

        let mut entries = BTreeMap::new();
        scan_dir(allowed_dir, &mut entries)?;

        let count = entries.len();
        self.in_memory_whitelist.replace_all(entries).await;
        Ok(count)
    }

    /// Seeds the allowed list from a persisted state snapshot. Entries
    /// already present (from a rescan) win over the persisted ones.
    pub async fn seed_from_state(&self, allowed: &BTreeMap<InfoHash, String>) {
        for (info_hash, name) in allowed {
            if !self.in_memory_whitelist.contains(info_hash).await {
                let _unused = self
                    .in_memory_whitelist
                    .add(
                        info_hash,
                        AllowedTorrent {
                            name: name.clone(),
                            path: None,
                        },
                    )
                    .await;
            }
        }
    }
}

fn scan_dir(dir: &Path, entries: &mut BTreeMap<InfoHash, AllowedTorrent>) -> Result<(), std::io::Error> {
    for dir_entry in std::fs::read_dir(dir)? {
        let path = dir_entry?.path();
        if path.is_dir() {
            scan_dir(&path, entries)?;
            continue;
        }
        if path.extension().is_some_and(|extension| extension == "torrent") {
            match read_torrent(&path) {
                Ok((info_hash, entry)) => {
                    entries.insert(info_hash, entry);
                }
                Err(e) => {
                    tracing::warn!("skipping torrent file {}: {e}", path.display());
                }
            }
        }
    }
    Ok(())
}

fn read_torrent(path: &Path) -> Result<(InfoHash, AllowedTorrent), std::io::Error> {
    let bytes = std::fs::read(path)?;
    let (info_hash, name) =
        parse_metainfo(&bytes).ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidData, "not a metainfo file"))?;

    let name = name.unwrap_or_else(|| {
        path.file_stem()
            .map_or_else(|| "unnamed".to_owned(), |stem| stem.to_string_lossy().into_owned())
    });

    Ok((
        info_hash,
        AllowedTorrent {
            name,
            path: Some(path.to_path_buf()),
        },
    ))
}

/// The subset of the metainfo the tracker cares about.
#[derive(Deserialize)]
struct Metainfo {
    info: MetainfoInfo,
}

#[derive(Deserialize)]
struct MetainfoInfo {
    #[serde(default)]
    name: Option<serde_bytes::ByteBuf>,
}

/// Extracts the info hash and torrent name from raw metainfo bytes.
fn parse_metainfo(bytes: &[u8]) -> Option<(InfoHash, Option<String>)> {
    let info_slice = info_dict_slice(bytes)?;

    let digest: [u8; 20] = Sha1::digest(info_slice).into();
    let info_hash = InfoHash::from(digest);

    let name = serde_bencode::from_bytes::<Metainfo>(bytes)
        .ok()
        .and_then(|metainfo| metainfo.info.name)
        .map(|name| String::from_utf8_lossy(&name).into_owned());

    Some((info_hash, name))
}

/// Returns the exact byte span of the top-level `info` dictionary.
fn info_dict_slice(bytes: &[u8]) -> Option<&[u8]> {
    if *bytes.first()? != b'd' {
        return None;
    }
    let mut pos = 1;
    while *bytes.get(pos)? != b'e' {
        let (key, key_end) = parse_string(bytes, pos)?;
        let value_end = element_end(bytes, key_end)?;
        if key == b"info" {
            return Some(&bytes[key_end..value_end]);
        }
        pos = value_end;
    }
    None
}

/// Parses a bencode byte string at `pos`; returns it and the end offset.
fn parse_string(bytes: &[u8], pos: usize) -> Option<(&[u8], usize)> {
    let colon = bytes[pos..].iter().position(|byte| *byte == b':')? + pos;
    let len: usize = std::str::from_utf8(&bytes[pos..colon]).ok()?.parse().ok()?;
    let end = colon + 1 + len;
    if end > bytes.len() {
        return None;
    }
    Some((&bytes[colon + 1..end], end))
}

/// Returns the offset one past the bencode element starting at `pos`.
fn element_end(bytes: &[u8], pos: usize) -> Option<usize> {
    match bytes.get(pos)? {
        b'i' => {
            let end = bytes[pos..].iter().position(|byte| *byte == b'e')? + pos;
            Some(end + 1)
        }
        b'0'..=b'9' => parse_string(bytes, pos).map(|(_, end)| end),
        b'l' => {
            let mut p = pos + 1;
            while *bytes.get(p)? != b'e' {
                p = element_end(bytes, p)?;
            }
            Some(p + 1)
        }
        b'd' => {
            let mut p = pos + 1;
            while *bytes.get(p)? != b'e' {
                let (_, key_end) = parse_string(bytes, p)?;
                p = element_end(bytes, key_end)?;
            }
            Some(p + 1)
        }
        _ => None,
    }
}
