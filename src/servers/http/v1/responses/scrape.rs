//! The `scrape` response.
//!
//! The `files` dictionary of a scrape reply is keyed by the *raw 20-byte*
//! info hashes. Raw binary keys do not fit a serde map with string keys,
//! so the body is assembled with a small bencode writer. Keys come from a
//! `BTreeMap` and are therefore already sorted, as bencode requires.
use std::collections::BTreeMap;

use anomos_tracker_core::scrape_handler::ScrapeData;
use anomos_tracker_primitives::info_hash::InfoHash;

/// The torrent names to include per swarm, when names are shown.
pub type ScrapeNames = BTreeMap<InfoHash, String>;

/// Builds the bencoded body of a scrape reply.
#[must_use]
pub fn body(scrape_data: &ScrapeData, names: &ScrapeNames) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"d5:filesd");

    for (info_hash, metadata) in &scrape_data.files {
        write_bytes(&mut out, info_hash.as_bytes());

        out.push(b'd');
        write_str(&mut out, "complete");
        write_int(&mut out, metadata.complete);
        write_str(&mut out, "downloaded");
        write_int(&mut out, metadata.downloaded);
        write_str(&mut out, "incomplete");
        write_int(&mut out, metadata.incomplete);
        if let Some(name) = names.get(info_hash) {
            write_str(&mut out, "name");
            write_str(&mut out, name);
        }
        out.push(b'e');
    }

    out.extend_from_slice(b"ee");
    out
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(bytes.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(bytes);
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    write_bytes(out, s.as_bytes());
}

fn write_int(out: &mut Vec<u8>, value: u32) {
    out.push(b'i');
    out.extend_from_slice(value.to_string().as_bytes());
    out.push(b'e');
}

#[cfg(test)]
mod tests {

    mod the_scrape_response {
        use std::collections::BTreeMap;

        use anomos_tracker_core::scrape_handler::ScrapeData;
        use anomos_tracker_primitives::info_hash::InfoHash;
        use anomos_tracker_primitives::swarm_metadata::SwarmMetadata;

        use crate::servers::http::v1::responses::scrape::body;

        fn sample_info_hash() -> InfoHash {
            InfoHash::from([0x41u8; 20])
        }

        #[test]
        fn an_empty_scrape_should_be_an_empty_files_dictionary() {
            let scrape_body = body(&ScrapeData::empty(), &BTreeMap::new());

            assert_eq!(scrape_body, b"d5:filesdee");
        }

        #[test]
        fn the_files_should_be_keyed_by_the_raw_info_hash() {
            let mut scrape_data = ScrapeData::empty();
            scrape_data.add_file(
                &sample_info_hash(),
                SwarmMetadata {
                    complete: 1,
                    downloaded: 2,
                    incomplete: 3,
                },
            );

            let scrape_body = body(&scrape_data, &BTreeMap::new());

            let expected =
                b"d5:filesd20:AAAAAAAAAAAAAAAAAAAAd8:completei1e10:downloadedi2e10:incompletei3eeee".to_vec();
            assert_eq!(scrape_body, expected);
        }

        #[test]
        fn a_known_name_should_be_included() {
            let mut scrape_data = ScrapeData::empty();
            scrape_data.add_file(&sample_info_hash(), SwarmMetadata::zeroed());

            let mut names = BTreeMap::new();
            names.insert(sample_info_hash(), "debian.iso".to_owned());

            let scrape_body = body(&scrape_data, &names);

            assert!(String::from_utf8_lossy(&scrape_body).contains("4:name10:debian.iso"));
        }
    }
}
