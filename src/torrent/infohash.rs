// infohash.rs
use sha1::{Digest, Sha1};

use crate::bencode::{encode_bvalue, BValue};

/// SHA-1 over the canonical encoding of the `info` dictionary.
///
/// For a canonical .torrent this equals the hash of the `info` bytes as they
/// appear in the file.
pub fn calculate_info_hash(info: &BValue) -> [u8; 20] {
    hash_info_bytes(&encode_bvalue(info))
}

/// SHA-1 over the `info` dictionary bytes exactly as they appear in a file.
pub fn hash_info_bytes(raw: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(raw);
    let result = hasher.finalize();

    let mut hash_bytes = [0u8; 20];
    hash_bytes.copy_from_slice(&result);
    hash_bytes
}
