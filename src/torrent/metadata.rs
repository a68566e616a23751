use std::fs;
use std::path::Path;

use log::debug;
use serde::{Serialize, Serializer};

use crate::bencode::{decode_bencode_with, dict_value_span, BValue, DecoderOptions, Dict};
use crate::torrent::{calculate_info_hash, hash_info_bytes, MetainfoError};

/// Represents a .torrent file, including the announce URL and the associated info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Torrent {
    pub announce: String,       // The tracker URL
    pub info: TorrentInfo,      // Torrent metadata
    #[serde(skip)]
    pub info_hash: [u8; 20],    // Infohash
}

/// Contains detailed metadata about the torrent's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TorrentInfo {
    pub length: u64,            // Total size of the file
    pub name: String,           // Name of the file
    #[serde(rename = "piece length")]
    pub piece_length: u64,      // Size of each piece
    #[serde(serialize_with = "serialize_pieces")]
    pub pieces: Vec<[u8; 20]>,  // SHA-1 hashes are 20 bytes each
}

/// `pieces` goes on the wire as one concatenated byte string.
fn serialize_pieces<S: Serializer>(pieces: &[[u8; 20]], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_bytes(&pieces.concat())
}

impl Torrent {
    /// Reads a .torrent file from disk and parses its contents.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MetainfoError> {
        let path = path.as_ref();
        let buf = fs::read(path)?;
        debug!("Read {} bytes from {}", buf.len(), path.display());
        Self::from_bytes(&buf, &DecoderOptions::default())
    }

    /// Parses a .torrent held in memory. The info hash covers the raw `info`
    /// bytes, so non-canonical files hash the way other clients hash them.
    pub fn from_bytes(buf: &[u8], options: &DecoderOptions) -> Result<Self, MetainfoError> {
        let bvalue = decode_bencode_with(buf, options)?;
        let mut torrent = Self::from_bvalue(&bvalue)?;
        if let Some(span) = dict_value_span(buf, b"info", options)? {
            torrent.info_hash = hash_info_bytes(&buf[span]);
        }
        Ok(torrent)
    }

    /// Creates a `Torrent` from a decoded top-level `BValue`.
    ///
    /// The raw bytes are gone by now, so `info_hash` is taken over the
    /// canonical re-encoding of `info`.
    pub fn from_bvalue(value: &BValue) -> Result<Self, MetainfoError> {
        let root_dict = value.as_dict().map_err(|_| MetainfoError::WrongType {
            field: "<root>",
            expected: "a dictionary",
        })?;

        let announce = get_bytestring(root_dict, "announce")?;

        let info_value = root_dict
            .get(b"info".as_slice())
            .ok_or(MetainfoError::MissingField("info"))?;
        let info_dict = info_value.as_dict().map_err(|_| MetainfoError::WrongType {
            field: "info",
            expected: "a dictionary",
        })?;

        let info = TorrentInfo::from_dict(info_dict)?;
        let info_hash = calculate_info_hash(info_value);

        Ok(Torrent {
            announce,
            info,
            info_hash,
        })
    }
}

impl TorrentInfo {
    pub fn from_dict(info_dict: &Dict) -> Result<Self, MetainfoError> {
        let name = get_bytestring(info_dict, "name")?;
        let length = get_integer(info_dict, "length")?;
        let piece_length = get_integer(info_dict, "piece length")?;
        let pieces_bytes = lookup_bytestring(info_dict, "pieces")?;

        if pieces_bytes.len() % 20 != 0 {
            return Err(MetainfoError::BadPieces(pieces_bytes.len()));
        }

        // Chunk the pieces bytes into 20-byte pieces.
        let pieces = pieces_bytes
            .chunks_exact(20)
            .map(|chunk| {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(chunk);
                hash
            })
            .collect();

        Ok(TorrentInfo {
            length,
            name,
            piece_length,
            pieces,
        })
    }
}

fn lookup<'a>(dict: &'a Dict, key: &'static str) -> Result<&'a BValue, MetainfoError> {
    dict.get(key.as_bytes())
        .ok_or(MetainfoError::MissingField(key))
}

/// Looks up a key in the dictionary and returns a byte slice if the value is a ByteString.
pub fn lookup_bytestring<'a>(dict: &'a Dict, key: &'static str) -> Result<&'a [u8], MetainfoError> {
    lookup(dict, key)?
        .as_bytes()
        .map_err(|_| MetainfoError::WrongType {
            field: key,
            expected: "a byte string",
        })
}

/// Gets a ByteString from the dictionary as a UTF-8 String.
pub fn get_bytestring(dict: &Dict, key: &'static str) -> Result<String, MetainfoError> {
    let bytes = lookup_bytestring(dict, key)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| MetainfoError::WrongType {
        field: key,
        expected: "UTF-8 text",
    })
}

/// Retrieves a non-negative integer value from the dictionary.
pub fn get_integer(dict: &Dict, key: &'static str) -> Result<u64, MetainfoError> {
    let wrong_type = || MetainfoError::WrongType {
        field: key,
        expected: "a non-negative integer",
    };
    let value = lookup(dict, key)?.as_integer().map_err(|_| wrong_type())?;
    u64::try_from(value).map_err(|_| wrong_type())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use sha1::{Digest, Sha1};

    use super::*;
    use crate::bencode::to_bytes;

    fn raw_info() -> &'static [u8] {
        let start = SAMPLE.windows(6).position(|w| w == b"4:info").unwrap() + 6;
        &SAMPLE[start..SAMPLE.len() - 1]
    }

    const SAMPLE: &[u8] =
        b"d8:announce23:http://tracker/announce4:infod6:lengthi92063e4:name10:sample.txt12:piece lengthi32768e6:pieces40:AAAAAAAAAAAAAAAAAAAABBBBBBBBBBBBBBBBBBBBee";

    #[test]
    fn test_parse_torrent() {
        let torrent = Torrent::from_bytes(SAMPLE, &DecoderOptions::default()).unwrap();
        assert_eq!(torrent.announce, "http://tracker/announce");
        assert_eq!(torrent.info.name, "sample.txt");
        assert_eq!(torrent.info.length, 92063);
        assert_eq!(torrent.info.piece_length, 32768);
        assert_eq!(torrent.info.pieces, vec![[b'A'; 20], [b'B'; 20]]);
    }

    #[test]
    fn test_info_hash_matches_raw_info_bytes() {
        let torrent = Torrent::from_bytes(SAMPLE, &DecoderOptions::default()).unwrap();
        let expected = Sha1::digest(raw_info());
        assert_eq!(torrent.info_hash.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_info_hash_of_unsorted_info() {
        let raw: &[u8] = b"d6:pieces0:4:name1:a12:piece lengthi1e6:lengthi1ee";
        let mut input = b"d8:announce1:a4:info".to_vec();
        input.extend_from_slice(raw);
        input.push(b'e');

        let torrent = Torrent::from_bytes(&input, &DecoderOptions::default()).unwrap();
        assert_eq!(torrent.info_hash.as_slice(), Sha1::digest(raw).as_slice());

        let value = decode_bencode_with(&input, &DecoderOptions::default()).unwrap();
        let reencoded = Torrent::from_bvalue(&value).unwrap();
        assert_ne!(reencoded.info_hash, torrent.info_hash);
    }

    #[test]
    fn test_serialize_torrent_round_trip() {
        let torrent = Torrent::from_bytes(SAMPLE, &DecoderOptions::default()).unwrap();
        assert_eq!(to_bytes(&torrent).unwrap(), SAMPLE);
        assert_eq!(to_bytes(&torrent.info).unwrap(), raw_info());
    }

    #[test]
    fn test_missing_fields() {
        let no_announce = b"d4:infod6:lengthi1e4:name1:a12:piece lengthi1e6:pieces0:ee";
        assert!(matches!(
            Torrent::from_bytes(no_announce, &DecoderOptions::default()),
            Err(MetainfoError::MissingField("announce"))
        ));

        let no_info = b"d8:announce1:ae";
        assert!(matches!(
            Torrent::from_bytes(no_info, &DecoderOptions::default()),
            Err(MetainfoError::MissingField("info"))
        ));

        let no_pieces = b"d8:announce1:a4:infod6:lengthi1e4:name1:a12:piece lengthi1eee";
        assert!(matches!(
            Torrent::from_bytes(no_pieces, &DecoderOptions::default()),
            Err(MetainfoError::MissingField("pieces"))
        ));
    }

    #[test]
    fn test_wrong_types() {
        assert!(matches!(
            Torrent::from_bytes(b"li1ee", &DecoderOptions::default()),
            Err(MetainfoError::WrongType { field: "<root>", .. })
        ));
        assert!(matches!(
            Torrent::from_bytes(b"d8:announcei1e4:infodee", &DecoderOptions::default()),
            Err(MetainfoError::WrongType { field: "announce", .. })
        ));
        assert!(matches!(
            Torrent::from_bytes(b"d8:announce1:a4:info1:xe", &DecoderOptions::default()),
            Err(MetainfoError::WrongType { field: "info", .. })
        ));
        let negative = b"d8:announce1:a4:infod6:lengthi-1e4:name1:a12:piece lengthi1e6:pieces0:ee";
        assert!(matches!(
            Torrent::from_bytes(negative, &DecoderOptions::default()),
            Err(MetainfoError::WrongType { field: "length", .. })
        ));
        let string_length = b"d8:announce1:a4:infod6:length1:14:name1:a12:piece lengthi1e6:pieces0:ee";
        assert!(matches!(
            Torrent::from_bytes(string_length, &DecoderOptions::default()),
            Err(MetainfoError::WrongType { field: "length", .. })
        ));
    }

    #[test]
    fn test_bad_pieces_length() {
        let input = b"d8:announce1:a4:infod6:lengthi1e4:name1:a12:piece lengthi1e6:pieces3:abcee";
        assert!(matches!(
            Torrent::from_bytes(input, &DecoderOptions::default()),
            Err(MetainfoError::BadPieces(3))
        ));
    }

    #[test]
    fn test_decode_error_propagates() {
        assert!(matches!(
            Torrent::from_bytes(b"d8:announce", &DecoderOptions::default()),
            Err(MetainfoError::Bencode(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE).unwrap();
        let torrent = Torrent::from_file(file.path()).unwrap();
        assert_eq!(torrent.info.name, "sample.txt");

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Torrent::from_file(dir.path().join("missing.torrent")),
            Err(MetainfoError::Io(_))
        ));
    }
}
