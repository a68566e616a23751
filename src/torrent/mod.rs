pub mod error;
pub mod infohash;
pub mod metadata;

pub use error::MetainfoError;
pub use infohash::{calculate_info_hash, hash_info_bytes};
pub use metadata::{get_bytestring, get_integer, lookup_bytestring, Torrent, TorrentInfo};
