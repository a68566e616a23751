use thiserror::Error;

use crate::bencode::BencodeError;

#[derive(Debug, Error)]
pub enum MetainfoError {
    #[error("Missing field '{0}'")]
    MissingField(&'static str),

    #[error("Field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Field 'pieces' has length {0}, not a multiple of 20")]
    BadPieces(usize),

    #[error("Bencode error: {0}")]
    Bencode(#[from] BencodeError),

    #[error("I/O error while reading torrent: {0}")]
    Io(#[from] std::io::Error),
}
