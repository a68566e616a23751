use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BencodeError {
    // lexer
    #[error("Invalid character 0x{byte:02x} at offset {offset}")]
    InvalidCharacter { byte: u8, offset: usize },

    #[error("Byte string of length {length} at offset {offset} overruns input ({remaining} bytes left)")]
    LengthOutOfBounds {
        length: usize,
        offset: usize,
        remaining: usize,
    },

    #[error("Malformed integer at offset {offset}: {reason}")]
    MalformedInteger { offset: usize, reason: String },

    #[error("Unterminated token starting at offset {offset}")]
    UnterminatedToken { offset: usize },

    // decoder
    #[error("Expected a byte string key at offset {offset}")]
    ExpectedStringKey { offset: usize },

    #[error("Nesting deeper than {max_depth} levels at offset {offset}")]
    DepthExceeded { max_depth: usize, offset: usize },

    #[error("Duplicate dictionary key {key:?} at offset {offset}")]
    DuplicateKey { key: String, offset: usize },

    #[error("Dictionary key {key:?} at offset {offset} is out of order")]
    UnsortedKey { key: String, offset: usize },

    #[error("Unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("Unexpected end marker at offset {offset}")]
    UnexpectedEndToken { offset: usize },

    #[error("Empty input")]
    EmptyInput,

    #[error("Trailing data after value at offset {offset}")]
    TrailingData { offset: usize },

    // accessors
    #[error("Type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    // encoder
    #[error("Cannot encode value of type {0}")]
    UnsupportedType(String),

    #[error("Dictionary keys must be strings or bytes, found {0}")]
    InvalidMapKeyType(String),

    #[error("Key {0:?} is emitted more than once")]
    DuplicateMapKey(String),

    #[error("{0}")]
    Custom(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl serde::ser::Error for BencodeError {
    fn custom<T: Display>(msg: T) -> Self {
        BencodeError::Custom(msg.to_string())
    }
}
