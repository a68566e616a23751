pub mod bvalue;
pub mod decode;
pub mod empty;
pub mod encode;
pub mod error;
pub mod lexer;
pub mod ser;
pub mod token;

pub use bvalue::{BValue, Dict};   // re-export
pub use decode::{decode_bencode, decode_bencode_with, decode_prefix, dict_value_span, Decoder, DecoderOptions, DuplicateKeys};   // re-export
pub use empty::{is_empty, IsEmpty};
pub use encode::{bvalue_to_json, encode_bvalue, write_bvalue};   // re-export
pub use error::BencodeError;
pub use lexer::{Lexer, LexerOptions};
pub use ser::{encode, to_bytes, Serializer};
pub use token::{Spanned, Token};
