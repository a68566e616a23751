use std::ops::Range;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use super::bvalue::{BValue, Dict};
use super::error::BencodeError;
use super::lexer::{Lexer, LexerOptions};
use super::token::{Spanned, Token};

/// What to do when a dictionary repeats a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeys {
    Reject,
    LastWins,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Deepest list/dict nesting accepted. `None` means unbounded.
    pub max_depth: Option<usize>,
    pub strict_integers: bool,
    pub allow_whitespace: bool,
    pub duplicate_keys: DuplicateKeys,
    /// Reject dictionaries whose keys are not in ascending byte order.
    pub require_sorted_keys: bool,
    pub allow_trailing_data: bool,
}

pub const DEFAULT_MAX_DEPTH: usize = 512;

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            max_depth: Some(DEFAULT_MAX_DEPTH),
            strict_integers: true,
            allow_whitespace: true,
            duplicate_keys: DuplicateKeys::Reject,
            require_sorted_keys: false,
            allow_trailing_data: false,
        }
    }
}

impl DecoderOptions {
    /// Tolerant settings: last duplicate wins, non-canonical integers pass.
    pub fn lenient() -> Self {
        Self {
            strict_integers: false,
            duplicate_keys: DuplicateKeys::LastWins,
            ..Self::default()
        }
    }

    /// Only canonical bencode is accepted.
    pub fn canonical() -> Self {
        Self {
            allow_whitespace: false,
            require_sorted_keys: true,
            ..Self::default()
        }
    }

    fn lexer_options(&self) -> LexerOptions {
        LexerOptions {
            strict_integers: self.strict_integers,
            allow_whitespace: self.allow_whitespace,
        }
    }
}

/// Recursive-descent decoder over the [`Lexer`] token stream.
pub struct Decoder<'a> {
    lexer: Lexer<'a>,
    options: DecoderOptions,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_options(input, DecoderOptions::default())
    }

    pub fn with_options(input: &'a [u8], options: DecoderOptions) -> Self {
        Self {
            lexer: Lexer::with_options(input, options.lexer_options()),
            options,
        }
    }

    pub fn position(&self) -> usize {
        self.lexer.position()
    }

    /// Decodes the next top-level value. `Ok(None)` means the input is exhausted.
    pub fn decode_next(&mut self) -> Result<Option<BValue>, BencodeError> {
        match self.lexer.next_token()? {
            None => Ok(None),
            Some(spanned) => self.parse_value(spanned, 0).map(Some),
        }
    }

    /// True once only (allowed) whitespace is left.
    fn at_end(&self) -> bool {
        let rest = self.lexer.rest();
        if self.options.allow_whitespace {
            rest.iter().all(|b| b.is_ascii_whitespace())
        } else {
            rest.is_empty()
        }
    }

    fn parse_value(&mut self, spanned: Spanned<'a>, depth: usize) -> Result<BValue, BencodeError> {
        match spanned.token {
            Token::Integer(i) => Ok(BValue::Integer(i)),
            Token::ByteString(bytes) => Ok(BValue::ByteString(bytes.to_vec())),
            Token::ListStart => {
                self.check_depth(depth + 1, spanned.offset)?;
                self.parse_list(spanned.offset, depth + 1)
            }
            Token::DictStart => {
                self.check_depth(depth + 1, spanned.offset)?;
                self.parse_dict(spanned.offset, depth + 1)
            }
            Token::End => Err(BencodeError::UnexpectedEndToken {
                offset: spanned.offset,
            }),
        }
    }

    fn check_depth(&self, depth: usize, offset: usize) -> Result<(), BencodeError> {
        match self.options.max_depth {
            Some(max_depth) if depth > max_depth => {
                Err(BencodeError::DepthExceeded { max_depth, offset })
            }
            _ => Ok(()),
        }
    }

    /// Next token inside a container; running out of input here is a truncation.
    fn next_in_container(&mut self) -> Result<Spanned<'a>, BencodeError> {
        self.lexer
            .next_token()?
            .ok_or(BencodeError::UnexpectedEof {
                offset: self.lexer.position(),
            })
    }

    fn parse_list(&mut self, offset: usize, depth: usize) -> Result<BValue, BencodeError> {
        trace!("list at offset {} (depth {})", offset, depth);
        let mut items = Vec::new();

        loop {
            let spanned = self.next_in_container()?;
            if spanned.token == Token::End {
                break;
            }
            items.push(self.parse_value(spanned, depth)?);
        }

        Ok(BValue::List(items))
    }

    fn parse_dict(&mut self, offset: usize, depth: usize) -> Result<BValue, BencodeError> {
        trace!("dict at offset {} (depth {})", offset, depth);
        let mut map = Dict::new();
        let mut previous: Option<&'a [u8]> = None;

        loop {
            let spanned = self.next_in_container()?;
            let key = match spanned.token {
                Token::End => break,
                Token::ByteString(key) => key,
                _ => {
                    return Err(BencodeError::ExpectedStringKey {
                        offset: spanned.offset,
                    })
                }
            };

            if let Some(prev) = previous {
                if key < prev {
                    if self.options.require_sorted_keys {
                        return Err(BencodeError::UnsortedKey {
                            key: String::from_utf8_lossy(key).into_owned(),
                            offset: spanned.offset,
                        });
                    }
                    debug!(
                        "Dictionary key {:?} at offset {} is out of order",
                        String::from_utf8_lossy(key),
                        spanned.offset
                    );
                }
            }
            previous = Some(key);

            let value_token = self.next_in_container()?;
            let value = self.parse_value(value_token, depth)?;

            if map.contains_key(key) {
                match self.options.duplicate_keys {
                    DuplicateKeys::Reject => {
                        return Err(BencodeError::DuplicateKey {
                            key: String::from_utf8_lossy(key).into_owned(),
                            offset: spanned.offset,
                        })
                    }
                    DuplicateKeys::LastWins => warn!(
                        "Duplicate key {:?} at offset {}, keeping the last value",
                        String::from_utf8_lossy(key),
                        spanned.offset
                    ),
                }
            }
            map.insert(key.to_vec(), value);
        }

        Ok(BValue::Dict(map))
    }
}

/// Decodes exactly one value spanning the whole input, with default options.
pub fn decode_bencode(input: &[u8]) -> Result<BValue, BencodeError> {
    decode_bencode_with(input, &DecoderOptions::default())
}

pub fn decode_bencode_with(input: &[u8], options: &DecoderOptions) -> Result<BValue, BencodeError> {
    let mut decoder = Decoder::with_options(input, options.clone());
    let value = decoder.decode_next()?.ok_or(BencodeError::EmptyInput)?;

    if !options.allow_trailing_data && !decoder.at_end() {
        return Err(BencodeError::TrailingData {
            offset: decoder.position(),
        });
    }

    debug!("Decoded {} {} bytes", value.type_name(), decoder.position());
    Ok(value)
}

/// Decodes the first value and returns how many bytes it used.
/// Anything after it is left alone.
pub fn decode_prefix(input: &[u8]) -> Result<(usize, BValue), BencodeError> {
    let mut decoder = Decoder::new(input);
    let value = decoder.decode_next()?.ok_or(BencodeError::EmptyInput)?;
    Ok((decoder.position(), value))
}

/// Where the value stored under `key` in a top-level dictionary sits in
/// `input`. When `key` repeats, the last occurrence is reported.
/// `Ok(None)` if the input is not a dictionary or has no such key.
pub fn dict_value_span(
    input: &[u8],
    key: &[u8],
    options: &DecoderOptions,
) -> Result<Option<Range<usize>>, BencodeError> {
    let mut decoder = Decoder::with_options(input, options.clone());
    let first = decoder.lexer.next_token()?.ok_or(BencodeError::EmptyInput)?;
    if first.token != Token::DictStart {
        return Ok(None);
    }

    let mut found = None;
    loop {
        let spanned = decoder.next_in_container()?;
        let current = match spanned.token {
            Token::End => return Ok(found),
            Token::ByteString(current) => current,
            _ => {
                return Err(BencodeError::ExpectedStringKey {
                    offset: spanned.offset,
                })
            }
        };

        let value_token = decoder.next_in_container()?;
        let start = value_token.offset;
        decoder.parse_value(value_token, 1)?;
        if current == key {
            found = Some(start..decoder.position());
        }
    }
}
