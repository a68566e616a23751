use log::warn;

use super::error::BencodeError;
use super::token::{Spanned, Token};

/// Policies the lexer applies to borderline input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerOptions {
    /// Reject leading zeros and `-0` in integers and string lengths.
    pub strict_integers: bool,
    /// Skip ASCII whitespace between tokens. Plain bencode has none.
    pub allow_whitespace: bool,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            strict_integers: true,
            allow_whitespace: true,
        }
    }
}

/// Cursor over a byte buffer producing one [`Token`] per call.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    options: LexerOptions,
    warned_whitespace: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_options(input, LexerOptions::default())
    }

    pub fn with_options(input: &'a [u8], options: LexerOptions) -> Self {
        Self {
            input,
            pos: 0,
            options,
            warned_whitespace: false,
        }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    /// The unread part of the input.
    pub fn rest(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    /// Returns the next token, or `Ok(None)` once the input is exhausted.
    ///
    /// Running out of input is reported separately from the structural
    /// [`Token::End`] so a truncated container can never look closed.
    pub fn next_token(&mut self) -> Result<Option<Spanned<'a>>, BencodeError> {
        self.skip_whitespace();

        let offset = self.pos;
        let Some(&byte) = self.input.get(offset) else {
            return Ok(None);
        };

        let token = match byte {
            b'0'..=b'9' => self.read_byte_string()?,
            b'i' => self.read_integer()?,
            b'l' => {
                self.pos += 1;
                Token::ListStart
            }
            b'd' => {
                self.pos += 1;
                Token::DictStart
            }
            b'e' => {
                self.pos += 1;
                Token::End
            }
            byte => return Err(BencodeError::InvalidCharacter { byte, offset }),
        };

        Ok(Some(Spanned { token, offset }))
    }

    fn skip_whitespace(&mut self) {
        if !self.options.allow_whitespace {
            return;
        }
        let start = self.pos;
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if self.pos > start && !self.warned_whitespace {
            warn!("Skipping whitespace at offset {} (not valid bencode)", start);
            self.warned_whitespace = true;
        }
    }

    /// `i<digits>e`, cursor on the `i`.
    fn read_integer(&mut self) -> Result<Token<'a>, BencodeError> {
        let offset = self.pos;
        self.pos += 1; // skip 'i'

        let start = self.pos;
        if self.input.get(self.pos) == Some(&b'-') {
            self.pos += 1;
        }
        let digits_start = self.pos;
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        let digits = &self.input[digits_start..self.pos];

        match self.input.get(self.pos) {
            None => {
                return Err(malformed(offset, "missing 'e' terminator"));
            }
            Some(b'e') => {}
            Some(&other) => {
                return Err(malformed(
                    offset,
                    format!("unexpected byte {:?} before 'e'", char::from(other)),
                ));
            }
        }
        if digits.is_empty() {
            return Err(malformed(offset, "no digits"));
        }

        let text = &self.input[start..self.pos];
        if self.options.strict_integers {
            if digits.len() > 1 && digits[0] == b'0' {
                return Err(malformed(offset, "leading zeros are not allowed"));
            }
            if text == b"-0" {
                return Err(malformed(offset, "negative zero is not allowed"));
            }
        }

        let value = std::str::from_utf8(text)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| malformed(offset, "does not fit in 64 bits"))?;

        // add 1 to account for 'e'
        self.pos += 1;
        Ok(Token::Integer(value))
    }

    /// `<length>:<bytes>`, cursor on the first length digit.
    fn read_byte_string(&mut self) -> Result<Token<'a>, BencodeError> {
        let offset = self.pos;

        let mut length: usize = 0;
        let mut digit_count = 0;
        loop {
            match self.input.get(self.pos) {
                None => return Err(BencodeError::UnterminatedToken { offset }),
                Some(b':') => break,
                Some(&b) if b.is_ascii_digit() => {
                    length = length
                        .checked_mul(10)
                        .and_then(|l| l.checked_add(usize::from(b - b'0')))
                        .ok_or_else(|| malformed(offset, "string length overflows"))?;
                    digit_count += 1;
                    self.pos += 1;
                }
                Some(&byte) => {
                    return Err(BencodeError::InvalidCharacter {
                        byte,
                        offset: self.pos,
                    })
                }
            }
        }

        if self.options.strict_integers && digit_count > 1 && self.input[offset] == b'0' {
            return Err(malformed(offset, "leading zeros in string length"));
        }

        self.pos += 1; // skip ':'
        let remaining = self.remaining();
        if length > remaining {
            return Err(BencodeError::LengthOutOfBounds {
                length,
                offset,
                remaining,
            });
        }

        let bytes = &self.input[self.pos..self.pos + length];
        self.pos += length;
        Ok(Token::ByteString(bytes))
    }
}

fn malformed(offset: usize, reason: impl Into<String>) -> BencodeError {
    BencodeError::MalformedInteger {
        offset,
        reason: reason.into(),
    }
}
