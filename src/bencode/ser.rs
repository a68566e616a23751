//! Generic bencode encoder built on `serde::Serializer`.
//!
//! Any `T: Serialize` can be encoded. Shapes map onto bencode as follows:
//!
//! | Rust shape | Bencode |
//! |------------|---------|
//! | `str`, `char`, bytes (`serde_bytes`) | `<len>:<bytes>` |
//! | any integer width | `i<n>e` |
//! | `Vec`, slices, arrays, tuples | `l...e` |
//! | maps with string-like keys, structs | `d...e`, keys sorted byte-wise |
//! | unit enum variant | its name as a byte string |
//! | other enum variants | `d<name><payload>e` |
//!
//! `bool`, floats, `()`, unit structs and `None` have no bencode form and fail
//! with [`BencodeError::UnsupportedType`]. Struct members are renamed with
//! `#[serde(rename = "...")]` and dropped when empty with
//! `#[serde(skip_serializing_if = "is_empty")]` (see [`super::empty`]).
//!
//! Plain `Vec<u8>` serializes as a list of integers, as serde reports it as a
//! sequence. Wrap byte fields with `serde_bytes` to get a byte string.
//!
//! Cyclic data cannot be expressed through `Serialize` without interior
//! mutability and is not detected.

use std::io::Write;
use std::ops::Range;

use log::debug;
use serde::ser::{self, Impossible, Serialize};

use super::encode::push_byte_string;
use super::error::BencodeError;

/// Encodes `value` into a fresh buffer.
pub fn to_bytes<T: ?Sized + Serialize>(value: &T) -> Result<Vec<u8>, BencodeError> {
    let encoded = value_bytes(value)?;
    debug!("Encoded {} bytes", encoded.len());
    Ok(encoded)
}

/// Encodes `value` and writes it to `sink`. Nothing is written if encoding fails.
pub fn encode<T: ?Sized + Serialize, W: Write>(value: &T, sink: &mut W) -> Result<(), BencodeError> {
    let encoded = to_bytes(value)?;
    sink.write_all(&encoded)?;
    Ok(())
}

fn value_bytes<T: ?Sized + Serialize>(value: &T) -> Result<Vec<u8>, BencodeError> {
    let mut serializer = Serializer::new();
    value.serialize(&mut serializer)?;
    Ok(serializer.into_inner())
}

#[derive(Debug, Default)]
pub struct Serializer {
    output: Vec<u8>,
}

impl Serializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.output
    }

    fn write_integer(&mut self, n: impl ToString) {
        self.output.push(b'i');
        self.output.extend_from_slice(n.to_string().as_bytes());
        self.output.push(b'e');
    }

    /// Opens the single-key dict that wraps a non-unit enum variant.
    fn open_variant(&mut self, variant: &str) {
        self.output.push(b'd');
        push_byte_string(variant.as_bytes(), &mut self.output);
    }
}

fn unsupported(type_name: &str) -> BencodeError {
    BencodeError::UnsupportedType(type_name.to_string())
}

impl<'a> ser::Serializer for &'a mut Serializer {
    type Ok = ();
    type Error = BencodeError;

    type SerializeSeq = ListEncoder<'a>;
    type SerializeTuple = ListEncoder<'a>;
    type SerializeTupleStruct = ListEncoder<'a>;
    type SerializeTupleVariant = ListEncoder<'a>;
    type SerializeMap = DictEncoder<'a>;
    type SerializeStruct = DictEncoder<'a>;
    type SerializeStructVariant = DictEncoder<'a>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, _v: bool) -> Result<(), BencodeError> {
        Err(unsupported("bool"))
    }

    fn serialize_i8(self, v: i8) -> Result<(), BencodeError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<(), BencodeError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<(), BencodeError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<(), BencodeError> {
        self.write_integer(v);
        Ok(())
    }

    fn serialize_i128(self, v: i128) -> Result<(), BencodeError> {
        self.write_integer(v);
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<(), BencodeError> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<(), BencodeError> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<(), BencodeError> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<(), BencodeError> {
        self.write_integer(v);
        Ok(())
    }

    fn serialize_u128(self, v: u128) -> Result<(), BencodeError> {
        self.write_integer(v);
        Ok(())
    }

    fn serialize_f32(self, _v: f32) -> Result<(), BencodeError> {
        Err(unsupported("f32"))
    }

    fn serialize_f64(self, _v: f64) -> Result<(), BencodeError> {
        Err(unsupported("f64"))
    }

    fn serialize_char(self, v: char) -> Result<(), BencodeError> {
        let mut buf = [0u8; 4];
        self.serialize_str(v.encode_utf8(&mut buf))
    }

    fn serialize_str(self, v: &str) -> Result<(), BencodeError> {
        self.serialize_bytes(v.as_bytes())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<(), BencodeError> {
        push_byte_string(v, &mut self.output);
        Ok(())
    }

    fn serialize_none(self) -> Result<(), BencodeError> {
        Err(unsupported("Option::None"))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<(), BencodeError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), BencodeError> {
        Err(unsupported("()"))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<(), BencodeError> {
        Err(unsupported(name))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<(), BencodeError> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), BencodeError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<(), BencodeError> {
        self.open_variant(variant);
        value.serialize(&mut *self)?;
        self.output.push(b'e');
        Ok(())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<ListEncoder<'a>, BencodeError> {
        Ok(ListEncoder::new(self, b"e"))
    }

    fn serialize_tuple(self, len: usize) -> Result<ListEncoder<'a>, BencodeError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<ListEncoder<'a>, BencodeError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<ListEncoder<'a>, BencodeError> {
        self.open_variant(variant);
        Ok(ListEncoder::new(self, b"ee"))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<DictEncoder<'a>, BencodeError> {
        Ok(DictEncoder::new(self, len.unwrap_or(0), b"e"))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<DictEncoder<'a>, BencodeError> {
        Ok(DictEncoder::new(self, len, b"e"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<DictEncoder<'a>, BencodeError> {
        self.open_variant(variant);
        Ok(DictEncoder::new(self, len, b"ee"))
    }
}

/// Streams list elements straight into the output.
pub struct ListEncoder<'a> {
    ser: &'a mut Serializer,
    closing: &'static [u8],
}

impl<'a> ListEncoder<'a> {
    fn new(ser: &'a mut Serializer, closing: &'static [u8]) -> Self {
        ser.output.push(b'l');
        Self { ser, closing }
    }

    fn element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), BencodeError> {
        value.serialize(&mut *self.ser)
    }

    fn finish(self) -> Result<(), BencodeError> {
        self.ser.output.extend_from_slice(self.closing);
        Ok(())
    }
}

impl ser::SerializeSeq for ListEncoder<'_> {
    type Ok = ();
    type Error = BencodeError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), BencodeError> {
        self.element(value)
    }

    fn end(self) -> Result<(), BencodeError> {
        self.finish()
    }
}

impl ser::SerializeTuple for ListEncoder<'_> {
    type Ok = ();
    type Error = BencodeError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), BencodeError> {
        self.element(value)
    }

    fn end(self) -> Result<(), BencodeError> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for ListEncoder<'_> {
    type Ok = ();
    type Error = BencodeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), BencodeError> {
        self.element(value)
    }

    fn end(self) -> Result<(), BencodeError> {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for ListEncoder<'_> {
    type Ok = ();
    type Error = BencodeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), BencodeError> {
        self.element(value)
    }

    fn end(self) -> Result<(), BencodeError> {
        self.finish()
    }
}

/// Writes entries straight into the output and reorders them on close
/// only when they arrived out of key order.
pub struct DictEncoder<'a> {
    ser: &'a mut Serializer,
    /// Output offset just past the opening `d`.
    body_start: usize,
    entries: Vec<(Vec<u8>, Range<usize>)>,
    in_order: bool,
    pending_key: Option<Vec<u8>>,
    closing: &'static [u8],
}

impl<'a> DictEncoder<'a> {
    fn new(ser: &'a mut Serializer, capacity: usize, closing: &'static [u8]) -> Self {
        ser.output.push(b'd');
        let body_start = ser.output.len();
        Self {
            ser,
            body_start,
            entries: Vec::with_capacity(capacity),
            in_order: true,
            pending_key: None,
            closing,
        }
    }

    fn entry<T: ?Sized + Serialize>(&mut self, key: Vec<u8>, value: &T) -> Result<(), BencodeError> {
        let start = self.ser.output.len();
        push_byte_string(&key, &mut self.ser.output);
        value.serialize(&mut *self.ser)?;
        let end = self.ser.output.len();

        if let Some((last, _)) = self.entries.last() {
            if key <= *last {
                self.in_order = false;
            }
        }
        self.entries.push((key, start..end));
        Ok(())
    }

    fn finish(mut self) -> Result<(), BencodeError> {
        if !self.in_order {
            self.entries.sort_by(|a, b| a.0.cmp(&b.0));
            if let Some(pair) = self.entries.windows(2).find(|pair| pair[0].0 == pair[1].0) {
                return Err(BencodeError::DuplicateMapKey(
                    String::from_utf8_lossy(&pair[0].0).into_owned(),
                ));
            }

            let body = self.ser.output.split_off(self.body_start);
            for (_, range) in &self.entries {
                let local = range.start - self.body_start..range.end - self.body_start;
                self.ser.output.extend_from_slice(&body[local]);
            }
        }

        self.ser.output.extend_from_slice(self.closing);
        Ok(())
    }
}

impl ser::SerializeMap for DictEncoder<'_> {
    type Ok = ();
    type Error = BencodeError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), BencodeError> {
        self.pending_key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), BencodeError> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| BencodeError::Custom("map value without a key".to_string()))?;
        self.entry(key, value)
    }

    fn end(self) -> Result<(), BencodeError> {
        self.finish()
    }
}

impl ser::SerializeStruct for DictEncoder<'_> {
    type Ok = ();
    type Error = BencodeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), BencodeError> {
        self.entry(key.as_bytes().to_vec(), value)
    }

    fn end(self) -> Result<(), BencodeError> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for DictEncoder<'_> {
    type Ok = ();
    type Error = BencodeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), BencodeError> {
        self.entry(key.as_bytes().to_vec(), value)
    }

    fn end(self) -> Result<(), BencodeError> {
        self.finish()
    }
}

/// Accepts only string-like map keys and returns their raw bytes.
struct KeySerializer;

fn invalid_key(type_name: &str) -> BencodeError {
    BencodeError::InvalidMapKeyType(type_name.to_string())
}

impl ser::Serializer for KeySerializer {
    type Ok = Vec<u8>;
    type Error = BencodeError;

    type SerializeSeq = Impossible<Vec<u8>, BencodeError>;
    type SerializeTuple = Impossible<Vec<u8>, BencodeError>;
    type SerializeTupleStruct = Impossible<Vec<u8>, BencodeError>;
    type SerializeTupleVariant = Impossible<Vec<u8>, BencodeError>;
    type SerializeMap = Impossible<Vec<u8>, BencodeError>;
    type SerializeStruct = Impossible<Vec<u8>, BencodeError>;
    type SerializeStructVariant = Impossible<Vec<u8>, BencodeError>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_str(self, v: &str) -> Result<Vec<u8>, BencodeError> {
        Ok(v.as_bytes().to_vec())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Vec<u8>, BencodeError> {
        Ok(v.to_vec())
    }

    fn serialize_char(self, v: char) -> Result<Vec<u8>, BencodeError> {
        let mut buf = [0u8; 4];
        Ok(v.encode_utf8(&mut buf).as_bytes().to_vec())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Vec<u8>, BencodeError> {
        value.serialize(self)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Vec<u8>, BencodeError> {
        Ok(variant.as_bytes().to_vec())
    }

    fn serialize_bool(self, _v: bool) -> Result<Vec<u8>, BencodeError> {
        Err(invalid_key("bool"))
    }

    fn serialize_i8(self, _v: i8) -> Result<Vec<u8>, BencodeError> {
        Err(invalid_key("i8"))
    }

    fn serialize_i16(self, _v: i16) -> Result<Vec<u8>, BencodeError> {
        Err(invalid_key("i16"))
    }

    fn serialize_i32(self, _v: i32) -> Result<Vec<u8>, BencodeError> {
        Err(invalid_key("i32"))
    }

    fn serialize_i64(self, _v: i64) -> Result<Vec<u8>, BencodeError> {
        Err(invalid_key("i64"))
    }

    fn serialize_i128(self, _v: i128) -> Result<Vec<u8>, BencodeError> {
        Err(invalid_key("i128"))
    }

    fn serialize_u8(self, _v: u8) -> Result<Vec<u8>, BencodeError> {
        Err(invalid_key("u8"))
    }

    fn serialize_u16(self, _v: u16) -> Result<Vec<u8>, BencodeError> {
        Err(invalid_key("u16"))
    }

    fn serialize_u32(self, _v: u32) -> Result<Vec<u8>, BencodeError> {
        Err(invalid_key("u32"))
    }

    fn serialize_u64(self, _v: u64) -> Result<Vec<u8>, BencodeError> {
        Err(invalid_key("u64"))
    }

    fn serialize_u128(self, _v: u128) -> Result<Vec<u8>, BencodeError> {
        Err(invalid_key("u128"))
    }

    fn serialize_f32(self, _v: f32) -> Result<Vec<u8>, BencodeError> {
        Err(invalid_key("f32"))
    }

    fn serialize_f64(self, _v: f64) -> Result<Vec<u8>, BencodeError> {
        Err(invalid_key("f64"))
    }

    fn serialize_none(self) -> Result<Vec<u8>, BencodeError> {
        Err(invalid_key("Option::None"))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, _value: &T) -> Result<Vec<u8>, BencodeError> {
        Err(invalid_key("Option"))
    }

    fn serialize_unit(self) -> Result<Vec<u8>, BencodeError> {
        Err(invalid_key("()"))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Vec<u8>, BencodeError> {
        Err(invalid_key(name))
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Vec<u8>, BencodeError> {
        Err(invalid_key(name))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, BencodeError> {
        Err(invalid_key("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, BencodeError> {
        Err(invalid_key("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, BencodeError> {
        Err(invalid_key(name))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, BencodeError> {
        Err(invalid_key(name))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, BencodeError> {
        Err(invalid_key("map"))
    }

    fn serialize_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, BencodeError> {
        Err(invalid_key(name))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, BencodeError> {
        Err(invalid_key(name))
    }
}
