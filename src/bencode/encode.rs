use std::io::Write;

use serde_json::{json, Value};

use super::error::BencodeError;
use super::BValue;

/// Encode a `BValue` back into a bencoded `Vec<u8>`.
///
/// Dictionaries come out in ascending byte-wise key order, so decoding
/// canonical input and encoding it again reproduces the input exactly.
pub fn encode_bvalue(value: &BValue) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    push_bvalue(value, &mut out);
    out
}

fn push_bvalue(value: &BValue, out: &mut Vec<u8>) {
    match value {
        BValue::Integer(i) => {
            out.push(b'i');
            out.extend_from_slice(i.to_string().as_bytes());
            out.push(b'e');
        }
        BValue::ByteString(bytes) => push_byte_string(bytes, out),
        BValue::List(items) => {
            out.push(b'l');
            for item in items {
                push_bvalue(item, out);
            }
            out.push(b'e');
        }
        BValue::Dict(dict) => {
            out.push(b'd');
            // BTreeMap iterates keys in ascending byte order
            for (key, val) in dict {
                push_byte_string(key, out);
                push_bvalue(val, out);
            }
            out.push(b'e');
        }
    }
}

pub(crate) fn push_byte_string(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(bytes.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(bytes);
}

/// Writes the canonical encoding of `value` to `sink`.
pub fn write_bvalue<W: Write>(value: &BValue, sink: &mut W) -> Result<(), BencodeError> {
    sink.write_all(&encode_bvalue(value))?;
    Ok(())
}

/// Convert a `BValue` into JSON (using Serde JSON `Value`).
///
/// - `Integer(i)` => JSON number
/// - `ByteString(bytes)` => Attempt UTF-8; if invalid, store hex in `"_bytes_hex"`.
/// - `List(...)` => JSON array
/// - `Dict(...)` => JSON object, keys converted lossily
pub fn bvalue_to_json(bv: &BValue) -> Value {
    match bv {
        BValue::Integer(i) => json!(i),
        BValue::ByteString(bytes) => match std::str::from_utf8(bytes) {
            Ok(utf8_str) => Value::String(utf8_str.to_string()),
            Err(_) => json!({ "_bytes_hex": hex::encode(bytes) }),
        },
        BValue::List(list_items) => Value::Array(list_items.iter().map(bvalue_to_json).collect()),
        BValue::Dict(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                json_map.insert(String::from_utf8_lossy(k).into_owned(), bvalue_to_json(v));
            }
            Value::Object(json_map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bencode::{decode_bencode, Dict};

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode_bvalue(&BValue::Integer(42)), b"i42e");
        assert_eq!(encode_bvalue(&BValue::Integer(-42)), b"i-42e");
        assert_eq!(encode_bvalue(&BValue::Integer(0)), b"i0e");
        assert_eq!(encode_bvalue(&BValue::string("test")), b"4:test");
        assert_eq!(encode_bvalue(&BValue::ByteString(vec![])), b"0:");
    }

    #[test]
    fn test_encode_dict_sorted() {
        let mut dict = Dict::new();
        dict.insert(b"foo".to_vec(), BValue::Integer(1));
        dict.insert(b"bar".to_vec(), BValue::Integer(2));
        assert_eq!(encode_bvalue(&BValue::Dict(dict)), b"d3:bari2e3:fooi1ee");
    }

    #[test]
    fn test_integer_round_trip() {
        for n in [0, 1, -1, 42, -42, 1 << 40, i64::MAX, i64::MIN] {
            let encoded = encode_bvalue(&BValue::Integer(n));
            assert_eq!(decode_bencode(&encoded).unwrap(), BValue::Integer(n));
        }
    }

    #[test]
    fn test_byte_string_round_trip() {
        let all: Vec<u8> = (0..=255).collect();
        for bytes in [vec![], b"e".to_vec(), b"12:x".to_vec(), all] {
            let encoded = encode_bvalue(&BValue::ByteString(bytes.clone()));
            assert_eq!(decode_bencode(&encoded).unwrap(), BValue::ByteString(bytes));
        }
    }

    #[test]
    fn test_canonical_input_round_trip() {
        let inputs: [&[u8]; 5] = [
            b"le",
            b"de",
            b"li42e4:teste",
            b"d3:bar3:baz4:dictd4:listli1ei2e5:threeee3:fooi42ee",
            b"d8:announce3:url4:infod6:lengthi10e4:name1:a12:piece lengthi5e6:pieces0:ee",
        ];
        for input in inputs {
            let value = decode_bencode(input).unwrap();
            assert_eq!(encode_bvalue(&value), input);
        }
    }

    #[test]
    fn test_non_canonical_input_is_sorted() {
        let value = decode_bencode(b"d3:fooi42e3:bar3:baze").unwrap();
        assert_eq!(encode_bvalue(&value), b"d3:bar3:baz3:fooi42ee");
    }

    #[test]
    fn test_write_bvalue_to_sink() {
        let mut sink = Vec::new();
        write_bvalue(&BValue::List(vec![1i64.into(), "a".into()]), &mut sink).unwrap();
        assert_eq!(sink, b"li1e1:ae");
    }

    #[test]
    fn test_bvalue_to_json() {
        let value = decode_bencode(b"d3:bin2:\xff\xfe4:listli1e1:xe4:name3:abce").unwrap();
        assert_eq!(
            bvalue_to_json(&value),
            json!({
                "bin": { "_bytes_hex": "fffe" },
                "list": [1, "x"],
                "name": "abc",
            })
        );
    }
}
