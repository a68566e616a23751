use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::error::BencodeError;

pub type Dict = BTreeMap<Vec<u8>, BValue>;

/// A decoded bencode value.
///
/// Dictionary keys are raw bytes held in a `BTreeMap`, so iteration order is
/// always the canonical ascending byte-wise order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BValue {
    ByteString(Vec<u8>), // raw bytes, not necessarily UTF-8
    Integer(i64),
    List(Vec<BValue>),
    Dict(Dict),
}

impl BValue {
    pub fn string(s: &str) -> Self {
        BValue::ByteString(s.as_bytes().to_vec())
    }

    /// Name of the variant, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            BValue::ByteString(_) => "byte string",
            BValue::Integer(_) => "integer",
            BValue::List(_) => "list",
            BValue::Dict(_) => "dict",
        }
    }

    fn mismatch(&self, expected: &'static str) -> BencodeError {
        BencodeError::TypeMismatch {
            expected,
            actual: self.type_name(),
        }
    }

    pub fn as_integer(&self) -> Result<i64, BencodeError> {
        match self {
            BValue::Integer(i) => Ok(*i),
            other => Err(other.mismatch("integer")),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8], BencodeError> {
        match self {
            BValue::ByteString(b) => Ok(b),
            other => Err(other.mismatch("byte string")),
        }
    }

    /// The byte string as UTF-8 text. Invalid UTF-8 is reported as a mismatch.
    pub fn as_str(&self) -> Result<&str, BencodeError> {
        std::str::from_utf8(self.as_bytes()?).map_err(|_| self.mismatch("UTF-8 string"))
    }

    pub fn as_list(&self) -> Result<&[BValue], BencodeError> {
        match self {
            BValue::List(l) => Ok(l),
            other => Err(other.mismatch("list")),
        }
    }

    pub fn as_dict(&self) -> Result<&Dict, BencodeError> {
        match self {
            BValue::Dict(d) => Ok(d),
            other => Err(other.mismatch("dict")),
        }
    }

    pub fn into_dict(self) -> Result<Dict, BencodeError> {
        match self {
            BValue::Dict(d) => Ok(d),
            other => Err(other.mismatch("dict")),
        }
    }

    /// Looks up `key` if this is a dictionary. `Ok(None)` when the key is absent.
    pub fn get(&self, key: &[u8]) -> Result<Option<&BValue>, BencodeError> {
        Ok(self.as_dict()?.get(key))
    }
}

impl From<i64> for BValue {
    fn from(i: i64) -> Self {
        BValue::Integer(i)
    }
}

impl From<&str> for BValue {
    fn from(s: &str) -> Self {
        BValue::string(s)
    }
}

impl From<Vec<u8>> for BValue {
    fn from(b: Vec<u8>) -> Self {
        BValue::ByteString(b)
    }
}

impl From<Vec<BValue>> for BValue {
    fn from(l: Vec<BValue>) -> Self {
        BValue::List(l)
    }
}

impl From<Dict> for BValue {
    fn from(d: Dict) -> Self {
        BValue::Dict(d)
    }
}

impl Serialize for BValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BValue::Integer(i) => serializer.serialize_i64(*i),
            BValue::ByteString(b) => serializer.serialize_bytes(b),
            BValue::List(items) => serializer.collect_seq(items),
            BValue::Dict(dict) => {
                let mut map = serializer.serialize_map(Some(dict.len()))?;
                for (key, value) in dict {
                    map.serialize_entry(serde_bytes::Bytes::new(key), value)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BValue {
        let mut dict = Dict::new();
        dict.insert(b"n".to_vec(), BValue::Integer(7));
        dict.insert(b"s".to_vec(), BValue::string("seven"));
        dict.insert(b"raw".to_vec(), BValue::ByteString(vec![0xff, 0xfe]));
        dict.insert(b"l".to_vec(), BValue::List(vec![1i64.into(), "x".into()]));
        BValue::Dict(dict)
    }

    #[test]
    fn test_accessors() {
        let value = sample();
        assert_eq!(value.get(b"n").unwrap().unwrap().as_integer().unwrap(), 7);
        assert_eq!(value.get(b"s").unwrap().unwrap().as_str().unwrap(), "seven");
        assert_eq!(value.get(b"l").unwrap().unwrap().as_list().unwrap().len(), 2);
        assert!(value.get(b"missing").unwrap().is_none());
    }

    #[test]
    fn test_type_mismatch_names_both_variants() {
        let value = sample();
        match value.as_integer() {
            Err(BencodeError::TypeMismatch { expected, actual }) => {
                assert_eq!(expected, "integer");
                assert_eq!(actual, "dict");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            BValue::Integer(1).get(b"k"),
            Err(BencodeError::TypeMismatch { expected: "dict", .. })
        ));
    }

    #[test]
    fn test_non_utf8_string() {
        let value = sample();
        let raw = value.get(b"raw").unwrap().unwrap();
        assert_eq!(raw.as_bytes().unwrap(), &[0xff, 0xfe]);
        assert!(matches!(
            raw.as_str(),
            Err(BencodeError::TypeMismatch { expected: "UTF-8 string", .. })
        ));
    }

    #[test]
    fn test_dict_keys_iterate_sorted() {
        let value = sample();
        let keys: Vec<&[u8]> = value
            .as_dict()
            .unwrap()
            .keys()
            .map(|k| k.as_slice())
            .collect();
        assert_eq!(keys, vec![&b"l"[..], b"n", b"raw", b"s"]);
    }
}
