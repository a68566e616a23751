//! The "omit if empty" rule for struct members.
//!
//! Use it as `#[serde(skip_serializing_if = "is_empty")]` on a field to drop
//! it from the encoded dictionary when it holds an empty string, sequence or
//! map, `false`, a numeric zero, or `None`.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use super::BValue;

pub trait IsEmpty {
    fn is_empty_value(&self) -> bool;
}

/// Generic entry point for `skip_serializing_if`.
pub fn is_empty<T: IsEmpty + ?Sized>(value: &T) -> bool {
    value.is_empty_value()
}

macro_rules! zero_is_empty {
    ($($t:ty),*) => {
        $(
            impl IsEmpty for $t {
                fn is_empty_value(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

zero_is_empty!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl IsEmpty for bool {
    fn is_empty_value(&self) -> bool {
        !*self
    }
}

impl IsEmpty for str {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl IsEmpty for String {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsEmpty for [T] {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T, const N: usize> IsEmpty for [T; N] {
    fn is_empty_value(&self) -> bool {
        N == 0
    }
}

impl<T> IsEmpty for Vec<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsEmpty for VecDeque<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl IsEmpty for serde_bytes::ByteBuf {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl IsEmpty for serde_bytes::Bytes {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsEmpty for BTreeSet<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T, S> IsEmpty for HashSet<T, S> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> IsEmpty for BTreeMap<K, V> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> IsEmpty for HashMap<K, V, S> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl IsEmpty for BValue {
    fn is_empty_value(&self) -> bool {
        match self {
            BValue::ByteString(b) => b.is_empty(),
            BValue::Integer(i) => *i == 0,
            BValue::List(l) => l.is_empty(),
            BValue::Dict(d) => d.is_empty(),
        }
    }
}

impl<T> IsEmpty for Option<T> {
    fn is_empty_value(&self) -> bool {
        self.is_none()
    }
}

impl<T: IsEmpty + ?Sized> IsEmpty for &T {
    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }
}

impl<T: IsEmpty + ?Sized> IsEmpty for Box<T> {
    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        assert!(is_empty(&0u32));
        assert!(is_empty(&0i64));
        assert!(is_empty(&false));
        assert!(is_empty(""));
        assert!(is_empty(&String::new()));
        assert!(is_empty(&Vec::<u8>::new()));
        assert!(is_empty(&BTreeMap::<String, i64>::new()));
        assert!(is_empty(&None::<String>));
        assert!(is_empty(&serde_bytes::ByteBuf::new()));
        assert!(is_empty(serde_bytes::Bytes::new(b"")));
        assert!(is_empty(&VecDeque::<i64>::new()));
        assert!(is_empty(&BTreeSet::<String>::new()));
        assert!(is_empty(&HashSet::<String>::new()));
    }

    #[test]
    fn test_bvalue_emptiness() {
        assert!(is_empty(&BValue::Integer(0)));
        assert!(is_empty(&BValue::string("")));
        assert!(is_empty(&BValue::List(vec![])));
        assert!(is_empty(&BValue::Dict(Default::default())));

        assert!(!is_empty(&BValue::Integer(-3)));
        assert!(!is_empty(&BValue::string("x")));
        assert!(!is_empty(&BValue::List(vec![BValue::Integer(0)])));
    }

    #[test]
    fn test_non_empty_values() {
        assert!(!is_empty(&-1i32));
        assert!(!is_empty(&true));
        assert!(!is_empty("a"));
        assert!(!is_empty(&vec![0u8]));
        assert!(!is_empty(&Some(0)));
        assert!(!is_empty(&[1u8; 20]));
    }
}
