use std::{cmp::Ordering, fmt};

use bytes::Bytes;

/// Immutable, cheaply clonable byte string used for keys and values.
///
/// Backed by `Bytes`, so cloning a key out of a cursor does not copy it.
/// Ordering is unsigned lexicographic byte order.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Slice {
    data: Bytes,
}

impl Slice {
    pub fn new(data: Vec<u8>) -> Self {
        Slice {
            data: Bytes::from(data),
        }
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        Slice {
            data: Bytes::copy_from_slice(data),
        }
    }

    pub fn empty() -> Self {
        Slice { data: Bytes::new() }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn compare(&self, other: &Slice) -> Ordering {
        self.data.cmp(&other.data)
    }

    pub fn starts_with(&self, prefix: &Slice) -> bool {
        self.data.starts_with(&prefix.data)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }
}

impl From<Vec<u8>> for Slice {
    fn from(data: Vec<u8>) -> Self {
        Slice::new(data)
    }
}

impl From<&[u8]> for Slice {
    fn from(data: &[u8]) -> Self {
        Slice::from_bytes(data)
    }
}

impl<const N: usize> From<&[u8; N]> for Slice {
    fn from(data: &[u8; N]) -> Self {
        Slice::from_bytes(data)
    }
}

impl From<String> for Slice {
    fn from(s: String) -> Self {
        Slice::new(s.into_bytes())
    }
}

impl From<&str> for Slice {
    fn from(s: &str) -> Self {
        Slice {
            data: Bytes::copy_from_slice(s.as_bytes()),
        }
    }
}

impl From<Bytes> for Slice {
    fn from(data: Bytes) -> Self {
        Slice { data }
    }
}

impl From<&Slice> for Slice {
    fn from(s: &Slice) -> Self {
        s.clone()
    }
}

impl AsRef<[u8]> for Slice {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl PartialOrd for Slice {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slice {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.data) {
            Ok(s) => write!(f, "Slice(\"{s}\")"),
            Err(_) => write!(f, "Slice({:?})", self.data.as_ref()),
        }
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.data) {
            Ok(s) => write!(f, "{s}"),
            Err(_) => write!(f, "{:?}", self.data.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_creation() {
        let s1 = Slice::from("hello");
        assert_eq!(s1.size(), 5);
        assert_eq!(s1.data(), b"hello");
    }

    #[test]
    fn test_slice_compare_is_unsigned() {
        let low = Slice::from(&[0x7Fu8]);
        let high = Slice::from(&[0x80u8]);
        assert!(low < high);
        assert_eq!(Slice::from("abc").compare(&Slice::from("abd")), Ordering::Less);
        assert_eq!(Slice::from("ab").compare(&Slice::from("abc")), Ordering::Less);
    }

    #[test]
    fn test_slice_clone_shares_storage() {
        let s = Slice::new(vec![1, 2, 3]);
        let t = s.clone();
        assert_eq!(s.data().as_ptr(), t.data().as_ptr());
    }

    #[test]
    fn test_slice_starts_with() {
        let s = Slice::from("hello world");
        assert!(s.starts_with(&Slice::from("hello")));
        assert!(s.starts_with(&Slice::empty()));
        assert!(!s.starts_with(&Slice::from("world")));
    }

    #[test]
    fn test_slice_display() {
        assert_eq!(Slice::from("abc").to_string(), "abc");
        assert_eq!(format!("{:?}", Slice::from(&[0xFFu8, 0x00])), "Slice([255, 0])");
    }
}
