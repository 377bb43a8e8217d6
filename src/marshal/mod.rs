//! Typed views over byte keys and values.
//!
//! A `Marshal` type converts itself to and from bytes. Integer encodings are
//! big-endian, with the sign bit flipped for signed types, so the byte order
//! of encoded values equals their numeric order and typed ranges behave
//! like byte ranges.

use crate::util::{Result, Slice, Status};

pub trait Marshal: Sized {
    fn to_bytes(&self) -> Vec<u8>;

    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

/// A `Marshal` type whose encoding always has the same length.
///
/// Only fixed-width types may appear before the last element of a
/// marshalled tuple, since decoding has to know where each part ends.
pub trait FixedWidth: Marshal {
    const WIDTH: usize;
}

impl Marshal for Vec<u8> {
    fn to_bytes(&self) -> Vec<u8> {
        self.clone()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bytes.to_vec())
    }
}

impl Marshal for Slice {
    fn to_bytes(&self) -> Vec<u8> {
        self.to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Slice::from(bytes))
    }
}

impl Marshal for String {
    fn to_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Status::corruption(format!("invalid utf-8: {e}")))
    }
}

fn fixed<const N: usize>(bytes: &[u8], type_name: &str) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        Status::corruption(format!(
            "{type_name} needs {N} bytes, got {}",
            bytes.len()
        ))
    })
}

macro_rules! marshal_unsigned {
    ($($t:ty),*) => {$(
        impl Marshal for $t {
            fn to_bytes(&self) -> Vec<u8> {
                self.to_be_bytes().to_vec()
            }

            fn from_bytes(bytes: &[u8]) -> Result<Self> {
                Ok(<$t>::from_be_bytes(fixed(bytes, stringify!($t))?))
            }
        }

        impl FixedWidth for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();
        }
    )*};
}

macro_rules! marshal_signed {
    ($($t:ty => $u:ty),*) => {$(
        impl Marshal for $t {
            fn to_bytes(&self) -> Vec<u8> {
                let flipped = (*self as $u) ^ (1 << (<$u>::BITS - 1));
                flipped.to_be_bytes().to_vec()
            }

            fn from_bytes(bytes: &[u8]) -> Result<Self> {
                let raw = <$u>::from_be_bytes(fixed(bytes, stringify!($t))?);
                Ok((raw ^ (1 << (<$u>::BITS - 1))) as $t)
            }
        }

        impl FixedWidth for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();
        }
    )*};
}

marshal_unsigned!(u8, u16, u32, u64);
marshal_signed!(i8 => u8, i16 => u16, i32 => u32, i64 => u64);

fn split_fixed(bytes: &[u8], width: usize) -> Result<(&[u8], &[u8])> {
    if bytes.len() < width {
        return Err(Status::corruption(format!(
            "tuple component needs {width} bytes, {} left",
            bytes.len()
        )));
    }
    Ok(bytes.split_at(width))
}

impl<A: FixedWidth, B: Marshal> Marshal for (A, B) {
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.0.to_bytes();
        out.extend(self.1.to_bytes());
        out
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (a, rest) = split_fixed(bytes, A::WIDTH)?;
        Ok((A::from_bytes(a)?, B::from_bytes(rest)?))
    }
}

impl<A: FixedWidth, B: FixedWidth, C: Marshal> Marshal for (A, B, C) {
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.0.to_bytes();
        out.extend(self.1.to_bytes());
        out.extend(self.2.to_bytes());
        out
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (a, rest) = split_fixed(bytes, A::WIDTH)?;
        let (b, rest) = split_fixed(rest, B::WIDTH)?;
        Ok((A::from_bytes(a)?, B::from_bytes(b)?, C::from_bytes(rest)?))
    }
}

impl<A: FixedWidth, B: FixedWidth> FixedWidth for (A, B) {
    const WIDTH: usize = A::WIDTH + B::WIDTH;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_order_matches_byte_order() {
        let values = [i32::MIN, -300, -1, 0, 1, 255, 256, i32::MAX];
        for pair in values.windows(2) {
            assert!(pair[0].to_bytes() < pair[1].to_bytes(), "{pair:?}");
        }
        for v in values {
            assert_eq!(i32::from_bytes(&v.to_bytes()).unwrap(), v);
        }
    }

    #[test]
    fn test_unsigned_big_endian() {
        assert_eq!(258u16.to_bytes(), vec![1, 2]);
        assert!(255u32.to_bytes() < 256u32.to_bytes());
    }

    #[test]
    fn test_wrong_width_is_corruption() {
        let err = u32::from_bytes(&[1, 2]).unwrap_err();
        assert!(err.is_corruption());
        assert_eq!(err.message(), Some("u32 needs 4 bytes, got 2"));
    }

    #[test]
    fn test_string_rejects_invalid_utf8() {
        assert!(String::from_bytes(&[0xFF, 0xFE]).unwrap_err().is_corruption());
        assert_eq!(String::from_bytes(b"abc").unwrap(), "abc");
    }

    #[test]
    fn test_composite_key() {
        let key: (u8, u32, String) = (2, 7, "x".to_string());
        let bytes = key.to_bytes();
        assert_eq!(bytes, vec![2, 0, 0, 0, 7, b'x']);
        assert_eq!(<(u8, u32, String)>::from_bytes(&bytes).unwrap(), key);
        assert!(<(u8, u32, String)>::from_bytes(&[2, 0]).is_err());
    }
}
