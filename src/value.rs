//! Typed values accepted by the cache wrapper.
//!
//! The store only holds bytes. [`CacheValue`] fixes how each supported kind
//! is written and read back:
//!
//! | kind | encoded as | decoded by |
//! |------|-----------|------------|
//! | `Text` | UTF-8 bytes | UTF-8 validation |
//! | `Bytes` | raw bytes | identity |
//! | `Int` | ASCII decimal (`-12`) | `i64` parse, surrounding whitespace ignored |
//! | `Float` | shortest round-trip decimal (`1.5`, `3`) | `f64` parse |
//!
//! ```
//! use cache_ledger::value::{CacheValue, ValueKind};
//!
//! let bytes = CacheValue::from(123).encode();
//! assert_eq!(bytes, b"123");
//! assert_eq!(CacheValue::decode(ValueKind::Int, bytes).unwrap(), CacheValue::Int(123));
//! ```

use crate::error::{Error, Result};
use std::fmt;

/// A value that can be stored through `Cache::store`.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Text(String),
    Bytes(Vec<u8>),
    Int(i64),
    Float(f64),
}

/// Selects which [`CacheValue`] variant stored bytes decode into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Bytes,
    Int,
    Float,
}

impl CacheValue {
    /// Variant tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            CacheValue::Text(_) => ValueKind::Text,
            CacheValue::Bytes(_) => ValueKind::Bytes,
            CacheValue::Int(_) => ValueKind::Int,
            CacheValue::Float(_) => ValueKind::Float,
        }
    }

    /// Bytes written to the store for this value.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            CacheValue::Text(s) => s.as_bytes().to_vec(),
            CacheValue::Bytes(b) => b.clone(),
            CacheValue::Int(i) => i.to_string().into_bytes(),
            CacheValue::Float(f) => f.to_string().into_bytes(),
        }
    }

    /// Decode stored bytes as `kind`.
    ///
    /// # Errors
    /// Returns `Error::DeserializationError` when the bytes are not valid for
    /// the requested kind (invalid UTF-8, non-numeric text).
    pub fn decode(kind: ValueKind, bytes: Vec<u8>) -> Result<Self> {
        match kind {
            ValueKind::Bytes => Ok(CacheValue::Bytes(bytes)),
            ValueKind::Text => decode_text(bytes).map(CacheValue::Text),
            ValueKind::Int => decode_int(&bytes).map(CacheValue::Int),
            ValueKind::Float => decode_float(&bytes).map(CacheValue::Float),
        }
    }

    /// Source-style literal used when recording call arguments.
    ///
    /// Text renders quoted and escaped (`"a\"b"`), bytes as `b"..."` with
    /// non-printable bytes escaped, numbers as written (`7`, `2.0`).
    pub fn literal(&self) -> String {
        match self {
            CacheValue::Text(s) => format!("{:?}", s),
            CacheValue::Bytes(b) => format!("b\"{}\"", b.escape_ascii()),
            CacheValue::Int(i) => i.to_string(),
            CacheValue::Float(f) => format!("{:?}", f),
        }
    }
}

/// Decode stored bytes as UTF-8 text.
///
/// # Errors
/// Returns `Error::DeserializationError` on invalid UTF-8
pub fn decode_text(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| Error::DeserializationError(format!("invalid UTF-8: {}", e)))
}

/// Decode stored bytes as a decimal integer.
///
/// # Errors
/// Returns `Error::DeserializationError` if the bytes are not a decimal `i64`
pub fn decode_int(bytes: &[u8]) -> Result<i64> {
    let text = numeric_text(bytes)?;
    text.parse::<i64>()
        .map_err(|e| Error::DeserializationError(format!("invalid integer {:?}: {}", text, e)))
}

/// Decode stored bytes as a decimal float.
///
/// # Errors
/// Returns `Error::DeserializationError` if the bytes are not a decimal `f64`
pub fn decode_float(bytes: &[u8]) -> Result<f64> {
    let text = numeric_text(bytes)?;
    text.parse::<f64>()
        .map_err(|e| Error::DeserializationError(format!("invalid float {:?}: {}", text, e)))
}

fn numeric_text(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map(str::trim)
        .map_err(|e| Error::DeserializationError(format!("invalid UTF-8: {}", e)))
}

impl fmt::Display for CacheValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal())
    }
}

impl From<String> for CacheValue {
    fn from(s: String) -> Self {
        CacheValue::Text(s)
    }
}

impl From<&str> for CacheValue {
    fn from(s: &str) -> Self {
        CacheValue::Text(s.to_string())
    }
}

impl From<Vec<u8>> for CacheValue {
    fn from(b: Vec<u8>) -> Self {
        CacheValue::Bytes(b)
    }
}

impl From<&[u8]> for CacheValue {
    fn from(b: &[u8]) -> Self {
        CacheValue::Bytes(b.to_vec())
    }
}

impl From<i64> for CacheValue {
    fn from(i: i64) -> Self {
        CacheValue::Int(i)
    }
}

impl From<i32> for CacheValue {
    fn from(i: i32) -> Self {
        CacheValue::Int(i64::from(i))
    }
}

impl From<f64> for CacheValue {
    fn from(f: f64) -> Self {
        CacheValue::Float(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_per_kind() {
        assert_eq!(CacheValue::from("abc").encode(), b"abc");
        assert_eq!(CacheValue::from(vec![0u8, 255]).encode(), vec![0u8, 255]);
        assert_eq!(CacheValue::from(-42).encode(), b"-42");
        assert_eq!(CacheValue::from(1.5).encode(), b"1.5");
        assert_eq!(CacheValue::from(3.0).encode(), b"3");
    }

    #[test]
    fn test_decode_int_tolerates_whitespace() {
        let value = CacheValue::decode(ValueKind::Int, b" 17\n".to_vec()).expect("decode");
        assert_eq!(value, CacheValue::Int(17));
    }

    #[test]
    fn test_decode_int_rejects_text() {
        let result = CacheValue::decode(ValueKind::Int, b"abc".to_vec());
        assert!(matches!(result, Err(Error::DeserializationError(_))));
    }

    #[test]
    fn test_decode_text_rejects_invalid_utf8() {
        let result = CacheValue::decode(ValueKind::Text, vec![0xff, 0xfe]);
        assert!(matches!(result, Err(Error::DeserializationError(_))));
    }

    #[test]
    fn test_int_stored_reads_back_as_float() {
        let bytes = CacheValue::from(3).encode();
        let value = CacheValue::decode(ValueKind::Float, bytes).expect("decode");
        assert_eq!(value, CacheValue::Float(3.0));
    }

    #[test]
    fn test_literals() {
        assert_eq!(CacheValue::from("a\"b").literal(), r#""a\"b""#);
        assert_eq!(CacheValue::from(b"hi\n".as_slice()).literal(), r#"b"hi\n""#);
        assert_eq!(CacheValue::from(7).literal(), "7");
        assert_eq!(CacheValue::from(2.0).literal(), "2.0");
    }

    #[test]
    fn test_kind() {
        assert_eq!(CacheValue::from("x").kind(), ValueKind::Text);
        assert_eq!(CacheValue::from(1.25).kind(), ValueKind::Float);
    }
}
