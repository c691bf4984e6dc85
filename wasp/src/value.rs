//! Values that cross the host/guest boundary.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// The shape of a value on the wire.
///
/// Every kind travels as a single `i32`: integers directly, strings and
/// byte arrays as pointers into guest memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Kind {
    /// No value (only valid as a result).
    Unit,
    /// A 32-bit integer passed by value.
    I32,
    /// A NUL-terminated UTF-8 string.
    Str,
    /// A length-prefixed byte array.
    Bytes,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unit => "unit",
            Self::I32 => "i32",
            Self::Str => "string",
            Self::Bytes => "bytes",
        })
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unit" | "none" => Ok(Self::Unit),
            "i32" | "int" => Ok(Self::I32),
            "string" | "str" => Ok(Self::Str),
            "bytes" => Ok(Self::Bytes),
            _ => Err(format!("unknown value kind: {s}")),
        }
    }
}

/// A parameter passed to a guest function.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Param {
    /// Passed by value.
    I32(i32),
    /// Copied into guest memory as a C string.
    Str(String),
    /// Copied into guest memory as a length-prefixed buffer.
    Bytes(Vec<u8>),
}

impl Param {
    /// Serializes `value` into a [`Param::Bytes`] payload.
    pub fn serialized<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::Bytes(wasp_abi::to_payload(value)?))
    }

    /// The wire kind of this parameter.
    pub const fn kind(&self) -> Kind {
        match self {
            Self::I32(_) => Kind::I32,
            Self::Str(_) => Kind::Str,
            Self::Bytes(_) => Kind::Bytes,
        }
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<u8>> for Param {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<&[u8]> for Param {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

/// Parses `i32:N`, `str:TEXT` or `hex:BYTES`.
///
/// Without a prefix, integers become [`Param::I32`] and anything else a
/// [`Param::Str`].
impl FromStr for Param {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &'static str| Error::InvalidParam {
            input: s.to_owned(),
            reason,
        };
        match s.split_once(':') {
            Some(("i32", n)) => n
                .parse()
                .map(Self::I32)
                .map_err(|_| invalid("not a 32-bit integer")),
            Some(("str", text)) => Ok(Self::Str(text.to_owned())),
            Some(("hex", digits)) => parse_hex(digits).map(Self::Bytes).map_err(invalid),
            _ => Ok(s.parse().map_or_else(|_| Self::Str(s.to_owned()), Self::I32)),
        }
    }
}

/// Decodes a hex string, ignoring `_` separators.
fn parse_hex(digits: &str) -> std::result::Result<Vec<u8>, &'static str> {
    let clean: Vec<u8> = digits.bytes().filter(|&b| b != b'_').collect();
    if clean.len() % 2 != 0 {
        return Err("odd number of hex digits");
    }
    clean
        .chunks_exact(2)
        .map(|pair| {
            let hi = hex_digit(pair[0])?;
            let lo = hex_digit(pair[1])?;
            Ok((hi << 4) | lo)
        })
        .collect()
}

fn hex_digit(b: u8) -> std::result::Result<u8, &'static str> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        _ => Err("invalid hex digit"),
    }
}

/// A value returned from a guest function or passed to a callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
#[non_exhaustive]
pub enum Value {
    /// No value.
    Unit,
    /// An integer.
    I32(i32),
    /// A string copied out of guest memory.
    Str(String),
    /// A byte array copied out of guest memory.
    Bytes(Vec<u8>),
}

impl Value {
    /// The wire kind of this value.
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Unit => Kind::Unit,
            Self::I32(_) => Kind::I32,
            Self::Str(_) => Kind::Str,
            Self::Bytes(_) => Kind::Bytes,
        }
    }

    /// Deserializes a [`Value::Bytes`] payload produced with postcard.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            Self::Bytes(b) => Ok(wasp_abi::from_payload(b)?),
            other => Err(Error::Signature {
                function: "deserialize".to_owned(),
                reason: format!("expected bytes, found {}", other.kind()),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => f.write_str("()"),
            Self::I32(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
            Self::Bytes(b) => {
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// Rust types a guest function result can be converted into.
pub trait FromValue: Sized {
    /// Kind requested from the guest.
    const KIND: Kind;

    /// Extracts `Self`, or `None` when `value` has another kind.
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for () {
    const KIND: Kind = Kind::Unit;

    fn from_value(value: Value) -> Option<Self> {
        matches!(value, Value::Unit).then_some(())
    }
}

impl FromValue for i32 {
    const KIND: Kind = Kind::I32;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::I32(v) => Some(v),
            _ => None,
        }
    }
}

impl FromValue for String {
    const KIND: Kind = Kind::Str;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl FromValue for Vec<u8> {
    const KIND: Kind = Kind::Bytes;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_prefixed_params() {
        assert_eq!("i32:-7".parse::<Param>().unwrap(), Param::I32(-7));
        assert_eq!("str:42".parse::<Param>().unwrap(), Param::Str("42".into()));
        assert_eq!(
            "hex:0a_FF".parse::<Param>().unwrap(),
            Param::Bytes(vec![0x0a, 0xff])
        );
        assert_eq!("hex:".parse::<Param>().unwrap(), Param::Bytes(vec![]));
    }

    #[test]
    fn parse_bare_params() {
        assert_eq!("3".parse::<Param>().unwrap(), Param::I32(3));
        assert_eq!("Nic".parse::<Param>().unwrap(), Param::Str("Nic".into()));
        // Unknown prefixes are plain strings.
        assert_eq!(
            "http://x".parse::<Param>().unwrap(),
            Param::Str("http://x".into())
        );
    }

    #[test]
    fn reject_malformed_params() {
        assert!(matches!(
            "i32:ten".parse::<Param>(),
            Err(Error::InvalidParam { .. })
        ));
        assert!("hex:abc".parse::<Param>().is_err());
        assert!("hex:zz".parse::<Param>().is_err());
    }

    #[test]
    fn kind_names_roundtrip() {
        for kind in [Kind::Unit, Kind::I32, Kind::Str, Kind::Bytes] {
            assert_eq!(kind.to_string().parse::<Kind>().unwrap(), kind);
        }
        assert!("float".parse::<Kind>().is_err());
    }

    #[test]
    fn display_renders_bytes_as_hex() {
        assert_eq!(Value::Bytes(vec![1, 0xab]).to_string(), "01ab");
        assert_eq!(Value::I32(5).to_string(), "5");
    }

    #[test]
    fn serialized_param_deserializes_from_value() {
        let param = Param::serialized(&("guest", 3u16)).unwrap();
        let Param::Bytes(bytes) = param else {
            panic!("expected bytes");
        };
        let value = Value::Bytes(bytes);
        let (name, n): (String, u16) = value.deserialize().unwrap();
        assert_eq!((name.as_str(), n), ("guest", 3));
        assert!(Value::I32(1).deserialize::<u8>().is_err());
    }

    #[test]
    fn from_value_checks_kind() {
        assert_eq!(i32::from_value(Value::I32(4)), Some(4));
        assert_eq!(String::from_value(Value::I32(4)), None);
        assert_eq!(<()>::from_value(Value::Unit), Some(()));
    }
}
