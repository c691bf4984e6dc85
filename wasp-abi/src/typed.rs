//! Serde values carried as postcard payloads.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec;
use crate::error::Result;

/// Serializes `value` into a bare payload (no prefix).
pub fn to_payload<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(postcard::to_allocvec(value)?)
}

/// Deserializes a bare payload.
pub fn from_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    Ok(postcard::from_bytes(payload)?)
}

/// Serializes `value` into a length-prefixed buffer.
pub fn to_buffer<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    codec::encode_bytes(&to_payload(value)?)
}

/// Deserializes the payload of a length-prefixed buffer.
pub fn from_buffer<T: DeserializeOwned>(buf: &[u8]) -> Result<T> {
    from_payload(codec::payload(buf)?)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::Error;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Greeting {
        name: String,
        times: u8,
    }

    #[test]
    fn struct_through_buffer() {
        let value = Greeting {
            name: "guest".into(),
            times: 2,
        };
        let buf = to_buffer(&value).unwrap();
        assert_eq!(
            codec::read_prefix(&buf).unwrap() as usize,
            buf.len() - codec::PREFIX_LEN
        );
        assert_eq!(from_buffer::<Greeting>(&buf).unwrap(), value);
    }

    #[test]
    fn garbage_payload_is_an_error() {
        let buf = codec::encode_bytes(&[0xff]).unwrap();
        assert!(matches!(
            from_buffer::<Greeting>(&buf),
            Err(Error::Payload(_))
        ));
    }
}
