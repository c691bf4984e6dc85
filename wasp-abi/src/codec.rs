//! Length-prefixed buffer codec.
//!
//! Each buffer is: `[u32 little-endian length][payload]`. The prefix order
//! is fixed so hosts and guests of different native byte order agree.

use crate::error::{Error, Result};

/// Size of the length prefix in bytes.
pub const PREFIX_LEN: usize = 4;

/// Maximum allowed payload (256 MiB).
pub const MAX_PAYLOAD: u32 = 1 << 28;

/// Returns the total buffer size for a payload of `len` bytes.
pub fn encoded_len(len: u32) -> Result<usize> {
    if len > MAX_PAYLOAD {
        return Err(Error::TooLarge {
            len: len as usize,
            max: MAX_PAYLOAD as usize,
        });
    }
    Ok(PREFIX_LEN + len as usize)
}

/// Encodes `payload` behind a prefix declaring `len` bytes.
///
/// `len` must equal `payload.len()`; the declared and actual sizes are
/// checked rather than trusted.
pub fn encode(payload: &[u8], len: u32) -> Result<Vec<u8>> {
    if payload.len() != len as usize {
        return Err(Error::LengthMismatch {
            declared: len,
            actual: payload.len(),
        });
    }
    let mut buf = Vec::with_capacity(encoded_len(len)?);
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Encodes `payload`, deriving the prefix from its length.
pub fn encode_bytes(payload: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| Error::TooLarge {
        len: payload.len(),
        max: MAX_PAYLOAD as usize,
    })?;
    encode(payload, len)
}

/// Reads the payload length from the first 4 bytes of `buf`.
pub fn read_prefix(buf: &[u8]) -> Result<u32> {
    let prefix: [u8; PREFIX_LEN] = buf
        .get(..PREFIX_LEN)
        .and_then(|b| b.try_into().ok())
        .ok_or(Error::Truncated {
            needed: PREFIX_LEN,
            available: buf.len(),
        })?;
    Ok(u32::from_le_bytes(prefix))
}

/// Borrows the payload of the buffer starting at `buf[0]`.
///
/// Bytes past the end of the payload are ignored, so `buf` may be a view
/// over a larger memory region.
pub fn payload(buf: &[u8]) -> Result<&[u8]> {
    let end = encoded_len(read_prefix(buf)?)?;
    buf.get(PREFIX_LEN..end).ok_or(Error::Truncated {
        needed: end,
        available: buf.len(),
    })
}

/// Copies the payload into `dest`, which must be exactly payload-sized.
///
/// Returns the number of bytes copied.
pub fn decode_into(buf: &[u8], dest: &mut [u8]) -> Result<usize> {
    let data = payload(buf)?;
    if dest.len() != data.len() {
        return Err(Error::CapacityMismatch {
            expected: data.len(),
            capacity: dest.len(),
        });
    }
    dest.copy_from_slice(data);
    Ok(data.len())
}

/// Copies the payload out into a new vector.
pub fn decode(buf: &[u8]) -> Result<Vec<u8>> {
    payload(buf).map(<[u8]>::to_vec)
}
