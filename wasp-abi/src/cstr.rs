//! NUL-terminated string helpers.

use crate::error::{Error, Result};

/// Encodes `s` as NUL-terminated bytes (`s.len() + 1` long).
pub fn encode_cstr(s: &str) -> Result<Vec<u8>> {
    if let Some(position) = s.bytes().position(|b| b == 0) {
        return Err(Error::InteriorNul { position });
    }
    let mut buf = Vec::with_capacity(s.len() + 1);
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    Ok(buf)
}

/// Length of the C string at the start of `mem`, excluding the terminator.
pub fn cstr_len(mem: &[u8]) -> Result<usize> {
    mem.iter()
        .position(|&b| b == 0)
        .ok_or(Error::Unterminated { scanned: mem.len() })
}

/// Copies the C string at the start of `mem` into an owned `String`.
pub fn decode_cstr(mem: &[u8]) -> Result<String> {
    let len = cstr_len(mem)?;
    Ok(std::str::from_utf8(&mem[..len])?.to_owned())
}
