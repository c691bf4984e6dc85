//! Length-prefixed buffers in guest memory.

use std::{ptr, slice};

use wasp_abi::{Error, PREFIX_LEN, Result};

use crate::memory::{allocate, deallocate};

/// Copies the payload out of the length-prefixed buffer at `ptr`.
///
/// # Safety
///
/// `ptr` must be null or point to a readable buffer of at least
/// `4 + length` bytes, where `length` is its prefix.
pub unsafe fn bytes_from_ptr(ptr: *const u8) -> Result<Vec<u8>> {
    if ptr.is_null() {
        return Err(Error::NullPointer);
    }
    let prefix = unsafe { slice::from_raw_parts(ptr, PREFIX_LEN) };
    let total = wasp_abi::encoded_len(wasp_abi::read_prefix(prefix)?)?;
    let buf = unsafe { slice::from_raw_parts(ptr, total) };
    wasp_abi::decode(buf)
}

/// Encodes `payload` declared as `len` bytes into freshly allocated memory.
///
/// The returned pointer is owned by the caller and is `4 + len` bytes long.
pub fn ptr_from_bytes(payload: &[u8], len: u32) -> Result<*mut u8> {
    let encoded = wasp_abi::encode(payload, len)?;
    let out = allocate(encoded.len());
    if out.is_null() {
        return Err(Error::AllocationFailed {
            size: encoded.len(),
        });
    }
    unsafe { ptr::copy_nonoverlapping(encoded.as_ptr(), out, encoded.len()) };
    Ok(out)
}

/// Frees a buffer produced by [`ptr_from_bytes`].
///
/// # Safety
///
/// `ptr` must come from [`ptr_from_bytes`] and must not be used afterwards.
pub unsafe fn release_bytes(ptr: *mut u8) -> Result<()> {
    if ptr.is_null() {
        return Ok(());
    }
    let prefix = unsafe { slice::from_raw_parts(ptr, PREFIX_LEN) };
    let total = wasp_abi::encoded_len(wasp_abi::read_prefix(prefix)?)?;
    unsafe { deallocate(ptr, total) };
    Ok(())
}
