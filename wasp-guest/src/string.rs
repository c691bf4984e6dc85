//! NUL-terminated strings in guest memory.

use std::ffi::{CStr, c_char};
use std::ptr;

use wasp_abi::{Error, Result};

use crate::memory::{allocate, deallocate};

/// Returns the length of the C string at `ptr`, excluding the terminator.
///
/// Lets the host size a string before copying it out. Null yields `0`.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn get_string_size(ptr: *const c_char) -> usize {
    if ptr.is_null() {
        return 0;
    }
    // Borrow only: the string stays owned by whoever allocated it.
    unsafe { CStr::from_ptr(ptr) }.to_bytes().len()
}

/// Copies the C string at `ptr` into an owned `String`.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
pub unsafe fn string_from_ptr(ptr: *const c_char) -> Result<String> {
    if ptr.is_null() {
        return Err(Error::NullPointer);
    }
    Ok(unsafe { CStr::from_ptr(ptr) }.to_str()?.to_owned())
}

/// Copies `s` into freshly allocated memory as a C string.
///
/// The region is `s.len() + 1` bytes and owned by the caller.
pub fn ptr_from_string(s: &str) -> Result<*mut c_char> {
    let encoded = wasp_abi::encode_cstr(s)?;
    let out = allocate(encoded.len());
    if out.is_null() {
        return Err(Error::AllocationFailed {
            size: encoded.len(),
        });
    }
    unsafe { ptr::copy_nonoverlapping(encoded.as_ptr(), out, encoded.len()) };
    Ok(out.cast())
}

/// Frees a string produced by [`ptr_from_string`].
///
/// # Safety
///
/// `ptr` must come from [`ptr_from_string`] and must not be used afterwards.
pub unsafe fn release_string(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    let size = unsafe { get_string_size(ptr) } + 1;
    unsafe { deallocate(ptr.cast(), size) };
}
