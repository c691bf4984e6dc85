//! Demo functions exercising the calling convention.
//!
//! Each takes the [`Host`] explicitly; the `wasm32` exports pass the real
//! imports. Failures are reported through [`Host::raise_error`] and the
//! function returns null.

use std::ffi::c_char;
use std::ptr;

use wasp_abi::Result;

use crate::buffer::{bytes_from_ptr, ptr_from_bytes};
use crate::host::Host;
use crate::string::{ptr_from_string, string_from_ptr};

/// Name the guest passes to the host's `call_me`.
pub const CALLBACK_NAME: &str = "guest";

/// Adds two integers, wrapping on overflow.
pub const fn sum(a: i32, b: i32) -> i32 {
    a.wrapping_add(b)
}

/// Builds the greeting returned by [`hello`].
pub fn greeting(name: &str) -> String {
    if name.is_empty() {
        "Hello".to_owned()
    } else {
        format!("Hello {name}")
    }
}

/// Greets the C string at `name`.
///
/// # Safety
///
/// `name` must be null or point to a NUL-terminated string.
pub unsafe fn hello(host: &impl Host, name: *const c_char) -> *mut c_char {
    let out = unsafe { string_from_ptr(name) }.and_then(|n| ptr_from_string(&greeting(&n)));
    or_raise(host, out)
}

/// Reverses the payload of the length-prefixed buffer at `input`.
///
/// # Safety
///
/// `input` must be null or point to a length-prefixed buffer.
pub unsafe fn reverse(host: &impl Host, input: *const u8) -> *mut u8 {
    or_raise(host, unsafe { reverse_buffer(input) })
}

/// Decodes, reverses and re-encodes, declaring the decoded length.
unsafe fn reverse_buffer(input: *const u8) -> Result<*mut u8> {
    let data = unsafe { bytes_from_ptr(input) }?;
    let declared = u32::try_from(data.len()).map_err(|_| wasp_abi::Error::TooLarge {
        len: data.len(),
        max: wasp_abi::MAX_PAYLOAD as usize,
    })?;
    let reversed: Vec<u8> = data.into_iter().rev().collect();
    ptr_from_bytes(&reversed, declared)
}

/// Forwards to the host's `call_me` and returns its answer as a new string.
pub fn callback(host: &impl Host) -> *mut c_char {
    let out = host
        .call_me(CALLBACK_NAME)
        .and_then(|answer| ptr_from_string(&answer));
    or_raise(host, out)
}

/// Unwraps `result`, raising the error with the host and returning null.
fn or_raise<T>(host: &impl Host, result: Result<*mut T>) -> *mut T {
    match result {
        Ok(ptr) => ptr,
        Err(e) => {
            host.raise_error(&e.to_string());
            ptr::null_mut()
        }
    }
}
