//! Demo exports wired to the real `env` imports.

use std::ffi::c_char;

use crate::demo;
use crate::host::Imports;

#[unsafe(no_mangle)]
pub extern "C" fn sum(a: i32, b: i32) -> i32 {
    demo::sum(a, b)
}

/// # Safety
///
/// `name` must be null or a NUL-terminated string in guest memory.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hello(name: *const c_char) -> *mut c_char {
    unsafe { demo::hello(&Imports, name) }
}

/// # Safety
///
/// `input` must be null or a length-prefixed buffer in guest memory.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn reverse(input: *const u8) -> *mut u8 {
    unsafe { demo::reverse(&Imports, input) }
}

#[unsafe(no_mangle)]
pub extern "C" fn callback() -> *mut c_char {
    demo::callback(&Imports)
}
