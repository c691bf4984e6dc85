//! Functions the host links into the guest.

use wasp_abi::Result;

/// Capabilities a host supplies to the guest at instantiation.
///
/// On `wasm32` these are the `env` imports ([`Imports`]); elsewhere any
/// implementation can be injected, which is how the demo functions are
/// tested natively.
pub trait Host {
    /// Asks the host to produce a string for `name`.
    fn call_me(&self, name: &str) -> Result<String>;

    /// Reports a failure; the host fails the current call with `message`.
    fn raise_error(&self, message: &str);
}

#[cfg(target_arch = "wasm32")]
mod imported {
    use std::ffi::c_char;

    use wasp_abi::{Error, Result};

    use super::Host;
    use crate::string::{ptr_from_string, release_string, string_from_ptr};

    #[link(wasm_import_module = "env")]
    unsafe extern "C" {
        fn call_me(name: *const c_char) -> *mut c_char;
        fn raise_error(message: *const c_char);
    }

    /// The `env` imports a wasp host links at instantiation.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Imports;

    impl Host for Imports {
        fn call_me(&self, name: &str) -> Result<String> {
            let arg = ptr_from_string(name)?;
            // The result lives in host-tracked memory; copy, never free.
            let out = unsafe { call_me(arg) };
            unsafe { release_string(arg) };
            if out.is_null() {
                return Err(Error::NullPointer);
            }
            unsafe { string_from_ptr(out) }
        }

        fn raise_error(&self, message: &str) {
            if let Ok(ptr) = ptr_from_string(message) {
                unsafe {
                    raise_error(ptr);
                    release_string(ptr);
                }
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use imported::Imports;
