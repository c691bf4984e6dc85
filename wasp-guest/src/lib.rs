//! Guest half of the wasp ABI.
//!
//! Built for `wasm32`, this crate is a complete demo plugin: it exports
//! the allocation primitives every host relies on (`allocate`,
//! `deallocate`, `get_string_size`) together with `sum`, `hello`,
//! `reverse` and `callback`. On other targets it builds as an ordinary
//! library so the helpers can be exercised natively.
//!
//! # Ownership
//!
//! - Memory the host writes into the guest (call arguments, callback
//!   results) is freed by the host once the call returns.
//! - Memory a guest function returns is handed to the host, which frees it
//!   after copying the value out.
//! - Strings the guest passes to host imports stay guest-owned.
#![allow(unsafe_code)]

mod buffer;
pub mod demo;
#[cfg(target_arch = "wasm32")]
mod exports;
mod host;
mod memory;
mod string;

pub use buffer::{bytes_from_ptr, ptr_from_bytes, release_bytes};
#[cfg(target_arch = "wasm32")]
pub use host::Imports;
pub use host::Host;
pub use memory::{allocate, deallocate};
pub use string::{get_string_size, ptr_from_string, release_string, string_from_ptr};
pub use wasp_abi::{Error, Result};
