//! ABI shared by wasp hosts and guests.
//!
//! Variable-length data crosses the boundary in one of two shapes:
//!
//! - **byte arrays** as length-prefixed buffers: a 4-byte little-endian
//!   `u32` length followed by exactly that many payload bytes;
//! - **strings** as NUL-terminated UTF-8.
//!
//! Memory for either is obtained from the guest's [`ALLOCATE`] export and
//! released through [`DEALLOCATE`] with the same size.

mod codec;
mod cstr;
mod error;
mod names;
mod typed;

pub use codec::{
    MAX_PAYLOAD, PREFIX_LEN, decode, decode_into, encode, encode_bytes, encoded_len, payload,
    read_prefix,
};
pub use cstr::{cstr_len, decode_cstr, encode_cstr};
pub use error::{Error, Result};
pub use names::{
    ABORT, ALLOCATE, CALL_ME, DEALLOCATE, ENV, FD_WRITE, GET_STRING_SIZE, MEMORY, RAISE_ERROR,
    WASI_PREVIEW1, WASI_UNSTABLE,
};
pub use typed::{from_buffer, from_payload, to_buffer, to_payload};
