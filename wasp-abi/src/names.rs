//! Export and import names that make up the default ABI.

/// Linear memory export.
pub const MEMORY: &str = "memory";
/// Guest export: `allocate(size: i32) -> i32`.
pub const ALLOCATE: &str = "allocate";
/// Guest export: `deallocate(ptr: i32, size: i32)`.
pub const DEALLOCATE: &str = "deallocate";
/// Guest export: `get_string_size(ptr: i32) -> i32`.
pub const GET_STRING_SIZE: &str = "get_string_size";

/// Import module for host-provided functions.
pub const ENV: &str = "env";
/// Host import: `raise_error(message: i32)`.
pub const RAISE_ERROR: &str = "raise_error";
/// Host import used by AssemblyScript guests: `abort(msg, file, line, column)`.
pub const ABORT: &str = "abort";
/// Host callback the demo guest expects: `call_me(name: i32) -> i32`.
pub const CALL_ME: &str = "call_me";

/// WASI module name emitted by TinyGo.
pub const WASI_UNSTABLE: &str = "wasi_unstable";
/// WASI module name emitted by most other toolchains.
pub const WASI_PREVIEW1: &str = "wasi_snapshot_preview1";
/// WASI `fd_write(fd, iovs, iovs_len, nwritten) -> errno`.
pub const FD_WRITE: &str = "fd_write";
