//! Imports every instance is linked with.

use tracing::{error, info, warn};
use wasmtime::{Caller, Extern, Linker};
use wasp_abi::{ABORT, ENV, FD_WRITE, MEMORY, RAISE_ERROR, WASI_PREVIEW1, WASI_UNSTABLE};

use crate::error::{Error, Result};
use crate::memory::{GuestAbi, guest_offset};
use crate::state::State;

/// `(module, name)` of each import provided without registration.
pub(crate) const PROVIDED: &[(&str, &str)] = &[
    (ENV, RAISE_ERROR),
    (ENV, ABORT),
    (WASI_UNSTABLE, FD_WRITE),
    (WASI_PREVIEW1, FD_WRITE),
];

/// WASI `EBADF`.
const ERRNO_BADF: i32 = 8;

/// Size of one `(ptr, len)` iovec entry.
const IOVEC_LEN: usize = 8;

pub(crate) fn provides(module: &str, name: &str) -> bool {
    PROVIDED.iter().any(|&(m, n)| m == module && n == name)
}

pub(crate) fn link(linker: &mut Linker<State>) -> Result<()> {
    linker.func_wrap(ENV, RAISE_ERROR, raise_error)?;
    linker.func_wrap(ENV, ABORT, abort)?;
    for module in [WASI_UNSTABLE, WASI_PREVIEW1] {
        linker.func_wrap(module, FD_WRITE, fd_write)?;
    }
    Ok(())
}

/// Records the guest's message; the pending call then fails with
/// [`Error::Guest`]. The string stays owned by the guest.
fn raise_error(mut caller: Caller<'_, State>, message: i32) -> wasmtime::Result<()> {
    let abi = GuestAbi::from_caller(&mut caller)?;
    let message = abi.read_string(&mut caller, message)?;
    error!(%message, "guest raised an error");
    caller.data_mut().raise(message);
    Ok(())
}

/// AssemblyScript-style `abort`; traps the call.
fn abort(_message: i32, _file: i32, line: i32, column: i32) -> wasmtime::Result<()> {
    error!(line, column, "guest aborted");
    Err(wasmtime::Error::msg(format!("guest aborted at {line}:{column}")))
}

/// Minimal `fd_write`: stdout goes to the `info` log, stderr to `warn`.
fn fd_write(
    mut caller: Caller<'_, State>,
    fd: i32,
    iovs: i32,
    iovs_len: i32,
    nwritten: i32,
) -> wasmtime::Result<i32> {
    let memory = caller
        .get_export(MEMORY)
        .and_then(Extern::into_memory)
        .ok_or_else(|| Error::MissingExport {
            name: MEMORY.to_owned(),
        })?;
    let out = gather(memory.data(&caller), iovs, iovs_len)?;
    let text = String::from_utf8_lossy(&out);
    match fd {
        1 => info!(target: "wasp::guest", "{}", text.trim_end()),
        2 => warn!(target: "wasp::guest", "{}", text.trim_end()),
        _ => return Ok(ERRNO_BADF),
    }
    let written = u32::try_from(out.len())?;
    memory.write(&mut caller, guest_offset(nwritten), &written.to_le_bytes())?;
    Ok(0)
}

/// Concatenates the chunks described by `count` iovecs at `iovs`.
fn gather(mem: &[u8], iovs: i32, count: i32) -> Result<Vec<u8>> {
    let base = guest_offset(iovs);
    let count = usize::try_from(count).unwrap_or_default();
    let mut out = Vec::new();
    for i in 0..count {
        let entry = base + i * IOVEC_LEN;
        let ptr = read_u32(mem, entry)? as usize;
        let len = read_u32(mem, entry + 4)? as usize;
        let chunk = ptr
            .checked_add(len)
            .and_then(|end| mem.get(ptr..end))
            .ok_or(Error::OutOfBounds { addr: ptr, len })?;
        out.extend_from_slice(chunk);
    }
    Ok(out)
}

fn read_u32(mem: &[u8], at: usize) -> Result<u32> {
    mem.get(at..at + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or(Error::OutOfBounds { addr: at, len: 4 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iovec(ptr: u32, len: u32) -> [u8; 8] {
        let mut entry = [0; 8];
        entry[..4].copy_from_slice(&ptr.to_le_bytes());
        entry[4..].copy_from_slice(&len.to_le_bytes());
        entry
    }

    #[test]
    fn gather_joins_iovecs() {
        let mut mem = vec![0u8; 64];
        mem[32..37].copy_from_slice(b"hello");
        mem[40..42].copy_from_slice(b"!\n");
        mem[..8].copy_from_slice(&iovec(32, 5));
        mem[8..16].copy_from_slice(&iovec(40, 2));
        assert_eq!(gather(&mem, 0, 2).unwrap(), b"hello!\n");
        assert!(gather(&mem, 0, 0).unwrap().is_empty());
    }

    #[test]
    fn gather_rejects_out_of_bounds_chunks() {
        let mut mem = vec![0u8; 16];
        mem[..8].copy_from_slice(&iovec(12, 10));
        assert!(matches!(
            gather(&mem, 0, 1),
            Err(Error::OutOfBounds { addr: 12, len: 10 })
        ));
        assert!(gather(&mem, 12, 1).is_err());
    }

    #[test]
    fn provided_imports() {
        assert!(provides("env", "raise_error"));
        assert!(provides("wasi_snapshot_preview1", "fd_write"));
        assert!(!provides("env", "call_me"));
    }
}
