//! Marshalling values in and out of guest linear memory.
//!
//! Every region the host writes is obtained from the guest's `allocate`
//! export and recorded in the store [`State`] so it can be released with
//! `deallocate` when the call returns.

use tracing::{debug, trace};
use wasmtime::{AsContext, AsContextMut, Caller, Extern, Instance, Memory, Store, TypedFunc};
use wasp_abi::{ALLOCATE, DEALLOCATE, GET_STRING_SIZE, MAX_PAYLOAD, MEMORY};

use crate::error::{Error, Result};
use crate::state::State;

/// Converts a wasm32 pointer to a host offset.
#[allow(clippy::cast_sign_loss)]
pub(crate) const fn guest_offset(addr: i32) -> usize {
    addr as u32 as usize
}

/// Converts a region size to the `i32` the ABI passes.
pub(crate) fn wire_size(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| {
        wasp_abi::Error::TooLarge {
            len,
            max: MAX_PAYLOAD as usize,
        }
        .into()
    })
}

/// Handles to the exports the default ABI relies on.
#[derive(Clone)]
pub(crate) struct GuestAbi {
    memory: Memory,
    allocate: TypedFunc<i32, i32>,
    deallocate: Option<TypedFunc<(i32, i32), ()>>,
    string_size: Option<TypedFunc<i32, i32>>,
}

impl std::fmt::Debug for GuestAbi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestAbi")
            .field("deallocate", &self.deallocate.is_some())
            .field("string_size", &self.string_size.is_some())
            .finish_non_exhaustive()
    }
}

impl GuestAbi {
    /// Resolves the ABI exports of an instantiated module.
    pub(crate) fn from_instance(instance: &Instance, store: &mut Store<State>) -> Result<Self> {
        let memory = instance.get_export(&mut *store, MEMORY);
        let allocate = instance.get_export(&mut *store, ALLOCATE);
        let deallocate = instance.get_export(&mut *store, DEALLOCATE);
        let string_size = instance.get_export(&mut *store, GET_STRING_SIZE);
        Self::from_exports(&*store, memory, allocate, deallocate, string_size)
    }

    /// Resolves the ABI exports of the instance calling into the host.
    pub(crate) fn from_caller(caller: &mut Caller<'_, State>) -> Result<Self> {
        let memory = caller.get_export(MEMORY);
        let allocate = caller.get_export(ALLOCATE);
        let deallocate = caller.get_export(DEALLOCATE);
        let string_size = caller.get_export(GET_STRING_SIZE);
        Self::from_exports(&*caller, memory, allocate, deallocate, string_size)
    }

    fn from_exports(
        store: impl AsContext,
        memory: Option<Extern>,
        allocate: Option<Extern>,
        deallocate: Option<Extern>,
        string_size: Option<Extern>,
    ) -> Result<Self> {
        let missing = |name: &str| Error::MissingExport {
            name: name.to_owned(),
        };
        let memory = memory
            .and_then(Extern::into_memory)
            .ok_or_else(|| missing(MEMORY))?;
        let allocate = allocate
            .and_then(Extern::into_func)
            .ok_or_else(|| missing(ALLOCATE))?
            .typed::<i32, i32>(&store)?;
        let deallocate = deallocate
            .and_then(Extern::into_func)
            .map(|f| f.typed::<(i32, i32), ()>(&store))
            .transpose()?;
        let string_size = string_size
            .and_then(Extern::into_func)
            .map(|f| f.typed::<i32, i32>(&store))
            .transpose()?;
        Ok(Self {
            memory,
            allocate,
            deallocate,
            string_size,
        })
    }

    /// Copies `s` into guest memory as a C string.
    pub(crate) fn write_string(
        &self,
        mut store: impl AsContextMut<Data = State>,
        s: &str,
    ) -> Result<i32> {
        let encoded = wasp_abi::encode_cstr(s)?;
        self.write_tracked(&mut store, &encoded)
    }

    /// Copies `data` into guest memory as a length-prefixed buffer.
    pub(crate) fn write_bytes(
        &self,
        mut store: impl AsContextMut<Data = State>,
        data: &[u8],
    ) -> Result<i32> {
        let encoded = wasp_abi::encode_bytes(data)?;
        self.write_tracked(&mut store, &encoded)
    }

    fn write_tracked(&self, mut store: impl AsContextMut<Data = State>, buf: &[u8]) -> Result<i32> {
        let size = wire_size(buf.len())?;
        let addr = self.allocate.call(&mut store, size)?;
        if addr == 0 {
            return Err(wasp_abi::Error::AllocationFailed { size: buf.len() }.into());
        }
        self.memory
            .write(&mut store, guest_offset(addr), buf)
            .map_err(|_| Error::OutOfBounds {
                addr: guest_offset(addr),
                len: buf.len(),
            })?;
        store.as_context_mut().data_mut().track(addr, size);
        debug!(addr, size, "allocated guest memory");
        Ok(addr)
    }

    /// Copies the C string at `addr` out of guest memory.
    pub(crate) fn read_string(
        &self,
        mut store: impl AsContextMut<Data = State>,
        addr: i32,
    ) -> Result<String> {
        let len = self.string_len(&mut store, addr)?;
        self.string_at(&store, addr, len)
    }

    /// Length of the C string at `addr`, without the terminator.
    ///
    /// Comes from the guest's `get_string_size` when exported, otherwise
    /// from scanning for the terminator.
    pub(crate) fn string_len(
        &self,
        mut store: impl AsContextMut<Data = State>,
        addr: i32,
    ) -> Result<usize> {
        let start = guest_offset(addr);
        match &self.string_size {
            Some(string_size) => {
                let n = string_size.call(&mut store, addr)?;
                usize::try_from(n).map_err(|_| Error::OutOfBounds {
                    addr: start,
                    len: 0,
                })
            }
            None => {
                let data = self.memory.data(&store);
                Ok(wasp_abi::cstr_len(data.get(start..).unwrap_or_default())?)
            }
        }
    }

    /// Decodes the `len` bytes at `addr` as UTF-8.
    pub(crate) fn string_at(&self, store: impl AsContext, addr: i32, len: usize) -> Result<String> {
        let start = guest_offset(addr);
        let data = self.memory.data(&store);
        let bytes = start
            .checked_add(len)
            .and_then(|end| data.get(start..end))
            .ok_or(Error::OutOfBounds { addr: start, len })?;
        let s = std::str::from_utf8(bytes).map_err(wasp_abi::Error::from)?;
        Ok(s.to_owned())
    }

    /// Payload length declared by the buffer prefix at `addr`.
    pub(crate) fn bytes_len(&self, store: impl AsContext, addr: i32) -> Result<usize> {
        let prefix = wasp_abi::read_prefix(self.buffer_at(&store, addr)?)?;
        Ok(prefix as usize)
    }

    /// Copies the payload of the length-prefixed buffer at `addr`.
    pub(crate) fn read_bytes(&self, store: impl AsContext, addr: i32) -> Result<Vec<u8>> {
        Ok(wasp_abi::decode(self.buffer_at(&store, addr)?)?)
    }

    /// Guest memory from `addr` to its end.
    fn buffer_at<'a, T: 'a>(&self, store: &'a impl AsContext<Data = T>, addr: i32) -> Result<&'a [u8]> {
        let start = guest_offset(addr);
        self.memory
            .data(store)
            .get(start..)
            .ok_or(Error::OutOfBounds {
                addr: start,
                len: wasp_abi::PREFIX_LEN,
            })
    }

    /// Releases a region through the guest's `deallocate`, when exported.
    pub(crate) fn free(&self, mut store: impl AsContextMut, addr: i32, size: i32) -> Result<()> {
        if let Some(deallocate) = &self.deallocate {
            deallocate.call(&mut store, (addr, size))?;
            trace!(addr, size, "released guest memory");
        }
        Ok(())
    }
}
