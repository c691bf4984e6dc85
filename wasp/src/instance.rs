//! Calling guest functions.

use std::time::Instant;

use tracing::{debug, error, warn};
use wasmtime::{FuncType, Store, Val, ValType};

use crate::error::{Error, Result};
use crate::memory::{GuestAbi, wire_size};
use crate::plugin::Plugin;
use crate::state::State;
use crate::value::{FromValue, Kind, Param, Value};

/// A live plugin instance with its own store and linear memory.
///
/// Every call copies string and byte parameters into guest memory, invokes
/// the export, copies the result out, and then releases everything the
/// host allocated or received, including the returned pointer.
pub struct Instance {
    plugin: String,
    store: Store<State>,
    instance: wasmtime::Instance,
    abi: GuestAbi,
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("plugin", &self.plugin)
            .field("abi", &self.abi)
            .finish_non_exhaustive()
    }
}

impl Instance {
    pub(crate) fn new(engine: &wasmtime::Engine, plugin: &Plugin) -> Result<Self> {
        let mut store = Store::new(engine, State::default());
        let instance = plugin.instantiate(&mut store)?;
        let abi = GuestAbi::from_instance(&instance, &mut store)?;
        debug!(plugin = plugin.name(), "instantiated plugin");
        Ok(Self {
            plugin: plugin.name().to_owned(),
            store,
            instance,
            abi,
        })
    }

    /// Name of the plugin this instance was created from.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Calls `function`, converting the result to `T`.
    ///
    /// ```no_run
    /// # fn demo(instance: &mut wasp::Instance) -> wasp::Result<()> {
    /// let total: i32 = instance.call("sum", &[3.into(), 2.into()])?;
    /// let reversed: Vec<u8> = instance.call("reverse", &[vec![1, 2, 3].into()])?;
    /// instance.call::<()>("reset", &[])?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn call<T: FromValue>(&mut self, function: &str, params: &[Param]) -> Result<T> {
        let value = self.call_value(function, params, T::KIND)?;
        T::from_value(value).ok_or_else(|| Error::Signature {
            function: function.to_owned(),
            reason: format!("result is not {}", T::KIND),
        })
    }

    /// Calls `function`, interpreting its result as `returns`.
    pub fn call_value(&mut self, function: &str, params: &[Param], returns: Kind) -> Result<Value> {
        let started = Instant::now();
        debug!(plugin = %self.plugin, function, ?params, %returns, "calling guest");
        let mut result = self.invoke(function, params, returns);
        // A guest-raised error outranks whatever failure followed it.
        if let Some(message) = self.store.data_mut().take_error() {
            result = Err(Error::Guest {
                function: function.to_owned(),
                message,
            });
        }
        let released = self.release();
        match &result {
            Ok(value) => debug!(function, %value, elapsed = ?started.elapsed(), "guest returned"),
            Err(e) => error!(function, error = %e, "guest call failed"),
        }
        let value = result?;
        released?;
        Ok(value)
    }

    fn invoke(&mut self, function: &str, params: &[Param], returns: Kind) -> Result<Value> {
        let func = self
            .instance
            .get_func(&mut self.store, function)
            .ok_or_else(|| Error::MissingExport {
                name: function.to_owned(),
            })?;
        let ty = func.ty(&self.store);
        check_signature(function, &ty, params.len(), returns)?;

        let mut args = Vec::with_capacity(params.len());
        for param in params {
            let raw = match param {
                Param::I32(v) => *v,
                Param::Str(s) => self.abi.write_string(&mut self.store, s)?,
                Param::Bytes(b) => self.abi.write_bytes(&mut self.store, b)?,
            };
            args.push(Val::I32(raw));
        }
        let mut results = vec![Val::I32(0); ty.results().len()];
        func.call(&mut self.store, &args, &mut results)?;
        if self.store.data().has_error() {
            // Replaced by the raised error in `call_value`.
            return Ok(Value::Unit);
        }
        self.convert(function, results.first().and_then(Val::i32), returns)
    }

    /// Schedules the returned region for release and copies it out.
    fn convert(&mut self, function: &str, raw: Option<i32>, returns: Kind) -> Result<Value> {
        let pointer = || {
            raw.filter(|&addr| addr != 0).ok_or_else(|| Error::NullResult {
                function: function.to_owned(),
                kind: returns,
            })
        };
        match returns {
            Kind::Unit => Ok(Value::Unit),
            Kind::I32 => raw.map(Value::I32).ok_or_else(|| Error::Signature {
                function: function.to_owned(),
                reason: "returned no value".to_owned(),
            }),
            Kind::Str => {
                let addr = pointer()?;
                let len = self.abi.string_len(&mut self.store, addr)?;
                let size = wire_size(len + 1)?;
                self.store.data_mut().track(addr, size);
                Ok(Value::Str(self.abi.string_at(&self.store, addr, len)?))
            }
            Kind::Bytes => {
                let addr = pointer()?;
                let len = self.abi.bytes_len(&self.store, addr)?;
                let size = wire_size(wasp_abi::PREFIX_LEN.saturating_add(len))?;
                self.store.data_mut().track(addr, size);
                Ok(Value::Bytes(self.abi.read_bytes(&self.store, addr)?))
            }
        }
    }

    /// Frees every region tracked during the call, returning the first
    /// failure.
    fn release(&mut self) -> Result<()> {
        let allocations = self.store.data_mut().take_allocations();
        let mut failure = None;
        for (addr, size) in allocations {
            if let Err(e) = self.abi.free(&mut self.store, addr, size) {
                warn!(addr, size, error = %e, "failed to release guest memory");
                failure.get_or_insert(e);
            }
        }
        failure.map_or(Ok(()), Err)
    }
}

fn check_signature(function: &str, ty: &FuncType, arity: usize, returns: Kind) -> Result<()> {
    let signature = |reason: &str| Error::Signature {
        function: function.to_owned(),
        reason: reason.to_owned(),
    };
    if ty.params().len() != arity {
        return Err(Error::Arity {
            function: function.to_owned(),
            expected: ty.params().len(),
            actual: arity,
        });
    }
    if !ty.params().chain(ty.results()).all(|t| matches!(t, ValType::I32)) {
        return Err(signature("only i32 parameters and results cross the boundary"));
    }
    match ty.results().len() {
        0 if returns != Kind::Unit => Err(signature("returns nothing")),
        0 | 1 => Ok(()),
        _ => Err(signature("returns more than one value")),
    }
}
