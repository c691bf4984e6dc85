//! Host functions a guest can import.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use wasmtime::{Caller, FuncType, Linker, Val, ValType};

use crate::error::{Error, Result};
use crate::memory::GuestAbi;
use crate::state::State;
use crate::value::{Kind, Value};

type HostFn = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

#[derive(Clone)]
struct Callback {
    module: String,
    name: String,
    params: Vec<Kind>,
    result: Kind,
    func: Arc<HostFn>,
}

/// A set of host functions exposed to guests as imports.
///
/// Arguments and results use the same kinds as guest calls: strings and
/// byte arrays are copied out of guest memory before the function runs,
/// and returned ones are written back through the guest's `allocate`.
/// Memory written for a callback result is released by the host once the
/// outer call returns.
///
/// ```no_run
/// use wasp::Callbacks;
///
/// let callbacks = Callbacks::new()
///     .string("env", "call_me", |name| format!("Hello {name}"))
///     .int("env", "double", |n| n * 2);
/// # let _ = callbacks;
/// ```
#[derive(Clone, Default)]
#[must_use]
pub struct Callbacks {
    entries: Vec<Callback>,
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.entries
                    .iter()
                    .map(|c| format!("{}::{}({:?}) -> {}", c.module, c.name, c.params, c.result)),
            )
            .finish()
    }
}

impl Callbacks {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a function taking `params` and returning `result`.
    ///
    /// Replaces any function already registered under `module::name`.
    /// Fails if a parameter is [`Kind::Unit`].
    pub fn function(
        mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        params: &[Kind],
        result: Kind,
        func: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Result<Self> {
        let (module, name) = (module.into(), name.into());
        if params.contains(&Kind::Unit) {
            return Err(Error::Callback {
                name: format!("{module}::{name}"),
                reason: "unit is not a parameter kind".to_owned(),
            });
        }
        self.insert(Callback {
            module,
            name,
            params: params.to_vec(),
            result,
            func: Arc::new(func),
        });
        Ok(self)
    }

    /// Adds a function mapping one string to another.
    pub fn string(
        mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        func: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        let (module, name) = (module.into(), name.into());
        let label = format!("{module}::{name}");
        self.insert(Callback {
            module,
            name,
            params: vec![Kind::Str],
            result: Kind::Str,
            func: Arc::new(move |args| match args {
                [Value::Str(s)] => Ok(Value::Str(func(s))),
                _ => Err(unexpected(&label, args)),
            }),
        });
        self
    }

    /// Adds a function mapping one integer to another.
    pub fn int(
        mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        func: impl Fn(i32) -> i32 + Send + Sync + 'static,
    ) -> Self {
        let (module, name) = (module.into(), name.into());
        let label = format!("{module}::{name}");
        self.insert(Callback {
            module,
            name,
            params: vec![Kind::I32],
            result: Kind::I32,
            func: Arc::new(move |args| match args {
                [Value::I32(n)] => Ok(Value::I32(func(*n))),
                _ => Err(unexpected(&label, args)),
            }),
        });
        self
    }

    /// Whether `module::name` is registered.
    pub fn contains(&self, module: &str, name: &str) -> bool {
        self.entries
            .iter()
            .any(|c| c.module == module && c.name == name)
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no function is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `self` overlaid with `other`; entries of `other` win.
    pub(crate) fn layered(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for entry in &other.entries {
            merged.insert(entry.clone());
        }
        merged
    }

    fn insert(&mut self, callback: Callback) {
        self.entries
            .retain(|c| !(c.module == callback.module && c.name == callback.name));
        self.entries.push(callback);
    }

    /// Defines every function in `linker`.
    pub(crate) fn link(&self, linker: &mut Linker<State>) -> Result<()> {
        for callback in &self.entries {
            let ty = FuncType::new(
                linker.engine(),
                callback.params.iter().map(|_| ValType::I32),
                (callback.result != Kind::Unit).then_some(ValType::I32),
            );
            let entry = callback.clone();
            linker.func_new(
                &callback.module,
                &callback.name,
                ty,
                move |mut caller, params, results| entry.invoke(&mut caller, params, results),
            )?;
        }
        Ok(())
    }
}

fn unexpected(name: &str, args: &[Value]) -> Error {
    Error::Callback {
        name: name.to_owned(),
        reason: format!("unexpected arguments {args:?}"),
    }
}

impl Callback {
    fn invoke(
        &self,
        caller: &mut Caller<'_, State>,
        params: &[Val],
        results: &mut [Val],
    ) -> wasmtime::Result<()> {
        debug!(module = %self.module, name = %self.name, "callback invoked");
        let abi = GuestAbi::from_caller(caller)?;

        let mut args = Vec::with_capacity(params.len());
        for (kind, raw) in self.params.iter().zip(params) {
            let raw = raw.i32().ok_or_else(|| self.error("argument is not an i32"))?;
            args.push(match kind {
                Kind::Str => Value::Str(abi.read_string(&mut *caller, raw)?),
                Kind::Bytes => Value::Bytes(abi.read_bytes(&*caller, raw)?),
                _ => Value::I32(raw),
            });
        }

        let out = (self.func)(&args).map_err(|e| match e {
            Error::Callback { .. } => e,
            other => self.error(other.to_string()),
        })?;
        let kind = out.kind();
        let ret = match out {
            Value::Unit if self.result == Kind::Unit => None,
            Value::I32(n) if self.result == Kind::I32 => Some(n),
            Value::Str(s) if self.result == Kind::Str => Some(abi.write_string(&mut *caller, &s)?),
            Value::Bytes(b) if self.result == Kind::Bytes => {
                Some(abi.write_bytes(&mut *caller, &b)?)
            }
            _ => {
                return Err(self
                    .error(format!("returned {kind}, declared {}", self.result))
                    .into());
            }
        };
        if let (Some(v), Some(slot)) = (ret, results.first_mut()) {
            *slot = Val::I32(v);
        }
        Ok(())
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::Callback {
            name: format!("{}::{}", self.module, self.name),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_registration_replaces_earlier() {
        let callbacks = Callbacks::new()
            .int("env", "f", |n| n)
            .int("env", "f", |n| n + 1)
            .int("env", "g", |n| n);
        assert_eq!(callbacks.len(), 2);
        let f = callbacks.entries.iter().find(|c| c.name == "f").unwrap();
        assert_eq!((f.func)(&[Value::I32(1)]).unwrap(), Value::I32(2));
    }

    #[test]
    fn unit_params_are_rejected() {
        let err = Callbacks::new()
            .function("env", "f", &[Kind::Unit], Kind::I32, |_| Ok(Value::I32(0)))
            .unwrap_err();
        assert!(matches!(err, Error::Callback { .. }));
    }

    #[test]
    fn layered_prefers_overlay() {
        let base = Callbacks::new()
            .string("env", "call_me", |_| "base".into())
            .int("env", "keep", |n| n);
        let overlay = Callbacks::new().string("env", "call_me", |_| "plugin".into());
        let merged = base.layered(&overlay);
        assert_eq!(merged.len(), 2);
        assert!(merged.contains("env", "keep"));
        let call_me = merged.entries.iter().find(|c| c.name == "call_me").unwrap();
        assert_eq!(
            (call_me.func)(&[Value::Str("x".into())]).unwrap(),
            Value::Str("plugin".into())
        );
    }

    #[test]
    fn builtin_adapters_check_arguments() {
        let callbacks = Callbacks::new().string("env", "s", |s| s.to_uppercase());
        let s = &callbacks.entries[0];
        assert_eq!(
            (s.func)(&[Value::Str("ab".into())]).unwrap(),
            Value::Str("AB".into())
        );
        let err = (s.func)(&[Value::I32(1)]).unwrap_err();
        assert!(matches!(err, Error::Callback { name, .. } if name == "env::s"));

        let ints = Callbacks::new().int("host", "double", |n| n * 2);
        let err = (ints.entries[0].func)(&[]).unwrap_err();
        assert!(matches!(err, Error::Callback { name, .. } if name == "host::double"));
    }
}
