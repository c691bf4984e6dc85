//! Compiled plugins, pre-linked against host imports.

use serde::Serialize;
use tracing::warn;
use wasmtime::{ExternType, InstancePre, Linker, Module, Store};
use wasp_abi::{ALLOCATE, DEALLOCATE, MEMORY};

use crate::callback::Callbacks;
use crate::error::{Error, Result};
use crate::imports;
use crate::state::State;

/// Per-plugin registration options.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct PluginConfig {
    callbacks: Callbacks,
}

impl PluginConfig {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Callbacks visible only to this plugin; they shadow engine-wide ones
    /// of the same name.
    pub fn callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub(crate) const fn callback_set(&self) -> &Callbacks {
        &self.callbacks
    }
}

/// A function a module imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct Import {
    /// Import module, e.g. `env`.
    pub module: String,
    /// Function name.
    pub name: String,
}

/// A module's interface, checked against the host.
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct ModuleInfo {
    /// Every import.
    pub imports: Vec<Import>,
    /// Every export name.
    pub exports: Vec<String>,
    /// Imports neither provided by default nor registered as callbacks.
    pub missing_imports: Vec<Import>,
    /// ABI exports the module lacks.
    pub missing_exports: Vec<String>,
}

impl ModuleInfo {
    pub(crate) fn of(module: &Module, callbacks: &Callbacks) -> Self {
        let imports: Vec<Import> = module
            .imports()
            .map(|i| Import {
                module: i.module().to_owned(),
                name: i.name().to_owned(),
            })
            .collect();
        let missing_imports = imports
            .iter()
            .filter(|i| !imports::provides(&i.module, &i.name) && !callbacks.contains(&i.module, &i.name))
            .cloned()
            .collect();

        let has = |name: &str, memory: bool| {
            module.exports().any(|e| {
                e.name() == name
                    && if memory {
                        matches!(e.ty(), ExternType::Memory(_))
                    } else {
                        matches!(e.ty(), ExternType::Func(_))
                    }
            })
        };
        let missing_exports = [(MEMORY, true), (ALLOCATE, false)]
            .into_iter()
            .filter(|&(name, memory)| !has(name, memory))
            .map(|(name, _)| name.to_owned())
            .collect();

        Self {
            imports,
            exports: module.exports().map(|e| e.name().to_owned()).collect(),
            missing_imports,
            missing_exports,
        }
    }

    /// Whether the module can be registered as is.
    pub fn is_loadable(&self) -> bool {
        self.missing_imports.is_empty() && self.missing_exports.is_empty()
    }
}

/// A registered plugin.
#[derive(Clone)]
pub struct Plugin {
    name: String,
    module: Module,
    pre: InstancePre<State>,
    info: ModuleInfo,
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl Plugin {
    /// Validates `module` and links it against the default imports and
    /// `callbacks`.
    pub(crate) fn link(name: String, module: Module, callbacks: &Callbacks) -> Result<Self> {
        let info = ModuleInfo::of(&module, callbacks);
        if let Some(export) = info.missing_exports.first() {
            return Err(Error::MissingExport {
                name: export.clone(),
            });
        }
        if let Some(import) = info.missing_imports.first() {
            return Err(Error::MissingImport {
                module: import.module.clone(),
                name: import.name.clone(),
            });
        }
        if !info.exports.iter().any(|e| e == DEALLOCATE) {
            warn!(plugin = %name, "module does not export deallocate; host allocations will leak");
        }

        let mut linker = Linker::new(module.engine());
        linker.allow_shadowing(true);
        imports::link(&mut linker)?;
        callbacks.link(&mut linker)?;
        let pre = linker.instantiate_pre(&module)?;
        Ok(Self {
            name,
            module,
            pre,
            info,
        })
    }

    /// Registration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Imports and exports of the compiled module.
    pub const fn info(&self) -> &ModuleInfo {
        &self.info
    }

    /// Whether the module exports `name`.
    pub fn exports(&self, name: &str) -> bool {
        self.module.get_export(name).is_some()
    }

    pub(crate) fn instantiate(&self, store: &mut Store<State>) -> Result<wasmtime::Instance> {
        Ok(self.pre.instantiate(store)?)
    }
}
