//! The plugin registry.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::Path;

use tracing::{debug, info};
use wasmtime::Module;

use crate::callback::Callbacks;
use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::plugin::{ModuleInfo, Plugin, PluginConfig};

/// Compiles, validates and instantiates plugins.
///
/// Plugins are compiled once at registration; every
/// [`get_instance`](Self::get_instance) creates a fresh instance with its
/// own store and memory.
///
/// ```no_run
/// use wasp::{Callbacks, Engine, PluginConfig};
///
/// let callbacks = Callbacks::new().string("env", "call_me", |name| format!("Hello {name}"));
/// let mut engine = Engine::with_callbacks(callbacks);
/// engine.register_plugin("demo", "demo.wasm", PluginConfig::new())?;
///
/// let mut instance = engine.get_instance("demo")?;
/// let greeting: String = instance.call("hello", &["Nic".into()])?;
/// # Ok::<(), wasp::Error>(())
/// ```
pub struct Engine {
    engine: wasmtime::Engine,
    callbacks: Callbacks,
    plugins: HashMap<String, Plugin>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("callbacks", &self.callbacks)
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine providing only the default imports.
    pub fn new() -> Self {
        Self::with_callbacks(Callbacks::new())
    }

    /// An engine offering `callbacks` to every plugin.
    pub fn with_callbacks(callbacks: Callbacks) -> Self {
        Self {
            engine: wasmtime::Engine::default(),
            callbacks,
            plugins: HashMap::new(),
        }
    }

    /// Engine-wide callbacks.
    pub const fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }

    /// Registers the module at `path` under `name`.
    ///
    /// The file may be a binary module or, with wasmtime's `wat` feature,
    /// text format.
    pub fn register_plugin(
        &mut self,
        name: impl Into<String>,
        path: impl AsRef<Path>,
        config: PluginConfig,
    ) -> Result<()> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        debug!(path = %path.display(), size = bytes.len(), "read plugin");
        self.register_plugin_bytes(name, &bytes, config)
    }

    /// Registers an in-memory module under `name`, replacing any plugin
    /// already registered with that name.
    ///
    /// Fails if the module lacks `memory` or `allocate`, or imports a
    /// function that is neither a default import nor a callback.
    pub fn register_plugin_bytes(
        &mut self,
        name: impl Into<String>,
        bytes: &[u8],
        config: PluginConfig,
    ) -> Result<()> {
        let name = name.into();
        let module = Module::new(&self.engine, bytes)?;
        let callbacks = self.callbacks.layered(config.callback_set());
        let plugin = Plugin::link(name.clone(), module, &callbacks)?;
        match self.plugins.entry(name) {
            Entry::Occupied(mut slot) => {
                info!(plugin = %slot.key(), "replaced plugin");
                slot.insert(plugin);
            }
            Entry::Vacant(slot) => {
                info!(plugin = %slot.key(), "registered plugin");
                slot.insert(plugin);
            }
        }
        Ok(())
    }

    /// The plugin registered under `name`.
    pub fn plugin(&self, name: &str) -> Option<&Plugin> {
        self.plugins.get(name)
    }

    /// Names of all registered plugins, sorted.
    pub fn plugin_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Unregisters `name`. Existing instances keep working.
    pub fn remove_plugin(&mut self, name: &str) -> bool {
        self.plugins.remove(name).is_some()
    }

    /// Instantiates the plugin registered under `name`.
    pub fn get_instance(&self, name: &str) -> Result<Instance> {
        let plugin = self
            .plugins
            .get(name)
            .ok_or_else(|| Error::PluginNotFound(name.to_owned()))?;
        Instance::new(&self.engine, plugin)
    }

    /// Compiles `bytes` and reports its interface without registering it.
    pub fn inspect(&self, bytes: &[u8]) -> Result<ModuleInfo> {
        let module = Module::new(&self.engine, bytes)?;
        Ok(ModuleInfo::of(&module, &self.callbacks))
    }
}
