//! Host runtime for WebAssembly plugins.
//!
//! `wasp` loads Wasm modules as named plugins and calls their exports with
//! integers, strings and byte arrays. Variable-length values are copied
//! through guest linear memory using the guest's own `allocate` and
//! `deallocate` exports (see [`wasp_abi`] for the wire formats).
//!
//! # Quick start
//!
//! ```no_run
//! use wasp::{Callbacks, Engine, PluginConfig};
//!
//! let callbacks = Callbacks::new().string("env", "call_me", |name| format!("Hello {name}"));
//! let mut engine = Engine::with_callbacks(callbacks);
//! engine.register_plugin("demo", "wasp_guest.wasm", PluginConfig::new())?;
//!
//! let mut demo = engine.get_instance("demo")?;
//! assert_eq!(demo.call::<i32>("sum", &[3.into(), 2.into()])?, 5);
//! assert_eq!(demo.call::<Vec<u8>>("reverse", &[vec![1, 2, 3].into()])?, [3, 2, 1]);
//! # Ok::<(), wasp::Error>(())
//! ```
//!
//! # Memory ownership
//!
//! The host releases every region it writes into the guest, and every
//! string or buffer a guest function returns, once the call completes.
//! Strings a guest passes to a host import remain owned by the guest.

mod callback;
mod engine;
mod error;
mod imports;
mod instance;
mod memory;
mod plugin;
mod state;
mod value;

pub use callback::Callbacks;
pub use engine::Engine;
pub use error::{Error, Result};
pub use instance::Instance;
pub use plugin::{Import, ModuleInfo, Plugin, PluginConfig};
pub use value::{FromValue, Kind, Param, Value};
