//! Error types for wasp host operations.

use crate::value::Kind;

/// Alias for `Result<T, wasp::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the wasp engine and its instances.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Encoding or decoding a value crossing the boundary failed.
    #[error(transparent)]
    Abi(#[from] wasp_abi::Error),

    /// The Wasm runtime reported an error (compilation, linking or a trap).
    #[error(transparent)]
    Wasm(#[from] wasmtime::Error),

    /// Reading a plugin from disk failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// No plugin is registered under the given name.
    #[error("plugin {0:?} is not registered")]
    PluginNotFound(String),

    /// The module lacks an export the ABI requires, or the called function.
    #[error("module does not export {name:?}")]
    MissingExport {
        /// Export name.
        name: String,
    },

    /// The module imports a function the host does not supply.
    #[error("module imports {module}::{name}, which the host does not provide")]
    MissingImport {
        /// Import module.
        module: String,
        /// Import name.
        name: String,
    },

    /// A function signature cannot be expressed with the ABI's value kinds.
    #[error("{function}: {reason}")]
    Signature {
        /// Function name.
        function: String,
        /// What is wrong with the signature.
        reason: String,
    },

    /// A call supplied the wrong number of parameters.
    #[error("{function} takes {expected} parameters, {actual} given")]
    Arity {
        /// Function name.
        function: String,
        /// Parameter count of the export.
        expected: usize,
        /// Parameter count supplied.
        actual: usize,
    },

    /// A function returned null where a string or buffer was expected.
    #[error("{function} returned a null {kind} pointer")]
    NullResult {
        /// Function name.
        function: String,
        /// Kind that was expected.
        kind: Kind,
    },

    /// An address range falls outside guest memory.
    #[error("guest memory access out of bounds: {len} bytes at {addr:#x}")]
    OutOfBounds {
        /// Guest address.
        addr: usize,
        /// Length of the access.
        len: usize,
    },

    /// The guest reported an error through `raise_error`.
    #[error("{function}: guest error: {message}")]
    Guest {
        /// Function that was executing.
        function: String,
        /// Message the guest raised.
        message: String,
    },

    /// A host callback failed or returned the wrong kind.
    #[error("callback {name}: {reason}")]
    Callback {
        /// Callback name.
        name: String,
        /// Failure description.
        reason: String,
    },

    /// A textual parameter could not be parsed.
    #[error("invalid parameter {input:?}: {reason}")]
    InvalidParam {
        /// The offending input.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}
