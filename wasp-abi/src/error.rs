//! Error types for ABI encoding and decoding.

/// Alias for `Result<T, wasp_abi::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while marshalling data across the boundary.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The declared length disagrees with the payload actually supplied.
    #[error("declared length {declared} does not match payload length {actual}")]
    LengthMismatch {
        /// Length the caller declared.
        declared: u32,
        /// Length of the payload supplied.
        actual: usize,
    },

    /// A decode destination is not exactly payload-sized.
    #[error("destination holds {capacity} bytes but the payload is {expected} bytes")]
    CapacityMismatch {
        /// Payload length read from the prefix.
        expected: usize,
        /// Size of the destination.
        capacity: usize,
    },

    /// The buffer ends before its declared payload does.
    #[error("buffer truncated: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required by the prefix.
        needed: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// A payload exceeds the codec limit.
    #[error("payload of {len} bytes exceeds the {max} byte limit")]
    TooLarge {
        /// Requested payload length.
        len: usize,
        /// Maximum accepted payload length.
        max: usize,
    },

    /// No NUL terminator was found.
    #[error("string is not NUL-terminated within {scanned} bytes")]
    Unterminated {
        /// Bytes scanned before giving up.
        scanned: usize,
    },

    /// A string to be encoded contains a NUL byte.
    #[error("interior NUL byte at offset {position}")]
    InteriorNul {
        /// Offset of the first NUL byte.
        position: usize,
    },

    /// A null pointer was passed where a buffer was expected.
    #[error("null pointer")]
    NullPointer,

    /// The guest allocator could not satisfy a request.
    #[error("allocation of {size} bytes failed")]
    AllocationFailed {
        /// Requested size in bytes.
        size: usize,
    },

    /// A string was not valid UTF-8.
    #[error("invalid UTF-8 in string")]
    Utf8(#[from] std::str::Utf8Error),

    /// A typed payload could not be (de)serialized.
    #[error("payload serialization: {0}")]
    Payload(#[from] postcard::Error),
}
