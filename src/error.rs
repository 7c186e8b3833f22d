//! Error types returned by bitmap operations.

use alloc::string::String;

/// Errors that can occur when building, querying, combining or decoding a
/// bitmap.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A token that should have been an integer was something else.
    #[error("expected an unsigned integer, found {token:?}")]
    Type {
        /// The offending input token
        token: String,
    },

    /// An integer outside of `[0, 2^32)`.
    #[error("value {value} is outside of the range [0, 2^32)")]
    Range {
        /// The rejected value
        value: i128,
    },

    /// A stepped range or slice was given a step it cannot use.
    #[error("invalid step {step}")]
    InvalidStep {
        /// The rejected step
        step: i64,
    },

    /// `remove` was called with a value that is not in the bitmap.
    #[error("value {value} is not in the bitmap")]
    NotFound {
        /// The missing value
        value: u32,
    },

    /// A positional index fell outside of the bitmap.
    #[error("index {index} is out of range for a bitmap of {len} values")]
    Index {
        /// The requested position
        index: i64,
        /// Cardinality of the bitmap
        len: u64,
    },

    /// The operands of a binary operation disagree on copy-on-write.
    #[error("cannot combine bitmaps with different copy_on_write flags")]
    Incompatible,

    /// `min` or `max` of an empty bitmap.
    #[error("the bitmap is empty")]
    Empty,

    /// A serialized payload could not be decoded.
    #[error("invalid serialized bitmap: {0}")]
    Format(#[from] FormatError),
}

/// Reasons a serialized bitmap can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The buffer does not start with the expected magic bytes.
    #[error("bad magic")]
    BadMagic,

    /// The buffer ended in the middle of a field.
    #[error("unexpected end of input at byte {offset}")]
    Truncated {
        /// Offset at which more bytes were needed
        offset: usize,
    },

    /// Bytes remain after the last container.
    #[error("{remaining} trailing bytes after the last container")]
    TrailingBytes {
        /// Number of unread bytes
        remaining: usize,
    },

    /// A container tag that is not array, bitset or run.
    #[error("unknown container tag {tag} for key {key}")]
    UnknownTag {
        /// Key of the offending container
        key: u16,
        /// The unrecognized tag
        tag: u8,
    },

    /// Keys are not strictly increasing.
    #[error("key {key} is out of order")]
    UnsortedKeys {
        /// First key that broke the order
        key: u16,
    },

    /// A container payload violates its variant's invariants.
    #[error("corrupt container for key {key}")]
    CorruptContainer {
        /// Key of the offending container
        key: u16,
    },
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
