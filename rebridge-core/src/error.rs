//! Error types for the bridge
//!
//! This module provides error handling using the `thiserror` crate.
//! Errors are categorized by their source: encoding lookup and conversion,
//! pattern compilation, match access, or the native engine at search time.

use crate::encoding::Encoding;
use thiserror::Error;

/// The main error type for the bridge
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegexError {
    /// An encoding name outside the supported set
    #[error("unknown encoding '{0}'")]
    UnknownEncoding(String),

    /// Text contains a character the target encoding cannot represent
    #[error("cannot encode {character:?} at character offset {position} as {encoding}")]
    Encoding {
        /// The encoding that was requested
        encoding: Encoding,
        /// The offending character
        character: char,
        /// Character offset of the offending character
        position: usize,
    },

    /// A byte buffer is not well-formed in the encoding it claims
    #[error("malformed {encoding} input at byte offset {offset}")]
    MalformedBytes {
        /// The encoding the bytes were decoded as
        encoding: Encoding,
        /// Byte offset of the first malformed unit
        offset: usize,
    },

    /// The engine rejected the pattern; carries its diagnostic verbatim
    #[error("pattern compilation failed: {message}")]
    PatternCompile {
        /// The engine's diagnostic
        message: String,
    },

    /// Group index out of range, or the group did not participate
    #[error("invalid group number {0}")]
    InvalidGroupIndex(usize),

    /// No group with this name exists in the pattern
    #[error("undefined group name '{0}'")]
    UnknownGroupName(String),

    /// The engine failed or violated its contract during a search
    #[error("engine error: {0}")]
    Engine(String),
}

impl RegexError {
    /// Build a compilation error from an engine diagnostic
    pub fn compile(message: impl Into<String>) -> Self {
        RegexError::PatternCompile {
            message: message.into(),
        }
    }
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, RegexError>;
