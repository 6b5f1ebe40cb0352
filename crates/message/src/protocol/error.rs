use std::io;
use thiserror::Error;

/// The single error type produced by message, uri, stream and upload operations.
///
/// Errors are always raised to the direct caller; a failing `with_*` call never
/// leaves a half-updated value behind.
#[derive(Error, Debug)]
pub enum MessageError {
    /// Malformed or out-of-domain input to a constructor or `with_*` method.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The target object is in a terminal state (detached stream, moved upload).
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },

    /// A collection holds an element lacking the expected capability.
    #[error("type mismatch: expected {expected}, {found} given")]
    TypeMismatch { expected: &'static str, found: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl MessageError {
    pub fn invalid_argument<S: ToString>(str: S) -> Self {
        Self::InvalidArgument { reason: str.to_string() }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidArgument { reason: format!("invalid header: {}", str.to_string()) }
    }

    pub fn invalid_state<S: ToString>(str: S) -> Self {
        Self::InvalidState { reason: str.to_string() }
    }

    pub fn type_mismatch<S: ToString>(expected: &'static str, found: S) -> Self {
        Self::TypeMismatch { expected, found: found.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    #[inline]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    #[inline]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }

    #[inline]
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }
}
