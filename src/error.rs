//! Error types for the xorro library.
//!
//! Encoders are total over well-formed input, so nearly every error comes from a decoder
//! rejecting a corrupt container, or from the byte handles supplied by the caller.

use thiserror::Error;

/// Everything that can go wrong while encoding or decoding a container.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error reported by the reader or writer handed to us.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed container, payload or step log.
    #[error("format error: {0}")]
    Format(String),

    /// A numeric invariant failed (rank out of range, one-bit count mismatch, ...).
    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// Options that cannot be used to build a container.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn format<S: Into<String>>(msg: S) -> Self {
        Error::Format(msg.into())
    }

    pub(crate) fn arithmetic<S: Into<String>>(msg: S) -> Self {
        Error::Arithmetic(msg.into())
    }
}

/// A specialized Result type for xorro operations.
pub type Result<T> = std::result::Result<T, Error>;
