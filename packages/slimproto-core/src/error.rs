//! Centralized error types for the slimproto core library.
//!
//! This module defines structured, per-subsystem error types using
//! `thiserror`, aggregated behind a single crate-wide [`SlimprotoError`] with
//! a logging-severity classification rather than an HTTP status (this crate
//! has no HTTP surface).

use thiserror::Error;

/// Trait for error types that provide a machine-readable, stable code.
///
/// Useful for structured logging and for any embedder that wants to match on
/// error identity without matching on the full enum variant.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;
}

/// How a failing operation should be treated by the caller and by logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Expected shape of connection lifecycle (clean disconnect, EOF). Log at INFO.
    Info,
    /// Unexpected but session-scoped; log at WARN, terminate the connection.
    Warn,
    /// Handler-local failure; log at ERROR, session continues.
    Error,
}

/// Errors from decoding or encoding the wire framing.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Declared payload length exceeded [`crate::protocol_constants::MAX_FRAME_PAYLOAD`].
    #[error("frame payload too large: {0} bytes")]
    FrameTooLarge(u32),

    /// Connection closed or reset before a complete frame could be read.
    #[error("incomplete read: expected {expected} bytes, got {actual}")]
    IncompleteRead {
        /// Bytes the frame declared.
        expected: usize,
        /// Bytes actually read before the stream ended.
        actual: usize,
    },

    /// Underlying socket I/O failure.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Logging severity for this error.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::FrameTooLarge(_) => Severity::Warn,
            Self::IncompleteRead { .. } => Severity::Info,
            Self::Io(_) => Severity::Info,
        }
    }
}

impl ErrorCode for FrameError {
    fn code(&self) -> &'static str {
        match self {
            Self::FrameTooLarge(_) => "frame_too_large",
            Self::IncompleteRead { .. } => "incomplete_read",
            Self::Io(_) => "transport_io",
        }
    }
}

/// Errors from parsing the HELO handshake payload.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The first frame received on a connection was not tagged `HELO`.
    #[error("first frame was {0:?}, expected HELO")]
    NotHelo(String),

    /// HELO payload shorter than the minimum identifying fields.
    #[error("HELO payload too short: {0} bytes")]
    PayloadTooShort(usize),

    /// No HELO arrived within the handshake deadline.
    #[error("HELO deadline expired")]
    DeadlineExpired,
}

impl HandshakeError {
    /// Logging severity for this error.
    #[must_use]
    pub fn severity(&self) -> Severity {
        Severity::Warn
    }
}

impl ErrorCode for HandshakeError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotHelo(_) => "handshake_not_helo",
            Self::PayloadTooShort(_) => "handshake_payload_too_short",
            Self::DeadlineExpired => "handshake_deadline_expired",
        }
    }
}

/// Caller-side misuse of a command builder (fails fast, never reaches the wire).
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// A wire tag was not exactly 4 bytes.
    #[error("tag must be exactly 4 bytes, got {0}")]
    InvalidTagLength(usize),
}

impl ErrorCode for ArgumentError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidTagLength(_) => "invalid_tag_length",
        }
    }
}

/// Crate-wide error type aggregating every subsystem error.
#[derive(Debug, Error)]
pub enum SlimprotoError {
    /// Framing failure.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Handshake failure.
    #[error("handshake error: {0}")]
    Handshake(#[from] HandshakeError),

    /// Caller-side argument misuse.
    #[error("argument error: {0}")]
    Argument(#[from] ArgumentError),

    /// A session write failed; the session should transition to Disconnected.
    #[error("connection error: {0}")]
    Connection(String),
}

impl SlimprotoError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Frame(e) => e.code(),
            Self::Handshake(e) => e.code(),
            Self::Argument(e) => e.code(),
            Self::Connection(_) => "connection_error",
        }
    }

    /// Logging severity for this error.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::Frame(e) => e.severity(),
            Self::Handshake(e) => e.severity(),
            Self::Argument(_) => Severity::Warn,
            Self::Connection(_) => Severity::Info,
        }
    }
}

/// Convenient Result alias for slimproto-core operations.
pub type SlimprotoResult<T> = Result<T, SlimprotoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_too_large_has_warn_severity() {
        let err = FrameError::FrameTooLarge(1_048_576);
        assert_eq!(err.severity(), Severity::Warn);
        assert_eq!(err.code(), "frame_too_large");
    }

    #[test]
    fn handshake_errors_are_warn() {
        assert_eq!(HandshakeError::DeadlineExpired.severity(), Severity::Warn);
    }

    #[test]
    fn slimproto_error_aggregates_codes() {
        let err: SlimprotoError = FrameError::IncompleteRead {
            expected: 8,
            actual: 3,
        }
        .into();
        assert_eq!(err.code(), "incomplete_read");
    }
}
