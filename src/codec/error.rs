//! Error types for the framing and codec layer.
//!
//! This module provides a structured taxonomy that distinguishes framing
//! errors (wire-level frame boundary issues), protocol errors (semantic
//! violations after frame extraction), encode-side failures, I/O errors,
//! and EOF conditions.
//!
//! # Error Categories
//!
//! - [`FramingError`]: Wire-level issues in frame structure (oversized declared lengths,
//!   unrepresentable lengths, truncated or inconsistent headers).
//! - [`ProtocolError`]: Violations after the frame boundary was found (reserved or unknown type
//!   tags, body parse failures).
//! - [`EofError`]: End-of-stream conditions distinguishing clean closure from premature
//!   disconnection.
//! - [`CodecError`]: Top-level enum wrapping all categories plus encode-side and I/O errors.
//!
//! Every error is fatal to the operation that raised it; the core never
//! retries and never resynchronises. Whether a connection survives is the
//! transport layer's decision.

use std::io;

use thiserror::Error;

use crate::registry::TypeTag;

/// Framing-level errors occurring during frame boundary handling.
///
/// These errors indicate problems with the wire-level frame structure,
/// before any payload interpretation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// Declared body length exceeds the configured maximum.
    #[error("frame body exceeds max length: {size} > {max}")]
    OversizedFrame {
        /// Body size declared by the length prefix or offered for encoding.
        size: usize,
        /// Maximum allowed body size.
        max: usize,
    },

    /// Frame length cannot be represented on the wire or on this host.
    #[error("frame length {size} is unrepresentable")]
    LengthOverflow {
        /// Body size that overflowed the length field or the address space.
        size: usize,
    },

    /// Buffer handed to decode is shorter than a frame header.
    #[error("incomplete frame header: have {have}, need {need}")]
    IncompleteHeader {
        /// Bytes available.
        have: usize,
        /// Bytes required for a complete header.
        need: usize,
    },

    /// Declared body length disagrees with the bytes handed to decode.
    #[error("frame length mismatch: header declares {declared}, slice carries {actual}")]
    LengthMismatch {
        /// Body length declared in the header.
        declared: usize,
        /// Body bytes actually present after the header.
        actual: usize,
    },
}

/// Protocol-level errors occurring after successful frame extraction.
///
/// These errors indicate semantic violations in the frame contents, after
/// the frame boundaries have been successfully determined.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame carries the reserved type tag `0`.
    #[error("frame carries reserved type tag 0")]
    ReservedTag,

    /// Frame tag has no registered message type.
    #[error("unknown message type tag: {tag}")]
    UnknownMessageType {
        /// Raw tag value received on the wire.
        tag: i32,
    },

    /// Registered parser rejected the frame body.
    #[error("failed to parse body for tag {tag}: {reason}")]
    BodyDecode {
        /// Tag whose parser failed.
        tag: TypeTag,
        /// Parser failure rendered for diagnostics.
        reason: String,
    },
}

/// EOF handling variants distinguishing normal vs. premature closure.
///
/// These errors help differentiate between a clean connection close (at a
/// frame boundary) and a premature disconnection (mid-frame).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum EofError {
    /// Clean EOF at frame boundary - normal socket closure.
    ///
    /// The peer closed the connection after completing the last frame. No
    /// data was lost.
    #[error("connection closed cleanly at frame boundary")]
    CleanClose,

    /// EOF received mid-frame - premature socket closure.
    ///
    /// The peer closed the connection while a frame body was being read.
    #[error("premature EOF: {bytes_received} bytes of {expected} byte body received")]
    MidFrame {
        /// Body bytes received before EOF.
        bytes_received: usize,
        /// Expected body size declared by the header.
        expected: usize,
    },

    /// EOF received mid-header during the length/tag prefix read.
    #[error("premature EOF during header: {bytes_received} of {header_size} header bytes")]
    MidHeader {
        /// Header bytes received before EOF.
        bytes_received: usize,
        /// Expected header size.
        header_size: usize,
    },
}

/// Top-level codec error taxonomy.
///
/// # Examples
///
/// ```
/// use tagwire::codec::{CodecError, EofError};
///
/// let err = CodecError::Eof(EofError::CleanClose);
/// assert!(err.is_clean_close());
/// assert_eq!(err.error_type(), "eof");
/// ```
#[derive(Debug, Error)]
pub enum CodecError {
    /// Framing layer error (wire-level frame boundary issues).
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Protocol layer error (post-frame extraction issues).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Encode-side tag resolution failed: the message type has no tag.
    #[error("no tag registered for message type {type_name}")]
    UnregisteredType {
        /// Type name of the unregistered message.
        type_name: &'static str,
    },

    /// Message body serialization failed.
    #[error("failed to serialise message body: {0}")]
    BodyEncode(#[source] bincode::error::EncodeError),

    /// Transport layer I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// End-of-stream handling.
    #[error("EOF: {0}")]
    Eof(#[from] EofError),
}

impl CodecError {
    /// Returns true if this error represents a clean connection close.
    ///
    /// A clean close occurs when the peer closes the connection at a frame
    /// boundary, indicating no data was lost.
    #[must_use]
    pub fn is_clean_close(&self) -> bool { matches!(self, Self::Eof(EofError::CleanClose)) }

    /// Returns the error category as a string for logging.
    ///
    /// One of: `"framing"`, `"protocol"`, `"encode"`, `"io"`, or `"eof"`.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Framing(_) => "framing",
            Self::Protocol(_) => "protocol",
            Self::UnregisteredType { .. } | Self::BodyEncode(_) => "encode",
            Self::Io(_) => "io",
            Self::Eof(_) => "eof",
        }
    }
}

impl From<CodecError> for io::Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(err) => err,
            CodecError::Eof(err) => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            err @ (CodecError::Framing(_) | CodecError::Protocol(_)) => {
                io::Error::new(io::ErrorKind::InvalidData, err)
            }
            err @ (CodecError::UnregisteredType { .. } | CodecError::BodyEncode(_)) => {
                io::Error::new(io::ErrorKind::InvalidInput, err)
            }
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
