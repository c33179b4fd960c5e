//! Serialization contract between the framing layer and message bodies.
//!
//! The frame header carries only a length and a type tag; the body is opaque
//! to the framing core and crosses the boundary through this trait. Decoding
//! is owned (rather than borrowed) so parsed messages can outlive the receive
//! buffer they were sliced from.

use bincode::error::{DecodeError, EncodeError};
use bincode::{Decode, Encode, config, decode_from_slice, encode_to_vec};

/// Wrapper trait for application message types.
///
/// Any type deriving [`Encode`] and [`Decode`] automatically implements this
/// trait via a blanket implementation. The default methods serialize and
/// deserialize using bincode's standard configuration.
pub trait Message: Encode + Decode<()> {
    /// Serialize the message body into a byte vector.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if serialization fails.
    fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        encode_to_vec(self, config::standard())
    }

    /// Deserialize a message from a body slice, returning the message and
    /// the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if deserialization fails.
    fn from_bytes(bytes: &[u8]) -> Result<(Self, usize), DecodeError>
    where
        Self: Sized,
    {
        decode_from_slice(bytes, config::standard())
    }
}

impl<T> Message for T where T: Encode + Decode<()> {}
