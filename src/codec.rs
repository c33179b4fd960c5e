//! Stateless encode/decode of single type-tagged frames.
//!
//! A frame is one complete wire unit: an 8-byte header (big-endian `u32`
//! body length, big-endian `i32` type tag) followed by the serialized body.
//! [`FrameCodec`] encodes one message into an output buffer and decodes one
//! complete frame into a [`DecodedMessage`]; it never determines framing
//! boundaries itself. Incremental boundary detection lives in
//! [`crate::framer`].
//!
//! # Error Handling
//!
//! The codec layer reports failures through the structured taxonomy in
//! [`error`]: framing errors for malformed frame structure, protocol errors
//! for unknown or reserved tags and body parse failures, and encode-side
//! errors for unresolvable tags or serializer failures. Nothing is retried.

use std::{
    any::{self, Any},
    fmt,
    sync::Arc,
};

use bytes::BytesMut;

use crate::{
    byte_order::{read_network_i32, read_network_u32, write_network_i32, write_network_u32},
    message::Message,
    registry::{TypeRegistry, TypeTag},
};

pub mod error;

pub use error::{CodecError, EofError, FramingError, ProtocolError};

/// Size in bytes of the big-endian body length field.
pub const LENGTH_FIELD_SIZE: usize = 4;

/// Size in bytes of the big-endian type tag field.
pub const TAG_FIELD_SIZE: usize = 4;

/// Size in bytes of the fixed frame header.
pub const HEADER_SIZE: usize = LENGTH_FIELD_SIZE + TAG_FIELD_SIZE;

/// Fully decoded message with its resolved tag and registered type name.
///
/// The message value is type-erased; callers recover the concrete type with
/// [`downcast`](Self::downcast) or inspect it with
/// [`downcast_ref`](Self::downcast_ref).
pub struct DecodedMessage {
    tag: TypeTag,
    type_name: &'static str,
    message: Box<dyn Any + Send + Sync>,
}

impl DecodedMessage {
    /// Tag resolved from the frame header.
    #[must_use]
    pub const fn tag(&self) -> TypeTag { self.tag }

    /// Name of the registered message type that parsed the body.
    #[must_use]
    pub const fn type_name(&self) -> &'static str { self.type_name }

    /// Whether the decoded message is of type `M`.
    #[must_use]
    pub fn is<M: 'static>(&self) -> bool { self.message.is::<M>() }

    /// Recover the concrete message, returning `self` unchanged on a type
    /// mismatch.
    ///
    /// # Errors
    ///
    /// Returns `self` when the decoded message is not of type `M`.
    pub fn downcast<M: 'static>(self) -> Result<M, Self> {
        let Self {
            tag,
            type_name,
            message,
        } = self;
        match message.downcast::<M>() {
            Ok(message) => Ok(*message),
            Err(message) => Err(Self {
                tag,
                type_name,
                message,
            }),
        }
    }

    /// Borrow the concrete message, if it is of type `M`.
    #[must_use]
    pub fn downcast_ref<M: 'static>(&self) -> Option<&M> { self.message.downcast_ref::<M>() }
}

impl fmt::Debug for DecodedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedMessage")
            .field("tag", &self.tag)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Stateless encoder/decoder for single complete frames.
///
/// Cloning is cheap: the registry is shared behind an [`Arc`]. Encode and
/// decode are synchronous and perform no I/O; only the transport around
/// them may block or suspend.
#[derive(Clone, Debug)]
pub struct FrameCodec {
    registry: Arc<TypeRegistry>,
    max_body_length: Option<usize>,
}

impl FrameCodec {
    /// Construct a codec over `registry` with no body length cap.
    #[must_use]
    pub const fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            max_body_length: None,
        }
    }

    /// Construct a codec that rejects bodies longer than `max` bytes.
    ///
    /// The framing core places no bound of its own on declared body
    /// lengths; this cap is how a transport layer imposes one. It applies
    /// to both encode and incremental decode (see
    /// [`StreamFramer`](crate::framer::StreamFramer)), and oversized
    /// declarations are rejected before any receive buffer is grown.
    #[must_use]
    pub const fn with_max_body_length(registry: Arc<TypeRegistry>, max: usize) -> Self {
        Self {
            registry,
            max_body_length: Some(max),
        }
    }

    /// Registry this codec resolves tags and parsers against.
    #[must_use]
    pub const fn registry(&self) -> &Arc<TypeRegistry> { &self.registry }

    /// Configured body length cap, if any.
    #[must_use]
    pub const fn max_body_length(&self) -> Option<usize> { self.max_body_length }

    /// Encode one message as a complete frame appended to `dst`.
    ///
    /// When `tag` is `None` the tag is resolved from the message's type via
    /// the registry. The header and body are written as one contiguous run
    /// and the total number of bytes written (`8 + body length`) is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnregisteredType`] when no tag is given and
    /// the registry holds none for `M`, [`CodecError::BodyEncode`] when
    /// body serialization fails, [`FramingError::OversizedFrame`] when a
    /// configured cap is exceeded, and [`FramingError::LengthOverflow`]
    /// when the body length does not fit the wire's `u32` length field.
    pub fn encode<M>(
        &self,
        message: &M,
        tag: Option<TypeTag>,
        dst: &mut BytesMut,
    ) -> Result<usize, CodecError>
    where
        M: Message + Send + Sync + 'static,
    {
        let tag = match tag {
            Some(tag) => tag,
            None => self
                .registry
                .tag_of::<M>()
                .ok_or(CodecError::UnregisteredType {
                    type_name: any::type_name::<M>(),
                })?,
        };
        let body = message.to_bytes().map_err(CodecError::BodyEncode)?;
        if let Some(max) = self.max_body_length
            && body.len() > max
        {
            return Err(FramingError::OversizedFrame {
                size: body.len(),
                max,
            }
            .into());
        }
        let declared = u32::try_from(body.len())
            .map_err(|_| FramingError::LengthOverflow { size: body.len() })?;

        dst.reserve(HEADER_SIZE + body.len());
        dst.extend_from_slice(&write_network_u32(declared));
        dst.extend_from_slice(&write_network_i32(tag.get()));
        dst.extend_from_slice(&body);
        Ok(HEADER_SIZE + body.len())
    }

    /// Decode exactly one complete frame into a message.
    ///
    /// `frame` must be one whole frame (header plus body) as delivered by
    /// the framer; the declared length is re-checked against the slice and
    /// a disagreement is surfaced as [`FramingError::LengthMismatch`]
    /// rather than trusted.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::IncompleteHeader`] or
    /// [`FramingError::LengthMismatch`] for a malformed slice,
    /// [`ProtocolError::ReservedTag`] for tag `0`,
    /// [`ProtocolError::UnknownMessageType`] for an unregistered tag, and
    /// [`ProtocolError::BodyDecode`] when the registered parser rejects
    /// the body.
    pub fn decode(&self, frame: &[u8]) -> Result<DecodedMessage, CodecError> {
        let declared = frame
            .get(..LENGTH_FIELD_SIZE)
            .and_then(|slice| <[u8; LENGTH_FIELD_SIZE]>::try_from(slice).ok())
            .map(|bytes| read_network_u32(bytes) as usize)
            .ok_or(FramingError::IncompleteHeader {
                have: frame.len(),
                need: HEADER_SIZE,
            })?;
        let raw_tag = frame
            .get(LENGTH_FIELD_SIZE..HEADER_SIZE)
            .and_then(|slice| <[u8; TAG_FIELD_SIZE]>::try_from(slice).ok())
            .map(read_network_i32)
            .ok_or(FramingError::IncompleteHeader {
                have: frame.len(),
                need: HEADER_SIZE,
            })?;

        let body = &frame[HEADER_SIZE..];
        if body.len() != declared {
            return Err(FramingError::LengthMismatch {
                declared,
                actual: body.len(),
            }
            .into());
        }

        let Some(tag) = TypeTag::new(raw_tag) else {
            return Err(ProtocolError::ReservedTag.into());
        };
        let Some(entry) = self.registry.entry(tag) else {
            log::warn!("rejecting frame with unknown message type tag {raw_tag}");
            return Err(ProtocolError::UnknownMessageType { tag: raw_tag }.into());
        };
        let message = entry.parse(body).map_err(|err| ProtocolError::BodyDecode {
            tag,
            reason: err.to_string(),
        })?;
        Ok(DecodedMessage {
            tag,
            type_name: entry.type_name(),
            message,
        })
    }
}

#[cfg(test)]
mod tests;
