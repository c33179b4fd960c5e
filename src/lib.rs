#![doc(html_root_url = "https://docs.rs/tagwire/latest")]
//! Public API for the `tagwire` library.
//!
//! This crate provides the framing core for length-prefixed, type-tagged
//! binary protocols: a registry mapping wire type tags to message parsers,
//! a stateless frame codec, and an incremental stream framer that turns an
//! arbitrarily chunked byte stream into decoded messages.
//!
//! # Wire format
//!
//! ```text
//! offset 0..3 : body length, u32, big-endian
//! offset 4..7 : type tag,    i32, big-endian
//! offset 8..N : serialized message body
//! ```
//!
//! Total frame size is `8 + body length`. No padding, no checksum, no
//! version field. The tag value `0` is reserved on the wire and can never
//! be registered; in-process APIs carry tags as [`registry::TypeTag`].

pub mod byte_order;
pub mod codec;
pub mod framer;
pub mod message;
pub mod registry;

pub use codec::{
    CodecError,
    DecodedMessage,
    EofError,
    FrameCodec,
    FramingError,
    HEADER_SIZE,
    ProtocolError,
};
pub use framer::{FrameDecoder, MessageDecoder, StreamFramer};
pub use message::Message;
pub use registry::{RegistryEntry, RegistryError, TypeRegistry, TypeTag};
