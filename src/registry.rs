//! Bidirectional registry mapping wire type tags to message descriptors.
//!
//! A [`TypeRegistry`] is the single source of truth for the tag-to-type
//! contract shared by both sides of a connection. It is created during
//! protocol setup, shared read-mostly across every connection using the same
//! configuration via [`Arc`], and outlives any single connection. Entries
//! are insert-only: the registry supports registration and lookup, never
//! update or delete.
//!
//! Type identity is keyed by [`TypeId`], so the reverse (type to tag) lookup
//! resolves at registration time from the concrete type parameter rather
//! than from runtime inspection of message values.

use std::{
    any::{self, Any, TypeId},
    collections::HashMap,
    fmt,
    num::NonZeroI32,
    sync::{Arc, PoisonError, RwLock},
};

use thiserror::Error;

use crate::message::Message;

/// Wire type tag identifying a registered message type.
///
/// Tags travel as 32-bit signed big-endian integers in the frame header.
/// The value `0` is reserved on the wire to mean "absent" and cannot be
/// constructed; optional tags are expressed as `Option<TypeTag>` rather
/// than by overloading zero.
///
/// # Examples
///
/// ```
/// use tagwire::TypeTag;
///
/// let tag = TypeTag::new(7).expect("non-zero tag");
/// assert_eq!(tag.get(), 7);
/// assert!(TypeTag::new(0).is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(NonZeroI32);

impl TypeTag {
    /// Create a tag from a raw wire value, rejecting the reserved `0`.
    #[must_use]
    pub const fn new(raw: i32) -> Option<Self> {
        match NonZeroI32::new(raw) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Raw wire value of this tag.
    #[must_use]
    pub const fn get(self) -> i32 { self.0.get() }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Type-erased message value produced by a body parser.
///
/// Concrete messages are recovered with [`crate::codec::DecodedMessage::downcast`].
pub type BoxedMessage = Box<dyn Any + Send + Sync>;

/// Error surfaced by a body parser.
pub type ParseError = Box<dyn std::error::Error + Send + Sync>;

/// Function converting raw body bytes into a typed message instance.
pub type BodyParser = Arc<dyn Fn(&[u8]) -> Result<BoxedMessage, ParseError> + Send + Sync>;

/// Errors reported by registration and lookup operations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Another message type is already registered under this tag.
    #[error("tag {tag} is already registered to {existing}")]
    DuplicateTag {
        /// Tag that was offered twice.
        tag: TypeTag,
        /// Type name holding the existing registration.
        existing: &'static str,
    },

    /// The message type is already registered under another tag.
    #[error("{type_name} is already registered under tag {existing}")]
    DuplicateType {
        /// Type name that was offered twice.
        type_name: &'static str,
        /// Tag holding the existing registration.
        existing: TypeTag,
    },

    /// No message type is registered under this tag.
    #[error("no message type registered under tag {tag}")]
    UnknownTag {
        /// Tag that was looked up.
        tag: TypeTag,
    },

    /// No tag is registered for this message type.
    #[error("no tag registered for message type {type_name}")]
    UnregisteredType {
        /// Type name that was looked up.
        type_name: &'static str,
    },
}

/// Immutable descriptor for one registered message type.
///
/// Cloning is cheap: the parser is shared behind an [`Arc`].
#[derive(Clone)]
pub struct RegistryEntry {
    tag: TypeTag,
    type_name: &'static str,
    type_id: TypeId,
    parser: BodyParser,
}

impl RegistryEntry {
    /// Tag this entry is registered under.
    #[must_use]
    pub const fn tag(&self) -> TypeTag { self.tag }

    /// Name of the registered message type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str { self.type_name }

    /// Parse raw body bytes into the registered message type.
    ///
    /// # Errors
    ///
    /// Returns the parser's error when the body cannot be decoded.
    pub fn parse(&self, body: &[u8]) -> Result<BoxedMessage, ParseError> { (self.parser)(body) }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("tag", &self.tag)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct RegistryMaps {
    by_tag: HashMap<TypeTag, RegistryEntry>,
    by_type: HashMap<TypeId, TypeTag>,
}

/// Bidirectional mapping between wire type tags and message descriptors.
///
/// Registration and lookup are symmetric: the encode path resolves a tag
/// from a message's type, the decode path resolves a parser from a frame's
/// tag. Both mappings for one entry are established under a single write
/// lock, so a concurrent lookup never observes a partial registration.
///
/// # Examples
///
/// ```
/// use tagwire::{TypeRegistry, TypeTag};
///
/// #[derive(bincode::Encode, bincode::Decode)]
/// struct Ping {
///     seq: u32,
/// }
///
/// let registry = TypeRegistry::new();
/// let tag = TypeTag::new(1).expect("non-zero tag");
/// registry.register::<Ping>(tag).expect("fresh registration");
/// assert_eq!(registry.tag_of::<Ping>(), Some(tag));
/// ```
#[derive(Debug, Default)]
pub struct TypeRegistry {
    inner: RwLock<RegistryMaps>,
}

impl TypeRegistry {
    /// Construct an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Register `M` under `tag`, using its [`Message`] decoder as the body
    /// parser.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTag`] if `tag` is already bound and
    /// [`RegistryError::DuplicateType`] if `M` is already registered under
    /// another tag. Prior registrations are untouched on failure.
    pub fn register<M>(&self, tag: TypeTag) -> Result<(), RegistryError>
    where
        M: Message + Send + Sync + 'static,
    {
        self.register_with(tag, |body: &[u8]| {
            M::from_bytes(body)
                .map(|(message, _)| message)
                .map_err(ParseError::from)
        })
    }

    /// Register `M` under `tag` with a caller-supplied body parser.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTag`] if `tag` is already bound and
    /// [`RegistryError::DuplicateType`] if `M` is already registered under
    /// another tag. Prior registrations are untouched on failure.
    pub fn register_with<M, P>(&self, tag: TypeTag, parser: P) -> Result<(), RegistryError>
    where
        M: Send + Sync + 'static,
        P: Fn(&[u8]) -> Result<M, ParseError> + Send + Sync + 'static,
    {
        self.insert(RegistryEntry {
            tag,
            type_name: any::type_name::<M>(),
            type_id: TypeId::of::<M>(),
            parser: Arc::new(move |body: &[u8]| {
                parser(body).map(|message| Box::new(message) as BoxedMessage)
            }),
        })
    }

    fn insert(&self, entry: RegistryEntry) -> Result<(), RegistryError> {
        let mut maps = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = maps.by_tag.get(&entry.tag) {
            return Err(RegistryError::DuplicateTag {
                tag: entry.tag,
                existing: existing.type_name,
            });
        }
        if let Some(&existing) = maps.by_type.get(&entry.type_id) {
            return Err(RegistryError::DuplicateType {
                type_name: entry.type_name,
                existing,
            });
        }
        tracing::debug!(
            tag = entry.tag.get(),
            type_name = entry.type_name,
            "registered message type"
        );
        // Both maps are updated under the same write guard so lookups see
        // either the full entry or nothing.
        maps.by_type.insert(entry.type_id, entry.tag);
        maps.by_tag.insert(entry.tag, entry);
        Ok(())
    }

    /// Look up the entry registered under `tag`.
    #[must_use]
    pub fn entry(&self, tag: TypeTag) -> Option<RegistryEntry> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_tag
            .get(&tag)
            .cloned()
    }

    /// Look up the entry registered under `tag`, erroring when absent.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownTag`] if nothing is registered under
    /// `tag`.
    pub fn require_entry(&self, tag: TypeTag) -> Result<RegistryEntry, RegistryError> {
        self.entry(tag).ok_or(RegistryError::UnknownTag { tag })
    }

    /// Look up the tag registered for message type `M`.
    #[must_use]
    pub fn tag_of<M: 'static>(&self) -> Option<TypeTag> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_type
            .get(&TypeId::of::<M>())
            .copied()
    }

    /// Look up the tag registered for `M`, erroring when absent.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnregisteredType`] if `M` has no tag.
    pub fn require_tag_of<M: 'static>(&self) -> Result<TypeTag, RegistryError> {
        self.tag_of::<M>().ok_or(RegistryError::UnregisteredType {
            type_name: any::type_name::<M>(),
        })
    }

    /// Number of registered message types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_tag
            .len()
    }

    /// Whether the registry has no registrations.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}
