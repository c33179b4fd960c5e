//! Shared utilities for integration tests.
//!
//! Provides the sample protocol used across test modules: a small set of
//! message types and a registry pre-populated with their tags.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::sync::Arc;

use tagwire::{FrameCodec, TypeRegistry, TypeTag};

/// Result alias keeping test signatures short.
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Sample chat login message.
#[derive(bincode::Encode, bincode::Decode, Debug, PartialEq, Clone)]
pub struct Login {
    pub id: u32,
    pub name: String,
}

/// Sample chat message broadcast to a room.
#[derive(bincode::Encode, bincode::Decode, Debug, PartialEq, Clone)]
pub struct Chat {
    pub room: u16,
    pub body: String,
}

/// Sample keep-alive message with an empty body on the wire.
#[derive(bincode::Encode, bincode::Decode, Debug, PartialEq, Clone)]
pub struct Ping;

/// Tag constructor for tests; panics on the reserved zero.
pub fn tag(raw: i32) -> TypeTag { TypeTag::new(raw).expect("test tag must be non-zero") }

/// Registry pre-populated with the sample protocol's tags.
pub fn sample_registry() -> Arc<TypeRegistry> {
    let registry = Arc::new(TypeRegistry::new());
    registry.register::<Login>(tag(1)).expect("fresh tag");
    registry.register::<Chat>(tag(2)).expect("fresh tag");
    registry.register::<Ping>(tag(3)).expect("fresh tag");
    registry
}

/// Codec over [`sample_registry`] with no body length cap.
pub fn sample_codec() -> FrameCodec { FrameCodec::new(sample_registry()) }
