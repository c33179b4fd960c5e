//! Unit tests for the frame codec.

use std::sync::Arc;

use bytes::BytesMut;
use rstest::{fixture, rstest};

use super::{CodecError, FrameCodec, FramingError, HEADER_SIZE, ProtocolError};
use crate::{
    byte_order::write_network_u32,
    message::Message,
    registry::{TypeRegistry, TypeTag},
};

#[derive(bincode::Encode, bincode::Decode, Debug, PartialEq, Clone)]
struct Login {
    id: u32,
    name: String,
}

#[derive(bincode::Encode, bincode::Decode, Debug, PartialEq)]
struct Logout {
    id: u32,
}

#[derive(bincode::Encode, bincode::Decode, Debug, PartialEq)]
struct Ping;

fn tag(raw: i32) -> TypeTag { TypeTag::new(raw).expect("test tag must be non-zero") }

#[fixture]
fn codec() -> FrameCodec {
    let registry = Arc::new(TypeRegistry::new());
    registry.register::<Login>(tag(1)).expect("fresh tag");
    registry.register::<Logout>(tag(2)).expect("fresh tag");
    registry.register::<Ping>(tag(3)).expect("fresh tag");
    FrameCodec::new(registry)
}

fn sample_login() -> Login {
    Login {
        id: 42,
        name: "x".into(),
    }
}

#[rstest]
fn encode_writes_header_then_body(codec: FrameCodec) {
    let message = sample_login();
    let mut wire = BytesMut::new();
    let written = codec
        .encode(&message, None, &mut wire)
        .expect("Login is registered");

    assert_eq!(written, wire.len());
    let body = message.to_bytes().expect("encodable");
    assert_eq!(written, HEADER_SIZE + body.len());
    let body_len = u32::try_from(body.len()).expect("small body");
    assert_eq!(&wire[..4], write_network_u32(body_len));
    assert_eq!(&wire[4..8], [0, 0, 0, 1]);
    assert_eq!(&wire[8..], body.as_slice());
}

#[rstest]
fn decode_reproduces_the_encoded_message(codec: FrameCodec) {
    let message = sample_login();
    let mut wire = BytesMut::new();
    codec
        .encode(&message, None, &mut wire)
        .expect("Login is registered");

    let decoded = codec.decode(&wire).expect("frame is well-formed");
    assert_eq!(decoded.tag(), tag(1));
    assert!(decoded.is::<Login>());
    assert_eq!(decoded.downcast::<Login>().expect("Login frame"), message);
}

#[rstest]
fn resolved_tags_follow_the_message_type(codec: FrameCodec) {
    let mut wire = BytesMut::new();
    codec
        .encode(&Logout { id: 7 }, None, &mut wire)
        .expect("Logout is registered");
    codec
        .encode(&Ping, None, &mut wire)
        .expect("Ping is registered");

    let first_len = HEADER_SIZE + Logout { id: 7 }.to_bytes().expect("encodable").len();
    let first = codec.decode(&wire[..first_len]).expect("first frame");
    let second = codec.decode(&wire[first_len..]).expect("second frame");
    assert_eq!(first.tag(), tag(2));
    assert_eq!(second.tag(), tag(3));
    assert!(second.is::<Ping>());
}

#[rstest]
fn zero_length_body_round_trips(codec: FrameCodec) {
    let mut wire = BytesMut::new();
    let written = codec
        .encode(&Ping, None, &mut wire)
        .expect("Ping is registered");
    assert_eq!(written, HEADER_SIZE);
    assert_eq!(&wire[..4], [0, 0, 0, 0]);

    let decoded = codec.decode(&wire).expect("empty body is legal");
    assert_eq!(decoded.downcast::<Ping>().expect("Ping frame"), Ping);
}

#[rstest]
fn explicit_tag_bypasses_registry_resolution(codec: FrameCodec) {
    #[derive(bincode::Encode, bincode::Decode, Debug, PartialEq)]
    struct Unregistered {
        value: u8,
    }

    let mut wire = BytesMut::new();
    codec
        .encode(&Unregistered { value: 9 }, Some(tag(9)), &mut wire)
        .expect("explicit tag needs no registry entry");
    assert_eq!(&wire[4..8], [0, 0, 0, 9]);

    // The receiving side has no entry for tag 9.
    let err = codec.decode(&wire).expect_err("tag 9 is unregistered");
    assert!(matches!(
        err,
        CodecError::Protocol(ProtocolError::UnknownMessageType { tag: 9 })
    ));
}

#[rstest]
fn encode_without_tag_requires_registration(codec: FrameCodec) {
    #[derive(bincode::Encode, bincode::Decode, Debug)]
    struct Unregistered {
        value: u8,
    }

    let mut wire = BytesMut::new();
    let err = codec
        .encode(&Unregistered { value: 9 }, None, &mut wire)
        .expect_err("no tag to resolve");
    assert!(matches!(err, CodecError::UnregisteredType { .. }));
    assert!(wire.is_empty());
}

#[test]
fn oversized_body_is_rejected_on_encode() {
    let registry = Arc::new(TypeRegistry::new());
    registry.register::<Login>(tag(1)).expect("fresh tag");
    let codec = FrameCodec::with_max_body_length(registry, 4);

    let message = Login {
        id: 42,
        name: "much too long".into(),
    };
    let mut wire = BytesMut::new();
    let err = codec
        .encode(&message, None, &mut wire)
        .expect_err("body exceeds the cap");
    assert!(matches!(
        err,
        CodecError::Framing(FramingError::OversizedFrame { max: 4, .. })
    ));
    assert!(wire.is_empty());
}

#[rstest]
fn truncated_header_is_rejected(codec: FrameCodec) {
    let err = codec.decode(&[0, 0]).expect_err("two bytes is no header");
    assert!(matches!(
        err,
        CodecError::Framing(FramingError::IncompleteHeader { have: 2, need: 8 })
    ));
}

#[rstest]
fn declared_length_must_match_the_slice(codec: FrameCodec) {
    // Header declares five body bytes but only two follow.
    let mut wire = BytesMut::new();
    wire.extend_from_slice(&write_network_u32(5));
    wire.extend_from_slice(&[0, 0, 0, 1]);
    wire.extend_from_slice(&[0xAA, 0xBB]);

    let err = codec.decode(&wire).expect_err("slice is short");
    assert!(matches!(
        err,
        CodecError::Framing(FramingError::LengthMismatch {
            declared: 5,
            actual: 2
        })
    ));
}

#[rstest]
fn reserved_tag_is_rejected(codec: FrameCodec) {
    let mut wire = BytesMut::new();
    wire.extend_from_slice(&write_network_u32(0));
    wire.extend_from_slice(&[0, 0, 0, 0]);

    let err = codec.decode(&wire).expect_err("tag 0 is reserved");
    assert!(matches!(
        err,
        CodecError::Protocol(ProtocolError::ReservedTag)
    ));
}

#[rstest]
fn body_parse_failure_is_a_protocol_error(codec: FrameCodec) {
    // One body byte decodes Login's id but leaves the name truncated.
    let mut wire = BytesMut::new();
    wire.extend_from_slice(&write_network_u32(1));
    wire.extend_from_slice(&[0, 0, 0, 1]);
    wire.extend_from_slice(&[5]);

    let err = codec.decode(&wire).expect_err("body is truncated");
    match err {
        CodecError::Protocol(ProtocolError::BodyDecode { tag: t, .. }) => assert_eq!(t, tag(1)),
        other => panic!("expected BodyDecode, got {other:?}"),
    }
}

#[rstest]
fn downcast_to_the_wrong_type_returns_the_message(codec: FrameCodec) {
    let mut wire = BytesMut::new();
    codec
        .encode(&sample_login(), None, &mut wire)
        .expect("Login is registered");

    let decoded = codec.decode(&wire).expect("frame is well-formed");
    let decoded = decoded.downcast::<Logout>().expect_err("frame is a Login");
    assert_eq!(decoded.tag(), tag(1));
    assert_eq!(
        decoded.downcast_ref::<Login>().expect("still a Login"),
        &sample_login()
    );
}
