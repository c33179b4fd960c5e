//! Incremental frame extraction from an unbounded byte stream.
//!
//! Transports deliver bytes in arbitrary-sized chunks with no relation to
//! frame boundaries. The types here convert that stream back into discrete
//! frames: [`FrameDecoder`] is the two-phase boundary state machine,
//! [`MessageDecoder`] composes it with a [`FrameCodec`] for use with
//! `tokio_util`'s `FramedRead`, and [`StreamFramer`] is the
//! transport-agnostic push API that buffers chunks and emits decoded
//! messages in arrival order.
//!
//! Each connection owns exactly one framer; state is private and mutated
//! only through `&mut self`, so no locking is needed within a connection.
//! A decode failure is fatal for the stream that produced it: the framer
//! makes no attempt to resynchronise, and the transport is expected to
//! close the connection.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;

use crate::{
    byte_order::read_network_u32,
    codec::{
        CodecError,
        DecodedMessage,
        EofError,
        FrameCodec,
        FramingError,
        HEADER_SIZE,
        LENGTH_FIELD_SIZE,
    },
};

/// Phase of the incremental frame parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DecodeState {
    /// Waiting for a complete 8-byte header.
    AwaitingHeader,
    /// Header seen; waiting for `frame_len` total buffered bytes.
    AwaitingBody {
        /// Header plus declared body length.
        frame_len: usize,
    },
}

/// Read the big-endian body length from the front of `src` without
/// consuming it.
fn peek_body_length(src: &[u8]) -> Option<usize> {
    src.get(..LENGTH_FIELD_SIZE)
        .and_then(|slice| <[u8; LENGTH_FIELD_SIZE]>::try_from(slice).ok())
        .map(|bytes| read_network_u32(bytes) as usize)
}

/// Incremental parser yielding complete raw frames from buffered bytes.
///
/// The returned frames include their 8-byte header; pass them unchanged to
/// [`FrameCodec::decode`]. Starts in the header-wait phase and returns to
/// it after every yielded frame, so leftover bytes belonging to the next
/// frame are picked up by the following call.
#[derive(Debug)]
pub struct FrameDecoder {
    state: DecodeState,
    max_body_length: Option<usize>,
}

impl FrameDecoder {
    /// Construct a decoder with no declared-length cap.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: DecodeState::AwaitingHeader,
            max_body_length: None,
        }
    }

    /// Construct a decoder rejecting declared body lengths above `max`.
    ///
    /// The check runs against the header alone, before any body bytes are
    /// buffered, so an oversized declaration never grows the receive
    /// buffer.
    #[must_use]
    pub const fn with_max_body_length(max: usize) -> Self {
        Self {
            state: DecodeState::AwaitingHeader,
            max_body_length: Some(max),
        }
    }

    /// Extract the next complete frame from `src`, if one is buffered.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::OversizedFrame`] when a configured cap is
    /// exceeded and [`FramingError::LengthOverflow`] when the declared
    /// frame size overflows this host's address space.
    pub fn next_frame(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, CodecError> {
        let frame_len = match self.state {
            DecodeState::AwaitingHeader => {
                let Some(frame_len) = self.read_header(src)? else {
                    return Ok(None);
                };
                self.state = DecodeState::AwaitingBody { frame_len };
                frame_len
            }
            DecodeState::AwaitingBody { frame_len } => frame_len,
        };

        if src.len() < frame_len {
            // Pre-size the buffer for the rest of the frame.
            src.reserve(frame_len - src.len());
            return Ok(None);
        }
        let frame = src.split_to(frame_len).freeze();
        self.state = DecodeState::AwaitingHeader;
        Ok(Some(frame))
    }

    fn read_header(&self, src: &[u8]) -> Result<Option<usize>, CodecError> {
        if src.len() < HEADER_SIZE {
            return Ok(None);
        }
        let Some(declared) = peek_body_length(src) else {
            return Ok(None);
        };
        if let Some(max) = self.max_body_length
            && declared > max
        {
            return Err(FramingError::OversizedFrame { size: declared, max }.into());
        }
        match HEADER_SIZE.checked_add(declared) {
            Some(frame_len) => Ok(Some(frame_len)),
            None => Err(FramingError::LengthOverflow { size: declared }.into()),
        }
    }

    /// Classify the buffered remainder at end-of-stream.
    fn classify_eof(&self, src: &[u8]) -> EofError {
        if src.is_empty() {
            return EofError::CleanClose;
        }
        match self.state {
            DecodeState::AwaitingHeader => EofError::MidHeader {
                bytes_received: src.len(),
                header_size: HEADER_SIZE,
            },
            DecodeState::AwaitingBody { frame_len } => EofError::MidFrame {
                bytes_received: src.len().saturating_sub(HEADER_SIZE),
                expected: frame_len - HEADER_SIZE,
            },
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self { Self::new() }
}

impl Decoder for FrameDecoder {
    type Item = Bytes;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.next_frame(src)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.next_frame(src)? {
            return Ok(Some(frame));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let eof = self.classify_eof(src);
        tracing::debug!(buffered = src.len(), %eof, "stream ended inside a frame");
        Err(eof.into())
    }
}

/// Decoder yielding fully decoded messages, for `FramedRead` integration.
///
/// Composes the boundary state machine with [`FrameCodec::decode`], so each
/// item pulled from the stream is a [`DecodedMessage`]. Any codec error
/// terminates the stream.
#[derive(Debug)]
pub struct MessageDecoder {
    frames: FrameDecoder,
    codec: FrameCodec,
}

impl MessageDecoder {
    /// Construct a message decoder over `codec`.
    ///
    /// The codec's body length cap, if any, is enforced by the framing
    /// layer as well.
    #[must_use]
    pub const fn new(codec: FrameCodec) -> Self {
        Self {
            frames: match codec.max_body_length() {
                Some(max) => FrameDecoder::with_max_body_length(max),
                None => FrameDecoder::new(),
            },
            codec,
        }
    }
}

impl Decoder for MessageDecoder {
    type Item = DecodedMessage;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.frames.decode(src)? {
            Some(frame) => self.codec.decode(&frame).map(Some),
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.frames.decode_eof(src)? {
            Some(frame) => self.codec.decode(&frame).map(Some),
            None => Ok(None),
        }
    }
}

/// Per-connection pipeline filter converting a chunked byte stream into
/// decoded messages.
///
/// `StreamFramer` owns the accumulation buffer, so it suits transports that
/// surface byte chunks through callbacks or synchronous reads rather than
/// `AsyncRead`. Feed each arrival with [`push`](Self::push) (or
/// [`feed`](Self::feed) plus [`next_message`](Self::next_message)) and call
/// [`finish`](Self::finish) once the stream closes.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use bytes::BytesMut;
/// use tagwire::{FrameCodec, StreamFramer, TypeRegistry, TypeTag};
///
/// #[derive(bincode::Encode, bincode::Decode, Debug, PartialEq)]
/// struct Ping {
///     seq: u32,
/// }
///
/// let registry = Arc::new(TypeRegistry::new());
/// let tag = TypeTag::new(1).expect("non-zero tag");
/// registry.register::<Ping>(tag).expect("fresh registration");
/// let codec = FrameCodec::new(registry);
///
/// let mut wire = BytesMut::new();
/// codec
///     .encode(&Ping { seq: 7 }, None, &mut wire)
///     .expect("Ping is registered");
///
/// let mut framer = StreamFramer::new(codec);
/// let mut seen = Vec::new();
/// framer
///     .push(&wire, |message| seen.push(message))
///     .expect("well-formed stream");
/// framer.finish().expect("stream ends at a frame boundary");
///
/// assert_eq!(seen.len(), 1);
/// assert_eq!(seen[0].downcast_ref::<Ping>(), Some(&Ping { seq: 7 }));
/// ```
#[derive(Debug)]
pub struct StreamFramer {
    decoder: FrameDecoder,
    codec: FrameCodec,
    buffer: BytesMut,
}

impl StreamFramer {
    /// Construct a framer over `codec`, inheriting its body length cap.
    #[must_use]
    pub fn new(codec: FrameCodec) -> Self {
        Self {
            decoder: match codec.max_body_length() {
                Some(max) => FrameDecoder::with_max_body_length(max),
                None => FrameDecoder::new(),
            },
            codec,
            buffer: BytesMut::new(),
        }
    }

    /// Append a chunk of bytes received from the transport.
    pub fn feed(&mut self, chunk: &[u8]) { self.buffer.extend_from_slice(chunk); }

    /// Drain the next fully buffered message, if any.
    ///
    /// # Errors
    ///
    /// Propagates framing and codec errors; these are fatal for the
    /// connection and leave the framer in an unspecified state.
    pub fn next_message(&mut self) -> Result<Option<DecodedMessage>, CodecError> {
        match self.decoder.next_frame(&mut self.buffer)? {
            Some(frame) => self.codec.decode(&frame).map(Some),
            None => Ok(None),
        }
    }

    /// Feed `chunk`, then invoke `sink` once per decoded message in
    /// arrival order.
    ///
    /// A single arrival may emit zero, one, or many messages. Returns the
    /// number of messages emitted for this arrival.
    ///
    /// # Errors
    ///
    /// Propagates framing and codec errors; messages emitted before the
    /// failure have already been handed to `sink`.
    pub fn push<S>(&mut self, chunk: &[u8], mut sink: S) -> Result<usize, CodecError>
    where
        S: FnMut(DecodedMessage),
    {
        self.feed(chunk);
        let mut emitted = 0;
        while let Some(message) = self.next_message()? {
            sink(message);
            emitted += 1;
        }
        Ok(emitted)
    }

    /// Signal end-of-stream after draining buffered messages.
    ///
    /// # Errors
    ///
    /// Returns [`EofError::MidHeader`] or [`EofError::MidFrame`] when the
    /// stream ended inside a frame.
    pub fn finish(&self) -> Result<(), CodecError> {
        match self.decoder.classify_eof(&self.buffer) {
            EofError::CleanClose => Ok(()),
            premature => Err(premature.into()),
        }
    }

    /// Bytes buffered but not yet emitted as part of a frame.
    #[must_use]
    pub fn buffered(&self) -> usize { self.buffer.len() }
}
