//! Tokio codec for newline-delimited daemon messages

use std::marker::PhantomData;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::error::ProtocolError;
use crate::message::{RegistryRequest, RegistryResponse, DEFAULT_MAX_FRAME_LEN};

/// A message that travels as a single text line
pub trait WireMessage: Sized {
    /// Parse a message from a line (newline already stripped)
    fn from_line(line: &str) -> Result<Self, ProtocolError>;

    /// Render a message as a line (newline not included)
    fn to_line(&self) -> String;
}

impl WireMessage for RegistryRequest {
    fn from_line(line: &str) -> Result<Self, ProtocolError> {
        RegistryRequest::parse(line)
    }

    fn to_line(&self) -> String {
        RegistryRequest::to_line(self)
    }
}

impl WireMessage for RegistryResponse {
    fn from_line(line: &str) -> Result<Self, ProtocolError> {
        RegistryResponse::parse(line)
    }

    fn to_line(&self) -> String {
        RegistryResponse::to_line(self)
    }
}

/// Line codec decoding `D` and encoding `E`
///
/// Frames longer than `max_length` are rejected with
/// [`ProtocolError::FrameTooLong`] instead of being silently truncated.
#[derive(Debug)]
pub struct LineCodec<D, E> {
    lines: LinesCodec,
    max_length: usize,
    _marker: PhantomData<fn(E) -> D>,
}

/// Codec used by the daemon: reads requests, writes responses
pub type ServerCodec = LineCodec<RegistryRequest, RegistryResponse>;

/// Codec used by clients: reads responses, writes requests
pub type ClientCodec = LineCodec<RegistryResponse, RegistryRequest>;

impl<D, E> LineCodec<D, E> {
    /// Create a codec with the default frame limit
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_FRAME_LEN)
    }

    /// Create a codec with a custom frame limit
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_length),
            max_length,
            _marker: PhantomData,
        }
    }

    /// Create a codec that accepts frames of any length
    ///
    /// Used for reading daemon replies, whose size grows with the registry.
    pub fn unbounded() -> Self {
        Self::with_max_length(usize::MAX)
    }

    /// Maximum accepted frame length in bytes
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    fn map_err(&self, err: LinesCodecError) -> ProtocolError {
        match err {
            LinesCodecError::MaxLineLengthExceeded => ProtocolError::FrameTooLong {
                max: self.max_length,
            },
            LinesCodecError::Io(e) => ProtocolError::Io(e),
        }
    }
}

impl<D, E> Default for LineCodec<D, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: WireMessage, E> Decoder for LineCodec<D, E> {
    type Item = D;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.lines.decode(src) {
            Ok(Some(line)) => D::from_line(&line).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(self.map_err(e)),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // A peer may half-close without a trailing newline
        match self.lines.decode_eof(src) {
            Ok(Some(line)) if line.trim().is_empty() => Ok(None),
            Ok(Some(line)) => D::from_line(&line).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(self.map_err(e)),
        }
    }
}

impl<D, E: WireMessage> Encoder<E> for LineCodec<D, E> {
    type Error = ProtocolError;

    fn encode(&mut self, item: E, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let line = item.to_line();
        dst.reserve(line.len() + 1);
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(b"\n");
        Ok(())
    }
}
