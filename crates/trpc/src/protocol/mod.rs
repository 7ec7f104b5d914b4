// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Protocol abstraction consumed by clients and processors.
//!
//! Codecs are out of scope for this crate; they plug in by implementing
//! [`Protocol`]. [`memory::MemoryProtocol`] is an in-process pair used by
//! tests and embedded setups.

pub mod memory;
mod multiplexed;
mod split;

pub use memory::MemoryProtocol;
pub use multiplexed::MultiplexedProtocol;
pub use split::SplitProtocol;

use crate::payload::{DecodeError, Payload, PayloadError};
use crate::types::{MessageType, TType};
use std::fmt;

/// Protocol errors.
#[derive(Debug)]
pub enum ProtocolError {
    /// The peer or this end closed the connection.
    Closed,
    /// No message arrived within the read timeout.
    TimedOut,
    /// Framing did not match what the reader expected.
    InvalidData(String),
    /// A field value did not match its declared shape.
    Decode(DecodeError),
    /// A decoded value could not be stored.
    Payload(PayloadError),
    /// I/O error from a byte transport under an external codec.
    Io(std::io::Error),
}

impl ProtocolError {
    /// True if the connection is gone, including I/O errors that mean the
    /// peer went away.
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Closed => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
            ),
            _ => false,
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "connection closed"),
            Self::TimedOut => write!(f, "read timed out"),
            Self::InvalidData(msg) => write!(f, "invalid data: {}", msg),
            Self::Decode(e) => write!(f, "{}", e),
            Self::Payload(e) => write!(f, "{}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            Self::Payload(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for ProtocolError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<PayloadError> for ProtocolError {
    fn from(e: PayloadError) -> Self {
        Self::Payload(e)
    }
}

impl From<std::io::Error> for ProtocolError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Message header: `(name, kind, seqid)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub name: String,
    pub kind: MessageType,
    pub seqid: i32,
}

impl MessageHeader {
    pub fn new(name: impl Into<String>, kind: MessageType, seqid: i32) -> Self {
        Self {
            name: name.into(),
            kind,
            seqid,
        }
    }
}

/// Byte-stream side of a protocol.
pub trait Transport {
    /// Push buffered output to the peer.
    fn flush(&mut self) -> ProtocolResult<()>;

    /// Close the connection; later reads and writes fail with `Closed`.
    fn close(&mut self) -> ProtocolResult<()>;
}

/// Message framing and struct codec.
///
/// `read_struct` fills a pre-instantiated payload, using its type's spec to
/// interpret incoming fields. Unknown field ids are skipped.
pub trait Protocol: Transport {
    fn write_message_begin(&mut self, name: &str, kind: MessageType, seqid: i32)
        -> ProtocolResult<()>;

    fn write_message_end(&mut self) -> ProtocolResult<()>;

    fn read_message_begin(&mut self) -> ProtocolResult<MessageHeader>;

    fn read_message_end(&mut self) -> ProtocolResult<()>;

    fn write_struct(&mut self, value: &Payload) -> ProtocolResult<()>;

    fn read_struct(&mut self, value: &mut Payload) -> ProtocolResult<()>;

    /// Discard the next value of type `ttype`.
    fn skip(&mut self, ttype: TType) -> ProtocolResult<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn flush(&mut self) -> ProtocolResult<()> {
        (**self).flush()
    }

    fn close(&mut self) -> ProtocolResult<()> {
        (**self).close()
    }
}

impl<P: Protocol + ?Sized> Protocol for &mut P {
    fn write_message_begin(
        &mut self,
        name: &str,
        kind: MessageType,
        seqid: i32,
    ) -> ProtocolResult<()> {
        (**self).write_message_begin(name, kind, seqid)
    }

    fn write_message_end(&mut self) -> ProtocolResult<()> {
        (**self).write_message_end()
    }

    fn read_message_begin(&mut self) -> ProtocolResult<MessageHeader> {
        (**self).read_message_begin()
    }

    fn read_message_end(&mut self) -> ProtocolResult<()> {
        (**self).read_message_end()
    }

    fn write_struct(&mut self, value: &Payload) -> ProtocolResult<()> {
        (**self).write_struct(value)
    }

    fn read_struct(&mut self, value: &mut Payload) -> ProtocolResult<()> {
        (**self).read_struct(value)
    }

    fn skip(&mut self, ttype: TType) -> ProtocolResult<()> {
        (**self).skip(ttype)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn flush(&mut self) -> ProtocolResult<()> {
        (**self).flush()
    }

    fn close(&mut self) -> ProtocolResult<()> {
        (**self).close()
    }
}

impl<P: Protocol + ?Sized> Protocol for Box<P> {
    fn write_message_begin(
        &mut self,
        name: &str,
        kind: MessageType,
        seqid: i32,
    ) -> ProtocolResult<()> {
        (**self).write_message_begin(name, kind, seqid)
    }

    fn write_message_end(&mut self) -> ProtocolResult<()> {
        (**self).write_message_end()
    }

    fn read_message_begin(&mut self) -> ProtocolResult<MessageHeader> {
        (**self).read_message_begin()
    }

    fn read_message_end(&mut self) -> ProtocolResult<()> {
        (**self).read_message_end()
    }

    fn write_struct(&mut self, value: &Payload) -> ProtocolResult<()> {
        (**self).write_struct(value)
    }

    fn read_struct(&mut self, value: &mut Payload) -> ProtocolResult<()> {
        (**self).read_struct(value)
    }

    fn skip(&mut self, ttype: TType) -> ProtocolResult<()> {
        (**self).skip(ttype)
    }
}
