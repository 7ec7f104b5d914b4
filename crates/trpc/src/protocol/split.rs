// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Protocol reading from one stream and writing to another.

use super::{MessageHeader, Protocol, ProtocolResult, Transport};
use crate::payload::Payload;
use crate::types::{MessageType, TType};

/// Reads go to `input`, writes and flushes go to `output`.
#[derive(Debug)]
pub struct SplitProtocol<I, O> {
    input: I,
    output: O,
}

impl<I: Protocol, O: Protocol> SplitProtocol<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }

    pub fn input(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn output(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn into_parts(self) -> (I, O) {
        (self.input, self.output)
    }
}

impl<I: Protocol, O: Protocol> Transport for SplitProtocol<I, O> {
    fn flush(&mut self) -> ProtocolResult<()> {
        self.output.flush()
    }

    /// Closes both streams, reporting the first failure.
    fn close(&mut self) -> ProtocolResult<()> {
        let input = self.input.close();
        let output = self.output.close();
        input.and(output)
    }
}

impl<I: Protocol, O: Protocol> Protocol for SplitProtocol<I, O> {
    fn write_message_begin(
        &mut self,
        name: &str,
        kind: MessageType,
        seqid: i32,
    ) -> ProtocolResult<()> {
        self.output.write_message_begin(name, kind, seqid)
    }

    fn write_message_end(&mut self) -> ProtocolResult<()> {
        self.output.write_message_end()
    }

    fn read_message_begin(&mut self) -> ProtocolResult<MessageHeader> {
        self.input.read_message_begin()
    }

    fn read_message_end(&mut self) -> ProtocolResult<()> {
        self.input.read_message_end()
    }

    fn write_struct(&mut self, value: &Payload) -> ProtocolResult<()> {
        self.output.write_struct(value)
    }

    fn read_struct(&mut self, value: &mut Payload) -> ProtocolResult<()> {
        self.input.read_struct(value)
    }

    fn skip(&mut self, ttype: TType) -> ProtocolResult<()> {
        self.input.skip(ttype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{MemoryProtocol, ProtocolError};

    #[test]
    fn routes_reads_and_writes() {
        let (in_local, mut in_peer) = MemoryProtocol::pair();
        let (out_local, mut out_peer) = MemoryProtocol::pair();
        let mut split = SplitProtocol::new(in_local, out_local);

        in_peer.write_message_begin("ping", MessageType::Call, 3).unwrap();
        in_peer.write_message_end().unwrap();
        in_peer.flush().unwrap();

        let header = split.read_message_begin().unwrap();
        assert_eq!(header, MessageHeader::new("ping", MessageType::Call, 3));
        split.read_message_end().unwrap();

        split.write_message_begin("ping", MessageType::Reply, 3).unwrap();
        split.write_message_end().unwrap();
        split.flush().unwrap();

        let reply = out_peer.read_message_begin().unwrap();
        assert_eq!(reply.kind, MessageType::Reply);
        assert!(in_peer.is_idle());
    }

    #[test]
    fn close_closes_both_streams() {
        let (in_local, mut in_peer) = MemoryProtocol::pair();
        let (out_local, mut out_peer) = MemoryProtocol::pair();
        let mut split = SplitProtocol::new(in_local, out_local);
        split.close().unwrap();

        assert!(matches!(in_peer.read_message_begin(), Err(ProtocolError::Closed)));
        assert!(matches!(out_peer.read_message_begin(), Err(ProtocolError::Closed)));
    }
}
