// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Client-side protocol wrapper for multiplexed servers.

use super::{MessageHeader, Protocol, ProtocolResult, Transport};
use crate::config::MULTIPLEX_SEPARATOR;
use crate::payload::Payload;
use crate::types::{MessageType, TType};

/// Prefixes request message names with `"{service}{separator}"`.
///
/// Replies and exceptions pass through unchanged.
#[derive(Debug)]
pub struct MultiplexedProtocol<P> {
    inner: P,
    service: String,
    separator: char,
}

impl<P: Protocol> MultiplexedProtocol<P> {
    pub fn new(inner: P, service: impl Into<String>) -> Self {
        Self::with_separator(inner, service, MULTIPLEX_SEPARATOR)
    }

    pub fn with_separator(inner: P, service: impl Into<String>, separator: char) -> Self {
        Self {
            inner,
            service: service.into(),
            separator,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: Protocol> Transport for MultiplexedProtocol<P> {
    fn flush(&mut self) -> ProtocolResult<()> {
        self.inner.flush()
    }

    fn close(&mut self) -> ProtocolResult<()> {
        self.inner.close()
    }
}

impl<P: Protocol> Protocol for MultiplexedProtocol<P> {
    fn write_message_begin(
        &mut self,
        name: &str,
        kind: MessageType,
        seqid: i32,
    ) -> ProtocolResult<()> {
        if kind.is_request() {
            let prefixed = format!("{}{}{}", self.service, self.separator, name);
            self.inner.write_message_begin(&prefixed, kind, seqid)
        } else {
            self.inner.write_message_begin(name, kind, seqid)
        }
    }

    fn write_message_end(&mut self) -> ProtocolResult<()> {
        self.inner.write_message_end()
    }

    fn read_message_begin(&mut self) -> ProtocolResult<MessageHeader> {
        self.inner.read_message_begin()
    }

    fn read_message_end(&mut self) -> ProtocolResult<()> {
        self.inner.read_message_end()
    }

    fn write_struct(&mut self, value: &Payload) -> ProtocolResult<()> {
        self.inner.write_struct(value)
    }

    fn read_struct(&mut self, value: &mut Payload) -> ProtocolResult<()> {
        self.inner.read_struct(value)
    }

    fn skip(&mut self, ttype: TType) -> ProtocolResult<()> {
        self.inner.skip(ttype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MemoryProtocol;

    #[test]
    fn prefixes_requests_only() {
        let (local, mut peer) = MemoryProtocol::pair();
        let mut prot = MultiplexedProtocol::new(local, "Calculator");

        prot.write_message_begin("add", MessageType::Call, 1).unwrap();
        prot.write_message_end().unwrap();
        prot.write_message_begin("log", MessageType::Oneway, 2).unwrap();
        prot.write_message_end().unwrap();
        prot.write_message_begin("add", MessageType::Reply, 1).unwrap();
        prot.write_message_end().unwrap();
        prot.flush().unwrap();

        let names: Vec<_> = (0..3)
            .map(|_| {
                let header = peer.read_message_begin().unwrap();
                peer.read_message_end().unwrap();
                header.name
            })
            .collect();
        assert_eq!(names, vec!["Calculator:add", "Calculator:log", "add"]);
    }

    #[test]
    fn custom_separator() {
        let (local, mut peer) = MemoryProtocol::pair();
        let mut prot = MultiplexedProtocol::with_separator(local, "svc", '/');
        prot.write_message_begin("ping", MessageType::Call, 0).unwrap();
        prot.flush().unwrap();
        assert_eq!(peer.read_message_begin().unwrap().name, "svc/ping");
    }
}
