// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Routing of prefixed requests to per-service processors.

use crate::config::MULTIPLEX_SEPARATOR;
use crate::exception::{ApplicationException, ExceptionType};
use crate::protocol::Protocol;
use crate::rpc::error::{RpcError, RpcResult};
use crate::rpc::processor::{reject_unknown_method, Process, Processor};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

/// Serves several services on one connection.
///
/// Requests must be named `"{service}{separator}{method}"`, as written by
/// [`MultiplexedProtocol`](crate::protocol::MultiplexedProtocol). Replies
/// carry the bare method name.
pub struct MultiplexedProcessor {
    processors: RwLock<HashMap<String, Processor>>,
    separator: char,
}

impl MultiplexedProcessor {
    pub fn new() -> Self {
        Self::with_separator(MULTIPLEX_SEPARATOR)
    }

    pub fn with_separator(separator: char) -> Self {
        Self {
            processors: RwLock::new(HashMap::new()),
            separator,
        }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// Register `processor` under `service_name`.
    ///
    /// # Errors
    /// `INTERNAL_ERROR` application exception if the name is taken.
    pub fn register_processor(
        &self,
        service_name: impl Into<String>,
        processor: Processor,
    ) -> RpcResult<()> {
        let service_name = service_name.into();
        let mut processors = self.processors.write();
        if processors.contains_key(&service_name) {
            return Err(RpcError::Application(ApplicationException::with_message(
                ExceptionType::InternalError,
                format!("processor for `{}` already registered", service_name),
            )));
        }
        log::info!("[rpc] multiplexer registered service '{}'", service_name);
        processors.insert(service_name, processor);
        Ok(())
    }

    /// Registered service names, sorted.
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.processors.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_registered(&self, service_name: &str) -> bool {
        self.processors.read().contains_key(service_name)
    }
}

impl Default for MultiplexedProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Process for MultiplexedProcessor {
    fn process(&self, prot: &mut dyn Protocol) -> RpcResult<()> {
        let header = prot.read_message_begin()?;
        if !header.kind.is_request() {
            return Err(RpcError::BadRequest(format!(
                "multiplexed processor only accepts CALL and ONEWAY messages, got {:?}",
                header.kind
            )));
        }

        let Some((service, method)) = header.name.split_once(self.separator) else {
            return Err(RpcError::BadRequest(format!(
                "service name not found in message '{}'; use a multiplexed protocol on the client",
                header.name
            )));
        };

        // Clone out so the table is not locked while the handler runs.
        let processor = self.processors.read().get(service).cloned();
        match processor {
            Some(processor) => processor.dispatch(method, header.seqid, prot),
            None => {
                log::warn!("[rpc] multiplexer: no processor for service '{}'", service);
                reject_unknown_method(prot, method, header.seqid)
            }
        }
    }
}

impl fmt::Debug for MultiplexedProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiplexedProcessor")
            .field("services", &self.service_names())
            .field("separator", &self.separator)
            .finish()
    }
}
