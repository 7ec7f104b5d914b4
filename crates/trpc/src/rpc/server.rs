// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Blocking serve loop over one connection.

use crate::config::{ServerConfig, UnhandledPolicy};
use crate::exception::{ApplicationException, ExceptionType};
use crate::protocol::Protocol;
use crate::rpc::error::{RpcError, RpcResult};
use crate::rpc::processor::{send_exception, Process};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Serves requests from a protocol until the peer closes or shutdown is
/// requested.
///
/// # Example
///
/// ```rust,no_run
/// use trpc::payload::StructRegistry;
/// use trpc::protocol::MemoryProtocol;
/// use trpc::rpc::{HandlerError, MethodDef, Processor, Server, ServiceDescriptor};
/// use trpc::types::{TypeShape, Value};
///
/// let registry = StructRegistry::new();
/// let service = ServiceDescriptor::builder("echo", "Echo")
///     .method(MethodDef::new("echo").arg(1, "text", TypeShape::STRING).returns(TypeShape::STRING))
///     .build(&registry)
///     .unwrap();
///
/// let handler = |_method: &str, mut args: Vec<Value>| Ok::<_, HandlerError>(args.remove(0));
/// let server = Server::new(Processor::new(service, handler));
///
/// let (mut server_end, _client_end) = MemoryProtocol::pair();
/// server.serve(&mut server_end).unwrap();
/// ```
pub struct Server {
    processor: Arc<dyn Process>,
    config: ServerConfig,
    shutdown: Arc<AtomicBool>,
    requests_processed: AtomicU64,
}

impl Server {
    pub fn new<P: Process + 'static>(processor: P) -> Self {
        Self::from_shared(Arc::new(processor))
    }

    pub fn from_shared(processor: Arc<dyn Process>) -> Self {
        Self {
            processor,
            config: ServerConfig::default(),
            shutdown: Arc::new(AtomicBool::new(false)),
            requests_processed: AtomicU64::new(0),
        }
    }

    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve until the connection closes.
    ///
    /// Returns the number of requests handled on this connection. Shutdown
    /// is checked between requests; a read already blocked is not
    /// interrupted.
    pub fn serve(&self, prot: &mut dyn Protocol) -> RpcResult<u64> {
        let mut served = 0u64;
        while !self.shutdown.load(Ordering::Relaxed) {
            match self.processor.process(prot) {
                Ok(()) => {}
                Err(e) if e.is_closed() => {
                    log::debug!("[rpc] connection closed after {} requests", served);
                    break;
                }
                Err(RpcError::Unhandled {
                    method,
                    seqid,
                    oneway,
                    source,
                }) => match self.config.on_unhandled {
                    UnhandledPolicy::Stop => {
                        log::error!("[rpc] {}: unhandled error, stopping: {}", method, source);
                        return Err(RpcError::Unhandled {
                            method,
                            seqid,
                            oneway,
                            source,
                        });
                    }
                    UnhandledPolicy::Continue => {
                        log::error!("[rpc] {}: unhandled error, no reply sent: {}", method, source);
                    }
                    UnhandledPolicy::Reply => {
                        log::error!("[rpc] {}: unhandled error: {}", method, source);
                        if !oneway {
                            let exception = ApplicationException::with_message(
                                ExceptionType::InternalError,
                                source.to_string(),
                            );
                            send_exception(prot, &method, &exception, seqid)?;
                        }
                    }
                },
                Err(e) => {
                    log::error!("[rpc] serve loop failed: {}", e);
                    return Err(e);
                }
            }
            served += 1;
            self.requests_processed.fetch_add(1, Ordering::Relaxed);
        }
        Ok(served)
    }

    /// Request the serve loop to stop after the current request.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Shared stop flag, for stopping a server moved into its own thread.
    ///
    /// Storing `true` has the same effect as [`Server::shutdown`].
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::Relaxed)
    }

    /// Total requests handled across all connections.
    pub fn requests_processed(&self) -> u64 {
        self.requests_processed.load(Ordering::Relaxed)
    }
}
