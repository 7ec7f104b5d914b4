// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RPC: Request/Reply over a message protocol
//!
//! # Overview
//!
//! - **Clients** bind arguments into an args struct, send a CALL and unpack
//!   the result struct of the reply
//! - **Processors** read a request, invoke a handler and write the reply
//! - **Multiplexed processors** route `"Service:method"` requests to one
//!   processor per service
//!
//! # Message Flow
//!
//! For a method `add` of service `Calculator`:
//! - Request: `("add", CALL, seqid)` + `Calculator.add_args`
//! - Reply: `("add", REPLY, seqid)` + `Calculator.add_result`
//! - Runtime failure: `("add", EXCEPTION, seqid)` + `TApplicationException`
//!
//! # Exceptions
//!
//! Business exceptions declared by a method travel inside the result
//! struct and reach the caller as [`RpcError::Declared`]. Runtime failures
//! travel as EXCEPTION messages and reach the caller as
//! [`RpcError::Application`].

mod client;
mod error;
mod multiplex;
mod processor;
mod server;
mod service;

pub use client::Client;
pub use error::{RpcError, RpcResult};
pub use multiplex::MultiplexedProcessor;
pub use processor::{Handler, HandlerError, MethodTable, Process, Processor, ProcessorFactory};
pub use server::Server;
pub use service::{MethodDef, MethodDescriptor, ServiceBuilder, ServiceDescriptor};
