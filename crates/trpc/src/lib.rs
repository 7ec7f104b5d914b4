// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # trpc - Structural RPC runtime core
//!
//! Runtime support for IDL-described services: structural types synthesized
//! from field tables, and the client/processor machinery that moves their
//! instances over a message protocol.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::thread;
//! use trpc::protocol::MemoryProtocol;
//! use trpc::rpc::{Client, MethodDef, MethodTable, Processor, Server, ServiceDescriptor};
//! use trpc::payload::StructRegistry;
//! use trpc::types::{TypeShape, Value};
//!
//! let registry = StructRegistry::new();
//! let service = ServiceDescriptor::builder("calc", "Calculator")
//!     .method(
//!         MethodDef::new("add")
//!             .arg(1, "a", TypeShape::I32)
//!             .arg(2, "b", TypeShape::I32)
//!             .returns(TypeShape::I32),
//!     )
//!     .build(&registry)
//!     .unwrap();
//!
//! let handler = MethodTable::new().on("add", |args| {
//!     let sum = args[0].as_i32().unwrap_or(0) + args[1].as_i32().unwrap_or(0);
//!     Ok(Value::I32(sum))
//! });
//! let server = Server::new(Processor::new(service.clone(), handler));
//!
//! let (client_end, mut server_end) = MemoryProtocol::pair();
//! let worker = thread::spawn(move || server.serve(&mut server_end));
//!
//! let mut client = Client::new(service, client_end);
//! assert_eq!(client.call("add", vec![1i32.into(), 2i32.into()]).unwrap(), Some(Value::I32(3)));
//! client.close().unwrap();
//! assert_eq!(worker.join().unwrap().unwrap(), 1);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                            RPC Layer                                |
//! |   Client | Processor | MultiplexedProcessor | Server               |
//! +---------------------------------------------------------------------+
//! |                          Protocol Layer                             |
//! |   Protocol trait | SplitProtocol | MultiplexedProtocol | Memory     |
//! +---------------------------------------------------------------------+
//! |                          Payload Layer                              |
//! |   StructRegistry | StructType | Payload | validation | persistence |
//! +---------------------------------------------------------------------+
//! |                           Type Layer                                |
//! |   TType | TypeShape | TypeSpec | DefaultSpec | Value               |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`types`] - Type tags, field tables and dynamic values
//! - [`payload`] - Type synthesis, instances and the type registry
//! - [`exception`] - Runtime-level application exceptions
//! - [`protocol`] - Protocol trait and in-memory implementation
//! - [`rpc`] - Client, processors and serve loop
//! - [`config`] - Constants and configuration structs

pub mod config;
pub mod exception;
pub mod payload;
pub mod protocol;
pub mod rpc;
pub mod types;

pub use exception::{ApplicationException, ExceptionType};
pub use payload::{Payload, StructRegistry, StructType, TypeDef};
pub use rpc::{Client, Processor, RpcError, RpcResult};
pub use types::{MessageType, TType, Value};
