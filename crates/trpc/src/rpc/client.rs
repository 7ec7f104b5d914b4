// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RPC Client (Requester) implementation.

use crate::config::{ClientConfig, INITIAL_SEQID, SUCCESS_FIELD};
use crate::exception::{ApplicationException, ExceptionType};
use crate::payload::{Payload, PayloadError};
use crate::protocol::{MessageHeader, Protocol, SplitProtocol};
use crate::rpc::error::{RpcError, RpcResult};
use crate::rpc::service::{MethodDescriptor, ServiceDescriptor};
use crate::types::{MessageType, Value};
use std::sync::Arc;

/// RPC client for one service.
///
/// Calls are synchronous: each call writes one request and, unless the
/// method is oneway, blocks for the matching reply.
///
/// # Example
///
/// ```rust,no_run
/// use trpc::payload::StructRegistry;
/// use trpc::protocol::MemoryProtocol;
/// use trpc::rpc::{Client, MethodDef, ServiceDescriptor};
/// use trpc::types::TypeShape;
///
/// let registry = StructRegistry::new();
/// let service = ServiceDescriptor::builder("calc", "Calculator")
///     .method(
///         MethodDef::new("add")
///             .arg(1, "a", TypeShape::I32)
///             .arg(2, "b", TypeShape::I32)
///             .returns(TypeShape::I32),
///     )
///     .build(&registry)
///     .unwrap();
///
/// let (client_end, _server_end) = MemoryProtocol::pair();
/// let mut client = Client::new(service, client_end);
/// let sum = client.call("add", vec![1i32.into(), 2i32.into()]).unwrap();
/// ```
pub struct Client<P: Protocol> {
    service: Arc<ServiceDescriptor>,
    prot: P,
    config: ClientConfig,
    seqid: i32,
    last_reply: Option<MessageHeader>,
}

impl<P: Protocol> Client<P> {
    pub fn new(service: Arc<ServiceDescriptor>, prot: P) -> Self {
        Self::with_config(service, prot, ClientConfig::default())
    }

    pub fn with_config(service: Arc<ServiceDescriptor>, prot: P, config: ClientConfig) -> Self {
        Self {
            service,
            prot,
            config,
            seqid: INITIAL_SEQID,
            last_reply: None,
        }
    }

    pub fn service(&self) -> &Arc<ServiceDescriptor> {
        &self.service
    }

    /// Callable method names.
    pub fn methods(&self) -> Vec<&str> {
        self.service.method_names()
    }

    /// Sequence id the next call will use.
    pub fn next_seqid(&self) -> i32 {
        self.seqid
    }

    /// Header of the last reply received.
    pub fn last_reply(&self) -> Option<&MessageHeader> {
        self.last_reply.as_ref()
    }

    /// Call `method` with positional arguments in ascending field-id order.
    ///
    /// Returns `Ok(None)` for oneway and void methods.
    pub fn call(&mut self, method: &str, args: Vec<Value>) -> RpcResult<Option<Value>> {
        self.call_with(method, args, Vec::<(String, Value)>::new())
    }

    /// Call `method` with positional then keyword arguments.
    ///
    /// A keyword naming a field also given positionally overrides it.
    ///
    /// # Errors
    /// * [`RpcError::UnknownMethod`] before anything is written
    /// * [`RpcError::Declared`] when the reply carries a declared exception
    /// * [`RpcError::Application`] for EXCEPTION replies and `MISSING_RESULT`
    pub fn call_with<K: Into<String>>(
        &mut self,
        method: &str,
        args: Vec<Value>,
        kwargs: Vec<(K, Value)>,
    ) -> RpcResult<Option<Value>> {
        let service = self.service.clone();
        let desc = service
            .method(method)
            .ok_or_else(|| RpcError::UnknownMethod(method.to_string()))?;

        let request = bind_args(desc, args, kwargs)?;
        let seqid = self.seqid;
        self.send(desc, &request, seqid)?;
        self.seqid = self.seqid.wrapping_add(1);

        if desc.is_oneway() {
            return Ok(None);
        }
        self.recv(desc, seqid)
    }

    fn send(&mut self, desc: &MethodDescriptor, request: &Payload, seqid: i32) -> RpcResult<()> {
        log::debug!("[rpc] call {}.{} seq={}", self.service.name(), desc.name(), seqid);
        self.prot
            .write_message_begin(desc.name(), MessageType::Call, seqid)?;
        self.prot.write_struct(request)?;
        self.prot.write_message_end()?;
        self.prot.flush()?;
        Ok(())
    }

    fn recv(&mut self, desc: &MethodDescriptor, seqid: i32) -> RpcResult<Option<Value>> {
        let header = self.prot.read_message_begin()?;

        if header.kind == MessageType::Exception {
            let exception = ApplicationException::read(&mut self.prot)?;
            self.prot.read_message_end()?;
            self.check_reply(&header, desc, seqid)?;
            self.last_reply = Some(header);
            log::debug!("[rpc] {} failed remotely: {}", desc.name(), exception);
            return Err(RpcError::Application(exception));
        }

        let mut result = desc.result().new_instance();
        self.prot.read_struct(&mut result)?;
        self.prot.read_message_end()?;
        self.check_reply(&header, desc, seqid)?;
        self.last_reply = Some(header);

        unpack_result(desc, result)
    }

    fn check_reply(
        &self,
        header: &MessageHeader,
        desc: &MethodDescriptor,
        seqid: i32,
    ) -> RpcResult<()> {
        if !self.config.strict_replies {
            return Ok(());
        }
        if header.name != desc.name() {
            return Err(RpcError::application_with_message(
                ExceptionType::WrongMethodName,
                format!("expected reply to '{}', got '{}'", desc.name(), header.name),
            ));
        }
        if header.seqid != seqid {
            return Err(RpcError::application_with_message(
                ExceptionType::BadSequenceId,
                format!("expected seqid {}, got {}", seqid, header.seqid),
            ));
        }
        Ok(())
    }

    /// Close the underlying protocol.
    pub fn close(&mut self) -> RpcResult<()> {
        self.prot.close()?;
        Ok(())
    }

    pub fn into_inner(self) -> P {
        self.prot
    }
}

impl<I: Protocol, O: Protocol> Client<SplitProtocol<I, O>> {
    /// Client reading replies from `input` and writing calls to `output`.
    pub fn with_streams(service: Arc<ServiceDescriptor>, input: I, output: O) -> Self {
        Self::new(service, SplitProtocol::new(input, output))
    }
}

fn bind_args<K: Into<String>>(
    desc: &MethodDescriptor,
    args: Vec<Value>,
    kwargs: Vec<(K, Value)>,
) -> RpcResult<Payload> {
    let ty = desc.args();
    if args.len() > ty.spec().len() {
        return Err(RpcError::Payload(PayloadError::TooManyArguments {
            type_name: ty.name().to_string(),
            given: args.len(),
            max: ty.spec().len(),
        }));
    }

    let mut request = ty.new_instance();
    for (name, value) in ty.spec().names().zip(args) {
        request.set(name, value)?;
    }
    for (name, value) in kwargs {
        request.set(&name.into(), value)?;
    }
    Ok(request)
}

/// Success value, else the first set declared exception, else
/// `MISSING_RESULT` for methods that return a value.
fn unpack_result(desc: &MethodDescriptor, mut result: Payload) -> RpcResult<Option<Value>> {
    if desc.returns_value() {
        let success = result.take(SUCCESS_FIELD)?;
        if success.is_set() {
            return Ok(Some(success));
        }
    }

    for field in desc.result().spec().iter() {
        if field.name == SUCCESS_FIELD {
            continue;
        }
        match result.take(&field.name)? {
            Value::Null => {}
            Value::Struct(exception) => return Err(RpcError::Declared(*exception)),
            other => {
                return Err(RpcError::application_with_message(
                    ExceptionType::ProtocolError,
                    format!("field '{}' of result holds a non-struct value {}", field.name, other),
                ))
            }
        }
    }

    if desc.returns_value() {
        return Err(RpcError::Application(ApplicationException::new(
            ExceptionType::MissingResult,
        )));
    }
    Ok(None)
}
