// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Server-side request processing.
//!
//! A [`Processor`] reads one request, binds its arguments, invokes the
//! handler and writes the reply. Declared exceptions become populated result
//! fields; anything else surfaces as [`RpcError::Unhandled`] with no reply.

use crate::config::SUCCESS_FIELD;
use crate::exception::{ApplicationException, ExceptionType};
use crate::payload::Payload;
use crate::protocol::{Protocol, SplitProtocol};
use crate::rpc::error::{RpcError, RpcResult};
use crate::rpc::service::{MethodDescriptor, ServiceDescriptor};
use crate::types::{MessageType, TType, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Failure reported by a handler.
#[derive(Debug)]
pub enum HandlerError {
    /// A business exception payload. Becomes a result field when the
    /// method declares its type.
    Raised(Payload),
    /// Any other failure.
    Failed(Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    pub fn raised(exception: Payload) -> Self {
        Self::Raised(exception)
    }

    pub fn failed(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Failed(error.into())
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raised(p) => write!(f, "raised {}", p),
            Self::Failed(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Raised(_) => None,
            Self::Failed(e) => Some(e.as_ref()),
        }
    }
}

impl From<Payload> for HandlerError {
    fn from(exception: Payload) -> Self {
        Self::Raised(exception)
    }
}

/// Handler trait for service methods.
///
/// Arguments arrive in ascending field-id order of the method's args type.
/// Void methods return `Value::Null`.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, method: &str, args: Vec<Value>) -> Result<Value, HandlerError>;
}

/// A function-based handler.
impl<F> Handler for F
where
    F: Fn(&str, Vec<Value>) -> Result<Value, HandlerError> + Send + Sync + 'static,
{
    fn handle(&self, method: &str, args: Vec<Value>) -> Result<Value, HandlerError> {
        self(method, args)
    }
}

type MethodFn = Box<dyn Fn(Vec<Value>) -> Result<Value, HandlerError> + Send + Sync>;

/// Handler built from one closure per method.
#[derive(Default)]
pub struct MethodTable {
    methods: HashMap<String, MethodFn>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(mut self, method: impl Into<String>, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.methods.insert(method.into(), Box::new(f));
        self
    }

    pub fn contains(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }
}

impl Handler for MethodTable {
    fn handle(&self, method: &str, args: Vec<Value>) -> Result<Value, HandlerError> {
        match self.methods.get(method) {
            Some(f) => f(args),
            None => Err(HandlerError::failed(format!(
                "handler does not implement '{}'",
                method
            ))),
        }
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.methods.keys().collect();
        names.sort();
        f.debug_struct("MethodTable").field("methods", &names).finish()
    }
}

/// Something that can serve one request from a protocol.
pub trait Process: Send + Sync {
    fn process(&self, prot: &mut dyn Protocol) -> RpcResult<()>;
}

/// Dispatches requests for one service to a handler.
#[derive(Clone)]
pub struct Processor {
    service: Arc<ServiceDescriptor>,
    handler: Arc<dyn Handler>,
}

impl Processor {
    pub fn new<H: Handler>(service: Arc<ServiceDescriptor>, handler: H) -> Self {
        Self::from_shared(service, Arc::new(handler))
    }

    pub fn from_shared(service: Arc<ServiceDescriptor>, handler: Arc<dyn Handler>) -> Self {
        Self { service, handler }
    }

    pub fn service(&self) -> &Arc<ServiceDescriptor> {
        &self.service
    }

    /// Process one request read from `iprot`, replying on `oprot`.
    pub fn process_split(
        &self,
        iprot: &mut dyn Protocol,
        oprot: &mut dyn Protocol,
    ) -> RpcResult<()> {
        let mut prot = SplitProtocol::new(iprot, oprot);
        self.process(&mut prot)
    }

    /// Serve a request whose message header has already been read.
    pub(crate) fn dispatch(
        &self,
        method: &str,
        seqid: i32,
        prot: &mut dyn Protocol,
    ) -> RpcResult<()> {
        let Some(desc) = self.service.method(method) else {
            log::warn!(
                "[rpc] {}: unknown method '{}' (seq={})",
                self.service.name(),
                method,
                seqid
            );
            return reject_unknown_method(prot, method, seqid);
        };

        let mut args = desc.args().new_instance();
        prot.read_struct(&mut args)?;
        prot.read_message_end()?;

        let values = desc
            .args()
            .spec()
            .iter()
            .map(|field| args.take(&field.name))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "[rpc] {}.{} seq={} ({} args)",
            self.service.name(),
            method,
            seqid,
            values.len()
        );

        let mut result = desc.result().new_instance();
        match self.handler.handle(method, values) {
            Ok(value) => {
                if desc.returns_value() {
                    result.set(SUCCESS_FIELD, value)?;
                }
            }
            Err(err) => store_declared(desc, err, &mut result, seqid)?,
        }

        if desc.is_oneway() {
            return Ok(());
        }
        send_result(prot, method, &result, seqid)
    }
}

impl Process for Processor {
    fn process(&self, prot: &mut dyn Protocol) -> RpcResult<()> {
        let header = prot.read_message_begin()?;
        self.dispatch(&header.name, header.seqid, prot)
    }
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Processor")
            .field("service", &self.service.name())
            .finish()
    }
}

/// Store a raised exception in the first declared result field (ascending
/// id) whose type matches it.
fn store_declared(
    desc: &MethodDescriptor,
    err: HandlerError,
    result: &mut Payload,
    seqid: i32,
) -> RpcResult<()> {
    let slot = match &err {
        HandlerError::Raised(exception) => desc
            .result()
            .spec()
            .iter()
            .filter(|field| field.name != SUCCESS_FIELD)
            .find(|field| {
                field
                    .shape
                    .struct_type()
                    .is_some_and(|ty| exception.is_instance_of(ty))
            })
            .map(|field| field.name.clone()),
        HandlerError::Failed(_) => None,
    };

    match (slot, err) {
        (Some(name), HandlerError::Raised(exception)) => {
            log::debug!("[rpc] {} raised declared {}", desc.name(), exception.type_name());
            result.set(&name, exception)?;
            Ok(())
        }
        (_, err) => {
            log::warn!("[rpc] {}: unhandled handler error: {}", desc.name(), err);
            Err(RpcError::Unhandled {
                method: desc.name().to_string(),
                seqid,
                oneway: desc.is_oneway(),
                source: err,
            })
        }
    }
}

/// Consume the args struct of an unknown method and reply `UNKNOWN_METHOD`.
pub(crate) fn reject_unknown_method(
    prot: &mut dyn Protocol,
    method: &str,
    seqid: i32,
) -> RpcResult<()> {
    prot.skip(TType::Struct)?;
    prot.read_message_end()?;
    send_exception(
        prot,
        method,
        &ApplicationException::new(ExceptionType::UnknownMethod),
        seqid,
    )
}

pub(crate) fn send_exception(
    prot: &mut dyn Protocol,
    method: &str,
    exception: &ApplicationException,
    seqid: i32,
) -> RpcResult<()> {
    prot.write_message_begin(method, MessageType::Exception, seqid)?;
    exception.write(prot)?;
    prot.write_message_end()?;
    prot.flush()?;
    Ok(())
}

fn send_result(prot: &mut dyn Protocol, method: &str, result: &Payload, seqid: i32) -> RpcResult<()> {
    prot.write_message_begin(method, MessageType::Reply, seqid)?;
    prot.write_struct(result)?;
    prot.write_message_end()?;
    prot.flush()?;
    Ok(())
}

/// Creates processors that share one handler.
#[derive(Clone)]
pub struct ProcessorFactory {
    service: Arc<ServiceDescriptor>,
    handler: Arc<dyn Handler>,
}

impl ProcessorFactory {
    pub fn new<H: Handler>(service: Arc<ServiceDescriptor>, handler: H) -> Self {
        Self {
            service,
            handler: Arc::new(handler),
        }
    }

    pub fn get_processor(&self) -> Processor {
        Processor::from_shared(self.service.clone(), self.handler.clone())
    }
}

impl fmt::Debug for ProcessorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorFactory")
            .field("service", &self.service.name())
            .finish()
    }
}
