// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for RPC operations.

use crate::exception::{ApplicationException, ExceptionType};
use crate::payload::{DecodeError, Payload, PayloadError, RegistryError};
use crate::protocol::ProtocolError;
use crate::rpc::HandlerError;
use std::fmt;

/// Result type for RPC operations
pub type RpcResult<T> = Result<T, RpcError>;

/// Errors that can occur during RPC operations
#[derive(Debug)]
pub enum RpcError {
    /// Transport or codec failure
    Protocol(ProtocolError),

    /// Runtime-level failure, received as an EXCEPTION message or raised locally
    Application(ApplicationException),

    /// Business exception declared by the method, as populated in the reply
    Declared(Payload),

    /// Handler failed with an error the method does not declare.
    ///
    /// No reply has been written for this request.
    Unhandled {
        method: String,
        seqid: i32,
        oneway: bool,
        source: HandlerError,
    },

    /// Method not offered by the service
    UnknownMethod(String),

    /// Message the processor cannot route
    BadRequest(String),

    /// Argument binding or field access failure
    Payload(PayloadError),

    /// Type synthesis failure
    Registry(RegistryError),
}

impl RpcError {
    /// Create an application exception error
    pub fn application(kind: ExceptionType) -> Self {
        Self::Application(ApplicationException::new(kind))
    }

    /// Create an application exception with message
    pub fn application_with_message(kind: ExceptionType, message: impl Into<String>) -> Self {
        Self::Application(ApplicationException::with_message(kind, message))
    }

    /// Application exception kind, if this is one
    pub fn application_kind(&self) -> Option<ExceptionType> {
        match self {
            Self::Application(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// Declared exception payload, if this is one
    pub fn declared(&self) -> Option<&Payload> {
        match self {
            Self::Declared(p) => Some(p),
            _ => None,
        }
    }

    /// True if the connection was closed
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Protocol(e) if e.is_closed())
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(e) => write!(f, "RPC protocol error: {}", e),
            Self::Application(e) => write!(f, "Application exception: {}", e),
            Self::Declared(p) => write!(f, "Declared exception: {}", p),
            Self::Unhandled { method, source, .. } => {
                write!(f, "Unhandled error in '{}': {}", method, source)
            }
            Self::UnknownMethod(name) => write!(f, "Method not found: {}", name),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::Payload(e) => write!(f, "Payload error: {}", e),
            Self::Registry(e) => write!(f, "Registry error: {}", e),
        }
    }
}

impl std::error::Error for RpcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Protocol(e) => Some(e),
            Self::Application(e) => Some(e),
            Self::Unhandled { source, .. } => Some(source),
            Self::Payload(e) => Some(e),
            Self::Registry(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProtocolError> for RpcError {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

impl From<DecodeError> for RpcError {
    fn from(e: DecodeError) -> Self {
        Self::Protocol(ProtocolError::Decode(e))
    }
}

impl From<ApplicationException> for RpcError {
    fn from(e: ApplicationException) -> Self {
        Self::Application(e)
    }
}

impl From<PayloadError> for RpcError {
    fn from(e: PayloadError) -> Self {
        Self::Payload(e)
    }
}

impl From<RegistryError> for RpcError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}
