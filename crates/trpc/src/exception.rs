// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime-level application exceptions.
//!
//! Sent as the body of EXCEPTION messages when a failure belongs to the RPC
//! machinery rather than to the called method. On the wire the exception is
//! a struct with `1: message (STRING)` and `2: type (I32)`.

use crate::config::RUNTIME_NAMESPACE;
use crate::payload::{self, Payload, RegistryError, StructType};
use crate::protocol::Protocol;
use crate::rpc::RpcResult;
use crate::types::{TypeDefBuilder, TypeShape};
use std::fmt;
use std::sync::Arc;

/// Registered name of the exception struct.
pub const TYPE_NAME: &str = "TApplicationException";

/// Application exception codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum ExceptionType {
    #[default]
    Unknown = 0,
    UnknownMethod = 1,
    InvalidMessageType = 2,
    WrongMethodName = 3,
    BadSequenceId = 4,
    MissingResult = 5,
    InternalError = 6,
    ProtocolError = 7,
}

impl ExceptionType {
    /// Convert from i32; unrecognized codes map to `Unknown`.
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => Self::UnknownMethod,
            2 => Self::InvalidMessageType,
            3 => Self::WrongMethodName,
            4 => Self::BadSequenceId,
            5 => Self::MissingResult,
            6 => Self::InternalError,
            7 => Self::ProtocolError,
            _ => Self::Unknown,
        }
    }

    /// Convert to i32
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Text used when the exception carries no message.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::UnknownMethod => "Unknown method",
            Self::InvalidMessageType => "Invalid message type",
            Self::WrongMethodName => "Wrong method name",
            Self::BadSequenceId => "Bad sequence ID",
            Self::MissingResult => "Missing result",
            _ => "Default (unknown) TApplicationException",
        }
    }
}

/// A runtime-level failure carried in an EXCEPTION message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplicationException {
    kind: ExceptionType,
    message: Option<String>,
}

impl ApplicationException {
    pub fn new(kind: ExceptionType) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    pub fn with_message(kind: ExceptionType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    pub fn kind(&self) -> ExceptionType {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The exception struct type, registered in the global registry.
    pub fn struct_type() -> Result<Arc<StructType>, RegistryError> {
        let def = TypeDefBuilder::new(RUNTIME_NAMESPACE, TYPE_NAME)
            .field(2, "type", TypeShape::I32)
            .string_field(1, "message")
            .exception()
            .build()
            .map_err(|source| RegistryError::InvalidSpec {
                key: payload::TypeKey::new(RUNTIME_NAMESPACE, TYPE_NAME),
                source,
            })?;
        payload::global().synthesize(def)
    }

    pub fn to_payload(&self) -> RpcResult<Payload> {
        let mut payload = Self::struct_type()?.new_instance();
        payload.set("type", self.kind.as_i32())?;
        payload.set("message", self.message.clone())?;
        Ok(payload)
    }

    /// Read back from a payload; missing or unknown codes become `Unknown`.
    pub fn from_payload(payload: &Payload) -> Self {
        let kind = payload
            .get("type")
            .ok()
            .and_then(|v| v.as_i32())
            .map(ExceptionType::from_i32)
            .unwrap_or_default();
        let message = payload
            .get("message")
            .ok()
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Self { kind, message }
    }

    /// Read the exception struct from `prot`.
    pub fn read(prot: &mut dyn Protocol) -> RpcResult<Self> {
        let mut payload = Self::struct_type()?.new_instance();
        prot.read_struct(&mut payload)?;
        Ok(Self::from_payload(&payload))
    }

    /// Write the exception struct to `prot`.
    pub fn write(&self, prot: &mut dyn Protocol) -> RpcResult<()> {
        prot.write_struct(&self.to_payload()?)?;
        Ok(())
    }
}

impl fmt::Display for ApplicationException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) if !message.is_empty() => f.write_str(message),
            _ => f.write_str(self.kind.default_message()),
        }
    }
}

impl std::error::Error for ApplicationException {}

impl From<ExceptionType> for ApplicationException {
    fn from(kind: ExceptionType) -> Self {
        Self::new(kind)
    }
}
