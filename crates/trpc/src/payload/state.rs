// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Payload capture and restore.
//!
//! A captured payload records its type key and declared field values.
//! Restoring looks the key up in a registry and rebuilds the instance, so
//! only registered types round-trip.

use super::{Payload, PayloadError, StructRegistry, TypeKey};
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Persistence errors.
#[derive(Debug)]
pub enum PersistError {
    /// The payload's type was built outside any registry.
    Detached(String),
    /// No type is registered under the captured key.
    NotRegistered(TypeKey),
    /// Restoring a field failed.
    Payload(PayloadError),
    /// JSON encoding or decoding failed.
    Json(serde_json::Error),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detached(name) => write!(f, "type '{}' is not registered and cannot be captured", name),
            Self::NotRegistered(key) => write!(f, "no type registered under {}", key),
            Self::Payload(e) => write!(f, "restore failed: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Payload(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PayloadError> for PersistError {
    fn from(e: PayloadError) -> Self {
        Self::Payload(e)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Serializable mirror of [`Value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum StateValue {
    Null,
    Bool(bool),
    Byte(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    Struct(PayloadState),
    List(Vec<StateValue>),
    Set(Vec<StateValue>),
    Map(Vec<(StateValue, StateValue)>),
}

/// Captured state of one payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadState {
    pub namespace: String,
    pub name: String,
    /// Declared fields in constructor order.
    pub fields: Vec<(String, StateValue)>,
}

impl Payload {
    /// Capture the declared fields of a registered payload.
    pub fn capture(&self) -> Result<PayloadState, PersistError> {
        let key = self
            .struct_type()
            .key()
            .ok_or_else(|| PersistError::Detached(self.type_name().to_string()))?;
        let fields = self
            .fields()
            .map(|(name, value)| Ok((name.to_string(), capture_value(value)?)))
            .collect::<Result<_, PersistError>>()?;
        Ok(PayloadState {
            namespace: key.namespace.clone(),
            name: key.name.clone(),
            fields,
        })
    }
}

fn capture_value(value: &Value) -> Result<StateValue, PersistError> {
    let state = match value {
        Value::Null => StateValue::Null,
        Value::Bool(v) => StateValue::Bool(*v),
        Value::Byte(v) => StateValue::Byte(*v),
        Value::I16(v) => StateValue::I16(*v),
        Value::I32(v) => StateValue::I32(*v),
        Value::I64(v) => StateValue::I64(*v),
        Value::Double(v) => StateValue::Double(*v),
        Value::String(v) => StateValue::String(v.clone()),
        Value::Binary(v) => StateValue::Binary(v.clone()),
        Value::Struct(p) => StateValue::Struct(p.capture()?),
        Value::List(items) => StateValue::List(capture_all(items)?),
        Value::Set(items) => StateValue::Set(capture_all(items)?),
        Value::Map(entries) => StateValue::Map(
            entries
                .iter()
                .map(|(k, v)| Ok((capture_value(k)?, capture_value(v)?)))
                .collect::<Result<_, PersistError>>()?,
        ),
    };
    Ok(state)
}

fn capture_all(items: &[Value]) -> Result<Vec<StateValue>, PersistError> {
    items.iter().map(capture_value).collect()
}

impl PayloadState {
    pub fn key(&self) -> TypeKey {
        TypeKey::new(self.namespace.clone(), self.name.clone())
    }

    /// Rebuild the payload against the types in `registry`.
    pub fn restore(&self, registry: &StructRegistry) -> Result<Payload, PersistError> {
        let key = self.key();
        let ty = registry
            .lookup_key(&key)
            .ok_or(PersistError::NotRegistered(key))?;
        let mut payload = ty.new_instance();
        for (name, state) in &self.fields {
            payload.set(name, restore_value(state, registry)?)?;
        }
        Ok(payload)
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn restore_value(state: &StateValue, registry: &StructRegistry) -> Result<Value, PersistError> {
    let value = match state {
        StateValue::Null => Value::Null,
        StateValue::Bool(v) => Value::Bool(*v),
        StateValue::Byte(v) => Value::Byte(*v),
        StateValue::I16(v) => Value::I16(*v),
        StateValue::I32(v) => Value::I32(*v),
        StateValue::I64(v) => Value::I64(*v),
        StateValue::Double(v) => Value::Double(*v),
        StateValue::String(v) => Value::String(v.clone()),
        StateValue::Binary(v) => Value::Binary(v.clone()),
        StateValue::Struct(p) => Value::from(p.restore(registry)?),
        StateValue::List(items) => Value::List(restore_all(items, registry)?),
        StateValue::Set(items) => Value::Set(restore_all(items, registry)?),
        StateValue::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| Ok((restore_value(k, registry)?, restore_value(v, registry)?)))
                .collect::<Result<_, PersistError>>()?,
        ),
    };
    Ok(value)
}

fn restore_all(items: &[StateValue], registry: &StructRegistry) -> Result<Vec<Value>, PersistError> {
    items.iter().map(|s| restore_value(s, registry)).collect()
}
