// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Payload instances.

use super::validate::{check_field, DecodeError};
use super::{StorageMode, StructType};
use crate::types::Value;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a payload instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Errors from payload construction and field access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// Field not declared by a fixed-storage type, or never set on an open one.
    Attribute { type_name: String, field: String },
    /// More positional arguments than constructor parameters.
    TooManyArguments {
        type_name: String,
        given: usize,
        max: usize,
    },
    /// One parameter bound twice.
    DuplicateArgument { type_name: String, field: String },
    /// A non-exception payload used where an exception is required.
    NotAnException(String),
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute { type_name, field } => {
                write!(f, "'{}' object has no attribute '{}'", type_name, field)
            }
            Self::TooManyArguments {
                type_name,
                given,
                max,
            } => write!(
                f,
                "{}() takes at most {} arguments ({} given)",
                type_name, max, given
            ),
            Self::DuplicateArgument { type_name, field } => {
                write!(f, "{}() got multiple values for argument '{}'", type_name, field)
            }
            Self::NotAnException(name) => write!(f, "'{}' is not an exception type", name),
        }
    }
}

impl std::error::Error for PayloadError {}

enum Storage {
    Open(HashMap<String, Value>),
    Fixed(Box<[Value]>),
}

/// An instance of a [`StructType`].
///
/// Equality compares the type and the declared fields only. Cloning yields
/// a new instance identity.
pub struct Payload {
    ty: Arc<StructType>,
    storage: Storage,
    id: InstanceId,
}

impl Payload {
    pub(crate) fn with_defaults(ty: Arc<StructType>) -> Self {
        let defaults = ty.defaults().iter();
        let storage = match ty.storage() {
            StorageMode::Open => Storage::Open(
                defaults
                    .map(|(name, value)| (name.to_string(), value.clone()))
                    .collect(),
            ),
            StorageMode::Fixed => Storage::Fixed(defaults.map(|(_, v)| v.clone()).collect()),
        };
        Self {
            ty,
            storage,
            id: InstanceId::next(),
        }
    }

    pub fn struct_type(&self) -> &Arc<StructType> {
        &self.ty
    }

    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn is_exception(&self) -> bool {
        self.ty.is_exception()
    }

    /// True if this payload's type is `ty` (by object or registry key).
    pub fn is_instance_of(&self, ty: &Arc<StructType>) -> bool {
        StructType::same_type(&self.ty, ty)
    }

    fn attribute_error(&self, name: &str) -> PayloadError {
        PayloadError::Attribute {
            type_name: self.ty.name().to_string(),
            field: name.to_string(),
        }
    }

    /// Read a field (declared, or an extra attribute on open storage).
    pub fn get(&self, name: &str) -> Result<&Value, PayloadError> {
        let found = match &self.storage {
            Storage::Open(map) => map.get(name),
            Storage::Fixed(slots) => self.ty.slot(name).and_then(|i| slots.get(i)),
        };
        found.ok_or_else(|| self.attribute_error(name))
    }

    /// Write a field.
    ///
    /// Open storage accepts any name; fixed storage rejects undeclared ones.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), PayloadError> {
        let value = value.into();
        match &mut self.storage {
            Storage::Open(map) => {
                map.insert(name.to_string(), value);
                Ok(())
            }
            Storage::Fixed(slots) => match self.ty.slot(name).and_then(|i| slots.get_mut(i)) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(self.attribute_error(name)),
            },
        }
    }

    /// Move a field's value out, leaving it unset.
    pub fn take(&mut self, name: &str) -> Result<Value, PayloadError> {
        let found = match &mut self.storage {
            Storage::Open(map) => map.get_mut(name),
            Storage::Fixed(slots) => self.ty.slot(name).and_then(|i| slots.get_mut(i)),
        };
        match found {
            Some(value) => Ok(std::mem::take(value)),
            None => Err(self.attribute_error(name)),
        }
    }

    /// Read a declared field by id.
    pub fn get_by_id(&self, id: i16) -> Option<&Value> {
        let field = self.ty.spec().get(id)?;
        self.get(&field.name).ok()
    }

    /// Write a declared field by id.
    pub fn set_by_id(&mut self, id: i16, value: impl Into<Value>) -> Result<(), PayloadError> {
        let ty = self.ty.clone();
        match ty.spec().get(id) {
            Some(field) => self.set(&field.name, value),
            None => Err(self.attribute_error(&format!("#{}", id))),
        }
    }

    /// True if `name` is a declared field.
    pub fn has_field(&self, name: &str) -> bool {
        self.ty.has_field(name)
    }

    /// Declared fields in constructor order.
    pub fn fields(&self) -> Box<dyn Iterator<Item = (&str, &Value)> + '_> {
        match &self.storage {
            Storage::Open(map) => Box::new(
                self.ty
                    .defaults()
                    .names()
                    .filter_map(move |name| map.get(name).map(|v| (name, v))),
            ),
            Storage::Fixed(slots) => Box::new(self.ty.defaults().names().zip(slots.iter())),
        }
    }

    /// Undeclared attributes attached to an open payload.
    pub fn extras(&self) -> Vec<(&str, &Value)> {
        let mut extras: Vec<_> = match &self.storage {
            Storage::Open(map) => map
                .iter()
                .filter(|(name, _)| !self.ty.has_field(name))
                .map(|(name, value)| (name.as_str(), value))
                .collect(),
            Storage::Fixed(_) => Vec::new(),
        };
        extras.sort_by(|a, b| a.0.cmp(b.0));
        extras
    }

    /// Check every declared field against its shape.
    pub fn validate(&self) -> Result<(), DecodeError> {
        for field in self.ty.spec().iter() {
            match self.get(&field.name) {
                Ok(value) => check_field(self.ty.name(), field, value)?,
                Err(_) => check_field(self.ty.name(), field, &Value::Null)?,
            }
        }
        Ok(())
    }
}

impl Clone for Payload {
    fn clone(&self) -> Self {
        let storage = match &self.storage {
            Storage::Open(map) => Storage::Open(map.clone()),
            Storage::Fixed(slots) => Storage::Fixed(slots.clone()),
        };
        Self {
            ty: self.ty.clone(),
            storage,
            id: InstanceId::next(),
        }
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        StructType::same_type(&self.ty, &other.ty)
            && self
                .fields()
                .all(|(name, value)| other.get(name).map_or(false, |v| v == value))
    }
}

/// `Name(field=value, ...)` over declared fields in constructor order.
impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.ty.name())?;
        for (i, (name, value)) in self.fields().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// An exception payload used as a raised error.
///
/// Hashes and compares by instance identity, so two distinct raised
/// exceptions are never equal even when their fields match.
#[derive(Debug)]
pub struct Thrown(Payload);

impl Thrown {
    pub fn new(payload: Payload) -> Result<Self, PayloadError> {
        if !payload.is_exception() {
            return Err(PayloadError::NotAnException(payload.type_name().to_string()));
        }
        Ok(Self(payload))
    }

    pub fn payload(&self) -> &Payload {
        &self.0
    }

    pub fn into_payload(self) -> Payload {
        self.0
    }
}

impl Deref for Thrown {
    type Target = Payload;

    fn deref(&self) -> &Payload {
        &self.0
    }
}

impl PartialEq for Thrown {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Thrown {}

impl Hash for Thrown {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Thrown {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TypeDefBuilder, TypeShape};
    use std::collections::HashSet;

    fn person(storage: StorageMode) -> Arc<StructType> {
        StructType::detached(
            TypeDefBuilder::new("tests", "Person")
                .string_field(1, "name")
                .list_field(2, "phones", TypeShape::STRING)
                .storage(storage)
                .build()
                .unwrap(),
        )
        .unwrap()
    }

    fn not_found() -> Arc<StructType> {
        StructType::detached(
            TypeDefBuilder::new("tests", "PersonNotExistsError")
                .string_field(1, "message")
                .exception()
                .build()
                .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn defaults_are_copied_per_instance() {
        let ty = StructType::detached(
            TypeDefBuilder::new("tests", "Bag")
                .field_with_default(1, "items", TypeShape::list(TypeShape::I32), Value::List(vec![]))
                .build()
                .unwrap(),
        )
        .unwrap();
        let mut a = ty.new_instance();
        let b = ty.new_instance();
        a.set("items", Value::List(vec![1i32.into()])).unwrap();
        assert_eq!(b.get("items").unwrap(), &Value::List(vec![]));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn open_storage_accepts_extras() {
        let ty = person(StorageMode::Open);
        let mut p = ty.new_instance();
        p.set("nickname", "bob").unwrap();
        assert_eq!(p.get("nickname").unwrap(), &Value::from("bob"));
        assert_eq!(p.extras(), vec![("nickname", &Value::from("bob"))]);
        assert!(matches!(p.get("missing"), Err(PayloadError::Attribute { .. })));
    }

    #[test]
    fn fixed_storage_rejects_undeclared() {
        let ty = person(StorageMode::Fixed);
        let mut p = ty.new_instance();
        p.set("name", "Bob").unwrap();
        let err = p.set("nickname", "bob").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'Person' object has no attribute 'nickname'"
        );
        assert!(p.extras().is_empty());
    }

    #[test]
    fn equality_ignores_extras_and_identity() {
        let ty = person(StorageMode::Open);
        let mut a = ty.construct(vec!["Bob".into()]).unwrap();
        let b = ty.construct(vec!["Bob".into()]).unwrap();
        a.set("note", 1i32).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.clone(), a);
        assert_ne!(a.clone().id(), a.id());

        let c = ty.construct(vec!["Alice".into()]).unwrap();
        assert_ne!(a, c);

        let other = person(StorageMode::Open);
        assert_ne!(a, other.construct(vec!["Bob".into()]).unwrap());
    }

    #[test]
    fn display_lists_declared_fields() {
        let ty = person(StorageMode::Fixed);
        let p = ty
            .construct(vec!["Bob".into(), Value::List(vec!["555".into()])])
            .unwrap();
        assert_eq!(p.to_string(), "Person(name=\"Bob\", phones=[\"555\"])");
    }

    #[test]
    fn access_by_id_and_take() {
        let ty = person(StorageMode::Open);
        let mut p = ty.new_instance();
        p.set_by_id(1, "Bob").unwrap();
        assert_eq!(p.get_by_id(1), Some(&Value::from("Bob")));
        assert_eq!(p.get_by_id(9), None);
        assert!(p.set_by_id(9, 1i32).is_err());
        assert_eq!(p.take("name").unwrap(), Value::from("Bob"));
        assert!(p.get("name").unwrap().is_null());
    }

    #[test]
    fn thrown_uses_identity() {
        let ty = not_found();
        let a = Thrown::new(ty.construct(vec!["gone".into()]).unwrap()).unwrap();
        let b = Thrown::new(ty.construct(vec!["gone".into()]).unwrap()).unwrap();
        assert_eq!(a.payload(), b.payload());
        assert_ne!(a, b);

        let mut seen = HashSet::new();
        seen.insert(a);
        seen.insert(b);
        assert_eq!(seen.len(), 2);

        let plain = person(StorageMode::Open).new_instance();
        assert!(matches!(Thrown::new(plain), Err(PayloadError::NotAnException(_))));
    }
}
