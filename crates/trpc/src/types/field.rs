// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field tables: shapes, field specs, type specs and default specs.

use crate::payload::StructType;
use crate::types::{TType, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Errors raised while assembling a field table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// Two fields share one id.
    DuplicateFieldId(i16),
    /// Two fields share one name.
    DuplicateFieldName(String),
    /// The default spec names a field the type spec does not declare.
    UnknownDefault(String),
    /// A declared field has no entry in the default spec.
    MissingDefault(String),
    /// The default spec lists one field twice.
    DuplicateDefault(String),
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateFieldId(id) => write!(f, "duplicate field id {}", id),
            Self::DuplicateFieldName(name) => write!(f, "duplicate field name '{}'", name),
            Self::UnknownDefault(name) => {
                write!(f, "default given for undeclared field '{}'", name)
            }
            Self::MissingDefault(name) => write!(f, "no default for declared field '{}'", name),
            Self::DuplicateDefault(name) => write!(f, "field '{}' has two defaults", name),
        }
    }
}

impl std::error::Error for SpecError {}

/// Nested part of a [`TypeShape`].
#[derive(Debug, Clone)]
pub enum ElementSpec {
    /// Referenced structural type (STRUCT).
    Struct(Arc<StructType>),
    /// Element shape (LIST, SET).
    Item(Box<TypeShape>),
    /// Key and value shapes (MAP).
    Entry(Box<TypeShape>, Box<TypeShape>),
}

/// Recursive shape of a field: a tag plus the nested element, if any.
#[derive(Debug, Clone)]
pub struct TypeShape {
    ttype: TType,
    element: Option<ElementSpec>,
}

impl TypeShape {
    pub const BOOL: TypeShape = TypeShape::of(TType::Bool);
    pub const BYTE: TypeShape = TypeShape::of(TType::Byte);
    pub const I16: TypeShape = TypeShape::of(TType::I16);
    pub const I32: TypeShape = TypeShape::of(TType::I32);
    pub const I64: TypeShape = TypeShape::of(TType::I64);
    pub const DOUBLE: TypeShape = TypeShape::of(TType::Double);
    pub const STRING: TypeShape = TypeShape::of(TType::String);

    /// Shape with no nested element.
    pub const fn of(ttype: TType) -> Self {
        Self {
            ttype,
            element: None,
        }
    }

    /// STRUCT shape referencing a structural type.
    pub fn structure(ty: &Arc<StructType>) -> Self {
        Self {
            ttype: TType::Struct,
            element: Some(ElementSpec::Struct(ty.clone())),
        }
    }

    /// LIST of `item`.
    pub fn list(item: TypeShape) -> Self {
        Self {
            ttype: TType::List,
            element: Some(ElementSpec::Item(Box::new(item))),
        }
    }

    /// SET of `item`.
    pub fn set(item: TypeShape) -> Self {
        Self {
            ttype: TType::Set,
            element: Some(ElementSpec::Item(Box::new(item))),
        }
    }

    /// MAP from `key` to `value`.
    pub fn map(key: TypeShape, value: TypeShape) -> Self {
        Self {
            ttype: TType::Map,
            element: Some(ElementSpec::Entry(Box::new(key), Box::new(value))),
        }
    }

    pub fn ttype(&self) -> TType {
        self.ttype
    }

    pub fn element(&self) -> Option<&ElementSpec> {
        self.element.as_ref()
    }

    /// Referenced structural type, for STRUCT shapes.
    pub fn struct_type(&self) -> Option<&Arc<StructType>> {
        match &self.element {
            Some(ElementSpec::Struct(ty)) => Some(ty),
            _ => None,
        }
    }

    /// Element shape, for LIST and SET shapes.
    pub fn item(&self) -> Option<&TypeShape> {
        match &self.element {
            Some(ElementSpec::Item(item)) => Some(item),
            _ => None,
        }
    }

    /// Key and value shapes, for MAP shapes.
    pub fn entry(&self) -> Option<(&TypeShape, &TypeShape)> {
        match &self.element {
            Some(ElementSpec::Entry(k, v)) => Some((k, v)),
            _ => None,
        }
    }
}

impl From<TType> for TypeShape {
    fn from(ttype: TType) -> Self {
        Self::of(ttype)
    }
}

/// Human-readable description: `I32`, `LIST<Person>`, `MAP<STRING, I32>`.
impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.element {
            None => f.write_str(self.ttype.name()),
            Some(ElementSpec::Struct(ty)) => f.write_str(ty.name()),
            Some(ElementSpec::Item(item)) => write!(f, "{}<{}>", self.ttype.name(), item),
            Some(ElementSpec::Entry(k, v)) => write!(f, "MAP<{}, {}>", k, v),
        }
    }
}

/// One declared field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field id, unique within its type spec.
    pub id: i16,
    /// Field name.
    pub name: String,
    /// Field shape.
    pub shape: TypeShape,
    /// Declared `required`.
    pub required: bool,
}

impl FieldSpec {
    pub fn new(id: i16, name: impl Into<String>, shape: impl Into<TypeShape>) -> Self {
        Self {
            id,
            name: name.into(),
            shape: shape.into(),
            required: false,
        }
    }

    /// Mark as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn ttype(&self) -> TType {
        self.shape.ttype()
    }
}

/// Field table of one structural type, keyed and iterated by field id.
#[derive(Debug, Clone, Default)]
pub struct TypeSpec {
    fields: BTreeMap<i16, FieldSpec>,
}

impl TypeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of fields, rejecting duplicate ids and names.
    pub fn from_fields(fields: impl IntoIterator<Item = FieldSpec>) -> Result<Self, SpecError> {
        let mut spec = Self::new();
        for field in fields {
            spec.insert(field)?;
        }
        Ok(spec)
    }

    /// Add a field.
    pub fn insert(&mut self, field: FieldSpec) -> Result<(), SpecError> {
        if self.fields.contains_key(&field.id) {
            return Err(SpecError::DuplicateFieldId(field.id));
        }
        if self.by_name(&field.name).is_some() {
            return Err(SpecError::DuplicateFieldName(field.name));
        }
        self.fields.insert(field.id, field);
        Ok(())
    }

    pub fn get(&self, id: i16) -> Option<&FieldSpec> {
        self.fields.get(&id)
    }

    pub fn by_name(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.values().find(|f| f.name == name)
    }

    /// Fields in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    /// Field names in ascending id order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.values().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Constructor parameter order and defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultSpec {
    entries: Vec<(String, Value)>,
}

impl DefaultSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, Value)>) -> Self {
        Self {
            entries: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Append a parameter.
    pub fn push(&mut self, name: impl Into<String>, default: Value) {
        self.entries.push((name.into(), default));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that this spec names exactly the fields of `spec`.
    pub fn check_against(&self, spec: &TypeSpec) -> Result<(), SpecError> {
        for (i, (name, _)) in self.entries.iter().enumerate() {
            if spec.by_name(name).is_none() {
                return Err(SpecError::UnknownDefault(name.clone()));
            }
            if self.entries[..i].iter().any(|(k, _)| k == name) {
                return Err(SpecError::DuplicateDefault(name.clone()));
            }
        }
        if let Some(missing) = spec.names().find(|n| self.get(n).is_none()) {
            return Err(SpecError::MissingDefault(missing.to_string()));
        }
        Ok(())
    }
}
