// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for type definitions.

use crate::payload::{StorageMode, StructKind, StructType, TypeDef};
use crate::types::{DefaultSpec, FieldSpec, SpecError, TypeShape, TypeSpec, Value};
use std::sync::Arc;

/// Builder producing a [`TypeDef`] whose type spec and default spec agree.
///
/// Fields become constructor parameters in the order they are added.
#[derive(Debug)]
pub struct TypeDefBuilder {
    namespace: String,
    name: String,
    kind: StructKind,
    storage: Option<StorageMode>,
    fields: Vec<FieldSpec>,
    defaults: DefaultSpec,
}

impl TypeDefBuilder {
    /// Create a new builder for a struct type.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            kind: StructKind::Struct,
            storage: None,
            fields: Vec::new(),
            defaults: DefaultSpec::new(),
        }
    }

    /// Add a field defaulting to unset.
    pub fn field(self, id: i16, name: impl Into<String>, shape: impl Into<TypeShape>) -> Self {
        self.field_with_default(id, name, shape, Value::Null)
    }

    /// Add a field with a default value.
    pub fn field_with_default(
        mut self,
        id: i16,
        name: impl Into<String>,
        shape: impl Into<TypeShape>,
        default: impl Into<Value>,
    ) -> Self {
        let name = name.into();
        self.defaults.push(name.clone(), default.into());
        self.fields.push(FieldSpec::new(id, name, shape));
        self
    }

    /// Add a required field defaulting to unset.
    pub fn required_field(
        mut self,
        id: i16,
        name: impl Into<String>,
        shape: impl Into<TypeShape>,
    ) -> Self {
        let name = name.into();
        self.defaults.push(name.clone(), Value::Null);
        self.fields.push(FieldSpec::new(id, name, shape).required());
        self
    }

    /// Add a string field.
    pub fn string_field(self, id: i16, name: impl Into<String>) -> Self {
        self.field(id, name, TypeShape::STRING)
    }

    /// Add a nested struct field.
    pub fn struct_field(self, id: i16, name: impl Into<String>, ty: &Arc<StructType>) -> Self {
        self.field(id, name, TypeShape::structure(ty))
    }

    /// Add a list field.
    pub fn list_field(self, id: i16, name: impl Into<String>, item: TypeShape) -> Self {
        self.field(id, name, TypeShape::list(item))
    }

    /// Mark the type as an exception.
    pub fn exception(mut self) -> Self {
        self.kind = StructKind::Exception;
        self
    }

    /// Mark the type as a union.
    pub fn union(mut self) -> Self {
        self.kind = StructKind::Union;
        self
    }

    /// Force a storage mode instead of the registry default.
    pub fn storage(mut self, storage: StorageMode) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Build the TypeDef.
    pub fn build(self) -> Result<TypeDef, SpecError> {
        let spec = TypeSpec::from_fields(self.fields)?;
        self.defaults.check_against(&spec)?;
        Ok(TypeDef {
            namespace: self.namespace,
            name: self.name,
            spec,
            defaults: self.defaults,
            kind: self.kind,
            storage: self.storage,
        })
    }
}
