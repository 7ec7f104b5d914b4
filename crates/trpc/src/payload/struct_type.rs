// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural type definitions.

use super::{Payload, PayloadError};
use crate::types::{DefaultSpec, SpecError, TypeSpec, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// What a structural type models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StructKind {
    #[default]
    Struct,
    Union,
    /// Exception types may be raised by handlers and thrown to callers.
    Exception,
}

/// Instance field storage layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageMode {
    /// Name-keyed storage; undeclared attributes may be attached.
    #[default]
    Open,
    /// Fixed slots for the declared fields only.
    Fixed,
}

/// Registry identity of a structural type: `(namespace, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    pub namespace: String,
    pub name: String,
}

impl TypeKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

/// Everything needed to synthesize a structural type.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub namespace: String,
    pub name: String,
    pub spec: TypeSpec,
    pub defaults: DefaultSpec,
    pub kind: StructKind,
    /// `None` uses the registry default.
    pub storage: Option<StorageMode>,
}

impl TypeDef {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        spec: TypeSpec,
        defaults: DefaultSpec,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            spec,
            defaults,
            kind: StructKind::Struct,
            storage: None,
        }
    }

    pub fn key(&self) -> TypeKey {
        TypeKey::new(self.namespace.clone(), self.name.clone())
    }

    /// Mark as an exception type.
    pub fn exception(mut self) -> Self {
        self.kind = StructKind::Exception;
        self
    }

    pub fn with_kind(mut self, kind: StructKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_storage(mut self, storage: StorageMode) -> Self {
        self.storage = Some(storage);
        self
    }
}

/// A synthesized structural type.
///
/// Immutable once built; shared as `Arc<StructType>` by every payload of the
/// type and by every shape that references it.
pub struct StructType {
    key: Option<TypeKey>,
    name: String,
    kind: StructKind,
    storage: StorageMode,
    spec: TypeSpec,
    defaults: DefaultSpec,
    slots: HashMap<String, usize>,
}

impl StructType {
    pub(crate) fn build(
        def: TypeDef,
        keyed: bool,
        default_storage: StorageMode,
    ) -> Result<Self, SpecError> {
        def.defaults.check_against(&def.spec)?;

        let slots = def
            .defaults
            .names()
            .enumerate()
            .map(|(i, name)| (name.to_string(), i))
            .collect();
        let key = keyed.then(|| def.key());
        // Exceptions keep open storage unless asked otherwise.
        let storage = match (def.storage, def.kind) {
            (Some(storage), _) => storage,
            (None, StructKind::Exception) => StorageMode::Open,
            (None, _) => default_storage,
        };

        Ok(Self {
            key,
            name: def.name,
            kind: def.kind,
            storage,
            spec: def.spec,
            defaults: def.defaults,
            slots,
        })
    }

    /// Build a type outside any registry.
    ///
    /// Detached types have identity only: they are equal to nothing but
    /// themselves and their instances cannot be captured.
    pub fn detached(def: TypeDef) -> Result<Arc<Self>, SpecError> {
        let storage = def.storage.unwrap_or_default();
        Self::build(def, false, storage).map(Arc::new)
    }

    /// Registry key, absent for detached types.
    pub fn key(&self) -> Option<&TypeKey> {
        self.key.as_ref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.key.as_ref().map(|k| k.namespace.as_str())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StructKind {
        self.kind
    }

    pub fn is_exception(&self) -> bool {
        self.kind == StructKind::Exception
    }

    pub fn storage(&self) -> StorageMode {
        self.storage
    }

    pub fn spec(&self) -> &TypeSpec {
        &self.spec
    }

    pub fn defaults(&self) -> &DefaultSpec {
        &self.defaults
    }

    /// Storage slot of a declared field, in constructor order.
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Same object, or both registered under one key.
    pub fn same_type(a: &Arc<Self>, b: &Arc<Self>) -> bool {
        if Arc::ptr_eq(a, b) {
            return true;
        }
        match (&a.key, &b.key) {
            (Some(ka), Some(kb)) => ka == kb,
            _ => false,
        }
    }

    /// Fresh instance holding a copy of every default.
    pub fn new_instance(self: &Arc<Self>) -> Payload {
        Payload::with_defaults(self.clone())
    }

    /// Construct from positional arguments in constructor order.
    pub fn construct(self: &Arc<Self>, args: Vec<Value>) -> Result<Payload, PayloadError> {
        self.construct_with(args, Vec::<(String, Value)>::new())
    }

    /// Construct from positional then keyword arguments.
    ///
    /// A keyword naming a field already bound positionally is rejected.
    /// Keywords naming undeclared fields follow the storage rules of
    /// [`Payload::set`].
    pub fn construct_with<K: Into<String>>(
        self: &Arc<Self>,
        args: Vec<Value>,
        kwargs: Vec<(K, Value)>,
    ) -> Result<Payload, PayloadError> {
        if args.len() > self.defaults.len() {
            return Err(PayloadError::TooManyArguments {
                type_name: self.name.clone(),
                given: args.len(),
                max: self.defaults.len(),
            });
        }

        let mut payload = self.new_instance();
        let mut bound = vec![false; self.defaults.len()];
        for ((slot, name), value) in self.defaults.names().enumerate().zip(args) {
            payload.set(name, value)?;
            bound[slot] = true;
        }

        for (name, value) in kwargs {
            let name = name.into();
            if let Some(slot) = self.slot(&name) {
                if bound[slot] {
                    return Err(PayloadError::DuplicateArgument {
                        type_name: self.name.clone(),
                        field: name,
                    });
                }
                bound[slot] = true;
            }
            payload.set(&name, value)?;
        }
        Ok(payload)
    }
}

impl fmt::Debug for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructType")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("fields", &self.spec.len())
            .finish()
    }
}
