// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural type registry.
//!
//! Caches synthesized types by `(namespace, name)` so that every lookup of
//! one key yields the same `Arc<StructType>`.

use super::{Payload, StructType, TypeDef, TypeKey};
use crate::config::RegistryConfig;
use crate::types::SpecError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The type definition is inconsistent.
    InvalidSpec { key: TypeKey, source: SpecError },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSpec { key, source } => {
                write!(f, "invalid definition for {}: {}", key, source)
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidSpec { source, .. } => Some(source),
        }
    }
}

static GLOBAL_REGISTRY: OnceLock<StructRegistry> = OnceLock::new();

/// Process-wide registry.
pub fn global() -> &'static StructRegistry {
    GLOBAL_REGISTRY.get_or_init(StructRegistry::new)
}

/// Type cache keyed by `(namespace, name)`.
pub struct StructRegistry {
    types: DashMap<TypeKey, Arc<StructType>>,
    config: RegistryConfig,
}

impl StructRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            types: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Return the cached type for the definition's key, building it on
    /// first use.
    ///
    /// The first definition for a key wins; later definitions for the
    /// same key are ignored even if they differ.
    pub fn synthesize(&self, def: TypeDef) -> Result<Arc<StructType>, RegistryError> {
        let key = def.key();
        match self.types.entry(key) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let key = entry.key().clone();
                let ty = StructType::build(def, true, self.config.default_storage)
                    .map(Arc::new)
                    .map_err(|source| RegistryError::InvalidSpec {
                        key: key.clone(),
                        source,
                    })?;
                log::debug!(
                    "[registry] synthesized {} ({} fields, {:?})",
                    key,
                    ty.spec().len(),
                    ty.storage()
                );
                entry.insert(ty.clone());
                Ok(ty)
            }
        }
    }

    pub fn lookup(&self, namespace: &str, name: &str) -> Option<Arc<StructType>> {
        self.lookup_key(&TypeKey::new(namespace, name))
    }

    pub fn lookup_key(&self, key: &TypeKey) -> Option<Arc<StructType>> {
        self.types.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.types.contains_key(&TypeKey::new(namespace, name))
    }

    /// Strict instance check.
    ///
    /// When `ty` has a registered key, `value` must be an instance of the
    /// type currently registered under it; otherwise object identity decides.
    pub fn is_instance(&self, value: &Payload, ty: &Arc<StructType>) -> bool {
        match ty.key().and_then(|key| self.lookup_key(key)) {
            Some(canonical) => Arc::ptr_eq(value.struct_type(), &canonical),
            None => Arc::ptr_eq(value.struct_type(), ty),
        }
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<TypeKey> {
        let mut keys: Vec<_> = self.types.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Drop every cached type. Existing payloads keep their types.
    pub fn reset(&self) {
        let count = self.types.len();
        self.types.clear();
        log::debug!("[registry] reset, dropped {} types", count);
    }
}

impl Default for StructRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StructRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructRegistry")
            .field("types", &self.types.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::StorageMode;
    use crate::types::{DefaultSpec, FieldSpec, TypeDefBuilder, TypeShape, TypeSpec, Value};
    use std::thread;

    fn person_def(ns: &str) -> TypeDef {
        TypeDefBuilder::new(ns, "Person")
            .string_field(1, "name")
            .build()
            .unwrap()
    }

    #[test]
    fn synthesize_is_idempotent() {
        let registry = StructRegistry::new();
        let a = registry.synthesize(person_def("addressbook")).unwrap();
        let b = registry.synthesize(person_def("addressbook")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
        assert_eq!(a.key().map(|k| k.to_string()), Some("addressbook:Person".into()));
    }

    #[test]
    fn first_definition_wins() {
        let registry = StructRegistry::new();
        let first = registry.synthesize(person_def("ab")).unwrap();
        let other = TypeDefBuilder::new("ab", "Person")
            .field(1, "age", TypeShape::I32)
            .build()
            .unwrap();
        let second = registry.synthesize(other).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.has_field("name"));
        assert!(!second.has_field("age"));
    }

    #[test]
    fn namespaces_are_distinct() {
        let registry = StructRegistry::new();
        let a = registry.synthesize(person_def("one")).unwrap();
        let b = registry.synthesize(person_def("two")).unwrap();
        assert!(!StructType::same_type(&a, &b));
        assert_eq!(
            registry.keys(),
            vec![TypeKey::new("one", "Person"), TypeKey::new("two", "Person")]
        );
    }

    #[test]
    fn invalid_definition_is_rejected() {
        let registry = StructRegistry::new();
        let spec = TypeSpec::from_fields([FieldSpec::new(1, "name", TypeShape::STRING)]).unwrap();
        let def = TypeDef::new("ab", "Broken", spec, DefaultSpec::new());
        let err = registry.synthesize(def).unwrap_err();
        assert_eq!(
            err,
            RegistryError::InvalidSpec {
                key: TypeKey::new("ab", "Broken"),
                source: SpecError::MissingDefault("name".into()),
            }
        );
        assert!(!registry.contains("ab", "Broken"));
    }

    #[test]
    fn reset_yields_new_type_objects() {
        let registry = StructRegistry::new();
        let before = registry.synthesize(person_def("ab")).unwrap();
        let old = before.construct(vec!["Bob".into()]).unwrap();

        registry.reset();
        assert!(registry.is_empty());

        let after = registry.synthesize(person_def("ab")).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        // Key equality still holds, strict instance check does not.
        assert!(old.is_instance_of(&after));
        assert!(!registry.is_instance(&old, &after));
        assert!(registry.is_instance(&after.new_instance(), &before));
        assert_eq!(old.get("name").unwrap(), &Value::from("Bob"));
    }

    #[test]
    fn config_sets_default_storage() {
        let registry = StructRegistry::with_config(RegistryConfig {
            default_storage: StorageMode::Fixed,
        });
        let ty = registry.synthesize(person_def("ab")).unwrap();
        assert_eq!(ty.storage(), StorageMode::Fixed);

        let open = registry
            .synthesize(person_def("cd").with_storage(StorageMode::Open))
            .unwrap();
        assert_eq!(open.storage(), StorageMode::Open);

        let exception = registry
            .synthesize(person_def("ef").exception())
            .unwrap();
        assert_eq!(exception.storage(), StorageMode::Open);
        let mut raised = exception.new_instance();
        assert!(raised.set("detail", "extra").is_ok());

        let fixed_exception = registry
            .synthesize(person_def("gh").exception().with_storage(StorageMode::Fixed))
            .unwrap();
        assert_eq!(fixed_exception.storage(), StorageMode::Fixed);
    }

    #[test]
    fn concurrent_synthesis_converges() {
        let registry = Arc::new(StructRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || registry.synthesize(person_def("race")).unwrap())
            })
            .collect();
        let types: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(types.iter().all(|t| Arc::ptr_eq(t, &types[0])));
        assert_eq!(registry.len(), 1);
    }
}
