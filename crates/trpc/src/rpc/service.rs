// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Service descriptors.
//!
//! A service is a set of methods; each method has an args struct type and a
//! result struct type. The result type holds the return value in field
//! `0: success` (absent for void methods) and one field per declared
//! exception.

use crate::config::{ARGS_SUFFIX, RESULT_SUFFIX, SUCCESS_FIELD, SUCCESS_FIELD_ID};
use crate::payload::{RegistryError, StorageMode, StructRegistry, StructType, TypeKey};
use crate::types::{TypeDefBuilder, TypeShape, Value};
use std::sync::Arc;

/// One callable method.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    name: String,
    args: Arc<StructType>,
    result: Arc<StructType>,
    oneway: bool,
}

impl MethodDescriptor {
    pub fn new(
        name: impl Into<String>,
        args: Arc<StructType>,
        result: Arc<StructType>,
        oneway: bool,
    ) -> Self {
        Self {
            name: name.into(),
            args,
            result,
            oneway,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &Arc<StructType> {
        &self.args
    }

    pub fn result(&self) -> &Arc<StructType> {
        &self.result
    }

    pub fn is_oneway(&self) -> bool {
        self.oneway
    }

    /// True if the result type declares a success field.
    pub fn returns_value(&self) -> bool {
        self.result.has_field(SUCCESS_FIELD)
    }
}

/// A named set of methods.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    name: String,
    methods: Vec<MethodDescriptor>,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>, methods: Vec<MethodDescriptor>) -> Self {
        Self {
            name: name.into(),
            methods,
        }
    }

    /// Start describing a service whose types live in `namespace`.
    pub fn builder(namespace: impl Into<String>, name: impl Into<String>) -> ServiceBuilder {
        ServiceBuilder::new(namespace, name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// Method names in declaration order.
    pub fn method_names(&self) -> Vec<&str> {
        self.methods.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.method(name).is_some()
    }
}

/// Declaration of one method, turned into args/result types by
/// [`ServiceBuilder::build`].
#[derive(Debug, Clone)]
pub struct MethodDef {
    name: String,
    args: Vec<(i16, String, TypeShape, Value)>,
    returns: Option<TypeShape>,
    throws: Vec<(i16, String, Arc<StructType>)>,
    oneway: bool,
}

impl MethodDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            returns: None,
            throws: Vec::new(),
            oneway: false,
        }
    }

    pub fn arg(self, id: i16, name: impl Into<String>, shape: impl Into<TypeShape>) -> Self {
        self.arg_with_default(id, name, shape, Value::Null)
    }

    pub fn arg_with_default(
        mut self,
        id: i16,
        name: impl Into<String>,
        shape: impl Into<TypeShape>,
        default: impl Into<Value>,
    ) -> Self {
        self.args.push((id, name.into(), shape.into(), default.into()));
        self
    }

    /// Non-void return shape.
    pub fn returns(mut self, shape: impl Into<TypeShape>) -> Self {
        self.returns = Some(shape.into());
        self
    }

    /// Declared exception, stored in result field `id`.
    pub fn throws(mut self, id: i16, name: impl Into<String>, exception: &Arc<StructType>) -> Self {
        self.throws.push((id, name.into(), exception.clone()));
        self
    }

    pub fn oneway(mut self) -> Self {
        self.oneway = true;
        self
    }
}

/// Builds a [`ServiceDescriptor`], synthesizing the per-method types.
#[derive(Debug)]
pub struct ServiceBuilder {
    namespace: String,
    name: String,
    methods: Vec<MethodDef>,
    storage: Option<StorageMode>,
}

impl ServiceBuilder {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            methods: Vec::new(),
            storage: None,
        }
    }

    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Storage for the synthesized args/result types.
    pub fn storage(mut self, storage: StorageMode) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Synthesize `{Service}.{method}_args` and `{Service}.{method}_result`
    /// in `registry`.
    pub fn build(self, registry: &StructRegistry) -> Result<Arc<ServiceDescriptor>, RegistryError> {
        let mut methods = Vec::with_capacity(self.methods.len());
        for def in &self.methods {
            let args_name = format!("{}.{}{}", self.name, def.name, ARGS_SUFFIX);
            let mut args = TypeDefBuilder::new(&self.namespace, &args_name);
            for (id, name, shape, default) in &def.args {
                args = args.field_with_default(*id, name.clone(), shape.clone(), default.clone());
            }

            let result_name = format!("{}.{}{}", self.name, def.name, RESULT_SUFFIX);
            let mut result = TypeDefBuilder::new(&self.namespace, &result_name);
            if let Some(shape) = &def.returns {
                result = result.field(SUCCESS_FIELD_ID, SUCCESS_FIELD, shape.clone());
            }
            for (id, name, exception) in &def.throws {
                result = result.struct_field(*id, name.clone(), exception);
            }

            if let Some(storage) = self.storage {
                args = args.storage(storage);
                result = result.storage(storage);
            }

            let args = self.synthesize(registry, &args_name, args)?;
            let result = self.synthesize(registry, &result_name, result)?;
            methods.push(MethodDescriptor::new(&def.name, args, result, def.oneway));
        }

        log::debug!(
            "[rpc] built service '{}' with {} methods",
            self.name,
            methods.len()
        );
        Ok(Arc::new(ServiceDescriptor::new(self.name, methods)))
    }

    fn synthesize(
        &self,
        registry: &StructRegistry,
        type_name: &str,
        builder: TypeDefBuilder,
    ) -> Result<Arc<StructType>, RegistryError> {
        let def = builder.build().map_err(|source| RegistryError::InvalidSpec {
            key: TypeKey::new(self.namespace.clone(), type_name),
            source,
        })?;
        registry.synthesize(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TType;

    fn calculator(registry: &StructRegistry) -> Arc<ServiceDescriptor> {
        let overflow = registry
            .synthesize(
                TypeDefBuilder::new("calc", "Overflow")
                    .string_field(1, "message")
                    .exception()
                    .build()
                    .unwrap(),
            )
            .unwrap();
        ServiceDescriptor::builder("calc", "Calculator")
            .method(
                MethodDef::new("add")
                    .arg(1, "a", TypeShape::I32)
                    .arg(2, "b", TypeShape::I32)
                    .returns(TypeShape::I32)
                    .throws(1, "overflow", &overflow),
            )
            .method(MethodDef::new("ping"))
            .method(MethodDef::new("log").arg(1, "line", TypeShape::STRING).oneway())
            .build(registry)
            .unwrap()
    }

    #[test]
    fn builds_args_and_result_types() {
        let registry = StructRegistry::new();
        let service = calculator(&registry);
        assert_eq!(service.name(), "Calculator");
        assert_eq!(service.method_names(), vec!["add", "ping", "log"]);

        let add = service.method("add").unwrap();
        assert_eq!(add.args().name(), "Calculator.add_args");
        assert_eq!(add.result().name(), "Calculator.add_result");
        assert!(add.returns_value());
        assert_eq!(add.result().spec().get(0).map(|f| f.ttype()), Some(TType::I32));
        assert_eq!(add.result().spec().get(1).map(|f| f.ttype()), Some(TType::Struct));
        assert!(registry.contains("calc", "Calculator.add_args"));

        let ping = service.method("ping").unwrap();
        assert!(!ping.returns_value());
        assert!(ping.result().spec().is_empty());

        assert!(service.method("log").unwrap().is_oneway());
        assert!(!service.contains("mul"));
    }

    #[test]
    fn rebuilding_reuses_registered_types() {
        let registry = StructRegistry::new();
        let first = calculator(&registry);
        let second = calculator(&registry);
        let a = first.method("add").unwrap();
        let b = second.method("add").unwrap();
        assert!(Arc::ptr_eq(a.args(), b.args()));
        assert!(Arc::ptr_eq(a.result(), b.result()));
    }

    #[test]
    fn duplicate_arg_ids_are_rejected() {
        let registry = StructRegistry::new();
        let err = ServiceDescriptor::builder("calc", "Broken")
            .method(
                MethodDef::new("f")
                    .arg(1, "a", TypeShape::I32)
                    .arg(1, "b", TypeShape::I32),
            )
            .build(&registry)
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSpec { ref key, .. } if key.name == "Broken.f_args"));
    }
}
