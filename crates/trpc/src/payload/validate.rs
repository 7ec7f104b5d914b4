// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field value validation against declared shapes.

use crate::types::{FieldSpec, TType, TypeShape, Value};
use std::fmt;

/// A field value that does not match its declared shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub struct_name: String,
    pub field_id: i16,
    pub field_name: String,
    /// Shape description, e.g. `LIST<Person>`.
    pub expected: String,
    /// Rendering of the offending value.
    pub value: String,
}

impl DecodeError {
    pub fn new(struct_name: &str, field: &FieldSpec, value: impl Into<String>) -> Self {
        Self {
            struct_name: struct_name.to_string(),
            field_id: field.id,
            field_name: field.name.clone(),
            expected: field.shape.to_string(),
            value: value.into(),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Field '{}({})' of '{}' needs type '{}', but the value is `{}`",
            self.field_name, self.field_id, self.struct_name, self.expected, self.value
        )
    }
}

impl std::error::Error for DecodeError {}

/// True if a set `value` fits `shape`.
///
/// Unset values never match; callers decide whether a field may be unset.
pub fn matches_shape(shape: &TypeShape, value: &Value) -> bool {
    match (shape.ttype(), value) {
        (_, Value::Null) => false,
        (TType::Bool, Value::Bool(_)) => true,
        (TType::Byte, Value::Byte(_)) => true,
        (TType::I16, Value::I16(_)) => true,
        (TType::I32, Value::I32(_)) => true,
        (TType::I64, Value::I64(_)) => true,
        (TType::Double, Value::Double(_)) => true,
        (t, Value::String(_) | Value::Binary(_)) => t.is_string(),
        (TType::Struct, Value::Struct(payload)) => match shape.struct_type() {
            Some(ty) => payload.is_instance_of(ty),
            None => true,
        },
        (TType::List, Value::List(items)) | (TType::Set, Value::Set(items)) => {
            match shape.item() {
                Some(item) => items.iter().all(|v| matches_shape(item, v)),
                None => items.iter().all(Value::is_set),
            }
        }
        (TType::Map, Value::Map(entries)) => match shape.entry() {
            Some((k, v)) => entries
                .iter()
                .all(|(key, val)| matches_shape(k, key) && matches_shape(v, val)),
            None => entries.iter().all(|(key, val)| key.is_set() && val.is_set()),
        },
        _ => false,
    }
}

/// Check one field value of `struct_name`; unset is always accepted.
pub fn check_field(struct_name: &str, field: &FieldSpec, value: &Value) -> Result<(), DecodeError> {
    if value.is_null() || matches_shape(&field.shape, value) {
        Ok(())
    } else {
        Err(DecodeError::new(struct_name, field, value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::StructType;
    use crate::types::TypeDefBuilder;

    #[test]
    fn scalar_shapes() {
        assert!(matches_shape(&TypeShape::I32, &Value::I32(1)));
        assert!(!matches_shape(&TypeShape::I32, &Value::I64(1)));
        assert!(matches_shape(&TypeShape::STRING, &Value::from("x")));
        assert!(matches_shape(&TypeShape::of(TType::BINARY), &Value::Binary(vec![1])));
        assert!(matches_shape(&TypeShape::of(TType::Utf8), &Value::from("x")));
        assert!(!matches_shape(&TypeShape::BOOL, &Value::Null));
    }

    #[test]
    fn container_shapes() {
        let list = TypeShape::list(TypeShape::STRING);
        assert!(matches_shape(&list, &Value::List(vec!["a".into()])));
        assert!(!matches_shape(&list, &Value::List(vec![1i32.into()])));
        assert!(!matches_shape(&list, &Value::Set(vec!["a".into()])));

        let map = TypeShape::map(TypeShape::STRING, TypeShape::I32);
        assert!(matches_shape(&map, &Value::Map(vec![("a".into(), 1i32.into())])));
        assert!(!matches_shape(&map, &Value::Map(vec![("a".into(), Value::Null)])));
    }

    #[test]
    fn struct_shapes_check_type() {
        let def = TypeDefBuilder::new("tests", "Person")
            .string_field(1, "name")
            .build()
            .unwrap();
        let person = StructType::detached(def.clone()).unwrap();
        let other = StructType::detached(def).unwrap();
        let shape = TypeShape::structure(&person);
        assert!(matches_shape(&shape, &person.new_instance().into()));
        assert!(!matches_shape(&shape, &other.new_instance().into()));
    }

    #[test]
    fn decode_error_message() {
        let field = FieldSpec::new(1, "name", TypeShape::STRING);
        assert!(check_field("Person", &field, &Value::Null).is_ok());
        let err = check_field("Person", &field, &Value::I32(3)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Field 'name(1)' of 'Person' needs type 'STRING', but the value is `3`"
        );
    }
}
