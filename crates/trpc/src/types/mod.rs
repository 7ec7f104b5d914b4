// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors for field tables.
//!
//! Pure data describing the shape of structural types, as produced by an
//! external IDL compiler.
//!
//! # Features
//!
//! - **TType**: wire type tags (`I08`/`BYTE` and `STRING`/`BINARY`/`UTF7` share tags)
//! - **TypeShape**: recursive field shapes (`LIST<Person>`, `MAP<STRING, I32>`)
//! - **TypeSpec / DefaultSpec**: field tables and constructor defaults
//! - **Builder API**: fluent interface producing consistent type definitions
//!
//! # Example
//!
//! ```rust
//! use trpc::types::{TypeDefBuilder, TypeShape};
//!
//! let def = TypeDefBuilder::new("addressbook", "Person")
//!     .string_field(1, "name")
//!     .list_field(2, "phones", TypeShape::STRING)
//!     .field_with_default(3, "created_at", TypeShape::I64, 0i64)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(def.spec.len(), 3);
//! assert_eq!(def.spec.get(2).unwrap().shape.to_string(), "LIST<STRING>");
//! ```

mod builder;
mod field;
mod ttype;
mod value;

pub use builder::TypeDefBuilder;
pub use field::{DefaultSpec, ElementSpec, FieldSpec, SpecError, TypeShape, TypeSpec};
pub use ttype::{MessageType, TType};
pub use value::Value;
