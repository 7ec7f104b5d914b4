// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural types and their instances.
//!
//! A [`StructType`] is synthesized once per `(namespace, name)` from a
//! [`TypeDef`] and cached in a [`StructRegistry`]. Instances are
//! [`Payload`]s: field bags with constructor defaults, structural equality
//! and a readable representation.
//!
//! # Example
//!
//! ```rust
//! use trpc::payload::StructRegistry;
//! use trpc::types::{TypeDefBuilder, TypeShape, Value};
//!
//! let registry = StructRegistry::new();
//! let person = registry
//!     .synthesize(
//!         TypeDefBuilder::new("addressbook", "Person")
//!             .string_field(1, "name")
//!             .list_field(2, "phones", TypeShape::STRING)
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let bob = person.construct(vec!["Bob".into()]).unwrap();
//! assert_eq!(bob.get("name").unwrap(), &Value::from("Bob"));
//! assert_eq!(bob.to_string(), "Person(name=\"Bob\", phones=None)");
//! ```

mod instance;
mod registry;
#[cfg(feature = "persistence")]
mod state;
mod struct_type;
mod validate;

pub use instance::{InstanceId, Payload, PayloadError, Thrown};
pub use registry::{global, RegistryError, StructRegistry};
#[cfg(feature = "persistence")]
pub use state::{PayloadState, PersistError, StateValue};
pub use struct_type::{StorageMode, StructKind, StructType, TypeDef, TypeKey};
pub use validate::{check_field, matches_shape, DecodeError};
