// Copyright (C) 2024 Parity Technologies (UK) Ltd. (admin@parity.io)
// This file is a part of the scale-type-graph crate.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//         http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! This crate encodes and decodes SCALE bytes against a graph of types which is only known
//! at runtime, described by JSON documents of type definitions like those used for historic
//! (pre-V14 metadata) Substrate chains.
//!
//! The pieces fit together like so:
//!
//! - A [`TypeRegistry`] is built from a document of definitions like
//!   `{ "Balance": "u128", "Foo": { "type": "struct", "type_mapping": [...] } }`. Each
//!   definition becomes a [`Node`], and names which can't be made sense of become placeholders
//!   which only error when used.
//! - A [`TypeRegistryCatalog`] composes a base registry with registries that apply from some
//!   runtime version onwards, and with types named by [`RuntimeMetadata`].
//! - A [`DynamicEncoder`] and [`DynamicDecoder`] turn [`Value`]s into bytes and back, looking
//!   up every nested type name through a [`TypeLookup`] like a registry or a
//!   [`CatalogView`].
//!
//! ```rust
//! use scale_type_graph::{TypeRegistryCatalog, Value};
//!
//! let catalog = TypeRegistryCatalog::from_json_str(
//!     r#"{ "types": { "Balance": "u64" } }"#,
//!     Some(r#"{ "versioning": [{ "runtime_range": [100, null], "types": { "Balance": "u128" } }] }"#),
//! )
//! .unwrap();
//!
//! let transfer = Value::array([Value::from(1u64), Value::from(true)]);
//! assert_eq!(catalog.encode("(Compact<Balance>, bool)", 1, &transfer).unwrap(), vec![4, 1]);
//! assert_eq!(catalog.encode("Balance", 1, &Value::from(1u64)).unwrap().len(), 8);
//! assert_eq!(catalog.encode("Balance", 100, &Value::from(1u64)).unwrap().len(), 16);
//! ```
//!
//! Registries and catalog views also implement [`scale_type_resolver::TypeResolver`], so the
//! same type information can be used with crates like
//! [`scale-decode`](https://github.com/paritytech/scale-decode).

#![deny(missing_docs)]

mod builtins;
mod compact;
mod noise;
mod num;

pub mod catalog;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod factory;
pub mod metadata;
pub mod node;
pub mod resolver;
pub mod type_expr;
pub mod type_info;
pub mod type_registry;
pub mod value;

#[cfg(test)]
mod test_utils;

// Export the main types here for ease of use:
pub use {
    catalog::{CatalogView, TypeRegistryCatalog},
    decoder::DynamicDecoder,
    encoder::{DynamicEncoder, Modifier},
    error::Error,
    metadata::{RuntimeMetadata, StaticMetadata},
    node::{Field, Node, TypeLookup},
    resolver::{NameResolver, ResolverChain},
    type_registry::{TypeRegistry, TypeRegistryBuilder},
    value::Value,
};
