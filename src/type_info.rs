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

//! This module implements [`scale_type_resolver::TypeResolver`] for [`TypeRegistry`] and
//! [`CatalogView`], so that the shape of any type in the graph can be handed to crates like
//! `scale-decode` and `scale-encode`. Type IDs are type names.
//!
//! Nodes whose encoding depends on runtime logic rather than shape (`Era`, `Data`, calls
//! and events) are reported as not found.

use crate::catalog::CatalogView;
use crate::error::Error;
use crate::node::{resolve_node, Node, TypeLookup, MAX_ALIAS_HOPS};
use crate::type_registry::TypeRegistry;
use scale_type_resolver::{
    BitsOrderFormat, BitsStoreFormat, Field, ResolvedTypeVisitor, TypeResolver, Variant,
};
use std::borrow::Cow;

impl TypeResolver for TypeRegistry {
    type TypeId = String;
    type Error = Error;

    fn resolve_type<'this, V: ResolvedTypeVisitor<'this, TypeId = Self::TypeId>>(
        &'this self,
        type_id: Self::TypeId,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        resolve_type(self, type_id, visitor)
    }
}

impl TypeResolver for CatalogView<'_> {
    type TypeId = String;
    type Error = Error;

    fn resolve_type<'this, V: ResolvedTypeVisitor<'this, TypeId = Self::TypeId>>(
        &'this self,
        type_id: Self::TypeId,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        resolve_type(self, type_id, visitor)
    }
}

/// Describe the named type to the visitor, following aliases, proxies and numeric sets
/// through to the type that actually determines the shape.
pub fn resolve_type<'this, L, V>(lookup: &'this L, type_id: String, visitor: V) -> Result<V::Value, Error>
where
    L: TypeLookup + ?Sized,
    V: ResolvedTypeVisitor<'this, TypeId = String>,
{
    let mut type_name = type_id;
    for _ in 0..MAX_ALIAS_HOPS {
        let node = match resolve_node(lookup, &type_name) {
            Ok(node) => node,
            Err(Error::UnresolvedType(_)) => return Ok(visitor.visit_not_found()),
            Err(e) => return Err(e),
        };

        let node = match node {
            Cow::Borrowed(node) => node,
            // Expression nodes only ever refer to other types by name.
            Cow::Owned(node) => return Ok(visit_anonymous(&node, visitor).unwrap_or_else(|v| v.visit_not_found())),
        };

        type_name = match node {
            Node::Alias { target, .. } | Node::Proxy { target, .. } => target.clone(),
            Node::NumericSet { value_type, .. } => value_type.clone(),
            _ => {
                return Ok(match visit_anonymous(node, visitor) {
                    Ok(value) => value,
                    Err(visitor) => visit_named(node, visitor),
                })
            }
        };
    }
    Err(Error::RecursionLimit(type_name))
}

// Shapes which carry no names of their own. If the node isn't one of these, the visitor
// is handed back.
fn visit_anonymous<'this, V>(node: &Node, visitor: V) -> Result<V::Value, V>
where
    V: ResolvedTypeVisitor<'this, TypeId = String>,
{
    let value = match node {
        Node::Primitive(primitive) => visitor.visit_primitive(*primitive),
        Node::Null => visitor.visit_tuple(core::iter::empty()),
        Node::Vector { element } => visitor.visit_sequence(core::iter::empty(), element.clone()),
        Node::FixedArray { element, length } => visitor.visit_array(element.clone(), *length),
        Node::Compact { inner } => visitor.visit_compact(inner.clone()),
        Node::Tuple { components } => visitor.visit_tuple(components.iter().cloned()),
        Node::Option { inner } => {
            let variants = [
                Variant { index: 0, name: "None", fields: Vec::new().into_iter() },
                Variant { index: 1, name: "Some", fields: vec![Field { name: None, id: inner.clone() }].into_iter() },
            ];
            visitor.visit_variant(core::iter::once("Option"), variants.into_iter())
        }
        Node::Bytes => visitor.visit_sequence(core::iter::empty(), "u8".to_owned()),
        Node::Hash { length } => visitor.visit_array("u8".to_owned(), *length),
        Node::BitVec => visitor.visit_bit_sequence(BitsStoreFormat::U8, BitsOrderFormat::Lsb0),
        _ => return Err(visitor),
    };
    Ok(value)
}

fn visit_named<'this, V>(node: &'this Node, visitor: V) -> V::Value
where
    V: ResolvedTypeVisitor<'this, TypeId = String>,
{
    match node {
        Node::Struct { type_name, fields } => {
            let fields = fields.iter().map(|f| Field { name: Some(f.name.as_str()), id: f.type_name.clone() });
            visitor.visit_composite(core::iter::once(type_name.as_str()), fields)
        }
        Node::Enum { type_name, variants } => {
            let variants = variants.iter().zip(0..=u8::MAX).map(|(v, index)| Variant {
                index,
                name: v.name.as_str(),
                fields: has_payload(&v.type_name).then(|| Field { name: None, id: v.type_name.clone() }).into_iter(),
            });
            visitor.visit_variant(core::iter::once(type_name.as_str()), variants)
        }
        Node::EnumValues { type_name, values } => {
            let variants = values.iter().zip(0..=u8::MAX).map(|(name, index)| Variant {
                index,
                name: name.as_str(),
                fields: core::iter::empty::<Field<'this, String>>(),
            });
            visitor.visit_variant(core::iter::once(type_name.as_str()), variants)
        }
        _ => visitor.visit_not_found(),
    }
}

fn has_payload(type_name: &str) -> bool {
    !matches!(type_name.trim(), "Null" | "()")
}
