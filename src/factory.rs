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

//! Node factories turn a type definition (a string expression or a structured JSON
//! description) into a [`Node`]. Each factory pairs one parser from [`crate::type_expr`]
//! with the node it builds, and [`OneOfFactory`] tries a list of them in priority order.

use crate::node::{Field, Node};
use crate::noise;
use crate::type_expr::{
    ComponentsParser, EnumValuesParser, FixedArrayParser, MappingParser, NumericSetParser,
    RegexParser, TermParser, TypeParser,
};
use serde_json::Value as JsonValue;
use std::sync::LazyLock;

/// Build a [`Node`] for some named type given its definition.
pub trait NodeFactory: Send + Sync {
    /// Return a node if the definition is in a shape this factory understands.
    fn build(&self, type_name: &str, shape: &JsonValue) -> Option<Node>;
}

/// Builds [`Node::Struct`]s from `{ "type": "struct", "type_mapping": [...] }`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructFactory;

impl NodeFactory for StructFactory {
    fn build(&self, type_name: &str, shape: &JsonValue) -> Option<Node> {
        let fields = MappingParser::structure().parse(shape)?;
        Some(Node::Struct { type_name: type_name.to_owned(), fields: to_fields(fields) })
    }
}

/// Builds [`Node::Enum`]s from `{ "type": "enum", "type_mapping": [...] }`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumFactory;

impl NodeFactory for EnumFactory {
    fn build(&self, type_name: &str, shape: &JsonValue) -> Option<Node> {
        let variants = MappingParser::enumeration().parse(shape)?;
        Some(Node::Enum { type_name: type_name.to_owned(), variants: to_fields(variants) })
    }
}

/// Builds [`Node::EnumValues`]s from `{ "type": "enum", "value_list": [...] }`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumValuesFactory;

impl NodeFactory for EnumValuesFactory {
    fn build(&self, type_name: &str, shape: &JsonValue) -> Option<Node> {
        let values = EnumValuesParser.parse(shape)?;
        Some(Node::EnumValues { type_name: type_name.to_owned(), values })
    }
}

/// Builds [`Node::NumericSet`]s from `{ "type": "set", ... }`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericSetFactory;

impl NodeFactory for NumericSetFactory {
    fn build(&self, type_name: &str, shape: &JsonValue) -> Option<Node> {
        let (value_type, flags) = NumericSetParser.parse(shape)?;
        Some(Node::NumericSet { type_name: type_name.to_owned(), value_type, flags })
    }
}

/// Builds [`Node::Tuple`]s from expressions like `(A, B)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TupleFactory;

impl NodeFactory for TupleFactory {
    fn build(&self, _type_name: &str, shape: &JsonValue) -> Option<Node> {
        let components = ComponentsParser::tuple().parse(shape)?;
        Some(Node::Tuple { components: components.into_iter().map(|c| noise::filter(&c)).collect() })
    }
}

/// Builds [`Node::FixedArray`]s from expressions like `[T; N]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedArrayFactory;

impl NodeFactory for FixedArrayFactory {
    fn build(&self, _type_name: &str, shape: &JsonValue) -> Option<Node> {
        let (element, length) = FixedArrayParser.parse(shape)?;
        Some(Node::FixedArray { element, length })
    }
}

/// Builds [`Node::Vector`]s from expressions like `Vec<T>`.
#[derive(Debug, Clone)]
pub struct VectorFactory {
    parser: RegexParser,
}

impl Default for VectorFactory {
    fn default() -> Self {
        VectorFactory { parser: RegexParser::vector() }
    }
}

impl NodeFactory for VectorFactory {
    fn build(&self, _type_name: &str, shape: &JsonValue) -> Option<Node> {
        let element = self.parser.parse(shape)?;
        // Byte vectors decode to hex however they're spelled.
        if element.trim() == "u8" {
            return Some(Node::Bytes);
        }
        Some(Node::Vector { element })
    }
}

/// Builds [`Node::Option`]s from expressions like `Option<T>`.
#[derive(Debug, Clone)]
pub struct OptionFactory {
    parser: RegexParser,
}

impl Default for OptionFactory {
    fn default() -> Self {
        OptionFactory { parser: RegexParser::option() }
    }
}

impl NodeFactory for OptionFactory {
    fn build(&self, _type_name: &str, shape: &JsonValue) -> Option<Node> {
        let inner = self.parser.parse(shape)?;
        Some(Node::Option { inner })
    }
}

/// Builds [`Node::Compact`]s from expressions like `Compact<T>`.
#[derive(Debug, Clone)]
pub struct CompactFactory {
    parser: RegexParser,
}

impl Default for CompactFactory {
    fn default() -> Self {
        CompactFactory { parser: RegexParser::compact() }
    }
}

impl NodeFactory for CompactFactory {
    fn build(&self, _type_name: &str, shape: &JsonValue) -> Option<Node> {
        let inner = self.parser.parse(shape)?;
        Some(Node::Compact { inner })
    }
}

/// Builds [`Node::Alias`]es from any other plain type name. This matches any non-empty
/// string, so it belongs at the end of a factory list.
#[derive(Debug, Clone, Copy, Default)]
pub struct AliasFactory;

impl NodeFactory for AliasFactory {
    fn build(&self, type_name: &str, shape: &JsonValue) -> Option<Node> {
        let target = noise::filter(&TermParser.parse(shape)?);
        // A name aliasing itself would loop forever.
        if target.is_empty() || target == type_name {
            return None;
        }
        Some(Node::Alias { type_name: type_name.to_owned(), target })
    }
}

/// Try each of a list of factories in order, returning the first node built.
pub struct OneOfFactory {
    factories: Vec<Box<dyn NodeFactory>>,
}

impl OneOfFactory {
    /// Construct a new factory from a list of others.
    pub fn new(factories: Vec<Box<dyn NodeFactory>>) -> Self {
        OneOfFactory { factories }
    }

    /// The factories used to build named type definitions: every structured and expression
    /// form, with [`AliasFactory`] as the catch-all.
    pub fn standard() -> &'static OneOfFactory {
        static STANDARD: LazyLock<OneOfFactory> = LazyLock::new(|| {
            let mut factories = expression_factories();
            factories.push(Box::new(AliasFactory));
            OneOfFactory::new(factories)
        });
        &STANDARD
    }

    /// The factories used for bare type expressions like `Vec<u8>`. Unlike [`Self::standard`]
    /// this will not treat an arbitrary name as an alias.
    pub fn expressions() -> &'static OneOfFactory {
        static EXPRESSIONS: LazyLock<OneOfFactory> =
            LazyLock::new(|| OneOfFactory::new(expression_factories()));
        &EXPRESSIONS
    }
}

impl NodeFactory for OneOfFactory {
    fn build(&self, type_name: &str, shape: &JsonValue) -> Option<Node> {
        self.factories.iter().find_map(|f| f.build(type_name, shape))
    }
}

impl core::fmt::Debug for OneOfFactory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OneOfFactory").field("factories", &self.factories.len()).finish()
    }
}

/// Build a node for a type name which is itself a type expression, like `Vec<u32>`,
/// `(A, B)` or `[u8; 4]`. Returns `None` for plain names.
pub fn node_from_expression(type_name: &str) -> Option<Node> {
    OneOfFactory::expressions().build(type_name, &JsonValue::String(type_name.to_owned()))
}

fn expression_factories() -> Vec<Box<dyn NodeFactory>> {
    vec![
        Box::new(StructFactory),
        Box::new(EnumFactory),
        Box::new(EnumValuesFactory),
        Box::new(NumericSetFactory),
        Box::new(TupleFactory),
        Box::new(FixedArrayFactory),
        Box::new(VectorFactory::default()),
        Box::new(OptionFactory::default()),
        Box::new(CompactFactory::default()),
    ]
}

fn to_fields(pairs: Vec<(String, String)>) -> Vec<Field> {
    pairs.into_iter().map(|(name, ty)| Field::new(name, noise::filter(&ty))).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn build(name: &str, shape: JsonValue) -> Option<Node> {
        OneOfFactory::standard().build(name, &shape)
    }

    #[test]
    fn builds_each_shape() {
        assert_eq!(
            build("Foo", json!({ "type": "struct", "type_mapping": [["a", "u8"], ["b", "T::Balance"]] })),
            Some(Node::Struct {
                type_name: "Foo".into(),
                fields: vec![Field::new("a", "u8"), Field::new("b", "Balance")]
            })
        );
        assert_eq!(
            build("Foo", json!({ "type": "enum", "type_mapping": [["A", "Null"], ["B", "u32"]] })),
            Some(Node::Enum {
                type_name: "Foo".into(),
                variants: vec![Field::new("A", "Null"), Field::new("B", "u32")]
            })
        );
        assert_eq!(
            build("Foo", json!({ "type": "enum", "value_list": ["A", "B"] })),
            Some(Node::EnumValues { type_name: "Foo".into(), values: vec!["A".into(), "B".into()] })
        );
        assert_eq!(
            build("Foo", json!("(u8, Vec<u16>)")),
            Some(Node::Tuple { components: vec!["u8".into(), "Vec<u16>".into()] })
        );
        assert_eq!(
            build("Foo", json!("[u8; 4]")),
            Some(Node::FixedArray { element: "u8".into(), length: 4 })
        );
        assert_eq!(build("Foo", json!("Vec<u8>")), Some(Node::Bytes));
        assert_eq!(build("Foo", json!("Vec<u16>")), Some(Node::Vector { element: "u16".into() }));
        assert_eq!(build("Foo", json!("Option<u8>")), Some(Node::Option { inner: "u8".into() }));
        assert_eq!(build("Foo", json!("Compact<u8>")), Some(Node::Compact { inner: "u8".into() }));
        assert_eq!(
            build("Foo", json!("T::Bar")),
            Some(Node::Alias { type_name: "Foo".into(), target: "Bar".into() })
        );
    }

    #[test]
    fn nothing_aliases_itself() {
        assert_eq!(build("Foo", json!("Foo")), None);
        assert_eq!(build("Foo", json!("T::Foo")), None);
        assert_eq!(build("Foo", json!("")), None);
    }

    #[test]
    fn expressions_dont_alias() {
        assert_eq!(node_from_expression("Balance"), None);
        assert_eq!(
            node_from_expression("Vec<(u8, bool)>"),
            Some(Node::Vector { element: "(u8, bool)".into() })
        );
    }
}
