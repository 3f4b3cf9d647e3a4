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

//! This module provides a [`TypeRegistry`], which is built from a document of type
//! definitions like `{ "Balance": "u128", "Foo": { "type": "struct", ... } }` and hands
//! back a [`Node`] for each type name it knows about.
//!
//! Building a registry never fails because of one bad definition: anything we can't make
//! sense of becomes a [`Node::Unresolved`] placeholder, which only errors if it is actually
//! used to encode or decode something.

use crate::builtins::predefined_nodes;
use crate::error::Error;
use crate::factory::{node_from_expression, NodeFactory, OneOfFactory};
use crate::node::{Node, TypeLookup};
use crate::resolver::{NameResolver, ResolverChain};
use crate::type_expr::{TermParser, TypeParser};
use hashbrown::{HashMap, HashSet};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::sync::Arc;

/// A registry of named types.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    // Every name we have a node for, including placeholders and nested expressions.
    types: HashMap<String, Node>,
    // Names given by the document or the override nodes.
    declared: HashSet<String>,
    // The keys of `types`, which misspelled names are resolved against.
    known: HashSet<String>,
    resolver: Arc<ResolverChain>,
}

impl TypeRegistry {
    /// A registry containing only the predefined types.
    pub fn empty() -> Self {
        TypeRegistryBuilder::default().assemble(Vec::new())
    }

    /// Configure how a registry will be built.
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// Build a registry from a JSON object of type definitions, with the default settings.
    pub fn from_json(definitions: &JsonValue) -> Result<Self, Error> {
        Self::builder().build_json(definitions)
    }

    /// Build a registry from a JSON string of type definitions, with the default settings.
    pub fn from_json_str(definitions: &str) -> Result<Self, Error> {
        Self::builder().build_str(definitions)
    }

    /// Return the node for a type name. If the name isn't known exactly, then the resolver
    /// chain is given one chance to map it onto a known name.
    pub fn node(&self, type_name: &str) -> Option<&Node> {
        if let Some(node) = self.types.get(type_name) {
            return Some(node);
        }
        let resolved = self.resolver.resolve(type_name, &self.known)?;
        tracing::trace!(type_name, %resolved, "resolved type name");
        self.types.get(&resolved)
    }

    /// Does this registry have a node for exactly this name?
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Was this name given a definition (or an override), as opposed to being a name that
    /// was only referenced by other definitions?
    pub fn declares(&self, type_name: &str) -> bool {
        self.declared.contains(type_name)
    }

    /// The names of every type given a definition (or an override).
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.declared.iter().map(|n| n.as_str())
    }

    /// The resolver used to map loosely spelled names onto known ones.
    pub fn resolver(&self) -> &Arc<ResolverChain> {
        &self.resolver
    }
}

impl TypeLookup for TypeRegistry {
    fn node(&self, type_name: &str) -> Option<&Node> {
        TypeRegistry::node(self, type_name)
    }
}

/// Configure and build a [`TypeRegistry`].
#[derive(Debug, Clone)]
pub struct TypeRegistryBuilder {
    predefined: bool,
    overrides: Vec<(String, Node)>,
    resolver: Arc<ResolverChain>,
    external_names: HashSet<String>,
}

impl Default for TypeRegistryBuilder {
    fn default() -> Self {
        TypeRegistryBuilder {
            predefined: true,
            overrides: Vec::new(),
            resolver: Arc::new(ResolverChain::default()),
            external_names: HashSet::new(),
        }
    }
}

impl TypeRegistryBuilder {
    /// Don't add the predefined nodes (primitives, hashes, `Era` and so on).
    pub fn without_predefined(mut self) -> Self {
        self.predefined = false;
        self
    }

    /// Always use this node for the given name, whatever the document says.
    pub fn with_override(mut self, type_name: impl Into<String>, node: Node) -> Self {
        self.overrides.push((type_name.into(), node));
        self
    }

    /// Use the given resolver chain to map loosely spelled names onto known ones.
    pub fn with_resolver(mut self, resolver: Arc<ResolverChain>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Names defined somewhere other than this registry, which unknown names may also be
    /// resolved to. Each successful resolution becomes a [`Node::Proxy`].
    pub fn with_external_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.external_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Build a registry from a JSON value, which must be an object of definitions.
    pub fn build_json(self, definitions: &JsonValue) -> Result<TypeRegistry, Error> {
        let obj = definitions
            .as_object()
            .ok_or_else(|| Error::InvalidDocument("type definitions must be a JSON object".into()))?;
        self.build(obj)
    }

    /// Build a registry from a JSON string.
    pub fn build_str(self, definitions: &str) -> Result<TypeRegistry, Error> {
        let json: JsonValue = serde_json::from_str(definitions)?;
        self.build_json(&json)
    }

    /// Build a registry from an object of definitions. This only fails if one of the keys
    /// is not a valid type name.
    pub fn build(self, definitions: &JsonMap<String, JsonValue>) -> Result<TypeRegistry, Error> {
        let entries = definitions
            .iter()
            .map(|(key, shape)| {
                let name = TermParser
                    .parse(&JsonValue::String(key.clone()))
                    .ok_or_else(|| Error::MalformedTypeExpression(key.clone()))?;
                Ok((name, shape))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(self.assemble(entries))
    }

    fn assemble(self, entries: Vec<(String, &JsonValue)>) -> TypeRegistry {
        let mut types: HashMap<String, Node> = HashMap::new();
        let mut declared: HashSet<String> = HashSet::new();

        // Every declared name exists, even if we fail to work out what it is.
        for (name, _) in &entries {
            types.insert(name.clone(), Node::Unresolved { type_name: name.clone() });
            declared.insert(name.clone());
        }

        for (name, shape) in &entries {
            match OneOfFactory::standard().build(name, shape) {
                Some(node) => {
                    types.insert(name.clone(), node);
                }
                None => {
                    tracing::debug!(type_name = %name, %shape, "type definition not understood; leaving it unresolved");
                }
            }
        }

        let overrides = self.predefined.then(predefined_nodes).into_iter().flatten().chain(self.overrides);
        for (name, node) in overrides {
            declared.insert(name.clone());
            types.insert(name, node);
        }

        register_nested_names(&mut types);

        // Turn any placeholders that we can resolve to something concrete into proxies.
        let candidates: HashSet<String> = types
            .iter()
            .filter(|(_, node)| !node.is_unresolved())
            .map(|(name, _)| name.clone())
            .chain(self.external_names.iter().cloned())
            .collect();
        for (name, node) in types.iter_mut() {
            if !node.is_unresolved() {
                continue;
            }
            if let Some(target) = self.resolver.resolve(name, &candidates).filter(|t| t != name) {
                tracing::debug!(type_name = %name, %target, "resolved placeholder");
                *node = Node::Proxy { type_name: name.clone(), target };
            }
        }

        let known = types.keys().cloned().collect();
        TypeRegistry { types, declared, known, resolver: self.resolver }
    }
}

// Walk every name that a node refers to, building nodes for those which are type
// expressions and leaving placeholders for the rest.
fn register_nested_names(types: &mut HashMap<String, Node>) {
    let mut pending: Vec<String> = types
        .values()
        .flat_map(|node| node.referenced_type_names())
        .map(ToOwned::to_owned)
        .collect();

    while let Some(name) = pending.pop() {
        if types.contains_key(&name) {
            continue;
        }
        let node = node_from_expression(&name).unwrap_or_else(|| Node::Unresolved { type_name: name.clone() });
        pending.extend(node.referenced_type_names().into_iter().map(ToOwned::to_owned));
        types.insert(name, node);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::node::Field;
    use serde_json::json;

    #[test]
    fn builds_definitions() {
        let types = TypeRegistry::from_json(&json!({
            "Balance": "u128",
            "Point": { "type": "struct", "type_mapping": [["x", "Balance"], ["ys", "Vec<Option<u8>>"]] },
        }))
        .unwrap();

        assert_eq!(types.node("Balance"), Some(&Node::Alias { type_name: "Balance".into(), target: "u128".into() }));
        assert_eq!(
            types.node("Point"),
            Some(&Node::Struct {
                type_name: "Point".into(),
                fields: vec![Field::new("x", "Balance"), Field::new("ys", "Vec<Option<u8>>")]
            })
        );
        // Nested expressions are registered too.
        assert_eq!(types.node("Vec<Option<u8>>"), Some(&Node::Vector { element: "Option<u8>".into() }));
        assert_eq!(types.node("Option<u8>"), Some(&Node::Option { inner: "u8".into() }));

        assert!(types.declares("Point"));
        assert!(types.declares("u8"));
        assert!(!types.declares("Option<u8>"));
        assert!(types.contains("Option<u8>"));
    }

    #[test]
    fn bad_definitions_become_placeholders() {
        let types = TypeRegistry::from_json(&json!({
            "Good": "u8",
            "Bad": { "type": "struct", "type_mapping": "nope" },
            "Missing": "Vec<Nowhere>",
        }))
        .unwrap();

        assert_eq!(types.node("Good"), Some(&Node::Alias { type_name: "Good".into(), target: "u8".into() }));
        assert_eq!(types.node("Bad"), Some(&Node::Unresolved { type_name: "Bad".into() }));
        assert_eq!(types.node("Nowhere"), Some(&Node::Unresolved { type_name: "Nowhere".into() }));
        assert!(types.declares("Bad"));
        assert!(!types.declares("Nowhere"));
    }

    #[test]
    fn bad_keys_fail_the_build() {
        assert_eq!(
            TypeRegistry::from_json(&json!({ "  ": "u8" })).unwrap_err(),
            Error::MalformedTypeExpression("  ".into())
        );
        assert!(matches!(TypeRegistry::from_json(&json!(["u8"])), Err(Error::InvalidDocument(_))));
    }

    #[test]
    fn overrides_win() {
        let types = TypeRegistry::builder()
            .with_override("Balance", Node::Primitive(crate::node::Primitive::U64))
            .build_json(&json!({ "Balance": "u128", "AccountId": "[u8; 20]" }))
            .unwrap();

        assert_eq!(types.node("Balance"), Some(&Node::Primitive(crate::node::Primitive::U64)));
        assert_eq!(types.node("AccountId"), Some(&Node::Hash { length: 32 }));

        let bare = TypeRegistry::builder().without_predefined().build_json(&json!({ "Foo": "u8" })).unwrap();
        assert_eq!(bare.node("u8"), Some(&Node::Unresolved { type_name: "u8".into() }));
    }

    #[test]
    fn placeholders_are_resolved_into_proxies() {
        let types = TypeRegistry::from_json(&json!({
            "Balance": "u128",
            "Address": "AccountId",
            "Transfer": { "type": "struct", "type_mapping": [["dest", "RawAddress"], ["memo", "balance"]] },
        }))
        .unwrap();

        assert_eq!(types.node("RawAddress"), Some(&Node::Proxy { type_name: "RawAddress".into(), target: "Address".into() }));
        assert_eq!(types.node("balance"), Some(&Node::Proxy { type_name: "balance".into(), target: "Balance".into() }));
    }

    #[test]
    fn external_names_can_be_proxied_to() {
        let types = TypeRegistry::builder()
            .with_external_names(["AccountInfo"])
            .build_json(&json!({ "Info": "<T as Trait>::AccountInfo" }))
            .unwrap();
        // `AccountInfo` is an alias target, so it's registered as a name of its own.
        assert_eq!(types.node("AccountInfo"), Some(&Node::Unresolved { type_name: "AccountInfo".into() }));

        let types = TypeRegistry::builder()
            .with_external_names(["AccountInfo"])
            .build_json(&json!({ "Info": { "type": "struct", "type_mapping": [["a", "accountinfo"]] } }))
            .unwrap();
        assert_eq!(
            types.node("accountinfo"),
            Some(&Node::Proxy { type_name: "accountinfo".into(), target: "AccountInfo".into() })
        );
    }

    #[test]
    fn misspelled_lookups_use_the_resolver() {
        let types = TypeRegistry::from_json(&json!({ "Balance": "u128" })).unwrap();
        assert_eq!(types.node("BALANCE"), types.node("Balance"));
        assert_eq!(types.node("<T as Trait>::Balance"), types.node("Balance"));
        assert_eq!(types.node("Nope"), None);

        let strict = TypeRegistry::builder()
            .with_resolver(Arc::new(ResolverChain::none()))
            .build_json(&json!({ "Balance": "u128" }))
            .unwrap();
        assert_eq!(strict.node("BALANCE"), None);
    }
}
