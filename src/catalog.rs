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

//! This module provides a [`TypeRegistryCatalog`], which composes a base [`TypeRegistry`],
//! any number of registries that apply from some runtime version onwards, and optionally a
//! registry derived from runtime metadata. Asking for a type at some version picks the right
//! registry to answer from, and remembers that choice.

use crate::decoder::DynamicDecoder;
use crate::encoder::DynamicEncoder;
use crate::error::Error;
use crate::metadata::RuntimeMetadata;
use crate::node::{Node, TypeLookup};
use crate::resolver::{NameResolver, ResolverChain};
use crate::type_registry::TypeRegistry;
use crate::value::Value;
use hashbrown::{HashMap, HashSet};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Which registry answered for some name and version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegistryChoice {
    Base,
    Versioned(u32),
    Metadata,
}

/// A composition of type registries which can answer for any runtime version.
///
/// Catalogs are immutable apart from an internal cache, and are cheap to share between
/// threads. Use [`TypeRegistryCatalog::at_version()`] to get something that the
/// [`DynamicEncoder`] and [`DynamicDecoder`] can work with.
#[derive(Debug)]
pub struct TypeRegistryCatalog {
    base: Arc<TypeRegistry>,
    versioned: Arc<BTreeMap<u32, Arc<TypeRegistry>>>,
    // Every name declared by any of the versioned registries.
    versioned_names: Arc<HashSet<String>>,
    metadata: Option<Arc<dyn RuntimeMetadata>>,
    metadata_registry: Option<Arc<TypeRegistry>>,
    resolver: Arc<ResolverChain>,
    cache: Mutex<HashMap<(String, u32), RegistryChoice>>,
}

impl TypeRegistryCatalog {
    /// A catalog with just a base registry.
    pub fn new(base: TypeRegistry) -> Self {
        let resolver = base.resolver().clone();
        TypeRegistryCatalog {
            base: Arc::new(base),
            versioned: Arc::new(BTreeMap::new()),
            versioned_names: Arc::new(HashSet::new()),
            metadata: None,
            metadata_registry: None,
            resolver,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Use these types for runtime versions from `min_version` onwards, until some later
    /// overlay declares the same name.
    pub fn with_version_overlay(mut self, min_version: u32, types: TypeRegistry) -> Self {
        Arc::make_mut(&mut self.versioned_names).extend(types.type_names().map(ToOwned::to_owned));
        Arc::make_mut(&mut self.versioned).insert(min_version, Arc::new(types));
        self.metadata_registry = self.metadata.as_deref().and_then(|m| self.build_metadata_registry(m));
        self.cache.get_mut().clear();
        self
    }

    /// Use this resolver chain when selecting a registry and for the metadata registry.
    pub fn with_resolver(mut self, resolver: Arc<ResolverChain>) -> Self {
        self.resolver = resolver;
        self.metadata_registry = self.metadata.as_deref().and_then(|m| self.build_metadata_registry(m));
        self.cache.get_mut().clear();
        self
    }

    /// Use the given runtime metadata, both for call and event encoding and as a last resort
    /// source of type names.
    pub fn with_metadata(mut self, metadata: Arc<dyn RuntimeMetadata>) -> Self {
        self.metadata_registry = self.build_metadata_registry(&*metadata);
        self.metadata = Some(metadata);
        self.cache.get_mut().clear();
        self
    }

    /// Hand back a new catalog which shares the registries of this one but uses different
    /// runtime metadata. The new catalog starts with an empty cache.
    pub fn replacing_metadata(&self, metadata: Arc<dyn RuntimeMetadata>) -> Self {
        TypeRegistryCatalog {
            base: self.base.clone(),
            versioned: self.versioned.clone(),
            versioned_names: self.versioned_names.clone(),
            metadata: None,
            metadata_registry: None,
            resolver: self.resolver.clone(),
            cache: Mutex::new(HashMap::new()),
        }
        .with_metadata(metadata)
    }

    /// Build a catalog from a document of base types and, optionally, a versioning document.
    ///
    /// The base document is either an object of type definitions or an object with such a
    /// thing under `"types"`. The versioning document looks like:
    ///
    /// ```json
    /// {
    ///     "runtime_id": 30,
    ///     "types": { "Foo": "u64" },
    ///     "versioning": [
    ///         { "runtime_range": [10, 19], "types": { "Foo": "u32" } },
    ///         { "runtime_range": [20, null], "types": { "Foo": "u64" } }
    ///     ]
    /// }
    /// ```
    ///
    /// Top level `types` apply from `runtime_id` onwards, and each `runtime_range` applies
    /// from its first version onwards. When more than one set of types lands on the same
    /// version, the first one given for each name wins.
    pub fn from_json_documents(base: &JsonValue, versioning: Option<&JsonValue>) -> Result<Self, Error> {
        let base_types = match base.get("types") {
            Some(types @ JsonValue::Object(_)) => types,
            _ => base,
        };
        let base = TypeRegistry::from_json(base_types)?;
        let mut catalog = TypeRegistryCatalog::new(base);

        let Some(versioning) = versioning else {
            return Ok(catalog);
        };
        let doc = VersioningDocument::deserialize(versioning)?;

        let mut overlays: BTreeMap<u32, JsonMap<String, JsonValue>> = BTreeMap::new();
        if !doc.types.is_empty() {
            let runtime_id = doc.runtime_id.ok_or_else(|| {
                Error::InvalidDocument("top level types need a runtime_id to apply from".into())
            })?;
            overlays.insert(runtime_id, doc.types);
        }
        for entry in doc.versioning {
            let (min_version, _max_version) = entry.runtime_range;
            let merged = overlays.entry(min_version).or_default();
            for (name, shape) in entry.types {
                merged.entry(name).or_insert(shape);
            }
        }

        let base_names: Vec<String> = catalog.base.type_names().map(ToOwned::to_owned).collect();
        for (version, types) in overlays {
            let registry = TypeRegistry::builder()
                .without_predefined()
                .with_resolver(catalog.resolver.clone())
                .with_external_names(base_names.iter().cloned())
                .build(&types)?;
            catalog = catalog.with_version_overlay(version, registry);
        }
        Ok(catalog)
    }

    /// Like [`Self::from_json_documents`], but taking JSON strings.
    pub fn from_json_str(base: &str, versioning: Option<&str>) -> Result<Self, Error> {
        let base: JsonValue = serde_json::from_str(base)?;
        let versioning: Option<JsonValue> = versioning.map(serde_json::from_str).transpose()?;
        Self::from_json_documents(&base, versioning.as_ref())
    }

    /// The runtime metadata in use, if any.
    pub fn metadata(&self) -> Option<&dyn RuntimeMetadata> {
        self.metadata.as_deref()
    }

    /// Find the node for some type name at some runtime version.
    pub fn node(&self, type_name: &str, version: u32) -> Option<&Node> {
        let key = (type_name.to_owned(), version);
        let cached = self.cache.lock().get(&key).copied();
        if let Some(choice) = cached {
            return self.registry(choice)?.node(type_name);
        }

        // Resolve without holding the lock, and keep whichever answer lands first.
        let (choice, node) = self.select(type_name, version);
        tracing::trace!(type_name, version, ?choice, "selected registry");
        self.cache.lock().entry(key).or_insert(choice);
        node
    }

    /// A view of this catalog at some version, which implements [`TypeLookup`].
    pub fn at_version(&self, version: u32) -> CatalogView<'_> {
        CatalogView { catalog: self, version }
    }

    /// Encode a value of the given type, as understood at the given version.
    pub fn encode(&self, type_name: &str, version: u32, value: &Value) -> Result<Vec<u8>, Error> {
        DynamicEncoder::encode(&self.at_version(version), type_name, value)
    }

    /// Decode bytes as the given type, as understood at the given version. All of the bytes
    /// must be used.
    pub fn decode(&self, type_name: &str, version: u32, bytes: &[u8]) -> Result<Value, Error> {
        DynamicDecoder::decode(&self.at_version(version), type_name, bytes)
    }

    /// Decode the value of a constant described by the runtime metadata.
    pub fn decode_constant(&self, module: &str, name: &str, version: u32) -> Result<Value, Error> {
        let metadata = self.metadata().ok_or(Error::MetadataUnavailable)?;
        let constant = metadata
            .constant(module, name)
            .ok_or_else(|| Error::UnknownEntry { module: module.to_owned(), name: name.to_owned() })?;
        let hex_value = constant.value.strip_prefix("0x").unwrap_or(&constant.value);
        let bytes = hex::decode(hex_value)?;
        self.decode(&constant.type_name, version, &bytes)
    }

    /// Decode a storage value, whose type is described by the runtime metadata.
    pub fn decode_storage_value(
        &self,
        module: &str,
        name: &str,
        version: u32,
        bytes: &[u8],
    ) -> Result<Value, Error> {
        let metadata = self.metadata().ok_or(Error::MetadataUnavailable)?;
        let entry = metadata
            .storage(module, name)
            .ok_or_else(|| Error::UnknownEntry { module: module.to_owned(), name: name.to_owned() })?;
        self.decode(&entry.value_type, version, bytes)
    }

    fn registry(&self, choice: RegistryChoice) -> Option<&TypeRegistry> {
        match choice {
            RegistryChoice::Base => Some(&*self.base),
            RegistryChoice::Versioned(version) => self.versioned.get(&version).map(|r| &**r),
            RegistryChoice::Metadata => self.metadata_registry.as_deref(),
        }
    }

    fn select(&self, type_name: &str, version: u32) -> (RegistryChoice, Option<&Node>) {
        let overlay_name: Option<Cow<'_, str>> = if self.versioned_names.contains(type_name) {
            Some(Cow::Borrowed(type_name))
        } else {
            self.resolver.resolve(type_name, &self.versioned_names).map(Cow::Owned)
        };

        let choice = overlay_name
            .and_then(|name| {
                self.versioned
                    .range(..=version)
                    .rev()
                    .find(|(_, registry)| registry.declares(&name))
                    .map(|(v, _)| RegistryChoice::Versioned(*v))
            })
            .unwrap_or(RegistryChoice::Base);

        let node = self.registry(choice).and_then(|r| r.node(type_name));
        if node.map_or(true, Node::is_unresolved) {
            let fallback = self
                .metadata_registry
                .as_deref()
                .and_then(|r| r.node(type_name))
                .filter(|n| !n.is_unresolved());
            if let Some(fallback) = fallback {
                return (RegistryChoice::Metadata, Some(fallback));
            }
        }
        (choice, node)
    }

    // Every type name the metadata mentions becomes an entry here. Expressions become nodes,
    // and anything else which resolves to a name in the other registries becomes a proxy.
    fn build_metadata_registry(&self, metadata: &dyn RuntimeMetadata) -> Option<Arc<TypeRegistry>> {
        let definitions: JsonMap<String, JsonValue> = metadata
            .type_names()
            .into_iter()
            .filter(|name| !name.trim().is_empty())
            .map(|name| (name.clone(), JsonValue::String(name)))
            .collect();
        let external_names = self.base.type_names().chain(self.versioned_names.iter().map(|n| n.as_str()));

        let registry = TypeRegistry::builder()
            .without_predefined()
            .with_resolver(self.resolver.clone())
            .with_external_names(external_names.map(ToOwned::to_owned).collect::<Vec<_>>())
            .build(&definitions);
        match registry {
            Ok(registry) => Some(Arc::new(registry)),
            Err(e) => {
                tracing::debug!(error = %e, "could not build a registry from the metadata type names");
                None
            }
        }
    }
}

/// A [`TypeRegistryCatalog`] fixed at some runtime version.
#[derive(Debug, Clone, Copy)]
pub struct CatalogView<'a> {
    catalog: &'a TypeRegistryCatalog,
    version: u32,
}

impl<'a> CatalogView<'a> {
    /// The catalog being viewed.
    pub fn catalog(&self) -> &'a TypeRegistryCatalog {
        self.catalog
    }

    /// The runtime version being viewed.
    pub fn version(&self) -> u32 {
        self.version
    }
}

impl TypeLookup for CatalogView<'_> {
    fn node(&self, type_name: &str) -> Option<&Node> {
        self.catalog.node(type_name, self.version)
    }
    fn metadata(&self) -> Option<&dyn RuntimeMetadata> {
        self.catalog.metadata()
    }
}

#[derive(Deserialize)]
struct VersioningDocument {
    #[serde(default)]
    runtime_id: Option<u32>,
    #[serde(default)]
    types: JsonMap<String, JsonValue>,
    #[serde(default)]
    versioning: Vec<VersionedTypes>,
}

#[derive(Deserialize)]
struct VersionedTypes {
    runtime_range: (u32, Option<u32>),
    #[serde(default)]
    types: JsonMap<String, JsonValue>,
}
