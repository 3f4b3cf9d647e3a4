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

//! Runtime metadata, as far as this crate needs it: the modules of a runtime, and the calls,
//! events, storage entries and constants of each, described by type name. Anything that can
//! produce a list of [`ModuleMetadata`] can implement [`RuntimeMetadata`]; [`StaticMetadata`]
//! is a simple implementation which can be deserialized from JSON.

use serde::{Deserialize, Serialize};

/// A named argument to a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentMetadata {
    /// Argument name.
    pub name: String,
    /// Type name of the argument.
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A callable function in some module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallMetadata {
    /// Call name.
    pub name: String,
    /// Arguments, in encoding order.
    #[serde(default)]
    pub args: Vec<ArgumentMetadata>,
}

/// An event that some module can emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Event name.
    pub name: String,
    /// Type names of each argument, in encoding order.
    #[serde(default)]
    pub args: Vec<String>,
}

/// A storage entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageMetadata {
    /// Entry name.
    pub name: String,
    /// Type names of the keys, if this is a map.
    #[serde(default)]
    pub key_types: Vec<String>,
    /// Type name of the stored value.
    pub value_type: String,
}

/// A constant, along with its SCALE encoded value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantMetadata {
    /// Constant name.
    pub name: String,
    /// Type name of the value.
    #[serde(rename = "type")]
    pub type_name: String,
    /// The `0x` prefixed hex encoded value.
    pub value: String,
}

/// A single module (pallet) of the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    /// Module name.
    pub name: String,
    /// The index of the module, as used in call and event encoding.
    pub index: u8,
    /// Calls, in index order.
    #[serde(default)]
    pub calls: Vec<CallMetadata>,
    /// Events, in index order.
    #[serde(default)]
    pub events: Vec<EventMetadata>,
    /// Storage entries.
    #[serde(default)]
    pub storage: Vec<StorageMetadata>,
    /// Constants.
    #[serde(default)]
    pub constants: Vec<ConstantMetadata>,
}

/// A signed extension included in extrinsics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedExtensionMetadata {
    /// Extension name, like `CheckNonce`.
    pub identifier: String,
    /// The type of the extra data it adds to an extrinsic, if any.
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
}

/// Runtime metadata that the type catalog and the call and event nodes query.
pub trait RuntimeMetadata: Send + Sync + core::fmt::Debug {
    /// Every module of the runtime.
    fn modules(&self) -> &[ModuleMetadata];

    /// The signed extensions of the runtime.
    fn signed_extensions(&self) -> &[SignedExtensionMetadata];

    /// Find a module by name.
    fn module(&self, name: &str) -> Option<&ModuleMetadata> {
        self.modules().iter().find(|m| m.name == name)
    }

    /// The index of the named module.
    fn module_index(&self, name: &str) -> Option<u8> {
        self.module(name).map(|m| m.index)
    }

    /// The name of the module with the given index.
    fn module_name(&self, index: u8) -> Option<&str> {
        self.modules().iter().find(|m| m.index == index).map(|m| m.name.as_str())
    }

    /// Find a call by module and call name, returning its index within the module too.
    fn call(&self, module: &str, call: &str) -> Option<(u8, &CallMetadata)> {
        let (idx, call) = self.module(module)?.calls.iter().enumerate().find(|(_, c)| c.name == call)?;
        Some((u8::try_from(idx).ok()?, call))
    }

    /// The index of a call within its module.
    fn call_index(&self, module: &str, call: &str) -> Option<u8> {
        self.call(module, call).map(|(idx, _)| idx)
    }

    /// Find a call by module index and call index.
    fn call_by_module_index(&self, module_index: u8, call_index: u8) -> Option<&CallMetadata> {
        let module = self.modules().iter().find(|m| m.index == module_index)?;
        module.calls.get(usize::from(call_index))
    }

    /// Find an event by module and event name, returning its index within the module too.
    fn event(&self, module: &str, event: &str) -> Option<(u8, &EventMetadata)> {
        let (idx, event) = self.module(module)?.events.iter().enumerate().find(|(_, e)| e.name == event)?;
        Some((u8::try_from(idx).ok()?, event))
    }

    /// Find an event by module index and event index.
    fn event_by_module_index(&self, module_index: u8, event_index: u8) -> Option<&EventMetadata> {
        let module = self.modules().iter().find(|m| m.index == module_index)?;
        module.events.get(usize::from(event_index))
    }

    /// Find a storage entry.
    fn storage(&self, module: &str, name: &str) -> Option<&StorageMetadata> {
        self.module(module)?.storage.iter().find(|s| s.name == name)
    }

    /// Find a constant.
    fn constant(&self, module: &str, name: &str) -> Option<&ConstantMetadata> {
        self.module(module)?.constants.iter().find(|c| c.name == name)
    }

    /// The type of extra data that the named signed extension adds, if any.
    fn signed_extension_type(&self, identifier: &str) -> Option<&str> {
        self.signed_extensions().iter().find(|e| e.identifier == identifier)?.type_name.as_deref()
    }

    /// Every type name mentioned anywhere in the metadata, deduplicated and sorted.
    fn type_names(&self) -> Vec<String> {
        let modules = self.modules();
        let mut names: Vec<String> = modules
            .iter()
            .flat_map(|m| {
                let calls = m.calls.iter().flat_map(|c| c.args.iter().map(|a| a.type_name.clone()));
                let events = m.events.iter().flat_map(|e| e.args.iter().cloned());
                let storage = m
                    .storage
                    .iter()
                    .flat_map(|s| s.key_types.iter().cloned().chain(core::iter::once(s.value_type.clone())));
                let constants = m.constants.iter().map(|c| c.type_name.clone());
                calls.chain(events).chain(storage).chain(constants)
            })
            .chain(self.signed_extensions().iter().filter_map(|e| e.type_name.clone()))
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Runtime metadata held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticMetadata {
    /// The modules.
    #[serde(default)]
    pub modules: Vec<ModuleMetadata>,
    /// The signed extensions.
    #[serde(default)]
    pub signed_extensions: Vec<SignedExtensionMetadata>,
}

impl StaticMetadata {
    /// Deserialize metadata from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(json)?)
    }
}

impl RuntimeMetadata for StaticMetadata {
    fn modules(&self) -> &[ModuleMetadata] {
        &self.modules
    }
    fn signed_extensions(&self) -> &[SignedExtensionMetadata] {
        &self.signed_extensions
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// A small runtime, used in tests around the crate.
    pub(crate) fn sample_metadata() -> StaticMetadata {
        StaticMetadata::from_json_str(
            r#"{
                "modules": [
                    {
                        "name": "System",
                        "index": 0,
                        "calls": [
                            { "name": "remark", "args": [{ "name": "remark", "type": "Bytes" }] }
                        ],
                        "events": [
                            { "name": "ExtrinsicSuccess", "args": ["DispatchInfo"] }
                        ],
                        "storage": [
                            { "name": "Number", "value_type": "BlockNumber" }
                        ],
                        "constants": [
                            { "name": "BlockHashCount", "type": "BlockNumber", "value": "0x60090000" }
                        ]
                    },
                    {
                        "name": "Balances",
                        "index": 5,
                        "calls": [
                            {
                                "name": "transfer",
                                "args": [
                                    { "name": "dest", "type": "AccountId" },
                                    { "name": "value", "type": "Compact<Balance>" }
                                ]
                            },
                            { "name": "set_balance", "args": [] }
                        ],
                        "events": [
                            { "name": "Transfer", "args": ["AccountId", "AccountId", "Balance"] }
                        ]
                    }
                ],
                "signed_extensions": [
                    { "identifier": "CheckNonce", "type": "Compact<Index>" },
                    { "identifier": "CheckGenesis" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn lookups() {
        let metadata = sample_metadata();
        assert_eq!(metadata.module_index("Balances"), Some(5));
        assert_eq!(metadata.module_name(0), Some("System"));
        assert_eq!(metadata.call_index("Balances", "set_balance"), Some(1));
        assert_eq!(metadata.call_by_module_index(5, 0).map(|c| c.name.as_str()), Some("transfer"));
        assert!(metadata.call_by_module_index(5, 2).is_none());
        assert_eq!(metadata.event("Balances", "Transfer").map(|(idx, _)| idx), Some(0));
        assert_eq!(metadata.storage("System", "Number").map(|s| s.value_type.as_str()), Some("BlockNumber"));
        assert_eq!(metadata.signed_extension_type("CheckNonce"), Some("Compact<Index>"));
        assert_eq!(metadata.signed_extension_type("CheckGenesis"), None);
    }

    #[test]
    fn collects_type_names() {
        assert_eq!(
            sample_metadata().type_names(),
            vec![
                "AccountId",
                "Balance",
                "BlockNumber",
                "Bytes",
                "Compact<Balance>",
                "Compact<Index>",
                "DispatchInfo",
            ]
        );
    }
}
