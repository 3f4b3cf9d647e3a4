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

//! This module provides the [`Error`] type handed back when building registries or when
//! encoding and decoding values.

use crate::value::Value;

/// An error building a type registry, or encoding/decoding some value.
///
/// SCALE is positional, so any codec error aborts the whole encode or decode call; there
/// is no partial result to recover.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum Error {
    #[display(fmt = "Type '{_0}' could not be resolved")]
    UnresolvedType(String),
    #[display(fmt = "Expected {expected}, but got {got}")]
    MalformedValue { expected: String, got: Value },
    #[display(fmt = "Index {index} is out of range; only {bound} entries are declared")]
    OutOfRangeIndex { index: u64, bound: usize },
    #[display(fmt = "Byte {_0} is not a valid option discriminant")]
    InvalidOptionDiscriminant(u8),
    #[display(fmt = "Byte {_0} is not a valid bool; expected 0 or 1")]
    InvalidBoolByte(u8),
    #[display(fmt = "Length {len} of zero sized items exceeds the {bound} bytes of input")]
    ZeroSizedItems { len: usize, bound: usize },
    #[display(fmt = "Needed {needed} more bytes but only {remaining} remain")]
    BufferExhausted { needed: usize, remaining: usize },
    #[display(fmt = "Could not parse the type expression '{_0}'")]
    MalformedTypeExpression(String),
    #[display(fmt = "Integer {value} does not fit into {bits} bits")]
    IntegerOutOfRange { value: String, bits: usize },
    #[display(fmt = "String bytes are not valid UTF-8")]
    InvalidUtf8,
    #[display(fmt = "Value {_0} is not a valid char")]
    InvalidChar(u32),
    #[display(fmt = "Encoded era {_0:#06x} is not valid")]
    InvalidEra(u16),
    #[display(fmt = "Compact encoding 0x{_0} is longer than it needs to be")]
    NonCanonicalCompact(String),
    #[display(fmt = "Compact encoding is not supported for '{_0}'")]
    CompactUnsupported(String),
    #[display(fmt = "Type '{_0}' nests too deeply; is there an alias cycle?")]
    RecursionLimit(String),
    #[display(fmt = "{_0} bytes were left over after decoding")]
    TrailingBytes(usize),
    #[display(fmt = "Runtime metadata is needed to encode or decode this type, but none was provided")]
    MetadataUnavailable,
    #[display(fmt = "Module '{_0}' not found in the runtime metadata")]
    UnknownModule(String),
    #[display(fmt = "Call '{module}.{call}' not found in the runtime metadata")]
    UnknownCall { module: String, call: String },
    #[display(fmt = "No call with index {call_index} in module {module_index}")]
    UnknownCallIndex { module_index: u8, call_index: u8 },
    #[display(fmt = "Event '{module}.{event}' not found in the runtime metadata")]
    UnknownEvent { module: String, event: String },
    #[display(fmt = "No event with index {event_index} in module {module_index}")]
    UnknownEventIndex { module_index: u8, event_index: u8 },
    #[display(fmt = "Constant or storage entry '{module}.{name}' not found in the runtime metadata")]
    UnknownEntry { module: String, name: String },
    #[display(fmt = "Invalid hex string: {_0}")]
    InvalidHex(String),
    #[display(fmt = "Invalid type document: {_0}")]
    InvalidDocument(String),
}

impl std::error::Error for Error {}

impl Error {
    /// Construct an [`Error::MalformedValue`] describing what was expected instead.
    pub fn malformed(expected: impl Into<String>, got: &Value) -> Self {
        Error::MalformedValue { expected: expected.into(), got: got.clone() }
    }
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::InvalidHex(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidDocument(e.to_string())
    }
}
