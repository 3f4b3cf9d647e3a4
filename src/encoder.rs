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

//! The [`DynamicEncoder`] walks a [`Value`] alongside the type graph, writing SCALE bytes.

use crate::compact;
use crate::error::Error;
use crate::node::{resolve_node, TypeLookup};
use crate::num;
use crate::value::Value;
use smallvec::SmallVec;

/// How deeply types can nest before we give up.
pub(crate) const MAX_DEPTH: usize = 128;

/// Modifiers are pushed by wrapper types and change how the next integer is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// Encode the next integer in compact form.
    Compact,
}

/// Encode values into SCALE bytes, given some [`TypeLookup`] to find the types in.
///
/// # Example
///
/// ```rust
/// use scale_type_graph::{DynamicEncoder, TypeRegistry, Value};
///
/// let types = TypeRegistry::from_json_str(r#"{ "Balance": "u128" }"#).unwrap();
///
/// let mut encoder = DynamicEncoder::new(&types);
/// encoder.append("Compact<Balance>", &Value::from(100u64)).unwrap();
/// encoder.append("(u8, bool)", &Value::array([Value::from(1u64), Value::from(true)])).unwrap();
///
/// assert_eq!(encoder.into_bytes(), vec![0x91, 0x01, 0x01, 0x01]);
/// ```
pub struct DynamicEncoder<'a, L: ?Sized> {
    lookup: &'a L,
    output: Vec<u8>,
    modifiers: SmallVec<[Modifier; 2]>,
    depth: usize,
}

impl<'a, L: TypeLookup + ?Sized> DynamicEncoder<'a, L> {
    /// Construct a new encoder which writes to an empty buffer.
    pub fn new(lookup: &'a L) -> Self {
        DynamicEncoder { lookup, output: Vec::new(), modifiers: SmallVec::new(), depth: 0 }
    }

    /// Encode a single value of the given type.
    pub fn encode(lookup: &'a L, type_name: &str, value: &Value) -> Result<Vec<u8>, Error> {
        let mut encoder = Self::new(lookup);
        encoder.append(type_name, value)?;
        Ok(encoder.into_bytes())
    }

    /// Append the encoding of a value of the given type to the output.
    pub fn append(&mut self, type_name: &str, value: &Value) -> Result<(), Error> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::RecursionLimit(type_name.to_owned()));
        }
        let lookup = self.lookup;
        let node = resolve_node(lookup, type_name)?;

        self.depth += 1;
        let res = node.encode(self, value);
        self.depth -= 1;

        if let Err(e) = &res {
            tracing::trace!(type_name, error = %e, "failed to encode value");
        }
        res
    }

    /// The bytes written so far.
    pub fn bytes(&self) -> &[u8] {
        &self.output
    }

    /// Consume the encoder, handing back the bytes written.
    pub fn into_bytes(self) -> Vec<u8> {
        self.output
    }

    /// The types being encoded with.
    pub fn lookup(&self) -> &'a L {
        self.lookup
    }

    pub(crate) fn push_modifier(&mut self, modifier: Modifier) {
        self.modifiers.push(modifier);
    }

    pub(crate) fn modifier_depth(&self) -> usize {
        self.modifiers.len()
    }

    pub(crate) fn truncate_modifiers(&mut self, depth: usize) {
        self.modifiers.truncate(depth);
    }

    // Consume a pending compact modifier, if there is one.
    fn take_compact(&mut self) -> bool {
        if self.modifiers.last() == Some(&Modifier::Compact) {
            self.modifiers.pop();
            true
        } else {
            false
        }
    }

    pub(crate) fn append_raw(&mut self, bytes: &[u8]) {
        self.output.extend_from_slice(bytes);
    }

    pub(crate) fn append_compact_len(&mut self, len: usize) {
        compact::encode_len(len, &mut self.output);
    }

    /// Append an unsigned integer `width` bytes wide, or in compact form if a compact
    /// modifier is pending.
    pub(crate) fn append_unsigned(&mut self, value: &Value, width: usize) -> Result<(), Error> {
        let n = num::from_value(value)?;
        if self.take_compact() {
            // Compact values still need to fit the underlying type.
            num::to_unsigned_bytes(&n, width)?;
            return compact::encode(&n, &mut self.output);
        }
        let bytes = num::to_unsigned_bytes(&n, width)?;
        self.output.extend_from_slice(&bytes);
        Ok(())
    }

    /// Append a two's complement signed integer `width` bytes wide.
    pub(crate) fn append_signed(&mut self, value: &Value, width: usize) -> Result<(), Error> {
        let n = num::from_value(value)?;
        if self.take_compact() {
            return Err(Error::CompactUnsupported(format!("i{}", width * 8)));
        }
        let bytes = num::to_signed_bytes(&n, width)?;
        self.output.extend_from_slice(&bytes);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::type_registry::TypeRegistry;

    fn encode(types: &TypeRegistry, name: &str, value: Value) -> Result<String, Error> {
        DynamicEncoder::encode(types, name, &value).map(hex::encode)
    }

    fn registry(json: &str) -> TypeRegistry {
        TypeRegistry::from_json_str(json).unwrap()
    }

    #[test]
    fn integers() {
        let types = TypeRegistry::empty();
        assert_eq!(encode(&types, "u8", 255u64.into()).unwrap(), "ff");
        assert_eq!(encode(&types, "u16", 258u64.into()).unwrap(), "0201");
        assert_eq!(encode(&types, "u32", Value::from("16777216")).unwrap(), "00000001");
        assert_eq!(encode(&types, "u128", 1u64.into()).unwrap(), format!("01{}", "00".repeat(15)));
        assert_eq!(encode(&types, "u256", 1u64.into()).unwrap(), format!("01{}", "00".repeat(31)));
        assert!(matches!(encode(&types, "u8", 256u64.into()), Err(Error::IntegerOutOfRange { .. })));
        assert!(matches!(encode(&types, "u8", Value::from("-1")), Err(Error::IntegerOutOfRange { .. })));
        assert!(matches!(encode(&types, "u8", Value::Bool(true)), Err(Error::MalformedValue { .. })));
    }

    #[test]
    fn signed_integers() {
        let types = TypeRegistry::empty();
        let widths = [("i8", 1), ("i16", 2), ("i32", 4), ("i64", 8), ("i128", 16), ("i256", 32)];
        for (name, width) in widths {
            assert_eq!(encode(&types, name, Value::from(-1i64)).unwrap(), "ff".repeat(width), "{name}");
            assert_eq!(encode(&types, name, Value::from(1u64)).unwrap(), format!("01{}", "00".repeat(width - 1)));
        }
        assert_eq!(encode(&types, "i8", Value::from(-128i64)).unwrap(), "80");
        assert_eq!(encode(&types, "i16", Value::from(-2i64)).unwrap(), "feff");
        assert!(encode(&types, "i8", Value::from(128u64)).is_err());
        assert_eq!(encode(&types, "Compact<i32>", Value::from(1u64)), Err(Error::CompactUnsupported("i32".into())));
    }

    #[test]
    fn compact_integers() {
        let types = registry(r#"{ "Balance": "u128", "Wrapper": { "type": "struct", "type_mapping": [["inner", "u32"]] } }"#);
        assert_eq!(encode(&types, "Compact<u32>", 64u64.into()).unwrap(), "0101");
        assert_eq!(encode(&types, "Compact<Balance>", 100u64.into()).unwrap(), "9101");
        // The modifier reaches through wrapper types to the integer inside.
        let wrapped = Value::map([("inner", Value::from(1u64))]);
        assert_eq!(encode(&types, "Compact<Wrapper>", wrapped).unwrap(), "04");
        // Only the first integer is compact.
        let tuple = Value::array([1u64.into(), 1u64.into()]);
        assert_eq!(encode(&types, "(Compact<u8>, u8)", tuple).unwrap(), "0401");
        assert!(encode(&types, "Compact<u8>", 256u64.into()).is_err());
    }

    #[test]
    fn strings_and_bools() {
        let types = TypeRegistry::empty();
        assert_eq!(encode(&types, "String", "abc".into()).unwrap(), "0c616263");
        assert_eq!(encode(&types, "bool", true.into()).unwrap(), "01");
        assert_eq!(encode(&types, "char", "a".into()).unwrap(), "61000000");
        assert!(encode(&types, "char", "ab".into()).is_err());
        assert!(encode(&types, "bool", 1u64.into()).is_err());
    }

    #[test]
    fn collections() {
        let types = TypeRegistry::empty();
        let items = Value::array([1u64.into(), 2u64.into()]);
        assert_eq!(encode(&types, "Vec<u16>", items.clone()).unwrap(), "0801000200");
        assert_eq!(encode(&types, "[u16; 2]", items.clone()).unwrap(), "01000200");
        assert!(encode(&types, "[u16; 3]", items.clone()).is_err());
        assert_eq!(encode(&types, "(u8, u16)", items.clone()).unwrap(), "010200");
        assert!(encode(&types, "(u8, u16, u32)", items).is_err());
        assert_eq!(encode(&types, "()", Value::Null).unwrap(), "");
        assert_eq!(encode(&types, "Null", Value::array([])).unwrap(), "");
    }

    #[test]
    fn options() {
        let types = TypeRegistry::empty();
        assert_eq!(encode(&types, "Option<u8>", Value::Null).unwrap(), "00");
        assert_eq!(encode(&types, "Option<u8>", 5u64.into()).unwrap(), "0105");
        assert_eq!(encode(&types, "Option<bool>", false.into()).unwrap(), "00");
        assert_eq!(encode(&types, "Option<bool>", true.into()).unwrap(), "01");
        assert_eq!(encode(&types, "Option<bool>", Value::Null).unwrap(), "02");
        assert_eq!(encode(&types, "Option<Option<u8>>", Value::Null).unwrap(), "00");
        assert_eq!(encode(&types, "Option<Option<u8>>", Value::array([Value::Null])).unwrap(), "0100");
        assert_eq!(encode(&types, "Option<Option<u8>>", Value::array([5u64.into()])).unwrap(), "010105");
    }

    #[test]
    fn aliases_encode_like_their_targets() {
        let types = registry(r#"{ "A": "u32", "B": "A", "C": "Vec<B>" }"#);
        assert_eq!(encode(&types, "B", 7u64.into()).unwrap(), encode(&types, "A", 7u64.into()).unwrap());
        assert_eq!(encode(&types, "B", 7u64.into()).unwrap(), "07000000");
        let items = Value::array([1u64.into()]);
        assert_eq!(encode(&types, "C", items.clone()).unwrap(), encode(&types, "Vec<u32>", items).unwrap());
    }

    #[test]
    fn optional_bools_through_aliases() {
        let types = registry(r#"{ "Flag": "bool", "Switch": "Flag" }"#);
        assert_eq!(encode(&types, "Option<Switch>", Value::Null).unwrap(), "02");
        assert_eq!(encode(&types, "Option<Switch>", true.into()).unwrap(), "01");
    }

    #[test]
    fn structs_and_enums() {
        let types = registry(
            r#"{
                "Point": { "type": "struct", "type_mapping": [["x", "u8"], ["y", "u8"]] },
                "Shape": { "type": "enum", "type_mapping": [["Empty", "Null"], ["Dot", "Point"]] },
                "Color": { "type": "enum", "value_list": ["Red", "Green"] },
                "Never": { "type": "enum", "type_mapping": [] }
            }"#,
        );
        let point = Value::map([("y", Value::from(2u64)), ("x", Value::from(1u64))]);
        assert_eq!(encode(&types, "Point", point.clone()).unwrap(), "0102");
        assert!(encode(&types, "Point", Value::map([("x", Value::from(1u64))])).is_err());

        assert_eq!(encode(&types, "Shape", Value::array(["Empty".into(), Value::Null])).unwrap(), "00");
        assert_eq!(encode(&types, "Shape", Value::array(["Dot".into(), point.clone()])).unwrap(), "010102");
        assert_eq!(encode(&types, "Shape", Value::array([1u64.into(), point])).unwrap(), "010102");
        assert_eq!(
            encode(&types, "Shape", Value::array([2u64.into(), Value::Null])),
            Err(Error::OutOfRangeIndex { index: 2, bound: 2 })
        );
        assert_eq!(
            encode(&types, "Never", Value::array([0u64.into(), Value::Null])),
            Err(Error::OutOfRangeIndex { index: 0, bound: 0 })
        );

        assert_eq!(encode(&types, "Color", "Green".into()).unwrap(), "01");
        assert_eq!(encode(&types, "Color", 0u64.into()).unwrap(), "00");
        assert!(encode(&types, "Color", "Blue".into()).is_err());
    }

    #[test]
    fn unknown_types_fail_when_used() {
        let types = registry(r#"{ "Broken": { "type": "mystery" } }"#);
        assert_eq!(encode(&types, "Broken", Value::Null), Err(Error::UnresolvedType("Broken".into())));
        assert_eq!(encode(&types, "Nope", Value::Null), Err(Error::UnresolvedType("Nope".into())));
    }

    #[test]
    fn recursion_is_bounded() {
        let types = registry(r#"{ "Loop": { "type": "struct", "type_mapping": [["inner", "Loop"]] } }"#);
        let mut value = Value::Null;
        for _ in 0..(MAX_DEPTH + 1) {
            value = Value::map([("inner", value)]);
        }
        assert!(matches!(encode(&types, "Loop", value), Err(Error::RecursionLimit(_))));
    }
}
