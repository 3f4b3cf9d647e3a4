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

//! This module provides [`Node`], which describes how to SCALE encode and decode one named
//! type. Nodes never point at each other directly; any node that needs another type holds its
//! name, and that name is looked up (via a [`TypeLookup`]) each time a value is encoded or
//! decoded. The type graph is therefore just a map from names to nodes, and cycles like
//! `A -> Vec<B>`, `B -> Option<A>` need no special handling.

use crate::builtins;
use crate::decoder::DynamicDecoder;
use crate::encoder::{DynamicEncoder, Modifier};
use crate::error::Error;
use crate::factory;
use crate::metadata::RuntimeMetadata;
use crate::value::Value;
use std::borrow::Cow;

pub use scale_type_resolver::Primitive;

/// How many aliases or proxies we'll follow in a row when peeking at what a type resolves to.
pub(crate) const MAX_ALIAS_HOPS: usize = 32;

/// Something that can hand back the [`Node`] for a type name. Nodes call back into this
/// (via the encoder or decoder) to find the nodes for any nested types.
pub trait TypeLookup {
    /// Return the node for the given type name, if one is known.
    fn node(&self, type_name: &str) -> Option<&Node>;

    /// Runtime metadata, needed by nodes like [`Node::GenericCall`].
    fn metadata(&self) -> Option<&dyn RuntimeMetadata> {
        None
    }
}

impl<T: TypeLookup + ?Sized> TypeLookup for &T {
    fn node(&self, type_name: &str) -> Option<&Node> {
        (**self).node(type_name)
    }
    fn metadata(&self) -> Option<&dyn RuntimeMetadata> {
        (**self).metadata()
    }
}

/// A named field of a struct, or a named variant of an enum along with the type of
/// its associated data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// The field or variant name.
    pub name: String,
    /// The name of the type of the field, or of the variant's associated data.
    pub type_name: String,
}

impl Field {
    /// Construct a new field.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Field { name: name.into(), type_name: type_name.into() }
    }
}

/// One codec unit in the type graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Fixed width integers, `bool`, `char` and strings.
    Primitive(Primitive),
    /// The empty type `()`; encodes to nothing.
    Null,
    /// A compact length followed by that many elements.
    Vector {
        /// Type of each element.
        element: String,
    },
    /// A fixed number of elements, with no length prefix.
    FixedArray {
        /// Type of each element.
        element: String,
        /// Number of elements.
        length: usize,
    },
    /// An optional value.
    Option {
        /// Type of the value when present.
        inner: String,
    },
    /// A compact encoded integer (or a wrapper around one).
    Compact {
        /// The type being compact encoded.
        inner: String,
    },
    /// Each component one after the other.
    Tuple {
        /// Types of each component, in order.
        components: Vec<String>,
    },
    /// Each field one after the other, in declared order.
    Struct {
        /// Name of this type.
        type_name: String,
        /// The fields.
        fields: Vec<Field>,
    },
    /// A one byte variant index followed by the variant's associated data.
    Enum {
        /// Name of this type.
        type_name: String,
        /// The variants, in index order.
        variants: Vec<Field>,
    },
    /// A one byte index with no associated data.
    EnumValues {
        /// Name of this type.
        type_name: String,
        /// The variant names, in index order.
        values: Vec<String>,
    },
    /// A set of named bit flags. Encoded exactly like the underlying integer type.
    NumericSet {
        /// Name of this type.
        type_name: String,
        /// The integer type holding the flags.
        value_type: String,
        /// Names of each flag and its value.
        flags: Vec<(String, u64)>,
    },
    /// Another name for some type.
    Alias {
        /// Name of this type.
        type_name: String,
        /// The type this is an alias of.
        target: String,
    },
    /// A forward reference to a type which was resolved by name, usually because the
    /// original name was loosely spelled.
    Proxy {
        /// Name of this type.
        type_name: String,
        /// The resolved type name.
        target: String,
    },
    /// A type we know the name of but not the shape of. Encoding or decoding it fails.
    Unresolved {
        /// Name of this type.
        type_name: String,
    },
    /// Bytes with a compact length prefix.
    Bytes,
    /// A fixed number of bytes, like a hash or account ID.
    Hash {
        /// Number of bytes.
        length: usize,
    },
    /// The identity pallet's `Data` type.
    Data,
    /// A sequence of bits, stored LSB first in `u8`s.
    BitVec,
    /// A transaction mortality period.
    Era,
    /// A call into some module, described by runtime metadata.
    GenericCall,
    /// An event from some module, described by runtime metadata.
    GenericEvent,
}

impl Node {
    /// Is this a placeholder for a type whose shape we don't know?
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Node::Unresolved { .. })
    }

    /// The names of all of the types that this node refers to.
    pub fn referenced_type_names(&self) -> Vec<&str> {
        match self {
            Node::Vector { element } | Node::FixedArray { element, .. } => vec![element],
            Node::Option { inner } | Node::Compact { inner } => vec![inner],
            Node::Tuple { components } => components.iter().map(|c| c.as_str()).collect(),
            Node::Struct { fields: items, .. } | Node::Enum { variants: items, .. } => {
                items.iter().map(|f| f.type_name.as_str()).collect()
            }
            Node::NumericSet { value_type, .. } => vec![value_type],
            Node::Alias { target, .. } | Node::Proxy { target, .. } => vec![target],
            Node::Primitive(_)
            | Node::Null
            | Node::EnumValues { .. }
            | Node::Unresolved { .. }
            | Node::Bytes
            | Node::Hash { .. }
            | Node::Data
            | Node::BitVec
            | Node::Era
            | Node::GenericCall
            | Node::GenericEvent => Vec::new(),
        }
    }

    /// SCALE encode the value according to this node.
    pub fn encode<L: TypeLookup + ?Sized>(
        &self,
        encoder: &mut DynamicEncoder<'_, L>,
        value: &Value,
    ) -> Result<(), Error> {
        match self {
            Node::Primitive(primitive) => encode_primitive(*primitive, encoder, value),
            Node::Null => match value {
                Value::Null => Ok(()),
                Value::Array(items) if items.is_empty() => Ok(()),
                other => Err(Error::malformed("null", other)),
            },
            Node::Vector { element } => {
                let items = expect_array(value)?;
                encoder.append_compact_len(items.len());
                items.iter().try_for_each(|item| encoder.append(element, item))
            }
            Node::FixedArray { element, length } => {
                let items = expect_array(value)?;
                if items.len() != *length {
                    return Err(Error::malformed(format!("an array of {length} items"), value));
                }
                items.iter().try_for_each(|item| encoder.append(element, item))
            }
            Node::Option { inner } => encode_option(inner, encoder, value),
            Node::Compact { inner } => {
                let depth = encoder.modifier_depth();
                encoder.push_modifier(Modifier::Compact);
                let res = encoder.append(inner, value);
                // Anything not consumed by an integer (eg `Compact<()>`) is dropped here.
                encoder.truncate_modifiers(depth);
                res
            }
            Node::Tuple { components } => {
                let items = expect_array(value)?;
                if items.len() != components.len() {
                    let expected = format!("a tuple of {} items", components.len());
                    return Err(Error::malformed(expected, value));
                }
                components.iter().zip(items).try_for_each(|(ty, item)| encoder.append(ty, item))
            }
            Node::Struct { type_name, fields } => {
                let entries =
                    value.as_map().ok_or_else(|| Error::malformed(format!("a map for {type_name}"), value))?;
                if entries.len() != fields.len() {
                    let expected = format!("{} fields for {type_name}", fields.len());
                    return Err(Error::malformed(expected, value));
                }
                for field in fields {
                    let field_value = value.get(&field.name).ok_or_else(|| {
                        Error::malformed(format!("field '{}' of {type_name}", field.name), value)
                    })?;
                    encoder.append(&field.type_name, field_value)?;
                }
                Ok(())
            }
            Node::Enum { type_name, variants } => {
                let [selector, payload] = expect_array(value)? else {
                    let expected = format!("a [variant, value] pair for {type_name}");
                    return Err(Error::malformed(expected, value));
                };
                let index = match selector {
                    Value::String(name) => {
                        variants.iter().position(|v| v.name == *name).ok_or_else(|| {
                            Error::malformed(format!("a variant of {type_name}"), selector)
                        })?
                    }
                    other => variant_index(other, variants.len())?,
                };
                encoder.append_raw(&[index_byte(index, variants.len())?]);
                encoder.append(&variants[index].type_name, payload)
            }
            Node::EnumValues { type_name, values } => {
                let index = match value {
                    Value::String(name) => values.iter().position(|v| v == name).ok_or_else(|| {
                        Error::malformed(format!("a value of {type_name}"), value)
                    })?,
                    other => variant_index(other, values.len())?,
                };
                encoder.append_raw(&[index_byte(index, values.len())?]);
                Ok(())
            }
            Node::NumericSet { value_type, .. } => encoder.append(value_type, value),
            Node::Alias { target, .. } | Node::Proxy { target, .. } => encoder.append(target, value),
            Node::Unresolved { type_name } => Err(Error::UnresolvedType(type_name.clone())),
            Node::Bytes => builtins::encode_bytes(encoder, value),
            Node::Hash { length } => builtins::encode_hash(encoder, value, *length),
            Node::Data => builtins::encode_data(encoder, value),
            Node::BitVec => builtins::encode_bit_vec(encoder, value),
            Node::Era => builtins::encode_era(encoder, value),
            Node::GenericCall => builtins::encode_call(encoder, value),
            Node::GenericEvent => builtins::encode_event(encoder, value),
        }
    }

    /// Decode a value according to this node.
    pub fn decode<L: TypeLookup + ?Sized>(
        &self,
        decoder: &mut DynamicDecoder<'_, '_, L>,
    ) -> Result<Value, Error> {
        match self {
            Node::Primitive(primitive) => decode_primitive(*primitive, decoder),
            Node::Null => Ok(Value::Null),
            Node::Vector { element } => {
                let input_len = decoder.cursor() + decoder.remaining();
                let len = decoder.read_compact_len()?;
                decode_items(decoder, element, len, Some(input_len))
            }
            Node::FixedArray { element, length } => decode_items(decoder, element, *length, None),
            Node::Option { inner } => decode_option(inner, decoder),
            Node::Compact { inner } => {
                let depth = decoder.modifier_depth();
                decoder.push_modifier(Modifier::Compact);
                let res = decoder.read(inner);
                decoder.truncate_modifiers(depth);
                res
            }
            Node::Tuple { components } => {
                components.iter().map(|ty| decoder.read(ty)).collect::<Result<_, _>>().map(Value::Array)
            }
            Node::Struct { fields, .. } => {
                let mut entries = Vec::with_capacity(fields.len());
                for field in fields {
                    entries.push((field.name.clone(), decoder.read(&field.type_name)?));
                }
                Ok(Value::Map(entries))
            }
            Node::Enum { variants, .. } => {
                let index = decoder.read_byte()?;
                let variant = variants
                    .get(usize::from(index))
                    .ok_or(Error::OutOfRangeIndex { index: index.into(), bound: variants.len() })?;
                let payload = decoder.read(&variant.type_name)?;
                Ok(Value::Array(vec![Value::String(variant.name.clone()), payload]))
            }
            Node::EnumValues { values, .. } => {
                let index = decoder.read_byte()?;
                values
                    .get(usize::from(index))
                    .map(|name| Value::String(name.clone()))
                    .ok_or(Error::OutOfRangeIndex { index: index.into(), bound: values.len() })
            }
            Node::NumericSet { value_type, .. } => decoder.read(value_type),
            Node::Alias { target, .. } | Node::Proxy { target, .. } => decoder.read(target),
            Node::Unresolved { type_name } => Err(Error::UnresolvedType(type_name.clone())),
            Node::Bytes => builtins::decode_bytes(decoder),
            Node::Hash { length } => builtins::decode_hash(decoder, *length),
            Node::Data => builtins::decode_data(decoder),
            Node::BitVec => builtins::decode_bit_vec(decoder),
            Node::Era => builtins::decode_era(decoder),
            Node::GenericCall => builtins::decode_call(decoder),
            Node::GenericEvent => builtins::decode_event(decoder),
        }
    }
}

/// Find the node for some type name. Names that aren't known to the lookup but which are
/// themselves type expressions (like `Vec<u32>` or `(A, B)`) are turned into a node on the fly.
pub fn resolve_node<'a, L: TypeLookup + ?Sized>(
    lookup: &'a L,
    type_name: &str,
) -> Result<Cow<'a, Node>, Error> {
    if let Some(node) = lookup.node(type_name) {
        return Ok(Cow::Borrowed(node));
    }
    factory::node_from_expression(type_name)
        .map(Cow::Owned)
        .ok_or_else(|| Error::UnresolvedType(type_name.to_owned()))
}

/// Follow any aliases and proxies from the given type name, handing back the node at the end.
pub fn terminal_node<'a, L: TypeLookup + ?Sized>(
    lookup: &'a L,
    type_name: &str,
) -> Option<Cow<'a, Node>> {
    let mut node = resolve_node(lookup, type_name).ok()?;
    for _ in 0..MAX_ALIAS_HOPS {
        let target = match &*node {
            Node::Alias { target, .. } | Node::Proxy { target, .. } => target.clone(),
            _ => return Some(node),
        };
        node = resolve_node(lookup, &target).ok()?;
    }
    None
}

fn expect_array(value: &Value) -> Result<&[Value], Error> {
    value.as_array().ok_or_else(|| Error::malformed("an array", value))
}

fn index_byte(index: usize, bound: usize) -> Result<u8, Error> {
    u8::try_from(index).map_err(|_| Error::OutOfRangeIndex { index: index as u64, bound })
}

fn variant_index(selector: &Value, bound: usize) -> Result<usize, Error> {
    let index = selector.as_u64().ok_or_else(|| Error::malformed("a variant name or index", selector))?;
    // Indexes are a single byte on the wire.
    match usize::try_from(index) {
        Ok(idx) if idx < bound && idx <= usize::from(u8::MAX) => Ok(idx),
        _ => Err(Error::OutOfRangeIndex { index, bound }),
    }
}

// Decode `len` items. Decoding a zero sized item reads nothing, so every such item is
// identical. When the length came from the input, it may not exceed the input length for
// zero sized items, since nothing else bounds it.
fn decode_items<L: TypeLookup + ?Sized>(
    decoder: &mut DynamicDecoder<'_, '_, L>,
    element: &str,
    len: usize,
    untrusted_bound: Option<usize>,
) -> Result<Value, Error> {
    let mut items = Vec::with_capacity(len.min(decoder.remaining()));
    for _ in 0..len {
        let start = decoder.cursor();
        let item = decoder.read(element)?;
        if decoder.cursor() == start {
            if let Some(bound) = untrusted_bound.filter(|bound| len > *bound) {
                return Err(Error::ZeroSizedItems { len, bound });
            }
            items.resize(len, item);
            break;
        }
        items.push(item);
    }
    Ok(Value::Array(items))
}

fn encode_option<L: TypeLookup + ?Sized>(
    inner: &str,
    encoder: &mut DynamicEncoder<'_, L>,
    value: &Value,
) -> Result<(), Error> {
    match terminal_node(encoder.lookup(), inner).as_deref() {
        // Optional bools are a single byte with 2 meaning "none".
        Some(Node::Primitive(Primitive::Bool)) => {
            let byte = match value {
                Value::Bool(false) => 0,
                Value::Bool(true) => 1,
                Value::Null => 2,
                other => return Err(Error::malformed("a bool or null", other)),
            };
            encoder.append_raw(&[byte]);
            Ok(())
        }
        // Option<Option<T>>: the outer `Some` wraps its value in a one item array so
        // that `Some(None)` and `None` can be told apart.
        Some(Node::Option { .. }) => match value {
            Value::Null => {
                encoder.append_raw(&[0]);
                Ok(())
            }
            Value::Array(items) if items.len() == 1 => {
                encoder.append_raw(&[1]);
                encoder.append(inner, &items[0])
            }
            other => Err(Error::malformed("null or a one item array", other)),
        },
        _ => match value {
            Value::Null => {
                encoder.append_raw(&[0]);
                Ok(())
            }
            some => {
                encoder.append_raw(&[1]);
                encoder.append(inner, some)
            }
        },
    }
}

fn decode_option<L: TypeLookup + ?Sized>(
    inner: &str,
    decoder: &mut DynamicDecoder<'_, '_, L>,
) -> Result<Value, Error> {
    let target = terminal_node(decoder.lookup(), inner);
    let byte = decoder.read_byte()?;
    match (target.as_deref(), byte) {
        (Some(Node::Primitive(Primitive::Bool)), 0) => Ok(Value::Bool(false)),
        (Some(Node::Primitive(Primitive::Bool)), 1) => Ok(Value::Bool(true)),
        (Some(Node::Primitive(Primitive::Bool)), 2) => Ok(Value::Null),
        (Some(Node::Primitive(Primitive::Bool)), other) => Err(Error::InvalidOptionDiscriminant(other)),
        (_, 0) => Ok(Value::Null),
        (Some(Node::Option { .. }), 1) => Ok(Value::Array(vec![decoder.read(inner)?])),
        (_, 1) => decoder.read(inner),
        (_, other) => Err(Error::InvalidOptionDiscriminant(other)),
    }
}

fn encode_primitive<L: TypeLookup + ?Sized>(
    primitive: Primitive,
    encoder: &mut DynamicEncoder<'_, L>,
    value: &Value,
) -> Result<(), Error> {
    match primitive {
        Primitive::Bool => {
            let b = value.as_bool().ok_or_else(|| Error::malformed("a bool", value))?;
            encoder.append_raw(&[u8::from(b)]);
            Ok(())
        }
        Primitive::Char => {
            let mut chars = value.as_str().unwrap_or_default().chars();
            let (Some(c), None) = (chars.next(), chars.next()) else {
                return Err(Error::malformed("a single character", value));
            };
            encoder.append_raw(&u32::from(c).to_le_bytes());
            Ok(())
        }
        Primitive::Str => {
            let s = value.as_str().ok_or_else(|| Error::malformed("a string", value))?;
            encoder.append_compact_len(s.len());
            encoder.append_raw(s.as_bytes());
            Ok(())
        }
        Primitive::U8 => encoder.append_unsigned(value, 1),
        Primitive::U16 => encoder.append_unsigned(value, 2),
        Primitive::U32 => encoder.append_unsigned(value, 4),
        Primitive::U64 => encoder.append_unsigned(value, 8),
        Primitive::U128 => encoder.append_unsigned(value, 16),
        Primitive::U256 => encoder.append_unsigned(value, 32),
        Primitive::I8 => encoder.append_signed(value, 1),
        Primitive::I16 => encoder.append_signed(value, 2),
        Primitive::I32 => encoder.append_signed(value, 4),
        Primitive::I64 => encoder.append_signed(value, 8),
        Primitive::I128 => encoder.append_signed(value, 16),
        Primitive::I256 => encoder.append_signed(value, 32),
    }
}

fn decode_primitive<L: TypeLookup + ?Sized>(
    primitive: Primitive,
    decoder: &mut DynamicDecoder<'_, '_, L>,
) -> Result<Value, Error> {
    match primitive {
        Primitive::Bool => match decoder.read_byte()? {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            other => Err(Error::InvalidBoolByte(other)),
        },
        Primitive::Char => {
            let bytes = decoder.read_array::<4>()?;
            let n = u32::from_le_bytes(bytes);
            char::from_u32(n).map(|c| Value::String(c.to_string())).ok_or(Error::InvalidChar(n))
        }
        Primitive::Str => {
            let len = decoder.read_compact_len()?;
            let bytes = decoder.read_bytes(len)?;
            let s = core::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)?;
            Ok(Value::String(s.to_owned()))
        }
        Primitive::U8 => decoder.read_unsigned(1),
        Primitive::U16 => decoder.read_unsigned(2),
        Primitive::U32 => decoder.read_unsigned(4),
        Primitive::U64 => decoder.read_unsigned(8),
        Primitive::U128 => decoder.read_unsigned(16),
        Primitive::U256 => decoder.read_unsigned(32),
        Primitive::I8 => decoder.read_signed(1),
        Primitive::I16 => decoder.read_signed(2),
        Primitive::I32 => decoder.read_signed(4),
        Primitive::I64 => decoder.read_signed(8),
        Primitive::I128 => decoder.read_signed(16),
        Primitive::I256 => decoder.read_signed(32),
    }
}
