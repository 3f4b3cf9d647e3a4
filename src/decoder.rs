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

//! The [`DynamicDecoder`] reads SCALE bytes according to the type graph, producing [`Value`]s.

use crate::compact;
use crate::encoder::{Modifier, MAX_DEPTH};
use crate::error::Error;
use crate::node::{resolve_node, TypeLookup};
use crate::num;
use num_bigint::BigInt;
use crate::value::Value;
use smallvec::SmallVec;

/// Decode SCALE bytes into values, given some [`TypeLookup`] to find the types in.
///
/// # Example
///
/// ```rust
/// use scale_type_graph::{DynamicDecoder, TypeRegistry, Value};
///
/// let types = TypeRegistry::empty();
/// let bytes = [0x08, 0x01, 0x00, 0x02, 0x00, 0x2a];
///
/// let mut decoder = DynamicDecoder::new(&types, &bytes);
/// assert_eq!(
///     decoder.read("Vec<u16>").unwrap(),
///     Value::array([Value::from(1u64), Value::from(2u64)])
/// );
/// assert_eq!(decoder.read("u8").unwrap(), Value::from(42u64));
/// assert_eq!(decoder.remaining(), 0);
/// ```
pub struct DynamicDecoder<'a, 'b, L: ?Sized> {
    lookup: &'a L,
    input: &'b [u8],
    cursor: usize,
    modifiers: SmallVec<[Modifier; 2]>,
    depth: usize,
}

impl<'a, 'b, L: TypeLookup + ?Sized> DynamicDecoder<'a, 'b, L> {
    /// Construct a new decoder, reading from the start of `input`.
    pub fn new(lookup: &'a L, input: &'b [u8]) -> Self {
        DynamicDecoder { lookup, input, cursor: 0, modifiers: SmallVec::new(), depth: 0 }
    }

    /// Decode a single value of the given type. Every byte of the input must be used.
    pub fn decode(lookup: &'a L, type_name: &str, input: &'b [u8]) -> Result<Value, Error> {
        let mut decoder = Self::new(lookup, input);
        let value = decoder.read(type_name)?;
        match decoder.remaining() {
            0 => Ok(value),
            n => Err(Error::TrailingBytes(n)),
        }
    }

    /// Decode the next value, which has the given type.
    pub fn read(&mut self, type_name: &str) -> Result<Value, Error> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::RecursionLimit(type_name.to_owned()));
        }
        let lookup = self.lookup;
        let node = resolve_node(lookup, type_name)?;

        self.depth += 1;
        let res = node.decode(self);
        self.depth -= 1;

        if let Err(e) = &res {
            tracing::trace!(type_name, cursor = self.cursor, error = %e, "failed to decode value");
        }
        res
    }

    /// How many bytes have been consumed.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// How many bytes are left to decode.
    pub fn remaining(&self) -> usize {
        self.input.len() - self.cursor
    }

    /// The types being decoded with.
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

    fn take_compact(&mut self) -> bool {
        if self.modifiers.last() == Some(&Modifier::Compact) {
            self.modifiers.pop();
            true
        } else {
            false
        }
    }

    /// Read the next `n` bytes.
    pub(crate) fn read_bytes(&mut self, n: usize) -> Result<&'b [u8], Error> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(Error::BufferExhausted { needed: n, remaining });
        }
        let bytes = &self.input[self.cursor..self.cursor + n];
        self.cursor += n;
        Ok(bytes)
    }

    pub(crate) fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub(crate) fn read_byte(&mut self) -> Result<u8, Error> {
        Ok(self.read_array::<1>()?[0])
    }

    pub(crate) fn read_compact(&mut self) -> Result<BigInt, Error> {
        let mut rest = &self.input[self.cursor..];
        let n = compact::decode(&mut rest)?;
        self.cursor = self.input.len() - rest.len();
        Ok(n)
    }

    pub(crate) fn read_compact_len(&mut self) -> Result<usize, Error> {
        let mut rest = &self.input[self.cursor..];
        let len = compact::decode_len(&mut rest)?;
        self.cursor = self.input.len() - rest.len();
        Ok(len)
    }

    /// Read an unsigned integer `width` bytes wide, or in compact form if a compact
    /// modifier is pending.
    pub(crate) fn read_unsigned(&mut self, width: usize) -> Result<Value, Error> {
        if self.take_compact() {
            let n = self.read_compact()?;
            if num::byte_len(&n) > width {
                return Err(num::out_of_range(&n, width));
            }
            return Ok(num::to_value(&n));
        }
        let bytes = self.read_bytes(width)?;
        Ok(num::to_value(&num::from_unsigned_bytes(bytes)))
    }

    /// Read a two's complement signed integer `width` bytes wide.
    pub(crate) fn read_signed(&mut self, width: usize) -> Result<Value, Error> {
        if self.take_compact() {
            return Err(Error::CompactUnsupported(format!("i{}", width * 8)));
        }
        let bytes = self.read_bytes(width)?;
        Ok(num::to_value(&num::from_signed_bytes(bytes)))
    }
}
