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

//! The types every registry knows about out of the box, and the codecs for the
//! nodes which don't follow from any type definition (bytes, hashes, eras and so on).

use crate::decoder::DynamicDecoder;
use crate::encoder::DynamicEncoder;
use crate::error::Error;
use crate::node::{Node, Primitive, TypeLookup};
use crate::value::Value;

/// `Data` variants that carry a 32 byte hash, in discriminant order starting at 34.
const DATA_HASHES: [&str; 4] = ["BlakeTwo256", "Sha256", "Keccak256", "ShaThree256"];
/// The longest `Data::Raw` payload.
const DATA_MAX_RAW: usize = 32;

/// The nodes that are registered under fixed names in every registry unless
/// explicitly left out.
pub fn predefined_nodes() -> Vec<(String, Node)> {
    let primitives = [
        ("u8", Primitive::U8),
        ("u16", Primitive::U16),
        ("u32", Primitive::U32),
        ("u64", Primitive::U64),
        ("u128", Primitive::U128),
        ("u256", Primitive::U256),
        ("i8", Primitive::I8),
        ("i16", Primitive::I16),
        ("i32", Primitive::I32),
        ("i64", Primitive::I64),
        ("i128", Primitive::I128),
        ("i256", Primitive::I256),
        ("bool", Primitive::Bool),
        ("char", Primitive::Char),
        ("str", Primitive::Str),
        ("Str", Primitive::Str),
        ("String", Primitive::Str),
        ("Text", Primitive::Str),
    ];
    let others = [
        ("Null", Node::Null),
        ("()", Node::Null),
        ("Bytes", Node::Bytes),
        ("Vec<u8>", Node::Bytes),
        ("H160", Node::Hash { length: 20 }),
        ("H256", Node::Hash { length: 32 }),
        ("Hash", Node::Hash { length: 32 }),
        ("AccountId", Node::Hash { length: 32 }),
        ("AccountId32", Node::Hash { length: 32 }),
        ("H512", Node::Hash { length: 64 }),
        ("BitVec", Node::BitVec),
        ("Era", Node::Era),
        ("ExtrinsicEra", Node::Era),
        ("Data", Node::Data),
        ("Call", Node::GenericCall),
        ("GenericCall", Node::GenericCall),
        ("Event", Node::GenericEvent),
        ("GenericEvent", Node::GenericEvent),
    ];

    primitives
        .into_iter()
        .map(|(name, p)| (name.to_owned(), Node::Primitive(p)))
        .chain(others.into_iter().map(|(name, node)| (name.to_owned(), node)))
        .collect()
}

/// Bytes arrive either as a `0x` prefixed hex string or as an array of small integers.
fn bytes_from_value(value: &Value) -> Result<Vec<u8>, Error> {
    match value {
        Value::String(s) => {
            let digits = s.strip_prefix("0x").ok_or_else(|| Error::InvalidHex(s.clone()))?;
            Ok(hex::decode(digits)?)
        }
        Value::Array(items) => items
            .iter()
            .map(|item| match item.as_u64() {
                Some(n) if n <= u64::from(u8::MAX) => Ok(n as u8),
                _ => Err(Error::malformed("a byte", item)),
            })
            .collect(),
        other => Err(Error::malformed("hex bytes", other)),
    }
}

pub(crate) fn encode_bytes<L: TypeLookup + ?Sized>(
    encoder: &mut DynamicEncoder<'_, L>,
    value: &Value,
) -> Result<(), Error> {
    let bytes = bytes_from_value(value)?;
    encoder.append_compact_len(bytes.len());
    encoder.append_raw(&bytes);
    Ok(())
}

pub(crate) fn decode_bytes<L: TypeLookup + ?Sized>(
    decoder: &mut DynamicDecoder<'_, '_, L>,
) -> Result<Value, Error> {
    let len = decoder.read_compact_len()?;
    Ok(Value::bytes(decoder.read_bytes(len)?))
}

pub(crate) fn encode_hash<L: TypeLookup + ?Sized>(
    encoder: &mut DynamicEncoder<'_, L>,
    value: &Value,
    length: usize,
) -> Result<(), Error> {
    let bytes = bytes_from_value(value)?;
    if bytes.len() != length {
        return Err(Error::malformed(format!("{length} bytes"), value));
    }
    encoder.append_raw(&bytes);
    Ok(())
}

pub(crate) fn decode_hash<L: TypeLookup + ?Sized>(
    decoder: &mut DynamicDecoder<'_, '_, L>,
    length: usize,
) -> Result<Value, Error> {
    Ok(Value::bytes(decoder.read_bytes(length)?))
}

pub(crate) fn encode_data<L: TypeLookup + ?Sized>(
    encoder: &mut DynamicEncoder<'_, L>,
    value: &Value,
) -> Result<(), Error> {
    let Some([Value::String(variant), payload]) = value.as_array() else {
        return Err(Error::malformed("a [variant, value] pair for Data", value));
    };
    match variant.as_str() {
        "None" => {
            encoder.append_raw(&[0]);
            Ok(())
        }
        "Raw" => {
            let bytes = bytes_from_value(payload)?;
            if bytes.len() > DATA_MAX_RAW {
                return Err(Error::malformed("at most 32 bytes", payload));
            }
            encoder.append_raw(&[bytes.len() as u8 + 1]);
            encoder.append_raw(&bytes);
            Ok(())
        }
        hasher => {
            let pos = DATA_HASHES
                .iter()
                .position(|h| *h == hasher)
                .ok_or_else(|| Error::malformed("a Data variant", value))?;
            encoder.append_raw(&[DATA_MAX_RAW as u8 + 2 + pos as u8]);
            encode_hash(encoder, payload, 32)
        }
    }
}

pub(crate) fn decode_data<L: TypeLookup + ?Sized>(
    decoder: &mut DynamicDecoder<'_, '_, L>,
) -> Result<Value, Error> {
    let discriminant = usize::from(decoder.read_byte()?);
    let (variant, payload) = match discriminant {
        0 => ("None", Value::Null),
        1..=33 => ("Raw", Value::bytes(decoder.read_bytes(discriminant - 1)?)),
        34..=37 => (DATA_HASHES[discriminant - 34], decode_hash(decoder, 32)?),
        _ => {
            return Err(Error::OutOfRangeIndex {
                index: discriminant as u64,
                bound: DATA_MAX_RAW + 2 + DATA_HASHES.len(),
            })
        }
    };
    Ok(Value::Array(vec![Value::from(variant), payload]))
}

pub(crate) fn encode_bit_vec<L: TypeLookup + ?Sized>(
    encoder: &mut DynamicEncoder<'_, L>,
    value: &Value,
) -> Result<(), Error> {
    let bits = value
        .as_array()
        .ok_or_else(|| Error::malformed("an array of bools", value))?
        .iter()
        .map(|bit| bit.as_bool().ok_or_else(|| Error::malformed("a bool", bit)))
        .collect::<Result<Vec<bool>, _>>()?;

    let mut bytes = vec![0u8; bits.len().div_ceil(8)];
    for (idx, _) in bits.iter().enumerate().filter(|(_, bit)| **bit) {
        bytes[idx / 8] |= 1 << (idx % 8);
    }
    encoder.append_compact_len(bits.len());
    encoder.append_raw(&bytes);
    Ok(())
}

pub(crate) fn decode_bit_vec<L: TypeLookup + ?Sized>(
    decoder: &mut DynamicDecoder<'_, '_, L>,
) -> Result<Value, Error> {
    let len = decoder.read_compact_len()?;
    let bytes = decoder.read_bytes(len.div_ceil(8))?;
    let bits = (0..len).map(|idx| Value::Bool(bytes[idx / 8] & (1 << (idx % 8)) != 0)).collect();
    Ok(Value::Array(bits))
}

pub(crate) fn encode_era<L: TypeLookup + ?Sized>(
    encoder: &mut DynamicEncoder<'_, L>,
    value: &Value,
) -> Result<(), Error> {
    if value.is_null() || value.as_str() == Some("Immortal") {
        encoder.append_raw(&[0]);
        return Ok(());
    }

    let field = |name: &str| value.get(name).and_then(Value::as_u64);
    let period = field("period").ok_or_else(|| Error::malformed("an era period", value))?;
    let period = period.checked_next_power_of_two().unwrap_or(1 << 16).clamp(4, 1 << 16);
    // A phase can be given directly, or derived from the current block number.
    let phase = field("phase").or_else(|| field("current")).unwrap_or(0) % period;

    let quantize_factor = (period >> 12).max(1);
    let encoded = u64::from(period.trailing_zeros().saturating_sub(1).clamp(1, 15))
        | ((phase / quantize_factor) << 4);
    encoder.append_raw(&(encoded as u16).to_le_bytes());
    Ok(())
}

pub(crate) fn decode_era<L: TypeLookup + ?Sized>(
    decoder: &mut DynamicDecoder<'_, '_, L>,
) -> Result<Value, Error> {
    let first = decoder.read_byte()?;
    if first == 0 {
        return Ok(Value::Null);
    }
    let encoded = u16::from_le_bytes([first, decoder.read_byte()?]);
    let period = 2u64 << (encoded % (1 << 4));
    let quantize_factor = (period >> 12).max(1);
    let phase = u64::from(encoded >> 4) * quantize_factor;
    if period < 4 || phase >= period {
        return Err(Error::InvalidEra(encoded));
    }
    Ok(Value::map([("period", Value::from(period)), ("phase", Value::from(phase))]))
}

pub(crate) fn encode_call<L: TypeLookup + ?Sized>(
    encoder: &mut DynamicEncoder<'_, L>,
    value: &Value,
) -> Result<(), Error> {
    let metadata = encoder.lookup().metadata().ok_or(Error::MetadataUnavailable)?;
    let module = expect_str(value, "module")?;
    let call = expect_str(value, "call")?;
    let module_index = metadata.module_index(module).ok_or_else(|| Error::UnknownModule(module.to_owned()))?;
    let (call_index, call_metadata) = metadata
        .call(module, call)
        .ok_or_else(|| Error::UnknownCall { module: module.to_owned(), call: call.to_owned() })?;

    encoder.append_raw(&[module_index, call_index]);
    let args = value.get("args").unwrap_or(&Value::Null);
    match args {
        Value::Map(entries) => {
            if let Some((name, _)) =
                entries.iter().find(|(name, _)| !call_metadata.args.iter().any(|arg| arg.name == *name))
            {
                return Err(Error::malformed(format!("no argument '{name}' in {module}.{call}"), args));
            }
            for arg in &call_metadata.args {
                let arg_value = args
                    .get(&arg.name)
                    .ok_or_else(|| Error::malformed(format!("argument '{}' of {module}.{call}", arg.name), args))?;
                encoder.append(&arg.type_name, arg_value)?;
            }
        }
        Value::Array(items) if items.len() == call_metadata.args.len() => {
            for (arg, arg_value) in call_metadata.args.iter().zip(items) {
                encoder.append(&arg.type_name, arg_value)?;
            }
        }
        Value::Null if call_metadata.args.is_empty() => {}
        other => return Err(Error::malformed(format!("arguments for {module}.{call}"), other)),
    }
    Ok(())
}

pub(crate) fn decode_call<L: TypeLookup + ?Sized>(
    decoder: &mut DynamicDecoder<'_, '_, L>,
) -> Result<Value, Error> {
    let metadata = decoder.lookup().metadata().ok_or(Error::MetadataUnavailable)?;
    let module_index = decoder.read_byte()?;
    let call_index = decoder.read_byte()?;
    let (module, call) = metadata
        .module_name(module_index)
        .zip(metadata.call_by_module_index(module_index, call_index))
        .ok_or(Error::UnknownCallIndex { module_index, call_index })?;

    let mut args = Vec::with_capacity(call.args.len());
    for arg in &call.args {
        args.push((arg.name.clone(), decoder.read(&arg.type_name)?));
    }
    Ok(Value::map([
        ("module", Value::from(module)),
        ("call", Value::from(call.name.as_str())),
        ("args", Value::Map(args)),
    ]))
}

pub(crate) fn encode_event<L: TypeLookup + ?Sized>(
    encoder: &mut DynamicEncoder<'_, L>,
    value: &Value,
) -> Result<(), Error> {
    let metadata = encoder.lookup().metadata().ok_or(Error::MetadataUnavailable)?;
    let module = expect_str(value, "module")?;
    let event = expect_str(value, "event")?;
    let module_index = metadata.module_index(module).ok_or_else(|| Error::UnknownModule(module.to_owned()))?;
    let (event_index, event_metadata) = metadata
        .event(module, event)
        .ok_or_else(|| Error::UnknownEvent { module: module.to_owned(), event: event.to_owned() })?;

    let args = match value.get("args") {
        Some(Value::Array(items)) => items.as_slice(),
        None | Some(Value::Null) => &[],
        Some(other) => return Err(Error::malformed("an array of event arguments", other)),
    };
    if args.len() != event_metadata.args.len() {
        let expected = format!("{} arguments for {module}.{event}", event_metadata.args.len());
        return Err(Error::malformed(expected, value));
    }

    encoder.append_raw(&[module_index, event_index]);
    event_metadata.args.iter().zip(args).try_for_each(|(ty, arg)| encoder.append(ty, arg))
}

pub(crate) fn decode_event<L: TypeLookup + ?Sized>(
    decoder: &mut DynamicDecoder<'_, '_, L>,
) -> Result<Value, Error> {
    let metadata = decoder.lookup().metadata().ok_or(Error::MetadataUnavailable)?;
    let module_index = decoder.read_byte()?;
    let event_index = decoder.read_byte()?;
    let (module, event) = metadata
        .module_name(module_index)
        .zip(metadata.event_by_module_index(module_index, event_index))
        .ok_or(Error::UnknownEventIndex { module_index, event_index })?;

    let args = event.args.iter().map(|ty| decoder.read(ty)).collect::<Result<Vec<_>, _>>()?;
    Ok(Value::map([
        ("module", Value::from(module)),
        ("event", Value::from(event.name.as_str())),
        ("args", Value::Array(args)),
    ]))
}

fn expect_str<'v>(value: &'v Value, key: &str) -> Result<&'v str, Error> {
    value.get(key).and_then(Value::as_str).ok_or_else(|| Error::malformed(format!("a '{key}' string"), value))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::type_registry::TypeRegistry;

    fn encode(name: &str, value: Value) -> String {
        let registry = TypeRegistry::empty();
        hex::encode(DynamicEncoder::encode(&registry, name, &value).unwrap())
    }

    fn decode(name: &str, hex_bytes: &str) -> Value {
        let registry = TypeRegistry::empty();
        let bytes = hex::decode(hex_bytes).unwrap();
        DynamicDecoder::decode(&registry, name, &bytes).unwrap()
    }

    fn bits(bits: &[u8]) -> Value {
        Value::array(bits.iter().map(|b| Value::Bool(*b == 1)))
    }

    #[test]
    fn bit_vecs() {
        let cases = [
            (bits(&[]), "00"),
            (bits(&[1, 1]), "0803"),
            (bits(&[1, 1, 1]), "0c07"),
            (bits(&[1, 0, 1, 1, 1, 1, 1, 1, 0, 1]), "28fd02"),
        ];
        for (value, expected) in cases {
            assert_eq!(encode("BitVec", value.clone()), expected);
            assert_eq!(decode("BitVec", expected), value);
        }
    }

    #[test]
    fn eras() {
        let mortal = |period: u64, phase: u64| {
            Value::map([("period", Value::from(period)), ("phase", Value::from(phase))])
        };

        assert_eq!(encode("Era", Value::Null), "00");
        assert_eq!(encode("Era", Value::from("Immortal")), "00");
        assert_eq!(decode("Era", "00"), Value::Null);

        let cases = [(mortal(64, 40), "8502"), (mortal(64, 60), "c503"), (mortal(32768, 20000), "4e9c")];
        for (value, expected) in cases {
            assert_eq!(encode("Era", value.clone()), expected);
            assert_eq!(decode("Era", expected), value);
        }

        // Periods round up to a power of two; phases can come from the current block.
        let rounded = Value::map([("period", Value::from(50u64)), ("current", Value::from(104u64))]);
        assert_eq!(encode("Era", rounded), "8502");
    }

    #[test]
    fn data() {
        assert_eq!(encode("Data", Value::array([Value::from("None"), Value::Null])), "00");
        assert_eq!(encode("Data", Value::array([Value::from("Raw"), Value::from("0x6869")])), "036869");
        assert_eq!(decode("Data", "036869"), Value::array([Value::from("Raw"), Value::from("0x6869")]));

        let hash = format!("0x{}", "ab".repeat(32));
        let encoded = encode("Data", Value::array([Value::from("Keccak256"), Value::from(hash.as_str())]));
        assert_eq!(&encoded[..2], "24");
        assert_eq!(decode("Data", &encoded), Value::array([Value::from("Keccak256"), Value::from(hash)]));

        let registry = TypeRegistry::empty();
        assert_eq!(
            DynamicDecoder::decode(&registry, "Data", &[38]),
            Err(Error::OutOfRangeIndex { index: 38, bound: 38 })
        );
        let too_long = Value::array([Value::from("Raw"), Value::bytes([0u8; 33])]);
        assert!(DynamicEncoder::encode(&registry, "Data", &too_long).is_err());
    }

    #[test]
    fn bytes_and_hashes() {
        assert_eq!(encode("Bytes", Value::from("0x010203")), "0c010203");
        assert_eq!(encode("Vec<u8>", Value::array([1u64.into(), 2u64.into()])), "080102");
        assert_eq!(decode("Bytes", "0c010203"), Value::from("0x010203"));

        let h160 = format!("0x{}", "11".repeat(20));
        assert_eq!(encode("H160", Value::from(h160.as_str())), "11".repeat(20));
        assert_eq!(decode("H160", &"11".repeat(20)), Value::from(h160));

        let registry = TypeRegistry::empty();
        assert!(DynamicEncoder::encode(&registry, "H256", &Value::from("0x1234")).is_err());
        assert!(matches!(
            DynamicEncoder::encode(&registry, "Bytes", &Value::from("1234")),
            Err(Error::InvalidHex(_))
        ));
    }

    #[test]
    fn calls_need_metadata() {
        let registry = TypeRegistry::empty();
        let call = Value::map([("module", Value::from("System")), ("call", Value::from("remark"))]);
        assert_eq!(DynamicEncoder::encode(&registry, "Call", &call), Err(Error::MetadataUnavailable));
    }
}
