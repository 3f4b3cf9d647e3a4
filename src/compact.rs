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

//! SCALE compact integers. The two low bits of the first byte give the mode:
//!
//! - `0b00`: single byte, values below `2^6`.
//! - `0b01`: two bytes, values below `2^14`.
//! - `0b10`: four bytes, values below `2^30`.
//! - `0b11`: the upper six bits hold `byte_len - 4`, followed by `byte_len` bytes.
//!
//! Anything up to 128 bits goes through [`parity_scale_codec::Compact`]. Only the widest
//! big form values (up to 67 magnitude bytes) are handled here.

use crate::error::Error;
use num_bigint::{BigInt, Sign};
use parity_scale_codec::{Compact, Decode, Encode};

/// The most magnitude bytes the big compact form can describe.
const MAX_BIG_LEN: usize = 67;

/// The longest encoding `Compact<u128>` knows about: a prefix byte and 16 magnitude bytes.
const MAX_CODEC_LEN: usize = 17;

/// Append the compact encoding of some unsigned integer.
pub fn encode(value: &BigInt, out: &mut Vec<u8>) -> Result<(), Error> {
    if value.sign() == Sign::Minus {
        return Err(Error::IntegerOutOfRange { value: value.to_string(), bits: 0 });
    }
    if let Ok(n) = u128::try_from(value) {
        Compact(n).encode_to(out);
        return Ok(());
    }

    let (_, magnitude) = value.to_bytes_le();
    if magnitude.len() > MAX_BIG_LEN {
        return Err(Error::IntegerOutOfRange { value: value.to_string(), bits: MAX_BIG_LEN * 8 });
    }
    out.push((((magnitude.len() - 4) as u8) << 2) | 0b11);
    out.extend_from_slice(&magnitude);
    Ok(())
}

/// Append the compact encoding of a length.
pub fn encode_len(len: usize, out: &mut Vec<u8>) {
    Compact(len as u64).encode_to(out);
}

/// Decode a compact integer from the front of `input`, advancing it. Encodings which are
/// longer than they need to be are rejected.
pub fn decode(input: &mut &[u8]) -> Result<BigInt, Error> {
    let first = *input.first().ok_or(Error::BufferExhausted { needed: 1, remaining: 0 })?;
    let len = match first & 0b11 {
        0b00 => 1,
        0b01 => 2,
        0b10 => 4,
        _ => usize::from(first >> 2) + 5,
    };
    if input.len() < len {
        return Err(Error::BufferExhausted { needed: len, remaining: input.len() });
    }
    let (encoded, rest) = input.split_at(len);

    let value = if len > MAX_CODEC_LEN {
        // Wider than 128 bits, so only a zero top byte could make this non-canonical.
        let magnitude = &encoded[1..];
        if magnitude.last() == Some(&0) {
            return Err(non_canonical(encoded));
        }
        BigInt::from_bytes_le(Sign::Plus, magnitude)
    } else {
        let mut bytes = encoded;
        let Compact(n) = Compact::<u128>::decode(&mut bytes).map_err(|_| non_canonical(encoded))?;
        BigInt::from(n)
    };

    *input = rest;
    Ok(value)
}

/// Decode a compact length from the front of `input`, advancing it.
pub fn decode_len(input: &mut &[u8]) -> Result<usize, Error> {
    let value = decode(input)?;
    usize::try_from(&value)
        .map_err(|_| Error::IntegerOutOfRange { value: value.to_string(), bits: usize::BITS as usize })
}

fn non_canonical(encoded: &[u8]) -> Error {
    Error::NonCanonicalCompact(hex::encode(encoded))
}
