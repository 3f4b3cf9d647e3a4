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

//! Conversions between [`Value`]s, [`BigInt`]s and fixed width little endian bytes. Values
//! arrive as `u64`s or decimal strings and can be up to 256 bits wide (or 536 bits for the
//! big compact form).

use crate::error::Error;
use crate::value::Value;
use core::str::FromStr;
use num_bigint::{BigInt, Sign};

/// Read an integer from a [`Value::UnsignedInt`] or a decimal [`Value::String`].
pub fn from_value(value: &Value) -> Result<BigInt, Error> {
    match value {
        Value::UnsignedInt(n) => Ok(BigInt::from(*n)),
        Value::String(s) => {
            BigInt::from_str(s.trim()).map_err(|_| Error::malformed("an integer", value))
        }
        other => Err(Error::malformed("an integer", other)),
    }
}

/// The canonical [`Value`] for an integer; a [`Value::UnsignedInt`] when it fits into a
/// `u64`, else a decimal [`Value::String`].
pub fn to_value(n: &BigInt) -> Value {
    match u64::try_from(n) {
        Ok(n) => Value::UnsignedInt(n),
        Err(_) => Value::String(n.to_string()),
    }
}

/// Read an unsigned little endian integer.
pub fn from_unsigned_bytes(bytes: &[u8]) -> BigInt {
    BigInt::from_bytes_le(Sign::Plus, bytes)
}

/// Read a two's complement little endian integer.
pub fn from_signed_bytes(bytes: &[u8]) -> BigInt {
    BigInt::from_signed_bytes_le(bytes)
}

/// Encode as an unsigned little endian integer of `width` bytes.
pub fn to_unsigned_bytes(n: &BigInt, width: usize) -> Result<Vec<u8>, Error> {
    let (sign, mut bytes) = n.to_bytes_le();
    if sign == Sign::Minus || bytes.len() > width {
        return Err(out_of_range(n, width));
    }
    bytes.resize(width, 0);
    Ok(bytes)
}

/// Encode as a two's complement little endian integer of `width` bytes.
pub fn to_signed_bytes(n: &BigInt, width: usize) -> Result<Vec<u8>, Error> {
    let mut bytes = n.to_signed_bytes_le();
    if bytes.len() > width {
        return Err(out_of_range(n, width));
    }
    let fill = if n.sign() == Sign::Minus { 0xff } else { 0x00 };
    bytes.resize(width, fill);
    Ok(bytes)
}

/// How many bytes the magnitude of `n` needs.
pub fn byte_len(n: &BigInt) -> usize {
    if n.sign() == Sign::NoSign {
        0
    } else {
        n.to_bytes_le().1.len()
    }
}

pub(crate) fn out_of_range(n: &BigInt, width: usize) -> Error {
    Error::IntegerOutOfRange { value: n.to_string(), bits: width * 8 }
}

#[cfg(test)]
mod test {
    use super::*;

    fn int(s: &str) -> BigInt {
        from_value(&Value::String(s.to_owned())).unwrap()
    }

    #[test]
    fn decimal_text_survives_parsing() {
        let cases = [
            "0",
            "1",
            "255",
            "256",
            "18446744073709551616",
            "340282366920938463463374607431768211455",
            "-1",
            "-170141183460469231731687303715884105728",
        ];
        for case in cases {
            assert_eq!(int(case).to_string(), case);
        }
        assert_eq!(int("-0").to_string(), "0");
    }

    #[test]
    fn canonical_values() {
        assert_eq!(to_value(&int("42")), Value::UnsignedInt(42));
        assert_eq!(to_value(&int("-42")), Value::String("-42".to_owned()));
        assert_eq!(
            to_value(&int("18446744073709551616")),
            Value::String("18446744073709551616".to_owned())
        );
    }

    #[test]
    fn rejects_junk() {
        assert!(from_value(&Value::from("12a")).is_err());
        assert!(from_value(&Value::from("")).is_err());
        assert!(from_value(&Value::Bool(true)).is_err());
    }

    #[test]
    fn signed_bytes_match_twos_complement() {
        assert_eq!(to_signed_bytes(&int("-1"), 1).unwrap(), vec![0xff]);
        assert_eq!(to_signed_bytes(&int("-128"), 1).unwrap(), vec![0x80]);
        assert_eq!(to_signed_bytes(&int("127"), 1).unwrap(), vec![0x7f]);
        assert_eq!(to_signed_bytes(&int("-2"), 2).unwrap(), vec![0xfe, 0xff]);
        assert!(to_signed_bytes(&int("128"), 1).is_err());
        assert!(to_signed_bytes(&int("-129"), 1).is_err());

        assert_eq!(from_signed_bytes(&[0xff]), int("-1"));
        assert_eq!(from_signed_bytes(&[0x80]), int("-128"));
        assert_eq!(from_signed_bytes(&[0x00, 0x80]), int("-32768"));
        assert_eq!(from_signed_bytes(&[0x7f]), int("127"));
    }

    #[test]
    fn unsigned_bytes_respect_width() {
        assert_eq!(to_unsigned_bytes(&int("258"), 4).unwrap(), vec![2, 1, 0, 0]);
        assert_eq!(to_unsigned_bytes(&int("0"), 2).unwrap(), vec![0, 0]);
        assert!(to_unsigned_bytes(&int("256"), 1).is_err());
        assert!(to_unsigned_bytes(&int("-1"), 8).is_err());
        assert_eq!(byte_len(&int("0")), 0);
        assert_eq!(byte_len(&int("256")), 2);
    }
}
