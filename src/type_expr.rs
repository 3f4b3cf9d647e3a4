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

//! This module provides a family of [`TypeParser`]s. Each one recognises a single surface
//! syntax (like `Vec<T>`, `[T; N]` or a JSON struct description) and hands back the parts
//! that it extracted, or `None` if the input isn't in its syntax at all. This lets us try
//! several parsers in turn until one matches.
//!
//! # Example
//!
//! ```rust
//! use scale_type_graph::type_expr::{TypeParser, FixedArrayParser, RegexParser};
//!
//! let shape = serde_json::json!("[u8; 32]");
//! assert_eq!(FixedArrayParser.parse(&shape), Some(("u8".to_owned(), 32)));
//! assert_eq!(RegexParser::vector().parse(&shape), None);
//! ```

use crate::noise;
use regex::Regex;
use serde_json::Value as JsonValue;
use smallvec::SmallVec;
use yap::{IntoTokens, TokenLocation, Tokens};

/// Something which can recognise some type shape and extract its parts.
pub trait TypeParser {
    /// The parts extracted on a successful match.
    type Output;

    /// Attempt to parse the shape, returning `None` if it isn't in the syntax this
    /// parser understands.
    fn parse(&self, shape: &JsonValue) -> Option<Self::Output>;
}

/// Matches any non-empty string, trimming whitespace. This matches everything that the
/// other string parsers do, so it should always be tried last.
#[derive(Debug, Clone, Copy, Default)]
pub struct TermParser;

impl TypeParser for TermParser {
    type Output = String;
    fn parse(&self, shape: &JsonValue) -> Option<String> {
        let term = shape.as_str()?.trim();
        (!term.is_empty()).then(|| term.to_owned())
    }
}

/// Matches `Name<T>` for some fixed name, handing back `T`. Noise is filtered from the input
/// before matching, and from `T` afterwards.
#[derive(Debug, Clone)]
pub struct RegexParser {
    regex: Regex,
}

impl RegexParser {
    /// Match a generic type with one parameter, like `Vec<T>`.
    pub fn generic(name: &str) -> Self {
        let pattern = format!(r"^{}\s*<(.+)>$", regex::escape(name));
        // The name is escaped so the pattern is always valid.
        let regex = Regex::new(&pattern).unwrap_or_else(|e| panic!("pattern {pattern}: {e}"));
        RegexParser { regex }
    }

    /// Match `Vec<T>`.
    pub fn vector() -> Self {
        Self::generic("Vec")
    }

    /// Match `Option<T>`.
    pub fn option() -> Self {
        Self::generic("Option")
    }

    /// Match `Compact<T>`.
    pub fn compact() -> Self {
        Self::generic("Compact")
    }
}

impl TypeParser for RegexParser {
    type Output = String;
    fn parse(&self, shape: &JsonValue) -> Option<String> {
        let input = noise::filter(shape.as_str()?);
        let captures = self.regex.captures(&input)?;
        let inner = noise::filter(captures.get(1)?.as_str());
        // Something like `Vec<A>, Vec<B>` would match greedily; make sure that
        // what we captured is a balanced expression in its own right.
        if inner.is_empty() || split_top_level(&inner, ',').is_none() {
            return None;
        }
        Some(inner)
    }
}

/// Matches fixed length arrays like `[T; N]`, handing back `T` and `N`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedArrayParser;

impl TypeParser for FixedArrayParser {
    type Output = (String, usize);
    fn parse(&self, shape: &JsonValue) -> Option<(String, usize)> {
        let input = noise::filter(shape.as_str()?);
        let inner = input.strip_prefix('[')?.strip_suffix(']')?;
        let parts = split_top_level(inner, ';')?;
        let [element, length] = parts.as_slice() else {
            return None;
        };
        let element = element.trim();
        if element.is_empty() {
            return None;
        }
        let length = length.trim().parse::<usize>().ok()?;
        Some((element.to_owned(), length))
    }
}

/// Matches bracketed, separated lists of components, like the tuple `(A, B<C, D>, [E; 2])`.
/// Separators are only recognised outside of any nested `()`, `<>` or `[]` brackets, and at
/// least two non-empty components must be present.
#[derive(Debug, Clone, Copy)]
pub struct ComponentsParser {
    open: char,
    close: char,
    separator: char,
}

impl ComponentsParser {
    /// A parser for tuples like `(A, B)`.
    pub fn tuple() -> Self {
        ComponentsParser { open: '(', close: ')', separator: ',' }
    }
}

impl TypeParser for ComponentsParser {
    type Output = SmallVec<[String; 4]>;
    fn parse(&self, shape: &JsonValue) -> Option<Self::Output> {
        let input = shape.as_str()?.trim();
        let inner = input.strip_prefix(self.open)?.strip_suffix(self.close)?;
        let parts = split_top_level(inner, self.separator)?;
        if parts.len() < 2 {
            return None;
        }
        parts
            .iter()
            .map(|part| {
                let part = part.trim();
                (!part.is_empty()).then(|| part.to_owned())
            })
            .collect()
    }
}

/// Matches structured `{ "type": "struct" | "enum", "type_mapping": [[name, type], ...] }`
/// descriptions, handing back the `(name, type)` pairs in order.
#[derive(Debug, Clone, Copy)]
pub struct MappingParser {
    discriminator: &'static str,
}

impl MappingParser {
    /// Match struct descriptions.
    pub fn structure() -> Self {
        MappingParser { discriminator: "struct" }
    }

    /// Match enum descriptions whose variants carry data.
    pub fn enumeration() -> Self {
        MappingParser { discriminator: "enum" }
    }
}

impl TypeParser for MappingParser {
    type Output = Vec<(String, String)>;
    fn parse(&self, shape: &JsonValue) -> Option<Self::Output> {
        let obj = shape.as_object()?;
        if obj.get("type")?.as_str()? != self.discriminator {
            return None;
        }
        obj.get("type_mapping")?
            .as_array()?
            .iter()
            .map(|pair| match pair.as_array()?.as_slice() {
                [name, ty] => Some((name.as_str()?.to_owned(), ty.as_str()?.trim().to_owned())),
                _ => None,
            })
            .collect()
    }
}

/// Matches `{ "type": "enum", "value_list": [name, ...] }`; enums with no associated data.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumValuesParser;

impl TypeParser for EnumValuesParser {
    type Output = Vec<String>;
    fn parse(&self, shape: &JsonValue) -> Option<Self::Output> {
        let obj = shape.as_object()?;
        if obj.get("type")?.as_str()? != "enum" {
            return None;
        }
        obj.get("value_list")?
            .as_array()?
            .iter()
            .map(|name| name.as_str().map(ToOwned::to_owned))
            .collect()
    }
}

/// Matches `{ "type": "set", "value_type": T, "value_list": { name: bit, ... } }`, handing
/// back `T` and the named flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericSetParser;

impl TypeParser for NumericSetParser {
    type Output = (String, Vec<(String, u64)>);
    fn parse(&self, shape: &JsonValue) -> Option<Self::Output> {
        let obj = shape.as_object()?;
        if obj.get("type")?.as_str()? != "set" {
            return None;
        }
        let value_type = obj.get("value_type")?.as_str()?.trim().to_owned();
        let flags = obj
            .get("value_list")?
            .as_object()?
            .iter()
            .map(|(name, bit)| Some((name.clone(), bit.as_u64()?)))
            .collect::<Option<_>>()?;
        Some((value_type, flags))
    }
}

/// Split the input on `separator`, ignoring any separators nested inside `()`, `<>` or `[]`.
/// Returns `None` if the brackets don't balance.
pub fn split_top_level(input: &str, separator: char) -> Option<SmallVec<[&str; 4]>> {
    let mut toks = input.into_tokens();
    let mut closers: SmallVec<[char; 8]> = SmallVec::new();
    let mut parts = SmallVec::new();
    let mut start = 0;

    while let Some(c) = toks.next() {
        match c {
            '(' => closers.push(')'),
            '<' => closers.push('>'),
            '[' => closers.push(']'),
            ')' | '>' | ']' => {
                if closers.pop() != Some(c) {
                    return None;
                }
            }
            c if c == separator && closers.is_empty() => {
                let end = toks.location().offset();
                parts.push(&input[start..end - c.len_utf8()]);
                start = end;
            }
            _ => {}
        }
    }

    if !closers.is_empty() {
        return None;
    }
    parts.push(&input[start..]);
    Some(parts)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn s(input: &str) -> JsonValue {
        JsonValue::String(input.to_owned())
    }

    #[test]
    fn term_parser_trims() {
        assert_eq!(TermParser.parse(&s("  Foo ")), Some("Foo".to_owned()));
        assert_eq!(TermParser.parse(&s("   ")), None);
        assert_eq!(TermParser.parse(&json!({ "type": "struct" })), None);
    }

    #[test]
    fn regex_parsers_match_their_own_names() {
        assert_eq!(RegexParser::vector().parse(&s("Vec<u32>")), Some("u32".to_owned()));
        assert_eq!(
            RegexParser::vector().parse(&s("Vec<(AccountId, Balance)>")),
            Some("(AccountId, Balance)".to_owned())
        );
        assert_eq!(RegexParser::option().parse(&s("Option< T::Balance >")), Some("Balance".to_owned()));
        assert_eq!(RegexParser::compact().parse(&s("Compact<u128>")), Some("u128".to_owned()));
        assert_eq!(
            RegexParser::vector().parse(&s("Vec<<T as Trait>::AccountId>")),
            Some("AccountId".to_owned())
        );

        assert_eq!(RegexParser::vector().parse(&s("Option<u32>")), None);
        assert_eq!(RegexParser::vector().parse(&s("MyVec<u32>")), None);
        assert_eq!(RegexParser::vector().parse(&s("Vec<u32> ")), Some("u32".to_owned()));
        assert_eq!(RegexParser::vector().parse(&s("Vec<A>, Vec<B>")), None);
        assert_eq!(RegexParser::vector().parse(&s("Vec<>")), None);
    }

    #[test]
    fn fixed_array_parser() {
        assert_eq!(FixedArrayParser.parse(&s("[u8; 32]")), Some(("u8".to_owned(), 32)));
        assert_eq!(FixedArrayParser.parse(&s("[ u8 ;16 ]")), Some(("u8".to_owned(), 16)));
        assert_eq!(
            FixedArrayParser.parse(&s("[[u8; 4]; 2]")),
            Some(("[u8; 4]".to_owned(), 2))
        );
        assert_eq!(FixedArrayParser.parse(&s("[u8; -1]")), None);
        assert_eq!(FixedArrayParser.parse(&s("[u8; N]")), None);
        assert_eq!(FixedArrayParser.parse(&s("[u8; 32")), None);
        assert_eq!(FixedArrayParser.parse(&s("[(u8; 32]")), None);
        assert_eq!(FixedArrayParser.parse(&s("[; 32]")), None);
    }

    #[test]
    fn components_parser() {
        let tuple = ComponentsParser::tuple();
        assert_eq!(
            tuple.parse(&s("(A, B<C, D>, [E; 2], (F, G))")).map(|p| p.into_vec()),
            Some(vec![
                "A".to_owned(),
                "B<C, D>".to_owned(),
                "[E; 2]".to_owned(),
                "(F, G)".to_owned()
            ])
        );
        assert_eq!(tuple.parse(&s("(A)")), None);
        assert_eq!(tuple.parse(&s("()")), None);
        assert_eq!(tuple.parse(&s("(A, )")), None);
        assert_eq!(tuple.parse(&s("(A, B")), None);
        assert_eq!(tuple.parse(&s("(A, B<C)")), None);
        assert_eq!(tuple.parse(&s("(A)(B)")), None);
    }

    #[test]
    fn mapping_parser() {
        let shape = json!({
            "type": "struct",
            "type_mapping": [["who", "AccountId"], ["amount", " Balance "]]
        });
        assert_eq!(
            MappingParser::structure().parse(&shape),
            Some(vec![
                ("who".to_owned(), "AccountId".to_owned()),
                ("amount".to_owned(), "Balance".to_owned())
            ])
        );
        assert_eq!(MappingParser::enumeration().parse(&shape), None);

        let bad_pairs = [
            json!({ "type": "struct", "type_mapping": [["who"]] }),
            json!({ "type": "struct", "type_mapping": [[1, "u8"]] }),
            json!({ "type": "struct", "type_mapping": [["a", "u8", "x"]] }),
            json!({ "type": "struct", "type_mapping": "nope" }),
            json!({ "type": "struct" }),
        ];
        for shape in bad_pairs {
            assert_eq!(MappingParser::structure().parse(&shape), None, "{shape}");
        }
    }

    #[test]
    fn enum_values_and_set_parsers() {
        let values = json!({ "type": "enum", "value_list": ["Free", "Reserved"] });
        assert_eq!(
            EnumValuesParser.parse(&values),
            Some(vec!["Free".to_owned(), "Reserved".to_owned()])
        );
        assert_eq!(EnumValuesParser.parse(&json!({ "type": "enum", "value_list": [1] })), None);

        let set = json!({
            "type": "set",
            "value_type": "u64",
            "value_list": { "Display": 1, "Legal": 2 }
        });
        let (value_type, flags) = NumericSetParser.parse(&set).unwrap();
        assert_eq!(value_type, "u64");
        assert_eq!(flags.len(), 2);
        assert!(flags.contains(&("Legal".to_owned(), 2)));
        assert_eq!(NumericSetParser.parse(&values), None);
    }
}
