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

//! Type names that come out of runtime metadata and type catalogs are full of textual
//! artifacts: trait qualification like `<T as Trait>::Balance`, module paths like
//! `grandpa::AuthorityList`, stray newlines and so on. This module strips them.

use regex::Regex;
use std::sync::LazyLock;

static NOISE: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        // Newlines inside multi-line type names.
        (r"[\r\n]+", ""),
        // `<T as Trait>::`, `<T as Trait<I>>::`, `<T as frame_system::Config>::`.
        (r"<T as [A-Za-z0-9_:]+(?:<[A-Za-z0-9_, ]*>)?>::", ""),
        // `T::Balance`.
        (r"\bT::", ""),
        // Lowercase module/pallet qualification like `grandpa::` or `sp_runtime::generic::`.
        (r"\b[a-z_][a-z0-9_]*::", ""),
        // `Box<T>` is encoded exactly like `T`.
        (r"^Box<(.+)>$", "$1"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        let regex = Regex::new(pattern).unwrap_or_else(|e| panic!("noise pattern {pattern}: {e}"));
        (regex, replacement)
    })
    .collect()
});

/// Strip known noise from a type name, returning the cleaned up (and trimmed) name.
pub fn filter(name: &str) -> String {
    let mut out = name.trim().to_owned();
    for (regex, replacement) in NOISE.iter() {
        let next = regex.replace_all(&out, *replacement);
        if next != out {
            out = next.into_owned();
        }
    }
    out.trim().to_owned()
}

/// Known synonyms. Each pair replaces the first string, wherever it appears in a name,
/// with the second.
pub const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("T::", ""),
    ("<T>", ""),
    ("<T, I>", ""),
    ("<I>", ""),
    ("&'static[u8]", "Bytes"),
    ("&[u8]", "Bytes"),
    ("Vec<u8>", "Bytes"),
    ("VecDeque<", "Vec<"),
    ("BTreeSet<", "Vec<"),
    ("RawAddress", "Address"),
];
