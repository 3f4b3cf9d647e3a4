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

//! Name resolvers map a loosely spelled type name (`T::Balance`, `balance`, `Foo<T>`) onto
//! one of a set of known names. They are used when an exact lookup fails.

use crate::noise;
use hashbrown::HashSet;

/// Map some type name onto one of a set of candidate names.
pub trait NameResolver: Send + Sync + core::fmt::Debug {
    /// Return the candidate that `name` refers to, if any.
    fn resolve(&self, name: &str, candidates: &HashSet<String>) -> Option<String>;
}

/// Match names ignoring case and whitespace. If more than one candidate matches, the
/// lexicographically smallest is chosen so that the answer never depends on hash order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitiveResolver;

impl NameResolver for CaseInsensitiveResolver {
    fn resolve(&self, name: &str, candidates: &HashSet<String>) -> Option<String> {
        let wanted = normalize(name);
        candidates.iter().filter(|c| normalize(c) == wanted).min().cloned()
    }
}

fn normalize(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_lowercase).collect()
}

/// Apply a table of known synonyms to a name, like `VecDeque<T>` to `Vec<T>`.
#[derive(Debug, Clone)]
pub struct SubstitutionResolver {
    substitutions: Vec<(String, String)>,
}

impl SubstitutionResolver {
    /// Construct a resolver from some `(from, to)` replacements.
    pub fn new<F: Into<String>, T: Into<String>>(substitutions: impl IntoIterator<Item = (F, T)>) -> Self {
        let substitutions = substitutions.into_iter().map(|(f, t)| (f.into(), t.into())).collect();
        SubstitutionResolver { substitutions }
    }
}

impl Default for SubstitutionResolver {
    fn default() -> Self {
        SubstitutionResolver::new(noise::SUBSTITUTIONS.iter().copied())
    }
}

impl NameResolver for SubstitutionResolver {
    fn resolve(&self, name: &str, candidates: &HashSet<String>) -> Option<String> {
        let substituted = self
            .substitutions
            .iter()
            .fold(name.to_owned(), |acc, (from, to)| acc.replace(from.as_str(), to));
        let substituted = substituted.trim();
        (substituted != name && candidates.contains(substituted)).then(|| substituted.to_owned())
    }
}

/// Strip noise like `<T as Trait>::` and module paths from a name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoiseResolver;

impl NameResolver for NoiseResolver {
    fn resolve(&self, name: &str, candidates: &HashSet<String>) -> Option<String> {
        let filtered = noise::filter(name);
        (filtered != name && candidates.contains(&filtered)).then_some(filtered)
    }
}

/// Strip generic parameters, so that `Foo<T>` resolves to `Foo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericsResolver;

impl NameResolver for GenericsResolver {
    fn resolve(&self, name: &str, candidates: &HashSet<String>) -> Option<String> {
        let name = name.trim();
        if !name.ends_with('>') {
            return None;
        }
        let (base, _) = name.split_once('<')?;
        let base = base.trim();
        (!base.is_empty() && candidates.contains(base)).then(|| base.to_owned())
    }
}

/// Try each of a list of resolvers in order, returning the first answer.
#[derive(Debug)]
pub struct ResolverChain {
    resolvers: Vec<Box<dyn NameResolver>>,
}

impl ResolverChain {
    /// Construct a chain from a list of resolvers.
    pub fn new(resolvers: Vec<Box<dyn NameResolver>>) -> Self {
        ResolverChain { resolvers }
    }

    /// A chain which never resolves anything.
    pub fn none() -> Self {
        ResolverChain { resolvers: Vec::new() }
    }
}

impl Default for ResolverChain {
    fn default() -> Self {
        ResolverChain::new(vec![
            Box::new(CaseInsensitiveResolver),
            Box::new(SubstitutionResolver::default()),
            Box::new(NoiseResolver),
            Box::new(GenericsResolver),
        ])
    }
}

impl NameResolver for ResolverChain {
    fn resolve(&self, name: &str, candidates: &HashSet<String>) -> Option<String> {
        self.resolvers.iter().find_map(|r| r.resolve(name, candidates))
    }
}
