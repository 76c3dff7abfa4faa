//! Component name resolution.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::NamingStrategy;

/// Injective mapping from fully-qualified type names to component keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedNames {
    names: BTreeMap<String, String>,
}

impl ResolvedNames {
    /// Resolve every name in `fqns` under `strategy`.
    ///
    /// Input order does not matter: names are deduplicated and sorted first.
    #[must_use]
    pub fn resolve<I, S>(fqns: I, strategy: NamingStrategy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fqns: BTreeSet<String> = fqns
            .into_iter()
            .map(|fqn| dotted(fqn.as_ref()))
            .collect();
        let names = match strategy {
            NamingStrategy::Fqn => fqns
                .into_iter()
                .map(|fqn| {
                    let key = escape(&fqn);
                    (fqn, key)
                })
                .collect(),
            NamingStrategy::Simple => shortest_unique(fqns),
        };
        Self { names }
    }

    /// Component key of `fqn` (leading dot optional).
    #[must_use]
    pub fn get(&self, fqn: &str) -> Option<&str> {
        if fqn.starts_with('.') {
            self.names.get(fqn)
        } else {
            self.names.get(&dotted(fqn))
        }
        .map(String::as_str)
    }

    /// `true` when some type already resolved to `key`.
    #[must_use]
    pub fn is_taken(&self, key: &str) -> bool {
        self.names.values().any(|k| k == key)
    }

    /// `(fqn, key)` pairs sorted by fully-qualified name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of resolved names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// `true` when nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn dotted(fqn: &str) -> String {
    if fqn.starts_with('.') {
        fqn.to_string()
    } else {
        format!(".{fqn}")
    }
}

/// `.lib.v1.Book` → `lib.v1.Book`; characters outside `[A-Za-z0-9._-]` become `_`.
fn escape(fqn: &str) -> String {
    fqn.trim_start_matches('.')
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// For each name pick the shortest trailing segment run that no other name
/// shares at the same depth. Names that are never unique keep their full form.
fn shortest_unique(fqns: BTreeSet<String>) -> BTreeMap<String, String> {
    let split: Vec<(String, Vec<&str>)> = fqns
        .iter()
        .map(|fqn| (fqn.clone(), fqn.trim_start_matches('.').split('.').collect()))
        .collect();

    let mut suffix_counts: HashMap<String, usize> = HashMap::new();
    for (_, segments) in &split {
        for depth in 1..=segments.len() {
            *suffix_counts.entry(suffix(segments, depth)).or_default() += 1;
        }
    }

    split
        .iter()
        .map(|(fqn, segments)| {
            let key = (1..=segments.len())
                .map(|depth| suffix(segments, depth))
                .find(|candidate| suffix_counts.get(candidate) == Some(&1))
                .unwrap_or_else(|| escape(fqn));
            (fqn.clone(), escape(&key))
        })
        .collect()
}

fn suffix(segments: &[&str], depth: usize) -> String {
    segments[segments.len() - depth..].join(".")
}
