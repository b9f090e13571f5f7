// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Command template expansion.
//!
//! Every command a backend runs is written down as a __template__, i.e., a
//! plain command line like `clone -- {repo} {dir}`. Each `{key}` placeholder
//! is replaced at call time with a value from a [`Bindings`] set.
//!
//! # Expansion Rules
//!
//! Templates are split on whitespace into arguments _before_ any placeholder
//! is replaced. Thus, a bound value that contains spaces always stays inside
//! the one argument it was substituted into.
//!
//! Each argument is scanned exactly once from left to right. Text inserted for
//! a placeholder is never scanned again, so a value like `{dir}` bound to
//! `repo` shows up literally in the output. Because every placeholder is
//! resolved by direct lookup, the result never depends on the iteration order
//! of the bindings.
//!
//! Placeholders that have no binding are left in place verbatim. Backends are
//! free to pass their own brace syntax through to the external tool, e.g.,
//! `HEAD@{upstream}`.

use std::collections::HashMap;

/// Per-call mapping of placeholder names to replacement values.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Bindings {
    values: HashMap<String, String>,
}

impl Bindings {
    /// Construct empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key` to `value`, replacing any earlier binding of `key`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Lookup value bound to `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Check if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Bindings
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Expand command template into argument vector.
///
/// Splits `template` on whitespace, then replaces every bound `{key}` inside
/// each argument. Unbound placeholders pass through untouched.
pub fn expand(template: &str, bindings: &Bindings) -> Vec<String> {
    template
        .split_whitespace()
        .map(|arg| expand_arg(arg, bindings))
        .collect()
}

fn expand_arg(arg: &str, bindings: &Bindings) -> String {
    if bindings.is_empty() {
        return arg.to_string();
    }

    let mut out = String::with_capacity(arg.len());
    let mut rest = arg;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let candidate = &rest[open..];

        // INVARIANT: Key is everything between this brace and the next closing one.
        let hit = candidate[1..].find('}').and_then(|close| {
            bindings
                .get(&candidate[1..=close])
                .map(|value| (close, value))
        });

        match hit {
            Some((close, value)) => {
                out.push_str(value);
                rest = &candidate[close + 2..];
            }
            None => {
                out.push('{');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);

    out
}
