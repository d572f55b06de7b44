// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Label sets: the grouping key of every stream pushed to Loki.

use fnv::{FnvBuildHasher, FnvHasher};
use hashbrown::HashMap;
use std::fmt::{self, Write};
use std::hash::Hasher;

/// Fingerprint reserved for the empty label set.
pub const EMPTY_FINGERPRINT: u64 = 0;

/// A mapping from label name to label value.
///
/// Names are unique within a set; inserting an existing name overwrites its
/// value. Rendering and fingerprinting are independent of insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSet {
    values: HashMap<String, String, FnvBuildHasher>,
}

impl LabelSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites `name`, returning the set for chaining.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Owned variant of [`LabelSet::set`] for building a set in one expression.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns a new set holding `self` overlaid with `extra`.
    ///
    /// On a name present in both, the value from `extra` wins. Neither input
    /// is modified.
    #[must_use]
    pub fn merge(&self, extra: &LabelSet) -> LabelSet {
        let mut merged = self.clone();
        for (name, value) in &extra.values {
            merged.values.insert(name.clone(), value.clone());
        }
        merged
    }

    /// Canonical `{name="value", ...}` form, pairs sorted by their rendering.
    ///
    /// Values are quoted with Go string-literal escapes, the syntax the push
    /// endpoint parses label strings with.
    #[must_use]
    pub fn render(&self) -> String {
        let mut pairs: Vec<String> = self
            .values
            .iter()
            .map(|(name, value)| {
                let mut pair = String::with_capacity(name.len() + value.len() + 3);
                pair.push_str(name);
                pair.push('=');
                quote_into(&mut pair, value);
                pair
            })
            .collect();
        pairs.sort_unstable();
        format!("{{{}}}", pairs.join(", "))
    }

    /// 64-bit FNV-1a digest over the sorted `name:value` pairs.
    ///
    /// The empty set always maps to [`EMPTY_FINGERPRINT`].
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        if self.values.is_empty() {
            return EMPTY_FINGERPRINT;
        }

        let mut pairs: Vec<String> = self
            .values
            .iter()
            .map(|(name, value)| format!("{name}:{value}"))
            .collect();
        pairs.sort_unstable();

        let mut hasher = FnvHasher::default();
        for pair in &pairs {
            hasher.write(pair.as_bytes());
        }
        hasher.finish()
    }
}

/// Appends `value` as a double-quoted Go string literal.
///
/// Printable characters are copied as is. Control characters use the short
/// escapes where Go has one, `\xNN` below U+0080, and `\uNNNN` or
/// `\UNNNNNNNN` above.
fn quote_into(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0b}' => out.push_str("\\v"),
            c if is_printable(c) => out.push(c),
            c if c < ' ' || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", u32::from(c));
            }
            c if u32::from(c) < 0x1_0000 => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => {
                let _ = write!(out, "\\U{:08x}", u32::from(c));
            }
        }
    }
    out.push('"');
}

/// Approximates Go's `unicode.IsPrint`: everything except control and
/// invisible format characters, and whitespace other than the ASCII space.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() || c.is_whitespace() {
        return false;
    }
    !matches!(
        c,
        '\u{ad}'
            | '\u{600}'..='\u{605}'
            | '\u{61c}'
            | '\u{6dd}'
            | '\u{70f}'
            | '\u{180e}'
            | '\u{200b}'..='\u{200f}'
            | '\u{202a}'..='\u{202e}'
            | '\u{2060}'..='\u{206f}'
            | '\u{feff}'
            | '\u{fff9}'..='\u{fffb}'
            | '\u{e000}'..='\u{f8ff}'
            | '\u{f0000}'..='\u{10ffff}'
    )
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl<N, V> FromIterator<(N, V)> for LabelSet
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut labels = LabelSet::new();
        for (name, value) in iter {
            labels.set(name, value);
        }
        labels
    }
}
