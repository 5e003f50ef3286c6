//! Scope Set
//!
//! Unordered collection of scope tokens with a space separated string form.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Set of scope tokens.
///
/// Tokens are unique and never contain whitespace. Equality ignores order;
/// the string form keeps first-insertion order so that rendering a parsed
/// set reproduces its tokens.
#[derive(Clone, Debug, Default)]
pub struct ScopeSet {
    tokens: Vec<String>,
}

impl ScopeSet {
    /// Create an empty scope set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a space separated scope string. Runs of whitespace and
    /// duplicate tokens collapse.
    pub fn parse(text: &str) -> Self {
        text.split_whitespace().collect()
    }

    /// Add a token. Returns false when nothing new was added.
    pub fn insert(&mut self, token: &str) -> bool {
        let mut added = false;
        for part in token.split_whitespace() {
            if !self.contains(part) {
                self.tokens.push(part.to_string());
                added = true;
            }
        }
        added
    }

    /// Check if a single token is present.
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Check if every token of `other` is present in this set.
    pub fn includes(&self, other: &ScopeSet) -> bool {
        other.tokens.iter().all(|t| self.contains(t))
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

impl PartialEq for ScopeSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.includes(other)
    }
}

impl Eq for ScopeSet {}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}

impl FromStr for ScopeSet {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for ScopeSet {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl<S: AsRef<str>> FromIterator<S> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for token in iter {
            set.insert(token.as_ref());
        }
        set
    }
}

impl Serialize for ScopeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScopeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse(&text))
    }
}
