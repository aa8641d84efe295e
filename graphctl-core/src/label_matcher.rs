//! Label matcher codec.
//!
//! A label matcher selects the subgraphs that compose into a federated graph.
//! Each entry is `key=value`; a comma-joined group such as
//! `team=payments,env=prod` is one entry whose pairs must all hold. Entries
//! are OR-ed together by the control plane, so their order is kept exactly as
//! declared.
//!
//! The codec only checks syntax. Tokens are passed through byte-for-byte.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MatcherDefect, ValidationError};

/// A syntactically valid label matcher entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LabelMatcher(String);

impl LabelMatcher {
    /// Validate a single entry.
    pub fn parse(entry: &str) -> Result<Self, ValidationError> {
        for pair in entry.split(',') {
            if let Some(defect) = pair_defect(pair) {
                return Err(ValidationError::MalformedLabelMatcher {
                    entry: entry.to_owned(),
                    defect,
                });
            }
        }
        Ok(Self(entry.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `(key, value)` pairs of this entry, in declaration order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.split(',').filter_map(|pair| pair.split_once('='))
    }
}

fn pair_defect(pair: &str) -> Option<MatcherDefect> {
    match pair.split_once('=') {
        None => Some(MatcherDefect::MissingSeparator),
        Some((_, value)) if value.contains('=') => Some(MatcherDefect::MultipleSeparators),
        Some((key, _)) if key.trim().is_empty() => Some(MatcherDefect::EmptyKey),
        Some((_, value)) if value.trim().is_empty() => Some(MatcherDefect::EmptyValue),
        Some(_) => None,
    }
}

impl fmt::Display for LabelMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for LabelMatcher {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LabelMatcher {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LabelMatcher> for String {
    fn from(m: LabelMatcher) -> Self {
        m.0
    }
}

/// Validate an ordered list of raw entries.
///
/// Fails on the first malformed entry. An empty list is valid.
pub fn validate<S: AsRef<str>>(raw: &[S]) -> Result<Vec<LabelMatcher>, ValidationError> {
    raw.iter().map(|entry| LabelMatcher::parse(entry.as_ref())).collect()
}

/// Serialize matchers back to their string tokens, order preserved.
pub fn to_strings(matchers: &[LabelMatcher]) -> Vec<String> {
    matchers.iter().map(|m| m.0.clone()).collect()
}
