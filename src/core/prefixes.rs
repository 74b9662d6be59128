//! core::prefixes
//!
//! Database identifier prefixes: named numeric bases used to turn legacy
//! database text codes (`"B007"`) into generated numeric values (`1007`).
//!
//! # Grammar
//!
//! A prefix spec is a `|`-separated list of segments:
//! - `NAME` gets an automatic base: 1 for the first such segment, then
//!   1001, 2001, ... for each following automatic segment
//! - `NAME=INTEGER` gets the explicit base
//!
//! Segments are trimmed and empty segments are skipped. Prefix names are
//! case-sensitive and must be unique.
//!
//! # Canonical form
//!
//! [`PrefixMap::format`] always writes explicit `NAME=INTEGER` segments in
//! ordinal key order, so `parse(format(parse(s))) == parse(s)`.
//!
//! # Example
//!
//! ```
//! use cgmeta::core::prefixes::PrefixMap;
//!
//! let prefixes = PrefixMap::parse("HB|RT").unwrap();
//! assert_eq!(prefixes.get("HB"), Some(1));
//! assert_eq!(prefixes.get("RT"), Some(1001));
//! assert_eq!(prefixes.format(), "HB=1|RT=1001");
//!
//! let prefixes = PrefixMap::parse("B=1000").unwrap();
//! assert_eq!(prefixes.resolve_value("B007").unwrap(), 1007);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Segment separator in a prefix spec.
pub const SEGMENT_SEPARATOR: char = '|';

/// Base assigned to the first automatic segment.
pub const FIRST_AUTO_BASE: i32 = 1;

/// Distance between consecutive automatic bases.
pub const AUTO_BASE_STEP: i32 = 1000;

/// Errors from parsing prefix specs and resolving database keys.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrefixError {
    /// A segment has an empty name or a non-integer base.
    #[error("malformed prefix segment '{segment}': {reason}")]
    MalformedPrefixSpec { segment: String, reason: String },

    /// The same prefix name appears twice.
    #[error("duplicate database identifier prefix '{0}'")]
    DuplicatePrefix(String),

    /// No prefix in a non-empty set matches the key.
    #[error("the database identifier '{key}' does not have a prefix in the set {{{prefixes}}}")]
    UnrecognizedPrefix { key: String, prefixes: String },

    /// The key without its prefix is not an integer.
    #[error("the database identifier '{0}' cannot be converted to an integer value")]
    InvalidNumericSuffix(String),

    /// Base plus suffix does not fit in an `i32`.
    #[error("the value of database identifier '{0}' overflows a 32-bit integer")]
    ValueOverflow(String),
}

/// Ordered mapping from database prefix to numeric base.
///
/// Keys are ordered by ordinal (byte) comparison, which is also the order
/// used when formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixMap(BTreeMap<String, i32>);

impl PrefixMap {
    /// Create an empty map. An empty map disables prefix validation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a prefix spec such as `"HB|RT"` or `"B=1000|X"`.
    ///
    /// # Errors
    ///
    /// - [`PrefixError::MalformedPrefixSpec`] if a segment has an empty name
    ///   or a non-integer base
    /// - [`PrefixError::DuplicatePrefix`] if a name appears twice
    pub fn parse(spec: &str) -> Result<Self, PrefixError> {
        let mut map = BTreeMap::new();
        let mut next_base = FIRST_AUTO_BASE;

        for segment in spec
            .split(SEGMENT_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let (name, base) = match segment.split_once('=') {
                Some((name, base)) => {
                    let base = base.trim().parse::<i32>().map_err(|e| {
                        PrefixError::MalformedPrefixSpec {
                            segment: segment.to_string(),
                            reason: format!("invalid base '{}': {}", base.trim(), e),
                        }
                    })?;
                    (name.trim(), base)
                }
                None => {
                    let base = next_base;
                    next_base = next_base.saturating_add(AUTO_BASE_STEP);
                    (segment, base)
                }
            };

            if name.is_empty() {
                return Err(PrefixError::MalformedPrefixSpec {
                    segment: segment.to_string(),
                    reason: "prefix name cannot be empty".into(),
                });
            }

            if map.insert(name.to_string(), base).is_some() {
                return Err(PrefixError::DuplicatePrefix(name.to_string()));
            }
        }

        Ok(Self(map))
    }

    /// Render the canonical `NAME=INTEGER|NAME=INTEGER` form.
    ///
    /// Returns an empty string for an empty map.
    pub fn format(&self) -> String {
        self.0
            .iter()
            .map(|(name, base)| format!("{name}={base}"))
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Whether no prefixes are configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of configured prefixes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Base for a prefix name.
    pub fn get(&self, name: &str) -> Option<i32> {
        self.0.get(name).copied()
    }

    /// Iterate over `(prefix, base)` in ordinal key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> + '_ {
        self.0.iter().map(|(name, base)| (name.as_str(), *base))
    }

    /// Longest configured prefix that `key` starts with.
    pub fn matching_prefix(&self, key: &str) -> Option<(&str, i32)> {
        self.iter()
            .filter(|(name, _)| key.starts_with(name))
            .max_by_key(|(name, _)| name.len())
    }

    /// Check that `key` carries one of the configured prefixes.
    ///
    /// Always succeeds when the map is empty.
    pub fn check_key(&self, key: &str) -> Result<(), PrefixError> {
        if self.is_empty() || self.matching_prefix(key).is_some() {
            return Ok(());
        }

        Err(PrefixError::UnrecognizedPrefix {
            key: key.to_string(),
            prefixes: self.0.keys().cloned().collect::<Vec<_>>().join(","),
        })
    }

    /// Convert a database key to its numeric value: the base of the matching
    /// prefix plus the integer that follows the prefix.
    ///
    /// With an empty map the whole key is parsed and the base is 0.
    pub fn resolve_value(&self, key: &str) -> Result<i32, PrefixError> {
        self.check_key(key)?;

        let (prefix_len, base) = self
            .matching_prefix(key)
            .map(|(name, base)| (name.len(), base))
            .unwrap_or((0, 0));

        let number = key[prefix_len..]
            .parse::<i32>()
            .map_err(|_| PrefixError::InvalidNumericSuffix(key.to_string()))?;

        base.checked_add(number)
            .ok_or_else(|| PrefixError::ValueOverflow(key.to_string()))
    }
}

impl fmt::Display for PrefixMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl std::str::FromStr for PrefixMap {
    type Err = PrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<S: Into<String>> FromIterator<(S, i32)> for PrefixMap {
    fn from_iter<I: IntoIterator<Item = (S, i32)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
