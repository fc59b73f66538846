//! Label sets and name validation.
//!
//! A `LabelSet` is the series key inside a family. Pairs are kept in a
//! `BTreeMap`, so equality, hashing and ordering depend only on content and
//! never on insertion order.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{MetricsError, Result};

/// Metric names: `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Label names: `[a-zA-Z_][a-zA-Z0-9_]*`.
pub fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn check_metric_name(name: &str) -> Result<()> {
    if is_valid_metric_name(name) {
        Ok(())
    } else {
        Err(MetricsError::InvalidName(name.to_string()))
    }
}

/// Pattern check plus the `__` prefix, which is reserved for internal use.
pub(crate) fn check_label_name(name: &str) -> Result<()> {
    if is_valid_label_name(name) && !name.starts_with("__") {
        Ok(())
    } else {
        Err(MetricsError::InvalidLabelName(name.to_string()))
    }
}

/// Immutable, order-independent set of `(name, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelSet {
    pairs: BTreeMap<String, String>,
}

impl LabelSet {
    /// The empty label set (a family's single unlabelled series).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from pairs. Fails on an invalid or duplicated label name.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (k, v) in pairs {
            let k = k.into();
            check_label_name(&k)?;
            if map.contains_key(&k) {
                return Err(MetricsError::DuplicateLabel(k));
            }
            map.insert(k, v.into());
        }
        Ok(Self { pairs: map })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pairs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in label-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// First label name present in both sets, if any.
    pub(crate) fn first_overlap(&self, other: &LabelSet) -> Option<&str> {
        self.pairs
            .keys()
            .find(|k| other.pairs.contains_key(k.as_str()))
            .map(String::as_str)
    }

    /// Union of two disjoint sets, used to attach constant labels at collect time.
    pub(crate) fn union(&self, other: &LabelSet) -> LabelSet {
        let mut pairs = self.pairs.clone();
        for (k, v) in &other.pairs {
            pairs.insert(k.clone(), v.clone());
        }
        LabelSet { pairs }
    }
}

impl<'a> TryFrom<&[(&'a str, &'a str)]> for LabelSet {
    type Error = MetricsError;

    fn try_from(pairs: &[(&'a str, &'a str)]) -> Result<Self> {
        Self::from_pairs(pairs.iter().copied())
    }
}

impl<'a, const N: usize> TryFrom<[(&'a str, &'a str); N]> for LabelSet {
    type Error = MetricsError;

    fn try_from(pairs: [(&'a str, &'a str); N]) -> Result<Self> {
        Self::from_pairs(pairs)
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{k}={v:?}")?;
        }
        f.write_str("}")
    }
}
