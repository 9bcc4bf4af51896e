//! Case-insensitive, order-preserving header table.
//!
//! # Design
//! Entries keep the canonical (lowercase) name for lookups next to the name
//! exactly as the caller last spelled it, which is what goes on the wire.
//! Deleting a header leaves a tombstone so that computed headers merged in a
//! later stage cannot bring it back; setting the header explicitly again
//! lifts the tombstone.

use tracing::trace;

use crate::error::NormalizeError;

/// A header value that is present on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Single(String),
    /// Written as one `Name: value` line per element, in order.
    Multi(Vec<String>),
}

impl FieldValue {
    /// Returns the value when it is a single string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Single(v) => Some(v),
            FieldValue::Multi(_) => None,
        }
    }

    pub fn values(&self) -> &[String] {
        match self {
            FieldValue::Single(v) => std::slice::from_ref(v),
            FieldValue::Multi(vs) => vs,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Single(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Single(v)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(vs: Vec<String>) -> Self {
        FieldValue::Multi(vs)
    }
}

/// What the caller asks to happen to a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    /// Insert or overwrite.
    Present(FieldValue),
    /// Remove the header and keep computed stages from re-adding it.
    Deleted,
    /// Leave an existing value alone; never materialize a missing one.
    Unchanged,
}

impl From<FieldValue> for HeaderValue {
    fn from(v: FieldValue) -> Self {
        HeaderValue::Present(v)
    }
}

impl From<&str> for HeaderValue {
    fn from(v: &str) -> Self {
        HeaderValue::Present(v.into())
    }
}

impl From<String> for HeaderValue {
    fn from(v: String) -> Self {
        HeaderValue::Present(v.into())
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(vs: Vec<String>) -> Self {
        HeaderValue::Present(vs.into())
    }
}

/// An ordered list of header instructions, applied with `HeaderTable::merge`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderPatch {
    entries: Vec<(String, HeaderValue)>,
}

impl HeaderPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reject names that are not HTTP tokens and values that could not be
    /// written as a header line. A present header must write at least one line.
    pub(crate) fn validate(&self) -> Result<(), NormalizeError> {
        for (name, value) in &self.entries {
            if http::HeaderName::from_bytes(name.as_bytes()).is_err() {
                return Err(NormalizeError::InvalidHeaderName(name.clone()));
            }
            if let HeaderValue::Present(field) = value {
                if field.values().is_empty() {
                    return Err(NormalizeError::InvalidHeaderValue { name: name.clone() });
                }
                for v in field.values() {
                    if http::HeaderValue::from_bytes(v.as_bytes()).is_err() {
                        return Err(NormalizeError::InvalidHeaderValue { name: name.clone() });
                    }
                }
            }
        }
        Ok(())
    }
}

impl<N: Into<String>, V: Into<HeaderValue>> FromIterator<(N, V)> for HeaderPatch {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut patch = HeaderPatch::new();
        for (n, v) in iter {
            patch.push(n, v);
        }
        patch
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    canonical: String,
    raw: String,
    value: FieldValue,
}

/// Header table for one outbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderTable {
    entries: Vec<Entry>,
    suppressed: Vec<String>,
}

impl HeaderTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.position(name).map(|i| &self.entries[i].value)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// True when the header was deleted and has not been set again since.
    pub fn is_suppressed(&self, name: &str) -> bool {
        let canonical = name.to_ascii_lowercase();
        self.suppressed.contains(&canonical)
    }

    pub fn set(&mut self, name: &str, value: impl Into<HeaderValue>) {
        let canonical = name.to_ascii_lowercase();
        match value.into() {
            HeaderValue::Present(value) => {
                self.suppressed.retain(|s| s != &canonical);
                match self.position(&canonical) {
                    Some(i) => {
                        let entry = &mut self.entries[i];
                        entry.raw = name.to_string();
                        entry.value = value;
                    }
                    None => self.entries.push(Entry {
                        canonical,
                        raw: name.to_string(),
                        value,
                    }),
                }
            }
            HeaderValue::Deleted => {
                self.entries.retain(|e| e.canonical != canonical);
                if !self.suppressed.contains(&canonical) {
                    self.suppressed.push(canonical);
                }
            }
            HeaderValue::Unchanged => {}
        }
    }

    /// Insert a derived value unless the header already exists or was
    /// deleted. Returns whether the value was inserted.
    pub fn set_computed(&mut self, name: &str, value: impl Into<FieldValue>) -> bool {
        if self.contains(name) || self.is_suppressed(name) {
            return false;
        }
        self.entries.push(Entry {
            canonical: name.to_ascii_lowercase(),
            raw: name.to_string(),
            value: value.into(),
        });
        true
    }

    /// Apply every instruction of `patch` with `set`, in order.
    pub fn merge(&mut self, patch: &HeaderPatch) {
        for (name, value) in patch.iter() {
            self.set(name, value.clone());
        }
    }

    /// Apply the present values of `patch` with `set_computed`, in order.
    pub fn merge_computed(&mut self, patch: &HeaderPatch) {
        for (name, value) in patch.iter() {
            if let HeaderValue::Present(v) = value {
                if !self.set_computed(name, v.clone()) {
                    trace!(name, "computed header not applied");
                }
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.position(name).map(|i| self.entries.remove(i).value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order, keyed by the name as last set.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|e| (e.raw.as_str(), &e.value))
    }

    /// One `(name, value)` pair per header line.
    pub fn iter_wire(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|e| e.value.values().iter().map(move |v| (e.raw.as_str(), v.as_str())))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.canonical.eq_ignore_ascii_case(name))
    }
}
