//! Filter schema a source declares to the host, and the values the host hands back.
//!
//! A host renders each filter (currently only pickers), lets the user choose, and passes the
//! same map back with `value` set. An empty value means "no filter".

use crate::source::SourceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of input a host renders for a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterType {
    Picker,
}

/// One selectable option: label shown to the user, value sent to the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub label: String,
    pub value: String,
}

impl FilterOption {
    pub fn new(label: &str, value: &str) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

/// Single-select filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerFilter {
    pub label: String,
    /// Current selection; the declared default when returned by a source.
    pub value: String,
    pub options: Vec<FilterOption>,
    #[serde(rename = "type")]
    pub kind: FilterType,
}

impl PickerFilter {
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}

/// Filters keyed by name (e.g. "genre").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filters(BTreeMap<String, PickerFilter>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, filter: PickerFilter) {
        self.0.insert(key.into(), filter);
    }

    pub fn get(&self, key: &str) -> Option<&PickerFilter> {
        self.0.get(key)
    }

    /// Current value of a filter, or "" when the key is not present.
    pub fn value(&self, key: &str) -> &str {
        self.0.get(key).map(|f| f.value.as_str()).unwrap_or("")
    }

    /// Set the value of a declared filter. The value must be one of its options.
    pub fn with_value(mut self, key: &str, value: &str) -> Result<Self, SourceError> {
        let filter = self
            .0
            .get_mut(key)
            .filter(|f| f.has_option(value))
            .ok_or_else(|| SourceError::UnknownFilterValue {
                key: key.to_string(),
                value: value.to_string(),
            })?;
        filter.value = value.to_string();
        Ok(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PickerFilter)> {
        self.0.iter()
    }
}
