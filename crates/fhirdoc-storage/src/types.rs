//! Types exchanged between the framework and providers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry in a resource's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry<R> {
    /// The resource as it was stored at this version.
    pub resource: R,
    /// The interaction that produced this version.
    pub method: HistoryMethod,
}

impl<R> HistoryEntry<R> {
    /// Creates a new `HistoryEntry`.
    #[must_use]
    pub fn new(resource: R, method: HistoryMethod) -> Self {
        Self { resource, method }
    }
}

/// The interaction that created a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMethod {
    /// Resource was created (POST).
    Create,
    /// Resource was updated (PUT).
    Update,
}

/// Search criteria as received from the client.
///
/// Providers are free to ignore any of them; the framework reports ignored
/// parameters back to the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    /// Parameters as key-value pairs; repeated keys keep every value.
    pub parameters: BTreeMap<String, Vec<String>>,
}

impl SearchParams {
    /// Creates new empty `SearchParams`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a search parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters
            .entry(key.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Parameter names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().map(String::as_str)
    }

    /// Returns true if this search has no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SearchParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |params, (k, v)| params.with_param(k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_params_builder() {
        let params = SearchParams::new()
            .with_param("title", "Summary")
            .with_param("title", "Note")
            .with_param("date", "2024-01-01");

        assert_eq!(params.parameters.get("title").unwrap().len(), 2);
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["date", "title"]);
        assert!(!params.is_empty());
        assert!(SearchParams::new().is_empty());
    }

    #[test]
    fn test_search_params_from_pairs() {
        let params: SearchParams = vec![("a", "1"), ("b", "2"), ("a", "3")]
            .into_iter()
            .collect();
        assert_eq!(params.parameters["a"], vec!["1", "3"]);
        assert_eq!(params.parameters["b"], vec!["2"]);
    }

    #[test]
    fn test_history_method_serialization() {
        let json = serde_json::to_string(&HistoryMethod::Update).unwrap();
        assert_eq!(json, "\"update\"");
    }
}
