//! Header precedence merge
//!
//! Four scopes feed every request, lowest to highest precedence: contract
//! defaults, client-instance headers, operation headers, then header-bound
//! call arguments. Keys compare case-insensitively and are stored lowercased.

use std::collections::btree_map;
use std::collections::BTreeMap;

/// Case-insensitive header mapping with deterministic (sorted) iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: BTreeMap<String, String>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `name`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into().to_ascii_lowercase();
        self.entries.insert(name, value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.remove(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Apply `other` on top of `self`; keys present in both take `other`'s value.
    pub fn overlay(&mut self, other: &HeaderSet) {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for HeaderSet {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for HeaderSet {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Merge the four header scopes into the effective headers of one request.
///
/// Missing scopes are simply empty; there is no failure mode.
pub fn merge_headers(
    contract: &HeaderSet,
    instance: &HeaderSet,
    operation: &[(String, String)],
    arguments: &[(String, String)],
) -> HeaderSet {
    let mut merged = HeaderSet::new();
    merged.overlay(contract);
    merged.overlay(instance);
    merged.extend(operation.iter().map(|(n, v)| (n.as_str(), v.as_str())));
    merged.extend(arguments.iter().map(|(n, v)| (n.as_str(), v.as_str())));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn insert_is_case_insensitive() {
        let mut set = HeaderSet::new();
        set.insert("Content-Type", "text/plain");
        let previous = set.insert("content-type", "application/json");
        assert_eq!(previous.as_deref(), Some("text/plain"));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("CONTENT-TYPE"), Some("application/json"));
        assert!(set.contains("Content-type"));
    }

    #[test]
    fn iteration_is_sorted_and_lowercased() {
        let set: HeaderSet = [("X-B", "2"), ("x-a", "1"), ("Accept", "*/*")]
            .into_iter()
            .collect();
        let keys: Vec<&str> = set.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["accept", "x-a", "x-b"]);
    }

    #[test]
    fn merge_highest_precedence_wins() {
        let contract: HeaderSet = [("X-Trace", "contract"), ("Accept", "text/plain")]
            .into_iter()
            .collect();
        let instance: HeaderSet = [("x-trace", "instance"), ("X-Key", "k")]
            .into_iter()
            .collect();
        let operation = pairs(&[("X-Trace", "a"), ("Accept", "application/json")]);
        let arguments = pairs(&[("X-TRACE", "b")]);

        let merged = merge_headers(&contract, &instance, &operation, &arguments);
        assert_eq!(merged.get("x-trace"), Some("b"));
        assert_eq!(merged.get("accept"), Some("application/json"));
        assert_eq!(merged.get("x-key"), Some("k"));
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn merge_instance_overrides_contract() {
        let contract: HeaderSet = [("Authorization", "old")].into_iter().collect();
        let instance: HeaderSet = [("authorization", "new")].into_iter().collect();
        let merged = merge_headers(&contract, &instance, &[], &[]);
        assert_eq!(merged.get("Authorization"), Some("new"));
    }

    #[test]
    fn merge_content_type_across_scopes_yields_one_entry() {
        let contract: HeaderSet = [("Content-Type", "text/plain")].into_iter().collect();
        let operation = pairs(&[("content-type", "application/x-www-form-urlencoded")]);
        let merged = merge_headers(&contract, &HeaderSet::new(), &operation, &[]);
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged.get("Content-Type"),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn merge_later_operation_header_wins_within_scope() {
        let operation = pairs(&[("X-Mode", "first"), ("x-mode", "second")]);
        let merged = merge_headers(&HeaderSet::new(), &HeaderSet::new(), &operation, &[]);
        assert_eq!(merged.get("X-Mode"), Some("second"));
    }

    #[test]
    fn merge_all_empty_is_empty() {
        let merged = merge_headers(&HeaderSet::new(), &HeaderSet::new(), &[], &[]);
        assert!(merged.is_empty());
    }
}
