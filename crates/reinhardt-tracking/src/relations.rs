//! Name-keyed storage for relation references.

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Relation references of one entity, keyed by relation name.
///
/// References are opaque to the tracking core; the relation layer decides
/// what they hold (a related key, a list of keys, a serialized reference).
///
/// # Examples
///
/// ```
/// use reinhardt_tracking::RelationMap;
/// use serde_json::json;
///
/// let mut relations = RelationMap::new();
/// relations.set("author", json!({"role": "user", "id": 7}));
///
/// assert!(relations.has("author"));
/// assert_eq!(relations.get("author"), Some(&json!({"role": "user", "id": 7})));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationMap {
	entries: BTreeMap<String, JsonValue>,
}

impl RelationMap {
	/// Create an empty relation table
	pub fn new() -> Self {
		Self::default()
	}

	/// Store a reference, replacing any previous one under the same name
	pub fn set(&mut self, name: impl Into<String>, relation: JsonValue) {
		self.entries.insert(name.into(), relation);
	}

	pub fn get(&self, name: &str) -> Option<&JsonValue> {
		self.entries.get(name)
	}

	pub fn has(&self, name: &str) -> bool {
		self.entries.contains_key(name)
	}

	pub fn remove(&mut self, name: &str) -> Option<JsonValue> {
		self.entries.remove(name)
	}

	/// Iterate over references in name order
	pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
		self.entries.iter().map(|(name, relation)| (name.as_str(), relation))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}
}

impl IntoIterator for RelationMap {
	type Item = (String, JsonValue);
	type IntoIter = std::collections::btree_map::IntoIter<String, JsonValue>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.into_iter()
	}
}
