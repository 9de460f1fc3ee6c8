//! Field data and change sets.

use serde_json::Value as JsonValue;

use crate::error::{TrackingError, TrackingResult};

/// Mapping from field name to value for one entity.
pub type FieldMap = serde_json::Map<String, JsonValue>;

/// Convert a JSON object into a [`FieldMap`].
///
/// # Examples
///
/// ```
/// use reinhardt_tracking::field_map;
/// use serde_json::json;
///
/// let data = field_map(json!({"id": 1, "name": "alice"})).unwrap();
/// assert_eq!(data["name"], json!("alice"));
///
/// assert!(field_map(json!([1, 2])).is_err());
/// ```
pub fn field_map(value: JsonValue) -> TrackingResult<FieldMap> {
	match value {
		JsonValue::Object(map) => Ok(map),
		other => Err(TrackingError::NotAnObject(json_kind(&other).to_string())),
	}
}

/// Whether a value counts as produced.
///
/// Null is a placeholder for a value that is still to come (an unassigned
/// primary key, for instance) and never satisfies a listener.
pub fn is_available(value: Option<&JsonValue>) -> bool {
	matches!(value, Some(v) if !v.is_null())
}

/// Entries of `live` that are new or differ from `baseline`.
///
/// Keys present in `baseline` but missing from `live` are not reported.
pub fn diff(live: &FieldMap, baseline: &FieldMap) -> FieldMap {
	live.iter()
		.filter(|(key, value)| baseline.get(key.as_str()) != Some(*value))
		.map(|(key, value)| (key.clone(), value.clone()))
		.collect()
}

fn json_kind(value: &JsonValue) -> &'static str {
	match value {
		JsonValue::Null => "null",
		JsonValue::Bool(_) => "bool",
		JsonValue::Number(_) => "number",
		JsonValue::String(_) => "string",
		JsonValue::Array(_) => "array",
		JsonValue::Object(_) => "object",
	}
}
