//! Tracking configuration
//!
//! Settings are plain serde data so they can live in a project's settings
//! file next to the database configuration:
//!
//! ```toml
//! dropped_listeners = "debug"
//! trace_propagation = true
//! ```

use serde::{Deserialize, Serialize};

use crate::error::TrackingResult;

/// How to report subscriptions that are discarded before their value was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroppedListenerLog {
	/// Drop silently
	Ignore,
	/// Emit a `debug` event
	Debug,
	/// Emit a `warn` event
	#[default]
	Warn,
}

/// Settings shared by every node of a tracking scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingSettings {
	/// Reporting level for unresolved subscriptions lost on reset, sync or teardown
	pub dropped_listeners: DroppedListenerLog,

	/// Emit a `trace` event for every delivered value
	pub trace_propagation: bool,
}

impl TrackingSettings {
	/// Parse settings from a TOML fragment
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_tracking::{DroppedListenerLog, TrackingSettings};
	///
	/// let settings = TrackingSettings::from_toml_str("dropped_listeners = \"ignore\"").unwrap();
	/// assert_eq!(settings.dropped_listeners, DroppedListenerLog::Ignore);
	/// assert!(!settings.trace_propagation);
	/// ```
	pub fn from_toml_str(source: &str) -> TrackingResult<Self> {
		Ok(toml::from_str(source)?)
	}

	pub fn with_dropped_listeners(mut self, log: DroppedListenerLog) -> Self {
		self.dropped_listeners = log;
		self
	}

	pub fn with_trace_propagation(mut self, enabled: bool) -> Self {
		self.trace_propagation = enabled;
		self
	}
}
