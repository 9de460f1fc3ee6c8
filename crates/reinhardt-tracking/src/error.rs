//! Error types for entity tracking.
//!
//! Tracking itself never fails; these errors come from the conversion and
//! configuration entry points that sit between the mapping layer and the core.

use thiserror::Error;

/// Errors raised while feeding external input into the tracking core.
#[derive(Debug, Error)]
pub enum TrackingError {
	/// An integer status code outside the known lifecycle stages.
	#[error("Unknown node status: {0}")]
	UnknownStatus(i64),

	/// Field data was expected to be a JSON object.
	#[error("Field data must be a JSON object, got {0}")]
	NotAnObject(String),

	/// Tracking settings could not be parsed.
	#[error("Settings error: {0}")]
	Settings(#[from] toml::de::Error),
}

/// Result type alias for tracking operations.
pub type TrackingResult<T> = Result<T, TrackingError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_unknown_status_error() {
		let error = TrackingError::UnknownStatus(9);
		assert_eq!(error.to_string(), "Unknown node status: 9");
	}

	#[rstest]
	fn test_not_an_object_error() {
		let error = TrackingError::NotAnObject("array".to_string());
		assert_eq!(
			error.to_string(),
			"Field data must be a JSON object, got array"
		);
	}

	#[rstest]
	fn test_settings_error_from() {
		let toml_error = toml::from_str::<toml::Table>("= broken").unwrap_err();
		let error: TrackingError = toml_error.into();
		assert!(matches!(error, TrackingError::Settings(_)));
	}
}
