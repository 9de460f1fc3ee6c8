//! # Reinhardt Unit of Work
//!
//! Entity state tracking for the Reinhardt ORM unit of work.
//!
//! ## Feature Flags
//!
//! - `tracking` (default) - Entity handles, change sets and key propagation
//!   (via `reinhardt-tracking`)
//!
//! ## Example
//!
//! ```
//! use reinhardt_uow::prelude::*;
//! use serde_json::json;
//!
//! let mut scope = TrackingScope::new(TrackingSettings::default());
//! let node = scope.track(NodeStatus::Loaded, field_map(json!({"name": "y"})).unwrap(), "user");
//!
//! node.set_data(field_map(json!({"name": "x"})).unwrap());
//! assert_eq!(node.sync_state()["name"], json!("x"));
//! ```

#[cfg(feature = "tracking")]
pub use reinhardt_tracking as tracking;

#[cfg(feature = "tracking")]
pub use reinhardt_tracking::{
	Node, NodeStatus, TrackingError, TrackingResult, TrackingScope, TrackingSettings,
};

/// Common imports
pub mod prelude {
	#[cfg(feature = "tracking")]
	pub use reinhardt_tracking::prelude::*;
}
