//! Entity lifecycle stages.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TrackingError;

/// Lifecycle stage of a tracked entity.
///
/// The discriminants are fixed and ordered; mapping layers that persist the
/// status as an integer can rely on them. No transition table is enforced:
/// the unit of work moves entities between stages as it sees fit.
///
/// # Examples
///
/// ```
/// use reinhardt_tracking::NodeStatus;
///
/// let status = NodeStatus::try_from(3_i64).unwrap();
/// assert_eq!(status, NodeStatus::ScheduledInsert);
/// assert!(status.is_scheduled());
/// assert_eq!(status.to_string(), "scheduled_insert");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum NodeStatus {
	/// Identity is known but the row has not been read yet (forward reference)
	Promised = 0,
	/// Constructed in memory, never persisted
	New = 1,
	/// Reflects a persisted row
	Loaded = 2,
	/// Queued for insertion in the next persistence pass
	ScheduledInsert = 3,
	/// Queued for update in the next persistence pass
	ScheduledUpdate = 4,
	/// Queued for deletion in the next persistence pass
	ScheduledDelete = 5,
}

impl NodeStatus {
	/// All stages in discriminant order.
	pub const ALL: [NodeStatus; 6] = [
		NodeStatus::Promised,
		NodeStatus::New,
		NodeStatus::Loaded,
		NodeStatus::ScheduledInsert,
		NodeStatus::ScheduledUpdate,
		NodeStatus::ScheduledDelete,
	];

	/// Integer code of this stage
	pub const fn as_u8(self) -> u8 {
		self as u8
	}

	/// Name of this stage in snake_case
	pub const fn as_str(self) -> &'static str {
		match self {
			NodeStatus::Promised => "promised",
			NodeStatus::New => "new",
			NodeStatus::Loaded => "loaded",
			NodeStatus::ScheduledInsert => "scheduled_insert",
			NodeStatus::ScheduledUpdate => "scheduled_update",
			NodeStatus::ScheduledDelete => "scheduled_delete",
		}
	}

	/// Whether the entity is queued for the next persistence pass
	pub const fn is_scheduled(self) -> bool {
		matches!(
			self,
			NodeStatus::ScheduledInsert | NodeStatus::ScheduledUpdate | NodeStatus::ScheduledDelete
		)
	}

	/// Whether a row for the entity is known to exist in the database
	pub const fn is_persisted(self) -> bool {
		matches!(
			self,
			NodeStatus::Loaded | NodeStatus::ScheduledUpdate | NodeStatus::ScheduledDelete
		)
	}
}

impl TryFrom<i64> for NodeStatus {
	type Error = TrackingError;

	fn try_from(code: i64) -> Result<Self, Self::Error> {
		usize::try_from(code)
			.ok()
			.and_then(|index| Self::ALL.get(index).copied())
			.ok_or(TrackingError::UnknownStatus(code))
	}
}

impl From<NodeStatus> for u8 {
	fn from(status: NodeStatus) -> u8 {
		status.as_u8()
	}
}

impl fmt::Display for NodeStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
