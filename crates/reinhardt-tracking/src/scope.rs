//! Scoped release of the nodes of one unit-of-work pass.

use std::rc::Rc;

use crate::data::FieldMap;
use crate::node::Node;
use crate::settings::TrackingSettings;
use crate::status::NodeStatus;

/// Owner of every node created during one unit-of-work pass
///
/// Nodes handed out by [`TrackingScope::track`] share the scope's settings.
/// Closing (or dropping) the scope tears every node down, so no listener
/// table outlives the pass it belongs to even if a consumer still holds an
/// `Rc` to the node.
///
/// # Examples
///
/// ```
/// use reinhardt_tracking::{field_map, NodeStatus, TrackingScope, TrackingSettings};
/// use serde_json::json;
///
/// let mut scope = TrackingScope::new(TrackingSettings::default());
/// let user = scope.track(NodeStatus::New, field_map(json!({"id": null})).unwrap(), "user");
/// user.set_status(NodeStatus::ScheduledInsert);
///
/// assert_eq!(scope.dirty().count(), 1);
/// assert_eq!(scope.close(), 1);
/// assert!(user.data().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct TrackingScope {
	settings: TrackingSettings,
	nodes: Vec<Rc<Node>>,
}

impl TrackingScope {
	pub fn new(settings: TrackingSettings) -> Self {
		Self {
			settings,
			nodes: Vec::new(),
		}
	}

	pub fn settings(&self) -> &TrackingSettings {
		&self.settings
	}

	/// Create a node bound to this scope
	pub fn track(
		&mut self,
		status: NodeStatus,
		data: FieldMap,
		role: impl Into<String>,
	) -> Rc<Node> {
		let node = Rc::new(Node::with_settings(self.settings, status, data, role));
		self.nodes.push(Rc::clone(&node));
		node
	}

	/// Tracked nodes in creation order
	pub fn nodes(&self) -> &[Rc<Node>] {
		&self.nodes
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Nodes holding uncommitted changes or pending listeners
	pub fn dirty(&self) -> impl Iterator<Item = &Rc<Node>> {
		self.nodes.iter().filter(|node| node.has_state())
	}

	/// End the pass, returning how many nodes were released
	pub fn close(mut self) -> usize {
		self.release()
	}

	fn release(&mut self) -> usize {
		let nodes = std::mem::take(&mut self.nodes);
		for node in &nodes {
			node.teardown();
		}
		if !nodes.is_empty() {
			tracing::debug!(released = nodes.len(), "Tracking scope closed");
		}
		nodes.len()
	}
}

impl Drop for TrackingScope {
	fn drop(&mut self) {
		self.release();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::field_map;
	use crate::propagation::{Consumer, Producer, Stream, as_consumer};
	use crate::settings::DroppedListenerLog;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn scope() -> TrackingScope {
		TrackingScope::new(
			TrackingSettings::default().with_dropped_listeners(DroppedListenerLog::Debug),
		)
	}

	#[rstest]
	fn test_track_shares_settings(mut scope: TrackingScope) {
		let node = scope.track(NodeStatus::New, FieldMap::new(), "user");

		assert_eq!(node.settings(), scope.settings());
		assert_eq!(scope.len(), 1);
		assert!(Rc::ptr_eq(&scope.nodes()[0], &node));
	}

	#[rstest]
	fn test_dirty_lists_nodes_with_live_state(mut scope: TrackingScope) {
		// Arrange
		let clean = scope.track(NodeStatus::Loaded, FieldMap::new(), "user");
		let touched = scope.track(NodeStatus::New, FieldMap::new(), "post");

		// Act
		touched.set_status(NodeStatus::ScheduledInsert);

		// Assert
		let dirty: Vec<_> = scope.dirty().collect();
		assert_eq!(dirty.len(), 1);
		assert!(Rc::ptr_eq(dirty[0], &touched));
		assert!(!clean.has_state());
	}

	#[rstest]
	fn test_close_releases_unresolved_listeners(mut scope: TrackingScope) {
		// Arrange
		let user = scope.track(NodeStatus::New, field_map(json!({"id": null})).unwrap(), "user");
		let post = scope.track(NodeStatus::New, FieldMap::new(), "post");
		user.listen("id", as_consumer(&post), "author_id", false, Stream::Data);

		// Act
		let released = scope.close();

		// Assert
		assert_eq!(released, 2);
		assert!(!user.has_state());
		user.register("id", json!(1), false, Stream::Data);
		assert_eq!(post.get("author_id"), None);
	}

	#[rstest]
	fn test_drop_tears_nodes_down(mut scope: TrackingScope) {
		let user = scope.track(NodeStatus::Loaded, field_map(json!({"id": 1})).unwrap(), "user");
		user.set_relation("team", json!(2));

		drop(scope);

		assert!(user.data().is_empty());
		assert!(user.relations().is_empty());
	}
}
