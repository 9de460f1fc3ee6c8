//! Entity handle
//!
//! A [`Node`] tracks one loaded or pending entity: its role, the baseline
//! status and data as of the last synchronization, the permanent relation
//! table, and (only while there are uncommitted changes) a live [`State`].
//!
//! ```
//! use reinhardt_tracking::{field_map, Node, NodeStatus};
//! use serde_json::json;
//!
//! let node = Node::new(NodeStatus::Loaded, field_map(json!({"name": "y"})).unwrap(), "user");
//!
//! node.set_data(field_map(json!({"name": "x"})).unwrap());
//! assert_eq!(node.data()["name"], json!("x"));
//!
//! let changes = node.sync_state();
//! assert_eq!(changes, field_map(json!({"name": "x"})).unwrap());
//! assert_eq!(node.status(), NodeStatus::Loaded);
//! assert!(node.sync_state().is_empty());
//! ```

use serde_json::Value as JsonValue;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Weak;

use crate::data::{self, FieldMap};
use crate::propagation::{self, Channel, Consumer, Producer, Stream, Subscription};
use crate::relations::RelationMap;
use crate::settings::TrackingSettings;
use crate::state::State;
use crate::status::NodeStatus;

/// Per-entity change tracker
///
/// Nodes are shared between the unit of work and the producers they listen
/// to, so every operation takes `&self`; wrap nodes in [`Rc`](std::rc::Rc)
/// to use them as consumers. A node is not `Sync` and must be driven from a
/// single thread.
#[derive(Debug)]
pub struct Node {
	role: String,
	settings: TrackingSettings,
	status: Cell<NodeStatus>,
	data: RefCell<FieldMap>,
	relations: RefCell<RelationMap>,
	state: RefCell<Option<State>>,
}

impl Node {
	/// Create a node with default settings
	pub fn new(status: NodeStatus, data: FieldMap, role: impl Into<String>) -> Self {
		Self::with_settings(TrackingSettings::default(), status, data, role)
	}

	pub fn with_settings(
		settings: TrackingSettings,
		status: NodeStatus,
		data: FieldMap,
		role: impl Into<String>,
	) -> Self {
		Self {
			role: role.into(),
			settings,
			status: Cell::new(status),
			data: RefCell::new(data),
			relations: RefCell::new(RelationMap::new()),
			state: RefCell::new(None),
		}
	}

	pub fn role(&self) -> &str {
		&self.role
	}

	pub fn settings(&self) -> &TrackingSettings {
		&self.settings
	}

	/// Live state, creating it from the baseline on first use
	///
	/// The returned guard must be released before values are propagated;
	/// holding it across [`Consumer::register`] or [`Producer::listen`] on the
	/// same node panics.
	pub fn ensure_mutable(&self) -> RefMut<'_, State> {
		RefMut::map(self.state.borrow_mut(), |slot| {
			slot.get_or_insert_with(|| {
				tracing::debug!(role = %self.role, "Materializing node state");
				State::new(self.status.get(), self.data.borrow().clone())
			})
		})
	}

	/// Live state, if one has been materialized
	pub fn state(&self) -> Option<Ref<'_, State>> {
		Ref::filter_map(self.state.borrow(), Option::as_ref).ok()
	}

	pub fn has_state(&self) -> bool {
		self.state.borrow().is_some()
	}

	pub fn status(&self) -> NodeStatus {
		match self.state.borrow().as_ref() {
			Some(state) => state.status(),
			None => self.status.get(),
		}
	}

	pub fn set_status(&self, status: NodeStatus) {
		self.ensure_mutable().set_status(status);
	}

	/// Current field data (live if touched, baseline otherwise)
	pub fn data(&self) -> FieldMap {
		match self.state.borrow().as_ref() {
			Some(state) => state.data().clone(),
			None => self.data.borrow().clone(),
		}
	}

	/// Current value of a single field
	pub fn get(&self, field: &str) -> Option<JsonValue> {
		match self.state.borrow().as_ref() {
			Some(state) => state.data().get(field).cloned(),
			None => self.data.borrow().get(field).cloned(),
		}
	}

	/// Merge `data` over the live data
	///
	/// Every entry is registered with `update`, so listeners waiting on a key
	/// that becomes available here are notified.
	pub fn set_data(&self, data: FieldMap) {
		drop(self.ensure_mutable());
		for (key, value) in data {
			self.register(&key, value, true, Stream::Data);
		}
	}

	/// Store a relation reference in the permanent table
	pub fn set_relation(&self, name: impl Into<String>, relation: JsonValue) {
		self.relations.borrow_mut().set(name, relation);
	}

	/// Relation reference by name, pending references first
	pub fn get_relation(&self, name: &str) -> Option<JsonValue> {
		let pending = self
			.state
			.borrow()
			.as_ref()
			.and_then(|state| state.relations().get(name).cloned());
		pending.or_else(|| self.relations.borrow().get(name).cloned())
	}

	pub fn has_relation(&self, name: &str) -> bool {
		let pending = self
			.state
			.borrow()
			.as_ref()
			.is_some_and(|state| state.relations().has(name));
		pending || self.relations.borrow().has(name)
	}

	/// Snapshot of the permanent relation table
	pub fn relations(&self) -> RelationMap {
		self.relations.borrow().clone()
	}

	/// Acknowledge a durable write and return the changed fields
	///
	/// Folds pending relations into the permanent table, lands on
	/// [`NodeStatus::Loaded`], promotes the live data to the new baseline and
	/// discards the live state. Fields removed from the live data are not part
	/// of the returned change set. Without a live state this is a no-op that
	/// returns an empty map.
	pub fn sync_state(&self) -> FieldMap {
		let state = self.state.borrow_mut().take();
		let Some(state) = state else {
			return FieldMap::new();
		};
		let (data, relations, listeners) = state.into_parts();

		let changes = data::diff(&data, &self.data.borrow());
		{
			let mut permanent = self.relations.borrow_mut();
			for (name, relation) in relations {
				permanent.set(name, relation);
			}
		}
		self.status.set(NodeStatus::Loaded);
		*self.data.borrow_mut() = data;

		self.report_dropped(&listeners, "sync");
		tracing::debug!(
			role = %self.role,
			changed = changes.len(),
			"Node state synchronized"
		);
		changes
	}

	/// Discard the live state without promoting it
	pub fn reset_state(&self) {
		let state = self.state.borrow_mut().take();
		if let Some(state) = state {
			self.report_dropped(state.listeners(), "reset");
			tracing::debug!(role = %self.role, "Node state reset");
		}
	}

	/// Release everything the node holds
	///
	/// Called when the owning unit-of-work pass ends. Baseline data, the
	/// permanent relations and the live state (with its listeners) are
	/// cleared; the role and status survive.
	pub fn teardown(&self) {
		let state = self.state.borrow_mut().take();
		if let Some(state) = state {
			self.report_dropped(state.listeners(), "teardown");
		}
		self.data.borrow_mut().clear();
		self.relations.borrow_mut().clear();
	}

	fn report_dropped(&self, listeners: &Channel, reason: &str) {
		listeners.report_unresolved(&self.role, reason, self.settings.dropped_listeners);
	}
}

impl Consumer for Node {
	fn register(&self, key: &str, value: JsonValue, update: bool, stream: Stream) {
		let delivery = self.ensure_mutable().store(key, value, update, stream);
		if let Some((value, subscriptions)) = delivery {
			propagation::dispatch(
				&self.role,
				key,
				&value,
				subscriptions,
				self.settings.trace_propagation,
			);
		}
	}
}

impl Producer for Node {
	fn listen(
		&self,
		key: &str,
		consumer: Weak<dyn Consumer>,
		target: &str,
		trigger: bool,
		stream: Stream,
	) {
		let subscription = Subscription::new(consumer, target, stream);
		let delivery = self.ensure_mutable().subscribe(key, subscription, trigger);
		if let Some((value, subscriptions)) = delivery {
			propagation::dispatch(
				&self.role,
				key,
				&value,
				subscriptions,
				self.settings.trace_propagation,
			);
		}
	}
}

impl Drop for Node {
	fn drop(&mut self) {
		if let Some(state) = self.state.get_mut().take() {
			self.report_dropped(state.listeners(), "drop");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::field_map;
	use crate::propagation::as_consumer;
	use rstest::{fixture, rstest};
	use serde_json::json;
	use std::rc::Rc;

	fn map(value: JsonValue) -> FieldMap {
		field_map(value).unwrap()
	}

	#[fixture]
	fn loaded() -> Node {
		Node::new(
			NodeStatus::Loaded,
			map(json!({"id": 1, "name": "y"})),
			"user",
		)
	}

	#[rstest]
	fn test_untouched_node_reads_baseline(loaded: Node) {
		assert_eq!(loaded.role(), "user");
		assert_eq!(loaded.status(), NodeStatus::Loaded);
		assert_eq!(loaded.data(), map(json!({"id": 1, "name": "y"})));
		assert!(!loaded.has_state());
	}

	#[rstest]
	fn test_set_status_materializes_state(loaded: Node) {
		// Act
		loaded.set_status(NodeStatus::ScheduledUpdate);

		// Assert
		assert!(loaded.has_state());
		assert_eq!(loaded.status(), NodeStatus::ScheduledUpdate);
		assert_eq!(loaded.data(), map(json!({"id": 1, "name": "y"})));
	}

	#[rstest]
	fn test_set_data_merges_over_live_data(loaded: Node) {
		loaded.set_data(map(json!({"name": "x"})));
		loaded.set_data(map(json!({"email": "x@example.com"})));

		assert_eq!(
			loaded.data(),
			map(json!({"id": 1, "name": "x", "email": "x@example.com"}))
		);
		assert_eq!(loaded.get("email"), Some(json!("x@example.com")));
	}

	#[rstest]
	fn test_sync_untouched_is_noop(loaded: Node) {
		let changes = loaded.sync_state();

		assert!(changes.is_empty());
		assert_eq!(loaded.status(), NodeStatus::Loaded);
		assert!(!loaded.has_state());
	}

	#[rstest]
	fn test_sync_returns_changes_and_promotes_baseline(loaded: Node) {
		// Arrange
		loaded.set_data(map(json!({"name": "x"})));

		// Act
		let changes = loaded.sync_state();

		// Assert
		assert_eq!(changes, map(json!({"name": "x"})));
		assert_eq!(loaded.status(), NodeStatus::Loaded);
		assert_eq!(loaded.data(), map(json!({"id": 1, "name": "x"})));
		assert!(!loaded.has_state());
		assert!(loaded.sync_state().is_empty());
	}

	#[rstest]
	#[case(NodeStatus::Promised)]
	#[case(NodeStatus::New)]
	#[case(NodeStatus::Loaded)]
	#[case(NodeStatus::ScheduledInsert)]
	#[case(NodeStatus::ScheduledUpdate)]
	#[case(NodeStatus::ScheduledDelete)]
	fn test_sync_always_lands_on_loaded(#[case] status: NodeStatus) {
		let node = Node::new(NodeStatus::New, FieldMap::new(), "user");
		node.set_status(status);

		node.sync_state();

		assert_eq!(node.status(), NodeStatus::Loaded);
	}

	#[rstest]
	fn test_reset_restores_baseline(loaded: Node) {
		// Arrange
		loaded.set_status(NodeStatus::ScheduledDelete);
		loaded.set_data(map(json!({"name": "x"})));

		// Act
		loaded.reset_state();

		// Assert
		assert!(!loaded.has_state());
		assert_eq!(loaded.status(), NodeStatus::Loaded);
		assert_eq!(loaded.data(), map(json!({"id": 1, "name": "y"})));
	}

	#[rstest]
	fn test_pending_relations_fold_into_permanent_table_on_sync(loaded: Node) {
		// Arrange
		loaded.set_relation("profile", json!({"id": 5}));
		loaded.register("profile", json!({"id": 6}), true, Stream::Relation);
		loaded.register("team", json!(3), false, Stream::Relation);
		assert_eq!(loaded.get_relation("profile"), Some(json!({"id": 6})));
		assert!(!loaded.relations().has("team"));

		// Act
		loaded.sync_state();

		// Assert
		let relations = loaded.relations();
		assert_eq!(relations.get("profile"), Some(&json!({"id": 6})));
		assert_eq!(relations.get("team"), Some(&json!(3)));
		assert!(loaded.has_relation("team"));
		assert!(!loaded.data().contains_key("team"));
	}

	#[rstest]
	fn test_reset_discards_pending_relations(loaded: Node) {
		loaded.register("team", json!(3), false, Stream::Relation);
		assert!(loaded.has_relation("team"));

		loaded.reset_state();

		assert!(!loaded.has_relation("team"));
	}

	#[rstest]
	fn test_teardown_clears_everything(loaded: Node) {
		// Arrange
		loaded.set_relation("profile", json!(5));
		loaded.set_data(map(json!({"name": "x"})));

		// Act
		loaded.teardown();

		// Assert
		assert!(!loaded.has_state());
		assert!(loaded.data().is_empty());
		assert!(loaded.relations().is_empty());
	}

	#[rstest]
	fn test_node_can_listen_to_itself() {
		// Arrange
		let node = Rc::new(Node::new(
			NodeStatus::New,
			map(json!({"id": null})),
			"category",
		));
		node.listen("id", as_consumer(&node), "root_id", false, Stream::Data);

		// Act
		node.register("id", json!(10), false, Stream::Data);

		// Assert
		assert_eq!(node.get("root_id"), Some(json!(10)));
	}

	#[rstest]
	fn test_register_without_update_forwards_produced_key(loaded: Node) {
		// Arrange
		let child = Rc::new(Node::new(
			NodeStatus::New,
			map(json!({"parent_id": null})),
			"profile",
		));
		loaded.listen("id", as_consumer(&child), "parent_id", false, Stream::Data);

		// Act
		loaded.register("id", json!(42), false, Stream::Data);

		// Assert
		assert_eq!(child.get("parent_id"), Some(json!(42)));
		assert_eq!(loaded.get("id"), Some(json!(1)));
		assert!(loaded.state().unwrap().listeners().is_empty());
	}

	#[rstest]
	fn test_set_data_fires_waiting_listeners() {
		// Arrange
		let user = Node::new(NodeStatus::New, map(json!({"id": null})), "user");
		let post = Rc::new(Node::new(NodeStatus::New, FieldMap::new(), "post"));
		user.listen("id", as_consumer(&post), "author_id", false, Stream::Data);

		// Act
		user.set_data(map(json!({"id": 8})));

		// Assert
		assert_eq!(post.get("author_id"), Some(json!(8)));
		assert!(user.state().unwrap().listeners().is_empty());
	}
}
