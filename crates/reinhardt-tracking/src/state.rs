//! Live, uncommitted view of one entity.

use serde_json::Value as JsonValue;

use crate::data::{FieldMap, is_available};
use crate::propagation::{Channel, Stream, Subscription};
use crate::relations::RelationMap;
use crate::status::NodeStatus;

/// Mutable state of a tracked entity
///
/// Holds the live status, field data, pending relation references and the
/// listeners waiting on values this entity will produce. A `State` is owned by
/// exactly one [`Node`](crate::Node) and exists only while that node has
/// uncommitted changes.
///
/// Storing and subscribing are split from delivery: [`State::store`] and
/// [`State::subscribe`] hand back what has to be delivered, and the owning
/// node delivers it once the state is no longer borrowed. This keeps a
/// consumer free to call back into its producer (or itself) during delivery.
#[derive(Debug)]
pub struct State {
	status: NodeStatus,
	data: FieldMap,
	relations: RelationMap,
	listeners: Channel,
}

/// A value together with the subscriptions it must be delivered to
pub(crate) type Delivery = (JsonValue, Vec<Subscription>);

impl State {
	pub fn new(status: NodeStatus, data: FieldMap) -> Self {
		Self {
			status,
			data,
			relations: RelationMap::new(),
			listeners: Channel::new(),
		}
	}

	pub fn status(&self) -> NodeStatus {
		self.status
	}

	pub fn set_status(&mut self, status: NodeStatus) {
		self.status = status;
	}

	pub fn data(&self) -> &FieldMap {
		&self.data
	}

	/// Relation references registered since the state was created
	pub fn relations(&self) -> &RelationMap {
		&self.relations
	}

	/// Subscriptions still waiting for a value
	pub fn listeners(&self) -> &Channel {
		&self.listeners
	}

	/// Current value under `key`, looked up in field data first
	pub fn value(&self, key: &str) -> Option<&JsonValue> {
		self.data.get(key).or_else(|| self.relations.get(key))
	}

	fn slot(&self, key: &str, stream: Stream) -> Option<&JsonValue> {
		match stream {
			Stream::Data => self.data.get(key),
			Stream::Relation => self.relations.get(key),
		}
	}

	/// Store `value` under `key` and collect the subscriptions to notify.
	///
	/// Without `update` an available value is never overwritten. Subscribers
	/// on `key` are drained with the offered `value` whether or not it was
	/// stored; a null value is stored but never delivered.
	pub(crate) fn store(
		&mut self,
		key: &str,
		value: JsonValue,
		update: bool,
		stream: Stream,
	) -> Option<Delivery> {
		let produced = (!value.is_null()).then(|| value.clone());
		if update || !is_available(self.slot(key, stream)) {
			match stream {
				Stream::Data => {
					self.data.insert(key.to_string(), value);
				}
				Stream::Relation => self.relations.set(key, value),
			}
		}

		let produced = produced?;
		let pending = self.listeners.take(key);
		if pending.is_empty() {
			None
		} else {
			Some((produced, pending))
		}
	}

	/// Queue `subscription` on `key`, or hand it back with the current value
	/// when `trigger` is set and the value is already available.
	pub(crate) fn subscribe(
		&mut self,
		key: &str,
		subscription: Subscription,
		trigger: bool,
	) -> Option<Delivery> {
		if trigger && let Some(value) = self.value(key).filter(|v| !v.is_null()) {
			return Some((value.clone(), vec![subscription]));
		}
		self.listeners.subscribe(key, subscription);
		None
	}

	pub(crate) fn into_parts(self) -> (FieldMap, RelationMap, Channel) {
		(self.data, self.relations, self.listeners)
	}
}
