//! Producer/consumer value propagation
//!
//! An entity whose value is not known yet (typically an auto-generated
//! primary key) acts as a producer. Entities that need that value subscribe to
//! it under a key and name the field that should receive it. When the
//! producer registers the value, every waiting subscriber receives it
//! synchronously, exactly once.
//!
//! ```
//! use reinhardt_tracking::{as_consumer, Consumer, Node, NodeStatus, Producer, Stream};
//! use serde_json::{json, Map};
//! use std::rc::Rc;
//!
//! let user = Rc::new(Node::new(NodeStatus::New, Map::new(), "user"));
//! let post = Rc::new(Node::new(NodeStatus::New, Map::new(), "post"));
//!
//! user.listen("id", as_consumer(&post), "author_id", false, Stream::Data);
//! user.register("id", json!(42), false, Stream::Data);
//!
//! assert_eq!(post.data()["author_id"], json!(42));
//! ```

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::settings::DroppedListenerLog;

/// Destination table for a propagated value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Stream {
	/// Field data
	#[default]
	Data,
	/// Relation table
	Relation,
}

/// Accepts values produced by other entities.
pub trait Consumer {
	/// Make `value` available under `key`.
	///
	/// Without `update`, an already available value under `key` is kept.
	/// Subscribers waiting on `key` are notified before this call returns.
	fn register(&self, key: &str, value: JsonValue, update: bool, stream: Stream);
}

/// Accepts subscriptions for values it will produce.
pub trait Producer {
	/// Ask for the value under `key` to be delivered into `target` of `consumer`.
	///
	/// With `trigger`, an already available value is delivered right away
	/// instead of waiting for the next registration.
	fn listen(
		&self,
		key: &str,
		consumer: Weak<dyn Consumer>,
		target: &str,
		trigger: bool,
		stream: Stream,
	);
}

/// Weak consumer reference suitable for [`Producer::listen`]
pub fn as_consumer<C: Consumer + 'static>(consumer: &Rc<C>) -> Weak<dyn Consumer> {
	let weak: Weak<C> = Rc::downgrade(consumer);
	weak
}

/// One pending delivery
#[derive(Debug, Clone)]
pub struct Subscription {
	consumer: Weak<dyn Consumer>,
	target: String,
	stream: Stream,
}

impl Subscription {
	pub fn new(consumer: Weak<dyn Consumer>, target: impl Into<String>, stream: Stream) -> Self {
		Self {
			consumer,
			target: target.into(),
			stream,
		}
	}

	pub fn target(&self) -> &str {
		&self.target
	}

	pub fn stream(&self) -> Stream {
		self.stream
	}

	/// Whether the consumer has been dropped
	pub fn is_expired(&self) -> bool {
		self.consumer.strong_count() == 0
	}

	/// Push `value` into the consumer. Returns `false` when the consumer is gone.
	pub fn deliver(&self, value: &JsonValue) -> bool {
		match self.consumer.upgrade() {
			Some(consumer) => {
				consumer.register(&self.target, value.clone(), true, self.stream);
				true
			}
			None => false,
		}
	}
}

/// Subscriptions of one state, grouped by value key in arrival order
#[derive(Debug, Default)]
pub struct Channel {
	subscribers: BTreeMap<String, Vec<Subscription>>,
}

impl Channel {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn subscribe(&mut self, key: impl Into<String>, subscription: Subscription) {
		self.subscribers
			.entry(key.into())
			.or_default()
			.push(subscription);
	}

	/// Remove and return everything waiting on `key`
	pub fn take(&mut self, key: &str) -> Vec<Subscription> {
		self.subscribers.remove(key).unwrap_or_default()
	}

	/// Number of subscriptions waiting on `key`
	pub fn pending(&self, key: &str) -> usize {
		self.subscribers.get(key).map_or(0, Vec::len)
	}

	/// Keys with at least one waiting subscription
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.subscribers.keys().map(String::as_str)
	}

	/// Total number of waiting subscriptions
	pub fn len(&self) -> usize {
		self.subscribers.values().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.subscribers.is_empty()
	}

	/// Log subscriptions that are about to be lost with their state
	pub(crate) fn report_unresolved(&self, role: &str, reason: &str, log: DroppedListenerLog) {
		if self.is_empty() {
			return;
		}
		let count = self.len();
		let keys: Vec<&str> = self.keys().collect();
		match log {
			DroppedListenerLog::Ignore => {}
			DroppedListenerLog::Debug => tracing::debug!(
				role,
				reason,
				count,
				?keys,
				"Discarding unresolved listeners"
			),
			DroppedListenerLog::Warn => tracing::warn!(
				role,
				reason,
				count,
				?keys,
				"Discarding unresolved listeners; their values were never produced"
			),
		}
	}
}

/// Deliver `value` to each subscription in order
pub(crate) fn dispatch(
	role: &str,
	key: &str,
	value: &JsonValue,
	subscriptions: Vec<Subscription>,
	trace: bool,
) {
	for subscription in subscriptions {
		if subscription.deliver(value) {
			if trace {
				tracing::trace!(
					role,
					key,
					target = subscription.target(),
					stream = ?subscription.stream(),
					"Delivered propagated value"
				);
			}
		} else {
			tracing::debug!(
				role,
				key,
				target = subscription.target(),
				"Skipping expired subscription; consumer was dropped"
			);
		}
	}
}
