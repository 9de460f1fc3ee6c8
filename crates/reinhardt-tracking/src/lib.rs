//! Entity change tracking for the Reinhardt unit of work.
//!
//! This crate keeps track of loaded and pending entities while a unit of work
//! prepares a flush:
//!
//! - **Lifecycle status**: [`NodeStatus`] from `Promised` through `Loaded`/`New`
//!   to the `Scheduled*` stages
//! - **Change sets**: a [`Node`] keeps the baseline as of the last
//!   synchronization and reports only the fields that changed
//! - **Value propagation**: a node can wait for a value another node will
//!   produce (an auto-generated key, typically) and receives it the moment it
//!   is registered
//!
//! SQL generation, commit ordering and hydration are handled by the layers
//! that drive these nodes; nothing here performs I/O.
//!
//! # Quick Start
//!
//! ```
//! use reinhardt_tracking::prelude::*;
//! use serde_json::json;
//!
//! let mut scope = TrackingScope::new(TrackingSettings::default());
//! let user_data = field_map(json!({"id": null, "name": "alice"})).unwrap();
//! let user = scope.track(NodeStatus::New, user_data, "user");
//! let post = scope.track(NodeStatus::New, field_map(json!({"title": "hello"})).unwrap(), "post");
//!
//! // The post needs the user's key before it can be inserted.
//! user.listen("id", as_consumer(&post), "author_id", false, Stream::Data);
//! user.set_status(NodeStatus::ScheduledInsert);
//! post.set_status(NodeStatus::ScheduledInsert);
//!
//! // The user row is written and the database hands back its key.
//! user.register("id", json!(42), false, Stream::Data);
//! let user_changes = user.sync_state();
//! assert_eq!(user_changes["id"], json!(42));
//!
//! // The post now carries the foreign key.
//! let post_changes = post.sync_state();
//! assert_eq!(post_changes["author_id"], json!(42));
//! assert_eq!(post.status(), NodeStatus::Loaded);
//! ```
//!
//! # Architecture
//!
//! - [`Node`] - entity handle with baseline data and a lazily created [`State`]
//! - [`State`] - live status, data, pending relations and listener [`Channel`]
//! - [`Producer`] / [`Consumer`] - the propagation contract
//! - [`TrackingScope`] - releases every node when a pass ends
//! - [`TrackingSettings`] - logging behaviour for propagation

pub mod data;
pub mod error;
pub mod node;
pub mod prelude;
pub mod propagation;
pub mod relations;
pub mod scope;
pub mod settings;
pub mod state;
pub mod status;

pub use data::{FieldMap, diff, field_map, is_available};
pub use error::{TrackingError, TrackingResult};
pub use node::Node;
pub use propagation::{Channel, Consumer, Producer, Stream, Subscription, as_consumer};
pub use relations::RelationMap;
pub use scope::TrackingScope;
pub use settings::{DroppedListenerLog, TrackingSettings};
pub use state::State;
pub use status::NodeStatus;
