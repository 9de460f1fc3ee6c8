//! Common imports for driving tracked nodes.

pub use crate::data::{FieldMap, field_map};
pub use crate::error::{TrackingError, TrackingResult};
pub use crate::node::Node;
pub use crate::propagation::{Consumer, Producer, Stream, as_consumer};
pub use crate::scope::TrackingScope;
pub use crate::settings::{DroppedListenerLog, TrackingSettings};
pub use crate::status::NodeStatus;
