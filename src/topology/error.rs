//! Errors raised while decoding or applying topology events.

use thiserror::Error;

/// Failure to decode an event or apply it to the graph.
#[derive(Debug, Error)]
pub enum TopologyError {
	/// The event references a node id that is not in the graph.
	#[error("unknown node `{0}`")]
	UnknownNode(String),

	/// No instance of the service exists on any physical node.
	#[error("no instance of service `{0}` on any physical node")]
	UnknownService(String),

	/// A required field is absent from the event payload.
	#[error("malformed {kind} event: missing `{field}`")]
	MissingField {
		/// Event type being decoded.
		kind: &'static str,
		/// Path of the missing field.
		field: &'static str,
	},

	/// The `(action, type)` pair is not one the graph reacts to.
	#[error("unsupported event `{action}` for type `{kind}`")]
	UnsupportedEvent {
		/// The event's `action`.
		action: String,
		/// The event's `type`.
		kind: String,
	},

	/// A node update carried a state other than `up` or `down`.
	#[error("unsupported node state `{0}`")]
	UnknownNodeState(String),

	/// The payload is not valid JSON or does not match the event shape.
	#[error("invalid event payload: {0}")]
	Json(#[from] serde_json::Error),
}
