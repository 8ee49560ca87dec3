//! Topology events from the watch stream and their effect on the graph.
//!
//! Events arrive as loosely-shaped JSON objects (`RawEvent`) and are
//! validated into a [`TopologyEvent`] before they touch the graph, so a
//! malformed payload is rejected instead of half-applied.

use serde::Deserialize;

use super::error::TopologyError;
use super::graph::{GraphDelta, GraphState};
use super::model::{Link, LinkType, NodeKind, TopologyNode, composite_id};

/// Event object exactly as delivered on the wire.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawEvent {
	/// `update`, `start`, or `stop`.
	pub action: String,
	/// Entity type: `node`, `task`, or `service`.
	#[serde(rename = "type")]
	pub kind: String,
	/// Node payload.
	pub dnode: Option<RawNode>,
	/// Task payload.
	pub dtask: Option<RawTask>,
	/// Service payload.
	pub dservice: Option<RawService>,
	/// Legacy top-level task id used by task state updates.
	pub id: Option<String>,
	/// Legacy top-level task state used by task state updates.
	pub state: Option<String>,
}

/// Node payload of an event.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawNode {
	/// Host id.
	pub id: Option<String>,
	/// Host name; defaults to the id.
	pub name: Option<String>,
	/// `up` or `down`.
	pub state: Option<String>,
}

/// Task payload of an event.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTask {
	/// Task id.
	pub id: Option<String>,
	/// Task name.
	pub name: Option<String>,
	/// Id of the service the task belongs to.
	pub service_id: Option<String>,
	/// Id of the host the task runs on.
	pub node_id: Option<String>,
	/// Task state.
	pub status: Option<String>,
}

/// Service payload of an event.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawService {
	/// Service id.
	pub id: Option<String>,
}

/// A physical node coming up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeUp {
	/// Host id.
	pub id: String,
	/// Display name.
	pub name: String,
}

/// A task (container instance) scheduled on a physical node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskStart {
	/// Task id, used as the container node id.
	pub id: String,
	/// Task name.
	pub name: String,
	/// Service the task belongs to.
	pub service_id: String,
	/// Host the task runs on.
	pub node_id: String,
	/// Initial state, if reported.
	pub status: Option<String>,
}

/// A validated topology event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TopologyEvent {
	/// A host joined; added unless already present.
	NodeUp(NodeUp),
	/// A host went down; it and everything depending on it are removed.
	NodeDown {
		/// Host id.
		id: String,
	},
	/// A host was stopped; handled like [`TopologyEvent::NodeDown`].
	NodeStop {
		/// Host id.
		id: String,
	},
	/// A service stopped; its instance on every host is removed.
	ServiceStop {
		/// Service id.
		id: String,
	},
	/// A task started; its service instance is created on first use.
	TaskStart(TaskStart),
	/// A task stopped.
	TaskStop {
		/// Task id.
		id: String,
	},
	/// A task changed state.
	TaskUpdate {
		/// Task id.
		id: String,
		/// New state.
		state: String,
	},
}

fn required(value: Option<&String>, kind: &'static str, field: &'static str) -> Result<String, TopologyError> {
	value
		.filter(|v| !v.is_empty())
		.cloned()
		.ok_or(TopologyError::MissingField { kind, field })
}

impl TopologyEvent {
	/// Parses and validates a single JSON event object.
	pub fn from_json(text: &str) -> Result<Self, TopologyError> {
		Self::decode(&serde_json::from_str(text)?)
	}

	/// Validates an already-parsed JSON event.
	pub fn from_value(value: serde_json::Value) -> Result<Self, TopologyError> {
		Self::decode(&serde_json::from_value(value)?)
	}

	/// Validates a raw event against the `(action, type)` matrix.
	pub fn decode(raw: &RawEvent) -> Result<Self, TopologyError> {
		match (raw.action.as_str(), raw.kind.as_str()) {
			("update", "node") => {
				let node = raw.dnode.as_ref().ok_or(TopologyError::MissingField {
					kind: "node",
					field: "dnode",
				})?;
				let id = required(node.id.as_ref(), "node", "dnode.id")?;
				match node.state.as_deref() {
					Some("up") => Ok(TopologyEvent::NodeUp(NodeUp {
						name: node.name.clone().unwrap_or_else(|| id.clone()),
						id,
					})),
					Some("down") => Ok(TopologyEvent::NodeDown { id }),
					Some(other) => Err(TopologyError::UnknownNodeState(other.to_string())),
					None => Err(TopologyError::MissingField {
						kind: "node",
						field: "dnode.state",
					}),
				}
			}
			("stop", "node") => {
				let id = required(raw.dnode.as_ref().and_then(|n| n.id.as_ref()), "node", "dnode.id")?;
				Ok(TopologyEvent::NodeStop { id })
			}
			("stop", "service") => {
				let id = required(
					raw.dservice.as_ref().and_then(|s| s.id.as_ref()),
					"service",
					"dservice.id",
				)?;
				Ok(TopologyEvent::ServiceStop { id })
			}
			("start", "task") => {
				let task = raw.dtask.as_ref().ok_or(TopologyError::MissingField {
					kind: "task",
					field: "dtask",
				})?;
				Ok(TopologyEvent::TaskStart(TaskStart {
					id: required(task.id.as_ref(), "task", "dtask.id")?,
					name: required(task.name.as_ref(), "task", "dtask.name")?,
					service_id: required(task.service_id.as_ref(), "task", "dtask.serviceId")?,
					node_id: required(task.node_id.as_ref(), "task", "dtask.nodeId")?,
					status: task.status.clone(),
				}))
			}
			("stop", "task") => {
				let id = required(raw.dtask.as_ref().and_then(|t| t.id.as_ref()), "task", "dtask.id")?;
				Ok(TopologyEvent::TaskStop { id })
			}
			("update", "task") => {
				let task = raw.dtask.as_ref();
				let id = required(task.and_then(|t| t.id.as_ref()).or(raw.id.as_ref()), "task", "id")?;
				let state = task
					.and_then(|t| t.status.clone())
					.or_else(|| raw.state.clone())
					.ok_or(TopologyError::MissingField {
						kind: "task",
						field: "state",
					})?;
				Ok(TopologyEvent::TaskUpdate { id, state })
			}
			(action, kind) => Err(TopologyError::UnsupportedEvent {
				action: action.to_string(),
				kind: kind.to_string(),
			}),
		}
	}

	/// Applies the event to `graph`.
	///
	/// Lookups that miss return an error and leave the graph untouched.
	pub fn apply(&self, graph: &mut GraphState) -> Result<GraphDelta, TopologyError> {
		match self {
			TopologyEvent::NodeUp(node) => Ok(add_physical_node(graph, node)),
			TopologyEvent::NodeDown { id } | TopologyEvent::NodeStop { id } => remove_physical_node(graph, id),
			TopologyEvent::ServiceStop { id } => remove_service(graph, id),
			TopologyEvent::TaskStart(task) => add_task(graph, task),
			TopologyEvent::TaskStop { id } => remove_task(graph, id),
			TopologyEvent::TaskUpdate { id, state } => update_task_state(graph, id, state),
		}
	}
}

fn add_physical_node(graph: &mut GraphState, node: &NodeUp) -> GraphDelta {
	let mut delta = GraphDelta::default();
	let record =
		TopologyNode::new(&node.id, &node.name, NodeKind::Node, LinkType::Supporting).with_state("up");
	if graph.insert_node(record) {
		delta.nodes_added = 1;
	}
	delta
}

/// Removes a host together with everything that transitively links into it
/// (service instances and the containers attached to them), and every link
/// touching a removed node.
fn remove_physical_node(graph: &mut GraphState, id: &str) -> Result<GraphDelta, TopologyError> {
	if !graph.contains(id) {
		return Err(TopologyError::UnknownNode(id.to_string()));
	}

	let mut doomed = vec![id.to_string()];
	let mut cursor = 0;
	while let Some(target) = doomed.get(cursor).cloned() {
		for link in graph.links() {
			if link.target == target && !doomed.contains(&link.source) {
				doomed.push(link.source.clone());
			}
		}
		cursor += 1;
	}

	let mut delta = GraphDelta {
		links_removed: graph.remove_links_where(|link| doomed.iter().any(|d| link.touches(d))),
		..GraphDelta::default()
	};
	for node in &doomed {
		if graph.remove_node(node).is_some() {
			delta.nodes_removed += 1;
		}
	}
	Ok(delta)
}

/// Removes the service's instance on every host, along with the links
/// leaving each instance.
fn remove_service(graph: &mut GraphState, service_id: &str) -> Result<GraphDelta, TopologyError> {
	let instances: Vec<String> = graph
		.physical_nodes()
		.map(|host| composite_id(service_id, &host.id))
		.filter(|instance| graph.contains(instance))
		.collect();

	if instances.is_empty() {
		return Err(TopologyError::UnknownService(service_id.to_string()));
	}

	let mut delta = GraphDelta::default();
	for instance in &instances {
		delta.links_removed += graph.remove_links_where(|link| link.source == *instance);
		if graph.remove_node(instance).is_some() {
			delta.nodes_removed += 1;
		}
	}
	Ok(delta)
}

/// Adds a task's container node, creating its service instance on the host
/// first if this is the service's first task there.
///
/// The host must already be in the graph; otherwise the event is rejected
/// before anything is mutated.
fn add_task(graph: &mut GraphState, task: &TaskStart) -> Result<GraphDelta, TopologyError> {
	let mut delta = GraphDelta::default();
	if graph.contains(&task.id) {
		return Ok(delta);
	}

	let instance = composite_id(&task.service_id, &task.node_id);
	if !graph.contains(&instance) {
		if !graph.contains(&task.node_id) {
			return Err(TopologyError::UnknownNode(task.node_id.clone()));
		}
		let service = TopologyNode::new(
			&instance,
			&task.name,
			NodeKind::Service,
			LinkType::from_service_name(&task.name),
		)
		.with_owner(Some(task.node_id.clone()));
		graph.insert_node(service);
		graph.push_link(Link::new(&instance, &task.node_id));
		delta.nodes_added += 1;
		delta.links_added += 1;
	}

	let container = TopologyNode {
		state: task.status.clone(),
		..TopologyNode::new(&task.id, &task.name, NodeKind::Container, LinkType::ServiceInstance)
	}
	.with_owner(Some(task.node_id.clone()));
	graph.insert_node(container);
	graph.push_link(Link::new(&task.id, &instance));
	delta.nodes_added += 1;
	delta.links_added += 1;
	Ok(delta)
}

/// Removes a task node and the first link touching it. Any further links
/// touching the task are left in place and stop resolving.
fn remove_task(graph: &mut GraphState, id: &str) -> Result<GraphDelta, TopologyError> {
	if !graph.contains(id) {
		return Err(TopologyError::UnknownNode(id.to_string()));
	}

	let mut delta = GraphDelta::default();
	if graph.remove_first_link_where(|link| link.touches(id)).is_some() {
		delta.links_removed = 1;
	}
	graph.remove_node(id);
	delta.nodes_removed = 1;
	Ok(delta)
}

fn update_task_state(graph: &mut GraphState, id: &str, state: &str) -> Result<GraphDelta, TopologyError> {
	let node = graph
		.node_mut(id)
		.ok_or_else(|| TopologyError::UnknownNode(id.to_string()))?;

	let mut delta = GraphDelta::default();
	if node.state.as_deref() != Some(state) {
		node.state = Some(state.to_string());
		delta.nodes_updated = 1;
	}
	Ok(delta)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn event(value: serde_json::Value) -> TopologyEvent {
		TopologyEvent::from_value(value).unwrap()
	}

	fn node_up(id: &str) -> TopologyEvent {
		event(json!({"action": "update", "type": "node", "dnode": {"id": id, "name": id, "state": "up"}}))
	}

	fn task_start(id: &str, service: &str, node: &str) -> TopologyEvent {
		event(json!({
			"action": "start",
			"type": "task",
			"dtask": {"id": id, "name": "web-service.1", "serviceId": service, "nodeId": node, "status": "allocated"}
		}))
	}

	fn apply(graph: &mut GraphState, event: &TopologyEvent) -> GraphDelta {
		event.apply(graph).unwrap()
	}

	#[test]
	fn node_up_on_empty_graph() {
		let mut graph = GraphState::new();
		let delta = apply(&mut graph, &node_up("n2"));

		assert_eq!(delta.nodes_added, 1);
		assert_eq!(graph.node_count(), 1);
		let node = graph.node("n2").unwrap();
		assert_eq!(node.kind, NodeKind::Node);
		assert_eq!(node.link_type, LinkType::Supporting);
	}

	#[test]
	fn repeated_node_up_is_noop() {
		let mut graph = GraphState::new();
		apply(&mut graph, &node_up("n1"));
		let delta = apply(&mut graph, &node_up("n1"));

		assert!(delta.is_empty());
		assert_eq!(graph.node_count(), 1);
	}

	#[test]
	fn node_down_cascades() {
		let mut graph = GraphState::new();
		apply(&mut graph, &node_up("n1"));
		apply(&mut graph, &node_up("n2"));
		apply(&mut graph, &task_start("t1", "s1", "n2"));
		apply(&mut graph, &task_start("t2", "s1", "n2"));
		apply(&mut graph, &task_start("t3", "s1", "n1"));

		let down = event(json!({"action": "update", "type": "node", "dnode": {"id": "n2", "state": "down"}}));
		let delta = apply(&mut graph, &down);

		assert_eq!(delta.nodes_removed, 4);
		assert_eq!(delta.links_removed, 3);
		assert!(!graph.contains("n2"));
		assert!(!graph.contains("s1-n2"));
		assert!(!graph.contains("t1"));
		assert!(graph.contains("t3"));
		assert_eq!(graph.node_count(), 3);
		assert_eq!(graph.link_count(), 2);
	}

	#[test]
	fn node_up_then_down_leaves_empty_graph() {
		let mut graph = GraphState::new();
		apply(&mut graph, &node_up("n2"));
		apply(&mut graph, &task_start("t1", "s1", "n2"));

		let stop = event(json!({"action": "stop", "type": "node", "dnode": {"id": "n2"}}));
		apply(&mut graph, &stop);

		assert_eq!(graph.node_count(), 0);
		assert_eq!(graph.link_count(), 0);
		assert!(graph.is_empty());
	}

	#[test]
	fn task_start_reuses_service_instance() {
		let mut graph = GraphState::new();
		apply(&mut graph, &node_up("n1"));

		let first = apply(&mut graph, &task_start("t1", "s1", "n1"));
		assert_eq!((first.nodes_added, first.links_added), (2, 2));
		assert!(graph.links().contains(&Link::new("s1-n1", "n1")));
		assert!(graph.links().contains(&Link::new("t1", "s1-n1")));

		let service = graph.node("s1-n1").unwrap();
		assert_eq!(service.kind, NodeKind::Service);
		assert_eq!(service.link_type, LinkType::ServiceInstance);

		let second = apply(&mut graph, &task_start("t2", "s1", "n1"));
		assert_eq!((second.nodes_added, second.links_added), (1, 1));
		assert_eq!(graph.node_count(), 4);
		assert_eq!(graph.link_count(), 3);
	}

	#[test]
	fn task_start_for_unknown_host_is_rejected() {
		let mut graph = GraphState::new();
		let err = task_start("t1", "s1", "ghost").apply(&mut graph).unwrap_err();

		assert!(matches!(err, TopologyError::UnknownNode(id) if id == "ghost"));
		assert!(graph.is_empty());
	}

	#[test]
	fn duplicate_task_start_is_noop() {
		let mut graph = GraphState::new();
		apply(&mut graph, &node_up("n1"));
		apply(&mut graph, &task_start("t1", "s1", "n1"));
		let delta = apply(&mut graph, &task_start("t1", "s1", "n1"));

		assert!(delta.is_empty());
		assert_eq!(graph.link_count(), 2);
	}

	#[test]
	fn task_update_is_idempotent() {
		let mut graph = GraphState::new();
		apply(&mut graph, &node_up("n1"));
		apply(&mut graph, &task_start("t1", "s1", "n1"));

		let update = event(json!({"action": "update", "type": "task", "dtask": {"id": "t1", "status": "running"}}));
		let first = apply(&mut graph, &update);
		let snapshot: Vec<_> = graph.nodes().cloned().collect();
		let links = graph.links().to_vec();
		let second = apply(&mut graph, &update);

		assert_eq!(first.nodes_updated, 1);
		assert!(second.is_empty());
		assert_eq!(graph.nodes().cloned().collect::<Vec<_>>(), snapshot);
		assert_eq!(graph.links(), links.as_slice());
		assert_eq!(graph.node("t1").unwrap().state.as_deref(), Some("running"));
	}

	#[test]
	fn task_update_accepts_top_level_fields() {
		let update = event(json!({"action": "update", "type": "task", "id": "t1", "state": "preparing"}));
		assert_eq!(
			update,
			TopologyEvent::TaskUpdate {
				id: "t1".into(),
				state: "preparing".into()
			}
		);
	}

	#[test]
	fn task_stop_removes_only_first_link() {
		// Documented quirk: a task with several links keeps all but the first.
		let mut graph = GraphState::new();
		apply(&mut graph, &node_up("n1"));
		apply(&mut graph, &task_start("t1", "s1", "n1"));
		graph.push_link(Link::new("t1", "s1-n1"));

		let stop = event(json!({"action": "stop", "type": "task", "dtask": {"id": "t1"}}));
		let delta = apply(&mut graph, &stop);

		assert_eq!(delta.links_removed, 1);
		assert!(!graph.contains("t1"));
		assert_eq!(graph.link_count(), 2);
		assert_eq!(graph.resolved_links().count(), 1);
	}

	#[test]
	fn task_stop_for_unknown_task_errors() {
		let mut graph = GraphState::new();
		let stop = event(json!({"action": "stop", "type": "task", "dtask": {"id": "t9"}}));

		assert!(matches!(stop.apply(&mut graph), Err(TopologyError::UnknownNode(_))));
	}

	#[test]
	fn service_stop_removes_instances_on_every_host() {
		let mut graph = GraphState::new();
		apply(&mut graph, &node_up("n1"));
		apply(&mut graph, &node_up("n2"));
		apply(&mut graph, &task_start("t1", "s1", "n1"));
		apply(&mut graph, &task_start("t2", "s1", "n2"));
		apply(&mut graph, &task_start("t3", "s2", "n2"));

		let stop = event(json!({"action": "stop", "type": "service", "dservice": {"id": "s1"}}));
		let delta = apply(&mut graph, &stop);

		assert_eq!(delta.nodes_removed, 2);
		assert_eq!(delta.links_removed, 2);
		assert!(!graph.contains("s1-n1"));
		assert!(!graph.contains("s1-n2"));
		assert!(graph.contains("s2-n2"));
		// Task nodes of the stopped service remain until their own stop events.
		assert!(graph.contains("t1"));
		assert_eq!(graph.resolved_links().count(), 2);
	}

	#[test]
	fn service_stop_for_unknown_service_errors() {
		let mut graph = GraphState::new();
		apply(&mut graph, &node_up("n1"));
		let stop = event(json!({"action": "stop", "type": "service", "dservice": {"id": "s9"}}));

		assert!(matches!(stop.apply(&mut graph), Err(TopologyError::UnknownService(id)) if id == "s9"));
	}

	#[test]
	fn decode_rejects_malformed_events() {
		let missing = TopologyEvent::from_value(json!({"action": "start", "type": "task", "dtask": {"id": "t1"}}));
		assert!(matches!(
			missing,
			Err(TopologyError::MissingField { field: "dtask.name", .. })
		));

		let unsupported = TopologyEvent::from_value(json!({"action": "start", "type": "node"}));
		assert!(matches!(unsupported, Err(TopologyError::UnsupportedEvent { .. })));

		let state = TopologyEvent::from_value(json!({"action": "update", "type": "node", "dnode": {"id": "n1", "state": "draining"}}));
		assert!(matches!(state, Err(TopologyError::UnknownNodeState(s)) if s == "draining"));

		assert!(matches!(TopologyEvent::from_json("{not json"), Err(TopologyError::Json(_))));
	}
}
