//! Topology records: graph nodes, links, and the raw cluster entities they are
//! derived from.

use serde::Serialize;

/// What a graph node represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
	/// A physical cluster host.
	Node,
	/// A pod placed on one host.
	Pod,
	/// A service instance on one host.
	Service,
	/// A single container or task.
	Container,
	/// Endpoint of a service-instance link that is not itself a service.
	#[serde(rename = "serviceinstance-target")]
	ServiceInstanceTarget,
}

impl NodeKind {
	/// Lowercase name, also used as the view group.
	pub fn as_str(self) -> &'static str {
		match self {
			NodeKind::Node => "node",
			NodeKind::Pod => "pod",
			NodeKind::Service => "service",
			NodeKind::Container => "container",
			NodeKind::ServiceInstanceTarget => "serviceinstance-target",
		}
	}
}

/// Style category of the link a node terminates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
	/// Infrastructure a workload depends on.
	Supporting,
	/// A running instance of a workload.
	ServiceInstance,
	/// Placement of a workload on a host.
	RunningOn,
}

impl LinkType {
	/// Service nodes named like a service render as service instances,
	/// everything else as supporting infrastructure.
	pub fn from_service_name(name: &str) -> Self {
		if name.contains("service") {
			LinkType::ServiceInstance
		} else {
			LinkType::Supporting
		}
	}
}

/// A node in the topology graph.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TopologyNode {
	/// Unique, lifecycle-stable identifier.
	pub id: String,
	/// Display name.
	pub name: String,
	/// What the node represents.
	pub kind: NodeKind,
	/// Style of the links it terminates.
	pub link_type: LinkType,
	/// Namespace of pods; absent for everything else.
	pub namespace: Option<String>,
	/// Free-form lifecycle state (`running`, `waiting`, `ready`, ...).
	pub state: Option<String>,
	/// Id of the physical node this entity is scheduled on.
	pub owner_node: Option<String>,
}

impl TopologyNode {
	/// A node with no state, namespace, or owner.
	pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind, link_type: LinkType) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			kind,
			link_type,
			namespace: None,
			state: None,
			owner_node: None,
		}
	}

	/// Sets the lifecycle state.
	pub fn with_state(mut self, state: impl Into<String>) -> Self {
		self.state = Some(state.into());
		self
	}

	/// Sets or clears the namespace.
	pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
		self.namespace = namespace;
		self
	}

	/// Sets or clears the owning host.
	pub fn with_owner(mut self, owner: Option<String>) -> Self {
		self.owner_node = owner;
		self
	}
}

/// A directed link between two node ids in the graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Link {
	/// Id of the dependent node.
	pub source: String,
	/// Id of the node it depends on.
	pub target: String,
}

impl Link {
	/// Link from `source` to `target`.
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}

	/// Whether either endpoint is `id`.
	pub fn touches(&self, id: &str) -> bool {
		self.source == id || self.target == id
	}
}

/// A link whose endpoints are carried inline, before normalization into the
/// graph's canonical node map.
#[derive(Clone, Debug, PartialEq)]
pub struct RawLink {
	/// Payload of the dependent end.
	pub source: TopologyNode,
	/// Payload of the end it depends on.
	pub target: TopologyNode,
}

/// Identity of an entity scoped to one physical node, e.g. a pod or service
/// instance running on a specific host.
pub fn composite_id(entity_id: &str, node_id: &str) -> String {
	format!("{entity_id}-{node_id}")
}

/// A cluster host as reported by the nodes endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicalNode {
	/// Host uid.
	pub id: String,
	/// Host name, as pods refer to it.
	pub name: String,
	/// Readiness reported for the host.
	pub status: String,
}

/// A pod as reported by the pods endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct Pod {
	/// Pod uid.
	pub id: String,
	/// Pod name.
	pub name: String,
	/// Pod phase (`Running`, `Pending`, ...).
	pub phase: Option<String>,
	/// Name (not id) of the node the pod is scheduled on.
	pub node_name: Option<String>,
	/// Namespace the pod lives in.
	pub namespace: Option<String>,
}

/// Lifecycle of a single container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContainerState {
	/// Not started yet.
	Waiting,
	/// Running.
	Running,
	/// Exited.
	Terminated,
	/// No state flag was reported.
	#[default]
	Unknown,
}

impl ContainerState {
	/// Lowercase name, used as the node state.
	pub fn as_str(self) -> &'static str {
		match self {
			ContainerState::Waiting => "waiting",
			ContainerState::Running => "running",
			ContainerState::Terminated => "terminated",
			ContainerState::Unknown => "unknown",
		}
	}
}

/// A container belonging to a pod.
#[derive(Clone, Debug, PartialEq)]
pub struct Container {
	/// Runtime container id, or `podUid/name` when none is reported.
	pub id: String,
	/// Container name within its pod.
	pub name: String,
	/// Image reference.
	pub image: String,
	/// Uid of the owning pod.
	pub pod_id: String,
	/// Id of the host node, absent for unscheduled pods.
	pub node_id: Option<String>,
	/// Lifecycle state.
	pub state: ContainerState,
}
