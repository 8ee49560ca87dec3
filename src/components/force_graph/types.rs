//! Graph data structures for input to the force graph component.

/// A node in the graph.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// Unique identifier for this node. Used to reference nodes in links.
	pub id: String,
	/// Optional display label drawn beside the node.
	pub label: Option<String>,
	/// Optional group name for category coloring (e.g., "pod", "container").
	pub group: Option<String>,
	/// Optional lifecycle state (e.g., "running"). Known states have their
	/// own color.
	pub state: Option<String>,
	/// Size multiplier (1.0 = normal).
	pub size: Option<f64>,
}

/// A directed edge between two nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphLink {
	/// Source node ID.
	pub source: String,
	/// Target node ID.
	pub target: String,
}

/// Complete graph data: nodes and links.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	/// Nodes, in the order they should be placed.
	pub nodes: Vec<GraphNode>,
	/// Links; ones naming an unknown node are ignored.
	pub links: Vec<GraphLink>,
}
