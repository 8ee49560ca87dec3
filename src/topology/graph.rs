//! Owned graph state: canonical node map plus link sequence.
//!
//! Nodes are indexed by id and remembered in insertion order so the view
//! sees a stable ordering. Links reference nodes by id; a link is only
//! rendered when both of its endpoints are present.

use std::collections::HashMap;

use super::links::LinkPlan;
use super::model::{Link, NodeKind, RawLink, TopologyNode};
use crate::components::force_graph::{GraphData, GraphLink, GraphNode};

/// Counts of what a mutation changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphDelta {
	/// Node records inserted.
	pub nodes_added: usize,
	/// Node records deleted.
	pub nodes_removed: usize,
	/// Node records changed in place.
	pub nodes_updated: usize,
	/// Links appended.
	pub links_added: usize,
	/// Links deleted.
	pub links_removed: usize,
}

impl GraphDelta {
	/// Whether the mutation changed nothing.
	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}
}

/// The topology graph that the view renders.
#[derive(Clone, Debug, Default)]
pub struct GraphState {
	nodes: HashMap<String, TopologyNode>,
	order: Vec<String>,
	links: Vec<Link>,
}

impl GraphState {
	/// An empty graph.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a graph from a link plan: isolated hosts first, then the
	/// normalized links.
	pub fn from_plan(plan: LinkPlan) -> Self {
		let mut graph = Self::new();
		graph.add_nodes(plan.isolated);
		graph.add_links(plan.links);
		graph
	}

	/// Looks up a node by id.
	pub fn node(&self, id: &str) -> Option<&TopologyNode> {
		self.nodes.get(id)
	}

	/// Looks up a node by id for in-place changes.
	pub fn node_mut(&mut self, id: &str) -> Option<&mut TopologyNode> {
		self.nodes.get_mut(id)
	}

	/// Whether a node with this id exists.
	pub fn contains(&self, id: &str) -> bool {
		self.nodes.contains_key(id)
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> impl Iterator<Item = &TopologyNode> {
		self.order.iter().filter_map(|id| self.nodes.get(id))
	}

	/// Every link, dangling ones included, in insertion order.
	pub fn links(&self) -> &[Link] {
		&self.links
	}

	/// Links whose endpoints both resolve, paired with the resolved nodes.
	pub fn resolved_links(&self) -> impl Iterator<Item = (&TopologyNode, &TopologyNode)> {
		self.links
			.iter()
			.filter_map(|link| Some((self.nodes.get(&link.source)?, self.nodes.get(&link.target)?)))
	}

	/// Physical cluster hosts, in insertion order.
	pub fn physical_nodes(&self) -> impl Iterator<Item = &TopologyNode> {
		self.nodes().filter(|node| node.kind == NodeKind::Node)
	}

	/// Number of nodes.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Number of links, dangling ones included.
	pub fn link_count(&self) -> usize {
		self.links.len()
	}

	/// Whether the graph has neither nodes nor links.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.links.is_empty()
	}

	/// Inserts a node unless its id is already taken. Returns whether it was
	/// inserted; an existing record is never overwritten.
	pub fn insert_node(&mut self, node: TopologyNode) -> bool {
		if self.nodes.contains_key(&node.id) {
			return false;
		}
		self.order.push(node.id.clone());
		self.nodes.insert(node.id.clone(), node);
		true
	}

	/// Inserts each node whose id is not taken yet.
	pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = TopologyNode>) -> GraphDelta {
		let mut delta = GraphDelta::default();
		for node in nodes {
			if self.insert_node(node) {
				delta.nodes_added += 1;
			}
		}
		delta
	}

	/// Normalizes inline-endpoint links into the graph.
	///
	/// Each endpoint id resolves to one canonical record: the first payload
	/// seen for an id wins and later payloads with the same id are dropped,
	/// even when their attributes differ. Every link is appended, including
	/// duplicates.
	pub fn add_links(&mut self, links: impl IntoIterator<Item = RawLink>) -> GraphDelta {
		let mut delta = GraphDelta::default();
		for RawLink { source, target } in links {
			let link = Link::new(&source.id, &target.id);
			for endpoint in [source, target] {
				if self.insert_node(endpoint) {
					delta.nodes_added += 1;
				}
			}
			self.links.push(link);
			delta.links_added += 1;
		}
		delta
	}

	/// Appends a link without checking its endpoints.
	pub fn push_link(&mut self, link: Link) {
		self.links.push(link);
	}

	/// Removes a node record without touching links.
	pub fn remove_node(&mut self, id: &str) -> Option<TopologyNode> {
		let node = self.nodes.remove(id)?;
		self.order.retain(|other| other != id);
		Some(node)
	}

	/// Removes every link matching `pred`, returning how many were dropped.
	pub fn remove_links_where(&mut self, mut pred: impl FnMut(&Link) -> bool) -> usize {
		let before = self.links.len();
		self.links.retain(|link| !pred(link));
		before - self.links.len()
	}

	/// Removes only the first link matching `pred`.
	pub fn remove_first_link_where(&mut self, pred: impl FnMut(&Link) -> bool) -> Option<Link> {
		let pos = self.links.iter().position(pred)?;
		Some(self.links.remove(pos))
	}

	/// The node's full record as JSON, for diagnostics.
	pub fn describe(&self, id: &str) -> Option<String> {
		serde_json::to_string(self.node(id)?).ok()
	}

	/// Projects the graph into the render model.
	pub fn to_graph_data(&self) -> GraphData {
		let nodes = self
			.nodes()
			.map(|node| GraphNode {
				id: node.id.clone(),
				label: Some(node.name.clone()).filter(|name| !name.is_empty()),
				group: Some(node.kind.as_str().to_string()),
				state: node.state.clone().filter(|state| !state.is_empty()),
				size: Some(kind_size(node.kind)),
			})
			.collect();

		let links = self
			.resolved_links()
			.map(|(source, target)| GraphLink {
				source: source.id.clone(),
				target: target.id.clone(),
			})
			.collect();

		GraphData { nodes, links }
	}
}

fn kind_size(kind: NodeKind) -> f64 {
	match kind {
		NodeKind::Node => 2.4,
		NodeKind::Pod | NodeKind::Service => 1.5,
		NodeKind::Container | NodeKind::ServiceInstanceTarget => 0.9,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::topology::model::LinkType;

	fn node(id: &str, name: &str, kind: NodeKind) -> TopologyNode {
		TopologyNode::new(id, name, kind, LinkType::Supporting)
	}

	fn raw(source: TopologyNode, target: TopologyNode) -> RawLink {
		RawLink { source, target }
	}

	#[test]
	fn shared_endpoint_resolves_to_one_node() {
		let mut graph = GraphState::new();
		let delta = graph.add_links([
			raw(node("c1", "c1", NodeKind::Container), node("p1", "p1", NodeKind::Pod)),
			raw(node("c2", "c2", NodeKind::Container), node("p1", "p1", NodeKind::Pod)),
			raw(node("p1", "p1", NodeKind::Pod), node("n1", "n1", NodeKind::Node)),
		]);

		assert_eq!(delta.nodes_added, 4);
		assert_eq!(delta.links_added, 3);
		assert_eq!(graph.node_count(), 4);

		let resolved: Vec<_> = graph
			.resolved_links()
			.flat_map(|(s, t)| [s, t])
			.filter(|n| n.id == "p1")
			.collect();
		assert_eq!(resolved.len(), 3);
		assert!(resolved.windows(2).all(|w| std::ptr::eq(w[0], w[1])));
		assert!(std::ptr::eq(graph.node("p1").unwrap(), resolved[0]));
	}

	#[test]
	fn first_seen_payload_wins() {
		// Documented quirk: later payloads for an existing id are discarded.
		let mut graph = GraphState::new();
		graph.add_links([
			raw(node("c1", "c1", NodeKind::Container), node("p1", "first", NodeKind::Pod)),
			raw(node("p1", "second", NodeKind::Service), node("n1", "n1", NodeKind::Node)),
		]);

		let p1 = graph.node("p1").unwrap();
		assert_eq!(p1.name, "first");
		assert_eq!(p1.kind, NodeKind::Pod);
	}

	#[test]
	fn nodes_keep_insertion_order() {
		let mut graph = GraphState::new();
		graph.add_nodes([node("b", "b", NodeKind::Node), node("a", "a", NodeKind::Node)]);
		graph.add_links([raw(node("c", "c", NodeKind::Pod), node("a", "a", NodeKind::Node))]);

		let ids: Vec<_> = graph.nodes().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, ["b", "a", "c"]);
	}

	#[test]
	fn dangling_links_are_not_resolved() {
		let mut graph = GraphState::new();
		graph.add_links([raw(node("c1", "c1", NodeKind::Container), node("p1", "p1", NodeKind::Pod))]);
		graph.remove_node("p1");

		assert_eq!(graph.link_count(), 1);
		assert_eq!(graph.resolved_links().count(), 0);
		assert!(graph.to_graph_data().links.is_empty());
	}

	#[test]
	fn from_plan_adds_isolated_hosts() {
		let plan = LinkPlan {
			links: vec![raw(node("p1-n1", "p1", NodeKind::Service), node("n1", "n1", NodeKind::Node))],
			isolated: vec![node("n2", "n2", NodeKind::Node)],
		};
		let graph = GraphState::from_plan(plan);

		assert_eq!(graph.physical_nodes().count(), 2);
		assert_eq!(graph.link_count(), 1);
	}

	#[test]
	fn graph_data_projection() {
		let mut graph = GraphState::new();
		graph.add_links([raw(
			node("c1", "web", NodeKind::Container).with_state("running"),
			node("p1", "", NodeKind::Pod).with_state(""),
		)]);

		let data = graph.to_graph_data();
		assert_eq!(data.nodes.len(), 2);
		assert_eq!(data.links.len(), 1);

		let container = &data.nodes[0];
		assert_eq!(container.label.as_deref(), Some("web"));
		assert_eq!(container.group.as_deref(), Some("container"));
		assert_eq!(container.state.as_deref(), Some("running"));

		let pod = &data.nodes[1];
		assert_eq!(pod.label, None);
		assert_eq!(pod.state, None);
		assert!(pod.size > container.size);
	}

	#[test]
	fn describe_serializes_the_whole_record() {
		let mut graph = GraphState::new();
		graph.insert_node(
			node("p1-n1", "web", NodeKind::Pod)
				.with_state("Running")
				.with_namespace(Some("default".into()))
				.with_owner(Some("n1".into())),
		);

		let json: serde_json::Value = serde_json::from_str(&graph.describe("p1-n1").unwrap()).unwrap();
		assert_eq!(
			json,
			serde_json::json!({
				"id": "p1-n1",
				"name": "web",
				"kind": "pod",
				"link_type": "supporting",
				"namespace": "default",
				"state": "Running",
				"owner_node": "n1"
			})
		);
		assert_eq!(graph.describe("missing"), None);
	}
}
