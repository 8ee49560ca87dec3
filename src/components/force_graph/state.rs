//! Graph simulation state and interaction tracking.
//!
//! Wraps the `force_graph` physics simulation with per-node display data,
//! pan/zoom transforms, and hover highlighting. The simulation is kept in
//! step with incoming [`GraphData`] through [`ForceGraphState::sync`], which
//! preserves the positions of nodes that survive an update.

use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData};

use super::scale::{ScaleConfig, ScaledValues};
use super::theme::{Color, Theme};
use super::types::GraphData;
use crate::config::LayoutConfig;

/// Per-node display data attached to each node in the simulation.
#[derive(Clone, Debug)]
pub struct NodeInfo {
	pub id: String,
	pub label: Option<String>,
	pub color: Color,
	/// Size multiplier (1.0 = normal).
	pub size: f64,
}

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor (1.0 = 100%, clamped to 0.1..10.0).
	pub k: f64,
}

/// Tracks an in-progress node drag.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	/// Set once the pointer moves; a drag that never moved is a click.
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

/// Tracks an in-progress canvas pan.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Hover highlight with per-node intensities that ease towards their target.
///
/// The hovered node and its direct neighbors fade in; everything else fades
/// out. Intensities use exponential smoothing so transitions slow down as
/// they settle.
#[derive(Clone, Debug, Default)]
pub struct HighlightState {
	pub hovered_node: Option<DefaultNodeIdx>,
	targets: HashSet<DefaultNodeIdx>,
	intensity: HashMap<DefaultNodeIdx, f64>,
	max: f64,
}

impl HighlightState {
	const FADE_IN_SPEED: f64 = 6.0;
	const FADE_OUT_SPEED: f64 = 4.0;

	pub fn set_hover(
		&mut self,
		node: Option<DefaultNodeIdx>,
		edges: &[(DefaultNodeIdx, DefaultNodeIdx)],
	) {
		if self.hovered_node == node {
			return;
		}
		self.hovered_node = node;
		self.targets.clear();

		if let Some(idx) = node {
			self.targets.insert(idx);
			for &(src, tgt) in edges {
				if src == idx {
					self.targets.insert(tgt);
				} else if tgt == idx {
					self.targets.insert(src);
				}
			}
		}
	}

	pub fn tick(&mut self, dt: f64) {
		let fade_in = 1.0 - (-Self::FADE_IN_SPEED * dt).exp();
		let fade_out = (-Self::FADE_OUT_SPEED * dt).exp();

		for &idx in &self.targets {
			let value = self.intensity.entry(idx).or_insert(0.0);
			*value += (1.0 - *value) * fade_in;
		}

		let mut max: f64 = 0.0;
		self.intensity.retain(|idx, value| {
			if !self.targets.contains(idx) {
				*value *= fade_out;
			}
			max = max.max(*value);
			*value > 0.005
		});
		self.max = max;
	}

	/// Drops all highlight data for a node that left the graph.
	pub fn forget(&mut self, idx: DefaultNodeIdx) {
		self.targets.remove(&idx);
		self.intensity.remove(&idx);
		if self.hovered_node == Some(idx) {
			self.hovered_node = None;
		}
	}

	pub fn node_intensity(&self, idx: DefaultNodeIdx) -> f64 {
		self.intensity.get(&idx).copied().unwrap_or(0.0)
	}

	/// Geometric mean of the endpoint intensities.
	pub fn edge_intensity(&self, a: DefaultNodeIdx, b: DefaultNodeIdx) -> f64 {
		(self.node_intensity(a) * self.node_intensity(b)).sqrt()
	}

	pub fn max_intensity(&self) -> f64 {
		self.max
	}
}

fn edge_key(a: DefaultNodeIdx, b: DefaultNodeIdx) -> (DefaultNodeIdx, DefaultNodeIdx) {
	if a <= b { (a, b) } else { (b, a) }
}

/// Core graph state combining the physics simulation with interaction and
/// highlight tracking.
pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub highlight: HighlightState,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	index: HashMap<String, DefaultNodeIdx>,
	edges: Vec<(DefaultNodeIdx, DefaultNodeIdx)>,
}

impl ForceGraphState {
	pub fn new(data: &GraphData, width: f64, height: f64, theme: &Theme, layout: &LayoutConfig) -> Self {
		let mut state = Self {
			graph: ForceGraph::new(layout.simulation_parameters()),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			highlight: HighlightState::default(),
			width,
			height,
			animation_running: true,
			index: HashMap::new(),
			edges: Vec::new(),
		};
		state.sync(data, theme);
		state
	}

	pub fn node_count(&self) -> usize {
		self.index.len()
	}

	pub fn edges(&self) -> &[(DefaultNodeIdx, DefaultNodeIdx)] {
		&self.edges
	}

	pub fn node_index(&self, id: &str) -> Option<DefaultNodeIdx> {
		self.index.get(id).copied()
	}

	/// Brings the simulation in line with `data`.
	///
	/// Vanished nodes are removed, surviving nodes keep their position and get
	/// fresh display data, and new nodes are placed next to an already-placed
	/// neighbor. Links with an unknown endpoint are ignored.
	pub fn sync(&mut self, data: &GraphData, theme: &Theme) {
		let wanted: HashSet<&str> = data.nodes.iter().map(|n| n.id.as_str()).collect();
		let gone: Vec<(String, DefaultNodeIdx)> = self
			.index
			.iter()
			.filter(|(id, _)| !wanted.contains(id.as_str()))
			.map(|(id, &idx)| (id.clone(), idx))
			.collect();
		for (id, idx) in gone {
			self.graph.remove_node(idx);
			self.index.remove(&id);
			self.highlight.forget(idx);
			if self.drag.node_idx == Some(idx) {
				self.drag = DragState::default();
			}
		}
		let alive: HashSet<DefaultNodeIdx> = self.index.values().copied().collect();
		self.edges.retain(|(a, b)| alive.contains(a) && alive.contains(b));

		let mut positions: HashMap<String, (f32, f32)> = HashMap::new();
		self.graph.visit_nodes(|node| {
			positions.insert(node.data.user_data.id.clone(), (node.x(), node.y()));
		});

		let mut refreshed: HashMap<DefaultNodeIdx, NodeInfo> = HashMap::new();
		for (i, node) in data.nodes.iter().enumerate() {
			let info = NodeInfo {
				id: node.id.clone(),
				label: node.label.clone(),
				color: theme.node_color(node.state.as_deref(), node.group.as_deref(), i),
				size: node.size.unwrap_or(1.0),
			};

			if let Some(&idx) = self.index.get(&node.id) {
				refreshed.insert(idx, info);
				continue;
			}

			let (x, y) = self.placement(data, &node.id, i, &positions);
			positions.insert(node.id.clone(), (x, y));
			let idx = self.graph.add_node(NodeData {
				x,
				y,
				mass: 10.0,
				is_anchor: false,
				user_data: info,
			});
			self.index.insert(node.id.clone(), idx);
		}
		if !refreshed.is_empty() {
			self.graph.visit_nodes_mut(|node| {
				if let Some(info) = refreshed.remove(&node.index()) {
					node.data.user_data = info;
				}
			});
		}

		let mut wanted_ids: Vec<(&str, &str)> = Vec::with_capacity(data.links.len());
		for link in &data.links {
			if self.index.contains_key(&link.source) && self.index.contains_key(&link.target) {
				wanted_ids.push((link.source.as_str(), link.target.as_str()));
			}
		}
		let wanted_keys: HashSet<_> = wanted_ids
			.iter()
			.map(|(s, t)| edge_key(self.index[*s], self.index[*t]))
			.collect();

		// force_graph can only drop edges along with their nodes, so a link
		// that disappeared between two surviving nodes forces a rebuild.
		if self.edges.iter().any(|&(a, b)| !wanted_keys.contains(&edge_key(a, b))) {
			self.rebuild();
		}

		let mut present: HashSet<_> = self.edges.iter().map(|&(a, b)| edge_key(a, b)).collect();
		let mut edges = Vec::with_capacity(wanted_ids.len());
		for (source, target) in wanted_ids {
			let (src, tgt) = (self.index[source], self.index[target]);
			if present.insert(edge_key(src, tgt)) {
				self.graph.add_edge(src, tgt, EdgeData::default());
			}
			edges.push((src, tgt));
		}
		self.edges = edges;
	}

	/// Initial position for a new node: near the first linked node that is
	/// already placed, otherwise on a ring around the view center.
	fn placement(
		&self,
		data: &GraphData,
		id: &str,
		i: usize,
		positions: &HashMap<String, (f32, f32)>,
	) -> (f32, f32) {
		let angle = i as f64 * 2.399963; // golden angle
		let neighbor = data.links.iter().find_map(|link| {
			let other = if link.source == id {
				&link.target
			} else if link.target == id {
				&link.source
			} else {
				return None;
			};
			positions.get(other)
		});

		match neighbor {
			Some(&(x, y)) => (
				x + (30.0 * angle.cos()) as f32,
				y + (30.0 * angle.sin()) as f32,
			),
			None => {
				let ring = (i as f64) * 2.0 * PI / 12.0;
				(
					(100.0 * ring.cos()) as f32,
					(100.0 * ring.sin()) as f32,
				)
			}
		}
	}

	/// Recreates the simulation from its current nodes, dropping every edge.
	/// Positions and anchors carry over; indices change.
	fn rebuild(&mut self) {
		let mut saved = Vec::with_capacity(self.index.len());
		self.graph.visit_nodes(|node| {
			saved.push((
				node.index(),
				node.data.x,
				node.data.y,
				node.data.mass,
				node.data.is_anchor,
				node.data.user_data.clone(),
			));
		});

		self.graph.clear();
		let mut remap = HashMap::with_capacity(saved.len());
		for (old, x, y, mass, is_anchor, user_data) in saved {
			let new = self.graph.add_node(NodeData {
				x,
				y,
				mass,
				is_anchor,
				user_data,
			});
			remap.insert(old, new);
		}
		for idx in self.index.values_mut() {
			if let Some(&new) = remap.get(idx) {
				*idx = new;
			}
		}

		self.edges.clear();
		self.highlight = HighlightState::default();
		self.drag = DragState::default();
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64, config: &ScaleConfig) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let scale = ScaledValues::new(config, self.transform.k);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			if (dx * dx + dy * dy).sqrt() < scale.hit_radius * node.data.user_data.size {
				found = Some(node.index());
			}
		});
		found
	}

	pub fn node_info(&self, idx: DefaultNodeIdx) -> Option<&NodeInfo> {
		self.graph
			.get_graph()
			.node_weight(idx)
			.map(|node| &node.data.user_data)
	}

	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) {
		self.highlight.set_hover(node, &self.edges);
	}

	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
		self.highlight.tick(dt as f64);
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.transform.x += (width - self.width) / 2.0;
		self.transform.y += (height - self.height) / 2.0;
		self.width = width;
		self.height = height;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::{GraphLink, GraphNode};

	fn node(id: &str) -> GraphNode {
		GraphNode {
			id: id.into(),
			label: Some(id.into()),
			group: Some("pod".into()),
			state: None,
			size: None,
		}
	}

	fn link(source: &str, target: &str) -> GraphLink {
		GraphLink {
			source: source.into(),
			target: target.into(),
		}
	}

	fn data(nodes: &[&str], links: &[(&str, &str)]) -> GraphData {
		GraphData {
			nodes: nodes.iter().map(|id| node(id)).collect(),
			links: links.iter().map(|(s, t)| link(s, t)).collect(),
		}
	}

	fn position(state: &ForceGraphState, id: &str) -> (f32, f32) {
		let idx = state.node_index(id).unwrap();
		let mut pos = None;
		state.graph.visit_nodes(|n| {
			if n.index() == idx {
				pos = Some((n.x(), n.y()));
			}
		});
		pos.unwrap()
	}

	fn state(graph: &GraphData) -> ForceGraphState {
		ForceGraphState::new(graph, 800.0, 600.0, &Theme::default(), &LayoutConfig::default())
	}

	fn edge_count(state: &ForceGraphState) -> usize {
		let mut count = 0;
		state.graph.visit_edges(|_, _, _| count += 1);
		count
	}

	#[test]
	fn builds_nodes_and_edges() {
		let state = state(&data(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "zz")]));

		assert_eq!(state.node_count(), 3);
		assert_eq!(state.edges().len(), 2);
		assert_eq!(edge_count(&state), 2);
	}

	#[test]
	fn sync_keeps_surviving_positions() {
		let theme = Theme::default();
		let mut state = state(&data(&["a", "b"], &[("a", "b")]));
		state.tick(0.016);
		let before = position(&state, "a");

		state.sync(&data(&["a", "b", "c"], &[("a", "b"), ("c", "a")]), &theme);

		assert_eq!(position(&state, "a"), before);
		assert_eq!(state.node_count(), 3);
		assert_eq!(edge_count(&state), 2);
	}

	#[test]
	fn sync_removes_vanished_nodes_and_their_edges() {
		let theme = Theme::default();
		let mut state = state(&data(&["a", "b", "c"], &[("a", "b"), ("c", "b")]));

		state.sync(&data(&["a", "b"], &[("a", "b")]), &theme);

		assert_eq!(state.node_count(), 2);
		assert!(state.node_index("c").is_none());
		assert_eq!(edge_count(&state), 1);
	}

	#[test]
	fn sync_drops_edge_between_surviving_nodes() {
		let theme = Theme::default();
		let mut state = state(&data(&["a", "b", "c"], &[("a", "b"), ("b", "c")]));
		let before = position(&state, "c");

		state.sync(&data(&["a", "b", "c"], &[("a", "b")]), &theme);

		assert_eq!(state.node_count(), 3);
		assert_eq!(edge_count(&state), 1);
		assert_eq!(position(&state, "c"), before);
	}

	#[test]
	fn sync_refreshes_display_data() {
		let theme = Theme::default();
		let mut graph = data(&["a"], &[]);
		let mut state = state(&graph);

		graph.nodes[0].state = Some("running".into());
		graph.nodes[0].label = Some("renamed".into());
		state.sync(&graph, &theme);

		let info = state.node_info(state.node_index("a").unwrap()).unwrap();
		assert_eq!(info.label.as_deref(), Some("renamed"));
		assert_eq!(info.color, theme.state_colors["running"]);
	}

	#[test]
	fn hover_highlights_neighbors() {
		let mut state = state(&data(&["a", "b", "c"], &[("a", "b")]));
		let (a, b, c) = (
			state.node_index("a").unwrap(),
			state.node_index("b").unwrap(),
			state.node_index("c").unwrap(),
		);

		state.set_hover(Some(a));
		state.tick(0.1);

		assert!(state.highlight.node_intensity(a) > 0.0);
		assert!(state.highlight.node_intensity(b) > 0.0);
		assert_eq!(state.highlight.node_intensity(c), 0.0);

		state.set_hover(None);
		for _ in 0..200 {
			state.highlight.tick(0.1);
		}
		assert_eq!(state.highlight.max_intensity(), 0.0);
	}
}
