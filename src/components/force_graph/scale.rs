//! Zoom-dependent sizing of graph visuals.
//!
//! Sizes are expressed in world units (the graph's coordinate system, which
//! the canvas transform scales by the zoom factor `k`). A size may instead be
//! pinned to screen pixels, or kept in world units but clamped to a pixel
//! range so it neither vanishes when zoomed out nor swamps the view when
//! zoomed in.

/// How a size reacts to zoom.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScaleBehavior {
	/// Constant screen size in pixels.
	Screen,
	/// World-space size whose on-screen size stays within the given pixel bounds.
	Clamped {
		/// Smallest on-screen size in pixels.
		min_screen: f64,
		/// Largest on-screen size in pixels.
		max_screen: f64,
	},
}

impl ScaleBehavior {
	/// World-space size to draw with at zoom `k`.
	pub fn apply(self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => base.clamp(min_screen / k, max_screen / k),
		}
	}
}

/// Base sizes and their zoom behavior.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	/// Node radius in world units, before the per-node size multiplier.
	pub node_radius: f64,
	/// How node radius and hit radius react to zoom.
	pub node_behavior: ScaleBehavior,
	/// Pointer hit radius, relative to the same behavior as nodes.
	pub hit_radius: f64,
	/// Label font size in pixels.
	pub label_size: f64,
	/// Below this zoom, labels stop shrinking.
	pub label_min_k: f64,
	/// Edge line width in pixels.
	pub edge_width: f64,
	/// Arrowhead length in world units.
	pub arrow_size: f64,
	/// How arrowheads react to zoom.
	pub arrow_behavior: ScaleBehavior,
	/// Arrowheads fade out linearly below this zoom and vanish at half of it.
	pub arrow_fade_k: f64,
	/// Hover ring stroke width and gap, in pixels.
	pub ring_width: f64,
	/// Gap between a hovered node and its ring.
	pub ring_offset: f64,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			node_radius: 6.0,
			node_behavior: ScaleBehavior::Clamped {
				min_screen: 3.0,
				max_screen: f64::INFINITY,
			},
			hit_radius: 10.0,
			label_size: 10.0,
			label_min_k: 0.5,
			edge_width: 1.2,
			arrow_size: 5.0,
			arrow_behavior: ScaleBehavior::Clamped {
				min_screen: 0.0,
				max_screen: 16.0,
			},
			arrow_fade_k: 0.6,
			ring_width: 1.5,
			ring_offset: 2.0,
		}
	}
}

/// Scale values resolved for one zoom level; computed once per frame.
#[derive(Clone, Debug)]
pub struct ScaledValues {
	/// Zoom factor these values were computed for.
	pub k: f64,
	/// Node radius in world units.
	pub node_radius: f64,
	/// Pointer hit radius in world units.
	pub hit_radius: f64,
	/// CSS font shorthand for labels.
	pub label_font: String,
	/// Edge line width in world units.
	pub edge_width: f64,
	/// Arrowhead length in world units.
	pub arrow_size: f64,
	/// Arrowhead opacity in [0, 1]; zero means arrows are skipped.
	pub arrow_alpha: f64,
	/// Hover ring stroke width in world units.
	pub ring_width: f64,
	/// Hover ring gap in world units.
	pub ring_offset: f64,
}

impl ScaledValues {
	/// Resolves every size in `config` for zoom `k`.
	pub fn new(config: &ScaleConfig, k: f64) -> Self {
		let fade_start = config.arrow_fade_k;
		let arrow_alpha = if fade_start <= 0.0 {
			1.0
		} else {
			((k - fade_start * 0.5) / (fade_start * 0.5)).clamp(0.0, 1.0)
		};

		Self {
			k,
			node_radius: config.node_behavior.apply(config.node_radius, k),
			hit_radius: config.node_behavior.apply(config.hit_radius, k),
			label_font: format!("{}px sans-serif", config.label_size / k.max(config.label_min_k)),
			edge_width: ScaleBehavior::Screen.apply(config.edge_width, k),
			arrow_size: config.arrow_behavior.apply(config.arrow_size, k),
			arrow_alpha,
			ring_width: ScaleBehavior::Screen.apply(config.ring_width, k),
			ring_offset: ScaleBehavior::Screen.apply(config.ring_offset, k),
		}
	}
}
