//! Visual theming for the force graph.
//!
//! A node color is looked up by lifecycle state first and by group second;
//! nodes matching neither take a palette color by position.

use std::collections::HashMap;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Opacity in [0, 1].
	pub a: f64,
}

impl Color {
	/// Opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Color with explicit opacity.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Same color with opacity `a`.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Mix towards white (0.0 = unchanged, 1.0 = white).
	pub fn lighten(self, factor: f64) -> Self {
		self.mix(Color::rgb(255, 255, 255), factor)
	}

	/// Mix towards black (0.0 = unchanged, 1.0 = black).
	pub fn darken(self, factor: f64) -> Self {
		self.mix(Color::rgb(0, 0, 0), factor)
	}

	/// Linear interpolation between two colors, alpha included.
	pub fn lerp(self, other: Color, t: f64) -> Self {
		let t = t.clamp(0.0, 1.0);
		Self {
			a: self.a + (other.a - self.a) * t,
			..self.mix(other, t)
		}
	}

	fn mix(self, other: Color, t: f64) -> Self {
		let t = t.clamp(0.0, 1.0);
		let channel = |from: u8, to: u8| (from as f64 + (to as f64 - from as f64) * t) as u8;
		Self {
			r: channel(self.r, other.r),
			g: channel(self.g, other.g),
			b: channel(self.b, other.b),
			a: self.a,
		}
	}

	/// `#rrggbb` when opaque, `rgba(...)` otherwise.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Fallback palette for nodes with no state or group color.
#[derive(Clone, Debug)]
pub struct NodePalette {
	/// Colors cycled through by node index.
	pub colors: Vec<Color>,
}

impl NodePalette {
	/// Muted slate blues and teals.
	pub fn slate() -> Self {
		Self {
			colors: vec![
				Color::rgb(94, 129, 172),
				Color::rgb(129, 161, 193),
				Color::rgb(100, 148, 160),
				Color::rgb(136, 160, 175),
				Color::rgb(108, 142, 173),
				Color::rgb(119, 158, 165),
			],
		}
	}

	/// Color for slot `index`, wrapping around.
	pub fn get(&self, index: usize) -> Color {
		self.colors[index % self.colors.len()]
	}
}

/// Canvas background.
#[derive(Clone, Debug)]
pub struct BackgroundStyle {
	/// Fill color, and the edge color of the gradient.
	pub color: Color,
	/// Center color of the radial gradient.
	pub color_secondary: Color,
	/// Paint a radial gradient instead of a flat fill.
	pub use_gradient: bool,
}

/// Edge lines and arrowheads.
#[derive(Clone, Debug)]
pub struct EdgeStyle {
	/// Resting color.
	pub color: Color,
	/// Color of edges next to the hovered node.
	pub highlight_color: Color,
}

/// Node fill and outline.
#[derive(Clone, Debug)]
pub struct NodeStyle {
	/// Shade nodes with an off-center radial gradient.
	pub use_gradient: bool,
	/// Outline width in screen pixels; zero disables it.
	pub border_width: f64,
	/// Outline color.
	pub border_color: Color,
	/// Label text color.
	pub label_color: Color,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	/// Canvas fill.
	pub background: BackgroundStyle,
	/// Edge lines and arrowheads.
	pub edge: EdgeStyle,
	/// Node fill, outline, and labels.
	pub node: NodeStyle,
	/// Colors keyed by node group (`node`, `pod`, `service`, `container`).
	pub group_colors: HashMap<String, Color>,
	/// Colors keyed by lifecycle state; these win over group colors.
	pub state_colors: HashMap<String, Color>,
	/// Colors for nodes matching no state or group.
	pub palette: NodePalette,
}

impl Theme {
	/// Resolves a node's fill color: state first, then group, then the
	/// palette slot for `index`.
	pub fn node_color(&self, state: Option<&str>, group: Option<&str>, index: usize) -> Color {
		state
			.and_then(|s| self.state_colors.get(&s.to_ascii_lowercase()))
			.or_else(|| group.and_then(|g| self.group_colors.get(g)))
			.copied()
			.unwrap_or_else(|| self.palette.get(index))
	}
}

fn color_map(entries: &[(&str, Color)]) -> HashMap<String, Color> {
	entries.iter().map(|(k, c)| (k.to_string(), *c)).collect()
}

impl Default for Theme {
	fn default() -> Self {
		Self {
			background: BackgroundStyle {
				color: Color::rgb(22, 27, 34),
				color_secondary: Color::rgb(30, 35, 42),
				use_gradient: true,
			},
			edge: EdgeStyle {
				color: Color::rgba(140, 160, 180, 0.5),
				highlight_color: Color::rgba(210, 220, 235, 0.9),
			},
			node: NodeStyle {
				use_gradient: true,
				border_width: 1.0,
				border_color: Color::rgba(255, 255, 255, 0.25),
				label_color: Color::rgba(255, 255, 255, 0.85),
			},
			group_colors: color_map(&[
				("node", Color::rgb(69, 90, 100)),
				("pod", Color::rgb(25, 118, 210)),
				("service", Color::rgb(123, 31, 162)),
				("container", Color::rgb(0, 131, 143)),
			]),
			state_colors: color_map(&[
				("running", Color::rgb(46, 125, 50)),
				("ready", Color::rgb(69, 90, 100)),
				("waiting", Color::rgb(249, 168, 37)),
				("pending", Color::rgb(249, 168, 37)),
				("terminated", Color::rgb(198, 40, 40)),
				("failed", Color::rgb(198, 40, 40)),
				("unknown", Color::rgb(117, 117, 117)),
			]),
			palette: NodePalette::slate(),
		}
	}
}
