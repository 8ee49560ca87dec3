//! Canvas rendering for the force graph.
//!
//! Drawing order: background in screen space, then edges, dimmed nodes, and
//! finally highlighted nodes on top, all in world space.

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::scale::{ScaleConfig, ScaledValues};
use super::state::{ForceGraphState, NodeInfo};
use super::theme::Theme;

type SimNode = force_graph::Node<NodeInfo>;

fn smooth_step(t: f64) -> f64 {
	t * t * (3.0 - 2.0 * t)
}

/// Renders the complete graph to the canvas.
pub fn render(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	config: &ScaleConfig,
	theme: &Theme,
) {
	let scale = ScaledValues::new(config, state.transform.k);

	draw_background(state, ctx, theme);

	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);

	let dim = smooth_step(state.highlight.max_intensity());
	state.graph.visit_edges(|n1, n2, _| draw_edge(state, ctx, &scale, theme, n1, n2, dim));
	draw_nodes(state, ctx, &scale, theme, dim);

	ctx.restore();
}

fn draw_background(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	let bg = &theme.background;
	let (cx, cy) = (state.width / 2.0, state.height / 2.0);
	let gradient = bg
		.use_gradient
		.then(|| ctx.create_radial_gradient(cx, cy, 0.0, cx, cy, state.width.max(state.height) * 0.8))
		.and_then(Result::ok);

	match gradient {
		Some(gradient) => {
			let _ = gradient.add_color_stop(0.0, &bg.color_secondary.to_css());
			let _ = gradient.add_color_stop(1.0, &bg.color.to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		None => ctx.set_fill_style_str(&bg.color.to_css()),
	}
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
}

/// Draws one edge as a line ending in an arrowhead at the target's rim.
fn draw_edge(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
	source: &SimNode,
	target: &SimNode,
	dim: f64,
) {
	let (x1, y1, x2, y2) = (
		source.x() as f64,
		source.y() as f64,
		target.x() as f64,
		target.y() as f64,
	);
	let (dx, dy) = (x2 - x1, y2 - y1);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);

	let edge_t = smooth_step(state.highlight.edge_intensity(source.index(), target.index()));
	let base = theme.edge.color.with_alpha(theme.edge.color.a * (1.0 - 0.7 * dim));
	let color = if edge_t > 0.01 {
		base.lerp(theme.edge.highlight_color, edge_t)
	} else {
		base
	};

	let source_rim = scale.node_radius * source.data.user_data.size;
	let target_rim = scale.node_radius * target.data.user_data.size;
	let arrow = if scale.arrow_alpha > 0.0 {
		scale.arrow_size
	} else {
		0.0
	};

	ctx.set_stroke_style_str(&color.to_css());
	ctx.set_line_width(scale.edge_width * (1.0 + 0.5 * edge_t));
	ctx.begin_path();
	ctx.move_to(x1 + ux * source_rim, y1 + uy * source_rim);
	ctx.line_to(x2 - ux * (target_rim + arrow), y2 - uy * (target_rim + arrow));
	ctx.stroke();

	if arrow > 0.0 {
		let (tip_x, tip_y) = (x2 - ux * target_rim, y2 - uy * target_rim);
		let (back_x, back_y) = (tip_x - ux * arrow, tip_y - uy * arrow);
		let (px, py) = (-uy * arrow * 0.5, ux * arrow * 0.5);

		ctx.set_fill_style_str(&color.with_alpha(color.a * scale.arrow_alpha).to_css());
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
}

fn draw_nodes(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
	dim: f64,
) {
	// Non-highlighted nodes first so highlighted ones paint over them.
	state.graph.visit_nodes(|node| {
		if state.highlight.node_intensity(node.index()) <= 0.001 {
			draw_node(ctx, node, scale, theme, 1.0 - 0.7 * dim, 1.0 - 0.15 * dim);
		}
	});

	state.graph.visit_nodes(|node| {
		let idx = node.index();
		let t = smooth_step(state.highlight.node_intensity(idx));
		if t <= 0.001 {
			return;
		}

		let hovered = state.highlight.hovered_node == Some(idx);
		let grow = if hovered { 0.4 } else { 0.25 };
		let alpha = (1.0 - 0.7 * dim) + 0.7 * dim * t;
		let radius_mult = (1.0 - 0.15 * dim) + (0.15 * dim + grow) * t;
		draw_node(ctx, node, scale, theme, alpha, radius_mult);

		if hovered {
			let radius = scale.node_radius * radius_mult * node.data.user_data.size;
			ctx.begin_path();
			let _ = ctx.arc(
				node.x() as f64,
				node.y() as f64,
				radius + scale.ring_offset,
				0.0,
				2.0 * PI,
			);
			ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.8 * t));
			ctx.set_line_width(scale.ring_width);
			ctx.stroke();
		}
	});
}

fn draw_node(
	ctx: &CanvasRenderingContext2d,
	node: &SimNode,
	scale: &ScaledValues,
	theme: &Theme,
	alpha: f64,
	radius_mult: f64,
) {
	let (x, y) = (node.x() as f64, node.y() as f64);
	let info = &node.data.user_data;
	let radius = scale.node_radius * radius_mult * info.size;

	ctx.set_global_alpha(alpha);
	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);

	let gradient = theme
		.node
		.use_gradient
		.then(|| ctx.create_radial_gradient(x - radius * 0.3, y - radius * 0.3, 0.0, x, y, radius))
		.and_then(Result::ok);
	match gradient {
		Some(gradient) => {
			let _ = gradient.add_color_stop(0.0, &info.color.lighten(0.4).to_css());
			let _ = gradient.add_color_stop(0.7, &info.color.to_css());
			let _ = gradient.add_color_stop(1.0, &info.color.darken(0.2).to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		None => ctx.set_fill_style_str(&info.color.to_css()),
	}
	ctx.fill();

	if theme.node.border_width > 0.0 {
		ctx.set_stroke_style_str(&theme.node.border_color.to_css());
		ctx.set_line_width(theme.node.border_width / scale.k);
		ctx.stroke();
	}

	if let Some(label) = &info.label {
		if alpha > 0.5 {
			ctx.set_fill_style_str(&theme.node.label_color.to_css());
			ctx.set_font(&scale.label_font);
			let _ = ctx.fill_text(label, x + radius + 4.0 / scale.k, y + 3.0 / scale.k);
		}
	}
	ctx.set_global_alpha(1.0);
}
