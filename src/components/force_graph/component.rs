//! Leptos component wrapping the force-directed graph canvas.
//!
//! The component creates an HTML canvas element and wires up mouse/wheel event
//! handlers for node dragging, panning, and zooming. An animation loop runs via
//! `requestAnimationFrame`, stepping the physics simulation and redrawing each
//! frame. Changes to the `data` signal are synced into the running simulation
//! rather than restarting it.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::debug;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::scale::ScaleConfig;
use super::state::ForceGraphState;
use super::theme::Theme;
use super::types::GraphData;
use crate::config::LayoutConfig;

/// Bundles graph simulation state with visual configuration.
struct GraphContext {
	state: ForceGraphState,
	scale: ScaleConfig,
	theme: Theme,
}

type SharedContext = Rc<RefCell<Option<GraphContext>>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn window_size(window: &Window) -> (f64, f64) {
	let dimension = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64());
	(
		dimension(window.inner_width()).unwrap_or(800.0),
		dimension(window.inner_height()).unwrap_or(600.0),
	)
}

/// Pointer position relative to the canvas's top-left corner.
fn canvas_position(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Renders an interactive force-directed graph on a canvas element.
///
/// Pass graph data via the reactive `data` signal; every update is merged
/// into the live layout, keeping existing nodes where they are. The
/// component sizes itself to its parent container by default; set
/// `fullscreen = true` to fill the viewport and follow window resizes.
/// Explicit `width`/`height` override automatic sizing. A click on a node
/// that was not dragged passes the node's id to `on_node_click`.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(optional, into)] on_node_click: Option<Callback<String>>,
	#[prop(default = LayoutConfig::default())] layout: LayoutConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: SharedContext = Rc::new(RefCell::new(None));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let resize_cb: FrameCallback = Rc::new(RefCell::new(None));
	let (context_init, animate_init, resize_cb_init) =
		(context.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if context_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			let parent = canvas.parent_element();
			(
				width.unwrap_or_else(|| parent.as_ref().map_or(800.0, |p| p.client_width() as f64)),
				height.unwrap_or_else(|| parent.as_ref().map_or(600.0, |p| p.client_height() as f64)),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			log::warn!("cluster-graph: canvas 2d context unavailable");
			return;
		};

		let theme = Theme::default();
		*context_init.borrow_mut() = Some(GraphContext {
			state: ForceGraphState::new(&data.get_untracked(), w, h, &theme, &layout),
			scale: ScaleConfig::default(),
			theme,
		});

		if fullscreen {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = window_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut c) = *context_resize.borrow_mut() {
					c.state.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (context_anim, animate_inner) = (context_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut c) = *context_anim.borrow_mut() {
				if c.state.animation_running {
					c.state.tick(0.016);
				}
				render::render(&c.state, &ctx, &c.scale, &c.theme);
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let context_sync = context.clone();
	Effect::new(move |_| {
		let graph = data.get();
		if let Some(ref mut c) = *context_sync.borrow_mut() {
			c.state.sync(&graph, &c.theme);
			debug!(
				"cluster-graph: synced view to {} nodes, {} links",
				graph.nodes.len(),
				graph.links.len()
			);
		}
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_md.borrow_mut() {
			if let Some(idx) = c.state.node_at_position(x, y, &c.scale) {
				let (mut nx, mut ny) = (0.0, 0.0);
				c.state.graph.visit_nodes(|node| {
					if node.index() == idx {
						(nx, ny) = (node.x(), node.y());
					}
				});
				c.state.drag = super::state::DragState {
					active: true,
					node_idx: Some(idx),
					moved: false,
					start_x: x,
					start_y: y,
					node_start_x: nx,
					node_start_y: ny,
				};
			} else {
				c.state.pan = super::state::PanState {
					active: true,
					start_x: x,
					start_y: y,
					transform_start_x: c.state.transform.x,
					transform_start_y: c.state.transform.y,
				};
			}
		}
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_position(canvas_ref, &ev) else {
			return;
		};
		let Some(ref mut c) = *context_mm.borrow_mut() else {
			return;
		};
		let state = &mut c.state;

		if let (true, Some(idx)) = (state.drag.active, state.drag.node_idx) {
			let (dx, dy) = (
				(x - state.drag.start_x) / state.transform.k,
				(y - state.drag.start_y) / state.transform.k,
			);
			let (nx, ny) = (
				state.drag.node_start_x + dx as f32,
				state.drag.node_start_y + dy as f32,
			);
			state.drag.moved |= dx.abs() > 1.0 || dy.abs() > 1.0;
			state.graph.visit_nodes_mut(|node| {
				if node.index() == idx {
					node.data.x = nx;
					node.data.y = ny;
					node.data.is_anchor = true;
				}
			});
		} else {
			let hovered = state.node_at_position(x, y, &c.scale);
			state.set_hover(hovered);
			if state.pan.active {
				state.transform.x = state.pan.transform_start_x + (x - state.pan.start_x);
				state.transform.y = state.pan.transform_start_y + (y - state.pan.start_y);
			}
		}
	};

	let context_mu = context.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_mu.borrow_mut() {
			if let (Some(idx), false) = (c.state.drag.node_idx, c.state.drag.moved) {
				if let Some(node) = c.state.node_info(idx) {
					debug!("cluster-graph: clicked {}", node.id);
					if let Some(callback) = on_node_click {
						callback.run(node.id.clone());
					}
				}
			}
			c.state.drag = Default::default();
			c.state.pan.active = false;
		}
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_ml.borrow_mut() {
			c.state.drag = Default::default();
			c.state.pan.active = false;
			c.state.set_hover(None);
		}
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_wh.borrow_mut() {
			let t = &mut c.state.transform;
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			let new_k = (t.k * factor).clamp(0.1, 10.0);
			let ratio = new_k / t.k;
			t.x = x - (x - t.x) * ratio;
			t.y = y - (y - t.y) * ratio;
			t.k = new_k;
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
