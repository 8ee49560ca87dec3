//! cluster-graph: live force-directed visualization of cluster topology.
//!
//! On start the viewer fetches a snapshot of hosts, pods, and containers,
//! flattens it into a graph, and then keeps that graph current from the
//! cluster's watch streams. The graph is drawn with a physics-based layout
//! that supports pan, zoom, and dragging.

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::*;
use log::{Level, debug, info, warn};

pub mod api;
pub mod components;
pub mod config;
pub mod topology;

use api::{ApiClient, fetch_snapshot, watch};
use config::ViewerConfig;
pub use components::force_graph::{ForceGraphCanvas, GraphData, GraphLink, GraphNode};
use topology::{GraphState, TopologyEvent};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("cluster-graph: logging initialized");
}

/// Applies one watch event to the shared graph, logging the outcome.
fn apply_event(topology: RwSignal<GraphState>, event: TopologyEvent) {
	topology.update(|graph| match event.apply(graph) {
		Ok(delta) if delta.is_empty() => debug!("cluster-graph: {event:?} changed nothing"),
		Ok(delta) => debug!("cluster-graph: applied {event:?}: {delta:?}"),
		Err(e) => warn!("cluster-graph: rejected {event:?}: {e}"),
	});
}

/// Loads the initial snapshot, then opens one watch stream per configured
/// resource.
fn start_sync(config: &ViewerConfig, topology: RwSignal<GraphState>) {
	let client = ApiClient::new(config.api_base.clone());
	let resources = config.watch.clone();

	spawn_local(async move {
		match fetch_snapshot(&client).await {
			Ok(snapshot) => {
				let graph = GraphState::from_plan(snapshot.link_plan());
				info!(
					"cluster-graph: initial graph has {} nodes, {} links",
					graph.node_count(),
					graph.link_count()
				);
				topology.set(graph);
			}
			Err(e) => warn!("cluster-graph: snapshot failed, starting empty: {e}"),
		}

		for resource in resources {
			let client = client.clone();
			spawn_local(async move {
				let result = watch(&client, &resource, |event| apply_event(topology, event)).await;
				match result {
					Ok(()) => info!("cluster-graph: {resource} watch closed"),
					Err(e) => warn!("cluster-graph: {resource} watch failed: {e}"),
				}
			});
		}
	});
}

/// Main application component.
/// Reads the page config, starts syncing with the cluster, and renders the
/// force-directed view of the topology.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = ViewerConfig::load();
	let topology = RwSignal::new(GraphState::new());
	start_sync(&config, topology);
	let ViewerConfig { title, layout, .. } = config;

	let graph_data = Signal::derive(move || topology.with(GraphState::to_graph_data));
	let on_node_click = Callback::new(move |id: String| {
		match topology.with_untracked(|graph| graph.describe(&id)) {
			Some(record) => info!("cluster-graph: clicked {record}"),
			None => debug!("cluster-graph: clicked {id}, no longer in the graph"),
		}
	});
	let counts = move || {
		topology.with(|g| format!("{} nodes, {} links", g.node_count(), g.link_count()))
	};

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text=title.clone() />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<ForceGraphCanvas
				data=graph_data
				on_node_click=on_node_click
				layout=layout
				fullscreen=true
			/>
			<div class="graph-overlay">
				<h1>{title}</h1>
				<p class="subtitle">{counts}</p>
				<p class="subtitle">"Drag nodes to reposition. Scroll to zoom. Drag background to pan."</p>
			</div>
		</div>
	}
}
