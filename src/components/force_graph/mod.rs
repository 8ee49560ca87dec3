//! Force-directed graph visualization component.
//!
//! Renders an interactive force-directed graph on an HTML canvas with:
//! - Physics-based node positioning via force simulation
//! - Live updates that keep existing nodes in place
//! - Pan, zoom, and node dragging interactions
//! - Hover highlighting of a node and its neighbors
//!
//! # Example
//!
//! ```ignore
//! use cluster_graph::components::force_graph::{ForceGraphCanvas, GraphData};
//!
//! let data = RwSignal::new(GraphData::default());
//! view! { <ForceGraphCanvas data=data fullscreen=true /> }
//! ```

mod component;
mod render;
pub mod scale;
mod state;
pub mod theme;
mod types;

pub use component::ForceGraphCanvas;
pub use theme::Theme;
pub use types::{GraphData, GraphLink, GraphNode};
