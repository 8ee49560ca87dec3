//! Cluster topology graph: snapshot-derived links, the owned graph state, and
//! the event applier that keeps it current.

mod error;
mod events;
mod graph;
mod links;
mod model;

pub use error::TopologyError;
pub use events::{NodeUp, RawEvent, TaskStart, TopologyEvent};
pub use graph::{GraphDelta, GraphState};
pub use links::{LinkPlan, build_links};
pub use model::{
	Container, ContainerState, Link, LinkType, NodeKind, PhysicalNode, Pod, RawLink, TopologyNode,
	composite_id,
};
