//! Derives the initial link set from flat snapshot lists.

use super::model::{
	Container, LinkType, NodeKind, PhysicalNode, Pod, RawLink, TopologyNode, composite_id,
};

/// Output of [`build_links`]: links to normalize into the graph, plus
/// physical nodes that host nothing and must be added on their own.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinkPlan {
	/// Container→pod and pod→node links, in discovery order.
	pub links: Vec<RawLink>,
	/// Hosts with no linked pods.
	pub isolated: Vec<TopologyNode>,
}

fn host_node(node: &PhysicalNode) -> TopologyNode {
	TopologyNode::new(&node.id, &node.name, NodeKind::Node, LinkType::Supporting)
		.with_state(&node.status)
}

/// Builds container→pod and pod→node links.
///
/// Pods are placed on hosts through their containers: a pod gets one
/// pod→node link per host that runs at least one of its containers, and its
/// identity on that host is the composite `podId-nodeId`.
pub fn build_links(nodes: &[PhysicalNode], pods: &[Pod], containers: &[Container]) -> LinkPlan {
	let mut plan = LinkPlan::default();

	for node in nodes {
		let mut hosts_pods = false;

		for pod in pods {
			let pod_on_node = composite_id(&pod.id, &node.id);
			let mut linked = false;

			for container in containers {
				if container.node_id.as_deref() != Some(node.id.as_str()) || container.pod_id != pod.id {
					continue;
				}

				plan.links.push(RawLink {
					source: TopologyNode::new(
						&container.id,
						&container.name,
						NodeKind::Container,
						LinkType::ServiceInstance,
					)
					.with_state(container.state.as_str())
					.with_owner(Some(node.id.clone())),
					target: TopologyNode {
						state: pod.phase.clone(),
						..TopologyNode::new(&pod_on_node, &pod.name, NodeKind::Pod, LinkType::ServiceInstance)
					}
					.with_namespace(pod.namespace.clone())
					.with_owner(Some(node.id.clone())),
				});
				linked = true;
			}

			if linked {
				plan.links.push(RawLink {
					source: TopologyNode::new(&pod_on_node, &pod.name, NodeKind::Service, LinkType::Supporting)
						.with_state(""),
					target: host_node(node),
				});
				hosts_pods = true;
			}
		}

		if !hosts_pods {
			plan.isolated.push(host_node(node));
		}
	}

	plan
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::topology::model::ContainerState;

	fn node(id: &str) -> PhysicalNode {
		PhysicalNode {
			id: id.into(),
			name: format!("{id}-name"),
			status: "ready".into(),
		}
	}

	fn pod(id: &str, node_name: &str) -> Pod {
		Pod {
			id: id.into(),
			name: format!("{id}-name"),
			phase: Some("Running".into()),
			node_name: Some(node_name.into()),
			namespace: Some("default".into()),
		}
	}

	fn container(id: &str, pod_id: &str, node_id: &str) -> Container {
		Container {
			id: id.into(),
			name: format!("{id}-name"),
			image: "nginx".into(),
			pod_id: pod_id.into(),
			node_id: Some(node_id.into()),
			state: ContainerState::Running,
		}
	}

	fn ids(link: &RawLink) -> (&str, &str) {
		(link.source.id.as_str(), link.target.id.as_str())
	}

	#[test]
	fn single_container_yields_two_links() {
		let plan = build_links(
			&[node("n1")],
			&[pod("p1", "n1-name")],
			&[container("c1", "p1", "n1")],
		);

		assert_eq!(plan.links.len(), 2);
		assert!(plan.isolated.is_empty());
		assert_eq!(ids(&plan.links[0]), ("c1", "p1-n1"));
		assert_eq!(ids(&plan.links[1]), ("p1-n1", "n1"));

		let container_link = &plan.links[0];
		assert_eq!(container_link.source.kind, NodeKind::Container);
		assert_eq!(container_link.source.link_type, LinkType::ServiceInstance);
		assert_eq!(container_link.source.state.as_deref(), Some("running"));
		assert_eq!(container_link.target.kind, NodeKind::Pod);
		assert_eq!(container_link.target.namespace.as_deref(), Some("default"));

		let host_link = &plan.links[1];
		assert_eq!(host_link.source.link_type, LinkType::Supporting);
		assert_eq!(host_link.target.kind, NodeKind::Node);
	}

	#[test]
	fn node_without_pods_is_isolated() {
		let plan = build_links(&[node("n1")], &[], &[]);

		assert!(plan.links.is_empty());
		assert_eq!(plan.isolated.len(), 1);
		assert_eq!(plan.isolated[0].id, "n1");
		assert_eq!(plan.isolated[0].kind, NodeKind::Node);
	}

	#[test]
	fn one_host_link_per_pod_not_per_container() {
		let plan = build_links(
			&[node("n1")],
			&[pod("p1", "n1-name"), pod("p2", "n1-name")],
			&[
				container("c1", "p1", "n1"),
				container("c2", "p1", "n1"),
				container("c3", "p2", "n1"),
			],
		);

		let host_links: Vec<_> = plan.links.iter().filter(|l| l.target.id == "n1").collect();
		assert_eq!(host_links.len(), 2);
		assert_eq!(plan.links.len(), 5);
	}

	#[test]
	fn containers_on_other_hosts_do_not_link() {
		let mut unscheduled = container("c2", "p1", "n1");
		unscheduled.node_id = None;

		let plan = build_links(
			&[node("n1"), node("n2")],
			&[pod("p1", "n1-name")],
			&[container("c1", "p1", "n1"), unscheduled],
		);

		assert_eq!(plan.links.len(), 2);
		assert_eq!(plan.isolated.len(), 1);
		assert_eq!(plan.isolated[0].id, "n2");
	}

	#[test]
	fn pod_without_containers_leaves_node_isolated() {
		let plan = build_links(&[node("n1")], &[pod("p1", "n1-name")], &[]);

		assert!(plan.links.is_empty());
		assert_eq!(plan.isolated.len(), 1);
	}
}
