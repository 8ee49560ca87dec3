//! Initial topology snapshot from the nodes and pods endpoints.

use std::collections::HashMap;

use log::info;
use serde::Deserialize;

use super::{ApiClient, ApiError};
use crate::topology::{Container, ContainerState, LinkPlan, PhysicalNode, Pod, build_links};

/// Identity shared by every API object.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ObjectMeta {
	/// Object name.
	pub name: String,
	/// Cluster-unique id.
	pub uid: String,
	/// Namespace, for namespaced objects.
	pub namespace: Option<String>,
}

/// Response of `GET /api/v1/nodes`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NodeList {
	/// One entry per host.
	#[serde(default)]
	pub items: Vec<NodeItem>,
}

/// A host entry.
#[derive(Clone, Debug, Deserialize)]
pub struct NodeItem {
	/// Object identity.
	pub metadata: ObjectMeta,
}

/// Response of `GET /api/v1/pods`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PodList {
	/// One entry per pod.
	#[serde(default)]
	pub items: Vec<PodItem>,
}

/// A pod entry.
#[derive(Clone, Debug, Deserialize)]
pub struct PodItem {
	/// Object identity.
	pub metadata: ObjectMeta,
	/// Desired state; only scheduling is read.
	#[serde(default)]
	pub spec: PodSpec,
	/// Observed state.
	#[serde(default)]
	pub status: PodStatus,
}

/// Pod scheduling.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
	/// Name of the host the pod is scheduled on.
	pub node_name: Option<String>,
}

/// The parts of a pod's status the graph uses.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodStatus {
	/// Pod phase (`Pending`, `Running`, ...).
	pub phase: Option<String>,
	/// One entry per container.
	#[serde(default)]
	pub container_statuses: Vec<ContainerStatus>,
}

/// Reported status of one container.
#[derive(Clone, Debug, Deserialize)]
pub struct ContainerStatus {
	/// Runtime id such as `docker://...`; absent until the container is created.
	#[serde(rename = "containerID")]
	pub container_id: Option<String>,
	/// Container name within the pod.
	pub name: String,
	/// Image reference.
	#[serde(default)]
	pub image: String,
	/// Lifecycle flags.
	#[serde(default)]
	pub state: ContainerStateFlags,
}

/// Each lifecycle flag carries a detail object when set.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ContainerStateFlags {
	/// Set while the container has not started.
	pub waiting: Option<serde_json::Value>,
	/// Set while the container runs.
	pub running: Option<serde_json::Value>,
	/// Set once the container has exited.
	pub terminated: Option<serde_json::Value>,
}

impl ContainerStateFlags {
	/// The first set flag, checked as waiting, running, then terminated.
	pub fn lifecycle(&self) -> ContainerState {
		if self.waiting.is_some() {
			ContainerState::Waiting
		} else if self.running.is_some() {
			ContainerState::Running
		} else if self.terminated.is_some() {
			ContainerState::Terminated
		} else {
			ContainerState::Unknown
		}
	}
}

/// Flattened cluster entities ready for the link builder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
	/// Hosts, all reported ready.
	pub nodes: Vec<PhysicalNode>,
	/// Pods in list order.
	pub pods: Vec<Pod>,
	/// Containers of every pod, in pod order.
	pub containers: Vec<Container>,
}

impl Snapshot {
	/// Flattens API lists. Pods reference hosts by name, so containers are
	/// placed on the host whose name matches their pod's `nodeName`.
	pub fn from_lists(nodes: NodeList, pods: PodList) -> Self {
		let host_ids: HashMap<String, String> = nodes
			.items
			.iter()
			.map(|item| (item.metadata.name.clone(), item.metadata.uid.clone()))
			.collect();

		let mut snapshot = Snapshot {
			nodes: nodes
				.items
				.into_iter()
				.map(|item| PhysicalNode {
					id: item.metadata.uid,
					name: item.metadata.name,
					status: "ready".to_string(),
				})
				.collect(),
			..Snapshot::default()
		};

		for item in pods.items {
			let pod_id = item.metadata.uid;
			let node_id = item.spec.node_name.as_ref().and_then(|name| host_ids.get(name)).cloned();

			for status in item.status.container_statuses {
				snapshot.containers.push(Container {
					id: status
						.container_id
						.unwrap_or_else(|| format!("{}/{}", pod_id, status.name)),
					state: status.state.lifecycle(),
					name: status.name,
					image: status.image,
					pod_id: pod_id.clone(),
					node_id: node_id.clone(),
				});
			}

			snapshot.pods.push(Pod {
				id: pod_id,
				name: item.metadata.name,
				phase: item.status.phase,
				node_name: item.spec.node_name,
				namespace: item.metadata.namespace,
			});
		}

		snapshot
	}

	/// Runs the link builder over the flattened lists.
	pub fn link_plan(&self) -> LinkPlan {
		build_links(&self.nodes, &self.pods, &self.containers)
	}
}

/// Fetches nodes, then pods, and flattens them into a [`Snapshot`].
pub async fn fetch_snapshot(client: &ApiClient) -> Result<Snapshot, ApiError> {
	let nodes: NodeList = client.get(&client.url("nodes")).await?.json().await?;
	let pods: PodList = client.get(&client.url("pods")).await?.json().await?;

	let snapshot = Snapshot::from_lists(nodes, pods);
	info!(
		"cluster-graph: snapshot has {} nodes, {} pods, {} containers",
		snapshot.nodes.len(),
		snapshot.pods.len(),
		snapshot.containers.len()
	);
	Ok(snapshot)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn lists() -> (NodeList, PodList) {
		let nodes = json!({
			"items": [
				{"metadata": {"name": "worker-1", "uid": "n1"}},
				{"metadata": {"name": "worker-2", "uid": "n2"}}
			]
		});
		let pods = json!({
			"items": [{
				"metadata": {"uid": "p1", "name": "web", "namespace": "default"},
				"spec": {"nodeName": "worker-1"},
				"status": {
					"phase": "Running",
					"containerStatuses": [
						{"containerID": "docker://c1", "name": "nginx", "image": "nginx:1", "state": {"running": {"startedAt": "x"}}},
						{"name": "sidecar", "image": "envoy", "state": {"waiting": {"reason": "ContainerCreating"}}},
						{"containerID": "docker://c3", "name": "init", "image": "busybox", "state": {"terminated": {"exitCode": 0}}},
						{"containerID": "docker://c4", "name": "odd", "image": "busybox", "state": {}}
					]
				}
			}, {
				"metadata": {"uid": "p2", "name": "pending"},
				"status": {"phase": "Pending"}
			}]
		});
		(
			serde_json::from_value(nodes).unwrap(),
			serde_json::from_value(pods).unwrap(),
		)
	}

	#[test]
	fn flattens_lists() {
		let (nodes, pods) = lists();
		let snapshot = Snapshot::from_lists(nodes, pods);

		assert_eq!(snapshot.nodes.len(), 2);
		assert_eq!(snapshot.nodes[0].id, "n1");
		assert_eq!(snapshot.pods.len(), 2);
		assert_eq!(snapshot.pods[1].node_name, None);
		assert_eq!(snapshot.containers.len(), 4);
		assert!(snapshot.containers.iter().all(|c| c.node_id.as_deref() == Some("n1")));
	}

	#[test]
	fn maps_container_lifecycle() {
		let (nodes, pods) = lists();
		let snapshot = Snapshot::from_lists(nodes, pods);
		let states: Vec<_> = snapshot.containers.iter().map(|c| c.state).collect();

		assert_eq!(
			states,
			[
				ContainerState::Running,
				ContainerState::Waiting,
				ContainerState::Terminated,
				ContainerState::Unknown
			]
		);
	}

	#[test]
	fn container_without_id_gets_pod_scoped_id() {
		let (nodes, pods) = lists();
		let snapshot = Snapshot::from_lists(nodes, pods);

		assert_eq!(snapshot.containers[1].id, "p1/sidecar");
	}

	#[test]
	fn link_plan_from_snapshot() {
		let (nodes, pods) = lists();
		let plan = Snapshot::from_lists(nodes, pods).link_plan();

		// Four containers on worker-1 plus one pod→host link; worker-2 is empty.
		assert_eq!(plan.links.len(), 5);
		assert_eq!(plan.isolated.len(), 1);
		assert_eq!(plan.isolated[0].id, "n2");
	}
}
