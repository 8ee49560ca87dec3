//! Viewer configuration, embedded in the page as JSON.
//!
//! ```html
//! <script id="viewer-config" type="application/json">
//!   { "api_base": "http://localhost:8001", "watch": ["nodes", "pods"] }
//! </script>
//! ```
//!
//! Every field is optional; omitted fields take their defaults.

use force_graph::SimulationParameters;
use log::{info, warn};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

/// Id of the script element holding the configuration JSON.
pub const CONFIG_ELEMENT_ID: &str = "viewer-config";

/// Physics parameters for the force layout.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
	/// Repulsion between every pair of nodes.
	pub force_charge: f32,
	/// Attraction along each link.
	pub force_spring: f32,
	/// Cap on the force applied to one node per step.
	pub force_max: f32,
	/// Velocity multiplier per step.
	pub node_speed: f32,
	/// Fraction of velocity kept between steps.
	pub damping_factor: f32,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			force_charge: 800.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		}
	}
}

impl LayoutConfig {
	/// The same values in the form the simulation takes.
	pub fn simulation_parameters(&self) -> SimulationParameters {
		SimulationParameters {
			force_charge: self.force_charge,
			force_spring: self.force_spring,
			force_max: self.force_max,
			node_speed: self.node_speed,
			damping_factor: self.damping_factor,
		}
	}
}

/// Top-level viewer configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
	/// Origin of the cluster API; empty means the page's own origin.
	pub api_base: String,
	/// Resources to open watch streams on.
	pub watch: Vec<String>,
	/// Page title and overlay heading.
	pub title: String,
	/// Force layout tuning.
	pub layout: LayoutConfig,
}

impl Default for ViewerConfig {
	fn default() -> Self {
		Self {
			api_base: String::new(),
			watch: vec!["nodes".to_string(), "pods".to_string()],
			title: "Cluster Topology".to_string(),
			layout: LayoutConfig::default(),
		}
	}
}

impl ViewerConfig {
	/// Parses a configuration object; missing fields take defaults.
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(text)
	}

	/// Reads the configuration from the page, falling back to defaults when
	/// the element is absent or its JSON is invalid.
	pub fn load() -> Self {
		let Some(text) = config_text() else {
			return Self::default();
		};

		match Self::from_json(&text) {
			Ok(config) => {
				info!("cluster-graph: loaded config, api_base={:?}", config.api_base);
				config
			}
			Err(e) => {
				warn!("cluster-graph: invalid config, using defaults: {}", e);
				Self::default()
			}
		}
	}
}

fn config_text() -> Option<String> {
	let window: Window = web_sys::window()?;
	let element = window.document()?.get_element_by_id(CONFIG_ELEMENT_ID)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_object_gives_defaults() {
		assert_eq!(ViewerConfig::from_json("{}").unwrap(), ViewerConfig::default());
	}

	#[test]
	fn partial_config_keeps_other_defaults() {
		let config = ViewerConfig::from_json(
			r#"{"api_base": "http://localhost:8001", "layout": {"force_charge": 400.0}}"#,
		)
		.unwrap();

		assert_eq!(config.api_base, "http://localhost:8001");
		assert_eq!(config.watch, ["nodes", "pods"]);
		assert_eq!(config.layout.force_charge, 400.0);
		assert_eq!(config.layout.damping_factor, 0.9);
	}

	#[test]
	fn rejects_wrong_types() {
		assert!(ViewerConfig::from_json(r#"{"watch": "nodes"}"#).is_err());
	}
}
