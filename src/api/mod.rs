//! Cluster API access: the REST snapshot and the streaming watch.

mod snapshot;
mod watch;

use gloo_net::http::{Request, Response};
use thiserror::Error;

pub use snapshot::{NodeList, PodList, Snapshot, fetch_snapshot};
pub use watch::{EventDecoder, watch};

/// Failure talking to the cluster API.
#[derive(Debug, Error)]
pub enum ApiError {
	/// The request could not be sent or its body read.
	#[error("request failed: {0}")]
	Http(#[from] gloo_net::Error),

	/// The server answered with a non-2xx status.
	#[error("{url} returned HTTP {status}")]
	Status {
		/// Requested URL.
		url: String,
		/// HTTP status code.
		status: u16,
	},

	/// Reading the watch body failed.
	#[error("watch stream error: {0}")]
	Stream(String),

	/// The body is not the expected JSON.
	#[error("invalid response body: {0}")]
	Json(#[from] serde_json::Error),
}

/// Thin client for the `/api/v1` endpoints rooted at `base`.
#[derive(Clone, Debug, Default)]
pub struct ApiClient {
	base: String,
}

impl ApiClient {
	/// `base` is prepended to every path; empty means same origin.
	pub fn new(base: impl Into<String>) -> Self {
		let base: String = base.into();
		Self {
			base: base.trim_end_matches('/').to_string(),
		}
	}

	/// URL of a collection, e.g. `nodes`.
	pub fn url(&self, resource: &str) -> String {
		format!("{}/api/v1/{}", self.base, resource)
	}

	/// URL of the streaming watch on a collection.
	pub fn watch_url(&self, resource: &str) -> String {
		format!("{}?watch", self.url(resource))
	}

	async fn get(&self, url: &str) -> Result<Response, ApiError> {
		let response = Request::get(url).send().await?;
		if !response.ok() {
			return Err(ApiError::Status {
				url: url.to_string(),
				status: response.status(),
			});
		}
		Ok(response)
	}
}
