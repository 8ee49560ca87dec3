//! Streaming watch: reads a long-lived response body and turns it into
//! topology events as chunks arrive.

use js_sys::{Reflect, Uint8Array};
use log::{debug, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::ReadableStreamDefaultReader;

use super::{ApiClient, ApiError};
use crate::topology::{TopologyError, TopologyEvent};

/// Incremental decoder for a stream of JSON event objects.
///
/// Objects may be concatenated or newline-delimited, and may be split at any
/// byte across chunks. An incomplete trailing object is buffered until the
/// next chunk completes it.
#[derive(Debug, Default)]
pub struct EventDecoder {
	buffer: Vec<u8>,
}

impl EventDecoder {
	/// An empty decoder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Feeds a chunk and returns every event it completed, in order.
	///
	/// A syntactically broken object yields one error. Decoding resumes at the
	/// next `{` or newline past the point where parsing failed.
	pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<TopologyEvent, TopologyError>> {
		self.buffer.extend_from_slice(chunk);

		let mut decoded = Vec::new();
		let mut consumed = 0;
		loop {
			consumed += self.buffer[consumed..]
				.iter()
				.take_while(|b| b.is_ascii_whitespace())
				.count();
			if consumed >= self.buffer.len() {
				break;
			}

			let rest = &self.buffer[consumed..];
			let mut values = serde_json::Deserializer::from_slice(rest).into_iter::<serde_json::Value>();
			match values.next() {
				None => consumed = self.buffer.len(),
				Some(Ok(value)) => {
					consumed += values.byte_offset();
					decoded.push(TopologyEvent::from_value(value));
				}
				Some(Err(err)) if err.is_eof() => break,
				Some(Err(err)) => {
					let from = error_offset(rest, &err).max(1);
					consumed += match rest[from..].iter().position(|&b| b == b'{' || b == b'\n') {
						Some(i) if rest[from + i] == b'{' => from + i,
						Some(i) => from + i + 1,
						None => rest.len(),
					};
					decoded.push(Err(err.into()));
				}
			}
		}

		self.buffer.drain(..consumed);
		decoded
	}

	/// Bytes held back waiting for the rest of an object.
	pub fn pending(&self) -> usize {
		self.buffer.len()
	}
}

/// Byte offset in `input` of the position a parse error points at.
fn error_offset(input: &[u8], err: &serde_json::Error) -> usize {
	let line_start = match err.line() {
		0 | 1 => 0,
		line => input
			.iter()
			.enumerate()
			.filter(|&(_, &b)| b == b'\n')
			.nth(line - 2)
			.map_or(input.len(), |(i, _)| i + 1),
	};
	(line_start + err.column().saturating_sub(1)).min(input.len())
}

fn js_error(value: JsValue) -> ApiError {
	ApiError::Stream(format!("{value:?}"))
}

/// Opens `GET /api/v1/<resource>?watch` and calls `on_event` for every
/// decoded event until the server closes the stream.
///
/// Undecodable events are logged and skipped; transport failures end the
/// watch with an error.
pub async fn watch(
	client: &ApiClient,
	resource: &str,
	mut on_event: impl FnMut(TopologyEvent),
) -> Result<(), ApiError> {
	let url = client.watch_url(resource);
	let response = client.get(&url).await?;
	let body = response
		.body()
		.ok_or_else(|| ApiError::Stream(format!("{url} returned no body")))?;
	let reader: ReadableStreamDefaultReader = body
		.get_reader()
		.dyn_into()
		.map_err(|obj: js_sys::Object| js_error(obj.into()))?;
	debug!("cluster-graph: watching {url}");

	let mut decoder = EventDecoder::new();
	loop {
		let chunk = JsFuture::from(reader.read()).await.map_err(js_error)?;
		let done = Reflect::get(&chunk, &JsValue::from_str("done"))
			.map_err(js_error)?
			.as_bool()
			.unwrap_or(true);
		if done {
			break;
		}

		let value = Reflect::get(&chunk, &JsValue::from_str("value")).map_err(js_error)?;
		for event in decoder.push(&Uint8Array::new(&value).to_vec()) {
			match event {
				Ok(event) => on_event(event),
				Err(err) => warn!("cluster-graph: skipping {resource} event: {err}"),
			}
		}
	}

	if decoder.pending() > 0 {
		warn!(
			"cluster-graph: {resource} watch closed with {} undecoded bytes",
			decoder.pending()
		);
	}
	Ok(())
}
