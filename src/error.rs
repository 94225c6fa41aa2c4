//! Error type shared by the transport, router and fetch fallback.

use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T> = std::result::Result<T, ViewerError>;

#[derive(Debug, Error)]
pub enum ViewerError {
	#[error("malformed message: {0}")]
	Decode(#[from] serde_json::Error),

	#[error("socket error: {0}")]
	Socket(String),

	#[error("fetch error: {0}")]
	Fetch(String),

	#[error("HTTP {status} from {url}")]
	Http { status: u16, url: String },

	#[error("browser API unavailable: {0}")]
	Unavailable(&'static str),
}

impl ViewerError {
	/// Wraps a JS exception raised by a socket call.
	pub fn socket(err: JsValue) -> Self {
		ViewerError::Socket(describe(&err))
	}

	/// Wraps a JS exception raised by fetch or its body promises.
	pub fn fetch(err: JsValue) -> Self {
		ViewerError::Fetch(describe(&err))
	}
}

fn describe(err: &JsValue) -> String {
	err.as_string().unwrap_or_else(|| format!("{:?}", err))
}
