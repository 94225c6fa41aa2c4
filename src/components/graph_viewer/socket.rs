//! Browser side of the transport: WebSocket, reconnect timer and the HTTP
//! fallback, all reporting back through an event callback.

use std::rc::Rc;
use std::time::Duration;

use log::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
	CloseEvent, Event, MessageEvent, Request, RequestInit, RequestMode, Response, WebSocket,
};

use super::state::ViewerEvent;
use super::transport::LinkEvent;
use super::types::SnapshotPayload;
use crate::error::{Result, ViewerError};

pub type Emit = Rc<dyn Fn(ViewerEvent)>;

/// An open socket and the closures wired into it.
pub struct SocketHandle {
	ws: WebSocket,
	_on_open: Closure<dyn FnMut(Event)>,
	_on_message: Closure<dyn FnMut(MessageEvent)>,
	_on_close: Closure<dyn FnMut(CloseEvent)>,
	_on_error: Closure<dyn FnMut(Event)>,
}

impl Drop for SocketHandle {
	fn drop(&mut self) {
		self.ws.set_onopen(None);
		self.ws.set_onmessage(None);
		self.ws.set_onclose(None);
		self.ws.set_onerror(None);
		let _ = self.ws.close();
	}
}

pub fn open_socket(url: &str, emit: Emit) -> Result<SocketHandle> {
	let ws = WebSocket::new(url).map_err(ViewerError::socket)?;

	let on_open = {
		let emit = Rc::clone(&emit);
		Closure::<dyn FnMut(Event)>::new(move |_: Event| {
			emit(ViewerEvent::Link(LinkEvent::Opened))
		})
	};
	let on_message = {
		let emit = Rc::clone(&emit);
		Closure::<dyn FnMut(MessageEvent)>::new(move |ev: MessageEvent| {
			match ev.data().as_string() {
				Some(text) => emit(ViewerEvent::Frame(text)),
				None => debug!("ignoring non-text frame"),
			}
		})
	};
	let on_close = {
		let emit = Rc::clone(&emit);
		Closure::<dyn FnMut(CloseEvent)>::new(move |ev: CloseEvent| {
			emit(ViewerEvent::Link(LinkEvent::Closed {
				code: ev.code(),
				reason: ev.reason(),
			}))
		})
	};
	let on_error = Closure::<dyn FnMut(Event)>::new(move |ev: Event| {
		emit(ViewerEvent::Link(LinkEvent::Errored(ev.type_())))
	});

	ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
	ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
	ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));
	ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));

	Ok(SocketHandle {
		ws,
		_on_open: on_open,
		_on_message: on_message,
		_on_close: on_close,
		_on_error: on_error,
	})
}

/// Runs `callback` once after `delay`.
pub fn schedule(delay: Duration, callback: impl FnOnce() + 'static) -> Result<i32> {
	let window = web_sys::window().ok_or(ViewerError::Unavailable("window"))?;
	let callback = Closure::once_into_js(callback);
	let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
	window
		.set_timeout_with_callback_and_timeout_and_arguments_0(
			callback.unchecked_ref::<js_sys::Function>(),
			millis,
		)
		.map_err(ViewerError::socket)
}

async fn send(url: &str, method: &str) -> Result<Response> {
	let opts = RequestInit::new();
	opts.set_method(method);
	opts.set_mode(RequestMode::Cors);

	let request = Request::new_with_str_and_init(url, &opts).map_err(ViewerError::fetch)?;
	let window = web_sys::window().ok_or(ViewerError::Unavailable("window"))?;
	let value = JsFuture::from(window.fetch_with_request(&request))
		.await
		.map_err(ViewerError::fetch)?;
	let resp: Response = value
		.dyn_into()
		.map_err(|_| ViewerError::Fetch("response is not a Response".to_string()))?;

	if !resp.ok() {
		return Err(ViewerError::Http {
			status: resp.status(),
			url: url.to_string(),
		});
	}
	Ok(resp)
}

/// Pull fallback: `GET` a full snapshot.
pub async fn fetch_snapshot(url: &str) -> Result<SnapshotPayload> {
	let resp = send(url, "GET").await?;
	let body = JsFuture::from(resp.text().map_err(ViewerError::fetch)?)
		.await
		.map_err(ViewerError::fetch)?;
	let text = body
		.as_string()
		.ok_or_else(|| ViewerError::Fetch("body is not text".to_string()))?;
	Ok(serde_json::from_str(&text)?)
}

/// Asks the server to broadcast a fresh snapshot over the channel.
pub async fn trigger_snapshot(url: &str) -> Result<()> {
	send(url, "POST").await.map(|_| ())
}
