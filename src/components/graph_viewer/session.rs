use std::cell::RefCell;
use std::rc::{Rc, Weak};

use leptos::prelude::*;
use log::warn;

use super::layout::LayoutOrchestrator;
use super::overlap::GridOverlapResolver;
use super::physics::ForceGraphEngine;
use super::queue::EventQueue;
use super::socket::{self, Emit, SocketHandle};
use super::state::{Command, NodeDetails, ViewerEvent, ViewerState};
use super::store::GraphStats;
use super::transport::{ConnectionStatus, LinkEvent};
use super::types::ClusterInfo;
use crate::config::ViewerConfig;

/// Reactive mirrors of the state shown outside the canvas.
#[derive(Clone, Copy)]
pub struct UiSignals {
	pub status: RwSignal<ConnectionStatus>,
	pub stats: RwSignal<GraphStats>,
	pub legend: RwSignal<Vec<ClusterInfo>>,
	pub details: RwSignal<Option<NodeDetails>>,
}

impl UiSignals {
	pub fn new() -> Self {
		Self {
			status: RwSignal::new(ConnectionStatus::Disconnected),
			stats: RwSignal::new(GraphStats::default()),
			legend: RwSignal::new(Vec::new()),
			details: RwSignal::new(None),
		}
	}
}

impl Default for UiSignals {
	fn default() -> Self {
		Self::new()
	}
}

/// Owns the viewer state for the lifetime of the page and performs the
/// commands it emits against the browser.
pub struct ViewerSession {
	state: RefCell<ViewerState>,
	queue: EventQueue<ViewerEvent>,
	socket: RefCell<Option<SocketHandle>>,
	ui: UiSignals,
	this: Weak<ViewerSession>,
}

impl ViewerSession {
	pub fn new(config: &ViewerConfig, ui: UiSignals) -> Rc<Self> {
		let orchestrator = LayoutOrchestrator::new(config.layout.clone())
			.with_engine(ForceGraphEngine::new(config.simulation.clone()))
			.with_resolver(GridOverlapResolver);
		let state = ViewerState::new(config, orchestrator);
		Rc::new_cyclic(|this| Self {
			state: RefCell::new(state),
			queue: EventQueue::new(),
			socket: RefCell::new(None),
			ui,
			this: this.clone(),
		})
	}

	pub fn dispatch(&self, event: ViewerEvent) {
		self.queue.push(event);
		self.queue.drain(|event| {
			let commands = self.state.borrow_mut().handle(event);
			for command in commands {
				self.execute(command);
			}
		});
		self.publish();
	}

	/// Direct access for pointer handling and rendering.
	pub fn with_state<R>(&self, f: impl FnOnce(&mut ViewerState) -> R) -> R {
		f(&mut self.state.borrow_mut())
	}

	/// Refreshes the details panel after pointer interaction.
	pub fn publish_details(&self) {
		let details = self.state.borrow().details();
		set_if_changed(self.ui.details, details);
	}

	fn publish(&self) {
		let state = self.state.borrow();
		set_if_changed(self.ui.status, state.status());
		set_if_changed(self.ui.stats, state.stats());
		set_if_changed(self.ui.legend, state.legend());
		drop(state);
		self.publish_details();
	}

	fn emitter(&self) -> Emit {
		let session = self.this.clone();
		Rc::new(move |event: ViewerEvent| {
			if let Some(session) = session.upgrade() {
				session.dispatch(event);
			}
		})
	}

	fn execute(&self, command: Command) {
		match command {
			Command::OpenSocket(url) => match socket::open_socket(&url, self.emitter()) {
				Ok(handle) => *self.socket.borrow_mut() = Some(handle),
				Err(err) => {
					self.socket.borrow_mut().take();
					self.queue
						.push(ViewerEvent::Link(LinkEvent::Errored(err.to_string())));
				}
			},
			Command::ScheduleReconnect(delay) => {
				let emit = self.emitter();
				if let Err(err) = socket::schedule(delay, move || {
					emit(ViewerEvent::Link(LinkEvent::ReconnectDue))
				}) {
					warn!("could not schedule reconnect: {err}");
				}
			}
			Command::FetchSnapshot(url) => {
				let emit = self.emitter();
				wasm_bindgen_futures::spawn_local(async move {
					match socket::fetch_snapshot(&url).await {
						Ok(snapshot) => emit(ViewerEvent::SnapshotFetched(snapshot)),
						Err(err) => emit(ViewerEvent::FetchFailed(err.to_string())),
					}
				});
			}
			Command::TriggerSnapshot(url) => {
				let emit = self.emitter();
				wasm_bindgen_futures::spawn_local(async move {
					match socket::trigger_snapshot(&url).await {
						Ok(()) => emit(ViewerEvent::TriggerAcknowledged),
						Err(err) => emit(ViewerEvent::TriggerFailed(err.to_string())),
					}
				});
			}
		}
	}
}

/// Writes `value` only when it differs, so subscribers are not woken for no-ops.
fn set_if_changed<T>(signal: RwSignal<T>, value: T) -> bool
where
	T: PartialEq + Send + Sync + 'static,
{
	let changed = signal.with_untracked(|current| *current != value);
	if changed {
		signal.set(value);
	}
	changed
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unchanged_values_are_not_written() {
		let stats = RwSignal::new(GraphStats::default());
		assert!(!set_if_changed(stats, GraphStats::default()));

		let grown = GraphStats {
			nodes: 1,
			..GraphStats::default()
		};
		assert!(set_if_changed(stats, grown));
		assert_eq!(stats.get_untracked(), grown);
		assert!(!set_if_changed(stats, grown));
	}
}
