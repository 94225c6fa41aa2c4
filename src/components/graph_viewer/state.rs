use std::collections::BTreeSet;
use std::time::Duration;

use log::{debug, info, warn};

use super::layout::{LayoutOrchestrator, LayoutOutcome};
use super::router::{self, Routed};
use super::store::{GraphNode, GraphStats, GraphStore};
use super::transport::{ConnectionStatus, LinkAction, LinkEvent, TransportAdapter};
use super::types::{ClusterInfo, Inbound, SnapshotPayload};
use crate::config::ViewerConfig;

pub const MIN_ZOOM: f64 = 0.05;
pub const MAX_ZOOM: f64 = 10.0;
/// Minimum pick radius in world units, so small nodes stay clickable.
pub const HIT_RADIUS: f64 = 8.0;

#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node: Option<String>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<String>,
	pub neighbors: BTreeSet<String>,
	pub highlight_t: f64,
}

/// Everything the viewer knows, driven one event at a time.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewerEvent {
	Start,
	Link(LinkEvent),
	/// A text frame from the realtime channel.
	Frame(String),
	SnapshotFetched(SnapshotPayload),
	FetchFailed(String),
	TriggerAcknowledged,
	TriggerFailed(String),
	RelayoutRequested,
	FitViewRequested,
	ReloadRequested,
	SnapshotRequested,
}

/// Side effects the browser session performs on behalf of the state.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
	OpenSocket(String),
	ScheduleReconnect(Duration),
	FetchSnapshot(String),
	TriggerSnapshot(String),
}

impl From<LinkAction> for Command {
	fn from(action: LinkAction) -> Self {
		match action {
			LinkAction::Open(url) => Command::OpenSocket(url),
			LinkAction::ScheduleReconnect(delay) => Command::ScheduleReconnect(delay),
		}
	}
}

/// Read model for the details panel.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDetails {
	pub id: String,
	pub label: String,
	pub cluster: Option<String>,
	pub significance: f64,
	pub content: String,
	pub color: String,
	pub degree: usize,
}

pub struct ViewerState {
	pub store: GraphStore,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub selected: Option<String>,
	pub width: f64,
	pub height: f64,
	orchestrator: LayoutOrchestrator,
	transport: TransportAdapter,
	snapshot_url: String,
	trigger_url: String,
	fit_padding: f64,
}

impl ViewerState {
	pub fn new(config: &ViewerConfig, orchestrator: LayoutOrchestrator) -> Self {
		Self {
			store: GraphStore::new(),
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			selected: None,
			width: 800.0,
			height: 600.0,
			orchestrator,
			transport: TransportAdapter::new(config.socket_url.clone(), config.reconnect_delay),
			snapshot_url: config.snapshot_url.clone(),
			trigger_url: config.trigger_url.clone(),
			fit_padding: config.layout.fit_padding,
		}
	}

	pub fn status(&self) -> ConnectionStatus {
		self.transport.status()
	}

	pub fn stats(&self) -> GraphStats {
		self.store.stats()
	}

	pub fn legend(&self) -> Vec<ClusterInfo> {
		self.store.clusters().cloned().collect()
	}

	pub fn handle(&mut self, event: ViewerEvent) -> Vec<Command> {
		match event {
			ViewerEvent::Start => self.link(LinkEvent::ConnectRequested),
			ViewerEvent::Link(link) => self.link(link),
			ViewerEvent::Frame(text) => match router::decode(&text) {
				Ok(inbound) => self.apply(inbound),
				Err(err) => {
					warn!("dropping message: {err}");
					Vec::new()
				}
			},
			ViewerEvent::SnapshotFetched(snapshot) => self.apply(Inbound::Snapshot(snapshot)),
			ViewerEvent::FetchFailed(err) => {
				warn!("snapshot fetch failed: {err}");
				Vec::new()
			}
			ViewerEvent::TriggerAcknowledged => {
				info!("snapshot broadcast requested");
				Vec::new()
			}
			ViewerEvent::TriggerFailed(err) => {
				warn!("snapshot trigger failed: {err}");
				Vec::new()
			}
			ViewerEvent::RelayoutRequested => {
				self.relayout();
				Vec::new()
			}
			ViewerEvent::FitViewRequested => {
				self.fit_view();
				Vec::new()
			}
			ViewerEvent::ReloadRequested => vec![Command::FetchSnapshot(self.snapshot_url.clone())],
			ViewerEvent::SnapshotRequested => {
				vec![Command::TriggerSnapshot(self.trigger_url.clone())]
			}
		}
	}

	fn link(&mut self, event: LinkEvent) -> Vec<Command> {
		self.transport.handle(event).map(Command::from).into_iter().collect()
	}

	fn apply(&mut self, inbound: Inbound) -> Vec<Command> {
		match router::route(&mut self.store, &inbound) {
			Routed::Snapshot(_) => {
				self.forget_missing();
				self.relayout();
				Vec::new()
			}
			Routed::RefreshRequested => vec![Command::FetchSnapshot(self.snapshot_url.clone())],
			Routed::Patched | Routed::Unchanged => Vec::new(),
		}
	}

	/// Runs the layout pipeline and fits the view when it completed.
	pub fn relayout(&mut self) -> LayoutOutcome {
		let outcome = self.orchestrator.run(&mut self.store);
		match &outcome {
			LayoutOutcome::Completed { .. } => self.fit_view(),
			LayoutOutcome::Skipped => debug!("re-layout ignored, pass in flight"),
		}
		outcome
	}

	fn forget_missing(&mut self) {
		if let Some(id) = &self.selected
			&& self.store.node(id).is_none()
		{
			self.selected = None;
		}
		if let Some(id) = self.hover.node.clone() {
			if self.store.node(&id).is_none() {
				self.set_hover(None);
			} else {
				self.hover.neighbors = self.store.neighbors(&id);
			}
		}
		self.drag = DragState::default();
	}

	/// Scales and centers the view on the node bounds.
	pub fn fit_view(&mut self) {
		let Some(bounds) = self.store.bounds() else {
			self.transform = ViewTransform {
				x: self.width / 2.0,
				y: self.height / 2.0,
				k: 1.0,
			};
			return;
		};
		let pad = self.fit_padding * 2.0;
		let kx = self.width / (bounds.width() + pad).max(1.0);
		let ky = self.height / (bounds.height() + pad).max(1.0);
		let k = kx.min(ky).clamp(MIN_ZOOM, MAX_ZOOM);
		let (cx, cy) = bounds.center();
		self.transform = ViewTransform {
			x: self.width / 2.0 - cx * k,
			y: self.height / 2.0 - cy * k,
			k,
		};
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	#[cfg(test)]
	pub fn graph_to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		(
			gx * self.transform.k + self.transform.x,
			gy * self.transform.k + self.transform.y,
		)
	}

	/// Closest node whose pick radius covers the screen point.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<String> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.store
			.nodes()
			.filter_map(|node| {
				let distance = (node.x - gx).hypot(node.y - gy);
				(distance < node.radius().max(HIT_RADIUS)).then_some((distance, node))
			})
			.min_by(|a, b| a.0.total_cmp(&b.0))
			.map(|(_, node)| node.id.clone())
	}

	pub fn set_hover(&mut self, node: Option<String>) {
		if self.hover.node == node {
			return;
		}
		self.hover.neighbors = match &node {
			Some(id) => self.store.neighbors(id),
			None => BTreeSet::new(),
		};
		self.hover.node = node;
	}

	pub fn select(&mut self, node: Option<String>) {
		self.selected = node.filter(|id| self.store.node(id).is_some());
	}

	/// Selects `id` and pans so it sits in the middle of the canvas.
	pub fn focus(&mut self, id: &str) -> bool {
		let Some(node) = self.store.node(id) else {
			return false;
		};
		let (x, y) = (node.x, node.y);
		self.selected = Some(id.to_string());
		self.transform.x = self.width / 2.0 - x * self.transform.k;
		self.transform.y = self.height / 2.0 - y * self.transform.k;
		true
	}

	pub fn is_highlighted(&self, id: &str) -> bool {
		self.hover.node.as_deref() == Some(id)
			|| self.hover.neighbors.contains(id)
			|| self.selected.as_deref() == Some(id)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.selected.is_some()
	}

	/// Details for the selected node, else the hovered one.
	pub fn details(&self) -> Option<NodeDetails> {
		let id = self.selected.as_ref().or(self.hover.node.as_ref())?;
		let node = self.store.node(id)?;
		let degree = if self.hover.node.as_ref() == Some(id) {
			self.hover.neighbors.len()
		} else {
			self.store.neighbors(id).len()
		};
		Some(describe(node, degree))
	}

	/// Advances the hover highlight fade.
	pub fn tick(&mut self, dt: f64) {
		let target = if self.has_active_highlight() { 1.0 } else { 0.0 };
		let speed = if target > 0.0 { 6.0 } else { 4.0 };
		self.hover.highlight_t += (target - self.hover.highlight_t) * (speed * dt).min(1.0);
		if target == 0.0 && self.hover.highlight_t < 0.01 {
			self.hover.highlight_t = 0.0;
		}
	}

	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

fn describe(node: &GraphNode, degree: usize) -> NodeDetails {
	NodeDetails {
		id: node.id.clone(),
		label: node.label.clone(),
		cluster: node.cluster.clone(),
		significance: node.significance,
		content: node.content.clone(),
		color: node.color.clone(),
		degree,
	}
}
