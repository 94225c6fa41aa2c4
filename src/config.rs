//! Viewer configuration: endpoints, reconnect timing and layout tuning.

use std::time::Duration;

use log::warn;

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

const SOCKET_PATH: &str = "/ws";
const SNAPSHOT_PATH: &str = "/api/graph";
const TRIGGER_PATH: &str = "/api/graph/snapshot";

#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
	/// Realtime channel, `ws://` or `wss://`.
	pub socket_url: String,
	/// Pull fallback returning a snapshot body.
	pub snapshot_url: String,
	/// Asks the server to broadcast a fresh snapshot.
	pub trigger_url: String,
	pub reconnect_delay: Duration,
	pub layout: LayoutParams,
	pub simulation: SimulationTuning,
}

impl Default for ViewerConfig {
	fn default() -> Self {
		Self::for_origin("http", "localhost:8000")
	}
}

impl ViewerConfig {
	/// Builds endpoint URLs for a page served from `scheme://host`.
	pub fn for_origin(scheme: &str, host: &str) -> Self {
		let socket_scheme = if scheme.trim_end_matches(':') == "https" {
			"wss"
		} else {
			"ws"
		};
		let http_scheme = scheme.trim_end_matches(':');
		Self {
			socket_url: format!("{socket_scheme}://{host}{SOCKET_PATH}"),
			snapshot_url: format!("{http_scheme}://{host}{SNAPSHOT_PATH}"),
			trigger_url: format!("{http_scheme}://{host}{TRIGGER_PATH}"),
			reconnect_delay: DEFAULT_RECONNECT_DELAY,
			layout: LayoutParams::default(),
			simulation: SimulationTuning::default(),
		}
	}

	/// Derives endpoints from the current page location.
	pub fn from_window() -> Self {
		let location = web_sys::window().map(|w| w.location());
		let origin = location.and_then(|l| Some((l.protocol().ok()?, l.host().ok()?)));
		match origin {
			Some((scheme, host)) if !host.is_empty() => Self::for_origin(&scheme, &host),
			_ => {
				warn!("page location unavailable, using default endpoints");
				Self::default()
			}
		}
	}
}

/// Geometry and iteration budgets for the layout pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutParams {
	/// Radius of the circle cluster centers sit on.
	pub ring_radius: f64,
	/// Arc length between neighbouring members of one cluster.
	pub member_spacing: f64,
	pub inner_radius_min: f64,
	/// Spread cap for large clusters.
	pub inner_radius_cap: f64,
	pub unclustered_radius_cap: f64,
	pub refine_iterations: usize,
	pub overlap_iterations: usize,
	/// Minimum gap kept between node footprints.
	pub overlap_margin: f64,
	/// Padding around the node bounds when fitting the view.
	pub fit_padding: f64,
}

impl Default for LayoutParams {
	fn default() -> Self {
		Self {
			ring_radius: 1200.0,
			member_spacing: 70.0,
			inner_radius_min: 40.0,
			inner_radius_cap: 420.0,
			unclustered_radius_cap: 240.0,
			refine_iterations: 120,
			overlap_iterations: 60,
			overlap_margin: 4.0,
			fit_padding: 40.0,
		}
	}
}

/// Parameters handed to the force-directed engine.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationTuning {
	pub force_charge: f32,
	pub force_spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping_factor: f32,
	/// Simulated seconds per refinement iteration.
	pub step: f32,
}

impl Default for SimulationTuning {
	fn default() -> Self {
		Self {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
			step: 0.016,
		}
	}
}
