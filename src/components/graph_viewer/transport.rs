use std::time::Duration;

use log::{info, warn};

/// Connection state shown by the status indicator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
	#[default]
	Disconnected,
	Connecting,
	Connected,
}

impl ConnectionStatus {
	pub fn label(self) -> &'static str {
		match self {
			ConnectionStatus::Disconnected => "Disconnected",
			ConnectionStatus::Connecting => "Connecting…",
			ConnectionStatus::Connected => "Connected",
		}
	}
}

/// Lifecycle signals raised by the socket driver and the reconnect timer.
#[derive(Clone, Debug, PartialEq)]
pub enum LinkEvent {
	ConnectRequested,
	Opened,
	Closed { code: u16, reason: String },
	Errored(String),
	ReconnectDue,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LinkAction {
	Open(String),
	ScheduleReconnect(Duration),
}

/// Reconnecting connection state machine.
///
/// `Disconnected -> Connecting -> Connected -> Disconnected`, with a fixed delay
/// before every new attempt and no limit on attempts.
#[derive(Debug)]
pub struct TransportAdapter {
	url: String,
	delay: Duration,
	status: ConnectionStatus,
	reconnect_pending: bool,
	attempts: u64,
}

impl TransportAdapter {
	pub fn new(url: impl Into<String>, delay: Duration) -> Self {
		Self {
			url: url.into(),
			delay,
			status: ConnectionStatus::Disconnected,
			reconnect_pending: false,
			attempts: 0,
		}
	}

	pub fn status(&self) -> ConnectionStatus {
		self.status
	}

	/// Connection attempts made so far, including the first.
	pub fn attempts(&self) -> u64 {
		self.attempts
	}

	pub fn handle(&mut self, event: LinkEvent) -> Option<LinkAction> {
		match event {
			LinkEvent::ConnectRequested | LinkEvent::ReconnectDue => {
				if self.status != ConnectionStatus::Disconnected {
					return None;
				}
				self.reconnect_pending = false;
				self.status = ConnectionStatus::Connecting;
				self.attempts += 1;
				info!("connecting to {} (attempt {})", self.url, self.attempts);
				Some(LinkAction::Open(self.url.clone()))
			}
			LinkEvent::Opened => {
				self.status = ConnectionStatus::Connected;
				info!("connected to {}", self.url);
				None
			}
			LinkEvent::Closed { code, reason } => {
				info!("connection closed ({code}) {reason}");
				self.drop_link()
			}
			LinkEvent::Errored(detail) => {
				warn!("connection error: {detail}");
				self.drop_link()
			}
		}
	}

	fn drop_link(&mut self) -> Option<LinkAction> {
		self.status = ConnectionStatus::Disconnected;
		// close and error often fire together for one failure
		if self.reconnect_pending {
			return None;
		}
		self.reconnect_pending = true;
		info!("reconnecting in {:?}", self.delay);
		Some(LinkAction::ScheduleReconnect(self.delay))
	}
}
