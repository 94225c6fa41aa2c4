use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Node as it appears on the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePayload {
	#[serde(deserialize_with = "normalized_id")]
	pub id: String,
	#[serde(default)]
	pub x: Option<f64>,
	#[serde(default)]
	pub y: Option<f64>,
	#[serde(default)]
	pub significance: f64,
	#[serde(default, deserialize_with = "nullable_string")]
	pub color: String,
	#[serde(default, deserialize_with = "nullable_string")]
	pub label: String,
	#[serde(default, deserialize_with = "nullable_string")]
	pub content: String,
	#[serde(default, deserialize_with = "optional_normalized_id")]
	pub cluster_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgePayload {
	#[serde(deserialize_with = "normalized_id")]
	pub source: String,
	#[serde(deserialize_with = "normalized_id")]
	pub target: String,
}

/// Legend metadata for one cluster.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterInfo {
	#[serde(deserialize_with = "normalized_id")]
	pub id: String,
	#[serde(default, deserialize_with = "nullable_string")]
	pub color: String,
	#[serde(default)]
	pub node_count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterPatch {
	#[serde(deserialize_with = "normalized_id")]
	pub id: String,
	pub color: String,
}

/// Body of a `graph_snapshot` message and of the pull endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPayload {
	#[serde(default)]
	pub nodes: Vec<NodePayload>,
	#[serde(default)]
	pub edges: Vec<EdgePayload>,
	#[serde(default)]
	pub clusters: BTreeMap<String, ClusterInfo>,
}

/// A decoded realtime message.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
	Snapshot(SnapshotPayload),
	NodeAdded(NodePayload),
	EdgeAdded(EdgePayload),
	ClusterUpdated(ClusterPatch),
	Refresh,
	Unrecognized(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
	Text(String),
	Integer(i64),
	Float(f64),
}

impl From<RawId> for String {
	fn from(raw: RawId) -> Self {
		match raw {
			RawId::Text(s) => s,
			RawId::Integer(n) => n.to_string(),
			RawId::Float(f) if f.fract() == 0.0 => (f as i64).to_string(),
			RawId::Float(f) => f.to_string(),
		}
	}
}

fn normalized_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	RawId::deserialize(deserializer).map(String::from)
}

fn optional_normalized_id<'de, D: Deserializer<'de>>(
	deserializer: D,
) -> Result<Option<String>, D::Error> {
	Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
