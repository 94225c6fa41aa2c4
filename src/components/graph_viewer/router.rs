use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;

use super::store::{EdgeInsert, GraphStats, GraphStore};
use super::types::Inbound;
use crate::error::Result;

#[derive(Deserialize)]
struct Envelope {
	#[serde(rename = "type")]
	kind: String,
	#[serde(default)]
	data: Value,
}

/// What the caller has to do after a message was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Routed {
	/// The store was replaced; a layout pass is due.
	Snapshot(GraphStats),
	Patched,
	Unchanged,
	RefreshRequested,
}

/// Decodes a realtime text frame.
pub fn decode(text: &str) -> Result<Inbound> {
	let envelope: Envelope = serde_json::from_str(text)?;
	let inbound = match envelope.kind.as_str() {
		"graph_snapshot" => Inbound::Snapshot(serde_json::from_value(envelope.data)?),
		"node_added" => Inbound::NodeAdded(serde_json::from_value(envelope.data)?),
		"edge_added" => Inbound::EdgeAdded(serde_json::from_value(envelope.data)?),
		"cluster_updated" => Inbound::ClusterUpdated(serde_json::from_value(envelope.data)?),
		"refresh" => Inbound::Refresh,
		_ => Inbound::Unrecognized(envelope.kind),
	};
	Ok(inbound)
}

/// Applies one decoded message to the store.
pub fn route(store: &mut GraphStore, inbound: &Inbound) -> Routed {
	match inbound {
		Inbound::Snapshot(snapshot) => {
			let stats = store.apply_snapshot(snapshot);
			info!(
				"snapshot applied: {} nodes, {} edges, {} clusters",
				stats.nodes, stats.edges, stats.clusters
			);
			Routed::Snapshot(stats)
		}
		Inbound::NodeAdded(node) => {
			store.apply_node_added(node);
			Routed::Patched
		}
		Inbound::EdgeAdded(edge) => match store.apply_edge_added(edge) {
			EdgeInsert::Inserted => Routed::Patched,
			EdgeInsert::Duplicate => {
				debug!("edge {} -> {} already present", edge.source, edge.target);
				Routed::Unchanged
			}
			EdgeInsert::MissingEndpoint => {
				debug!(
					"edge {} -> {} dropped, endpoint not loaded",
					edge.source, edge.target
				);
				Routed::Unchanged
			}
		},
		Inbound::ClusterUpdated(patch) => {
			let recolored = store.apply_cluster_updated(patch);
			debug!("cluster {} recolored {} nodes", patch.id, recolored);
			Routed::Patched
		}
		Inbound::Refresh => Routed::RefreshRequested,
		Inbound::Unrecognized(kind) => {
			info!("ignoring message of type {kind:?}");
			Routed::Unchanged
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ViewerError;

	const SNAPSHOT: &str = r##"{
		"type": "graph_snapshot",
		"data": {
			"nodes": [
				{"id": 1, "significance": 9, "color": "", "label": "a", "content": "alpha", "cluster_id": 0},
				{"id": 2, "significance": 1, "color": "", "label": "b", "content": "beta", "cluster_id": null}
			],
			"edges": [{"source": 1, "target": 2}],
			"clusters": {"0": {"id": 0, "color": "#ff8800", "node_count": 1}}
		}
	}"##;

	#[test]
	fn decodes_each_known_type() {
		assert!(matches!(decode(SNAPSHOT).unwrap(), Inbound::Snapshot(s) if s.nodes.len() == 2));
		assert!(matches!(
			decode(r#"{"type": "node_added", "data": {"id": "x"}}"#).unwrap(),
			Inbound::NodeAdded(n) if n.id == "x"
		));
		assert!(matches!(
			decode(r#"{"type": "edge_added", "data": {"source": "a", "target": "b"}}"#).unwrap(),
			Inbound::EdgeAdded(_)
		));
		assert!(matches!(
			decode(r##"{"type": "cluster_updated", "data": {"id": 3, "color": "#fff"}}"##).unwrap(),
			Inbound::ClusterUpdated(p) if p.id == "3"
		));
		assert_eq!(decode(r#"{"type": "refresh"}"#).unwrap(), Inbound::Refresh);
	}

	#[test]
	fn unknown_type_is_not_an_error() {
		assert_eq!(
			decode(r#"{"type": "heartbeat", "data": 5}"#).unwrap(),
			Inbound::Unrecognized("heartbeat".to_string())
		);
	}

	#[test]
	fn malformed_payloads_fail_to_decode() {
		assert!(matches!(decode("not json"), Err(ViewerError::Decode(_))));
		assert!(matches!(
			decode(r#"{"type": "edge_added", "data": {"source": "a"}}"#),
			Err(ViewerError::Decode(_))
		));
	}

	#[test]
	fn null_cluster_color_is_dropped() {
		let mut store = GraphStore::new();
		route(
			&mut store,
			&decode(r##"{"type": "node_added", "data": {"id": 1, "cluster_id": 2, "color": "#fff"}}"##)
				.unwrap(),
		);

		let recolor = decode(r#"{"type": "cluster_updated", "data": {"id": 2, "color": null}}"#);

		assert!(matches!(recolor, Err(ViewerError::Decode(_))));
		assert_eq!(store.node("1").unwrap().color, "#fff");
	}

	#[test]
	fn snapshot_routes_to_layout() {
		let mut store = GraphStore::new();
		let routed = route(&mut store, &decode(SNAPSHOT).unwrap());
		assert_eq!(
			routed,
			Routed::Snapshot(GraphStats {
				nodes: 2,
				edges: 1,
				clusters: 1
			})
		);
		assert_eq!(store.node("1").unwrap().color, "#ff8800");
	}

	#[test]
	fn dangling_edge_leaves_counts_unchanged() {
		let mut store = GraphStore::new();
		route(&mut store, &decode(SNAPSHOT).unwrap());
		let before = store.stats();

		let routed = route(
			&mut store,
			&decode(r#"{"type": "edge_added", "data": {"source": "99", "target": "1"}}"#).unwrap(),
		);

		assert_eq!(routed, Routed::Unchanged);
		assert_eq!(store.stats(), before);
	}

	#[test]
	fn refresh_and_unknown_do_not_touch_store() {
		let mut store = GraphStore::new();
		route(&mut store, &decode(SNAPSHOT).unwrap());
		let before = store.clone();
		assert_eq!(route(&mut store, &Inbound::Refresh), Routed::RefreshRequested);
		assert_eq!(
			route(&mut store, &Inbound::Unrecognized("ping".into())),
			Routed::Unchanged
		);
		assert_eq!(store, before);
	}
}
