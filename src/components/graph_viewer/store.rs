use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::TAU;
use std::hash::{Hash, Hasher};

use super::types::{ClusterInfo, ClusterPatch, EdgePayload, NodePayload, SnapshotPayload};

pub const DEFAULT_NODE_COLOR: &str = "#808080";
pub const EDGE_COLOR: &str = "#555555";
pub const MAX_SIGNIFICANCE: f64 = 9.0;
pub const NODE_SIZE_MIN: f64 = 10.0;
pub const NODE_SIZE_MAX: f64 = 55.0;

/// Spread of the placeholder position given to nodes that arrive without one.
const JITTER_SPREAD: f64 = 160.0;

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: String,
	pub x: f64,
	pub y: f64,
	pub size: f64,
	pub significance: f64,
	pub color: String,
	pub label: String,
	pub content: String,
	pub cluster: Option<String>,
}

impl GraphNode {
	/// Radius of the node's footprint in world units.
	pub fn radius(&self) -> f64 {
		self.size * 0.5
	}
}

/// Edge identity: the ordered endpoint pair.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
	pub source: String,
	pub target: String,
}

impl EdgeKey {
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
	pub key: EdgeKey,
	pub color: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphStats {
	pub nodes: usize,
	pub edges: usize,
	pub clusters: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeInsert {
	Inserted,
	Duplicate,
	MissingEndpoint,
}

/// Axis-aligned extent of the node footprints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	pub min_x: f64,
	pub min_y: f64,
	pub max_x: f64,
	pub max_y: f64,
}

impl Bounds {
	pub fn width(&self) -> f64 {
		self.max_x - self.min_x
	}

	pub fn height(&self) -> f64 {
		self.max_y - self.min_y
	}

	pub fn center(&self) -> (f64, f64) {
		(
			(self.min_x + self.max_x) * 0.5,
			(self.min_y + self.max_y) * 0.5,
		)
	}
}

/// In-memory graph mirrored from the server.
///
/// Snapshots replace everything; the incremental mutations only add or recolor.
/// Maps are ordered by id so iteration (and therefore layout) is reproducible.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphStore {
	nodes: BTreeMap<String, GraphNode>,
	edges: BTreeMap<EdgeKey, GraphEdge>,
	clusters: BTreeMap<String, ClusterInfo>,
}

impl GraphStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn clear(&mut self) {
		self.nodes.clear();
		self.edges.clear();
		self.clusters.clear();
	}

	pub fn apply_snapshot(&mut self, snapshot: &SnapshotPayload) -> GraphStats {
		self.clear();

		let palette = hue_wheel(snapshot.clusters.len());
		for (info, fallback) in snapshot.clusters.values().zip(palette) {
			let mut info = info.clone();
			if info.color.is_empty() {
				info.color = fallback;
			}
			info.node_count = 0;
			self.clusters.insert(info.id.clone(), info);
		}

		for node in &snapshot.nodes {
			self.apply_node_added(node);
		}
		for edge in &snapshot.edges {
			self.apply_edge_added(edge);
		}
		self.stats()
	}

	pub fn apply_node_added(&mut self, payload: &NodePayload) {
		let previous = self.nodes.get(&payload.id);
		let old_cluster = previous.and_then(|n| n.cluster.clone());
		let (x, y) = match (payload.x, payload.y, previous) {
			(Some(x), Some(y), _) => (x, y),
			(_, _, Some(kept)) => (kept.x, kept.y),
			_ => jitter_position(&payload.id),
		};
		let color = self.resolve_color(payload);
		let significance = payload.significance.clamp(0.0, MAX_SIGNIFICANCE);

		self.nodes.insert(
			payload.id.clone(),
			GraphNode {
				id: payload.id.clone(),
				x,
				y,
				size: size_for_significance(significance),
				significance,
				color,
				label: payload.label.clone(),
				content: payload.content.clone(),
				cluster: payload.cluster_id.clone(),
			},
		);

		if old_cluster != payload.cluster_id {
			if let Some(info) = old_cluster.and_then(|c| self.clusters.get_mut(&c)) {
				info.node_count = info.node_count.saturating_sub(1);
			}
			if let Some(info) = payload
				.cluster_id
				.as_ref()
				.and_then(|c| self.clusters.get_mut(c))
			{
				info.node_count += 1;
			}
		}
	}

	pub fn apply_edge_added(&mut self, payload: &EdgePayload) -> EdgeInsert {
		if !self.nodes.contains_key(&payload.source) || !self.nodes.contains_key(&payload.target) {
			return EdgeInsert::MissingEndpoint;
		}
		let key = EdgeKey::new(payload.source.clone(), payload.target.clone());
		if self.edges.contains_key(&key) {
			return EdgeInsert::Duplicate;
		}
		self.edges.insert(
			key.clone(),
			GraphEdge {
				key,
				color: EDGE_COLOR.to_string(),
			},
		);
		EdgeInsert::Inserted
	}

	/// Recolors the members of `patch.id`. Returns how many nodes changed color.
	///
	/// An empty color is ignored: nodes never lose their color.
	pub fn apply_cluster_updated(&mut self, patch: &ClusterPatch) -> usize {
		if patch.color.is_empty() {
			return 0;
		}
		let mut recolored = 0;
		let mut members = 0;
		for node in self.nodes.values_mut() {
			if node.cluster.as_deref() != Some(patch.id.as_str()) {
				continue;
			}
			members += 1;
			if node.color != patch.color {
				node.color = patch.color.clone();
				recolored += 1;
			}
		}

		self.clusters
			.entry(patch.id.clone())
			.and_modify(|info| {
				info.color = patch.color.clone();
				info.node_count = members;
			})
			.or_insert_with(|| ClusterInfo {
				id: patch.id.clone(),
				color: patch.color.clone(),
				node_count: members,
			});
		recolored
	}

	pub fn stats(&self) -> GraphStats {
		GraphStats {
			nodes: self.nodes.len(),
			edges: self.edges.len(),
			clusters: self.clusters.len(),
		}
	}

	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.get(id)
	}

	#[cfg(test)]
	pub fn contains_edge(&self, source: &str, target: &str) -> bool {
		self.edges.contains_key(&EdgeKey::new(source, target))
	}

	pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
		self.nodes.values()
	}

	pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut GraphNode> {
		self.nodes.values_mut()
	}

	pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
		self.edges.values()
	}

	pub fn clusters(&self) -> impl Iterator<Item = &ClusterInfo> {
		self.clusters.values()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Ids adjacent to `id` in either direction.
	pub fn neighbors(&self, id: &str) -> BTreeSet<String> {
		self.edges
			.keys()
			.filter_map(|key| {
				if key.source == id {
					Some(key.target.clone())
				} else if key.target == id {
					Some(key.source.clone())
				} else {
					None
				}
			})
			.collect()
	}

	pub fn set_position(&mut self, id: &str, x: f64, y: f64) -> bool {
		match self.nodes.get_mut(id) {
			Some(node) => {
				node.x = x;
				node.y = y;
				true
			}
			None => false,
		}
	}

	pub fn bounds(&self) -> Option<Bounds> {
		self.nodes.values().fold(None, |acc, node| {
			let r = node.radius();
			let b = Bounds {
				min_x: node.x - r,
				min_y: node.y - r,
				max_x: node.x + r,
				max_y: node.y + r,
			};
			Some(match acc {
				None => b,
				Some(a) => Bounds {
					min_x: a.min_x.min(b.min_x),
					min_y: a.min_y.min(b.min_y),
					max_x: a.max_x.max(b.max_x),
					max_y: a.max_y.max(b.max_y),
				},
			})
		})
	}

	fn resolve_color(&self, payload: &NodePayload) -> String {
		if !payload.color.is_empty() {
			return payload.color.clone();
		}
		payload
			.cluster_id
			.as_ref()
			.and_then(|c| self.clusters.get(c))
			.map(|info| info.color.clone())
			.filter(|c| !c.is_empty())
			.unwrap_or_else(|| DEFAULT_NODE_COLOR.to_string())
	}
}

/// Linear map of significance `[0, 9]` onto `[NODE_SIZE_MIN, NODE_SIZE_MAX]`.
pub fn size_for_significance(significance: f64) -> f64 {
	let s = significance.clamp(0.0, MAX_SIGNIFICANCE);
	NODE_SIZE_MIN + (NODE_SIZE_MAX - NODE_SIZE_MIN) * s / MAX_SIGNIFICANCE
}

fn jitter_position(id: &str) -> (f64, f64) {
	let mut hasher = DefaultHasher::new();
	id.hash(&mut hasher);
	let hash = hasher.finish();

	let x = (hash & 0xffff_ffff) as f64 / u32::MAX as f64;
	let y = ((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64;
	((x * 2.0 - 1.0) * JITTER_SPREAD, (y * 2.0 - 1.0) * JITTER_SPREAD)
}

/// `count` colors evenly spaced around the hue circle.
fn hue_wheel(count: usize) -> Vec<String> {
	(0..count)
		.map(|i| {
			let hue = i as f64 / count.max(1) as f64 * TAU;
			let channel = |offset: f64| ((hue + offset).cos() * 0.5 + 0.5) * 255.0;
			format!(
				"#{:02x}{:02x}{:02x}",
				channel(0.0) as u8,
				channel(-TAU / 3.0) as u8,
				channel(TAU / 3.0) as u8
			)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node(id: &str, cluster: Option<&str>) -> NodePayload {
		NodePayload {
			id: id.to_string(),
			significance: 4.0,
			label: format!("Node {id}"),
			cluster_id: cluster.map(str::to_string),
			..NodePayload::default()
		}
	}

	fn edge(source: &str, target: &str) -> EdgePayload {
		EdgePayload {
			source: source.to_string(),
			target: target.to_string(),
		}
	}

	fn cluster(id: &str, color: &str, node_count: usize) -> (String, ClusterInfo) {
		(
			id.to_string(),
			ClusterInfo {
				id: id.to_string(),
				color: color.to_string(),
				node_count,
			},
		)
	}

	fn sample_snapshot() -> SnapshotPayload {
		SnapshotPayload {
			nodes: vec![
				node("1", Some("0")),
				node("2", Some("0")),
				node("3", Some("0")),
				node("4", Some("1")),
				node("5", Some("1")),
				node("6", None),
				node("7", None),
			],
			edges: vec![edge("1", "2"), edge("2", "3"), edge("4", "6"), edge("1", "42")],
			clusters: [cluster("0", "#ff0000", 3), cluster("1", "#00ff00", 2)]
				.into_iter()
				.collect(),
		}
	}

	#[test]
	fn snapshot_replaces_state() {
		let mut store = GraphStore::new();
		store.apply_node_added(&node("stale", None));

		let stats = store.apply_snapshot(&sample_snapshot());

		assert_eq!(
			stats,
			GraphStats {
				nodes: 7,
				edges: 3,
				clusters: 2
			}
		);
		assert!(store.node("stale").is_none());
	}

	#[test]
	fn applying_same_snapshot_twice_is_idempotent() {
		let snapshot = sample_snapshot();
		let mut first = GraphStore::new();
		first.apply_snapshot(&snapshot);
		let mut second = first.clone();
		second.apply_snapshot(&snapshot);
		assert_eq!(first, second);
	}

	#[test]
	fn edge_with_missing_endpoint_is_dropped_and_not_revived() {
		let mut store = GraphStore::new();
		store.apply_snapshot(&sample_snapshot());
		let before = store.stats();

		assert_eq!(
			store.apply_edge_added(&edge("99", "1")),
			EdgeInsert::MissingEndpoint
		);
		assert_eq!(store.stats(), before);

		store.apply_node_added(&node("99", None));
		assert!(!store.contains_edge("99", "1"));
		assert_eq!(store.stats().edges, before.edges);
	}

	#[test]
	fn same_pair_yields_one_edge() {
		let mut store = GraphStore::new();
		store.apply_node_added(&node("a", None));
		store.apply_node_added(&node("b", None));

		assert_eq!(store.apply_edge_added(&edge("a", "b")), EdgeInsert::Inserted);
		assert_eq!(store.apply_edge_added(&edge("a", "b")), EdgeInsert::Duplicate);
		assert_eq!(store.apply_edge_added(&edge("b", "a")), EdgeInsert::Inserted);
		assert_eq!(store.stats().edges, 2);
	}

	#[test]
	fn cluster_recolor_touches_only_members() {
		let mut store = GraphStore::new();
		store.apply_snapshot(&sample_snapshot());

		let changed = store.apply_cluster_updated(&ClusterPatch {
			id: "0".to_string(),
			color: "#0000ff".to_string(),
		});

		assert_eq!(changed, 3);
		for n in store.nodes() {
			if n.cluster.as_deref() == Some("0") {
				assert_eq!(n.color, "#0000ff");
			} else {
				assert_ne!(n.color, "#0000ff");
			}
		}
		assert_eq!(store.node("1").unwrap().cluster.as_deref(), Some("0"));
		assert_eq!(store.node("4").unwrap().color, "#00ff00");
		let legend: Vec<_> = store.clusters().map(|c| c.color.as_str()).collect();
		assert_eq!(legend, ["#0000ff", "#00ff00"]);
	}

	#[test]
	fn recolor_of_unknown_cluster_adds_legend_entry() {
		let mut store = GraphStore::new();
		store.apply_snapshot(&sample_snapshot());
		store.apply_cluster_updated(&ClusterPatch {
			id: "9".to_string(),
			color: "#123456".to_string(),
		});
		assert_eq!(store.stats().clusters, 3);
		let info = store.clusters().find(|c| c.id == "9").unwrap();
		assert_eq!(info.node_count, 0);
	}

	#[test]
	fn empty_recolor_keeps_member_colors() {
		let mut store = GraphStore::new();
		store.apply_snapshot(&sample_snapshot());
		let before = store.clone();

		let changed = store.apply_cluster_updated(&ClusterPatch {
			id: "0".to_string(),
			color: String::new(),
		});

		assert_eq!(changed, 0);
		assert_eq!(store, before);
	}

	#[test]
	fn legend_counts_follow_membership() {
		let mut store = GraphStore::new();
		let mut snapshot = sample_snapshot();
		snapshot.clusters.get_mut("0").unwrap().node_count = 40;
		store.apply_snapshot(&snapshot);
		let count = |store: &GraphStore, id: &str| {
			store.clusters().find(|c| c.id == id).unwrap().node_count
		};
		assert_eq!(count(&store, "0"), 3);
		assert_eq!(count(&store, "1"), 2);

		store.apply_node_added(&node("8", Some("0")));
		store.apply_node_added(&node("4", Some("0")));
		store.apply_node_added(&node("4", Some("0")));
		assert_eq!(count(&store, "0"), 5);
		assert_eq!(count(&store, "1"), 1);

		store.apply_cluster_updated(&ClusterPatch {
			id: "1".to_string(),
			color: "#010101".to_string(),
		});
		assert_eq!(count(&store, "1"), 1);
	}

	#[test]
	fn color_falls_back_to_cluster_then_grey() {
		let mut store = GraphStore::new();
		store.apply_snapshot(&sample_snapshot());
		assert_eq!(store.node("1").unwrap().color, "#ff0000");
		assert_eq!(store.node("6").unwrap().color, DEFAULT_NODE_COLOR);

		let mut explicit = node("8", Some("0"));
		explicit.color = "#abcdef".to_string();
		store.apply_node_added(&explicit);
		assert_eq!(store.node("8").unwrap().color, "#abcdef");
	}

	#[test]
	fn clusters_without_color_get_distinct_colors() {
		let mut snapshot = sample_snapshot();
		for info in snapshot.clusters.values_mut() {
			info.color.clear();
		}
		let mut store = GraphStore::new();
		store.apply_snapshot(&snapshot);
		let colors: BTreeSet<_> = store.clusters().map(|c| c.color.clone()).collect();
		assert_eq!(colors.len(), 2);
		assert!(colors.iter().all(|c| c.starts_with('#') && c.len() == 7));
	}

	#[test]
	fn size_is_linear_and_clamped() {
		assert_eq!(size_for_significance(0.0), NODE_SIZE_MIN);
		assert_eq!(size_for_significance(9.0), NODE_SIZE_MAX);
		assert_eq!(size_for_significance(3.0), 25.0);
		assert_eq!(size_for_significance(42.0), NODE_SIZE_MAX);
		assert_eq!(size_for_significance(-1.0), NODE_SIZE_MIN);
	}

	#[test]
	fn readding_node_without_position_keeps_it() {
		let mut store = GraphStore::new();
		let mut placed = node("a", None);
		placed.x = Some(12.0);
		placed.y = Some(-3.0);
		store.apply_node_added(&placed);
		store.apply_node_added(&node("a", Some("0")));

		let a = store.node("a").unwrap();
		assert_eq!((a.x, a.y), (12.0, -3.0));
		assert_eq!(a.cluster.as_deref(), Some("0"));
	}

	#[test]
	fn neighbors_cover_both_directions() {
		let mut store = GraphStore::new();
		store.apply_snapshot(&sample_snapshot());
		let n: Vec<_> = store.neighbors("2").into_iter().collect();
		assert_eq!(n, ["1", "3"]);
	}
}
