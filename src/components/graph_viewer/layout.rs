//! Multi-phase layout pipeline.
//!
//! Phases run in order and each one seeds the next:
//! cluster grouping, deterministic circular placement, force-directed
//! refinement and residual overlap removal. The last two are capabilities
//! injected by the caller and are skipped when absent.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::f64::consts::TAU;
use std::rc::Rc;

use log::debug;

use super::store::GraphStore;
use crate::config::LayoutParams;

/// Force-directed refinement seeded from the current positions.
pub trait LayoutEngine {
	fn refine(&mut self, graph: &mut GraphStore, params: &LayoutParams);
}

/// Pushes intersecting node footprints apart.
pub trait OverlapResolver {
	fn resolve(&mut self, graph: &mut GraphStore, params: &LayoutParams);
}

/// Members sharing a cluster id; `key == None` is the unclustered group.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterGroup {
	pub key: Option<String>,
	pub members: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LayoutOutcome {
	Completed {
		groups: usize,
		refined: bool,
		resolved: bool,
	},
	/// Another pass was already in flight.
	Skipped,
}

/// Marks a pass as in flight until dropped.
pub struct LayoutTicket {
	flag: Rc<Cell<bool>>,
}

impl Drop for LayoutTicket {
	fn drop(&mut self) {
		self.flag.set(false);
	}
}

pub struct LayoutOrchestrator {
	params: LayoutParams,
	engine: Option<Box<dyn LayoutEngine>>,
	resolver: Option<Box<dyn OverlapResolver>>,
	in_flight: Rc<Cell<bool>>,
}

impl LayoutOrchestrator {
	pub fn new(params: LayoutParams) -> Self {
		Self {
			params,
			engine: None,
			resolver: None,
			in_flight: Rc::new(Cell::new(false)),
		}
	}

	pub fn with_engine(mut self, engine: impl LayoutEngine + 'static) -> Self {
		self.engine = Some(Box::new(engine));
		self
	}

	pub fn with_resolver(mut self, resolver: impl OverlapResolver + 'static) -> Self {
		self.resolver = Some(Box::new(resolver));
		self
	}

	#[cfg(test)]
	pub fn is_running(&self) -> bool {
		self.in_flight.get()
	}

	/// Claims the in-flight flag, or `None` when a pass is already running.
	pub fn try_begin(&self) -> Option<LayoutTicket> {
		if self.in_flight.replace(true) {
			return None;
		}
		Some(LayoutTicket {
			flag: Rc::clone(&self.in_flight),
		})
	}

	pub fn run(&mut self, graph: &mut GraphStore) -> LayoutOutcome {
		let Some(_ticket) = self.try_begin() else {
			debug!("layout already running, request dropped");
			return LayoutOutcome::Skipped;
		};

		let groups = group_by_cluster(graph);
		place_circular(graph, &groups, &self.params);

		let refined = match self.engine.as_mut() {
			Some(engine) => {
				engine.refine(graph, &self.params);
				true
			}
			None => {
				debug!("no layout engine, refinement skipped");
				false
			}
		};

		let resolved = match self.resolver.as_mut() {
			Some(resolver) => {
				resolver.resolve(graph, &self.params);
				true
			}
			None => {
				debug!("no overlap resolver, overlap removal skipped");
				false
			}
		};

		debug!(
			"layout finished: {} groups, {} nodes",
			groups.len(),
			graph.stats().nodes
		);
		LayoutOutcome::Completed {
			groups: groups.len(),
			refined,
			resolved,
		}
	}
}

/// Clustered groups sorted by id, then the unclustered group if any.
pub fn group_by_cluster(graph: &GraphStore) -> Vec<ClusterGroup> {
	let mut clustered: BTreeMap<&str, Vec<String>> = BTreeMap::new();
	let mut loose = Vec::new();
	for node in graph.nodes() {
		match node.cluster.as_deref() {
			Some(key) => clustered.entry(key).or_default().push(node.id.clone()),
			None => loose.push(node.id.clone()),
		}
	}

	let mut groups: Vec<ClusterGroup> = clustered
		.into_iter()
		.map(|(key, members)| ClusterGroup {
			key: Some(key.to_string()),
			members,
		})
		.collect();
	if !loose.is_empty() {
		groups.push(ClusterGroup {
			key: None,
			members: loose,
		});
	}
	groups
}

/// Radius of the circle a group's members sit on.
pub fn inner_radius(count: usize, cap: f64, params: &LayoutParams) -> f64 {
	if count <= 1 {
		return 0.0;
	}
	let cap = cap.max(params.inner_radius_min);
	(count as f64 * params.member_spacing / TAU).clamp(params.inner_radius_min, cap)
}

/// Deterministic seed positions for every grouped node.
pub fn circular_positions(
	groups: &[ClusterGroup],
	params: &LayoutParams,
) -> HashMap<String, (f64, f64)> {
	let ring = groups.iter().filter(|g| g.key.is_some()).count();
	let mut positions = HashMap::new();
	let mut slot = 0;

	for group in groups {
		let (center, cap) = match group.key {
			Some(_) => {
				let angle = slot as f64 / ring as f64 * TAU;
				slot += 1;
				(
					(params.ring_radius * angle.cos(), params.ring_radius * angle.sin()),
					params.inner_radius_cap,
				)
			}
			None => ((0.0, 0.0), params.unclustered_radius_cap),
		};

		let count = group.members.len();
		let radius = inner_radius(count, cap, params);
		for (i, id) in group.members.iter().enumerate() {
			let angle = i as f64 / count as f64 * TAU;
			positions.insert(
				id.clone(),
				(
					center.0 + radius * angle.cos(),
					center.1 + radius * angle.sin(),
				),
			);
		}
	}
	positions
}

fn place_circular(graph: &mut GraphStore, groups: &[ClusterGroup], params: &LayoutParams) {
	let positions = circular_positions(groups, params);
	for node in graph.nodes_mut() {
		if let Some(&(x, y)) = positions.get(&node.id) {
			node.x = x;
			node.y = y;
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;

	use super::*;
	use crate::components::graph_viewer::types::{EdgePayload, NodePayload, SnapshotPayload};

	fn snapshot() -> SnapshotPayload {
		let members = [
			("1", Some("0")),
			("2", Some("0")),
			("3", Some("0")),
			("4", Some("1")),
			("5", Some("1")),
			("6", None),
			("7", None),
		];
		SnapshotPayload {
			nodes: members
				.iter()
				.map(|(id, cluster)| NodePayload {
					id: id.to_string(),
					cluster_id: cluster.map(str::to_string),
					..NodePayload::default()
				})
				.collect(),
			edges: vec![EdgePayload {
				source: "1".into(),
				target: "4".into(),
			}],
			..SnapshotPayload::default()
		}
	}

	fn store() -> GraphStore {
		let mut store = GraphStore::new();
		store.apply_snapshot(&snapshot());
		store
	}

	struct Recording(Rc<RefCell<Vec<&'static str>>>);

	impl LayoutEngine for Recording {
		fn refine(&mut self, _: &mut GraphStore, _: &LayoutParams) {
			self.0.borrow_mut().push("refine");
		}
	}

	impl OverlapResolver for Recording {
		fn resolve(&mut self, _: &mut GraphStore, _: &LayoutParams) {
			self.0.borrow_mut().push("resolve");
		}
	}

	#[test]
	fn groups_clusters_and_unclustered() {
		let groups = group_by_cluster(&store());
		assert_eq!(groups.len(), 3);
		assert_eq!(groups[0].key.as_deref(), Some("0"));
		assert_eq!(groups[0].members.len(), 3);
		assert_eq!(groups[1].key.as_deref(), Some("1"));
		assert_eq!(groups[1].members.len(), 2);
		assert_eq!(groups[2].key, None);
		assert_eq!(groups[2].members, ["6", "7"]);
		assert_eq!(store().stats().nodes, 7);
	}

	#[test]
	fn circular_placement_is_reproducible() {
		let params = LayoutParams::default();
		let groups = group_by_cluster(&store());
		assert_eq!(
			circular_positions(&groups, &params),
			circular_positions(&groups, &params)
		);
	}

	#[test]
	fn cluster_centers_sit_on_the_ring() {
		let params = LayoutParams::default();
		let groups = vec![
			ClusterGroup {
				key: Some("a".into()),
				members: vec!["solo".into()],
			},
			ClusterGroup {
				key: Some("b".into()),
				members: vec!["other".into()],
			},
			ClusterGroup {
				key: None,
				members: vec!["loose".into()],
			},
		];
		let positions = circular_positions(&groups, &params);

		let (ax, ay) = positions["solo"];
		assert!((ax - params.ring_radius).abs() < 1e-9 && ay.abs() < 1e-9);
		let (bx, by) = positions["other"];
		assert!((bx + params.ring_radius).abs() < 1e-9 && by.abs() < 1e-6);
		assert_eq!(positions["loose"], (0.0, 0.0));
	}

	#[test]
	fn inner_radius_grows_with_cluster_size_up_to_cap() {
		let params = LayoutParams::default();
		let small = inner_radius(3, params.inner_radius_cap, &params);
		let medium = inner_radius(30, params.inner_radius_cap, &params);
		let huge = inner_radius(10_000, params.inner_radius_cap, &params);
		assert_eq!(small, params.inner_radius_min);
		assert!(medium > small);
		assert_eq!(huge, params.inner_radius_cap);
		assert_eq!(inner_radius(1, params.inner_radius_cap, &params), 0.0);
	}

	#[test]
	fn members_do_not_coincide() {
		let mut graph = store();
		LayoutOrchestrator::new(LayoutParams::default()).run(&mut graph);
		let points: Vec<_> = graph.nodes().map(|n| (n.x, n.y)).collect();
		for (i, a) in points.iter().enumerate() {
			for b in &points[i + 1..] {
				assert!((a.0 - b.0).hypot(a.1 - b.1) > 1.0);
			}
		}
	}

	#[test]
	fn phases_run_in_order() {
		let log = Rc::new(RefCell::new(Vec::new()));
		let mut orchestrator = LayoutOrchestrator::new(LayoutParams::default())
			.with_engine(Recording(Rc::clone(&log)))
			.with_resolver(Recording(Rc::clone(&log)));

		let outcome = orchestrator.run(&mut store());

		assert_eq!(
			outcome,
			LayoutOutcome::Completed {
				groups: 3,
				refined: true,
				resolved: true
			}
		);
		assert_eq!(*log.borrow(), ["refine", "resolve"]);
		assert!(!orchestrator.is_running());
	}

	#[test]
	fn missing_capabilities_are_skipped() {
		let mut orchestrator = LayoutOrchestrator::new(LayoutParams::default());
		assert_eq!(
			orchestrator.run(&mut store()),
			LayoutOutcome::Completed {
				groups: 3,
				refined: false,
				resolved: false
			}
		);
	}

	#[test]
	fn request_while_in_flight_is_dropped() {
		let log = Rc::new(RefCell::new(Vec::new()));
		let mut orchestrator = LayoutOrchestrator::new(LayoutParams::default())
			.with_engine(Recording(Rc::clone(&log)));
		let mut graph = store();
		let before = graph.clone();

		let ticket = orchestrator.try_begin().unwrap();
		assert_eq!(orchestrator.run(&mut graph), LayoutOutcome::Skipped);
		assert_eq!(graph, before);
		assert!(log.borrow().is_empty());

		drop(ticket);
		assert!(matches!(
			orchestrator.run(&mut graph),
			LayoutOutcome::Completed { .. }
		));
		assert_eq!(log.borrow().len(), 1);
	}
}
