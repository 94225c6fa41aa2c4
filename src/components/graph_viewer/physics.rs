use std::collections::HashMap;

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::layout::LayoutEngine;
use super::store::GraphStore;
use crate::config::{LayoutParams, SimulationTuning};

/// Refinement backed by the `force_graph` simulation.
///
/// A fresh simulation is built for every pass from the store's current
/// positions, stepped a bounded number of times, and copied back.
pub struct ForceGraphEngine {
	tuning: SimulationTuning,
}

impl ForceGraphEngine {
	pub fn new(tuning: SimulationTuning) -> Self {
		Self { tuning }
	}

	fn parameters(&self) -> SimulationParameters {
		SimulationParameters {
			force_charge: self.tuning.force_charge,
			force_spring: self.tuning.force_spring,
			force_max: self.tuning.force_max,
			node_speed: self.tuning.node_speed,
			damping_factor: self.tuning.damping_factor,
		}
	}
}

impl LayoutEngine for ForceGraphEngine {
	fn refine(&mut self, graph: &mut GraphStore, params: &LayoutParams) {
		if graph.is_empty() || params.refine_iterations == 0 {
			return;
		}

		let mut sim: ForceGraph<String, ()> = ForceGraph::new(self.parameters());
		let mut id_to_idx = HashMap::new();
		for node in graph.nodes() {
			let idx = sim.add_node(NodeData {
				x: node.x as f32,
				y: node.y as f32,
				// heavier nodes repel harder, keeping large footprints apart
				mass: node.size as f32,
				is_anchor: false,
				user_data: node.id.clone(),
			});
			id_to_idx.insert(node.id.clone(), idx);
		}
		for edge in graph.edges() {
			if let (Some(&src), Some(&tgt)) = (
				id_to_idx.get(&edge.key.source),
				id_to_idx.get(&edge.key.target),
			) {
				sim.add_edge(src, tgt, EdgeData::default());
			}
		}

		for _ in 0..params.refine_iterations {
			sim.update(self.tuning.step);
		}

		let mut settled = Vec::with_capacity(id_to_idx.len());
		sim.visit_nodes(|node| {
			settled.push((node.data.user_data.clone(), node.x(), node.y()));
		});
		for (id, x, y) in settled {
			if x.is_finite() && y.is_finite() {
				graph.set_position(&id, x as f64, y as f64);
			}
		}
	}
}
