use std::collections::HashMap;
use std::f64::consts::TAU;

use super::layout::OverlapResolver;
use super::store::GraphStore;
use crate::config::LayoutParams;

/// Separates intersecting footprints using a uniform grid for pair lookup.
///
/// Iterates until no pair is closer than `radius_a + radius_b + margin` or the
/// iteration budget runs out.
#[derive(Default)]
pub struct GridOverlapResolver;

struct Body {
	x: f64,
	y: f64,
	r: f64,
}

impl OverlapResolver for GridOverlapResolver {
	fn resolve(&mut self, graph: &mut GraphStore, params: &LayoutParams) {
		let ids: Vec<String> = graph.nodes().map(|n| n.id.clone()).collect();
		let mut bodies: Vec<Body> = graph
			.nodes()
			.map(|n| Body {
				x: n.x,
				y: n.y,
				r: n.radius(),
			})
			.collect();
		if bodies.len() < 2 {
			return;
		}

		let margin = params.overlap_margin.max(0.0);
		for _ in 0..params.overlap_iterations {
			if !separate_once(&mut bodies, margin) {
				break;
			}
		}

		for (id, body) in ids.iter().zip(&bodies) {
			graph.set_position(id, body.x, body.y);
		}
	}
}

fn separate_once(bodies: &mut [Body], margin: f64) -> bool {
	let max_r = bodies.iter().map(|b| b.r).fold(0.0_f64, f64::max);
	let cell = (max_r * 2.0 + margin).max(1.0);
	let key = |b: &Body| ((b.x / cell).floor() as i64, (b.y / cell).floor() as i64);

	let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
	let homes: Vec<(i64, i64)> = bodies.iter().map(key).collect();
	for (i, home) in homes.iter().enumerate() {
		grid.entry(*home).or_default().push(i);
	}

	// Pushes are applied as soon as a pair is found; buckets stay as built.
	let mut overlapping = false;
	for (i, &(cx, cy)) in homes.iter().enumerate() {
		for gx in cx - 1..=cx + 1 {
			for gy in cy - 1..=cy + 1 {
				let Some(bucket) = grid.get(&(gx, gy)) else {
					continue;
				};
				for &j in bucket {
					if j <= i {
						continue;
					}
					let (a, b) = (&bodies[i], &bodies[j]);
					let min_distance = a.r + b.r + margin;
					let (dx, dy) = (a.x - b.x, a.y - b.y);
					let distance = dx.hypot(dy);
					if distance >= min_distance {
						continue;
					}
					overlapping = true;
					let (ux, uy) = if distance > 1e-6 {
						(dx / distance, dy / distance)
					} else {
						let angle = (i as f64 * 0.618_034 + j as f64 * 0.414_214) * TAU;
						(angle.cos(), angle.sin())
					};
					let push = (min_distance - distance) * 0.5 + 1e-3;
					bodies[i].x += ux * push;
					bodies[i].y += uy * push;
					bodies[j].x -= ux * push;
					bodies[j].y -= uy * push;
				}
			}
		}
	}
	overlapping
}

/// Pairs of ids whose footprints are closer than `margin`.
pub fn overlapping_pairs(graph: &GraphStore, margin: f64) -> Vec<(String, String)> {
	let nodes: Vec<_> = graph.nodes().collect();
	let mut pairs = Vec::new();
	for (i, a) in nodes.iter().enumerate() {
		for b in &nodes[i + 1..] {
			// small tolerance for float drift at the boundary
			if (a.x - b.x).hypot(a.y - b.y) + 1e-6 < a.radius() + b.radius() + margin {
				pairs.push((a.id.clone(), b.id.clone()));
			}
		}
	}
	pairs
}
