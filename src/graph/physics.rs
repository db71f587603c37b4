//! Continuous physics for the `force` layout, backed by `force_graph`.
//!
//! Each tick runs the library step, then a collision pass and a boundary pass
//! that keeps every node within a third of the container from the center.

use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::debug;

use super::geometry::Point;
use super::layout::{Body, ForceParams, constrain_to_bounds};
use super::types::{Link, Node, NodeId};

const SEED_RADIUS: f64 = 100.0;
const REFERENCE_LINK_DISTANCE: f64 = 80.0;
const REFERENCE_SPRING: f64 = 0.05;

/// Force-directed simulation of the live graph.
pub struct ForceSimulation {
	graph: ForceGraph<NodeId, ()>,
	index: HashMap<NodeId, DefaultNodeIdx>,
	params: ForceParams,
	running: bool,
	last: HashMap<DefaultNodeIdx, (f32, f32)>,
}

impl ForceSimulation {
	/// Builds a running simulation. Nodes keep their current position when
	/// they have one and are otherwise seeded on a circle.
	pub fn new(nodes: &[Node], links: &[Link], params: ForceParams) -> Self {
		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: (-params.charge) as f32,
			force_spring: (REFERENCE_SPRING * REFERENCE_LINK_DISTANCE / params.link_distance.max(1.0)) as f32,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});
		let mut index = HashMap::new();

		let seed_radius = SEED_RADIUS.min(params.bound_x.min(params.bound_y) * 0.5);
		for (i, node) in nodes.iter().enumerate() {
			let unplaced = node.fx.is_none() && node.x == 0.0 && node.y == 0.0;
			let (x, y) = if unplaced {
				let angle = i as f64 * 2.0 * PI / nodes.len() as f64;
				(seed_radius * angle.cos(), seed_radius * angle.sin())
			} else {
				node.position()
			};
			let idx = graph.add_node(NodeData {
				x: x as f32,
				y: y as f32,
				mass: 10.0,
				is_anchor: node.fx.is_some(),
				user_data: node.id.clone(),
			});
			index.insert(node.id.clone(), idx);
		}

		for link in links.iter().filter(|l| !l.is_self_loop) {
			if let (Some(&src), Some(&tgt)) = (index.get(&link.source), index.get(&link.target)) {
				graph.add_edge(src, tgt, EdgeData::default());
			}
		}
		debug!("force simulation over {} nodes", index.len());

		Self {
			graph,
			index,
			params,
			running: true,
			last: HashMap::new(),
		}
	}

	/// Parameters the simulation was built with.
	pub fn params(&self) -> &ForceParams {
		&self.params
	}

	/// Whether ticks advance.
	pub fn is_running(&self) -> bool {
		self.running
	}

	/// Freezes every node in place.
	pub fn pause(&mut self) {
		self.running = false;
	}

	/// Continues from the current positions.
	pub fn resume(&mut self) {
		self.running = true;
		self.last.clear();
	}

	/// Advances one step. Returns false when paused.
	pub fn tick(&mut self, dt: f32) -> bool {
		if !self.running || dt <= 0.0 {
			return false;
		}
		self.graph.update(dt);
		self.separate();
		self.keep_in_bounds(dt);
		true
	}

	fn separate(&mut self) {
		let min_dist = self.params.collision_radius * 2.0;
		let mut points: Vec<(DefaultNodeIdx, f64, f64)> = Vec::with_capacity(self.index.len());
		self.graph
			.visit_nodes(|node| points.push((node.index(), node.x() as f64, node.y() as f64)));

		let mut push: HashMap<DefaultNodeIdx, (f64, f64)> = HashMap::new();
		for (i, &(a, ax, ay)) in points.iter().enumerate() {
			for &(b, bx, by) in &points[i + 1..] {
				let (dx, dy) = (bx - ax, by - ay);
				let dist = dx.hypot(dy);
				if dist >= min_dist || dist < f64::EPSILON {
					continue;
				}
				let overlap = (min_dist - dist) / 2.0;
				let (ux, uy) = (dx / dist * overlap, dy / dist * overlap);
				let pa = push.entry(a).or_default();
				pa.0 -= ux;
				pa.1 -= uy;
				let pb = push.entry(b).or_default();
				pb.0 += ux;
				pb.1 += uy;
			}
		}
		if push.is_empty() {
			return;
		}
		self.graph.visit_nodes_mut(|node| {
			if node.data.is_anchor {
				return;
			}
			if let Some(&(px, py)) = push.get(&node.index()) {
				node.data.x += px as f32;
				node.data.y += py as f32;
			}
		});
	}

	fn keep_in_bounds(&mut self, dt: f32) {
		let (bx, by) = (self.params.bound_x, self.params.bound_y);
		let last = &mut self.last;
		self.graph.visit_nodes_mut(|node| {
			let idx = node.index();
			let (x, y) = (node.data.x, node.data.y);
			let (lx, ly) = last.get(&idx).copied().unwrap_or((x, y));
			let mut body = Body {
				x: x as f64,
				y: y as f64,
				vx: ((x - lx) / dt) as f64,
				vy: ((y - ly) / dt) as f64,
			};
			if constrain_to_bounds(&mut body, bx, by) {
				// The library owns velocity, so the reflection is applied as one
				// step of reflected displacement.
				let nx = (body.x + body.vx * dt as f64).clamp(-bx, bx);
				let ny = (body.y + body.vy * dt as f64).clamp(-by, by);
				node.data.x = nx as f32;
				node.data.y = ny as f32;
			}
			last.insert(idx, (node.data.x, node.data.y));
		});
	}

	/// Current position of `id`.
	pub fn position(&self, id: &str) -> Option<Point> {
		let idx = *self.index.get(id)?;
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				found = Some(Point::new(node.x() as f64, node.y() as f64));
			}
		});
		found
	}

	/// Every node's current position.
	pub fn positions(&self) -> HashMap<NodeId, Point> {
		let mut out = HashMap::with_capacity(self.index.len());
		self.graph.visit_nodes(|node| {
			out.insert(
				node.data.user_data.clone(),
				Point::new(node.x() as f64, node.y() as f64),
			);
		});
		out
	}

	/// Anchors a node at `p`, e.g. while it is dragged.
	pub fn pin(&mut self, id: &str, p: Point) {
		let Some(&idx) = self.index.get(id) else {
			return;
		};
		self.graph.visit_nodes_mut(|node| {
			if node.index() == idx {
				node.data.x = p.x as f32;
				node.data.y = p.y as f32;
				node.data.is_anchor = true;
			}
		});
		self.last.remove(&idx);
	}

	/// Lets a dragged node move freely again.
	pub fn release(&mut self, id: &str) {
		let Some(&idx) = self.index.get(id) else {
			return;
		};
		self.graph.visit_nodes_mut(|node| {
			if node.index() == idx {
				node.data.is_anchor = false;
			}
		});
	}

	/// Copies simulated positions into `nodes`' `x`/`y`.
	pub fn write_back(&self, nodes: &mut [Node]) {
		let positions = self.positions();
		for node in nodes.iter_mut() {
			if let Some(p) = positions.get(&node.id) {
				node.x = p.x;
				node.y = p.y;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ring(n: usize) -> (Vec<Node>, Vec<Link>) {
		let nodes: Vec<Node> = (0..n).map(|i| Node::new(i.to_string(), "", "t")).collect();
		let links = (1..n).map(|i| Link::new(i.to_string(), (i - 1).to_string(), "r")).collect();
		(nodes, links)
	}

	#[test]
	fn ticks_stay_inside_a_third_of_the_container() {
		let (nodes, links) = ring(30);
		let params = ForceParams::new(100.0, nodes.len(), 300.0, 240.0);
		let mut sim = ForceSimulation::new(&nodes, &links, params);
		for _ in 0..120 {
			assert!(sim.tick(0.016));
		}
		for p in sim.positions().values() {
			assert!(p.x.abs() <= 100.0 + 1e-3 && p.y.abs() <= 80.0 + 1e-3, "{p:?}");
		}
	}

	#[test]
	fn paused_simulation_does_not_move() {
		let (nodes, links) = ring(5);
		let mut sim = ForceSimulation::new(&nodes, &links, ForceParams::new(100.0, 5, 900.0, 900.0));
		sim.pause();
		let before = sim.positions();
		assert!(!sim.tick(0.016));
		assert_eq!(sim.positions(), before);
		sim.resume();
		assert!(sim.is_running());
	}

	#[test]
	fn pinned_node_stays_put() {
		let (nodes, links) = ring(6);
		let mut sim = ForceSimulation::new(&nodes, &links, ForceParams::new(100.0, 6, 900.0, 900.0));
		sim.pin("2", Point::new(10.0, 20.0));
		for _ in 0..30 {
			sim.tick(0.016);
		}
		assert_eq!(sim.position("2"), Some(Point::new(10.0, 20.0)));

		let mut copy = nodes.clone();
		sim.write_back(&mut copy);
		assert_eq!((copy[2].x, copy[2].y), (10.0, 20.0));
	}
}
