//! Layout strategies.
//!
//! Every strategy except `force` is a pure function of (node index, node
//! count, container bounds, spacing) and pins the node at the result. Pinned
//! positions are centered on the origin and clamped to a quarter of the
//! container in each direction. `force` clears the pins and leaves
//! positioning to [`ForceSimulation`](super::physics::ForceSimulation).
//!
//! `dagre` and `cola` are heuristics that reuse the grid shape; they are not
//! the layered (Sugiyama) or constraint-solver algorithms of the same names.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use super::types::Node;
use crate::error::LayoutParseError;

const CIRCLE_RADIUS_PER_NODE: f64 = 1.5;
const CIRCLE_MAX_FRACTION: f64 = 0.7;
const GRID_SPACING_FACTOR: f64 = 0.8;
const RADIAL_RING_STEP: f64 = 40.0;
const TREE_LEVEL_FACTOR: f64 = 0.8;
const HIERARCHY_PER_LEVEL: usize = 6;
const SPIRAL_ANGLE_STEP: f64 = 0.5;
const SPIRAL_RADIUS_STEP: f64 = 8.0;
const CONCENTRIC_PER_RING: usize = 8;
const CONCENTRIC_RING_STEP: f64 = 50.0;
const DAGRE_ORDER_FACTOR: f64 = 1.0;
const DAGRE_RANK_FACTOR: f64 = 1.2;
const ARC_RADIUS_FRACTION: f64 = 0.8;
const CLUSTER_CENTERS: usize = 3;
const COLA_JITTER: f64 = 0.3;
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Force boundary pass: velocity is reflected and scaled by this on violation.
pub const BOUNDARY_DAMPING: f64 = 0.7;

/// The fourteen layout identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
	/// Continuous physics; nothing pinned.
	Force,
	/// Evenly around one circle.
	Circle,
	/// Row-major square grid.
	Grid,
	/// Rings filled outwards from the center.
	Radial,
	/// Binary-heap levels by index.
	Tree,
	/// Rows of a fixed node count.
	Hierarchical,
	/// Archimedean spiral.
	Spiral,
	/// Rings of growing capacity.
	Concentric,
	/// Grid with rank spacing stretched 1.2x; not a layered DAG layout.
	Dagre,
	/// Along the upper half of an ellipse.
	Arc,
	/// Around three hubs.
	Cluster,
	/// One horizontal line.
	Linear,
	/// Grid with seeded per-node jitter; not a constraint solver.
	Cola,
	/// Seeded uniform scatter.
	Random,
}

impl LayoutKind {
	/// Every layout, in menu order.
	pub const ALL: [LayoutKind; 14] = [
		LayoutKind::Force,
		LayoutKind::Circle,
		LayoutKind::Grid,
		LayoutKind::Radial,
		LayoutKind::Tree,
		LayoutKind::Hierarchical,
		LayoutKind::Spiral,
		LayoutKind::Concentric,
		LayoutKind::Dagre,
		LayoutKind::Arc,
		LayoutKind::Cluster,
		LayoutKind::Linear,
		LayoutKind::Cola,
		LayoutKind::Random,
	];

	/// Identifier used in config and the layout menu.
	pub fn as_str(self) -> &'static str {
		match self {
			LayoutKind::Force => "force",
			LayoutKind::Circle => "circle",
			LayoutKind::Grid => "grid",
			LayoutKind::Radial => "radial",
			LayoutKind::Tree => "tree",
			LayoutKind::Hierarchical => "hierarchical",
			LayoutKind::Spiral => "spiral",
			LayoutKind::Concentric => "concentric",
			LayoutKind::Dagre => "dagre",
			LayoutKind::Arc => "arc",
			LayoutKind::Cluster => "cluster",
			LayoutKind::Linear => "linear",
			LayoutKind::Cola => "cola",
			LayoutKind::Random => "random",
		}
	}

	/// Whether the layout pins nodes (everything but `force`).
	pub fn is_pinned(self) -> bool {
		self != LayoutKind::Force
	}
}

impl fmt::Display for LayoutKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for LayoutKind {
	type Err = LayoutParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		LayoutKind::ALL
			.into_iter()
			.find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
			.ok_or_else(|| LayoutParseError(s.to_string()))
	}
}

/// Half-extents, from the origin, that pinned layouts must stay inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	/// Horizontal half-extent.
	pub max_x: f64,
	/// Vertical half-extent.
	pub max_y: f64,
}

impl Bounds {
	/// A quarter of the container on each axis.
	pub fn for_container(width: f64, height: f64) -> Self {
		Self {
			max_x: (width / 4.0).max(0.0),
			max_y: (height / 4.0).max(0.0),
		}
	}

	fn min_extent(&self) -> f64 {
		self.max_x.min(self.max_y)
	}

	/// Nearest point inside.
	pub fn clamp(&self, (x, y): (f64, f64)) -> (f64, f64) {
		(x.clamp(-self.max_x, self.max_x), y.clamp(-self.max_y, self.max_y))
	}

	/// Whether the point is inside, edges included.
	pub fn contains(&self, (x, y): (f64, f64)) -> bool {
		x.abs() <= self.max_x && y.abs() <= self.max_y
	}
}

/// Applies `kind` to `nodes` in place.
pub fn compute_layout(kind: LayoutKind, nodes: &mut [Node], width: f64, height: f64, spacing: f64) {
	debug!("layout {} over {} nodes ({}x{})", kind, nodes.len(), width, height);
	if kind == LayoutKind::Force {
		for node in nodes.iter_mut() {
			node.unpin();
		}
		return;
	}

	let bounds = Bounds::for_container(width, height);
	let n = nodes.len();
	for (i, node) in nodes.iter_mut().enumerate() {
		let (x, y) = bounds.clamp(position(kind, i, n, &bounds, spacing, &node.id));
		node.pin(x, y);
	}
}

/// Unclamped position of node `i` of `n` for a pinned layout.
pub fn position(kind: LayoutKind, i: usize, n: usize, b: &Bounds, spacing: f64, id: &str) -> (f64, f64) {
	let fi = i as f64;
	match kind {
		LayoutKind::Force => (0.0, 0.0),
		LayoutKind::Circle => {
			let angle = fi * 2.0 * PI / n as f64;
			let radius = (n as f64 * CIRCLE_RADIUS_PER_NODE).min(b.max_x * CIRCLE_MAX_FRACTION);
			(radius * angle.cos(), radius * angle.sin())
		}
		LayoutKind::Grid => {
			let cell = grid_cell_size(n, b, spacing);
			grid_slot(i, n, cell, cell)
		}
		LayoutKind::Radial => {
			let ring = (fi / PI).sqrt().floor() as usize;
			let start = ring_start_radial(ring);
			let end = ring_start_radial(ring + 1).min(n);
			let angle = i.saturating_sub(start) as f64 * 2.0 * PI / end.saturating_sub(start).max(1) as f64;
			let radius = ((ring + 1) as f64 * RADIAL_RING_STEP).min(b.min_extent() * 0.9);
			(radius * angle.cos(), radius * angle.sin())
		}
		LayoutKind::Tree => {
			let level = (i + 1).ilog2();
			let pos = i + 1 - (1usize << level);
			let width = (1usize << level) as f64;
			let levels = n.max(1).ilog2() as f64 + 1.0;
			let gap = (spacing * TREE_LEVEL_FACTOR).min(2.0 * b.max_y / levels);
			let x = ((pos as f64 + 0.5) / width - 0.5) * 2.0 * b.max_x;
			let y = (level as f64 - (levels - 1.0) / 2.0) * gap;
			(x, y)
		}
		LayoutKind::Hierarchical => {
			let level = i / HIERARCHY_PER_LEVEL;
			let pos = i % HIERARCHY_PER_LEVEL;
			let in_level = n.saturating_sub(level * HIERARCHY_PER_LEVEL).min(HIERARCHY_PER_LEVEL);
			let levels = n.div_ceil(HIERARCHY_PER_LEVEL) as f64;
			let h = spacing.min(2.0 * b.max_x / HIERARCHY_PER_LEVEL as f64);
			let v = (spacing * TREE_LEVEL_FACTOR).min(2.0 * b.max_y / levels);
			(
				(pos as f64 - (in_level as f64 - 1.0) / 2.0) * h,
				(level as f64 - (levels - 1.0) / 2.0) * v,
			)
		}
		LayoutKind::Spiral => {
			let angle = fi * SPIRAL_ANGLE_STEP;
			let radius = (fi * SPIRAL_RADIUS_STEP).min(b.min_extent());
			(radius * angle.cos(), radius * angle.sin())
		}
		LayoutKind::Concentric => {
			let ring = (fi / 4.0).sqrt().floor() as usize;
			let start = 4 * ring * ring;
			let population = (4 * (ring + 1) * (ring + 1)).min(n).saturating_sub(start);
			let slots = (ring * CONCENTRIC_PER_RING).max(population).max(1);
			let angle = i.saturating_sub(start) as f64 * 2.0 * PI / slots as f64;
			let radius = ((ring + 1) as f64 * CONCENTRIC_RING_STEP).min(b.min_extent());
			(radius * angle.cos(), radius * angle.sin())
		}
		LayoutKind::Dagre => {
			let (cols, rows) = grid_shape(n);
			let cell_x = (spacing * DAGRE_ORDER_FACTOR).min(2.0 * b.max_x / cols as f64);
			let cell_y = (spacing * DAGRE_RANK_FACTOR).min(2.0 * b.max_y / rows as f64);
			grid_slot(i, n, cell_x, cell_y)
		}
		LayoutKind::Arc => {
			let angle = if n <= 1 { PI / 2.0 } else { PI * fi / (n - 1) as f64 };
			let (rx, ry) = (b.max_x * ARC_RADIUS_FRACTION, b.max_y * ARC_RADIUS_FRACTION);
			(-rx * angle.cos(), ry / 2.0 - ry * angle.sin())
		}
		LayoutKind::Cluster => {
			let center = (i % CLUSTER_CENTERS) as f64;
			let local = (i / CLUSTER_CENTERS) as f64;
			let angle = center * 2.0 * PI / CLUSTER_CENTERS as f64 - PI / 2.0;
			let hub = b.min_extent() * 0.5;
			let spread = (local.sqrt() * spacing * 0.3).min(b.min_extent() * 0.4);
			let local_angle = local * GOLDEN_ANGLE;
			(
				hub * angle.cos() + spread * local_angle.cos(),
				hub * angle.sin() + spread * local_angle.sin(),
			)
		}
		LayoutKind::Linear => {
			let step = if n <= 1 {
				0.0
			} else {
				spacing.min(2.0 * b.max_x / (n - 1) as f64)
			};
			((fi - (n as f64 - 1.0) / 2.0) * step, 0.0)
		}
		LayoutKind::Cola => {
			let cell = grid_cell_size(n, b, spacing);
			let (x, y) = grid_slot(i, n, cell, cell);
			let jx = (seeded_unit(id, 1) * 2.0 - 1.0) * COLA_JITTER * cell;
			let jy = (seeded_unit(id, 2) * 2.0 - 1.0) * COLA_JITTER * cell;
			(x + jx, y + jy)
		}
		LayoutKind::Random => (
			(seeded_unit(id, 3) * 2.0 - 1.0) * b.max_x,
			(seeded_unit(id, 4) * 2.0 - 1.0) * b.max_y,
		),
	}
}

fn ring_start_radial(ring: usize) -> usize {
	(PI * (ring * ring) as f64).ceil() as usize
}

fn grid_shape(n: usize) -> (usize, usize) {
	let cols = ((n as f64).sqrt().ceil() as usize).max(1);
	(cols, n.div_ceil(cols).max(1))
}

fn grid_cell_size(n: usize, b: &Bounds, spacing: f64) -> f64 {
	let (cols, _) = grid_shape(n);
	(spacing * GRID_SPACING_FACTOR).min(2.0 * b.max_x / cols as f64)
}

fn grid_slot(i: usize, n: usize, cell_x: f64, cell_y: f64) -> (f64, f64) {
	let (cols, rows) = grid_shape(n);
	let (col, row) = ((i % cols) as f64, (i / cols) as f64);
	(
		(col - (cols as f64 - 1.0) / 2.0) * cell_x,
		(row - (rows as f64 - 1.0) / 2.0) * cell_y,
	)
}

/// Deterministic value in `[0, 1)` derived from a node id and a salt.
pub fn seeded_unit(id: &str, salt: u64) -> f64 {
	// FNV-1a over the id, then one splitmix64 round.
	let mut h: u64 = 0xcbf2_9ce4_8422_2325;
	for byte in id.bytes() {
		h ^= byte as u64;
		h = h.wrapping_mul(0x0100_0000_01b3);
	}
	let mut z = h ^ salt.wrapping_mul(0x9e37_79b9_7f4a_7c15);
	z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
	z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
	z ^= z >> 31;
	(z >> 11) as f64 / (1u64 << 53) as f64
}

/// Parameters for the continuous `force` strategy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceParams {
	/// Negative: nodes repel.
	pub charge: f64,
	/// Preferred link length.
	pub link_distance: f64,
	/// Minimum center distance; shrinks as the graph grows.
	pub collision_radius: f64,
	/// Boundary half-extents: a third of the container.
	pub bound_x: f64,
	/// See `bound_x`.
	pub bound_y: f64,
}

impl ForceParams {
	/// Derives every parameter from the spacing, graph size and container.
	pub fn new(spacing: f64, node_count: usize, width: f64, height: f64) -> Self {
		let collision_radius = match node_count {
			0..50 => 25.0,
			50..150 => 15.0,
			_ => 10.0,
		};
		Self {
			charge: -spacing * 1.5,
			link_distance: spacing * 0.8,
			collision_radius,
			bound_x: width / 3.0,
			bound_y: height / 3.0,
		}
	}
}

/// A simulated point with velocity, as seen by the boundary pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Body {
	/// Horizontal position.
	pub x: f64,
	/// Vertical position.
	pub y: f64,
	/// Horizontal velocity.
	pub vx: f64,
	/// Vertical velocity.
	pub vy: f64,
}

/// Clamps `body` inside `±bound_x`/`±bound_y`, reflecting and damping the
/// velocity component on each violated axis. Returns whether it violated.
pub fn constrain_to_bounds(body: &mut Body, bound_x: f64, bound_y: f64) -> bool {
	let mut hit = false;
	if body.x.abs() > bound_x {
		body.x = body.x.clamp(-bound_x, bound_x);
		body.vx = -body.vx * BOUNDARY_DAMPING;
		hit = true;
	}
	if body.y.abs() > bound_y {
		body.y = body.y.clamp(-bound_y, bound_y);
		body.vy = -body.vy * BOUNDARY_DAMPING;
		hit = true;
	}
	hit
}

#[cfg(test)]
mod tests {
	use super::*;

	fn nodes(n: usize) -> Vec<Node> {
		(0..n).map(|i| Node::new(format!("n{i}"), format!("Node {i}"), "t")).collect()
	}

	#[test]
	fn grid_of_nine_is_three_by_three() {
		let mut ns = nodes(9);
		compute_layout(LayoutKind::Grid, &mut ns, 900.0, 900.0, 100.0);
		let mut xs: Vec<i64> = ns.iter().map(|n| n.fx.unwrap().round() as i64).collect();
		let mut ys: Vec<i64> = ns.iter().map(|n| n.fy.unwrap().round() as i64).collect();
		xs.sort();
		xs.dedup();
		ys.sort();
		ys.dedup();
		assert_eq!(xs.len(), 3);
		assert_eq!(ys.len(), 3);
		assert!(ns.iter().all(|n| n.x.abs() <= 225.0 && n.y.abs() <= 225.0));
	}

	#[test]
	fn force_clears_pins() {
		let mut ns = nodes(4);
		compute_layout(LayoutKind::Circle, &mut ns, 400.0, 400.0, 50.0);
		assert!(ns.iter().all(|n| n.fx.is_some()));
		compute_layout(LayoutKind::Force, &mut ns, 400.0, 400.0, 50.0);
		assert!(ns.iter().all(|n| n.fx.is_none() && n.fy.is_none()));
	}

	#[test]
	fn every_pinned_layout_stays_in_bounds() {
		let bounds = Bounds::for_container(640.0, 360.0);
		for kind in LayoutKind::ALL.into_iter().filter(|k| k.is_pinned()) {
			for n in [1, 2, 7, 64, 300] {
				let mut ns = nodes(n);
				compute_layout(kind, &mut ns, 640.0, 360.0, 120.0);
				for node in &ns {
					assert!(bounds.contains(node.position()), "{kind} n={n} {:?}", node.position());
				}
			}
		}
	}

	#[test]
	fn empty_input_is_a_no_op() {
		for kind in LayoutKind::ALL {
			let mut ns: Vec<Node> = Vec::new();
			compute_layout(kind, &mut ns, 800.0, 600.0, 100.0);
		}
	}

	#[test]
	fn tree_places_levels_by_binary_index() {
		let b = Bounds::for_container(1600.0, 1600.0);
		let y = |i| position(LayoutKind::Tree, i, 7, &b, 100.0, "").1;
		assert_eq!(y(1), y(2));
		assert_eq!(y(3), y(6));
		assert!(y(0) < y(1) && y(1) < y(3));
	}

	#[test]
	fn hierarchical_uses_six_per_level() {
		let b = Bounds::for_container(2000.0, 2000.0);
		let y = |i| position(LayoutKind::Hierarchical, i, 13, &b, 100.0, "").1;
		assert_eq!(y(0), y(5));
		assert!(y(6) > y(5));
		assert!(y(12) > y(11));
	}

	#[test]
	fn seeded_layouts_are_reproducible_and_id_dependent() {
		let mut a = nodes(20);
		let mut b = nodes(20);
		compute_layout(LayoutKind::Random, &mut a, 800.0, 800.0, 100.0);
		compute_layout(LayoutKind::Random, &mut b, 800.0, 800.0, 100.0);
		assert_eq!(a, b);
		assert_ne!(a[0].position(), a[1].position());
	}

	#[test]
	fn cola_jitter_stays_within_thirty_percent_of_cell() {
		let b = Bounds::for_container(4000.0, 4000.0);
		for i in 0..16 {
			let id = format!("n{i}");
			let (gx, gy) = position(LayoutKind::Grid, i, 16, &b, 100.0, &id);
			let (cx, cy) = position(LayoutKind::Cola, i, 16, &b, 100.0, &id);
			assert!((cx - gx).abs() <= 0.3 * 80.0 + 1e-9);
			assert!((cy - gy).abs() <= 0.3 * 80.0 + 1e-9);
		}
	}

	#[test]
	fn parses_case_insensitively() {
		assert_eq!("Dagre".parse::<LayoutKind>(), Ok(LayoutKind::Dagre));
		assert_eq!(LayoutKind::Cola.to_string(), "cola");
		assert!("sugiyama".parse::<LayoutKind>().is_err());
	}

	#[test]
	fn boundary_reflects_with_damping() {
		let mut body = Body {
			x: 120.0,
			y: -5.0,
			vx: 10.0,
			vy: -2.0,
		};
		assert!(constrain_to_bounds(&mut body, 100.0, 100.0));
		assert_eq!(body.x, 100.0);
		assert!((body.vx + 7.0).abs() < 1e-12);
		assert_eq!(body.vy, -2.0);
	}

	#[test]
	fn collision_radius_shrinks_with_node_count() {
		let small = ForceParams::new(100.0, 10, 900.0, 900.0);
		let large = ForceParams::new(100.0, 500, 900.0, 900.0);
		assert!(small.collision_radius > large.collision_radius);
		assert_eq!(small.bound_x, 300.0);
		assert!(small.charge < 0.0);
	}
}
