use std::collections::HashMap;
use std::time::Duration;

use crate::config::ExplorerConfig;
use crate::graph::cluster::ClusteredGraph;
use crate::graph::explorer::Explorer;
use crate::graph::geometry::{Point, SHAPE_RADIUS, parallel_curvatures};
use crate::graph::layout::{ForceParams, LayoutKind, compute_layout};
use crate::graph::physics::ForceSimulation;
use crate::graph::types::NodeId;
use crate::graph::viewport::{OverlaySync, ViewEvent, ViewTransform};

pub const HIT_RADIUS: f64 = 12.0;

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node: Option<NodeId>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: Point,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Per-canvas state: what is drawn, where, and how the view is transformed.
pub struct CanvasState {
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	pub layout: LayoutKind,
	pub view: ClusteredGraph,
	pub curvatures: Vec<f64>,
	pub overlay: OverlaySync,
	pub highlight_t: f64,
	pub flow_time: f64,
	simulation: Option<ForceSimulation>,
	positions: HashMap<NodeId, Point>,
	spacing: f64,
	revision: Option<u64>,
}

impl CanvasState {
	pub fn new(config: &ExplorerConfig, width: f64, height: f64) -> Self {
		Self {
			transform: ViewTransform::centered(width, height),
			drag: DragState::default(),
			pan: PanState::default(),
			width,
			height,
			layout: config.default_layout,
			view: ClusteredGraph::default(),
			curvatures: Vec::new(),
			overlay: match config.overlay_poll_ms {
				0 => OverlaySync::event_driven(),
				ms => OverlaySync::polling(Duration::from_millis(ms)),
			},
			highlight_t: 0.0,
			flow_time: 0.0,
			simulation: None,
			positions: HashMap::new(),
			spacing: config.spacing,
			revision: None,
		}
	}

	/// Rebuilds the drawn view when the explorer's graph changed.
	pub fn sync(&mut self, explorer: &Explorer) {
		if self.revision == Some(explorer.revision()) {
			return;
		}
		self.revision = Some(explorer.revision());
		self.view = explorer.view();
		self.curvatures = parallel_curvatures(&self.view.links);
		for node in &mut self.view.nodes {
			if let Some(p) = self.positions.get(&node.id) {
				node.x = p.x;
				node.y = p.y;
			}
		}
		self.relayout();
		self.overlay.notify(ViewEvent::GraphChanged);
	}

	pub fn set_layout(&mut self, layout: LayoutKind) {
		if self.layout != layout {
			self.layout = layout;
			self.relayout();
		}
	}

	/// Applies the current layout. Pinned layouts stop the physics first so
	/// the two never run together.
	pub fn relayout(&mut self) {
		compute_layout(self.layout, &mut self.view.nodes, self.width, self.height, self.spacing);
		if self.layout.is_pinned() {
			if let Some(sim) = self.simulation.as_mut() {
				sim.pause();
			}
			self.simulation = None;
			self.positions = self
				.view
				.nodes
				.iter()
				.map(|n| (n.id.clone(), Point::from(n.position())))
				.collect();
		} else {
			let params = ForceParams::new(self.spacing, self.view.nodes.len(), self.width, self.height);
			let sim = ForceSimulation::new(&self.view.nodes, &self.view.links, params);
			self.positions = sim.positions();
			self.simulation = Some(sim);
		}
	}

	pub fn is_simulating(&self) -> bool {
		self.simulation.as_ref().is_some_and(|s| s.is_running())
	}

	pub fn toggle_simulation(&mut self) {
		if let Some(sim) = self.simulation.as_mut() {
			if sim.is_running() {
				sim.pause();
			} else {
				sim.resume();
			}
		}
	}

	pub fn position(&self, id: &str) -> Option<Point> {
		self.positions.get(id).copied()
	}

	pub fn node_radius(&self, id: &str) -> f64 {
		self.view
			.nodes
			.iter()
			.find(|n| n.id == id)
			.map_or(SHAPE_RADIUS, |n| n.size.max(SHAPE_RADIUS))
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<NodeId> {
		let g = self.transform.invert(sx, sy);
		// HIT_RADIUS is in world-space, scales with zoom like nodes
		self.view
			.nodes
			.iter()
			.rev()
			.find(|n| {
				self.positions
					.get(&n.id)
					.is_some_and(|p| p.distance(g) < HIT_RADIUS.max(n.size))
			})
			.map(|n| n.id.clone())
	}

	/// Moves a node under the pointer: anchors it in the physics, or re-pins
	/// it for fixed layouts.
	pub fn drag_node(&mut self, id: &str, to: Point) {
		match self.simulation.as_mut() {
			Some(sim) => sim.pin(id, to),
			None => {
				if let Some(node) = self.view.nodes.iter_mut().find(|n| n.id == id) {
					node.pin(to.x, to.y);
				}
			}
		}
		self.positions.insert(id.to_string(), to);
		self.overlay.notify(ViewEvent::Tick);
	}

	pub fn tick(&mut self, dt: f32, hovering: bool) {
		self.flow_time += dt as f64;
		if let Some(sim) = self.simulation.as_mut() {
			if sim.tick(dt) {
				self.positions = sim.positions();
				self.overlay.notify(ViewEvent::Tick);
			}
		}

		let (target, speed) = if hovering { (1.0, 1.8) } else { (0.0, 1.26) };
		self.highlight_t += (target - self.highlight_t) * speed * dt as f64;
		if !hovering && self.highlight_t < 0.01 {
			self.highlight_t = 0.0;
		}
	}

	pub fn pan_to(&mut self, x: f64, y: f64) {
		self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
		self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
		self.overlay.notify(ViewEvent::Pan);
	}

	pub fn zoom_at(&mut self, x: f64, y: f64, factor: f64) {
		self.transform.zoom_at(x, y, factor);
		self.overlay.notify(ViewEvent::Zoom);
	}

	/// Recenters on a node at a slightly closer zoom.
	pub fn focus_on(&mut self, id: &str) {
		if let Some(p) = self.position(id) {
			let k = self.transform.k.max(1.5);
			self.transform.center_on(p, self.width, self.height, k);
			self.overlay.notify(ViewEvent::Zoom);
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.overlay.notify(ViewEvent::Resize);
		self.relayout();
	}
}
