//! Pan/zoom transform and screen-position sync for overlay controls.

use std::time::Duration;

use super::geometry::Point;
use super::types::NodeId;

/// Furthest zoom out.
pub const MIN_ZOOM: f64 = 0.1;
/// Furthest zoom in.
pub const MAX_ZOOM: f64 = 10.0;

/// Canvas pixel = graph point * `k` + (`x`, `y`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Horizontal translation, in pixels.
	pub x: f64,
	/// Vertical translation, in pixels.
	pub y: f64,
	/// Scale.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

impl ViewTransform {
	/// Graph origin at the middle of a `width` x `height` canvas.
	pub fn centered(width: f64, height: f64) -> Self {
		Self {
			x: width / 2.0,
			y: height / 2.0,
			k: 1.0,
		}
	}

	/// Graph point to canvas pixel.
	pub fn apply(&self, p: Point) -> Point {
		Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
	}

	/// Canvas pixel to graph point.
	pub fn invert(&self, sx: f64, sy: f64) -> Point {
		Point::new((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Zooms by `factor` keeping the canvas point (`sx`, `sy`) fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.k;
		self.x = sx - (sx - self.x) * ratio;
		self.y = sy - (sy - self.y) * ratio;
		self.k = new_k;
	}

	/// Moves the view by a pixel delta.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.x += dx;
		self.y += dy;
	}

	/// Puts graph point `p` in the middle of the canvas at zoom `k`.
	pub fn center_on(&mut self, p: Point, width: f64, height: f64, k: f64) {
		self.k = k.clamp(MIN_ZOOM, MAX_ZOOM);
		self.x = width / 2.0 - p.x * self.k;
		self.y = height / 2.0 - p.y * self.k;
	}
}

/// Pixel position of a graph-space point inside the host page, given the
/// canvas' own offset `viewport_origin`.
pub fn to_screen(pos: Point, transform: &ViewTransform, viewport_origin: Point) -> Point {
	let p = transform.apply(pos);
	Point::new(p.x + viewport_origin.x, p.y + viewport_origin.y)
}

/// Things that move a tracked node on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewEvent {
	/// The user dragged the background.
	Pan,
	/// Wheel zoom.
	Zoom,
	/// A physics step moved nodes.
	Tick,
	/// The canvas changed size.
	Resize,
	/// Nodes were added, removed or relaid out.
	GraphChanged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Refresh {
	OnEvent,
	Poll(Duration),
}

/// Keeps an overlay anchored to one node. Event-driven by default; the
/// polling mode is for hosts that cannot report pan/zoom/tick events.
#[derive(Clone, Debug)]
pub struct OverlaySync {
	target: Option<NodeId>,
	screen: Option<Point>,
	dirty: bool,
	refresh: Refresh,
	last_refresh: Option<Duration>,
}

impl OverlaySync {
	/// Refreshes only after [`notify`](Self::notify).
	pub fn event_driven() -> Self {
		Self::with_refresh(Refresh::OnEvent)
	}

	/// Refreshes at most once per `interval`, whatever happened.
	pub fn polling(interval: Duration) -> Self {
		Self::with_refresh(Refresh::Poll(interval))
	}

	fn with_refresh(refresh: Refresh) -> Self {
		Self {
			target: None,
			screen: None,
			dirty: false,
			refresh,
			last_refresh: None,
		}
	}

	/// Tracked node.
	pub fn target(&self) -> Option<&str> {
		self.target.as_deref()
	}

	/// Starts tracking `node`, or stops with `None`.
	pub fn track(&mut self, node: Option<NodeId>) {
		if self.target != node {
			self.target = node;
			self.screen = None;
			self.dirty = self.target.is_some();
		}
	}

	/// Reports something that may have moved the tracked node.
	pub fn notify(&mut self, _event: ViewEvent) {
		if self.target.is_some() {
			self.dirty = true;
		}
	}

	/// Whether [`refresh`](Self::refresh) would recompute at time `now`.
	pub fn needs_refresh(&self, now: Duration) -> bool {
		if self.target.is_none() {
			return false;
		}
		match self.refresh {
			Refresh::OnEvent => self.dirty,
			Refresh::Poll(interval) => self
				.last_refresh
				.is_none_or(|last| now.saturating_sub(last) >= interval),
		}
	}

	/// Recomputes the overlay position if due. `node_pos` is the tracked
	/// node's graph position, or `None` if it left the graph.
	pub fn refresh(
		&mut self,
		now: Duration,
		node_pos: Option<Point>,
		transform: &ViewTransform,
		viewport_origin: Point,
	) -> Option<Point> {
		if self.needs_refresh(now) {
			self.screen = node_pos.map(|p| to_screen(p, transform, viewport_origin));
			self.dirty = false;
			self.last_refresh = Some(now);
		}
		self.screen
	}

	/// Last computed screen position.
	pub fn position(&self) -> Option<Point> {
		self.screen
	}
}
