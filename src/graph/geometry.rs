//! Backend-independent render geometry: node outlines, edge curves,
//! arrowheads, self-loops, labels and highlight decoration.

use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::types::{HighlightSet, Link, LinkKey, Node};

/// Outline radius, in graph units, for every shape.
pub const SHAPE_RADIUS: f64 = 8.0;
/// Largest bend given to a parallel edge.
pub const MAX_CURVATURE: f64 = 0.3;
/// Parametric position of arrowheads along an edge.
pub const ARROW_T: f64 = 0.85;
/// Arrowhead length.
pub const ARROW_SIZE: f64 = 6.0;
/// Characters per wrapped label line.
pub const LABEL_MAX_CHARS: usize = 10;
/// Gap between a highlighted node and its accent ring.
pub const HIGHLIGHT_RING_OFFSET: f64 = 5.0;
/// Color of highlight rings and emphasized links.
pub const ACCENT_COLOR: &str = "#ffb300";
const SELF_LOOP_PADDING: f64 = 8.0;
const SELF_LOOP_MIN_RADIUS: f64 = 20.0;
const LABEL_BOX_PADDING: f64 = 2.0;

/// A position in graph units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	/// Horizontal.
	pub x: f64,
	/// Vertical, growing downwards.
	pub y: f64,
}

impl Point {
	/// From coordinates.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance.
	pub fn distance(self, other: Point) -> f64 {
		(other.x - self.x).hypot(other.y - self.y)
	}

	fn lerp(self, other: Point, t: f64) -> Point {
		Point::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
	}

	fn polar(self, radius: f64, angle: f64) -> Point {
		Point::new(self.x + radius * angle.cos(), self.y + radius * angle.sin())
	}
}

impl From<(f64, f64)> for Point {
	fn from((x, y): (f64, f64)) -> Self {
		Point::new(x, y)
	}
}

/// Node outline. Read from the `shape` node property.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
	/// Default.
	#[default]
	Circle,
	/// Axis-aligned square.
	Square,
	/// Pointing up.
	Triangle,
	/// Square on its corner.
	Diamond,
	/// Flat-sided hexagon.
	Hexagon,
	/// Five-pointed star.
	Star,
}

impl FromStr for Shape {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"circle" => Ok(Shape::Circle),
			"square" => Ok(Shape::Square),
			"triangle" => Ok(Shape::Triangle),
			"diamond" => Ok(Shape::Diamond),
			"hexagon" => Ok(Shape::Hexagon),
			"star" => Ok(Shape::Star),
			_ => Err(()),
		}
	}
}

impl Shape {
	/// Shape from the node's `shape` property, circle otherwise.
	pub fn for_node(node: &Node) -> Shape {
		node.properties
			.get("shape")
			.and_then(|v| v.as_str())
			.and_then(|s| s.parse().ok())
			.unwrap_or_default()
	}
}

/// Path to fill and stroke for a node.
#[derive(Clone, Debug, PartialEq)]
pub enum Outline {
	/// A full circle.
	Circle {
		/// Node center.
		center: Point,
		/// Always [`SHAPE_RADIUS`].
		radius: f64,
	},
	/// Closed polygon, vertices in drawing order.
	Polygon(Vec<Point>),
}

/// Outline of `shape` at [`SHAPE_RADIUS`], independent of zoom.
pub fn shape_outline(shape: Shape, center: Point) -> Outline {
	let r = SHAPE_RADIUS;
	let regular = |sides: usize, start: f64| -> Vec<Point> {
		(0..sides)
			.map(|k| center.polar(r, start + k as f64 * 2.0 * PI / sides as f64))
			.collect()
	};
	match shape {
		Shape::Circle => Outline::Circle { center, radius: r },
		Shape::Square => Outline::Polygon(regular(4, -3.0 * FRAC_PI_4)),
		Shape::Triangle => Outline::Polygon(regular(3, -FRAC_PI_2)),
		Shape::Diamond => Outline::Polygon(regular(4, -FRAC_PI_2)),
		Shape::Hexagon => Outline::Polygon(regular(6, 0.0)),
		Shape::Star => Outline::Polygon(
			(0..10)
				.map(|k| {
					let radius = if k % 2 == 0 { r } else { r * 0.5 };
					center.polar(radius, -FRAC_PI_2 + k as f64 * PI / 5.0)
				})
				.collect(),
		),
	}
}

/// Curvature per link, in input order. Links sharing an unordered endpoint
/// pair are spread evenly over `[-0.3, 0.3]`; lone links and self-loops get 0.
pub fn parallel_curvatures(links: &[Link]) -> Vec<f64> {
	let mut groups: HashMap<LinkKey, Vec<usize>> = HashMap::new();
	for (i, link) in links.iter().enumerate() {
		if !link.is_self_loop {
			groups.entry(link.key()).or_default().push(i);
		}
	}

	let mut out = vec![0.0; links.len()];
	for members in groups.values().filter(|m| m.len() > 1) {
		let last = (members.len() - 1) as f64;
		for (j, &i) in members.iter().enumerate() {
			out[i] = -MAX_CURVATURE + 2.0 * MAX_CURVATURE * j as f64 / last;
		}
	}
	out
}

/// Curvature relative to the link's own direction. Reversed links bend the
/// other way so parallel edges stay apart whichever way they point.
pub fn oriented_curvature(link: &Link, curvature: f64) -> f64 {
	if link.source > link.target {
		-curvature
	} else {
		curvature
	}
}

/// A straight edge or a quadratic Bézier with one control point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeCurve {
	/// Where the edge leaves the source.
	pub start: Point,
	/// Where the edge meets the target.
	pub end: Point,
	/// Bézier control point; `None` draws a straight line.
	pub control: Option<Point>,
}

impl EdgeCurve {
	/// Control point sits at the chord midpoint, offset perpendicular to the
	/// chord by `distance * curvature`.
	pub fn new(start: Point, end: Point, curvature: f64) -> Self {
		let dist = start.distance(end);
		let control = (curvature != 0.0 && dist > f64::EPSILON).then(|| {
			let mid = start.lerp(end, 0.5);
			let (nx, ny) = (-(end.y - start.y) / dist, (end.x - start.x) / dist);
			Point::new(mid.x + nx * dist * curvature, mid.y + ny * dist * curvature)
		});
		Self { start, end, control }
	}

	/// Point at parameter `t` in `[0, 1]`.
	pub fn point_at(&self, t: f64) -> Point {
		match self.control {
			None => self.start.lerp(self.end, t),
			Some(c) => {
				let u = 1.0 - t;
				Point::new(
					u * u * self.start.x + 2.0 * u * t * c.x + t * t * self.end.x,
					u * u * self.start.y + 2.0 * u * t * c.y + t * t * self.end.y,
				)
			}
		}
	}

	/// Direction of travel at `t`, in radians.
	pub fn tangent_angle(&self, t: f64) -> f64 {
		let (dx, dy) = match self.control {
			None => (self.end.x - self.start.x, self.end.y - self.start.y),
			Some(c) => (
				2.0 * (1.0 - t) * (c.x - self.start.x) + 2.0 * t * (self.end.x - c.x),
				2.0 * (1.0 - t) * (c.y - self.start.y) + 2.0 * t * (self.end.y - c.y),
			),
		};
		dy.atan2(dx)
	}

	/// Point at `t = 0.5`, where the edge label goes.
	pub fn midpoint(&self) -> Point {
		self.point_at(0.5)
	}

	/// Arrowhead at [`ARROW_T`].
	pub fn arrowhead(&self) -> Arrowhead {
		Arrowhead {
			tip: self.point_at(ARROW_T),
			angle: self.tangent_angle(ARROW_T),
		}
	}
}

/// An arrowhead pointing along the edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arrowhead {
	/// Tip position.
	pub tip: Point,
	/// Pointing direction, in radians.
	pub angle: f64,
}

impl Arrowhead {
	/// Tip followed by the two back corners.
	pub fn points(&self, size: f64) -> [Point; 3] {
		let back = self.tip.polar(-size, self.angle);
		let (px, py) = (-self.angle.sin() * size * 0.5, self.angle.cos() * size * 0.5);
		[
			self.tip,
			Point::new(back.x + px, back.y + py),
			Point::new(back.x - px, back.y - py),
		]
	}
}

/// Circular arc drawn above a node for links from the node to itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelfLoop {
	/// Center of the loop arc.
	pub center: Point,
	/// Arc radius.
	pub radius: f64,
	/// Arrowhead on the arc.
	pub arrow: Arrowhead,
}

/// Loop above a node of `node_radius`.
pub fn self_loop(node_center: Point, node_radius: f64) -> SelfLoop {
	let radius = (node_radius + SELF_LOOP_PADDING).max(SELF_LOOP_MIN_RADIUS);
	let center = Point::new(node_center.x, node_center.y - radius);
	let at = -FRAC_PI_4;
	SelfLoop {
		center,
		radius,
		arrow: Arrowhead {
			tip: center.polar(radius, at),
			angle: at + FRAC_PI_2,
		},
	}
}

/// Greedy word wrap; a single word longer than `max_chars` gets its own line.
pub fn wrap_label(text: &str, max_chars: usize) -> Vec<String> {
	let mut lines: Vec<String> = Vec::new();
	let mut line = String::new();
	for word in text.split_whitespace() {
		if line.is_empty() {
			line.push_str(word);
		} else if line.chars().count() + 1 + word.chars().count() <= max_chars {
			line.push(' ');
			line.push_str(word);
		} else {
			lines.push(std::mem::take(&mut line));
			line.push_str(word);
		}
	}
	if !line.is_empty() {
		lines.push(line);
	}
	lines
}

/// Vertical offsets, relative to the node center, that center a stack of
/// `count` lines.
pub fn label_line_offsets(count: usize, line_height: f64) -> Vec<f64> {
	let middle = (count as f64 - 1.0) / 2.0;
	(0..count).map(|k| (k as f64 - middle) * line_height).collect()
}

/// Placement of an edge's relation label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeLabel {
	/// Edge midpoint.
	pub position: Point,
	/// Never upside-down: always within `[-π/2, π/2]`.
	pub rotation: f64,
	/// Background box width.
	pub box_width: f64,
	/// Background box height.
	pub box_height: f64,
}

/// Label centered on the curve midpoint, rotated along it.
pub fn edge_label(curve: &EdgeCurve, text_width: f64, font_size: f64) -> EdgeLabel {
	let mut rotation = curve.tangent_angle(0.5);
	if rotation > FRAC_PI_2 {
		rotation -= PI;
	} else if rotation < -FRAC_PI_2 {
		rotation += PI;
	}
	EdgeLabel {
		position: curve.midpoint(),
		rotation,
		box_width: text_width + 2.0 * LABEL_BOX_PADDING,
		box_height: font_size + 2.0 * LABEL_BOX_PADDING,
	}
}

/// How to stroke a link.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
	/// Line width.
	pub width: f64,
	/// CSS color.
	pub color: String,
}

/// Extra accent ring for highlighted nodes.
pub fn highlight_ring(node: &Node, radius: f64, highlight: &HighlightSet) -> Option<f64> {
	highlight
		.has_node(&node.id)
		.then_some(radius + HIGHLIGHT_RING_OFFSET)
}

/// Highlighted links get double width in the accent color.
pub fn link_stroke(link: &Link, base_width: f64, default_color: &str, highlight: &HighlightSet) -> Stroke {
	if highlight.has_link(link) {
		Stroke {
			width: base_width * 2.0,
			color: ACCENT_COLOR.to_string(),
		}
	} else {
		Stroke {
			width: base_width,
			color: link.color.clone().unwrap_or_else(|| default_color.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const EPS: f64 = 1e-9;

	#[test]
	fn outlines_use_fixed_radius() {
		let c = Point::new(10.0, -4.0);
		for shape in [Shape::Square, Shape::Triangle, Shape::Diamond, Shape::Hexagon] {
			let Outline::Polygon(points) = shape_outline(shape, c) else {
				panic!("{shape:?} should be a polygon");
			};
			assert!(points.iter().all(|p| (p.distance(c) - SHAPE_RADIUS).abs() < EPS));
		}
		let Outline::Polygon(star) = shape_outline(Shape::Star, c) else {
			panic!("star should be a polygon");
		};
		assert_eq!(star.len(), 10);
		assert_eq!(shape_outline(Shape::Circle, c), Outline::Circle { center: c, radius: 8.0 });
	}

	#[test]
	fn single_link_is_straight_and_parallels_spread() {
		let links = vec![
			Link::new("a", "b", "r1"),
			Link::new("b", "a", "r2"),
			Link::new("a", "b", "r3"),
			Link::new("a", "c", "r"),
			Link::new("a", "a", "self"),
		];
		let c = parallel_curvatures(&links);
		assert_eq!(&c[..3], &[-0.3, 0.0, 0.3]);
		assert_eq!(c[3], 0.0);
		assert_eq!(c[4], 0.0);
	}

	#[test]
	fn control_point_is_offset_perpendicular() {
		let curve = EdgeCurve::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 0.3);
		let ctrl = curve.control.unwrap();
		assert!((ctrl.x - 50.0).abs() < EPS);
		assert!((ctrl.y - 30.0).abs() < EPS);
		assert!(EdgeCurve::new(Point::new(0.0, 0.0), Point::new(1.0, 1.0), 0.0).control.is_none());
	}

	#[test]
	fn arrowhead_sits_at_85_percent() {
		let curve = EdgeCurve::new(Point::new(0.0, 0.0), Point::new(0.0, 100.0), 0.0);
		let arrow = curve.arrowhead();
		assert!((arrow.tip.y - 85.0).abs() < EPS);
		assert!((arrow.angle - FRAC_PI_2).abs() < EPS);
	}

	#[test]
	fn self_loop_radius_has_a_floor() {
		let small = self_loop(Point::new(0.0, 0.0), 4.0);
		assert_eq!(small.radius, 20.0);
		assert_eq!(small.center, Point::new(0.0, -20.0));
		let big = self_loop(Point::new(0.0, 0.0), 30.0);
		assert_eq!(big.radius, 38.0);
		let tip = big.arrow.tip;
		assert!(tip.x > 0.0 && tip.y < big.center.y);
	}

	#[test]
	fn wraps_greedily_at_ten_chars() {
		assert_eq!(
			wrap_label("Acme Heavy Industries Ltd", LABEL_MAX_CHARS),
			vec!["Acme Heavy", "Industries", "Ltd"]
		);
		assert_eq!(wrap_label("Supercalifragilistic", 10), vec!["Supercalifragilistic"]);
		assert!(wrap_label("   ", 10).is_empty());
		assert_eq!(label_line_offsets(3, 12.0), vec![-12.0, 0.0, 12.0]);
	}

	#[test]
	fn edge_label_never_upside_down() {
		let leftward = EdgeCurve::new(Point::new(100.0, 0.0), Point::new(0.0, 0.0), 0.0);
		let label = edge_label(&leftward, 30.0, 10.0);
		assert!(label.rotation.abs() <= FRAC_PI_2 + EPS);
		assert_eq!(label.position, Point::new(50.0, 0.0));
		assert_eq!(label.box_width, 34.0);
	}

	#[test]
	fn highlight_overrides_link_color() {
		let mut link = Link::new("a", "b", "r");
		link.color = Some("#123456".into());
		let mut hl = HighlightSet::default();
		assert_eq!(link_stroke(&link, 1.5, "#999", &hl).color, "#123456");
		hl.links.insert(link.key());
		let stroke = link_stroke(&link, 1.5, "#999", &hl);
		assert_eq!(stroke.width, 3.0);
		assert_eq!(stroke.color, ACCENT_COLOR);

		let node = Node::new("a", "A", "t");
		assert_eq!(highlight_ring(&node, 8.0, &hl), None);
		hl.nodes.insert("a".into());
		assert_eq!(highlight_ring(&node, 8.0, &hl), Some(13.0));
	}
}
