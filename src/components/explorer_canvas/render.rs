use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::CanvasState;
use crate::graph::cluster::CLUSTER_KIND;
use crate::graph::explorer::{Explorer, NodeState};
use crate::graph::geometry::{
	ACCENT_COLOR, ARROW_SIZE, EdgeCurve, LABEL_MAX_CHARS, Outline, Point, SHAPE_RADIUS, Shape,
	edge_label, highlight_ring, label_line_offsets, link_stroke, oriented_curvature, self_loop,
	shape_outline, wrap_label,
};
use crate::graph::layout::seeded_unit;
use crate::graph::types::{Link, Node};

const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];
const EDGE_COLOR: &str = "rgba(100, 180, 255, 0.6)";
const BACKGROUND: &str = "#1a1a2e";

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

fn node_color(node: &Node) -> String {
	node.color.clone().unwrap_or_else(|| {
		let i = (seeded_unit(node.group_key(), 0) * COLORS.len() as f64) as usize;
		COLORS[i % COLORS.len()].to_string()
	})
}

pub fn render(state: &CanvasState, explorer: &Explorer, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, explorer, ctx);
	draw_nodes(state, explorer, ctx);
	ctx.restore();
}

fn draw_edges(state: &CanvasState, explorer: &Explorer, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let highlight = explorer.highlight();
	let (line_width, dash, gap) = (1.5 / k, 8.0 / k, 4.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.highlight_t);

	for (i, link) in state.view.links.iter().enumerate() {
		let (Some(p1), Some(p2)) = (state.position(&link.source), state.position(&link.target)) else {
			continue;
		};
		let stroke = link_stroke(link, line_width, EDGE_COLOR, highlight);
		let emphasised = highlight.has_link(link);
		let alpha = if highlight.is_empty() || emphasised { 1.0 } else { 1.0 - 0.75 * t };
		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(&stroke.color);
		ctx.set_fill_style_str(&stroke.color);
		ctx.set_line_width(stroke.width);

		if link.is_self_loop {
			let lp = self_loop(p1, state.node_radius(&link.source));
			ctx.begin_path();
			let _ = ctx.arc(lp.center.x, lp.center.y, lp.radius, 0.0, 2.0 * PI);
			ctx.stroke();
			fill_triangle(ctx, lp.arrow.points(ARROW_SIZE / k.max(0.5)));
			continue;
		}

		let curvature = state.curvatures.get(i).copied().unwrap_or(0.0);
		let curve = EdgeCurve::new(p1, p2, oriented_curvature(link, curvature));
		if emphasised || link.kind == CLUSTER_KIND {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
			ctx.set_line_dash_offset(dash_offset);
		}
		ctx.begin_path();
		ctx.move_to(curve.start.x, curve.start.y);
		match curve.control {
			Some(c) => ctx.quadratic_curve_to(c.x, c.y, curve.end.x, curve.end.y),
			None => ctx.line_to(curve.end.x, curve.end.y),
		}
		ctx.stroke();
		let _ = ctx.set_line_dash(&js_sys::Array::new());

		fill_triangle(ctx, curve.arrowhead().points(ARROW_SIZE / k.max(0.5)));
		if k >= 0.8 && !link.kind.is_empty() {
			draw_edge_label(ctx, link, &curve, k);
		}
	}
	ctx.set_global_alpha(1.0);
}

fn draw_edge_label(ctx: &CanvasRenderingContext2d, link: &Link, curve: &EdgeCurve, k: f64) {
	let font_size = 8.0 / k.max(1.0);
	ctx.set_font(&format!("{}px sans-serif", font_size));
	let width = ctx.measure_text(&link.kind).map(|m| m.width()).unwrap_or(0.0);
	let label = edge_label(curve, width, font_size);

	ctx.save();
	let _ = ctx.translate(label.position.x, label.position.y);
	let _ = ctx.rotate(label.rotation);
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(
		-label.box_width / 2.0,
		-label.box_height / 2.0,
		label.box_width,
		label.box_height,
	);
	ctx.set_fill_style_str("rgba(255, 255, 255, 0.85)");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text(&link.kind, 0.0, 0.0);
	ctx.restore();
}

fn fill_triangle(ctx: &CanvasRenderingContext2d, [tip, left, right]: [Point; 3]) {
	ctx.begin_path();
	ctx.move_to(tip.x, tip.y);
	ctx.line_to(left.x, left.y);
	ctx.line_to(right.x, right.y);
	ctx.close_path();
	ctx.fill();
}

fn trace_outline(ctx: &CanvasRenderingContext2d, outline: &Outline) {
	ctx.begin_path();
	match outline {
		Outline::Circle { center, radius } => {
			let _ = ctx.arc(center.x, center.y, *radius, 0.0, 2.0 * PI);
		}
		Outline::Polygon(points) => {
			if let Some((first, rest)) = points.split_first() {
				ctx.move_to(first.x, first.y);
				for p in rest {
					ctx.line_to(p.x, p.y);
				}
				ctx.close_path();
			}
		}
	}
}

fn draw_nodes(state: &CanvasState, explorer: &Explorer, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let highlight = explorer.highlight();
	let t = ease_out_cubic(state.highlight_t);

	for node in &state.view.nodes {
		let Some(p) = state.position(&node.id) else {
			continue;
		};
		let shape = if node.kind == CLUSTER_KIND {
			Shape::Hexagon
		} else {
			Shape::for_node(node)
		};
		let scale = node.size.max(SHAPE_RADIUS) / SHAPE_RADIUS;
		let radius = SHAPE_RADIUS * scale;
		let dimmed = !highlight.is_empty() && !highlight.has_node(&node.id);
		ctx.set_global_alpha(if dimmed { 1.0 - 0.7 * t } else { 1.0 });

		ctx.save();
		let _ = ctx.translate(p.x, p.y);
		let _ = ctx.scale(scale, scale);
		trace_outline(ctx, &shape_outline(shape, Point::default()));
		ctx.restore();
		ctx.set_fill_style_str(&node_color(node));
		ctx.fill();

		match explorer.node_state(&node.id) {
			NodeState::Selected => {
				ctx.set_stroke_style_str("white");
				ctx.set_line_width(2.0 / k);
				ctx.stroke();
			}
			NodeState::Bordered => {
				ctx.set_stroke_style_str(ACCENT_COLOR);
				ctx.set_line_width(1.5 / k);
				let _ = ctx.set_line_dash(&js_sys::Array::of2(
					&JsValue::from_f64(3.0 / k),
					&JsValue::from_f64(2.0 / k),
				));
				ctx.stroke();
				let _ = ctx.set_line_dash(&js_sys::Array::new());
			}
			NodeState::Hovered | NodeState::Idle => {}
		}

		if let Some(ring) = highlight_ring(node, radius, highlight) {
			ctx.begin_path();
			let _ = ctx.arc(p.x, p.y, ring, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(ACCENT_COLOR);
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}

		let lines = wrap_label(&node.name, LABEL_MAX_CHARS);
		if lines.is_empty() || k < 0.4 {
			continue;
		}
		let font_size = 10.0 / k.max(0.5);
		ctx.set_font(&format!("{}px sans-serif", font_size));
		ctx.set_fill_style_str("rgba(255, 255, 255, 0.85)");
		ctx.set_text_align("left");
		ctx.set_text_baseline("middle");
		for (line, dy) in lines.iter().zip(label_line_offsets(lines.len(), font_size * 1.2)) {
			let _ = ctx.fill_text(line, p.x + radius + 3.0, p.y + dy);
		}
	}
	ctx.set_global_alpha(1.0);
}
