use std::collections::HashSet;

use entity_graph_explorer::config::ExplorerConfig;
use entity_graph_explorer::graph::geometry::{MAX_CURVATURE, parallel_curvatures};
use entity_graph_explorer::graph::layout::Bounds;
use entity_graph_explorer::graph::{
	Explorer, GraphData, LayoutKind, Link, LinkKey, Node, Subgraph, cluster, compute_layout, merge,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_graph(max_nodes: usize) -> impl Strategy<Value = GraphData> {
	(1..max_nodes).prop_flat_map(|n| {
		(
			proptest::collection::vec(0u8..6, n),
			proptest::collection::vec((0..n, 0..n), 0..n * 2),
		)
			.prop_map(|(categories, edges)| {
				let nodes = categories
					.iter()
					.enumerate()
					.map(|(i, c)| Node::new(format!("n{i}"), format!("Node {i}"), "entity").with_category(format!("c{c}")))
					.collect();
				let links = edges
					.into_iter()
					.map(|(s, t)| Link::new(format!("n{s}"), format!("n{t}"), "rel"))
					.collect();
				GraphData::new(nodes, links)
			})
	})
}

#[derive(Clone, Debug)]
enum Step {
	Explore(usize),
	First,
	Prev,
	Next,
	Last,
	GoTo(usize),
}

fn arb_step() -> impl Strategy<Value = Step> {
	prop_oneof![
		(0usize..50).prop_map(Step::Explore),
		Just(Step::First),
		Just(Step::Prev),
		Just(Step::Next),
		Just(Step::Last),
		(0usize..20).prop_map(Step::GoTo),
	]
}

fn seeded_explorer() -> Explorer {
	let mut explorer = Explorer::new(ExplorerConfig::default());
	let request = explorer.begin_search("entity", "seed");
	let seed = Subgraph {
		nodes: vec![Node::new("seed", "Seed", "entity")],
		links: Vec::new(),
		total_count: 1,
	};
	explorer.complete(&request.ticket, Ok(seed)).unwrap();
	explorer
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
	#[test]
	fn clustering_conserves_nodes(graph in arb_graph(160), threshold in 0usize..120) {
		let view = cluster(&graph.nodes, &graph.links, threshold);
		if graph.nodes.len() <= threshold {
			prop_assert!(view.clusters.is_empty());
			prop_assert_eq!(&view.nodes, &graph.nodes);
			prop_assert_eq!(&view.links, &graph.links);
		} else {
			let total: usize = view.clusters.iter().map(|c| c.node_count).sum();
			prop_assert_eq!(total, graph.nodes.len());
			prop_assert_eq!(view.nodes.len(), view.clusters.len());
			for c in &view.clusters {
				prop_assert!((15.0..=30.0).contains(&c.size));
				prop_assert_eq!(c.child_nodes.len(), c.node_count);
			}
		}
	}

	#[test]
	fn cluster_links_are_unique_and_cross_cluster(graph in arb_graph(160)) {
		let view = cluster(&graph.nodes, &graph.links, 0);
		let mut keys = HashSet::new();
		for link in &view.links {
			prop_assert_ne!(&link.source, &link.target);
			prop_assert!(keys.insert(LinkKey::new(&link.source, &link.target)));
		}
	}

	#[test]
	fn merge_is_idempotent(current in arb_graph(30), incoming in arb_graph(30)) {
		let once = merge(&current, &incoming);
		let twice = merge(&once, &incoming);
		prop_assert_eq!(&once, &twice);

		let ids: HashSet<&str> = once.nodes.iter().map(|n| n.id.as_str()).collect();
		prop_assert_eq!(ids.len(), once.nodes.len());
	}

	#[test]
	fn merge_keeps_existing_nodes_first(current in arb_graph(30), incoming in arb_graph(30)) {
		let merged = merge(&current, &incoming);
		prop_assert_eq!(&merged.nodes[..current.nodes.len()], &current.nodes[..]);
	}

	#[test]
	fn parallel_curvatures_are_bounded_and_symmetric(count in 1usize..8, flips in proptest::collection::vec(any::<bool>(), 8)) {
		let links: Vec<Link> = (0..count)
			.map(|i| if flips[i] { Link::new("b", "a", "rel") } else { Link::new("a", "b", "rel") })
			.collect();
		let curvatures = parallel_curvatures(&links);
		prop_assert_eq!(curvatures.len(), count);
		for c in &curvatures {
			prop_assert!(c.abs() <= MAX_CURVATURE + 1e-12);
		}
		let sum: f64 = curvatures.iter().sum();
		prop_assert!(sum.abs() < 1e-9);
		if count == 1 {
			prop_assert_eq!(curvatures[0], 0.0);
		}
	}

	#[test]
	fn pinned_layouts_stay_in_bounds(
		n in 0usize..120,
		kind_index in 0usize..LayoutKind::ALL.len(),
		width in 200.0f64..1600.0,
		height in 200.0f64..1200.0,
		spacing in 20.0f64..200.0,
	) {
		let kind = LayoutKind::ALL[kind_index];
		let mut nodes: Vec<Node> = (0..n).map(|i| Node::new(format!("n{i}"), "", "entity")).collect();
		compute_layout(kind, &mut nodes, width, height, spacing);
		let bounds = Bounds::for_container(width, height);
		for node in &nodes {
			if kind.is_pinned() {
				let p = (node.fx.unwrap(), node.fy.unwrap());
				prop_assert!(p.0.is_finite() && p.1.is_finite());
				prop_assert!(bounds.contains(p), "{kind} put {} at {p:?}", node.id);
			} else {
				prop_assert!(node.fx.is_none() && node.fy.is_none());
			}
		}
	}

	#[test]
	fn history_cursor_stays_valid(steps in proptest::collection::vec(arb_step(), 1..40)) {
		let mut explorer = seeded_explorer();
		for (k, step) in steps.into_iter().enumerate() {
			match step {
				Step::Explore(i) => {
					let nodes = &explorer.graph().nodes;
					let center = nodes[i % nodes.len()].id.clone();
					let request = explorer.begin_explore(&center).unwrap();
					let page = Subgraph {
						nodes: vec![Node::new(format!("x{k}"), format!("X {k}"), "entity")],
						links: vec![Link::new(center.clone(), format!("x{k}"), "rel")],
						total_count: 1,
					};
					let before = explorer.history().cursor();
					explorer.complete(&request.ticket, Ok(page)).unwrap();
					prop_assert_eq!(explorer.history().cursor(), before + 1);
					prop_assert_eq!(explorer.history().len(), before + 2);
				}
				Step::First => { explorer.first().unwrap(); }
				Step::Prev => { explorer.prev().unwrap(); }
				Step::Next => { explorer.next().unwrap(); }
				Step::Last => { explorer.last().unwrap(); }
				Step::GoTo(page) => { explorer.go_to(page).unwrap(); }
			}
			let history = explorer.history();
			prop_assert!(history.cursor() < history.len());
			prop_assert_eq!(&history.current().unwrap().data, explorer.graph());
		}
	}
}
