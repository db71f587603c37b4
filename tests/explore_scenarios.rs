use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use entity_graph_explorer::config::ExplorerConfig;
use entity_graph_explorer::error::{ExploreError, FetchError};
use entity_graph_explorer::graph::{
	ClickAction, ClickResolver, ExploreSession, Explorer, GraphData, InMemorySource, LayoutKind, Link, Node,
	Subgraph, SubgraphSource, VirtualTimer, cluster, compute_layout,
};
use futures::executor::block_on;
use futures::future::{self, LocalBoxFuture};

fn entity(id: impl Into<String>) -> Node {
	let id = id.into();
	Node::new(id.clone(), format!("Entity {id}"), "organization")
}

fn ring(n: usize, extra: usize) -> GraphData {
	let nodes = (0..n).map(|i| entity(format!("n{i}"))).collect();
	let mut links: Vec<Link> = (0..n).map(|i| Link::new(format!("n{i}"), format!("n{}", (i + 1) % n), "rel")).collect();
	links.extend((0..extra).map(|i| Link::new(format!("n{i}"), format!("n{}", (i + 3) % n), "rel")));
	GraphData::new(nodes, links)
}

/// A source whose every fetch fails.
struct Unreachable;

impl SubgraphSource for Unreachable {
	fn fetch_subgraph<'a>(
		&'a self,
		_entity_type: &'a str,
		_entity_id: &'a str,
		_offset: usize,
		_limit: usize,
	) -> LocalBoxFuture<'a, Result<Subgraph, FetchError>> {
		Box::pin(future::ready(Err(FetchError::Transport("connection refused".into()))))
	}

	fn search_entities<'a>(
		&'a self,
		_entity_type: &'a str,
		_keyword: &'a str,
	) -> LocalBoxFuture<'a, Result<Vec<String>, FetchError>> {
		Box::pin(future::ready(Err(FetchError::Transport("connection refused".into()))))
	}
}

fn session_over(source: impl SubgraphSource + 'static) -> ExploreSession {
	ExploreSession::new(
		Rc::new(RefCell::new(Explorer::new(ExplorerConfig::default()))),
		Rc::new(source),
	)
}

/// One hub organization with `spokes` neighbouring organizations.
fn hub(spokes: usize) -> GraphData {
	let mut nodes = vec![Node::new("hub", "Hub Holdings", "organization")];
	nodes.extend((0..spokes).map(|i| Node::new(format!("s{i}"), format!("Spoke {i}"), "organization")));
	let links = (0..spokes).map(|i| Link::new("hub", format!("s{i}"), "supplies")).collect();
	GraphData::new(nodes, links)
}

#[test]
fn small_graph_is_not_clustered() {
	let graph = ring(10, 6);
	assert_eq!(graph.links.len(), 16);

	let view = cluster(&graph.nodes, &graph.links, 100);
	assert!(view.clusters.is_empty());
	assert_eq!(view.nodes, graph.nodes);
	assert_eq!(view.links, graph.links);
}

#[test]
fn dense_graph_collapses_into_one_cluster_per_category() {
	let categories = ["agency", "contractor", "lab", "vendor", "ngo"];
	let nodes: Vec<Node> = (0..150)
		.map(|i| entity(format!("n{i}")).with_category(categories[i % categories.len()]))
		.collect();

	let view = cluster(&nodes, &[], 100);
	assert_eq!(view.clusters.len(), 5);
	for c in &view.clusters {
		assert_eq!(c.node_count, 30);
		assert!((15.0..=30.0).contains(&c.size));
	}
	assert_eq!(view.clusters.iter().map(|c| c.node_count).sum::<usize>(), 150);
}

#[test]
fn explore_merges_overlapping_page_and_extends_history() {
	let mut explorer = Explorer::new(ExplorerConfig::default());
	let search = explorer.begin_search("organization", "Entity");
	let start = ring(10, 6);
	explorer
		.complete(
			&search.ticket,
			Ok(Subgraph {
				nodes: start.nodes,
				links: start.links,
				total_count: 10,
			}),
		)
		.unwrap();
	assert_eq!(explorer.history().len(), 1);

	// 20 nodes back, 5 of which are already on screen.
	let nodes: Vec<Node> = (5..10).map(|i| entity(format!("n{i}"))).chain((0..15).map(|i| entity(format!("m{i}")))).collect();
	let links = (0..15).map(|i| Link::new("n0", format!("m{i}"), "rel")).collect();
	let explore = explorer.begin_explore("n0").unwrap();
	explorer
		.complete(
			&explore.ticket,
			Ok(Subgraph {
				nodes,
				links,
				total_count: 20,
			}),
		)
		.unwrap();

	assert_eq!(explorer.graph().nodes.len(), 25);
	assert_eq!(explorer.history().len(), 2);
	assert_eq!(explorer.history().cursor(), 1);
	assert_eq!(explorer.history().current().unwrap().explored_node.as_deref(), Some("n0"));
	assert_eq!(explorer.pagination().last_explored_node.as_deref(), Some("n0"));
}

#[test]
fn double_click_explores_once_and_never_selects() {
	let mut clicks = ClickResolver::new(VirtualTimer::default(), Duration::from_millis(300));
	let mut fired = Vec::new();

	fired.extend(clicks.primary_click("n1"));
	fired.extend(clicks.advance(Duration::from_millis(120)));
	fired.extend(clicks.primary_click("n1"));
	fired.extend(clicks.advance(Duration::from_millis(1000)));

	assert_eq!(fired, vec![ClickAction::Explore("n1".into())]);
	assert!(!clicks.is_armed());
}

#[test]
fn single_click_selects_after_the_window() {
	let mut clicks = ClickResolver::new(VirtualTimer::default(), Duration::from_millis(300));
	assert_eq!(clicks.primary_click("n1"), None);
	assert!(clicks.advance(Duration::from_millis(299)).is_empty());
	assert_eq!(clicks.advance(Duration::from_millis(1)), vec![ClickAction::Select("n1".into())]);
}

#[test]
fn grid_of_nine_fills_three_by_three() {
	let mut nodes: Vec<Node> = (0..9).map(|i| entity(format!("n{i}"))).collect();
	compute_layout(LayoutKind::Grid, &mut nodes, 900.0, 900.0, 100.0);

	let mut xs: Vec<i64> = Vec::new();
	let mut ys: Vec<i64> = Vec::new();
	for node in &nodes {
		let (x, y) = (node.fx.unwrap(), node.fy.unwrap());
		assert!(x.abs() <= 225.0 && y.abs() <= 225.0, "{} at ({x}, {y})", node.id);
		xs.push(x.round() as i64);
		ys.push(y.round() as i64);
	}
	xs.sort_unstable();
	xs.dedup();
	ys.sort_unstable();
	ys.dedup();
	assert_eq!(xs.len(), 3);
	assert_eq!(ys.len(), 3);
}

#[test]
fn session_explores_and_pages_through_a_hub() {
	let session = session_over(InMemorySource::new(hub(120)));

	block_on(session.search("organization", "Hub")).unwrap();
	assert_eq!(session.explorer().borrow().graph().nodes.len(), 1);

	let outcome = block_on(session.explore("hub")).unwrap();
	assert_eq!(outcome.total_count, 120);
	{
		let explorer = session.explorer().borrow();
		assert_eq!(explorer.graph().nodes.len(), 51);
		assert_eq!(explorer.pagination().displayed_count, 50);
		assert!(explorer.pagination().has_more());
	}

	let pages = block_on(session.load_remaining()).unwrap();
	assert_eq!(pages, 2);

	let explorer = session.explorer().borrow();
	assert_eq!(explorer.graph().nodes.len(), 121);
	assert_eq!(explorer.graph().links.len(), 120);
	assert_eq!(explorer.pagination().displayed_count, 120);
	assert!(!explorer.pagination().has_more());
	// Paging amends the explore step rather than adding steps.
	assert_eq!(explorer.history().len(), 2);
	assert_eq!(explorer.history().current().unwrap().data.nodes.len(), 121);
}

#[test]
fn load_more_without_a_query_is_rejected() {
	let session = session_over(InMemorySource::new(hub(3)));
	assert!(matches!(block_on(session.load_more()), Err(ExploreError::NoQuery)));
}

#[test]
fn failed_fetch_leaves_graph_and_history_alone() {
	let session = session_over(Unreachable);
	let err = block_on(session.search("organization", "Acme")).unwrap_err();
	assert!(matches!(err, ExploreError::Fetch(FetchError::Transport(_))));

	let explorer = session.explorer().borrow();
	assert!(!explorer.is_loading());
	assert!(explorer.graph().nodes.is_empty());
	assert!(explorer.history().is_empty());
}

#[test]
fn unknown_search_reports_not_found() {
	let session = session_over(InMemorySource::new(hub(3)));
	let err = block_on(session.search("organization", "Nobody")).unwrap_err();
	assert!(matches!(err, ExploreError::Fetch(FetchError::NotFound { .. })));
}

#[test]
fn superseded_response_is_ignored() {
	let mut explorer = Explorer::new(ExplorerConfig::default());
	let first = explorer.begin_search("organization", "first");
	let second = explorer.begin_search("organization", "second");

	let page = |id: &str| Subgraph {
		nodes: vec![entity(id)],
		links: Vec::new(),
		total_count: 1,
	};
	assert!(matches!(
		explorer.complete(&first.ticket, Ok(page("a"))),
		Err(ExploreError::Stale { .. })
	));
	assert!(explorer.is_loading());

	explorer.complete(&second.ticket, Ok(page("b"))).unwrap();
	assert!(!explorer.is_loading());
	assert!(explorer.graph().contains("b"));
	assert!(!explorer.graph().contains("a"));
}

#[test]
fn suggest_matches_name_prefixes() {
	let session = session_over(InMemorySource::new(hub(12)));
	let mut labels = block_on(session.suggest("organization", "spoke 1")).unwrap();
	labels.sort();
	assert_eq!(labels, vec!["Spoke 1", "Spoke 10", "Spoke 11"]);
}

#[test]
fn cluster_nodes_select_instead_of_exploring() {
	let session = session_over(InMemorySource::new(hub(120)));
	block_on(session.search("organization", "Hub")).unwrap();
	block_on(session.explore("hub")).unwrap();
	block_on(session.load_remaining()).unwrap();

	let id = session.explorer().borrow().view().clusters[0].id.clone();
	assert_eq!(id, "cluster:organization");

	let err = block_on(session.explore(&id)).unwrap_err();
	assert_eq!(err, ExploreError::Cluster(id.clone()));
	assert!(!session.explorer().borrow().is_loading());

	let mut explorer = session.explorer().borrow_mut();
	let action = explorer.route(ClickAction::Explore(id.clone()));
	assert_eq!(action, ClickAction::Select(id.clone()));
	explorer.select(&id).unwrap();
	assert_eq!(explorer.selected(), Some(id.as_str()));
	assert_eq!(explorer.history().len(), 2);
}
