//! Dedup-merge of freshly fetched subgraphs into the live graph.

use std::collections::HashSet;

use log::{debug, warn};

use super::types::{GraphData, LinkKey};

/// Drops links whose endpoints are in neither `graph` nor `known`, and fixes
/// up the self-loop flag. Returns the number of links dropped.
pub fn sanitize(graph: &mut GraphData, known: &GraphData) -> usize {
	let mut ids = graph.node_ids();
	ids.extend(known.node_ids());
	let ids: HashSet<String> = ids.into_iter().map(str::to_string).collect();

	let before = graph.links.len();
	graph
		.links
		.retain(|l| ids.contains(&l.source) && ids.contains(&l.target));
	for link in &mut graph.links {
		link.is_self_loop = link.source == link.target;
	}
	let dropped = before - graph.links.len();
	if dropped > 0 {
		warn!("dropped {dropped} links with unknown endpoints");
	}
	dropped
}

/// Merges `incoming` into `current`. Existing nodes win on id collisions;
/// links are deduplicated by unordered endpoint pair, so re-adding a
/// relationship in either direction is a no-op.
pub fn merge(current: &GraphData, incoming: &GraphData) -> GraphData {
	let mut merged = current.clone();
	let mut node_ids: HashSet<String> = current.nodes.iter().map(|n| n.id.clone()).collect();
	let mut seen: HashSet<LinkKey> = current.links.iter().map(|l| l.key()).collect();

	for node in &incoming.nodes {
		if node_ids.insert(node.id.clone()) {
			merged.nodes.push(node.clone());
		}
	}
	for link in &incoming.links {
		if seen.insert(link.key()) {
			merged.links.push(link.clone());
		}
	}

	debug!(
		"merged {}+{} nodes into {}, {}+{} links into {}",
		current.nodes.len(),
		incoming.nodes.len(),
		merged.nodes.len(),
		current.links.len(),
		incoming.links.len(),
		merged.links.len()
	);
	merged
}

/// [`merge`] where either side may be missing.
pub fn merge_optional(current: Option<&GraphData>, incoming: Option<&GraphData>) -> GraphData {
	match (current, incoming) {
		(Some(c), Some(i)) => merge(c, i),
		(Some(g), None) | (None, Some(g)) => g.clone(),
		(None, None) => GraphData::default(),
	}
}
