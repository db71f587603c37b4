//! The data collaborator: subgraph fetches and entity autocomplete.

use futures::future::{self, LocalBoxFuture};

use super::types::{GraphData, Link, Node, Subgraph};
use crate::error::FetchError;

/// Remote (or local) provider of subgraphs.
///
/// Implementations run on the UI thread, so futures need not be `Send`.
pub trait SubgraphSource {
	/// A page of the subgraph around `entity_id` (or the query `entity_id`
	/// when it names no entity). Node pages include incoming and outgoing
	/// relationships plus self-loops.
	fn fetch_subgraph<'a>(
		&'a self,
		entity_type: &'a str,
		entity_id: &'a str,
		offset: usize,
		limit: usize,
	) -> LocalBoxFuture<'a, Result<Subgraph, FetchError>>;

	/// Entity labels matching `keyword`, for autocomplete.
	fn search_entities<'a>(
		&'a self,
		entity_type: &'a str,
		keyword: &'a str,
	) -> LocalBoxFuture<'a, Result<Vec<String>, FetchError>>;
}

/// Serves subgraphs out of a fixed graph held in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemorySource {
	graph: GraphData,
}

impl InMemorySource {
	/// Serves pages out of `graph`.
	pub fn new(graph: GraphData) -> Self {
		Self { graph }
	}

	/// The backing graph.
	pub fn graph(&self) -> &GraphData {
		&self.graph
	}

	fn matches_type(node: &Node, entity_type: &str) -> bool {
		entity_type.is_empty() || entity_type == "*" || node.kind == entity_type
	}

	fn links_within(&self, nodes: &[Node]) -> Vec<Link> {
		let ids: std::collections::HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
		self.graph
			.links
			.iter()
			.filter(|l| ids.contains(l.source.as_str()) && ids.contains(l.target.as_str()))
			.cloned()
			.collect()
	}

	fn neighbourhood(&self, center: &Node, offset: usize, limit: usize) -> Subgraph {
		let mut neighbours: Vec<&Node> = Vec::new();
		for link in self.graph.links.iter().filter(|l| l.touches(&center.id)) {
			let other = if link.source == center.id { &link.target } else { &link.source };
			if *other == center.id || neighbours.iter().any(|n| n.id == *other) {
				continue;
			}
			if let Some(node) = self.graph.node(other) {
				neighbours.push(node);
			}
		}

		let total_count = neighbours.len();
		let mut nodes = vec![center.clone()];
		nodes.extend(neighbours.into_iter().skip(offset).take(limit).cloned());
		let links = self
			.links_within(&nodes)
			.into_iter()
			.filter(|l| l.touches(&center.id))
			.collect();
		Subgraph {
			nodes,
			links,
			total_count,
		}
	}

	fn query(&self, entity_type: &str, value: &str, offset: usize, limit: usize) -> Subgraph {
		let needle = value.to_lowercase();
		let hits: Vec<&Node> = self
			.graph
			.nodes
			.iter()
			.filter(|n| Self::matches_type(n, entity_type) && n.name.to_lowercase().contains(&needle))
			.collect();
		let total_count = hits.len();
		let nodes: Vec<Node> = hits.into_iter().skip(offset).take(limit).cloned().collect();
		let links = self.links_within(&nodes);
		Subgraph {
			nodes,
			links,
			total_count,
		}
	}

	fn fetch(&self, entity_type: &str, entity_id: &str, offset: usize, limit: usize) -> Result<Subgraph, FetchError> {
		if let Some(center) = self.graph.node(entity_id) {
			return Ok(self.neighbourhood(center, offset, limit));
		}
		let page = self.query(entity_type, entity_id, offset, limit);
		if page.total_count == 0 {
			return Err(FetchError::NotFound {
				entity_type: entity_type.to_string(),
				id: entity_id.to_string(),
			});
		}
		Ok(page)
	}
}

impl SubgraphSource for InMemorySource {
	fn fetch_subgraph<'a>(
		&'a self,
		entity_type: &'a str,
		entity_id: &'a str,
		offset: usize,
		limit: usize,
	) -> LocalBoxFuture<'a, Result<Subgraph, FetchError>> {
		Box::pin(future::ready(self.fetch(entity_type, entity_id, offset, limit)))
	}

	fn search_entities<'a>(
		&'a self,
		entity_type: &'a str,
		keyword: &'a str,
	) -> LocalBoxFuture<'a, Result<Vec<String>, FetchError>> {
		let needle = keyword.to_lowercase();
		let labels = self
			.graph
			.nodes
			.iter()
			.filter(|n| Self::matches_type(n, entity_type) && n.name.to_lowercase().starts_with(&needle))
			.map(|n| n.name.clone())
			.collect();
		Box::pin(future::ready(Ok(labels)))
	}
}

#[cfg(test)]
mod tests {
	use futures::executor::block_on;

	use super::*;

	fn source() -> InMemorySource {
		let nodes = vec![
			Node::new("a", "Acme", "organization"),
			Node::new("b", "Bolt Works", "organization"),
			Node::new("c", "Crane 7", "equipment"),
			Node::new("d", "Audit 2020", "event"),
		];
		let links = vec![
			Link::new("a", "b", "partner"),
			Link::new("c", "a", "owned_by"),
			Link::new("a", "a", "subsidiary"),
			Link::new("b", "d", "attended"),
		];
		InMemorySource::new(GraphData::new(nodes, links))
	}

	#[test]
	fn node_page_includes_both_directions_and_self_loops() {
		let page = block_on(source().fetch_subgraph("organization", "a", 0, 10)).unwrap();
		assert_eq!(page.total_count, 2);
		assert_eq!(page.nodes.len(), 3);
		assert_eq!(page.links.len(), 3);
		assert!(page.links.iter().any(|l| l.is_self_loop));
	}

	#[test]
	fn node_page_is_paginated() {
		let page = block_on(source().fetch_subgraph("organization", "a", 1, 1)).unwrap();
		assert_eq!(page.nodes.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(), vec!["a", "c"]);
	}

	#[test]
	fn query_by_name_and_type() {
		let page = block_on(source().fetch_subgraph("organization", "o", 0, 10)).unwrap();
		assert_eq!(page.total_count, 1);
		assert_eq!(page.nodes[0].id, "b");
		let err = block_on(source().fetch_subgraph("organization", "zzz", 0, 10)).unwrap_err();
		assert!(matches!(err, FetchError::NotFound { .. }));
	}

	#[test]
	fn autocomplete_matches_prefix() {
		let labels = block_on(source().search_entities("", "a")).unwrap();
		assert_eq!(labels, vec!["Acme", "Audit 2020"]);
	}
}
