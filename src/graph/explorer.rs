//! Exploration state: the live graph, its history of explore steps, batch
//! pagination, selection and highlight. Every mutation is a named transition.
//!
//! Fetches are split in two: `begin_*` validates and hands back a
//! [`FetchRequest`], and [`Explorer::complete`] applies the response. Only
//! one fetch is in flight at a time; a search supersedes whatever was pending
//! and the superseded response is dropped when it arrives.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;

use super::click::ClickAction;
use super::cluster::{ClusteredGraph, cluster};
use super::merge::{merge, sanitize};
use super::types::{GraphData, HighlightSet, NodeId, Subgraph};
use crate::config::ExplorerConfig;
use crate::error::{ExploreError, FetchError, Result};

/// One step of exploration history.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExploreSnapshot {
	/// Graph as it stood after this step.
	pub data: GraphData,
	/// `Search: <value>`, `Explore: <name>` and so on.
	pub label: String,
	/// Node explored in this step, if any.
	pub explored_node: Option<NodeId>,
	/// When the step was taken.
	pub timestamp: DateTime<Utc>,
}

impl ExploreSnapshot {
	/// Stamps the snapshot with the current time.
	pub fn new(data: GraphData, label: impl Into<String>, explored_node: Option<NodeId>) -> Self {
		Self {
			data,
			label: label.into(),
			explored_node,
			timestamp: Utc::now(),
		}
	}
}

/// Snapshots with a cursor. When non-empty, `cursor < len`.
#[derive(Clone, Debug, Default)]
pub struct ExploreHistory {
	snapshots: Vec<ExploreSnapshot>,
	cursor: usize,
}

impl ExploreHistory {
	/// Number of snapshots.
	pub fn len(&self) -> usize {
		self.snapshots.len()
	}

	/// Whether nothing has been searched yet.
	pub fn is_empty(&self) -> bool {
		self.snapshots.is_empty()
	}

	/// Index of the displayed snapshot.
	pub fn cursor(&self) -> usize {
		self.cursor
	}

	/// All snapshots, oldest first.
	pub fn snapshots(&self) -> &[ExploreSnapshot] {
		&self.snapshots
	}

	/// The displayed snapshot.
	pub fn current(&self) -> Option<&ExploreSnapshot> {
		self.snapshots.get(self.cursor)
	}

	fn current_mut(&mut self) -> Option<&mut ExploreSnapshot> {
		self.snapshots.get_mut(self.cursor)
	}

	fn reset(&mut self, first: ExploreSnapshot) {
		self.snapshots = vec![first];
		self.cursor = 0;
	}

	/// Appends after the cursor, discarding any snapshots beyond it.
	fn push(&mut self, snapshot: ExploreSnapshot) {
		if !self.snapshots.is_empty() {
			self.snapshots.truncate(self.cursor + 1);
		}
		self.snapshots.push(snapshot);
		self.cursor = self.snapshots.len() - 1;
	}

	fn go_to(&mut self, page: usize) -> Option<&ExploreSnapshot> {
		if self.snapshots.is_empty() {
			return None;
		}
		self.cursor = page.min(self.snapshots.len() - 1);
		self.current()
	}
}

/// What a load-more request fetches against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageTarget {
	/// Entity type of the query.
	pub entity_type: String,
	/// Searched value, or the explored node's id.
	pub entity_id: String,
}

/// How much of the active query has been fetched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchPagination {
	/// Results shown so far.
	pub displayed_count: usize,
	/// Results the source reported in total.
	pub total_count: usize,
	/// Node of the latest explore step.
	pub last_explored_node: Option<NodeId>,
	/// Offset of the next page.
	pub offset: usize,
	/// Query that load-more continues.
	pub target: Option<PageTarget>,
}

impl BatchPagination {
	/// Whether another page can be fetched.
	pub fn has_more(&self) -> bool {
		self.target.is_some() && self.displayed_count < self.total_count
	}
}

/// Which transition a fetch belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchKind {
	/// Replaces the graph and restarts history.
	Search {
		/// Entity type searched.
		entity_type: String,
		/// Keyword or id searched for.
		value: String,
	},
	/// Merges a node's neighbourhood and adds a history step.
	Explore {
		/// Node being explored.
		node: NodeId,
		/// Its display name, used for the history label.
		name: String,
	},
	/// Merges the next page into the current step.
	LoadMore,
}

/// Correlates a response with the request that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
	/// Value of the generation counter when the fetch was issued.
	pub generation: u64,
	/// What the response will be applied as.
	pub kind: FetchKind,
}

/// A fetch the host should perform and hand back to [`Explorer::complete`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
	/// Pass back unchanged with the response.
	pub ticket: FetchTicket,
	/// Entity type to fetch.
	pub entity_type: String,
	/// Entity id or search keyword.
	pub entity_id: String,
	/// First result to return.
	pub offset: usize,
	/// Page size.
	pub limit: usize,
}

/// Summary of an applied response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOutcome {
	/// Nodes new to the live graph.
	pub added_nodes: usize,
	/// Links new to the live graph.
	pub added_links: usize,
	/// Total reported by the source.
	pub total_count: usize,
}

/// How a node should be drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
	/// Nothing special.
	Idle,
	/// Under the pointer.
	Hovered,
	/// Open in the details panel.
	Selected,
	/// The node most recently explored.
	Bordered,
}

/// Owns the live graph and every exploration transition.
pub struct Explorer {
	config: ExplorerConfig,
	graph: GraphData,
	history: ExploreHistory,
	pagination: BatchPagination,
	highlight: HighlightSet,
	hovered: Option<NodeId>,
	selected: Option<NodeId>,
	loading: bool,
	generation: u64,
	revision: u64,
}

impl Explorer {
	/// An empty explorer.
	pub fn new(config: ExplorerConfig) -> Self {
		Self {
			config,
			graph: GraphData::default(),
			history: ExploreHistory::default(),
			pagination: BatchPagination::default(),
			highlight: HighlightSet::default(),
			hovered: None,
			selected: None,
			loading: false,
			generation: 0,
			revision: 0,
		}
	}

	/// Active config.
	pub fn config(&self) -> &ExplorerConfig {
		&self.config
	}

	/// The live graph.
	pub fn graph(&self) -> &GraphData {
		&self.graph
	}

	/// Explore steps.
	pub fn history(&self) -> &ExploreHistory {
		&self.history
	}

	/// Paging state of the active query.
	pub fn pagination(&self) -> &BatchPagination {
		&self.pagination
	}

	/// Nodes and links drawn emphasized.
	pub fn highlight(&self) -> &HighlightSet {
		&self.highlight
	}

	/// Selected node, if any.
	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	/// Hovered node, if any.
	pub fn hovered(&self) -> Option<&str> {
		self.hovered.as_deref()
	}

	/// Whether a fetch is in flight.
	pub fn is_loading(&self) -> bool {
		self.loading
	}

	/// Bumped whenever the graph's node/link set changes.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	/// The graph as it should be drawn: clustered when above the threshold.
	pub fn view(&self) -> ClusteredGraph {
		cluster(&self.graph.nodes, &self.graph.links, self.config.cluster_threshold)
	}

	/// Drawing state of `id`; selection wins over border, border over hover.
	pub fn node_state(&self, id: &str) -> NodeState {
		if self.selected.as_deref() == Some(id) {
			NodeState::Selected
		} else if self.pagination.last_explored_node.as_deref() == Some(id) {
			NodeState::Bordered
		} else if self.hovered.as_deref() == Some(id) {
			NodeState::Hovered
		} else {
			NodeState::Idle
		}
	}

	fn touch(&mut self) {
		self.revision += 1;
	}

	fn issue(&mut self, kind: FetchKind, target: PageTarget, offset: usize) -> FetchRequest {
		self.generation += 1;
		self.loading = true;
		FetchRequest {
			ticket: FetchTicket {
				generation: self.generation,
				kind,
			},
			entity_type: target.entity_type,
			entity_id: target.entity_id,
			offset,
			limit: self.config.page_size,
		}
	}

	/// Starts a new query. Allowed while loading: it supersedes the pending fetch.
	pub fn begin_search(&mut self, entity_type: &str, value: &str) -> FetchRequest {
		if self.loading {
			debug!("search for {value:?} supersedes generation {}", self.generation);
		}
		let target = PageTarget {
			entity_type: entity_type.to_string(),
			entity_id: value.to_string(),
		};
		self.issue(
			FetchKind::Search {
				entity_type: entity_type.to_string(),
				value: value.to_string(),
			},
			target,
			0,
		)
	}

	/// Starts fetching a node's neighbourhood. Rejected while loading and for
	/// clusters, which have no backing entity.
	pub fn begin_explore(&mut self, node_id: &str) -> Result<FetchRequest> {
		if self.loading {
			return Err(ExploreError::Busy);
		}
		if self.is_cluster(node_id) {
			return Err(ExploreError::Cluster(node_id.to_string()));
		}
		let node = self
			.graph
			.node(node_id)
			.ok_or_else(|| ExploreError::UnknownNode(node_id.to_string()))?;
		let kind = FetchKind::Explore {
			node: node.id.clone(),
			name: node.name.clone(),
		};
		let target = PageTarget {
			entity_type: node.kind.clone(),
			entity_id: node.id.clone(),
		};
		Ok(self.issue(kind, target, 0))
	}

	/// Requests the next page of the active query.
	pub fn begin_load_more(&mut self) -> Result<FetchRequest> {
		if self.loading {
			return Err(ExploreError::Busy);
		}
		let target = self.pagination.target.clone().ok_or(ExploreError::NoQuery)?;
		if !self.pagination.has_more() {
			return Err(ExploreError::Exhausted(self.pagination.total_count));
		}
		let offset = self.pagination.offset;
		Ok(self.issue(FetchKind::LoadMore, target, offset))
	}

	/// Applies the response for `ticket`. Failures leave the graph and history
	/// untouched; responses from a superseded generation are ignored.
	pub fn complete(
		&mut self,
		ticket: &FetchTicket,
		response: std::result::Result<Subgraph, FetchError>,
	) -> Result<FetchOutcome> {
		if ticket.generation != self.generation {
			warn!(
				"ignoring stale response (generation {}, current {})",
				ticket.generation, self.generation
			);
			return Err(ExploreError::Stale {
				got: ticket.generation,
				current: self.generation,
			});
		}
		self.loading = false;
		let subgraph = response.inspect_err(|e| warn!("fetch failed: {e}"))?;
		let total_count = subgraph.total_count;
		let limit = self.config.page_size;

		let (before_nodes, before_links) = (self.graph.nodes.len(), self.graph.links.len());
		match &ticket.kind {
			FetchKind::Search { entity_type, value } => {
				let mut page = subgraph.into_graph();
				sanitize(&mut page, &GraphData::default());
				self.graph = merge(&GraphData::default(), &page);
				self.history
					.reset(ExploreSnapshot::new(self.graph.clone(), format!("Search: {value}"), None));
				self.pagination = BatchPagination {
					displayed_count: limit.min(total_count),
					total_count,
					last_explored_node: None,
					offset: limit,
					target: Some(PageTarget {
						entity_type: entity_type.clone(),
						entity_id: value.clone(),
					}),
				};
				self.selected = None;
				self.hovered = None;
				self.highlight.clear();
				info!("search {value:?}: {} nodes of {total_count}", self.graph.nodes.len());
				let outcome = FetchOutcome {
					added_nodes: self.graph.nodes.len(),
					added_links: self.graph.links.len(),
					total_count,
				};
				self.touch();
				return Ok(outcome);
			}
			FetchKind::Explore { node, name } => {
				let mut page = subgraph.into_graph();
				sanitize(&mut page, &self.graph);
				self.graph = merge(&self.graph, &page);
				self.history.push(ExploreSnapshot::new(
					self.graph.clone(),
					format!("Explore: {name}"),
					Some(node.clone()),
				));
				let entity_type = self.graph.node(node).map(|n| n.kind.clone()).unwrap_or_default();
				self.pagination = BatchPagination {
					displayed_count: limit.min(total_count),
					total_count,
					last_explored_node: Some(node.clone()),
					offset: limit,
					target: Some(PageTarget {
						entity_type,
						entity_id: node.clone(),
					}),
				};
				info!(
					"explored {node}: history {}/{}",
					self.history.cursor() + 1,
					self.history.len()
				);
			}
			FetchKind::LoadMore => {
				let mut page = subgraph.into_graph();
				sanitize(&mut page, &self.graph);
				self.graph = merge(&self.graph, &page);
				if let Some(current) = self.history.current_mut() {
					current.data = self.graph.clone();
				}
				self.pagination.offset += limit;
				self.pagination.total_count = total_count;
				self.pagination.displayed_count = self.pagination.offset.min(total_count);
				info!(
					"loaded more: {}/{} displayed",
					self.pagination.displayed_count, total_count
				);
			}
		}

		self.refresh_hover();
		self.touch();
		Ok(FetchOutcome {
			added_nodes: self.graph.nodes.len() - before_nodes,
			added_links: self.graph.links.len() - before_links,
			total_count,
		})
	}

	/// Whether `id` is a synthesized cluster node of the drawn view.
	pub fn is_cluster(&self, id: &str) -> bool {
		!self.graph.contains(id) && self.view().clusters.iter().any(|c| c.id == id)
	}

	/// Neighbourhood of a drawn node: an entity in the live graph, or a
	/// cluster in the clustered view.
	fn neighbourhood(&self, id: &str) -> Option<HighlightSet> {
		if self.graph.contains(id) {
			return Some(HighlightSet::around(&self.graph, id));
		}
		let view = self.view();
		view.clusters
			.iter()
			.any(|c| c.id == id)
			.then(|| HighlightSet::around(&view.graph(), id))
	}

	/// What a click on a drawn node does. Clusters cannot be fetched, so
	/// exploring one selects it instead.
	pub fn route(&self, action: ClickAction) -> ClickAction {
		match action {
			ClickAction::Explore(id) | ClickAction::ContextExplore(id) if self.is_cluster(&id) => {
				ClickAction::Select(id)
			}
			other => other,
		}
	}

	/// Pointer entered `node`, or left every node when `None`.
	pub fn hover(&mut self, node: Option<&str>) {
		if self.hovered.as_deref() == node {
			return;
		}
		self.hovered = None;
		self.highlight.clear();
		if let Some(id) = node {
			if let Some(set) = self.neighbourhood(id) {
				self.highlight = set;
				self.hovered = Some(id.to_string());
			}
		}
	}

	/// Recomputes the hover highlight after the graph changed under the pointer.
	fn refresh_hover(&mut self) {
		if let Some(id) = self.hovered.take() {
			self.highlight.clear();
			self.hover(Some(&id));
		}
	}

	/// Selects an entity or a cluster node.
	pub fn select(&mut self, node: &str) -> Result<()> {
		if !self.graph.contains(node) && !self.is_cluster(node) {
			return Err(ExploreError::UnknownNode(node.to_string()));
		}
		debug!("selected {node}");
		self.selected = Some(node.to_string());
		Ok(())
	}

	/// Closes the details panel.
	pub fn clear_selection(&mut self) {
		self.selected = None;
	}

	/// Highlights the selected node's neighbourhood and returns its id so the
	/// host can recenter on it.
	pub fn focus(&mut self) -> Option<NodeId> {
		let id = self.selected.clone()?;
		self.highlight = self.neighbourhood(&id)?;
		Some(id)
	}

	/// Deletes the node and its links from the live graph. History is not touched.
	pub fn remove_node(&mut self, node: &str) -> Result<()> {
		if self.is_cluster(node) {
			return Err(ExploreError::Cluster(node.to_string()));
		}
		if !self.graph.remove_node(node) {
			return Err(ExploreError::UnknownNode(node.to_string()));
		}
		if self.selected.as_deref() == Some(node) {
			self.selected = None;
		}
		if self.hovered.as_deref() == Some(node) {
			self.hovered = None;
		}
		self.highlight.nodes.remove(node);
		self.highlight.links.retain(|k| k.a != node && k.b != node);
		self.refresh_hover();
		self.touch();
		Ok(())
	}

	/// Recolors and/or resizes one node in the live graph and the active snapshot.
	pub fn restyle_node(&mut self, node: &str, color: Option<&str>, size: Option<f64>) -> Result<()> {
		let mut found = false;
		let current = self.history.current_mut().map(|s| &mut s.data);
		for graph in std::iter::once(&mut self.graph).chain(current) {
			if let Some(n) = graph.node_mut(node) {
				found = true;
				if let Some(color) = color {
					n.color = Some(color.to_string());
				}
				if let Some(size) = size {
					n.size = size;
				}
			}
		}
		if !found {
			return Err(ExploreError::UnknownNode(node.to_string()));
		}
		self.touch();
		Ok(())
	}

	/// Recolors every node in `category` (or of that type when uncategorised).
	/// Returns how many live nodes changed.
	pub fn restyle_category(&mut self, category: &str, color: &str) -> usize {
		let mut changed = 0;
		for n in self.graph.nodes.iter_mut().filter(|n| n.group_key() == category) {
			n.color = Some(color.to_string());
			changed += 1;
		}
		if let Some(current) = self.history.current_mut() {
			for n in current.data.nodes.iter_mut().filter(|n| n.group_key() == category) {
				n.color = Some(color.to_string());
			}
		}
		if changed > 0 {
			self.touch();
		}
		changed
	}

	/// Moves the history cursor (clamped) and shows that snapshot's graph.
	pub fn go_to(&mut self, page: usize) -> Result<usize> {
		let data = self.history.go_to(page).ok_or(ExploreError::NoQuery)?.data.clone();
		self.graph = data;
		self.selected = None;
		self.hovered = None;
		self.highlight.clear();
		self.touch();
		info!("history {}/{}", self.history.cursor() + 1, self.history.len());
		Ok(self.history.cursor())
	}

	/// Shows the first snapshot.
	pub fn first(&mut self) -> Result<usize> {
		self.go_to(0)
	}

	/// Shows the previous snapshot.
	pub fn prev(&mut self) -> Result<usize> {
		self.go_to(self.history.cursor().saturating_sub(1))
	}

	/// Shows the next snapshot.
	pub fn next(&mut self) -> Result<usize> {
		self.go_to(self.history.cursor() + 1)
	}

	/// Shows the latest snapshot.
	pub fn last(&mut self) -> Result<usize> {
		self.go_to(self.history.len().saturating_sub(1))
	}
}
