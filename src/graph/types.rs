//! Graph data model shared by every engine stage.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Node identity, unique within a graph.
pub type NodeId = String;

/// Free-form properties carried by nodes and links.
pub type Properties = BTreeMap<String, Value>;

/// Default node size when the source provides none.
pub const DEFAULT_NODE_SIZE: f64 = 8.0;

/// An entity in the graph (organization, equipment, event, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
	/// Unique within a graph.
	pub id: NodeId,
	/// Display name.
	#[serde(default)]
	pub name: String,
	/// Entity type, `type` on the wire.
	#[serde(rename = "type", default)]
	pub kind: String,
	/// Finer grouping within the type, used by clustering.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	/// Color override.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
	/// Drawn radius.
	#[serde(default = "default_size")]
	pub size: f64,
	/// Source-specific attributes; `shape` selects the outline.
	#[serde(default)]
	pub properties: Properties,
	/// Last simulated position.
	#[serde(default)]
	pub x: f64,
	/// See `x`.
	#[serde(default)]
	pub y: f64,
	/// Pinned position, set by non-force layouts.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fx: Option<f64>,
	/// See `fx`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fy: Option<f64>,
}

fn default_size() -> f64 {
	DEFAULT_NODE_SIZE
}

impl Node {
	/// A bare node with the given identity, name and type.
	pub fn new(id: impl Into<NodeId>, name: impl Into<String>, kind: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			kind: kind.into(),
			category: None,
			color: None,
			size: DEFAULT_NODE_SIZE,
			properties: Properties::new(),
			x: 0.0,
			y: 0.0,
			fx: None,
			fy: None,
		}
	}

	/// Sets the category.
	pub fn with_category(mut self, category: impl Into<String>) -> Self {
		self.category = Some(category.into());
		self
	}

	/// Pinned position if set, otherwise the last simulated one.
	pub fn position(&self) -> (f64, f64) {
		(self.fx.unwrap_or(self.x), self.fy.unwrap_or(self.y))
	}

	/// Pins at `(x, y)` and moves there.
	pub fn pin(&mut self, x: f64, y: f64) {
		self.fx = Some(x);
		self.fy = Some(y);
		self.x = x;
		self.y = y;
	}

	/// Releases the pin so physics can move the node.
	pub fn unpin(&mut self) {
		self.fx = None;
		self.fy = None;
	}

	/// Grouping key used by clustering: category, then type, then `"default"`.
	pub fn group_key(&self) -> &str {
		match self.category.as_deref() {
			Some(c) if !c.is_empty() => c,
			_ if !self.kind.is_empty() => self.kind.as_str(),
			_ => "default",
		}
	}
}

/// A relationship between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
	/// Source node id.
	pub source: NodeId,
	/// Target node id.
	pub target: NodeId,
	/// Relationship type, drawn as the edge label.
	#[serde(rename = "type", default)]
	pub kind: String,
	/// Color override.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
	/// Spring strength for the force layout.
	#[serde(default = "default_strength")]
	pub strength: f64,
	/// Source-specific attributes.
	#[serde(default)]
	pub properties: Properties,
	/// `source == target`.
	#[serde(default)]
	pub is_self_loop: bool,
}

fn default_strength() -> f64 {
	1.0
}

impl Link {
	/// A link of `kind` from `source` to `target`.
	pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, kind: impl Into<String>) -> Self {
		let (source, target) = (source.into(), target.into());
		Self {
			is_self_loop: source == target,
			source,
			target,
			kind: kind.into(),
			color: None,
			strength: default_strength(),
			properties: Properties::new(),
		}
	}

	/// Endpoint pair, ignoring direction.
	pub fn key(&self) -> LinkKey {
		LinkKey::new(&self.source, &self.target)
	}

	/// Whether `id` is an endpoint.
	pub fn touches(&self, id: &str) -> bool {
		self.source == id || self.target == id
	}
}

/// Unordered endpoint pair; `a <= b` always holds.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkKey {
	/// Smaller id.
	pub a: NodeId,
	/// Larger id.
	pub b: NodeId,
}

impl LinkKey {
	/// Orders the endpoints.
	pub fn new(x: &str, y: &str) -> Self {
		let (a, b) = if x <= y { (x, y) } else { (y, x) };
		Self {
			a: a.to_string(),
			b: b.to_string(),
		}
	}
}

/// A set of nodes and the links between them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	/// Nodes; ids are unique after a merge.
	#[serde(default)]
	pub nodes: Vec<Node>,
	/// Links, possibly dangling until sanitized.
	#[serde(default)]
	pub links: Vec<Link>,
}

impl GraphData {
	/// From parts.
	pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
		Self { nodes, links }
	}

	/// Whether there are no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Node by id.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Mutable node by id.
	pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
		self.nodes.iter_mut().find(|n| n.id == id)
	}

	/// Whether a node with `id` exists.
	pub fn contains(&self, id: &str) -> bool {
		self.nodes.iter().any(|n| n.id == id)
	}

	/// Every node id.
	pub fn node_ids(&self) -> HashSet<&str> {
		self.nodes.iter().map(|n| n.id.as_str()).collect()
	}

	/// Links whose endpoints both exist in `nodes`, the ones the renderer may draw.
	pub fn drawable_links(&self) -> impl Iterator<Item = &Link> {
		let ids = self.node_ids();
		self.links
			.iter()
			.filter(move |l| ids.contains(l.source.as_str()) && ids.contains(l.target.as_str()))
	}

	/// Removes a node and every incident link. Returns whether the node existed.
	pub fn remove_node(&mut self, id: &str) -> bool {
		let before = self.nodes.len();
		self.nodes.retain(|n| n.id != id);
		self.links.retain(|l| !l.touches(id));
		self.nodes.len() != before
	}

	/// Serializes to the JSON transport format.
	pub fn to_json(&self) -> serde_json::Result<String> {
		serde_json::to_string(self)
	}

	/// Parses the JSON transport format.
	pub fn from_json(json: &str) -> serde_json::Result<Self> {
		serde_json::from_str(json)
	}
}

/// One page of results from the subgraph collaborator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subgraph {
	/// Nodes of this page.
	#[serde(default)]
	pub nodes: Vec<Node>,
	/// Links of this page.
	#[serde(default)]
	pub links: Vec<Link>,
	/// Results available across all pages.
	#[serde(default)]
	pub total_count: usize,
}

impl Subgraph {
	/// Drops the total.
	pub fn into_graph(self) -> GraphData {
		GraphData::new(self.nodes, self.links)
	}
}

/// Nodes and links to emphasize, derived from hover or focus.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HighlightSet {
	/// Emphasized nodes.
	pub nodes: HashSet<NodeId>,
	/// Emphasized links.
	pub links: HashSet<LinkKey>,
}

impl HighlightSet {
	/// `id` plus every node and link directly connected to it.
	pub fn around(graph: &GraphData, id: &str) -> Self {
		let mut set = Self::default();
		if !graph.contains(id) {
			return set;
		}
		set.nodes.insert(id.to_string());
		for link in graph.links.iter().filter(|l| l.touches(id)) {
			set.nodes.insert(link.source.clone());
			set.nodes.insert(link.target.clone());
			set.links.insert(link.key());
		}
		set
	}

	/// Whether nothing is emphasized.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.links.is_empty()
	}

	/// Empties both sets.
	pub fn clear(&mut self) {
		self.nodes.clear();
		self.links.clear();
	}

	/// Whether `id` is emphasized.
	pub fn has_node(&self, id: &str) -> bool {
		self.nodes.contains(id)
	}

	/// Whether `link` is emphasized, in either direction.
	pub fn has_link(&self, link: &Link) -> bool {
		self.links.contains(&link.key())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn link_key_is_unordered() {
		assert_eq!(LinkKey::new("b", "a"), LinkKey::new("a", "b"));
		assert_eq!(Link::new("x", "y", "owns").key(), Link::new("y", "x", "uses").key());
	}

	#[test]
	fn group_key_falls_back_to_type_then_default() {
		let n = Node::new("1", "Acme", "organization");
		assert_eq!(n.group_key(), "organization");
		assert_eq!(n.clone().with_category("vendor").group_key(), "vendor");
		assert_eq!(Node::new("2", "?", "").group_key(), "default");
	}

	#[test]
	fn remove_node_drops_incident_links() {
		let mut g = GraphData::new(
			vec![Node::new("a", "A", "t"), Node::new("b", "B", "t"), Node::new("c", "C", "t")],
			vec![Link::new("a", "b", "r"), Link::new("b", "c", "r"), Link::new("b", "b", "r")],
		);
		assert!(g.remove_node("b"));
		assert_eq!(g.nodes.len(), 2);
		assert!(g.links.is_empty());
		assert!(!g.remove_node("b"));
	}

	#[test]
	fn highlight_covers_direct_neighbours_only() {
		let g = GraphData::new(
			vec![Node::new("a", "A", "t"), Node::new("b", "B", "t"), Node::new("c", "C", "t")],
			vec![Link::new("a", "b", "r"), Link::new("b", "c", "r")],
		);
		let h = HighlightSet::around(&g, "a");
		assert!(h.has_node("a") && h.has_node("b"));
		assert!(!h.has_node("c"));
		assert!(h.has_link(&Link::new("b", "a", "r")));
		assert_eq!(h.links.len(), 1);
		assert!(HighlightSet::around(&g, "zzz").is_empty());
	}

	#[test]
	fn json_uses_type_field_and_camel_case() {
		let g = GraphData::new(
			vec![Node::new("a", "A", "org")],
			vec![Link::new("a", "a", "self")],
		);
		let json = g.to_json().unwrap();
		assert!(json.contains("\"type\":\"org\""));
		assert!(json.contains("\"isSelfLoop\":true"));
		assert_eq!(GraphData::from_json(&json).unwrap(), g);
	}
}
