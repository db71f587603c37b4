//! Collapses dense graphs into one synthetic node per category.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use serde_json::Value;

use super::types::{GraphData, Link, LinkKey, Node, NodeId, Properties};

/// Node count above which [`cluster`] collapses the graph.
pub const DEFAULT_CLUSTER_THRESHOLD: usize = 100;
/// Strength of every aggregated inter-cluster link.
pub const CLUSTER_LINK_STRENGTH: f64 = 0.7;
/// Node kind carried by synthesized cluster nodes.
pub const CLUSTER_KIND: &str = "cluster";

const MIN_CLUSTER_SIZE: f64 = 15.0;
const MAX_CLUSTER_SIZE: f64 = 30.0;

const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// A synthetic node standing in for every node sharing a group key.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
	/// `cluster:<key>`.
	pub id: NodeId,
	/// Category shared by the members.
	pub key: String,
	/// Drawn radius, 15 to 30.
	pub size: f64,
	/// Palette color picked by group order.
	pub color: String,
	/// The collapsed members, in input order.
	pub child_nodes: Vec<Node>,
	/// `child_nodes.len()`.
	pub node_count: usize,
	/// Distinct other clusters linked to this one.
	pub connections: usize,
}

impl Cluster {
	/// Drawable node for this cluster; the label carries the member count.
	pub fn to_node(&self) -> Node {
		let mut properties = Properties::new();
		properties.insert("nodeCount".into(), Value::from(self.node_count));
		properties.insert("connections".into(), Value::from(self.connections));
		Node {
			color: Some(self.color.clone()),
			size: self.size,
			properties,
			..Node::new(self.id.clone(), format!("{} ({})", self.key, self.node_count), CLUSTER_KIND)
				.with_category(self.key.clone())
		}
	}
}

/// Output of [`cluster`]. `clusters` is empty when the input was below the
/// threshold, in which case `nodes`/`links` are the input unchanged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClusteredGraph {
	/// Nodes to draw.
	pub nodes: Vec<Node>,
	/// Links to draw.
	pub links: Vec<Link>,
	/// One entry per category when clustered.
	pub clusters: Vec<Cluster>,
	/// The graph before clustering.
	pub original: GraphData,
}

impl ClusteredGraph {
	/// Whether the input was collapsed.
	pub fn is_clustered(&self) -> bool {
		!self.clusters.is_empty()
	}

	/// The drawn view as plain graph data.
	pub fn graph(&self) -> GraphData {
		GraphData::new(self.nodes.clone(), self.links.clone())
	}
}

/// Node id of the cluster for `key`.
pub fn cluster_id(key: &str) -> NodeId {
	format!("cluster:{key}")
}

fn cluster_size(node_count: usize) -> f64 {
	(node_count as f64 * 0.5 + MIN_CLUSTER_SIZE).clamp(MIN_CLUSTER_SIZE, MAX_CLUSTER_SIZE)
}

/// Groups `nodes` by category (then type, then `"default"`) once there are
/// more than `threshold` of them.
pub fn cluster(nodes: &[Node], links: &[Link], threshold: usize) -> ClusteredGraph {
	let original = GraphData::new(nodes.to_vec(), links.to_vec());
	if nodes.len() <= threshold {
		return ClusteredGraph {
			nodes: original.nodes.clone(),
			links: original.links.clone(),
			clusters: Vec::new(),
			original,
		};
	}

	let mut groups: IndexMap<&str, Vec<&Node>> = IndexMap::new();
	let mut membership: HashMap<&str, usize> = HashMap::new();
	for node in nodes {
		let entry = groups.entry(node.group_key());
		let index = entry.index();
		entry.or_default().push(node);
		membership.insert(node.id.as_str(), index);
	}

	let ids: Vec<NodeId> = groups.keys().map(|k| cluster_id(k)).collect();
	let mut neighbours: Vec<HashSet<usize>> = vec![HashSet::new(); groups.len()];
	let mut seen: HashSet<LinkKey> = HashSet::new();
	let mut cluster_links: Vec<Link> = Vec::new();
	let mut link_index: HashMap<LinkKey, usize> = HashMap::new();

	for link in links {
		let (Some(&a), Some(&b)) = (
			membership.get(link.source.as_str()),
			membership.get(link.target.as_str()),
		) else {
			continue;
		};
		if a == b {
			continue;
		}
		neighbours[a].insert(b);
		neighbours[b].insert(a);

		let key = LinkKey::new(&ids[a], &ids[b]);
		if seen.insert(key.clone()) {
			let mut aggregated = Link::new(ids[a].clone(), ids[b].clone(), CLUSTER_KIND);
			aggregated.strength = CLUSTER_LINK_STRENGTH;
			aggregated.properties.insert("linkCount".into(), Value::from(1));
			link_index.insert(key, cluster_links.len());
			cluster_links.push(aggregated);
		} else if let Some(&i) = link_index.get(&key) {
			let properties = &mut cluster_links[i].properties;
			let count = properties.get("linkCount").and_then(Value::as_u64).unwrap_or(0);
			properties.insert("linkCount".into(), Value::from(count + 1));
		}
	}

	let clusters: Vec<Cluster> = groups
		.iter()
		.enumerate()
		.map(|(i, (key, members))| Cluster {
			id: ids[i].clone(),
			key: key.to_string(),
			size: cluster_size(members.len()),
			color: members
				.iter()
				.find_map(|n| n.color.clone())
				.unwrap_or_else(|| COLORS[i % COLORS.len()].to_string()),
			child_nodes: members.iter().map(|n| (*n).clone()).collect(),
			node_count: members.len(),
			connections: neighbours[i].len(),
		})
		.collect();

	debug!(
		"clustered {} nodes into {} clusters with {} links",
		nodes.len(),
		clusters.len(),
		cluster_links.len()
	);

	ClusteredGraph {
		nodes: clusters.iter().map(Cluster::to_node).collect(),
		links: cluster_links,
		clusters,
		original,
	}
}
