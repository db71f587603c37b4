//! Error types for the exploration engine.

use thiserror::Error;

/// Failure reported by the subgraph/search collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
	/// The request never produced a usable response.
	#[error("request failed: {0}")]
	Transport(String),

	/// No entity matched the query.
	#[error("entity not found: {entity_type}/{id}")]
	NotFound {
		/// Entity type that was queried.
		entity_type: String,
		/// Id or keyword that matched nothing.
		id: String,
	},
}

/// Rejected or failed exploration transition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExploreError {
	/// A fetch is in flight and this transition would race it.
	#[error("a fetch is already in flight")]
	Busy,

	/// The id names nothing in the live graph.
	#[error("node not in graph: {0}")]
	UnknownNode(String),

	/// The id names a synthesized cluster node, which has no backing entity.
	#[error("{0} is a cluster of entities, not an entity")]
	Cluster(String),

	/// Load-more without a prior search or explore.
	#[error("no active query")]
	NoQuery,

	/// Every result of the active query is already displayed.
	#[error("all {0} results already loaded")]
	Exhausted(usize),

	/// The response belongs to a superseded fetch.
	#[error("response from generation {got} ignored, current is {current}")]
	Stale {
		/// Generation the response was issued for.
		got: u64,
		/// Generation of the newest fetch.
		current: u64,
	},

	/// The collaborator failed.
	#[error("fetch failed: {0}")]
	Fetch(#[from] FetchError),
}

/// Configuration could not be parsed.
#[derive(Error, Debug)]
pub enum ConfigError {
	/// Malformed JSON or a field of the wrong type.
	#[error("invalid config: {0}")]
	Parse(#[from] serde_json::Error),

	/// A field parsed but is out of range.
	#[error("invalid value for {field}: {reason}")]
	Invalid {
		/// JSON name of the field.
		field: &'static str,
		/// What is wrong with it.
		reason: String,
	},
}

/// Unknown layout identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown layout: {0}")]
pub struct LayoutParseError(pub String);

/// Result alias for exploration transitions.
pub type Result<T> = std::result::Result<T, ExploreError>;
