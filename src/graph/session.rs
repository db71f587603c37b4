//! Async driver connecting an [`Explorer`] to its [`SubgraphSource`].

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use super::explorer::{Explorer, FetchOutcome, FetchRequest};
use super::source::SubgraphSource;
use crate::error::{ExploreError, FetchError, Result};

/// Cheap to clone; clones share the explorer and the source.
#[derive(Clone)]
pub struct ExploreSession {
	explorer: Rc<RefCell<Explorer>>,
	source: Rc<dyn SubgraphSource>,
}

impl ExploreSession {
	/// Wraps a shared explorer.
	pub fn new(explorer: Rc<RefCell<Explorer>>, source: Rc<dyn SubgraphSource>) -> Self {
		Self { explorer, source }
	}

	/// The shared explorer, for reads and synchronous transitions.
	pub fn explorer(&self) -> &Rc<RefCell<Explorer>> {
		&self.explorer
	}

	/// Fetches `request` and applies the response. The explorer is not
	/// borrowed across the await.
	async fn run(&self, request: FetchRequest) -> Result<FetchOutcome> {
		debug!(
			"fetch {}/{} offset {} limit {}",
			request.entity_type, request.entity_id, request.offset, request.limit
		);
		let response = self
			.source
			.fetch_subgraph(&request.entity_type, &request.entity_id, request.offset, request.limit)
			.await;
		self.explorer.borrow_mut().complete(&request.ticket, response)
	}

	/// Runs a search and replaces the graph with its first page.
	pub async fn search(&self, entity_type: &str, value: &str) -> Result<FetchOutcome> {
		let request = self.explorer.borrow_mut().begin_search(entity_type, value);
		self.run(request).await
	}

	/// Explores `node_id`, merging its first page into the graph.
	pub async fn explore(&self, node_id: &str) -> Result<FetchOutcome> {
		let request = self.explorer.borrow_mut().begin_explore(node_id)?;
		self.run(request).await
	}

	/// Fetches the next page of the active query.
	pub async fn load_more(&self) -> Result<FetchOutcome> {
		let request = self.explorer.borrow_mut().begin_load_more()?;
		self.run(request).await
	}

	/// Loads pages until the query is exhausted. Returns the number of pages.
	pub async fn load_remaining(&self) -> Result<usize> {
		let mut pages = 0;
		loop {
			match self.load_more().await {
				Ok(_) => pages += 1,
				Err(ExploreError::Exhausted(_)) => return Ok(pages),
				Err(e) => return Err(e),
			}
		}
	}

	/// Autocomplete labels; does not touch the explorer.
	pub async fn suggest(&self, entity_type: &str, keyword: &str) -> std::result::Result<Vec<String>, FetchError> {
		self.source.search_entities(entity_type, keyword).await
	}
}
