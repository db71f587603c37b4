mod component;
mod render;
mod state;
mod timer;

pub use component::ExplorerCanvas;

use crate::graph::explorer::Explorer;

/// Plain-data summary of the explorer, for the surrounding UI.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExplorerStatus {
	pub nodes: usize,
	pub links: usize,
	pub clusters: usize,
	pub history_len: usize,
	pub cursor: usize,
	pub history_label: Option<String>,
	pub displayed: usize,
	pub total: usize,
	pub loading: bool,
	pub selected: Option<String>,
	pub error: Option<String>,
}

impl ExplorerStatus {
	pub fn of(explorer: &Explorer) -> Self {
		let view = explorer.view();
		Self {
			nodes: explorer.graph().nodes.len(),
			links: explorer.graph().links.len(),
			clusters: view.clusters.len(),
			history_len: explorer.history().len(),
			cursor: explorer.history().cursor(),
			history_label: explorer.history().current().map(|s| s.label.clone()),
			displayed: explorer.pagination().displayed_count,
			total: explorer.pagination().total_count,
			loading: explorer.is_loading(),
			selected: explorer.selected().map(str::to_string),
			error: None,
		}
	}

	pub fn with_error(mut self, error: Option<String>) -> Self {
		self.error = error;
		self
	}
}
