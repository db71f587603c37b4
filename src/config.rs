//! Explorer configuration.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::graph::layout::LayoutKind;

/// Tunables for the explorer and its canvas. Every field has a default, so a
/// partial JSON object is a valid config.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExplorerConfig {
	/// Above this many nodes the view collapses into category clusters.
	pub cluster_threshold: usize,
	/// Results requested per fetch.
	pub page_size: usize,
	/// Window in which a second primary click turns into a double-click.
	pub double_click_ms: u64,
	/// Base node spacing handed to the layouts.
	pub spacing: f64,
	/// Overlay refresh interval; 0 refreshes only on view events.
	pub overlay_poll_ms: u64,
	/// Layout applied before the user picks one.
	pub default_layout: LayoutKind,
	/// Entity type used for the initial search.
	pub entity_type: String,
}

impl Default for ExplorerConfig {
	fn default() -> Self {
		Self {
			cluster_threshold: 100,
			page_size: 50,
			double_click_ms: 300,
			spacing: 100.0,
			overlay_poll_ms: 0,
			default_layout: LayoutKind::Force,
			entity_type: "organization".into(),
		}
	}
}

impl ExplorerConfig {
	/// Parses and validates a (possibly partial) JSON config.
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Rejects values the engine cannot work with.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.page_size == 0 {
			return Err(ConfigError::Invalid {
				field: "pageSize",
				reason: "must be at least 1".into(),
			});
		}
		if !(self.spacing.is_finite() && self.spacing > 0.0) {
			return Err(ConfigError::Invalid {
				field: "spacing",
				reason: format!("{} is not a positive number", self.spacing),
			});
		}
		Ok(())
	}
}
