//! Layout, clustering and exploration engine. Nothing in here touches the
//! DOM; the canvas component is a thin adapter over these modules.

pub mod click;
pub mod cluster;
pub mod explorer;
pub mod geometry;
pub mod layout;
pub mod merge;
pub mod physics;
pub mod session;
pub mod source;
pub mod types;
pub mod viewport;

pub use click::{ClickAction, ClickResolver, ClickTimer, TimerToken, VirtualTimer};
pub use cluster::{Cluster, ClusteredGraph, cluster};
pub use explorer::{BatchPagination, ExploreHistory, ExploreSnapshot, Explorer, NodeState};
pub use layout::{LayoutKind, compute_layout};
pub use merge::merge;
pub use session::ExploreSession;
pub use source::{InMemorySource, SubgraphSource};
pub use types::{GraphData, HighlightSet, Link, LinkKey, Node, NodeId, Subgraph};
pub use viewport::{OverlaySync, ViewEvent, ViewTransform, to_screen};
