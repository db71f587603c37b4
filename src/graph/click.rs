//! Click disambiguation.
//!
//! A primary click arms a cancelable timer. If it elapses the click resolves
//! to [`ClickAction::Select`]; a second primary click on the same node before
//! then cancels it and resolves to [`ClickAction::Explore`] instead. A
//! secondary (right) click cancels any armed timer and resolves immediately.

use std::time::Duration;

use log::debug;

use super::types::NodeId;

/// Identifies one armed timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

/// Host timer facility.
pub trait ClickTimer {
	/// Arms a timer; on expiry the host calls [`ClickResolver::timer_elapsed`].
	fn start(&mut self, token: TimerToken, delay: Duration);
	/// Drops an armed timer; a canceled token must never be reported.
	fn cancel(&mut self, token: TimerToken);
}

/// What a resolved click asks the explorer to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickAction {
	/// Single click: open the node's details.
	Select(NodeId),
	/// Double click: fetch and merge the node's neighbourhood.
	Explore(NodeId),
	/// Right click: explore without waiting for the double-click window.
	ContextExplore(NodeId),
}

/// Turns raw clicks into [`ClickAction`]s.
pub struct ClickResolver<T: ClickTimer> {
	timer: T,
	window: Duration,
	pending: Option<(TimerToken, NodeId)>,
	next_token: u64,
}

impl<T: ClickTimer> ClickResolver<T> {
	/// `window` is the double-click window.
	pub fn new(timer: T, window: Duration) -> Self {
		Self {
			timer,
			window,
			pending: None,
			next_token: 0,
		}
	}

	/// The host timer.
	pub fn timer(&self) -> &T {
		&self.timer
	}

	/// Mutable access for hosts that drive the timer directly.
	pub fn timer_mut(&mut self) -> &mut T {
		&mut self.timer
	}

	/// Whether a single click is waiting on its timer.
	pub fn is_armed(&self) -> bool {
		self.pending.is_some()
	}

	fn disarm(&mut self) -> Option<NodeId> {
		let (token, node) = self.pending.take()?;
		self.timer.cancel(token);
		Some(node)
	}

	/// A left click. Returns `Explore` when it completes a double-click, otherwise
	/// arms the timer and returns nothing yet.
	pub fn primary_click(&mut self, node: &str) -> Option<ClickAction> {
		match self.disarm() {
			Some(armed) if armed == node => {
				debug!("double click on {node}");
				Some(ClickAction::Explore(armed))
			}
			_ => {
				let token = TimerToken(self.next_token);
				self.next_token += 1;
				self.timer.start(token, self.window);
				self.pending = Some((token, node.to_string()));
				None
			}
		}
	}

	/// A right click resolves at once.
	pub fn secondary_click(&mut self, node: &str) -> Option<ClickAction> {
		self.disarm();
		Some(ClickAction::ContextExplore(node.to_string()))
	}

	/// A click on empty canvas drops any armed single click.
	pub fn background_click(&mut self) {
		self.disarm();
	}

	/// Called by the host when `token` fires. Returns `Select` unless the token was
	/// superseded.
	pub fn timer_elapsed(&mut self, token: TimerToken) -> Option<ClickAction> {
		if !self.pending.as_ref().is_some_and(|(armed, _)| *armed == token) {
			return None;
		}
		self.pending.take().map(|(_, node)| ClickAction::Select(node))
	}
}

/// Deterministic timer driven by explicit time advancement.
#[derive(Debug, Default)]
pub struct VirtualTimer {
	now: Duration,
	armed: Vec<(TimerToken, Duration)>,
}

impl VirtualTimer {
	/// Time elapsed since creation.
	pub fn now(&self) -> Duration {
		self.now
	}

	/// Moves time forward and returns the tokens that came due, in deadline order.
	pub fn advance(&mut self, by: Duration) -> Vec<TimerToken> {
		self.now += by;
		let now = self.now;
		let mut due: Vec<(TimerToken, Duration)> = Vec::new();
		self.armed.retain(|&(token, deadline)| {
			if deadline <= now {
				due.push((token, deadline));
				false
			} else {
				true
			}
		});
		due.sort_by_key(|&(_, deadline)| deadline);
		due.into_iter().map(|(token, _)| token).collect()
	}
}

impl ClickTimer for VirtualTimer {
	fn start(&mut self, token: TimerToken, delay: Duration) {
		self.armed.push((token, self.now + delay));
	}

	fn cancel(&mut self, token: TimerToken) {
		self.armed.retain(|&(t, _)| t != token);
	}
}

impl ClickResolver<VirtualTimer> {
	/// Advances virtual time and resolves every timer that came due.
	pub fn advance(&mut self, by: Duration) -> Vec<ClickAction> {
		self.timer
			.advance(by)
			.into_iter()
			.filter_map(|token| self.timer_elapsed(token))
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn resolver() -> ClickResolver<VirtualTimer> {
		ClickResolver::new(VirtualTimer::default(), Duration::from_millis(300))
	}

	#[test]
	fn single_click_selects_after_window() {
		let mut r = resolver();
		assert_eq!(r.primary_click("a"), None);
		assert!(r.advance(Duration::from_millis(299)).is_empty());
		assert_eq!(r.advance(Duration::from_millis(1)), vec![ClickAction::Select("a".into())]);
		assert!(!r.is_armed());
	}

	#[test]
	fn double_click_never_selects() {
		let mut r = resolver();
		assert_eq!(r.primary_click("a"), None);
		r.advance(Duration::from_millis(120));
		assert_eq!(r.primary_click("a"), Some(ClickAction::Explore("a".into())));
		assert!(r.advance(Duration::from_secs(5)).is_empty());
	}

	#[test]
	fn right_click_cancels_pending_select() {
		let mut r = resolver();
		r.primary_click("a");
		assert_eq!(r.secondary_click("b"), Some(ClickAction::ContextExplore("b".into())));
		assert!(r.advance(Duration::from_secs(1)).is_empty());
	}

	#[test]
	fn click_on_other_node_restarts_window() {
		let mut r = resolver();
		r.primary_click("a");
		r.advance(Duration::from_millis(200));
		assert_eq!(r.primary_click("b"), None);
		assert!(r.advance(Duration::from_millis(200)).is_empty());
		assert_eq!(r.advance(Duration::from_millis(100)), vec![ClickAction::Select("b".into())]);
	}

	#[test]
	fn stale_token_is_ignored() {
		let mut r = resolver();
		r.primary_click("a");
		r.background_click();
		assert_eq!(r.timer_elapsed(TimerToken(0)), None);
	}
}
