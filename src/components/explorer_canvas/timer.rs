use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use leptos::leptos_dom::helpers::{TimeoutHandle, set_timeout_with_handle};
use log::warn;

use crate::graph::click::{ClickTimer, TimerToken};

type Elapsed = Rc<RefCell<Option<Box<dyn Fn(TimerToken)>>>>;

/// [`ClickTimer`] on top of `setTimeout`. The expiry callback is installed
/// after construction because it needs the resolver that owns this timer.
#[derive(Default)]
pub struct BrowserTimer {
	handles: HashMap<TimerToken, TimeoutHandle>,
	on_elapsed: Elapsed,
}

impl BrowserTimer {
	pub fn on_elapsed(&self, f: impl Fn(TimerToken) + 'static) {
		*self.on_elapsed.borrow_mut() = Some(Box::new(f));
	}

	pub fn forget(&mut self, token: TimerToken) {
		self.handles.remove(&token);
	}
}

impl ClickTimer for BrowserTimer {
	fn start(&mut self, token: TimerToken, delay: Duration) {
		let on_elapsed = self.on_elapsed.clone();
		let fire = move || {
			if let Some(f) = on_elapsed.borrow().as_ref() {
				f(token);
			}
		};
		match set_timeout_with_handle(fire, delay) {
			Ok(handle) => {
				self.handles.insert(token, handle);
			}
			Err(e) => warn!("could not arm click timer: {e:?}"),
		}
	}

	fn cancel(&mut self, token: TimerToken) {
		if let Some(handle) = self.handles.remove(&token) {
			handle.clear();
		}
	}
}
