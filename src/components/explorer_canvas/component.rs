use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::ExplorerStatus;
use super::render;
use super::state::CanvasState;
use super::timer::BrowserTimer;
use crate::graph::click::{ClickAction, ClickResolver};
use crate::graph::geometry::Point;
use crate::graph::layout::LayoutKind;
use crate::graph::session::ExploreSession;
use crate::graph::types::NodeId;

fn publish(status: RwSignal<ExplorerStatus>, session: &ExploreSession, error: Option<String>) {
	status.set(ExplorerStatus::of(&session.explorer().borrow()).with_error(error));
}

fn spawn_explore(session: ExploreSession, status: RwSignal<ExplorerStatus>, id: NodeId) {
	status.update(|s| s.loading = true);
	spawn_local(async move {
		let error = session.explore(&id).await.err().map(|e| {
			warn!("explore {id} failed: {e}");
			e.to_string()
		});
		publish(status, &session, error);
	});
}

fn pointer(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

#[component]
pub fn ExplorerCanvas(
	session: ExploreSession,
	#[prop(into)] layout: Signal<LayoutKind>,
	status: RwSignal<ExplorerStatus>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let config = session.explorer().borrow().config().clone();
	let state: Rc<RefCell<Option<CanvasState>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let overlay_pos: RwSignal<Option<(f64, f64)>> = RwSignal::new(None);

	let dispatch: Rc<dyn Fn(ClickAction)> = {
		let session = session.clone();
		Rc::new(move |action: ClickAction| {
			let action = session.explorer().borrow().route(action);
			match action {
				ClickAction::Select(id) => {
					let error = session.explorer().borrow_mut().select(&id).err().map(|e| e.to_string());
					publish(status, &session, error);
				}
				ClickAction::Explore(id) | ClickAction::ContextExplore(id) => {
					spawn_explore(session.clone(), status, id);
				}
			}
		})
	};

	let resolver = Rc::new(RefCell::new(ClickResolver::new(
		BrowserTimer::default(),
		Duration::from_millis(config.double_click_ms),
	)));
	{
		let (weak, dispatch) = (Rc::downgrade(&resolver), dispatch.clone());
		resolver.borrow().timer().on_elapsed(move |token| {
			let Some(resolver) = weak.upgrade() else {
				return;
			};
			let action = {
				let mut r = resolver.borrow_mut();
				r.timer_mut().forget(token);
				r.timer_elapsed(token)
			};
			if let Some(action) = action {
				dispatch(action);
			}
		});
	}

	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());
	let explorer_init = session.explorer().clone();

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};
		let inner_size = |win: &Window| {
			(
				win.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0),
				win.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0),
			)
		};

		let (w, h) = if fullscreen {
			inner_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("2d canvas context unavailable");
			return;
		};
		*state_init.borrow_mut() = Some(CanvasState::new(&config, w, h));

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = inner_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner, explorer_anim) =
			(state_init.clone(), animate_init.clone(), explorer_init.clone());
		let canvas_anim = canvas.clone();
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				let ex = explorer_anim.borrow();
				s.set_layout(layout.get_untracked());
				s.sync(&ex);
				s.tick(0.016, ex.hovered().is_some());
				render::render(s, &ex, &ctx);

				if s.overlay.target() != ex.selected() {
					s.overlay.track(ex.selected().map(str::to_string));
				}
				let now = Duration::from_secs_f64(js_sys::Date::now() / 1000.0);
				let target = s.overlay.target().and_then(|id| s.position(id));
				let rect = canvas_anim.get_bounding_client_rect();
				let transform = s.transform;
				let next = s
					.overlay
					.refresh(now, target, &transform, Point::new(rect.left(), rect.top()))
					.map(|p| (p.x, p.y));
				if overlay_pos.get_untracked() != next {
					overlay_pos.set(next);
				}
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				if let Some(win) = web_sys::window() {
					let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
				}
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = pointer(&canvas, &ev);
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.drag.moved = false;
			if let Some(id) = s.node_at_position(x, y) {
				s.drag.node_start = s.position(&id).unwrap_or_default();
				s.drag.active = true;
				s.drag.node = Some(id);
				s.drag.start_x = x;
				s.drag.start_y = y;
			} else {
				s.pan.active = true;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let (state_mm, explorer_mm) = (state.clone(), session.explorer().clone());
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = pointer(&canvas, &ev);
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			// Update hover state when not dragging
			if !s.drag.active {
				let hovered = s.node_at_position(x, y);
				explorer_mm.borrow_mut().hover(hovered.as_deref());
			}

			if s.drag.active {
				if let Some(id) = s.drag.node.clone() {
					let (dx, dy) = (
						(x - s.drag.start_x) / s.transform.k,
						(y - s.drag.start_y) / s.transform.k,
					);
					if dx.abs() + dy.abs() > 0.5 {
						s.drag.moved = true;
					}
					let to = Point::new(s.drag.node_start.x + dx, s.drag.node_start.y + dy);
					s.drag_node(&id, to);
				}
			} else if s.pan.active {
				if (x - s.pan.start_x).abs() + (y - s.pan.start_y).abs() > 2.0 {
					s.drag.moved = true;
				}
				s.pan_to(x, y);
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.drag.active = false;
			s.drag.node = None;
			s.pan.active = false;
		}
	};

	let (state_ml, explorer_ml) = (state.clone(), session.explorer().clone());
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.drag.active = false;
			s.drag.node = None;
			s.pan.active = false;
		}
		explorer_ml.borrow_mut().hover(None);
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = pointer(&canvas, &ev);
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.zoom_at(x, y, factor);
		}
	};

	let hit_test = {
		let state = state.clone();
		move |ev: &MouseEvent| -> Option<Option<NodeId>> {
			let canvas = canvas_ref.get()?;
			let (x, y) = pointer(&canvas, ev);
			let guard = state.borrow();
			let s = guard.as_ref()?;
			// A click that ends a drag or pan is not a click.
			if s.drag.moved {
				return None;
			}
			Some(s.node_at_position(x, y))
		}
	};

	let (resolver_click, dispatch_click, session_click, hit_click) =
		(resolver.clone(), dispatch.clone(), session.clone(), hit_test.clone());
	let on_click = move |ev: MouseEvent| {
		let Some(hit) = hit_click(&ev) else {
			return;
		};
		match hit {
			Some(id) => {
				let action = resolver_click.borrow_mut().primary_click(&id);
				if let Some(action) = action {
					dispatch_click(action);
				}
			}
			None => {
				resolver_click.borrow_mut().background_click();
				session_click.explorer().borrow_mut().clear_selection();
				publish(status, &session_click, None);
			}
		}
	};

	let (resolver_ctx, dispatch_ctx) = (resolver.clone(), dispatch.clone());
	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		if let Some(Some(id)) = hit_test(&ev) {
			let action = resolver_ctx.borrow_mut().secondary_click(&id);
			if let Some(action) = action {
				dispatch_ctx(action);
			}
		}
	};

	let (session_focus, state_focus) = (session.clone(), state.clone());
	let on_focus = move |_: MouseEvent| {
		let focused = session_focus.explorer().borrow_mut().focus();
		if let (Some(id), Some(s)) = (focused, state_focus.borrow_mut().as_mut()) {
			s.focus_on(&id);
		}
	};

	let (session_explore, dispatch_explore) = (session.clone(), dispatch.clone());
	let on_explore = move |_: MouseEvent| {
		let selected = session_explore.explorer().borrow().selected().map(str::to_string);
		if let Some(id) = selected {
			dispatch_explore(ClickAction::Explore(id));
		}
	};

	let session_remove = session.clone();
	let on_remove = move |_: MouseEvent| {
		let selected = session_remove.explorer().borrow().selected().map(str::to_string);
		if let Some(id) = selected {
			let error = session_remove.explorer().borrow_mut().remove_node(&id).err().map(|e| e.to_string());
			publish(status, &session_remove, error);
		}
	};

	let state_pause = state.clone();
	let on_pause = move |_: MouseEvent| {
		if let Some(s) = state_pause.borrow_mut().as_mut() {
			s.toggle_simulation();
		}
	};

	view! {
		<div class="explorer-canvas">
			<canvas
				node_ref=canvas_ref
				class="force-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:click=on_click
				on:contextmenu=on_contextmenu
				style="display: block; cursor: grab;"
			/>
			<div
				class="node-overlay"
				style:position="fixed"
				style:display=move || if overlay_pos.get().is_some() { "flex" } else { "none" }
				style:left=move || overlay_pos.get().map(|(x, _)| format!("{}px", x + 12.0)).unwrap_or_default()
				style:top=move || overlay_pos.get().map(|(_, y)| format!("{}px", y - 12.0)).unwrap_or_default()
			>
				<button on:click=on_focus>"Focus"</button>
				<button on:click=on_explore>"Explore"</button>
				<button on:click=on_remove>"Remove"</button>
			</div>
			<button class="physics-toggle" on:click=on_pause>"Pause / resume physics"</button>
		</div>
	}
}
