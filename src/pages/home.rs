use std::cell::RefCell;
use std::rc::Rc;

use leptos::ev::{MouseEvent, SubmitEvent};
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{info, warn};
use serde_json::Value;

use crate::components::explorer_canvas::{ExplorerCanvas, ExplorerStatus};
use crate::config::ExplorerConfig;
use crate::error::ExploreError;
use crate::graph::{ExploreSession, Explorer, GraphData, InMemorySource, LayoutKind, Link, Node};

const ORGANIZATIONS: usize = 40;
const EQUIPMENT: usize = 70;
const EVENTS: usize = 50;

/// Generate a deterministic sample dataset of organizations, the equipment
/// they own and the events they take part in.
fn generate_sample_data() -> GraphData {
	let org_kinds = ["agency", "contractor", "laboratory"];
	let equipment_kinds = ["sensor", "vehicle", "radio"];
	let event_kinds = ["exercise", "incident"];

	let mut nodes = Vec::with_capacity(ORGANIZATIONS + EQUIPMENT + EVENTS);
	for i in 0..ORGANIZATIONS {
		nodes.push(
			Node::new(format!("org-{i}"), format!("Organization {i}"), "organization")
				.with_category(org_kinds[i % org_kinds.len()]),
		);
	}
	for i in 0..EQUIPMENT {
		let mut node = Node::new(format!("eq-{i}"), format!("Equipment {i}"), "equipment")
			.with_category(equipment_kinds[i % equipment_kinds.len()]);
		node.properties.insert("shape".into(), Value::from("square"));
		nodes.push(node);
	}
	for i in 0..EVENTS {
		let mut node = Node::new(format!("ev-{i}"), format!("Event {i}"), "event")
			.with_category(event_kinds[i % event_kinds.len()]);
		node.properties.insert("shape".into(), Value::from("diamond"));
		nodes.push(node);
	}

	let pick = |seed: usize, n: usize| (rand_simple(seed) * n as f64) as usize % n;
	let mut links = Vec::new();
	for i in 0..EQUIPMENT {
		links.push(Link::new(format!("org-{}", pick(i, ORGANIZATIONS)), format!("eq-{i}"), "owns"));
	}
	for i in 0..EVENTS {
		let org = pick(i + 500, ORGANIZATIONS);
		links.push(Link::new(format!("org-{org}"), format!("ev-{i}"), "participated in"));
		links.push(Link::new(format!("eq-{}", pick(i + 900, EQUIPMENT)), format!("ev-{i}"), "deployed at"));
		// Some events get a second organization on the same pair of nodes,
		// which draws as parallel edges.
		if i % 4 == 0 {
			links.push(Link::new(format!("org-{org}"), format!("ev-{i}"), "reported"));
		}
	}
	for i in (0..ORGANIZATIONS).step_by(7) {
		links.push(Link::new(format!("org-{i}"), format!("org-{i}"), "audits"));
	}

	GraphData::new(nodes, links)
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

fn spawn_search(session: ExploreSession, status: RwSignal<ExplorerStatus>, entity_type: String, value: String) {
	status.update(|s| s.loading = true);
	spawn_local(async move {
		let error = match session.search(&entity_type, &value).await {
			Ok(outcome) => {
				info!("search {entity_type}/{value:?}: {} nodes", outcome.added_nodes);
				None
			}
			Err(e) => {
				warn!("search {entity_type}/{value:?} failed: {e}");
				Some(e.to_string())
			}
		};
		status.set(ExplorerStatus::of(&session.explorer().borrow()).with_error(error));
	});
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let config = ExplorerConfig::default();
	let session = ExploreSession::new(
		Rc::new(RefCell::new(Explorer::new(config.clone()))),
		Rc::new(InMemorySource::new(generate_sample_data())),
	);

	let status = RwSignal::new(ExplorerStatus::default());
	let layout = RwSignal::new(config.default_layout);
	let entity_type = RwSignal::new(config.entity_type.clone());
	let query = RwSignal::new(String::new());
	let suggestions = RwSignal::new(Vec::<String>::new());

	spawn_search(session.clone(), status, config.entity_type.clone(), String::new());

	let session_search = session.clone();
	let on_search = move |ev: SubmitEvent| {
		ev.prevent_default();
		spawn_search(session_search.clone(), status, entity_type.get_untracked(), query.get_untracked());
	};

	let session_suggest = session.clone();
	let suggest = move |keyword: String| {
		query.set(keyword.clone());
		let session = session_suggest.clone();
		spawn_local(async move {
			match session.suggest(&entity_type.get_untracked(), &keyword).await {
				Ok(labels) => suggestions.set(labels),
				Err(_) => suggestions.set(Vec::new()),
			}
		});
	};

	let history_button = {
		let session = session.clone();
		move |step: fn(&mut Explorer) -> Result<usize, ExploreError>| {
			let session = session.clone();
			move |_: MouseEvent| {
				let error = step(&mut session.explorer().borrow_mut()).err().map(|e| e.to_string());
				status.set(ExplorerStatus::of(&session.explorer().borrow()).with_error(error));
			}
		}
	};

	let session_more = session.clone();
	let on_load_more = move |_: MouseEvent| {
		let session = session_more.clone();
		status.update(|s| s.loading = true);
		spawn_local(async move {
			let error = session.load_more().await.err().map(|e| e.to_string());
			status.set(ExplorerStatus::of(&session.explorer().borrow()).with_error(error));
		});
	};

	let session_all = session.clone();
	let on_load_all = move |_: MouseEvent| {
		let session = session_all.clone();
		status.update(|s| s.loading = true);
		spawn_local(async move {
			let error = match session.load_remaining().await {
				Ok(pages) => {
					info!("loaded {pages} more pages");
					None
				}
				Err(e) => Some(e.to_string()),
			};
			status.set(ExplorerStatus::of(&session.explorer().borrow()).with_error(error));
		});
	};

	let status_text = move || {
		let s = status.get();
		let mut text = format!(
			"{} nodes, {} links, {} clusters | showing {} of {} | step {} of {}",
			s.nodes,
			s.links,
			s.clusters,
			s.displayed,
			s.total,
			if s.history_len == 0 { 0 } else { s.cursor + 1 },
			s.history_len,
		);
		if let Some(label) = s.history_label {
			text.push_str(&format!(" ({label})"));
		}
		if s.loading {
			text.push_str(" | loading...");
		}
		text
	};

	view! {
		<div class="fullscreen-graph">
			<ExplorerCanvas session=session layout=layout status=status fullscreen=true />
			<div class="graph-overlay">
				<h1>"Entity Graph Explorer"</h1>
				<p class="subtitle">
					"Click to select, double-click or right-click to explore. Scroll to zoom. Drag to move."
				</p>
				<form on:submit=on_search>
					<select on:change=move |ev| entity_type.set(event_target_value(&ev))>
						<option value="organization" selected=true>"Organizations"</option>
						<option value="equipment">"Equipment"</option>
						<option value="event">"Events"</option>
						<option value="*">"Anything"</option>
					</select>
					<input type="text" list="entity-suggestions" placeholder="Search by name" on:input=move |ev| suggest(event_target_value(&ev)) />
					<datalist id="entity-suggestions">
						{move || {
							suggestions
								.get()
								.into_iter()
								.map(|label| view! { <option value=label /> })
								.collect_view()
						}}
					</datalist>
					<button type="submit">"Search"</button>
				</form>
				<select on:change=move |ev| {
					match event_target_value(&ev).parse::<LayoutKind>() {
						Ok(kind) => layout.set(kind),
						Err(e) => warn!("{e}"),
					}
				}>
					{LayoutKind::ALL
						.iter()
						.map(|kind| {
							view! {
								<option value=kind.as_str() selected={*kind == layout.get_untracked()}>
									{kind.as_str()}
								</option>
							}
						})
						.collect_view()}
				</select>
				<div class="history">
					<button on:click=history_button(Explorer::first)>"First"</button>
					<button on:click=history_button(Explorer::prev)>"Prev"</button>
					<button on:click=history_button(Explorer::next)>"Next"</button>
					<button on:click=history_button(Explorer::last)>"Last"</button>
					<button on:click=on_load_more>"Load more"</button>
					<button on:click=on_load_all>"Load all"</button>
				</div>
				<p class="status">{status_text}</p>
				<p class="error">{move || status.get().error}</p>
			</div>
		</div>
	}
}
