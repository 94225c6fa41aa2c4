use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render::{CanvasRenderer, Renderer};
use super::session::{UiSignals, ViewerSession};
use super::state::ViewerEvent;
use super::transport::ConnectionStatus;
use crate::components::details::DetailsPanel;
use crate::components::legend::Legend;
use crate::config::ViewerConfig;

/// Pixels the pointer may travel before a press counts as a drag.
const CLICK_SLOP: f64 = 3.0;

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn viewport(window: &Window) -> (f64, f64) {
	let dim = |v: Result<JsValue, JsValue>, fallback: f64| {
		v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
	};
	(
		dim(window.inner_width(), 800.0),
		dim(window.inner_height(), 600.0),
	)
}

#[component]
pub fn GraphViewer(config: ViewerConfig) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let ui = UiSignals::new();
	let session = ViewerSession::new(&config, ui);
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let press: Rc<RefCell<Option<(f64, f64)>>> = Rc::new(RefCell::new(None));

	let session_init = session.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};
		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => return,
			},
			_ => {
				log::error!("2d canvas context unavailable");
				return;
			}
		};

		let (w, h) = viewport(&window);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		session_init.with_state(|s| {
			s.resize(w, h);
			s.fit_view();
		});

		let (session_resize, canvas_resize) = (session_init.clone(), canvas.clone());
		*resize_cb.borrow_mut() = Some(Closure::new(move || {
			let Some(win) = web_sys::window() else {
				return;
			};
			let (nw, nh) = viewport(&win);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			session_resize.with_state(|s| s.resize(nw, nh));
		}));
		if let Some(ref cb) = *resize_cb.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let mut renderer = CanvasRenderer::new(ctx);
		let (session_anim, animate_inner) = (session_init.clone(), animate.clone());
		*animate.borrow_mut() = Some(Closure::new(move || {
			session_anim.with_state(|s| {
				s.tick(0.016);
				renderer.present(s);
			});
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}

		session_init.dispatch(ViewerEvent::Start);
	});

	let (session_md, press_md) = (session.clone(), press.clone());
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		*press_md.borrow_mut() = Some((x, y));
		session_md.with_state(|s| {
			if let Some(id) = s.node_at_position(x, y) {
				let (nx, ny) = s.store.node(&id).map(|n| (n.x, n.y)).unwrap_or_default();
				s.drag.active = true;
				s.drag.node = Some(id);
				s.drag.start_x = x;
				s.drag.start_y = y;
				s.drag.node_start_x = nx;
				s.drag.node_start_y = ny;
			} else {
				s.pan.active = true;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		});
	};

	let session_mm = session.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		session_mm.with_state(|s| {
			if !s.drag.active {
				let hovered = s.node_at_position(x, y);
				s.set_hover(hovered);
			}

			if s.drag.active {
				if let Some(id) = s.drag.node.clone() {
					let (dx, dy) = (
						(x - s.drag.start_x) / s.transform.k,
						(y - s.drag.start_y) / s.transform.k,
					);
					let (nx, ny) = (s.drag.node_start_x + dx, s.drag.node_start_y + dy);
					s.store.set_position(&id, nx, ny);
				}
			} else if s.pan.active {
				s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
				s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
			}
		});
		session_mm.publish_details();
	};

	let (session_mu, press_mu) = (session.clone(), press.clone());
	let on_mouseup = move |ev: MouseEvent| {
		let start = press_mu.borrow_mut().take();
		let end = pointer(canvas_ref, &ev);
		session_mu.with_state(|s| {
			let clicked = match (start, end) {
				(Some((sx, sy)), Some((ex, ey))) => (ex - sx).hypot(ey - sy) <= CLICK_SLOP,
				_ => false,
			};
			if clicked {
				// a click on empty canvas clears the selection
				let picked = s.drag.node.clone();
				s.select(picked);
			}
			s.drag = Default::default();
			s.pan.active = false;
		});
		session_mu.publish_details();
	};

	let (session_ml, press_ml) = (session.clone(), press.clone());
	let on_mouseleave = move |_: MouseEvent| {
		press_ml.borrow_mut().take();
		session_ml.with_state(|s| {
			s.drag = Default::default();
			s.pan.active = false;
			s.set_hover(None);
		});
		session_ml.publish_details();
	};

	let session_wh = session.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		session_wh.with_state(|s| s.zoom_at(x, y, factor));
	};

	let session_relayout = session.clone();
	let session_fit = session.clone();
	let session_reload = session.clone();
	let session_trigger = session.clone();
	let session_search = session.clone();
	let (search, set_search) = signal(String::new());

	view! {
		<div class="graph-viewer">
			<canvas
				node_ref=canvas_ref
				class="graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			<div class="graph-toolbar">
				<span class=move || {
					if ui.status.get() == ConnectionStatus::Connected {
						"status status-connected"
					} else {
						"status status-disconnected"
					}
				}>{move || ui.status.get().label()}</span>
				<span class="graph-stats">
					{move || {
						let stats = ui.stats.get();
						format!(
							"{} nodes · {} edges · {} clusters",
							stats.nodes,
							stats.edges,
							stats.clusters,
						)
					}}
				</span>
				<button on:click=move |_| session_relayout.dispatch(ViewerEvent::RelayoutRequested)>
					"Re-layout"
				</button>
				<button on:click=move |_| session_fit.dispatch(ViewerEvent::FitViewRequested)>
					"Fit view"
				</button>
				<button on:click=move |_| session_reload.dispatch(ViewerEvent::ReloadRequested)>
					"Reload"
				</button>
				<button on:click=move |_| session_trigger.dispatch(ViewerEvent::SnapshotRequested)>
					"Request snapshot"
				</button>
				<form on:submit=move |ev| {
					ev.prevent_default();
					let id = search.get_untracked();
					let id = id.trim();
					if !id.is_empty() && session_search.with_state(|s| s.focus(id)) {
						session_search.publish_details();
					}
				}>
					<input
						type="search"
						placeholder="Node id"
						prop:value=search
						on:input=move |ev| set_search.set(event_target_value(&ev))
					/>
				</form>
			</div>
			<Legend entries=ui.legend />
			<DetailsPanel details=ui.details />
		</div>
	}
}
