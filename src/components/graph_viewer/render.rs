use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::ViewerState;

const BACKGROUND: &str = "#222222";

/// Draws the current store; implemented by the canvas backend.
pub trait Renderer {
	fn present(&mut self, state: &ViewerState);
}

pub struct CanvasRenderer {
	ctx: CanvasRenderingContext2d,
}

impl CanvasRenderer {
	pub fn new(ctx: CanvasRenderingContext2d) -> Self {
		Self { ctx }
	}
}

impl Renderer for CanvasRenderer {
	fn present(&mut self, state: &ViewerState) {
		let ctx = &self.ctx;
		ctx.set_fill_style_str(BACKGROUND);
		ctx.fill_rect(0.0, 0.0, state.width, state.height);
		ctx.save();
		let _ = ctx.translate(state.transform.x, state.transform.y);
		let _ = ctx.scale(state.transform.k, state.transform.k);
		draw_edges(state, ctx);
		draw_nodes(state, ctx);
		ctx.restore();
	}
}

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

fn draw_edges(state: &ViewerState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let t = ease_out_cubic(state.hover.highlight_t);

	for edge in state.store.edges() {
		let (Some(n1), Some(n2)) = (
			state.store.node(&edge.key.source),
			state.store.node(&edge.key.target),
		) else {
			continue;
		};
		let (dx, dy) = (n2.x - n1.x, n2.y - n1.y);
		let dist = dx.hypot(dy);
		if dist < 0.001 {
			continue;
		}

		let lit = state.is_highlighted(&n1.id) && state.is_highlighted(&n2.id);
		let (alpha, width) = if lit {
			(0.7 + 0.3 * t, (1.0 + 0.6 * t) / k)
		} else {
			(0.7 - 0.5 * t, 1.0 / k)
		};

		let (ux, uy) = (dx / dist, dy / dist);
		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(&edge.color);
		ctx.set_line_width(width);
		ctx.begin_path();
		ctx.move_to(n1.x + ux * n1.radius(), n1.y + uy * n1.radius());
		ctx.line_to(n2.x - ux * n2.radius(), n2.y - uy * n2.radius());
		ctx.stroke();
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(state: &ViewerState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform.k,
	);
	let font = format!("{}px sans-serif", 11.0 / k.max(0.5));

	// dimmed nodes first so highlighted ones paint on top
	for pass_lit in [false, true] {
		for node in state.store.nodes() {
			let lit = has_highlight && state.is_highlighted(&node.id);
			if lit != pass_lit {
				continue;
			}
			let alpha = if has_highlight && !lit {
				1.0 - 0.7 * t
			} else {
				1.0
			};
			let radius = if lit {
				node.radius() * (1.0 + 0.2 * t)
			} else {
				node.radius()
			};

			ctx.set_global_alpha(alpha);
			ctx.begin_path();
			let _ = ctx.arc(node.x, node.y, radius, 0.0, 2.0 * PI);
			ctx.set_fill_style_str(&node.color);
			ctx.fill();

			if state.selected.as_deref() == Some(node.id.as_str()) {
				ctx.begin_path();
				let _ = ctx.arc(node.x, node.y, radius + 3.0 / k, 0.0, 2.0 * PI);
				ctx.set_stroke_style_str("white");
				ctx.set_line_width(2.0 / k);
				ctx.stroke();
			}

			if !node.label.is_empty() && (lit || radius * k > 6.0) {
				ctx.set_fill_style_str("white");
				ctx.set_font(&font);
				let _ = ctx.fill_text(&node.label, node.x + radius + 3.0 / k, node.y + 3.0 / k);
			}
		}
	}
	ctx.set_global_alpha(1.0);
}
