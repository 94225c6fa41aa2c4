use leptos::prelude::*;

use crate::components::graph_viewer::GraphViewer;
use crate::config::ViewerConfig;

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let config = ViewerConfig::from_window();

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<GraphViewer config=config />
				<div class="graph-overlay">
					<h1>"Cluster Graph"</h1>
					<p class="subtitle">
						"Hover or click a node for details. Drag to move nodes or pan. Scroll to zoom."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
