//! Cluster legend: one swatch per cluster with its member count.

use leptos::prelude::*;

use crate::components::graph_viewer::ClusterInfo;

#[component]
pub fn Legend(#[prop(into)] entries: Signal<Vec<ClusterInfo>>) -> impl IntoView {
	view! {
		<ul class="graph-legend">
			{move || {
				entries
					.get()
					.into_iter()
					.map(|entry| {
						let swatch = format!("background-color: {};", entry.color);
						view! {
							<li class="legend-entry">
								<span class="legend-swatch" style=swatch></span>
								<span class="legend-label">
									{format!("Cluster {} ({})", entry.id, entry.node_count)}
								</span>
							</li>
						}
					})
					.collect_view()
			}}
		</ul>
	}
}
