//! Side panel describing the selected (or hovered) node.

use leptos::prelude::*;

use crate::components::graph_viewer::NodeDetails;

#[component]
pub fn DetailsPanel(#[prop(into)] details: Signal<Option<NodeDetails>>) -> impl IntoView {
	view! {
		<aside class="graph-details">
			{move || match details.get() {
				Some(node) => {
					let cluster = node.cluster.unwrap_or_else(|| "none".to_string());
					let swatch = format!("background-color: {};", node.color);
					view! {
						<div class="details-body">
							<h2>
								<span class="legend-swatch" style=swatch></span>
								{node.label}
							</h2>
							<dl>
								<dt>"ID"</dt>
								<dd>{node.id}</dd>
								<dt>"Cluster"</dt>
								<dd>{cluster}</dd>
								<dt>"Significance"</dt>
								<dd>{node.significance.to_string()}</dd>
								<dt>"Connections"</dt>
								<dd>{node.degree.to_string()}</dd>
							</dl>
							<p class="details-content">{node.content}</p>
						</div>
					}
						.into_any()
				}
				None => {
					view! { <p class="details-empty">"Hover or click a node"</p> }.into_any()
				}
			}}
		</aside>
	}
}
