pub mod details;
pub mod graph_viewer;
pub mod legend;
