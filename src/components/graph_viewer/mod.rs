mod component;
pub mod layout;
pub mod overlap;
pub mod physics;
mod queue;
mod render;
pub mod router;
mod session;
mod socket;
pub mod state;
pub mod store;
pub mod transport;
mod types;

pub use component::GraphViewer;
pub use state::NodeDetails;
pub use types::ClusterInfo;
