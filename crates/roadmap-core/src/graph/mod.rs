pub mod algorithms;
pub mod edge;
pub mod phases;
pub mod store;
pub mod traits;
pub mod validator;

pub use edge::Edge;
pub use phases::{compute_phases, CyclicNodesWarning, PhaseReport};
pub use store::EdgeStore;
pub use traits::{GraphNode, NodeId};
pub use validator::can_add;
