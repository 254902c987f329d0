pub mod config;
pub mod error;
pub mod graph;
pub mod result;

pub use config::AppConfig;
pub use error::RoadmapError;
pub use graph::{
    can_add, compute_phases, CyclicNodesWarning, Edge, EdgeStore, GraphNode, NodeId, PhaseReport,
};
pub use result::RoadmapResult;
