use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoadmapError {
    #[error("{node} cannot depend on itself")]
    SelfDependency { node: String },

    #[error("{from} already depends on {to}")]
    DuplicateEdge { from: String, to: String },

    #[error("{from} cannot depend on {to}: would create a cycle ({})", path.join(" -> "))]
    CycleDetected {
        from: String,
        to: String,
        /// The cycle the edge would close, starting and ending at `from`
        path: Vec<String>,
    },

    #[error("{from} does not depend on {to}")]
    EdgeNotFound { from: String, to: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RoadmapError {
    /// True for the three ways an edge insertion can be refused
    pub fn is_edge_rejection(&self) -> bool {
        matches!(
            self,
            Self::SelfDependency { .. } | Self::DuplicateEdge { .. } | Self::CycleDetected { .. }
        )
    }

    /// HTTP status a REST layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            _ if self.is_edge_rejection() => 400,
            Self::EdgeNotFound { .. } | Self::NotFound(_) => 404,
            Self::Validation(_) => 422,
            _ => 500,
        }
    }
}
