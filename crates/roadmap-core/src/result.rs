use crate::error::RoadmapError;

pub type RoadmapResult<T> = Result<T, RoadmapError>;
