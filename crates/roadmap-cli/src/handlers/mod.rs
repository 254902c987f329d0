pub mod dep;
pub mod item;
pub mod plan;
