pub mod repository;
pub mod service;
pub mod views;
pub mod work_item;

pub use repository::{EdgeRepository, WorkItemRepository};
pub use service::GraphService;
pub use views::{ProjectPlan, WorkItemView};
pub use work_item::{NodeKind, ProjectId, WorkItem, WorkItemId};
