pub mod model;
pub mod store;
pub mod traits;

pub use model::{DependencyRecord, StoreData};
pub use store::*;
pub use traits::*;
