pub mod config;
pub mod document;
pub mod error;
pub mod hierarchy;
pub mod types;

pub use config::HierarchyConfig;
pub use document::Document;
pub use error::{DocumentError, HierarchyError};
pub use hierarchy::reconstruct;
pub use types::Outcome;
