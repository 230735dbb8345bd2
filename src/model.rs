pub mod catalog;
pub mod classify;
pub mod tab;

pub use catalog::TabCatalog;
pub use tab::{TabDescriptor, TabKind};
