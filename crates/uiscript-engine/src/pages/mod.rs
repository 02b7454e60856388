pub mod catalog;
pub mod loader;
pub mod probe;

pub use catalog::PageCatalog;
pub use loader::{PageLoadError, PageLoader};
