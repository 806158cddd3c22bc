//! Content lifecycle: creating, publishing, moving and deleting content files.
mod batch;
pub mod front_matter;
mod manager;
mod model;

pub use batch::{run_batch, BatchReport, ItemOutcome, ItemReport};
pub use front_matter::{FrontMatter, PostData};
pub use manager::ContentManager;
pub use model::{ContentBatch, ContentEntry, ContentItem, Layout, RenameIntent};
