//! Batch sorting pipeline.

mod coordinator;
mod folders;
mod processor;

pub use coordinator::{SortOptions, SortReport, collect_entries, sort_entries, sort_folder};
pub use folders::FolderSet;
pub use processor::{ProcessResult, process_image};
