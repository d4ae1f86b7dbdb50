pub mod backup;
pub mod error;
pub mod pager;
pub mod progress;
pub mod resolution;
pub mod restore;
pub mod store;
pub mod users;

#[cfg(test)]
pub mod mock;

pub use backup::{BackupCollector, BackupOptions, BackupReport, ItemFailure};
pub use error::Error;
pub use pager::ItemPager;
pub use progress::ProgressTracker;
pub use resolution::{Collision, IndexStats, Resolution, ResolutionIndex};
pub use restore::{RecordOutcome, RecordStatus, RestoreApplier, RestoreOptions, RestoreSummary};
pub use store::{read_backups, write_backup, write_backups};
pub use users::{select_document, select_user};
