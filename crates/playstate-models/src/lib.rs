pub mod backup_document;
pub mod external_ids;
pub mod legacy;
pub mod playback;
pub mod playback_record;
pub mod server;

pub use backup_document::{BackupDocument, IdCoverage};
pub use external_ids::{ExternalIdKind, ExternalIds};
pub use legacy::LegacyEntry;
pub use playback::PlaybackState;
pub use playback_record::PlaybackRecord;
pub use server::{ItemPage, ServerInfo, ServerItem, ServerUser};
