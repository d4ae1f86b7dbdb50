use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::external_ids::ExternalIdKind;
use crate::playback_record::PlaybackRecord;
use crate::server::ServerUser;

/// Ordered playback records of one user, as written by a backup run.
///
/// Fields are private: a document is built once by the backup collector (or
/// read from disk) and only read afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    source_user: ServerUser,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    server_url: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    records: Vec<PlaybackRecord>,
}

/// How many records carry each kind of external ID
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct IdCoverage {
    pub imdb: usize,
    pub tmdb: usize,
    pub tvdb: usize,
    pub none: usize,
}

impl BackupDocument {
    pub fn new(source_user: ServerUser, server_url: Option<String>, records: Vec<PlaybackRecord>) -> Self {
        Self {
            source_user,
            server_url,
            created_at: Utc::now(),
            records,
        }
    }

    /// Override the creation time, for documents converted from older files
    pub fn with_created_at(mut self, created_at: impl Into<DateTime<Utc>>) -> Self {
        self.created_at = created_at.into();
        self
    }

    pub fn source_user(&self) -> &ServerUser {
        &self.source_user
    }

    pub fn server_url(&self) -> Option<&str> {
        self.server_url.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn records(&self) -> &[PlaybackRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn unresolvable_records(&self) -> impl Iterator<Item = &PlaybackRecord> {
        self.records.iter().filter(|r| !r.is_resolvable())
    }

    pub fn coverage(&self) -> IdCoverage {
        let mut coverage = IdCoverage::default();
        for record in &self.records {
            let ids = &record.external_ids;
            if ids.is_empty() {
                coverage.none += 1;
                continue;
            }
            if ids.has(ExternalIdKind::Imdb) {
                coverage.imdb += 1;
            }
            if ids.has(ExternalIdKind::Tmdb) {
                coverage.tmdb += 1;
            }
            if ids.has(ExternalIdKind::Tvdb) {
                coverage.tvdb += 1;
            }
        }
        coverage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExternalIds, PlaybackState};

    fn record(ids: ExternalIds, id: &str) -> PlaybackRecord {
        PlaybackRecord::new(ids, id.to_string(), PlaybackState::new(true, 0, false))
    }

    #[test]
    fn test_coverage_and_unresolvable() {
        let doc = BackupDocument::new(
            ServerUser::new("u1", "alice"),
            None,
            vec![
                record(ExternalIds::new().with(ExternalIdKind::Imdb, "tt1").with(ExternalIdKind::Tmdb, "1"), "a"),
                record(ExternalIds::new().with(ExternalIdKind::Tvdb, "9"), "b"),
                record(ExternalIds::new(), "c"),
            ],
        );
        let coverage = doc.coverage();
        assert_eq!(coverage, IdCoverage { imdb: 1, tmdb: 1, tvdb: 1, none: 1 });
        let unresolvable: Vec<&str> = doc.unresolvable_records().map(|r| r.internal_id.as_str()).collect();
        assert_eq!(unresolvable, vec!["c"]);
    }

    #[test]
    fn test_document_json_keeps_record_order() {
        let doc = BackupDocument::new(
            ServerUser::new("u1", "alice"),
            Some("http://jellyfin:8096".to_string()),
            vec![
                record(ExternalIds::new().with(ExternalIdKind::Imdb, "tt2"), "second"),
                record(ExternalIds::new().with(ExternalIdKind::Imdb, "tt1"), "first"),
            ],
        );
        let json = serde_json::to_string(&doc).unwrap();
        let loaded: BackupDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.source_user().name, "alice");
        assert_eq!(loaded.records()[0].internal_id, "second");
        assert_eq!(loaded.records()[1].internal_id, "first");
    }
}
