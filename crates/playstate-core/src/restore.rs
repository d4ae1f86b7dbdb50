use playstate_models::{BackupDocument, ExternalIds, PlaybackRecord, ServerUser};
use playstate_server::MediaServer;
use serde::Serialize;
use tracing::{info, warn};
use crate::error::Error;
use crate::progress::ProgressTracker;
use crate::resolution::{Resolution, ResolutionIndex};

#[derive(Debug, Clone, Copy, Default)]
pub struct RestoreOptions {
    /// Resolve every record but send no updates
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Applied,
    WouldApply,
    SkippedUnresolved,
    FailedApply,
}

/// What happened to one backup record
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecordOutcome {
    pub record: String,
    pub external_ids: ExternalIds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Resolution>,
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RestoreSummary {
    pub applied: usize,
    pub would_apply: usize,
    pub skipped_unresolved: usize,
    pub failed_apply: usize,
    pub outcomes: Vec<RecordOutcome>,
}

impl RestoreSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    fn push(&mut self, outcome: RecordOutcome) {
        match outcome.status {
            RecordStatus::Applied => self.applied += 1,
            RecordStatus::WouldApply => self.would_apply += 1,
            RecordStatus::SkippedUnresolved => self.skipped_unresolved += 1,
            RecordStatus::FailedApply => self.failed_apply += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Writes backed-up playback state onto a target user, one record at a time
pub struct RestoreApplier<'a> {
    server: &'a dyn MediaServer,
    options: RestoreOptions,
}

impl<'a> RestoreApplier<'a> {
    pub fn new(server: &'a dyn MediaServer, options: RestoreOptions) -> Self {
        Self { server, options }
    }

    /// Resolve and apply every record of `document` in order.
    ///
    /// Unresolved records and failed updates are counted and the batch goes
    /// on. Only connection and credential failures end the run early.
    pub async fn apply(
        &self,
        document: &BackupDocument,
        index: &ResolutionIndex,
        target_user: &ServerUser,
    ) -> Result<RestoreSummary, Error> {
        info!(
            source_user = %document.source_user().name,
            target_user = %target_user.name,
            records = document.len(),
            dry_run = self.options.dry_run,
            "Starting restore"
        );
        let mut tracker = ProgressTracker::new("Restore", Some(document.len()), 50);
        let mut summary = RestoreSummary::default();

        for record in document.records() {
            let outcome = self.apply_record(record, index, target_user).await?;
            match outcome.status {
                RecordStatus::Applied | RecordStatus::WouldApply => tracker.record_succeeded(),
                RecordStatus::SkippedUnresolved => tracker.record_skipped(),
                RecordStatus::FailedApply => tracker.record_failed("update failed"),
            }
            summary.push(outcome);
            tracker.log_progress();
        }

        tracker.log_summary();
        info!(
            applied = summary.applied,
            would_apply = summary.would_apply,
            skipped_unresolved = summary.skipped_unresolved,
            failed_apply = summary.failed_apply,
            "Restore finished"
        );
        Ok(summary)
    }

    async fn apply_record(
        &self,
        record: &PlaybackRecord,
        index: &ResolutionIndex,
        target_user: &ServerUser,
    ) -> Result<RecordOutcome, Error> {
        let mut outcome = RecordOutcome {
            record: record.label(),
            external_ids: record.external_ids.clone(),
            target: None,
            status: RecordStatus::SkippedUnresolved,
            reason: None,
        };

        let resolution = match index.resolve(&record.external_ids) {
            Some(resolution) => resolution,
            None => {
                let err = Error::UnresolvedRecord {
                    record: record.label(),
                    external_ids: record.external_ids.clone(),
                };
                warn!(error = %err, "Skipping record");
                outcome.reason = Some(err.to_string());
                return Ok(outcome);
            }
        };

        let matched = format!("{}:{}", resolution.kind, resolution.value);
        if self.options.dry_run {
            info!(
                record = %outcome.record,
                matched = %matched,
                target_item = %resolution.item_id,
                "Would apply playback state"
            );
            outcome.status = RecordStatus::WouldApply;
            outcome.target = Some(resolution);
            return Ok(outcome);
        }

        let result = self
            .server
            .set_playback_state(&target_user.id, &resolution.item_id, &record.state)
            .await;
        match result {
            Ok(()) => {
                info!(
                    record = %outcome.record,
                    matched = %matched,
                    target_item = %resolution.item_id,
                    played = record.state.played,
                    position_ticks = record.state.playback_position_ticks,
                    favorite = record.state.is_favorite,
                    "Applied playback state"
                );
                outcome.status = RecordStatus::Applied;
            }
            Err(source) if source.is_fatal() => return Err(source.into()),
            Err(source) => {
                let err = Error::Apply {
                    item_id: resolution.item_id.clone(),
                    source,
                };
                warn!(record = %outcome.record, error = %err, "Update failed");
                outcome.status = RecordStatus::FailedApply;
                outcome.reason = Some(err.to_string());
            }
        }
        outcome.target = Some(resolution);
        Ok(outcome)
    }
}
