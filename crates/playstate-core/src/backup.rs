use playstate_models::{BackupDocument, PlaybackRecord, ServerItem, ServerUser};
use playstate_server::{ItemQuery, MediaServer};
use serde::Serialize;
use tracing::{info, warn};
use crate::error::Error;
use crate::pager::ItemPager;
use crate::progress::ProgressTracker;

#[derive(Debug, Clone)]
pub struct BackupOptions {
    pub query: ItemQuery,
    pub page_size: usize,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            query: ItemQuery::default(),
            page_size: 500,
        }
    }
}

/// An item that could not be read and was left out of the backup
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemFailure {
    pub item_id: String,
    pub name: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BackupReport {
    pub recorded: usize,
    /// Recorded, but carrying no external ID
    pub unresolvable: usize,
    pub failed: Vec<ItemFailure>,
}

/// Reads every item a user can see and turns it into playback records
pub struct BackupCollector<'a> {
    server: &'a dyn MediaServer,
    options: BackupOptions,
}

impl<'a> BackupCollector<'a> {
    pub fn new(server: &'a dyn MediaServer, options: BackupOptions) -> Self {
        Self { server, options }
    }

    /// Enumerate the user's items and fetch each one.
    ///
    /// A failed item fetch is logged and the item skipped. Connection and
    /// credential failures abort the run.
    pub async fn collect(&self, user: &ServerUser) -> Result<(BackupDocument, BackupReport), Error> {
        info!(user = %user.name, user_id = %user.id, "Starting backup");
        let mut pager = ItemPager::for_user(self.server, &user.id, self.options.query.clone(), self.options.page_size);
        let mut tracker = ProgressTracker::new("Backup", None, 50);
        let mut records = Vec::new();
        let mut report = BackupReport::default();

        while let Some(page) = pager.next_page().await? {
            if let Some(total) = pager.total() {
                tracker.set_total(total);
            }
            for listed in page {
                match self.read_item(user, &listed).await {
                    Ok(record) => {
                        if record.unresolvable {
                            warn!(
                                item = %record.label(),
                                "Item has no external IDs, it will not be restorable"
                            );
                            report.unresolvable += 1;
                        }
                        report.recorded += 1;
                        tracker.record_succeeded();
                        records.push(record);
                    }
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => {
                        warn!(item = %listed.label(), error = %err, "Skipping item");
                        tracker.record_failed(failure_category(&err));
                        report.failed.push(ItemFailure {
                            item_id: listed.id.clone(),
                            name: listed.name.clone(),
                            error: err.to_string(),
                        });
                    }
                }
                tracker.log_progress();
            }
        }

        tracker.log_summary();
        info!(
            recorded = report.recorded,
            unresolvable = report.unresolvable,
            failed = report.failed.len(),
            "Backup finished"
        );
        let document = BackupDocument::new(user.clone(), Some(self.server.base_url().to_string()), records);
        Ok((document, report))
    }

    /// Back up each user in turn, one document per user.
    /// A fatal error for any user ends the whole run.
    pub async fn collect_users(&self, users: &[ServerUser]) -> Result<Vec<(BackupDocument, BackupReport)>, Error> {
        let mut results = Vec::with_capacity(users.len());
        for user in users {
            results.push(self.collect(user).await?);
        }
        Ok(results)
    }

    async fn read_item(&self, user: &ServerUser, listed: &ServerItem) -> Result<PlaybackRecord, Error> {
        let item = self
            .server
            .get_user_item(&user.id, &listed.id)
            .await
            .map_err(|source| match Error::from(source) {
                Error::Server(source) => Error::ItemFetch {
                    item_id: listed.id.clone(),
                    source,
                },
                fatal => fatal,
            })?;

        let external_ids = if item.external_ids.is_empty() {
            listed.external_ids.clone()
        } else {
            item.external_ids
        };
        let state = item.state.or_else(|| listed.state.clone()).unwrap_or_default();
        let record = PlaybackRecord::new(external_ids, item.id, state)
            .with_metadata(item.name.or_else(|| listed.name.clone()), item.item_type.or_else(|| listed.item_type.clone()));

        info!(
            item = %record.label(),
            external_ids = %record.external_ids,
            played = record.state.played,
            position_ticks = record.state.playback_position_ticks,
            favorite = record.state.is_favorite,
            "Read item"
        );
        Ok(record)
    }
}

fn failure_category(err: &Error) -> &'static str {
    match err {
        Error::ItemFetch { source, .. } => match source {
            playstate_server::ServerError::Http { status: 404, .. } => "not found",
            playstate_server::ServerError::Http { .. } => "HTTP error",
            playstate_server::ServerError::Decode { .. } => "decode error",
            _ => "request error",
        },
        _ => "other",
    }
}
