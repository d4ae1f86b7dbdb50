use playstate_models::{BackupDocument, LegacyEntry, ServerUser};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, info, warn};
use crate::error::Error;

/// Write one user's document as pretty JSON, creating parent directories.
/// Written to a sibling `.tmp` file and renamed into place.
pub fn write_backup(path: &Path, document: &BackupDocument) -> Result<(), Error> {
    write_json(path, document)?;
    info!(path = %path.display(), records = document.len(), "Wrote backup file");
    Ok(())
}

/// Write several users' documents as one JSON array
pub fn write_backups(path: &Path, documents: &[BackupDocument]) -> Result<(), Error> {
    write_json(path, documents)?;
    info!(
        path = %path.display(),
        users = documents.len(),
        records = documents.iter().map(BackupDocument::len).sum::<usize>(),
        "Wrote backup file"
    );
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), Error> {
    let file_error = |source| Error::BackupFile {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(file_error)?;
    }

    let json = serde_json::to_string_pretty(value).map_err(|source| Error::BackupFormat {
        path: path.to_path_buf(),
        source,
    })?;

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = Path::new(&temp_name);
    std::fs::write(temp_path, json).map_err(file_error)?;
    std::fs::rename(temp_path, path).map_err(file_error)
}

/// Every document a backup file holds.
///
/// Accepts a single document, an array of documents, or the flat per-entry
/// array of the earlier export scripts. The flat format is split by
/// `Username` into one document per user, ordered by name.
pub fn read_backups(path: &Path) -> Result<Vec<BackupDocument>, Error> {
    let file_error = |source| Error::BackupFile {
        path: path.to_path_buf(),
        source,
    };
    let format_error = |source| Error::BackupFormat {
        path: path.to_path_buf(),
        source,
    };

    let content = std::fs::read_to_string(path).map_err(file_error)?;
    let value: Value = serde_json::from_str(&content).map_err(format_error)?;

    let documents = match value {
        Value::Array(entries) if entries.first().map(is_legacy_entry).unwrap_or(false) => {
            let entries: Vec<LegacyEntry> =
                serde_json::from_value(Value::Array(entries)).map_err(format_error)?;
            let modified = std::fs::metadata(path)
                .and_then(|meta| meta.modified())
                .unwrap_or_else(|_| SystemTime::now());
            info!(path = %path.display(), entries = entries.len(), "Converting flat export");
            split_legacy_entries(entries, modified)
        }
        Value::Array(entries) => serde_json::from_value(Value::Array(entries)).map_err(format_error)?,
        other => vec![serde_json::from_value(other).map_err(format_error)?],
    };

    for document in &documents {
        debug!(
            path = %path.display(),
            records = document.len(),
            source_user = %document.source_user().name,
            "Loaded backup document"
        );
    }
    Ok(documents)
}

fn is_legacy_entry(value: &Value) -> bool {
    value
        .as_object()
        .map(|entry| entry.contains_key("Username") || entry.contains_key("ItemId"))
        .unwrap_or(false)
}

fn split_legacy_entries(entries: Vec<LegacyEntry>, modified: SystemTime) -> Vec<BackupDocument> {
    let mut by_user: BTreeMap<String, (ServerUser, Vec<LegacyEntry>)> = BTreeMap::new();
    let mut skipped = 0;
    for entry in entries {
        let Some(name) = entry.username.clone().filter(|n| !n.trim().is_empty()) else {
            skipped += 1;
            continue;
        };
        let id = entry.user_id.clone().unwrap_or_else(|| name.clone());
        by_user
            .entry(name.clone())
            .or_insert_with(|| (ServerUser::new(id, name), Vec::new()))
            .1
            .push(entry);
    }
    if skipped > 0 {
        warn!(skipped, "Ignoring flat export entries without a Username");
    }

    by_user
        .into_values()
        .map(|(user, entries)| {
            let records = entries.iter().map(LegacyEntry::to_record).collect();
            BackupDocument::new(user, None, records).with_created_at(modified)
        })
        .collect()
}
