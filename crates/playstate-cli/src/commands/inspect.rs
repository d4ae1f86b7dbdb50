use crate::output::{styled_table, Output};
use color_eyre::Result;
use playstate_config::{Config, DEFAULT_BACKUP_FILE};
use playstate_core::read_backups;
use playstate_models::BackupDocument;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

pub fn run_inspect(config: &Config, file: Option<PathBuf>, output: &Output) -> Result<()> {
    let path = file
        .or_else(|| config.backup.file.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_FILE));
    let documents = read_backups(&path)?;
    if documents.is_empty() {
        output.warn(format!("{} holds no backed-up users", path.display()));
    }

    let summaries: Vec<Value> = documents
        .iter()
        .map(|document| inspect_document(&path, document, output))
        .collect();

    output.json(&json!({
        "type": "inspect",
        "file": path.display().to_string(),
        "documents": summaries,
    }));
    Ok(())
}

fn inspect_document(path: &Path, document: &BackupDocument, output: &Output) -> Value {
    let coverage = document.coverage();
    let unresolvable: Vec<_> = document.unresolvable_records().collect();

    let mut header = styled_table(vec!["Backup", ""]);
    header.add_row(vec!["File".to_string(), path.display().to_string()]);
    header.add_row(vec![
        "User".to_string(),
        format!("{} ({})", document.source_user().name, document.source_user().id),
    ]);
    header.add_row(vec![
        "Server".to_string(),
        document.server_url().unwrap_or("unknown").to_string(),
    ]);
    header.add_row(vec!["Created".to_string(), document.created_at().to_rfc3339()]);
    header.add_row(vec!["Records".to_string(), document.len().to_string()]);
    header.add_row(vec![
        "Resolvable".to_string(),
        (document.len() - unresolvable.len()).to_string(),
    ]);
    output.table(&header);

    let mut ids = styled_table(vec!["IMDB", "TMDB", "TVDB", "No ID"]);
    ids.add_row(vec![
        coverage.imdb.to_string(),
        coverage.tmdb.to_string(),
        coverage.tvdb.to_string(),
        coverage.none.to_string(),
    ]);
    output.table(&ids);

    if !unresolvable.is_empty() {
        output.warn(format!(
            "{} records of {} cannot be restored:",
            unresolvable.len(),
            document.source_user().name
        ));
        let mut table = styled_table(vec!["Item", "Type", "Name"]);
        for record in &unresolvable {
            table.add_row(vec![
                record.internal_id.clone(),
                record.item_type.clone().unwrap_or_default(),
                record.name.clone().unwrap_or_default(),
            ]);
        }
        output.table(&table);
    }

    json!({
        "source_user": document.source_user(),
        "created_at": document.created_at(),
        "records": document.len(),
        "coverage": coverage,
        "unresolvable": unresolvable,
    })
}
