use super::run_ui::RunUi;
use super::GlobalArgs;
use crate::output::{styled_table, Output};
use color_eyre::Result;
use playstate_config::{Config, PathManager, SettingsOverrides};
use playstate_core::{
    select_user, write_backup, write_backups, BackupCollector, BackupOptions, BackupReport,
};
use playstate_models::{BackupDocument, ServerUser};
use playstate_server::{ItemQuery, MediaServer};
use serde_json::json;
use std::path::PathBuf;

/// Which server users a backup covers
pub enum UserSelection {
    /// One user by name or ID, prompted for when `None`
    One(Option<String>),
    All,
}

pub async fn run_backup(
    global: &GlobalArgs,
    config: &Config,
    paths: &PathManager,
    selection: UserSelection,
    file: Option<PathBuf>,
    played_only: bool,
    output: &Output,
) -> Result<()> {
    let mut input = super::input_provider(global.non_interactive);
    let overrides = SettingsOverrides {
        backup_file: file,
        played_only,
        ..SettingsOverrides::default()
    };
    let settings = super::resolve_settings(global, config, paths, overrides, input.as_mut())?;
    let server = super::connect(&settings, output).await?;

    let users = server.list_users().await.map_err(playstate_core::Error::from)?;
    let selected: Vec<ServerUser> = match selection {
        UserSelection::All if users.is_empty() => return Err(playstate_core::Error::NoUsers.into()),
        UserSelection::All => users,
        UserSelection::One(name) => vec![select_user(&users, name.as_deref(), "User to back up", input.as_mut())?],
    };

    let options = BackupOptions {
        query: ItemQuery {
            item_types: settings.item_types.clone(),
            played_only: settings.played_only,
        },
        page_size: settings.page_size,
    };

    let ui = RunUi::new(output.is_human());
    ui.set_message(match selected.as_slice() {
        [user] => format!("Reading playback state of {}...", user.name),
        _ => format!("Reading playback state of {} users...", selected.len()),
    });
    let results = BackupCollector::new(&server, options).collect_users(&selected).await?;
    ui.finish();

    let documents: Vec<BackupDocument> = results.iter().map(|(doc, _)| doc.clone()).collect();
    match documents.as_slice() {
        [single] => write_backup(&settings.backup_file, single)?,
        _ => write_backups(&settings.backup_file, &documents)?,
    }

    let recorded: usize = results.iter().map(|(_, report)| report.recorded).sum();
    output.success(format!(
        "Backed up {} items of {} to {}",
        recorded,
        selected.iter().map(|u| u.name.as_str()).collect::<Vec<_>>().join(", "),
        settings.backup_file.display()
    ));
    output.table(&report_table(&results));

    let unresolvable: usize = results.iter().map(|(_, report)| report.unresolvable).sum();
    if unresolvable > 0 {
        output.warn(format!(
            "{} items have no IMDB/TMDB/TVDB ID and cannot be restored (run 'playstate inspect' for the list)",
            unresolvable
        ));
    }
    let failed: usize = results.iter().map(|(_, report)| report.failed.len()).sum();
    if failed > 0 {
        output.warn(format!("{} items could not be read and were left out:", failed));
        output.table(&failure_table(&results));
    }
    output.json(&json!({
        "type": "backup",
        "file": settings.backup_file.display().to_string(),
        "users": results
            .iter()
            .map(|(doc, report)| json!({ "user": doc.source_user(), "report": report }))
            .collect::<Vec<_>>(),
    }));
    Ok(())
}

fn report_table(results: &[(BackupDocument, BackupReport)]) -> comfy_table::Table {
    let mut table = styled_table(vec!["User", "Recorded", "Unresolvable", "Failed"]);
    for (doc, report) in results {
        table.add_row(vec![
            doc.source_user().name.clone(),
            report.recorded.to_string(),
            report.unresolvable.to_string(),
            report.failed.len().to_string(),
        ]);
    }
    table
}

fn failure_table(results: &[(BackupDocument, BackupReport)]) -> comfy_table::Table {
    let mut table = styled_table(vec!["User", "Item", "Name", "Error"]);
    for (doc, report) in results {
        for failure in &report.failed {
            table.add_row(vec![
                doc.source_user().name.clone(),
                failure.item_id.clone(),
                failure.name.clone().unwrap_or_default(),
                failure.error.clone(),
            ]);
        }
    }
    table
}
