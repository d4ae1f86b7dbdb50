use super::run_ui::RunUi;
use super::GlobalArgs;
use crate::output::{styled_table, Output};
use color_eyre::Result;
use owo_colors::OwoColorize;
use playstate_config::{Config, PathManager, SettingsOverrides};
use playstate_core::{
    read_backups, select_document, select_user, RecordStatus, ResolutionIndex, RestoreApplier, RestoreOptions,
    RestoreSummary,
};
use playstate_server::{ItemQuery, MediaServer};
use serde_json::json;
use std::path::PathBuf;

/// Rows of skipped/failed records shown on the console; the log has all of them
const MAX_LISTED_PROBLEMS: usize = 25;

pub struct RestoreArgs {
    /// Target user name or ID
    pub user: Option<String>,
    /// Backed-up user to restore from
    pub source_user: Option<String>,
    pub file: Option<PathBuf>,
    pub dry_run: bool,
}

pub async fn run_restore(
    global: &GlobalArgs,
    config: &Config,
    paths: &PathManager,
    args: RestoreArgs,
    output: &Output,
) -> Result<()> {
    let RestoreArgs { user, source_user, file, dry_run } = args;
    let mut input = super::input_provider(global.non_interactive);
    let overrides = SettingsOverrides {
        backup_file: file,
        ..SettingsOverrides::default()
    };
    let settings = super::resolve_settings(global, config, paths, overrides, input.as_mut())?;

    let documents = read_backups(&settings.backup_file)?;
    let document = select_document(&settings.backup_file, documents, source_user.as_deref(), input.as_mut())?;
    output.info(format!(
        "Loaded {} records of {} from {}",
        document.len(),
        document.source_user().name,
        settings.backup_file.display()
    ));
    let unresolvable = document.unresolvable_records().count();
    if unresolvable > 0 {
        output.warn(format!("{} records carry no external ID and will be skipped", unresolvable));
    }

    let server = super::connect(&settings, output).await?;
    let users = server.list_users().await.map_err(playstate_core::Error::from)?;
    let target = select_user(&users, user.as_deref(), "User to restore to", input.as_mut())?;

    let ui = RunUi::new(output.is_human());
    ui.set_message("Indexing target library by external ID...");
    let query = ItemQuery {
        item_types: settings.item_types.clone(),
        played_only: false,
    };
    let index = ResolutionIndex::build(&server, &query, settings.page_size).await?;
    if !index.collisions().is_empty() {
        output.warn(format!(
            "{} external IDs are shared by several items on the target server; the last one listed is used (details in the log)",
            index.collisions().len()
        ));
    }

    ui.set_message(if dry_run {
        format!("Resolving records for {}...", target.name)
    } else {
        format!("Applying playback state to {}...", target.name)
    });
    let summary = RestoreApplier::new(&server, RestoreOptions { dry_run })
        .apply(&document, &index, &target)
        .await?;
    ui.finish();

    if dry_run {
        output.success(format!(
            "Dry run: {} of {} records would be applied to {}",
            summary.would_apply,
            summary.total(),
            target.name
        ));
    } else {
        output.success(format!(
            "Applied {} of {} records to {}",
            summary.applied,
            summary.total(),
            target.name
        ));
    }
    output.table(&summary_table(&summary, dry_run));
    if summary.skipped_unresolved + summary.failed_apply > 0 {
        output.table(&problem_table(&summary));
    }
    if summary.failed_apply > 0 {
        output.error(format!("{} updates failed, see the log file for details", summary.failed_apply));
    }
    output.json(&json!({
        "type": "restore",
        "dry_run": dry_run,
        "source_user": document.source_user(),
        "target_user": target,
        "index": index.stats(),
        "collisions": index.collisions(),
        "summary": summary,
    }));
    Ok(())
}

fn summary_table(summary: &RestoreSummary, dry_run: bool) -> comfy_table::Table {
    let first = if dry_run { "Would apply" } else { "Applied" };
    let mut table = styled_table(vec![first, "Skipped (unresolved)", "Failed"]);
    let done = if dry_run { summary.would_apply } else { summary.applied };
    table.add_row(vec![
        done.to_string(),
        summary.skipped_unresolved.to_string(),
        summary.failed_apply.to_string(),
    ]);
    table
}

fn problem_table(summary: &RestoreSummary) -> comfy_table::Table {
    let mut table = styled_table(vec!["", "Record", "Reason"]);
    let problems = summary
        .outcomes
        .iter()
        .filter(|o| matches!(o.status, RecordStatus::SkippedUnresolved | RecordStatus::FailedApply));
    for outcome in problems.take(MAX_LISTED_PROBLEMS) {
        let marker = match outcome.status {
            RecordStatus::FailedApply => "✗".red().to_string(),
            _ => "–".yellow().to_string(),
        };
        table.add_row(vec![
            marker,
            outcome.record.clone(),
            outcome.reason.clone().unwrap_or_default(),
        ]);
    }
    table
}
