use super::GlobalArgs;
use crate::output::{styled_table, Output};
use color_eyre::Result;
use playstate_config::{Config, PathManager, SettingsOverrides};
use playstate_server::MediaServer;
use serde_json::json;
use std::path::PathBuf;

pub async fn run_users(global: &GlobalArgs, config: &Config, paths: &PathManager, output: &Output) -> Result<()> {
    let mut input = super::input_provider(global.non_interactive);
    // Listing users never touches a backup file
    let overrides = SettingsOverrides {
        backup_file: Some(PathBuf::new()),
        ..SettingsOverrides::default()
    };
    let settings = super::resolve_settings(global, config, paths, overrides, input.as_mut())?;
    let server = super::connect(&settings, output).await?;
    let users = server.list_users().await.map_err(playstate_core::Error::from)?;

    let mut table = styled_table(vec!["Name", "ID"]);
    for user in &users {
        table.add_row(vec![user.name.clone(), user.id.clone()]);
    }
    output.table(&table);
    output.json(&json!({ "type": "users", "users": users }));
    Ok(())
}
