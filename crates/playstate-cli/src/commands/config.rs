use super::GlobalArgs;
use crate::output::{styled_table, Output};
use crate::ConfigCommands;
use color_eyre::Result;
use playstate_config::{
    mask_secret, normalize_server_url, Config, PathManager, DEFAULT_BACKUP_FILE, DEFAULT_SERVER_URL,
};
use serde_json::json;

pub fn run_config(cmd: ConfigCommands, global: &GlobalArgs, config: &Config, paths: &PathManager, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show_config(config, paths, output),
        ConfigCommands::Server { url, api_key } => {
            configure_server(url.or_else(|| global.server_url.clone()), api_key.or_else(|| global.api_key.clone()), global, config, paths, output)
        }
    }
}

fn show_config(config: &Config, paths: &PathManager, output: &Output) -> Result<()> {
    let credentials = super::load_credentials(paths)?;
    let api_key = credentials
        .get_api_key()
        .map(|k| mask_secret(k))
        .unwrap_or_else(|| "<not set>".to_string());
    let url = config.server.url.clone().unwrap_or_else(|| format!("<prompt, default {}>", DEFAULT_SERVER_URL));
    let backup_file = config
        .backup
        .file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| format!("<prompt, default {}>", DEFAULT_BACKUP_FILE));
    let log_file = config.logging.file.clone().unwrap_or_else(|| paths.log_file());

    let mut files = styled_table(vec!["File", "Path"]);
    files.add_row(vec!["Config".to_string(), paths.config_file().display().to_string()]);
    files.add_row(vec!["Credentials".to_string(), paths.credentials_file().display().to_string()]);
    files.add_row(vec!["Log".to_string(), log_file.display().to_string()]);
    output.table(&files);

    let mut settings = styled_table(vec!["Setting", "Value"]);
    settings.add_row(vec!["Server URL".to_string(), url]);
    settings.add_row(vec!["API key".to_string(), api_key.clone()]);
    settings.add_row(vec!["Page size".to_string(), config.server.page_size.to_string()]);
    settings.add_row(vec!["Timeout (s)".to_string(), config.server.timeout_seconds.to_string()]);
    settings.add_row(vec!["Item types".to_string(), config.server.item_types.join(", ")]);
    settings.add_row(vec!["Backup file".to_string(), backup_file]);
    settings.add_row(vec!["Played only".to_string(), config.backup.played_only.to_string()]);
    output.table(&settings);

    output.json(&json!({
        "type": "config",
        "config_file": paths.config_file().display().to_string(),
        "credentials_file": paths.credentials_file().display().to_string(),
        "log_file": log_file.display().to_string(),
        "server": {
            "url": config.server.url,
            "api_key": api_key,
            "page_size": config.server.page_size,
            "timeout_seconds": config.server.timeout_seconds,
            "item_types": config.server.item_types,
        },
        "backup": {
            "file": config.backup.file.as_ref().map(|p| p.display().to_string()),
            "played_only": config.backup.played_only,
        },
    }));
    Ok(())
}

fn configure_server(
    url: Option<String>,
    api_key: Option<String>,
    global: &GlobalArgs,
    config: &Config,
    paths: &PathManager,
    output: &Output,
) -> Result<()> {
    let mut input = super::input_provider(global.non_interactive);

    let url = match url {
        Some(url) => url,
        None => {
            let current = config.server.url.as_deref().unwrap_or(DEFAULT_SERVER_URL);
            input.text("Jellyfin server URL", Some(current))?
        }
    };
    let url = normalize_server_url(&url)?;

    let api_key = match api_key {
        Some(key) => key,
        None => input.secret("Jellyfin API key")?,
    };
    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        return Err(color_eyre::eyre::eyre!("API key cannot be empty"));
    }

    let mut updated = config.clone();
    updated.server.url = Some(url.clone());
    let config_file = paths.config_file();
    updated
        .save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    let mut credentials = super::load_credentials(paths)?;
    credentials.set_api_key(api_key.clone());
    credentials
        .save()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save credentials to {}: {}", paths.credentials_file().display(), e))?;

    tracing::info!(server_url = %url, api_key = %mask_secret(&api_key), "Saved server settings");
    output.success(format!("Saved server {} and API key {}", url, mask_secret(&api_key)));
    Ok(())
}
