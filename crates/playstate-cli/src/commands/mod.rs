pub mod backup;
pub mod config;
pub mod inspect;
pub mod prompts;
pub mod restore;
pub mod run_ui;
pub mod users;

use crate::output::Output;
use color_eyre::Result;
use playstate_config::{
    mask_secret, Config, CredentialStore, InputProvider, NonInteractiveInput, PathManager, RunSettings,
    SettingsOverrides,
};
use playstate_server::{JellyfinServer, MediaServer};
use std::io::IsTerminal;
use tracing::info;

/// Flags shared by every server command
pub struct GlobalArgs {
    pub server_url: Option<String>,
    pub api_key: Option<String>,
    pub non_interactive: bool,
}

/// Prompts when attached to a terminal, never otherwise
pub fn input_provider(non_interactive: bool) -> Box<dyn InputProvider> {
    if non_interactive || !std::io::stdin().is_terminal() {
        Box::new(NonInteractiveInput)
    } else {
        Box::new(prompts::DialoguerInput)
    }
}

pub fn load_credentials(paths: &PathManager) -> Result<CredentialStore> {
    let path = paths.credentials_file();
    let mut credentials = CredentialStore::new(path.clone());
    credentials
        .load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials from {}: {}", path.display(), e))?;
    Ok(credentials)
}

pub fn resolve_settings(
    global: &GlobalArgs,
    config: &Config,
    paths: &PathManager,
    mut overrides: SettingsOverrides,
    input: &mut dyn InputProvider,
) -> Result<RunSettings> {
    let credentials = load_credentials(paths)?;
    overrides.server_url = global.server_url.clone();
    overrides.api_key = global.api_key.clone();
    let settings = RunSettings::resolve(config, &credentials, overrides, input)?;
    info!(
        server_url = %settings.server_url,
        api_key = %mask_secret(&settings.api_key),
        backup_file = %settings.backup_file.display(),
        page_size = settings.page_size,
        "Resolved settings"
    );
    Ok(settings)
}

/// Build the client and check the server answers with this key
pub async fn connect(settings: &RunSettings, output: &Output) -> Result<JellyfinServer> {
    let server = JellyfinServer::new(&settings.server_url, &settings.api_key, settings.timeout)?;
    let info = server
        .verify_connection()
        .await
        .map_err(playstate_core::Error::from)?;
    info!(
        server = %info.server_name,
        version = info.version.as_deref().unwrap_or("unknown"),
        url = %settings.server_url,
        "Connected"
    );
    output.success(format!(
        "Connected to {} ({})",
        info.server_name,
        info.version.as_deref().unwrap_or("unknown version")
    ));
    Ok(server)
}
