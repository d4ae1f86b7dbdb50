pub mod config;
pub mod credentials;
pub mod paths;
pub mod settings;

pub use config::{BackupConfig, Config, LoggingConfig, ServerConfig, DEFAULT_BACKUP_FILE, DEFAULT_SERVER_URL};
pub use credentials::{mask_secret, CredentialStore};
pub use paths::{container_base_path, PathManager};
pub use settings::{normalize_server_url, InputProvider, NonInteractiveInput, RunSettings, ScriptedInput, SettingsError, SettingsOverrides};
