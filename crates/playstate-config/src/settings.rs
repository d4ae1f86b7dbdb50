use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use crate::config::{Config, DEFAULT_BACKUP_FILE, DEFAULT_SERVER_URL};
use crate::credentials::{mask_secret, CredentialStore};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{0} is required but was not provided")]
    Missing(String),

    #[error("invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to read input: {0}")]
    Input(String),
}

/// Source of values that were not preset through flags or config files.
///
/// The CLI answers with interactive prompts; batch callers and tests answer
/// programmatically.
pub trait InputProvider {
    /// Free-text value. An empty answer selects `default` when one is given.
    fn text(&mut self, prompt: &str, default: Option<&str>) -> Result<String, SettingsError>;

    /// Masked value such as an API key
    fn secret(&mut self, prompt: &str) -> Result<String, SettingsError>;

    /// Pick one of `options`, returning its index
    fn select(&mut self, prompt: &str, options: &[String]) -> Result<usize, SettingsError>;
}

/// Never prompts: falls back to the default where one exists, fails otherwise
#[derive(Debug, Default)]
pub struct NonInteractiveInput;

impl InputProvider for NonInteractiveInput {
    fn text(&mut self, prompt: &str, default: Option<&str>) -> Result<String, SettingsError> {
        default
            .map(str::to_string)
            .ok_or_else(|| SettingsError::Missing(prompt.to_string()))
    }

    fn secret(&mut self, prompt: &str) -> Result<String, SettingsError> {
        Err(SettingsError::Missing(prompt.to_string()))
    }

    fn select(&mut self, prompt: &str, _options: &[String]) -> Result<usize, SettingsError> {
        Err(SettingsError::Missing(prompt.to_string()))
    }
}

/// Answers prompts from a fixed list, in order.
///
/// For `select`, an answer is either a 1-based number or the option text.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    answers: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    fn next(&mut self, prompt: &str) -> Result<String, SettingsError> {
        self.answers
            .pop_front()
            .ok_or_else(|| SettingsError::Missing(prompt.to_string()))
    }
}

impl InputProvider for ScriptedInput {
    fn text(&mut self, prompt: &str, default: Option<&str>) -> Result<String, SettingsError> {
        let answer = self.next(prompt)?;
        match (answer.trim().is_empty(), default) {
            (true, Some(default)) => Ok(default.to_string()),
            _ => Ok(answer),
        }
    }

    fn secret(&mut self, prompt: &str) -> Result<String, SettingsError> {
        self.next(prompt)
    }

    fn select(&mut self, prompt: &str, options: &[String]) -> Result<usize, SettingsError> {
        let answer = self.next(prompt)?;
        let answer = answer.trim();
        if let Ok(number) = answer.parse::<usize>() {
            if number >= 1 && number <= options.len() {
                return Ok(number - 1);
            }
        }
        options
            .iter()
            .position(|option| option == answer)
            .ok_or_else(|| SettingsError::Input(format!("'{}' is not a valid choice for '{}'", answer, prompt)))
    }
}

/// Trim the URL, drop trailing `/`, and require an http(s) scheme.
/// Jellyfin answers 404 when paths are appended to a URL ending in `/`.
pub fn normalize_server_url(url: &str) -> Result<String, SettingsError> {
    let normalized = url.trim().trim_end_matches('/').to_string();
    let rest = normalized
        .strip_prefix("http://")
        .or_else(|| normalized.strip_prefix("https://"))
        .ok_or_else(|| SettingsError::InvalidUrl {
            url: url.to_string(),
            reason: "must start with http:// or https://".to_string(),
        })?;
    if rest.is_empty() {
        return Err(SettingsError::InvalidUrl {
            url: url.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(normalized)
}

/// Values given on the command line; they win over config files
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub server_url: Option<String>,
    pub api_key: Option<String>,
    pub backup_file: Option<PathBuf>,
    pub played_only: bool,
}

/// Everything a run needs, resolved once at startup and never changed
#[derive(Clone)]
pub struct RunSettings {
    pub server_url: String,
    pub api_key: String,
    pub page_size: usize,
    pub timeout: Option<Duration>,
    pub item_types: Vec<String>,
    pub backup_file: PathBuf,
    pub played_only: bool,
}

impl fmt::Debug for RunSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunSettings")
            .field("server_url", &self.server_url)
            .field("api_key", &mask_secret(&self.api_key))
            .field("page_size", &self.page_size)
            .field("timeout", &self.timeout)
            .field("item_types", &self.item_types)
            .field("backup_file", &self.backup_file)
            .field("played_only", &self.played_only)
            .finish()
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl RunSettings {
    /// Resolve each value from, in order: overrides, config/credentials, `input`.
    pub fn resolve(
        config: &Config,
        credentials: &CredentialStore,
        overrides: SettingsOverrides,
        input: &mut dyn InputProvider,
    ) -> Result<Self, SettingsError> {
        let raw_url = match non_blank(overrides.server_url.as_ref()).or_else(|| non_blank(config.server.url.as_ref())) {
            Some(url) => url,
            None => input.text("Jellyfin server URL", Some(DEFAULT_SERVER_URL))?,
        };
        let server_url = normalize_server_url(&raw_url)?;

        let api_key = match non_blank(overrides.api_key.as_ref()).or_else(|| non_blank(credentials.get_api_key())) {
            Some(key) => key,
            None => input.secret("Jellyfin API key")?.trim().to_string(),
        };
        if api_key.is_empty() {
            return Err(SettingsError::Missing("Jellyfin API key".to_string()));
        }

        let backup_file = match overrides.backup_file.or_else(|| config.backup.file.clone()) {
            Some(path) => path,
            None => PathBuf::from(input.text("Backup file path", Some(DEFAULT_BACKUP_FILE))?.trim()),
        };

        let timeout = match config.server.timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(Self {
            server_url,
            api_key,
            page_size: config.server.page_size.max(1),
            timeout,
            item_types: config.server.item_types.clone(),
            backup_file,
            played_only: overrides.played_only || config.backup.played_only,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_credentials() -> CredentialStore {
        CredentialStore::new(PathBuf::from("/nonexistent/credentials.toml"))
    }

    #[test]
    fn test_normalize_server_url() {
        assert_eq!(normalize_server_url(" http://jf:8096/ ").unwrap(), "http://jf:8096");
        assert_eq!(normalize_server_url("https://media.example.com/jellyfin//").unwrap(), "https://media.example.com/jellyfin");
        assert!(normalize_server_url("jf:8096").is_err());
        assert!(normalize_server_url("http://").is_err());
    }

    #[test]
    fn test_resolve_prompts_for_missing_values() {
        let mut input = ScriptedInput::new(["http://192.168.1.14:8096/", "secret-key", ""]);
        let settings = RunSettings::resolve(
            &Config::default(),
            &empty_credentials(),
            SettingsOverrides::default(),
            &mut input,
        )
        .unwrap();
        assert_eq!(settings.server_url, "http://192.168.1.14:8096");
        assert_eq!(settings.api_key, "secret-key");
        assert_eq!(settings.backup_file, PathBuf::from(DEFAULT_BACKUP_FILE));
        assert_eq!(settings.timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_preset_values_skip_prompts() {
        let mut config = Config::default();
        config.server.url = Some("http://jf:8096".to_string());
        config.backup.file = Some(PathBuf::from("/backups/alice.json"));
        config.server.timeout_seconds = 0;
        let mut credentials = empty_credentials();
        credentials.set_api_key("stored-key".to_string());

        let settings = RunSettings::resolve(&config, &credentials, SettingsOverrides::default(), &mut NonInteractiveInput).unwrap();
        assert_eq!(settings.server_url, "http://jf:8096");
        assert_eq!(settings.api_key, "stored-key");
        assert_eq!(settings.backup_file, PathBuf::from("/backups/alice.json"));
        assert_eq!(settings.timeout, None);
    }

    #[test]
    fn test_overrides_win_over_config() {
        let mut config = Config::default();
        config.server.url = Some("http://old:8096".to_string());
        let mut credentials = empty_credentials();
        credentials.set_api_key("stored-key".to_string());
        let overrides = SettingsOverrides {
            server_url: Some("http://new:8096/".to_string()),
            api_key: Some("flag-key".to_string()),
            backup_file: Some(PathBuf::from("out.json")),
            played_only: true,
        };

        let settings = RunSettings::resolve(&config, &credentials, overrides, &mut NonInteractiveInput).unwrap();
        assert_eq!(settings.server_url, "http://new:8096");
        assert_eq!(settings.api_key, "flag-key");
        assert!(settings.played_only);
    }

    #[test]
    fn test_non_interactive_missing_api_key_fails() {
        let mut config = Config::default();
        config.server.url = Some("http://jf:8096".to_string());
        let result = RunSettings::resolve(&config, &empty_credentials(), SettingsOverrides::default(), &mut NonInteractiveInput);
        assert!(matches!(result, Err(SettingsError::Missing(_))));
    }

    #[test]
    fn test_debug_masks_api_key() {
        let mut input = ScriptedInput::new(["http://jf:8096", "supersecret", "b.json"]);
        let settings = RunSettings::resolve(&Config::default(), &empty_credentials(), SettingsOverrides::default(), &mut input).unwrap();
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("***********"));
    }

    #[test]
    fn test_scripted_select() {
        let options = vec!["alice".to_string(), "bob".to_string()];
        let mut input = ScriptedInput::new(["2", "alice", "7"]);
        assert_eq!(input.select("user", &options).unwrap(), 1);
        assert_eq!(input.select("user", &options).unwrap(), 0);
        assert!(input.select("user", &options).is_err());
    }
}
