use playstate_config::SettingsError;
use playstate_models::ExternalIds;
use playstate_server::ServerError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors of a backup or restore run.
///
/// `Connection` and `Auth` abort the run. `ItemFetch`, `UnresolvedRecord` and
/// `Apply` describe a single item or record; batch operations log them and
/// keep going, they never return them.
#[derive(Debug, Error)]
pub enum Error {
    #[error("connection error: {0}")]
    Connection(#[source] ServerError),

    #[error("authentication failed: {0}")]
    Auth(#[source] ServerError),

    #[error("failed to fetch item {item_id}: {source}")]
    ItemFetch {
        item_id: String,
        #[source]
        source: ServerError,
    },

    #[error("no target item matches {external_ids} (record {record})")]
    UnresolvedRecord { record: String, external_ids: ExternalIds },

    #[error("failed to apply playback state to item {item_id}: {source}")]
    Apply {
        item_id: String,
        #[source]
        source: ServerError,
    },

    #[error("cannot access backup file {path}: {source}")]
    BackupFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a valid backup document: {source}")]
    BackupFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} holds no backed-up users")]
    EmptyBackup(PathBuf),

    #[error("user '{0}' not found on server")]
    UserNotFound(String),

    #[error("user '{0}' not found in backup file")]
    SourceUserNotFound(String),

    #[error("server has no users")]
    NoUsers,

    #[error("server request failed: {0}")]
    Server(#[source] ServerError),

    #[error(transparent)]
    Input(#[from] SettingsError),
}

impl Error {
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::ItemFetch { .. } | Error::UnresolvedRecord { .. } | Error::Apply { .. }
        )
    }
}

impl From<ServerError> for Error {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::Auth { .. } => Error::Auth(err),
            ServerError::Connection { .. } | ServerError::InvalidConfig(_) => Error::Connection(err),
            _ => Error::Server(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_map_to_taxonomy() {
        let err: Error = ServerError::from_status("GET", "http://jf/Users", 401, "").into();
        assert!(matches!(err, Error::Auth(_)));

        let err: Error = ServerError::Connection {
            url: "http://jf".to_string(),
            message: "refused".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Connection(_)));

        let err: Error = ServerError::from_status("GET", "http://jf/Items", 500, "").into();
        assert!(matches!(err, Error::Server(_)));
    }

    #[test]
    fn test_per_item_errors_are_not_fatal() {
        let err = Error::UnresolvedRecord {
            record: "abc".to_string(),
            external_ids: ExternalIds::new(),
        };
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "no target item matches <no external ids> (record abc)");
        assert!(Error::UserNotFound("bob".to_string()).is_fatal());
    }
}
