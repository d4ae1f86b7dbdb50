use thiserror::Error;

/// Longest response body kept in an error message
const MAX_BODY_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cannot reach server at {url}: {message}")]
    Connection { url: String, message: String },

    #[error("server rejected the API key (HTTP {status}) for {url}")]
    Auth { status: u16, url: String },

    #[error("{method} {url} failed with HTTP {status}: {body}")]
    Http {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("invalid server configuration: {0}")]
    InvalidConfig(String),
}

impl ServerError {
    /// Connection-level failures end the whole run; anything else only
    /// affects the item or record being processed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ServerError::Connection { .. } | ServerError::Auth { .. } | ServerError::InvalidConfig(_)
        )
    }

    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_connect() {
            ServerError::Connection {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            ServerError::Decode {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            ServerError::Request {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    pub fn from_status(method: &'static str, url: &str, status: u16, body: &str) -> Self {
        match status {
            401 | 403 => ServerError::Auth {
                status,
                url: url.to_string(),
            },
            _ => ServerError::Http {
                method,
                url: url.to_string(),
                status,
                body: truncate_body(body),
            },
        }
    }
}

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= MAX_BODY_CHARS {
        body.to_string()
    } else {
        let truncated: String = body.chars().take(MAX_BODY_CHARS).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_statuses_are_fatal() {
        let err = ServerError::from_status("GET", "http://jf/Users", 401, "");
        assert!(matches!(err, ServerError::Auth { status: 401, .. }));
        assert!(err.is_fatal());

        let err = ServerError::from_status("GET", "http://jf/Users", 403, "");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_other_statuses_are_per_item() {
        let err = ServerError::from_status("POST", "http://jf/Users/u/Items/i/UserData", 500, "boom");
        assert!(!err.is_fatal());
        assert_eq!(
            err.to_string(),
            "POST http://jf/Users/u/Items/i/UserData failed with HTTP 500: boom"
        );
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(MAX_BODY_CHARS + 20);
        match ServerError::from_status("GET", "http://jf", 404, &body) {
            ServerError::Http { body, .. } => {
                assert_eq!(body.len(), MAX_BODY_CHARS + 3);
                assert!(body.ends_with("..."));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
