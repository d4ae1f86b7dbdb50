use async_trait::async_trait;
use playstate_models::{ItemPage, PlaybackState, ServerInfo, ServerItem, ServerUser};
use crate::error::ServerError;

/// Filters applied to item enumerations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemQuery {
    /// Server item types to include, e.g. `Movie`, `Episode`
    pub item_types: Vec<String>,
    /// Only items the user has marked played (user enumerations only)
    pub played_only: bool,
}

impl Default for ItemQuery {
    fn default() -> Self {
        Self {
            item_types: vec!["Movie".to_string(), "Episode".to_string()],
            played_only: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub start_index: usize,
    pub limit: usize,
}

/// The media server API this tool talks to.
///
/// The server can only look items up by its own internal ID, which is why
/// restore builds a resolution index from `list_all_items` instead of
/// querying by external ID.
#[async_trait]
pub trait MediaServer: Send + Sync {
    /// Base URL without trailing separator
    fn base_url(&self) -> &str;

    /// Check reachability and the credential
    async fn verify_connection(&self) -> Result<ServerInfo, ServerError>;

    async fn list_users(&self) -> Result<Vec<ServerUser>, ServerError>;

    /// One page of the items visible to a user, across all of their libraries
    async fn list_user_items(
        &self,
        user_id: &str,
        query: &ItemQuery,
        page: PageRequest,
    ) -> Result<ItemPage, ServerError>;

    /// A single item in a user's context, with its external IDs and the
    /// user's playback state in one response
    async fn get_user_item(&self, user_id: &str, item_id: &str) -> Result<ServerItem, ServerError>;

    /// Overwrite the user's playback state for an item
    async fn set_playback_state(
        &self,
        user_id: &str,
        item_id: &str,
        state: &PlaybackState,
    ) -> Result<(), ServerError>;

    /// One page of every item the server knows about, regardless of user
    async fn list_all_items(&self, query: &ItemQuery, page: PageRequest) -> Result<ItemPage, ServerError>;
}
