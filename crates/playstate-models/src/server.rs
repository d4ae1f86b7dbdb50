use serde::{Deserialize, Serialize};
use crate::external_ids::ExternalIds;
use crate::playback::PlaybackState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerUser {
    pub id: String,
    pub name: String,
}

impl ServerUser {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Match a user by ID or by name (case-insensitive)
    pub fn matches(&self, name_or_id: &str) -> bool {
        let needle = name_or_id.trim();
        self.id == needle || self.name.eq_ignore_ascii_case(needle)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerInfo {
    pub server_name: String,
    pub version: Option<String>,
    pub id: Option<String>,
}

/// A media item as reported by the server.
/// `state` is only present when the item was read in a user's context.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerItem {
    pub id: String,
    pub name: Option<String>,
    pub item_type: Option<String>,
    pub external_ids: ExternalIds,
    pub state: Option<PlaybackState>,
}

impl ServerItem {
    pub fn new(id: impl Into<String>, external_ids: ExternalIds) -> Self {
        Self {
            id: id.into(),
            name: None,
            item_type: None,
            external_ids,
            state: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    pub fn with_state(mut self, state: PlaybackState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("'{}' ({})", name, self.id),
            None => self.id.clone(),
        }
    }
}

/// One page of an item enumeration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPage {
    pub items: Vec<ServerItem>,
    pub total_record_count: usize,
    /// Entries the server returned, including ones dropped from `items`.
    /// Paging advances by this count.
    pub returned: usize,
}
