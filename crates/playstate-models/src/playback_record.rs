use serde::{Deserialize, Serialize};
use crate::external_ids::ExternalIds;
use crate::playback::PlaybackState;

/// One backed-up item.
///
/// Cross-server identity is `external_ids`; `internal_id` is the source
/// server's item ID and is kept for auditing only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackRecord {
    #[serde(default)]
    pub external_ids: ExternalIds,
    pub internal_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(flatten)]
    pub state: PlaybackState,
    /// Set at backup time when the item had no external IDs, so the operator
    /// can see ahead of a restore which records will be skipped
    #[serde(default)]
    pub unresolvable: bool,
}

impl PlaybackRecord {
    pub fn new(external_ids: ExternalIds, internal_id: String, state: PlaybackState) -> Self {
        let unresolvable = external_ids.is_empty();
        Self {
            external_ids,
            internal_id,
            name: None,
            item_type: None,
            state,
            unresolvable,
        }
    }

    pub fn with_metadata(mut self, name: Option<String>, item_type: Option<String>) -> Self {
        self.name = name;
        self.item_type = item_type;
        self
    }

    /// Whether the record carries at least one non-empty external ID.
    /// Computed from the IDs, not from the stored flag.
    pub fn is_resolvable(&self) -> bool {
        !self.external_ids.is_empty()
    }

    /// Human label for log lines
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("'{}' ({})", name, self.internal_id),
            None => self.internal_id.clone(),
        }
    }
}
