use serde::{Deserialize, Serialize};

/// Per-user playback state of one item.
///
/// Applying a state is absolute, never incremental: writing the same state
/// twice leaves the item exactly as after the first write.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    #[serde(default)]
    pub played: bool,
    #[serde(default)]
    pub playback_position_ticks: u64,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_count: Option<u32>,
    /// Kept as the server's own timestamp string so it round-trips untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played_date: Option<String>,
}

impl PlaybackState {
    pub fn new(played: bool, playback_position_ticks: u64, is_favorite: bool) -> Self {
        Self {
            played,
            playback_position_ticks,
            is_favorite,
            play_count: None,
            last_played_date: None,
        }
    }
}
