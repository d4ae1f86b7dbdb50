use serde::Deserialize;
use crate::external_ids::{ExternalIdKind, ExternalIds};
use crate::playback::PlaybackState;
use crate::playback_record::PlaybackRecord;

/// One entry of the flat export written by the earlier backup scripts.
///
/// Those files are a single JSON array mixing the played items of every
/// server user, each entry tagged with `UserId` and `Username`. They are read
/// only, never written.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct LegacyEntry {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub item_id: Option<String>,
    pub item_name: Option<String>,
    pub item_type: Option<String>,
    pub play_count: Option<i64>,
    pub playback_position_ticks: Option<i64>,
    pub is_favorite: Option<bool>,
    pub played: Option<bool>,
    pub last_played_date: Option<String>,
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<String>,
    pub tvdb_id: Option<String>,
}

impl LegacyEntry {
    pub fn external_ids(&self) -> ExternalIds {
        let mut ids = ExternalIds::new();
        let slots = [
            (ExternalIdKind::Imdb, &self.imdb_id),
            (ExternalIdKind::Tmdb, &self.tmdb_id),
            (ExternalIdKind::Tvdb, &self.tvdb_id),
        ];
        for (kind, value) in slots {
            if let Some(value) = value {
                ids.set(kind, value);
            }
        }
        ids
    }

    pub fn to_record(&self) -> PlaybackRecord {
        let state = PlaybackState {
            played: self.played.unwrap_or(false),
            playback_position_ticks: self.playback_position_ticks.unwrap_or(0).max(0) as u64,
            is_favorite: self.is_favorite.unwrap_or(false),
            play_count: self.play_count.map(|c| c.clamp(0, u32::MAX as i64) as u32),
            last_played_date: self.last_played_date.clone(),
        };
        PlaybackRecord::new(self.external_ids(), self.item_id.clone().unwrap_or_default(), state)
            .with_metadata(self.item_name.clone(), self.item_type.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_maps_to_record() {
        let entry: LegacyEntry = serde_json::from_str(
            r#"{
                "UserId": "6c1f0e",
                "Username": "alice",
                "ItemId": "abc123",
                "ItemName": "The Shawshank Redemption",
                "ItemType": "Movie",
                "PlayCount": 2,
                "PlaybackPositionTicks": 0,
                "IsFavorite": true,
                "Played": true,
                "LastPlayedDate": "2024-03-01T20:15:00.0000000Z",
                "ImdbId": "tt0111161",
                "TmdbId": "278",
                "TvdbId": null
            }"#,
        )
        .unwrap();

        let record = entry.to_record();
        assert_eq!(record.internal_id, "abc123");
        assert_eq!(record.external_ids.get(ExternalIdKind::Imdb), Some("tt0111161"));
        assert_eq!(record.external_ids.get(ExternalIdKind::Tmdb), Some("278"));
        assert!(!record.external_ids.has(ExternalIdKind::Tvdb));
        assert!(record.state.played);
        assert!(record.state.is_favorite);
        assert_eq!(record.state.play_count, Some(2));
        assert_eq!(record.state.last_played_date.as_deref(), Some("2024-03-01T20:15:00.0000000Z"));
        assert_eq!(record.name.as_deref(), Some("The Shawshank Redemption"));
        assert!(!record.unresolvable);
    }

    #[test]
    fn test_entry_without_ids_is_unresolvable() {
        let entry: LegacyEntry =
            serde_json::from_str(r#"{"Username": "bob", "ItemId": "home1", "ImdbId": "", "Played": true}"#).unwrap();
        let record = entry.to_record();
        assert!(record.unresolvable);
        assert_eq!(record.state.playback_position_ticks, 0);
        assert_eq!(record.state.play_count, None);
    }
}
