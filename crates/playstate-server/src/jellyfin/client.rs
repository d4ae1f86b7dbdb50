use async_trait::async_trait;
use playstate_models::{ExternalIds, ItemPage, PlaybackState, ServerInfo, ServerItem, ServerUser};
use std::time::Duration;
use tracing::{debug, warn};
use crate::error::ServerError;
use crate::jellyfin::api::{BaseItemDto, ItemsResponseDto, JellyfinHttpClient, UpdateUserItemDataDto, UserDto, UserItemDataDto};
use crate::traits::{ItemQuery, MediaServer, PageRequest};

/// Fields requested on user enumerations
const USER_ITEM_FIELDS: &str = "ProviderIds,UserData";
/// Only provider IDs are needed to build a resolution index
const GLOBAL_ITEM_FIELDS: &str = "ProviderIds";

pub struct JellyfinServer {
    api: JellyfinHttpClient,
}

impl JellyfinServer {
    pub fn new(base_url: &str, api_key: &str, timeout: Option<Duration>) -> Result<Self, ServerError> {
        Ok(Self {
            api: JellyfinHttpClient::new(base_url, api_key, timeout)?,
        })
    }
}

/// Query string for `/Items` and `/Users/{user}/Items`
pub(crate) fn items_query(query: &ItemQuery, page: PageRequest, fields: &str) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("Recursive", "true".to_string()),
        ("Fields", fields.to_string()),
        ("StartIndex", page.start_index.to_string()),
        ("Limit", page.limit.to_string()),
    ];
    if !query.item_types.is_empty() {
        params.push(("IncludeItemTypes", query.item_types.join(",")));
    }
    if query.played_only {
        params.push(("IsPlayed", "true".to_string()));
    }
    params
}

pub(crate) fn map_user(dto: UserDto) -> Option<ServerUser> {
    match (dto.id, dto.name) {
        (Some(id), Some(name)) if !id.is_empty() => Some(ServerUser { id, name }),
        (id, name) => {
            warn!(id = ?id, name = ?name, "Skipping user with incomplete data");
            None
        }
    }
}

pub(crate) fn map_user_data(dto: &UserItemDataDto) -> PlaybackState {
    PlaybackState {
        played: dto.played,
        playback_position_ticks: dto.playback_position_ticks.max(0) as u64,
        is_favorite: dto.is_favorite,
        play_count: dto.play_count.map(|c| c.clamp(0, u32::MAX as i64) as u32),
        last_played_date: dto.last_played_date.clone(),
    }
}

/// Convert an item DTO; items without an ID are unusable and dropped.
pub(crate) fn map_item(dto: BaseItemDto) -> Option<ServerItem> {
    let id = dto.id.filter(|id| !id.is_empty())?;
    let external_ids = dto
        .provider_ids
        .as_ref()
        .map(|ids| {
            ExternalIds::from_provider_ids(
                ids.iter()
                    .filter_map(|(key, value)| value.as_deref().map(|v| (key.as_str(), v))),
            )
        })
        .unwrap_or_default();

    Some(ServerItem {
        id,
        name: dto.name,
        item_type: dto.item_type,
        external_ids,
        state: dto.user_data.as_ref().map(map_user_data),
    })
}

fn map_page(response: ItemsResponseDto, page: PageRequest) -> ItemPage {
    let returned = response.items.len();
    let items: Vec<ServerItem> = response.items.into_iter().filter_map(map_item).collect();
    if items.len() < returned {
        debug!(
            dropped = returned - items.len(),
            start_index = page.start_index,
            "Dropped items without an Id"
        );
    }
    ItemPage {
        items,
        total_record_count: response.total_record_count,
        returned,
    }
}

#[async_trait]
impl MediaServer for JellyfinServer {
    fn base_url(&self) -> &str {
        self.api.base_url()
    }

    async fn verify_connection(&self) -> Result<ServerInfo, ServerError> {
        let info = self.api.system_info().await?;
        Ok(ServerInfo {
            server_name: info.server_name.unwrap_or_else(|| "Jellyfin".to_string()),
            version: info.version,
            id: info.id,
        })
    }

    async fn list_users(&self) -> Result<Vec<ServerUser>, ServerError> {
        let users = self.api.users().await?;
        Ok(users.into_iter().filter_map(map_user).collect())
    }

    async fn list_user_items(
        &self,
        user_id: &str,
        query: &ItemQuery,
        page: PageRequest,
    ) -> Result<ItemPage, ServerError> {
        let params = items_query(query, page, USER_ITEM_FIELDS);
        let response = self.api.user_items(user_id, &params).await?;
        Ok(map_page(response, page))
    }

    async fn get_user_item(&self, user_id: &str, item_id: &str) -> Result<ServerItem, ServerError> {
        let dto = self.api.user_item(user_id, item_id).await?;
        map_item(dto).ok_or_else(|| ServerError::Decode {
            url: format!("{}/Users/{}/Items/{}", self.api.base_url(), user_id, item_id),
            message: "item response has no Id".to_string(),
        })
    }

    async fn set_playback_state(
        &self,
        user_id: &str,
        item_id: &str,
        state: &PlaybackState,
    ) -> Result<(), ServerError> {
        let body = UpdateUserItemDataDto {
            played: state.played,
            playback_position_ticks: state.playback_position_ticks,
            is_favorite: state.is_favorite,
            play_count: state.play_count,
            last_played_date: state.last_played_date.clone(),
        };
        self.api.update_user_data(user_id, item_id, &body).await
    }

    async fn list_all_items(&self, query: &ItemQuery, page: PageRequest) -> Result<ItemPage, ServerError> {
        // IsPlayed is only meaningful in a user's context
        let global_query = ItemQuery {
            played_only: false,
            ..query.clone()
        };
        let params = items_query(&global_query, page, GLOBAL_ITEM_FIELDS);
        let response = self.api.items(&params).await?;
        Ok(map_page(response, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playstate_models::ExternalIdKind;
    use std::collections::HashMap;

    fn item_dto(id: Option<&str>, provider_ids: &[(&str, Option<&str>)]) -> BaseItemDto {
        let ids: HashMap<String, Option<String>> = provider_ids
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(|s| s.to_string())))
            .collect();
        BaseItemDto {
            id: id.map(|s| s.to_string()),
            name: Some("Breaking Bad S01E01".to_string()),
            item_type: Some("Episode".to_string()),
            provider_ids: Some(ids),
            user_data: None,
        }
    }

    #[test]
    fn test_map_item_reads_provider_ids() {
        let item = map_item(item_dto(
            Some("ep1"),
            &[("Imdb", Some("tt0959621")), ("Tvdb", Some("349232")), ("Tmdb", None), ("TvRage", Some("1"))],
        ))
        .unwrap();
        assert_eq!(item.id, "ep1");
        assert_eq!(item.external_ids.get(ExternalIdKind::Imdb), Some("tt0959621"));
        assert_eq!(item.external_ids.get(ExternalIdKind::Tvdb), Some("349232"));
        assert!(!item.external_ids.has(ExternalIdKind::Tmdb));
        assert!(item.state.is_none());
    }

    #[test]
    fn test_map_item_without_id_is_dropped() {
        assert!(map_item(item_dto(None, &[("Imdb", Some("tt1"))])).is_none());
        assert!(map_item(item_dto(Some(""), &[("Imdb", Some("tt1"))])).is_none());
    }

    #[test]
    fn test_map_page_counts_dropped_entries() {
        let response = ItemsResponseDto {
            items: vec![
                item_dto(Some("ep1"), &[("Tvdb", Some("349232"))]),
                item_dto(None, &[("Imdb", Some("tt1"))]),
                item_dto(Some("ep3"), &[]),
            ],
            total_record_count: 10,
            start_index: 3,
        };
        let page = map_page(response, PageRequest { start_index: 3, limit: 3 });
        let ids: Vec<&str> = page.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["ep1", "ep3"]);
        assert_eq!(page.returned, 3);
        assert_eq!(page.total_record_count, 10);
    }

    #[test]
    fn test_map_user_data_clamps_negative_values() {
        let state = map_user_data(&UserItemDataDto {
            playback_position_ticks: -5,
            play_count: Some(-1),
            is_favorite: true,
            played: false,
            last_played_date: None,
        });
        assert_eq!(state.playback_position_ticks, 0);
        assert_eq!(state.play_count, Some(0));
        assert!(state.is_favorite);
    }

    #[test]
    fn test_map_user_skips_incomplete_users() {
        assert!(map_user(UserDto { id: Some("u1".into()), name: None }).is_none());
        let user = map_user(UserDto { id: Some("u1".into()), name: Some("alice".into()) }).unwrap();
        assert_eq!(user, ServerUser::new("u1", "alice"));
    }

    #[test]
    fn test_items_query() {
        let query = ItemQuery {
            played_only: true,
            ..ItemQuery::default()
        };
        let params = items_query(&query, PageRequest { start_index: 500, limit: 500 }, USER_ITEM_FIELDS);
        let lookup: HashMap<&str, &str> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        assert_eq!(lookup["Recursive"], "true");
        assert_eq!(lookup["Fields"], "ProviderIds,UserData");
        assert_eq!(lookup["StartIndex"], "500");
        assert_eq!(lookup["Limit"], "500");
        assert_eq!(lookup["IncludeItemTypes"], "Movie,Episode");
        assert_eq!(lookup["IsPlayed"], "true");
    }

    #[test]
    fn test_items_query_without_filters() {
        let query = ItemQuery {
            item_types: Vec::new(),
            played_only: false,
        };
        let params = items_query(&query, PageRequest { start_index: 0, limit: 10 }, GLOBAL_ITEM_FIELDS);
        assert!(params.iter().all(|(k, _)| *k != "IncludeItemTypes" && *k != "IsPlayed"));
    }
}
