//! In-memory media server for tests

use async_trait::async_trait;
use playstate_models::{ExternalIdKind, ExternalIds, ItemPage, PlaybackState, ServerInfo, ServerItem, ServerUser};
use playstate_server::{ItemQuery, MediaServer, PageRequest, ServerError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

#[derive(Default)]
struct MockState {
    user_data: HashMap<(String, String), PlaybackState>,
    updates: Vec<(String, String, PlaybackState)>,
    page_requests: usize,
    offline: bool,
}

/// Catalog plus per-user playback state. Failures are injected per item ID.
#[derive(Default)]
pub struct MockServer {
    users: Vec<ServerUser>,
    items: Vec<ServerItem>,
    fail_fetch: HashSet<String>,
    fail_apply: HashSet<String>,
    revoke_on_fetch: HashSet<String>,
    unlisted: HashSet<String>,
    state: Arc<RwLock<MockState>>,
}

pub fn movie(id: &str, imdb: &str) -> ServerItem {
    ServerItem::new(id, ExternalIds::new().with(ExternalIdKind::Imdb, imdb))
        .with_name(format!("Movie {}", id))
        .with_type("Movie")
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, id: &str, name: &str) -> Self {
        self.users.push(ServerUser::new(id, name));
        self
    }

    pub fn add_item(&mut self, item: ServerItem) {
        self.items.push(item);
    }

    pub fn set_user_state(&self, user_id: &str, item_id: &str, state: PlaybackState) {
        self.state
            .write()
            .unwrap()
            .user_data
            .insert((user_id.to_string(), item_id.to_string()), state);
    }

    pub fn user_state(&self, user_id: &str, item_id: &str) -> Option<PlaybackState> {
        self.state
            .read()
            .unwrap()
            .user_data
            .get(&(user_id.to_string(), item_id.to_string()))
            .cloned()
    }

    pub fn fail_fetch(&mut self, item_id: &str) {
        self.fail_fetch.insert(item_id.to_string());
    }

    pub fn fail_apply(&mut self, item_id: &str) {
        self.fail_apply.insert(item_id.to_string());
    }

    /// Fetching this item answers 401, as if the key had been revoked mid-run
    pub fn revoke_key_on_fetch(&mut self, item_id: &str) {
        self.revoke_on_fetch.insert(item_id.to_string());
    }

    /// The item keeps its slot in enumeration pages but is left out of them,
    /// like an entry the server returns without an ID
    pub fn drop_from_listing(&mut self, item_id: &str) {
        self.unlisted.insert(item_id.to_string());
    }

    pub fn go_offline(&self) {
        self.state.write().unwrap().offline = true;
    }

    pub fn updates(&self) -> Vec<(String, String, PlaybackState)> {
        self.state.read().unwrap().updates.clone()
    }

    pub fn page_requests(&self) -> usize {
        self.state.read().unwrap().page_requests
    }

    fn check_online(&self) -> Result<(), ServerError> {
        if self.state.read().unwrap().offline {
            return Err(ServerError::Connection {
                url: self.base_url().to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    fn matches_type(item: &ServerItem, query: &ItemQuery) -> bool {
        query.item_types.is_empty()
            || item
                .item_type
                .as_ref()
                .map(|t| query.item_types.contains(t))
                .unwrap_or(false)
    }

    fn page(&self, items: Vec<ServerItem>, page: PageRequest) -> ItemPage {
        let total = items.len();
        let window: Vec<ServerItem> = items.into_iter().skip(page.start_index).take(page.limit).collect();
        let returned = window.len();
        ItemPage {
            items: window
                .into_iter()
                .filter(|item| !self.unlisted.contains(&item.id))
                .collect(),
            total_record_count: total,
            returned,
        }
    }
}

#[async_trait]
impl MediaServer for MockServer {
    fn base_url(&self) -> &str {
        "http://mock:8096"
    }

    async fn verify_connection(&self) -> Result<ServerInfo, ServerError> {
        self.check_online()?;
        Ok(ServerInfo {
            server_name: "mock".to_string(),
            version: Some("10.9.0".to_string()),
            id: None,
        })
    }

    async fn list_users(&self) -> Result<Vec<ServerUser>, ServerError> {
        self.check_online()?;
        Ok(self.users.clone())
    }

    async fn list_user_items(
        &self,
        user_id: &str,
        query: &ItemQuery,
        page: PageRequest,
    ) -> Result<ItemPage, ServerError> {
        self.check_online()?;
        self.state.write().unwrap().page_requests += 1;
        let items: Vec<ServerItem> = self
            .items
            .iter()
            .filter(|item| Self::matches_type(item, query))
            .map(|item| {
                let state = self.user_state(user_id, &item.id).unwrap_or_default();
                item.clone().with_state(state)
            })
            .filter(|item| !query.played_only || item.state.as_ref().map(|s| s.played).unwrap_or(false))
            .collect();
        Ok(self.page(items, page))
    }

    async fn get_user_item(&self, user_id: &str, item_id: &str) -> Result<ServerItem, ServerError> {
        self.check_online()?;
        let url = format!("{}/Users/{}/Items/{}", self.base_url(), user_id, item_id);
        if self.revoke_on_fetch.contains(item_id) {
            return Err(ServerError::from_status("GET", &url, 401, ""));
        }
        if self.fail_fetch.contains(item_id) {
            return Err(ServerError::from_status("GET", &url, 500, "internal error"));
        }
        let item = self
            .items
            .iter()
            .find(|item| item.id == item_id)
            .ok_or_else(|| ServerError::from_status("GET", &url, 404, "not found"))?;
        let state = self.user_state(user_id, item_id).unwrap_or_default();
        Ok(item.clone().with_state(state))
    }

    async fn set_playback_state(
        &self,
        user_id: &str,
        item_id: &str,
        state: &PlaybackState,
    ) -> Result<(), ServerError> {
        self.check_online()?;
        if self.fail_apply.contains(item_id) {
            let url = format!("{}/Users/{}/Items/{}/UserData", self.base_url(), user_id, item_id);
            return Err(ServerError::from_status("POST", &url, 500, "internal error"));
        }
        let mut guard = self.state.write().unwrap();
        guard
            .user_data
            .insert((user_id.to_string(), item_id.to_string()), state.clone());
        guard
            .updates
            .push((user_id.to_string(), item_id.to_string(), state.clone()));
        Ok(())
    }

    async fn list_all_items(&self, query: &ItemQuery, page: PageRequest) -> Result<ItemPage, ServerError> {
        self.check_online()?;
        self.state.write().unwrap().page_requests += 1;
        let items: Vec<ServerItem> = self
            .items
            .iter()
            .filter(|item| Self::matches_type(item, query))
            .cloned()
            .collect();
        Ok(self.page(items, page))
    }
}
