use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, trace};
use crate::error::ServerError;

/// Header Jellyfin reads the API key from
const TOKEN_HEADER: &str = "x-emby-token";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SystemInfoDto {
    #[serde(default)]
    pub server_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserDto {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserItemDataDto {
    #[serde(default)]
    pub playback_position_ticks: i64,
    #[serde(default)]
    pub play_count: Option<i64>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub played: bool,
    #[serde(default)]
    pub last_played_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BaseItemDto {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "Type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub provider_ids: Option<HashMap<String, Option<String>>>,
    #[serde(default)]
    pub user_data: Option<UserItemDataDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemsResponseDto {
    #[serde(default)]
    pub items: Vec<BaseItemDto>,
    #[serde(default)]
    pub total_record_count: usize,
    #[serde(default)]
    pub start_index: usize,
}

/// Body of `POST /Users/{user}/Items/{item}/UserData`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateUserItemDataDto {
    pub played: bool,
    pub playback_position_ticks: u64,
    pub is_favorite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_played_date: Option<String>,
}

/// Strip whitespace and every trailing `/`; Jellyfin answers 404 for `//Users`.
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Thin HTTP layer over the Jellyfin REST API. Returns raw DTOs.
pub struct JellyfinHttpClient {
    client: Client,
    base_url: String,
}

impl JellyfinHttpClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Option<Duration>) -> Result<Self, ServerError> {
        let base_url = normalize_base_url(base_url);
        if base_url.is_empty() {
            return Err(ServerError::InvalidConfig("server URL is empty".to_string()));
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::HeaderName::from_static(TOKEN_HEADER),
            reqwest::header::HeaderValue::from_str(api_key.trim())
                .map_err(|_| ServerError::InvalidConfig("API key contains invalid characters".to_string()))?,
        );

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ServerError::InvalidConfig(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ServerError> {
        let url = self.url(path);
        debug!(method = "GET", url = %url, params = ?query, "Jellyfin request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ServerError::from_reqwest(&url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServerError::from_reqwest(&url, e))?;

        if !status.is_success() {
            return Err(ServerError::from_status("GET", &url, status.as_u16(), &body));
        }
        trace!(url = %url, bytes = body.len(), "Jellyfin response");

        serde_json::from_str(&body).map_err(|e| ServerError::Decode {
            url,
            message: e.to_string(),
        })
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ServerError> {
        let url = self.url(path);
        debug!(method = "POST", url = %url, "Jellyfin request");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ServerError::from_reqwest(&url, e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(ServerError::from_status("POST", &url, status.as_u16(), &text))
        }
    }

    pub async fn system_info(&self) -> Result<SystemInfoDto, ServerError> {
        self.get_json("/System/Info", &[]).await
    }

    pub async fn users(&self) -> Result<Vec<UserDto>, ServerError> {
        self.get_json("/Users", &[]).await
    }

    pub async fn user_items(&self, user_id: &str, query: &[(&str, String)]) -> Result<ItemsResponseDto, ServerError> {
        let path = format!("/Users/{}/Items", urlencoding::encode(user_id));
        self.get_json(&path, query).await
    }

    pub async fn user_item(&self, user_id: &str, item_id: &str) -> Result<BaseItemDto, ServerError> {
        let path = format!(
            "/Users/{}/Items/{}",
            urlencoding::encode(user_id),
            urlencoding::encode(item_id)
        );
        self.get_json(&path, &[]).await
    }

    pub async fn items(&self, query: &[(&str, String)]) -> Result<ItemsResponseDto, ServerError> {
        self.get_json("/Items", query).await
    }

    pub async fn update_user_data(
        &self,
        user_id: &str,
        item_id: &str,
        body: &UpdateUserItemDataDto,
    ) -> Result<(), ServerError> {
        let path = format!(
            "/Users/{}/Items/{}/UserData",
            urlencoding::encode(user_id),
            urlencoding::encode(item_id)
        );
        self.post_json(&path, body).await
    }
}
