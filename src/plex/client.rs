//! HTTP client for the media server.

use async_trait::async_trait;

use crate::config::PlexConfig;
use crate::types::{CollectionId, Section};

use super::RefreshError;
use super::sections::parse_sections;

const TOKEN_PARAM: &str = "X-Plex-Token";

/// Something that can ask the server to rescan a section.
///
/// Used fire-and-forget by the scheduler: the result is only logged.
#[async_trait]
pub trait RefreshClient: Send + Sync {
    async fn refresh(&self, collection: CollectionId) -> Result<(), RefreshError>;
}

/// Token-authenticated Plex Media Server client.
#[derive(Debug, Clone)]
pub struct PlexClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl PlexClient {
    /// Build a client from the `[plex]` settings.
    pub fn new(config: &PlexConfig) -> Result<Self, RefreshError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url(),
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List the server's library sections.
    pub async fn sections(&self) -> Result<Vec<Section>, RefreshError> {
        let body = self.get("/library/sections").await?.text().await?;
        parse_sections(&body)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, RefreshError> {
        let url = format!("{}{path}", self.base_url);
        crate::debug_event!("plex", "GET", "{url}");

        let response = self
            .http
            .get(&url)
            .query(&[(TOKEN_PARAM, self.token.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(
                "[plex] server rejected request: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            );
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl RefreshClient for PlexClient {
    async fn refresh(&self, collection: CollectionId) -> Result<(), RefreshError> {
        crate::log_event!("plex", "updating section", "{collection}");
        self.get(&format!("/library/sections/{collection}/refresh")).await?;
        Ok(())
    }
}
