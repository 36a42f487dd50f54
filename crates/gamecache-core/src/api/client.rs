//! API client for communicating with the catalog REST API.
//!
//! This module provides the `ApiClient` struct for listing, creating,
//! updating and deleting games and for listing categories.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::models::{Category, Game, GameDraft};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Path of the games collection, relative to the base URL
const GAMES_PATH: &str = "Games";

/// Path of the categories collection, relative to the base URL
const CATEGORIES_PATH: &str = "Categories";

/// The remote catalog, as seen by the cache manager.
///
/// The service is the source of truth for games and categories. It assigns
/// ids on create and may normalize fields on update.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// `GET /Games`
    async fn list_games(&self) -> Result<Vec<Game>, ApiError>;

    /// `POST /Games`, returns the created game with its assigned id
    async fn create_game(&self, draft: &GameDraft) -> Result<Game, ApiError>;

    /// `PUT /Games/{id}`, returns the game as stored by the service
    async fn update_game(&self, game: &Game) -> Result<Game, ApiError>;

    /// `DELETE /Games/{id}`
    async fn delete_game(&self, id: &str) -> Result<(), ApiError>;

    /// `GET /Categories`
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;
}

/// HTTP client for the catalog API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client for the given base URL
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from the application configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let base_url = config.api_base_url()?;
        Ok(Self::new(&base_url, config.request_timeout())?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn game_url(&self, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, GAMES_PATH, id)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        debug!(url = url, "GET");
        let response = self.client.get(url).send().await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response, url).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        debug!(url = url, "POST");
        let response = self.client.post(url).json(body).send().await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response, url).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        debug!(url = url, "PUT");
        let response = self.client.put(url).json(body).send().await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response, url).await
    }

    async fn delete(&self, url: &str) -> Result<(), ApiError> {
        debug!(url = url, "DELETE");
        let response = self.client.delete(url).send().await?;
        // Only the status matters; the body is whatever the service echoes back
        Self::check_response(response).await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogService for ApiClient {
    async fn list_games(&self) -> Result<Vec<Game>, ApiError> {
        self.get(&self.url(GAMES_PATH)).await
    }

    async fn create_game(&self, draft: &GameDraft) -> Result<Game, ApiError> {
        self.post(&self.url(GAMES_PATH), draft).await
    }

    async fn update_game(&self, game: &Game) -> Result<Game, ApiError> {
        self.put(&self.game_url(&game.id), game).await
    }

    async fn delete_game(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&self.game_url(id)).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get(&self.url(CATEGORIES_PATH)).await
    }
}
