use async_trait::async_trait;
use reqwest::StatusCode;

use super::{CreateRoomRequest, CreatedRoom, RoomEnvelope, RoomStore};
use crate::config::ClientConfig;
use crate::error::{GameError, Result};
use crate::room::RoomDocument;

/// Room Store reached over HTTP
pub struct HttpRoomStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRoomStore {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| GameError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.store_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn room_url(&self, room_id: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(room_id))
    }

    async fn error_for_status(response: reqwest::Response, action: &str) -> GameError {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        GameError::Transport(format!(
            "{} failed with status {}: {}",
            action, status, error_text
        ))
    }
}

#[async_trait]
impl RoomStore for HttpRoomStore {
    async fn create(&self, initial_state: &RoomDocument) -> Result<CreatedRoom> {
        let response = self
            .client
            .post(&self.base_url)
            .json(&CreateRoomRequest {
                initial_state: initial_state.clone(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response, "Room creation").await);
        }

        let body = response.bytes().await?;
        let created: CreatedRoom = serde_json::from_slice(&body)?;

        tracing::info!(room_id = %created.room_id, "Room created");
        Ok(created)
    }

    async fn fetch(&self, room_id: &str) -> Result<RoomDocument> {
        let response = self.client.get(self.room_url(room_id)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GameError::RoomNotFound(room_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::error_for_status(response, "Room fetch").await);
        }

        let body = response.bytes().await?;
        let envelope: RoomEnvelope = serde_json::from_slice(&body)?;
        Ok(envelope.game_state)
    }

    async fn replace(&self, room_id: &str, state: &RoomDocument) -> Result<()> {
        let response = self
            .client
            .put(self.room_url(room_id))
            .json(&RoomEnvelope {
                game_state: state.clone(),
            })
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GameError::RoomNotFound(room_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::error_for_status(response, "Room update").await);
        }

        tracing::debug!(room_id = %room_id, "Room document replaced");
        Ok(())
    }
}
