//! Room Store access.
//!
//! The Room Store keeps one opaque JSON document per room and only ever
//! replaces whole documents. This module defines the contract as a trait
//! and ships two implementations:
//!
//! - `HttpRoomStore`: talks to a remote store over HTTP
//! - `MemoryRoomStore`: in-process map backing the local `room-store`
//!   server and the tests
//!
//! # Wire format
//!
//! ```text
//! POST /rooms          { "initialState": {..} } -> { "roomId": "..", "gameState": {..} }
//! GET  /rooms/{id}                              -> { "gameState": {..} }   (404 if unknown)
//! PUT  /rooms/{id}     { "gameState": {..} }    -> success / failure
//! ```

mod http;
mod memory;

pub use http::HttpRoomStore;
pub use memory::MemoryRoomStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::room::RoomDocument;

#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Allocates a room seeded with `initial_state`
    async fn create(&self, initial_state: &RoomDocument) -> Result<CreatedRoom>;

    /// Current document of a room; `RoomNotFound` for unknown ids
    async fn fetch(&self, room_id: &str) -> Result<RoomDocument>;

    /// Replaces the whole document of a room
    async fn replace(&self, room_id: &str, state: &RoomDocument) -> Result<()>;
}

/// Body of `POST /rooms`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub initial_state: RoomDocument,
}

/// Response of `POST /rooms`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRoom {
    pub room_id: String,
    pub game_state: RoomDocument,
}

/// Body of `PUT /rooms/{id}` and response of `GET /rooms/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomEnvelope {
    pub game_state: RoomDocument,
}
