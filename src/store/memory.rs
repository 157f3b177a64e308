use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::RwLock;

use super::{CreatedRoom, RoomStore};
use crate::error::{GameError, Result};
use crate::room::RoomDocument;

/// Room Store kept in process memory. Rooms live as long as the store.
pub struct MemoryRoomStore {
    rooms: Arc<RwLock<HashMap<String, RoomDocument>>>,
}

impl MemoryRoomStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Generate a random room ID
    fn generate_room_id() -> String {
        let mut rng = rand::thread_rng();
        format!("{:06}", rng.gen_range(100000..1000000))
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn create(&self, initial_state: &RoomDocument) -> Result<CreatedRoom> {
        let mut rooms = self.rooms.write().await;

        let mut room_id = Self::generate_room_id();
        while rooms.contains_key(&room_id) {
            room_id = Self::generate_room_id();
        }

        rooms.insert(room_id.clone(), initial_state.clone());
        tracing::info!(room_id = %room_id, rooms = rooms.len(), "Room created");

        Ok(CreatedRoom {
            room_id,
            game_state: initial_state.clone(),
        })
    }

    async fn fetch(&self, room_id: &str) -> Result<RoomDocument> {
        let rooms = self.rooms.read().await;
        rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))
    }

    async fn replace(&self, room_id: &str, state: &RoomDocument) -> Result<()> {
        let mut rooms = self.rooms.write().await;
        let slot = rooms
            .get_mut(room_id)
            .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))?;
        *slot = state.clone();

        tracing::debug!(room_id = %room_id, "Room document replaced");
        Ok(())
    }
}
