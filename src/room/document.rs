use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::rules::Hand;

pub const BOARD_SIZE: usize = 3;

/// A 3x3 grid; `None` is an empty cell
pub type Board = [[Option<Mark>; BOARD_SIZE]; BOARD_SIZE];

/// One of the two seats in a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerSlot {
    Player1,
    Player2,
}

impl PlayerSlot {
    pub const ALL: [PlayerSlot; 2] = [PlayerSlot::Player1, PlayerSlot::Player2];

    pub fn other(self) -> Self {
        match self {
            PlayerSlot::Player1 => PlayerSlot::Player2,
            PlayerSlot::Player2 => PlayerSlot::Player1,
        }
    }

    /// Board symbol placed by this seat
    pub fn mark(self) -> Mark {
        match self {
            PlayerSlot::Player1 => Mark::X,
            PlayerSlot::Player2 => Mark::O,
        }
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerSlot::Player1 => f.write_str("player1"),
            PlayerSlot::Player2 => f.write_str("player2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn slot(self) -> PlayerSlot {
        match self {
            Mark::X => PlayerSlot::Player1,
            Mark::O => PlayerSlot::Player2,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => f.write_str("X"),
            Mark::O => f.write_str("O"),
        }
    }
}

/// Seat assignments. An empty string written by another client counts as
/// an unfilled seat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    #[serde(
        default,
        deserialize_with = "non_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub player1: Option<String>,
    #[serde(
        default,
        deserialize_with = "non_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub player2: Option<String>,
}

impl Players {
    pub fn get(&self, slot: PlayerSlot) -> Option<&str> {
        match slot {
            PlayerSlot::Player1 => self.player1.as_deref(),
            PlayerSlot::Player2 => self.player2.as_deref(),
        }
    }

    fn get_mut(&mut self, slot: PlayerSlot) -> &mut Option<String> {
        match slot {
            PlayerSlot::Player1 => &mut self.player1,
            PlayerSlot::Player2 => &mut self.player2,
        }
    }

    pub fn slot_of(&self, player_id: &str) -> Option<PlayerSlot> {
        PlayerSlot::ALL
            .into_iter()
            .find(|slot| self.get(*slot) == Some(player_id))
    }

    pub fn is_full(&self) -> bool {
        self.player1.is_some() && self.player2.is_some()
    }

    /// Returns the player's seat, taking the first free one if they have
    /// none yet. `None` when both seats belong to other players.
    pub fn claim(&mut self, player_id: &str) -> Option<PlayerSlot> {
        if let Some(slot) = self.slot_of(player_id) {
            return Some(slot);
        }

        let free = PlayerSlot::ALL
            .into_iter()
            .find(|slot| self.get(*slot).is_none())?;
        *self.get_mut(free) = Some(player_id.to_string());
        Some(free)
    }
}

/// The shared game document held by the Room Store.
///
/// Fields this crate does not know about are kept in `extra` so that a
/// read-merge-write cycle never drops another client's data.
///
/// `currentTurn` is written as a slot name. When reading, a value naming a
/// seated player is accepted as that player's slot; anything else reads as
/// no turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireDocument")]
pub struct RoomDocument {
    #[serde(default)]
    pub players: Players,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_turn: Option<PlayerSlot>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub moves: BTreeMap<String, Hand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<Board>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RoomDocument {
    /// Identifier of the player whose turn it is, if that seat is filled
    pub fn current_player(&self) -> Option<&str> {
        self.current_turn.and_then(|slot| self.players.get(slot))
    }

    pub fn board_or_empty(&self) -> Board {
        self.board.unwrap_or_default()
    }
}

/// `RoomDocument` as it arrives from the store, before `currentTurn` is
/// resolved against the seats
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDocument {
    #[serde(default)]
    players: Players,
    #[serde(default)]
    current_turn: Option<serde_json::Value>,
    #[serde(default)]
    moves: BTreeMap<String, Hand>,
    #[serde(default)]
    board: Option<Board>,
    #[serde(default)]
    history: Vec<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl From<WireDocument> for RoomDocument {
    fn from(wire: WireDocument) -> Self {
        let current_turn = wire
            .current_turn
            .and_then(|turn| resolve_turn(&wire.players, turn));

        RoomDocument {
            players: wire.players,
            current_turn,
            moves: wire.moves,
            board: wire.board,
            history: wire.history,
            extra: wire.extra,
        }
    }
}

fn resolve_turn(players: &Players, turn: serde_json::Value) -> Option<PlayerSlot> {
    let name = turn.as_str()?.to_string();
    serde_json::from_value(turn)
        .ok()
        .or_else(|| players.slot_of(&name))
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
