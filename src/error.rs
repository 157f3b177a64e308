use thiserror::Error;

/// Error types for room sessions, room stores and the arcade games
#[derive(Debug, Error)]
pub enum GameError {
    /// Room lookup errors
    #[error("Room {0} not found")]
    RoomNotFound(String),

    #[error("Room is full, {0} cannot take a seat")]
    RoomFull(String),

    /// Move precondition errors
    #[error("It is not {player}'s turn")]
    NotYourTurn { player: String },

    #[error("{0} already moved this round")]
    AlreadyMoved(String),

    #[error("Waiting for another player to join")]
    WaitingForOpponent,

    #[error("Cell ({row}, {col}) is already taken")]
    CellOccupied { row: usize, col: usize },

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Game is already over")]
    GameOver,

    #[error("Room session is closed")]
    SessionClosed,

    /// Network errors
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed room document: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for Results using GameError
pub type Result<T> = std::result::Result<T, GameError>;

impl GameError {
    /// Helper to create Internal errors with context
    pub fn internal(msg: impl Into<String>) -> Self {
        GameError::Internal(msg.into())
    }

    /// Helper to create transport errors
    pub fn transport(msg: impl Into<String>) -> Self {
        GameError::Transport(msg.into())
    }

    /// Rejections the caller can recover from by re-rendering the latest
    /// view and letting the player try again
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            GameError::RoomFull(_)
                | GameError::NotYourTurn { .. }
                | GameError::AlreadyMoved(_)
                | GameError::WaitingForOpponent
                | GameError::CellOccupied { .. }
                | GameError::InvalidMove(_)
                | GameError::GameOver
        )
    }
}

/// Convert reqwest::Error to GameError
impl From<reqwest::Error> for GameError {
    fn from(err: reqwest::Error) -> Self {
        GameError::Transport(err.to_string())
    }
}
