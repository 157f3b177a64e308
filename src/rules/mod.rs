//! Game rules for the games played over a shared room document.
//!
//! A [`RoomSession`](crate::room::RoomSession) handles seating and the
//! read-merge-write cycle; the rules decide how a move is validated and
//! merged into the document.
//!
//! Two variants exist:
//!
//! - turn-based ([`TicTacToe`]): only the seat named by `currentTurn` may act
//! - simultaneous ([`RockPaperScissors`]): both seats submit one hand per
//!   round and the round resolves once both are in

mod rock_paper_scissors;
mod tic_tac_toe;

use std::fmt;
use std::time::Duration;

use crate::error::Result;
use crate::room::{PlayerSlot, RoomDocument};

pub use rock_paper_scissors::{resolve_round, Hand, RockPaperScissors, RoundOutcome};
pub use tic_tac_toe::{Cell, GameStatus, TicTacToe};

/// The seated player submitting a move
#[derive(Debug, Clone, Copy)]
pub struct Mover<'a> {
    pub id: &'a str,
    pub slot: PlayerSlot,
}

pub trait GameRules: Send + Sync + 'static {
    type Move: fmt::Debug + Send + Sync;

    /// Human-readable game name used in logs
    const NAME: &'static str;

    /// How often a session of this game polls the Room Store by default
    const POLL_INTERVAL: Duration;

    /// Document a new room starts from
    fn seed() -> RoomDocument;

    /// Validates `mv` against `doc` and merges it in place.
    ///
    /// On error the document may be partially modified; callers work on a
    /// copy and discard it.
    fn apply(doc: &mut RoomDocument, mover: Mover<'_>, mv: &Self::Move) -> Result<()>;
}
