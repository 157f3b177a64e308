use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::{GameRules, Mover};
use crate::error::{GameError, Result};
use crate::room::{Board, Mark, PlayerSlot, RoomDocument, BOARD_SIZE};

const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// Turn-based three-in-a-row; player1 plays X and moves first
pub struct TicTacToe;

/// A board coordinate, zero-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Parses `"row col"` or `"row,col"`
impl FromStr for Cell {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();

        match parts.as_slice() {
            [row, col] => {
                let row = row
                    .parse()
                    .map_err(|_| GameError::InvalidMove(format!("bad row: {}", row)))?;
                let col = col
                    .parse()
                    .map_err(|_| GameError::InvalidMove(format!("bad column: {}", col)))?;
                Ok(Cell { row, col })
            }
            _ => Err(GameError::InvalidMove(format!(
                "expected \"row col\", got \"{}\"",
                s
            ))),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress { next: Option<PlayerSlot> },
    Won(PlayerSlot),
    Draw,
}

impl TicTacToe {
    pub fn winner(board: &Board) -> Option<Mark> {
        LINES.iter().find_map(|line| {
            let [a, b, c] = line.map(|(r, c)| board[r][c]);
            match (a, b, c) {
                (Some(a), Some(b), Some(c)) if a == b && b == c => Some(a),
                _ => None,
            }
        })
    }

    pub fn is_full(board: &Board) -> bool {
        board.iter().flatten().all(Option::is_some)
    }

    pub fn status(doc: &RoomDocument) -> GameStatus {
        let board = doc.board_or_empty();
        if let Some(mark) = Self::winner(&board) {
            GameStatus::Won(mark.slot())
        } else if Self::is_full(&board) {
            GameStatus::Draw
        } else {
            GameStatus::InProgress {
                next: doc.current_turn,
            }
        }
    }
}

impl GameRules for TicTacToe {
    type Move = Cell;

    const NAME: &'static str = "tic-tac-toe";
    const POLL_INTERVAL: Duration = Duration::from_secs(5);

    fn seed() -> RoomDocument {
        RoomDocument {
            board: Some(Board::default()),
            current_turn: Some(PlayerSlot::Player1),
            ..RoomDocument::default()
        }
    }

    fn apply(doc: &mut RoomDocument, mover: Mover<'_>, cell: &Cell) -> Result<()> {
        if doc.current_turn != Some(mover.slot) {
            return Err(GameError::NotYourTurn {
                player: mover.id.to_string(),
            });
        }

        if cell.row >= BOARD_SIZE || cell.col >= BOARD_SIZE {
            return Err(GameError::InvalidMove(format!("cell {} is off the board", cell)));
        }

        let mut board = doc.board_or_empty();
        if Self::winner(&board).is_some() || Self::is_full(&board) {
            return Err(GameError::GameOver);
        }
        if board[cell.row][cell.col].is_some() {
            return Err(GameError::CellOccupied {
                row: cell.row,
                col: cell.col,
            });
        }

        board[cell.row][cell.col] = Some(mover.slot.mark());
        doc.board = Some(board);
        doc.current_turn = Some(mover.slot.other());
        Ok(())
    }
}
