//! Single-player games. Each is a plain state machine; fetching words and
//! driving the clock are left to the caller.

pub mod hangman;
pub mod snake;
pub mod wordle;

pub use hangman::{guess, Hangman, HangmanStatus};
pub use snake::{Direction, Snake, TickResult};
pub use wordle::{LetterScore, Wordle, WordleStatus};
