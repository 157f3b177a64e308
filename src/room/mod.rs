mod document;
mod session;

pub use document::{Board, Mark, PlayerSlot, Players, RoomDocument, BOARD_SIZE};
pub use session::{PollHandle, RoomSession};
