//! Shared-room game sessions and the arcade games they sit next to.
//!
//! The core is [`room::RoomSession`]: a polling client that keeps one
//! player's view of a two-player room document in sync with a remote
//! [`store::RoomStore`], merging local moves with read-merge-write cycles.

pub mod api;
pub mod arcade;
pub mod config;
pub mod error;
pub mod logging;
pub mod room;
pub mod rules;
pub mod store;
pub mod words;

pub use error::{GameError, Result};
