//! Local read-only mirror of the server's board
//!
//! The mirror only ever changes in response to messages from the server; local
//! clicks go out as requests and come back, like everyone else's, as
//! broadcasts. Views subscribe through [`BoardObserver`].

use crate::error::ModelError;
use log::warn;
use shared::{Board, Tile};

/// Anything that wants to hear about changes to the local board
///
/// Observers are called synchronously, in registration order, right after
/// each mutation. `changed` is `None` when the whole board was replaced.
pub trait BoardObserver: Send {
    fn on_update(&mut self, board: &Board, changed: Option<&Tile>);

    /// Called with the text of an ERROR message from the server
    fn on_error(&mut self, _message: &str) {}
}

#[derive(Default)]
pub struct ClientModel {
    board: Option<Board>,
    observers: Vec<Box<dyn BoardObserver>>,
}

impl ClientModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(&mut self, observer: impl BoardObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    /// Replaces the mirror with a full snapshot
    pub fn set_board(&mut self, board: Board) {
        self.board = Some(board);
        self.notify(None);
    }

    /// Applies one TILE_CHANGED broadcast
    pub fn apply_change(&mut self, tile: Tile) -> Result<(), ModelError> {
        let board = self.board.as_mut().ok_or(ModelError::NoBoard)?;
        board.set_tile(tile.clone())?;
        self.notify(Some(&tile));
        Ok(())
    }

    pub fn report_error(&mut self, message: &str) {
        warn!("Server reported an error: {}", message);
        for observer in &mut self.observers {
            observer.on_error(message);
        }
    }

    fn notify(&mut self, changed: Option<&Tile>) {
        if let Some(board) = &self.board {
            for observer in &mut self.observers {
                observer.on_update(board, changed);
            }
        }
    }
}
