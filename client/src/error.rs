//! Client-side error types

use shared::{BoardError, MessageKind, ProtocolError};
use std::io;
use thiserror::Error;

/// Failures while applying server updates to the local mirror
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no board has been received yet")]
    NoBoard,

    #[error(transparent)]
    Board(#[from] BoardError),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to server: {0}")]
    Connect(#[source] io::Error),

    /// The server refused the login (name taken or connecting too often)
    #[error("login rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("unexpected {0} from server")]
    Unexpected(MessageKind),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("receive loop already started")]
    AlreadyStarted,

    #[error("not connected")]
    NotConnected,
}
