//! Error types for admission, mutation and server startup

use crate::registry::SessionId;
use shared::BoardError;
use std::io;
use std::net::IpAddr;
use thiserror::Error;

/// Reasons a login is refused. The display text is sent to the rejected
/// client as its single ERROR message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("username must not be empty")]
    InvalidName,

    #[error("username \"{0}\" is already taken")]
    NameTaken(String),

    #[error("{0} is connecting too frequently")]
    TooFrequent(IpAddr),
}

/// Reasons a tile change is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangeError {
    #[error(transparent)]
    OutOfBounds(#[from] BoardError),

    #[error("session {0} is not registered")]
    UnknownSession(SessionId),
}

/// Fatal server errors; any of these aborts startup
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
