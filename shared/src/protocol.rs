//! Wire protocol shared by the server and every client
//!
//! Each message travels as one frame: a 4-byte big-endian length followed by the
//! bincode encoding of a [`Message`]. Frames are read one at a time, in arrival
//! order, from a single persistent stream per client.

use crate::board::{Board, Tile};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest frame a client accepts (a full board snapshot can be large)
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Largest frame the server accepts from a client (logins and tile requests)
pub const MAX_REQUEST_FRAME_LEN: usize = 64 * 1024;

/// Envelope exchanged between clients and the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// client → server, first message on a new connection
    Login(String),
    /// server → client, admission accepted
    LoginSuccess,
    /// server → client, admission or mutation rejected
    Error(String),
    /// server → client, sent once right after `LoginSuccess`
    Board(Board),
    /// client → server, request to repaint one cell
    ChangeTile(Tile),
    /// server → client, broadcast of an accepted change
    TileChanged(Tile),
}

/// Discriminant of a [`Message`], used for logging and protocol errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Login,
    LoginSuccess,
    Error,
    Board,
    ChangeTile,
    TileChanged,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Login(_) => MessageKind::Login,
            Message::LoginSuccess => MessageKind::LoginSuccess,
            Message::Error(_) => MessageKind::Error,
            Message::Board(_) => MessageKind::Board,
            Message::ChangeTile(_) => MessageKind::ChangeTile,
            Message::TileChanged(_) => MessageKind::TileChanged,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageKind::Login => "LOGIN",
            MessageKind::LoginSuccess => "LOGIN_SUCCESS",
            MessageKind::Error => "ERROR",
            MessageKind::Board => "BOARD",
            MessageKind::ChangeTile => "CHANGE_TILE",
            MessageKind::TileChanged => "TILE_CHANGED",
        };
        f.write_str(name)
    }
}

/// Transport-level failures; every one of them ends the connection
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed")]
    Closed,

    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    #[error("malformed message: {0}")]
    Malformed(#[from] bincode::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Encodes a message into a complete length-prefixed frame
pub fn encode_frame(message: &Message) -> Result<Vec<u8>, ProtocolError> {
    let payload = bincode::serialize(message)?;
    let len = u32::try_from(payload.len()).map_err(|_| ProtocolError::FrameTooLarge {
        len: payload.len(),
        max: u32::MAX as usize,
    })?;

    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Writes one framed message and flushes it
pub async fn write_message<W>(writer: &mut W, message: &Message) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(message)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one framed message, accepting frames up to [`MAX_FRAME_LEN`]
pub async fn read_message<R>(reader: &mut R) -> Result<Message, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    read_message_limited(reader, MAX_FRAME_LEN).await
}

/// Reads one framed message, rejecting frames longer than `max_len`
///
/// End of stream before the length prefix is reported as
/// [`ProtocolError::Closed`]; end of stream inside a frame is an I/O error.
pub async fn read_message_limited<R>(reader: &mut R, max_len: usize) -> Result<Message, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Err(ProtocolError::Closed),
        Err(e) => return Err(ProtocolError::Io(e)),
    };

    if len > max_len {
        return Err(ProtocolError::FrameTooLarge { len, max: max_len });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(bincode::deserialize(&payload)?)
}
