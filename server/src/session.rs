//! Per-connection session handling
//!
//! A session walks through `Connecting → LoggingIn → Active → Closed`. While
//! active it runs two duties at once: a writer task that drains the session's
//! outbound queue onto the socket, and the handler's own loop that reads
//! change requests and hands them to the server core. Whatever ends first ends
//! the session; nothing is retried.

use crate::error::AdmissionError;
use crate::registry::SessionId;
use crate::state::{Admission, ServerCore};
use log::{debug, info, warn};
use shared::{
    read_message_limited, write_message, Board, Message, MessageKind, ProtocolError,
    MAX_REQUEST_FRAME_LEN,
};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    LoggingIn,
    Active,
    Closed,
}

/// Why a session reached `Closed`
#[derive(Debug)]
pub enum CloseReason {
    /// Peer closed the stream cleanly
    Disconnected,
    /// Read failure, oversized or undecodable frame
    Transport(ProtocolError),
    /// Peer sent a message kind it may not send in the current state
    Violation(MessageKind),
    /// Login refused by admission control
    Rejected(AdmissionError),
    /// Writing to the peer failed
    DeliveryFailed(String),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Disconnected => write!(f, "client disconnected"),
            CloseReason::Transport(e) => write!(f, "transport error: {}", e),
            CloseReason::Violation(kind) => write!(f, "protocol violation: unexpected {}", kind),
            CloseReason::Rejected(e) => write!(f, "login rejected: {}", e),
            CloseReason::DeliveryFailed(e) => write!(f, "delivery failed: {}", e),
        }
    }
}

impl From<ProtocolError> for CloseReason {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::Closed => CloseReason::Disconnected,
            other => CloseReason::Transport(other),
        }
    }
}

fn transition(state: &mut SessionState, next: SessionState, addr: SocketAddr) {
    debug!("Session {}: {:?} -> {:?}", addr, state, next);
    *state = next;
}

/// Drives one client connection from accept to close
///
/// The server core's `remove` is called exactly once for an admitted session,
/// after both duties have stopped. A session that never got admitted is never
/// registered and so is never removed.
pub async fn run_session<S>(stream: S, addr: SocketAddr, core: Arc<ServerCore>) -> CloseReason
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let mut state = SessionState::Connecting;
    let (mut reader, mut writer) = tokio::io::split(stream);

    transition(&mut state, SessionState::LoggingIn, addr);
    let username = match read_message_limited(&mut reader, MAX_REQUEST_FRAME_LEN).await {
        Ok(Message::Login(username)) => username,
        Ok(other) => {
            warn!("{} sent {} before logging in", addr, other.kind());
            let reason = format!("expected {} but received {}", MessageKind::Login, other.kind());
            reject(&mut writer, reason).await;
            transition(&mut state, SessionState::Closed, addr);
            return CloseReason::Violation(other.kind());
        }
        Err(e) => {
            debug!("{} went away before logging in: {}", addr, e);
            transition(&mut state, SessionState::Closed, addr);
            return e.into();
        }
    };

    let Admission {
        id,
        username,
        snapshot,
        outbound,
    } = match core.admit(&username, addr).await {
        Ok(admission) => admission,
        Err(e) => {
            warn!("Failed to connect {} from {}: {}", username, addr, e);
            reject(&mut writer, e.to_string()).await;
            transition(&mut state, SessionState::Closed, addr);
            return CloseReason::Rejected(e);
        }
    };

    transition(&mut state, SessionState::Active, addr);
    let mut delivery = tokio::spawn(deliver_outbound(writer, snapshot, outbound));

    let reason = tokio::select! {
        reason = read_requests(&mut reader, &core, id) => reason,
        result = &mut delivery => match result {
            Ok(Ok(())) => CloseReason::Disconnected,
            Ok(Err(e)) => CloseReason::DeliveryFailed(e.to_string()),
            Err(e) => CloseReason::DeliveryFailed(e.to_string()),
        },
    };

    delivery.abort();
    core.remove(id).await;
    transition(&mut state, SessionState::Closed, addr);
    info!("Session {} ({} from {}) closed: {}", id, username, addr, reason);

    reason
}

/// Sends the single ERROR message of a refused login and closes the write side
async fn reject<W>(writer: &mut W, reason: String)
where
    W: AsyncWrite + Unpin,
{
    if let Err(e) = write_message(writer, &Message::Error(reason)).await {
        debug!("Could not deliver rejection: {}", e);
    }
    let _ = writer.shutdown().await;
}

/// Writer duty: greeting, snapshot, then every queued broadcast in order
async fn deliver_outbound<W>(
    mut writer: W,
    snapshot: Board,
    mut outbound: mpsc::UnboundedReceiver<Message>,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    write_message(&mut writer, &Message::LoginSuccess).await?;
    write_message(&mut writer, &Message::Board(snapshot)).await?;

    while let Some(message) = outbound.recv().await {
        write_message(&mut writer, &message).await?;
    }
    Ok(())
}

/// Reader duty: forwards change requests until the stream ends or misbehaves
async fn read_requests<R>(reader: &mut R, core: &ServerCore, id: SessionId) -> CloseReason
where
    R: AsyncRead + Unpin,
{
    loop {
        match read_message_limited(reader, MAX_REQUEST_FRAME_LEN).await {
            Ok(Message::ChangeTile(tile)) => {
                // rejections are already queued back to this session
                if let Err(e) = core.apply_change(id, tile).await {
                    debug!("Session {} change refused: {}", id, e);
                }
            }
            Ok(other) => return CloseReason::Violation(other.kind()),
            Err(e) => return e.into(),
        }
    }
}
