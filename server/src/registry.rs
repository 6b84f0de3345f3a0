//! Registry of active sessions and the admission policy that guards it
//!
//! This module tracks every logged-in client on the server side:
//! - Username uniqueness among active sessions
//! - Flood protection keyed by the client's IP address
//! - The outbound queue used to deliver broadcasts to each session
//!
//! The registry has no locking of its own. It is only ever touched while the
//! server core holds its lock, which makes check-then-register atomic.

use crate::error::AdmissionError;
use log::debug;
use shared::Message;
use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Server-assigned session identifier, increasing in admission order
pub type SessionId = u64;

/// One logged-in client
///
/// Each entry holds:
/// - Identity (session ID, username, remote address)
/// - Creation time, used by the flood guard
/// - The sending half of the session's outbound queue
///
/// The queue is unbounded: a client that stops reading keeps every pending
/// broadcast in memory until its socket fails and the session is removed.
#[derive(Debug)]
pub struct SessionEntry {
    pub id: SessionId,
    pub username: String,
    pub addr: SocketAddr,
    pub connected_at: Instant,
    outbound: mpsc::UnboundedSender<Message>,
}

impl SessionEntry {
    pub fn new(
        id: SessionId,
        username: String,
        addr: SocketAddr,
        connected_at: Instant,
        outbound: mpsc::UnboundedSender<Message>,
    ) -> Self {
        Self {
            id,
            username,
            addr,
            connected_at,
            outbound,
        }
    }

    /// Checks whether this session was created less than `window` before `now`
    pub fn is_recent(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.connected_at) < window
    }

    /// Queues a message for delivery without waiting on the network.
    /// Returns false if the session's writer has already gone away.
    pub fn send(&self, message: Message) -> bool {
        self.outbound.send(message).is_ok()
    }
}

/// All active sessions plus the admission policy
pub struct SessionRegistry {
    /// Active sessions indexed (and therefore ordered) by ID
    sessions: BTreeMap<SessionId, SessionEntry>,
    /// Next ID handed out on admission
    next_id: SessionId,
    /// Cooldown applied per IP address
    flood_window: Duration,
}

impl SessionRegistry {
    pub fn new(flood_window: Duration) -> Self {
        Self {
            sessions: BTreeMap::new(),
            next_id: 1,
            flood_window,
        }
    }

    /// Decides whether `username` connecting from `ip` may join at `now`
    ///
    /// The name check runs first. The flood check refuses the login while a
    /// still-registered session from the same IP is younger than the flood
    /// window, measured from that session's creation rather than from this
    /// attempt.
    pub fn check_admission(
        &self,
        username: &str,
        ip: IpAddr,
        now: Instant,
    ) -> Result<(), AdmissionError> {
        if username.trim().is_empty() {
            return Err(AdmissionError::InvalidName);
        }

        if self.sessions.values().any(|s| s.username == username) {
            return Err(AdmissionError::NameTaken(username.to_string()));
        }

        let flooding = self
            .sessions
            .values()
            .any(|s| s.addr.ip() == ip && s.is_recent(now, self.flood_window));
        if flooding {
            return Err(AdmissionError::TooFrequent(ip));
        }

        Ok(())
    }

    /// Registers a session that already passed [`check_admission`](Self::check_admission)
    pub fn register(
        &mut self,
        username: String,
        addr: SocketAddr,
        connected_at: Instant,
        outbound: mpsc::UnboundedSender<Message>,
    ) -> SessionId {
        let id = self.next_id;
        self.next_id += 1;

        let entry = SessionEntry::new(id, username, addr, connected_at, outbound);
        self.sessions.insert(id, entry);
        id
    }

    /// Removes a session, returning it if it was still registered
    pub fn remove(&mut self, id: SessionId) -> Option<SessionEntry> {
        self.sessions.remove(&id)
    }

    pub fn get(&self, id: SessionId) -> Option<&SessionEntry> {
        self.sessions.get(&id)
    }

    /// Queues a message for one session only
    pub fn send_to(&self, id: SessionId, message: Message) -> bool {
        self.sessions
            .get(&id)
            .map(|session| session.send(message))
            .unwrap_or(false)
    }

    /// Queues a copy of `message` for every registered session
    ///
    /// Returns how many queues accepted it. A closed queue belongs to a session
    /// that is tearing down and will be removed by its own handler.
    pub fn broadcast(&self, message: &Message) -> usize {
        let mut delivered = 0;
        for session in self.sessions.values() {
            if session.send(message.clone()) {
                delivered += 1;
            } else {
                debug!("Session {} outbound queue is closed", session.id);
            }
        }
        delivered
    }

    /// Usernames of all active sessions in admission order
    pub fn usernames(&self) -> Vec<String> {
        self.sessions
            .values()
            .map(|session| session.username.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
