//! The authoritative canvas and the serialized operations that change it

use crate::error::{AdmissionError, ChangeError};
use crate::registry::{SessionId, SessionRegistry};
use log::{debug, info, warn};
use shared::{current_timestamp, Board, Message, Tile};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};

/// Everything the core serializes: the board and who is connected
struct CoreState {
    board: Board,
    sessions: SessionRegistry,
}

/// What a newly admitted session needs to start running
#[derive(Debug)]
pub struct Admission {
    pub id: SessionId,
    pub username: String,
    /// Board as of the moment of admission
    pub snapshot: Board,
    /// Receives every broadcast committed after `snapshot` was taken
    pub outbound: mpsc::UnboundedReceiver<Message>,
}

/// Sole owner of the board and the session registry
///
/// Every operation takes the same lock, so admissions, changes and removals
/// are applied one at a time and every session sees changes in one global
/// order. Nothing inside the lock waits on a socket; broadcasts only push onto
/// unbounded per-session queues.
pub struct ServerCore {
    dim: usize,
    state: Mutex<CoreState>,
}

impl ServerCore {
    pub fn new(dim: usize, flood_window: Duration) -> Self {
        Self {
            dim,
            state: Mutex::new(CoreState {
                board: Board::new(dim),
                sessions: SessionRegistry::new(flood_window),
            }),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Admits `username` connecting from `addr`, or explains why not
    ///
    /// The snapshot is cloned under the same lock as the registration, so any
    /// change committed afterwards is guaranteed to reach the new session's
    /// queue and none committed before is missing from the snapshot.
    pub async fn admit(
        &self,
        username: &str,
        addr: SocketAddr,
    ) -> Result<Admission, AdmissionError> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        state.sessions.check_admission(username, addr.ip(), now)?;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let id = state
            .sessions
            .register(username.to_string(), addr, now, outbound_tx);
        let snapshot = state.board.clone();

        info!(
            "User {} joined from {} as session {} ({} connected)",
            username,
            addr,
            id,
            state.sessions.len()
        );
        info!(
            "Current connected users: [{}]",
            state.sessions.usernames().join(", ")
        );

        Ok(Admission {
            id,
            username: username.to_string(),
            snapshot,
            outbound: outbound_rx,
        })
    }

    /// Validates, stamps, commits and broadcasts one tile change
    ///
    /// The accepted tile carries the server's clock and the session's username
    /// regardless of what the client sent. A rejected change is reported to the
    /// originating session only and leaves the board untouched.
    pub async fn apply_change(&self, session: SessionId, tile: Tile) -> Result<Tile, ChangeError> {
        let mut state = self.state.lock().await;

        let owner = match state.sessions.get(session) {
            Some(entry) => entry.username.clone(),
            None => return Err(ChangeError::UnknownSession(session)),
        };

        if let Err(e) = state.board.check(&tile) {
            warn!("Rejected change from {}: {}", owner, e);
            state.sessions.send_to(session, Message::Error(e.to_string()));
            return Err(e.into());
        }

        let stamped = Tile {
            owner,
            timestamp: current_timestamp(),
            ..tile
        };
        state.board.set_tile(stamped.clone())?;

        let delivered = state
            .sessions
            .broadcast(&Message::TileChanged(stamped.clone()));
        debug!(
            "{} painted ({}, {}) {} -> {} sessions",
            stamped.owner, stamped.row, stamped.col, stamped.color, delivered
        );

        Ok(stamped)
    }

    /// Deregisters a session; removing one that is already gone is a no-op
    pub async fn remove(&self, session: SessionId) -> bool {
        let mut state = self.state.lock().await;

        match state.sessions.remove(session) {
            Some(entry) => {
                info!("Removed user {}", entry.username);
                info!(
                    "Current connected users: [{}]",
                    state.sessions.usernames().join(", ")
                );
                true
            }
            None => false,
        }
    }

    /// Copy of the current board
    pub async fn snapshot(&self) -> Board {
        self.state.lock().await.board.clone()
    }

    pub async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    pub async fn usernames(&self) -> Vec<String> {
        self.state.lock().await.sessions.usernames()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{BoardError, Color};
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn core(dim: usize) -> ServerCore {
        ServerCore::new(dim, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_admit_returns_current_snapshot() {
        let core = core(3);
        let alice = assert_ok!(core.admit("alice", addr(1)).await);
        assert_eq!(alice.snapshot, core.snapshot().await);

        assert_ok!(
            core.apply_change(alice.id, Tile::new(0, 0, Color::Blue, "alice", 0))
                .await
        );

        let bob = assert_ok!(core.admit("bob", addr(2)).await);
        assert_eq!(bob.snapshot.get_tile(0, 0).unwrap().color, Color::Blue);
        assert_eq!(core.usernames().await, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_admit_rejects_duplicate_name() {
        let core = core(3);
        let _alice = assert_ok!(core.admit("alice", addr(1)).await);

        let result = core.admit("alice", addr(2)).await;
        assert_eq!(
            result.unwrap_err(),
            AdmissionError::NameTaken("alice".to_string())
        );
        assert_eq!(core.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_admit_rejects_fast_reconnect() {
        let core = ServerCore::new(3, Duration::from_secs(60));
        let _alice = assert_ok!(core.admit("alice", addr(1)).await);

        let result = core.admit("bob", addr(2)).await;
        assert!(matches!(result, Err(AdmissionError::TooFrequent(_))));
        assert_eq!(core.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_admits_with_same_name() {
        let core = Arc::new(core(3));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let core = Arc::clone(&core);
                tokio::spawn(async move { core.admit("alice", addr(1000 + i)).await })
            })
            .collect();

        let mut admitted = 0;
        let mut taken = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(AdmissionError::NameTaken(_)) => taken += 1,
                Err(e) => panic!("unexpected admission error: {}", e),
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(taken, 7);
        assert_eq!(core.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_apply_change_stamps_owner_and_time() {
        let core = core(3);
        let alice = assert_ok!(core.admit("alice", addr(1)).await);
        let before = current_timestamp();

        let forged = Tile::new(2, 1, Color::Red, "mallory", 0);
        let stamped = assert_ok!(core.apply_change(alice.id, forged).await);

        assert_eq!(stamped.owner, "alice");
        assert!(stamped.timestamp >= before);
        assert_eq!(core.snapshot().await.get_tile(2, 1), Some(&stamped));
    }

    #[tokio::test]
    async fn test_every_valid_cell_is_accepted() {
        let dim = 4;
        let core = core(dim);
        let alice = assert_ok!(core.admit("alice", addr(1)).await);

        for row in 0..dim as i32 {
            for col in 0..dim as i32 {
                let tile = Tile::new(row, col, Color::Green, "alice", 0);
                assert_ok!(core.apply_change(alice.id, tile).await);
            }
        }

        let board = core.snapshot().await;
        assert!(board.tiles().all(|t| t.color == Color::Green && t.owner == "alice"));
    }

    #[tokio::test]
    async fn test_out_of_bounds_rejected_to_originator_only() {
        let core = core(3);
        let mut alice = assert_ok!(core.admit("alice", addr(1)).await);
        let mut bob = assert_ok!(core.admit("bob", addr(2)).await);
        let before = core.snapshot().await;

        for (row, col) in [(3, 0), (0, 3), (-1, 0), (0, -1), (100, 100)] {
            let result = core
                .apply_change(alice.id, Tile::new(row, col, Color::Red, "alice", 0))
                .await;
            assert!(matches!(
                result,
                Err(ChangeError::OutOfBounds(BoardError::OutOfBounds { .. }))
            ));
        }

        assert_eq!(core.snapshot().await, before);
        for _ in 0..5 {
            assert!(matches!(alice.outbound.try_recv(), Ok(Message::Error(_))));
        }
        assert!(bob.outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_accepted_change_broadcast_to_all_including_originator() {
        let core = core(3);
        let mut alice = assert_ok!(core.admit("alice", addr(1)).await);
        let mut bob = assert_ok!(core.admit("bob", addr(2)).await);

        let stamped = assert_ok!(
            core.apply_change(bob.id, Tile::new(1, 1, Color::Purple, "bob", 0))
                .await
        );

        let expected = Message::TileChanged(stamped);
        assert_eq!(alice.outbound.try_recv().unwrap(), expected);
        assert_eq!(bob.outbound.try_recv().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_changes_observed_in_commit_order() {
        let core = Arc::new(core(8));
        let mut alice = assert_ok!(core.admit("alice", addr(1)).await);
        let mut bob = assert_ok!(core.admit("bob", addr(2)).await);

        let writers: Vec<_> = [alice.id, bob.id]
            .into_iter()
            .map(|id| {
                let core = Arc::clone(&core);
                tokio::spawn(async move {
                    for i in 0..20 {
                        let tile = Tile::new(i % 8, i / 8, Color::Red, "", 0);
                        core.apply_change(id, tile).await.unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        let mut seen_by_alice = Vec::new();
        while let Ok(message) = alice.outbound.try_recv() {
            seen_by_alice.push(message);
        }
        let mut seen_by_bob = Vec::new();
        while let Ok(message) = bob.outbound.try_recv() {
            seen_by_bob.push(message);
        }

        assert_eq!(seen_by_alice.len(), 40);
        assert_eq!(seen_by_alice, seen_by_bob);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let core = core(3);
        let mut alice = assert_ok!(core.admit("alice", addr(1)).await);
        let bob = assert_ok!(core.admit("bob", addr(2)).await);

        assert!(core.remove(alice.id).await);
        assert!(!core.remove(alice.id).await);
        assert_eq!(core.usernames().await, vec!["bob"]);

        assert_ok!(
            core.apply_change(bob.id, Tile::new(0, 0, Color::Navy, "bob", 0))
                .await
        );
        assert!(alice.outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_change_from_removed_session_is_refused() {
        let core = core(3);
        let alice = assert_ok!(core.admit("alice", addr(1)).await);
        core.remove(alice.id).await;

        let result = core
            .apply_change(alice.id, Tile::new(0, 0, Color::Red, "alice", 0))
            .await;
        assert_eq!(
            assert_err!(result),
            ChangeError::UnknownSession(alice.id)
        );
        assert_eq!(
            core.snapshot().await.get_tile(0, 0).unwrap().color,
            Color::White
        );
    }
}
