//! # Place Server Library
//!
//! This library provides the authoritative server for the shared Place canvas.
//! It owns the one true board, decides who may join, serializes every change,
//! and fans accepted changes out to all connected clients.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Board
//! The server holds the only mutable copy of the board. Clients keep read-only
//! mirrors that change only when the server tells them to. The single
//! validation rule is that a tile must lie inside the grid; any user may
//! repaint any cell, and the last write wins.
//!
//! ### Admission Control
//! The first message on every connection must be a login. A login is refused
//! when the username is already in use, or when another session from the same
//! IP address was created within the flood window and is still connected.
//!
//! ### Broadcast Fan-out
//! Every accepted change is stamped with the server clock and the author's
//! username, committed, and queued for every session (the author included)
//! in one critical section.
//!
//! ## Architecture Design
//!
//! ### Task Per Connection
//! A listener task accepts TCP connections and spawns one session task per
//! client. Each active session additionally owns a writer task that drains its
//! outbound queue, so a stalled client never blocks the core or its peers.
//!
//! ### One Lock
//! [`state::ServerCore`] keeps the board and the session registry behind a
//! single mutex. Admission, mutation and removal all go through it, which gives
//! every client the same global order of changes and makes name checks
//! race-free.
//!
//! ## Module Organization
//!
//! - `config`: [`ServerConfig`] and its defaults
//! - `error`: admission, mutation and startup errors
//! - `registry`: active sessions and the admission policy
//! - `state`: the server core (board + registry + serialized operations)
//! - `session`: the per-connection state machine
//! - `network`: the TCP listener
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         port: 8080,
//!         dim: 16,
//!         ..ServerConfig::default()
//!     };
//!
//!     let server = Server::bind(&config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod network;
pub mod registry;
pub mod session;
pub mod state;

pub use config::ServerConfig;
pub use error::{AdmissionError, ChangeError, ServerError};
pub use network::Server;
pub use registry::SessionId;
pub use state::{Admission, ServerCore};
