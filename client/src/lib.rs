//! # Place Client Library
//!
//! Client-side half of the shared canvas. A client logs in under a username,
//! receives the full board once, and from then on keeps a local mirror in sync
//! by applying every TILE_CHANGED broadcast in the order the server sent them.
//!
//! ## Architecture Overview
//!
//! The mirror is read-only from the user's point of view. Painting a tile sends
//! a CHANGE_TILE request and does nothing locally; the change becomes visible
//! when the server's broadcast comes back, which is the same path every other
//! client's changes take. Clients therefore never disagree about the order of
//! changes, and an out-of-bounds request simply results in an ERROR message.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! - TCP connection and login handshake
//! - Background receive loop that owns the mirror
//! - CHANGE_TILE requests and disconnect
//!
//! ### Model Module (`model`)
//! - [`ClientModel`], the local mirror of the board
//! - [`BoardObserver`], the hook views use to hear about updates
//!
//! ### Console Module (`console`)
//! - Text rendering of the board
//! - Parsing of `row col color` commands
//!
//! ### GUI Module (`gui`)
//! - Board layout and hit testing for the macroquad window
//! - Drawing of the board, palette and hover details
//!
//! ## Usage Example
//!
//! ```no_run
//! use client::{ClientModel, ConsoleView, NetworkClient};
//! use shared::Color;
//!
//! # async fn run() -> Result<(), client::ClientError> {
//! let mut model = ClientModel::new();
//! model.add_observer(ConsoleView::new(std::io::stdout()));
//!
//! let mut client = NetworkClient::connect("127.0.0.1:8080", "alice", model).await?;
//! let receive = client.start_receive_loop()?;
//!
//! client.paint(0, 0, Color::Blue).await?;
//!
//! client.disconnect().await;
//! let _model = receive.await;
//! # Ok(())
//! # }
//! ```

pub mod console;
pub mod error;
pub mod gui;
pub mod model;
pub mod network;

pub use console::{parse_command, Command, CommandError, ConsoleView};
pub use error::{ClientError, ModelError};
pub use model::{BoardObserver, ClientModel};
pub use network::NetworkClient;
