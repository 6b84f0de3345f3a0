//! Client half of the Place protocol

use crate::error::ClientError;
use crate::model::ClientModel;
use log::{debug, error, info};
use shared::{
    current_timestamp, read_message, write_message, Board, Color, Message, ProtocolError, Tile,
};
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Connection to a Place server
///
/// After [`connect`](Self::connect) the mirror holds the server's snapshot.
/// [`start_receive_loop`](Self::start_receive_loop) then hands the read half
/// and the model to a background task; the write half stays here for
/// [`request_change`](Self::request_change).
pub struct NetworkClient {
    username: String,
    server_addr: SocketAddr,
    reader: Option<OwnedReadHalf>,
    writer: Option<OwnedWriteHalf>,
    model: Option<ClientModel>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl NetworkClient {
    /// Logs in and loads the initial board into `model`
    ///
    /// Returns [`ClientError::Rejected`] if the server answers with ERROR
    /// instead of LOGIN_SUCCESS.
    pub async fn connect<A>(
        addr: A,
        username: &str,
        mut model: ClientModel,
    ) -> Result<Self, ClientError>
    where
        A: ToSocketAddrs,
    {
        let stream = TcpStream::connect(addr).await.map_err(ClientError::Connect)?;
        let server_addr = stream.peer_addr().map_err(ClientError::Connect)?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY: {}", e);
        }

        let (mut reader, mut writer) = stream.into_split();
        write_message(&mut writer, &Message::Login(username.to_string())).await?;

        match read_message(&mut reader).await? {
            Message::LoginSuccess => {
                info!("Successful login to {} as {}", server_addr, username);
            }
            Message::Error(reason) => return Err(ClientError::Rejected(reason)),
            other => return Err(ClientError::Unexpected(other.kind())),
        }

        match read_message(&mut reader).await? {
            Message::Board(board) => {
                info!("Received {}x{} board", board.dim(), board.dim());
                model.set_board(board);
            }
            other => return Err(ClientError::Unexpected(other.kind())),
        }

        Ok(Self {
            username: username.to_string(),
            server_addr,
            reader: Some(reader),
            writer: Some(writer),
            model: Some(model),
            shutdown: None,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// The mirror, available until the receive loop takes ownership of it
    pub fn board(&self) -> Option<&Board> {
        self.model.as_ref().and_then(ClientModel::board)
    }

    /// Spawns the listener that keeps the mirror in sync
    ///
    /// The returned handle resolves to the model once the loop ends, which
    /// happens on end of stream, bad input from the server, or
    /// [`disconnect`](Self::disconnect). There is no reconnection.
    pub fn start_receive_loop(&mut self) -> Result<JoinHandle<ClientModel>, ClientError> {
        if self.writer.is_none() {
            return Err(ClientError::NotConnected);
        }
        let (reader, model) = match (self.reader.take(), self.model.take()) {
            (Some(reader), Some(model)) => (reader, model),
            _ => return Err(ClientError::AlreadyStarted),
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown = Some(shutdown_tx);

        Ok(tokio::spawn(receive_loop(reader, model, shutdown_rx)))
    }

    /// Sends CHANGE_TILE; the outcome arrives later through the receive loop
    pub async fn request_change(&mut self, tile: Tile) -> Result<(), ClientError> {
        let writer = self.writer.as_mut().ok_or(ClientError::NotConnected)?;
        write_message(writer, &Message::ChangeTile(tile)).await?;
        Ok(())
    }

    /// Requests painting `(row, col)` with `color` under this client's name
    pub async fn paint(&mut self, row: i32, col: i32, color: Color) -> Result<(), ClientError> {
        let tile = Tile::new(row, col, color, self.username.clone(), current_timestamp());
        self.request_change(tile).await
    }

    /// Closes both directions of the connection; calling it again does nothing
    pub async fn disconnect(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.reader = None;

        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                debug!("Error shutting down connection: {}", e);
            }
            info!("Disconnected from {}", self.server_addr);
        }
    }
}

async fn receive_loop(
    mut reader: OwnedReadHalf,
    mut model: ClientModel,
    mut shutdown: oneshot::Receiver<()>,
) -> ClientModel {
    loop {
        let message = tokio::select! {
            _ = &mut shutdown => {
                debug!("Receive loop stopped");
                break;
            }
            message = read_message(&mut reader) => message,
        };

        match message {
            Ok(Message::TileChanged(tile)) => {
                if let Err(e) = model.apply_change(tile) {
                    error!("Invalid update from server: {}", e);
                    break;
                }
            }
            Ok(Message::Error(reason)) => model.report_error(&reason),
            Ok(other) => {
                error!("Unrecognized message from server: {}", other.kind());
                break;
            }
            Err(ProtocolError::Closed) => {
                info!("Server closed the connection");
                break;
            }
            Err(e) => {
                error!("Connection lost: {}", e);
                break;
            }
        }
    }
    model
}
