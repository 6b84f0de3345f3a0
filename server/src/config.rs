//! Server configuration, filled in from the command line by the binary

use crate::error::ServerError;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DIM: usize = 10;
pub const MAX_DIM: usize = 1024;

/// Minimum time between two sessions from the same address
pub const DEFAULT_FLOOD_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Side length of the square board
    pub dim: usize,
    /// A new login is refused while a session from the same IP address that
    /// is younger than this window is still connected. Zero disables the check.
    pub flood_window: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            dim: DEFAULT_DIM,
            flood_window: DEFAULT_FLOOD_WINDOW,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        if self.dim == 0 || self.dim > MAX_DIM {
            return Err(ServerError::Config(format!(
                "board dimension must be between 1 and {}, got {}",
                MAX_DIM, self.dim
            )));
        }
        Ok(())
    }
}
