//! Types shared by the Place server and its clients: the canvas model and the
//! wire protocol.

pub mod board;
pub mod protocol;

pub use board::{Board, BoardError, Color, Tile};
pub use protocol::{
    encode_frame, read_message, read_message_limited, write_message, Message, MessageKind,
    ProtocolError, MAX_FRAME_LEN, MAX_REQUEST_FRAME_LEN,
};

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_monotonic_enough() {
        let first = current_timestamp();
        std::thread::sleep(Duration::from_millis(2));
        let second = current_timestamp();

        assert!(first > 0);
        assert!(second > first);
    }
}
