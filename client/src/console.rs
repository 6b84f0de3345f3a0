//! Plain-text view of the board and the command syntax for the console client

use crate::model::BoardObserver;
use shared::{Board, Color, Tile};
use std::io::Write;
use thiserror::Error;

/// A line of user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Paint { row: i32, col: i32, color: Color },
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("usage: <row> <col> <color>, or 'quit'")]
    Usage,

    #[error("'{0}' is not a valid coordinate")]
    Coordinate(String),

    #[error("{0}")]
    Color(String),
}

/// Parses `row col color` (color by number, hex digit or name), `quit`,
/// `exit` or `-1`. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    match parts.as_slice() {
        [] => Ok(None),
        [word] if matches!(*word, "quit" | "exit" | "-1") => Ok(Some(Command::Quit)),
        ["-1", ..] => Ok(Some(Command::Quit)),
        [row, col, color] => {
            let row = row
                .parse::<i32>()
                .map_err(|_| CommandError::Coordinate(row.to_string()))?;
            let col = col
                .parse::<i32>()
                .map_err(|_| CommandError::Coordinate(col.to_string()))?;
            let color = color.parse::<Color>().map_err(CommandError::Color)?;
            Ok(Some(Command::Paint { row, col, color }))
        }
        _ => Err(CommandError::Usage),
    }
}

/// Prints the whole board after every update
pub struct ConsoleView<W> {
    out: W,
}

impl<W: Write + Send> ConsoleView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> BoardObserver for ConsoleView<W> {
    fn on_update(&mut self, board: &Board, changed: Option<&Tile>) {
        if let Some(tile) = changed {
            let _ = writeln!(
                self.out,
                "\n{} painted ({}, {}) {}",
                tile.owner, tile.row, tile.col, tile.color
            );
        }
        let _ = write!(self.out, "\n{}\nMake a move (row col color): ", board);
        let _ = self.out.flush();
    }

    fn on_error(&mut self, message: &str) {
        let _ = writeln!(self.out, "\nError: {}", message);
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_paint_command() {
        assert_eq!(
            parse_command("2 3 5"),
            Ok(Some(Command::Paint {
                row: 2,
                col: 3,
                color: Color::Red
            }))
        );
        assert_eq!(
            parse_command("  0 1   blue "),
            Ok(Some(Command::Paint {
                row: 0,
                col: 1,
                color: Color::Blue
            }))
        );
        assert_eq!(
            parse_command("4 4 f"),
            Ok(Some(Command::Paint {
                row: 4,
                col: 4,
                color: Color::Fuchsia
            }))
        );
    }

    #[test]
    fn test_parse_negative_coordinates_are_passed_through() {
        assert_eq!(
            parse_command("0 -3 1"),
            Ok(Some(Command::Paint {
                row: 0,
                col: -3,
                color: Color::Gray
            }))
        );
    }

    #[test]
    fn test_parse_quit() {
        assert_eq!(parse_command("quit"), Ok(Some(Command::Quit)));
        assert_eq!(parse_command("exit"), Ok(Some(Command::Quit)));
        assert_eq!(parse_command("-1"), Ok(Some(Command::Quit)));
        assert_eq!(parse_command("-1 0 0"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_command(""), Ok(None));
        assert_eq!(parse_command("1 2"), Err(CommandError::Usage));
        assert_eq!(
            parse_command("a 2 3"),
            Err(CommandError::Coordinate("a".into()))
        );
        assert!(matches!(
            parse_command("1 2 mauve"),
            Err(CommandError::Color(_))
        ));
    }

    #[test]
    fn test_console_view_prints_board_and_change() {
        let mut view = ConsoleView::new(Vec::new());
        let mut board = Board::new(2);
        let tile = Tile::new(0, 0, Color::Black, "alice", 1);
        board.set_tile(tile.clone()).unwrap();

        view.on_update(&board, Some(&tile));
        view.on_error("Invalid Placement");

        let output = String::from_utf8(view.into_inner()).unwrap();
        assert!(output.contains("alice painted (0, 0) black"));
        assert!(output.contains("0 3\n3 3\n"));
        assert!(output.contains("Error: Invalid Placement"));
    }
}
