//! Canvas data model: the color palette, individual tiles and the board grid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::current_timestamp;

/// Errors raised by the board's validity rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("invalid placement: ({row}, {col}) is outside the {dim}x{dim} board")]
    OutOfBounds { row: i32, col: i32, dim: usize },

    #[error("board of dimension {dim} needs {expected} tiles, got {actual}")]
    TileCount {
        dim: usize,
        expected: usize,
        actual: usize,
    },

    #[error("tile ({row}, {col}) is stored at the wrong position")]
    Misplaced { row: i32, col: i32 },

    #[error("board dimension {dim} is too large")]
    DimensionTooLarge { dim: usize },
}

/// The fixed Place palette. Numbers match the hex digit shown in text views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Black,
    Gray,
    Silver,
    White,
    Maroon,
    Red,
    Olive,
    Yellow,
    Green,
    Lime,
    Teal,
    Aqua,
    Navy,
    Blue,
    Purple,
    Fuchsia,
}

impl Color {
    pub const ALL: [Color; 16] = [
        Color::Black,
        Color::Gray,
        Color::Silver,
        Color::White,
        Color::Maroon,
        Color::Red,
        Color::Olive,
        Color::Yellow,
        Color::Green,
        Color::Lime,
        Color::Teal,
        Color::Aqua,
        Color::Navy,
        Color::Blue,
        Color::Purple,
        Color::Fuchsia,
    ];

    /// Color every cell starts with
    pub const DEFAULT: Color = Color::White;

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(number: u8) -> Option<Color> {
        Self::ALL.get(number as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Black => "black",
            Color::Gray => "gray",
            Color::Silver => "silver",
            Color::White => "white",
            Color::Maroon => "maroon",
            Color::Red => "red",
            Color::Olive => "olive",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Lime => "lime",
            Color::Teal => "teal",
            Color::Aqua => "aqua",
            Color::Navy => "navy",
            Color::Blue => "blue",
            Color::Purple => "purple",
            Color::Fuchsia => "fuchsia",
        }
    }

    /// Standard web RGB values for the palette
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Black => (0, 0, 0),
            Color::Gray => (128, 128, 128),
            Color::Silver => (192, 192, 192),
            Color::White => (255, 255, 255),
            Color::Maroon => (128, 0, 0),
            Color::Red => (255, 0, 0),
            Color::Olive => (128, 128, 0),
            Color::Yellow => (255, 255, 0),
            Color::Green => (0, 128, 0),
            Color::Lime => (0, 255, 0),
            Color::Teal => (0, 128, 128),
            Color::Aqua => (0, 255, 255),
            Color::Navy => (0, 0, 128),
            Color::Blue => (0, 0, 255),
            Color::Purple => (128, 0, 128),
            Color::Fuchsia => (255, 0, 255),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts a decimal number (`13`), a single hex digit (`d`) or a name (`Blue`)
impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(number) = s.parse::<u8>() {
            return Color::from_number(number).ok_or_else(|| format!("no color numbered {}", s));
        }
        if s.len() == 1 {
            if let Ok(number) = u8::from_str_radix(s, 16) {
                if let Some(color) = Color::from_number(number) {
                    return Ok(color);
                }
            }
        }
        Color::ALL
            .iter()
            .copied()
            .find(|color| color.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown color '{}'", s))
    }
}

/// One cell of the canvas
///
/// `timestamp` is the last-write time in milliseconds since the Unix epoch.
/// Clients may fill it in, but the server replaces it (and `owner`) when it
/// accepts a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub row: i32,
    pub col: i32,
    pub color: Color,
    pub owner: String,
    pub timestamp: u64,
}

impl Tile {
    pub fn new(row: i32, col: i32, color: Color, owner: impl Into<String>, timestamp: u64) -> Self {
        Self {
            row,
            col,
            color,
            owner: owner.into(),
            timestamp,
        }
    }
}

/// Square grid of tiles stored in row-major order
///
/// Every in-range cell always holds exactly one tile. Deserialization goes
/// through [`BoardData`] so a peer cannot hand us a board whose tiles don't
/// line up with its dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BoardData")]
pub struct Board {
    dim: usize,
    tiles: Vec<Tile>,
}

#[derive(Deserialize)]
struct BoardData {
    dim: usize,
    tiles: Vec<Tile>,
}

impl TryFrom<BoardData> for Board {
    type Error = BoardError;

    fn try_from(data: BoardData) -> Result<Self, Self::Error> {
        let expected = data
            .dim
            .checked_mul(data.dim)
            .filter(|_| i32::try_from(data.dim).is_ok())
            .ok_or(BoardError::DimensionTooLarge { dim: data.dim })?;
        if data.tiles.len() != expected {
            return Err(BoardError::TileCount {
                dim: data.dim,
                expected,
                actual: data.tiles.len(),
            });
        }

        let board = Board {
            dim: data.dim,
            tiles: data.tiles,
        };
        for (index, tile) in board.tiles.iter().enumerate() {
            if board.index_of(tile.row, tile.col) != Some(index) {
                return Err(BoardError::Misplaced {
                    row: tile.row,
                    col: tile.col,
                });
            }
        }
        Ok(board)
    }
}

impl Board {
    /// Creates a `dim × dim` board of default-colored, unowned tiles
    ///
    /// `dim` must already be bounded by the caller (the server caps it at
    /// `MAX_DIM`); use [`Board::with_dim`] for an unchecked value.
    pub fn new(dim: usize) -> Self {
        let created = current_timestamp();
        let mut tiles = Vec::with_capacity(dim * dim);
        for row in 0..dim {
            for col in 0..dim {
                tiles.push(Tile::new(
                    row as i32,
                    col as i32,
                    Color::DEFAULT,
                    "",
                    created,
                ));
            }
        }
        Self { dim, tiles }
    }

    /// Like [`Board::new`], but refuses dimensions whose cell count or
    /// coordinates do not fit
    pub fn with_dim(dim: usize) -> Result<Self, BoardError> {
        match dim.checked_mul(dim) {
            Some(_) if i32::try_from(dim).is_ok() => Ok(Self::new(dim)),
            _ => Err(BoardError::DimensionTooLarge { dim }),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    fn index_of(&self, row: i32, col: i32) -> Option<usize> {
        if row < 0 || col < 0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        if row < self.dim && col < self.dim {
            Some(row * self.dim + col)
        } else {
            None
        }
    }

    /// Returns the tile at `(row, col)`, or `None` outside the grid
    pub fn get_tile(&self, row: i32, col: i32) -> Option<&Tile> {
        self.index_of(row, col).map(|index| &self.tiles[index])
    }

    /// The single acceptance rule: coordinates must lie inside the grid
    pub fn is_valid(&self, tile: &Tile) -> bool {
        self.index_of(tile.row, tile.col).is_some()
    }

    pub fn check(&self, tile: &Tile) -> Result<(), BoardError> {
        if self.is_valid(tile) {
            Ok(())
        } else {
            Err(BoardError::OutOfBounds {
                row: tile.row,
                col: tile.col,
                dim: self.dim,
            })
        }
    }

    /// Replaces the tile at the new tile's coordinates (last write wins)
    pub fn set_tile(&mut self, tile: Tile) -> Result<(), BoardError> {
        self.check(&tile)?;
        if let Some(index) = self.index_of(tile.row, tile.col) {
            self.tiles[index] = tile;
        }
        Ok(())
    }

    /// Iterates tiles in row-major order
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.tiles.chunks(self.dim.max(1)) {
            let line: Vec<String> = row
                .iter()
                .map(|tile| format!("{:X}", tile.color.number()))
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_is_default_colored() {
        let board = Board::new(3);
        assert_eq!(board.dim(), 3);
        assert_eq!(board.tiles().count(), 9);

        for row in 0..3 {
            for col in 0..3 {
                let tile = board.get_tile(row, col).unwrap();
                assert_eq!(tile.row, row);
                assert_eq!(tile.col, col);
                assert_eq!(tile.color, Color::White);
                assert!(tile.owner.is_empty());
            }
        }
    }

    #[test]
    fn test_validity_boundaries() {
        let board = Board::new(4);
        let tile = |row, col| Tile::new(row, col, Color::Red, "alice", 0);

        assert!(board.is_valid(&tile(0, 0)));
        assert!(board.is_valid(&tile(3, 3)));
        assert!(board.is_valid(&tile(0, 3)));

        assert!(!board.is_valid(&tile(4, 0)));
        assert!(!board.is_valid(&tile(0, 4)));
        assert!(!board.is_valid(&tile(-1, 0)));
        assert!(!board.is_valid(&tile(0, -1)));
        assert!(!board.is_valid(&tile(i32::MAX, i32::MIN)));
    }

    #[test]
    fn test_set_tile_last_write_wins() {
        let mut board = Board::new(3);

        board
            .set_tile(Tile::new(1, 2, Color::Blue, "alice", 10))
            .unwrap();
        board
            .set_tile(Tile::new(1, 2, Color::Red, "bob", 20))
            .unwrap();

        let tile = board.get_tile(1, 2).unwrap();
        assert_eq!(tile.color, Color::Red);
        assert_eq!(tile.owner, "bob");
        assert_eq!(tile.timestamp, 20);
        assert_eq!(board.get_tile(0, 0).unwrap().color, Color::White);
    }

    #[test]
    fn test_set_tile_out_of_bounds_leaves_board_unchanged() {
        let mut board = Board::new(2);
        let before = board.clone();

        let result = board.set_tile(Tile::new(2, 0, Color::Red, "alice", 1));
        assert_eq!(
            result,
            Err(BoardError::OutOfBounds {
                row: 2,
                col: 0,
                dim: 2
            })
        );
        assert_eq!(board, before);
    }

    #[test]
    fn test_get_tile_out_of_range() {
        let board = Board::new(2);
        assert!(board.get_tile(2, 0).is_none());
        assert!(board.get_tile(-1, 1).is_none());
    }

    #[test]
    fn test_board_display_uses_hex_digits() {
        let mut board = Board::new(2);
        board
            .set_tile(Tile::new(0, 1, Color::Fuchsia, "alice", 0))
            .unwrap();
        board
            .set_tile(Tile::new(1, 0, Color::Black, "bob", 0))
            .unwrap();

        assert_eq!(board.to_string(), "3 F\n0 3\n");
    }

    #[test]
    fn test_deserialize_rejects_wrong_tile_count() {
        let data = BoardData {
            dim: 2,
            tiles: vec![Tile::new(0, 0, Color::White, "", 0)],
        };
        assert_eq!(
            Board::try_from(data),
            Err(BoardError::TileCount {
                dim: 2,
                expected: 4,
                actual: 1
            })
        );
    }

    #[test]
    fn test_deserialize_rejects_misplaced_tiles() {
        let mut tiles: Vec<Tile> = Board::new(2).tiles().cloned().collect();
        tiles.swap(0, 3);

        let result = Board::try_from(BoardData { dim: 2, tiles });
        assert!(matches!(result, Err(BoardError::Misplaced { .. })));
    }

    #[test]
    fn test_deserialize_rejects_overflowing_dimension() {
        let bytes = bincode::serialize(&(1u64 << 32, Vec::<Tile>::new())).unwrap();
        let result: Result<Board, _> = bincode::deserialize(&bytes);
        assert!(result.is_err());

        let bytes = bincode::serialize(&(u64::MAX, Vec::<Tile>::new())).unwrap();
        let result: Result<Board, _> = bincode::deserialize(&bytes);
        assert!(result.is_err());
    }

    #[test]
    fn test_with_dim_checks_size() {
        let board = Board::with_dim(4).unwrap();
        assert_eq!(board.dim(), 4);
        assert_eq!(board.tiles().count(), 16);

        assert_eq!(
            Board::with_dim(1 << 32),
            Err(BoardError::DimensionTooLarge { dim: 1 << 32 })
        );
        assert_eq!(
            Board::with_dim(usize::MAX),
            Err(BoardError::DimensionTooLarge { dim: usize::MAX })
        );
    }

    #[test]
    fn test_board_bincode_roundtrip_preserves_tiles() {
        let mut board = Board::new(3);
        board
            .set_tile(Tile::new(2, 1, Color::Teal, "carol", 42))
            .unwrap();

        let bytes = bincode::serialize(&board).unwrap();
        let decoded: Board = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, board);
    }

    #[test]
    fn test_color_numbers_and_names() {
        assert_eq!(Color::Black.number(), 0);
        assert_eq!(Color::White.number(), 3);
        assert_eq!(Color::Fuchsia.number(), 15);
        assert_eq!(Color::from_number(13), Some(Color::Blue));
        assert_eq!(Color::from_number(16), None);

        for color in Color::ALL {
            assert_eq!(Color::from_number(color.number()), Some(color));
        }
    }

    #[test]
    fn test_color_from_str() {
        assert_eq!("5".parse::<Color>(), Ok(Color::Red));
        assert_eq!("13".parse::<Color>(), Ok(Color::Blue));
        assert_eq!("d".parse::<Color>(), Ok(Color::Blue));
        assert_eq!("F".parse::<Color>(), Ok(Color::Fuchsia));
        assert_eq!("Navy".parse::<Color>(), Ok(Color::Navy));
        assert!("16".parse::<Color>().is_err());
        assert!("mauve".parse::<Color>().is_err());
    }
}
