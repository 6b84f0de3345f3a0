//! Graphical board view drawn with macroquad
//!
//! The network runs on its own thread, so the view only copies updates into a
//! [`SharedGuiState`] that the render loop reads once per frame.

use crate::model::BoardObserver;
use macroquad::color::Color as ScreenColor;
use macroquad::input::{is_key_pressed, KeyCode};
use macroquad::shapes::{draw_rectangle, draw_rectangle_lines};
use macroquad::text::draw_text;
use macroquad::window::clear_background;
use shared::{Board, Color, Tile};
use std::sync::{Arc, Mutex, MutexGuard};

/// Height of the palette strip along the bottom of the window
pub const PALETTE_HEIGHT: f32 = 60.0;

const STATUS_HEIGHT: f32 = 24.0;
const BACKGROUND: ScreenColor = ScreenColor::new(0.1, 0.1, 0.1, 1.0);
const GRID_LINE: ScreenColor = ScreenColor::new(0.25, 0.25, 0.25, 1.0);
const HIGHLIGHT: ScreenColor = ScreenColor::new(1.0, 0.84, 0.0, 1.0);
const TEXT: ScreenColor = ScreenColor::new(0.9, 0.9, 0.9, 1.0);

/// What the render loop needs to draw a frame
#[derive(Debug, Default)]
pub struct GuiState {
    pub board: Option<Board>,
    pub last_error: Option<String>,
    pub disconnected: bool,
}

pub type SharedGuiState = Arc<Mutex<GuiState>>;

/// Locks the state, recovering it if a holder panicked
pub fn lock_state(state: &SharedGuiState) -> MutexGuard<'_, GuiState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Observer that mirrors model updates into the shared GUI state
pub struct GuiView {
    state: SharedGuiState,
}

impl GuiView {
    pub fn new(state: SharedGuiState) -> Self {
        Self { state }
    }
}

impl BoardObserver for GuiView {
    fn on_update(&mut self, board: &Board, changed: Option<&Tile>) {
        let mut state = lock_state(&self.state);
        match (changed, state.board.as_mut()) {
            (Some(tile), Some(mirror)) => {
                if mirror.set_tile(tile.clone()).is_err() {
                    state.board = Some(board.clone());
                }
            }
            _ => state.board = Some(board.clone()),
        }
    }

    fn on_error(&mut self, message: &str) {
        lock_state(&self.state).last_error = Some(message.to_string());
    }
}

/// Placement of the board inside the window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardLayout {
    pub origin_x: f32,
    pub origin_y: f32,
    pub cell_size: f32,
    pub dim: usize,
}

impl BoardLayout {
    /// Largest square board that fits above the palette, centered
    pub fn fit(width: f32, height: f32, dim: usize) -> Self {
        let available = (height - PALETTE_HEIGHT - STATUS_HEIGHT).max(0.0);
        let side = width.min(available).max(0.0);
        let cell_size = if dim == 0 { 0.0 } else { side / dim as f32 };
        let board_side = cell_size * dim as f32;

        Self {
            origin_x: (width - board_side) / 2.0,
            origin_y: (available - board_side) / 2.0,
            cell_size,
            dim,
        }
    }

    /// Top-left pixel of a cell
    pub fn cell_origin(&self, row: i32, col: i32) -> (f32, f32) {
        (
            self.origin_x + col as f32 * self.cell_size,
            self.origin_y + row as f32 * self.cell_size,
        )
    }

    /// Cell under a pixel, as `(row, col)`
    pub fn cell_at(&self, x: f32, y: f32) -> Option<(i32, i32)> {
        if self.cell_size <= 0.0 {
            return None;
        }
        let col = ((x - self.origin_x) / self.cell_size).floor();
        let row = ((y - self.origin_y) / self.cell_size).floor();
        let dim = self.dim as f32;

        if (0.0..dim).contains(&row) && (0.0..dim).contains(&col) {
            Some((row as i32, col as i32))
        } else {
            None
        }
    }
}

/// Palette color under a pixel; the strip is split into 16 equal slots
pub fn palette_slot_at(x: f32, y: f32, width: f32, height: f32) -> Option<Color> {
    let top = height - PALETTE_HEIGHT;
    if y < top || y >= height || x < 0.0 || x >= width {
        return None;
    }
    let slot = (x / (width / Color::ALL.len() as f32)).floor() as usize;
    Color::ALL.get(slot).copied()
}

pub fn screen_color(color: Color) -> ScreenColor {
    let (r, g, b) = color.rgb();
    ScreenColor::from_rgba(r, g, b, 255)
}

/// Color picked with the `0`-`9` and `A`-`F` keys this frame
pub fn color_from_keys() -> Option<Color> {
    const KEYS: [KeyCode; 16] = [
        KeyCode::Key0,
        KeyCode::Key1,
        KeyCode::Key2,
        KeyCode::Key3,
        KeyCode::Key4,
        KeyCode::Key5,
        KeyCode::Key6,
        KeyCode::Key7,
        KeyCode::Key8,
        KeyCode::Key9,
        KeyCode::A,
        KeyCode::B,
        KeyCode::C,
        KeyCode::D,
        KeyCode::E,
        KeyCode::F,
    ];

    KEYS.iter()
        .position(|key| is_key_pressed(*key))
        .and_then(|number| Color::from_number(number as u8))
}

/// Draws one full frame: board, hover details, status line and palette
pub fn draw_frame(
    state: &GuiState,
    layout: &BoardLayout,
    selected: Color,
    hovered: Option<(i32, i32)>,
    width: f32,
    height: f32,
) {
    clear_background(BACKGROUND);

    if let Some(board) = &state.board {
        for tile in board.tiles() {
            let (x, y) = layout.cell_origin(tile.row, tile.col);
            draw_rectangle(x, y, layout.cell_size, layout.cell_size, screen_color(tile.color));
            if layout.cell_size >= 6.0 {
                draw_rectangle_lines(x, y, layout.cell_size, layout.cell_size, 1.0, GRID_LINE);
            }
        }

        if let Some((row, col)) = hovered {
            let (x, y) = layout.cell_origin(row, col);
            draw_rectangle_lines(x, y, layout.cell_size, layout.cell_size, 2.0, HIGHLIGHT);
        }
    }

    let status_y = height - PALETTE_HEIGHT - 6.0;
    let status = match (&state.last_error, hovered.and_then(|(r, c)| hovered_tile(state, r, c))) {
        (_, Some(tile)) => format!(
            "({}, {}) {} by '{}' at {}",
            tile.row, tile.col, tile.color, tile.owner, tile.timestamp
        ),
        (Some(error), None) => format!("Error: {}", error),
        (None, None) => format!("Painting with {} (0-9, A-F to change, Esc to quit)", selected),
    };
    draw_text(&status, 8.0, status_y, 20.0, TEXT);

    let slot_width = width / Color::ALL.len() as f32;
    let top = height - PALETTE_HEIGHT;
    for (i, color) in Color::ALL.iter().enumerate() {
        let x = i as f32 * slot_width;
        draw_rectangle(x, top, slot_width, PALETTE_HEIGHT, screen_color(*color));
        if *color == selected {
            draw_rectangle_lines(x + 2.0, top + 2.0, slot_width - 4.0, PALETTE_HEIGHT - 4.0, 4.0, HIGHLIGHT);
        }
    }
}

fn hovered_tile(state: &GuiState, row: i32, col: i32) -> Option<&Tile> {
    state.board.as_ref().and_then(|board| board.get_tile(row, col))
}
