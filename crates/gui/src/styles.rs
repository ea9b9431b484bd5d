//! Styling constants and piece glyphs

use cozy_chess::{Color as Side, Piece};
use iced::Color;

// Board colors
pub const LIGHT_SQUARE: Color = Color::from_rgb(0.941, 0.851, 0.710); // #F0D9B5
pub const DARK_SQUARE: Color = Color::from_rgb(0.710, 0.533, 0.388); // #B58863
pub const LAST_MOVE_SQUARE: Color = Color::from_rgba(0.9, 0.9, 0.0, 0.4); // Yellow overlay
pub const PIECE_COLOR: Color = Color::BLACK;

// Dimensions
pub const SQUARE_SIZE: f32 = 65.0;
pub const BOARD_SIZE: f32 = SQUARE_SIZE * 8.0;
pub const PANEL_WIDTH: f32 = 240.0;
pub const PIECE_FONT_SIZE: f32 = 48.0;

/// Unicode glyph for a piece; outlined for White, filled for Black.
pub fn piece_char(side: Side, piece: Piece) -> &'static str {
    match (side, piece) {
        (Side::White, Piece::Pawn) => "♙",
        (Side::White, Piece::Knight) => "♘",
        (Side::White, Piece::Bishop) => "♗",
        (Side::White, Piece::Rook) => "♖",
        (Side::White, Piece::Queen) => "♕",
        (Side::White, Piece::King) => "♔",
        (Side::Black, Piece::Pawn) => "♟",
        (Side::Black, Piece::Knight) => "♞",
        (Side::Black, Piece::Bishop) => "♝",
        (Side::Black, Piece::Rook) => "♜",
        (Side::Black, Piece::Queen) => "♛",
        (Side::Black, Piece::King) => "♚",
    }
}
