//! Pointer input: board geometry and the drag session.

use cozy_chess::{Color, File, Piece, Rank, Square};
use iced::Point;

use crate::styles::SQUARE_SIZE;

/// A piece being dragged by the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    /// Square the piece was picked up from; not drawn while dragging
    pub from: Square,
    pub piece: (Color, Piece),
    /// Current pointer position, relative to the board's top-left corner
    pub cursor: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Map a point on the board to a square. `bottom` is the side drawn at the
/// bottom edge. Points off the board map to `None`.
pub fn square_at(point: Point, bottom: Color) -> Option<Square> {
    if !(point.x >= 0.0 && point.y >= 0.0) {
        return None;
    }
    let col = (point.x / SQUARE_SIZE) as usize;
    let row = (point.y / SQUARE_SIZE) as usize;
    if col >= 8 || row >= 8 {
        return None;
    }

    let (file, rank) = match bottom {
        Color::White => (col, 7 - row),
        Color::Black => (7 - col, row),
    };
    Some(Square::new(File::index(file), Rank::index(rank)))
}

/// Top-left corner of a square's cell.
pub fn square_origin(sq: Square, bottom: Color) -> Point {
    let file = sq.file() as usize;
    let rank = sq.rank() as usize;
    let (col, row) = match bottom {
        Color::White => (file, 7 - rank),
        Color::Black => (7 - file, rank),
    };
    Point::new(col as f32 * SQUARE_SIZE, row as f32 * SQUARE_SIZE)
}

pub fn square_center(sq: Square, bottom: Color) -> Point {
    let origin = square_origin(sq, bottom);
    Point::new(origin.x + SQUARE_SIZE / 2.0, origin.y + SQUARE_SIZE / 2.0)
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod input_tests;
