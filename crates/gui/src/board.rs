//! Chess board widget rendering

use cozy_chess::{Color as Side, Square};
use iced::alignment;
use iced::mouse;
use iced::widget::canvas::{self, event, Canvas, Frame, Geometry, Path};
use iced::widget::text::Shaping;
use iced::{Element, Pixels, Point, Rectangle, Renderer, Size, Theme};

use crate::game::GameState;
use crate::input::{square_center, square_origin, DragSession};
use crate::styles::{self, BOARD_SIZE, PIECE_FONT_SIZE, SQUARE_SIZE};

/// Message type for board interactions
///
/// Points are relative to the board's top-left corner and may lie outside it.
#[derive(Debug, Clone, Copy)]
pub enum BoardMessage {
    Pressed(Point),
    Moved(Point),
    Released(Point),
}

/// Renders the chess board
pub struct BoardView<'a> {
    game: &'a GameState,
    drag: Option<&'a DragSession>,
    /// Side drawn at the bottom
    bottom: Side,
    /// Static checkerboard layer
    squares: &'a canvas::Cache,
}

impl<'a> BoardView<'a> {
    pub fn new(
        game: &'a GameState,
        drag: Option<&'a DragSession>,
        bottom: Side,
        squares: &'a canvas::Cache,
    ) -> Self {
        Self {
            game,
            drag,
            bottom,
            squares,
        }
    }

    /// Create the board view element
    pub fn view(self) -> Element<'a, BoardMessage> {
        Canvas::new(self).width(BOARD_SIZE).height(BOARD_SIZE).into()
    }

    fn draw_squares(frame: &mut Frame) {
        for row in 0..8 {
            for col in 0..8 {
                let color = if (row + col) % 2 == 0 {
                    styles::LIGHT_SQUARE
                } else {
                    styles::DARK_SQUARE
                };
                frame.fill_rectangle(
                    Point::new(col as f32 * SQUARE_SIZE, row as f32 * SQUARE_SIZE),
                    Size::new(SQUARE_SIZE, SQUARE_SIZE),
                    color,
                );
            }
        }
    }

    fn draw_last_move(&self, frame: &mut Frame) {
        if let Some((from, to)) = self.game.last_move() {
            for sq in [from, to] {
                let cell = Path::rectangle(
                    square_origin(sq, self.bottom),
                    Size::new(SQUARE_SIZE, SQUARE_SIZE),
                );
                frame.fill(&cell, styles::LAST_MOVE_SQUARE);
            }
        }
    }

    /// Draw every piece except the one on `skip`
    fn draw_pieces(&self, frame: &mut Frame, skip: Option<Square>) {
        for &sq in Square::ALL.iter() {
            if Some(sq) == skip {
                continue;
            }
            if let Some((side, piece)) = self.game.piece_at(sq) {
                draw_glyph(frame, styles::piece_char(side, piece), square_center(sq, self.bottom));
            }
        }
    }
}

fn draw_glyph(frame: &mut Frame, glyph: &str, center: Point) {
    frame.fill_text(canvas::Text {
        content: glyph.to_string(),
        position: center,
        color: styles::PIECE_COLOR,
        size: Pixels(PIECE_FONT_SIZE),
        horizontal_alignment: alignment::Horizontal::Center,
        vertical_alignment: alignment::Vertical::Center,
        shaping: Shaping::Advanced,
        ..canvas::Text::default()
    });
}

impl canvas::Program<BoardMessage> for BoardView<'_> {
    type State = ();

    fn update(
        &self,
        _state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> (event::Status, Option<BoardMessage>) {
        let canvas::Event::Mouse(mouse_event) = event else {
            return (event::Status::Ignored, None);
        };
        let relative = cursor
            .position()
            .map(|p| Point::new(p.x - bounds.x, p.y - bounds.y));

        match (mouse_event, relative) {
            (mouse::Event::ButtonPressed(mouse::Button::Left), Some(p)) if cursor.is_over(bounds) => {
                (event::Status::Captured, Some(BoardMessage::Pressed(p)))
            }
            (mouse::Event::CursorMoved { .. }, Some(p)) if self.drag.is_some() => {
                (event::Status::Captured, Some(BoardMessage::Moved(p)))
            }
            (mouse::Event::ButtonReleased(mouse::Button::Left), Some(p)) if self.drag.is_some() => {
                (event::Status::Captured, Some(BoardMessage::Released(p)))
            }
            // Pointer left the window mid-drag: treat as a drop off the board.
            (mouse::Event::ButtonReleased(mouse::Button::Left), None) if self.drag.is_some() => (
                event::Status::Captured,
                Some(BoardMessage::Released(Point::new(-1.0, -1.0))),
            ),
            _ => (event::Status::Ignored, None),
        }
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let squares = self.squares.draw(renderer, bounds.size(), Self::draw_squares);

        let mut frame = Frame::new(renderer, bounds.size());
        self.draw_last_move(&mut frame);
        self.draw_pieces(&mut frame, self.drag.map(|d| d.from));
        if let Some(drag) = self.drag {
            let (side, piece) = drag.piece;
            draw_glyph(&mut frame, styles::piece_char(side, piece), drag.cursor);
        }

        vec![squares, frame.into_geometry()]
    }
}
