//! Turn and input control for a human-vs-engine game.
//!
//! The controller owns the game state and is the only place it changes.
//! It knows nothing about timers or the engine process: the application
//! turns its answers into scheduled tasks and feeds results back in.

use cozy_chess::{Board, Color, Move};
use iced::Point;
use thiserror::Error;

use crate::game::{GameError, GameState, Outcome};
use crate::input::{square_at, DragSession, DragState};

/// What a pointer release did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// No drag was in progress
    Ignored,
    /// Drop was not a legal move; the piece snaps back
    Reverted,
    /// Move applied; an engine turn is now scheduled
    Committed(Move),
}

/// What to do when the engine's scheduled turn comes up
#[derive(Debug, Clone)]
pub enum EngineTurn {
    /// Nothing is scheduled
    NotDue,
    /// The game ended on the human's move
    GameOver(Outcome),
    /// Ask the engine for a move in this position
    Search(Board),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    #[error("engine move arrived while no engine turn was scheduled")]
    NotEngineTurn,
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Where the engine's side of the turn stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum EngineStep {
    #[default]
    Idle,
    /// Waiting for the delay after the human's move
    Scheduled,
    /// Asked for a move, answer not applied yet
    Searching,
}

#[derive(Debug, Clone)]
pub struct Controller {
    game: GameState,
    human: Color,
    drag: DragState,
    engine: EngineStep,
    /// Play stopped after an engine failure
    halted: bool,
}

impl Controller {
    pub fn new(human: Color) -> Self {
        Self::with_game(GameState::new(), human)
    }

    pub fn with_game(game: GameState, human: Color) -> Self {
        Self {
            game,
            human,
            drag: DragState::Idle,
            engine: EngineStep::Idle,
            halted: false,
        }
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn human(&self) -> Color {
        self.human
    }

    pub fn drag(&self) -> Option<&DragSession> {
        match &self.drag {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// An engine turn is scheduled or running
    pub fn engine_pending(&self) -> bool {
        self.engine != EngineStep::Idle
    }

    /// Throw the current game away and start from the initial position.
    pub fn new_game(&mut self) {
        *self = Self::new(self.human);
    }

    /// Schedule the engine if it is to move in a fresh game (human plays Black).
    ///
    /// Returns true only when this call scheduled the turn; a turn already
    /// scheduled by a human move keeps its delay.
    pub fn schedule_opening_turn(&mut self) -> bool {
        let due = !self.halted
            && self.engine == EngineStep::Idle
            && !self.game.is_over()
            && self.game.side_to_move() != self.human;
        if due {
            self.engine = EngineStep::Scheduled;
        }
        due
    }

    /// Pointer went down. Returns true if a drag session started.
    pub fn press(&mut self, point: Point) -> bool {
        if matches!(self.drag, DragState::Dragging(_))
            || self.halted
            || self.engine != EngineStep::Idle
            || self.game.is_over()
            || self.game.side_to_move() != self.human
        {
            return false;
        }

        let Some(from) = square_at(point, self.human) else {
            return false;
        };
        match self.game.piece_at(from) {
            Some(piece) if piece.0 == self.human => {
                self.drag = DragState::Dragging(DragSession {
                    from,
                    piece,
                    cursor: point,
                });
                true
            }
            _ => false,
        }
    }

    /// Pointer moved.
    pub fn drag_to(&mut self, point: Point) {
        if let DragState::Dragging(session) = &mut self.drag {
            session.cursor = point;
        }
    }

    /// Pointer went up: end the drag session and commit the move if legal.
    pub fn release(&mut self, point: Point) -> Release {
        let DragState::Dragging(session) = std::mem::take(&mut self.drag) else {
            return Release::Ignored;
        };

        let Some(mv) =
            square_at(point, self.human).and_then(|to| self.game.find_move(session.from, to))
        else {
            return Release::Reverted;
        };

        match self.game.apply_move(mv) {
            Ok(()) => {
                self.engine = EngineStep::Scheduled;
                Release::Committed(mv)
            }
            Err(_) => Release::Reverted,
        }
    }

    /// The delay after the human's move is over.
    pub fn begin_engine_turn(&mut self) -> EngineTurn {
        if self.engine != EngineStep::Scheduled || self.halted {
            return EngineTurn::NotDue;
        }
        if let Some(outcome) = self.game.outcome() {
            self.engine = EngineStep::Idle;
            return EngineTurn::GameOver(outcome);
        }
        self.engine = EngineStep::Searching;
        EngineTurn::Search(self.game.board().clone())
    }

    /// Apply the engine's answer. The move is checked against the legal
    /// moves again; an illegal move is reported and leaves the game as is.
    ///
    /// Returns the outcome if this move ended the game.
    pub fn apply_engine_move(&mut self, mv: Move) -> Result<Option<Outcome>, TurnError> {
        if self.engine != EngineStep::Searching || self.halted {
            return Err(TurnError::NotEngineTurn);
        }
        self.engine = EngineStep::Idle;
        self.game.apply_move(mv)?;
        Ok(self.game.outcome())
    }

    /// The engine could not produce a move; stop play.
    pub fn halt(&mut self) {
        self.engine = EngineStep::Idle;
        self.drag = DragState::Idle;
        self.halted = true;
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;
