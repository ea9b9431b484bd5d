//! Game state: the one position of the running game plus its history

use std::fmt;

use cozy_chess::{BitBoard, Board, Color, Move, Piece, Square};
use thiserror::Error;
use uci_client::protocol::standard_destination;

/// Half-moves without a capture or pawn move that end the game on their own.
const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;
/// Occurrences of the same position that end the game on their own.
const FIVEFOLD: usize = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("illegal move {0}")]
    IllegalMove(Move),
    #[error("the game is already over")]
    GameOver,
    #[cfg(test)]
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
}

/// A recorded move with SAN notation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    /// Standard Algebraic Notation representation
    pub san: String,
}

/// Why the game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoves,
    FivefoldRepetition,
}

/// Final result of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// None for a draw
    pub winner: Option<Color>,
    pub termination: Termination,
}

impl Outcome {
    fn draw(termination: Termination) -> Self {
        Self {
            winner: None,
            termination,
        }
    }

    /// PGN result string
    pub fn result(&self) -> &'static str {
        match self.winner {
            Some(Color::White) => "1-0",
            Some(Color::Black) => "0-1",
            None => "1/2-1/2",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.termination {
            Termination::Checkmate => "Checkmate",
            Termination::Stalemate => "Stalemate",
            Termination::InsufficientMaterial => "Insufficient material",
            Termination::SeventyFiveMoves => "Seventy-five-move rule",
            Termination::FivefoldRepetition => "Fivefold repetition",
        };
        match self.winner {
            Some(Color::White) => write!(f, "{}. White wins ({})", reason, self.result()),
            Some(Color::Black) => write!(f, "{}. Black wins ({})", reason, self.result()),
            None => write!(f, "{}. Draw ({})", reason, self.result()),
        }
    }
}

/// Represents the current state of a chess game
///
/// The board is only ever changed through [`GameState::apply_move`].
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    /// Move history
    moves: Vec<MoveRecord>,
    /// Position hash history for repetition detection
    position_history: Vec<u64>,
    /// Plies since the last capture or pawn move
    quiet_plies: u32,
    /// Last move (for highlighting)
    last_move: Option<(Square, Square)>,
    outcome: Option<Outcome>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self::from_board(Board::default())
    }

    /// Start from an arbitrary position
    #[cfg(test)]
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let board: Board = fen
            .parse()
            .map_err(|e| GameError::InvalidFen(format!("{:?}", e)))?;
        Ok(Self::from_board(board))
    }

    fn from_board(board: Board) -> Self {
        let mut state = Self {
            position_history: vec![board.hash()],
            quiet_plies: board.halfmove_clock() as u32,
            board,
            moves: Vec::new(),
            last_move: None,
            outcome: None,
        };
        state.outcome = state.compute_outcome();
        state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn piece_at(&self, sq: Square) -> Option<(Color, Piece)> {
        Some((self.board.color_on(sq)?, self.board.piece_on(sq)?))
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    pub fn last_move(&self) -> Option<(Square, Square)> {
        self.last_move
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// All legal moves in the current position
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        self.board.generate_moves(|piece_moves| {
            moves.extend(piece_moves);
            false
        });
        moves
    }

    /// Find the legal move a player means by dragging from `from` to `to`.
    ///
    /// Castling matches both the king's destination and its own rook's
    /// square. Promotions default to a queen.
    pub fn find_move(&self, from: Square, to: Square) -> Option<Move> {
        self.legal_moves().into_iter().find(|&m| {
            m.from == from
                && (m.to == to || standard_destination(&self.board, m) == to)
                && (m.promotion.is_none() || m.promotion == Some(Piece::Queen))
        })
    }

    /// Apply a move to the game state
    pub fn apply_move(&mut self, mv: Move) -> Result<(), GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        if !self.board.is_legal(mv) {
            return Err(GameError::IllegalMove(mv));
        }

        // Generate SAN before making the move
        let mut san = self.generate_san(mv);
        let zeroing = self.board.piece_on(mv.from) == Some(Piece::Pawn)
            || self.board.color_on(mv.to) == Some(!self.board.side_to_move());
        let displayed_to = standard_destination(&self.board, mv);

        self.board.play_unchecked(mv);
        self.quiet_plies = if zeroing { 0 } else { self.quiet_plies + 1 };
        self.position_history.push(self.board.hash());
        self.last_move = Some((mv.from, displayed_to));

        // Check for game end
        self.outcome = self.compute_outcome();
        match self.outcome {
            Some(Outcome {
                termination: Termination::Checkmate,
                ..
            }) => san.push('#'),
            _ if !self.board.checkers().is_empty() => san.push('+'),
            _ => {}
        }
        self.moves.push(MoveRecord { san });

        Ok(())
    }

    fn is_castle(&self, mv: Move) -> bool {
        standard_destination(&self.board, mv) != mv.to
    }

    /// Generate SAN notation for a move
    fn generate_san(&self, mv: Move) -> String {
        let Some(piece) = self.board.piece_on(mv.from) else {
            return format!("{}{}", mv.from, mv.to);
        };

        // Castling
        if self.is_castle(mv) {
            return if (mv.to.file() as usize) > (mv.from.file() as usize) {
                "O-O".to_string()
            } else {
                "O-O-O".to_string()
            };
        }

        let mut san = String::new();

        // Piece letter (except for pawns)
        match piece {
            Piece::King => san.push('K'),
            Piece::Queen => san.push('Q'),
            Piece::Rook => san.push('R'),
            Piece::Bishop => san.push('B'),
            Piece::Knight => san.push('N'),
            Piece::Pawn => {}
        }

        // Disambiguation when another piece of the same kind reaches the square
        if piece != Piece::Pawn {
            let rivals: Vec<Square> = self
                .legal_moves()
                .into_iter()
                .filter(|m| {
                    m.to == mv.to && m.from != mv.from && self.board.piece_on(m.from) == Some(piece)
                })
                .map(|m| m.from)
                .collect();
            if !rivals.is_empty() {
                let shares_file = rivals.iter().any(|sq| sq.file() == mv.from.file());
                let shares_rank = rivals.iter().any(|sq| sq.rank() == mv.from.rank());
                if !shares_file {
                    san.push(file_char(mv.from));
                } else if !shares_rank {
                    san.push(rank_char(mv.from));
                } else {
                    san.push(file_char(mv.from));
                    san.push(rank_char(mv.from));
                }
            }
        }

        // Capture indicator
        let is_capture = self.board.color_on(mv.to) == Some(!self.board.side_to_move())
            || (piece == Piece::Pawn && mv.from.file() != mv.to.file());
        if is_capture {
            if piece == Piece::Pawn {
                san.push(file_char(mv.from));
            }
            san.push('x');
        }

        // Destination square
        san.push_str(&mv.to.to_string());

        // Promotion
        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(match promo {
                Piece::Queen => 'Q',
                Piece::Rook => 'R',
                Piece::Bishop => 'B',
                Piece::Knight => 'N',
                _ => '?',
            });
        }

        san
    }

    /// Rules that end the game without either player claiming anything
    fn compute_outcome(&self) -> Option<Outcome> {
        if self.legal_moves().is_empty() {
            return Some(if self.board.checkers().is_empty() {
                Outcome::draw(Termination::Stalemate)
            } else {
                Outcome {
                    winner: Some(!self.board.side_to_move()),
                    termination: Termination::Checkmate,
                }
            });
        }

        if is_insufficient_material(&self.board) {
            return Some(Outcome::draw(Termination::InsufficientMaterial));
        }

        if self.quiet_plies >= SEVENTY_FIVE_MOVE_PLIES {
            return Some(Outcome::draw(Termination::SeventyFiveMoves));
        }

        let current = self.board.hash();
        let seen = self
            .position_history
            .iter()
            .filter(|&&h| h == current)
            .count();
        if seen >= FIVEFOLD {
            return Some(Outcome::draw(Termination::FivefoldRepetition));
        }

        None
    }
}

/// Neither side can ever deliver mate.
fn is_insufficient_material(board: &Board) -> bool {
    side_has_insufficient_material(board, Color::White)
        && side_has_insufficient_material(board, Color::Black)
}

fn side_has_insufficient_material(board: &Board, color: Color) -> bool {
    let ours = board.colors(color);
    let theirs = board.colors(!color);
    let heavy = board.pieces(Piece::Pawn) | board.pieces(Piece::Rook) | board.pieces(Piece::Queen);

    if !(ours & heavy).is_empty() {
        return false;
    }

    // A lone knight can only mate if the opponent has blockers of its own.
    if !(ours & board.pieces(Piece::Knight)).is_empty() {
        let blockers: BitBoard = theirs & !board.pieces(Piece::King) & !board.pieces(Piece::Queen);
        return ours.len() <= 2 && blockers.is_empty();
    }

    // Bishops all on one square colour can never mate without help.
    if !(ours & board.pieces(Piece::Bishop)).is_empty() {
        let bishops = board.pieces(Piece::Bishop);
        let on_light = bishops.into_iter().any(is_light);
        let on_dark = bishops.into_iter().any(|sq| !is_light(sq));
        return !(on_light && on_dark)
            && board.pieces(Piece::Pawn).is_empty()
            && board.pieces(Piece::Knight).is_empty();
    }

    true
}

fn is_light(sq: Square) -> bool {
    (sq.file() as usize + sq.rank() as usize) % 2 == 1
}

fn file_char(sq: Square) -> char {
    (b'a' + sq.file() as u8) as char
}

fn rank_char(sq: Square) -> char {
    (b'1' + sq.rank() as u8) as char
}

#[cfg(test)]
#[path = "game_tests.rs"]
mod game_tests;
