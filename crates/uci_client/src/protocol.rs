//! UCI text on the wire: commands we send and responses we read back.

use std::fmt;

use cozy_chess::{Board, File, Move, Piece, Square};

use crate::{EngineError, SearchLimits};

/// A command sent to the engine's stdin, one per line.
#[derive(Debug, Clone, Copy)]
pub enum Command<'a> {
    Uci,
    IsReady,
    UciNewGame,
    SetOption { name: &'a str, value: &'a str },
    Position(&'a Board),
    Go(&'a SearchLimits),
    Quit,
}

impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Uci => write!(f, "uci"),
            Command::IsReady => write!(f, "isready"),
            Command::UciNewGame => write!(f, "ucinewgame"),
            Command::SetOption { name, value } => {
                write!(f, "setoption name {} value {}", name, value)
            }
            // Board's Display is standard FEN (KQkq castling).
            Command::Position(board) => write!(f, "position fen {}", board),
            Command::Go(limits) => {
                write!(f, "go movetime {}", limits.move_time_ms())?;
                if let Some(depth) = limits.depth {
                    write!(f, " depth {}", depth)?;
                }
                Ok(())
            }
            Command::Quit => write!(f, "quit"),
        }
    }
}

/// A line read from the engine's stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    IdName(String),
    IdAuthor(String),
    UciOk,
    ReadyOk,
    /// `bestmove <move> [ponder <move>]`; `None` for `(none)` / `0000`
    BestMove {
        best: Option<String>,
        ponder: Option<String>,
    },
    Info(String),
    Option(String),
    Other(String),
}

impl Response {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let parts: Vec<&str> = line.split_whitespace().collect();

        match parts.as_slice() {
            ["uciok", ..] => Response::UciOk,
            ["readyok", ..] => Response::ReadyOk,
            ["id", "name", rest @ ..] => Response::IdName(rest.join(" ")),
            ["id", "author", rest @ ..] => Response::IdAuthor(rest.join(" ")),
            ["bestmove", rest @ ..] => {
                let best = rest
                    .first()
                    .filter(|m| **m != "(none)" && **m != "0000")
                    .map(|m| m.to_string());
                let ponder = rest
                    .iter()
                    .position(|&t| t == "ponder")
                    .and_then(|i| rest.get(i + 1))
                    .map(|m| m.to_string());
                Response::BestMove { best, ponder }
            }
            ["info", ..] => Response::Info(line.to_string()),
            ["option", ..] => Response::Option(line.to_string()),
            _ => Response::Other(line.to_string()),
        }
    }
}

/// Whether `mv` is a castling move in the rules crate's king-takes-rook form.
fn is_castle(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to) == Some(board.side_to_move())
        && board.piece_on(mv.to) == Some(Piece::Rook)
}

/// The square a player would drop the piece on for `mv`.
///
/// Identical to `mv.to` except for castling, where the king lands on the
/// g- or c-file instead of on its own rook.
pub fn standard_destination(board: &Board, mv: Move) -> Square {
    if is_castle(board, mv) {
        let file = if (mv.to.file() as usize) > (mv.from.file() as usize) {
            File::G
        } else {
            File::C
        };
        Square::new(file, mv.from.rank())
    } else {
        mv.to
    }
}

/// Convert a move to UCI long algebraic notation (`e1g1` for short castling).
pub fn move_to_uci(board: &Board, mv: Move) -> String {
    let mut s = String::new();
    s.push_str(&mv.from.to_string());
    s.push_str(&standard_destination(board, mv).to_string());
    if let Some(p) = mv.promotion {
        let ch = match p {
            Piece::Queen => 'q',
            Piece::Rook => 'r',
            Piece::Bishop => 'b',
            Piece::Knight => 'n',
            _ => 'q',
        };
        s.push(ch);
    }
    s
}

/// Parse a UCI move sent by the engine and check it against the legal moves.
pub fn parse_move(board: &Board, txt: &str) -> Result<Move, EngineError> {
    let mut mv: Move = txt
        .parse()
        .map_err(|_| EngineError::Protocol(format!("malformed move `{}`", txt)))?;

    // Engines send castling king-to-destination; the rules crate wants the rook square.
    let file_distance = (mv.from.file() as i32 - mv.to.file() as i32).abs();
    if board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.from) == Some(board.side_to_move())
        && file_distance == 2
    {
        let rook_file = if (mv.to.file() as usize) > (mv.from.file() as usize) {
            File::H
        } else {
            File::A
        };
        mv.to = Square::new(rook_file, mv.from.rank());
    }

    if board.is_legal(mv) {
        Ok(mv)
    } else {
        Err(EngineError::IllegalMove(txt.to_string()))
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod protocol_tests;
