pub mod error;
pub mod limits;
pub mod process;
pub mod protocol;

pub use error::EngineError;
pub use limits::SearchLimits;
pub use process::{EngineConfig, UciEngine};
pub use protocol::{move_to_uci, parse_move, Command, Response};

use cozy_chess::{Board, Move};

// =============================================================================
// Engine trait: implemented by the UCI process handle and by test doubles
// =============================================================================

/// Anything that can propose a move for a position.
///
/// The GUI only talks to the engine through this trait so the turn
/// sequencing can be exercised without a real engine process.
pub trait Engine: Send {
    /// Propose a move for `board` within `limits`.
    ///
    /// # Returns
    /// A move that is legal in `board`, or the reason none could be obtained.
    fn best_move(&mut self, board: &Board, limits: &SearchLimits) -> Result<Move, EngineError>;

    /// Returns the engine's name as reported by `id name`
    fn name(&self) -> &str;

    /// Tell the engine the next position belongs to a different game
    fn new_game(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}
