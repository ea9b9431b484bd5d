use super::*;
use crate::game::Termination;
use crate::input::square_center;
use cozy_chess::{Piece, Square};
use uci_client::protocol::{parse_move, standard_destination};
use uci_client::{Engine, EngineError, SearchLimits};

/// Plays scripted replies, or the first legal move once the script runs out.
struct FakeEngine {
    replies: Vec<&'static str>,
    calls: usize,
}

impl FakeEngine {
    fn new(replies: &[&'static str]) -> Self {
        Self {
            replies: replies.iter().rev().copied().collect(),
            calls: 0,
        }
    }
}

impl Engine for FakeEngine {
    fn best_move(&mut self, board: &Board, _limits: &SearchLimits) -> Result<Move, EngineError> {
        self.calls += 1;
        if let Some(reply) = self.replies.pop() {
            return parse_move(board, reply);
        }
        let mut first = None;
        board.generate_moves(|moves| {
            first = moves.into_iter().next();
            first.is_some()
        });
        first.ok_or(EngineError::NoMove)
    }

    fn name(&self) -> &str {
        "Fake"
    }
}

fn center(name: &str, human: Color) -> Point {
    square_center(name.parse().unwrap(), human)
}

/// Drag from one square to another as the human.
fn drag(ctl: &mut Controller, from: &str, to: &str) -> Release {
    let human = ctl.human();
    assert!(ctl.press(center(from, human)), "could not pick up {from}");
    ctl.drag_to(Point::new(1.0, 1.0));
    ctl.release(center(to, human))
}

/// Run one full engine turn the way the application does.
fn engine_turn(ctl: &mut Controller, engine: &mut FakeEngine) -> Option<Outcome> {
    match ctl.begin_engine_turn() {
        EngineTurn::Search(board) => {
            let mv = engine.best_move(&board, &SearchLimits::default()).unwrap();
            ctl.apply_engine_move(mv).unwrap()
        }
        EngineTurn::GameOver(outcome) => Some(outcome),
        EngineTurn::NotDue => panic!("no engine turn scheduled"),
    }
}

#[test]
fn test_opponent_and_empty_squares_never_start_a_drag() {
    let mut ctl = Controller::new(Color::White);
    for &sq in Square::ALL.iter() {
        let owner = ctl.game().piece_at(sq).map(|(c, _)| c);
        let started = ctl.press(square_center(sq, Color::White));
        assert_eq!(started, owner == Some(Color::White), "{sq}");
        ctl.release(Point::new(-1.0, -1.0));
    }
}

#[test]
fn test_press_captures_origin_and_follows_pointer() {
    let mut ctl = Controller::new(Color::White);
    assert!(ctl.press(center("g1", Color::White)));

    let session = *ctl.drag().unwrap();
    assert_eq!(session.from, Square::G1);
    assert_eq!(session.piece, (Color::White, Piece::Knight));

    ctl.drag_to(Point::new(300.0, 200.0));
    assert_eq!(ctl.drag().unwrap().cursor, Point::new(300.0, 200.0));

    // A second press while dragging does not start another session.
    assert!(!ctl.press(center("b1", Color::White)));
    assert_eq!(ctl.drag().unwrap().from, Square::G1);
}

#[test]
fn test_every_legal_move_commits_exactly_that_move() {
    let reference = GameState::new();
    for mv in reference.legal_moves() {
        let mut ctl = Controller::new(Color::White);
        let to = standard_destination(reference.board(), mv);

        assert!(ctl.press(square_center(mv.from, Color::White)));
        let release = ctl.release(square_center(to, Color::White));
        assert_eq!(release, Release::Committed(mv));

        let mut expected = reference.board().clone();
        expected.play(mv);
        assert_eq!(ctl.game().board().to_string(), expected.to_string());
        assert!(ctl.drag().is_none());
        assert!(ctl.engine_pending());
    }
}

#[test]
fn test_illegal_drops_revert() {
    let reference = GameState::new();
    let fen = reference.board().to_string();

    for &from in Square::ALL.iter() {
        if reference.piece_at(from).map(|(c, _)| c) != Some(Color::White) {
            continue;
        }
        for &to in Square::ALL.iter() {
            if reference.find_move(from, to).is_some() {
                continue;
            }
            let mut ctl = Controller::new(Color::White);
            assert!(ctl.press(square_center(from, Color::White)));
            assert_eq!(ctl.release(square_center(to, Color::White)), Release::Reverted);
            assert_eq!(ctl.game().board().to_string(), fen);
            assert!(ctl.drag().is_none());
            assert!(!ctl.engine_pending());
        }
    }
}

#[test]
fn test_drop_off_board_reverts() {
    let mut ctl = Controller::new(Color::White);
    assert!(ctl.press(center("e2", Color::White)));
    assert_eq!(ctl.release(Point::new(600.0, 100.0)), Release::Reverted);
    assert_eq!(ctl.game().moves().len(), 0);
}

#[test]
fn test_release_without_drag_is_ignored() {
    let mut ctl = Controller::new(Color::White);
    assert_eq!(ctl.release(center("e4", Color::White)), Release::Ignored);
}

#[test]
fn test_e4_then_engine_reply() {
    let mut ctl = Controller::new(Color::White);
    let mut engine = FakeEngine::new(&["e7e5"]);

    assert!(matches!(drag(&mut ctl, "e2", "e4"), Release::Committed(_)));
    // No drags while the engine is to move.
    assert!(!ctl.press(center("d2", Color::White)));

    assert_eq!(engine_turn(&mut ctl, &mut engine), None);
    assert_eq!(engine.calls, 1);

    let game = ctl.game();
    assert_eq!(game.piece_at(Square::E4), Some((Color::White, Piece::Pawn)));
    assert_eq!(game.piece_at(Square::E5), Some((Color::Black, Piece::Pawn)));
    assert_eq!(game.side_to_move(), Color::White);
    assert_eq!(game.moves().len(), 2);
    assert!(!ctl.engine_pending());
    assert!(ctl.press(center("d2", Color::White)));
}

#[test]
fn test_exactly_one_engine_turn_per_human_move() {
    let mut ctl = Controller::new(Color::White);
    let mut engine = FakeEngine::new(&[]);
    assert!(matches!(drag(&mut ctl, "g1", "f3"), Release::Committed(_)));

    let EngineTurn::Search(board) = ctl.begin_engine_turn() else {
        panic!("engine should be due");
    };
    // A duplicate timer firing while the engine thinks does nothing.
    assert!(matches!(ctl.begin_engine_turn(), EngineTurn::NotDue));

    let mv = engine.best_move(&board, &SearchLimits::default()).unwrap();
    ctl.apply_engine_move(mv).unwrap();
    assert_eq!(
        ctl.apply_engine_move(mv),
        Err(TurnError::NotEngineTurn),
        "a second engine move is refused"
    );
    assert!(matches!(ctl.begin_engine_turn(), EngineTurn::NotDue));
    assert_eq!(ctl.game().moves().len(), 2);
}

#[test]
fn test_illegal_engine_move_is_refused() {
    let mut ctl = Controller::new(Color::White);
    drag(&mut ctl, "e2", "e4");
    assert!(matches!(ctl.begin_engine_turn(), EngineTurn::Search(_)));

    let fen = ctl.game().board().to_string();
    let bogus = Move {
        from: Square::E7,
        to: Square::E4,
        promotion: None,
    };
    assert_eq!(
        ctl.apply_engine_move(bogus),
        Err(TurnError::Game(GameError::IllegalMove(bogus)))
    );
    assert_eq!(ctl.game().board().to_string(), fen);
}

#[test]
fn test_halt_stops_play() {
    let mut ctl = Controller::new(Color::White);
    drag(&mut ctl, "e2", "e4");
    ctl.halt();

    assert!(ctl.is_halted());
    assert!(matches!(ctl.begin_engine_turn(), EngineTurn::NotDue));
    assert!(!ctl.press(center("d2", Color::White)));

    ctl.new_game();
    assert!(!ctl.is_halted());
    assert!(ctl.press(center("d2", Color::White)));
}

#[test]
fn test_checkmate_by_human_ends_play() {
    let mut ctl = Controller::new(Color::White);
    let mut engine = FakeEngine::new(&["e7e5", "b8c6", "g8f6"]);

    for (from, to) in [("e2", "e4"), ("f1", "c4"), ("d1", "h5")] {
        assert!(matches!(drag(&mut ctl, from, to), Release::Committed(_)));
        assert_eq!(engine_turn(&mut ctl, &mut engine), None);
    }
    assert!(matches!(drag(&mut ctl, "h5", "f7"), Release::Committed(_)));

    let outcome = engine_turn(&mut ctl, &mut engine).unwrap();
    assert_eq!(outcome.termination, Termination::Checkmate);
    assert_eq!(outcome.result(), "1-0");
    assert_eq!(engine.calls, 3, "engine is not asked after mate");

    for &sq in Square::ALL.iter() {
        assert!(!ctl.press(square_center(sq, Color::White)));
    }
}

#[test]
fn test_checkmate_by_engine_ends_play() {
    let mut ctl = Controller::new(Color::White);
    let mut engine = FakeEngine::new(&["e7e5", "d8h4"]);

    drag(&mut ctl, "f2", "f3");
    assert_eq!(engine_turn(&mut ctl, &mut engine), None);
    drag(&mut ctl, "g2", "g4");

    let outcome = engine_turn(&mut ctl, &mut engine).unwrap();
    assert_eq!(outcome.winner, Some(Color::Black));
    assert!(ctl.game().is_over());
    assert!(!ctl.press(center("e2", Color::White)));
}

#[test]
fn test_human_black_engine_opens() {
    let mut ctl = Controller::new(Color::Black);
    let mut engine = FakeEngine::new(&["d2d4"]);

    // Nothing to drag before the engine has moved.
    assert!(!ctl.press(center("e7", Color::Black)));
    assert!(ctl.schedule_opening_turn());
    assert_eq!(engine_turn(&mut ctl, &mut engine), None);

    assert!(matches!(drag(&mut ctl, "d7", "d5"), Release::Committed(_)));
    assert_eq!(
        ctl.game().piece_at(Square::D5),
        Some((Color::Black, Piece::Pawn))
    );
}

#[test]
fn test_no_opening_turn_for_white() {
    let mut ctl = Controller::new(Color::White);
    assert!(!ctl.schedule_opening_turn());
    assert!(matches!(ctl.begin_engine_turn(), EngineTurn::NotDue));
}

#[test]
fn test_opening_turn_is_not_reported_after_a_human_move() {
    let mut ctl = Controller::new(Color::White);
    ctl.new_game();
    assert!(matches!(drag(&mut ctl, "e2", "e4"), Release::Committed(_)));

    // The engine turn is pending from the human move, not from the opening.
    assert!(!ctl.schedule_opening_turn());
    assert!(ctl.engine_pending());
    assert!(matches!(ctl.begin_engine_turn(), EngineTurn::Search(_)));
}

#[test]
fn test_opening_turn_is_scheduled_once() {
    let mut ctl = Controller::new(Color::Black);
    assert!(ctl.schedule_opening_turn());
    assert!(!ctl.schedule_opening_turn());
}
