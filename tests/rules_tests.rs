//! Rules tests on full positions: setup, check, pins, move generation and
//! random games.

use superchess::board::{GameState, parse_placement};
use superchess::piece::{Color, Piece, PieceKind};
use superchess::position::{Position, parse_coord, str_coord};
use superchess::rules::{
    GameStatus, Move, MoveError, apply_move, game_status, generate_legal_moves, is_in_check,
    is_legal_coord_move, is_legal_move, legal_moves_from, play_move,
};

// =============================================================================
// Helpers
// =============================================================================

fn sq(s: &str) -> Position {
    parse_coord(s).unwrap()
}

fn mv(from: &str, to: &str) -> Move {
    Move::parse(from, to).unwrap()
}

/// Build a position from `<piece>@<square>` strings.
fn setpos(side: Color, placements: &[&str]) -> GameState {
    let placements: Vec<_> = placements
        .iter()
        .map(|p| parse_placement(p).unwrap())
        .collect();
    GameState::from_placements(side, &placements)
}

fn targets(state: &GameState, from: &str) -> Vec<String> {
    let mut t: Vec<String> = legal_moves_from(state, sq(from))
        .into_iter()
        .map(|m| str_coord(m.to))
        .collect();
    t.sort();
    t
}

// =============================================================================
// Coordinates and setup
// =============================================================================

#[test]
fn test_coordinate_roundtrip() {
    for pos in Position::all() {
        assert_eq!(parse_coord(&str_coord(pos)), Some(pos));
    }
    assert_eq!(parse_coord("A1"), parse_coord("a1"));
    assert_eq!(parse_coord("k1"), None);
    assert_eq!(parse_coord("a11"), None);
}

#[test]
fn test_standard_setup() {
    let state = GameState::new();
    assert_eq!(state.side_to_move, Color::White);
    assert_eq!(state.board.pieces().count(), 48);
    assert_eq!(state.king_position(Color::White), Some(sq("f1")));
    assert_eq!(state.king_position(Color::Black), Some(sq("f10")));
    assert_eq!(state.material(Color::White), state.material(Color::Black));
    assert_eq!(
        state.board.get(sq("a8")),
        Some(Piece::new(Color::Black, PieceKind::Spearman))
    );
    assert!(!is_in_check(&state, Color::White));
    assert!(!is_in_check(&state, Color::Black));
    assert_eq!(game_status(&state), GameStatus::Ongoing);
}

// =============================================================================
// Piece movement on open boards
// =============================================================================

#[test]
fn test_knight_in_the_center() {
    let state = setpos(Color::White, &["WN@e5", "WK@a1", "BK@j10"]);
    assert_eq!(
        targets(&state, "e5"),
        vec!["c4", "c6", "d3", "d7", "f3", "f7", "g4", "g6"]
    );
}

#[test]
fn test_spearman_captures_straight_ahead() {
    let state = setpos(Color::White, &["WSP@e3", "BN@e4", "WK@a1", "BK@j10"]);
    assert!(is_legal_coord_move(&state, "e3", "e4"));

    let state = setpos(Color::White, &["WP@e3", "BN@e4", "WK@a1", "BK@j10"]);
    assert!(!is_legal_coord_move(&state, "e3", "e4"));
}

#[test]
fn test_assassin_jumps_over_pieces() {
    let state = setpos(
        Color::White,
        &["WA@e5", "WP@e6", "WP@d6", "WP@f6", "WK@a1", "BK@j10"],
    );
    assert!(is_legal_coord_move(&state, "e5", "e7"));
    assert!(is_legal_coord_move(&state, "e5", "c7"));
    assert!(!is_legal_coord_move(&state, "e5", "e6"));
    assert!(!is_legal_coord_move(&state, "e5", "e8"));
}

// =============================================================================
// Check, pins and checkmate
// =============================================================================

#[test]
fn test_rook_check_and_interposition() {
    let state = setpos(Color::White, &["WK@e1", "WR@a5", "BK@j10", "BR@e8"]);
    assert!(is_in_check(&state, Color::White));

    let mut moves: Vec<String> = generate_legal_moves(&state, Color::White)
        .iter()
        .map(Move::to_string)
        .collect();
    moves.sort();
    assert_eq!(moves, vec!["a5-e5", "e1-d1", "e1-d2", "e1-f1", "e1-f2"]);

    for m in generate_legal_moves(&state, Color::White) {
        assert!(!is_in_check(&apply_move(&state, m), Color::White), "{m}");
    }
    assert_eq!(
        play_move(&state, mv("a5", "a6")),
        Err(MoveError::LeavesKingInCheck)
    );
}

#[test]
fn test_pinned_piece_cannot_move() {
    let state = setpos(Color::White, &["WK@e1", "WB@e2", "BR@e10", "BK@j10"]);
    assert!(legal_moves_from(&state, sq("e2")).is_empty());
    assert!(!is_legal_move(&state, sq("e2"), sq("d3")));
}

#[test]
fn test_back_rank_mate() {
    let state = setpos(Color::Black, &["BK@a10", "WR@j10", "WR@j9", "WK@e1"]);
    assert!(generate_legal_moves(&state, Color::Black).is_empty());
    assert_eq!(
        game_status(&state),
        GameStatus::Checkmate {
            winner: Color::White
        }
    );
}

#[test]
fn test_play_move_errors() {
    let state = GameState::new();
    assert_eq!(play_move(&state, mv("e5", "e6")), Err(MoveError::NoPiece(sq("e5"))));
    assert_eq!(
        play_move(&state, mv("e8", "e7")),
        Err(MoveError::NotYourTurn(sq("e8")))
    );
    assert_eq!(
        play_move(&state, mv("a1", "a2")),
        Err(MoveError::OwnPieceOnTarget(sq("a2")))
    );
    assert_eq!(
        play_move(&state, mv("e3", "f4")),
        Err(MoveError::IllegalShape(PieceKind::Pawn))
    );

    let next = play_move(&state, mv("e3", "e4")).unwrap();
    assert_eq!(next.side_to_move, Color::Black);
    assert_eq!(next.board.get(sq("e3")), None);
}

// =============================================================================
// Random games
// =============================================================================

/// Play random legal games and check that no generated move leaves the
/// mover's king attacked and that generation agrees with the move checker.
#[test]
fn test_random_playouts_stay_legal() {
    let mut rng = fastrand::Rng::with_seed(2024);
    for _ in 0..4 {
        let mut state = GameState::new();
        for _ in 0..40 {
            let side = state.side_to_move;
            let moves = generate_legal_moves(&state, side);
            if moves.is_empty() {
                assert!(game_status(&state).is_terminal());
                break;
            }
            for &m in &moves {
                assert!(is_legal_move(&state, m.from, m.to), "{m}");
                assert!(!is_in_check(&apply_move(&state, m), side), "{m}");
            }
            let chosen = moves[rng.usize(..moves.len())];
            state = play_move(&state, chosen).unwrap();
            assert_eq!(state.side_to_move, side.opponent());
        }
    }
}
