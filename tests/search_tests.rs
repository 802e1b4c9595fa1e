//! End-to-end search tests through the public API.

use std::time::Duration;

use superchess::action::ActionSpace;
use superchess::board::{GameState, parse_placement};
use superchess::config::{ConfigError, SearchConfig};
use superchess::evaluator::{MaterialEvaluator, PlaneEncoder, UniformEvaluator};
use superchess::mcts::{Mcts, SearchError};
use superchess::piece::Color;
use superchess::position::parse_coord;
use superchess::rules::{Move, generate_legal_moves};

// =============================================================================
// Helpers
// =============================================================================

fn setpos(side: Color, placements: &[&str]) -> GameState {
    let placements: Vec<_> = placements
        .iter()
        .map(|p| parse_placement(p).unwrap())
        .collect();
    GameState::from_placements(side, &placements)
}

fn uniform(config: SearchConfig) -> Mcts<UniformEvaluator, PlaneEncoder> {
    Mcts::new(config, UniformEvaluator::default(), PlaneEncoder::default())
}

// =============================================================================
// Search
// =============================================================================

#[test]
fn test_lone_pawn_and_kings() {
    let state = setpos(Color::White, &["WP@c3", "WK@f1", "BK@f10"]);
    let n = 100;
    let result = uniform(SearchConfig::default().with_simulations(n))
        .search(&state)
        .unwrap();

    assert_eq!(result.simulations, n);
    assert_eq!(result.stats.root_visits, n);
    let child_visits: u32 = result.visits.iter().map(|(_, v)| v).sum();
    assert_eq!(child_visits, n - 1);

    let c3 = parse_coord("c3").unwrap();
    let pawn_moves: Vec<Move> = result
        .visits
        .iter()
        .map(|&(m, _)| m)
        .filter(|m| m.from == c3)
        .collect();
    assert!(pawn_moves.contains(&Move::parse("c3", "c4").unwrap()));
    assert!(pawn_moves.contains(&Move::parse("c3", "c5").unwrap()));

    let sum: f32 = result.policy.iter().map(|(_, p)| p).sum();
    assert!((sum - 1.0).abs() < 1e-5);
}

#[test]
fn test_policy_covers_exactly_the_legal_moves() {
    let state = GameState::new();
    let result = uniform(SearchConfig::for_testing().with_temperature(1.0))
        .search(&state)
        .unwrap();

    let legal = generate_legal_moves(&state, Color::White);
    let moves: Vec<Move> = result.policy.iter().map(|&(m, _)| m).collect();
    assert_eq!(moves, legal);
    assert!(result.policy.iter().all(|&(_, p)| (0.0..=1.0).contains(&p)));
}

#[test]
fn test_black_to_move_searches_black_moves() {
    let state = setpos(Color::Black, &["WK@f1", "BK@f10", "BQ@d10"]);
    let result = uniform(SearchConfig::for_testing()).search(&state).unwrap();
    for (m, _) in &result.policy {
        let piece = state.board.get(m.from).unwrap();
        assert_eq!(piece.color, Color::Black);
    }
}

#[test]
fn test_batched_and_timed_search() {
    let config = SearchConfig::default()
        .with_simulations(96)
        .with_batch_size(16)
        .with_time_budget(Duration::from_secs(60));
    let result = uniform(config).search(&GameState::new()).unwrap();
    assert_eq!(result.simulations, 96);
    let child_visits: u32 = result.visits.iter().map(|(_, v)| v).sum();
    assert_eq!(child_visits, 95);
}

#[test]
fn test_material_evaluator_prefers_capturing_the_queen() {
    // The rook can take an undefended queen
    let state = setpos(Color::White, &["WR@a5", "BQ@h5", "WK@a1", "BK@j10"]);
    let mcts = Mcts::new(
        SearchConfig::for_testing().with_simulations(200),
        MaterialEvaluator::new(),
        MaterialEvaluator::encoder(),
    );
    let result = mcts.search(&state).unwrap();
    assert_eq!(result.best_move, Some(Move::parse("a5", "h5").unwrap()));
    assert!(result.root_value > 0.0);
}

#[test]
fn test_dense_policy_matches_action_space() {
    let result = uniform(SearchConfig::for_testing().with_temperature(1.0))
        .search(&GameState::new())
        .unwrap();
    let space = ActionSpace::default();
    let dense = result.dense_policy(&space);
    assert_eq!(dense.len(), 10_000);
    for &(m, p) in &result.policy {
        assert_eq!(dense[space.encode(m)], p);
    }
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_64x64_action_space_is_rejected() {
    let config = SearchConfig {
        num_actions: 4096,
        ..SearchConfig::default()
    };
    let err = uniform(config).search(&GameState::new()).unwrap_err();
    assert!(matches!(
        err,
        SearchError::Config(ConfigError::ActionSpaceMismatch {
            num_actions: 4096,
            expected: 10_000,
            ..
        })
    ));
    assert!(err.to_string().contains("4096"));
}

#[test]
fn test_config_file_drives_search() {
    let path = std::env::temp_dir().join(format!("superchess-{}.toml", std::process::id()));
    std::fs::write(&path, "[search]\nnum_simulations = 25\ntemperature = 0.0\n").unwrap();
    let config = SearchConfig::load_from_path(&path);
    std::fs::remove_file(&path).unwrap();

    let config = config.unwrap();
    assert_eq!(config.num_simulations, 25);
    let result = uniform(config).search(&GameState::new()).unwrap();
    assert_eq!(result.simulations, 25);
    assert_eq!(result.policy.iter().filter(|(_, p)| *p == 1.0).count(), 1);
}
