//! Text protocol for driving the engine from a terminal or a GUI.
//!
//! The framing follows the Go Text Protocol: one command per line, an
//! optional numeric id in front, and a response that starts with `=` on
//! success or `?` on failure, followed by a blank line.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`, `list_commands`, `known_command <cmd>`
//! - `quit` - Exit the loop
//! - `new` - Standard starting position
//! - `clear_board` - Empty board, White to move
//! - `setpos <w|b> <piece>@<square>...` - Arbitrary position, e.g. `setpos b BK@a10 WR@j10`
//! - `play <from> <to> [promotion]` - Play a move for the side to move
//! - `undo` - Take back the last move
//! - `legal [square]` - List legal moves, optionally for one piece
//! - `genmove` - Choose and play a move for the side to move at the current level
//! - `level [1|2|3]` - Show or set the strength: random, cautious or search
//! - `moves` - Moves played since the position was set
//! - `showboard` - Print the board
//! - `status` - `ongoing`, `check`, `checkmate <winner>` or `stalemate`
//! - `sims <n>` - Simulations per `genmove`
//!
//! ## Example
//!
//! ```no_run
//! use superchess::config::SearchConfig;
//! use superchess::evaluator::{PlaneEncoder, UniformEvaluator};
//! use superchess::mcts::Mcts;
//! use superchess::protocol::ProtocolEngine;
//!
//! let config = SearchConfig::default();
//! let mcts = Mcts::new(config, UniformEvaluator::default(), PlaneEncoder::default());
//! let mut engine = ProtocolEngine::new(mcts);
//! engine.run(std::io::stdin().lock(), std::io::stdout()).unwrap();
//! ```

use std::io::{self, BufRead, Write};

use tracing::{debug, info, warn};

use crate::baseline::{Level, random_move, safe_move};
use crate::board::{GameState, parse_placement};
use crate::constants::GREEDY_TEMPERATURE;
use crate::evaluator::{BoardEncoder, Evaluator};
use crate::mcts::Mcts;
use crate::piece::{Color, PieceKind};
use crate::position::parse_coord;
use crate::rules::{
    GameStatus, Move, MoveError, apply_move, game_status, generate_legal_moves, is_in_check,
    legal_moves_from, play_move,
};

const KNOWN_COMMANDS: &[&str] = &[
    "clear_board",
    "genmove",
    "known_command",
    "legal",
    "level",
    "list_commands",
    "name",
    "moves",
    "new",
    "play",
    "protocol_version",
    "quit",
    "setpos",
    "showboard",
    "sims",
    "status",
    "undo",
    "version",
];

/// A game in progress with its history of earlier positions and the moves
/// that connect them.
#[derive(Debug, Clone, Default)]
pub struct Game {
    pub state: GameState,
    history: Vec<GameState>,
    moves: Vec<Move>,
}

impl Game {
    pub fn new() -> Self {
        Self::from_state(GameState::new())
    }

    pub fn from_state(state: GameState) -> Self {
        Self {
            state,
            history: Vec::new(),
            moves: Vec::new(),
        }
    }

    /// Play a checked move.
    pub fn play(&mut self, mv: Move) -> Result<(), MoveError> {
        let next = play_move(&self.state, mv)?;
        self.history.push(std::mem::replace(&mut self.state, next));
        self.moves.push(mv);
        Ok(())
    }

    /// Play a move already known to be legal.
    fn play_unchecked(&mut self, mv: Move) {
        let next = apply_move(&self.state, mv);
        self.history.push(std::mem::replace(&mut self.state, next));
        self.moves.push(mv);
    }

    /// Restore the previous position. Returns false if there is none.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(prev) => {
                self.state = prev;
                self.moves.pop();
                true
            }
            None => false,
        }
    }

    /// Number of moves played.
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    /// Moves played, oldest first.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }
}

/// Protocol state: the current game, the strength level and the search used
/// by `genmove`.
pub struct ProtocolEngine<E, B> {
    game: Game,
    mcts: Mcts<E, B>,
    level: Level,
    rng: fastrand::Rng,
}

impl<E: Evaluator, B: BoardEncoder> ProtocolEngine<E, B> {
    pub fn new(mcts: Mcts<E, B>) -> Self {
        let rng = fastrand::Rng::with_seed(mcts.config().seed);
        Self {
            game: Game::new(),
            mcts,
            level: Level::default(),
            rng,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Run the command loop until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        info!("protocol loop started");
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let mut parts = command_line.split_whitespace();
            let Some(command) = parts.next() else {
                continue;
            };
            let command = command.to_lowercase();
            let args: Vec<&str> = parts.collect();

            debug!(%command, ?args, "command");
            let (success, message) = self.execute(&command, &args);
            if !success {
                warn!(%command, %message, "command failed");
            }

            let prefix = if success { '=' } else { '?' };
            let id = id.map(|i| i.to_string()).unwrap_or_default();
            writeln!(output, "{prefix}{id} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Split an optional leading numeric id from the command.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    /// Execute one command and return (success, response).
    pub fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => (true, "2".to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => match args.first() {
                Some(cmd) => {
                    let known = KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str());
                    (true, known.to_string())
                }
                None => (false, "missing argument".to_string()),
            },

            "quit" => (true, String::new()),

            "new" => {
                self.game = Game::new();
                (true, String::new())
            }

            "clear_board" => {
                self.game = Game::from_state(GameState::empty(Color::White));
                (true, String::new())
            }

            "setpos" => self.setpos(args),

            "play" => self.play(args),

            "undo" => {
                if self.game.undo() {
                    (true, String::new())
                } else {
                    (false, "cannot undo".to_string())
                }
            }

            "legal" => {
                let moves = match args.first() {
                    Some(sq) => match parse_coord(sq) {
                        Some(from) => legal_moves_from(&self.game.state, from),
                        None => return (false, format!("invalid square: {sq}")),
                    },
                    None => generate_legal_moves(&self.game.state, self.game.state.side_to_move),
                };
                let text: Vec<String> = moves.iter().map(Move::to_string).collect();
                (true, text.join(" "))
            }

            "genmove" => self.genmove(),

            "moves" => {
                let text: Vec<String> = self.game.moves().iter().map(Move::to_string).collect();
                (true, text.join(" "))
            }

            "level" => match args.first() {
                None => (true, self.level.to_string()),
                Some(arg) => match arg.parse::<u8>().ok().and_then(Level::from_number) {
                    Some(level) => {
                        self.level = level;
                        (true, String::new())
                    }
                    None => (false, format!("invalid level: {arg} (expected 1, 2 or 3)")),
                },
            },

            "showboard" => (true, format!("\n{}", self.game.state)),

            "status" => (true, self.status()),

            "sims" => match args.first().map(|s| s.parse::<u32>()) {
                Some(Ok(n)) if n > 0 => {
                    self.mcts.config_mut().num_simulations = n;
                    (true, String::new())
                }
                Some(_) => (false, "simulations must be a positive integer".to_string()),
                None => (false, "missing argument".to_string()),
            },

            _ => (false, format!("unknown command: {command}")),
        }
    }

    fn setpos(&mut self, args: &[&str]) -> (bool, String) {
        let Some(side) = args.first().and_then(|s| Color::parse(s)) else {
            return (false, "expected side to move (w or b)".to_string());
        };
        let mut placements = Vec::with_capacity(args.len() - 1);
        for arg in &args[1..] {
            match parse_placement(arg) {
                Some(p) => placements.push(p),
                None => return (false, format!("invalid placement: {arg}")),
            }
        }
        self.game = Game::from_state(GameState::from_placements(side, &placements));
        (true, String::new())
    }

    fn play(&mut self, args: &[&str]) -> (bool, String) {
        let [from, to, rest @ ..] = args else {
            return (false, "missing arguments".to_string());
        };
        let Some(mut mv) = Move::parse(from, to) else {
            return (false, format!("invalid coordinates: {from} {to}"));
        };
        if let Some(code) = rest.first() {
            match PieceKind::from_code(code) {
                Some(kind) => mv = mv.with_promotion(kind),
                None => return (false, format!("invalid promotion piece: {code}")),
            }
        }
        match self.game.play(mv) {
            Ok(()) => (true, String::new()),
            Err(e) => (false, e.to_string()),
        }
    }

    fn genmove(&mut self) -> (bool, String) {
        let chosen = match self.level {
            Level::Random => random_move(&self.game.state, &mut self.rng),
            Level::Safe => safe_move(&self.game.state, &mut self.rng),
            Level::Search => return self.genmove_search(),
        };
        match chosen {
            Some(mv) => {
                info!(ply = self.game.ply(), %mv, level = %self.level, "genmove");
                self.game.play_unchecked(mv);
                (true, mv.to_string())
            }
            None => (true, "none".to_string()),
        }
    }

    fn genmove_search(&mut self) -> (bool, String) {
        let result = match self.mcts.search(&self.game.state) {
            Ok(result) => result,
            Err(e) => return (false, e.to_string()),
        };
        let chosen = if self.mcts.config().temperature < GREEDY_TEMPERATURE {
            result.best_move
        } else {
            result.sample_move(&mut self.rng)
        };
        match chosen {
            Some(mv) => {
                info!(
                    ply = self.game.ply(),
                    %mv,
                    value = result.root_value,
                    simulations = result.simulations,
                    "genmove"
                );
                self.game.play_unchecked(mv);
                (true, mv.to_string())
            }
            None => (true, "none".to_string()),
        }
    }

    fn status(&self) -> String {
        let state = &self.game.state;
        match game_status(state) {
            GameStatus::Checkmate { winner } => format!("checkmate {winner}"),
            GameStatus::Stalemate => "stalemate".to_string(),
            GameStatus::Ongoing if is_in_check(state, state.side_to_move) => "check".to_string(),
            GameStatus::Ongoing => "ongoing".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::evaluator::{PlaneEncoder, UniformEvaluator};

    type Engine = ProtocolEngine<UniformEvaluator, PlaneEncoder>;

    fn engine() -> Engine {
        let config = SearchConfig::for_testing().with_simulations(20);
        ProtocolEngine::new(Mcts::new(
            config,
            UniformEvaluator::default(),
            PlaneEncoder::default(),
        ))
    }

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = Engine::parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = Engine::parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_name_and_version() {
        let mut engine = engine();
        assert_eq!(engine.execute("name", &[]), (true, "superchess".to_string()));
        assert_eq!(engine.execute("protocol_version", &[]), (true, "2".to_string()));
    }

    #[test]
    fn test_known_command() {
        let mut engine = engine();
        assert_eq!(engine.execute("known_command", &["setpos"]), (true, "true".to_string()));
        assert_eq!(engine.execute("known_command", &["komi"]), (true, "false".to_string()));
        assert!(!engine.execute("known_command", &[]).0);
    }

    #[test]
    fn test_play_and_undo() {
        let mut engine = engine();
        let (success, _) = engine.execute("play", &["e3", "e4"]);
        assert!(success);
        assert_eq!(engine.game().ply(), 1);
        assert_eq!(engine.game().state.side_to_move, Color::Black);

        assert!(engine.execute("undo", &[]).0);
        assert_eq!(engine.game().state, GameState::new());
        assert!(!engine.execute("undo", &[]).0);
    }

    #[test]
    fn test_illegal_play_reports_reason() {
        let mut engine = engine();
        let (success, message) = engine.execute("play", &["e8", "e7"]);
        assert!(!success);
        assert!(message.contains("side not on move"), "{message}");

        let (success, _) = engine.execute("play", &["e3"]);
        assert!(!success);
        let (success, _) = engine.execute("play", &["z3", "e4"]);
        assert!(!success);
        assert_eq!(engine.game().ply(), 0);
    }

    #[test]
    fn test_legal_lists_moves() {
        let mut engine = engine();
        let (success, moves) = engine.execute("legal", &["e3"]);
        assert!(success);
        assert!(moves.split(' ').any(|m| m == "e3-e4"), "{moves}");

        let (success, moves) = engine.execute("legal", &[]);
        assert!(success);
        assert!(moves.split(' ').count() > 10);

        assert!(!engine.execute("legal", &["k11"]).0);
    }

    #[test]
    fn test_setpos_and_status() {
        let mut engine = engine();
        assert!(engine.execute("setpos", &["b", "BK@a10", "WR@j10", "WR@j9", "WK@e1"]).0);
        assert_eq!(engine.execute("status", &[]), (true, "checkmate white".to_string()));
        assert_eq!(engine.execute("genmove", &[]), (true, "none".to_string()));

        assert!(engine.execute("setpos", &["w", "WK@a1", "BK@j10"]).0);
        assert_eq!(engine.execute("status", &[]), (true, "ongoing".to_string()));

        assert!(!engine.execute("setpos", &["x"]).0);
        assert!(!engine.execute("setpos", &["w", "WK-a1"]).0);
    }

    #[test]
    fn test_genmove_plays_legal_move() {
        let mut engine = engine();
        let before = engine.game().state.clone();
        let (success, text) = engine.execute("genmove", &[]);
        assert!(success);
        let (from, to) = text.split_once('-').unwrap();
        let mv = Move::parse(from, to).unwrap();
        assert!(generate_legal_moves(&before, Color::White).contains(&mv));
        assert_eq!(engine.game().state.side_to_move, Color::Black);
        assert_eq!(engine.game().ply(), 1);
    }

    #[test]
    fn test_moves_follow_play_and_undo() {
        let mut engine = engine();
        assert_eq!(engine.execute("moves", &[]), (true, String::new()));
        assert!(engine.execute("play", &["e3", "e4"]).0);
        assert!(engine.execute("play", &["e8", "e7"]).0);
        assert_eq!(engine.execute("moves", &[]), (true, "e3-e4 e8-e7".to_string()));

        assert!(engine.execute("undo", &[]).0);
        assert_eq!(engine.game().moves(), &[Move::parse("e3", "e4").unwrap()]);

        let (_, reply) = engine.execute("genmove", &[]);
        assert_eq!(engine.execute("moves", &[]), (true, format!("e3-e4 {reply}")));

        assert!(engine.execute("new", &[]).0);
        assert!(engine.game().moves().is_empty());
    }

    #[test]
    fn test_level_command() {
        let mut engine = engine();
        assert_eq!(engine.execute("level", &[]), (true, "3".to_string()));
        assert!(engine.execute("level", &["1"]).0);
        assert_eq!(engine.level(), Level::Random);
        assert_eq!(engine.execute("level", &[]), (true, "1".to_string()));
        assert!(!engine.execute("level", &["0"]).0);
        assert!(!engine.execute("level", &["4"]).0);
        assert!(!engine.execute("level", &["hard"]).0);
        assert_eq!(engine.level(), Level::Random);
    }

    #[test]
    fn test_genmove_at_level_one_takes_the_capture() {
        let mut engine = engine().with_level(Level::Random);
        assert!(engine.execute("setpos", &["w", "WK@a1", "WR@a5", "BN@h5", "BK@j10"]).0);
        assert_eq!(engine.execute("genmove", &[]), (true, "a5-h5".to_string()));
    }

    #[test]
    fn test_genmove_at_level_two_keeps_the_bishop() {
        let mut engine = engine();
        assert!(engine.execute("level", &["2"]).0);
        for _ in 0..10 {
            assert!(engine.execute("setpos", &["w", "WK@a1", "WB@d4", "BR@h9", "BK@j10"]).0);
            let (success, text) = engine.execute("genmove", &[]);
            assert!(success);
            assert_ne!(text, "d4-h8");
            assert_ne!(text, "d4-i9");
        }
        assert!(engine.execute("setpos", &["b", "BK@a10", "WR@j10", "WR@j9", "WK@e1"]).0);
        assert_eq!(engine.execute("genmove", &[]), (true, "none".to_string()));
    }

    #[test]
    fn test_sims() {
        let mut engine = engine();
        assert!(engine.execute("sims", &["5"]).0);
        assert!(!engine.execute("sims", &["0"]).0);
        assert!(!engine.execute("sims", &["many"]).0);
        assert!(!engine.execute("sims", &[]).0);
    }

    #[test]
    fn test_run_loop() {
        let mut engine = engine();
        let input = "1 name\nbogus\n# comment\n2 play e3 e4\nquit\nname\n";
        let mut output = Vec::new();
        engine.run(input.as_bytes(), &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("=1 superchess\n\n"));
        assert!(text.contains("? unknown command: bogus"));
        assert!(text.contains("=2 \n"));
        // Nothing after quit
        assert_eq!(text.matches("superchess").count(), 1);
    }
}
