//! Search over small, fully observable grid worlds.
//!
//! - Game-tree search (minimax, alpha-beta) for tic-tac-toe style boards
//! - Path search (breadth-first, depth-first, iterative deepening, A*) for
//!   sliding-block puzzles
//! - Content fingerprints used to deduplicate visited states

pub mod adversarial;
pub mod board;
pub mod error;
pub mod fingerprint;
pub mod frontier;
pub mod players;
pub mod puzzle;
pub mod solver;

pub use adversarial::{choose_move, evaluate, Algorithm, Decision, Outcome, SearchStats};
pub use board::{Board, Cell, Coord, GameStatus, Side};
pub use error::{Error, Result};
pub use fingerprint::Fingerprint;
pub use players::{play_game, GameRecord, Player, PlayerKind};
pub use puzzle::{Move, Puzzle, PuzzleConfig};
pub use solver::{solve, SearchLimits, SearchOutcome, SearchResult, Solver, Strategy};
