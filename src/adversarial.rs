//! Full-depth game-tree search for two-player zero-sum board games.
//!
//! Values follow the negamax convention: every level scores the position for
//! the side to move there, and a parent negates what its child returns.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::board::{Board, Coord, GameStatus, Side};
use crate::error::{Error, Result};

// Bound on every real value; safe to negate.
const INFINITY: i32 = i32::MAX / 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    Minimax,
    AlphaBeta,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::Minimax => "minimax",
            Algorithm::AlphaBeta => "alphabeta",
        })
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "minimax" | "minmax" => Ok(Algorithm::Minimax),
            "alphabeta" | "alpha-beta" | "ab" => Ok(Algorithm::AlphaBeta),
            other => Err(Error::config(format!(
                "unknown algorithm '{other}' (expected minimax or alphabeta)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Positions evaluated, root included.
    pub nodes: u64,
    /// Times the remaining siblings of a node were skipped.
    pub cutoffs: u64,
}

/// Game-theoretic result for the side that moves, under perfect play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    /// Sign of a scaled value: the +1 / 0 / -1 reading of a decision.
    pub fn from_value(value: i32) -> Self {
        match value.signum() {
            1 => Outcome::Win,
            -1 => Outcome::Loss,
            _ => Outcome::Draw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub mv: Coord,
    /// Score for the mover, scaled by depth: a forced win scores
    /// `1 + empty cells` left at the end of the game, a forced loss the
    /// negation, a draw zero. [`Decision::outcome`] gives the plain
    /// win/draw/loss reading.
    pub value: i32,
    /// Principal variation, starting with `mv`.
    pub line: Vec<Coord>,
    pub stats: SearchStats,
}

impl Decision {
    pub fn outcome(&self) -> Outcome {
        Outcome::from_value(self.value)
    }
}

/// Score of a finished position for the side to move there.
///
/// A tie is 0. A decided game scores `1 + empty cells` for the winner, so a
/// quicker win is worth more and a slower loss costs less.
pub fn terminal_value(board: &Board, status: GameStatus) -> i32 {
    let margin = 1 + board.empty_count() as i32;
    match status {
        GameStatus::Win(side) if side == board.side_to_move() => margin,
        GameStatus::Win(_) => -margin,
        GameStatus::Tie | GameStatus::InProgress => 0,
    }
}

/// Pick a move for `side` on `board` by searching to the end of the game.
///
/// The caller's board is never modified; the search works on its own copy.
pub fn choose_move(board: &Board, side: Side, algorithm: Algorithm) -> Result<Decision> {
    if side != board.side_to_move() {
        return Err(Error::IllegalMove {
            mv: "-".into(),
            reason: format!("{side} asked to move but it is {}'s turn", board.side_to_move()),
        });
    }
    if board.status()?.is_terminal() {
        return Err(Error::PrecedingTerminalCheckMissing {
            context: "move requested on a finished game".into(),
        });
    }

    let mut search = Search::new(board, algorithm);
    search.stats.nodes += 1;
    let (value, line) = search.expand(-INFINITY, INFINITY)?;
    search.finish(board)?;

    let mv = *line.first().ok_or_else(|| Error::InvariantViolation {
        message: "search of an unfinished game produced no move".into(),
    })?;
    debug!(
        "{algorithm}: {side} plays {mv} (value {value}, {} nodes, {} cutoffs)",
        search.stats.nodes, search.stats.cutoffs
    );
    Ok(Decision {
        mv,
        value,
        line,
        stats: search.stats,
    })
}

/// Value of any position, finished or not, for the side to move.
pub fn evaluate(board: &Board, algorithm: Algorithm) -> Result<(i32, SearchStats)> {
    let mut search = Search::new(board, algorithm);
    let (value, _) = search.position(-INFINITY, INFINITY)?;
    search.finish(board)?;
    Ok((value, search.stats))
}

// Owns the one board that is mutated and restored throughout a search.
struct Search {
    board: Board,
    pruning: bool,
    stats: SearchStats,
}

impl Search {
    fn new(board: &Board, algorithm: Algorithm) -> Self {
        Search {
            board: board.clone(),
            pruning: algorithm == Algorithm::AlphaBeta,
            stats: SearchStats::default(),
        }
    }

    fn finish(&self, original: &Board) -> Result<()> {
        if self.board != *original {
            return Err(Error::InvariantViolation {
                message: "search did not restore the board it was given".into(),
            });
        }
        Ok(())
    }

    // Score the current position, checking for the end of the game before
    // recursing.
    fn position(&mut self, alpha: i32, beta: i32) -> Result<(i32, Vec<Coord>)> {
        self.stats.nodes += 1;
        let status = self.board.status()?;
        if status.is_terminal() {
            return Ok((terminal_value(&self.board, status), Vec::new()));
        }
        self.expand(alpha, beta)
    }

    // Best move of an unfinished position. Fail-soft: the value is exact when
    // it lands inside (alpha, beta) and a bound otherwise.
    fn expand(&mut self, mut alpha: i32, beta: i32) -> Result<(i32, Vec<Coord>)> {
        let moves = self.board.legal_moves();
        if moves.is_empty() {
            return Err(Error::PrecedingTerminalCheckMissing {
                context: format!("no moves to expand\n{}", self.board),
            });
        }

        let mut best = -INFINITY - 1;
        let mut best_line = Vec::new();
        for mv in moves {
            self.board.play(mv)?;
            let reply = self.position(-beta, -alpha);
            self.board.undo()?;
            let (value, line) = reply?;
            let value = -value;

            if value > best {
                best = value;
                best_line.clear();
                best_line.push(mv);
                best_line.extend(line);
            }
            if value > alpha {
                alpha = value;
            }
            if self.pruning && alpha >= beta {
                self.stats.cutoffs += 1;
                break;
            }
        }
        Ok((best, best_line))
    }
}
