//! Move-selection policies and a simple alternating game loop.

use log::{debug, info};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::adversarial::{choose_move, Algorithm};
use crate::board::{Board, Coord, GameStatus, Side};
use crate::error::{Error, Result};

/// Searching players open with this many random moves for variety.
pub const DEFAULT_OPENING_RANDOM_MOVES: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerKind {
    Random,
    Searching {
        algorithm: Algorithm,
        /// While fewer marks than this are on the board, pick at random
        /// instead of searching.
        opening_random_moves: usize,
    },
}

#[derive(Debug, Clone)]
pub struct Player {
    kind: PlayerKind,
    rng: StdRng,
}

impl Player {
    pub fn new(kind: PlayerKind, seed: u64) -> Self {
        Player {
            kind,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn random(seed: u64) -> Self {
        Self::new(PlayerKind::Random, seed)
    }

    pub fn searching(algorithm: Algorithm, seed: u64) -> Self {
        Self::new(
            PlayerKind::Searching {
                algorithm,
                opening_random_moves: DEFAULT_OPENING_RANDOM_MOVES,
            },
            seed,
        )
    }

    pub fn with_opening_random_moves(mut self, moves: usize) -> Self {
        if let PlayerKind::Searching {
            opening_random_moves,
            ..
        } = &mut self.kind
        {
            *opening_random_moves = moves;
        }
        self
    }

    pub fn kind(&self) -> PlayerKind {
        self.kind
    }

    pub fn select(&mut self, board: &Board) -> Result<Coord> {
        let kind = self.kind;
        match kind {
            PlayerKind::Searching {
                algorithm,
                opening_random_moves,
            } if board.move_count() >= opening_random_moves => {
                let decision = choose_move(board, board.side_to_move(), algorithm)?;
                Ok(decision.mv)
            }
            _ => self.random_move(board),
        }
    }

    fn random_move(&mut self, board: &Board) -> Result<Coord> {
        board
            .legal_moves()
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| Error::PrecedingTerminalCheckMissing {
                context: "random move requested on a full board".into(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub moves: Vec<Coord>,
    pub status: GameStatus,
    pub board: Board,
}

impl GameRecord {
    pub fn winner(&self) -> Option<Side> {
        match self.status {
            GameStatus::Win(side) => Some(side),
            _ => None,
        }
    }
}

/// Alternate `x` and `o` from `board` until the game ends.
pub fn play_game(x: &mut Player, o: &mut Player, mut board: Board) -> Result<GameRecord> {
    let mut moves = Vec::new();
    loop {
        let status = board.status()?;
        if status.is_terminal() {
            info!("game over after {} moves: {status:?}", moves.len());
            return Ok(GameRecord {
                moves,
                status,
                board,
            });
        }

        let side = board.side_to_move();
        let player = match side {
            Side::X => &mut *x,
            Side::O => &mut *o,
        };
        let mv = player.select(&board)?;
        debug!("{side} chooses {mv}");
        board.play(mv)?;
        moves.push(mv);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_random_players_repeat() {
        let first = play_game(&mut Player::random(3), &mut Player::random(4), Board::new()).unwrap();
        let second = play_game(&mut Player::random(3), &mut Player::random(4), Board::new()).unwrap();
        assert_eq!(first, second);
        assert!(first.status.is_terminal());
    }

    #[test]
    fn searching_players_draw() {
        let mut x = Player::searching(Algorithm::AlphaBeta, 1).with_opening_random_moves(0);
        let mut o = Player::searching(Algorithm::AlphaBeta, 2);
        let record = play_game(&mut x, &mut o, Board::new()).unwrap();
        assert_eq!(record.status, GameStatus::Tie);
        assert_eq!(record.moves.len(), 9);
    }

    #[test]
    fn searching_player_never_loses_to_random() {
        for seed in 0..5 {
            let mut smart = Player::searching(Algorithm::AlphaBeta, seed);
            let mut random = Player::random(seed + 100);
            let record = play_game(&mut random, &mut smart, Board::new()).unwrap();
            assert_ne!(record.winner(), Some(Side::X), "seed {seed}");
        }
    }

    #[test]
    fn opening_count_only_applies_to_searchers() {
        let random = Player::random(0).with_opening_random_moves(3);
        assert_eq!(random.kind(), PlayerKind::Random);
    }
}
