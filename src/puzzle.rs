use rand::{seq::SliceRandom, Rng};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::fingerprint::{Fingerprint, DOMAIN_PUZZLE};

/// Direction the agent (the blank) travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// Expansion order used by every engine.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// `(row, col)` delta applied to the agent.
    pub fn as_offset(&self) -> (isize, isize) {
        match self {
            Move::Up => (-1, 0),
            Move::Down => (1, 0),
            Move::Left => (0, -1),
            Move::Right => (0, 1),
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Move::Up => Move::Down,
            Move::Down => Move::Up,
            Move::Left => Move::Right,
            Move::Right => Move::Left,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Move::Up => "Up",
            Move::Down => "Down",
            Move::Left => "Left",
            Move::Right => "Right",
        };
        write!(f, "{}", s)
    }
}

/// Start and goal grids as plain data, row-major.
///
/// Symbols may repeat (interchangeable filler tiles); `agent` must occur
/// exactly once in each grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleConfig {
    pub start: Vec<Vec<u32>>,
    pub goal: Vec<Vec<u32>>,
    #[serde(default)]
    pub agent: u32,
}

impl PuzzleConfig {
    pub fn new(start: Vec<Vec<u32>>, goal: Vec<Vec<u32>>) -> Self {
        Self {
            start,
            goal,
            agent: 0,
        }
    }

    pub fn with_agent(mut self, agent: u32) -> Self {
        self.agent = agent;
        self
    }

    /// The 4x4 blocksworld instance: blocks 2, 3 and 4 have to be stacked
    /// along the bottom row, every other cell is filler (`1`).
    pub fn blocksworld() -> Self {
        Self::new(
            vec![
                vec![3, 1, 1, 2],
                vec![1, 1, 1, 1],
                vec![1, 1, 1, 1],
                vec![4, 1, 1, 0],
            ],
            vec![
                vec![1, 1, 1, 1],
                vec![1, 1, 1, 1],
                vec![1, 1, 1, 1],
                vec![2, 3, 4, 0],
            ],
        )
    }

    /// Classic `size * size - 1` puzzle, tiles numbered from 1 with the blank
    /// last. The start is the solved position; scramble it to get work.
    pub fn numbered(size: usize) -> Self {
        let mut board = Vec::new();
        let mut value = 1;

        for i in 0..size {
            let mut row = Vec::new();
            for j in 0..size {
                if i == size - 1 && j == size - 1 {
                    row.push(0);
                } else {
                    row.push(value);
                    value += 1;
                }
            }
            board.push(row);
        }

        Self::new(board.clone(), board)
    }

    /// Validate the grids and build the initial state.
    pub fn build(&self) -> Result<Puzzle> {
        let (rows, cols, start) = flatten("start", &self.start)?;
        let (goal_rows, goal_cols, goal) = flatten("goal", &self.goal)?;
        if (rows, cols) != (goal_rows, goal_cols) {
            return Err(Error::config(format!(
                "start is {rows}x{cols} but goal is {goal_rows}x{goal_cols}"
            )));
        }

        let start_agent = single_agent("start", &start, self.agent)?;
        single_agent("goal", &goal, self.agent)?;

        let mut start_sorted = start.clone();
        let mut goal_sorted = goal.clone();
        start_sorted.sort_unstable();
        goal_sorted.sort_unstable();
        if start_sorted != goal_sorted {
            return Err(Error::config(
                "start and goal do not hold the same set of tiles",
            ));
        }

        let mut targets: FxHashMap<u32, Vec<usize>> = FxHashMap::default();
        for (idx, &tile) in goal.iter().enumerate() {
            if tile != self.agent {
                targets.entry(tile).or_default().push(idx);
            }
        }

        let goal = Rc::new(Goal {
            rows,
            cols,
            tiles: goal,
            agent: self.agent,
            targets,
        });

        Ok(Puzzle {
            rows,
            cols,
            tiles: start,
            agent: start_agent,
            moves: 0,
            trail: None,
            goal,
        })
    }
}

fn flatten(which: &str, grid: &[Vec<u32>]) -> Result<(usize, usize, Vec<u32>)> {
    let rows = grid.len();
    let cols = grid.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        return Err(Error::config(format!("{which} grid is empty")));
    }
    if let Some(bad) = grid.iter().position(|row| row.len() != cols) {
        return Err(Error::config(format!(
            "{which} row {bad} has {} cells, expected {cols}",
            grid[bad].len()
        )));
    }
    Ok((rows, cols, grid.iter().flatten().copied().collect()))
}

fn single_agent(which: &str, tiles: &[u32], agent: u32) -> Result<usize> {
    let mut found = tiles.iter().enumerate().filter(|&(_, &t)| t == agent);
    match (found.next(), found.next()) {
        (Some((idx, _)), None) => Ok(idx),
        (None, _) => Err(Error::config(format!("{which} grid has no agent ({agent})"))),
        (Some(_), Some(_)) => Err(Error::config(format!(
            "{which} grid holds the agent ({agent}) more than once"
        ))),
    }
}

/// Target configuration shared by every state of one search instance.
#[derive(Debug)]
pub struct Goal {
    rows: usize,
    cols: usize,
    tiles: Vec<u32>,
    agent: u32,
    // goal cells per symbol, agent excluded
    targets: FxHashMap<u32, Vec<usize>>,
}

impl Goal {
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn tiles(&self) -> &[u32] {
        &self.tiles
    }

    pub fn agent(&self) -> u32 {
        self.agent
    }

    fn distance(&self, tile: u32, idx: usize) -> usize {
        let (row, col) = (idx / self.cols, idx % self.cols);
        self.targets.get(&tile).map_or(0, |cells| {
            cells
                .iter()
                .map(|&target| {
                    row.abs_diff(target / self.cols) + col.abs_diff(target % self.cols)
                })
                .min()
                .unwrap_or(0)
        })
    }
}

// Moves are kept as a parent-linked list so that a child shares its
// ancestors' history instead of copying it.
#[derive(Debug)]
struct Trail {
    mv: Move,
    parent: Option<Rc<Trail>>,
}

impl Drop for Trail {
    fn drop(&mut self) {
        // unlink iteratively; deep depth-first paths would otherwise blow the stack
        let mut next = self.parent.take();
        while let Some(node) = next {
            match Rc::try_unwrap(node) {
                Ok(mut inner) => next = inner.parent.take(),
                Err(_) => break,
            }
        }
    }
}

/// One sliding-block configuration plus the moves that produced it.
#[derive(Clone)]
pub struct Puzzle {
    rows: usize,
    cols: usize,
    tiles: Vec<u32>,
    agent: usize,
    moves: usize,
    trail: Option<Rc<Trail>>,
    goal: Rc<Goal>,
}

impl Puzzle {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major tile symbols.
    pub fn tiles(&self) -> &[u32] {
        &self.tiles
    }

    pub fn tile(&self, row: usize, col: usize) -> Option<u32> {
        if row < self.rows && col < self.cols {
            Some(self.tiles[row * self.cols + col])
        } else {
            None
        }
    }

    /// Number of moves taken from the initial state.
    pub fn moves(&self) -> usize {
        self.moves
    }

    pub fn agent_position(&self) -> (usize, usize) {
        (self.agent / self.cols, self.agent % self.cols)
    }

    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    pub fn last_move(&self) -> Option<Move> {
        self.trail.as_ref().map(|t| t.mv)
    }

    /// Moves from the initial state to this one, in order.
    pub fn path(&self) -> Vec<Move> {
        let mut path = Vec::with_capacity(self.moves);
        let mut node = self.trail.as_deref();
        while let Some(step) = node {
            path.push(step.mv);
            node = step.parent.as_deref();
        }
        path.reverse();
        path
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_grid(
            DOMAIN_PUZZLE,
            self.rows,
            self.cols,
            self.tiles.iter().copied(),
        )
    }

    pub fn is_goal(&self) -> bool {
        self.tiles == self.goal.tiles
    }

    fn target(&self, movement: Move) -> Option<usize> {
        let (dr, dc) = movement.as_offset();
        let (row, col) = self.agent_position();

        let new_row = row as isize + dr;
        let new_col = col as isize + dc;

        if new_row >= 0 && new_row < self.rows as isize && new_col >= 0 && new_col < self.cols as isize
        {
            Some(new_row as usize * self.cols + new_col as usize)
        } else {
            None
        }
    }

    pub fn is_legal(&self, movement: Move) -> bool {
        self.target(movement).is_some()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        Move::ALL
            .into_iter()
            .filter(|&mv| self.is_legal(mv))
            .collect()
    }

    fn swap_agent(&mut self, target: usize) {
        self.tiles.swap(self.agent, target);
        self.agent = target;
    }

    /// Slide the agent in place, recording the move.
    pub fn apply_move(&mut self, movement: Move) -> Result<()> {
        let target = self
            .target(movement)
            .ok_or_else(|| Error::illegal_move(movement, "agent would leave the grid"))?;
        self.swap_agent(target);
        self.moves += 1;
        self.trail = Some(Rc::new(Trail {
            mv: movement,
            parent: self.trail.take(),
        }));
        Ok(())
    }

    /// Revert the most recent move, restoring the previous state exactly.
    pub fn undo_move(&mut self) -> Result<Move> {
        let last = self.trail.take().ok_or(Error::NothingToUndo)?;
        let mv = last.mv;
        let target = match self.target(mv.opposite()) {
            Some(target) => target,
            None => {
                self.trail = Some(last);
                return Err(Error::InvariantViolation {
                    message: format!("recorded move {mv} cannot be reversed"),
                });
            }
        };
        self.swap_agent(target);
        self.moves -= 1;
        self.trail = last.parent.clone();
        Ok(mv)
    }

    /// Child state reached by one move; the receiver is left untouched.
    pub fn try_move(&self, movement: Move) -> Result<Self> {
        let mut child = self.clone();
        child.apply_move(movement)?;
        Ok(child)
    }

    /// Every legal one-step transition, in [`Move::ALL`] order.
    pub fn successors(&self) -> Vec<(Move, Puzzle)> {
        Move::ALL
            .into_iter()
            .filter_map(|mv| self.try_move(mv).ok().map(|child| (mv, child)))
            .collect()
    }

    /// Sum over non-agent tiles of the L1 distance to the nearest goal cell
    /// holding the same symbol. Each move shifts exactly one tile by one
    /// cell, so this never overestimates the remaining moves.
    pub fn manhattan_distance(&self) -> usize {
        self.tiles
            .iter()
            .enumerate()
            .filter(|&(_, &tile)| tile != self.goal.agent)
            .map(|(idx, &tile)| self.goal.distance(tile, idx))
            .sum()
    }

    /// Whether the goal is reachable at all. Only decidable by parity when
    /// every symbol is distinct, otherwise `None`.
    pub fn is_solvable(&self) -> Option<bool> {
        let mut goal_index: FxHashMap<u32, usize> = FxHashMap::default();
        for (idx, &tile) in self.goal.tiles.iter().enumerate() {
            if goal_index.insert(tile, idx).is_some() {
                return None;
            }
        }

        if self.rows == 1 || self.cols == 1 {
            // a single line never reorders its tiles
            let agent = self.goal.agent;
            let ours = self.tiles.iter().filter(|&&t| t != agent);
            let theirs = self.goal.tiles.iter().filter(|&&t| t != agent);
            return Some(ours.eq(theirs));
        }

        let permutation: Vec<usize> = self.tiles.iter().map(|t| goal_index[t]).collect();
        let inversions = Self::count_inversions(&permutation);

        let goal_agent = goal_index[&self.goal.agent];
        let (row, col) = self.agent_position();
        let agent_distance =
            row.abs_diff(goal_agent / self.cols) + col.abs_diff(goal_agent % self.cols);

        Some(inversions % 2 == agent_distance % 2)
    }

    fn count_inversions(flattened: &[usize]) -> usize {
        flattened
            .iter()
            .enumerate()
            .map(|(i, &val)| {
                flattened[i + 1..]
                    .iter()
                    .filter(|&&next| next < val)
                    .count()
            })
            .sum()
    }

    /// Random walk of `steps` legal moves that never immediately reverses
    /// itself. The result becomes a fresh initial state, so it is always
    /// solvable.
    pub fn scramble<R: Rng + ?Sized>(&mut self, rng: &mut R, steps: usize) {
        let mut last: Option<Move> = None;
        for _ in 0..steps {
            let options: Vec<Move> = self
                .legal_moves()
                .into_iter()
                .filter(|mv| Some(mv.opposite()) != last)
                .collect();
            let Some(&mv) = options.choose(rng) else {
                break;
            };
            if let Some(target) = self.target(mv) {
                self.swap_agent(target);
                last = Some(mv);
            }
        }
        self.moves = 0;
        self.trail = None;
    }
}

impl PartialEq for Puzzle {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self.tiles == other.tiles
            && self.agent == other.agent
            && self.moves == other.moves
            && self.path() == other.path()
    }
}

impl Eq for Puzzle {}

impl fmt::Debug for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Puzzle")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("tiles", &self.tiles)
            .field("moves", &self.moves)
            .finish()
    }
}

impl fmt::Display for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.tiles.chunks(self.cols) {
            for &val in row {
                write!(f, "{:2} ", val)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
