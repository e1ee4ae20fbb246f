//! Path search over the sliding-block state space.
//!
//! Every call to [`Solver::search`] owns its frontier, visited map and
//! counters; nothing is shared between invocations.

use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::fingerprint::{Fingerprint, VisitedMap};
use crate::frontier::{Fifo, Frontier, Lifo, Priority};
use crate::puzzle::{Move, Puzzle, PuzzleConfig};

/// Iteration ceiling for depth-first search when the caller gives neither a
/// depth bound nor an iteration limit.
pub const DEFAULT_DFS_ITERATION_CEILING: usize = 5_000_000;

pub const DEFAULT_PROGRESS_INTERVAL: usize = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    BreadthFirst,
    DepthFirst,
    IterativeDeepening,
    AStar,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::BreadthFirst,
        Strategy::DepthFirst,
        Strategy::IterativeDeepening,
        Strategy::AStar,
    ];

    /// Short identifier, also accepted by [`FromStr`].
    pub fn id(&self) -> &'static str {
        match self {
            Strategy::BreadthFirst => "bfs",
            Strategy::DepthFirst => "dfs",
            Strategy::IterativeDeepening => "id_dfs",
            Strategy::AStar => "a_star",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Strategy::BreadthFirst => "Breadth-first search",
            Strategy::DepthFirst => "Depth-first search",
            Strategy::IterativeDeepening => "Iterative deepening depth-first search",
            Strategy::AStar => "A* (sum of Manhattan distances)",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bfs" | "breadth-first" => Ok(Strategy::BreadthFirst),
            "dfs" | "depth-first" => Ok(Strategy::DepthFirst),
            "id_dfs" | "iddfs" | "iterative-deepening" => Ok(Strategy::IterativeDeepening),
            "a_star" | "astar" | "a*" => Ok(Strategy::AStar),
            other => Err(Error::config(format!(
                "unknown strategy '{other}' (expected bfs, dfs, id_dfs or a_star)"
            ))),
        }
    }
}

/// Bounds a caller imposes on one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLimits {
    /// Deepest move count expanded by depth-first search, and the last round
    /// tried by iterative deepening.
    pub depth_limit: Option<usize>,
    /// Hard cap on frontier pops, for any strategy.
    pub max_iterations: Option<usize>,
    /// Emit a progress trace every this many iterations; 0 disables it.
    pub progress_interval: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            depth_limit: None,
            max_iterations: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl SearchLimits {
    pub fn with_depth_limit(mut self, depth: usize) -> Self {
        self.depth_limit = Some(depth);
        self
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchOutcome {
    GoalFound,
    /// Frontier emptied (or a ceiling was hit) without reaching the goal.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub strategy: Strategy,
    pub outcome: SearchOutcome,
    /// Frontier pops across the whole invocation, every deepening round included.
    pub iterations: usize,
    pub frontier_len: usize,
    pub moves: Option<usize>,
    pub path: Vec<Move>,
    pub elapsed: Duration,
    /// Stopped by an iteration ceiling rather than by running out of states.
    pub truncated: bool,
    /// Depth bound of the last round, iterative deepening only.
    pub deepest_round: Option<usize>,
}

impl SearchResult {
    pub fn is_successful(&self) -> bool {
        self.outcome == SearchOutcome::GoalFound
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.is_successful() {
            "Successful"
        } else if self.truncated {
            "Unsuccessful (iteration ceiling)"
        } else {
            "Unsuccessful"
        };
        writeln!(f, "Result - {verdict}")?;
        writeln!(f, "Total time - {:?}", self.elapsed)?;
        match self.moves {
            Some(moves) => writeln!(f, "Total moves number to goal - {moves} moves")?,
            None => writeln!(f, "Total moves number to goal - n/a")?,
        }
        writeln!(f, "Total iterations - {}", self.iterations)?;
        write!(f, "Frontier size - {}", self.frontier_len)
    }
}

// Per-invocation bookkeeping.
struct Run {
    strategy: Strategy,
    iterations: usize,
    ceiling: Option<usize>,
    progress_interval: usize,
    truncated: bool,
}

impl Run {
    fn new(strategy: Strategy, ceiling: Option<usize>, progress_interval: usize) -> Self {
        Run {
            strategy,
            iterations: 0,
            ceiling,
            progress_interval,
            truncated: false,
        }
    }

    fn next<T, F: Frontier<T>>(&mut self, frontier: &mut F) -> Option<T> {
        if frontier.is_empty() {
            return None;
        }
        if self.ceiling.map_or(false, |c| self.iterations >= c) {
            if !self.truncated {
                warn!(
                    "{}: iteration ceiling of {} reached with {} states pending",
                    self.strategy,
                    self.iterations,
                    frontier.len()
                );
            }
            self.truncated = true;
            return None;
        }
        self.iterations += 1;
        if self.progress_interval > 0 && self.iterations % self.progress_interval == 0 {
            trace!(
                "{}: {} iterations, frontier {}",
                self.strategy,
                self.iterations,
                frontier.len()
            );
        }
        frontier.pop()
    }
}

struct Finish {
    goal: Option<Puzzle>,
    frontier_len: usize,
    // a depth-bounded round left some state unexpanded
    cutoff: bool,
}

impl Finish {
    fn found(goal: Puzzle, frontier_len: usize) -> Self {
        Finish {
            goal: Some(goal),
            frontier_len,
            cutoff: false,
        }
    }
}

/// Runs one search per call; holds only the caller's limits.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    limits: SearchLimits,
}

impl Solver {
    pub fn new(limits: SearchLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    pub fn search(&self, start: &Puzzle, strategy: Strategy) -> SearchResult {
        debug!(
            "{strategy}: starting from a {}x{} grid, heuristic {}",
            start.rows(),
            start.cols(),
            start.manhattan_distance()
        );
        let began = Instant::now();

        let (finish, run, deepest_round) = match strategy {
            Strategy::BreadthFirst => {
                let mut run = self.run(strategy, self.limits.max_iterations);
                (breadth_first(start, &mut run), run, None)
            }
            Strategy::DepthFirst => {
                let mut run = self.run(strategy, dfs_ceiling(&self.limits));
                (depth_first(start, self.limits.depth_limit, &mut run), run, None)
            }
            Strategy::IterativeDeepening => {
                let mut run = self.run(strategy, self.limits.max_iterations);
                let (finish, depth) = self.iterative_deepening(start, &mut run);
                (finish, run, Some(depth))
            }
            Strategy::AStar => {
                let mut run = self.run(strategy, self.limits.max_iterations);
                (a_star(start, &mut run), run, None)
            }
        };

        let elapsed = began.elapsed();
        let outcome = if finish.goal.is_some() {
            SearchOutcome::GoalFound
        } else {
            SearchOutcome::Exhausted
        };
        let result = SearchResult {
            strategy,
            outcome,
            iterations: run.iterations,
            frontier_len: finish.frontier_len,
            moves: finish.goal.as_ref().map(Puzzle::moves),
            path: finish.goal.as_ref().map(Puzzle::path).unwrap_or_default(),
            elapsed,
            truncated: run.truncated,
            deepest_round,
        };
        info!(
            "{strategy}: {:?} after {} iterations in {:?}, moves {:?}, frontier {}",
            result.outcome, result.iterations, result.elapsed, result.moves, result.frontier_len
        );
        result
    }

    fn run(&self, strategy: Strategy, ceiling: Option<usize>) -> Run {
        Run::new(strategy, ceiling, self.limits.progress_interval)
    }

    fn iterative_deepening(&self, start: &Puzzle, run: &mut Run) -> (Finish, usize) {
        let mut depth = 0;
        loop {
            debug!("id_dfs: round with depth bound {depth}");
            let finish = depth_first(start, Some(depth), run);
            let last_round = self.limits.depth_limit.map_or(false, |limit| depth >= limit);
            // no cutoff means the round saw every reachable state
            if finish.goal.is_some() || run.truncated || !finish.cutoff || last_round {
                return (finish, depth);
            }
            depth += 1;
        }
    }
}

// Depth-first search with neither bound would wander the whole space, so it
// falls back to the default ceiling.
fn dfs_ceiling(limits: &SearchLimits) -> Option<usize> {
    match (limits.max_iterations, limits.depth_limit) {
        (Some(ceiling), _) => Some(ceiling),
        (None, None) => Some(DEFAULT_DFS_ITERATION_CEILING),
        (None, Some(_)) => None,
    }
}

/// Validate `config`, then run one search with `strategy`.
pub fn solve(config: &PuzzleConfig, strategy: Strategy, limits: SearchLimits) -> Result<SearchResult> {
    let start = config.build()?;
    Ok(Solver::new(limits).search(&start, strategy))
}

fn breadth_first(start: &Puzzle, run: &mut Run) -> Finish {
    let mut frontier = Fifo::new();
    let mut visited = VisitedMap::default();
    visited.insert(start.fingerprint(), 0);
    frontier.push(start.clone());

    while let Some(state) = run.next(&mut frontier) {
        if state.is_goal() {
            return Finish::found(state, frontier.len());
        }
        for (_, child) in state.successors() {
            // first sighting is the shallowest under FIFO order
            if let Entry::Vacant(slot) = visited.entry(child.fingerprint()) {
                slot.insert(child.moves());
                frontier.push(child);
            }
        }
    }

    Finish {
        goal: None,
        frontier_len: frontier.len(),
        cutoff: false,
    }
}

fn depth_first(start: &Puzzle, depth_limit: Option<usize>, run: &mut Run) -> Finish {
    let mut frontier: Lifo<(Fingerprint, Puzzle)> = Lifo::new();
    let mut visited = VisitedMap::default();
    let mut cutoff = false;
    frontier.push((start.fingerprint(), start.clone()));

    while let Some((fingerprint, state)) = run.next(&mut frontier) {
        // already expanded at least this shallow
        if visited
            .get(&fingerprint)
            .map_or(false, |&depth| depth <= state.moves())
        {
            continue;
        }
        visited.insert(fingerprint, state.moves());

        if state.is_goal() {
            return Finish::found(state, frontier.len());
        }

        if depth_limit.map_or(false, |limit| state.moves() >= limit) {
            cutoff = true;
            continue;
        }

        // reversed so the first move in expansion order is popped first
        for (_, child) in state.successors().into_iter().rev() {
            let fingerprint = child.fingerprint();
            let improves = visited
                .get(&fingerprint)
                .map_or(true, |&depth| depth > child.moves());
            if improves {
                frontier.push((fingerprint, child));
            }
        }
    }

    Finish {
        goal: None,
        frontier_len: frontier.len(),
        cutoff,
    }
}

fn a_star(start: &Puzzle, run: &mut Run) -> Finish {
    let mut frontier: Priority<(Fingerprint, Puzzle)> = Priority::new();
    let mut closed = VisitedMap::default();
    frontier.push_with_cost(start.manhattan_distance(), (start.fingerprint(), start.clone()));

    while let Some((_, (fingerprint, state))) = run.next(&mut frontier) {
        // stale duplicate of something already expanded more cheaply
        if closed.contains_key(&fingerprint) {
            continue;
        }
        closed.insert(fingerprint, state.moves());

        if state.is_goal() {
            return Finish::found(state, frontier.len());
        }

        for (_, child) in state.successors() {
            let fingerprint = child.fingerprint();
            if !closed.contains_key(&fingerprint) {
                let cost = child.moves() + child.manhattan_distance();
                frontier.push_with_cost(cost, (fingerprint, child));
            }
        }
    }

    Finish {
        goal: None,
        frontier_len: frontier.len(),
        cutoff: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_away() -> Puzzle {
        PuzzleConfig::new(
            vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 0, 8]],
            vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 0]],
        )
        .build()
        .unwrap()
    }

    fn unsolvable() -> Puzzle {
        PuzzleConfig::new(vec![vec![2, 1], vec![3, 0]], vec![vec![1, 2], vec![3, 0]])
            .build()
            .unwrap()
    }

    #[test]
    fn strategy_ids_round_trip() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.id().parse::<Strategy>().unwrap(), strategy);
        }
        assert!(matches!("greedy".parse::<Strategy>(), Err(Error::Config { .. })));
    }

    #[test]
    fn start_at_goal_takes_one_iteration() {
        let start = PuzzleConfig::numbered(3).build().unwrap();
        for strategy in Strategy::ALL {
            let result = Solver::default().search(&start, strategy);
            assert!(result.is_successful(), "{strategy}");
            assert_eq!(result.moves, Some(0));
            assert_eq!(result.iterations, 1);
            assert!(result.path.is_empty());
        }
    }

    #[test]
    fn shortest_path_strategies_find_the_single_move() {
        for strategy in [
            Strategy::BreadthFirst,
            Strategy::IterativeDeepening,
            Strategy::AStar,
        ] {
            let result = Solver::default().search(&one_away(), strategy);
            assert!(result.is_successful(), "{strategy}");
            assert_eq!(result.path, vec![Move::Right], "{strategy}");
        }
    }

    #[test]
    fn bounded_dfs_backtracks_to_the_goal() {
        // Up is tried first, hits the bound, then Left, then Right
        let solver = Solver::new(SearchLimits::default().with_depth_limit(1));
        let result = solver.search(&one_away(), Strategy::DepthFirst);
        assert!(result.is_successful());
        assert_eq!(result.path, vec![Move::Right]);
        assert_eq!(result.iterations, 4);
    }

    #[test]
    fn depth_zero_dfs_only_checks_the_root() {
        let solver = Solver::new(SearchLimits::default().with_depth_limit(0));
        let result = solver.search(&one_away(), Strategy::DepthFirst);
        assert_eq!(result.outcome, SearchOutcome::Exhausted);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.frontier_len, 0);
        assert!(!result.truncated);
    }

    #[test]
    fn unsolvable_instance_exhausts_every_strategy() {
        // the 2x2 space splits into two orbits of 12 states
        for strategy in Strategy::ALL {
            let result = Solver::default().search(&unsolvable(), strategy);
            assert_eq!(result.outcome, SearchOutcome::Exhausted, "{strategy}");
            assert!(!result.truncated, "{strategy}");
            assert_eq!(result.moves, None);
        }
        let bfs = Solver::default().search(&unsolvable(), Strategy::BreadthFirst);
        assert_eq!(bfs.iterations, 12);
    }

    #[test]
    fn iterative_deepening_reports_its_last_round() {
        let result = Solver::default().search(&one_away(), Strategy::IterativeDeepening);
        assert_eq!(result.deepest_round, Some(1));

        let capped = Solver::new(SearchLimits::default().with_depth_limit(3))
            .search(&unsolvable(), Strategy::IterativeDeepening);
        assert_eq!(capped.outcome, SearchOutcome::Exhausted);
        assert_eq!(capped.deepest_round, Some(3));
    }

    #[test]
    fn iteration_ceiling_truncates() {
        let solver = Solver::new(SearchLimits::default().with_max_iterations(5));
        let result = solver.search(&unsolvable(), Strategy::BreadthFirst);
        assert_eq!(result.outcome, SearchOutcome::Exhausted);
        assert!(result.truncated);
        assert_eq!(result.iterations, 5);
    }

    #[test]
    fn dfs_ceiling_defaults_only_without_bounds() {
        let unbounded = SearchLimits::default();
        assert_eq!(dfs_ceiling(&unbounded), Some(DEFAULT_DFS_ITERATION_CEILING));

        let explicit = SearchLimits::default().with_depth_limit(4).with_max_iterations(70);
        assert_eq!(dfs_ceiling(&explicit), Some(70));

        let depth_only = SearchLimits::default().with_depth_limit(4);
        assert_eq!(dfs_ceiling(&depth_only), None);
    }

    #[test]
    fn unbounded_dfs_uses_the_default_ceiling() {
        let solver = Solver::default();
        assert_eq!(dfs_ceiling(solver.limits()), Some(DEFAULT_DFS_ITERATION_CEILING));

        // a silent solver still truncates at the same point
        let quiet = Solver::new(
            SearchLimits::default()
                .with_progress_interval(0)
                .with_max_iterations(DEFAULT_DFS_ITERATION_CEILING),
        );
        assert_eq!(quiet.limits().progress_interval, 0);
        assert_eq!(dfs_ceiling(quiet.limits()), dfs_ceiling(solver.limits()));
    }

    #[test]
    fn solve_rejects_bad_config() {
        let config = PuzzleConfig::new(vec![vec![1, 2]], vec![vec![1, 0]]);
        assert!(matches!(
            solve(&config, Strategy::AStar, SearchLimits::default()),
            Err(Error::Config { .. })
        ));
    }
}
