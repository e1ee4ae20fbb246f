use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use crossterm::style::Stylize;
use grid_search::{
    play_game, Algorithm, Board, GameStatus, Player, PlayerKind, PuzzleConfig, SearchLimits,
    Solver, Strategy,
};
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "grid-search")]
#[command(version, about = "Puzzle and game-tree search", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve a sliding-block puzzle with one or more strategies
    Puzzle(PuzzleArgs),
    /// Play one game of tic-tac-toe between two computer players
    Game(GameArgs),
}

#[derive(Args)]
struct PuzzleArgs {
    /// JSON puzzle configuration (start, goal, agent); defaults to blocksworld
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scrambled numbered puzzle of this size instead of a configuration
    #[arg(long, conflicts_with = "config")]
    size: Option<usize>,

    /// Random moves applied when scrambling
    #[arg(long, default_value_t = 20)]
    scramble: usize,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Strategies to run in order: bfs, dfs, id_dfs, a_star (default: all)
    #[arg(long = "strategy", value_delimiter = ',')]
    strategies: Vec<Strategy>,

    #[arg(long)]
    depth_limit: Option<usize>,

    #[arg(long)]
    max_iterations: Option<usize>,

    /// Print the moves of every solution found
    #[arg(long)]
    show_path: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PlayerChoice {
    Random,
    Smart,
}

#[derive(Args)]
struct GameArgs {
    #[arg(long, value_enum, default_value_t = PlayerChoice::Smart)]
    x: PlayerChoice,

    #[arg(long, value_enum, default_value_t = PlayerChoice::Random)]
    o: PlayerChoice,

    /// minimax or alphabeta
    #[arg(long, default_value_t = Algorithm::AlphaBeta)]
    algorithm: Algorithm,

    /// Random opening moves made by smart players
    #[arg(long, default_value_t = 1)]
    opening: usize,

    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Puzzle(args) => run_puzzle(args),
        Command::Game(args) => run_game(args),
    }
}

fn run_puzzle(args: PuzzleArgs) -> Result<()> {
    let start = match (&args.config, args.size) {
        (Some(path), _) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let config: PuzzleConfig = serde_json::from_str(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            config.build()?
        }
        (None, Some(size)) => {
            let mut puzzle = PuzzleConfig::numbered(size).build()?;
            puzzle.scramble(&mut StdRng::seed_from_u64(args.seed), args.scramble);
            puzzle
        }
        (None, None) => PuzzleConfig::blocksworld().build()?,
    };

    println!("{}\n{}", "Start:".bold(), start);
    if start.is_solvable() == Some(false) {
        println!("{}", "Parity check: goal is unreachable".yellow());
    }

    let mut limits = SearchLimits::default();
    limits.depth_limit = args.depth_limit;
    limits.max_iterations = args.max_iterations;
    let solver = Solver::new(limits);

    let strategies = if args.strategies.is_empty() {
        Strategy::ALL.to_vec()
    } else {
        args.strategies
    };

    for strategy in strategies {
        println!("{}", strategy.description().bold().cyan());
        let result = solver.search(&start, strategy);
        for line in result.to_string().lines() {
            println!("     {line}");
        }
        if args.show_path && result.is_successful() {
            let path: Vec<String> = result.path.iter().map(|m| m.to_string()).collect();
            println!("     Path - {}", path.join(" "));
        }
        println!();
    }
    Ok(())
}

fn make_player(choice: PlayerChoice, args: &GameArgs, seed: u64) -> Player {
    match choice {
        PlayerChoice::Random => Player::new(PlayerKind::Random, seed),
        PlayerChoice::Smart => {
            Player::searching(args.algorithm, seed).with_opening_random_moves(args.opening)
        }
    }
}

fn run_game(args: GameArgs) -> Result<()> {
    let mut x = make_player(args.x, &args, args.seed);
    let mut o = make_player(args.o, &args, args.seed.wrapping_add(1));
    let record = play_game(&mut x, &mut o, Board::new())?;

    let mut board = Board::new();
    println!("{board}");
    for mv in &record.moves {
        let side = board.side_to_move();
        board.play(*mv)?;
        println!("{} chooses {mv}\n", side.to_string().bold());
        println!("{board}");
    }

    match record.status {
        GameStatus::Win(side) => println!("{}", format!("{side} wins!").green().bold()),
        GameStatus::Tie => println!("{}", "Tie game.".yellow()),
        GameStatus::InProgress => {}
    }
    Ok(())
}
