use std::fs;
use std::io::{stdin, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use clap::Parser;
use crossbeam_channel::{unbounded, Receiver};
use rand::{rngs::StdRng, thread_rng, SeedableRng};
use tracing::{info, Level};
use tracing_subscriber::prelude::*;

use freecell_solver::{deal, Board, Solver, SolverCommand, SolverConfig, SolverError, Termination};

/// Find the shortest solution of a FreeCell deal.
///
/// Type `s` and press enter while the search runs to stop it and keep the best solution so far.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Microsoft FreeCell game number to solve
    #[arg(short, long, conflicts_with_all = ["infile", "seed"])]
    game: Option<u32>,

    /// File containing the board to solve
    #[arg(short, long, conflicts_with = "seed")]
    infile: Option<PathBuf>,

    /// Seed to use when generating a random board
    #[arg(short, long)]
    seed: Option<u64>,

    /// Where to save the board before solving it
    #[arg(short, long)]
    outfile: Option<PathBuf>,

    /// YAML file with the search weights and limits
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lower bound slack; anything above 0 trades optimality for speed
    #[arg(short, long)]
    relaxation: Option<u32>,

    /// Stop after expanding this many boards
    #[arg(short, long)]
    max_iterations: Option<u64>,

    /// More output per occurrence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(level))
        .init();
}

/// Sends a stop command once `s` is entered on stdin.
fn stop_on_keypress() -> Receiver<SolverCommand> {
    let (sender, receiver) = unbounded();
    thread::spawn(move || {
        for line in stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().eq_ignore_ascii_case("s") {
                let _ = sender.send(SolverCommand::Stop);
                break;
            }
        }
    });
    receiver
}

fn load_board(args: &Args) -> Result<Board, SolverError> {
    let board = match (args.game, &args.infile, args.seed) {
        (Some(game), _, _) => deal::microsoft(game),
        (None, Some(path), _) => Board::parse(&fs::read_to_string(path)?)?,
        (None, None, Some(seed)) => deal::random(&mut StdRng::seed_from_u64(seed)),
        (None, None, None) => deal::random(&mut thread_rng()),
    };
    Ok(board)
}

fn run(args: Args) -> Result<(), SolverError> {
    let mut config = match &args.config {
        Some(path) => SolverConfig::load(path)?,
        None => SolverConfig::default(),
    };
    if let Some(relaxation) = args.relaxation {
        config.relaxation = relaxation;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }

    let board = load_board(&args)?;
    if let Some(path) = &args.outfile {
        fs::write(path, format!("{}\n", board))?;
    }

    let weights = config.weights;
    let exact = config.relaxation == 0;
    let report = Solver::new(config)
        .with_cancellation(stop_on_keypress())
        .solve(&board)?;

    match &report.solution {
        Some(solution) => {
            println!("{}", solution.report(&weights));
            let proven = exact && report.termination == Termination::Exhausted;
            println!(
                "Solved in {} moves{}.",
                solution.level,
                if proven { " (optimal)" } else { "" }
            );
        }
        None => println!(
            "{}",
            match report.termination {
                Termination::Exhausted => "No solution exists within the search bound.",
                Termination::IterationCap => "No solution found within the iteration budget.",
                Termination::Cancelled => "Stopped before a solution was found.",
            }
        ),
    }
    info!(
        elapsed = ?report.statistics.elapsed(),
        processed = report.statistics.processed,
        pruned = report.statistics.pruned,
        improved = report.statistics.improved,
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
