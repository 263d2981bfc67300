//! An optimal FreeCell solver: best-first branch-and-bound over canonically packed boards,
//! followed by a replay that turns the winning path into readable moves.

pub mod board;
pub mod card;
pub mod column;
pub mod config;
pub mod deal;
pub mod error;
pub mod moves;
pub mod packed;
pub mod queue;
pub mod reconstruct;
pub mod search;
pub mod stats;
pub mod text;

pub use board::Board;
pub use card::{Card, Suit};
pub use config::{SolverConfig, Weights};
pub use error::{ConfigError, DealError, InvariantError, SolverError};
pub use moves::{Move, MoveDescription};
pub use reconstruct::Solution;
pub use search::{
    Cancellation, LogObserver, Never, SearchObserver, Silent, SolveReport, Solver, SolverCommand,
    Termination,
};
pub use stats::Statistics;
