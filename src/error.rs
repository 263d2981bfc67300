use thiserror::Error;

use crate::card::Card;

/// Problems with a deal, detected before any search starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DealError {
    #[error("invalid card text {text:?} at {location}")]
    BadCard { text: String, location: String },

    #[error("malformed layout: {0}")]
    MalformedLayout(String),

    #[error("cascade {column} has an empty slot at row {row} below other cards")]
    NoneInColumn { column: usize, row: usize },

    #[error("the card {card} is used more than once (seen again in {location})")]
    DuplicateCard { card: Card, location: String },

    #[error("the card {0} is not used")]
    MissingCard(Card),

    #[error("foundation {index} holds {card}, expected a {expected} card")]
    FoundationSuit {
        index: usize,
        card: Card,
        expected: char,
    },

    #[error("foundation {index} holds rank {rank}, above the king")]
    FoundationRank { index: usize, rank: u8 },

    #[error("{0} cards in the swap cells, at most 4 are allowed")]
    TooManyCells(usize),
}

/// Broken board invariants. These are programming errors in move generation and are never
/// recovered from.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantError {
    #[error("the card {0} is not stored in the swap cells")]
    CardNotInCells(Card),

    #[error("cannot append {0} to the swap cells, all 4 are in use")]
    CellsFull(Card),

    #[error("cannot take a card from cascade {0}, which is empty")]
    EmptySource(usize),

    #[error("cannot put {card} on the foundation holding {top}")]
    IllegalFoundation { card: Card, top: String },

    #[error("cannot put the sequence ending on {card} onto {top} in cascade {column}")]
    IllegalCascade { card: Card, top: Card, column: usize },

    #[error("cascade {column} only has a sequence of {available} cards, {requested} requested")]
    SequenceTooLong {
        column: usize,
        requested: usize,
        available: usize,
    },

    #[error("packed state is corrupt: {0}")]
    CorruptPacking(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("could not parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("config is missing required setting {0:?}")]
    Missing(&'static str),

    #[error("setting {name:?} must be {requirement}, got {value}")]
    OutOfRange {
        name: &'static str,
        requirement: &'static str,
        value: i64,
    },
}

/// Errors surfaced by the solver as a whole.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("invalid deal: {0}")]
    InvalidDeal(#[from] DealError),

    #[error("internal invariant violated: {0}")]
    Invariant(#[from] InvariantError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}
