use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use rustc_hash::FxHasher;

use crate::board::{Board, CELLS, COLUMNS};
use crate::card::{Card, Foundations, Suit};
use crate::column::Column;
use crate::config::Weights;
use crate::error::InvariantError;

const DELIMITER: u8 = 0xFF;

/// Canonical identity of a board: its packed bytes and their 64-bit hash. Level and priority
/// play no part in equality.
///
/// Byte layout: 4 swap cells (sorted, padded with the none code), 4 foundation cards, then
/// the sorted cascades, exposed card first, each followed by `0xFF` except the last.
#[derive(Clone, Debug)]
pub struct PackedKey {
    hash: u64,
    bytes: Rc<[u8]>,
}

impl PackedKey {
    pub fn hash_value(&self) -> u64 {
        self.hash
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl PartialEq for PackedKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.bytes == other.bytes
    }
}

impl Eq for PackedKey {}

impl Hash for PackedKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

/// A packed board together with the values the search orders and prunes by.
#[derive(Clone, Debug)]
pub struct PackedState {
    pub key: PackedKey,
    pub level: u32,
    pub priority: i64,
    pub minimum_solution_cost: u32,
    pub completeness: u32,
}

impl PackedState {
    pub fn pack(board: &Board, weights: &Weights) -> Self {
        let mut canonical = board.clone();
        canonical.canonicalize();

        let mut bytes = Vec::with_capacity(2 * CELLS + 52 + COLUMNS);
        bytes.extend(canonical.cells().iter().map(|card| card.code()));
        bytes.resize(CELLS, Card::NONE_CODE);
        bytes.extend(canonical.foundations().codes());
        for (index, column) in canonical.columns().iter().enumerate() {
            bytes.extend(column.bottom_up().iter().rev().map(|card| card.code()));
            if index + 1 < COLUMNS {
                bytes.push(DELIMITER);
            }
        }

        let mut hasher = FxHasher::default();
        hasher.write(&bytes);

        Self {
            key: PackedKey {
                hash: hasher.finish(),
                bytes: bytes.into(),
            },
            level: board.level(),
            priority: board.priority(weights),
            minimum_solution_cost: board.minimum_solution_cost(),
            completeness: board.completeness(),
        }
    }

    pub fn unpack(&self) -> Result<Board, InvariantError> {
        let bytes = self.key.bytes();
        if bytes.len() < 2 * CELLS {
            return Err(InvariantError::CorruptPacking(format!(
                "{} bytes is too short",
                bytes.len()
            )));
        }
        let decode = |code: u8| {
            Card::from_code(code)
                .ok_or_else(|| InvariantError::CorruptPacking(format!("byte {:#04x}", code)))
        };

        let cells = bytes[..CELLS]
            .iter()
            .filter(|&&code| code != Card::NONE_CODE)
            .map(|&code| decode(code))
            .collect::<Result<Vec<_>, _>>()?;

        let mut ranks = [0; 4];
        for (index, &code) in bytes[CELLS..2 * CELLS].iter().enumerate() {
            if code != Card::NONE_CODE {
                let card = decode(code)?;
                if card.suit() != Suit::ALL[index] {
                    return Err(InvariantError::CorruptPacking(format!(
                        "{} in foundation {}",
                        card, index
                    )));
                }
                ranks[index] = card.rank();
            }
        }

        let mut columns: [Column; COLUMNS] = Default::default();
        let mut segments = bytes[2 * CELLS..].split(|&byte| byte == DELIMITER);
        for column in columns.iter_mut() {
            let segment = segments.next().ok_or_else(|| {
                InvariantError::CorruptPacking("missing cascade".to_string())
            })?;
            let cards = segment
                .iter()
                .rev()
                .map(|&code| decode(code))
                .collect::<Result<Vec<_>, _>>()?;
            *column = Column::from_bottom_up(cards);
        }
        if segments.next().is_some() {
            return Err(InvariantError::CorruptPacking(
                "too many cascades".to_string(),
            ));
        }

        Ok(Board::from_parts(
            cells,
            Foundations::from_ranks(ranks)
                .map_err(|err| InvariantError::CorruptPacking(err.to_string()))?,
            columns,
            self.level,
        ))
    }

    pub fn is_solved(&self) -> bool {
        self.completeness == 52
    }
}

/// Queue order: priority, then hash, then the packed bytes, then level.
impl Ord for PackedState {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| self.key.hash.cmp(&other.key.hash))
            .then_with(|| self.key.bytes.cmp(&other.key.bytes))
            .then_with(|| self.level.cmp(&other.level))
    }
}

impl PartialOrd for PackedState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PackedState {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackedState {}
