use rustc_hash::FxHashSet;

use crate::card::{Card, Foundations, Suit, ACE};
use crate::column::Column;
use crate::config::Weights;
use crate::error::{DealError, InvariantError};
use crate::moves::{Journal, Move, Source, Target};

pub const COLUMNS: usize = 8;
pub const CELLS: usize = 4;

/// A position in the game: swap cells, foundations, the eight cascades, and the number of
/// player moves (`level`) it took to get here.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Board {
    cells: Vec<Card>,
    foundations: Foundations,
    columns: [Column; COLUMNS],
    level: u32,
}

impl Board {
    /// Builds a board as given, without validating or normalizing it.
    pub fn from_parts(
        cells: Vec<Card>,
        foundations: Foundations,
        columns: [Column; COLUMNS],
        level: u32,
    ) -> Self {
        Self {
            cells,
            foundations,
            columns,
            level,
        }
    }

    pub fn cells(&self) -> &[Card] {
        &self.cells
    }

    pub fn foundations(&self) -> &Foundations {
        &self.foundations
    }

    pub fn columns(&self) -> &[Column; COLUMNS] {
        &self.columns
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn free_cells(&self) -> usize {
        CELLS - self.cells.len()
    }

    pub fn empty_columns(&self) -> usize {
        self.columns.iter().filter(|column| column.is_empty()).count()
    }

    /// Adjacent pairs over all cascades that already form a valid build.
    pub fn consecutiveness(&self) -> u32 {
        self.columns.iter().map(Column::consecutiveness).sum()
    }

    /// Cards on the foundations, 0..=52.
    pub fn completeness(&self) -> u32 {
        self.foundations.completeness()
    }

    /// Free cells plus empty cascades, 0..=12.
    pub fn availability(&self) -> u32 {
        (self.free_cells() + self.empty_columns()) as u32
    }

    /// Admissible lower bound on the levels still needed to clear every cascade.
    pub fn minimum_solution_cost(&self) -> u32 {
        self.columns
            .iter()
            .map(|column| column.minimum_solution_cost(&self.foundations))
            .sum()
    }

    pub fn priority(&self, weights: &Weights) -> i64 {
        weights.priority(
            self.level,
            self.consecutiveness(),
            self.completeness(),
            self.availability(),
        )
    }

    pub fn is_solved(&self) -> bool {
        self.completeness() == 52
    }

    /// Applies every available safe foundation move. Safe moves are free: the level is left
    /// untouched.
    pub fn normalize(mut self, mut journal: Option<&mut Journal>) -> Result<Self, InvariantError> {
        while let Some(safe) = self.safe_foundation_move() {
            self.apply_move(&safe, journal.as_deref_mut(), false)?;
        }
        Ok(self)
    }

    /// Clones this board, plays `mv` on the copy and normalizes the result.
    pub fn child(&self, mv: &Move, mut journal: Option<&mut Journal>) -> Result<Self, InvariantError> {
        let mut child = self.clone();
        child.apply_move(mv, journal.as_deref_mut(), true)?;
        child.normalize(journal)
    }

    /// Plays `mv`: first the pops into the swap cells, then the transfer itself. Player moves
    /// add the move's level increment, safe moves don't.
    pub fn apply_move(
        &mut self,
        mv: &Move,
        mut journal: Option<&mut Journal>,
        player: bool,
    ) -> Result<(), InvariantError> {
        if let Source::Column { index, pops } = mv.source {
            self.pop_to_cells(index, pops, journal.as_deref_mut())?;
        }
        if let Target::Column { index, pops } = mv.target {
            self.pop_to_cells(index, pops, journal.as_deref_mut())?;
        }

        match (mv.source, mv.target) {
            (Source::Column { index: from, .. }, Target::Column { index: to, .. }) => {
                if let Some(journal) = journal.as_deref_mut() {
                    journal.cascade_to_cascade(from, &self.columns[from], mv.sequence_length, to);
                }
                self.move_sequence(from, to, mv.sequence_length)?;
            }
            (source, target) => {
                let card = self.peek_card(source)?;
                self.check_target(card, target)?;
                if let Some(journal) = journal.as_deref_mut() {
                    journal.between_areas(card, source, target, !player);
                }
                self.take_card(source, card);
                match target {
                    Target::Foundation => self.foundations.place(card)?,
                    Target::Column { index, .. } => self.columns[index].push(card),
                }
            }
        }

        if player {
            self.level += mv.level_increment();
        }
        Ok(())
    }

    fn pop_to_cells(
        &mut self,
        column: usize,
        count: usize,
        journal: Option<&mut Journal>,
    ) -> Result<(), InvariantError> {
        if count == 0 {
            return Ok(());
        }
        if let Some(journal) = journal {
            journal.cascade_to_cells(column, &self.columns[column], count);
        }
        for _ in 0..count {
            let card = self.columns[column]
                .pop()
                .ok_or(InvariantError::EmptySource(column))?;
            self.push_cell(card)?;
        }
        Ok(())
    }

    fn push_cell(&mut self, card: Card) -> Result<(), InvariantError> {
        if self.cells.len() >= CELLS {
            return Err(InvariantError::CellsFull(card));
        }
        self.cells.push(card);
        Ok(())
    }

    fn move_sequence(&mut self, from: usize, to: usize, count: usize) -> Result<(), InvariantError> {
        let available = self.columns[from].sequence_length(0);
        if available == 0 {
            return Err(InvariantError::EmptySource(from));
        }
        if count > available || count == 0 {
            return Err(InvariantError::SequenceTooLong {
                column: from,
                requested: count,
                available,
            });
        }
        if let (Some(top), Some(lowest)) = (
            self.columns[to].top(),
            self.columns[from].card_at_depth(count - 1),
        ) {
            if !top.can_build_cascade(lowest) {
                return Err(InvariantError::IllegalCascade {
                    card: lowest,
                    top,
                    column: to,
                });
            }
        }

        let mut cards = self.columns[from].split_top(count);
        self.columns[to].append(&mut cards);
        Ok(())
    }

    fn peek_card(&self, source: Source) -> Result<Card, InvariantError> {
        match source {
            Source::Column { index, .. } => self.columns[index]
                .top()
                .ok_or(InvariantError::EmptySource(index)),
            Source::Cell(card) if self.cells.contains(&card) => Ok(card),
            Source::Cell(card) => Err(InvariantError::CardNotInCells(card)),
        }
    }

    fn check_target(&self, card: Card, target: Target) -> Result<(), InvariantError> {
        match target {
            Target::Foundation if self.foundations.accepts(card) => Ok(()),
            Target::Foundation => Err(InvariantError::IllegalFoundation {
                card,
                top: Card::slot_string(self.foundations.top(card.suit())),
            }),
            Target::Column { index, .. } => match self.columns[index].top() {
                Some(top) if !top.can_build_cascade(card) => Err(InvariantError::IllegalCascade {
                    card,
                    top,
                    column: index,
                }),
                _ => Ok(()),
            },
        }
    }

    /// Removes `card`, already checked by `peek_card`, from `source`.
    fn take_card(&mut self, source: Source, card: Card) {
        match source {
            Source::Column { index, .. } => {
                self.columns[index].pop();
            }
            Source::Cell(_) => self.cells.retain(|&held| held != card),
        }
    }

    /// Sorts the swap cells and the cascades so that boards differing only in cell or cascade
    /// order become identical.
    pub fn canonicalize(&mut self) {
        self.cells.sort();
        self.columns.sort_by(Column::canonical_cmp);
    }

    /// Checks that every card of the deck is present exactly once, counting the cards implied
    /// by the foundations.
    pub fn validate(&self) -> Result<(), DealError> {
        if self.cells.len() > CELLS {
            return Err(DealError::TooManyCells(self.cells.len()));
        }

        let mut used = FxHashSet::default();
        for suit in Suit::ALL {
            for rank in ACE..=self.foundations.rank(suit) {
                used.insert(Card::new(suit, rank));
            }
        }

        let mut mark = |card: Card, location: String| {
            if used.insert(card) {
                Ok(())
            } else {
                Err(DealError::DuplicateCard { card, location })
            }
        };
        for (index, &card) in self.cells.iter().enumerate() {
            mark(card, format!("swap cell {}", index + 1))?;
        }
        for (index, column) in self.columns.iter().enumerate() {
            for &card in column.bottom_up() {
                mark(card, format!("cascade {}", index + 1))?;
            }
        }

        match Card::deck().find(|card| !used.contains(card)) {
            Some(missing) => Err(DealError::MissingCard(missing)),
            None => Ok(()),
        }
    }
}
