//! Move representation and generation.
//!
//! | From      | To         | Sequence | Pop source | Pop target | Family                 |
//! |-----------|------------|----------|------------|------------|------------------------|
//! | SwapCell  | Foundation | 1        | -          | -          | `cells_to_foundations` |
//! | Cascade   | Foundation | 1        | n          | -          | `columns_to_foundations` |
//! | SwapCell  | Cascade    | 1        | -          | n          | `cells_to_columns`     |
//! | Cascade   | Cascade    | n        | n          | n          | `between_columns`      |
//!
//! Moving a card from a cascade into a swap cell is never a move of its own: it only happens
//! as a pop in front of one of the moves above.

use std::fmt::{self, Display};

use crate::board::{Board, COLUMNS};
use crate::card::{max_supermove_size, Card};
use crate::column::Column;

/// Where a move takes its card(s) from.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Source {
    Cell(Card),
    /// `pops` exposed cards go to the swap cells before the transfer.
    Column { index: usize, pops: usize },
}

/// Where a move puts its card(s).
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Target {
    Foundation,
    Column { index: usize, pops: usize },
}

impl Source {
    pub fn pops(self) -> usize {
        match self {
            Source::Cell(_) => 0,
            Source::Column { pops, .. } => pops,
        }
    }
}

impl Target {
    pub fn pops(self) -> usize {
        match self {
            Target::Foundation => 0,
            Target::Column { pops, .. } => pops,
        }
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Move {
    pub source: Source,
    pub target: Target,
    /// Cards transferred; only above 1 for cascade to cascade moves.
    pub sequence_length: usize,
}

impl Move {
    pub fn new(source: Source, target: Target, sequence_length: usize) -> Self {
        Self {
            source,
            target,
            sequence_length,
        }
    }

    /// Levels this move costs when a player makes it: the transfer plus every pop.
    pub fn level_increment(&self) -> u32 {
        (1 + self.source.pops() + self.target.pops()) as u32
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[PopSrc:{}, PopTgt:{}] Move ",
            self.source.pops(),
            self.target.pops()
        )?;
        match self.source {
            Source::Cell(card) => write!(f, "card {} from SwapCell", card)?,
            Source::Column { index, .. } => write!(
                f,
                "{} card{} from Cascade {}",
                self.sequence_length,
                if self.sequence_length > 1 { "s" } else { "" },
                index
            )?,
        }
        match self.target {
            Target::Foundation => write!(f, " to Foundation."),
            Target::Column { index, .. } => write!(f, " to Cascade {}.", index),
        }
    }
}

/// One human readable line of a solution, with the number of player moves it stands for.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct MoveDescription {
    pub increment: u32,
    pub text: String,
}

/// Collects descriptions of the transfers made while applying moves.
#[derive(Default, Clone, Debug)]
pub struct Journal {
    entries: Vec<MoveDescription>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[MoveDescription] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<MoveDescription> {
        self.entries
    }

    fn log(&mut self, increment: u32, text: String) {
        self.entries.push(MoveDescription { increment, text });
    }

    pub(crate) fn cascade_to_cells(&mut self, index: usize, column: &Column, count: usize) {
        let cards = card_list(&column.top_cards(count));
        if count == 1 {
            self.log(
                1,
                format!(
                    "Move the card \"{}\" from cascade {} to a swap cell.",
                    cards,
                    index + 1
                ),
            );
        } else {
            self.log(
                count as u32,
                format!(
                    "Move the {} cards \"{}\" from cascade {} to the swap cells.",
                    count,
                    cards,
                    index + 1
                ),
            );
        }
    }

    pub(crate) fn cascade_to_cascade(&mut self, from: usize, column: &Column, count: usize, to: usize) {
        let cards = card_list(&column.top_cards(count));
        let text = if count == 1 {
            format!(
                "Move the card \"{}\" from cascade {} to cascade {}.",
                cards,
                from + 1,
                to + 1
            )
        } else {
            format!(
                "Move the {} cards \"{}\" from cascade {} to cascade {}.",
                count,
                cards,
                from + 1,
                to + 1
            )
        };
        self.log(1, text);
    }

    pub(crate) fn between_areas(&mut self, card: Card, source: Source, target: Target, automatic: bool) {
        let from = match source {
            Source::Cell(_) => "swap cell".to_string(),
            Source::Column { index, .. } => format!("cascade {}", index + 1),
        };
        let to = match target {
            Target::Foundation => "its foundation".to_string(),
            Target::Column { index, .. } => format!("cascade {}", index + 1),
        };
        self.log(
            if automatic { 0 } else { 1 },
            format!(
                "Move the card \"{}\" from {} to {}.{}",
                card,
                from,
                to,
                if automatic { " (*)" } else { "" }
            ),
        );
    }
}

fn card_list(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|card| card.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Board {
    /// Every legal move from this board.
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.cells_to_foundations(&mut moves);
        self.columns_to_foundations(&mut moves, self.free_cells());
        self.cells_to_columns(&mut moves);
        self.between_columns(&mut moves);
        moves
    }

    /// The first foundation move that needs no pops and is safe, if any.
    pub fn safe_foundation_move(&self) -> Option<Move> {
        let mut moves = Vec::new();
        self.cells_to_foundations(&mut moves);
        self.columns_to_foundations(&mut moves, 0);

        moves.into_iter().find(|mv| {
            let card = match mv.source {
                Source::Cell(card) => Some(card),
                Source::Column { index, .. } => self.columns()[index].top(),
            };
            card.is_some_and(|card| self.foundations().is_safe_to_place(card))
        })
    }

    fn cells_to_foundations(&self, moves: &mut Vec<Move>) {
        for &card in self.cells() {
            if self.foundations().accepts(card) {
                moves.push(Move::new(Source::Cell(card), Target::Foundation, 1));
            }
        }
    }

    /// Pops never empty the column: at least the card that goes home stays.
    fn columns_to_foundations(&self, moves: &mut Vec<Move>, max_pops: usize) {
        for (index, column) in self.columns().iter().enumerate() {
            if column.is_empty() {
                continue;
            }
            for pops in 0..=max_pops.min(column.len() - 1) {
                if let Some(card) = column.card_at_depth(pops) {
                    if self.foundations().accepts(card) {
                        moves.push(Move::new(
                            Source::Column { index, pops },
                            Target::Foundation,
                            1,
                        ));
                    }
                }
            }
        }
    }

    fn cells_to_columns(&self, moves: &mut Vec<Move>) {
        let free = self.free_cells();
        for &card in self.cells() {
            for (index, column) in self.columns().iter().enumerate() {
                for pops in 0..=free.min(column.len()) {
                    let fits = match column.card_at_depth(pops) {
                        None => true,
                        Some(top) => top.can_build_cascade(card),
                    };
                    if fits {
                        moves.push(Move::new(
                            Source::Cell(card),
                            Target::Column { index, pops },
                            1,
                        ));
                    }
                }
            }
        }
    }

    fn between_columns(&self, moves: &mut Vec<Move>) {
        let free = self.free_cells();
        let empty = self.empty_columns();

        for (from, source) in self.columns().iter().enumerate() {
            if source.is_empty() {
                continue;
            }
            for source_pops in 0..=free.min(source.len() - 1) {
                let cells_left = free - source_pops;
                let run = source.sequence_length(source_pops);

                for to in (0..COLUMNS).filter(|&to| to != from) {
                    let target = &self.columns()[to];
                    for target_pops in 0..=cells_left.min(target.len()) {
                        // the target never counts as an empty column for its own supermove,
                        // even when popping empties it
                        let others_empty = empty - usize::from(target.is_empty());
                        let max_length = if run > 1 {
                            max_supermove_size(cells_left - target_pops, others_empty).min(run)
                        } else {
                            1
                        };

                        let source_loc = Source::Column {
                            index: from,
                            pops: source_pops,
                        };
                        let target_loc = Target::Column {
                            index: to,
                            pops: target_pops,
                        };
                        match target.card_at_depth(target_pops) {
                            Some(top) => {
                                // within a run at most one length fits
                                let fitting = (1..=max_length).rev().find(|&length| {
                                    source
                                        .card_at_depth(source_pops + length - 1)
                                        .is_some_and(|card| top.can_build_cascade(card))
                                });
                                if let Some(length) = fitting {
                                    moves.push(Move::new(source_loc, target_loc, length));
                                }
                            }
                            None => {
                                for length in (1..=max_length).rev() {
                                    moves.push(Move::new(source_loc, target_loc, length));
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::{board, card};

    #[test]
    fn level_increment_counts_pops() {
        let mv = Move::new(
            Source::Column { index: 0, pops: 2 },
            Target::Column { index: 3, pops: 1 },
            1,
        );
        assert_eq!(mv.level_increment(), 4);
        assert_eq!(
            Move::new(Source::Cell(card("hA")), Target::Foundation, 1).level_increment(),
            1
        );
    }

    #[test]
    fn display() {
        let mv = Move::new(
            Source::Column { index: 2, pops: 1 },
            Target::Column { index: 5, pops: 0 },
            3,
        );
        assert_eq!(
            mv.to_string(),
            "[PopSrc:1, PopTgt:0] Move 3 cards from Cascade 2 to Cascade 5."
        );
        let mv = Move::new(Source::Cell(card("dQ")), Target::Foundation, 1);
        assert_eq!(
            mv.to_string(),
            "[PopSrc:0, PopTgt:0] Move card dQ from SwapCell to Foundation."
        );
    }

    #[test]
    fn foundation_moves_with_pops() {
        // hA is buried under two cards, the column is never popped empty
        let b = board([0, 0, 0, 0], "", &["hA s9 d4", "cA"]);
        let moves = b.legal_moves();
        assert!(moves.contains(&Move::new(
            Source::Column { index: 0, pops: 2 },
            Target::Foundation,
            1
        )));
        assert!(moves.contains(&Move::new(
            Source::Column { index: 1, pops: 0 },
            Target::Foundation,
            1
        )));
        assert!(!moves
            .iter()
            .any(|mv| mv.source == Source::Column { index: 1, pops: 1 }));
    }

    #[test]
    fn cell_to_column_moves() {
        let b = board([0, 0, 0, 0], "h8", &["s9", "c9 d2"]);
        let moves: Vec<_> = b
            .legal_moves()
            .into_iter()
            .filter(|mv| mv.source == Source::Cell(card("h8")))
            .collect();
        // onto s9, onto c9 after popping d2, into six empty columns, into column 0 after
        // popping it empty, into column 1 after popping both cards
        assert!(moves.contains(&Move::new(
            Source::Cell(card("h8")),
            Target::Column { index: 0, pops: 0 },
            1
        )));
        assert!(moves.contains(&Move::new(
            Source::Cell(card("h8")),
            Target::Column { index: 1, pops: 1 },
            1
        )));
        assert!(moves.contains(&Move::new(
            Source::Cell(card("h8")),
            Target::Column { index: 0, pops: 1 },
            1
        )));
        assert!(moves.contains(&Move::new(
            Source::Cell(card("h8")),
            Target::Column { index: 1, pops: 2 },
            1
        )));
        assert!(!moves.contains(&Move::new(
            Source::Cell(card("h8")),
            Target::Column { index: 1, pops: 0 },
            1
        )));
        assert_eq!(moves.len(), 4 + 6);
    }

    #[test]
    fn supermove_onto_a_card_picks_the_single_fitting_length() {
        // run hJ sT h9 s8 on top of c2, target top is sQ
        let b = board(
            [0, 0, 0, 0],
            "c4 c5 c6 c7",
            &["c2 hJ sT h9 s8", "sQ", "d3", "d5", "d6", "d7", "d8", "d9"],
        );
        let moves: Vec<_> = b
            .legal_moves()
            .into_iter()
            .filter(|mv| {
                mv.source == Source::Column { index: 0, pops: 0 }
                    && mv.target == Target::Column { index: 1, pops: 0 }
            })
            .collect();
        // no free cells and no empty columns: a single card only, which does not fit
        assert!(moves.is_empty());

        let b = board(
            [0, 0, 0, 0],
            "c4",
            &["c2 hJ sT h9 s8", "sQ", "d3", "d5", "d6", "d7", "d8"],
        );
        let moves: Vec<_> = b
            .legal_moves()
            .into_iter()
            .filter(|mv| {
                mv.source == Source::Column { index: 0, pops: 0 }
                    && mv.target == Target::Column { index: 1, pops: 0 }
            })
            .collect();
        // 3 free cells and one empty column: up to 8 cards, the whole run of 4 fits
        assert_eq!(moves, vec![Move::new(
            Source::Column { index: 0, pops: 0 },
            Target::Column { index: 1, pops: 0 },
            4
        )]);
    }

    #[test]
    fn empty_target_accepts_every_length() {
        let b = board(
            [0, 0, 0, 0],
            "c4 c5 c6",
            &["c2 hJ sT h9 s8", "sQ", "d3", "d5", "d6", "d7", "d8"],
        );
        let lengths: Vec<_> = b
            .legal_moves()
            .into_iter()
            .filter(|mv| {
                mv.source == Source::Column { index: 0, pops: 0 }
                    && mv.target == Target::Column { index: 7, pops: 0 }
            })
            .map(|mv| mv.sequence_length)
            .collect();
        // one free cell; the empty target doesn't count for its own supermove
        assert_eq!(lengths, vec![2, 1]);
    }

    #[test]
    fn target_popped_empty_is_not_an_empty_column() {
        let lengths = |columns: &[&str]| -> Vec<usize> {
            board([0, 0, 0, 0], "c4 c5 c6", columns)
                .legal_moves()
                .into_iter()
                .filter(|mv| {
                    mv.source == Source::Column { index: 0, pops: 0 }
                        && mv.target == Target::Column { index: 1, pops: 1 }
                })
                .map(|mv| mv.sequence_length)
                .collect()
        };
        // d3 goes to the last free cell: no cells left and no other empty column
        assert_eq!(
            lengths(&["c2 hJ sT h9", "d3", "d5", "d6", "d7", "d8", "d9", "c3"]),
            vec![1]
        );
        // a genuinely empty column elsewhere doubles it
        assert_eq!(
            lengths(&["c2 hJ sT h9", "d3", "d5", "d6", "d7", "d8", "d9"]),
            vec![2, 1]
        );
    }

    #[test]
    fn safe_foundation_move_needs_no_pops() {
        let b = board([0, 0, 0, 0], "", &["hA s9"]);
        assert_eq!(b.safe_foundation_move(), None);
        let b = board([2, 0, 0, 0], "", &["h3", "sA"]);
        assert_eq!(
            b.safe_foundation_move(),
            Some(Move::new(
                Source::Column { index: 1, pops: 0 },
                Target::Foundation,
                1
            ))
        );
    }
}
