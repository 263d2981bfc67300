//! Fixed width text layout of a board.
//!
//! ```text
//! (c4)(cK)(sT)(..)<h2><s2><d3><cA>
//!  s3  sK  h6  hT  sQ  c8  s9  d9
//!  c3  hQ      dT  sJ  d7  d8  s8
//!  hJ          cJ  cT  c6  s7  h7
//! ```
//!
//! The first line holds the four swap cells and the four foundations (hearts, spades, diamonds,
//! clubs). Every following line is one row of the eight cascades, 4 characters per cascade with
//! the card in the middle two. The first row holds the most deeply buried cards, the last row
//! the exposed ones.

use std::fmt::{self, Display};

use crate::board::{Board, CELLS, COLUMNS};
use crate::card::{Card, Foundations, Suit};
use crate::column::Column;
use crate::config::Weights;
use crate::error::DealError;

const HEADER_WIDTH: usize = 32;

/// A short line leaves the slot empty. A slot that splits a multibyte character is a bad card.
fn parse_slot(line: &str, index: usize, location: impl FnOnce() -> String) -> Result<Option<Card>, DealError> {
    let range = index * 4 + 1..index * 4 + 3;
    let text = match line.get(range.clone()) {
        Some(text) => text,
        None if line.len() < range.end && line.is_char_boundary(range.start.min(line.len())) => "..",
        None => {
            let bytes = &line.as_bytes()[range.start.min(line.len())..range.end.min(line.len())];
            return Err(DealError::BadCard {
                text: String::from_utf8_lossy(bytes).into_owned(),
                location: location(),
            });
        }
    };
    Card::from_string(text).ok_or_else(|| DealError::BadCard {
        text: text.to_string(),
        location: location(),
    })
}

impl Board {
    /// Reads a board in the text layout and validates it. The result has level 0 and is not
    /// normalized.
    pub fn parse(text: &str) -> Result<Self, DealError> {
        let mut lines = text.lines();
        let header = lines.next().unwrap_or("").trim_end();
        if header.len() < HEADER_WIDTH || !header.starts_with('(') || !header.ends_with('>') {
            return Err(DealError::MalformedLayout(
                "the first line must hold the swap cells and the foundations".to_string(),
            ));
        }

        let mut cells = Vec::with_capacity(CELLS);
        for index in 0..CELLS {
            if let Some(card) = parse_slot(header, index, || format!("swap cell {}", index + 1))? {
                cells.push(card);
            }
        }

        let mut ranks = [0; 4];
        for (index, suit) in Suit::ALL.into_iter().enumerate() {
            let card = parse_slot(header, CELLS + index, || format!("foundation {}", index + 1))?;
            if let Some(card) = card {
                if card.suit() != suit {
                    return Err(DealError::FoundationSuit {
                        index,
                        card,
                        expected: suit.to_char(),
                    });
                }
                ranks[index] = card.rank();
            }
        }

        let rows: Vec<&str> = lines.collect();
        let mut columns: [Column; COLUMNS] = Default::default();
        for (index, column) in columns.iter_mut().enumerate() {
            let mut slots = Vec::with_capacity(rows.len());
            for (row, line) in rows.iter().enumerate() {
                slots.push(parse_slot(line, index, || {
                    format!("cascade {}, row {}", index + 1, row + 1)
                })?);
            }
            while let Some(None) = slots.last() {
                slots.pop();
            }

            let mut cards = Vec::with_capacity(slots.len());
            for (row, card) in slots.into_iter().enumerate() {
                let card = card.ok_or(DealError::NoneInColumn {
                    column: index + 1,
                    row: row + 1,
                })?;
                cards.push(card);
            }
            *column = Column::from_bottom_up(cards);
        }

        let board = Board::from_parts(cells, Foundations::from_ranks(ranks)?, columns, 0);
        board.validate()?;
        Ok(board)
    }

    /// The board with a two line header: level and the priority terms, then the priority.
    pub fn describe(&self, weights: &Weights) -> String {
        format!(
            "Lvl={:4} CSec={:2} Cmpl={:2} MnRq={:2}\n----- Priority = {:9} -----\n{}",
            self.level(),
            self.consecutiveness(),
            self.completeness(),
            self.minimum_solution_cost(),
            self.priority(weights),
            self
        )
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for index in 0..CELLS {
            write!(f, "({})", Card::slot_string(self.cells().get(index).copied()))?;
        }
        for suit in Suit::ALL {
            write!(f, "<{}>", Card::slot_string(self.foundations().top(suit)))?;
        }

        let height = self.columns().iter().map(Column::len).max().unwrap_or(0);
        for row in 0..height {
            let mut line = String::with_capacity(COLUMNS * 4);
            for column in self.columns() {
                let Some(&card) = column.bottom_up().get(row) else {
                    line.push_str("    ");
                    continue;
                };
                let run = column.sequence_length(0);
                let depth = column.len() - 1 - row;
                if run > 1 && depth < run {
                    line.push_str(&format!("[{}]", card));
                } else {
                    line.push_str(&format!(" {} ", card));
                }
            }
            write!(f, "\n{}", line.trim_end())?;
        }
        Ok(())
    }
}
