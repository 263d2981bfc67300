use std::fmt::{self, Display};

use crate::error::{DealError, InvariantError};

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub enum Suit {
    Heart,
    Spade,
    Diamond,
    Club,
}

impl Suit {
    /// Foundation order.
    pub const ALL: [Suit; 4] = [Suit::Heart, Suit::Spade, Suit::Diamond, Suit::Club];

    pub fn index(self) -> usize {
        match self {
            Suit::Heart => 0,
            Suit::Spade => 1,
            Suit::Diamond => 2,
            Suit::Club => 3,
        }
    }

    pub fn is_red(self) -> bool {
        matches!(self, Suit::Heart | Suit::Diamond)
    }

    pub fn to_char(self) -> char {
        match self {
            Suit::Heart => 'h',
            Suit::Spade => 's',
            Suit::Diamond => 'd',
            Suit::Club => 'c',
        }
    }

    pub fn from_char(ch: char) -> Option<Self> {
        match ch.to_ascii_lowercase() {
            'h' => Some(Suit::Heart),
            's' => Some(Suit::Spade),
            'd' => Some(Suit::Diamond),
            'c' => Some(Suit::Club),
            _ => None,
        }
    }

    fn code(self) -> u8 {
        (self.index() as u8 + 1) << 4
    }
}

impl Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

pub const ACE: u8 = 1;
pub const TWO: u8 = 2;
pub const KING: u8 = 13;

const RANK_CHARS: [char; 14] = [
    '.', 'A', '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K',
];

/// A playing card packed into one byte: the suit in the high nibble (Heart = 0x10, Spade =
/// 0x20, Diamond = 0x30, Club = 0x40) and the rank (1..=13) in the low nibble.
///
/// The byte `0x00` is the "none" code used for empty slots in packed states. A `Card` value
/// is never none; empty slots are `Option<Card>`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Card(u8);

impl Card {
    pub const NONE_CODE: u8 = 0x00;

    pub fn new(suit: Suit, rank: u8) -> Self {
        assert!((ACE..=KING).contains(&rank), "rank {} out of range", rank);
        Card(suit.code() | rank)
    }

    /// Decodes a packed byte. Returns `None` for the none code and for bytes that don't encode
    /// a card.
    pub fn from_code(code: u8) -> Option<Self> {
        let suit = code >> 4;
        let rank = code & 0x0F;
        if (1..=4).contains(&suit) && (ACE..=KING).contains(&rank) {
            Some(Card(code))
        } else {
            None
        }
    }

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn suit(self) -> Suit {
        Suit::ALL[((self.0 >> 4) - 1) as usize]
    }

    pub fn rank(self) -> u8 {
        self.0 & 0x0F
    }

    pub fn is_red(self) -> bool {
        self.suit().is_red()
    }

    /// Can `candidate` be put on top of `self` in a cascade: one rank lower, other color.
    pub fn can_build_cascade(self, candidate: Card) -> bool {
        self.rank() as i8 - candidate.rank() as i8 == 1 && self.is_red() != candidate.is_red()
    }

    /// Parses a two character slot such as `hK`, `sT` or `..`. `Some(None)` is an empty slot.
    pub fn from_string(s: &str) -> Option<Option<Self>> {
        let mut chs = s.chars();
        let suit_ch = chs.next()?;
        let rank_ch = chs.next()?;
        if chs.next().is_some() {
            return None;
        }
        let is_blank = |ch: char| ch == '.' || ch == ' ';
        match (is_blank(suit_ch), is_blank(rank_ch)) {
            (true, true) => Some(None),
            (false, false) => {
                let suit = Suit::from_char(suit_ch)?;
                let rank = RANK_CHARS
                    .iter()
                    .position(|&r| r == rank_ch.to_ascii_uppercase())
                    .filter(|&r| r > 0)?;
                Some(Some(Card::new(suit, rank as u8)))
            }
            _ => None,
        }
    }

    pub fn slot_string(card: Option<Card>) -> String {
        match card {
            Some(card) => card.to_string(),
            None => "..".to_string(),
        }
    }

    /// All 52 cards, suit by suit.
    pub fn deck() -> impl Iterator<Item = Card> {
        Suit::ALL
            .into_iter()
            .flat_map(|suit| (ACE..=KING).map(move |rank| Card::new(suit, rank)))
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.suit(), RANK_CHARS[self.rank() as usize])
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// Can `candidate` go on a foundation whose highest card is `top`.
pub fn can_build_foundation(top: Option<Card>, candidate: Card) -> bool {
    match top {
        None => candidate.rank() == ACE,
        Some(top) => top.suit() == candidate.suit() && candidate.rank() == top.rank() + 1,
    }
}

/// Largest sequence that can be moved as a single supermove.
pub fn max_supermove_size(free_cells: usize, empty_columns: usize) -> usize {
    (free_cells + 1) << empty_columns
}

/// Whether `a`, lying on top of `b` in a cascade, is guaranteed to need a non-free move
/// before `b` can be freed.
pub fn strictly_blocks(a: Card, b: Card, foundations: &Foundations) -> bool {
    if foundations.accepts(a) {
        return false;
    }

    let rank_gap = a.rank() as i8 - b.rank() as i8;
    if rank_gap >= 2 {
        return true;
    }

    if a.suit() == b.suit() || a.is_red() != b.is_red() {
        rank_gap >= 1
    } else {
        false
    }
}

/// The four goal piles, stored as the highest rank placed per suit (0 when empty).
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, Default)]
pub struct Foundations([u8; 4]);

impl Foundations {
    /// Foundations holding `ranks` (heart, spade, diamond, club); 0 is an empty pile. Ranks
    /// above the king are refused.
    pub fn from_ranks(ranks: [u8; 4]) -> Result<Self, DealError> {
        match ranks.iter().position(|&rank| rank > KING) {
            Some(index) => Err(DealError::FoundationRank {
                index,
                rank: ranks[index],
            }),
            None => Ok(Foundations(ranks)),
        }
    }

    pub fn rank(&self, suit: Suit) -> u8 {
        self.0[suit.index()]
    }

    pub fn top(&self, suit: Suit) -> Option<Card> {
        match self.rank(suit) {
            0 => None,
            rank => Some(Card::new(suit, rank)),
        }
    }

    pub fn accepts(&self, card: Card) -> bool {
        can_build_foundation(self.top(card.suit()), card)
    }

    pub fn place(&mut self, card: Card) -> Result<(), InvariantError> {
        if !self.accepts(card) {
            return Err(InvariantError::IllegalFoundation {
                card,
                top: Card::slot_string(self.top(card.suit())),
            });
        }
        self.0[card.suit().index()] = card.rank();
        Ok(())
    }

    /// Number of cards on all foundations, 0..=52.
    pub fn completeness(&self) -> u32 {
        self.0.iter().map(|&rank| rank as u32).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.0.iter().all(|&rank| rank == KING)
    }

    /// A foundation move of `card` never hurts: aces and twos always qualify, anything else
    /// once both foundations of the other color hold at least `rank - 1`.
    pub fn is_safe_to_place(&self, card: Card) -> bool {
        if card.rank() <= TWO {
            return true;
        }
        Suit::ALL
            .into_iter()
            .filter(|suit| suit.is_red() != card.is_red())
            .all(|suit| self.rank(suit) + 1 >= card.rank())
    }

    pub fn codes(&self) -> [u8; 4] {
        std::array::from_fn(|index| match self.top(Suit::ALL[index]) {
            Some(card) => card.code(),
            None => Card::NONE_CODE,
        })
    }
}
