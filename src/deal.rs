use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::{Board, COLUMNS};
use crate::card::{Card, Foundations, Suit, ACE, KING};
use crate::column::Column;

/// The linear congruential generator behind the numbered Microsoft deals.
#[derive(Debug, Clone)]
pub struct MsRng {
    seed: u32,
}

impl MsRng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn next_value(&mut self) -> u32 {
        self.seed = self.seed.wrapping_mul(214013).wrapping_add(2531011) & 0x7fff_ffff;
        self.seed >> 16
    }
}

/// The deck as the Microsoft shuffle expects it: aces first, clubs, diamonds, hearts, spades
/// within a rank.
fn microsoft_deck() -> Vec<Card> {
    const SUITS: [Suit; 4] = [Suit::Club, Suit::Diamond, Suit::Heart, Suit::Spade];
    (ACE..=KING)
        .flat_map(|rank| SUITS.map(|suit| Card::new(suit, rank)))
        .collect()
}

/// Deals `cards` round-robin: the first card dealt to a cascade ends up buried at its bottom.
fn from_deck(cards: impl IntoIterator<Item = Card>) -> Board {
    let mut columns: [Vec<Card>; COLUMNS] = Default::default();
    for (index, card) in cards.into_iter().enumerate() {
        columns[index % COLUMNS].push(card);
    }
    Board::from_parts(
        Vec::new(),
        Foundations::default(),
        columns.map(Column::from_bottom_up),
        0,
    )
}

/// The deal with the given Microsoft FreeCell game number.
pub fn microsoft(game: u32) -> Board {
    let mut rng = MsRng::new(game);
    let mut deck = microsoft_deck();
    let mut dealt = Vec::with_capacity(deck.len());
    while !deck.is_empty() {
        let index = rng.next_value() as usize % deck.len();
        dealt.push(deck.swap_remove(index));
    }
    from_deck(dealt)
}

/// A uniformly shuffled deal.
pub fn random(rng: &mut impl Rng) -> Board {
    let mut deck: Vec<Card> = Card::deck().collect();
    deck.shuffle(rng);
    from_deck(deck)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::board::tests::column;

    #[test]
    fn game_one() {
        let board = microsoft(1);
        assert_eq!(board.validate(), Ok(()));
        let expected = [
            "dJ dK s2 c4 s3 d6 s6",
            "d2 cK sK c5 dT s8 c9",
            "h9 s9 d9 sT s4 d8 h2",
            "cJ s5 dQ hQ hT sQ h6",
            "d5 dA sJ h4 h8 c6",
            "h7 cQ sA cA c2 d3",
            "c7 hK hA d4 hJ c8",
            "h5 h3 c3 s7 d7 cT",
        ];
        for (index, cards) in expected.iter().enumerate() {
            assert_eq!(board.columns()[index], column(cards), "cascade {}", index + 1);
        }
    }

    #[test]
    fn generator_sequence() {
        let mut rng = MsRng::new(1);
        assert_eq!(rng.next_value(), 41);
        assert_eq!(rng.next_value(), 18467);
        assert_eq!(rng.next_value(), 6334);
    }

    #[test]
    fn seeded_random_deals_are_reproducible() {
        let first = random(&mut StdRng::seed_from_u64(7));
        let second = random(&mut StdRng::seed_from_u64(7));
        assert_eq!(first, second);
        assert_eq!(first.validate(), Ok(()));
        assert_eq!(first.columns()[0].len(), 7);
        assert_eq!(first.columns()[7].len(), 6);
    }
}
