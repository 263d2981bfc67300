use std::cmp::Ordering;

use crate::card::{strictly_blocks, Card, Foundations};

/// One cascade. Cards are stored bottom first, so the exposed card is the last element;
/// "depth" counts from the exposed card (depth 0) down towards the buried one.
#[derive(PartialEq, Eq, Hash, Clone, Debug, Default)]
pub struct Column {
    cards: Vec<Card>,
}

impl Column {
    pub fn from_bottom_up(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn top(&self) -> Option<Card> {
        self.cards.last().copied()
    }

    pub fn bottom(&self) -> Option<Card> {
        self.cards.first().copied()
    }

    /// Cards from the buried one to the exposed one.
    pub fn bottom_up(&self) -> &[Card] {
        &self.cards
    }

    pub fn card_at_depth(&self, depth: usize) -> Option<Card> {
        self.cards
            .len()
            .checked_sub(depth + 1)
            .map(|index| self.cards[index])
    }

    /// The `count` exposed cards, exposed card first.
    pub fn top_cards(&self, count: usize) -> Vec<Card> {
        self.cards.iter().rev().take(count).copied().collect()
    }

    /// Length of the descending, alternating run that starts at `depth` and extends towards the
    /// bottom. 0 when there is no card at `depth`.
    pub fn sequence_length(&self, depth: usize) -> usize {
        let Some(start) = self.cards.len().checked_sub(depth + 1) else {
            return 0;
        };
        self.cards[..=start]
            .iter()
            .rev()
            .collect::<Vec<_>>()
            .windows(2)
            .take_while(|cards| cards[1].can_build_cascade(*cards[0]))
            .count()
            + 1
    }

    /// Number of adjacent pairs that already form a valid build.
    pub fn consecutiveness(&self) -> u32 {
        self.cards
            .windows(2)
            .filter(|cards| cards[0].can_build_cascade(cards[1]))
            .count() as u32
    }

    /// Lower bound on the levels needed to clear this column. Each maximal run counts once,
    /// represented by its deepest card, and costs a level when a card beneath it is strictly
    /// blocked by it.
    pub fn minimum_solution_cost(&self, foundations: &Foundations) -> u32 {
        let mut cost = 0;
        let mut depth = 0;
        while depth < self.cards.len() {
            let run = self.sequence_length(depth);
            let deepest = self.cards.len() - depth - run;
            let card_to_free = self.cards[deepest];
            if self.cards[..deepest]
                .iter()
                .any(|&below| strictly_blocks(card_to_free, below, foundations))
            {
                cost += 1;
            }
            depth += run;
        }
        cost
    }

    pub fn pop(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Splits off the `count` exposed cards, returned bottom first.
    pub fn split_top(&mut self, count: usize) -> Vec<Card> {
        let at = self.cards.len().saturating_sub(count);
        self.cards.split_off(at)
    }

    pub fn append(&mut self, cards: &mut Vec<Card>) {
        self.cards.append(cards);
    }

    /// Order used to canonicalise boards: by bottom card rank, then suit, empty columns first.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        let key = |column: &Self| match column.bottom() {
            Some(card) => (card.rank(), card.suit().index() + 1),
            None => (0, 0),
        };
        key(self).cmp(&key(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(text: &str) -> Column {
        Column::from_bottom_up(
            text.split_whitespace()
                .map(|s| Card::from_string(s).unwrap().unwrap())
                .collect(),
        )
    }

    #[test]
    fn runs_are_measured_from_the_exposed_card() {
        let col = column("c2 hK sQ hJ");
        assert_eq!(col.sequence_length(0), 3);
        assert_eq!(col.sequence_length(1), 2);
        assert_eq!(col.sequence_length(3), 1);
        assert_eq!(col.sequence_length(4), 0);
        assert_eq!(Column::default().sequence_length(0), 0);
        assert_eq!(col.consecutiveness(), 2);
        assert_eq!(col.top_cards(2), column("hJ sQ").bottom_up());
    }

    #[test]
    fn minimum_cost_counts_blocking_runs() {
        let foundations = Foundations::default();
        // the run hK-sQ-hJ sits on c2; hK strictly blocks c2
        assert_eq!(column("c2 hK sQ hJ").minimum_solution_cost(&foundations), 1);
        // descending from the bottom: nothing blocks
        assert_eq!(column("hK sQ hJ").minimum_solution_cost(&foundations), 0);
        assert_eq!(column("h9 h5 h7").minimum_solution_cost(&foundations), 1);
        assert_eq!(column("h2 h5 h7").minimum_solution_cost(&foundations), 2);
        assert_eq!(Column::default().minimum_solution_cost(&foundations), 0);
    }

    #[test]
    fn canonical_order_uses_bottom_card() {
        let mut columns = [column("sK hA"), Column::default(), column("hK"), column("c3 d9")];
        columns.sort_by(Column::canonical_cmp);
        assert_eq!(columns[0], Column::default());
        assert_eq!(columns[1], column("c3 d9"));
        assert_eq!(columns[2], column("hK"));
        assert_eq!(columns[3], column("sK hA"));
    }
}
