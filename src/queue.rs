use std::collections::BTreeMap;

/// A priority queue ordered by `K`, lowest first. Entries with equal keys leave in insertion
/// order, so the order is total and reproducible. Supports removing every entry that matches a
/// predicate.
#[derive(Debug)]
pub struct OrderedQueue<K, T> {
    entries: BTreeMap<(K, u64), T>,
    next_sequence: u64,
}

impl<K: Ord, T> Default for OrderedQueue<K, T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_sequence: 0,
        }
    }
}

impl<K: Ord, T> OrderedQueue<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: K, item: T) {
        self.entries.insert((key, self.next_sequence), item);
        self.next_sequence += 1;
    }

    pub fn pop(&mut self) -> Option<(K, T)> {
        self.entries
            .pop_first()
            .map(|((key, _sequence), item)| (key, item))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry for which `remove` returns true, returning how many went.
    pub fn purge(&mut self, mut remove: impl FnMut(&K, &T) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(key, _), item| !remove(key, item));
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_lowest_key_then_oldest() {
        let mut queue = OrderedQueue::new();
        queue.push(5, "late");
        queue.push(1, "first");
        queue.push(5, "later");
        queue.push(3, "middle");
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.pop(), Some((1, "first")));
        assert_eq!(queue.pop(), Some((3, "middle")));
        assert_eq!(queue.pop(), Some((5, "late")));
        assert_eq!(queue.pop(), Some((5, "later")));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn purge_removes_matching_entries() {
        let mut queue = OrderedQueue::new();
        for level in 0..10u32 {
            queue.push(-(level as i64), level);
        }
        let removed = queue.purge(|_, &level| level >= 6);
        assert_eq!(removed, 4);
        assert_eq!(queue.len(), 6);
        assert_eq!(queue.pop(), Some((-5, 5)));
    }
}
