//! Pending-state containers. The pop order is what tells the search
//! strategies apart.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, VecDeque};

pub trait Frontier<T> {
    fn push(&mut self, item: T);
    fn pop(&mut self) -> Option<T>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// First in, first out.
#[derive(Debug)]
pub struct Fifo<T>(VecDeque<T>);

impl<T> Fifo<T> {
    pub fn new() -> Self {
        Fifo(VecDeque::new())
    }
}

impl<T> Default for Fifo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Frontier<T> for Fifo<T> {
    fn push(&mut self, item: T) {
        self.0.push_back(item);
    }

    fn pop(&mut self) -> Option<T> {
        self.0.pop_front()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

/// Last in, first out.
#[derive(Debug)]
pub struct Lifo<T>(Vec<T>);

impl<T> Lifo<T> {
    pub fn new() -> Self {
        Lifo(Vec::new())
    }
}

impl<T> Default for Lifo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Frontier<T> for Lifo<T> {
    fn push(&mut self, item: T) {
        self.0.push(item);
    }

    fn pop(&mut self) -> Option<T> {
        self.0.pop()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

struct Entry<T> {
    key: Reverse<(usize, u64)>,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Lowest cost first; equal costs leave in insertion order.
pub struct Priority<T> {
    heap: BinaryHeap<Entry<T>>,
    seq: u64,
}

impl<T> Priority<T> {
    pub fn new() -> Self {
        Priority {
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }

    pub fn push_with_cost(&mut self, cost: usize, item: T) {
        self.heap.push(Entry {
            key: Reverse((cost, self.seq)),
            item,
        });
        self.seq += 1;
    }

    pub fn pop_with_cost(&mut self) -> Option<(usize, T)> {
        self.heap.pop().map(|entry| (entry.key.0 .0, entry.item))
    }
}

impl<T> Default for Priority<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Frontier<(usize, T)> for Priority<T> {
    fn push(&mut self, (cost, item): (usize, T)) {
        self.push_with_cost(cost, item);
    }

    fn pop(&mut self) -> Option<(usize, T)> {
        self.pop_with_cost()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<F: Frontier<T>, T>(mut frontier: F) -> Vec<T> {
        let mut out = Vec::new();
        while let Some(item) = frontier.pop() {
            out.push(item);
        }
        out
    }

    #[test]
    fn fifo_keeps_order() {
        let mut f = Fifo::new();
        for i in 0..4 {
            f.push(i);
        }
        assert_eq!(f.len(), 4);
        assert_eq!(drain(f), vec![0, 1, 2, 3]);
    }

    #[test]
    fn lifo_reverses_order() {
        let mut f = Lifo::new();
        for i in 0..4 {
            f.push(i);
        }
        assert_eq!(drain(f), vec![3, 2, 1, 0]);
    }

    #[test]
    fn priority_breaks_ties_by_insertion() {
        let mut f = Priority::new();
        f.push((5, 'a'));
        f.push((3, 'b'));
        f.push((5, 'c'));
        f.push((3, 'd'));
        f.push((1, 'e'));
        assert_eq!(
            drain(f),
            vec![(1, 'e'), (3, 'b'), (3, 'd'), (5, 'a'), (5, 'c')]
        );
    }

    #[test]
    fn empty_frontiers() {
        assert!(Fifo::<u8>::new().is_empty());
        assert!(Lifo::<u8>::new().is_empty());
        let mut p = Priority::<u8>::new();
        assert!(p.is_empty());
        assert_eq!(p.pop(), None);
    }
}
