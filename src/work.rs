//! Work generation.
//!
//! A run's input is a finite, ordered sequence of [`WorkItem`]s. The
//! generator is a pure function of `(count, difficulty)`: calling
//! [`generate`] twice with the same inputs yields the same sequence.

use crate::model::WorkItem;

/// Lazy iterator over `count` work items, indices `0..count` in order.
#[derive(Debug, Clone)]
pub struct WorkGenerator {
    next: usize,
    count: usize,
    difficulty: u32,
}

/// Produce the work items for one run.
pub fn generate(count: usize, difficulty: u32) -> WorkGenerator {
    WorkGenerator {
        next: 0,
        count,
        difficulty,
    }
}

impl Iterator for WorkGenerator {
    type Item = WorkItem;

    fn next(&mut self) -> Option<WorkItem> {
        if self.next >= self.count {
            return None;
        }
        let item = WorkItem {
            sequence_index: self.next,
            difficulty: self.difficulty,
        };
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WorkGenerator {}

impl std::iter::FusedIterator for WorkGenerator {}
