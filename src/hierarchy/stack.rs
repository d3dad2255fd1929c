use crate::types::Rank;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackEntry {
    pub rank: Rank,
    pub sequence_index: usize,
}

/// Where a heading returning to a shallower level should be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// A heading of exactly this rank is open.
    Exact(usize),
    /// No heading of this rank was seen on the path; the shallowest open level
    /// deeper than it stands in.
    Recovered(usize),
    None,
}

/// Placement of the final heading, resolved backwards over the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastAnchor {
    Sibling(usize),
    Root,
    /// Stays nested under whatever precedes it. `deepest` is set when no
    /// heading seen so far had a smaller rank.
    Unanchored { deepest: bool },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AncestryStack {
    entries: Vec<StackEntry>,
}

impl AncestryStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[StackEntry] {
        &self.entries
    }

    pub fn bottom(&self) -> Option<StackEntry> {
        self.entries.first().copied()
    }

    pub fn get(&self, rank: Rank) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.rank == rank)
            .map(|entry| entry.sequence_index)
    }

    /// Overwrites the entry for `rank`, or pushes a new one.
    pub fn record(&mut self, rank: Rank, sequence_index: usize) {
        match self.entries.iter_mut().find(|entry| entry.rank == rank) {
            Some(entry) => entry.sequence_index = sequence_index,
            None => self.entries.push(StackEntry {
                rank,
                sequence_index,
            }),
        }
    }

    pub fn anchor_for(&self, rank: Rank) -> Anchor {
        if let Some(sequence_index) = self.get(rank) {
            return Anchor::Exact(sequence_index);
        }
        self.entries
            .iter()
            .filter(|entry| entry.rank < rank)
            .max_by_key(|entry| entry.rank)
            .map_or(Anchor::None, |entry| Anchor::Recovered(entry.sequence_index))
    }

    /// Returns to the level of `rank`: every deeper level except the bottom
    /// entry is closed, then `rank` records `sequence_index`.
    pub fn promote(&mut self, rank: Rank, sequence_index: usize) {
        let mut position = 0;
        self.entries.retain(|entry| {
            let keep = position == 0 || entry.rank >= rank;
            position += 1;
            keep
        });
        self.record(rank, sequence_index);
    }

    pub fn last_anchor(&self, rank: Rank, cutoff: f64, smallest_seen: Rank) -> LastAnchor {
        if let Some(sequence_index) = self.get(rank) {
            return LastAnchor::Sibling(sequence_index);
        }
        let is_root = self.bottom().is_some_and(|bottom| bottom.rank == rank);
        if is_root || rank == Rank(cutoff) {
            return LastAnchor::Root;
        }
        if self.entries.iter().any(|entry| entry.rank < rank) {
            return LastAnchor::Root;
        }
        LastAnchor::Unanchored {
            deepest: rank <= smallest_seen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(entries: &[(f64, usize)]) -> AncestryStack {
        let mut stack = AncestryStack::new();
        for &(rank, seq) in entries {
            stack.record(Rank(rank), seq);
        }
        stack
    }

    #[test]
    fn record_overwrites_existing_rank() {
        let mut stack = stack(&[(20.0, 0), (18.0, 1)]);
        stack.record(Rank(18.0), 4);
        assert_eq!(stack.entries().len(), 2);
        assert_eq!(stack.get(Rank(18.0)), Some(4));
    }

    #[test]
    fn exact_anchor_wins_over_recovery() {
        let stack = stack(&[(20.0, 0), (19.0, 1), (18.0, 2)]);
        assert_eq!(stack.anchor_for(Rank(19.0)), Anchor::Exact(1));
    }

    #[test]
    fn recovery_picks_closest_deeper_level() {
        let deep = stack(&[(20.0, 0), (17.0, 1), (16.0, 2)]);
        assert_eq!(deep.anchor_for(Rank(18.0)), Anchor::Recovered(1));

        let only_root = stack(&[(20.0, 0)]);
        assert_eq!(only_root.anchor_for(Rank(18.0)), Anchor::None);
    }

    #[test]
    fn promote_closes_deeper_levels_but_keeps_the_bottom() {
        let mut stack = stack(&[(20.0, 0), (19.0, 1), (18.0, 2)]);
        stack.promote(Rank(19.0), 3);
        assert_eq!(
            stack.entries(),
            &[
                StackEntry {
                    rank: Rank(20.0),
                    sequence_index: 0
                },
                StackEntry {
                    rank: Rank(19.0),
                    sequence_index: 3
                },
            ]
        );
    }

    #[test]
    fn last_anchor_falls_back_in_order() {
        let stack = stack(&[(20.0, 0), (18.0, 1)]);
        assert_eq!(
            stack.last_anchor(Rank(18.0), 16.0, Rank(18.0)),
            LastAnchor::Sibling(1)
        );
        assert_eq!(
            stack.last_anchor(Rank(16.0), 16.0, Rank(18.0)),
            LastAnchor::Root
        );
        assert_eq!(
            stack.last_anchor(Rank(19.0), 16.0, Rank(18.0)),
            LastAnchor::Root
        );
        assert_eq!(
            stack.last_anchor(Rank(17.0), 16.0, Rank(17.0)),
            LastAnchor::Unanchored { deepest: true }
        );
    }
}
