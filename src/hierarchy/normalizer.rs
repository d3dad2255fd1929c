use crate::types::Rank;

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// The first heading's rank after rescaling.
    pub root: Rank,
    /// One entry per input rank, same order.
    pub ranks: Vec<Rank>,
}

impl Normalized {
    pub fn is_below_threshold(&self, index: usize, cutoff: f64) -> bool {
        self.ranks
            .get(index)
            .is_some_and(|rank| rank.value() < cutoff)
    }

    pub fn heading_levels(&self, cutoff: f64) -> Vec<Rank> {
        distinct_levels(
            self.ranks
                .iter()
                .copied()
                .filter(|rank| rank.value() >= cutoff),
        )
    }
}

/// Distinct ranks, largest first.
pub fn distinct_levels(ranks: impl IntoIterator<Item = Rank>) -> Vec<Rank> {
    let mut levels: Vec<Rank> = ranks.into_iter().collect();
    levels.sort_unstable_by(|a, b| b.cmp(a));
    levels.dedup();
    levels
}

/// Anchors every rank to the first one. A root below the cutoff is lifted to
/// the cutoff (only the root's own occurrences move), and nothing may outrank
/// the root afterwards.
pub fn normalize(ranks: &[Rank], cutoff: f64) -> Option<Normalized> {
    let first = *ranks.first()?;
    let rescaled = first.value() < cutoff;
    let root = if rescaled { Rank(cutoff) } else { first };

    let mut clamped = 0;
    let ranks = ranks
        .iter()
        .map(|&rank| {
            if rescaled && rank == first {
                root
            } else if rank > root {
                clamped += 1;
                root
            } else {
                rank
            }
        })
        .collect();

    if rescaled {
        tracing::debug!("[Hierarchy] root rank {} lifted to cutoff {}", first, cutoff);
    }
    if clamped > 0 {
        tracing::debug!("[Hierarchy] clamped {} ranks down to root {}", clamped, root);
    }

    Some(Normalized { root, ranks })
}
