use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Prominence of a heading: a point size or a style-derived score. Larger is
/// more outer. Equality is exact, never tolerance-based.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rank(pub f64);

impl Rank {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Rank {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for Rank {}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for Rank {
    fn from(value: f64) -> Self {
        Rank(value)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One heading-candidate paragraph, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingObservation {
    pub sequence_index: usize,
    pub rank: Rank,
    pub below_threshold: bool,
    pub title: String,
}

/// One reconstructed heading as it sits in the final tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub sequence_index: usize,
    pub rank: Rank,
    /// Number of enclosing sections, 1 for a top-level section.
    pub depth: usize,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankSource {
    /// Explicit `size` values on inline runs.
    Sizes,
    /// `heading N` paragraph styles mapped onto a synthetic descending scale.
    Styles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankCount {
    pub rank: Rank,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankCensus {
    pub source: RankSource,
    /// Surviving ranks, most prominent first.
    pub counts: Vec<RankCount>,
    /// Ranks dropped for occurring more than `max_headings` times.
    pub discarded: Vec<RankCount>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    pub sections: usize,
    pub relocations: usize,
    pub unresolved_anchors: usize,
}

/// Result of one reconstruction pass. None of these are errors: a skipped pass
/// leaves the document exactly as it was before the pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Nested {
        stats: BuildStats,
        outline: Vec<OutlineEntry>,
    },
    Flat {
        sections: usize,
        outline: Vec<OutlineEntry>,
    },
    Unchanged {
        reason: String,
    },
    Skipped {
        reason: String,
    },
}

impl Outcome {
    pub fn outline(&self) -> &[OutlineEntry] {
        match self {
            Outcome::Nested { outline, .. } | Outcome::Flat { outline, .. } => outline,
            Outcome::Unchanged { .. } | Outcome::Skipped { .. } => &[],
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Nested { .. } | Outcome::Flat { .. })
    }
}
