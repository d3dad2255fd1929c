use super::collector::Candidate;
use super::normalizer::Normalized;
use crate::document::{Document, PathQuery};
use crate::error::HierarchyError;
use crate::types::HeadingObservation;
use ego_tree::NodeId;

/// Durable attribute carrying a heading's position in document order.
pub const SEQUENCE_ATTR: &str = "heading-seq";

/// Stamps `heading-seq` onto every candidate, `0..N` in document order, and
/// returns the matching observations. Any `heading-seq` already in the
/// document is removed first, candidate or not.
pub fn index_headings(
    doc: &mut Document,
    candidates: &[Candidate],
    normalized: &Normalized,
    cutoff: f64,
) -> Result<Vec<HeadingObservation>, HierarchyError> {
    let stale = doc.select(&PathQuery::new().desc("*").has_attr(SEQUENCE_ATTR));
    if !stale.is_empty() {
        tracing::debug!(
            "[Hierarchy] clearing {} stale {} attributes",
            stale.len(),
            SEQUENCE_ATTR
        );
    }
    for node in stale {
        doc.delete_attr(node, SEQUENCE_ATTR)?;
    }

    let mut observations = Vec::with_capacity(candidates.len());

    for (sequence_index, (candidate, rank)) in
        candidates.iter().zip(normalized.ranks.iter()).enumerate()
    {
        doc.set_attr(candidate.node, SEQUENCE_ATTR, &sequence_index.to_string())?;
        observations.push(HeadingObservation {
            sequence_index,
            rank: *rank,
            below_threshold: normalized.is_below_threshold(sequence_index, cutoff),
            title: candidate.title.clone(),
        });
    }

    Ok(observations)
}

/// Resolves a heading through its `heading-seq` attribute.
pub fn locate(doc: &Document, sequence_index: usize) -> Result<NodeId, HierarchyError> {
    let query = PathQuery::new()
        .desc("*")
        .with_attr(SEQUENCE_ATTR, &sequence_index.to_string());
    doc.first(&query)
        .ok_or(HierarchyError::MissingHeading(sequence_index))
}
