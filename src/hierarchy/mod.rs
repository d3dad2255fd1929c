pub mod builder;
pub mod collector;
pub mod fallback;
pub mod indexer;
pub mod normalizer;
pub mod section;
pub mod stack;

use crate::config::HierarchyConfig;
use crate::document::{Document, PathQuery, Snapshot};
use crate::error::HierarchyError;
use crate::types::{HeadingObservation, OutlineEntry, Outcome, Rank};
use builder::HierarchyBuilder;
use indexer::{locate, SEQUENCE_ATTR};
use section::{HEAD_TAG, SECTION_TAG};

/// Element whose direct `p` children are heading candidates.
pub const CONTAINER_TAG: &str = "body";

pub fn reconstruct(doc: &mut Document, config: &HierarchyConfig) -> Outcome {
    let Some(container) = doc.first(&PathQuery::new().desc(CONTAINER_TAG)) else {
        return unchanged(format!("no <{CONTAINER_TAG}> element"));
    };

    let collection = collector::collect(doc, container, config.max_headings);
    tracing::debug!("[Hierarchy] rank census: {:?}", collection.census);

    let ranks: Vec<Rank> = collection.candidates.iter().map(|c| c.rank).collect();
    let Some(normalized) = normalizer::normalize(&ranks, config.size_cutoff) else {
        return unchanged("no heading candidates".to_string());
    };
    tracing::debug!(
        "[Hierarchy] root rank {}, {} heading levels at or above {}",
        normalized.root,
        normalized.heading_levels(config.size_cutoff).len(),
        config.size_cutoff
    );

    let snapshot = doc.snapshot();
    let result = indexer::index_headings(
        doc,
        &collection.candidates,
        &normalized,
        config.size_cutoff,
    )
    .and_then(|observations| restructure(doc, &observations, config));
    settle(doc, snapshot, result)
}

/// Runs the structural part of a pass over headings that already carry
/// `heading-seq` attributes.
pub fn apply(
    doc: &mut Document,
    observations: &[HeadingObservation],
    config: &HierarchyConfig,
) -> Outcome {
    let snapshot = doc.snapshot();
    let result = restructure(doc, observations, config);
    settle(doc, snapshot, result)
}

fn settle(
    doc: &mut Document,
    snapshot: Snapshot,
    result: Result<Outcome, HierarchyError>,
) -> Outcome {
    match result {
        Ok(outcome) if outcome.is_applied() => {
            match &outcome {
                Outcome::Nested { stats, outline } => tracing::info!(
                    "[Hierarchy] nested {} headings into {} sections ({} relocated, {} unresolved anchors)",
                    outline.len(),
                    stats.sections,
                    stats.relocations,
                    stats.unresolved_anchors
                ),
                Outcome::Flat { sections, .. } => tracing::info!(
                    "[Hierarchy] single heading level, {} flat sections",
                    sections
                ),
                Outcome::Unchanged { .. } | Outcome::Skipped { .. } => {}
            }
            outcome
        }
        Ok(outcome) => {
            doc.restore(snapshot);
            outcome
        }
        Err(err) => {
            tracing::warn!("[Hierarchy] reconstruction skipped, document restored: {}", err);
            doc.restore(snapshot);
            Outcome::Skipped {
                reason: err.to_string(),
            }
        }
    }
}

fn restructure(
    doc: &mut Document,
    observations: &[HeadingObservation],
    config: &HierarchyConfig,
) -> Result<Outcome, HierarchyError> {
    let levels = normalizer::distinct_levels(
        observations
            .iter()
            .filter(|o| !o.below_threshold)
            .map(|o| o.rank),
    );

    match levels.len() {
        0 => Ok(unchanged(format!(
            "no heading at or above size cutoff {}",
            config.size_cutoff
        ))),
        1 => {
            let sections = fallback::enclose_flat(doc, observations)?;
            let outline = finalize(doc, observations)?;
            Ok(Outcome::Flat { sections, outline })
        }
        _ => {
            let stats = HierarchyBuilder::new(doc, config.size_cutoff).build(observations)?;
            let outline = finalize(doc, observations)?;
            Ok(Outcome::Nested { stats, outline })
        }
    }
}

/// Turns heading paragraphs into `head` elements, drops the sequence
/// attributes and reports where each heading ended up.
fn finalize(
    doc: &mut Document,
    observations: &[HeadingObservation],
) -> Result<Vec<OutlineEntry>, HierarchyError> {
    let mut outline = Vec::new();

    for observation in observations {
        let node = locate(doc, observation.sequence_index)?;
        if observation.below_threshold {
            doc.delete_attr(node, SEQUENCE_ATTR)?;
            continue;
        }

        let depth = doc
            .tree()
            .get(node)
            .map(|n| {
                n.ancestors()
                    .filter_map(|a| a.value().as_element())
                    .filter(|el| el.is(SECTION_TAG))
                    .count()
            })
            .unwrap_or_default();
        let attrs: Vec<(String, String)> = doc
            .element(node)
            .map(|el| {
                el.attrs
                    .iter()
                    .filter(|(key, _)| key != SEQUENCE_ATTR)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        doc.relabel(node, HEAD_TAG, attrs)?;

        outline.push(OutlineEntry {
            sequence_index: observation.sequence_index,
            rank: observation.rank,
            depth,
            title: observation.title.clone(),
        });
    }

    Ok(outline)
}

fn unchanged(reason: String) -> Outcome {
    tracing::info!("[Hierarchy] document left unchanged: {}", reason);
    Outcome::Unchanged { reason }
}
