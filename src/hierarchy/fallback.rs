use super::indexer::locate;
use super::section::{enclose, enclose_before, section_of, SECTION_TAG};
use crate::document::Document;
use crate::error::HierarchyError;
use crate::types::HeadingObservation;

/// Only one heading level exists: every heading opens a flat section that runs
/// to the next heading in its parent. Headings already opening a section are
/// left alone, so a second run changes nothing. Returns the sections created.
pub fn enclose_flat(
    doc: &mut Document,
    observations: &[HeadingObservation],
) -> Result<usize, HierarchyError> {
    let headings: Vec<&HeadingObservation> =
        observations.iter().filter(|o| !o.below_threshold).collect();
    let mut created = 0;

    for (position, heading) in headings.iter().enumerate() {
        let node = locate(doc, heading.sequence_index)?;
        if section_of(doc, node).is_some() {
            continue;
        }

        let next = headings
            .get(position + 1)
            .map(|next| locate(doc, next.sequence_index))
            .transpose()?;
        match next {
            // A following heading that already opens a section bounds the run at
            // that section, not at the heading inside it.
            Some(next) => {
                let boundary = section_of(doc, next).unwrap_or(next);
                enclose_before(doc, node, boundary)?
            }
            None => enclose(doc, node)?,
        };

        tracing::debug!(
            "[Hierarchy] flat <{}> for heading {}",
            SECTION_TAG,
            heading.sequence_index
        );
        created += 1;
    }

    Ok(created)
}
