use super::indexer::locate;
use super::section::{enclose, enclose_before, section_of};
use super::stack::{Anchor, AncestryStack, LastAnchor};
use crate::document::Document;
use crate::error::HierarchyError;
use crate::types::{BuildStats, HeadingObservation, Rank};
use ego_tree::NodeId;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heading {
    pub sequence_index: usize,
    pub rank: Rank,
}

impl From<&HeadingObservation> for Heading {
    fn from(observation: &HeadingObservation) -> Self {
        Self {
            sequence_index: observation.sequence_index,
            rank: observation.rank,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    FirstHeading,
    EqualRank { next: Heading },
    SmallerNext { next: Heading },
    LargerNext { next: Heading },
    LastHeading,
}

impl Step {
    /// The lookahead step for `current` given the next heading, if any.
    pub fn classify(current: Heading, next: Option<Heading>) -> Step {
        let Some(next) = next else {
            return Step::LastHeading;
        };
        match current.rank.cmp(&next.rank) {
            Ordering::Equal => Step::EqualRank { next },
            Ordering::Greater => Step::SmallerNext { next },
            Ordering::Less => Step::LargerNext { next },
        }
    }
}

pub struct HierarchyBuilder<'a> {
    doc: &'a mut Document,
    cutoff: f64,
    stack: AncestryStack,
    processed: Option<usize>,
    smallest_seen: Option<Rank>,
    stats: BuildStats,
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new(doc: &'a mut Document, cutoff: f64) -> Self {
        Self {
            doc,
            cutoff,
            stack: AncestryStack::new(),
            processed: None,
            smallest_seen: None,
            stats: BuildStats::default(),
        }
    }

    pub fn build(
        mut self,
        observations: &[HeadingObservation],
    ) -> Result<BuildStats, HierarchyError> {
        let headings: Vec<Heading> = observations
            .iter()
            .filter(|o| !o.below_threshold)
            .map(Heading::from)
            .collect();

        for (position, &heading) in headings.iter().enumerate() {
            let mut enclosed = self.processed.take() == Some(heading.sequence_index);
            self.smallest_seen = Some(
                self.smallest_seen
                    .map_or(heading.rank, |seen| seen.min(heading.rank)),
            );

            if self.stack.is_empty() {
                self.apply(Step::FirstHeading, heading, enclosed)?;
                enclosed = true;
            }
            let step = Step::classify(heading, headings.get(position + 1).copied());
            self.apply(step, heading, enclosed)?;
        }

        Ok(self.stats)
    }

    pub fn apply(
        &mut self,
        step: Step,
        current: Heading,
        enclosed: bool,
    ) -> Result<(), HierarchyError> {
        tracing::debug!(
            "[Hierarchy] heading {} (rank {}): {:?}",
            current.sequence_index,
            current.rank,
            step
        );
        match step {
            Step::FirstHeading => self.first_heading(current),
            Step::EqualRank { next } => self.equal_rank(current, next, enclosed),
            Step::SmallerNext { .. } => self.smaller_next(current, enclosed),
            Step::LargerNext { next } => self.larger_next(current, next, enclosed),
            Step::LastHeading => self.last_heading(current, enclosed),
        }
    }

    fn first_heading(&mut self, current: Heading) -> Result<(), HierarchyError> {
        let node = locate(self.doc, current.sequence_index)?;
        let has_element_parent = self
            .doc
            .parent(node)
            .is_some_and(|parent| self.doc.element(parent).is_some());
        if !has_element_parent {
            return Err(HierarchyError::malformed(
                current.sequence_index,
                "first heading has no enclosing element",
            ));
        }
        self.enclose_rest(node)?;
        self.stack.record(current.rank, current.sequence_index);
        Ok(())
    }

    fn equal_rank(
        &mut self,
        current: Heading,
        next: Heading,
        enclosed: bool,
    ) -> Result<(), HierarchyError> {
        if enclosed {
            let next_node = locate(self.doc, next.sequence_index)?;
            let section = self.enclose_rest(next_node)?;
            self.relocate(section, current.sequence_index)?;
            self.processed = Some(next.sequence_index);
        } else {
            let node = locate(self.doc, current.sequence_index)?;
            let next_node = locate(self.doc, next.sequence_index)?;
            if !self.doc.is_following_sibling(node, next_node) {
                return Err(HierarchyError::malformed(
                    next.sequence_index,
                    format!(
                        "equal-rank heading is not a following sibling of heading {}",
                        current.sequence_index
                    ),
                ));
            }
            enclose_before(self.doc, node, next_node)?;
            self.stats.sections += 1;
        }
        self.stack.record(current.rank, current.sequence_index);
        Ok(())
    }

    fn smaller_next(&mut self, current: Heading, enclosed: bool) -> Result<(), HierarchyError> {
        if !enclosed {
            let node = locate(self.doc, current.sequence_index)?;
            self.enclose_rest(node)?;
        }
        self.stack.record(current.rank, current.sequence_index);
        Ok(())
    }

    fn larger_next(
        &mut self,
        current: Heading,
        next: Heading,
        enclosed: bool,
    ) -> Result<(), HierarchyError> {
        self.stack.record(current.rank, current.sequence_index);
        let anchor = self.stack.anchor_for(next.rank);

        let next_node = locate(self.doc, next.sequence_index)?;
        let section = self.enclose_rest(next_node)?;

        match anchor {
            Anchor::Exact(seq) | Anchor::Recovered(seq) => {
                if seq != current.sequence_index || enclosed {
                    self.relocate(section, seq)?;
                }
            }
            Anchor::None => {
                tracing::debug!(
                    "[Hierarchy] no anchor for heading {} (rank {}), leaving it nested",
                    next.sequence_index,
                    next.rank
                );
                self.stats.unresolved_anchors += 1;
            }
        }

        self.stack.promote(next.rank, next.sequence_index);

        if !enclosed {
            let node = locate(self.doc, current.sequence_index)?;
            enclose_before(self.doc, node, section)?;
            self.stats.sections += 1;
        }
        self.processed = Some(next.sequence_index);
        Ok(())
    }

    fn last_heading(&mut self, current: Heading, enclosed: bool) -> Result<(), HierarchyError> {
        let node = locate(self.doc, current.sequence_index)?;
        let section = if enclosed {
            section_of(self.doc, node).ok_or_else(|| {
                HierarchyError::malformed(
                    current.sequence_index,
                    "enclosed heading opens no section",
                )
            })?
        } else {
            self.enclose_rest(node)?
        };

        let smallest_seen = self.smallest_seen.unwrap_or(current.rank);
        match self.stack.last_anchor(current.rank, self.cutoff, smallest_seen) {
            LastAnchor::Sibling(seq) if seq != current.sequence_index => {
                self.relocate(section, seq)?;
            }
            LastAnchor::Sibling(_) | LastAnchor::Root => {}
            LastAnchor::Unanchored { deepest } => {
                tracing::debug!(
                    "[Hierarchy] last heading {} has no anchor (deepest: {})",
                    current.sequence_index,
                    deepest
                );
                self.stats.unresolved_anchors += 1;
            }
        }

        self.stack.record(current.rank, current.sequence_index);
        Ok(())
    }

    fn enclose_rest(&mut self, heading: NodeId) -> Result<NodeId, HierarchyError> {
        let section = enclose(self.doc, heading)?;
        self.stats.sections += 1;
        Ok(section)
    }

    /// Moves `section` to sit right after the section of heading `anchor`, but
    /// only when it is the trailing content of that section.
    fn relocate(&mut self, section: NodeId, anchor: usize) -> Result<(), HierarchyError> {
        let anchor_node = locate(self.doc, anchor)?;
        let Some(anchor_section) = section_of(self.doc, anchor_node) else {
            self.stats.unresolved_anchors += 1;
            return Ok(());
        };
        if self.doc.prev_sibling(section) == Some(anchor_section) {
            return Ok(());
        }
        if !self.doc.is_trailing_descendant(section, anchor_section) {
            tracing::debug!(
                "[Hierarchy] section is not trailing content of heading {}, not moving it",
                anchor
            );
            self.stats.unresolved_anchors += 1;
            return Ok(());
        }
        self.doc.move_after(section, anchor_section)?;
        self.stats.relocations += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(sequence_index: usize, rank: f64) -> Heading {
        Heading {
            sequence_index,
            rank: Rank(rank),
        }
    }

    #[test]
    fn classifies_by_comparing_with_the_next_heading() {
        let current = heading(1, 18.0);
        assert_eq!(
            Step::classify(current, Some(heading(2, 18.0))),
            Step::EqualRank {
                next: heading(2, 18.0)
            }
        );
        assert_eq!(
            Step::classify(current, Some(heading(2, 16.0))),
            Step::SmallerNext {
                next: heading(2, 16.0)
            }
        );
        assert_eq!(
            Step::classify(current, Some(heading(2, 20.0))),
            Step::LargerNext {
                next: heading(2, 20.0)
            }
        );
        assert_eq!(Step::classify(current, None), Step::LastHeading);
    }
}
