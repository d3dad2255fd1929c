use crate::document::{Document, XmlNode};
use crate::types::{Rank, RankCensus, RankCount, RankSource};
use ego_tree::NodeId;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const PARAGRAPH_TAG: &str = "p";
pub const RUN_TAG: &str = "hi";
pub const SIZE_ATTR: &str = "size";
pub const STYLE_ATTR: &str = "rend";

pub const STYLE_RANK_TOP: f64 = 100.0;
pub const STYLE_RANK_STEP: f64 = 10.0;
pub const EMPHASIS_RANK: f64 = 100.0;

static HEADING_STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*heading\s*([1-9])\s*$").unwrap());
static SIZE_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?)\s*(?:pt)?\s*$").unwrap()
});
static EMPHASIS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(bold|strong|italic|emph)").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub node: NodeId,
    pub rank: Rank,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub census: RankCensus,
    /// Candidates whose rank survived the frequency filter, document order.
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default)]
struct Signals {
    size: Option<f64>,
    style_level: Option<u32>,
    emphasis_only: bool,
}

/// `"heading 2"` → 2. Case-insensitive, levels 1 through 9.
pub fn heading_style_level(style: &str) -> Option<u32> {
    HEADING_STYLE_RE
        .captures(style)
        .and_then(|caps| caps.get(1))
        .and_then(|level| level.as_str().parse().ok())
}

/// Synthetic rank for a `heading N` style: 100 for level 1, then 10 less per level.
pub fn style_rank(level: u32) -> Rank {
    Rank(STYLE_RANK_TOP - STYLE_RANK_STEP * f64::from(level.saturating_sub(1)))
}

/// `"20"`, `"20pt"`, `"10.5 pt"` → the numeric size.
pub fn parse_size(value: &str) -> Option<f64> {
    SIZE_VALUE_RE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|number| number.as_str().parse().ok())
}

pub fn is_emphasis_style(rend: &str) -> bool {
    EMPHASIS_RE.is_match(rend)
}

pub fn collect(doc: &Document, container: NodeId, max_headings: usize) -> Collection {
    let mut observed: Vec<(NodeId, String, Signals)> = Vec::new();

    for child in doc.children(container) {
        let Some(element) = doc.element(child) else {
            continue;
        };
        if !element.is(PARAGRAPH_TAG) {
            continue;
        }
        let title = doc.text_content(child);
        if title.is_empty() {
            continue;
        }
        observed.push((child, title, read_signals(doc, child)));
    }

    let source = if observed.iter().any(|(_, _, s)| s.style_level.is_some()) {
        RankSource::Styles
    } else {
        RankSource::Sizes
    };

    let ranked: Vec<(NodeId, String, Rank)> = observed
        .into_iter()
        .filter_map(|(node, title, signals)| {
            rank_for(&signals, source).map(|rank| (node, title, rank))
        })
        .collect();

    let mut counts: BTreeMap<Rank, usize> = BTreeMap::new();
    for (_, _, rank) in &ranked {
        *counts.entry(*rank).or_default() += 1;
    }

    let (kept, discarded): (Vec<RankCount>, Vec<RankCount>) = counts
        .iter()
        .rev()
        .map(|(rank, count)| RankCount {
            rank: *rank,
            count: *count,
        })
        .partition(|entry| entry.count <= max_headings);

    for entry in &discarded {
        tracing::debug!(
            "[Hierarchy] discarding rank {} seen {} times (max {})",
            entry.rank,
            entry.count,
            max_headings
        );
    }

    let candidates = ranked
        .into_iter()
        .filter(|(_, _, rank)| kept.iter().any(|entry| entry.rank == *rank))
        .map(|(node, title, rank)| Candidate { node, rank, title })
        .collect();

    Collection {
        census: RankCensus {
            source,
            counts: kept,
            discarded,
        },
        candidates,
    }
}

fn rank_for(signals: &Signals, source: RankSource) -> Option<Rank> {
    let explicit = match source {
        RankSource::Styles => signals.style_level.map(style_rank),
        RankSource::Sizes => signals.size.map(Rank),
    };
    explicit.or_else(|| signals.emphasis_only.then_some(Rank(EMPHASIS_RANK)))
}

fn read_signals(doc: &Document, paragraph: NodeId) -> Signals {
    let mut signals = Signals {
        style_level: doc
            .attr(paragraph, STYLE_ATTR)
            .and_then(heading_style_level),
        ..Signals::default()
    };

    let Some(node) = doc.tree().get(paragraph) else {
        return signals;
    };

    let mut saw_text = false;
    let mut plain_text = false;
    for descendant in node.descendants().skip(1) {
        if let Some(element) = descendant.value().as_element() {
            if element.is(RUN_TAG) {
                if let Some(size) = element.attr(SIZE_ATTR).and_then(parse_size) {
                    signals.size = Some(signals.size.map_or(size, |s| s.max(size)));
                }
            }
            continue;
        }

        let text = match descendant.value() {
            XmlNode::Text(text) | XmlNode::CData(text) => text,
            _ => continue,
        };
        if text.trim().is_empty() {
            continue;
        }
        saw_text = true;
        let emphasized = descendant
            .ancestors()
            .take_while(|ancestor| ancestor.id() != paragraph)
            .filter_map(|ancestor| ancestor.value().as_element())
            .any(|el| el.is(RUN_TAG) && el.attr(STYLE_ATTR).is_some_and(is_emphasis_style));
        if !emphasized {
            plain_text = true;
        }
    }

    signals.emphasis_only = saw_text && !plain_text;
    signals
}
