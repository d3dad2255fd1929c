use super::XmlNode;
use ego_tree::{NodeId, NodeRef, Tree};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Desc(String),
    Child(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathQuery {
    steps: Vec<Selector>,
    attr: Option<(String, Option<String>)>,
}

impl PathQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `//body/p`-style paths. A step without a leading slash is a
    /// child step.
    pub fn parse(path: &str) -> Self {
        let mut query = Self::new();
        let mut rest = path.trim();
        while !rest.is_empty() {
            let descendant = rest.starts_with("//");
            rest = rest.trim_start_matches('/');
            let end = rest.find('/').unwrap_or(rest.len());
            let tag = &rest[..end];
            if !tag.is_empty() {
                query = if descendant {
                    query.desc(tag)
                } else {
                    query.child(tag)
                };
            }
            rest = &rest[end..];
        }
        query
    }

    pub fn child(mut self, tag: &str) -> Self {
        self.steps.push(Selector::Child(tag.to_string()));
        self
    }

    pub fn desc(mut self, tag: &str) -> Self {
        self.steps.push(Selector::Desc(tag.to_string()));
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attr = Some((name.to_string(), Some(value.to_string())));
        self
    }

    /// Keeps nodes carrying `name`, whatever its value.
    pub fn has_attr(mut self, name: &str) -> Self {
        self.attr = Some((name.to_string(), None));
        self
    }

    pub fn steps(&self) -> &[Selector] {
        &self.steps
    }

    /// Matching nodes in document order, without duplicates.
    pub fn evaluate(&self, tree: &Tree<XmlNode>) -> Vec<NodeId> {
        let mut context = vec![tree.root().id()];

        for step in &self.steps {
            let mut seen = HashSet::new();
            let mut next = Vec::new();
            for id in &context {
                let Some(node) = tree.get(*id) else {
                    continue;
                };
                let candidates: Box<dyn Iterator<Item = NodeRef<'_, XmlNode>>> = match step {
                    Selector::Child(_) => Box::new(node.children()),
                    Selector::Desc(_) => Box::new(node.descendants().skip(1)),
                };
                for candidate in candidates {
                    if step_matches(step, candidate) && seen.insert(candidate.id()) {
                        next.push(candidate.id());
                    }
                }
            }
            if next.len() > 1 && context.len() > 1 {
                sort_document_order(tree, &mut next);
            }
            context = next;
            if context.is_empty() {
                break;
            }
        }

        if let Some((name, value)) = &self.attr {
            context.retain(|id| {
                let found = tree
                    .get(*id)
                    .and_then(|node| node.value().as_element())
                    .and_then(|el| el.attr(name));
                match value {
                    Some(value) => found == Some(value.as_str()),
                    None => found.is_some(),
                }
            });
        }

        context
    }
}

fn step_matches(step: &Selector, node: NodeRef<'_, XmlNode>) -> bool {
    let Some(element) = node.value().as_element() else {
        return false;
    };
    let tag = match step {
        Selector::Desc(tag) | Selector::Child(tag) => tag,
    };
    tag == "*" || element.is(tag)
}

fn sort_document_order(tree: &Tree<XmlNode>, ids: &mut [NodeId]) {
    let order: HashMap<NodeId, usize> = tree
        .root()
        .descendants()
        .enumerate()
        .map(|(position, node)| (node.id(), position))
        .collect();
    ids.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
}
