//! Ordered-tree view of an XML document with the structural edits the
//! hierarchy pass needs.
//!
//! Nodes live in an `ego_tree` arena, so a `NodeId` stays valid while the node
//! is wrapped or moved. Every mutating primitive commits before returning and
//! marks the document dirty; an untouched document persists byte-identical to
//! the text it was parsed from.

pub mod query;

use crate::error::DocumentError;
use ego_tree::{NodeId, NodeRef, Tree};
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::Path;

pub use query::{PathQuery, Selector};

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Root,
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    Decl(String),
    Pi(String),
    DocType(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub self_closing: bool,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            self_closing: false,
        }
    }

    /// Tag name without a namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.find(':') {
            Some(idx) => &self.name[idx + 1..],
            None => &self.name,
        }
    }

    pub fn is(&self, tag: &str) -> bool {
        self.local_name() == tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl XmlNode {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            XmlNode::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// State captured before a pass so it can be undone as a unit.
#[derive(Debug, Clone)]
pub struct Snapshot {
    tree: Tree<XmlNode>,
    dirty: bool,
}

#[derive(Debug, Clone)]
pub struct Document {
    tree: Tree<XmlNode>,
    source: String,
    dirty: bool,
}

impl Document {
    pub fn parse(xml: &str) -> Result<Self, DocumentError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut tree = Tree::new(XmlNode::Root);
        let root = tree.root().id();
        let mut open = vec![root];

        loop {
            let parent = open.last().copied().unwrap_or(root);
            match reader.read_event()? {
                Event::Start(ref start) => {
                    let element = element_from_start(start, false)?;
                    let id = append_child(&mut tree, parent, XmlNode::Element(element))?;
                    open.push(id);
                }
                Event::Empty(ref start) => {
                    let element = element_from_start(start, true)?;
                    append_child(&mut tree, parent, XmlNode::Element(element))?;
                }
                Event::End(ref end) => {
                    if open.len() == 1 {
                        return Err(DocumentError::UnexpectedEnd(
                            String::from_utf8_lossy(end.name().as_ref()).into_owned(),
                        ));
                    }
                    open.pop();
                }
                Event::Text(ref text) => {
                    let value = text.unescape().map_err(quick_xml::Error::from)?;
                    append_child(&mut tree, parent, XmlNode::Text(value.into_owned()))?;
                }
                Event::CData(ref cdata) => {
                    let value = String::from_utf8_lossy(cdata).into_owned();
                    append_child(&mut tree, parent, XmlNode::CData(value))?;
                }
                Event::Comment(ref comment) => {
                    let value = String::from_utf8_lossy(comment).into_owned();
                    append_child(&mut tree, parent, XmlNode::Comment(value))?;
                }
                Event::Decl(ref decl) => {
                    let value = String::from_utf8_lossy(decl).into_owned();
                    append_child(&mut tree, parent, XmlNode::Decl(value))?;
                }
                Event::PI(ref pi) => {
                    let value = String::from_utf8_lossy(pi).into_owned();
                    append_child(&mut tree, parent, XmlNode::Pi(value))?;
                }
                Event::DocType(ref doctype) => {
                    let value = String::from_utf8_lossy(doctype).into_owned();
                    append_child(&mut tree, parent, XmlNode::DocType(value))?;
                }
                Event::Eof => break,
            }
        }

        if let Some(&innermost) = open.last().filter(|_| open.len() > 1) {
            let name = tree
                .get(innermost)
                .and_then(|node| node.value().as_element().map(|el| el.name.clone()))
                .unwrap_or_default();
            return Err(DocumentError::Unclosed(name));
        }

        Ok(Self {
            tree,
            source: xml.to_string(),
            dirty: false,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let xml = fs::read_to_string(path)?;
        Self::parse(&xml)
    }

    pub fn persist<P: AsRef<Path>>(&self, path: P) -> Result<(), DocumentError> {
        fs::write(path, self.to_xml())?;
        Ok(())
    }

    pub fn to_xml(&self) -> String {
        if !self.dirty {
            return self.source.clone();
        }
        let mut out = String::with_capacity(self.source.len() + 256);
        write_node(self.tree.root(), &mut out);
        out
    }

    pub fn is_modified(&self) -> bool {
        self.dirty
    }

    pub fn tree(&self) -> &Tree<XmlNode> {
        &self.tree
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tree: self.tree.clone(),
            dirty: self.dirty,
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.tree = snapshot.tree;
        self.dirty = snapshot.dirty;
    }

    // Selection

    pub fn select(&self, query: &PathQuery) -> Vec<NodeId> {
        query.evaluate(&self.tree)
    }

    pub fn first(&self, query: &PathQuery) -> Option<NodeId> {
        self.select(query).into_iter().next()
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.tree.get(id).and_then(|node| node.value().as_element())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id)?.parent().map(|p| p.id())
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|node| node.children().map(|c| c.id()).collect())
            .unwrap_or_default()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id)?.first_child().map(|c| c.id())
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id)?.prev_sibling().map(|s| s.id())
    }

    /// The last node among `id` and its following siblings.
    pub fn last_sibling(&self, id: NodeId) -> Option<NodeId> {
        let node = self.tree.get(id)?;
        Some(node.next_siblings().last().map(|s| s.id()).unwrap_or(id))
    }

    pub fn is_following_sibling(&self, id: NodeId, other: NodeId) -> bool {
        self.tree
            .get(id)
            .map(|node| node.next_siblings().any(|s| s.id() == other))
            .unwrap_or(false)
    }

    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.tree
            .get(id)
            .map(|node| node.ancestors().any(|a| a.id() == ancestor))
            .unwrap_or(false)
    }

    /// True when `id` sits inside `ancestor` and nothing follows it there in
    /// document order: every hop from `id` up to `ancestor` is a last child.
    pub fn is_trailing_descendant(&self, id: NodeId, ancestor: NodeId) -> bool {
        let Some(mut node) = self.tree.get(id) else {
            return false;
        };
        loop {
            if node.next_sibling().is_some() {
                return false;
            }
            match node.parent() {
                Some(parent) if parent.id() == ancestor => return true,
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// Whitespace-normalized text of every text node below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.tree.get(id) else {
            return String::new();
        };
        let mut raw = String::new();
        for descendant in node.descendants() {
            match descendant.value() {
                XmlNode::Text(text) | XmlNode::CData(text) => {
                    raw.push_str(text);
                    raw.push(' ');
                }
                _ => {}
            }
        }
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    // Edits

    /// Wraps the sibling run `first..=last` in a new `tag` element placed where
    /// `first` was. Returns the new element.
    pub fn wrap(
        &mut self,
        first: NodeId,
        last: NodeId,
        tag: &str,
    ) -> Result<NodeId, DocumentError> {
        let run = self.sibling_run(first, last)?;
        if self.parent(first).is_none() {
            return Err(DocumentError::InvalidEdit(
                "cannot wrap a node without a parent".to_string(),
            ));
        }

        let wrapper = {
            let mut first_mut = self
                .tree
                .get_mut(first)
                .ok_or(DocumentError::UnknownNode(first))?;
            first_mut
                .insert_before(XmlNode::Element(Element::new(tag)))
                .id()
        };
        for id in run {
            let mut wrapper_mut = self
                .tree
                .get_mut(wrapper)
                .ok_or(DocumentError::UnknownNode(wrapper))?;
            wrapper_mut.append_id(id);
        }

        self.dirty = true;
        Ok(wrapper)
    }

    /// Relocates `id` (with its subtree) to be the immediate next sibling of
    /// `reference`.
    pub fn move_after(&mut self, id: NodeId, reference: NodeId) -> Result<(), DocumentError> {
        if id == reference || self.is_ancestor(id, reference) {
            return Err(DocumentError::InvalidEdit(format!(
                "cannot move {id:?} next to its own descendant {reference:?}"
            )));
        }
        if self.tree.get(id).is_none() {
            return Err(DocumentError::UnknownNode(id));
        }
        if self.parent(reference).is_none() {
            return Err(DocumentError::InvalidEdit(format!(
                "reference {reference:?} has no parent"
            )));
        }

        self.tree
            .get_mut(reference)
            .ok_or(DocumentError::UnknownNode(reference))?
            .insert_id_after(id);
        self.dirty = true;
        Ok(())
    }

    pub fn relabel(
        &mut self,
        id: NodeId,
        tag: &str,
        attrs: Vec<(String, String)>,
    ) -> Result<(), DocumentError> {
        self.with_element(id, |element| {
            element.name = tag.to_string();
            element.attrs = attrs;
        })?;
        self.dirty = true;
        Ok(())
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DocumentError> {
        self.with_element(id, |element| {
            match element.attrs.iter_mut().find(|(key, _)| key == name) {
                Some((_, existing)) => *existing = value.to_string(),
                None => element.attrs.push((name.to_string(), value.to_string())),
            }
        })?;
        self.dirty = true;
        Ok(())
    }

    /// Removes an attribute; returns whether it was present.
    pub fn delete_attr(&mut self, id: NodeId, name: &str) -> Result<bool, DocumentError> {
        let removed = self.with_element(id, |element| {
            let before = element.attrs.len();
            element.attrs.retain(|(key, _)| key != name);
            element.attrs.len() != before
        })?;
        if removed {
            self.dirty = true;
        }
        Ok(removed)
    }

    fn with_element<R>(
        &mut self,
        id: NodeId,
        edit: impl FnOnce(&mut Element) -> R,
    ) -> Result<R, DocumentError> {
        let mut node = self.tree.get_mut(id).ok_or(DocumentError::UnknownNode(id))?;
        match node.value() {
            XmlNode::Element(element) => Ok(edit(element)),
            _ => Err(DocumentError::NotAnElement(id)),
        }
    }

    fn sibling_run(&self, first: NodeId, last: NodeId) -> Result<Vec<NodeId>, DocumentError> {
        let node = self.tree.get(first).ok_or(DocumentError::UnknownNode(first))?;
        let mut run = vec![first];
        if first == last {
            return Ok(run);
        }
        for sibling in node.next_siblings() {
            run.push(sibling.id());
            if sibling.id() == last {
                return Ok(run);
            }
        }
        Err(DocumentError::InvalidEdit(format!(
            "{last:?} is not a following sibling of {first:?}"
        )))
    }
}

fn append_child(
    tree: &mut Tree<XmlNode>,
    parent: NodeId,
    value: XmlNode,
) -> Result<NodeId, DocumentError> {
    let mut parent_mut = tree.get_mut(parent).ok_or(DocumentError::UnknownNode(parent))?;
    Ok(parent_mut.append(value).id())
}

fn element_from_start(
    start: &BytesStart<'_>,
    self_closing: bool,
) -> Result<Element, DocumentError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(quick_xml::Error::from)?;
        attrs.push((key, value.into_owned()));
    }
    Ok(Element {
        name,
        attrs,
        self_closing,
    })
}

fn write_node(node: NodeRef<'_, XmlNode>, out: &mut String) {
    match node.value() {
        XmlNode::Root => {
            for child in node.children() {
                write_node(child, out);
            }
        }
        XmlNode::Element(element) => {
            out.push('<');
            out.push_str(&element.name);
            for (key, value) in &element.attrs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape(value.as_str()));
                out.push('"');
            }
            if element.self_closing && !node.has_children() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for child in node.children() {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(&element.name);
            out.push('>');
        }
        XmlNode::Text(text) => out.push_str(&partial_escape(text.as_str())),
        XmlNode::CData(text) => {
            out.push_str("<![CDATA[");
            out.push_str(text);
            out.push_str("]]>");
        }
        XmlNode::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        XmlNode::Decl(text) | XmlNode::Pi(text) => {
            out.push_str("<?");
            out.push_str(text);
            out.push_str("?>");
        }
        XmlNode::DocType(text) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(text.trim_start());
            out.push('>');
        }
    }
}
