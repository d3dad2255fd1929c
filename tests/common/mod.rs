#![allow(dead_code)]
use sectioner::document::{Document, PathQuery, XmlNode};
use std::path::Path;

pub fn fixtures_dir() -> String {
    format!("{}/tests/fixtures", env!("CARGO_MANIFEST_DIR"))
}

pub fn load_fixture(filename: &str) -> String {
    let path = Path::new(&fixtures_dir()).join(filename);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

pub fn parse_fixture(filename: &str) -> Document {
    Document::parse(&load_fixture(filename))
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", filename, e))
}

/// A flat body where heading `i` is `H{i}` at the given size, followed by one
/// body paragraph `t{i}`.
pub fn flat_document(sizes: &[f64]) -> String {
    let mut body = String::new();
    for (i, size) in sizes.iter().enumerate() {
        body.push_str(&format!(
            "<p><hi rend=\"bold\" size=\"{size}\">H{i}</hi></p><p>t{i}</p>"
        ));
    }
    format!("<TEI><text><body>{body}</body></text></TEI>")
}

/// Same layout as [`flat_document`] but ranked by `heading N` styles.
pub fn styled_document(levels: &[u32]) -> String {
    let mut body = String::new();
    for (i, level) in levels.iter().enumerate() {
        body.push_str(&format!(
            "<p rend=\"Heading {level}\">H{i}</p><p>t{i}</p>"
        ));
    }
    format!("<TEI><text><body>{body}</body></text></TEI>")
}

pub fn body(doc: &Document) -> ego_tree::NodeId {
    doc.first(&PathQuery::parse("//body"))
        .expect("document has a body")
}

/// Compact rendering of the body: sections as `div(...)`, headings as `#text`,
/// other elements as their text.
pub fn outline_of(doc: &Document) -> String {
    let body = body(doc);
    doc.children(body)
        .into_iter()
        .filter_map(|child| render(doc, child))
        .collect::<Vec<_>>()
        .join(" ")
}

fn render(doc: &Document, id: ego_tree::NodeId) -> Option<String> {
    match doc.tree().get(id)?.value() {
        XmlNode::Element(element) if element.is("div") => {
            let inner = doc
                .children(id)
                .into_iter()
                .filter_map(|child| render(doc, child))
                .collect::<Vec<_>>()
                .join(" ");
            Some(format!("div({inner})"))
        }
        XmlNode::Element(element) if element.is("head") => {
            Some(format!("#{}", doc.text_content(id)))
        }
        XmlNode::Element(_) => Some(doc.text_content(id)),
        XmlNode::Text(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    }
}

/// Every non-whitespace text node, in document order.
pub fn leaf_texts(doc: &Document) -> Vec<String> {
    doc.tree()
        .root()
        .descendants()
        .filter_map(|node| match node.value() {
            XmlNode::Text(text) | XmlNode::CData(text) if !text.trim().is_empty() => {
                Some(text.trim().to_string())
            }
            _ => None,
        })
        .collect()
}
