mod common;

use common::{load_fixture, parse_fixture};
use sectioner::document::{Document, PathQuery};
use sectioner::error::DocumentError;

#[test]
fn test_unmodified_document_persists_byte_identical() {
    let xml = load_fixture("article.xml");
    let doc = Document::parse(&xml).expect("parse");
    assert!(!doc.is_modified());
    assert_eq!(doc.to_xml(), xml);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.xml");
    doc.persist(&path).expect("persist");
    assert_eq!(std::fs::read_to_string(&path).expect("read back"), xml);
}

#[test]
fn test_load_reads_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("in.xml");
    std::fs::write(&path, "<a><b>x</b></a>").expect("write");

    let doc = Document::load(&path).expect("load");
    assert_eq!(doc.select(&PathQuery::parse("//b")).len(), 1);
}

#[test]
fn test_select_returns_document_order() {
    let doc = Document::parse("<r><s><p>1</p><q><p>2</p></q></s><p>3</p></r>").unwrap();
    let texts: Vec<String> = doc
        .select(&PathQuery::parse("//p"))
        .into_iter()
        .map(|id| doc.text_content(id))
        .collect();
    assert_eq!(texts, vec!["1", "2", "3"]);

    let direct: Vec<String> = doc
        .select(&PathQuery::parse("/r/p"))
        .into_iter()
        .map(|id| doc.text_content(id))
        .collect();
    assert_eq!(direct, vec!["3"]);
}

#[test]
fn test_select_matches_local_names_and_attributes() {
    let doc = parse_fixture("article.xml");
    assert_eq!(doc.select(&PathQuery::parse("//body/p")).len(), 12);

    let doc = Document::parse(r#"<r><p n="1">a</p><p n="2">b</p><x n="2">c</x></r>"#).unwrap();
    let hits = doc.select(&PathQuery::new().desc("*").with_attr("n", "2"));
    assert_eq!(hits.len(), 2);
    assert_eq!(doc.text_content(hits[0]), "b");
    assert_eq!(doc.text_content(hits[1]), "c");
}

#[test]
fn test_wrap_groups_a_sibling_run() {
    let mut doc = Document::parse("<r><a/><b/><c/><d/></r>").unwrap();
    let b = doc.first(&PathQuery::parse("//b")).unwrap();
    let c = doc.first(&PathQuery::parse("//c")).unwrap();

    let div = doc.wrap(b, c, "div").expect("wrap");
    assert!(doc.is_modified());
    assert_eq!(doc.parent(b), Some(div));
    assert_eq!(doc.to_xml(), "<r><a/><div><b/><c/></div><d/></r>");
}

#[test]
fn test_wrap_rejects_a_non_sibling_run() {
    let mut doc = Document::parse("<r><a/><s><b/></s></r>").unwrap();
    let a = doc.first(&PathQuery::parse("//a")).unwrap();
    let b = doc.first(&PathQuery::parse("//b")).unwrap();

    let err = doc.wrap(a, b, "div").unwrap_err();
    assert!(matches!(err, DocumentError::InvalidEdit(_)));
    assert!(!doc.is_modified());
}

#[test]
fn test_move_after_relocates_a_subtree() {
    let mut doc = Document::parse("<r><x><a/><y><b/></y></x><z/></r>").unwrap();
    let x = doc.first(&PathQuery::parse("//x")).unwrap();
    let y = doc.first(&PathQuery::parse("//y")).unwrap();

    doc.move_after(y, x).expect("move");
    assert_eq!(doc.to_xml(), "<r><x><a/></x><y><b/></y><z/></r>");
    assert_eq!(doc.prev_sibling(y), Some(x));
}

#[test]
fn test_move_after_refuses_cycles() {
    let mut doc = Document::parse("<r><x><y/></x></r>").unwrap();
    let x = doc.first(&PathQuery::parse("//x")).unwrap();
    let y = doc.first(&PathQuery::parse("//y")).unwrap();

    assert!(doc.move_after(x, y).is_err());
    assert!(doc.move_after(x, x).is_err());
}

#[test]
fn test_relabel_and_attribute_edits() {
    let mut doc = Document::parse(r#"<r><p rend="bold">T &amp; C</p></r>"#).unwrap();
    let p = doc.first(&PathQuery::parse("//p")).unwrap();

    doc.set_attr(p, "n", "1").unwrap();
    assert_eq!(doc.attr(p, "n"), Some("1"));
    doc.set_attr(p, "n", "2").unwrap();
    assert_eq!(doc.attr(p, "n"), Some("2"));

    assert!(doc.delete_attr(p, "n").unwrap());
    assert!(!doc.delete_attr(p, "n").unwrap());

    doc.relabel(p, "head", vec![("type".to_string(), "a\"b".to_string())])
        .unwrap();
    assert_eq!(
        doc.to_xml(),
        r#"<r><head type="a&quot;b">T &amp; C</head></r>"#
    );
}

#[test]
fn test_edits_on_non_elements_fail() {
    let mut doc = Document::parse("<r>text</r>").unwrap();
    let r = doc.first(&PathQuery::parse("/r")).unwrap();
    let text = doc.first_child(r).unwrap();
    assert!(matches!(
        doc.set_attr(text, "n", "1"),
        Err(DocumentError::NotAnElement(_))
    ));
}

#[test]
fn test_snapshot_restore_undoes_edits() {
    let xml = "<r><a/><b/></r>";
    let mut doc = Document::parse(xml).unwrap();
    let snapshot = doc.snapshot();

    let a = doc.first(&PathQuery::parse("//a")).unwrap();
    let b = doc.first(&PathQuery::parse("//b")).unwrap();
    doc.wrap(a, b, "div").unwrap();
    assert_ne!(doc.to_xml(), xml);

    doc.restore(snapshot);
    assert!(!doc.is_modified());
    assert_eq!(doc.to_xml(), xml);
}

#[test]
fn test_trailing_descendant() {
    let doc = Document::parse("<r><s><a/><t><b/></t></s><c/></r>").unwrap();
    let s = doc.first(&PathQuery::parse("//s")).unwrap();
    let t = doc.first(&PathQuery::parse("//t")).unwrap();
    let a = doc.first(&PathQuery::parse("//a")).unwrap();
    let b = doc.first(&PathQuery::parse("//b")).unwrap();

    assert!(doc.is_trailing_descendant(t, s));
    assert!(doc.is_trailing_descendant(b, s));
    assert!(!doc.is_trailing_descendant(a, s));
}

#[test]
fn test_malformed_input_is_rejected() {
    assert!(matches!(
        Document::parse("<r><a></r>"),
        Err(DocumentError::Xml(_))
    ));
    assert!(Document::parse("<r><a>").is_err());
}
