//! A generated parser, checked in under `fixtures/`, run against documents.

#[path = "fixtures/shapes.rs"]
mod shapes;

use shapes::{load_shape, Pools};
use uxsd_builtins::{CharPool, Error, Expected, Found, ValidationError};

const DRAWING: &str = r#"
<shape name="outer" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:noNamespaceSchemaLocation="shapes.xsd">
    <label>Outer <!-- split -->frame</label>
    <point x="0" y="0"/>
    <point x="10" y="-4"/>
    <shape name="inner">
        <point x="1" y="1"/>
        <point x="2" y="2"/>
        <point x="3" y="3"/>
        <tag>  filled
            blue </tag>
    </shape>
    <shape>
        <point x="7" y="7"/>
    </shape>
    <tag>frame</tag>
</shape>
"#;

fn load(text: &str) -> Result<(), Error> {
    let document = roxmltree::Document::parse(text).unwrap();
    let chars = CharPool::new();
    let mut pools = Pools::default();
    load_shape(&document, &chars, &mut pools).map(drop)
}

#[test]
fn loads_nested_documents() {
    let document = roxmltree::Document::parse(DRAWING).unwrap();
    let chars = CharPool::new();
    let mut pools = Pools::default();
    let outer = load_shape(&document, &chars, &mut pools).unwrap();

    assert_eq!(outer.name, Some("outer"));
    assert_eq!(outer.label, Some("Outer frame"));
    let points: Vec<_> = outer
        .point
        .iter(&pools.point_pool)
        .map(|point| (point.x, point.y))
        .collect();
    assert_eq!(points, [(0, 0), (10, -4)]);
    assert_eq!(outer.tag.as_slice(&pools.str_values), ["frame"]);

    let [inner, last] = outer.shape.as_slice(&pools.shape_pool) else {
        panic!("expected two nested shapes");
    };
    assert_eq!(inner.name, Some("inner"));
    assert_eq!(inner.label, None);
    assert_eq!(inner.point.len(), 3);
    assert_eq!(inner.point.last(&pools.point_pool).map(|point| point.x), Some(3));
    assert_eq!(inner.tag.as_slice(&pools.str_values), ["filled blue"]);
    assert_eq!(last.name, None);
    assert_eq!(last.point.first(&pools.point_pool).map(|point| point.y), Some(7));
    assert!(last.shape.is_empty());

    assert_eq!(pools.point_pool.len(), 6);
    assert_eq!(pools.shape_pool.len(), 2);
}

#[test]
fn pools_can_be_reused() {
    let chars = CharPool::new();
    let mut pools = Pools::default();
    let document = roxmltree::Document::parse(DRAWING).unwrap();
    load_shape(&document, &chars, &mut pools).unwrap();
    pools.clear();
    let outer = load_shape(&document, &chars, &mut pools).unwrap();
    assert_eq!(outer.point.len(), 2);
    assert_eq!(pools.point_pool.len(), 6);
}

#[test]
fn rejects_children_out_of_order() {
    let error = load(r#"<shape><point x="0" y="0"/><label>late</label></shape>"#).unwrap_err();
    assert_eq!(
        error,
        Error::Validation(ValidationError::UnexpectedElement {
            expected: Expected(vec!["point".into(), "shape".into(), "tag".into()]),
            found: Found::Element("label".into()),
        })
    );
}

#[test]
fn rejects_missing_required_content() {
    let error = load("<shape><label>empty</label></shape>").unwrap_err();
    assert_eq!(error.to_string(), "expected point, found end of input");

    let error = load(r#"<shape><point x="1"/></shape>"#).unwrap_err();
    assert_eq!(error.to_string(), "missing required attributes y");
}

#[test]
fn rejects_unknown_attributes_and_bad_literals() {
    let error = load(r#"<shape colour="red"><point x="0" y="0"/></shape>"#).unwrap_err();
    assert_eq!(error.to_string(), "unexpected attribute colour");

    let error = load(r#"<shape><point x="zero" y="0"/></shape>"#).unwrap_err();
    assert!(matches!(error, Error::Literal(_)), "{error:?}");
}

#[test]
fn rejects_markup_in_simple_content() {
    let error = load(r#"<shape><label><b>bold</b></label><point x="0" y="0"/></shape>"#)
        .unwrap_err();
    assert_eq!(error.to_string(), "expected end of element, found b");
}

#[test]
fn rejects_other_root_elements() {
    assert!(load(r#"<point x="0" y="0"/>"#).is_err());
}
