//! Helpers for generated loaders that read documents through roxmltree.

use std::borrow::Cow;

use roxmltree::{Attribute, Node};

use crate::{
    automaton::{GroupAutomaton, GroupCursor},
    error::{Expected, Found, ValidationError},
    presence::{PresenceLayout, PresenceTracker},
    PresenceBits,
};

pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Attributes of `node` other than `xsi:*` instance attributes.
pub fn attributes<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Attribute<'a, 'input>> {
    node.attributes()
        .filter(|attribute| attribute.namespace() != Some(XSI_NAMESPACE))
}

pub fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

pub fn children_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    element_children(node).filter(move |child| child.tag_name().name() == name)
}

/// The concatenated character data of `node`.
///
/// The initial value of an element is the string composed of the character children of that
/// element, in order; `Node::text()` only returns the first text child.
pub fn text_content<'a>(node: Node<'a, '_>) -> Cow<'a, str> {
    let mut texts = node
        .children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text());
    let Some(first) = texts.next() else {
        return Cow::Borrowed("");
    };
    match texts.next() {
        None => Cow::Borrowed(first),
        Some(second) => {
            let mut text = String::from(first);
            text.push_str(second);
            texts.for_each(|rest| text.push_str(rest));
            Cow::Owned(text)
        }
    }
}

/// Runs the element children of `node` through a sequence/choice automaton.
pub fn check_group(node: Node, automaton: &GroupAutomaton) -> Result<(), ValidationError> {
    let mut cursor = GroupCursor::new(automaton);
    for child in element_children(node) {
        cursor.step(child.tag_name().name())?;
    }
    cursor.finish()
}

/// Runs the element children of `node` through an `xs:all` layout.
pub fn check_all_group<const WORDS: usize>(
    node: Node,
    layout: &PresenceLayout<WORDS>,
) -> Result<PresenceBits<WORDS>, ValidationError> {
    let mut tracker = PresenceTracker::new(layout);
    for child in element_children(node) {
        tracker.record(child.tag_name().name())?;
    }
    tracker.finish()
}

/// Checks that an element of simple type carries neither attributes nor element children.
pub fn check_simple(node: Node) -> Result<(), ValidationError> {
    if let Some(attribute) = attributes(node).next() {
        return Err(ValidationError::UnexpectedAttribute {
            name: attribute.name().to_string(),
        });
    }
    if let Some(child) = element_children(node).next() {
        return Err(ValidationError::UnexpectedElement {
            expected: Expected(Vec::new()),
            found: Found::Element(child.tag_name().name().to_string()),
        });
    }
    Ok(())
}

/// Checks that the document element is named `name`.
pub fn check_root(node: Node, name: &str) -> Result<(), ValidationError> {
    let found = node.tag_name().name();
    if found == name {
        Ok(())
    } else {
        Err(ValidationError::UnexpectedElement {
            expected: Expected(vec![name.to_string()]),
            found: Found::Element(found.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_content_joins_all_text_children() {
        let doc = roxmltree::Document::parse("<a>one<!-- c -->two<b/>three</a>").unwrap();
        let root = doc.root_element();
        assert_eq!(text_content(root), "onetwothree");

        let doc = roxmltree::Document::parse("<a>single</a>").unwrap();
        assert!(matches!(text_content(doc.root_element()), Cow::Borrowed("single")));
    }

    #[test]
    fn children_are_filtered_by_name() {
        let doc = roxmltree::Document::parse("<a><x/>text<y/><x/></a>").unwrap();
        let root = doc.root_element();
        assert_eq!(element_children(root).count(), 3);
        assert_eq!(children_named(root, "x").count(), 2);
    }

    #[test]
    fn instance_attributes_are_skipped() {
        let doc = roxmltree::Document::parse(
            r#"<a xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="t" x="1"/>"#,
        )
        .unwrap();
        let names: Vec<_> = attributes(doc.root_element()).map(|a| a.name()).collect();
        assert_eq!(names, ["x"]);
    }

    #[test]
    fn simple_elements_have_only_text() {
        let doc = roxmltree::Document::parse("<a>1</a>").unwrap();
        assert_eq!(check_simple(doc.root_element()), Ok(()));

        let doc = roxmltree::Document::parse("<a>1<b/></a>").unwrap();
        let error = check_simple(doc.root_element()).unwrap_err();
        assert_eq!(error.to_string(), "expected end of element, found b");

        let doc = roxmltree::Document::parse(r#"<a unit="cm">1</a>"#).unwrap();
        let error = check_simple(doc.root_element()).unwrap_err();
        assert_eq!(error.to_string(), "unexpected attribute unit");
    }

    #[test]
    fn check_root_reports_the_expected_name() {
        let doc = roxmltree::Document::parse("<other/>").unwrap();
        let error = check_root(doc.root_element(), "config").unwrap_err();
        assert_eq!(error.to_string(), "expected config, found other");
    }
}
