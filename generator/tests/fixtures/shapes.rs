// This file is generated by uxsd-generator 0.1.0.
// Modify only if your build process doesn't involve regenerating this file.
//
// Cmdline: uxsd-generator tests/fixtures/shapes.xsd -o tests/fixtures/shapes.rs
// Input file: tests/fixtures/shapes.xsd
// blake3 of input file: 780f5c42072ce34ad9e2a553c03ad23aa378a982677227430b97c1569a5239d5

//!Generated by uxsd-generator 0.1.0
#![allow(dead_code, unused_imports, unused_mut, unused_variables)]
#![allow(clippy::all)]
use std::marker::PhantomData;
use uxsd_builtins::{
    meta, node, CharPool, CollapsedPool, CollapsedVec, Error, GroupAutomaton, PresenceBits,
    PresenceLayout, PresenceTracker,
};
pub static POINT_CONTENT: GroupAutomaton<'static> = GroupAutomaton::new(&[], &[], &[true]);
pub static POINT_ATTRIBUTES: PresenceLayout<'static, 1> = PresenceLayout::attributes(
    &["x", "y"],
    PresenceBits::from_ordinals(&[0, 1]),
);
///Content of `point` elements.
#[derive(Clone, Copy, Debug, Default)]
pub struct Point<'p> {
    pub x: i32,
    pub y: i32,
    _marker: PhantomData<&'p str>,
}
impl<'p> Point<'p> {
    /// Loads the attributes of `node`; children are left empty.
    pub fn load_shallow(node: roxmltree::Node, chars: &'p CharPool) -> Result<Self, Error> {
        let mut self_ = Self::default();
        let mut tracker = PresenceTracker::new(&POINT_ATTRIBUTES);
        for attribute in node::attributes(node) {
            match tracker.record(attribute.name())? {
                0 => self_.x = meta::parse_literal(attribute.value())?,
                1 => self_.y = meta::parse_literal(attribute.value())?,
                _ => {}
            }
        }
        tracker.finish()?;
        Ok(self_)
    }
    /// Validates the children of `node` and loads them, recursively.
    pub fn load_children(
        &mut self,
        node: roxmltree::Node,
        chars: &'p CharPool,
        pools: &mut Pools<'p>,
    ) -> Result<(), Error> {
        node::check_group(node, &POINT_CONTENT)?;
        Ok(())
    }
}
pub static SHAPE_CONTENT: GroupAutomaton<'static> = GroupAutomaton::new(
    &["label", "point", "shape", "tag"],
    &[
        Some(2),
        Some(1),
        None,
        None,
        None,
        Some(5),
        Some(4),
        Some(3),
        None,
        Some(1),
        None,
        None,
        None,
        None,
        None,
        Some(3),
        None,
        None,
        Some(4),
        Some(3),
        None,
        Some(5),
        Some(4),
        Some(3),
    ],
    &[false, true, false, true, true, true],
);
pub static SHAPE_ATTRIBUTES: PresenceLayout<'static, 1> = PresenceLayout::attributes(
    &["name"],
    PresenceBits::from_ordinals(&[]),
);
///Content of `shape` elements.
#[derive(Clone, Copy, Debug, Default)]
pub struct Shape<'p> {
    pub label: Option<&'p str>,
    pub point: CollapsedVec<Point<'p>>,
    pub shape: CollapsedVec<Shape<'p>>,
    pub tag: CollapsedVec<&'p str>,
    pub name: Option<&'p str>,
    _marker: PhantomData<&'p str>,
}
impl<'p> Shape<'p> {
    /// Loads the attributes of `node`; children are left empty.
    pub fn load_shallow(node: roxmltree::Node, chars: &'p CharPool) -> Result<Self, Error> {
        let mut self_ = Self::default();
        let mut tracker = PresenceTracker::new(&SHAPE_ATTRIBUTES);
        for attribute in node::attributes(node) {
            match tracker.record(attribute.name())? {
                0 => self_.name = Some(chars.add(attribute.value())),
                _ => {}
            }
        }
        tracker.finish()?;
        Ok(self_)
    }
    /// Validates the children of `node` and loads them, recursively.
    pub fn load_children(
        &mut self,
        node: roxmltree::Node,
        chars: &'p CharPool,
        pools: &mut Pools<'p>,
    ) -> Result<(), Error> {
        node::check_group(node, &SHAPE_CONTENT)?;
        if let Some(child) = node::children_named(node, "label").next() {
            node::check_simple(child)?;
            self.label = Some(chars.add(&node::text_content(child)));
        }
        self.point = CollapsedVec::new(&pools.point_pool);
        for child in node::children_named(node, "point") {
            let value = Point::load_shallow(child, chars)?;
            self.point.push(&mut pools.point_pool, value);
        }
        self.shape = CollapsedVec::new(&pools.shape_pool);
        for child in node::children_named(node, "shape") {
            let value = Shape::load_shallow(child, chars)?;
            self.shape.push(&mut pools.shape_pool, value);
        }
        self.tag = CollapsedVec::new(&pools.str_values);
        for child in node::children_named(node, "tag") {
            node::check_simple(child)?;
            let value = chars
                .add(
                    &meta::normalized_value(
                        &node::text_content(child),
                        meta::Whitespace::Collapse,
                    ),
                );
            self.tag.push(&mut pools.str_values, value);
        }
        for (index, child) in node::children_named(node, "point").enumerate() {
            let mut value = self.point.as_slice(&pools.point_pool)[index];
            value.load_children(child, chars, pools)?;
            self.point.as_mut_slice(&mut pools.point_pool)[index] = value;
        }
        for (index, child) in node::children_named(node, "shape").enumerate() {
            let mut value = self.shape.as_slice(&pools.shape_pool)[index];
            value.load_children(child, chars, pools)?;
            self.shape.as_mut_slice(&mut pools.shape_pool)[index] = value;
        }
        Ok(())
    }
}
///Loads a document whose root element is `shape`.
pub fn load_shape<'p>(
    document: &roxmltree::Document,
    chars: &'p CharPool,
    pools: &mut Pools<'p>,
) -> Result<Shape<'p>, Error> {
    let root = document.root_element();
    node::check_root(root, "shape")?;
    let mut value = Shape::load_shallow(root, chars)?;
    value.load_children(root, chars, pools)?;
    Ok(value)
}
/// Backing storage of every collapsed vector in a loaded document.
#[derive(Debug, Default)]
pub struct Pools<'p> {
    pub point_pool: CollapsedPool<Point<'p>>,
    pub shape_pool: CollapsedPool<Shape<'p>>,
    pub str_values: CollapsedPool<&'p str>,
    _marker: PhantomData<&'p str>,
}
impl Pools<'_> {
    pub fn clear(&mut self) {
        self.point_pool.clear();
        self.shape_pool.clear();
        self.str_values.clear();
    }
}
