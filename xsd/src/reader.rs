//! Maps an `xs:schema` document onto the restricted content model.
//!
//! Only the constructs needed to describe element trees are understood: global elements, named
//! and anonymous complex types, `sequence`/`choice`/`all`, named model and attribute groups, and
//! attributes of builtin atomic types. Anything else is reported as unsupported instead of being
//! silently dropped.

use std::collections::{HashMap, HashSet};

use roxmltree::{Node, NodeId};

use crate::{
    content_model::{
        AttributeUse, BuiltinType, ComplexType, ElementDeclaration, ElementParticle, MaxOccurs,
        Particle, Schema, Term, TypeRef,
    },
    error::SchemaError,
};

pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Parses `text` and reads the schema it contains.
pub fn parse_schema(text: &str, allow_dtd: bool) -> Result<Schema, SchemaError> {
    let options = roxmltree::ParsingOptions {
        allow_dtd,
        ..Default::default()
    };
    let document = roxmltree::Document::parse_with_options(text, options)?;
    read_schema(&document)
}

pub fn read_schema(document: &roxmltree::Document) -> Result<Schema, SchemaError> {
    let schema = document.root_element();
    if schema.tag_name().namespace() != Some(XS_NAMESPACE) || schema.tag_name().name() != "schema"
    {
        return Err(SchemaError::NotASchema);
    }

    let mut reader = Reader::default();
    for child in schema.children().filter(Node::is_element) {
        let kind = child.tag_name().name();
        let definitions = match kind {
            "annotation" => continue,
            "element" => &mut reader.elements,
            "complexType" => &mut reader.complex_types,
            "group" => &mut reader.groups,
            "attributeGroup" => &mut reader.attribute_groups,
            other => return Err(SchemaError::Unsupported(format!("top-level xs:{other}"))),
        };
        let name = required_attribute(child, "name")?;
        if definitions.insert(name, child).is_some() {
            return Err(SchemaError::DuplicateDefinition {
                kind: definition_kind(kind),
                name: name.to_string(),
            });
        }
        if kind == "complexType" {
            reader.used_type_names.insert(name.to_string());
        }
    }

    let mut elements = Vec::new();
    for child in schema.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "complexType" => {
                let name = required_attribute(child, "name")?;
                reader.read_complex_type(child, name.to_string())?;
            }
            "element" => {
                let name = required_attribute(child, "name")?;
                if child.has_attribute("substitutionGroup") {
                    return Err(SchemaError::Unsupported("substitution groups".into()));
                }
                let type_ = reader.global_element_type(name)?;
                elements.push(ElementDeclaration {
                    name: name.to_string(),
                    type_,
                });
            }
            _ => {}
        }
    }

    tracing::debug!(
        elements = elements.len(),
        complex_types = reader.output.len(),
        "read schema"
    );
    Ok(Schema {
        elements,
        complex_types: reader.output,
    })
}

fn definition_kind(tag: &str) -> &'static str {
    match tag {
        "element" => "element",
        "complexType" => "complex type",
        "group" => "group",
        _ => "attribute group",
    }
}

fn required_attribute<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, SchemaError> {
    node.attribute(name).ok_or_else(|| {
        SchemaError::Unsupported(format!(
            "xs:{} without a {name} attribute",
            node.tag_name().name()
        ))
    })
}

fn local_name(qname: &str) -> &str {
    qname.split_once(':').map_or(qname, |(_, local)| local)
}

fn read_occurs(node: Node) -> Result<(u64, MaxOccurs), SchemaError> {
    // {min occurs}
    //   The actual value of the minOccurs [attribute], if present, otherwise 1.
    let min_occurs = match node.attribute("minOccurs") {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| SchemaError::InvalidOccurs(value.to_string()))?,
        None => 1,
    };
    // {max occurs}
    //   unbounded, if the maxOccurs [attribute] equals unbounded, otherwise the actual value of
    //   the maxOccurs [attribute], if present, otherwise 1.
    let max_occurs = match node.attribute("maxOccurs").map(str::trim) {
        Some("unbounded") => MaxOccurs::Unbounded,
        Some(value) => MaxOccurs::Count(
            value
                .parse()
                .map_err(|_| SchemaError::InvalidOccurs(value.to_string()))?,
        ),
        None => MaxOccurs::Count(1),
    };
    Ok((min_occurs, max_occurs))
}

#[derive(Default)]
struct Reader<'a, 'input> {
    elements: HashMap<&'a str, Node<'a, 'input>>,
    complex_types: HashMap<&'a str, Node<'a, 'input>>,
    groups: HashMap<&'a str, Node<'a, 'input>>,
    attribute_groups: HashMap<&'a str, Node<'a, 'input>>,

    global_element_types: HashMap<&'a str, TypeRef>,
    /// Anonymous types of local elements, which group references may reach more than once.
    local_element_types: HashMap<NodeId, TypeRef>,
    used_type_names: HashSet<String>,
    visiting_groups: Vec<&'a str>,
    visiting_attribute_groups: Vec<&'a str>,
    output: Vec<ComplexType>,
}

impl<'a, 'input: 'a> Reader<'a, 'input> {
    fn resolve_type(&self, node: Node, qname: &str) -> Result<TypeRef, SchemaError> {
        let (prefix, local) = match qname.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, qname),
        };
        let namespace = node.lookup_namespace_uri(prefix);
        if prefix.is_some() && namespace.is_none() {
            return Err(SchemaError::NamePrefixNotResolved(qname.to_string()));
        }

        if namespace == Some(XS_NAMESPACE) {
            BuiltinType::from_xs_name(local)
                .map(TypeRef::Builtin)
                .ok_or_else(|| SchemaError::Unsupported(format!("builtin type xs:{local}")))
        } else if self.complex_types.contains_key(local) {
            Ok(TypeRef::Complex(local.to_string()))
        } else {
            Err(SchemaError::UnknownType(qname.to_string()))
        }
    }

    /// Picks a type name for an anonymous complex type declared by element `element`.
    fn anonymous_type_name(&mut self, element: &str) -> String {
        let mut name = element.to_string();
        let mut suffix = 1;
        while self.used_type_names.contains(&name) {
            name = if suffix == 1 {
                format!("{element}Type")
            } else {
                format!("{element}Type{suffix}")
            };
            suffix += 1;
        }
        self.used_type_names.insert(name.clone());
        name
    }

    /// The type of a local element declaration with a `type` attribute or an inline complex
    /// type.
    fn element_type(
        &mut self,
        element: Node<'a, 'input>,
        name: &str,
    ) -> Result<TypeRef, SchemaError> {
        if let Some(qname) = element.attribute("type") {
            return self.resolve_type(element, qname);
        }
        if let Some(type_) = self.local_element_types.get(&element.id()) {
            return Ok(type_.clone());
        }
        let type_name = self.anonymous_type_name(name);
        let type_ = TypeRef::Complex(type_name.clone());
        self.local_element_types.insert(element.id(), type_.clone());
        self.read_anonymous_type(element, name, type_name)?;
        Ok(type_)
    }

    fn read_anonymous_type(
        &mut self,
        element: Node<'a, 'input>,
        name: &str,
        type_name: String,
    ) -> Result<(), SchemaError> {
        let mut anonymous = None;
        for child in element.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "annotation" => {}
                "complexType" => anonymous = Some(child),
                other => {
                    return Err(SchemaError::Unsupported(format!(
                        "xs:{other} in element {name:?}"
                    )))
                }
            }
        }
        match anonymous {
            Some(complex_type) => self.read_complex_type(complex_type, type_name),
            None => Err(SchemaError::Unsupported(format!(
                "element {name:?} without a type"
            ))),
        }
    }

    fn global_element_type(&mut self, name: &str) -> Result<TypeRef, SchemaError> {
        if let Some(type_) = self.global_element_types.get(name) {
            return Ok(type_.clone());
        }
        let Some((&key, &element)) = self.elements.get_key_value(name) else {
            return Err(SchemaError::UnknownReference {
                kind: "element",
                name: name.to_string(),
            });
        };

        if let Some(qname) = element.attribute("type") {
            let type_ = self.resolve_type(element, qname)?;
            self.global_element_types.insert(key, type_.clone());
            return Ok(type_);
        }
        // Registered before reading so that recursive references resolve.
        let type_name = self.anonymous_type_name(name);
        let type_ = TypeRef::Complex(type_name.clone());
        self.global_element_types.insert(key, type_.clone());
        self.read_anonymous_type(element, name, type_name)?;
        Ok(type_)
    }

    fn read_complex_type(
        &mut self,
        node: Node<'a, 'input>,
        name: String,
    ) -> Result<(), SchemaError> {
        let mut content = None;
        let mut attributes = Vec::new();
        self.read_complex_type_children(node, &mut content, &mut attributes)
            .map_err(|error| error.in_type(&name))?;
        tracing::trace!(%name, attributes = attributes.len(), "read complex type");
        self.output.push(ComplexType {
            name,
            content,
            attributes,
        });
        Ok(())
    }

    fn read_complex_type_children(
        &mut self,
        node: Node<'a, 'input>,
        content: &mut Option<Particle>,
        attributes: &mut Vec<AttributeUse>,
    ) -> Result<(), SchemaError> {
        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "annotation" => {}
                "sequence" | "choice" | "all" | "group" if content.is_none() => {
                    *content = Some(self.read_particle(child)?);
                }
                "attribute" => attributes.extend(self.read_attribute(child)?),
                "attributeGroup" => self.read_attribute_group_ref(child, attributes)?,
                other => {
                    return Err(SchemaError::Unsupported(format!(
                        "xs:{other} in a complex type"
                    )))
                }
            }
        }
        Ok(())
    }

    fn read_particles(&mut self, node: Node<'a, 'input>) -> Result<Vec<Particle>, SchemaError> {
        node.children()
            .filter(|child| child.is_element() && child.tag_name().name() != "annotation")
            .map(|child| self.read_particle(child))
            .collect()
    }

    fn read_particle(&mut self, node: Node<'a, 'input>) -> Result<Particle, SchemaError> {
        let (min_occurs, max_occurs) = read_occurs(node)?;
        let term = match node.tag_name().name() {
            "element" => Term::Element(self.read_element(node)?),
            "sequence" => Term::Sequence(self.read_particles(node)?),
            "choice" => Term::Choice(self.read_particles(node)?),
            "all" => Term::All(self.read_particles(node)?),
            "group" => self.read_group_ref(node)?,
            "any" => return Err(SchemaError::Unsupported("xs:any wildcards".into())),
            other => return Err(SchemaError::Unsupported(format!("xs:{other} in a model group"))),
        };
        Ok(Particle {
            min_occurs,
            max_occurs,
            term,
        })
    }

    fn read_element(&mut self, node: Node<'a, 'input>) -> Result<ElementParticle, SchemaError> {
        if let Some(reference) = node.attribute("ref") {
            let name = local_name(reference);
            let type_ = self.global_element_type(name)?;
            return Ok(ElementParticle {
                name: name.to_string(),
                type_,
            });
        }
        let name = required_attribute(node, "name")?;
        let type_ = self.element_type(node, name)?;
        Ok(ElementParticle {
            name: name.to_string(),
            type_,
        })
    }

    /// The term of the model group a `<group ref>` points to.
    fn read_group_ref(&mut self, node: Node<'a, 'input>) -> Result<Term, SchemaError> {
        let name = local_name(required_attribute(node, "ref")?);
        let Some((&key, &group)) = self.groups.get_key_value(name) else {
            return Err(SchemaError::UnknownReference {
                kind: "group",
                name: name.to_string(),
            });
        };
        if self.visiting_groups.contains(&key) {
            return Err(SchemaError::CircularGroup(name.to_string()));
        }

        let compositor = group
            .children()
            .find(|child| child.is_element() && child.tag_name().name() != "annotation")
            .ok_or_else(|| SchemaError::Unsupported(format!("empty group {name:?}")))?;
        self.visiting_groups.push(key);
        let term = self.read_particle(compositor).map(|particle| particle.term);
        self.visiting_groups.pop();
        term
    }

    fn read_attribute(&self, node: Node) -> Result<Option<AttributeUse>, SchemaError> {
        if node.has_attribute("ref") {
            return Err(SchemaError::Unsupported("attribute references".into()));
        }
        let name = required_attribute(node, "name")?;
        let required = match node.attribute("use") {
            Some("prohibited") => return Ok(None),
            Some("required") => true,
            _ => false,
        };
        if node
            .children()
            .any(|child| child.is_element() && child.tag_name().name() == "simpleType")
        {
            return Err(SchemaError::Unsupported(format!(
                "xs:simpleType in attribute {name:?}"
            )));
        }
        let type_ = match node.attribute("type") {
            Some(qname) => match self.resolve_type(node, qname)? {
                TypeRef::Builtin(builtin) => builtin,
                TypeRef::Complex(_) => {
                    return Err(SchemaError::Unsupported(format!(
                        "attribute {name:?} of complex type {qname:?}"
                    )))
                }
            },
            None => BuiltinType::String,
        };
        Ok(Some(AttributeUse {
            name: name.to_string(),
            required,
            type_,
        }))
    }

    fn read_attribute_group_ref(
        &mut self,
        node: Node<'a, 'input>,
        attributes: &mut Vec<AttributeUse>,
    ) -> Result<(), SchemaError> {
        let name = local_name(required_attribute(node, "ref")?);
        let Some((&key, &group)) = self.attribute_groups.get_key_value(name) else {
            return Err(SchemaError::UnknownReference {
                kind: "attribute group",
                name: name.to_string(),
            });
        };
        if self.visiting_attribute_groups.contains(&key) {
            return Err(SchemaError::CircularGroup(name.to_string()));
        }

        self.visiting_attribute_groups.push(key);
        let result = group
            .children()
            .filter(Node::is_element)
            .try_for_each(|child| match child.tag_name().name() {
                "annotation" => Ok(()),
                "attribute" => {
                    attributes.extend(self.read_attribute(child)?);
                    Ok(())
                }
                "attributeGroup" => self.read_attribute_group_ref(child, attributes),
                other => Err(SchemaError::Unsupported(format!(
                    "xs:{other} in an attribute group"
                ))),
            });
        self.visiting_attribute_groups.pop();
        result
    }
}
