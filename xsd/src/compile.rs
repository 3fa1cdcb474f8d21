use std::collections::HashSet;

use crate::{
    all_group::AllGroupLayout,
    attributes::AttributeLayout,
    content_model::{ComplexType, ElementDeclaration, MaxOccurs, Schema, TypeRef},
    error::SchemaError,
    state_machine::GroupDfa,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    /// Largest finite occurrence bound that is unrolled into automaton states.
    pub max_unrolled_occurs: u64,
}

impl CompileOptions {
    pub const DEFAULT_MAX_UNROLLED_OCCURS: u64 = 1024;
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_unrolled_occurs: Self::DEFAULT_MAX_UNROLLED_OCCURS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentLayout {
    /// `sequence`/`choice` content, validated by an automaton.
    Group(GroupDfa),
    /// `all` content, validated by a presence set.
    All(AllGroupLayout),
}

/// A distinct child element name of a content model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildElement {
    pub name: String,
    pub type_: TypeRef,
    pub max_occurs: MaxOccurs,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledType {
    pub name: String,
    pub content: ContentLayout,
    pub attributes: AttributeLayout,
    /// In order of first appearance in the content model.
    pub children: Vec<ChildElement>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledSchema {
    pub elements: Vec<ElementDeclaration>,
    pub types: Vec<CompiledType>,
}

impl CompiledSchema {
    pub fn get(&self, name: &str) -> Option<&CompiledType> {
        self.types.iter().find(|ty| ty.name == name)
    }
}

pub fn compile_type(
    ty: &ComplexType,
    options: &CompileOptions,
) -> Result<CompiledType, SchemaError> {
    compile_type_inner(ty, options).map_err(|error| error.in_type(&ty.name))
}

fn compile_type_inner(
    ty: &ComplexType,
    options: &CompileOptions,
) -> Result<CompiledType, SchemaError> {
    let attributes = AttributeLayout::compile(&ty.attributes)?;
    let Some(particle) = &ty.content else {
        return Ok(CompiledType {
            name: ty.name.clone(),
            content: ContentLayout::Group(GroupDfa::empty()),
            attributes,
            children: Vec::new(),
        });
    };

    let mut first_types: Vec<(&str, &TypeRef)> = Vec::new();
    let mut inconsistent = None;
    particle.for_each_element(&mut |element| {
        match first_types.iter().find(|(name, _)| *name == element.name) {
            Some((_, first)) if **first != element.type_ && inconsistent.is_none() => {
                inconsistent = Some(SchemaError::InconsistentElementTypes {
                    name: element.name.clone(),
                    first: first.to_string(),
                    second: element.type_.to_string(),
                });
            }
            Some(_) => {}
            None => first_types.push((&element.name, &element.type_)),
        }
    });
    if let Some(error) = inconsistent {
        return Err(error);
    }

    let content = if particle.is_all() {
        ContentLayout::All(AllGroupLayout::compile(particle)?)
    } else {
        let dfa = GroupDfa::compile(particle, options.max_unrolled_occurs)?;
        tracing::trace!(dot = %dfa.to_dot(&ty.name), "automaton");
        ContentLayout::Group(dfa)
    };

    let children = particle
        .max_occurrences()
        .into_iter()
        .filter(|(_, max_occurs)| *max_occurs != MaxOccurs::Count(0))
        .map(|(element, max_occurs)| ChildElement {
            name: element.name.clone(),
            type_: element.type_.clone(),
            max_occurs,
        })
        .collect();

    Ok(CompiledType {
        name: ty.name.clone(),
        content,
        attributes,
        children,
    })
}

/// Compiles every complex type of `schema`, failing on the first invalid one.
pub fn compile_schema(
    schema: &Schema,
    options: &CompileOptions,
) -> Result<CompiledSchema, SchemaError> {
    let mut names = HashSet::new();
    for ty in &schema.complex_types {
        if !names.insert(ty.name.as_str()) {
            return Err(SchemaError::DuplicateDefinition {
                kind: "complex type",
                name: ty.name.clone(),
            });
        }
    }
    let check_type = |type_: &TypeRef| match type_ {
        TypeRef::Complex(name) if !names.contains(name.as_str()) => {
            Err(SchemaError::UnknownType(name.clone()))
        }
        _ => Ok(()),
    };
    for element in &schema.elements {
        check_type(&element.type_)?;
    }

    let mut types = Vec::with_capacity(schema.complex_types.len());
    for ty in &schema.complex_types {
        let compiled = compile_type(ty, options)?;
        for child in &compiled.children {
            check_type(&child.type_).map_err(|error| error.in_type(&ty.name))?;
        }
        types.push(compiled);
    }

    tracing::debug!(types = types.len(), roots = schema.elements.len(), "compiled schema");
    Ok(CompiledSchema {
        elements: schema.elements.clone(),
        types,
    })
}
