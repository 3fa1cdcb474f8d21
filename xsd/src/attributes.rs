use crate::{content_model::AttributeUse, error::SchemaError};

/// The presence layout of a type's attributes, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeLayout {
    attributes: Vec<AttributeUse>,
}

impl AttributeLayout {
    pub fn compile(uses: &[AttributeUse]) -> Result<Self, SchemaError> {
        let mut attributes: Vec<AttributeUse> = Vec::with_capacity(uses.len());
        for attribute in uses {
            if attributes.iter().any(|seen| seen.name == attribute.name) {
                return Err(SchemaError::DuplicateAttribute(attribute.name.clone()));
            }
            attributes.push(attribute.clone());
        }
        Ok(Self { attributes })
    }

    pub fn attributes(&self) -> &[AttributeUse] {
        &self.attributes
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|attribute| attribute.name == name)
    }

    pub fn required_ordinals(&self) -> impl Iterator<Item = usize> + '_ {
        self.attributes
            .iter()
            .enumerate()
            .filter(|(_, attribute)| attribute.required)
            .map(|(ordinal, _)| ordinal)
    }

    /// Number of 64-bit words in the presence set.
    pub fn words(&self) -> usize {
        self.attributes.len().div_ceil(64).max(1)
    }
}
