use std::fmt;

use thiserror::Error;

/// What a content model would have accepted instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expected(pub Vec<String>);

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("end of element");
        }
        f.write_str(&self.0.join(" or "))
    }
}

/// The token that violated a content model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Found {
    Element(String),
    EndOfInput,
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(name) => f.write_str(name),
            Self::EndOfInput => f.write_str("end of input"),
        }
    }
}

/// A document does not conform to the compiled schema.
///
/// All variants are fatal: the parse that produced them is abandoned.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("expected {expected}, found {found}")]
    UnexpectedElement { expected: Expected, found: Found },
    #[error("missing required elements {}", .names.join(", "))]
    MissingElements { names: Vec<String> },
    #[error("missing required attributes {}", .names.join(", "))]
    MissingAttributes { names: Vec<String> },
    #[error("unexpected child element {name}")]
    UnexpectedChild { name: String },
    #[error("duplicate child element {name}")]
    DuplicateChild { name: String },
    #[error("unexpected attribute {name}")]
    UnexpectedAttribute { name: String },
    #[error("duplicate attribute {name}")]
    DuplicateAttribute { name: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("{value:?} is not a valid {type_name} literal")]
    Invalid {
        type_name: &'static str,
        value: String,
    },
}

/// Error type returned by generated loaders.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Literal(#[from] LiteralError),
}
