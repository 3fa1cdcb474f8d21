use thiserror::Error;

/// A schema cannot be compiled into a parser.
///
/// These are reported to the schema author before any code is generated.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse the schema document: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("the document element is not xs:schema")]
    NotASchema,
    #[error("unsupported schema construct: {0}")]
    Unsupported(String),
    #[error("failed to resolve prefix {0:?} to a namespace URI")]
    NamePrefixNotResolved(String),
    #[error("unknown type {0:?}")]
    UnknownType(String),
    #[error("unknown {kind} {name:?}")]
    UnknownReference { kind: &'static str, name: String },
    #[error("{kind} {name:?} is defined more than once")]
    DuplicateDefinition { kind: &'static str, name: String },
    #[error("group {0:?} refers to itself")]
    CircularGroup(String),
    #[error("invalid occurrence bound {0:?}")]
    InvalidOccurs(String),
    #[error("minOccurs ({min}) is greater than maxOccurs ({max})")]
    UnsatisfiableOccurs { min: u64, max: u64 },
    #[error("occurrence bound {occurs} exceeds the unrolling limit of {limit}")]
    OccursLimitExceeded { occurs: u64, limit: u64 },
    #[error("the content model accepts no sequence of elements")]
    UnsatisfiableContentModel,
    #[error(
        "ambiguous content model: element {tag:?} matches two particles (#{first} and #{second}) \
         in the same position"
    )]
    AmbiguousContentModel { tag: String, first: u32, second: u32 },
    #[error("xs:all may only appear at the top of a content model")]
    NestedAllGroup,
    #[error("xs:all groups must have maxOccurs=\"1\"")]
    RepeatedAllGroup,
    #[error("members of xs:all must be elements")]
    InvalidAllMember,
    #[error("member {0:?} of xs:all may occur at most once")]
    RepeatedAllMember(String),
    #[error("member {0:?} appears more than once in xs:all")]
    DuplicateAllMember(String),
    #[error("attribute {0:?} is declared more than once")]
    DuplicateAttribute(String),
    #[error("element {name:?} is declared with both type {first:?} and type {second:?}")]
    InconsistentElementTypes {
        name: String,
        first: String,
        second: String,
    },
    #[error("in type {type_name:?}: {source}")]
    InType {
        type_name: String,
        #[source]
        source: Box<SchemaError>,
    },
}

impl SchemaError {
    pub(crate) fn in_type(self, type_name: &str) -> Self {
        Self::InType {
            type_name: type_name.to_string(),
            source: Box::new(self),
        }
    }
}
