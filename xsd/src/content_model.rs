//! The abstract content model of a complex type.
//!
//! This is the restricted subset of the XSD component model the compiler understands: element
//! particles arranged in `sequence`, `choice` and top-level `all` groups, plus attribute uses with
//! atomic builtin types.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaxOccurs {
    Unbounded,
    Count(u64),
}

impl MaxOccurs {
    pub fn add(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Unbounded, _) | (_, Self::Unbounded) => Self::Unbounded,
            (Self::Count(a), Self::Count(b)) => Self::Count(a.saturating_add(*b)),
        }
    }

    pub fn mul(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Count(0), _) | (_, Self::Count(0)) => Self::Count(0),
            (Self::Unbounded, _) | (_, Self::Unbounded) => Self::Unbounded,
            (Self::Count(a), Self::Count(b)) => Self::Count(a.saturating_mul(*b)),
        }
    }

    pub fn max(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Unbounded, _) | (_, Self::Unbounded) => Self::Unbounded,
            (Self::Count(a), Self::Count(b)) => Self::Count((*a).max(*b)),
        }
    }

    /// Whether more than one occurrence is allowed.
    pub fn is_many(&self) -> bool {
        !matches!(self, Self::Count(0 | 1))
    }
}

impl fmt::Display for MaxOccurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => f.write_str("unbounded"),
            Self::Count(count) => write!(f, "{count}"),
        }
    }
}

/// The atomic builtin datatypes accepted as attribute and simple element types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinType {
    String,
    NormalizedString,
    Token,
    Language,
    Name,
    NCName,
    NMTOKEN,
    ID,
    IDREF,
    AnyURI,
    Boolean,
    Float,
    Double,
    Decimal,
    Integer,
    NonPositiveInteger,
    NegativeInteger,
    Long,
    Int,
    Short,
    Byte,
    NonNegativeInteger,
    PositiveInteger,
    UnsignedLong,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
}

impl BuiltinType {
    pub const ALL: [Self; 27] = [
        Self::String,
        Self::NormalizedString,
        Self::Token,
        Self::Language,
        Self::Name,
        Self::NCName,
        Self::NMTOKEN,
        Self::ID,
        Self::IDREF,
        Self::AnyURI,
        Self::Boolean,
        Self::Float,
        Self::Double,
        Self::Decimal,
        Self::Integer,
        Self::NonPositiveInteger,
        Self::NegativeInteger,
        Self::Long,
        Self::Int,
        Self::Short,
        Self::Byte,
        Self::NonNegativeInteger,
        Self::PositiveInteger,
        Self::UnsignedLong,
        Self::UnsignedInt,
        Self::UnsignedShort,
        Self::UnsignedByte,
    ];

    /// The local name of this type in the XML Schema namespace.
    pub fn xs_name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::NormalizedString => "normalizedString",
            Self::Token => "token",
            Self::Language => "language",
            Self::Name => "Name",
            Self::NCName => "NCName",
            Self::NMTOKEN => "NMTOKEN",
            Self::ID => "ID",
            Self::IDREF => "IDREF",
            Self::AnyURI => "anyURI",
            Self::Boolean => "boolean",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::Integer => "integer",
            Self::NonPositiveInteger => "nonPositiveInteger",
            Self::NegativeInteger => "negativeInteger",
            Self::Long => "long",
            Self::Int => "int",
            Self::Short => "short",
            Self::Byte => "byte",
            Self::NonNegativeInteger => "nonNegativeInteger",
            Self::PositiveInteger => "positiveInteger",
            Self::UnsignedLong => "unsignedLong",
            Self::UnsignedInt => "unsignedInt",
            Self::UnsignedShort => "unsignedShort",
            Self::UnsignedByte => "unsignedByte",
        }
    }

    pub fn from_xs_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.xs_name() == name)
    }

    /// Whether values of this type are kept as borrowed strings.
    pub fn is_string_like(self) -> bool {
        matches!(
            self,
            Self::String
                | Self::NormalizedString
                | Self::Token
                | Self::Language
                | Self::Name
                | Self::NCName
                | Self::NMTOKEN
                | Self::ID
                | Self::IDREF
                | Self::AnyURI
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Builtin(BuiltinType),
    Complex(String),
}

impl TypeRef {
    pub fn complex(name: impl Into<String>) -> Self {
        Self::Complex(name.into())
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Self::Complex(_))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(builtin) => write!(f, "xs:{}", builtin.xs_name()),
            Self::Complex(name) => f.write_str(name),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementParticle {
    pub name: String,
    pub type_: TypeRef,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Term {
    Element(ElementParticle),
    Sequence(Vec<Particle>),
    Choice(Vec<Particle>),
    /// Only valid as the top-level term of a content model.
    All(Vec<Particle>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Particle {
    pub min_occurs: u64,
    pub max_occurs: MaxOccurs,
    pub term: Term,
}

impl Particle {
    pub fn new(term: Term) -> Self {
        Self {
            min_occurs: 1,
            max_occurs: MaxOccurs::Count(1),
            term,
        }
    }

    /// An element particle of type `xs:string`.
    pub fn element(name: impl Into<String>) -> Self {
        Self::element_of(name, TypeRef::Builtin(BuiltinType::String))
    }

    pub fn element_of(name: impl Into<String>, type_: TypeRef) -> Self {
        Self::new(Term::Element(ElementParticle {
            name: name.into(),
            type_,
        }))
    }

    pub fn sequence(particles: Vec<Particle>) -> Self {
        Self::new(Term::Sequence(particles))
    }

    pub fn choice(particles: Vec<Particle>) -> Self {
        Self::new(Term::Choice(particles))
    }

    pub fn all(particles: Vec<Particle>) -> Self {
        Self::new(Term::All(particles))
    }

    pub fn occurs(self, min_occurs: u64, max_occurs: MaxOccurs) -> Self {
        Self {
            min_occurs,
            max_occurs,
            ..self
        }
    }

    pub fn optional(self) -> Self {
        let max_occurs = self.max_occurs;
        self.occurs(0, max_occurs)
    }

    pub fn unbounded(self) -> Self {
        let min_occurs = self.min_occurs;
        self.occurs(min_occurs, MaxOccurs::Unbounded)
    }

    pub fn is_all(&self) -> bool {
        matches!(self.term, Term::All(_))
    }

    /// Visits every element particle in document order.
    pub fn for_each_element<'a>(&'a self, f: &mut impl FnMut(&'a ElementParticle)) {
        match &self.term {
            Term::Element(element) => f(element),
            Term::Sequence(particles) | Term::Choice(particles) | Term::All(particles) => {
                for particle in particles {
                    particle.for_each_element(f);
                }
            }
        }
    }

    /// The most times each element name may occur, in order of first appearance.
    pub fn max_occurrences(&self) -> Vec<(&ElementParticle, MaxOccurs)> {
        let mut out = Vec::new();
        self.collect_max_occurrences(MaxOccurs::Count(1), &mut out);
        out
    }

    fn collect_max_occurrences<'a>(
        &'a self,
        outer: MaxOccurs,
        out: &mut Vec<(&'a ElementParticle, MaxOccurs)>,
    ) {
        let factor = outer.mul(&self.max_occurs);
        match &self.term {
            Term::Element(element) => {
                match out.iter_mut().find(|(seen, _)| seen.name == element.name) {
                    Some((_, max)) => *max = max.add(&factor),
                    None => out.push((element, factor)),
                }
            }
            Term::Sequence(particles) | Term::All(particles) => {
                for particle in particles {
                    particle.collect_max_occurrences(factor, out);
                }
            }
            Term::Choice(particles) => {
                // Alternatives are exclusive, so a name counts at most once per branch taken.
                let mut merged: Vec<(&ElementParticle, MaxOccurs)> = Vec::new();
                for particle in particles {
                    let mut branch = Vec::new();
                    particle.collect_max_occurrences(factor, &mut branch);
                    for (element, max) in branch {
                        match merged.iter_mut().find(|(seen, _)| seen.name == element.name) {
                            Some((_, seen)) => *seen = seen.max(&max),
                            None => merged.push((element, max)),
                        }
                    }
                }
                for (element, max) in merged {
                    match out.iter_mut().find(|(seen, _)| seen.name == element.name) {
                        Some((_, seen)) => *seen = seen.add(&max),
                        None => out.push((element, max)),
                    }
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeUse {
    pub name: String,
    pub required: bool,
    pub type_: BuiltinType,
}

impl AttributeUse {
    pub fn required(name: impl Into<String>, type_: BuiltinType) -> Self {
        Self {
            name: name.into(),
            required: true,
            type_,
        }
    }

    pub fn optional(name: impl Into<String>, type_: BuiltinType) -> Self {
        Self {
            name: name.into(),
            required: false,
            type_,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComplexType {
    pub name: String,
    /// `None` for types without element content.
    pub content: Option<Particle>,
    pub attributes: Vec<AttributeUse>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementDeclaration {
    pub name: String,
    pub type_: TypeRef,
}

/// A schema reduced to its global elements and the complex types reachable from them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    pub elements: Vec<ElementDeclaration>,
    pub complex_types: Vec<ComplexType>,
}

impl Schema {
    pub fn complex_type(&self, name: &str) -> Option<&ComplexType> {
        self.complex_types.iter().find(|ty| ty.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occurrences(particle: &Particle) -> Vec<(String, MaxOccurs)> {
        particle
            .max_occurrences()
            .into_iter()
            .map(|(element, max)| (element.name.clone(), max))
            .collect()
    }

    #[test]
    fn max_occurs_arithmetic() {
        let two = MaxOccurs::Count(2);
        assert_eq!(two.add(&MaxOccurs::Count(3)), MaxOccurs::Count(5));
        assert_eq!(two.mul(&MaxOccurs::Count(3)), MaxOccurs::Count(6));
        assert_eq!(two.max(&MaxOccurs::Count(3)), MaxOccurs::Count(3));
        assert_eq!(two.add(&MaxOccurs::Unbounded), MaxOccurs::Unbounded);
        assert_eq!(MaxOccurs::Count(0).mul(&MaxOccurs::Unbounded), MaxOccurs::Count(0));
        assert!(!MaxOccurs::Count(1).is_many());
        assert!(MaxOccurs::Unbounded.is_many());
    }

    #[test]
    fn occurrences_add_across_a_sequence() {
        let particle = Particle::sequence(vec![
            Particle::element("a"),
            Particle::element("b").optional(),
            Particle::element("a"),
        ]);
        assert_eq!(
            occurrences(&particle),
            [
                ("a".to_string(), MaxOccurs::Count(2)),
                ("b".to_string(), MaxOccurs::Count(1)),
            ]
        );
    }

    #[test]
    fn occurrences_take_the_maximum_across_a_choice() {
        let particle = Particle::choice(vec![
            Particle::element("a"),
            Particle::sequence(vec![Particle::element("a"), Particle::element("a")]),
        ])
        .occurs(1, MaxOccurs::Count(3));
        assert_eq!(occurrences(&particle), [("a".to_string(), MaxOccurs::Count(6))]);

        let particle = Particle::choice(vec![Particle::element("a"), Particle::element("b")]);
        assert_eq!(
            occurrences(&particle),
            [
                ("a".to_string(), MaxOccurs::Count(1)),
                ("b".to_string(), MaxOccurs::Count(1)),
            ]
        );
    }

    #[test]
    fn builtin_names_round_trip() {
        for builtin in BuiltinType::ALL {
            assert_eq!(BuiltinType::from_xs_name(builtin.xs_name()), Some(builtin));
        }
        assert_eq!(BuiltinType::from_xs_name("dateTime"), None);
        assert!(BuiltinType::Token.is_string_like());
        assert!(!BuiltinType::UnsignedByte.is_string_like());
    }
}
