//! Compiles XSD content models into the constant tables used by generated parsers.
//!
//! A schema is read into a small [`Schema`] model ([`read_schema`]), then each complex type is
//! compiled ([`compile_schema`]): `sequence`/`choice` content becomes a deterministic automaton
//! over element names ([`GroupDfa`]), `all` content and attributes become presence layouts
//! ([`AllGroupLayout`], [`AttributeLayout`]).

pub mod all_group;
pub mod attributes;
pub mod compile;
pub mod content_model;
pub mod error;
pub mod reader;
pub mod state_machine;

pub use all_group::{AllGroupLayout, AllMember};
pub use attributes::AttributeLayout;
pub use compile::{
    compile_schema, compile_type, ChildElement, CompileOptions, CompiledSchema, CompiledType,
    ContentLayout,
};
pub use content_model::{
    AttributeUse, BuiltinType, ComplexType, ElementDeclaration, ElementParticle, MaxOccurs,
    Particle, Schema, Term, TypeRef,
};
pub use error::SchemaError;
pub use reader::{parse_schema, read_schema, XS_NAMESPACE};
pub use state_machine::GroupDfa;
