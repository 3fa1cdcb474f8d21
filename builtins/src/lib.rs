//! Runtime support for parsers generated by `uxsd-generator`.
//!
//! Generated code keeps string data in a [`CharPool`], variable-length children in
//! [`CollapsedVec`]s over shared [`CollapsedPool`]s, and validates content models by driving the
//! constant tables emitted for each type through [`GroupCursor`] and [`PresenceTracker`].

pub mod automaton;
pub mod bitset;
pub mod char_pool;
pub mod collapsed_vec;
pub mod error;
pub mod meta;
#[cfg(feature = "roxmltree")]
pub mod node;
pub mod presence;

pub use automaton::{GroupAutomaton, GroupCursor};
pub use bitset::{words_for, PresenceBits};
pub use char_pool::CharPool;
pub use collapsed_vec::{CollapsedPool, CollapsedVec};
pub use error::{Error, Expected, Found, LiteralError, ValidationError};
pub use presence::{PresenceKind, PresenceLayout, PresenceTracker};
