//! Runtime side of `xs:sequence` and `xs:choice` validation.
//!
//! Tables are produced once when the schema is compiled and emitted as constants, so driving an
//! automaton only indexes into static data.

use crate::error::{Expected, Found, ValidationError};

/// A compiled content model.
///
/// `tags` is sorted. `transitions` is row-major with one row per state and one column per tag;
/// `None` marks an invalid transition. State 0 is the entry state.
#[derive(Copy, Clone, Debug)]
pub struct GroupAutomaton<'a> {
    tags: &'a [&'a str],
    transitions: &'a [Option<u32>],
    accepting: &'a [bool],
}

impl<'a> GroupAutomaton<'a> {
    pub const ENTRY: u32 = 0;

    pub const fn new(
        tags: &'a [&'a str],
        transitions: &'a [Option<u32>],
        accepting: &'a [bool],
    ) -> Self {
        assert!(!accepting.is_empty(), "an automaton has at least its entry state");
        assert!(transitions.len() == tags.len() * accepting.len());
        Self {
            tags,
            transitions,
            accepting,
        }
    }

    pub fn tags(&self) -> &'a [&'a str] {
        self.tags
    }

    pub fn state_count(&self) -> usize {
        self.accepting.len()
    }

    pub fn tag_index(&self, tag: &str) -> Option<usize> {
        self.tags.binary_search(&tag).ok()
    }

    pub fn next(&self, state: u32, tag: &str) -> Option<u32> {
        let tag = self.tag_index(tag)?;
        self.row(state)[tag]
    }

    pub fn is_accepting(&self, state: u32) -> bool {
        self.accepting[state as usize]
    }

    /// Tags with a valid transition out of `state`, in table order.
    pub fn expected(&self, state: u32) -> impl Iterator<Item = &'a str> + '_ {
        self.row(state)
            .iter()
            .zip(self.tags.iter())
            .filter(|(to, _)| to.is_some())
            .map(|(_, tag)| *tag)
    }

    fn row(&self, state: u32) -> &'a [Option<u32>] {
        let width = self.tags.len();
        let start = state as usize * width;
        &self.transitions[start..start + width]
    }

    fn error(&self, state: u32, found: Found) -> ValidationError {
        ValidationError::UnexpectedElement {
            expected: Expected(self.expected(state).map(str::to_string).collect()),
            found,
        }
    }
}

/// The current state of one group instance being parsed.
#[derive(Copy, Clone, Debug)]
pub struct GroupCursor<'a> {
    automaton: &'a GroupAutomaton<'a>,
    state: u32,
}

impl<'a> GroupCursor<'a> {
    pub fn new(automaton: &'a GroupAutomaton<'a>) -> Self {
        Self {
            automaton,
            state: GroupAutomaton::ENTRY,
        }
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    /// Consumes one child element tag.
    pub fn step(&mut self, tag: &str) -> Result<(), ValidationError> {
        match self.automaton.next(self.state, tag) {
            Some(next) => {
                self.state = next;
                Ok(())
            }
            None => Err(self
                .automaton
                .error(self.state, Found::Element(tag.to_string()))),
        }
    }

    /// Checks that the group may end here.
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.automaton.is_accepting(self.state) {
            Ok(())
        } else {
            Err(self.automaton.error(self.state, Found::EndOfInput))
        }
    }
}
