//! Presence tracking for `xs:all` groups and attribute lists.
//!
//! Both check that every member appears at most once and that all required members appear.
//! Unlike the automata, a tracker aggregates: missing members are reported together when the
//! element (or the attribute list) ends.

use crate::{bitset::PresenceBits, error::ValidationError};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PresenceKind {
    Elements,
    Attributes,
}

/// Ordinal layout of an `xs:all` group or of the attributes declared by a type.
///
/// The ordinal of a member is its index in `names`.
#[derive(Copy, Clone, Debug)]
pub struct PresenceLayout<'a, const WORDS: usize> {
    kind: PresenceKind,
    names: &'a [&'a str],
    required: PresenceBits<WORDS>,
    emptiable: bool,
}

impl<'a, const WORDS: usize> PresenceLayout<'a, WORDS> {
    pub const fn attributes(names: &'a [&'a str], required: PresenceBits<WORDS>) -> Self {
        Self {
            kind: PresenceKind::Attributes,
            names,
            required,
            emptiable: false,
        }
    }

    /// An `xs:all` layout. An `emptiable` group (`minOccurs="0"`) is also complete when none of
    /// its members appeared.
    pub const fn all_group(
        names: &'a [&'a str],
        required: PresenceBits<WORDS>,
        emptiable: bool,
    ) -> Self {
        Self {
            kind: PresenceKind::Elements,
            names,
            required,
            emptiable,
        }
    }

    pub fn kind(&self) -> PresenceKind {
        self.kind
    }

    pub fn names(&self) -> &'a [&'a str] {
        self.names
    }

    pub fn required(&self) -> &PresenceBits<WORDS> {
        &self.required
    }

    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|member| *member == name)
    }
}

/// Presence bits of one element instance.
#[derive(Clone, Debug)]
pub struct PresenceTracker<'a, const WORDS: usize> {
    layout: &'a PresenceLayout<'a, WORDS>,
    seen: PresenceBits<WORDS>,
}

impl<'a, const WORDS: usize> PresenceTracker<'a, WORDS> {
    pub fn new(layout: &'a PresenceLayout<'a, WORDS>) -> Self {
        Self {
            layout,
            seen: PresenceBits::new(),
        }
    }

    /// Records one occurrence of `name` and returns its ordinal.
    pub fn record(&mut self, name: &str) -> Result<usize, ValidationError> {
        let Some(ordinal) = self.layout.ordinal(name) else {
            let name = name.to_string();
            return Err(match self.layout.kind {
                PresenceKind::Elements => ValidationError::UnexpectedChild { name },
                PresenceKind::Attributes => ValidationError::UnexpectedAttribute { name },
            });
        };
        if !self.seen.insert(ordinal) {
            let name = name.to_string();
            return Err(match self.layout.kind {
                PresenceKind::Elements => ValidationError::DuplicateChild { name },
                PresenceKind::Attributes => ValidationError::DuplicateAttribute { name },
            });
        }
        Ok(ordinal)
    }

    pub fn seen(&self) -> &PresenceBits<WORDS> {
        &self.seen
    }

    /// Checks that every required member was recorded, listing all missing ones in ordinal order.
    pub fn finish(self) -> Result<PresenceBits<WORDS>, ValidationError> {
        if self.layout.emptiable && self.seen.is_empty() {
            return Ok(self.seen);
        }
        let missing = self.layout.required.difference(&self.seen);
        if missing.is_empty() {
            return Ok(self.seen);
        }
        let names = missing
            .iter()
            .map(|ordinal| self.layout.names[ordinal].to_string())
            .collect();
        Err(match self.layout.kind {
            PresenceKind::Elements => ValidationError::MissingElements { names },
            PresenceKind::Attributes => ValidationError::MissingAttributes { names },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XY: PresenceLayout<'static, 1> =
        PresenceLayout::attributes(&["x", "y"], PresenceBits::from_ordinals(&[0, 1]));

    #[test]
    fn names_the_single_missing_attribute() {
        let mut tracker = PresenceTracker::new(&XY);
        tracker.record("x").unwrap();
        let error = tracker.finish().unwrap_err();
        assert_eq!(error, ValidationError::MissingAttributes { names: vec!["y".into()] });
    }

    #[test]
    fn names_all_missing_attributes_in_ordinal_order() {
        let tracker = PresenceTracker::new(&XY);
        let error = tracker.finish().unwrap_err();
        assert_eq!(error.to_string(), "missing required attributes x, y");
    }

    #[test]
    fn rejects_duplicates_and_strangers() {
        let mut tracker = PresenceTracker::new(&XY);
        assert_eq!(tracker.record("y"), Ok(1));
        assert_eq!(
            tracker.record("y"),
            Err(ValidationError::DuplicateAttribute { name: "y".into() })
        );
        assert_eq!(
            tracker.record("z"),
            Err(ValidationError::UnexpectedAttribute { name: "z".into() })
        );
    }

    #[test]
    fn all_group_allows_missing_optionals() {
        let layout = PresenceLayout::<1>::all_group(
            &["a", "b", "c"],
            PresenceBits::from_ordinals(&[0, 2]),
            false,
        );
        let mut tracker = PresenceTracker::new(&layout);
        tracker.record("c").unwrap();
        tracker.record("a").unwrap();
        let seen = tracker.finish().unwrap();
        assert_eq!(seen.iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn emptiable_all_group_accepts_nothing() {
        let layout =
            PresenceLayout::<1>::all_group(&["a", "b"], PresenceBits::from_ordinals(&[0, 1]), true);
        assert!(PresenceTracker::new(&layout).finish().is_ok());

        let mut tracker = PresenceTracker::new(&layout);
        tracker.record("b").unwrap();
        assert_eq!(
            tracker.finish(),
            Err(ValidationError::MissingElements { names: vec!["a".into()] })
        );
    }
}
