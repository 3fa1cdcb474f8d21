//! Compiled automata and presence layouts against straightforward reference matchers.

use std::collections::BTreeSet;

use proptest::prelude::*;
use uxsd::{AllGroupLayout, GroupDfa, MaxOccurs, Particle, SchemaError, Term};
use uxsd_builtins::{GroupAutomaton, GroupCursor, PresenceBits, PresenceLayout, PresenceTracker};

/// Positions at which a match of `particle` starting at `start` can end.
fn particle_ends(particle: &Particle, word: &[&str], start: usize) -> BTreeSet<usize> {
    let mut reached = BTreeSet::new();
    if particle.min_occurs == 0 {
        reached.insert(start);
    }
    let mut frontier = BTreeSet::from([start]);
    let mut count = 0;
    while !frontier.is_empty() {
        if matches!(particle.max_occurs, MaxOccurs::Count(max) if count >= max) {
            break;
        }
        count += 1;
        let next: BTreeSet<usize> = frontier
            .iter()
            .flat_map(|&position| term_ends(&particle.term, word, position))
            .collect();
        if count < particle.min_occurs {
            frontier = next;
        } else if particle.max_occurs == MaxOccurs::Unbounded {
            frontier = next.difference(&reached).copied().collect();
            reached.extend(next);
        } else {
            reached.extend(&next);
            frontier = next;
        }
    }
    reached
}

fn term_ends(term: &Term, word: &[&str], start: usize) -> BTreeSet<usize> {
    match term {
        Term::Element(element) => match word.get(start) {
            Some(&tag) if tag == element.name => BTreeSet::from([start + 1]),
            _ => BTreeSet::new(),
        },
        Term::Sequence(particles) => {
            particles
                .iter()
                .fold(BTreeSet::from([start]), |positions, particle| {
                    positions
                        .iter()
                        .flat_map(|&position| particle_ends(particle, word, position))
                        .collect()
                })
        }
        Term::Choice(particles) => particles
            .iter()
            .flat_map(|particle| particle_ends(particle, word, start))
            .collect(),
        Term::All(_) => unreachable!("not generated"),
    }
}

fn reference_accepts(particle: &Particle, word: &[&str]) -> bool {
    particle_ends(particle, word, 0).contains(&word.len())
}

fn occurs() -> impl Strategy<Value = (u64, MaxOccurs)> {
    prop::sample::select(vec![
        (0, MaxOccurs::Count(1)),
        (1, MaxOccurs::Count(1)),
        (1, MaxOccurs::Count(1)),
        (0, MaxOccurs::Unbounded),
        (1, MaxOccurs::Unbounded),
        (0, MaxOccurs::Count(2)),
        (1, MaxOccurs::Count(3)),
        (2, MaxOccurs::Count(2)),
    ])
}

fn particle() -> impl Strategy<Value = Particle> {
    let leaf = (prop::sample::select(vec!["a", "b", "c"]), occurs())
        .prop_map(|(name, (min, max))| Particle::element(name).occurs(min, max));
    leaf.prop_recursive(3, 16, 3, |inner| {
        (prop::collection::vec(inner, 0..4), any::<bool>(), occurs()).prop_map(
            |(particles, choice, (min, max))| {
                let group = if choice && !particles.is_empty() {
                    Particle::choice(particles)
                } else {
                    Particle::sequence(particles)
                };
                group.occurs(min, max)
            },
        )
    })
}

fn word() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d"]), 0..7)
}

fn runtime_accepts(dfa: &GroupDfa, word: &[&str]) -> bool {
    let tags: Vec<&str> = dfa.tags().iter().map(String::as_str).collect();
    let automaton = GroupAutomaton::new(&tags, dfa.transitions(), dfa.accepting());
    let mut cursor = GroupCursor::new(&automaton);
    word.iter().all(|tag| cursor.step(tag).is_ok()) && cursor.finish().is_ok()
}

proptest! {
    #[test]
    fn automaton_accepts_the_language_of_the_content_model(
        particle in particle(),
        words in prop::collection::vec(word(), 1..16),
    ) {
        match GroupDfa::compile(&particle, 1024) {
            Ok(dfa) => {
                for word in &words {
                    let expected = reference_accepts(&particle, word);
                    prop_assert_eq!(dfa.accepts(word), expected, "word {:?}", word);
                    prop_assert_eq!(runtime_accepts(&dfa, word), expected, "word {:?}", word);
                }
            }
            Err(SchemaError::AmbiguousContentModel { .. }) => {}
            Err(error) => prop_assert!(false, "unexpected error: {error}"),
        }
    }

    #[test]
    fn compilation_is_deterministic(particle in particle()) {
        let first = GroupDfa::compile(&particle, 1024).ok();
        let second = GroupDfa::compile(&particle, 1024).ok();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn all_group_accepts_each_member_at_most_once(
        required in prop::collection::vec(any::<bool>(), 1..8),
        emptiable in any::<bool>(),
        word in prop::collection::vec(0usize..9, 0..10),
    ) {
        let names: Vec<String> = (0..required.len()).map(|i| format!("m{i}")).collect();
        let members = names
            .iter()
            .zip(&required)
            .map(|(name, &required)| {
                let member = Particle::element(name.as_str());
                if required { member } else { member.optional() }
            })
            .collect();
        let mut group = Particle::all(members);
        if emptiable {
            group = group.optional();
        }
        let layout = AllGroupLayout::compile(&group).unwrap();

        let word: Vec<String> = word.iter().map(|i| format!("m{i}")).collect();
        let known = word.iter().all(|name| names.contains(name));
        let distinct = word.iter().collect::<BTreeSet<_>>().len() == word.len();
        let complete = names
            .iter()
            .zip(&required)
            .all(|(name, &required)| !required || word.contains(name));
        let expected = known && distinct && (complete || (emptiable && word.is_empty()));
        prop_assert_eq!(layout.accepts(&word), expected);

        let member_names: Vec<&str> = names.iter().map(String::as_str).collect();
        let required_ordinals: Vec<usize> = layout.required_ordinals().collect();
        let runtime = PresenceLayout::<1>::all_group(
            &member_names,
            PresenceBits::from_ordinals(&required_ordinals),
            layout.emptiable(),
        );
        let mut tracker = PresenceTracker::new(&runtime);
        let accepted =
            word.iter().all(|name| tracker.record(name).is_ok()) && tracker.finish().is_ok();
        prop_assert_eq!(accepted, expected);
    }
}
