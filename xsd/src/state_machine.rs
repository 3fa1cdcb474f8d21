//! https://www.cogsci.ed.ac.uk/~ht/XML_Europe_2003.html
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt::Write as _,
    rc::Rc,
};

use crate::{
    content_model::{ElementParticle, MaxOccurs, Particle, Term},
    error::SchemaError,
};

/// Identity of an element particle within one content model.
///
/// Copies made when unrolling bounded repetitions share the label of the particle they copy.
type ParticleLabel = u32;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum EpsilonOr<T> {
    Epsilon,
    Transition(T),
}

#[derive(Default)]
struct EpsilonNfa {
    end_states: BTreeSet<u32>,
    transitions: Vec<Vec<(u32, EpsilonOr<ParticleLabel>)>>,
}

impl EpsilonNfa {
    fn create_state(&mut self) -> u32 {
        let state = self.transitions.len() as u32;
        self.transitions.push(Vec::new());
        state
    }

    fn add_element_transition(&mut self, from: u32, to: u32, label: ParticleLabel) {
        self.transitions[from as usize].push((to, EpsilonOr::Transition(label)));
    }

    fn add_epsilon_transition(&mut self, from: u32, to: u32) {
        self.transitions[from as usize].push((to, EpsilonOr::Epsilon));
    }

    fn get_transitions(&self, state: u32) -> &[(u32, EpsilonOr<ParticleLabel>)] {
        &self.transitions[state as usize]
    }

    fn state_count(&self) -> usize {
        self.transitions.len()
    }

    /// The epsilon closure of every state, each including the state itself.
    fn compute_epsilon_closure(&self) -> Vec<BTreeSet<u32>> {
        (0..self.state_count() as u32)
            .map(|state| {
                let mut closure = BTreeSet::from([state]);
                let mut pending = vec![state];
                while let Some(state) = pending.pop() {
                    for &(to, label) in self.get_transitions(state) {
                        if label == EpsilonOr::Epsilon && closure.insert(to) {
                            pending.push(to);
                        }
                    }
                }
                closure
            })
            .collect()
    }
}

/// Thompson-style construction of an ε-NFA from a particle, built back to front.
struct Builder<'a> {
    nfa: EpsilonNfa,
    max_unrolled_occurs: u64,
    labels: HashMap<*const ElementParticle, ParticleLabel>,
    particles: Vec<&'a ElementParticle>,
}

impl<'a> Builder<'a> {
    fn label(&mut self, element: &'a ElementParticle) -> ParticleLabel {
        let key: *const ElementParticle = element;
        if let Some(&label) = self.labels.get(&key) {
            return label;
        }
        let label = self.particles.len() as ParticleLabel;
        self.labels.insert(key, label);
        self.particles.push(element);
        label
    }

    fn t_t(&mut self, term: &'a Term, s: u32) -> Result<u32, SchemaError> {
        match term {
            Term::Element(element) => {
                let label = self.label(element);
                let b = self.nfa.create_state();
                self.nfa.add_element_transition(b, s, label);
                Ok(b)
            }
            Term::Sequence(particles) => {
                let mut n = s;
                for particle in particles.iter().rev() {
                    n = self.t_p(particle, n)?;
                }
                Ok(n)
            }
            Term::Choice(particles) => {
                let b = self.nfa.create_state();
                for particle in particles {
                    let alternative = self.t_p(particle, s)?;
                    self.nfa.add_epsilon_transition(b, alternative);
                }
                Ok(b)
            }
            Term::All(_) => Err(SchemaError::NestedAllGroup),
        }
    }

    fn t_p(&mut self, particle: &'a Particle, s: u32) -> Result<u32, SchemaError> {
        let min_occurs = particle.min_occurs;
        let unrolled = match particle.max_occurs {
            MaxOccurs::Count(max) if min_occurs > max => {
                return Err(SchemaError::UnsatisfiableOccurs {
                    min: min_occurs,
                    max,
                })
            }
            MaxOccurs::Count(max) => max,
            MaxOccurs::Unbounded => min_occurs,
        };
        if unrolled > self.max_unrolled_occurs {
            return Err(SchemaError::OccursLimitExceeded {
                occurs: unrolled,
                limit: self.max_unrolled_occurs,
            });
        }

        let mut n = s;
        match particle.max_occurs {
            MaxOccurs::Unbounded => {
                let t = self.nfa.create_state();
                let b = self.t_t(&particle.term, t)?;
                self.nfa.add_epsilon_transition(t, b);
                self.nfa.add_epsilon_transition(b, n);
                n = b;
            }
            MaxOccurs::Count(max_occurs) => {
                for _ in 0..(max_occurs - min_occurs) {
                    let b = self.t_t(&particle.term, n)?;
                    self.nfa.add_epsilon_transition(b, s);
                    n = b;
                }
            }
        }

        for _ in 0..min_occurs {
            n = self.t_t(&particle.term, n)?;
        }

        Ok(n)
    }
}

/// Subset construction over particle labels.
#[derive(Default)]
struct Dfa {
    end_states: BTreeSet<u32>,
    transitions: Vec<BTreeMap<ParticleLabel, u32>>,
}

struct LabeledDfa<L> {
    dfa: Dfa,
    states_by_label: BTreeMap<L, u32>,
}

impl<L: Ord> LabeledDfa<L> {
    fn new() -> Self {
        Self {
            dfa: Dfa::default(),
            states_by_label: BTreeMap::new(),
        }
    }

    fn create_state(&mut self, label: L) -> u32 {
        let state = self.dfa.transitions.len() as u32;
        self.dfa.transitions.push(BTreeMap::new());
        self.states_by_label.insert(label, state);
        state
    }

    fn get_or_create(&mut self, label: L) -> (u32, bool) {
        match self.states_by_label.get(&label) {
            Some(&state) => (state, true),
            None => (self.create_state(label), false),
        }
    }
}

fn determinize(nfa: &EpsilonNfa, starting_state: u32) -> Dfa {
    type DState = Rc<BTreeSet<u32>>;

    let epsilon_closure = nfa.compute_epsilon_closure();
    let mut new_dfa = LabeledDfa::<DState>::new();

    // States are numbered in discovery order, so the entry state is 0.
    let start: DState = Rc::new(epsilon_closure[starting_state as usize].clone());
    new_dfa.create_state(Rc::clone(&start));
    let mut pending_states = vec![(0, start)];
    let mut next = 0;

    while next < pending_states.len() {
        let (from, d_state) = pending_states[next].clone();
        next += 1;

        let mut out_transitions = BTreeMap::<ParticleLabel, BTreeSet<u32>>::new();
        for n_state in d_state.iter().copied() {
            for &(to, label) in nfa.get_transitions(n_state) {
                if let EpsilonOr::Transition(label) = label {
                    out_transitions
                        .entry(label)
                        .or_default()
                        .extend(&epsilon_closure[to as usize]);
                }
            }
        }

        for (label, out_state) in out_transitions {
            let out_state = Rc::new(out_state);
            let (to, exists) = new_dfa.get_or_create(Rc::clone(&out_state));
            if !exists {
                pending_states.push((to, out_state));
            }
            new_dfa.dfa.transitions[from as usize].insert(label, to);
        }
    }

    for (state, index) in &new_dfa.states_by_label {
        if state.iter().any(|state| nfa.end_states.contains(state)) {
            new_dfa.dfa.end_states.insert(*index);
        }
    }

    new_dfa.dfa
}

/// Removes states from which no accepting state is reachable, keeping the relative order of the
/// others. The entry state survives whenever any state accepts.
fn prune_dead_states(dfa: Dfa) -> Dfa {
    let mut live = vec![false; dfa.transitions.len()];
    for &state in &dfa.end_states {
        live[state as usize] = true;
    }
    let mut changed = true;
    while changed {
        changed = false;
        for (state, edges) in dfa.transitions.iter().enumerate() {
            if !live[state] && edges.values().any(|&to| live[to as usize]) {
                live[state] = true;
                changed = true;
            }
        }
    }

    let mut renumbered = vec![None; live.len()];
    let mut count = 0;
    for (state, &is_live) in live.iter().enumerate() {
        if is_live {
            renumbered[state] = Some(count);
            count += 1;
        }
    }
    let transitions = dfa
        .transitions
        .into_iter()
        .zip(&live)
        .filter(|(_, live)| **live)
        .map(|(edges, _)| {
            edges
                .into_iter()
                .filter_map(|(label, to)| Some((label, renumbered[to as usize]?)))
                .collect()
        })
        .collect();
    let end_states = dfa
        .end_states
        .iter()
        .filter_map(|&state| renumbered[state as usize])
        .collect();
    Dfa {
        end_states,
        transitions,
    }
}

/// Checks that the Unique Particle Attribution (UPA) constraint is satisfied.
///
/// Steps 1-2 of Algorithm 2 happen during construction; here the particle-labelled DFA must stay
/// deterministic once labels are replaced by element names.
fn verify_upa_satisfied(dfa: &Dfa, particles: &[&ElementParticle]) -> Result<(), SchemaError> {
    for transitions in &dfa.transitions {
        let mut by_name = BTreeMap::<&str, ParticleLabel>::new();
        for &label in transitions.keys() {
            let name = particles[label as usize].name.as_str();
            if let Some(&first) = by_name.get(name) {
                return Err(SchemaError::AmbiguousContentModel {
                    tag: name.to_string(),
                    first,
                    second: label,
                });
            }
            by_name.insert(name, label);
        }
    }
    Ok(())
}

/// A deterministic automaton over the element names of a `sequence`/`choice` content model.
///
/// State 0 is the entry state. The tag alphabet is sorted, and `transitions` is a row-major
/// `state_count() × tags().len()` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupDfa {
    tags: Vec<String>,
    transitions: Vec<Option<u32>>,
    accepting: Vec<bool>,
}

impl GroupDfa {
    pub const ENTRY: u32 = 0;

    /// The automaton of an empty content model: it accepts only the empty sequence.
    pub fn empty() -> Self {
        Self {
            tags: Vec::new(),
            transitions: Vec::new(),
            accepting: vec![true],
        }
    }

    pub fn compile(particle: &Particle, max_unrolled_occurs: u64) -> Result<Self, SchemaError> {
        let mut builder = Builder {
            nfa: EpsilonNfa::default(),
            max_unrolled_occurs,
            labels: HashMap::new(),
            particles: Vec::new(),
        };
        let s = builder.nfa.create_state();
        builder.nfa.end_states.insert(s);
        let starting_state = builder.t_p(particle, s)?;
        tracing::trace!(
            nfa_states = builder.nfa.state_count(),
            particles = builder.particles.len(),
            "built ε-NFA"
        );

        let dfa = determinize(&builder.nfa, starting_state);
        verify_upa_satisfied(&dfa, &builder.particles)?;
        if dfa.end_states.is_empty() {
            return Err(SchemaError::UnsatisfiableContentModel);
        }
        let dfa = prune_dead_states(dfa);

        let tags: Vec<String> = dfa
            .transitions
            .iter()
            .flat_map(|edges| edges.keys())
            .map(|&label| builder.particles[label as usize].name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut transitions = vec![None; dfa.transitions.len() * tags.len()];
        for (state, edges) in dfa.transitions.iter().enumerate() {
            for (&label, &to) in edges {
                let name = &builder.particles[label as usize].name;
                // Every particle name is in `tags` by construction.
                if let Ok(tag) = tags.binary_search(name) {
                    transitions[state * tags.len() + tag] = Some(to);
                }
            }
        }
        let accepting = (0..dfa.transitions.len() as u32)
            .map(|state| dfa.end_states.contains(&state))
            .collect();

        let compiled = Self {
            tags,
            transitions,
            accepting,
        };
        tracing::debug!(
            states = compiled.state_count(),
            tags = compiled.tags.len(),
            "compiled content model"
        );
        Ok(compiled)
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn state_count(&self) -> usize {
        self.accepting.len()
    }

    pub fn transitions(&self) -> &[Option<u32>] {
        &self.transitions
    }

    pub fn accepting(&self) -> &[bool] {
        &self.accepting
    }

    pub fn tag_index(&self, tag: &str) -> Option<usize> {
        self.tags.binary_search_by(|probe| probe.as_str().cmp(tag)).ok()
    }

    pub fn next(&self, state: u32, tag: &str) -> Option<u32> {
        let tag = self.tag_index(tag)?;
        self.transitions[state as usize * self.tags.len() + tag]
    }

    pub fn is_accepting(&self, state: u32) -> bool {
        self.accepting[state as usize]
    }

    /// The tags with an outgoing transition from `state`, in sorted order.
    pub fn expected(&self, state: u32) -> impl Iterator<Item = &str> + '_ {
        let row = state as usize * self.tags.len();
        self.tags
            .iter()
            .enumerate()
            .filter(move |&(tag, _)| self.transitions[row + tag].is_some())
            .map(|(_, name)| name.as_str())
    }

    /// Runs `tags` from the entry state.
    pub fn accepts<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        let mut state = Self::ENTRY;
        for tag in tags {
            match self.next(state, tag.as_ref()) {
                Some(next) => state = next,
                None => return false,
            }
        }
        self.is_accepting(state)
    }

    /// Renders the automaton in Graphviz dot syntax.
    pub fn to_dot(&self, name: &str) -> String {
        let mut dot = String::new();
        let _ = writeln!(dot, "digraph {name:?} {{");
        for state in 0..self.state_count() as u32 {
            let shape = if self.is_accepting(state) {
                "doublecircle"
            } else {
                "circle"
            };
            let _ = writeln!(dot, "  {state} [shape={shape}];");
        }
        for from in 0..self.state_count() {
            for (tag, name) in self.tags.iter().enumerate() {
                if let Some(to) = self.transitions[from * self.tags.len() + tag] {
                    let _ = writeln!(dot, "  {from} -> {to} [label={name:?}];");
                }
            }
        }
        let _ = writeln!(dot, "  s [shape=point];");
        let _ = writeln!(dot, "  s -> {};", Self::ENTRY);
        dot.push_str("}\n");
        dot
    }
}
