use crate::{
    content_model::{ElementParticle, MaxOccurs, Particle, Term},
    error::SchemaError,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllMember {
    pub element: ElementParticle,
    pub required: bool,
}

/// The presence layout of an `xs:all` group.
///
/// Members keep their declaration order; a member's ordinal is its bit in the presence set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllGroupLayout {
    members: Vec<AllMember>,
    emptiable: bool,
}

impl AllGroupLayout {
    pub fn compile(particle: &Particle) -> Result<Self, SchemaError> {
        let Term::All(particles) = &particle.term else {
            return Err(SchemaError::InvalidAllMember);
        };
        if particle.max_occurs != MaxOccurs::Count(1) || particle.min_occurs > 1 {
            return Err(SchemaError::RepeatedAllGroup);
        }

        let mut members: Vec<AllMember> = Vec::with_capacity(particles.len());
        for member in particles {
            let Term::Element(element) = &member.term else {
                return Err(match member.term {
                    Term::All(_) => SchemaError::NestedAllGroup,
                    _ => SchemaError::InvalidAllMember,
                });
            };
            match member.max_occurs {
                MaxOccurs::Count(max) if member.min_occurs > max => {
                    return Err(SchemaError::UnsatisfiableOccurs {
                        min: member.min_occurs,
                        max,
                    })
                }
                MaxOccurs::Count(0 | 1) => {}
                _ => return Err(SchemaError::RepeatedAllMember(element.name.clone())),
            }
            if members.iter().any(|seen| seen.element.name == element.name) {
                return Err(SchemaError::DuplicateAllMember(element.name.clone()));
            }
            // maxOccurs="0" leaves the member out of the content model.
            if member.max_occurs == MaxOccurs::Count(0) {
                continue;
            }
            members.push(AllMember {
                element: element.clone(),
                required: member.min_occurs > 0,
            });
        }

        let layout = Self {
            members,
            emptiable: particle.min_occurs == 0,
        };
        tracing::debug!(
            members = layout.members.len(),
            required = layout.required_ordinals().count(),
            emptiable = layout.emptiable,
            "compiled xs:all layout"
        );
        Ok(layout)
    }

    pub fn members(&self) -> &[AllMember] {
        &self.members
    }

    /// Whether the whole group may be absent even though some members are required.
    pub fn emptiable(&self) -> bool {
        self.emptiable
    }

    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.members
            .iter()
            .position(|member| member.element.name == name)
    }

    pub fn required_ordinals(&self) -> impl Iterator<Item = usize> + '_ {
        self.members
            .iter()
            .enumerate()
            .filter(|(_, member)| member.required)
            .map(|(ordinal, _)| ordinal)
    }

    /// Number of 64-bit words in the presence set.
    pub fn words(&self) -> usize {
        self.members.len().div_ceil(64).max(1)
    }

    /// Whether `names` is a valid content of this group: no unknown or repeated members, and
    /// every required member present unless the group is emptiable and nothing was given.
    pub fn accepts<S: AsRef<str>>(&self, names: &[S]) -> bool {
        let mut seen = vec![false; self.members.len()];
        for name in names {
            match self.ordinal(name.as_ref()) {
                Some(ordinal) if !seen[ordinal] => seen[ordinal] = true,
                _ => return false,
            }
        }
        (self.emptiable && names.is_empty())
            || self.required_ordinals().all(|ordinal| seen[ordinal])
    }
}
