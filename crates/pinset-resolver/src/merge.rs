//! Folding several requirements on the same package into one.
//!
//! Merging is commutative, associative and idempotent, so the canonical
//! requirement of a package never depends on the order its sources were seen.

use std::collections::BTreeMap;

use pinset_core::name::PackageName;
use pinset_core::requirement::{Requirement, RequirementSource};

use crate::error::ResolveError;

/// Reject requirements the engine cannot turn into a reproducible pin.
///
/// Non-editable URL/VCS requirements are refused; editables and index
/// requirements pass.
pub fn validate(requirement: &Requirement) -> Result<(), ResolveError> {
    if requirement.has_direct_url() && !requirement.is_editable() {
        return Err(ResolveError::UnsupportedConstraint {
            requirement: requirement.to_string(),
        });
    }
    Ok(())
}

/// Combine two requirements on the same package.
///
/// - specifiers are intersected
/// - extras are unioned
/// - the result is a constraint only if both inputs are
/// - an editable source wins over the index
/// - a root (no parent) wins over any parent; otherwise the smaller name is kept
pub fn merge(existing: &Requirement, incoming: &Requirement) -> Requirement {
    debug_assert_eq!(existing.name, incoming.name);

    let source = match (&existing.source, &incoming.source) {
        (RequirementSource::Index, other) | (other, RequirementSource::Index) => other.clone(),
        (a, b) => a.min(b).clone(),
    };
    let parent = match (&existing.parent, &incoming.parent) {
        (Some(a), Some(b)) => Some(a.min(b).clone()),
        _ => None,
    };

    Requirement {
        name: existing.name.clone(),
        specifier: existing.specifier.intersect(&incoming.specifier),
        extras: existing.extras.union(&incoming.extras).cloned().collect(),
        source,
        is_constraint: existing.is_constraint && incoming.is_constraint,
        parent,
    }
}

/// Merge a sequence of requirements on one package. `None` when empty.
pub fn merge_all<'a, I>(requirements: I) -> Option<Requirement>
where
    I: IntoIterator<Item = &'a Requirement>,
{
    requirements.into_iter().fold(None, |acc, req| match acc {
        None => Some(req.clone()),
        Some(merged) => Some(merge(&merged, req)),
    })
}

/// Merge requirements by package name, one canonical requirement per name.
pub fn group_by_name<'a, I>(requirements: I) -> BTreeMap<PackageName, Requirement>
where
    I: IntoIterator<Item = &'a Requirement>,
{
    let mut grouped: BTreeMap<PackageName, Requirement> = BTreeMap::new();
    for req in requirements {
        match grouped.get_mut(&req.name) {
            Some(existing) => *existing = merge(existing, req),
            None => {
                grouped.insert(req.name.clone(), req.clone());
            }
        }
    }
    grouped
}
