//! Per-call resolution state: one node per package name.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use pinset_core::name::PackageName;
use pinset_core::pin::Pin;
use pinset_core::requirement::Requirement;

/// Where a package stands in the current round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    Unresolved,
    Pinned(Pin),
    /// The previous pin stopped satisfying the merged requirement.
    Invalidated(Pin),
}

#[derive(Debug, Clone)]
pub struct WorkingNode {
    /// The merged requirement from the latest round.
    pub requirement: Requirement,
    pub state: NodeState,
    /// Dependencies of the current pin; `None` until fetched.
    pub dependencies: Option<Vec<Requirement>>,
}

impl WorkingNode {
    fn new(requirement: Requirement) -> Self {
        Self {
            requirement,
            state: NodeState::Unresolved,
            dependencies: None,
        }
    }

    pub fn pin(&self) -> Option<&Pin> {
        match self.state {
            NodeState::Pinned(ref pin) => Some(pin),
            _ => None,
        }
    }

    /// Pinned and needed for its own sake, so its dependencies count.
    pub fn is_expandable(&self) -> bool {
        self.pin().is_some() && !self.requirement.is_constraint
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    nodes: BTreeMap<PackageName, WorkingNode>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &PackageName) -> Option<&WorkingNode> {
        self.nodes.get(name)
    }

    pub fn get_mut(&mut self, name: &PackageName) -> Option<&mut WorkingNode> {
        self.nodes.get_mut(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PackageName, &WorkingNode)> {
        self.nodes.iter()
    }

    pub fn names(&self) -> Vec<PackageName> {
        self.nodes.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every fetched dependency of an expandable node, in name order.
    pub fn expanded_dependencies(&self) -> impl Iterator<Item = &Requirement> {
        self.nodes
            .values()
            .filter(|node| node.is_expandable())
            .filter_map(|node| node.dependencies.as_deref())
            .flatten()
    }

    /// Bring the set in line with this round's merged requirements.
    ///
    /// Returns true if anything changed. A narrower specifier that the
    /// current pin still satisfies, or a different parent, is not a change.
    pub fn reconcile(&mut self, merged: BTreeMap<PackageName, Requirement>) -> bool {
        let mut changed = false;

        let before = self.nodes.len();
        self.nodes.retain(|name, _| {
            let keep = merged.contains_key(name);
            if !keep {
                tracing::debug!("Dropping {name}: no longer required");
            }
            keep
        });
        changed |= self.nodes.len() != before;

        for (name, requirement) in merged {
            match self.nodes.entry(name) {
                Entry::Vacant(slot) => {
                    slot.insert(WorkingNode::new(requirement));
                    changed = true;
                }
                Entry::Occupied(mut slot) => {
                    changed |= update_node(slot.get_mut(), requirement);
                }
            }
        }
        changed
    }
}

fn update_node(node: &mut WorkingNode, requirement: Requirement) -> bool {
    let mut changed = false;

    if node.requirement.is_constraint != requirement.is_constraint {
        node.dependencies = None;
        changed = true;
    }

    let state = std::mem::replace(&mut node.state, NodeState::Unresolved);
    node.state = match state {
        NodeState::Pinned(pin) if !pin.satisfies(&requirement) => {
            tracing::debug!("Invalidating {pin}: does not satisfy {requirement}");
            node.dependencies = None;
            changed = true;
            NodeState::Invalidated(pin)
        }
        other => other,
    };

    if let NodeState::Pinned(ref mut pin) = node.state {
        if pin.extras != requirement.extras {
            tracing::debug!("Extras of {} changed to {requirement}", pin.name);
            pin.extras = requirement.extras.clone();
            node.dependencies = None;
            changed = true;
        }
    }

    node.requirement = requirement;
    changed
}
