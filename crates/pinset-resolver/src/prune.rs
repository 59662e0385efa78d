//! Post-resolution pruning: unsafe packages, constraint-only pins and orphans.

use std::collections::{BTreeMap, BTreeSet};

use pinset_core::config::ResolverConfig;
use pinset_core::name::PackageName;
use pinset_core::pin::Pin;
use pinset_core::requirement::Requirement;

use crate::graph::{DepEdge, DependencyGraph};
use crate::working_set::WorkingSet;

/// The outcome of a successful resolve.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub pins: BTreeMap<PackageName, Pin>,
    /// Unsafe packages that were required but left out.
    pub unsafe_pins: BTreeMap<PackageName, Pin>,
    pub graph: DependencyGraph,
    pub rounds: usize,
}

impl Resolution {
    pub fn get(&self, name: &PackageName) -> Option<&Pin> {
        self.pins.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pin> {
        self.pins.values()
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// One rendered pin per line, sorted by name.
    pub fn to_lines(&self) -> Vec<String> {
        self.pins.values().map(ToString::to_string).collect()
    }
}

#[derive(Debug, Clone)]
pub struct GraphPruner {
    unsafe_packages: BTreeSet<PackageName>,
    allow_unsafe: bool,
}

impl GraphPruner {
    pub fn new(unsafe_packages: BTreeSet<PackageName>, allow_unsafe: bool) -> Self {
        Self {
            unsafe_packages,
            allow_unsafe,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.unsafe_package_names(), config.allow_unsafe)
    }

    pub fn is_unsafe(&self, name: &PackageName) -> bool {
        self.unsafe_packages.contains(name)
    }

    fn excluded(&self, name: &PackageName) -> bool {
        !self.allow_unsafe && self.is_unsafe(name)
    }

    /// Build the output graph from a converged working set.
    pub fn prune(&self, roots: &[Requirement], working: &WorkingSet) -> Resolution {
        let mut graph = DependencyGraph::new();
        let mut unsafe_pins = BTreeMap::new();

        for (name, node) in working.iter() {
            let Some(pin) = node.pin() else {
                continue;
            };
            if node.requirement.is_constraint {
                tracing::debug!("Omitting constraint-only {pin}");
                continue;
            }
            if self.excluded(name) {
                continue;
            }
            graph.add_pin(pin.clone());
        }

        let root = graph.root();
        let genuine_roots: BTreeSet<&PackageName> = roots
            .iter()
            .filter(|r| !r.is_constraint)
            .map(|r| &r.name)
            .collect();
        for name in &genuine_roots {
            if let Some(idx) = graph.find(name) {
                graph.add_edge(root, idx, DepEdge::default());
            }
        }
        for (name, node) in working.iter() {
            let (Some(from), Some(deps)) = (graph.find(name), node.dependencies.as_ref()) else {
                continue;
            };
            for dep in deps {
                if let Some(to) = graph.find(&dep.name) {
                    graph.add_edge(
                        from,
                        to,
                        DepEdge {
                            specifier: dep.specifier.clone(),
                        },
                    );
                }
            }
        }

        let orphans = graph.retain_reachable();
        for name in &orphans {
            tracing::debug!("Pruned orphan {name}");
        }

        if !self.allow_unsafe {
            let required = genuine_roots.iter().copied().chain(
                working
                    .iter()
                    .filter(|(name, _)| graph.find(name).is_some())
                    .filter_map(|(_, node)| node.dependencies.as_ref())
                    .flatten()
                    .map(|dep| &dep.name),
            );
            for name in required {
                if !self.is_unsafe(name) {
                    continue;
                }
                if let Some(pin) = working.get(name).and_then(|n| n.pin()) {
                    unsafe_pins.insert(name.clone(), pin.clone());
                }
            }
        }

        let pins = graph
            .pins()
            .into_iter()
            .map(|pin| (pin.name.clone(), pin.clone()))
            .collect();

        Resolution {
            pins,
            unsafe_pins,
            graph,
            rounds: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::group_by_name;
    use crate::working_set::NodeState;

    fn req(s: &str) -> Requirement {
        s.parse().unwrap()
    }

    fn name(s: &str) -> PackageName {
        PackageName::new(s).unwrap()
    }

    /// Working set with every node pinned at 1.0 and the given dependency lists.
    fn working(roots: &[Requirement], deps: &[(&str, &[&str])]) -> WorkingSet {
        let mut produced: Vec<Requirement> = roots.to_vec();
        for (parent, children) in deps {
            for child in *children {
                produced.push(req(child).with_parent(name(parent)));
            }
        }
        let mut set = WorkingSet::new();
        set.reconcile(group_by_name(&produced));
        for n in set.names() {
            let node = set.get_mut(&n).unwrap();
            node.state = NodeState::Pinned(Pin::version(n.clone(), "1.0".parse().unwrap()));
            let children = deps
                .iter()
                .find(|(p, _)| name(p) == n)
                .map(|(_, c)| c.iter().map(|s| req(s)).collect())
                .unwrap_or_default();
            node.dependencies = Some(children);
        }
        set
    }

    fn names(resolution: &Resolution) -> Vec<&str> {
        resolution.pins.keys().map(PackageName::as_str).collect()
    }

    #[test]
    fn unsafe_packages_are_not_traversed() {
        let roots = [req("html5lib")];
        let set = working(
            &roots,
            &[("html5lib", &["setuptools>=18.5"]), ("setuptools", &["six"])],
        );
        let pruner = GraphPruner::from_config(&ResolverConfig::default());
        let resolution = pruner.prune(&roots, &set);
        assert_eq!(names(&resolution), ["html5lib"]);
        assert_eq!(
            resolution.unsafe_pins.keys().map(PackageName::as_str).collect::<Vec<_>>(),
            ["setuptools"]
        );
    }

    #[test]
    fn allow_unsafe_keeps_everything() {
        let roots = [req("html5lib")];
        let set = working(
            &roots,
            &[("html5lib", &["setuptools>=18.5"]), ("setuptools", &["six"])],
        );
        let pruner = GraphPruner::new([name("setuptools")].into_iter().collect(), true);
        let resolution = pruner.prune(&roots, &set);
        assert_eq!(names(&resolution), ["html5lib", "setuptools", "six"]);
        assert!(resolution.unsafe_pins.is_empty());
    }

    #[test]
    fn constraint_only_nodes_are_dropped() {
        let roots = [req("flask"), req("click").into_constraint()];
        let set = working(&roots, &[]);
        let resolution = GraphPruner::from_config(&ResolverConfig::default()).prune(&roots, &set);
        assert_eq!(names(&resolution), ["flask"]);
    }

    #[test]
    fn orphans_are_dropped() {
        let roots = [req("amqp")];
        // vine is still in the set but nothing retained depends on it
        let set = working(&roots, &[("amqp", &[]), ("kombu", &["vine"])]);
        let resolution = GraphPruner::from_config(&ResolverConfig::default()).prune(&roots, &set);
        assert_eq!(names(&resolution), ["amqp"]);
    }

    #[test]
    fn graph_edges_carry_specifiers() {
        let roots = [req("flask")];
        let set = working(&roots, &[("flask", &["jinja2>=2.4"])]);
        let resolution = GraphPruner::from_config(&ResolverConfig::default()).prune(&roots, &set);
        let tree = resolution.graph.print_tree(None);
        assert!(tree.contains("jinja2==1.0 [required: >=2.4]"));
        assert_eq!(resolution.to_lines(), ["flask==1.0", "jinja2==1.0"]);
    }
}
