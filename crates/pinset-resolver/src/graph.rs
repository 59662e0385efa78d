//! Dependency graph of the final pins.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use petgraph::Direction;

use pinset_core::name::PackageName;
use pinset_core::pin::Pin;
use pinset_core::specifier::SpecifierSet;

/// A node in the pinned dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphNode {
    /// The synthetic node whose children are the top-level requirements.
    Root,
    Package(Pin),
}

impl GraphNode {
    pub fn pin(&self) -> Option<&Pin> {
        match self {
            GraphNode::Root => None,
            GraphNode::Package(pin) => Some(pin),
        }
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphNode::Root => f.write_str("<requirements>"),
            GraphNode::Package(pin) => write!(f, "{pin}"),
        }
    }
}

/// Edge label: the specifier the parent declared on the child.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepEdge {
    pub specifier: SpecifierSet,
}

/// Pinned packages and who depends on whom, backed by petgraph.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, DepEdge>,
    index: HashMap<PackageName, NodeIndex>,
    root: NodeIndex,
}

impl DependencyGraph {
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(GraphNode::Root);
        Self {
            graph,
            index: HashMap::new(),
            root,
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Add or retrieve the node for a pin. The first pin added under a name wins.
    pub fn add_pin(&mut self, pin: Pin) -> NodeIndex {
        if let Some(&idx) = self.index.get(&pin.name) {
            return idx;
        }
        let name = pin.name.clone();
        let idx = self.graph.add_node(GraphNode::Package(pin));
        self.index.insert(name, idx);
        idx
    }

    /// Add a dependency edge from `from` to `to`, once.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: DepEdge) {
        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, edge);
        }
    }

    pub fn find(&self, name: &PackageName) -> Option<NodeIndex> {
        self.index.get(name).copied()
    }

    /// Look up a node by an unnormalized package name.
    pub fn find_by_str(&self, name: &str) -> Option<NodeIndex> {
        PackageName::new(name).ok().and_then(|n| self.find(&n))
    }

    pub fn node(&self, idx: NodeIndex) -> &GraphNode {
        &self.graph[idx]
    }

    /// All pins, sorted by name.
    pub fn pins(&self) -> Vec<&Pin> {
        let mut pins: Vec<&Pin> = self.graph.node_weights().filter_map(GraphNode::pin).collect();
        pins.sort_by(|a, b| a.name.cmp(&b.name));
        pins
    }

    /// Direct dependencies of a node, sorted by name.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &DepEdge)> {
        let mut deps: Vec<(NodeIndex, &DepEdge)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
            .collect();
        deps.sort_by(|a, b| self.sort_key(a.0).cmp(&self.sort_key(b.0)));
        deps
    }

    /// Reverse dependencies (who depends on this node), sorted by name.
    pub fn dependents_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &DepEdge)> {
        let mut deps: Vec<(NodeIndex, &DepEdge)> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (e.source(), e.weight()))
            .collect();
        deps.sort_by(|a, b| self.sort_key(a.0).cmp(&self.sort_key(b.0)));
        deps
    }

    fn sort_key(&self, idx: NodeIndex) -> Option<&PackageName> {
        self.graph[idx].pin().map(|p| &p.name)
    }

    /// Drop every node not reachable from the root. Returns the dropped names, sorted.
    pub fn retain_reachable(&mut self) -> Vec<PackageName> {
        let mut reachable = HashSet::new();
        let mut dfs = Dfs::new(&self.graph, self.root);
        while let Some(idx) = dfs.next(&self.graph) {
            reachable.insert(idx);
        }

        let mut dropped: Vec<PackageName> = self
            .index
            .iter()
            .filter(|(_, idx)| !reachable.contains(idx))
            .map(|(name, _)| name.clone())
            .collect();
        if dropped.is_empty() {
            return dropped;
        }
        dropped.sort();

        self.graph = self.graph.filter_map(
            |idx, node| reachable.contains(&idx).then(|| node.clone()),
            |_, edge| Some(edge.clone()),
        );
        self.reindex();
        dropped
    }

    fn reindex(&mut self) {
        self.index.clear();
        for idx in self.graph.node_indices() {
            match self.graph[idx] {
                GraphNode::Root => self.root = idx,
                GraphNode::Package(ref pin) => {
                    self.index.insert(pin.name.clone(), idx);
                }
            }
        }
    }

    /// Render the tree below the root, one pin per line with the specifier
    /// its parent asked for.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        let mut visited = HashSet::new();
        visited.insert(self.root);

        let deps = self.dependencies_of(self.root);
        let count = deps.len();
        for (i, (idx, edge)) in deps.iter().enumerate() {
            let is_last = i == count - 1;
            self.print_subtree(&mut output, *idx, edge, "", is_last, 1, max_depth, &mut visited);
        }
        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        edge: &DepEdge,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let node = &self.graph[idx];
        let required = if edge.specifier.is_empty() {
            "any".to_string()
        } else {
            edge.specifier.to_string()
        };
        output.push_str(&format!("{prefix}{connector}{node} [required: {required}]\n"));

        if let Some(max) = max_depth {
            if depth >= max {
                return;
            }
        }
        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let deps = self.dependencies_of(idx);
        let count = deps.len();
        for (i, (child, child_edge)) in deps.iter().enumerate() {
            self.print_subtree(
                output,
                *child,
                child_edge,
                &child_prefix,
                i == count - 1,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// The path from the root to a package, root included.
    pub fn find_path(&self, name: &str) -> Option<Vec<&GraphNode>> {
        let target = self.find_by_str(name)?;
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        if self.dfs_path(self.root, target, &mut path, &mut visited) {
            Some(path.iter().map(|&idx| &self.graph[idx]).collect())
        } else {
            None
        }
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for (child, _) in self.dependencies_of(current) {
            if self.dfs_path(child, target, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Everything that (transitively) depends on a package, as a tree.
    pub fn print_inverted_tree(&self, name: &str) -> String {
        let mut output = String::new();
        let Some(idx) = self.find_by_str(name) else {
            return output;
        };
        output.push_str(&format!("{}\n", self.graph[idx]));

        let mut visited = HashSet::new();
        visited.insert(idx);
        let dependents = self.dependents_of(idx);
        let count = dependents.len();
        for (i, (dep_idx, _)) in dependents.iter().enumerate() {
            self.print_inverted_subtree(&mut output, *dep_idx, "", i == count - 1, &mut visited);
        }
        output
    }

    fn print_inverted_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let dependents = self.dependents_of(idx);
        let count = dependents.len();
        for (i, (dep_idx, _)) in dependents.iter().enumerate() {
            self.print_inverted_subtree(output, *dep_idx, &child_prefix, i == count - 1, visited);
        }

        visited.remove(&idx);
    }

    /// Number of pins (excluding the root).
    pub fn len(&self) -> usize {
        self.graph.node_count().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin(name: &str, version: &str) -> Pin {
        Pin::version(PackageName::new(name).unwrap(), version.parse().unwrap())
    }

    fn edge(spec: &str) -> DepEdge {
        DepEdge {
            specifier: spec.parse().unwrap(),
        }
    }

    /// root -> flask -> jinja2 -> markupsafe, root -> django
    fn sample() -> DependencyGraph {
        let mut g = DependencyGraph::new();
        let root = g.root();
        let flask = g.add_pin(pin("Flask", "0.10.1"));
        let jinja = g.add_pin(pin("Jinja2", "2.7.3"));
        let markupsafe = g.add_pin(pin("MarkupSafe", "0.23"));
        let django = g.add_pin(pin("Django", "1.8"));
        g.add_edge(root, flask, edge(""));
        g.add_edge(root, django, edge(""));
        g.add_edge(flask, jinja, edge(">=2.4"));
        g.add_edge(jinja, markupsafe, edge(""));
        g
    }

    #[test]
    fn add_and_find() {
        let g = sample();
        let idx = g.find_by_str("jinja2").unwrap();
        assert_eq!(g.node(idx).to_string(), "jinja2==2.7.3");
        assert_eq!(g.len(), 4);
    }

    #[test]
    fn duplicate_add_returns_same_index() {
        let mut g = DependencyGraph::new();
        let a = g.add_pin(pin("six", "1.10.0"));
        let b = g.add_pin(pin("Six", "1.10.0"));
        assert_eq!(a, b);
    }

    #[test]
    fn tree_printing() {
        let tree = sample().print_tree(None);
        let lines: Vec<&str> = tree.lines().collect();
        assert_eq!(
            lines,
            [
                "├── django==1.8 [required: any]",
                "└── flask==0.10.1 [required: any]",
                "    └── jinja2==2.7.3 [required: >=2.4]",
                "        └── markupsafe==0.23 [required: any]",
            ]
        );
    }

    #[test]
    fn tree_depth_limit() {
        let tree = sample().print_tree(Some(1));
        assert_eq!(tree.lines().count(), 2);
    }

    #[test]
    fn find_path_exists() {
        let g = sample();
        let path = g.find_path("markupsafe").unwrap();
        let names: Vec<String> = path.iter().map(|n| n.to_string()).collect();
        assert_eq!(
            names,
            ["<requirements>", "flask==0.10.1", "jinja2==2.7.3", "markupsafe==0.23"]
        );
    }

    #[test]
    fn find_path_not_found() {
        assert!(sample().find_path("missing").is_none());
    }

    #[test]
    fn inverted_tree() {
        let inv = sample().print_inverted_tree("MarkupSafe");
        assert!(inv.starts_with("markupsafe==0.23\n"));
        assert!(inv.contains("jinja2==2.7.3"));
        assert!(inv.contains("flask==0.10.1"));
        assert!(inv.contains("<requirements>"));
    }

    #[test]
    fn retain_reachable_drops_orphans() {
        let mut g = sample();
        let orphan = g.add_pin(pin("tornado", "3.2.2"));
        let leaf = g.add_pin(pin("backports-abc", "0.4"));
        g.add_edge(orphan, leaf, edge(""));

        let dropped = g.retain_reachable();
        let dropped: Vec<&str> = dropped.iter().map(PackageName::as_str).collect();
        assert_eq!(dropped, ["backports-abc", "tornado"]);
        assert_eq!(g.len(), 4);
        assert!(g.find_by_str("tornado").is_none());
        assert!(g.find_path("markupsafe").is_some());
        assert!(matches!(g.node(g.root()), GraphNode::Root));
    }
}
