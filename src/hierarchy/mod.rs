//! Creation order for environment and project hierarchies.
//!
//! Parameters may name a parent for their environment or project. Before
//! parameters are written, every referenced entity has to exist and parents
//! have to be created before their children. [`HierarchyResolver`] computes
//! that order:
//!
//! 1. Declared entries are the unique entities in discovery order; a blank
//!    parent means the root. An explicit parent replaces the root, and two
//!    different explicit parents for one entity are a validation error.
//! 2. Parents never declared as entities get an implicit `(parent, root)`
//!    entry.
//! 3. The root itself (`default` for environments, `""` for projects) is never
//!    scheduled.
//! 4. Entries are expanded breadth-first from the root's children; siblings
//!    keep discovery order.
//!
//! Parent references that form a cycle are rejected with
//! [`ImporterError::CircularHierarchy`].

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::fmt;

use crate::constants::{DEFAULT_ENVIRONMENT, PROJECT_ROOT};
use crate::core::ImporterError;
use crate::models::Parameter;

/// Which hierarchy is being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyKind {
    Environment,
    Project,
}

impl HierarchyKind {
    /// Root node every unparented entity hangs off
    #[must_use]
    pub const fn root(self) -> &'static str {
        match self {
            Self::Environment => DEFAULT_ENVIRONMENT,
            Self::Project => PROJECT_ROOT,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::Project => "project",
        }
    }

    /// The `(entity, parent)` edge a parameter contributes to this hierarchy
    #[must_use]
    pub fn edge(self, param: &Parameter) -> (&str, Option<&str>) {
        match self {
            Self::Environment => (param.environment(), param.environment_parent()),
            Self::Project => (param.project(), param.project_parent()),
        }
    }
}

impl fmt::Display for HierarchyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entity to create, with the parent it is created under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CreationEntry {
    pub entity: String,
    pub parent: String,
}

impl CreationEntry {
    fn new(entity: &str, parent: &str) -> Self {
        Self {
            entity: entity.to_string(),
            parent: parent.to_string(),
        }
    }
}

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

#[derive(Debug, Clone)]
pub struct HierarchyResolver {
    kind: HierarchyKind,
    root: String,
}

impl HierarchyResolver {
    #[must_use]
    pub fn new(kind: HierarchyKind) -> Self {
        Self::with_root(kind, kind.root())
    }

    #[must_use]
    pub fn with_root(kind: HierarchyKind, root: impl Into<String>) -> Self {
        Self {
            kind,
            root: root.into(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Creation order for the hierarchy referenced by `params`
    pub fn resolve_for(&self, params: &[Parameter]) -> Result<Vec<CreationEntry>, ImporterError> {
        self.resolve_order(params.iter().map(|p| self.kind.edge(p)))
    }

    /// Compute a parents-first creation order from `(entity, parent)` edges.
    ///
    /// # Errors
    ///
    /// Returns [`ImporterError::CircularHierarchy`] when parent references
    /// form a cycle and [`ImporterError::Validation`] when one entity is given
    /// two different parents.
    pub fn resolve_order<'a>(
        &self,
        edges: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
    ) -> Result<Vec<CreationEntry>, ImporterError> {
        let edges: Vec<(&str, &str)> = edges
            .into_iter()
            .map(|(entity, parent)| {
                let parent = parent.filter(|p| !p.trim().is_empty()).unwrap_or(self.root.as_str());
                (entity, parent)
            })
            .collect();

        let root = self.root.as_str();
        let mut position: HashMap<&str, usize> = HashMap::new();
        let mut declared: Vec<(&str, &str)> = Vec::new();
        for &(entity, parent) in &edges {
            let Some(&index) = position.get(entity) else {
                position.insert(entity, declared.len());
                declared.push((entity, parent));
                continue;
            };
            let current = declared[index].1;
            if current == parent || parent == root {
                continue;
            }
            if current != root {
                return Err(ImporterError::validation(format!(
                    "{} '{}' has conflicting parents '{}' and '{}'",
                    self.kind, entity, current, parent
                )));
            }
            declared[index].1 = parent;
        }

        for &(_, parent) in &edges {
            if !position.contains_key(parent) {
                position.insert(parent, declared.len());
                declared.push((parent, root));
            }
        }

        let mut entries: Vec<CreationEntry> =
            declared.iter().map(|(entity, parent)| CreationEntry::new(entity, parent)).collect();
        entries.retain(|entry| entry.entity != self.root);
        self.detect_cycles(&entries)?;

        let mut by_parent: HashMap<&str, Vec<&CreationEntry>> = HashMap::new();
        for entry in &entries {
            by_parent.entry(entry.parent.as_str()).or_default().push(entry);
        }

        let mut ordered: Vec<&CreationEntry> =
            by_parent.remove(self.root.as_str()).unwrap_or_default();
        let mut index = 0;
        while index < ordered.len() {
            let current: &CreationEntry = ordered[index];
            if let Some(children) = by_parent.remove(current.entity.as_str()) {
                ordered.extend(children);
            }
            index += 1;
        }

        let ordered: Vec<CreationEntry> = ordered.into_iter().cloned().collect();
        tracing::debug!(
            "{} creation order: {:?}",
            self.kind,
            ordered.iter().map(|e| format!("{}<-{}", e.entity, e.parent)).collect::<Vec<_>>()
        );
        Ok(ordered)
    }

    fn detect_cycles(&self, entries: &[CreationEntry]) -> Result<(), ImporterError> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();
        for entry in entries {
            let parent = node_for(&mut graph, &mut nodes, entry.parent.as_str());
            let child = node_for(&mut graph, &mut nodes, entry.entity.as_str());
            if !graph.contains_edge(parent, child) {
                graph.add_edge(parent, child, ());
            }
        }

        let mut colors: HashMap<NodeIndex, Color> =
            graph.node_indices().map(|n| (n, Color::White)).collect();
        let mut path = Vec::new();
        for start in graph.node_indices() {
            if colors.get(&start) != Some(&Color::White) {
                continue;
            }
            if let Some(cycle) = dfs_visit(&graph, start, &mut colors, &mut path) {
                return Err(ImporterError::CircularHierarchy {
                    kind: self.kind.to_string(),
                    cycle: cycle.join(" -> "),
                });
            }
        }
        Ok(())
    }
}

fn node_for<'e>(
    graph: &mut DiGraph<&'e str, ()>,
    nodes: &mut HashMap<&'e str, NodeIndex>,
    name: &'e str,
) -> NodeIndex {
    *nodes.entry(name).or_insert_with(|| graph.add_node(name))
}

/// Returns the cycle as a closed path when one is reachable from `node`
fn dfs_visit<'g>(
    graph: &DiGraph<&'g str, ()>,
    node: NodeIndex,
    colors: &mut HashMap<NodeIndex, Color>,
    path: &mut Vec<NodeIndex>,
) -> Option<Vec<&'g str>> {
    colors.insert(node, Color::Gray);
    path.push(node);

    for neighbor in graph.neighbors(node) {
        match colors.get(&neighbor) {
            Some(Color::Gray) => {
                let start = path.iter().position(|n| *n == neighbor).unwrap_or(0);
                let mut cycle: Vec<&str> = path[start..].iter().map(|n| graph[*n]).collect();
                cycle.push(graph[neighbor]);
                return Some(cycle);
            }
            Some(Color::White) => {
                if let Some(cycle) = dfs_visit(graph, neighbor, colors, path) {
                    return Some(cycle);
                }
            }
            _ => {}
        }
    }

    path.pop();
    colors.insert(node, Color::Black);
    None
}
