//! Workspace-wide view of the convention `requires` graph.
//!
//! Composition itself walks the graph per module; this view is used to
//! report every cycle and dangling requirement up front and to print the
//! `requires` tree.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::core::convention::ConventionSet;
use crate::util::InternedString;

/// Directed graph with an edge `unit -> required unit`.
#[derive(Debug, Clone)]
pub struct ConventionGraph {
    graph: DiGraph<InternedString, ()>,
    nodes: HashMap<InternedString, NodeIndex>,

    /// `(unit, missing requirement)` pairs
    missing: Vec<(String, String)>,
}

impl ConventionGraph {
    pub fn new(set: &ConventionSet) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();

        for unit in set.units() {
            let node = graph.add_node(unit.id());
            nodes.insert(unit.id(), node);
        }

        let mut missing = Vec::new();
        for unit in set.units() {
            let from = nodes[&unit.id()];
            for req in unit.required_units() {
                match nodes.get(req) {
                    Some(&to) => {
                        graph.add_edge(from, to, ());
                    }
                    None => missing.push((unit.id().to_string(), req.to_string())),
                }
            }
        }

        ConventionGraph {
            graph,
            nodes,
            missing,
        }
    }

    /// Every cycle, as its member units in registration order.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<NodeIndex>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0])
            })
            .map(|mut scc| {
                scc.sort();
                scc
            })
            .collect();
        cycles.sort();

        cycles
            .into_iter()
            .map(|scc| scc.into_iter().map(|n| self.graph[n].to_string()).collect())
            .collect()
    }

    /// Requirements naming units that do not exist.
    pub fn missing_requirements(&self) -> &[(String, String)] {
        &self.missing
    }

    /// Units that directly require `id`.
    pub fn dependents(&self, id: &str) -> Vec<String> {
        let Some(&node) = self.nodes.get(id) else {
            return Vec::new();
        };

        let mut out: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .collect();
        out.sort();
        out.into_iter().map(|n| self.graph[n].to_string()).collect()
    }

    /// Render the `requires` tree below `id`, one line per entry.
    pub fn render_tree(&self, id: &str) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(&node) = self.nodes.get(id) {
            let mut path = Vec::new();
            self.render_node(node, 0, &mut path, &mut lines);
        }
        lines
    }

    fn render_node(
        &self,
        node: NodeIndex,
        depth: usize,
        path: &mut Vec<NodeIndex>,
        lines: &mut Vec<String>,
    ) {
        let prefix = if depth == 0 {
            String::new()
        } else {
            format!("{}├── ", "│   ".repeat(depth - 1))
        };

        if path.contains(&node) {
            lines.push(format!("{}{} (cycle)", prefix, self.graph[node]));
            return;
        }
        lines.push(format!("{}{}", prefix, self.graph[node]));

        let mut children: Vec<NodeIndex> = self.graph.neighbors(node).collect();
        children.sort();

        path.push(node);
        for child in children {
            self.render_node(child, depth + 1, path, lines);
        }
        path.pop();
    }
}
