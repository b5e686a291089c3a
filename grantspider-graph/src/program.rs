use std::collections::HashMap;
use std::fmt::Write as _;

use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;

pub const START: &str = "__start__";
pub const END: &str = "__end__";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Worker,
    Router,
    Terminal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    Default,
    Conditional,
}

#[derive(Clone, Debug)]
struct NodeData {
    name: String,
    kind: NodeKind,
}

/// Static view of a built graph: who can hand control to whom.
#[derive(Clone, Debug)]
pub struct GraphProgram {
    graph: Graph<NodeData, EdgeKind>,
    name_to_index: HashMap<String, NodeIndex>,
}

impl GraphProgram {
    pub(crate) fn new() -> Self {
        let mut program = Self {
            graph: Graph::new(),
            name_to_index: HashMap::new(),
        };
        program.add_node(START, NodeKind::Terminal);
        program
    }

    pub(crate) fn add_node(&mut self, name: &str, kind: NodeKind) {
        if self.name_to_index.contains_key(name) {
            return;
        }
        let index = self.graph.add_node(NodeData {
            name: name.to_string(),
            kind,
        });
        self.name_to_index.insert(name.to_string(), index);
    }

    pub(crate) fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind) {
        if to == END {
            self.add_node(END, NodeKind::Terminal);
        }
        if let (Some(&a), Some(&b)) = (self.name_to_index.get(from), self.name_to_index.get(to)) {
            self.graph.add_edge(a, b, kind);
        }
    }

    /// Node names in insertion order, `__start__` first.
    pub fn node_names(&self) -> Vec<String> {
        self.graph
            .node_indices()
            .filter_map(|index| self.graph.node_weight(index))
            .map(|node| node.name.clone())
            .collect()
    }

    pub fn node_kind(&self, name: &str) -> Option<NodeKind> {
        let index = self.name_to_index.get(name)?;
        self.graph.node_weight(*index).map(|node| node.kind)
    }

    pub fn edge_names(&self) -> Vec<(String, String)> {
        self.graph
            .edge_references()
            .filter_map(|edge| {
                let from = self.graph.node_weight(edge.source())?;
                let to = self.graph.node_weight(edge.target())?;
                Some((from.name.clone(), to.name.clone()))
            })
            .collect()
    }

    /// Routers render as diamonds and their choices as dotted edges.
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");
        for index in self.graph.node_indices() {
            let Some(node) = self.graph.node_weight(index) else {
                continue;
            };
            let _ = match node.kind {
                NodeKind::Terminal => writeln!(out, "    {0}([{0}])", node.name),
                NodeKind::Router => writeln!(out, "    {0}{{{0}}}", node.name),
                NodeKind::Worker => writeln!(out, "    {0}[{0}]", node.name),
            };
        }
        for edge in self.graph.edge_references() {
            let (Some(from), Some(to)) = (
                self.graph.node_weight(edge.source()),
                self.graph.node_weight(edge.target()),
            ) else {
                continue;
            };
            let arrow = match edge.weight() {
                EdgeKind::Default => "-->",
                EdgeKind::Conditional => "-.->",
            };
            let _ = writeln!(out, "    {} {arrow} {}", from.name, to.name);
        }
        out
    }
}
