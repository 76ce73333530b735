//! You can export AIGs and FRAIGs to the Graphviz dot format using their `to_dot` methods:
//! [`Aig::to_dot`], [`FraigManager::to_dot`].
//!
//! ```rust
//! use fraig::Aig;
//! use fraig::dot::GraphvizStyle;
//!
//! let mut aig = Aig::new();
//! let a = aig.create_pi().unwrap();
//! let b = aig.create_pi().unwrap();
//! let sum = aig.xor(a, b).unwrap();
//! let carry = aig.and(a, b).unwrap();
//! aig.add_output(sum).unwrap();
//! aig.add_output(carry).unwrap();
//! let dot = aig.to_dot(GraphvizStyle::default());
//! assert!(dot.contains("subgraph inputs"));
//! ```
//!
//! You can then render the graphs using the DOT engine.
//!
//! [`FraigManager::to_dot`]: crate::FraigManager::to_dot

use std::{fmt::Display, ops::Add};

use crate::{Aig, AigEdge, AigNode, NodeId, dfs::Dfs};

// Definining default global style.
const DEFAULT_RANKDIR: &str = "BT";

// Defining default style for nodes.
const DEFAULT_CONST_NODE_FORMAT: &str = "[shape=point, label=\"VDD\", width=1.5]";
const DEFAULT_INPUT_NODE_FORMAT: &str = "[shape=box]";
const DEFAULT_AND_NODE_FORMAT: &str = "[shape=circle]";
/// See https://stackoverflow.com/questions/50822798/how-to-use-graphviz-to-draw-a-node-pointed-by-an-arrow.
const DEFAULT_OUTPUT_NODE_FORMAT: &str = "[shape=none, height=.0, width=.0]";

// Defining default style for edges.
const DEFAULT_EDGE_ALL_FORMAT: &str = "[arrowsize=0.3]";
const DEFAULT_EDGE_COMPLEMENT_FORMAT: &str = "[headlabel=\"●\", labelangle=.0, labeldistance=1.5]";
const DEFAULT_EDGE_CHOICE_FORMAT: &str = "[style=\"dashed\", arrowhead=none, constraint=false]";
const DEFAULT_EDGE_OUTPUT_FORMAT: &str = "[arrowhead=none]";

/// String containing the graphviz node style (you must manually include square brackets).
///
/// See [`GraphvizStyle`] for what kind of nodes can be described.
#[derive(Debug, Clone)]
pub struct GraphvizNodeStyle(String);

impl Display for GraphvizNodeStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// String containing the graphviz edge style (you must manually include square brackets).
///
/// See [`GraphvizStyle`] for what kind of edges can be described.
#[derive(Debug, Clone, Default)]
pub struct GraphvizEdgeStyle(String);

impl Display for GraphvizEdgeStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for GraphvizEdgeStyle {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        GraphvizEdgeStyle(format!("{}{}", self.0, rhs.0))
    }
}

/// Parameters for Graphviz rendering.
///
/// ### Global parameters
/// - `rankdir`
///
/// ### Nodes
/// The following nodes can be rendered using [`GraphvizNodeStyle`]:
/// - [`AigNode::True`]
/// - [`AigNode::Input`]
/// - [`AigNode::And`]
/// - [`AigNode::Output`] (by default, invisible node just to get an arrow).
///
/// ### Edges
/// Edge styles are additive. All edges implement the `edge_all` style. To that can be added:
/// - `edge_complement` if the edge is complemented
/// - `edge_output` if the edge is directed to an output.
///
/// Choice links of a FRAIG (not a fanin relation) use the `edge_choice` style.
#[derive(Debug, Clone)]
pub struct GraphvizStyle {
    // Global
    rankdir: String,

    // Nodes
    cst_true: GraphvizNodeStyle,
    input: GraphvizNodeStyle,
    and: GraphvizNodeStyle,
    output: GraphvizNodeStyle,

    // Edges
    edge_all: GraphvizEdgeStyle,
    edge_complement: GraphvizEdgeStyle,
    edge_choice: GraphvizEdgeStyle,
    edge_output: GraphvizEdgeStyle,
}

impl Default for GraphvizStyle {
    fn default() -> Self {
        GraphvizStyle {
            rankdir: DEFAULT_RANKDIR.to_string(),

            cst_true: GraphvizNodeStyle(DEFAULT_CONST_NODE_FORMAT.to_string()),
            input: GraphvizNodeStyle(DEFAULT_INPUT_NODE_FORMAT.to_string()),
            and: GraphvizNodeStyle(DEFAULT_AND_NODE_FORMAT.to_string()),
            output: GraphvizNodeStyle(DEFAULT_OUTPUT_NODE_FORMAT.to_string()),

            edge_all: GraphvizEdgeStyle(DEFAULT_EDGE_ALL_FORMAT.to_string()),
            edge_complement: GraphvizEdgeStyle(DEFAULT_EDGE_COMPLEMENT_FORMAT.to_string()),
            edge_choice: GraphvizEdgeStyle(DEFAULT_EDGE_CHOICE_FORMAT.to_string()),
            edge_output: GraphvizEdgeStyle(DEFAULT_EDGE_OUTPUT_FORMAT.to_string()),
        }
    }
}

impl GraphvizStyle {
    /// Graphviz `rankdir`, `"BT"` by default so inputs are at the bottom.
    pub fn with_rankdir(mut self, rankdir: &str) -> Self {
        self.rankdir = rankdir.to_string();
        self
    }
}

impl AigNode {
    fn graphviz_decl(&self, name: Option<&str>) -> String {
        let id = self.get_id();
        let label = match (self, name) {
            (_, Some(name)) => name.to_string(),
            (AigNode::True, None) => return id.to_string(), // style is defined later
            (AigNode::Input { index, .. }, None) => format!("i{}", index),
            (AigNode::Output { index, .. }, None) => format!("o{}", index),
            (AigNode::And { .. }, None) => "".to_string(),
        };
        format!("{} [label=\"{}\"]\n", id, label)
    }
}

impl AigEdge {
    fn graphviz_decl(&self, to: NodeId, to_output: bool, graphviz_style: &GraphvizStyle) -> String {
        let mut style = GraphvizEdgeStyle::default();
        if self.complement {
            style = style + graphviz_style.edge_complement.clone();
        }
        if to_output {
            style = style + graphviz_style.edge_output.clone();
        }
        format!("{} -> {} {}\n", self.node, to, style)
    }
}

impl Aig {
    /// Returns a DOT representation of the AIG, restricted to the cones of the outputs.
    pub fn to_dot(&self, graphviz_style: GraphvizStyle) -> String {
        self.to_dot_with_links(graphviz_style, &[], &[])
    }

    /// Same as [`Aig::to_dot`], `extra_roots` cones are drawn too and `links` are drawn
    /// with the choice edge style.
    pub(crate) fn to_dot_with_links(
        &self,
        graphviz_style: GraphvizStyle,
        extra_roots: &[NodeId],
        links: &[(NodeId, NodeId)],
    ) -> String {
        let mut decl_edges = String::new();

        // Creating different subgraphs for node declarations
        let mut decl_const_node_optional = "".to_string();
        let mut decl_inputs = format!("subgraph inputs {{\n node {}\n", graphviz_style.input);
        let mut decl_outputs = format!("subgraph outputs {{\n node {}\n", graphviz_style.output);
        let mut decl_ands = format!("subgraph ands {{\n node {}\n", graphviz_style.and);

        let roots: Vec<NodeId> = self.outputs().iter().chain(extra_roots).copied().collect();
        let mut dfs = Dfs::from_roots(&roots);
        while let Some(id) = dfs.next(self) {
            let Some(node) = self.get_node(id) else {
                continue;
            };
            let decl = node.graphviz_decl(self.get_name(id));
            match node {
                AigNode::True => decl_const_node_optional
                    .push_str(&format!("{} {}\n", decl, graphviz_style.cst_true)),
                AigNode::Input { .. } => decl_inputs.push_str(&decl),
                AigNode::Output { .. } => decl_outputs.push_str(&decl),
                AigNode::And { .. } => decl_ands.push_str(&decl),
            }
            for fanin in node.get_fanins() {
                decl_edges.push_str(&fanin.graphviz_decl(id, node.is_output(), &graphviz_style));
            }
        }

        for (from, to) in links {
            decl_edges.push_str(&format!(
                "{} -> {} {}\n",
                from, to, graphviz_style.edge_choice
            ));
        }

        // Concatenating everything together
        format!(
            "
strict digraph {{
    rankdir=\"{}\"
    edge {}
    {}
    {}
    }}
    {}
    }}
    {}
    }}
    {}
}}",
            graphviz_style.rankdir,
            graphviz_style.edge_all,
            decl_const_node_optional,
            decl_inputs,
            decl_ands,
            decl_outputs,
            decl_edges
        )
    }
}
