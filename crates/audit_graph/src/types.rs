// Normalized Graph Model
//
// The adapter converts host blueprint assets into these structures. A Graph
// is an owned, acyclic snapshot keyed by stable string ids - no references
// back into host data. Once built it is immutable.

use std::collections::{BTreeSet, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Pins
// ─────────────────────────────────────────────────────────────────────────────

/// Direction of a pin on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinDirection {
    Input,
    Output,
}

/// Whether a pin carries execution flow or a data value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinKind {
    Exec,
    Data,
}

/// A pin on a normalized node
///
/// Pin ids use the `"node_id.pin_name"` encoding, matching the connection
/// endpoint format in host blueprint files.
#[derive(Debug, Clone)]
pub struct Pin {
    /// Stable pin id (`"node_id.pin_name"`)
    pub id: String,
    /// Owning node id
    pub node_id: String,
    /// Pin name within the node
    pub name: String,
    pub direction: PinDirection,
    pub kind: PinKind,
    /// Declared data type name, if the host supplied one
    pub data_type: Option<String>,
    /// True for input pins that must be connected (no default value)
    pub required: bool,
    /// Indices into `Graph::edges` for every edge touching this pin
    pub edges: Vec<usize>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Nodes
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of a node
///
/// Open tag set: host node types the adapter cannot classify are preserved
/// verbatim as `Other` rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Event,
    FunctionCall,
    VariableGet,
    VariableSet,
    Branch,
    Macro,
    Other(String),
}

impl NodeKind {
    /// Check if this is a variable access node (get or set)
    pub fn is_variable(&self) -> bool {
        matches!(self, NodeKind::VariableGet | NodeKind::VariableSet)
    }
}

/// A node in a normalized graph
#[derive(Debug, Clone)]
pub struct GraphNode {
    /// Stable node id within the graph
    pub id: String,
    pub kind: NodeKind,
    /// Display name (event name, function name, variable name, ...)
    pub name: String,
    /// Owning graph id
    pub graph_id: String,
    /// Ids of this node's pins
    pub pins: Vec<String>,
    /// Host-supplied metadata tags (e.g. `per_frame`, `expensive`)
    pub tags: BTreeSet<String>,
}

impl GraphNode {
    /// Check if this node carries a metadata tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Edges
// ─────────────────────────────────────────────────────────────────────────────

/// A directed connection between an output pin and an input pin
#[derive(Debug, Clone)]
pub struct Edge {
    /// Source pin id (an output pin)
    pub from: String,
    /// Destination pin id (an input pin)
    pub to: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Graph
// ─────────────────────────────────────────────────────────────────────────────

/// Errors raised while building a graph snapshot
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("duplicate pin id: {0}")]
    DuplicatePin(String),

    #[error("unknown node id: {0}")]
    UnknownNode(String),

    #[error("unknown pin id: {0}")]
    UnknownPin(String),

    #[error("edge {from} -> {to} must run from an output pin to an input pin")]
    DirectionMismatch { from: String, to: String },

    #[error("edge {from} -> {to} connects pins of different kinds")]
    KindMismatch { from: String, to: String },
}

/// An immutable, normalized graph snapshot
///
/// Node order is discovery order from the host asset and carries no meaning
/// beyond giving rules a deterministic iteration order. Every stored edge is
/// well-formed: both endpoints resolve to pins of nodes in this graph.
#[derive(Debug, Clone)]
pub struct Graph {
    /// Graph id (unique within the owning asset)
    pub id: String,
    /// Path of the owning asset (e.g. `/Game/BP_Player`)
    pub asset_path: String,
    nodes: Vec<GraphNode>,
    edges: Vec<Edge>,
    node_index: HashMap<String, usize>,
    pins: HashMap<String, Pin>,
}

impl Graph {
    /// All nodes, in discovery order
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// All edges
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    /// Look up a pin by id
    pub fn pin(&self, id: &str) -> Option<&Pin> {
        self.pins.get(id)
    }

    /// Pins of a node, in declaration order
    pub fn node_pins(&self, node_id: &str) -> impl Iterator<Item = &Pin> {
        self.node(node_id)
            .into_iter()
            .flat_map(|n| n.pins.iter())
            .filter_map(|id| self.pins.get(id))
    }

    /// Check whether a node has at least one exec pin in the given direction
    pub fn has_exec_pin(&self, node_id: &str, direction: PinDirection) -> bool {
        self.node_pins(node_id)
            .any(|p| p.kind == PinKind::Exec && p.direction == direction)
    }

    /// Check whether a node has any exec pin at all
    pub fn has_any_exec_pin(&self, node_id: &str) -> bool {
        self.node_pins(node_id).any(|p| p.kind == PinKind::Exec)
    }

    /// Nodes that start execution: events, plus any node with exec outputs
    /// but no exec inputs
    pub fn entry_nodes(&self) -> Vec<&GraphNode> {
        self.nodes
            .iter()
            .filter(|n| {
                n.kind == NodeKind::Event
                    || (self.has_exec_pin(&n.id, PinDirection::Output)
                        && !self.has_exec_pin(&n.id, PinDirection::Input))
            })
            .collect()
    }

    /// Nodes directly downstream of a node via execution edges
    pub fn exec_successors(&self, node_id: &str) -> Vec<&GraphNode> {
        let mut out = Vec::new();
        for pin in self.node_pins(node_id) {
            if pin.kind != PinKind::Exec || pin.direction != PinDirection::Output {
                continue;
            }
            for &edge_idx in &pin.edges {
                let edge = &self.edges[edge_idx];
                if let Some(dest) = self.pins.get(&edge.to) {
                    if let Some(node) = self.node(&dest.node_id) {
                        out.push(node);
                    }
                }
            }
        }
        out
    }

    /// Node ids reachable from the given start nodes via execution edges
    ///
    /// Start nodes are included in the result. Data edges are ignored.
    pub fn exec_reachable_from<'a>(
        &self,
        starts: impl IntoIterator<Item = &'a str>,
    ) -> BTreeSet<String> {
        let mut visited = BTreeSet::new();
        let mut queue: VecDeque<String> = starts
            .into_iter()
            .filter(|id| self.node(id).is_some())
            .map(str::to_string)
            .collect();

        while let Some(id) = queue.pop_front() {
            if !visited.insert(id.clone()) {
                continue;
            }
            for next in self.exec_successors(&id) {
                if !visited.contains(&next.id) {
                    queue.push_back(next.id.clone());
                }
            }
        }

        visited
    }

    /// Asset name derived from the owning asset path (last path segment)
    pub fn asset_name(&self) -> &str {
        self.asset_path.rsplit('/').next().unwrap_or(&self.asset_path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder used by the adapter (and tests) to assemble graph snapshots
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    /// Start a new graph for the given asset
    pub fn new(id: impl Into<String>, asset_path: impl Into<String>) -> Self {
        Self {
            graph: Graph {
                id: id.into(),
                asset_path: asset_path.into(),
                nodes: Vec::new(),
                edges: Vec::new(),
                node_index: HashMap::new(),
                pins: HashMap::new(),
            },
        }
    }

    /// Add a node
    pub fn add_node(
        &mut self,
        id: &str,
        kind: NodeKind,
        name: &str,
        tags: impl IntoIterator<Item = String>,
    ) -> Result<(), GraphError> {
        if self.graph.node_index.contains_key(id) {
            return Err(GraphError::DuplicateNode(id.to_string()));
        }
        let node = GraphNode {
            id: id.to_string(),
            kind,
            name: name.to_string(),
            graph_id: self.graph.id.clone(),
            pins: Vec::new(),
            tags: tags.into_iter().collect(),
        };
        self.graph.node_index.insert(id.to_string(), self.graph.nodes.len());
        self.graph.nodes.push(node);
        Ok(())
    }

    /// Add an execution pin to a node
    pub fn add_exec_pin(
        &mut self,
        node_id: &str,
        name: &str,
        direction: PinDirection,
    ) -> Result<(), GraphError> {
        self.add_pin(node_id, name, direction, PinKind::Exec, None, false)
    }

    /// Add a data pin to a node
    pub fn add_data_pin(
        &mut self,
        node_id: &str,
        name: &str,
        direction: PinDirection,
        data_type: Option<String>,
        required: bool,
    ) -> Result<(), GraphError> {
        self.add_pin(node_id, name, direction, PinKind::Data, data_type, required)
    }

    fn add_pin(
        &mut self,
        node_id: &str,
        name: &str,
        direction: PinDirection,
        kind: PinKind,
        data_type: Option<String>,
        required: bool,
    ) -> Result<(), GraphError> {
        let idx = *self
            .graph
            .node_index
            .get(node_id)
            .ok_or_else(|| GraphError::UnknownNode(node_id.to_string()))?;

        let pin_id = format!("{}.{}", node_id, name);
        if self.graph.pins.contains_key(&pin_id) {
            return Err(GraphError::DuplicatePin(pin_id));
        }

        self.graph.nodes[idx].pins.push(pin_id.clone());
        self.graph.pins.insert(
            pin_id.clone(),
            Pin {
                id: pin_id,
                node_id: node_id.to_string(),
                name: name.to_string(),
                direction,
                kind,
                data_type,
                required,
                edges: Vec::new(),
            },
        );
        Ok(())
    }

    /// Add an edge between two existing pins
    ///
    /// The edge must run from an output pin to an input pin of the same kind.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        let (from_dir, from_kind) = {
            let pin = self
                .graph
                .pins
                .get(from)
                .ok_or_else(|| GraphError::UnknownPin(from.to_string()))?;
            (pin.direction, pin.kind)
        };
        let (to_dir, to_kind) = {
            let pin = self
                .graph
                .pins
                .get(to)
                .ok_or_else(|| GraphError::UnknownPin(to.to_string()))?;
            (pin.direction, pin.kind)
        };

        if from_dir != PinDirection::Output || to_dir != PinDirection::Input {
            return Err(GraphError::DirectionMismatch {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        if from_kind != to_kind {
            return Err(GraphError::KindMismatch {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let edge_idx = self.graph.edges.len();
        self.graph.edges.push(Edge {
            from: from.to_string(),
            to: to.to_string(),
        });
        if let Some(pin) = self.graph.pins.get_mut(from) {
            pin.edges.push(edge_idx);
        }
        if let Some(pin) = self.graph.pins.get_mut(to) {
            pin.edges.push(edge_idx);
        }
        Ok(())
    }

    /// Finish building
    pub fn build(self) -> Graph {
        self.graph
    }
}
