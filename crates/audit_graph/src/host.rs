// Host Asset Format
//
// Blueprint assets are stored by the host editor as `*.bp.json` files. These
// types mirror that on-disk shape; the adapter normalizes them into Graph
// snapshots. This is the read-only interface to the host - nothing here is
// ever written back.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{PinDirection, PinKind};

/// A blueprint asset as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostBlueprint {
    /// Asset name (e.g. `BP_Player`)
    pub name: String,
    /// Parent class name, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_class: Option<String>,
    /// Graphs contained in this asset (event graphs, function graphs, ...)
    #[serde(default)]
    pub graphs: Vec<HostGraph>,
}

/// One graph within a host blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostGraph {
    /// Graph id, unique within the asset (e.g. `EventGraph`)
    pub id: String,
    #[serde(default)]
    pub nodes: Vec<HostNode>,
    #[serde(default)]
    pub connections: Vec<HostConnection>,
}

/// A node instance in a host graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostNode {
    /// Stable node id within the graph
    pub id: String,
    /// Host node type tag (e.g. `Event`, `CallFunction`, `VariableGet`)
    #[serde(rename = "type")]
    pub node_type: String,
    /// Display name; falls back to the type tag when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Metadata tags (e.g. `per_frame`, `expensive`)
    #[serde(default)]
    pub tags: Vec<String>,
    /// Path of an asset this node references (spawn/cast/subgraph targets)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_ref: Option<String>,
    #[serde(default)]
    pub pins: Vec<HostPin>,
}

/// A pin declaration on a host node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostPin {
    pub name: String,
    pub direction: PinDirection,
    #[serde(default = "default_pin_kind")]
    pub kind: PinKind,
    /// Declared data type name, for data pins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// Input pins the host marks as required
    #[serde(default)]
    pub required: bool,
    /// Default value; a required pin with a default does not need a
    /// connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

fn default_pin_kind() -> PinKind {
    PinKind::Data
}

/// A connection between two pins, using `"node_id.pin_name"` endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConnection {
    pub from: String,
    pub to: String,
}

impl HostConnection {
    /// Parse the `from` endpoint into (node_id, pin_name)
    pub fn from_parts(&self) -> Option<(&str, &str)> {
        self.from.split_once('.')
    }

    /// Parse the `to` endpoint into (node_id, pin_name)
    pub fn to_parts(&self) -> Option<(&str, &str)> {
        self.to.split_once('.')
    }
}

/// Asset paths referenced by a blueprint
///
/// Collected from the parent class, node `asset_ref` fields, and string pin
/// defaults. Only project content (`/Game/...`) participates in reference
/// queries.
pub fn asset_references(blueprint: &HostBlueprint) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();

    if let Some(parent) = &blueprint.parent_class {
        if is_asset_path(parent) {
            refs.insert(parent.clone());
        }
    }

    for graph in &blueprint.graphs {
        for node in &graph.nodes {
            if let Some(target) = &node.asset_ref {
                if is_asset_path(target) {
                    refs.insert(target.clone());
                }
            }
            for pin in &node.pins {
                if let Some(serde_json::Value::String(value)) = &pin.default {
                    if is_asset_path(value) {
                        refs.insert(value.clone());
                    }
                }
            }
        }
    }

    refs
}

fn is_asset_path(value: &str) -> bool {
    value.starts_with("/Game/")
}
