// Graph Model Adapter
//
// Normalizes a host blueprint into Graph snapshots for analysis. The
// adapter is read-only and owns nothing host-side: callers hand it an
// already-read HostBlueprint (copy-on-read) and get back owned graphs.
//
// Host constructs the adapter cannot classify degrade instead of aborting:
// unknown node types become NodeKind::Other, malformed connections are
// dropped with a warning.

use tracing::warn;

use crate::host::{HostBlueprint, HostGraph};
use crate::types::{Graph, GraphBuilder, NodeKind, PinDirection, PinKind};

/// Errors from reading an asset into a normalized snapshot
///
/// `Unsupported` aborts only for assets the adapter cannot read at all
/// (e.g. malformed JSON); unclassifiable node kinds degrade instead.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("asset was deleted or unloaded during read: {0}")]
    Detached(String),

    #[error("unsupported asset content: {0}")]
    Unsupported(String),
}

/// Classify a host node type tag
///
/// The tag set is open: anything unrecognized is preserved as `Other`.
pub fn classify_node_type(node_type: &str) -> NodeKind {
    match node_type {
        "Event" | "CustomEvent" => NodeKind::Event,
        "CallFunction" | "FunctionCall" => NodeKind::FunctionCall,
        "VariableGet" => NodeKind::VariableGet,
        "VariableSet" => NodeKind::VariableSet,
        "Branch" => NodeKind::Branch,
        "MacroInstance" | "Macro" => NodeKind::Macro,
        other => NodeKind::Other(other.to_string()),
    }
}

/// Normalize every graph in a host blueprint
pub fn adapt(asset_path: &str, blueprint: &HostBlueprint) -> Vec<Graph> {
    blueprint
        .graphs
        .iter()
        .map(|g| adapt_graph(asset_path, g))
        .collect()
}

/// Normalize a single host graph
pub fn adapt_graph(asset_path: &str, host: &HostGraph) -> Graph {
    let mut builder = GraphBuilder::new(&host.id, asset_path);

    for node in &host.nodes {
        let kind = classify_node_type(&node.node_type);
        if let NodeKind::Other(raw) = &kind {
            warn!(
                asset = asset_path,
                graph = %host.id,
                node = %node.id,
                "unknown host node type '{}', keeping as-is", raw
            );
        }

        let name = node.name.as_deref().unwrap_or(&node.node_type);
        let mut tags = node.tags.clone();
        // Unreal convention: Tick is the per-frame event
        if kind == NodeKind::Event && name == "EventTick" {
            tags.push("per_frame".to_string());
        }

        if let Err(e) = builder.add_node(&node.id, kind, name, tags) {
            warn!(asset = asset_path, graph = %host.id, "skipping node: {}", e);
            continue;
        }

        for pin in &node.pins {
            let result = match pin.kind {
                PinKind::Exec => builder.add_exec_pin(&node.id, &pin.name, pin.direction),
                PinKind::Data => builder.add_data_pin(
                    &node.id,
                    &pin.name,
                    pin.direction,
                    pin.data_type.clone(),
                    pin.required && pin.default.is_none(),
                ),
            };
            if let Err(e) = result {
                warn!(asset = asset_path, graph = %host.id, "skipping pin: {}", e);
            }
        }
    }

    for conn in &host.connections {
        if let Err(e) = builder.add_edge(&conn.from, &conn.to) {
            warn!(
                asset = asset_path,
                graph = %host.id,
                "dropping connection {} -> {}: {}", conn.from, conn.to, e
            );
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostConnection, HostNode, HostPin};

    fn exec_pin(name: &str, direction: PinDirection) -> HostPin {
        HostPin {
            name: name.to_string(),
            direction,
            kind: PinKind::Exec,
            data_type: None,
            required: false,
            default: None,
        }
    }

    fn host_graph() -> HostGraph {
        HostGraph {
            id: "EventGraph".to_string(),
            nodes: vec![
                HostNode {
                    id: "tick".to_string(),
                    node_type: "Event".to_string(),
                    name: Some("EventTick".to_string()),
                    tags: vec![],
                    asset_ref: None,
                    pins: vec![exec_pin("then", PinDirection::Output)],
                },
                HostNode {
                    id: "call".to_string(),
                    node_type: "CallFunction".to_string(),
                    name: Some("DoThing".to_string()),
                    tags: vec!["expensive".to_string()],
                    asset_ref: None,
                    pins: vec![exec_pin("exec", PinDirection::Input)],
                },
                HostNode {
                    id: "weird".to_string(),
                    node_type: "TunnelBoundary".to_string(),
                    name: None,
                    tags: vec![],
                    asset_ref: None,
                    pins: vec![],
                },
            ],
            connections: vec![
                HostConnection {
                    from: "tick.then".to_string(),
                    to: "call.exec".to_string(),
                },
                // Dangling endpoint, must be dropped without aborting
                HostConnection {
                    from: "tick.then".to_string(),
                    to: "missing.exec".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_adapt_basic_graph() {
        let graph = adapt_graph("/Game/BP_Player", &host_graph());
        assert_eq!(graph.nodes().len(), 3);
        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.node("call").unwrap().kind, NodeKind::FunctionCall);
        assert!(graph.node("call").unwrap().has_tag("expensive"));
    }

    #[test]
    fn test_unknown_node_type_degrades() {
        let graph = adapt_graph("/Game/BP_Player", &host_graph());
        assert_eq!(
            graph.node("weird").unwrap().kind,
            NodeKind::Other("TunnelBoundary".to_string())
        );
    }

    #[test]
    fn test_tick_event_tagged_per_frame() {
        let graph = adapt_graph("/Game/BP_Player", &host_graph());
        assert!(graph.node("tick").unwrap().has_tag("per_frame"));
    }

    #[test]
    fn test_required_pin_with_default_is_not_required() {
        let host = HostGraph {
            id: "g".to_string(),
            nodes: vec![HostNode {
                id: "n".to_string(),
                node_type: "CallFunction".to_string(),
                name: None,
                tags: vec![],
                asset_ref: None,
                pins: vec![HostPin {
                    name: "count".to_string(),
                    direction: PinDirection::Input,
                    kind: PinKind::Data,
                    data_type: Some("int".to_string()),
                    required: true,
                    default: Some(serde_json::json!(1)),
                }],
            }],
            connections: vec![],
        };
        let graph = adapt_graph("/Game/BP_X", &host);
        assert!(!graph.pin("n.count").unwrap().required);
    }
}
