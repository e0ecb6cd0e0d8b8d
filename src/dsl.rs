use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::generator::keywords::KeywordDescriptor;

/// Material graph as exported by the editor.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MaterialGraphDSL {
    pub version: String,
    pub metadata: Metadata,
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
    /// Blackboard keywords. Keyword nodes reference these by reference name.
    #[serde(default)]
    pub keywords: Vec<KeywordDescriptor>,
    /// Names of the catalog targets this graph is authored for. Empty means
    /// every target in the catalog.
    #[serde(default)]
    pub targets: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Metadata {
    pub name: String,
    /// Menu path prefix of the generated shader (e.g. `Shader Graphs`).
    #[serde(default)]
    pub path: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,

    // Declared slots. Input order drives the upstream walk order.
    #[serde(default)]
    pub inputs: Vec<NodePort>,
    #[serde(default)]
    pub outputs: Vec<NodePort>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NodePort {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub port_type: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Connection {
    pub id: String,
    pub from: Endpoint,
    pub to: Endpoint,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Endpoint {
    #[serde(rename = "nodeId")]
    pub node_id: String,
    #[serde(rename = "portId")]
    pub port_id: String,
}

impl MaterialGraphDSL {
    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    /// Display path of the generated shader, e.g. `Shader Graphs/Lit`.
    pub fn shader_path(&self) -> String {
        match self.metadata.path.as_deref() {
            Some(prefix) if !prefix.is_empty() => {
                format!("{}/{}", prefix.trim_end_matches('/'), self.metadata.name)
            }
            _ => format!("Shader Graphs/{}", self.metadata.name),
        }
    }
}

pub fn load_graph_from_path(path: impl AsRef<std::path::Path>) -> Result<MaterialGraphDSL> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read material graph json at {}", path.display()))?;
    parse_graph_json(&text)
        .with_context(|| format!("failed to parse material graph json at {}", path.display()))
}

pub fn parse_graph_json(text: &str) -> Result<MaterialGraphDSL> {
    let graph: MaterialGraphDSL = serde_json::from_str(text).context("invalid material graph")?;
    if let Some(keyword) = graph.keywords.iter().find(|k| !k.has_values()) {
        return Err(GenerationError::EmptyKeyword {
            keyword: keyword.reference_name.clone(),
        })
        .context("invalid material graph");
    }
    Ok(graph)
}

pub fn find_node<'a>(graph: &'a MaterialGraphDSL, node_id: &str) -> Result<&'a Node, GenerationError> {
    graph
        .node(node_id)
        .ok_or_else(|| GenerationError::MissingNode {
            node_id: node_id.to_string(),
        })
}

pub fn incoming_connection<'a>(
    graph: &'a MaterialGraphDSL,
    to_node_id: &str,
    to_port_id: &str,
) -> Option<&'a Connection> {
    graph
        .connections
        .iter()
        .find(|c| c.to.node_id == to_node_id && c.to.port_id == to_port_id)
}

/// All connections feeding `node_id`, ordered by the node's declared input
/// ports. Connections to undeclared ports follow in connection order.
pub fn incoming_connections<'a>(graph: &'a MaterialGraphDSL, node: &Node) -> Vec<&'a Connection> {
    let mut out: Vec<&Connection> = Vec::new();
    for port in &node.inputs {
        if let Some(conn) = incoming_connection(graph, &node.id, &port.id) {
            out.push(conn);
        }
    }
    for conn in &graph.connections {
        if conn.to.node_id == node.id && !out.iter().any(|c| c.id == conn.id) {
            out.push(conn);
        }
    }
    out
}

pub fn parse_f32(params: &HashMap<String, serde_json::Value>, key: &str) -> Option<f32> {
    match params.get(key) {
        Some(v) => v
            .as_f64()
            .map(|x| x as f32)
            .or_else(|| v.as_u64().map(|x| x as f32))
            .or_else(|| v.as_i64().map(|x| x as f32)),
        None => None,
    }
}

pub fn parse_str<'a>(params: &'a HashMap<String, serde_json::Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

pub fn parse_bool(params: &HashMap<String, serde_json::Value>, key: &str) -> Option<bool> {
    params.get(key).and_then(|v| v.as_bool())
}

pub fn parse_u32(params: &HashMap<String, serde_json::Value>, key: &str) -> Option<u32> {
    params
        .get(key)
        .and_then(|v| v.as_u64())
        .and_then(|x| u32::try_from(x).ok())
}

/// Parses a fixed-size float vector (`[x, y, ...]`). Missing trailing
/// components are filled from `fallback`.
pub fn parse_vec<const N: usize>(
    params: &HashMap<String, serde_json::Value>,
    key: &str,
    fallback: [f32; N],
) -> [f32; N] {
    let mut out = fallback;
    if let Some(arr) = params.get(key).and_then(|v| v.as_array()) {
        for (slot, v) in out.iter_mut().zip(arr) {
            if let Some(x) = v.as_f64() {
                *slot = x as f32;
            }
        }
    }
    out
}
