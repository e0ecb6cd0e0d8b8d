//! Node codegen infrastructure and trait definition.
//!
//! Every supported node type maps to a [`NodeKind`]; [`MaterialNode`] pairs a
//! graph node with its kind and implements [`NodeCodegen`] by dispatching to
//! the per-category modules.

pub mod input_nodes;
pub mod keyword_nodes;
pub mod master_nodes;
pub mod math_nodes;
pub mod scene_nodes;
pub mod texture_nodes;

use crate::error::Result;

use crate::dsl::{MaterialGraphDSL, Node, find_node, incoming_connection};
use crate::error::GenerationError;

use super::builder::ShaderStringBuilder;
use super::fields::Field;
use super::keywords::KeywordCollector;
use super::properties::PropertyCollector;
use super::requirements::ShaderRequirements;
use super::targets::PassDescriptor;
use super::types::{GenerationMode, ShaderStage, TypedExpr, ValueType};
use super::utils::{coerce, sanitize_ident};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Master,
    Color,
    Float,
    Vector,
    Add,
    Multiply,
    SampleTexture2D,
    Time,
    Uv,
    Position,
    Normal,
    VertexColor,
    SceneDepth,
    SceneColor,
    Keyword,
}

impl NodeKind {
    pub fn from_type_name(node_type: &str) -> Option<Self> {
        Some(match node_type {
            "Master" => NodeKind::Master,
            "Color" => NodeKind::Color,
            "Float" => NodeKind::Float,
            "Vector" | "Vector4" => NodeKind::Vector,
            "Add" => NodeKind::Add,
            "Multiply" => NodeKind::Multiply,
            "SampleTexture2D" => NodeKind::SampleTexture2D,
            "Time" => NodeKind::Time,
            "UV" => NodeKind::Uv,
            "Position" => NodeKind::Position,
            "Normal" => NodeKind::Normal,
            "VertexColor" => NodeKind::VertexColor,
            "SceneDepth" => NodeKind::SceneDepth,
            "SceneColor" => NodeKind::SceneColor,
            "Keyword" => NodeKind::Keyword,
            _ => return None,
        })
    }
}

/// Per-node code generation capability.
pub trait NodeCodegen {
    /// Fields this node switches on for a pass (master nodes only).
    fn conditional_fields(&self, _pass: &PassDescriptor) -> Vec<Field> {
        Vec::new()
    }

    fn requirements(&self, _graph: &MaterialGraphDSL, _stage: ShaderStage) -> ShaderRequirements {
        ShaderRequirements::default()
    }

    fn collect_properties(&self, _properties: &mut PropertyCollector, _mode: GenerationMode) {}

    fn register_functions(
        &self,
        _ctx: &NodeCodegenContext<'_>,
        _registry: &mut FunctionRegistry,
    ) -> Result<(), GenerationError> {
        Ok(())
    }

    /// Type of the value produced on `port`.
    fn output_type(&self, graph: &MaterialGraphDSL, port: &str) -> Result<ValueType, GenerationError>;

    /// Writes the node's body code into a description function.
    fn generate_code(
        &self,
        ctx: &NodeCodegenContext<'_>,
        sb: &mut ShaderStringBuilder,
    ) -> Result<(), GenerationError>;

    fn is_master(&self) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MaterialNode<'a> {
    pub node: &'a Node,
    pub kind: NodeKind,
}

impl<'a> MaterialNode<'a> {
    pub fn from_node(node: &'a Node) -> Result<Self, GenerationError> {
        let kind = NodeKind::from_type_name(&node.node_type).ok_or_else(|| {
            GenerationError::UnknownNodeType {
                node_id: node.id.clone(),
                node_type: node.node_type.clone(),
            }
        })?;
        Ok(Self { node, kind })
    }

    pub fn lookup(graph: &'a MaterialGraphDSL, node_id: &str) -> Result<Self, GenerationError> {
        Self::from_node(find_node(graph, node_id)?)
    }

    /// Output shown when the node itself is previewed.
    pub fn primary_output(&self) -> String {
        if let Some(port) = self.node.outputs.first() {
            return port.id.clone();
        }
        match self.kind {
            NodeKind::SampleTexture2D => "RGBA",
            NodeKind::Time => "Time",
            _ => "Out",
        }
        .to_string()
    }
}

impl NodeCodegen for MaterialNode<'_> {
    fn conditional_fields(&self, pass: &PassDescriptor) -> Vec<Field> {
        match self.kind {
            NodeKind::Master => master_nodes::conditional_fields(self.node, pass),
            _ => Vec::new(),
        }
    }

    fn requirements(&self, graph: &MaterialGraphDSL, stage: ShaderStage) -> ShaderRequirements {
        let node = self.node;
        match self.kind {
            NodeKind::Master => master_nodes::requirements(graph, node, stage),
            NodeKind::SampleTexture2D => texture_nodes::requirements(graph, node),
            NodeKind::Time | NodeKind::Uv | NodeKind::Position | NodeKind::Normal
            | NodeKind::VertexColor => input_nodes::geometry_requirements(node, self.kind),
            NodeKind::SceneDepth | NodeKind::SceneColor => scene_nodes::requirements(graph, node, self.kind),
            _ => ShaderRequirements::default(),
        }
    }

    fn collect_properties(&self, properties: &mut PropertyCollector, mode: GenerationMode) {
        match self.kind {
            NodeKind::Color | NodeKind::Float | NodeKind::Vector => {
                input_nodes::collect_properties(self.node, self.kind, properties, mode)
            }
            NodeKind::SampleTexture2D => texture_nodes::collect_properties(self.node, properties),
            _ => {}
        }
    }

    fn register_functions(
        &self,
        ctx: &NodeCodegenContext<'_>,
        registry: &mut FunctionRegistry,
    ) -> Result<(), GenerationError> {
        match self.kind {
            NodeKind::Add | NodeKind::Multiply => {
                math_nodes::register_functions(ctx, self.node, self.kind, registry)
            }
            _ => Ok(()),
        }
    }

    fn output_type(&self, graph: &MaterialGraphDSL, port: &str) -> Result<ValueType, GenerationError> {
        Ok(match self.kind {
            NodeKind::Master => ValueType::Float,
            NodeKind::Color | NodeKind::Vector | NodeKind::VertexColor | NodeKind::Uv => {
                ValueType::Vec4
            }
            NodeKind::Float | NodeKind::Time | NodeKind::SceneDepth => ValueType::Float,
            NodeKind::Position | NodeKind::Normal | NodeKind::SceneColor => ValueType::Vec3,
            NodeKind::SampleTexture2D => texture_nodes::output_type(port),
            NodeKind::Add | NodeKind::Multiply => math_nodes::output_type(graph, self.node)?,
            NodeKind::Keyword => keyword_nodes::output_type(graph, self.node)?,
        })
    }

    fn generate_code(
        &self,
        ctx: &NodeCodegenContext<'_>,
        sb: &mut ShaderStringBuilder,
    ) -> Result<(), GenerationError> {
        let node = self.node;
        match self.kind {
            NodeKind::Master => Ok(()),
            NodeKind::Color | NodeKind::Float | NodeKind::Vector => {
                input_nodes::generate_constant(ctx, node, self.kind, sb)
            }
            NodeKind::Time | NodeKind::Uv | NodeKind::Position | NodeKind::Normal
            | NodeKind::VertexColor => input_nodes::generate_geometry(node, self.kind, sb),
            NodeKind::Add | NodeKind::Multiply => math_nodes::generate_code(ctx, node, self.kind, sb),
            NodeKind::SampleTexture2D => texture_nodes::generate_code(ctx, node, sb),
            NodeKind::SceneDepth | NodeKind::SceneColor => {
                scene_nodes::generate_code(ctx, node, self.kind, sb)
            }
            NodeKind::Keyword => keyword_nodes::generate_code(ctx, node, sb),
        }
    }

    fn is_master(&self) -> bool {
        self.kind == NodeKind::Master
    }
}

/// Shared state handed to node code generation.
#[derive(Clone, Copy)]
pub struct NodeCodegenContext<'a> {
    pub graph: &'a MaterialGraphDSL,
    pub keywords: &'a KeywordCollector,
    pub mode: GenerationMode,
    pub stage: ShaderStage,
}

impl NodeCodegenContext<'_> {
    /// Expression feeding `port` of `node`, coerced to `ty`; `default` when the
    /// port is unconnected.
    pub fn input(
        &self,
        node: &Node,
        port: &str,
        ty: ValueType,
        default: &str,
    ) -> Result<TypedExpr, GenerationError> {
        match self.connected_output(node, port)? {
            Some(upstream) => Ok(coerce(&upstream, ty)),
            None => Ok(TypedExpr::new(default, ty)),
        }
    }

    /// Upstream variable connected to `port`, with its own type.
    pub fn connected_output(
        &self,
        node: &Node,
        port: &str,
    ) -> Result<Option<TypedExpr>, GenerationError> {
        connected_output(self.graph, node, port)
    }
}

pub fn connected_output(
    graph: &MaterialGraphDSL,
    node: &Node,
    port: &str,
) -> Result<Option<TypedExpr>, GenerationError> {
    let Some(conn) = incoming_connection(graph, &node.id, port) else {
        return Ok(None);
    };
    let upstream = MaterialNode::lookup(graph, &conn.from.node_id)?;
    let ty = upstream.output_type(graph, &conn.from.port_id)?;
    Ok(Some(TypedExpr::new(
        variable_name(upstream.node, &conn.from.port_id),
        ty,
    )))
}

/// Local variable holding the value of a node output.
pub fn variable_name(node: &Node, port: &str) -> String {
    format!(
        "_{}_{}_{}",
        sanitize_ident(&node.node_type),
        sanitize_ident(&node.id),
        sanitize_ident(port)
    )
}

/// Helper functions emitted once into the graph-functions section, in
/// registration order.
#[derive(Debug, Default, Clone)]
pub struct FunctionRegistry {
    functions: Vec<(String, String)>,
}

impl FunctionRegistry {
    /// Registers `body` under `name`; later registrations of the same name are
    /// ignored.
    pub fn provide(&mut self, name: &str, body: impl FnOnce() -> String) {
        if self.functions.iter().any(|(n, _)| n == name) {
            return;
        }
        self.functions.push((name.to_string(), body()));
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|(n, _)| n.as_str())
    }

    pub fn to_source(&self) -> String {
        let mut sb = ShaderStringBuilder::new();
        for (i, (_, body)) in self.functions.iter().enumerate() {
            if i > 0 {
                sb.append_newline();
            }
            sb.append_lines(body);
        }
        sb.into_string()
    }
}

/// Test utilities for building graphs of typed material nodes.
#[cfg(test)]
pub mod test_utils {
    use std::collections::HashMap;

    use crate::dsl::Node;
    use crate::dsl::test_utils::test_node;

    pub fn node_with_params(
        id: &str,
        node_type: &str,
        inputs: &[&str],
        params: &[(&str, serde_json::Value)],
    ) -> Node {
        let mut node = test_node(id, node_type, inputs);
        node.params = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<HashMap<_, _>>();
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::test_utils::{test_connection, test_graph, test_node};

    #[test]
    fn unknown_node_type_is_rejected() {
        let node = test_node("n", "Voronoi", &[]);
        let err = MaterialNode::from_node(&node).unwrap_err();
        assert!(matches!(err, GenerationError::UnknownNodeType { node_type, .. } if node_type == "Voronoi"));
    }

    #[test]
    fn input_resolves_connected_variable_and_coerces() {
        let graph = test_graph(
            vec![test_node("c", "Color", &[]), test_node("add", "Add", &["A", "B"])],
            vec![test_connection("c", "Out", "add", "A")],
        );
        let keywords = KeywordCollector::default();
        let ctx = NodeCodegenContext {
            graph: &graph,
            keywords: &keywords,
            mode: GenerationMode::Final,
            stage: ShaderStage::Pixel,
        };
        let add = graph.node("add").unwrap();
        let a = ctx.input(add, "A", ValueType::Vec3, "0").unwrap();
        assert_eq!(a.expr, "(_Color_c_Out).xyz");
        let b = ctx.input(add, "B", ValueType::Vec3, "float3(0, 0, 0)").unwrap();
        assert_eq!(b.expr, "float3(0, 0, 0)");
    }

    #[test]
    fn registry_keeps_first_registration() {
        let mut registry = FunctionRegistry::default();
        registry.provide("f", || "void f() {}".to_string());
        registry.provide("f", || "void g() {}".to_string());
        registry.provide("h", || "void h() {}".to_string());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["f", "h"]);
        assert_eq!(registry.to_source(), "void f() {}\n\nvoid h() {}");
    }
}
