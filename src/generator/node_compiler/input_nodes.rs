//! Input nodes: constants (Color, Float, Vector) and geometry inputs (Time,
//! UV, Position, Normal, VertexColor).

use crate::dsl::{Node, parse_bool, parse_f32, parse_str, parse_u32, parse_vec};
use crate::error::GenerationError;

use super::super::builder::ShaderStringBuilder;
use super::super::properties::{PropertyCollector, PropertyKind, ShaderProperty};
use super::super::requirements::{CoordinateSpace, ShaderRequirements};
use super::super::types::{GenerationMode, ValueType};
use super::super::utils::{fmt_f32, fmt_vec, sanitize_ident};
use super::{NodeCodegenContext, NodeKind, variable_name};

const COLOR_DEFAULT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const VECTOR_DEFAULT: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// Property backing a constant node, if any.
///
/// Explicit `property` params are exposed material properties. In preview
/// mode every other constant is driven by a hidden property so the preview
/// can tweak it without regenerating.
fn backing_property(node: &Node, kind: NodeKind, mode: GenerationMode) -> Option<ShaderProperty> {
    let value_kind = match kind {
        NodeKind::Float => PropertyKind::Float(parse_f32(&node.params, "value").unwrap_or(0.0)),
        NodeKind::Color => PropertyKind::Color(parse_vec(&node.params, "value", COLOR_DEFAULT)),
        NodeKind::Vector => PropertyKind::Vector4(parse_vec(&node.params, "value", VECTOR_DEFAULT)),
        _ => return None,
    };

    if let Some(reference) = parse_str(&node.params, "property") {
        let display = parse_str(&node.params, "displayName").unwrap_or(reference);
        let mut prop = ShaderProperty::new(reference, display, value_kind);
        prop.exposed = parse_bool(&node.params, "exposed").unwrap_or(true);
        prop.instanced = parse_bool(&node.params, "instanced").unwrap_or(false);
        return Some(prop);
    }

    if mode.is_preview() {
        let reference = format!("_{}_{}", sanitize_ident(&node.node_type), sanitize_ident(&node.id));
        let mut prop = ShaderProperty::new(&reference, &reference, value_kind);
        prop.exposed = false;
        return Some(prop);
    }
    None
}

pub fn collect_properties(
    node: &Node,
    kind: NodeKind,
    properties: &mut PropertyCollector,
    mode: GenerationMode,
) {
    if let Some(prop) = backing_property(node, kind, mode) {
        properties.add(prop);
    }
}

/// Compile a constant node.
///
/// # Example
/// ```hlsl
/// float4 _Color_tint_Out = float4(1, 0.5, 0, 1);
/// ```
pub fn generate_constant(
    ctx: &NodeCodegenContext<'_>,
    node: &Node,
    kind: NodeKind,
    sb: &mut ShaderStringBuilder,
) -> Result<(), GenerationError> {
    let out = variable_name(node, "Out");
    let (ty, literal) = match kind {
        NodeKind::Float => (
            ValueType::Float,
            fmt_f32(parse_f32(&node.params, "value").unwrap_or(0.0)),
        ),
        NodeKind::Color => (
            ValueType::Vec4,
            fmt_vec(&parse_vec(&node.params, "value", COLOR_DEFAULT)),
        ),
        _ => (
            ValueType::Vec4,
            fmt_vec(&parse_vec(&node.params, "value", VECTOR_DEFAULT)),
        ),
    };
    let value = match backing_property(node, kind, ctx.mode) {
        Some(prop) => prop.reference_name,
        None => literal,
    };
    sb.append_line(&format!("{} {out} = {value};", ty.hlsl()));
    Ok(())
}

fn coordinate_space(node: &Node) -> CoordinateSpace {
    match parse_str(&node.params, "space") {
        Some("World") | Some("world") => CoordinateSpace::World,
        _ => CoordinateSpace::Object,
    }
}

fn uv_channel(node: &Node) -> u32 {
    parse_u32(&node.params, "channel").unwrap_or(0).min(3)
}

pub fn geometry_requirements(node: &Node, kind: NodeKind) -> ShaderRequirements {
    let mut req = ShaderRequirements::default();
    match kind {
        NodeKind::Time => req.time = true,
        NodeKind::Uv => {
            req.uv_channels.insert(uv_channel(node));
        }
        NodeKind::Position => {
            req.position.insert(coordinate_space(node));
        }
        NodeKind::Normal => {
            req.normal.insert(coordinate_space(node));
        }
        NodeKind::VertexColor => req.vertex_color = true,
        _ => {}
    }
    req
}

pub fn generate_geometry(
    node: &Node,
    kind: NodeKind,
    sb: &mut ShaderStringBuilder,
) -> Result<(), GenerationError> {
    let space = match coordinate_space(node) {
        CoordinateSpace::Object => "ObjectSpace",
        CoordinateSpace::World => "WorldSpace",
    };
    match kind {
        NodeKind::Time => {
            for (port, swizzle) in [("Time", "x"), ("SineTime", "y"), ("CosineTime", "z")] {
                sb.append_line(&format!(
                    "float {} = IN.TimeParameters.{swizzle};",
                    variable_name(node, port)
                ));
            }
        }
        NodeKind::Uv => sb.append_line(&format!(
            "float4 {} = IN.uv{};",
            variable_name(node, "Out"),
            uv_channel(node)
        )),
        NodeKind::Position => sb.append_line(&format!(
            "float3 {} = IN.{space}Position;",
            variable_name(node, "Out")
        )),
        NodeKind::Normal => sb.append_line(&format!(
            "float3 {} = IN.{space}Normal;",
            variable_name(node, "Out")
        )),
        NodeKind::VertexColor => sb.append_line(&format!(
            "float4 {} = IN.VertexColor;",
            variable_name(node, "Out")
        )),
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::test_utils::test_graph;
    use crate::generator::keywords::KeywordCollector;
    use crate::generator::node_compiler::test_utils::node_with_params;
    use crate::generator::types::ShaderStage;
    use serde_json::json;

    fn emit(node: Node, mode: GenerationMode) -> String {
        let kind = NodeKind::from_type_name(&node.node_type).unwrap();
        let graph = test_graph(vec![node.clone()], Vec::new());
        let keywords = KeywordCollector::default();
        let ctx = NodeCodegenContext {
            graph: &graph,
            keywords: &keywords,
            mode,
            stage: ShaderStage::Pixel,
        };
        let mut sb = ShaderStringBuilder::new();
        match kind {
            NodeKind::Color | NodeKind::Float | NodeKind::Vector => {
                generate_constant(&ctx, &node, kind, &mut sb).unwrap()
            }
            _ => generate_geometry(&node, kind, &mut sb).unwrap(),
        }
        sb.into_string()
    }

    #[test]
    fn color_constant_is_inlined() {
        let node = node_with_params("tint", "Color", &[], &[("value", json!([0.5, 0.25, 0.0, 1.0]))]);
        assert_eq!(
            emit(node, GenerationMode::Final),
            "float4 _Color_tint_Out = float4(0.5, 0.25, 0, 1);"
        );
    }

    #[test]
    fn property_backed_float_reads_property() {
        let node = node_with_params(
            "s",
            "Float",
            &[],
            &[("value", json!(0.5)), ("property", json!("_Smoothness"))],
        );
        assert_eq!(emit(node.clone(), GenerationMode::Final), "float _Float_s_Out = _Smoothness;");

        let mut props = PropertyCollector::default();
        collect_properties(&node, NodeKind::Float, &mut props, GenerationMode::Final);
        assert_eq!(props.properties_block(), vec!["_Smoothness(\"_Smoothness\", Float) = 0.5"]);
    }

    #[test]
    fn preview_constants_use_hidden_properties() {
        let node = node_with_params("f", "Float", &[], &[("value", json!(2.0))]);
        assert_eq!(emit(node.clone(), GenerationMode::Preview), "float _Float_f_Out = _Float_f;");

        let mut props = PropertyCollector::default();
        collect_properties(&node, NodeKind::Float, &mut props, GenerationMode::Final);
        assert!(props.properties().is_empty());
        collect_properties(&node, NodeKind::Float, &mut props, GenerationMode::Preview);
        assert_eq!(
            props.properties_block(),
            vec!["[HideInInspector]_Float_f(\"_Float_f\", Float) = 2"]
        );
    }

    #[test]
    fn geometry_inputs_read_description_inputs() {
        let uv = node_with_params("u", "UV", &[], &[("channel", json!(1))]);
        assert_eq!(emit(uv.clone(), GenerationMode::Final), "float4 _UV_u_Out = IN.uv1;");
        assert!(geometry_requirements(&uv, NodeKind::Uv).uv_channels.contains(&1));

        let pos = node_with_params("p", "Position", &[], &[("space", json!("World"))]);
        assert_eq!(
            emit(pos, GenerationMode::Final),
            "float3 _Position_p_Out = IN.WorldSpacePosition;"
        );
    }
}
