//! SampleTexture2D node.

use crate::dsl::{MaterialGraphDSL, Node, incoming_connection, parse_bool, parse_str, parse_u32};
use crate::error::GenerationError;

use super::super::builder::ShaderStringBuilder;
use super::super::properties::{PropertyCollector, PropertyKind, ShaderProperty};
use super::super::requirements::ShaderRequirements;
use super::super::types::{ShaderStage, ValueType};
use super::super::utils::sanitize_ident;
use super::{NodeCodegenContext, variable_name};

const DEFAULT_TEXTURE_PROPERTY: &str = "_MainTex";

fn texture_reference(node: &Node) -> String {
    sanitize_ident(parse_str(&node.params, "texture").unwrap_or(DEFAULT_TEXTURE_PROPERTY))
}

fn uv_channel(node: &Node) -> u32 {
    parse_u32(&node.params, "channel").unwrap_or(0).min(3)
}

pub fn output_type(port: &str) -> ValueType {
    match port {
        "R" | "G" | "B" | "A" => ValueType::Float,
        _ => ValueType::Vec4,
    }
}

/// An unconnected `UV` input samples with mesh UVs.
pub fn requirements(graph: &MaterialGraphDSL, node: &Node) -> ShaderRequirements {
    let mut req = ShaderRequirements::default();
    if incoming_connection(graph, &node.id, "UV").is_none() {
        req.uv_channels.insert(uv_channel(node));
    }
    req
}

pub fn collect_properties(node: &Node, properties: &mut PropertyCollector) {
    let reference = texture_reference(node);
    let display = parse_str(&node.params, "displayName")
        .map(str::to_string)
        .unwrap_or_else(|| reference.clone());
    let default_texture = parse_str(&node.params, "defaultTexture")
        .unwrap_or("white")
        .to_string();
    let mut prop = ShaderProperty::new(&reference, &display, PropertyKind::Texture2D { default_texture });
    prop.exposed = parse_bool(&node.params, "exposed").unwrap_or(true);
    properties.add(prop);
}

/// Compile a SampleTexture2D node.
///
/// Vertex-stage samples use an explicit LOD since derivatives are undefined.
///
/// # Example
/// ```hlsl
/// float4 _SampleTexture2D_s_RGBA = SAMPLE_TEXTURE2D(_MainTex, sampler_MainTex, IN.uv0.xy);
/// float _SampleTexture2D_s_R = _SampleTexture2D_s_RGBA.r;
/// ```
pub fn generate_code(
    ctx: &NodeCodegenContext<'_>,
    node: &Node,
    sb: &mut ShaderStringBuilder,
) -> Result<(), GenerationError> {
    let texture = texture_reference(node);
    let default_uv = format!("IN.uv{}.xy", uv_channel(node));
    let uv = ctx.input(node, "UV", ValueType::Vec2, &default_uv)?;
    let rgba = variable_name(node, "RGBA");
    let sample = match ctx.stage {
        ShaderStage::Vertex => {
            format!("SAMPLE_TEXTURE2D_LOD({texture}, sampler{texture}, {}, 0)", uv.expr)
        }
        ShaderStage::Pixel => format!("SAMPLE_TEXTURE2D({texture}, sampler{texture}, {})", uv.expr),
    };
    sb.append_line(&format!("float4 {rgba} = {sample};"));
    for channel in ["R", "G", "B", "A"] {
        sb.append_line(&format!(
            "float {} = {rgba}.{};",
            variable_name(node, channel),
            channel.to_lowercase()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::test_utils::{test_connection, test_graph, test_node};
    use crate::generator::keywords::KeywordCollector;
    use crate::generator::node_compiler::test_utils::node_with_params;
    use crate::generator::types::GenerationMode;
    use serde_json::json;

    #[test]
    fn samples_with_lod_in_vertex_stage() {
        let node = node_with_params("s", "SampleTexture2D", &["UV"], &[("texture", json!("_Albedo"))]);
        let graph = test_graph(vec![node.clone()], Vec::new());
        let keywords = KeywordCollector::default();
        let mut ctx = NodeCodegenContext {
            graph: &graph,
            keywords: &keywords,
            mode: GenerationMode::Final,
            stage: ShaderStage::Pixel,
        };

        let mut sb = ShaderStringBuilder::new();
        generate_code(&ctx, &node, &mut sb).unwrap();
        assert!(sb
            .as_str()
            .starts_with("float4 _SampleTexture2D_s_RGBA = SAMPLE_TEXTURE2D(_Albedo, sampler_Albedo, IN.uv0.xy);\n"));
        assert!(sb.as_str().contains("float _SampleTexture2D_s_A = _SampleTexture2D_s_RGBA.a;"));

        ctx.stage = ShaderStage::Vertex;
        let mut sb = ShaderStringBuilder::new();
        generate_code(&ctx, &node, &mut sb).unwrap();
        assert!(sb.as_str().contains("SAMPLE_TEXTURE2D_LOD(_Albedo, sampler_Albedo, IN.uv0.xy, 0)"));
    }

    #[test]
    fn connected_uv_is_coerced_to_float2() {
        let graph = test_graph(
            vec![test_node("uv", "UV", &[]), test_node("s", "SampleTexture2D", &["UV"])],
            vec![test_connection("uv", "Out", "s", "UV")],
        );
        let keywords = KeywordCollector::default();
        let ctx = NodeCodegenContext {
            graph: &graph,
            keywords: &keywords,
            mode: GenerationMode::Final,
            stage: ShaderStage::Pixel,
        };
        let mut sb = ShaderStringBuilder::new();
        generate_code(&ctx, graph.node("s").unwrap(), &mut sb).unwrap();
        assert!(sb.as_str().contains("sampler_MainTex, (_UV_uv_Out).xy)"));
        assert!(requirements(&graph, graph.node("s").unwrap()).is_empty());
    }

    #[test]
    fn texture_property_is_collected() {
        let node = node_with_params("s", "SampleTexture2D", &[], &[("defaultTexture", json!("bump"))]);
        let mut props = PropertyCollector::default();
        collect_properties(&node, &mut props);
        let textures = props.textures();
        assert_eq!(textures.len(), 1);
        assert_eq!(textures[0].name, "_MainTex");
        assert_eq!(textures[0].default_texture, "bump");
    }
}
