//! Scene texture nodes (SceneDepth, SceneColor). Both read camera textures
//! the pipeline only provides when the shader declares it needs them.

use crate::dsl::{MaterialGraphDSL, Node, incoming_connection};
use crate::error::GenerationError;

use super::super::builder::ShaderStringBuilder;
use super::super::requirements::ShaderRequirements;
use super::super::types::ValueType;
use super::{NodeCodegenContext, NodeKind, variable_name};

const SCREEN_UV: &str = "(IN.ScreenPosition.xy / IN.ScreenPosition.w)";

pub fn requirements(graph: &MaterialGraphDSL, node: &Node, kind: NodeKind) -> ShaderRequirements {
    let mut req = ShaderRequirements::default();
    match kind {
        NodeKind::SceneDepth => req.depth_texture = true,
        _ => req.opaque_texture = true,
    }
    if incoming_connection(graph, &node.id, "UV").is_none() {
        req.screen_position = true;
    }
    req
}

pub fn generate_code(
    ctx: &NodeCodegenContext<'_>,
    node: &Node,
    kind: NodeKind,
    sb: &mut ShaderStringBuilder,
) -> Result<(), GenerationError> {
    let uv = ctx.input(node, "UV", ValueType::Vec2, SCREEN_UV)?;
    let out = variable_name(node, "Out");
    let line = match kind {
        NodeKind::SceneDepth => format!("float {out} = SHADERGRAPH_SAMPLE_SCENE_DEPTH({});", uv.expr),
        _ => format!("float3 {out} = SHADERGRAPH_SAMPLE_SCENE_COLOR({});", uv.expr),
    };
    sb.append_line(&line);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::test_utils::{test_graph, test_node};
    use crate::generator::keywords::KeywordCollector;
    use crate::generator::types::{GenerationMode, ShaderStage};

    #[test]
    fn scene_depth_defaults_to_screen_uv() {
        let graph = test_graph(vec![test_node("d", "SceneDepth", &["UV"])], Vec::new());
        let node = graph.node("d").unwrap();
        let req = requirements(&graph, node, NodeKind::SceneDepth);
        assert!(req.depth_texture && req.screen_position && !req.opaque_texture);

        let keywords = KeywordCollector::default();
        let ctx = NodeCodegenContext {
            graph: &graph,
            keywords: &keywords,
            mode: GenerationMode::Final,
            stage: ShaderStage::Pixel,
        };
        let mut sb = ShaderStringBuilder::new();
        generate_code(&ctx, node, NodeKind::SceneDepth, &mut sb).unwrap();
        assert_eq!(
            sb.into_string(),
            "float _SceneDepth_d_Out = SHADERGRAPH_SAMPLE_SCENE_DEPTH((IN.ScreenPosition.xy / IN.ScreenPosition.w));"
        );
    }
}
