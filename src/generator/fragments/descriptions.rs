//! Vertex and surface description generators: an output struct plus a
//! function evaluating the stage's nodes in walk order, then writing one line
//! per output slot.

use crate::error::Result;

use super::super::active_fields::StageNodes;
use super::super::builder::ShaderStringBuilder;
use super::super::keywords::permutations_condition;
use super::super::node_compiler::{
    FunctionRegistry, MaterialNode, NodeCodegen, NodeCodegenContext, master_nodes, variable_name,
};
use super::super::targets::PassDescriptor;
use super::super::types::{ShaderStage, TypedExpr, ValueType};
use super::super::utils::coerce;
use super::or_none;

/// One member of a description struct and the value assigned to it.
#[derive(Clone, Debug, PartialEq)]
pub struct DescriptionSlot {
    pub name: String,
    pub value: TypedExpr,
}

fn names(stage: ShaderStage) -> (&'static str, &'static str, &'static str) {
    match stage {
        ShaderStage::Vertex => ("VertexDescription", "VertexDescriptionInputs", "description"),
        ShaderStage::Pixel => ("SurfaceDescription", "SurfaceDescriptionInputs", "surface"),
    }
}

/// Output slots of `stage`: the pass's masked master slots, or a single `Out`
/// slot previewing the node's primary output.
pub fn description_slots(
    ctx: &NodeCodegenContext<'_>,
    output: &MaterialNode<'_>,
    pass: &PassDescriptor,
) -> Result<Vec<DescriptionSlot>> {
    if output.is_master() {
        let mask = match ctx.stage {
            ShaderStage::Vertex => &pass.vertex_slots,
            ShaderStage::Pixel => &pass.pixel_slots,
        };
        return master_nodes::masked_slots(ctx.stage, mask)
            .into_iter()
            .map(|slot| {
                Ok(DescriptionSlot {
                    name: slot.id.to_string(),
                    value: ctx.input(output.node, slot.id, slot.ty, slot.default)?,
                })
            })
            .collect();
    }
    if ctx.stage == ShaderStage::Vertex {
        return Ok(Vec::new());
    }
    let port = output.primary_output();
    let ty = output.output_type(ctx.graph, &port)?;
    let value = coerce(&TypedExpr::new(variable_name(output.node, &port), ty), ValueType::Vec4);
    Ok(vec![DescriptionSlot {
        name: "Out".to_string(),
        value,
    }])
}

pub fn generate_description_struct(stage: ShaderStage, slots: &[DescriptionSlot]) -> String {
    let (struct_name, _, _) = names(stage);
    let mut sb = ShaderStringBuilder::new();
    sb.append_line(&format!("struct {struct_name}"));
    {
        let mut body = sb.block_semicolon_scope();
        for slot in slots {
            body.append_line(&format!("{} {};", slot.value.ty.hlsl(), slot.name));
        }
    }
    sb.into_string()
}

/// Body code of every live node, guarded by the permutations it is live in.
pub fn generate_node_code(
    ctx: &NodeCodegenContext<'_>,
    nodes: &StageNodes,
    permutation_count: usize,
    sb: &mut ShaderStringBuilder,
) -> Result<()> {
    for id in &nodes.nodes {
        if !nodes.is_live(id) {
            continue;
        }
        let node = MaterialNode::lookup(ctx.graph, id)?;
        let mut code = ShaderStringBuilder::new();
        node.generate_code(ctx, &mut code)?;
        if code.is_empty() {
            continue;
        }
        match nodes.guard(id, permutation_count) {
            Some(indices) => {
                sb.append_line(&format!("#if {}", permutations_condition(indices)));
                sb.append_lines(code.as_str());
                sb.append_line("#endif");
            }
            None => sb.append_lines(code.as_str()),
        }
    }
    Ok(())
}

pub fn generate_description_function(
    ctx: &NodeCodegenContext<'_>,
    nodes: &StageNodes,
    permutation_count: usize,
    slots: &[DescriptionSlot],
) -> Result<String> {
    let (struct_name, inputs_name, var) = names(ctx.stage);
    let mut sb = ShaderStringBuilder::new();
    sb.append_line(&format!("{struct_name} {struct_name}Function({inputs_name} IN)"));
    {
        let mut body = sb.block_scope();
        body.append_line(&format!("{struct_name} {var} = ({struct_name})0;"));
        generate_node_code(ctx, nodes, permutation_count, &mut body)?;
        for slot in slots {
            body.append_line(&format!("{var}.{} = {};", slot.name, slot.value.expr));
        }
        body.append_line(&format!("return {var};"));
    }
    Ok(sb.into_string())
}

/// Struct and function for one stage; the placeholder when the stage has no
/// output slots.
pub fn generate_stage_description(
    ctx: &NodeCodegenContext<'_>,
    output: &MaterialNode<'_>,
    pass: &PassDescriptor,
    nodes: &StageNodes,
    permutation_count: usize,
) -> Result<String> {
    let slots = description_slots(ctx, output, pass)?;
    if slots.is_empty() {
        return Ok(or_none(String::new()));
    }
    let mut text = generate_description_struct(ctx.stage, &slots);
    text.push_str("\n\n");
    text.push_str(&generate_description_function(ctx, nodes, permutation_count, &slots)?);
    Ok(text)
}

/// Registers helper functions of the stage's live nodes.
pub fn collect_functions(
    ctx: &NodeCodegenContext<'_>,
    nodes: &StageNodes,
    registry: &mut FunctionRegistry,
) -> Result<()> {
    for id in nodes.nodes.iter().filter(|id| nodes.is_live(id)) {
        MaterialNode::lookup(ctx.graph, id)?.register_functions(ctx, registry)?;
    }
    Ok(())
}
