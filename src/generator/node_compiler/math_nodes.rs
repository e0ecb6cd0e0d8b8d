//! Math nodes (Add, Multiply).
//!
//! Both take two dynamic-width inputs `A` and `B`; the result has the width
//! of the wider connected input. Each width gets its own helper function.

use crate::dsl::{MaterialGraphDSL, Node};
use crate::error::GenerationError;

use super::super::builder::ShaderStringBuilder;
use super::super::types::ValueType;
use super::super::utils::{binary_result_type, fmt_vec};
use super::{FunctionRegistry, NodeCodegenContext, NodeKind, connected_output, variable_name};

fn op(kind: NodeKind) -> (&'static str, &'static str, f32) {
    match kind {
        NodeKind::Multiply => ("Multiply", "*", 1.0),
        _ => ("Add", "+", 0.0),
    }
}

fn function_name(kind: NodeKind, ty: ValueType) -> String {
    format!("Unity_{}_{}", op(kind).0, ty.hlsl())
}

pub fn output_type(graph: &MaterialGraphDSL, node: &Node) -> Result<ValueType, GenerationError> {
    let mut ty = ValueType::Float;
    for port in ["A", "B"] {
        if let Some(upstream) = connected_output(graph, node, port)? {
            ty = binary_result_type(ty, upstream.ty);
        }
    }
    Ok(ty)
}

pub fn register_functions(
    ctx: &NodeCodegenContext<'_>,
    node: &Node,
    kind: NodeKind,
    registry: &mut FunctionRegistry,
) -> Result<(), GenerationError> {
    let ty = output_type(ctx.graph, node)?;
    let name = function_name(kind, ty);
    let symbol = op(kind).1;
    registry.provide(&name, || {
        let t = ty.hlsl();
        let mut sb = ShaderStringBuilder::new();
        sb.append_line(&format!("void {name}({t} A, {t} B, out {t} Out)"));
        let mut body = sb.block_scope();
        body.append_line(&format!("Out = A {symbol} B;"));
        drop(body);
        sb.into_string()
    });
    Ok(())
}

/// Compile an Add or Multiply node.
///
/// # Example
/// ```hlsl
/// float4 _Add_n1_Out;
/// Unity_Add_float4(_Color_c_Out, float4(0, 0, 0, 0), _Add_n1_Out);
/// ```
pub fn generate_code(
    ctx: &NodeCodegenContext<'_>,
    node: &Node,
    kind: NodeKind,
    sb: &mut ShaderStringBuilder,
) -> Result<(), GenerationError> {
    let ty = output_type(ctx.graph, node)?;
    let identity = fmt_vec(&vec![op(kind).2; ty.components()]);
    let a = ctx.input(node, "A", ty, &identity)?;
    let b = ctx.input(node, "B", ty, &identity)?;
    let out = variable_name(node, "Out");
    sb.append_line(&format!("{} {out};", ty.hlsl()));
    sb.append_line(&format!(
        "{}({}, {}, {out});",
        function_name(kind, ty),
        a.expr,
        b.expr
    ));
    Ok(())
}
