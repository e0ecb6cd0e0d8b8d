//! Keyword branch node.
//!
//! A Keyword node forwards one of its inputs depending on a blackboard
//! keyword: `On`/`Off` for boolean keywords, one port per entry reference name
//! for enum keywords. In generated code the choice is a preprocessor branch;
//! during active-field computation only the branch selected by a permutation
//! is followed.

use crate::dsl::{MaterialGraphDSL, Node, parse_str};
use crate::error::GenerationError;

use super::super::builder::ShaderStringBuilder;
use super::super::keywords::{KeywordCollector, KeywordDescriptor, KeywordKind};
use super::super::types::ValueType;
use super::super::utils::{binary_result_type, fmt_vec};
use super::{NodeCodegenContext, connected_output, variable_name};

fn keyword_reference(node: &Node) -> &str {
    parse_str(&node.params, "keyword").unwrap_or_default()
}

pub fn resolve_keyword<'k>(
    keywords: &'k KeywordCollector,
    node: &Node,
) -> Result<&'k KeywordDescriptor, GenerationError> {
    let reference = keyword_reference(node);
    let keyword = keywords
        .keyword(reference)
        .ok_or_else(|| GenerationError::UnknownKeyword {
            node_id: node.id.clone(),
            keyword: reference.to_string(),
        })?;
    if !keyword.has_values() {
        return Err(GenerationError::EmptyKeyword {
            keyword: reference.to_string(),
        });
    }
    Ok(keyword)
}

/// Whether the edge into `port` is live under permutation `index`. Ports of
/// keywords that do not permute are always live.
pub fn follows_port(keywords: &KeywordCollector, node: &Node, port: &str, index: usize) -> bool {
    let reference = keyword_reference(node);
    let Some(keyword) = keywords.keyword(reference) else {
        return true;
    };
    match keywords.value_in_permutation(index, reference) {
        Some(value) => keyword.branch_port(value).as_deref() == Some(port),
        None => true,
    }
}

fn branch_ports(node: &Node) -> Vec<String> {
    node.inputs.iter().map(|p| p.id.clone()).collect()
}

pub fn output_type(graph: &MaterialGraphDSL, node: &Node) -> Result<ValueType, GenerationError> {
    let mut ty = ValueType::Float;
    for port in branch_ports(node) {
        if let Some(upstream) = connected_output(graph, node, &port)? {
            ty = binary_result_type(ty, upstream.ty);
        }
    }
    Ok(ty)
}

/// Compile a Keyword node.
///
/// # Example
/// ```hlsl
/// #if defined(_USE_DETAIL)
///     float4 _Keyword_k_Out = _Color_a_Out;
/// #else
///     float4 _Keyword_k_Out = _Color_b_Out;
/// #endif
/// ```
pub fn generate_code(
    ctx: &NodeCodegenContext<'_>,
    node: &Node,
    sb: &mut ShaderStringBuilder,
) -> Result<(), GenerationError> {
    let keyword = resolve_keyword(ctx.keywords, node)?;
    let ty = output_type(ctx.graph, node)?;
    let zero = fmt_vec(&vec![0.0; ty.components()]);
    let out = variable_name(node, "Out");

    let branches: Vec<(String, String)> = match keyword.kind {
        KeywordKind::Boolean => vec![
            (format!("#if defined({})", keyword.reference_name), "On".to_string()),
            ("#else".to_string(), "Off".to_string()),
        ],
        KeywordKind::Enum => {
            let last = keyword.value_count().saturating_sub(1);
            (0..keyword.value_count())
                .filter_map(|v| {
                    let port = keyword.branch_port(v)?;
                    let directive = if v == 0 {
                        format!("#if {}", keyword.value_condition(v))
                    } else if v == last {
                        "#else".to_string()
                    } else {
                        format!("#elif {}", keyword.value_condition(v))
                    };
                    Some((directive, port))
                })
                .collect()
        }
    };

    for (directive, port) in &branches {
        sb.append_line(directive);
        let value = ctx.input(node, port, ty, &zero)?;
        let mut scope = sb.indent();
        scope.append_line(&format!("{} {out} = {};", ty.hlsl(), value.expr));
    }
    sb.append_line("#endif");
    Ok(())
}
