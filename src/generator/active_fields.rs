//! Active-field and permutation engine.
//!
//! For one pass, decides which fields are active in the base instance and in
//! each keyword permutation, which nodes feed each stage, and which
//! permutations each of those nodes is live in.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::dsl::{Connection, MaterialGraphDSL, Node};
use crate::error::Result;
use crate::graph::{collect_upstream_nodes, collect_upstream_nodes_filtered};

use super::fields::{ActiveFields, Field, well_known};
use super::keywords::KeywordCollector;
use super::node_compiler::{MaterialNode, NodeCodegen, NodeKind, keyword_nodes};
use super::requirements::ShaderRequirements;
use super::targets::PassDescriptor;
use super::types::{GenerationMode, ShaderStage};

/// Nodes evaluated in one stage's description function.
#[derive(Clone, Debug, Default)]
pub struct StageNodes {
    /// Walk order; inputs before consumers.
    pub nodes: Vec<String>,
    /// Permutations each node is live in. Absent when the graph has no
    /// permutations. A full list means every permutation; an empty list means
    /// the node is never evaluated.
    pub permutations: HashMap<String, Vec<usize>>,
    /// Union of the requirements of every live node.
    pub requirements: ShaderRequirements,
}

impl StageNodes {
    /// Permutations the node must be wrapped in, or `None` when it is live
    /// everywhere.
    pub fn guard(&self, node_id: &str, permutation_count: usize) -> Option<&[usize]> {
        match self.permutations.get(node_id) {
            Some(list) if list.len() < permutation_count => Some(list.as_slice()),
            _ => None,
        }
    }

    pub fn is_live(&self, node_id: &str) -> bool {
        self.permutations
            .get(node_id)
            .is_none_or(|list| !list.is_empty())
    }
}

#[derive(Clone, Debug)]
pub struct PassFields {
    pub active: ActiveFields,
    pub vertex: StageNodes,
    pub pixel: StageNodes,
}

impl PassFields {
    pub fn stage(&self, stage: ShaderStage) -> &StageNodes {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Pixel => &self.pixel,
        }
    }

    /// Requirements of both stages, for graph-level defines.
    pub fn graph_requirements(&self) -> ShaderRequirements {
        let mut req = self.vertex.requirements.clone();
        req.union(&self.pixel.requirements);
        req
    }
}

/// Base fields a pass starts from, before node requirements: the output's
/// conditional fields, the preview flag and the pass's required fields.
pub fn seed_base_fields(
    output: &MaterialNode<'_>,
    pass: &PassDescriptor,
    mode: GenerationMode,
) -> Vec<Field> {
    let mut fields = if output.is_master() {
        output.conditional_fields(pass)
    } else {
        vec![Field::from(well_known::GRAPH_PIXEL)]
    };
    if mode.is_preview() {
        fields.push(Field::from(well_known::IS_PREVIEW));
    }
    fields.extend(pass.required_fields.iter().cloned());
    fields
}

pub fn compute_active_fields(
    graph: &MaterialGraphDSL,
    output_id: &str,
    pass: &PassDescriptor,
    mode: GenerationMode,
    keywords: &KeywordCollector,
) -> Result<PassFields> {
    let output = MaterialNode::lookup(graph, output_id)?;
    let mut active = ActiveFields::new(keywords.permutation_count());
    active
        .base_mut()
        .add_all(seed_base_fields(&output, pass, mode));

    let (vertex_slots, pixel_slots) = if output.is_master() {
        (Some(pass.vertex_slots.as_slice()), Some(pass.pixel_slots.as_slice()))
    } else {
        (None, None)
    };

    let vertex = if output.is_master() && !pass.vertex_slots.is_empty() {
        stage_nodes(graph, output_id, vertex_slots, keywords, &mut active, ShaderStage::Vertex)?
    } else {
        StageNodes::default()
    };
    let pixel = stage_nodes(graph, output_id, pixel_slots, keywords, &mut active, ShaderStage::Pixel)?;

    active.propagate_dependencies(&pass.field_dependencies);
    debug!(
        pass = %pass.display_name,
        base_fields = active.base().len(),
        permutations = active.permutation_count(),
        vertex_nodes = vertex.nodes.len(),
        pixel_nodes = pixel.nodes.len(),
        "computed active fields"
    );
    Ok(PassFields {
        active,
        vertex,
        pixel,
    })
}

fn walk(
    graph: &MaterialGraphDSL,
    output_id: &str,
    slots: Option<&[String]>,
) -> Result<Vec<String>> {
    match slots {
        Some(slots) => collect_upstream_nodes_filtered(graph, output_id, Some(slots), |_, _| true),
        None => collect_upstream_nodes(graph, output_id),
    }
}

fn stage_nodes(
    graph: &MaterialGraphDSL,
    output_id: &str,
    slots: Option<&[String]>,
    keywords: &KeywordCollector,
    active: &mut ActiveFields,
    stage: ShaderStage,
) -> Result<StageNodes> {
    let nodes = walk(graph, output_id, slots)?;
    let count = active.permutation_count();

    let mut permutations: HashMap<String, Vec<usize>> = HashMap::new();
    if count > 0 {
        for id in &nodes {
            permutations.insert(id.clone(), Vec::new());
        }
        for index in 0..count {
            let follow = |node: &Node, conn: &Connection| {
                NodeKind::from_type_name(&node.node_type) != Some(NodeKind::Keyword)
                    || keyword_nodes::follows_port(keywords, node, &conn.to.port_id, index)
            };
            for id in collect_upstream_nodes_filtered(graph, output_id, slots, follow)? {
                if let Some(list) = permutations.get_mut(&id) {
                    list.push(index);
                }
            }
        }
    }

    let mut requirements = ShaderRequirements::default();
    for id in &nodes {
        let node = MaterialNode::lookup(graph, id)?;
        let req = node.requirements(graph, stage);
        if req.is_empty() {
            continue;
        }
        match permutations.get(id) {
            Some(list) if list.len() < count => {
                trace!(node = %id, ?list, "requirements limited to permutations");
                for field in req.fields(stage) {
                    for &index in list {
                        active.add_to_permutation(index, field.clone());
                    }
                }
                if !list.is_empty() {
                    requirements.union(&req);
                }
            }
            _ => {
                active.base_mut().add_all(req.fields(stage));
                requirements.union(&req);
            }
        }
    }

    Ok(StageNodes {
        nodes,
        permutations,
        requirements,
    })
}
