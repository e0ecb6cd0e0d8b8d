//! Master output node: the graph's sink. It emits no code of its own; its
//! input slots become members of the vertex and surface description structs.

use crate::dsl::{MaterialGraphDSL, Node, incoming_connection, parse_bool, parse_str};

use super::super::fields::{Field, well_known};
use super::super::requirements::{CoordinateSpace, ShaderRequirements};
use super::super::targets::PassDescriptor;
use super::super::types::{ShaderStage, ValueType};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MasterSlot {
    pub id: &'static str,
    pub ty: ValueType,
    /// Value written when nothing is connected.
    pub default: &'static str,
}

pub const VERTEX_SLOTS: &[MasterSlot] = &[
    MasterSlot {
        id: "Position",
        ty: ValueType::Vec3,
        default: "IN.ObjectSpacePosition",
    },
    MasterSlot {
        id: "Normal",
        ty: ValueType::Vec3,
        default: "IN.ObjectSpaceNormal",
    },
];

pub const PIXEL_SLOTS: &[MasterSlot] = &[
    MasterSlot {
        id: "BaseColor",
        ty: ValueType::Vec3,
        default: "float3(0.5, 0.5, 0.5)",
    },
    MasterSlot {
        id: "Emission",
        ty: ValueType::Vec3,
        default: "float3(0, 0, 0)",
    },
    MasterSlot {
        id: "Alpha",
        ty: ValueType::Float,
        default: "1",
    },
    MasterSlot {
        id: "AlphaClipThreshold",
        ty: ValueType::Float,
        default: "0.5",
    },
];

pub fn slots(stage: ShaderStage) -> &'static [MasterSlot] {
    match stage {
        ShaderStage::Vertex => VERTEX_SLOTS,
        ShaderStage::Pixel => PIXEL_SLOTS,
    }
}

/// Master slots of `stage` selected by a pass mask, in mask order.
pub fn masked_slots(stage: ShaderStage, mask: &[String]) -> Vec<MasterSlot> {
    mask.iter()
        .filter_map(|id| slots(stage).iter().find(|s| s.id == id).copied())
        .collect()
}

pub fn is_transparent(node: &Node) -> bool {
    matches!(parse_str(&node.params, "surface"), Some("transparent") | Some("Transparent"))
}

pub fn conditional_fields(node: &Node, pass: &PassDescriptor) -> Vec<Field> {
    let mut fields = Vec::new();
    if !pass.vertex_slots.is_empty() {
        fields.push(Field::from(well_known::GRAPH_VERTEX));
    }
    if !pass.pixel_slots.is_empty() {
        fields.push(Field::from(well_known::GRAPH_PIXEL));
    }
    if is_transparent(node) {
        fields.push(Field::from(well_known::SURFACE_TRANSPARENT));
    } else {
        fields.push(Field::from(well_known::SURFACE_OPAQUE));
    }
    if parse_bool(&node.params, "alphaClip").unwrap_or(false) {
        fields.push(Field::from(well_known::ALPHA_CLIP));
    }
    if parse_bool(&node.params, "twoSided").unwrap_or(false) {
        fields.push(Field::from(well_known::DOUBLE_SIDED));
    }
    fields
}

/// Unconnected vertex slots read object-space inputs.
pub fn requirements(graph: &MaterialGraphDSL, node: &Node, stage: ShaderStage) -> ShaderRequirements {
    let mut req = ShaderRequirements::default();
    if stage != ShaderStage::Vertex {
        return req;
    }
    if incoming_connection(graph, &node.id, "Position").is_none() {
        req.position.insert(CoordinateSpace::Object);
    }
    if incoming_connection(graph, &node.id, "Normal").is_none() {
        req.normal.insert(CoordinateSpace::Object);
    }
    req
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::node_compiler::test_utils::node_with_params;
    use serde_json::json;

    fn pass(vertex: &[&str], pixel: &[&str]) -> PassDescriptor {
        PassDescriptor {
            vertex_slots: vertex.iter().map(|s| s.to_string()).collect(),
            pixel_slots: pixel.iter().map(|s| s.to_string()).collect(),
            ..PassDescriptor::default()
        }
    }

    #[test]
    fn conditional_fields_follow_params_and_masks() {
        let node = node_with_params(
            "m",
            "Master",
            &[],
            &[("surface", json!("transparent")), ("alphaClip", json!(true))],
        );
        let fields: Vec<String> = conditional_fields(&node, &pass(&[], &["Alpha"]))
            .iter()
            .map(|f| f.to_string())
            .collect();
        assert_eq!(
            fields,
            vec!["features.graphPixel", "SurfaceType.Transparent", "features.alphaClip"]
        );
    }

    #[test]
    fn masked_slots_keep_mask_order_and_skip_unknown() {
        let mask = vec!["Alpha".to_string(), "Bogus".to_string(), "BaseColor".to_string()];
        let ids: Vec<&str> = masked_slots(ShaderStage::Pixel, &mask).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["Alpha", "BaseColor"]);
    }
}
