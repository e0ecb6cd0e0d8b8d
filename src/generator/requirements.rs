//! What a node needs from the pipeline: input attributes, scene textures,
//! time. Requirements are unioned per stage and turned into fields of the
//! stage's description-inputs struct.

use std::collections::BTreeSet;

use super::fields::Field;
use super::types::ShaderStage;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CoordinateSpace {
    Object,
    World,
}

impl CoordinateSpace {
    fn prefix(self) -> &'static str {
        match self {
            CoordinateSpace::Object => "ObjectSpace",
            CoordinateSpace::World => "WorldSpace",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderRequirements {
    pub depth_texture: bool,
    pub opaque_texture: bool,
    pub time: bool,
    pub vertex_color: bool,
    pub screen_position: bool,
    pub uv_channels: BTreeSet<u32>,
    pub position: BTreeSet<CoordinateSpace>,
    pub normal: BTreeSet<CoordinateSpace>,
}

impl ShaderRequirements {
    pub fn union(&mut self, other: &ShaderRequirements) {
        self.depth_texture |= other.depth_texture;
        self.opaque_texture |= other.opaque_texture;
        self.time |= other.time;
        self.vertex_color |= other.vertex_color;
        self.screen_position |= other.screen_position;
        self.uv_channels.extend(other.uv_channels.iter().copied());
        self.position.extend(other.position.iter().copied());
        self.normal.extend(other.normal.iter().copied());
    }

    pub fn is_empty(&self) -> bool {
        *self == ShaderRequirements::default()
    }

    /// Fields of the stage's inputs struct this requirement activates.
    pub fn fields(&self, stage: ShaderStage) -> Vec<Field> {
        let tag = inputs_tag(stage);
        let mut out = Vec::new();
        for space in &self.position {
            out.push(Field::new(tag, &format!("{}Position", space.prefix())));
        }
        for space in &self.normal {
            out.push(Field::new(tag, &format!("{}Normal", space.prefix())));
        }
        for ch in &self.uv_channels {
            out.push(Field::new(tag, &format!("uv{ch}")));
        }
        if self.vertex_color {
            out.push(Field::new(tag, "VertexColor"));
        }
        if self.screen_position {
            out.push(Field::new(tag, "ScreenPosition"));
        }
        if self.time {
            out.push(Field::new(tag, "TimeParameters"));
        }
        out
    }

    /// `#define` lines for scene-texture requirements.
    pub fn graph_defines(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.depth_texture {
            out.push("#define REQUIRE_DEPTH_TEXTURE".to_string());
        }
        if self.opaque_texture {
            out.push("#define REQUIRE_OPAQUE_TEXTURE".to_string());
        }
        out
    }
}

pub fn inputs_tag(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "VertexDescriptionInputs",
        ShaderStage::Pixel => "SurfaceDescriptionInputs",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requirements_map_to_stage_fields() {
        let mut req = ShaderRequirements::default();
        req.uv_channels.insert(1);
        req.normal.insert(CoordinateSpace::World);
        req.time = true;
        let fields: Vec<String> = req
            .fields(ShaderStage::Pixel)
            .iter()
            .map(|f| f.to_string())
            .collect();
        assert_eq!(
            fields,
            vec![
                "SurfaceDescriptionInputs.WorldSpaceNormal",
                "SurfaceDescriptionInputs.uv1",
                "SurfaceDescriptionInputs.TimeParameters",
            ]
        );
    }

    #[test]
    fn union_merges_flags_and_sets() {
        let mut a = ShaderRequirements::default();
        a.depth_texture = true;
        let mut b = ShaderRequirements::default();
        b.position.insert(CoordinateSpace::Object);
        a.union(&b);
        assert!(a.depth_texture);
        assert!(a.position.contains(&CoordinateSpace::Object));
        assert_eq!(a.graph_defines(), vec!["#define REQUIRE_DEPTH_TEXTURE"]);
        assert!(!a.is_empty());
    }
}
