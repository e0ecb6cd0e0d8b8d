//! Immutable descriptors of subshaders and passes, deserialized from the
//! target catalog.

use serde::{Deserialize, Serialize};

use super::super::fields::{Field, FieldCondition, FieldDependency, FieldDescriptor, FieldLookup};

fn default_true() -> bool {
    true
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderStateType {
    Cull,
    Blend,
    BlendOp,
    ZTest,
    ZWrite,
    ZClip,
    ColorMask,
    AlphaToMask,
}

impl RenderStateType {
    pub fn keyword(self) -> &'static str {
        match self {
            RenderStateType::Cull => "Cull",
            RenderStateType::Blend => "Blend",
            RenderStateType::BlendOp => "BlendOp",
            RenderStateType::ZTest => "ZTest",
            RenderStateType::ZWrite => "ZWrite",
            RenderStateType::ZClip => "ZClip",
            RenderStateType::ColorMask => "ColorMask",
            RenderStateType::AlphaToMask => "AlphaToMask",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderStateEntry {
    #[serde(rename = "type")]
    pub state: RenderStateType,
    pub value: String,
    #[serde(default)]
    pub conditions: Vec<FieldCondition>,
}

impl RenderStateEntry {
    pub fn to_line(&self) -> String {
        format!("{} {}", self.state.keyword(), self.value)
    }
}

/// A pragma or define body with its activation predicate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionalLine {
    pub value: String,
    #[serde(default)]
    pub conditions: Vec<FieldCondition>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeLocation {
    #[default]
    Pregraph,
    Postgraph,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IncludeEntry {
    pub path: String,
    #[serde(default)]
    pub location: IncludeLocation,
    #[serde(default)]
    pub conditions: Vec<FieldCondition>,
}

/// A keyword declared by the pass itself (not by the graph blackboard).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PassKeyword {
    pub declaration: String,
    #[serde(default)]
    pub conditions: Vec<FieldCondition>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructDescriptor {
    pub name: String,
    /// Generate a packed variant with pack/unpack functions.
    #[serde(default)]
    pub pack_fields: bool,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassDescriptor {
    pub reference_name: String,
    pub display_name: String,
    #[serde(default)]
    pub light_mode: Option<String>,
    /// Template path, relative to the template root.
    pub template: String,
    /// `SHADERPASS` value written by the `ShaderPass` splice.
    #[serde(default)]
    pub shader_pass: Option<String>,
    #[serde(default)]
    pub required_fields: Vec<Field>,
    #[serde(default)]
    pub field_dependencies: Vec<FieldDependency>,
    #[serde(default)]
    pub vertex_slots: Vec<String>,
    #[serde(default)]
    pub pixel_slots: Vec<String>,
    #[serde(default)]
    pub render_states: Vec<RenderStateEntry>,
    #[serde(default)]
    pub pragmas: Vec<ConditionalLine>,
    #[serde(default)]
    pub includes: Vec<IncludeEntry>,
    #[serde(default)]
    pub keywords: Vec<PassKeyword>,
    #[serde(default)]
    pub defines: Vec<ConditionalLine>,
    #[serde(default)]
    pub structs: Vec<StructDescriptor>,
    #[serde(default = "default_true")]
    pub generates_preview: bool,
    /// Activation predicate; the pass is skipped when it does not hold.
    #[serde(default)]
    pub conditions: Vec<FieldCondition>,
}

impl Default for PassDescriptor {
    fn default() -> Self {
        Self {
            reference_name: String::new(),
            display_name: String::new(),
            light_mode: None,
            template: String::new(),
            shader_pass: None,
            required_fields: Vec::new(),
            field_dependencies: Vec::new(),
            vertex_slots: Vec::new(),
            pixel_slots: Vec::new(),
            render_states: Vec::new(),
            pragmas: Vec::new(),
            includes: Vec::new(),
            keywords: Vec::new(),
            defines: Vec::new(),
            structs: Vec::new(),
            generates_preview: true,
            conditions: Vec::new(),
        }
    }
}

impl PassDescriptor {
    pub fn is_active(&self, fields: &impl FieldLookup) -> bool {
        FieldCondition::all_hold(&self.conditions, fields)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubShaderTag {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubShaderDescriptor {
    #[serde(default)]
    pub tags: Vec<SubShaderTag>,
    /// Structs used by passes that declare none of their own.
    #[serde(default)]
    pub structs: Vec<StructDescriptor>,
    /// Dependencies prepended to every pass's own list.
    #[serde(default)]
    pub field_dependencies: Vec<FieldDependency>,
    pub passes: Vec<PassDescriptor>,
}

impl SubShaderDescriptor {
    /// Copy with the shared structs and dependencies folded into each pass.
    pub fn resolved(&self) -> SubShaderDescriptor {
        let passes = self
            .passes
            .iter()
            .map(|pass| {
                let mut pass = pass.clone();
                if pass.structs.is_empty() {
                    pass.structs = self.structs.clone();
                }
                let mut deps = self.field_dependencies.clone();
                deps.append(&mut pass.field_dependencies);
                pass.field_dependencies = deps;
                pass
            })
            .collect();
        SubShaderDescriptor {
            tags: self.tags.clone(),
            structs: Vec::new(),
            field_dependencies: Vec::new(),
            passes,
        }
    }

    /// `Tags { "A"="B" ... }` line; `None` when there are no tags.
    pub fn tags_line(&self) -> Option<String> {
        if self.tags.is_empty() {
            return None;
        }
        let body: Vec<String> = self
            .tags
            .iter()
            .map(|t| format!("\"{}\"=\"{}\"", t.name, t.value))
            .collect();
        Some(format!("Tags {{ {} }}", body.join(" ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::fields::{FieldSet, well_known};

    #[test]
    fn pass_json_fills_defaults() {
        let pass: PassDescriptor = serde_json::from_str(
            r#"{
                "referenceName": "SHADERPASS_DEPTHONLY",
                "displayName": "DepthOnly",
                "template": "DepthOnly.template",
                "renderStates": [ { "type": "ZWrite", "value": "On" } ],
                "conditions": [ { "field": "SurfaceType.Opaque" } ]
            }"#,
        )
        .unwrap();
        assert!(pass.generates_preview);
        assert_eq!(pass.render_states[0].to_line(), "ZWrite On");

        let mut fields = FieldSet::default();
        assert!(!pass.is_active(&fields));
        fields.add(well_known::SURFACE_OPAQUE.into());
        assert!(pass.is_active(&fields));
    }

    #[test]
    fn tags_line_quotes_pairs() {
        let sub = SubShaderDescriptor {
            tags: vec![
                SubShaderTag {
                    name: "RenderPipeline".to_string(),
                    value: "UniversalPipeline".to_string(),
                },
                SubShaderTag {
                    name: "Queue".to_string(),
                    value: "Geometry".to_string(),
                },
            ],
            ..SubShaderDescriptor::default()
        };
        assert_eq!(
            sub.tags_line().as_deref(),
            Some("Tags { \"RenderPipeline\"=\"UniversalPipeline\" \"Queue\"=\"Geometry\" }")
        );
        assert_eq!(SubShaderDescriptor::default().tags_line(), None);
    }

    #[test]
    fn resolved_folds_shared_structs_and_dependencies() {
        let shared = StructDescriptor {
            name: "Attributes".to_string(),
            ..StructDescriptor::default()
        };
        let own = StructDescriptor {
            name: "Custom".to_string(),
            ..StructDescriptor::default()
        };
        let sub = SubShaderDescriptor {
            structs: vec![shared],
            field_dependencies: vec![FieldDependency::new("A.x", "B.y")],
            passes: vec![
                PassDescriptor {
                    field_dependencies: vec![FieldDependency::new("C.z", "A.x")],
                    ..PassDescriptor::default()
                },
                PassDescriptor {
                    structs: vec![own],
                    ..PassDescriptor::default()
                },
            ],
            ..SubShaderDescriptor::default()
        };
        let resolved = sub.resolved();
        assert_eq!(resolved.passes[0].structs[0].name, "Attributes");
        assert_eq!(resolved.passes[0].field_dependencies.len(), 2);
        assert_eq!(resolved.passes[0].field_dependencies[0].field.as_str(), "A.x");
        assert_eq!(resolved.passes[1].structs[0].name, "Custom");
    }
}
