//! Shader properties collected from graph nodes.

use serde::Serialize;

use super::utils::{fmt_f32, sanitize_ident};

#[derive(Clone, Debug, PartialEq)]
pub enum PropertyKind {
    Float(f32),
    Color([f32; 4]),
    Vector4([f32; 4]),
    Texture2D { default_texture: String },
}

impl PropertyKind {
    fn hlsl_type(&self) -> &'static str {
        match self {
            PropertyKind::Float(_) => "float",
            PropertyKind::Color(_) | PropertyKind::Vector4(_) => "float4",
            PropertyKind::Texture2D { .. } => "TEXTURE2D",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShaderProperty {
    pub reference_name: String,
    pub display_name: String,
    pub kind: PropertyKind,
    /// Shown in the material inspector.
    pub exposed: bool,
    /// Declared per instance instead of in the material constant buffer.
    pub instanced: bool,
}

impl ShaderProperty {
    pub fn new(reference_name: &str, display_name: &str, kind: PropertyKind) -> Self {
        Self {
            reference_name: sanitize_ident(reference_name),
            display_name: display_name.to_string(),
            kind,
            exposed: true,
            instanced: false,
        }
    }

    pub fn is_texture(&self) -> bool {
        matches!(self.kind, PropertyKind::Texture2D { .. })
    }

    /// Entry in the `Properties { }` block.
    pub fn property_block_line(&self) -> String {
        let hidden = if self.exposed { "" } else { "[HideInInspector]" };
        let name = &self.reference_name;
        let display = &self.display_name;
        match &self.kind {
            PropertyKind::Float(v) => {
                format!("{hidden}{name}(\"{display}\", Float) = {}", fmt_f32(*v))
            }
            PropertyKind::Color(c) => {
                format!("{hidden}{name}(\"{display}\", Color) = ({})", join4(c))
            }
            PropertyKind::Vector4(v) => {
                format!("{hidden}{name}(\"{display}\", Vector) = ({})", join4(v))
            }
            PropertyKind::Texture2D { default_texture } => format!(
                "{hidden}[NoScaleOffset]{name}(\"{display}\", 2D) = \"{default_texture}\" {{}}"
            ),
        }
    }
}

fn join4(v: &[f32; 4]) -> String {
    v.iter().copied().map(fmt_f32).collect::<Vec<_>>().join(", ")
}

/// Binding metadata of a texture property, reported with the generated shader.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureInfo {
    pub name: String,
    pub default_texture: String,
    pub modifiable: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PropertyCollector {
    properties: Vec<ShaderProperty>,
}

impl PropertyCollector {
    /// Adds a property; a second property with the same reference name is
    /// ignored.
    pub fn add(&mut self, property: ShaderProperty) {
        if self
            .properties
            .iter()
            .any(|p| p.reference_name == property.reference_name)
        {
            return;
        }
        self.properties.push(property);
    }

    pub fn properties(&self) -> &[ShaderProperty] {
        &self.properties
    }

    pub fn properties_block(&self) -> Vec<String> {
        self.properties
            .iter()
            .map(ShaderProperty::property_block_line)
            .collect()
    }

    /// Material constant buffer followed by texture and sampler objects.
    pub fn hlsl_declarations(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let buffered: Vec<&ShaderProperty> = self
            .properties
            .iter()
            .filter(|p| !p.instanced || p.is_texture())
            .collect();
        if buffered.is_empty() {
            return lines;
        }

        lines.push("CBUFFER_START(UnityPerMaterial)".to_string());
        for p in &buffered {
            if p.is_texture() {
                lines.push(format!("float4 {}_TexelSize;", p.reference_name));
            } else {
                lines.push(format!("{} {};", p.kind.hlsl_type(), p.reference_name));
            }
        }
        lines.push("CBUFFER_END".to_string());

        for p in buffered.iter().filter(|p| p.is_texture()) {
            lines.push(format!("TEXTURE2D({});", p.reference_name));
            lines.push(format!("SAMPLER(sampler{});", p.reference_name));
        }
        lines
    }

    pub fn instanced_declarations(&self) -> Vec<String> {
        let instanced: Vec<&ShaderProperty> = self
            .properties
            .iter()
            .filter(|p| p.instanced && !p.is_texture())
            .collect();
        if instanced.is_empty() {
            return Vec::new();
        }
        let mut lines = vec!["UNITY_INSTANCING_BUFFER_START(Props)".to_string()];
        for p in &instanced {
            lines.push(format!(
                "    UNITY_DEFINE_INSTANCED_PROP({}, {})",
                p.kind.hlsl_type(),
                p.reference_name
            ));
        }
        lines.push("UNITY_INSTANCING_BUFFER_END(Props)".to_string());
        for p in &instanced {
            lines.push(format!(
                "#define {0} UNITY_ACCESS_INSTANCED_PROP(Props, {0})",
                p.reference_name
            ));
        }
        lines
    }

    pub fn textures(&self) -> Vec<TextureInfo> {
        self.properties
            .iter()
            .filter_map(|p| match &p.kind {
                PropertyKind::Texture2D { default_texture } => Some(TextureInfo {
                    name: p.reference_name.clone(),
                    default_texture: default_texture.clone(),
                    modifiable: p.exposed,
                }),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> PropertyCollector {
        let mut c = PropertyCollector::default();
        c.add(ShaderProperty::new("_Smoothness", "Smoothness", PropertyKind::Float(0.5)));
        c.add(ShaderProperty::new(
            "_MainTex",
            "Main Tex",
            PropertyKind::Texture2D {
                default_texture: "white".to_string(),
            },
        ));
        let mut tint = ShaderProperty::new("_Tint", "Tint", PropertyKind::Color([1.0, 0.0, 0.0, 1.0]));
        tint.instanced = true;
        c.add(tint);
        c
    }

    #[test]
    fn property_block_uses_shaderlab_syntax() {
        assert_eq!(
            collector().properties_block(),
            vec![
                "_Smoothness(\"Smoothness\", Float) = 0.5",
                "[NoScaleOffset]_MainTex(\"Main Tex\", 2D) = \"white\" {}",
                "_Tint(\"Tint\", Color) = (1, 0, 0, 1)",
            ]
        );
    }

    #[test]
    fn hlsl_declarations_split_buffer_and_instanced() {
        let c = collector();
        assert_eq!(
            c.hlsl_declarations(),
            vec![
                "CBUFFER_START(UnityPerMaterial)",
                "float _Smoothness;",
                "float4 _MainTex_TexelSize;",
                "CBUFFER_END",
                "TEXTURE2D(_MainTex);",
                "SAMPLER(sampler_MainTex);",
            ]
        );
        assert_eq!(c.instanced_declarations()[1], "    UNITY_DEFINE_INSTANCED_PROP(float4, _Tint)");
    }

    #[test]
    fn duplicates_are_ignored_and_textures_reported() {
        let mut c = collector();
        c.add(ShaderProperty::new("_Smoothness", "Again", PropertyKind::Float(1.0)));
        assert_eq!(c.properties().len(), 3);
        assert_eq!(
            c.textures(),
            vec![TextureInfo {
                name: "_MainTex".to_string(),
                default_texture: "white".to_string(),
                modifiable: true,
            }]
        );
    }
}
