//! Core type definitions for the generator module.

use std::path::PathBuf;

use serde::Serialize;

use super::properties::TextureInfo;

/// HLSL value type of a slot or expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValueType {
    Float,
    Vec2,
    Vec3,
    Vec4,
}

impl ValueType {
    /// Returns the HLSL type name for this value type.
    pub fn hlsl(self) -> &'static str {
        match self {
            ValueType::Float => "float",
            ValueType::Vec2 => "float2",
            ValueType::Vec3 => "float3",
            ValueType::Vec4 => "float4",
        }
    }

    pub fn components(self) -> usize {
        match self {
            ValueType::Float => 1,
            ValueType::Vec2 => 2,
            ValueType::Vec3 => 3,
            ValueType::Vec4 => 4,
        }
    }

    pub fn from_components(n: usize) -> Self {
        match n {
            0 | 1 => ValueType::Float,
            2 => ValueType::Vec2,
            3 => ValueType::Vec3,
            _ => ValueType::Vec4,
        }
    }
}

/// A typed HLSL expression.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedExpr {
    pub ty: ValueType,
    pub expr: String,
}

impl TypedExpr {
    pub fn new(expr: impl Into<String>, ty: ValueType) -> Self {
        Self {
            ty,
            expr: expr.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GenerationMode {
    #[default]
    Final,
    Preview,
}

impl GenerationMode {
    pub fn is_preview(self) -> bool {
        matches!(self, GenerationMode::Preview)
    }
}

/// Shader stage a node is evaluated in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// Keyword permutations exceed the configured limit; the error shader was
    /// emitted instead.
    VariantLimitExceeded,
    /// A node produced a value that could not be used as requested.
    Validation,
}

/// Validation message raised on the graph's diagnostics channel.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub node_id: Option<String>,
    pub message: String,
}

/// Per-run state. Created at the start of one generation call and consumed
/// into a [`GeneratedShader`] at the end.
#[derive(Debug)]
pub struct GenerationContext {
    pub output_node_id: String,
    pub mode: GenerationMode,
    pub configured_textures: Vec<TextureInfo>,
    pub asset_dependencies: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationContext {
    pub fn new(output_node_id: &str, mode: GenerationMode) -> Self {
        Self {
            output_node_id: output_node_id.to_string(),
            mode,
            configured_textures: Vec::new(),
            asset_dependencies: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn report(
        &mut self,
        kind: DiagnosticKind,
        severity: Severity,
        node_id: Option<&str>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            kind,
            severity,
            node_id: node_id.map(str::to_string),
            message: message.into(),
        });
    }

    pub fn finish(self, source: String) -> GeneratedShader {
        GeneratedShader {
            source,
            textures: self.configured_textures,
            asset_dependencies: self.asset_dependencies,
            diagnostics: self.diagnostics,
        }
    }
}

/// Result of one generation run.
#[derive(Clone, Debug, Serialize)]
pub struct GeneratedShader {
    pub source: String,
    /// Textures referenced by the shader, with their binding metadata.
    pub textures: Vec<TextureInfo>,
    /// Files the run depended on (target assets and templates).
    pub asset_dependencies: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}
