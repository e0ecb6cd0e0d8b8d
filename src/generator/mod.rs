//! Shader generator: compiles material graphs into ShaderLab/HLSL source.
//!
//! This module is organized into several submodules:
//! - `types`: Core type definitions (ValueType, TypedExpr, GenerationContext, etc.)
//! - `utils`: Formatting and type coercion helpers
//! - `builder`: Indented text builder with scope guards
//! - `fields`: Fields, field sets and the per-permutation active-field set
//! - `keywords`: Keyword descriptors and permutation enumeration
//! - `properties`: Shader property collection and declarations
//! - `requirements`: Per-node shader requirements
//! - `node_compiler`: Node code generation
//! - `targets`: Render targets and pass descriptors
//! - `active_fields`: Active-field and permutation engine
//! - `fragments`: Generated text spliced into templates
//! - `template`: Splice/template processor
//! - `assembly`: Top-level driver
//!
//! The main entry point is [`ShaderGenerator::generate`].

pub mod active_fields;
pub mod assembly;
pub mod builder;
pub mod fields;
pub mod fragments;
pub mod keywords;
pub mod node_compiler;
pub mod properties;
pub mod requirements;
pub mod targets;
pub mod template;
pub mod types;
pub mod utils;

pub use assembly::ShaderGenerator;
pub use targets::{TargetCatalog, preview_target};
pub use types::{Diagnostic, DiagnosticKind, GeneratedShader, GenerationMode, Severity};
