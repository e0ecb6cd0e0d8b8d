//! Error taxonomy of the generation pipeline.
//!
//! Structural problems (graph cycles, template token mismatches, broken
//! includes) abort generation and surface here. Resource/limit problems such
//! as exceeding the variant limit are not errors: they degrade the output and
//! are reported as [`crate::generator::types::Diagnostic`]s instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    /// A node was reached again while it was still on the traversal stack.
    #[error("cycle detected in material graph at node {node_id}")]
    GraphCycle { node_id: String },

    #[error("material graph references missing node: {node_id}")]
    MissingNode { node_id: String },

    #[error("unsupported material node type {node_type} (node {node_id})")]
    UnknownNodeType { node_id: String, node_type: String },

    #[error("{node_type} node {node_id} is missing required input {port_id}")]
    MissingInput {
        node_id: String,
        node_type: String,
        port_id: String,
    },

    #[error("keyword node {node_id} references unknown keyword {keyword}")]
    UnknownKeyword { node_id: String, keyword: String },

    #[error("enum keyword {keyword} declares no entries")]
    EmptyKeyword { keyword: String },

    /// The template references a splice token that nothing generated.
    #[error("template {} references splice token `{token}` which has no command", template.display())]
    MissingSpliceToken { token: String, template: PathBuf },

    #[error("include {} (from {}) not found", path.display(), from.display())]
    IncludeNotFound { path: PathBuf, from: PathBuf },

    #[error("file {} is recursively included from {}", path.display(), from.display())]
    RecursiveInclude { path: PathBuf, from: PathBuf },

    #[error("failed to read template {}", path.display())]
    TemplateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = GenerationError> = std::result::Result<T, E>;
