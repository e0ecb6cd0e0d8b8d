//! Generator configuration (JSON).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_VARIANT_LIMIT: usize = 128;
pub const DEFAULT_FALLBACK_SHADER: &str = "Hidden/Shader Graph/FallbackError";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Directory pass template paths are resolved against.
    pub template_root: PathBuf,
    /// Directory `$include("...")` paths are resolved against.
    pub shared_template_dir: PathBuf,
    /// Maximum keyword permutation count before degrading to the error shader.
    pub variant_limit: usize,
    /// Keep predicate lines that evaluate false as comments.
    pub debug_output: bool,
    pub fallback_shader: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            template_root: PathBuf::from("templates"),
            shared_template_dir: PathBuf::from("templates/shared"),
            variant_limit: DEFAULT_VARIANT_LIMIT,
            debug_output: false,
            fallback_shader: DEFAULT_FALLBACK_SHADER.to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Config rooted at `template_root`, with the shared directory beneath it.
    pub fn with_template_root(template_root: impl Into<PathBuf>) -> Self {
        let template_root = template_root.into();
        Self {
            shared_template_dir: template_root.join("shared"),
            template_root,
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid generator config json")
    }
}

pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<GeneratorConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    GeneratorConfig::from_json(&text).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config = GeneratorConfig::from_json(r#"{ "variantLimit": 8 }"#).unwrap();
        assert_eq!(config.variant_limit, 8);
        assert_eq!(config.template_root, PathBuf::from("templates"));
        assert_eq!(config.fallback_shader, "Hidden/Shader Graph/FallbackError");
        assert!(!config.debug_output);
    }

    #[test]
    fn template_root_moves_shared_dir() {
        let config = GeneratorConfig::with_template_root("/tmp/t");
        assert_eq!(config.shared_template_dir, PathBuf::from("/tmp/t/shared"));
        assert_eq!(config.variant_limit, DEFAULT_VARIANT_LIMIT);
    }

    #[test]
    fn load_reports_path_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_config_from_path(&path).unwrap_err();
        assert!(format!("{err:#}").contains("config.json"));
    }
}
