//! Render targets and their pass catalogs.
//!
//! A target turns into one subshader descriptor per setup call. The default
//! catalog and the preview target ship as embedded JSON; a catalog file can
//! replace the default one.

pub mod descriptors;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dsl::MaterialGraphDSL;

pub use descriptors::{
    ConditionalLine, IncludeEntry, IncludeLocation, PassDescriptor, PassKeyword, RenderStateEntry,
    RenderStateType, StructDescriptor, SubShaderDescriptor, SubShaderTag,
};

const BUILTIN_CATALOG_JSON: &str = include_str!("../../../assets/targets/universal.json");
const PREVIEW_TARGET_JSON: &str = include_str!("../../../assets/targets/preview.json");

/// Collects what targets contribute during setup.
#[derive(Debug, Default)]
pub struct TargetSetupContext {
    pub sub_shaders: Vec<SubShaderDescriptor>,
    pub asset_dependencies: Vec<PathBuf>,
}

pub trait Target {
    fn name(&self) -> &str;
    fn is_valid_for(&self, graph: &MaterialGraphDSL) -> bool;
    fn setup(&self, ctx: &mut TargetSetupContext);
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTarget {
    pub name: String,
    /// Files the target's output depends on (recorded as asset dependencies).
    #[serde(default)]
    pub dependencies: Vec<PathBuf>,
    pub sub_shader: SubShaderDescriptor,
}

impl Target for CatalogTarget {
    fn name(&self) -> &str {
        &self.name
    }

    /// A graph with no target list accepts every target.
    fn is_valid_for(&self, graph: &MaterialGraphDSL) -> bool {
        graph.targets.is_empty() || graph.targets.iter().any(|t| *t == self.name)
    }

    fn setup(&self, ctx: &mut TargetSetupContext) {
        ctx.sub_shaders.push(self.sub_shader.resolved());
        ctx.asset_dependencies
            .extend(self.dependencies.iter().cloned());
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetCatalog {
    pub targets: Vec<CatalogTarget>,
}

impl TargetCatalog {
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG_JSON).context("invalid builtin target catalog")
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let catalog: TargetCatalog = serde_json::from_str(text).context("invalid target catalog")?;
        Ok(catalog)
    }

    /// Loads a catalog file; the file itself becomes a dependency of every
    /// target in it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read target catalog at {}", path.display()))?;
        let mut catalog = Self::from_json(&text)
            .with_context(|| format!("failed to parse target catalog at {}", path.display()))?;
        for target in &mut catalog.targets {
            target.dependencies.insert(0, path.to_path_buf());
        }
        Ok(catalog)
    }

    pub fn valid_targets<'a>(&'a self, graph: &MaterialGraphDSL) -> Vec<&'a CatalogTarget> {
        self.targets.iter().filter(|t| t.is_valid_for(graph)).collect()
    }
}

/// Target used when previewing a non-master node.
pub fn preview_target() -> Result<CatalogTarget> {
    let target: CatalogTarget =
        serde_json::from_str(PREVIEW_TARGET_JSON).context("invalid builtin preview target")?;
    Ok(target)
}

/// Targets for an output node: every valid catalog target for a master node,
/// the preview target otherwise.
pub fn resolve_targets<'a>(
    catalog: &'a TargetCatalog,
    preview: &'a CatalogTarget,
    graph: &MaterialGraphDSL,
    output_is_master: bool,
) -> Vec<&'a dyn Target> {
    let targets: Vec<&dyn Target> = if output_is_master {
        catalog
            .valid_targets(graph)
            .into_iter()
            .map(|t| t as &dyn Target)
            .collect()
    } else {
        vec![preview as &dyn Target]
    };
    debug!(
        count = targets.len(),
        names = ?targets.iter().map(|t| t.name()).collect::<Vec<_>>(),
        "resolved targets"
    );
    targets
}
