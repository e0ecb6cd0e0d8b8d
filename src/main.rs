//! `shadergen` - compile a material graph JSON into ShaderLab source.
//!
//! ```bash
//! shadergen --graph lit.json --out Lit.shader
//! shadergen --graph lit.json --output-node tint --preview
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::{info, warn};

use node_forge_shadergen::config::{GeneratorConfig, load_config_from_path};
use node_forge_shadergen::dsl;
use node_forge_shadergen::generator::{
    GenerationMode, Severity, ShaderGenerator, TargetCatalog, preview_target,
};

#[derive(Parser, Debug)]
#[command(name = "shadergen")]
#[command(about = "Generate ShaderLab/HLSL source from a material graph")]
#[command(version)]
struct Cli {
    /// Material graph JSON
    #[arg(long)]
    graph: PathBuf,

    /// Node to generate for (defaults to the graph's master node)
    #[arg(long)]
    output_node: Option<String>,

    /// Generate a preview shader instead of the final one
    #[arg(long)]
    preview: bool,

    /// Target catalog JSON replacing the builtin catalog
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Generator config JSON
    #[arg(long, env = "SHADERGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Template root directory (shared includes live in `<dir>/shared`)
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Maximum number of keyword permutations
    #[arg(long)]
    variant_limit: Option<usize>,

    /// Keep inactive predicate lines as comments and list active fields
    #[arg(long)]
    debug: bool,

    /// Write the shader here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

fn resolve_config(cli: &Cli) -> Result<GeneratorConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(dir) = &cli.templates {
        config.shared_template_dir = dir.join("shared");
        config.template_root = dir.clone();
    }
    if let Some(limit) = cli.variant_limit {
        config.variant_limit = limit;
    }
    config.debug_output |= cli.debug;
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let graph = dsl::load_graph_from_path(&cli.graph)?;
    let catalog = match &cli.catalog {
        Some(path) => TargetCatalog::from_path(path)?,
        None => TargetCatalog::builtin()?,
    };
    let preview = preview_target()?;

    let output_id = match &cli.output_node {
        Some(id) => id.clone(),
        None => graph
            .nodes
            .iter()
            .find(|n| n.node_type == "Master")
            .map(|n| n.id.clone())
            .ok_or_else(|| anyhow!("graph has no Master node; pass --output-node"))?,
    };
    let mode = if cli.preview {
        GenerationMode::Preview
    } else {
        GenerationMode::Final
    };

    let shader = ShaderGenerator::new(&graph, &catalog, &preview, &config)
        .generate(&output_id, mode)
        .with_context(|| format!("failed to generate shader for node {output_id}"))?;

    for d in &shader.diagnostics {
        match d.severity {
            Severity::Error => warn!(kind = ?d.kind, node = ?d.node_id, "{}", d.message),
            Severity::Warning => info!(kind = ?d.kind, node = ?d.node_id, "{}", d.message),
        }
    }
    for texture in &shader.textures {
        info!(
            name = %texture.name,
            default = %texture.default_texture,
            modifiable = texture.modifiable,
            "texture"
        );
    }
    for dep in &shader.asset_dependencies {
        info!(path = %dep.display(), "dependency");
    }

    match &cli.out {
        Some(path) => {
            std::fs::write(path, &shader.source)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote shader");
        }
        None => println!("{}", shader.source),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_config() {
        let cli = Cli::parse_from([
            "shadergen",
            "--graph",
            "g.json",
            "--templates",
            "/t",
            "--variant-limit",
            "4",
            "--debug",
        ]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.template_root, PathBuf::from("/t"));
        assert_eq!(config.shared_template_dir, PathBuf::from("/t/shared"));
        assert_eq!(config.variant_limit, 4);
        assert!(config.debug_output);
    }
}
