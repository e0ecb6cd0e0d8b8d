//! Shader assembly: the top-level driver turning a material graph into
//! ShaderLab source.
//!
//! # Example
//! ```text
//! Shader "Shader Graphs/Lit"
//! {
//!     Properties
//!     {
//!         _Tint("Tint", Color) = (1, 1, 1, 1)
//!     }
//!     SubShader
//!     {
//!         Tags { "RenderPipeline"="UniversalPipeline" }
//!         Pass
//!         {
//!             ...
//!         }
//!     }
//!     FallBack "Hidden/Shader Graph/FallbackError"
//! }
//! ```

use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::dsl::MaterialGraphDSL;
use crate::error::Result;
use crate::graph::collect_upstream_nodes;

use super::active_fields::{PassFields, compute_active_fields, seed_base_fields};
use super::builder::ShaderStringBuilder;
use super::fields::FieldSet;
use super::fragments::{
    NONE_PLACEHOLDER, declarations, descriptions, interpolators, lines_or_none, or_none, structs,
};
use super::keywords::KeywordCollector;
use super::node_compiler::{FunctionRegistry, MaterialNode, NodeCodegen, NodeCodegenContext};
use super::properties::PropertyCollector;
use super::targets::{
    CatalogTarget, IncludeLocation, PassDescriptor, SubShaderDescriptor, TargetCatalog,
    TargetSetupContext, resolve_targets,
};
use super::template::{SpliceCommands, process_template};
use super::types::{
    DiagnosticKind, GeneratedShader, GenerationContext, GenerationMode, Severity, ShaderStage,
};

/// Generates shaders for one graph. Holds only borrowed, read-only inputs; each
/// [`ShaderGenerator::generate`] call owns its own context.
pub struct ShaderGenerator<'a> {
    graph: &'a MaterialGraphDSL,
    catalog: &'a TargetCatalog,
    preview: &'a CatalogTarget,
    config: &'a GeneratorConfig,
}

/// Graph-wide inputs shared by every pass of one run.
struct GraphInputs<'a> {
    output: MaterialNode<'a>,
    mode: GenerationMode,
    keywords: KeywordCollector,
    properties: PropertyCollector,
}

impl<'a> ShaderGenerator<'a> {
    pub fn new(
        graph: &'a MaterialGraphDSL,
        catalog: &'a TargetCatalog,
        preview: &'a CatalogTarget,
        config: &'a GeneratorConfig,
    ) -> Self {
        Self {
            graph,
            catalog,
            preview,
            config,
        }
    }

    pub fn generate(&self, output_id: &str, mode: GenerationMode) -> Result<GeneratedShader> {
        let mut ctx = GenerationContext::new(output_id, mode);
        let nodes = collect_upstream_nodes(self.graph, output_id)?;
        let output = MaterialNode::lookup(self.graph, output_id)?;

        let mut properties = PropertyCollector::default();
        for id in &nodes {
            MaterialNode::lookup(self.graph, id)?.collect_properties(&mut properties, mode);
        }
        let keywords = KeywordCollector::from_graph(self.graph);
        ctx.configured_textures = properties.textures();

        let permutations = keywords.permutation_count();
        if permutations > self.config.variant_limit {
            warn!(
                permutations,
                limit = self.config.variant_limit,
                "variant limit exceeded, emitting error shader"
            );
            ctx.report(
                DiagnosticKind::VariantLimitExceeded,
                Severity::Error,
                None,
                format!(
                    "Graph is generating too many variants ({permutations}, limit {}). \
                     Either delete keywords, reduce keyword variants or increase the variant limit.",
                    self.config.variant_limit
                ),
            );
            let source = self.error_shader(&properties);
            return Ok(ctx.finish(source));
        }

        let inputs = GraphInputs {
            output,
            mode,
            keywords,
            properties,
        };

        let mut setup = TargetSetupContext::default();
        for target in resolve_targets(self.catalog, self.preview, self.graph, output.is_master()) {
            target.setup(&mut setup);
        }
        ctx.asset_dependencies.extend(setup.asset_dependencies);
        if setup.sub_shaders.is_empty() {
            ctx.report(
                DiagnosticKind::Validation,
                Severity::Warning,
                Some(output_id),
                "no target accepts this graph",
            );
        }

        let mut sb = ShaderStringBuilder::new();
        sb.append_line(&format!("Shader \"{}\"", self.graph.shader_path()));
        {
            let mut shader = sb.block_scope();
            append_properties(&mut shader, &inputs.properties);
            for sub_shader in &setup.sub_shaders {
                self.append_sub_shader(&mut ctx, &mut shader, &inputs, sub_shader)?;
            }
            shader.append_line(&format!("FallBack \"{}\"", self.config.fallback_shader));
        }

        info!(
            shader = %self.graph.shader_path(),
            output = output_id,
            ?mode,
            permutations,
            textures = ctx.configured_textures.len(),
            "generated shader"
        );
        Ok(ctx.finish(sb.into_string()))
    }

    /// Shader with the graph's name and properties but no subshader, used when
    /// the graph cannot be compiled into passes.
    fn error_shader(&self, properties: &PropertyCollector) -> String {
        let mut sb = ShaderStringBuilder::new();
        sb.append_line(&format!("Shader \"{}\"", self.graph.shader_path()));
        {
            let mut shader = sb.block_scope();
            append_properties(&mut shader, properties);
            shader.append_line(&format!("FallBack \"{}\"", self.config.fallback_shader));
        }
        sb.into_string()
    }

    fn append_sub_shader(
        &self,
        ctx: &mut GenerationContext,
        sb: &mut ShaderStringBuilder,
        inputs: &GraphInputs<'_>,
        sub_shader: &SubShaderDescriptor,
    ) -> Result<()> {
        sb.append_line("SubShader");
        let mut body = sb.block_scope();
        if let Some(tags) = sub_shader.tags_line() {
            body.append_line(&tags);
        }
        for pass in &sub_shader.passes {
            if let Some(text) = self.generate_pass(ctx, inputs, pass)? {
                body.append_lines(&text);
            }
        }
        Ok(())
    }

    /// Processed template text of one pass, or `None` when the pass is skipped.
    fn generate_pass(
        &self,
        ctx: &mut GenerationContext,
        inputs: &GraphInputs<'_>,
        pass: &PassDescriptor,
    ) -> Result<Option<String>> {
        if inputs.mode.is_preview() && !pass.generates_preview {
            debug!(pass = %pass.display_name, "pass skipped in preview");
            return Ok(None);
        }
        let mut seeded = FieldSet::default();
        seeded.add_all(seed_base_fields(&inputs.output, pass, inputs.mode));
        if !pass.is_active(&seeded) {
            debug!(pass = %pass.display_name, "pass predicate does not hold");
            return Ok(None);
        }

        let fields = compute_active_fields(
            self.graph,
            &inputs.output.node.id,
            pass,
            inputs.mode,
            &inputs.keywords,
        )?;
        let commands = self.splice_commands(inputs, pass, &fields)?;

        let template = self.config.template_root.join(&pass.template);
        let Some(processed) = process_template(
            &template,
            &self.config.shared_template_dir,
            &commands,
            &fields.active,
            self.config.debug_output,
        )?
        else {
            debug!(pass = %pass.display_name, template = %template.display(), "template missing, pass skipped");
            return Ok(None);
        };
        ctx.asset_dependencies.extend(processed.dependencies);
        Ok(Some(processed.text))
    }

    fn splice_commands(
        &self,
        inputs: &GraphInputs<'_>,
        pass: &PassDescriptor,
        fields: &PassFields,
    ) -> Result<SpliceCommands> {
        let active = &fields.active;
        let permutation_count = active.permutation_count();
        let codegen = |stage: ShaderStage| NodeCodegenContext {
            graph: self.graph,
            keywords: &inputs.keywords,
            mode: inputs.mode,
            stage,
        };
        let description = |stage: ShaderStage| {
            descriptions::generate_stage_description(
                &codegen(stage),
                &inputs.output,
                pass,
                fields.stage(stage),
                permutation_count,
            )
        };

        let mut functions = FunctionRegistry::default();
        for stage in [ShaderStage::Vertex, ShaderStage::Pixel] {
            descriptions::collect_functions(&codegen(stage), fields.stage(stage), &mut functions)?;
        }

        let mut field_defines = declarations::feature_defines(active);
        let struct_defines = structs::field_defines(&pass.structs, active);
        if struct_defines != NONE_PLACEHOLDER {
            field_defines.push(struct_defines);
        }

        let light_mode = pass
            .light_mode
            .as_ref()
            .map(|mode| format!("Tags {{ \"LightMode\" = \"{mode}\" }}"))
            .unwrap_or_default();

        let debug = if self.config.debug_output {
            active
                .describe()
                .iter()
                .map(|line| format!("// {line}"))
                .collect()
        } else {
            Vec::new()
        };

        let mut c = SpliceCommands::new();
        c.add("PassName", format!("Name \"{}\"", pass.display_name));
        c.add("LightMode", or_none(light_mode));
        c.add("RenderState", declarations::render_states(pass, active));
        c.add("PassPragmas", declarations::pragmas(pass, active));
        c.add("PassKeywords", declarations::pass_keywords(pass, active));
        c.add("GraphKeywords", declarations::graph_keywords(&inputs.keywords));
        c.add("PassDefines", declarations::defines(pass, active));
        c.add("FieldDefines", lines_or_none(&field_defines));
        c.add("ShaderPass", declarations::shader_pass(pass));
        c.add("GraphDefines", declarations::graph_defines(&fields.graph_requirements()));
        c.add("PreGraphIncludes", declarations::includes(pass, IncludeLocation::Pregraph, active));
        c.add("PassStructs", structs::generate_structs(&pass.structs, active));
        c.add(
            "InterpolatorPack",
            interpolators::generate_interpolator_packing(&pass.structs, active),
        );
        c.add("GraphProperties", declarations::graph_properties(&inputs.properties));
        c.add("InstancedProperties", declarations::instanced_properties(&inputs.properties));
        c.add("GraphFunctions", or_none(functions.to_source()));
        c.add("GraphVertex", description(ShaderStage::Vertex)?);
        c.add("GraphPixel", description(ShaderStage::Pixel)?);
        c.add("PostGraphIncludes", declarations::includes(pass, IncludeLocation::Postgraph, active));
        c.add("Debug", lines_or_none(&debug));
        Ok(c)
    }
}

fn append_properties(sb: &mut ShaderStringBuilder, properties: &PropertyCollector) {
    sb.append_line("Properties");
    let mut block = sb.block_scope();
    for line in properties.properties_block() {
        block.append_line(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::test_utils::{test_connection, test_graph, test_node};
    use crate::generator::keywords::KeywordDescriptor;
    use crate::generator::targets::preview_target;
    use std::path::PathBuf;

    fn config() -> GeneratorConfig {
        GeneratorConfig::with_template_root(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates"))
    }

    fn lit_graph() -> MaterialGraphDSL {
        let mut graph = test_graph(
            vec![
                test_node("master", "Master", &["Position", "Normal", "BaseColor", "Alpha"]),
                test_node("c", "Color", &[]),
            ],
            vec![test_connection("c", "Out", "master", "BaseColor")],
        );
        graph.metadata.name = "Lit".to_string();
        graph
    }

    #[test]
    fn variant_limit_degrades_to_error_shader() {
        let mut graph = lit_graph();
        graph.keywords = (0..8)
            .map(|i| KeywordDescriptor::boolean(&format!("_K{i}")))
            .collect();
        let catalog = TargetCatalog::builtin().unwrap();
        let preview = preview_target().unwrap();
        let mut config = config();
        config.variant_limit = 16;

        let shader = ShaderGenerator::new(&graph, &catalog, &preview, &config)
            .generate("master", GenerationMode::Final)
            .unwrap();
        assert!(shader.source.starts_with("Shader \"Shader Graphs/Lit\"\n{"));
        assert!(!shader.source.contains("SubShader"));
        assert!(!shader.source.contains("Pass"));
        assert_eq!(shader.diagnostics.len(), 1);
        assert_eq!(shader.diagnostics[0].kind, DiagnosticKind::VariantLimitExceeded);
    }

    #[test]
    fn missing_templates_skip_passes_without_dependencies() {
        let graph = lit_graph();
        let catalog = TargetCatalog::builtin().unwrap();
        let preview = preview_target().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig::with_template_root(dir.path());

        let shader = ShaderGenerator::new(&graph, &catalog, &preview, &config)
            .generate("master", GenerationMode::Final)
            .unwrap();
        assert!(shader.source.contains("SubShader"));
        assert!(!shader.source.contains("Pass\n"));
        assert!(shader.source.ends_with("FallBack \"Hidden/Shader Graph/FallbackError\"\n}"));
        assert!(
            shader
                .asset_dependencies
                .iter()
                .all(|p| !p.to_string_lossy().ends_with(".template"))
        );
    }

    #[test]
    fn cycles_abort_generation() {
        let graph = test_graph(
            vec![
                test_node("master", "Master", &["BaseColor"]),
                test_node("a", "Add", &["A", "B"]),
                test_node("b", "Multiply", &["A", "B"]),
            ],
            vec![
                test_connection("a", "Out", "master", "BaseColor"),
                test_connection("b", "Out", "a", "A"),
                test_connection("a", "Out", "b", "A"),
            ],
        );
        let catalog = TargetCatalog::builtin().unwrap();
        let preview = preview_target().unwrap();
        let config = config();
        let err = ShaderGenerator::new(&graph, &catalog, &preview, &config)
            .generate("master", GenerationMode::Final)
            .unwrap_err();
        assert!(matches!(err, crate::error::GenerationError::GraphCycle { .. }));
    }
}
