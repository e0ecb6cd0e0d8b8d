use std::path::PathBuf;

use node_forge_shadergen::config::GeneratorConfig;
use node_forge_shadergen::dsl::{self, MaterialGraphDSL};
use node_forge_shadergen::generator::{
    DiagnosticKind, GeneratedShader, GenerationMode, ShaderGenerator, TargetCatalog, preview_target,
};

fn manifest_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn load_case(name: &str) -> MaterialGraphDSL {
    let path = manifest_dir().join("tests").join("cases").join(name);
    dsl::load_graph_from_path(&path).unwrap_or_else(|e| panic!("case {name}: load failed: {e:#}"))
}

fn config() -> GeneratorConfig {
    GeneratorConfig::with_template_root(manifest_dir().join("templates"))
}

fn generate(graph: &MaterialGraphDSL, output: &str, mode: GenerationMode) -> GeneratedShader {
    generate_with(graph, output, mode, &config())
}

fn generate_with(
    graph: &MaterialGraphDSL,
    output: &str,
    mode: GenerationMode,
    config: &GeneratorConfig,
) -> GeneratedShader {
    let catalog = TargetCatalog::builtin().expect("builtin catalog");
    let preview = preview_target().expect("preview target");
    ShaderGenerator::new(graph, &catalog, &preview, config)
        .generate(output, mode)
        .unwrap_or_else(|e| panic!("generation failed: {e}"))
}

fn pass_names(source: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|l| l.trim().strip_prefix("Name \""))
        .map(|l| l.trim_end_matches('"').to_string())
        .collect()
}

fn ends_with_file(deps: &[PathBuf], name: &str) -> bool {
    deps.iter()
        .any(|p| p.file_name().and_then(|f| f.to_str()) == Some(name))
}

#[test]
fn lit_graph_generates_universal_passes() {
    let graph = load_case("lit.json");
    let shader = generate(&graph, "master", GenerationMode::Final);
    let src = &shader.source;

    assert!(src.starts_with("Shader \"Shader Graphs/Lit\"\n{\n    Properties\n    {\n"));
    assert!(src.contains("        [NoScaleOffset]_BaseMap(\"Base Map\", 2D) = \"white\" {}\n"));
    assert!(src.contains("float4 _Color_tint_Out = _Tint;"));
    assert!(src.contains("        _Tint(\"Tint\", Color) = (1, 0.5, 0, 1)\n"));
    assert!(src.contains(
        "Tags { \"RenderPipeline\"=\"UniversalPipeline\" \"RenderType\"=\"Opaque\" \"Queue\"=\"Geometry\" }"
    ));
    assert_eq!(pass_names(src), vec!["Universal Forward", "ShadowCaster", "DepthOnly"]);
    assert!(src.ends_with("    FallBack \"Hidden/Shader Graph/FallbackError\"\n}"));

    assert!(src.contains("Tags { \"LightMode\" = \"UniversalForward\" }"));
    assert!(src.contains("Cull Back\n"));
    assert!(src.contains("ZWrite On\n"));
    assert!(src.contains("#define SHADERPASS SHADERPASS_FORWARD"));
    assert!(src.contains("#define FEATURES_GRAPH_VERTEX"));
    assert!(src.contains("#define ATTRIBUTES_NEED_TEXCOORD0"));
    assert!(src.contains("void Unity_Multiply_float4(float4 A, float4 B, out float4 Out)"));
    assert!(src.contains("Unity_Multiply_float4(_SampleTexture2D_tex_RGBA, _Color_tint_Out, _Multiply_mul_Out);"));
    assert!(src.contains("surface.BaseColor = (_Multiply_mul_Out).xyz;"));
    assert!(src.contains("surface.Alpha = _SampleTexture2D_tex_A;"));
    assert!(src.contains("description.Position = IN.ObjectSpacePosition;"));
    assert!(src.contains("CBUFFER_START(UnityPerMaterial)"));
    assert!(src.contains("TEXTURE2D(_BaseMap);"));
    assert!(src.contains("output.uv0 = input.texCoord0;"));
    assert!(!src.contains("KEYWORD_PERMUTATION"));
    assert!(!src.contains("$splice"));

    assert_eq!(shader.textures.len(), 1);
    assert_eq!(shader.textures[0].name, "_BaseMap");
    assert_eq!(shader.textures[0].default_texture, "white");
    assert!(shader.diagnostics.is_empty());

    assert!(ends_with_file(&shader.asset_dependencies, "universal.json"));
    assert!(ends_with_file(&shader.asset_dependencies, "PassMesh.template"));
    assert!(ends_with_file(
        &shader.asset_dependencies,
        "BuildSurfaceDescriptionInputs.template.hlsl"
    ));
}

#[test]
fn transparent_double_sided_switches_render_state_and_skips_depth_only() {
    let graph = load_case("lit_transparent.json");
    let shader = generate(&graph, "master", GenerationMode::Final);
    let src = &shader.source;

    assert_eq!(pass_names(src), vec!["Universal Forward", "ShadowCaster"]);
    assert!(src.contains("Cull Off\n"));
    assert!(!src.contains("Cull Back"));
    assert!(src.contains("Blend SrcAlpha OneMinusSrcAlpha, One OneMinusSrcAlpha"));
    assert!(src.contains("ZWrite Off"));
    assert!(src.contains("#define _SURFACE_TYPE_TRANSPARENT 1"));
}

#[test]
fn preview_of_master_skips_non_preview_passes() {
    let graph = load_case("lit.json");
    let shader = generate(&graph, "master", GenerationMode::Preview);
    assert_eq!(pass_names(&shader.source), vec!["Universal Forward", "DepthOnly"]);
    assert!(shader.source.contains("#define SHADERGRAPH_PREVIEW"));
}

#[test]
fn preview_of_inner_node_uses_preview_target() {
    let graph = load_case("lit.json");
    let shader = generate(&graph, "mul", GenerationMode::Preview);
    let src = &shader.source;

    assert_eq!(pass_names(src), vec!["Preview"]);
    assert!(src.contains("#define SHADERPASS SHADERPASS_PREVIEW"));
    assert!(src.contains("surface.Out = _Multiply_mul_Out;"));
    assert!(src.contains("return surf.Out;"));
    assert!(!src.contains("VertexDescriptionFunction"));
    assert!(ends_with_file(&shader.asset_dependencies, "Preview.template"));
    assert!(ends_with_file(&shader.asset_dependencies, "preview.json"));
}

#[test]
fn keyword_branches_are_split_by_permutation() {
    let graph = load_case("keyword_branch.json");
    let shader = generate(&graph, "master", GenerationMode::Final);
    let src = &shader.source;

    assert!(src.contains("#pragma shader_feature_local _ _DETAIL"));
    assert!(src.contains("#if !defined(_DETAIL)\n"));
    assert!(src.contains("#elif defined(_DETAIL)\n"));
    assert!(src.contains("#define KEYWORD_PERMUTATION_1\n"));
    assert!(src.contains("#if defined(KEYWORD_PERMUTATION_1)\n"));
    assert!(src.contains("float4 _UV_uv_Out = IN.uv0;"));
    assert!(src.contains("#if defined(_DETAIL)"));
    assert!(src.contains("#elif defined(KEYWORD_PERMUTATION_1)"));
    assert!(src.contains("output.uv0 = input.texCoord0;"));
}

#[test]
fn variant_limit_emits_error_shader_with_textures() {
    let mut graph = load_case("lit.json");
    graph.keywords = serde_json::from_str(
        r#"[
            { "referenceName": "_A" },
            { "referenceName": "_B" },
            { "referenceName": "_C" }
        ]"#,
    )
    .expect("keywords");
    let mut config = config();
    config.variant_limit = 4;

    let shader = generate_with(&graph, "master", GenerationMode::Final, &config);
    assert!(shader.source.starts_with("Shader \"Shader Graphs/Lit\""));
    assert!(!shader.source.contains("SubShader"));
    assert_eq!(shader.textures.len(), 1);
    assert_eq!(shader.diagnostics.len(), 1);
    assert_eq!(shader.diagnostics[0].kind, DiagnosticKind::VariantLimitExceeded);
}

#[test]
fn missing_template_root_skips_all_passes() {
    let graph = load_case("lit.json");
    let dir = tempfile::tempdir().expect("tempdir");
    let config = GeneratorConfig::with_template_root(dir.path());
    let shader = generate_with(&graph, "master", GenerationMode::Final, &config);

    assert!(pass_names(&shader.source).is_empty());
    assert!(
        shader
            .asset_dependencies
            .iter()
            .all(|p| !p.starts_with(dir.path()))
    );
}

#[test]
fn debug_output_lists_active_fields() {
    let graph = load_case("lit.json");
    let mut config = config();
    config.debug_output = true;
    let shader = generate_with(&graph, "master", GenerationMode::Final, &config);
    assert!(shader.source.contains("// Active fields (base):"));
    assert!(shader.source.contains("//     features.graphPixel"));
}
