use std::path::PathBuf;

use node_forge_shadergen::error::GenerationError;
use node_forge_shadergen::generator::fields::{ActiveFields, Field};
use node_forge_shadergen::generator::template::{SpliceCommands, process_template};

const PASS_TOKENS: &[&str] = &[
    "PassName",
    "LightMode",
    "RenderState",
    "Debug",
    "PassPragmas",
    "PassKeywords",
    "GraphKeywords",
    "PassDefines",
    "FieldDefines",
    "ShaderPass",
    "GraphDefines",
    "PreGraphIncludes",
    "PassStructs",
    "InterpolatorPack",
    "GraphProperties",
    "InstancedProperties",
    "GraphFunctions",
    "GraphVertex",
    "GraphPixel",
    "PostGraphIncludes",
];

fn templates_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates")
}

fn all_commands() -> SpliceCommands {
    let mut commands = SpliceCommands::new();
    for token in PASS_TOKENS {
        commands.add(token, format!("<{token}>"));
    }
    commands
}

#[test]
fn shipped_pass_template_resolves_every_directive() {
    let dir = templates_dir();
    let mut active = ActiveFields::new(1);
    active.base_mut().add(Field::from("features.graphVertex"));
    active.base_mut().add(Field::from("SurfaceDescriptionInputs.uv0"));

    let out = process_template(
        &dir.join("PassMesh.template"),
        &dir.join("shared"),
        &all_commands(),
        &active,
        false,
    )
    .expect("process")
    .expect("template exists");

    assert!(!out.text.contains("$splice"));
    assert!(!out.text.contains("$include"));
    assert!(!out.text.contains("$features"));
    assert!(out.text.starts_with("Pass\n{\n    <PassName>\n"));
    assert!(out.text.contains("    VertexDescriptionInputs BuildVertexDescriptionInputs(Attributes input)\n"));
    assert!(out.text.contains("        output.uv0 = input.texCoord0;\n"));
    assert!(!out.text.contains("output.VertexColor"));
    assert_eq!(out.dependencies.len(), 3);
    assert_eq!(out.dependencies[0], dir.join("PassMesh.template"));
}

#[test]
fn every_shipped_template_token_has_a_command() {
    let dir = templates_dir();
    for name in ["PassMesh.template", "Preview.template"] {
        let result = process_template(
            &dir.join(name),
            &dir.join("shared"),
            &all_commands(),
            &ActiveFields::new(1),
            true,
        );
        assert!(result.is_ok(), "{name}: {:?}", result.err());
    }
}

#[test]
fn dropping_a_command_fails_with_its_token() {
    let dir = templates_dir();
    let mut commands = SpliceCommands::new();
    for token in PASS_TOKENS.iter().filter(|t| **t != "GraphPixel") {
        commands.add(token, "x");
    }
    let err = process_template(
        &dir.join("PassMesh.template"),
        &dir.join("shared"),
        &commands,
        &ActiveFields::new(1),
        false,
    )
    .expect_err("missing token");
    match err {
        GenerationError::MissingSpliceToken { token, template } => {
            assert_eq!(token, "GraphPixel");
            assert!(template.ends_with("PassMesh.template"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
