//! Struct generator: one HLSL struct per descriptor, members filtered by
//! active-field membership.

use super::super::builder::ShaderStringBuilder;
use super::super::fields::{ActiveFields, FieldActivity, FieldDescriptor};
use super::super::targets::StructDescriptor;
use super::{append_with_activity, or_none, resolve_precision};

pub fn member_declaration(field: &FieldDescriptor) -> String {
    let ty = resolve_precision(field.ty.as_deref().unwrap_or("float4"));
    match &field.semantic {
        Some(semantic) => format!("{ty} {} : {semantic};", field.name),
        None => format!("{ty} {};", field.name),
    }
}

/// Writes a member, wrapped in its own preprocessor guard when it has one.
pub fn append_guarded(sb: &mut ShaderStringBuilder, preprocessor: Option<&str>, line: &str) {
    match preprocessor {
        Some(condition) => {
            sb.append_line(&format!("#if {condition}"));
            sb.append_line(line);
            sb.append_line("#endif");
        }
        None => sb.append_line(line),
    }
}

pub fn generate_struct(descriptor: &StructDescriptor, active: &ActiveFields) -> String {
    let mut sb = ShaderStringBuilder::new();
    sb.append_line(&format!("struct {}", descriptor.name));
    {
        let mut body = sb.block_semicolon_scope();
        for field in &descriptor.fields {
            let activity = active.activity(&field.field());
            if activity == FieldActivity::Never {
                continue;
            }
            let mut member = ShaderStringBuilder::new();
            append_guarded(&mut member, field.preprocessor.as_deref(), &member_declaration(field));
            let member = member.into_string();
            match &activity {
                FieldActivity::Always => body.append_lines(&member),
                _ => {
                    let mut wrapped = ShaderStringBuilder::new();
                    append_with_activity(&mut wrapped, &activity, &member);
                    body.append_lines(&wrapped.into_string());
                }
            }
        }
    }
    sb.into_string()
}

pub fn generate_structs(descriptors: &[StructDescriptor], active: &ActiveFields) -> String {
    let parts: Vec<String> = descriptors
        .iter()
        .map(|d| generate_struct(d, active))
        .collect();
    or_none(parts.join("\n\n"))
}

/// `#define` lines of active struct fields (e.g. `VARYINGS_NEED_NORMAL_WS`).
pub fn field_defines(descriptors: &[StructDescriptor], active: &ActiveFields) -> String {
    let mut sb = ShaderStringBuilder::new();
    for field in descriptors.iter().flat_map(|d| d.fields.iter()) {
        if let Some(define) = &field.define {
            append_with_activity(&mut sb, &active.activity(&field.field()), &format!("#define {define}"));
        }
    }
    or_none(sb.into_string())
}
