//! Interpolator packing.
//!
//! Struct members with a semantic (or a preprocessor guard) are copied as-is.
//! The remaining float members are packed first-fit into `float4` slots
//! (`interpN : INTERPN`). Layouts are computed per permutation; permutations
//! that produce identical code share one branch.

use super::super::builder::ShaderStringBuilder;
use super::super::fields::{ActiveFields, FieldDescriptor, FieldInstance, FieldLookup};
use super::super::keywords::permutations_condition;
use super::super::targets::StructDescriptor;
use super::structs::{append_guarded, member_declaration};
use super::{or_none, resolve_precision};

/// Components of a packable float type (`float`..`float4`).
fn float_components(ty: &str) -> Option<usize> {
    match resolve_precision(ty).as_str() {
        "float" => Some(1),
        "float2" => Some(2),
        "float3" => Some(3),
        "float4" => Some(4),
        _ => None,
    }
}

struct PackedMember<'a> {
    field: &'a FieldDescriptor,
    slot: usize,
    swizzle: &'static str,
}

#[derive(Default)]
struct Layout<'a> {
    direct: Vec<&'a FieldDescriptor>,
    packed: Vec<PackedMember<'a>>,
    slot_widths: Vec<usize>,
}

fn layout<'a>(descriptor: &'a StructDescriptor, instance: &FieldInstance<'_>) -> Layout<'a> {
    let mut out = Layout::default();
    for field in &descriptor.fields {
        if !instance.contains(&field.field()) {
            continue;
        }
        let components = field.ty.as_deref().and_then(float_components);
        let packable = field.semantic.is_none() && field.preprocessor.is_none();
        let Some(n) = components.filter(|_| packable) else {
            out.direct.push(field);
            continue;
        };
        let slot = match out.slot_widths.iter().position(|w| w + n <= 4) {
            Some(slot) => slot,
            None => {
                out.slot_widths.push(0);
                out.slot_widths.len() - 1
            }
        };
        let start = out.slot_widths[slot];
        out.slot_widths[slot] += n;
        out.packed.push(PackedMember {
            field,
            slot,
            swizzle: &"xyzw"[start..start + n],
        });
    }
    out
}

fn generate_body(descriptor: &StructDescriptor, instance: &FieldInstance<'_>) -> String {
    let name = &descriptor.name;
    let packed_name = format!("Packed{name}");
    let layout = layout(descriptor, instance);
    let mut sb = ShaderStringBuilder::new();

    sb.append_line(&format!("struct {packed_name}"));
    {
        let mut body = sb.block_semicolon_scope();
        for field in layout.direct.iter().filter(|f| f.semantic.is_some()) {
            append_guarded(&mut body, field.preprocessor.as_deref(), &member_declaration(field));
        }
        for (slot, width) in layout.slot_widths.iter().enumerate() {
            let ty = if *width == 1 { "float".to_string() } else { format!("float{width}") };
            body.append_line(&format!("{ty} interp{slot} : INTERP{slot};"));
        }
        for field in layout.direct.iter().filter(|f| f.semantic.is_none()) {
            append_guarded(&mut body, field.preprocessor.as_deref(), &member_declaration(field));
        }
    }
    sb.append_newline();

    sb.append_line(&format!("{packed_name} Pack{name} ({name} input)"));
    {
        let mut body = sb.block_scope();
        body.append_line(&format!("{packed_name} output;"));
        body.append_line(&format!("ZERO_INITIALIZE({packed_name}, output);"));
        for field in &layout.direct {
            let copy = format!("output.{0} = input.{0};", field.name);
            append_guarded(&mut body, field.preprocessor.as_deref(), &copy);
        }
        for member in &layout.packed {
            body.append_line(&format!(
                "output.interp{}.{} = input.{};",
                member.slot, member.swizzle, member.field.name
            ));
        }
        body.append_line("return output;");
    }
    sb.append_newline();

    sb.append_line(&format!("{name} Unpack{name} ({packed_name} input)"));
    {
        let mut body = sb.block_scope();
        body.append_line(&format!("{name} output;"));
        for field in &layout.direct {
            let copy = format!("output.{0} = input.{0};", field.name);
            append_guarded(&mut body, field.preprocessor.as_deref(), &copy);
        }
        for member in &layout.packed {
            body.append_line(&format!(
                "output.{} = input.interp{}.{};",
                member.field.name, member.slot, member.swizzle
            ));
        }
        body.append_line("return output;");
    }
    sb.into_string()
}

/// Packed struct plus pack/unpack functions for one descriptor. Distinct
/// bodies are wrapped `#if` / `#elif` / `#endif` by the permutations that
/// produce them; a single distinct body is emitted bare.
pub fn generate_packed_struct(descriptor: &StructDescriptor, active: &ActiveFields) -> String {
    let mut variants: Vec<(String, Vec<usize>)> = Vec::new();
    for instance in active.permutation_instances() {
        let body = generate_body(descriptor, &instance);
        let index = instance.permutation.unwrap_or(0);
        match variants.iter_mut().find(|(b, _)| *b == body) {
            Some((_, indices)) => indices.push(index),
            None => variants.push((body, vec![index])),
        }
    }

    if variants.len() == 1 {
        return variants.remove(0).0;
    }
    let mut sb = ShaderStringBuilder::new();
    for (i, (body, indices)) in variants.iter().enumerate() {
        let directive = if i == 0 { "#if" } else { "#elif" };
        sb.append_line(&format!("{directive} {}", permutations_condition(indices)));
        sb.append_lines(body);
    }
    sb.append_line("#endif");
    sb.into_string()
}

/// Packing code for every descriptor marked `pack_fields`.
pub fn generate_interpolator_packing(descriptors: &[StructDescriptor], active: &ActiveFields) -> String {
    let parts: Vec<String> = descriptors
        .iter()
        .filter(|d| d.pack_fields)
        .map(|d| generate_packed_struct(d, active))
        .collect();
    or_none(parts.join("\n\n"))
}
