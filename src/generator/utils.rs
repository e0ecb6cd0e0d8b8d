//! Utility functions for the generator module.

use super::types::{TypedExpr, ValueType};

/// Format an f32 as a shortest-form HLSL literal.
pub fn fmt_f32(v: f32) -> String {
    if v.is_finite() {
        let s = format!("{v:.9}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        "0".to_string()
    }
}

/// Format a float vector as an HLSL constructor (`float3(1, 0.5, 0)`).
pub fn fmt_vec(values: &[f32]) -> String {
    let ty = ValueType::from_components(values.len());
    if ty == ValueType::Float {
        return fmt_f32(values.first().copied().unwrap_or(0.0));
    }
    let parts: Vec<String> = values.iter().copied().map(fmt_f32).collect();
    format!("{}({})", ty.hlsl(), parts.join(", "))
}

/// Sanitize a string to be a valid HLSL identifier.
pub fn sanitize_ident(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}

/// Convert an expression to `target`: scalars splat, wider vectors are
/// truncated with a swizzle, narrower vectors are padded with zeros.
pub fn coerce(x: &TypedExpr, target: ValueType) -> TypedExpr {
    if x.ty == target {
        return x.clone();
    }
    let from = x.ty.components();
    let to = target.components();
    let expr = if x.ty == ValueType::Float {
        format!("({}).{}", x.expr, "x".repeat(to))
    } else if from > to {
        format!("({}).{}", x.expr, &"xyzw"[..to])
    } else {
        let zeros = vec!["0"; to - from].join(", ");
        format!("{}({}, {})", target.hlsl(), x.expr, zeros)
    };
    TypedExpr::new(expr, target)
}

/// Wider of two operand types, used for binary math nodes.
pub fn binary_result_type(a: ValueType, b: ValueType) -> ValueType {
    a.max(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_f32_trims_trailing_zeros() {
        assert_eq!(fmt_f32(1.0), "1");
        assert_eq!(fmt_f32(0.25), "0.25");
        assert_eq!(fmt_f32(f32::NAN), "0");
    }

    #[test]
    fn fmt_vec_builds_constructor() {
        assert_eq!(fmt_vec(&[1.0, 0.5, 0.0]), "float3(1, 0.5, 0)");
        assert_eq!(fmt_vec(&[2.0]), "2");
    }

    #[test]
    fn sanitize_replaces_invalid_chars() {
        assert_eq!(sanitize_ident("node-1.a"), "node_1_a");
        assert_eq!(sanitize_ident(""), "_");
    }

    #[test]
    fn coerce_splats_truncates_and_pads() {
        let f = TypedExpr::new("a", ValueType::Float);
        assert_eq!(coerce(&f, ValueType::Vec3).expr, "(a).xxx");

        let v4 = TypedExpr::new("c", ValueType::Vec4);
        assert_eq!(coerce(&v4, ValueType::Vec3).expr, "(c).xyz");
        assert_eq!(coerce(&v4, ValueType::Float).expr, "(c).x");

        let v2 = TypedExpr::new("uv", ValueType::Vec2);
        assert_eq!(coerce(&v2, ValueType::Vec4).expr, "float4(uv, 0, 0)");
    }
}
