//! Fragment generators: pure functions from active fields and node subsets to
//! the text spliced into pass templates.

pub mod declarations;
pub mod descriptions;
pub mod interpolators;
pub mod structs;

use super::builder::ShaderStringBuilder;
use super::fields::FieldActivity;
use super::keywords::permutations_condition;

/// Text used for a splice command that generated nothing.
pub const NONE_PLACEHOLDER: &str = "// <None>";

pub fn or_none(text: String) -> String {
    if text.trim().is_empty() {
        NONE_PLACEHOLDER.to_string()
    } else {
        text
    }
}

pub fn lines_or_none(lines: &[String]) -> String {
    or_none(lines.join("\n"))
}

/// Substitutes the `$precision` placeholder of descriptor types.
pub fn resolve_precision(ty: &str) -> String {
    ty.replace("$precision", "float")
}

/// Writes `line` as-is, or wrapped in a permutation `#if` when it is only
/// active in some permutations. Nothing is written for inactive lines.
pub fn append_with_activity(sb: &mut ShaderStringBuilder, activity: &FieldActivity, line: &str) {
    match activity {
        FieldActivity::Always => sb.append_line(line),
        FieldActivity::Permutations(indices) => {
            sb.append_line(&format!("#if {}", permutations_condition(indices)));
            sb.append_line(line);
            sb.append_line("#endif");
        }
        FieldActivity::Never => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_output_becomes_placeholder() {
        assert_eq!(or_none(String::new()), "// <None>");
        assert_eq!(lines_or_none(&[]), "// <None>");
        assert_eq!(or_none("x".to_string()), "x");
    }

    #[test]
    fn partial_activity_is_wrapped() {
        let mut sb = ShaderStringBuilder::new();
        append_with_activity(&mut sb, &FieldActivity::Permutations(vec![0, 2]), "#define A");
        append_with_activity(&mut sb, &FieldActivity::Never, "#define B");
        append_with_activity(&mut sb, &FieldActivity::Always, "#define C");
        assert_eq!(
            sb.into_string(),
            "#if defined(KEYWORD_PERMUTATION_0) || defined(KEYWORD_PERMUTATION_2)\n#define A\n#endif\n#define C"
        );
    }
}
