//! Declaration generators for the pass-level splice commands.
//!
//! Render states pick the first matching entry per state type. Pragmas,
//! includes, keywords and defines keep every matching entry in order; entries
//! whose predicate only holds in some permutations are wrapped in a
//! permutation `#if`.

use super::super::builder::ShaderStringBuilder;
use super::super::fields::{ActiveFields, Field, FieldActivity, FieldCondition, well_known};
use super::super::keywords::KeywordCollector;
use super::super::properties::PropertyCollector;
use super::super::requirements::ShaderRequirements;
use super::super::targets::{ConditionalLine, IncludeLocation, PassDescriptor, RenderStateType};
use super::{append_with_activity, lines_or_none, or_none};

/// Where a predicate holds across the permutation instances.
pub fn predicate_activity(conditions: &[FieldCondition], active: &ActiveFields) -> FieldActivity {
    if conditions.is_empty() {
        return FieldActivity::Always;
    }
    if active.permutation_count() == 0 {
        return if FieldCondition::all_hold(conditions, &active.base_instance()) {
            FieldActivity::Always
        } else {
            FieldActivity::Never
        };
    }
    let holding: Vec<usize> = active
        .permutation_instances()
        .iter()
        .filter(|instance| FieldCondition::all_hold(conditions, *instance))
        .filter_map(|instance| instance.permutation)
        .collect();
    if holding.is_empty() {
        FieldActivity::Never
    } else if holding.len() == active.permutation_count() {
        FieldActivity::Always
    } else {
        FieldActivity::Permutations(holding)
    }
}

fn conditional_block<'a>(
    entries: impl IntoIterator<Item = (&'a [FieldCondition], String)>,
    active: &ActiveFields,
) -> String {
    let mut sb = ShaderStringBuilder::new();
    for (conditions, line) in entries {
        append_with_activity(&mut sb, &predicate_activity(conditions, active), &line);
    }
    or_none(sb.into_string())
}

/// One line per render-state type, taken from the first entry whose predicate
/// holds on the base instance. Types with no matching entry are absent.
pub fn render_states(pass: &PassDescriptor, active: &ActiveFields) -> String {
    let base = active.base_instance();
    let mut seen: Vec<RenderStateType> = Vec::new();
    let mut lines = Vec::new();
    for entry in &pass.render_states {
        if seen.contains(&entry.state) || !FieldCondition::all_hold(&entry.conditions, &base) {
            continue;
        }
        seen.push(entry.state);
        lines.push(entry.to_line());
    }
    lines_or_none(&lines)
}

fn prefixed<'a>(
    lines: &'a [ConditionalLine],
    prefix: &'a str,
) -> impl Iterator<Item = (&'a [FieldCondition], String)> + 'a {
    lines
        .iter()
        .map(move |l| (l.conditions.as_slice(), format!("{prefix} {}", l.value)))
}

pub fn pragmas(pass: &PassDescriptor, active: &ActiveFields) -> String {
    conditional_block(prefixed(&pass.pragmas, "#pragma"), active)
}

pub fn defines(pass: &PassDescriptor, active: &ActiveFields) -> String {
    conditional_block(prefixed(&pass.defines, "#define"), active)
}

pub fn includes(pass: &PassDescriptor, location: IncludeLocation, active: &ActiveFields) -> String {
    conditional_block(
        pass.includes
            .iter()
            .filter(|i| i.location == location)
            .map(|i| (i.conditions.as_slice(), format!("#include \"{}\"", i.path))),
        active,
    )
}

pub fn pass_keywords(pass: &PassDescriptor, active: &ActiveFields) -> String {
    conditional_block(
        pass.keywords
            .iter()
            .map(|k| (k.conditions.as_slice(), k.declaration.clone())),
        active,
    )
}

/// `#define` lines for active feature fields such as `features.graphVertex`.
pub fn feature_defines(active: &ActiveFields) -> Vec<String> {
    let features = [
        well_known::GRAPH_VERTEX,
        well_known::GRAPH_PIXEL,
        well_known::IS_PREVIEW,
    ];
    let mut sb = ShaderStringBuilder::new();
    for feature in features {
        if let Some(define) = well_known::define_for(feature) {
            append_with_activity(&mut sb, &active.activity(&Field::from(feature)), &format!("#define {define}"));
        }
    }
    let text = sb.into_string();
    if text.is_empty() {
        Vec::new()
    } else {
        text.lines().map(str::to_string).collect()
    }
}

pub fn shader_pass(pass: &PassDescriptor) -> String {
    or_none(
        pass.shader_pass
            .as_ref()
            .map(|p| format!("#define SHADERPASS {p}"))
            .unwrap_or_default(),
    )
}

/// Keyword pragmas followed by the permutation selection block.
pub fn graph_keywords(keywords: &KeywordCollector) -> String {
    let mut lines = keywords.declarations();
    lines.extend(keywords.permutation_defines());
    lines_or_none(&lines)
}

pub fn graph_defines(requirements: &ShaderRequirements) -> String {
    lines_or_none(&requirements.graph_defines())
}

pub fn graph_properties(properties: &PropertyCollector) -> String {
    lines_or_none(&properties.hlsl_declarations())
}

pub fn instanced_properties(properties: &PropertyCollector) -> String {
    lines_or_none(&properties.instanced_declarations())
}
