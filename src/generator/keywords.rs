//! Blackboard keywords and keyword permutations.
//!
//! Permutations are enumerated in mixed radix over the permuting keywords in
//! declaration order, first keyword most significant, so the index of a
//! permutation is stable for a given graph.

use serde::{Deserialize, Serialize};

use crate::dsl::MaterialGraphDSL;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordKind {
    #[default]
    Boolean,
    Enum,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordDefinition {
    #[default]
    ShaderFeature,
    MultiCompile,
    /// Defined by the pipeline; never permuted by the generator.
    Predefined,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordScope {
    #[default]
    Local,
    Global,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordEntry {
    pub display_name: String,
    pub reference_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordDescriptor {
    pub reference_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub kind: KeywordKind,
    #[serde(default)]
    pub entries: Vec<KeywordEntry>,
    #[serde(default)]
    pub definition: KeywordDefinition,
    #[serde(default)]
    pub scope: KeywordScope,
}

impl KeywordDescriptor {
    pub fn boolean(reference_name: &str) -> Self {
        Self {
            reference_name: reference_name.to_string(),
            display_name: None,
            kind: KeywordKind::Boolean,
            entries: Vec::new(),
            definition: KeywordDefinition::ShaderFeature,
            scope: KeywordScope::Local,
        }
    }

    pub fn enumeration(reference_name: &str, entries: &[&str]) -> Self {
        Self {
            reference_name: reference_name.to_string(),
            display_name: None,
            kind: KeywordKind::Enum,
            entries: entries
                .iter()
                .map(|e| KeywordEntry {
                    display_name: e.to_string(),
                    reference_name: e.to_string(),
                })
                .collect(),
            definition: KeywordDefinition::ShaderFeature,
            scope: KeywordScope::Local,
        }
    }

    /// False for an enum keyword without entries, which selects nothing.
    pub fn has_values(&self) -> bool {
        self.kind == KeywordKind::Boolean || !self.entries.is_empty()
    }

    pub fn permutes(&self) -> bool {
        self.definition != KeywordDefinition::Predefined
    }

    /// Number of values the keyword can take.
    pub fn value_count(&self) -> usize {
        match self.kind {
            KeywordKind::Boolean => 2,
            KeywordKind::Enum => self.entries.len().max(1),
        }
    }

    /// Preprocessor symbol set when the keyword takes `value`. Boolean value 0
    /// is "off" and has no symbol.
    pub fn value_symbol(&self, value: usize) -> Option<String> {
        match self.kind {
            KeywordKind::Boolean => (value == 1).then(|| self.reference_name.clone()),
            KeywordKind::Enum => self
                .entries
                .get(value)
                .map(|e| format!("{}_{}", self.reference_name, e.reference_name)),
        }
    }

    /// Input port a keyword node selects for `value`.
    pub fn branch_port(&self, value: usize) -> Option<String> {
        match self.kind {
            KeywordKind::Boolean => Some(if value == 1 { "On" } else { "Off" }.to_string()),
            KeywordKind::Enum => self.entries.get(value).map(|e| e.reference_name.clone()),
        }
    }

    /// `defined(...)` term matching `value`.
    pub fn value_condition(&self, value: usize) -> String {
        match (self.kind, self.value_symbol(value)) {
            (KeywordKind::Boolean, _) if value == 0 => {
                format!("!defined({})", self.reference_name)
            }
            (_, Some(symbol)) => format!("defined({symbol})"),
            (_, None) => format!("defined({})", self.reference_name),
        }
    }

    /// `#pragma` line declaring the keyword; `None` for predefined keywords.
    pub fn declaration(&self) -> Option<String> {
        if !self.has_values() {
            return None;
        }
        let directive = match self.definition {
            KeywordDefinition::ShaderFeature => "shader_feature",
            KeywordDefinition::MultiCompile => "multi_compile",
            KeywordDefinition::Predefined => return None,
        };
        let scope = match self.scope {
            KeywordScope::Local => "_local",
            KeywordScope::Global => "",
        };
        let symbols = match self.kind {
            KeywordKind::Boolean => format!("_ {}", self.reference_name),
            KeywordKind::Enum => (0..self.entries.len())
                .filter_map(|i| self.value_symbol(i))
                .collect::<Vec<_>>()
                .join(" "),
        };
        Some(format!("#pragma {directive}{scope} {symbols}"))
    }
}

/// Keywords of one graph plus their permutation space.
#[derive(Clone, Debug, Default)]
pub struct KeywordCollector {
    keywords: Vec<KeywordDescriptor>,
}

impl KeywordCollector {
    pub fn new(keywords: Vec<KeywordDescriptor>) -> Self {
        Self { keywords }
    }

    pub fn from_graph(graph: &MaterialGraphDSL) -> Self {
        Self::new(graph.keywords.clone())
    }

    pub fn keywords(&self) -> &[KeywordDescriptor] {
        &self.keywords
    }

    pub fn keyword(&self, reference_name: &str) -> Option<&KeywordDescriptor> {
        self.keywords
            .iter()
            .find(|k| k.reference_name == reference_name)
    }

    fn permuting(&self) -> impl Iterator<Item = &KeywordDescriptor> {
        self.keywords.iter().filter(|k| k.permutes())
    }

    /// Product of the value counts of every permuting keyword (1 when none).
    pub fn permutation_count(&self) -> usize {
        self.permuting()
            .fold(1usize, |acc, k| acc.saturating_mul(k.value_count()))
    }

    /// Value index of `reference_name` in permutation `index`. `None` for
    /// unknown or predefined keywords.
    pub fn value_in_permutation(&self, index: usize, reference_name: &str) -> Option<usize> {
        let mut rest = index;
        let mut found = None;
        for k in self.permuting().collect::<Vec<_>>().into_iter().rev() {
            let count = k.value_count();
            if k.reference_name == reference_name {
                found = Some(rest % count);
            }
            rest /= count;
        }
        found
    }

    /// `defined(...) && ...` condition selecting permutation `index`.
    pub fn permutation_condition(&self, index: usize) -> String {
        self.permuting()
            .filter_map(|k| {
                self.value_in_permutation(index, &k.reference_name)
                    .map(|v| k.value_condition(v))
            })
            .collect::<Vec<_>>()
            .join(" && ")
    }

    /// `#pragma` lines for every declared keyword.
    pub fn declarations(&self) -> Vec<String> {
        self.keywords.iter().filter_map(|k| k.declaration()).collect()
    }

    /// Block mapping keyword states to `KEYWORD_PERMUTATION_i` defines. Empty
    /// when there is at most one permutation.
    pub fn permutation_defines(&self) -> Vec<String> {
        let count = self.permutation_count();
        if count <= 1 {
            return Vec::new();
        }
        let mut lines = Vec::with_capacity(count * 2 + 1);
        for i in 0..count {
            let directive = if i == 0 { "#if" } else { "#elif" };
            lines.push(format!("{directive} {}", self.permutation_condition(i)));
            lines.push(format!("    #define {}", permutation_symbol(i)));
        }
        lines.push("#endif".to_string());
        lines
    }
}

pub fn permutation_symbol(index: usize) -> String {
    format!("KEYWORD_PERMUTATION_{index}")
}

/// `#if` condition enabling code for the given permutations.
pub fn permutations_condition(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|i| format!("defined({})", permutation_symbol(*i)))
        .collect::<Vec<_>>()
        .join(" || ")
}
