//! Fields and active-field sets.
//!
//! A field is a symbolic `Tag.name` capability tag (`features.graphVertex`,
//! `Varyings.positionWS`, ...). Each pass generation tracks one base instance
//! of active fields plus, when graph keywords produce more than one
//! permutation, one instance per permutation. A permutation instance sees the
//! base instance through it: anything active in base is active everywhere.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known fields the generator itself switches on.
pub mod well_known {
    pub const GRAPH_PIXEL: &str = "features.graphPixel";
    pub const GRAPH_VERTEX: &str = "features.graphVertex";
    pub const IS_PREVIEW: &str = "features.isPreview";
    pub const ALPHA_CLIP: &str = "features.alphaClip";
    pub const DOUBLE_SIDED: &str = "features.doubleSided";
    pub const SURFACE_OPAQUE: &str = "SurfaceType.Opaque";
    pub const SURFACE_TRANSPARENT: &str = "SurfaceType.Transparent";

    /// `#define` emitted when the corresponding feature field is active.
    pub fn define_for(field: &str) -> Option<&'static str> {
        match field {
            GRAPH_PIXEL => Some("FEATURES_GRAPH_PIXEL"),
            GRAPH_VERTEX => Some("FEATURES_GRAPH_VERTEX"),
            IS_PREVIEW => Some("SHADERGRAPH_PREVIEW"),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Field(String);

impl Field {
    pub fn new(tag: &str, name: &str) -> Self {
        Self(format!("{tag}.{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Field {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A field that may appear as a struct member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub tag: String,
    pub name: String,
    /// HLSL type; may use the `$precision` placeholder.
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
    #[serde(default)]
    pub semantic: Option<String>,
    /// `#define` emitted while the field is active.
    #[serde(default)]
    pub define: Option<String>,
    /// Preprocessor condition guarding the member.
    #[serde(default)]
    pub preprocessor: Option<String>,
}

impl FieldDescriptor {
    pub fn field(&self) -> Field {
        Field::new(&self.tag, &self.name)
    }
}

fn default_true() -> bool {
    true
}

/// Holds when `instance.contains(field) == value`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCondition {
    pub field: Field,
    #[serde(default = "default_true")]
    pub value: bool,
}

impl FieldCondition {
    pub fn new(field: &str, value: bool) -> Self {
        Self {
            field: Field::from(field),
            value,
        }
    }

    /// An empty predicate is always true.
    pub fn all_hold(conditions: &[FieldCondition], fields: &impl FieldLookup) -> bool {
        conditions
            .iter()
            .all(|c| fields.contains(&c.field) == c.value)
    }
}

/// "If `field` is active, `depends_on` must be active too."
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDependency {
    pub field: Field,
    pub depends_on: Field,
}

impl FieldDependency {
    pub fn new(field: &str, depends_on: &str) -> Self {
        Self {
            field: Field::from(field),
            depends_on: Field::from(depends_on),
        }
    }
}

pub trait FieldLookup {
    fn contains(&self, field: &Field) -> bool;
}

/// Insertion-ordered set of fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldSet {
    fields: Vec<Field>,
}

impl FieldSet {
    /// Returns `true` if the field was not present yet.
    pub fn add(&mut self, field: Field) -> bool {
        if self.fields.contains(&field) {
            return false;
        }
        self.fields.push(field);
        true
    }

    pub fn add_all(&mut self, fields: impl IntoIterator<Item = Field>) {
        for f in fields {
            self.add(f);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FieldLookup for FieldSet {
    fn contains(&self, field: &Field) -> bool {
        self.fields.contains(field)
    }
}

/// View of one instance: the base alone, or a permutation layered on base.
#[derive(Clone, Copy, Debug)]
pub struct FieldInstance<'a> {
    pub permutation: Option<usize>,
    base: &'a FieldSet,
    own: Option<&'a FieldSet>,
}

impl FieldInstance<'_> {
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.base
            .iter()
            .chain(self.own.into_iter().flat_map(|s| s.iter()))
    }
}

impl FieldLookup for FieldInstance<'_> {
    fn contains(&self, field: &Field) -> bool {
        self.base.contains(field) || self.own.is_some_and(|s| s.contains(field))
    }
}

/// Base instance plus one instance per keyword permutation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveFields {
    base: FieldSet,
    permutations: Vec<FieldSet>,
}

impl ActiveFields {
    /// A permutation count of 0 or 1 yields a base-only set.
    pub fn new(permutation_count: usize) -> Self {
        let n = if permutation_count > 1 {
            permutation_count
        } else {
            0
        };
        Self {
            base: FieldSet::default(),
            permutations: vec![FieldSet::default(); n],
        }
    }

    pub fn base(&self) -> &FieldSet {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut FieldSet {
        &mut self.base
    }

    pub fn permutation_count(&self) -> usize {
        self.permutations.len()
    }

    pub fn add_to_permutation(&mut self, index: usize, field: Field) {
        if self.base.contains(&field) {
            return;
        }
        if let Some(p) = self.permutations.get_mut(index) {
            p.add(field);
        }
    }

    pub fn base_instance(&self) -> FieldInstance<'_> {
        FieldInstance {
            permutation: None,
            base: &self.base,
            own: None,
        }
    }

    pub fn permutation(&self, index: usize) -> Option<FieldInstance<'_>> {
        self.permutations.get(index).map(|own| FieldInstance {
            permutation: Some(index),
            base: &self.base,
            own: Some(own),
        })
    }

    /// Every permutation instance, or the base instance alone when there are
    /// no permutations.
    pub fn permutation_instances(&self) -> Vec<FieldInstance<'_>> {
        if self.permutations.is_empty() {
            return vec![self.base_instance()];
        }
        (0..self.permutations.len())
            .filter_map(|i| self.permutation(i))
            .collect()
    }

    /// Base instance followed by every permutation instance.
    pub fn all_instances(&self) -> Vec<FieldInstance<'_>> {
        let mut out = vec![self.base_instance()];
        out.extend((0..self.permutations.len()).filter_map(|i| self.permutation(i)));
        out
    }

    /// Permutation indices in which `field` is active through the permutation
    /// itself (empty when the field is in base or nowhere).
    pub fn permutations_containing(&self, field: &Field) -> Vec<usize> {
        if self.base.contains(field) {
            return Vec::new();
        }
        self.permutations
            .iter()
            .enumerate()
            .filter(|(_, p)| p.contains(field))
            .map(|(i, _)| i)
            .collect()
    }

    /// Where a field is active: everywhere, in a subset of permutations, or
    /// nowhere.
    pub fn activity(&self, field: &Field) -> FieldActivity {
        if self.base.contains(field) {
            return FieldActivity::Always;
        }
        let indices = self.permutations_containing(field);
        if indices.is_empty() {
            FieldActivity::Never
        } else if indices.len() == self.permutations.len() {
            FieldActivity::Always
        } else {
            FieldActivity::Permutations(indices)
        }
    }

    /// Closes every instance under `dependencies` until no field is added.
    /// Base is closed first so permutation closures see the final base.
    pub fn propagate_dependencies(&mut self, dependencies: &[FieldDependency]) {
        loop {
            let mut changed = false;
            for dep in dependencies {
                if self.base.contains(&dep.field) && !self.base.contains(&dep.depends_on) {
                    self.base.add(dep.depends_on.clone());
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        let base = &self.base;
        for perm in &mut self.permutations {
            loop {
                let mut changed = false;
                for dep in dependencies {
                    let has = |f: &Field, p: &FieldSet| base.contains(f) || p.contains(f);
                    if has(&dep.field, perm) && !has(&dep.depends_on, perm) {
                        perm.add(dep.depends_on.clone());
                        changed = true;
                    }
                }
                if !changed {
                    break;
                }
            }
        }
    }

    /// Human-readable listing, base first, in insertion order.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = vec!["Active fields (base):".to_string()];
        lines.extend(self.base.iter().map(|f| format!("    {f}")));
        for (i, perm) in self.permutations.iter().enumerate() {
            lines.push(format!("Active fields (permutation {i}):"));
            lines.extend(perm.iter().map(|f| format!("    {f}")));
        }
        lines
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldActivity {
    Always,
    Permutations(Vec<usize>),
    Never,
}
