use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// Nested relation-inclusion specification.
///
/// Each entry names a relation to eagerly load. A `Leaf` includes the
/// relation with no further nesting; a `Nested` node includes the relation
/// plus a sub-spec for its own relations. Towards the persistence layer a
/// leaf renders as `true` and an internal node as `{"include": {...}}`, since
/// that layer distinguishes "include this relation" from "include this
/// relation and these sub-relations".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IncludeSpec {
    relations: IndexMap<String, IncludeNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IncludeNode {
    Leaf,
    Nested(IncludeSpec),
}

impl IncludeSpec {
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn get(&self, relation: &str) -> Option<&IncludeNode> {
        self.relations.get(relation)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IncludeNode)> {
        self.relations.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Sub-spec for a relation: empty for leaves, the nested spec otherwise.
    pub fn child(&self, relation: &str) -> IncludeSpec {
        match self.relations.get(relation) {
            Some(IncludeNode::Nested(spec)) => spec.clone(),
            _ => IncludeSpec::default(),
        }
    }

    /// Persistence-layer shape, with internal nodes re-wrapped bottom-up as
    /// `{"include": children}`.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for IncludeSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.relations.len()))?;
        for (relation, node) in &self.relations {
            match node {
                IncludeNode::Leaf => map.serialize_entry(relation, &true)?,
                IncludeNode::Nested(spec) => map.serialize_entry(relation, &Wrapped(spec))?,
            }
        }
        map.end()
    }
}

struct Wrapped<'a>(&'a IncludeSpec);

impl Serialize for Wrapped<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("include", self.0)?;
        map.end()
    }
}

/// Compiles a comma-separated list of dot-paths (e.g.
/// `"categories,taxonomy.varieties"`) into an [`IncludeSpec`].
///
/// Each path is trimmed; empty paths are skipped. The final segment of a path
/// becomes a leaf; non-final segments become (or reuse) nested nodes. A leaf
/// later used as a prefix is upgraded to a nested node, and a final segment
/// that already carries children stays nested: inclusion is unconditional
/// either way.
pub fn compile_include(input: &str) -> IncludeSpec {
    let mut spec = IncludeSpec::default();

    for path in input.split(',') {
        let path = path.trim();
        if path.is_empty() {
            continue;
        }
        let segments: Vec<&str> = path.split('.').collect();
        insert_path(&mut spec, &segments);
    }

    spec
}

fn insert_path(spec: &mut IncludeSpec, segments: &[&str]) {
    let mut current = spec;
    for (index, segment) in segments.iter().enumerate() {
        if index == segments.len() - 1 {
            current
                .relations
                .entry(segment.to_string())
                .or_insert(IncludeNode::Leaf);
            return;
        }
        let entry = current
            .relations
            .entry(segment.to_string())
            .or_insert_with(|| IncludeNode::Nested(IncludeSpec::default()));
        if matches!(entry, IncludeNode::Leaf) {
            *entry = IncludeNode::Nested(IncludeSpec::default());
        }
        current = match entry {
            IncludeNode::Nested(spec) => spec,
            IncludeNode::Leaf => unreachable!(),
        };
    }
}
