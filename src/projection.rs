//! Flat, nested, and attribute-style views over stored records.
//!
//! Nested views split each dotted path into mapping levels, so a category
//! view always starts with the category name as its only top-level key:
//! `{"vast": {"vllm": {"port": 12434}}}`. Attribute views drop that
//! redundant level before converting mappings into namespaces.

use crate::error::{ConfigError, ConfigResult};
use crate::store::ValueStore;
use crate::types::{DataType, Record, Variant};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Generic single-key wrapper words that are elided from attribute views.
pub const WRAPPER_WORDS: &[&str] = &[
    "data", "config", "configs", "settings", "options", "result", "response", "payload",
];

/// Decides which single-key mapping levels count as redundant wrappers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WrapperPolicy {
    /// The category's own name or any of [`WRAPPER_WORDS`].
    #[default]
    ReservedWords,
    /// Only the listed categories are wrapped, and only by their own name.
    Explicit(BTreeSet<String>),
    /// Never unwrap.
    Disabled,
}

impl WrapperPolicy {
    pub fn explicit<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        WrapperPolicy::Explicit(categories.into_iter().map(Into::into).collect())
    }

    pub fn is_wrapper(&self, category: &str, key: &str) -> bool {
        match self {
            WrapperPolicy::ReservedWords => key == category || WRAPPER_WORDS.contains(&key),
            WrapperPolicy::Explicit(wrapped) => key == category && wrapped.contains(category),
            WrapperPolicy::Disabled => false,
        }
    }
}

/// Attribute-accessible view of a nested mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrNode {
    Leaf(Variant),
    Namespace(BTreeMap<String, AttrNode>),
}

impl AttrNode {
    /// Convert a value, turning every mapping level (including map-typed
    /// setting values) into a namespace.
    pub fn from_variant(value: Variant) -> Self {
        match value {
            Variant::Map(map) => AttrNode::from_map(map),
            leaf => AttrNode::Leaf(leaf),
        }
    }

    pub fn from_map(map: BTreeMap<String, Variant>) -> Self {
        AttrNode::Namespace(
            map.into_iter()
                .map(|(k, v)| (k, AttrNode::from_variant(v)))
                .collect(),
        )
    }

    /// Child attribute of a namespace.
    pub fn attr(&self, name: &str) -> Option<&AttrNode> {
        match self {
            AttrNode::Namespace(children) => children.get(name),
            AttrNode::Leaf(_) => None,
        }
    }

    /// Follow a dotted attribute chain, e.g. `"vllm.port"`.
    pub fn lookup(&self, dotted: &str) -> Option<&AttrNode> {
        dotted
            .split('.')
            .try_fold(self, |node, segment| node.attr(segment))
    }

    /// Leaf value at a dotted attribute chain.
    pub fn value_at(&self, dotted: &str) -> Option<&Variant> {
        self.lookup(dotted).and_then(AttrNode::value)
    }

    pub fn value(&self) -> Option<&Variant> {
        match self {
            AttrNode::Leaf(value) => Some(value),
            AttrNode::Namespace(_) => None,
        }
    }

    /// Attribute names of a namespace, sorted.
    pub fn names(&self) -> Vec<&str> {
        match self {
            AttrNode::Namespace(children) => children.keys().map(String::as_str).collect(),
            AttrNode::Leaf(_) => Vec::new(),
        }
    }

    pub fn is_namespace(&self) -> bool {
        matches!(self, AttrNode::Namespace(_))
    }

    /// Back to a plain value tree.
    pub fn to_variant(&self) -> Variant {
        match self {
            AttrNode::Leaf(value) => value.clone(),
            AttrNode::Namespace(children) => Variant::Map(
                children
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_variant()))
                    .collect(),
            ),
        }
    }
}

/// Presentation requested from [`ProjectionBuilder::category_view`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStyle {
    /// Raw nested mapping, category wrapper kept.
    Nested,
    /// Wrapper elided, mappings converted to namespaces.
    Attribute,
}

/// Result of a category view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CategoryView {
    Nested(BTreeMap<String, Variant>),
    Attribute(AttrNode),
}

impl CategoryView {
    pub fn as_attributes(&self) -> Option<&AttrNode> {
        match self {
            CategoryView::Attribute(node) => Some(node),
            CategoryView::Nested(_) => None,
        }
    }

    pub fn as_nested(&self) -> Option<&BTreeMap<String, Variant>> {
        match self {
            CategoryView::Nested(map) => Some(map),
            CategoryView::Attribute(_) => None,
        }
    }
}

/// Split each record's path on `.` and assign its value at the leaf.
///
/// Records sharing intermediate segments share one sub-mapping. When a path
/// runs through a segment that already holds a scalar, the scalar is
/// replaced by a mapping.
pub fn build_nested(records: &[Record]) -> BTreeMap<String, Variant> {
    let mut root = BTreeMap::new();
    for record in records {
        let segments: Vec<&str> = record.path.split('.').collect();
        insert_path(&mut root, &segments, record.value.clone());
    }
    root
}

fn insert_path(root: &mut BTreeMap<String, Variant>, segments: &[&str], value: Variant) {
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };

    let mut current = root;
    for segment in parents {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Variant::Map(BTreeMap::new()));
        if !matches!(slot, Variant::Map(_)) {
            debug!(segment = %segment, "Replacing scalar with mapping while nesting");
            *slot = Variant::Map(BTreeMap::new());
        }
        let Variant::Map(next) = slot else {
            return;
        };
        current = next;
    }
    current.insert(leaf.to_string(), value);
}

/// Identity view: `path → value`.
pub fn build_flat(records: &[Record]) -> BTreeMap<String, Variant> {
    records
        .iter()
        .map(|record| (record.path.clone(), record.value.clone()))
        .collect()
}

/// Collapse redundant single-key wrapper levels at the root of a category view.
///
/// Repeats while the root has exactly one key, that key is a wrapper under
/// `policy`, and its value is itself a mapping. A lone real setting is never
/// collapsed into a bare scalar.
pub fn unwrap_redundant(
    category: &str,
    mut map: BTreeMap<String, Variant>,
    policy: &WrapperPolicy,
) -> BTreeMap<String, Variant> {
    loop {
        if map.len() != 1 {
            return map;
        }
        let Some((key, value)) = map.pop_first() else {
            return map;
        };
        match value {
            Variant::Map(inner) if policy.is_wrapper(category, &key) => {
                debug!(category = %category, key = %key, "Unwrapping redundant wrapper key");
                map = inner;
            }
            value => {
                map.insert(key, value);
                return map;
            }
        }
    }
}

/// Renders store contents as flat, nested, or attribute views.
#[derive(Debug, Clone)]
pub struct ProjectionBuilder {
    store: ValueStore,
    policy: WrapperPolicy,
}

impl ProjectionBuilder {
    pub fn new(store: ValueStore) -> Self {
        Self {
            store,
            policy: WrapperPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: WrapperPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &WrapperPolicy {
        &self.policy
    }

    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    pub fn build_nested(&self, records: &[Record]) -> BTreeMap<String, Variant> {
        build_nested(records)
    }

    pub fn build_flat(&self, records: &[Record]) -> BTreeMap<String, Variant> {
        build_flat(records)
    }

    /// View one category. Fails with a not-found error when the category has
    /// no records.
    pub fn category_view(&self, category: &str, style: ViewStyle) -> ConfigResult<CategoryView> {
        let records = self.store.list_category_records(category);
        if records.is_empty() {
            return Err(ConfigError::category_not_found(category));
        }

        let nested = build_nested(&records);
        Ok(match style {
            ViewStyle::Nested => CategoryView::Nested(nested),
            ViewStyle::Attribute => {
                CategoryView::Attribute(AttrNode::from_map(unwrap_redundant(
                    category,
                    nested,
                    &self.policy,
                )))
            }
        })
    }

    /// Shorthand for the attribute-style category view.
    pub fn attributes(&self, category: &str) -> ConfigResult<AttrNode> {
        match self.category_view(category, ViewStyle::Attribute)? {
            CategoryView::Attribute(node) => Ok(node),
            CategoryView::Nested(map) => Ok(AttrNode::from_map(map)),
        }
    }

    /// Whole store (or one category) as a flat or nested mapping.
    pub fn config_dict(&self, category: Option<&str>, flatten: bool) -> BTreeMap<String, Variant> {
        let records = match category {
            Some(category) => self.store.list_category_records(category),
            None => self.store.list_all_records(),
        };
        if flatten {
            build_flat(&records)
        } else {
            build_nested(&records)
        }
    }

    /// Look up several paths at once; missing paths map to `None`.
    pub fn values_for<S: AsRef<str>>(&self, paths: &[S]) -> BTreeMap<String, Option<Variant>> {
        paths
            .iter()
            .map(|path| (path.as_ref().to_string(), self.store.value(path.as_ref())))
            .collect()
    }

    /// Write a value straight to a path, bypassing registry entries.
    ///
    /// Entries caching this path keep their old value until refreshed.
    pub fn update_path(&self, path: &str, value: &Variant, data_type: Option<DataType>) -> bool {
        self.store.set_record(path, value, data_type, None)
    }
}
