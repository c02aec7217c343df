//! Field Schema - Ordered Tag Contracts
//!
//! Declared order is emitted order. Sibling names are unique.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Product properties that become optional feed fields when present.
pub const OPTIONAL_PROPERTIES: &[&str] = &[
    "brand",
    "gtin",
    "mpn",
    "google_product_category",
    "adult",
    "multipack",
    "is_bundle",
    "energy_efficiency_class",
    "age_group",
    "color",
    "gender",
    "material",
    "pattern",
    "size",
    "size_type",
    "size_system",
    "item_group_id",
    "product_type",
    "unit_pricing_measure",
    "unit_pricing_base_measure",
];

pub const SALE_FIELDS: [&str; 2] = ["sale_price", "sale_price_effective_date"];

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Duplicate field '{name}' in {scope}")]
    DuplicateField { name: String, scope: String },

    #[error("Empty field name in {0}")]
    EmptyName(String),

    #[error("Failed to read schema: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid schema: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A leaf field or a named group of nested nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaNode {
    Leaf(String),
    Group { group: String, fields: Vec<SchemaNode> },
}

impl SchemaNode {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self::Leaf(name.into())
    }

    pub fn group(name: impl Into<String>, fields: Vec<SchemaNode>) -> Self {
        Self::Group { group: name.into(), fields }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Leaf(name) => name,
            Self::Group { group, .. } => group,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SchemaNode>", into = "Vec<SchemaNode>")]
pub struct FieldSchema {
    nodes: Vec<SchemaNode>,
}

impl FieldSchema {
    pub fn new(nodes: Vec<SchemaNode>) -> Result<Self, SchemaError> {
        check_scope(&nodes, "schema root")?;
        Ok(Self { nodes })
    }

    /// The base merchant feed schema.
    pub fn product_feed() -> Self {
        Self {
            nodes: vec![
                SchemaNode::leaf("id"),
                SchemaNode::leaf("title"),
                SchemaNode::leaf("description"),
                SchemaNode::leaf("image_link"),
                SchemaNode::leaf("price"),
                SchemaNode::leaf("availability"),
                SchemaNode::leaf("identifier_exists"),
                SchemaNode::leaf("link"),
                SchemaNode::leaf("condition"),
                SchemaNode::group("shipping", vec![SchemaNode::leaf("price")]),
                SchemaNode::group("tax", vec![SchemaNode::leaf("rate")]),
            ],
        }
    }

    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn nodes(&self) -> &[SchemaNode] {
        &self.nodes
    }

    /// Appends a top-level leaf unless a sibling already carries the name.
    pub fn push_leaf(&mut self, name: &str) -> bool {
        if name.is_empty() || self.nodes.iter().any(|node| node.name() == name) {
            return false;
        }
        self.nodes.push(SchemaNode::leaf(name));
        true
    }

    /// Resolver keys of every leaf, in walk order.
    pub fn field_keys(&self) -> Vec<String> {
        let mut keys = vec![];
        collect_keys(&self.nodes, None, &mut keys);
        keys
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::product_feed()
    }
}

impl TryFrom<Vec<SchemaNode>> for FieldSchema {
    type Error = SchemaError;

    fn try_from(nodes: Vec<SchemaNode>) -> Result<Self, Self::Error> {
        Self::new(nodes)
    }
}

impl From<FieldSchema> for Vec<SchemaNode> {
    fn from(schema: FieldSchema) -> Self {
        schema.nodes
    }
}

/// Resolver key for a leaf: `<parent>_<name>` when nested.
pub fn scoped_name(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) if !parent.is_empty() => format!("{}_{}", parent, name),
        _ => name.to_string(),
    }
}

fn check_scope(nodes: &[SchemaNode], scope: &str) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for node in nodes {
        let name = node.name();
        if name.trim().is_empty() {
            return Err(SchemaError::EmptyName(scope.to_string()));
        }
        if !seen.insert(name) {
            return Err(SchemaError::DuplicateField {
                name: name.to_string(),
                scope: scope.to_string(),
            });
        }
        if let SchemaNode::Group { group, fields } = node {
            check_scope(fields, &format!("group '{}'", group))?;
        }
    }
    Ok(())
}

fn collect_keys(nodes: &[SchemaNode], parent: Option<&str>, keys: &mut Vec<String>) {
    for node in nodes {
        match node {
            SchemaNode::Leaf(name) => keys.push(scoped_name(parent, name)),
            SchemaNode::Group { group, fields } => collect_keys(fields, Some(group.as_str()), keys),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_feed_keys_are_scoped() {
        let keys = FieldSchema::product_feed().field_keys();
        assert_eq!(
            keys,
            vec![
                "id", "title", "description", "image_link", "price", "availability",
                "identifier_exists", "link", "condition", "shipping_price", "tax_rate",
            ]
        );
    }

    #[test]
    fn test_schema_from_json() {
        let schema: FieldSchema = serde_json::from_str(
            r#"["id", {"group": "shipping", "fields": ["price", "country"]}]"#,
        )
        .unwrap();
        assert_eq!(schema.field_keys(), vec!["id", "shipping_price", "shipping_country"]);
    }

    #[test]
    fn test_duplicate_siblings_rejected() {
        let err = FieldSchema::new(vec![SchemaNode::leaf("id"), SchemaNode::leaf("id")]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { .. }));

        let nested = FieldSchema::new(vec![SchemaNode::group(
            "shipping",
            vec![SchemaNode::leaf("price"), SchemaNode::leaf("price")],
        )]);
        assert!(nested.is_err());
    }

    #[test]
    fn test_same_name_in_different_scopes_allowed() {
        let schema = FieldSchema::new(vec![
            SchemaNode::leaf("price"),
            SchemaNode::group("shipping", vec![SchemaNode::leaf("price")]),
        ]);
        assert!(schema.is_ok());
    }

    #[test]
    fn test_push_leaf_skips_existing() {
        let mut schema = FieldSchema::product_feed();
        assert!(!schema.push_leaf("title"));
        assert!(schema.push_leaf("brand"));
        assert_eq!(schema.field_keys().last().map(String::as_str), Some("brand"));
    }
}
