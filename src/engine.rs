//! Schema Engine - Two-Phase Walk
//!
//! CRITICAL: validate and render share the entry's resolution cache, so a
//! field that validated is guaranteed to render with the same value.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_NAMESPACE_PREFIX;
use crate::resolver::{MissingMandatoryField, RenderEntry};
use crate::schema::{scoped_name, FieldSchema, SchemaNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// Resolve every field, emit nothing
    Validate,
    /// Resolve and emit
    Render,
}

/// One emitted tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedNode {
    Field { tag: String, value: String },
    Group { tag: String, children: Vec<FeedNode> },
}

impl FeedNode {
    pub fn tag(&self) -> &str {
        match self {
            Self::Field { tag, .. } | Self::Group { tag, .. } => tag,
        }
    }
}

/// A rendered `<item>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub sku: String,
    pub fields: Vec<FeedNode>,
}

impl FeedItem {
    /// Top-level tag names in emitted order.
    pub fn tags(&self) -> Vec<&str> {
        self.fields.iter().map(FeedNode::tag).collect()
    }

    /// Value at a tag path such as `["g:shipping", "g:price"]`.
    pub fn value(&self, path: &[&str]) -> Option<&str> {
        let (last, groups) = path.split_last()?;
        let mut nodes = &self.fields;
        for group in groups {
            nodes = nodes.iter().find_map(|node| match node {
                FeedNode::Group { tag, children } if tag == group => Some(children),
                _ => None,
            })?;
        }
        nodes.iter().find_map(|node| match node {
            FeedNode::Field { tag, value } if tag == last => Some(value.as_str()),
            _ => None,
        })
    }
}

pub struct SchemaEngine {
    prefix: String,
}

impl SchemaEngine {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn validate(&self, entry: &mut RenderEntry<'_>, schema: &FieldSchema) -> Result<(), MissingMandatoryField> {
        let mut discarded = vec![];
        self.walk(entry, schema.nodes(), None, WalkMode::Validate, &mut discarded)
    }

    pub fn render(
        &self,
        entry: &mut RenderEntry<'_>,
        schema: &FieldSchema,
    ) -> Result<Vec<FeedNode>, MissingMandatoryField> {
        let mut nodes = vec![];
        self.walk(entry, schema.nodes(), None, WalkMode::Render, &mut nodes)?;
        Ok(nodes)
    }

    /// Walk `nodes` in declared order. Leaves are resolved under their
    /// immediate parent's scope.
    pub fn walk(
        &self,
        entry: &mut RenderEntry<'_>,
        nodes: &[SchemaNode],
        parent: Option<&str>,
        mode: WalkMode,
        out: &mut Vec<FeedNode>,
    ) -> Result<(), MissingMandatoryField> {
        for node in nodes {
            match node {
                SchemaNode::Leaf(name) => {
                    let resolved = entry.resolve(&scoped_name(parent, name))?;
                    if mode == WalkMode::Render {
                        out.push(FeedNode::Field {
                            tag: self.tag(name),
                            value: resolved.value.render(entry.env().money.as_ref()),
                        });
                    }
                }
                SchemaNode::Group { group, fields } => match mode {
                    WalkMode::Validate => self.walk(entry, fields, Some(group.as_str()), mode, out)?,
                    WalkMode::Render => {
                        let mut children = vec![];
                        self.walk(entry, fields, Some(group.as_str()), mode, &mut children)?;
                        out.push(FeedNode::Group { tag: self.tag(group), children });
                    }
                },
            }
        }
        Ok(())
    }

    fn tag(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}:{}", self.prefix, name)
        }
    }
}

impl Default for SchemaEngine {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE_PREFIX)
    }
}
