//! Field Resolution - Override, Default, or Skip
//!
//! Resolution order for a field key:
//! 1. `<key>_for_feed` product property
//! 2. Default computation from the field registry
//! 3. `MissingMandatoryField`
//!
//! Results are memoized per entry, failures included. Resolution never emits
//! output, so the validation pass stays free of document side effects.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::fields::FieldRegistry;
use crate::links::ProductUrlBuilder;
use crate::money::MoneyFormatter;
use crate::product::{ProductSnapshot, Properties};
use crate::strategies::Strategies;
use crate::value::{FieldValue, ResolvedValue};

pub const OVERRIDE_SUFFIX: &str = "_for_feed";

/// The only reason an entry is left out of the feed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing mandatory {field}. Skipping feed entry for {product}.")]
pub struct MissingMandatoryField {
    pub field: String,
    pub product: String,
}

impl MissingMandatoryField {
    pub fn new(field: impl Into<String>, product: &ProductSnapshot) -> Self {
        Self { field: field.into(), product: product.inspect() }
    }
}

pub type Resolution = Result<ResolvedValue, MissingMandatoryField>;

/// Field overrides taken from `<field>_for_feed` properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSet {
    values: HashMap<String, String>,
}

impl OverrideSet {
    pub fn from_properties(properties: &Properties) -> Self {
        let values = properties
            .iter()
            .filter_map(|(name, value)| {
                let field = name.strip_suffix(OVERRIDE_SUFFIX)?;
                (!field.is_empty()).then(|| (field.to_string(), value.to_string()))
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Read-only collaborators shared by every entry of a feed pass.
#[derive(Clone)]
pub struct RenderEnv {
    pub strategies: Strategies,
    pub registry: FieldRegistry,
    pub base_condition: String,
    pub url_builder: Arc<dyn ProductUrlBuilder>,
    pub money: Arc<dyn MoneyFormatter>,
}

/// Per-product resolution context. Never outlives one entry.
pub struct RenderEntry<'a> {
    product: &'a ProductSnapshot,
    env: &'a RenderEnv,
    overrides: OverrideSet,
    cache: HashMap<String, Resolution>,
}

impl<'a> RenderEntry<'a> {
    pub fn new(product: &'a ProductSnapshot, env: &'a RenderEnv) -> Self {
        Self {
            product,
            env,
            overrides: OverrideSet::from_properties(&product.properties),
            cache: HashMap::new(),
        }
    }

    pub fn product(&self) -> &'a ProductSnapshot {
        self.product
    }

    pub fn env(&self) -> &'a RenderEnv {
        self.env
    }

    pub fn overrides(&self) -> &OverrideSet {
        &self.overrides
    }

    /// Resolve `field` through the registry's default computation.
    pub fn resolve(&mut self, field: &str) -> Resolution {
        let default = self.env.registry.get(field).cloned();
        self.resolve_with(field, move |entry| match default {
            Some(default) => default.compute(entry),
            None => Ok(None),
        })
    }

    /// Resolve `field`, computing with `default` only on a cache miss
    /// without an override.
    pub fn resolve_with<F>(&mut self, field: &str, default: F) -> Resolution
    where
        F: FnOnce(&mut Self) -> Result<Option<FieldValue>, MissingMandatoryField>,
    {
        if let Some(cached) = self.cache.get(field) {
            return cached.clone();
        }

        let resolution = match self.overrides.get(field).map(str::to_owned) {
            Some(raw) => Ok(Some(ResolvedValue::overridden(raw))),
            None => default(self).map(|value| value.map(ResolvedValue::computed)),
        }
        .and_then(|resolved| {
            resolved
                .filter(|r| !r.value.is_blank())
                .ok_or_else(|| MissingMandatoryField::new(field, self.product))
        });

        self.cache.insert(field.to_string(), resolution.clone());
        resolution
    }

    /// Number of memoized keys.
    pub fn cached_fields(&self) -> usize {
        self.cache.len()
    }
}
