//! Feed Renderer - Single Entry Point
//!
//! CRITICAL: every entry is validated before it is rendered. An entry that
//! fails validation is logged and dropped whole; siblings are unaffected.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, FeedConfig};
use crate::document::FeedDocument;
use crate::engine::{FeedItem, SchemaEngine};
use crate::fields::FieldRegistry;
use crate::links::ProductUrlBuilder;
use crate::money::{CurrencyQualified, MoneyFormatter};
use crate::product::ProductSnapshot;
use crate::resolver::{MissingMandatoryField, RenderEntry, RenderEnv};
use crate::schema::{FieldSchema, SchemaError, OPTIONAL_PROPERTIES, SALE_FIELDS};
use crate::strategies::Strategies;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_PASS_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_pass_count() -> u32 {
    VALIDATION_PASS_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_pass_count() {
    VALIDATION_PASS_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(String),
}

/// Validation outcome for one catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryCheck {
    pub sku: String,
    pub valid: bool,
    #[serde(default)]
    pub missing_field: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl EntryCheck {
    fn from_result(product: &ProductSnapshot, result: Result<(), MissingMandatoryField>) -> Self {
        match result {
            Ok(()) => Self { sku: product.sku.clone(), valid: true, missing_field: None, message: None },
            Err(missing) => Self {
                sku: product.sku.clone(),
                valid: false,
                message: Some(missing.to_string()),
                missing_field: Some(missing.field),
            },
        }
    }
}

/// Renders products into feed items. Shareable across worker threads.
pub struct FeedRenderer {
    config: FeedConfig,
    env: RenderEnv,
    schema: FieldSchema,
    engine: SchemaEngine,
}

impl FeedRenderer {
    pub fn new(config: FeedConfig, url_builder: Arc<dyn ProductUrlBuilder>) -> Self {
        let env = RenderEnv {
            strategies: Strategies::from_config(&config),
            registry: FieldRegistry::standard(),
            base_condition: config.base_condition.clone(),
            url_builder,
            money: Arc::new(CurrencyQualified),
        };
        Self {
            engine: SchemaEngine::new(config.namespace_prefix.clone()),
            schema: FieldSchema::product_feed(),
            env,
            config,
        }
    }

    pub fn with_strategies(mut self, strategies: Strategies) -> Self {
        self.env.strategies = strategies;
        self
    }

    pub fn with_money_formatter(mut self, money: Arc<dyn MoneyFormatter>) -> Self {
        self.env.money = money;
        self
    }

    pub fn with_registry(mut self, registry: FieldRegistry) -> Self {
        self.env.registry = registry;
        self
    }

    pub fn with_schema(mut self, schema: FieldSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// The base schema extended with this product's optional properties and,
    /// when obtainable, the sale price pair.
    pub fn entry_schema(&self, entry: &RenderEntry<'_>) -> FieldSchema {
        let product = entry.product();
        let mut schema = self.schema.clone();

        for name in OPTIONAL_PROPERTIES {
            if product.has_property(name) {
                schema.push_leaf(name);
            }
        }

        let sale = &self.env.strategies.sale;
        let overrides = entry.overrides();
        let sale_obtainable = sale.is_present(product)
            || ((overrides.contains(SALE_FIELDS[0]) || sale.price(product).is_some())
                && (overrides.contains(SALE_FIELDS[1]) || sale.effective_date(product).is_some()));
        if sale_obtainable {
            for field in SALE_FIELDS {
                schema.push_leaf(field);
            }
        }

        schema
    }

    /// Validate then render one product.
    pub fn try_render_entry(&self, product: &ProductSnapshot) -> Result<FeedItem, MissingMandatoryField> {
        let mut entry = RenderEntry::new(product, &self.env);
        let schema = self.entry_schema(&entry);

        #[cfg(feature = "test-hooks")]
        VALIDATION_PASS_COUNT.fetch_add(1, Ordering::SeqCst);

        self.engine.validate(&mut entry, &schema)?;
        let fields = self.engine.render(&mut entry, &schema)?;

        debug!(sku = %product.sku, fields = fields.len(), overrides = entry.overrides().len(), "rendered feed entry");
        Ok(FeedItem { sku: product.sku.clone(), fields })
    }

    /// Render one product, or log why it was skipped.
    pub fn render_entry(&self, product: &ProductSnapshot) -> Option<FeedItem> {
        match self.try_render_entry(product) {
            Ok(item) => Some(item),
            Err(missing) => {
                warn!(field = %missing.field, "{}", missing);
                None
            }
        }
    }

    /// Validation pass only. Nothing is logged or emitted.
    pub fn check_entry(&self, product: &ProductSnapshot) -> Result<(), MissingMandatoryField> {
        let mut entry = RenderEntry::new(product, &self.env);
        let schema = self.entry_schema(&entry);
        self.engine.validate(&mut entry, &schema)
    }

    pub fn check_catalog(&self, products: &[ProductSnapshot]) -> Vec<EntryCheck> {
        products
            .par_iter()
            .map(|product| EntryCheck::from_result(product, self.check_entry(product)))
            .collect()
    }

    /// Render a catalog on the worker pool. Items keep catalog order.
    pub fn render_catalog(&self, products: &[ProductSnapshot]) -> FeedDocument {
        let rendered: Vec<Option<FeedItem>> = products
            .par_iter()
            .map(|product| self.render_entry(product))
            .collect();
        self.collect(rendered)
    }

    /// Render products one at a time as the source yields them.
    pub fn render_stream<I>(&self, products: I) -> FeedDocument
    where
        I: IntoIterator,
        I::Item: Borrow<ProductSnapshot>,
    {
        let rendered = products
            .into_iter()
            .map(|product| self.render_entry(product.borrow()));
        self.collect(rendered)
    }

    fn collect(&self, rendered: impl IntoIterator<Item = Option<FeedItem>>) -> FeedDocument {
        let mut document = FeedDocument::new(&self.config);
        let mut skipped = 0usize;
        for item in rendered {
            match item {
                Some(item) => document.push(item),
                None => skipped += 1,
            }
        }
        info!(rendered = document.len(), skipped, "feed generated");
        document
    }
}
