//! Field Registry - Default Computations by Field Key
//!
//! Maps each scoped field key to the computation used when no override
//! exists. Optional product properties map to a plain property lookup.

use std::collections::HashMap;

use crate::product::ProductSnapshot;
use crate::resolver::{MissingMandatoryField, RenderEntry};
use crate::schema::OPTIONAL_PROPERTIES;
use crate::value::FieldValue;

pub type DefaultFn = fn(&mut RenderEntry<'_>) -> Result<Option<FieldValue>, MissingMandatoryField>;

#[derive(Clone)]
pub enum FieldDefault {
    Computed(DefaultFn),
    /// Value of the named product property.
    Property(String),
}

impl FieldDefault {
    pub fn compute(&self, entry: &mut RenderEntry<'_>) -> Result<Option<FieldValue>, MissingMandatoryField> {
        match self {
            Self::Computed(compute) => compute(entry),
            Self::Property(name) => Ok(entry.product().property(name).map(FieldValue::text)),
        }
    }
}

#[derive(Clone, Default)]
pub struct FieldRegistry {
    defaults: HashMap<String, FieldDefault>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every base, sale and optional-property field of the merchant feed.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("id", id);
        registry.register("title", title);
        registry.register("description", description);
        registry.register("image_link", image_link);
        registry.register("price", price);
        registry.register("availability", availability);
        registry.register("identifier_exists", identifier_exists);
        registry.register("link", link);
        registry.register("condition", condition);
        registry.register("shipping_price", shipping_price);
        registry.register("tax_rate", tax_rate);
        registry.register("sale_price", sale_price);
        registry.register("sale_price_effective_date", sale_price_effective_date);
        for name in OPTIONAL_PROPERTIES {
            registry.register_property(name);
        }
        registry
    }

    pub fn register(&mut self, key: impl Into<String>, compute: DefaultFn) {
        self.defaults.insert(key.into(), FieldDefault::Computed(compute));
    }

    pub fn register_property(&mut self, name: &str) {
        self.defaults
            .insert(name.to_string(), FieldDefault::Property(name.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&FieldDefault> {
        self.defaults.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.defaults.contains_key(key)
    }
}

type Computed = Result<Option<FieldValue>, MissingMandatoryField>;

fn non_blank(value: &str) -> Option<FieldValue> {
    (!value.trim().is_empty()).then(|| FieldValue::text(value))
}

fn id(entry: &mut RenderEntry<'_>) -> Computed {
    Ok(non_blank(&entry.product().sku))
}

fn title(entry: &mut RenderEntry<'_>) -> Computed {
    Ok(non_blank(&entry.product().name))
}

fn description(entry: &mut RenderEntry<'_>) -> Computed {
    Ok(non_blank(&entry.product().description))
}

/// Product images first, then variant images.
fn image_link(entry: &mut RenderEntry<'_>) -> Computed {
    let product = entry.product();
    let images = if product.images.is_empty() { &product.variant_images } else { &product.images };
    Ok(images.first().and_then(|url| non_blank(url)))
}

fn price(entry: &mut RenderEntry<'_>) -> Computed {
    let product = entry.product();
    Ok(product.price.map(|amount| FieldValue::money(amount, product.currency.as_str())))
}

fn availability(entry: &mut RenderEntry<'_>) -> Computed {
    let availability = entry.env().strategies.availability.availability(entry.product());
    Ok(Some(FieldValue::text(availability.to_string())))
}

/// `yes` when a brand and either a GTIN or an MPN are present.
fn identifier_exists(entry: &mut RenderEntry<'_>) -> Computed {
    let product: &ProductSnapshot = entry.product();
    let exists = product.has_property("brand")
        && (product.has_property("gtin") || product.has_property("mpn"));
    Ok(Some(FieldValue::YesNo(exists)))
}

fn link(entry: &mut RenderEntry<'_>) -> Computed {
    let url = entry.env().url_builder.build_product_url(entry.product());
    Ok(url.as_deref().and_then(non_blank))
}

fn condition(entry: &mut RenderEntry<'_>) -> Computed {
    let env = entry.env();
    let condition = env.strategies.condition.condition_or(entry.product(), &env.base_condition);
    Ok(non_blank(&condition))
}

fn shipping_price(entry: &mut RenderEntry<'_>) -> Computed {
    let product = entry.product();
    let amount = entry.env().strategies.shipping_price.shipping_price(product);
    Ok(amount.map(|amount| FieldValue::money(amount, product.currency.as_str())))
}

fn tax_rate(entry: &mut RenderEntry<'_>) -> Computed {
    let rate = entry.env().strategies.tax_rate.tax_rate(entry.product());
    Ok(rate.map(FieldValue::Percent))
}

fn sale_price(entry: &mut RenderEntry<'_>) -> Computed {
    let product = entry.product();
    let amount = entry.env().strategies.sale.price(product);
    Ok(amount.map(|amount| FieldValue::money(amount, product.currency.as_str())))
}

fn sale_price_effective_date(entry: &mut RenderEntry<'_>) -> Computed {
    let date = entry.env().strategies.sale.effective_date(entry.product());
    Ok(date.as_deref().and_then(non_blank))
}
