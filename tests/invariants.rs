//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable feed guarantees.

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

use productfeed_core::{
    config::SaleStrategyKind,
    product::{ShippingCategory, ShippingMethod, ShippingRate, StockItem, TaxCategory, TaxRateRecord},
    strategies::{Availability, AvailabilityStrategy},
    FeedConfig, FeedRenderer, FieldSchema, ProductSnapshot, SlugUrlBuilder, Strategies,
};

fn create_product(sku: &str) -> ProductSnapshot {
    ProductSnapshot {
        sku: sku.to_string(),
        name: "2 Hams".to_string(),
        description: "As seen on TV!".to_string(),
        slug: sku.to_lowercase(),
        price: Some(Decimal::new(2000, 2)),
        currency: "USD".to_string(),
        stock_items: vec![StockItem { count_on_hand: 4, backorderable: false }],
        images: vec![format!("https://cdn.example.com/{}-large.jpg", sku)],
        shipping_category: Some(ShippingCategory {
            name: "default".to_string(),
            methods: vec![
                ShippingMethod {
                    name: "ground".to_string(),
                    rates: vec![ShippingRate { cost: Decimal::new(111, 1) }],
                },
                ShippingMethod {
                    name: "free".to_string(),
                    rates: vec![ShippingRate { cost: Decimal::ZERO }],
                },
            ],
        }),
        tax_category: Some(TaxCategory {
            name: "default".to_string(),
            rates: vec![TaxRateRecord { id: 1, name: "VAT".to_string(), amount: Decimal::new(5, 2) }],
        }),
        master_variant_id: 1,
        ..Default::default()
    }
}

fn create_config() -> FeedConfig {
    let mut config = FeedConfig::default();
    config.channel.title = "Ham Store".to_string();
    config.channel.link = "https://shop.example.com".to_string();
    config
}

fn create_renderer() -> FeedRenderer {
    let config = create_config();
    let url_builder = Arc::new(SlugUrlBuilder::new(config.channel.link.clone()));
    FeedRenderer::new(config, url_builder)
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap().lines().map(str::to_string).collect()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn invariant_missing_field_drops_entry_and_logs_once() {
    let renderer = create_renderer();
    let mut broken = create_product("HAM-2");
    broken.description = String::new();
    let products = vec![create_product("HAM-1"), broken, create_product("HAM-3")];

    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let document = tracing::subscriber::with_default(subscriber, || renderer.render_stream(&products));

    let skus: Vec<_> = document.items().iter().map(|item| item.sku.as_str()).collect();
    assert_eq!(skus, vec!["HAM-1", "HAM-3"]);

    let warnings: Vec<_> = logs
        .lines()
        .into_iter()
        .filter(|line| line.contains("Missing mandatory"))
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("description"));
    assert!(warnings[0].contains("HAM-2"));
}

#[test]
fn invariant_schema_order_is_emitted_order() {
    let renderer = create_renderer();
    let item = renderer.try_render_entry(&create_product("HAM-1")).unwrap();

    assert_eq!(
        item.tags(),
        vec![
            "g:id", "g:title", "g:description", "g:image_link", "g:price", "g:availability",
            "g:identifier_exists", "g:link", "g:condition", "g:shipping", "g:tax",
        ]
    );
    assert_eq!(item.value(&["g:shipping", "g:price"]), Some("0.00 USD"));
    assert_eq!(item.value(&["g:tax", "g:rate"]), Some("5"));
    assert_eq!(item.value(&["g:price"]), Some("20.00 USD"));
    assert_eq!(item.value(&["g:availability"]), Some("in stock"));
    assert_eq!(item.value(&["g:condition"]), Some("new"));
    assert_eq!(item.value(&["g:identifier_exists"]), Some("no"));
    assert_eq!(item.value(&["g:link"]), Some("https://shop.example.com/products/ham-1"));
}

#[test]
fn invariant_price_override_wins() {
    let renderer = create_renderer();
    let mut product = create_product("HAM-1");
    product.properties.insert("price_for_feed", "9.99");

    let item = renderer.try_render_entry(&product).unwrap();
    assert_eq!(item.value(&["g:price"]), Some("9.99"));
    assert_eq!(item.value(&["g:shipping", "g:price"]), Some("0.00 USD"));
}

#[test]
fn invariant_scoped_override_only_touches_group_field() {
    let renderer = create_renderer();
    let mut product = create_product("HAM-1");
    product.properties.insert("shipping_price_for_feed", "4.95 USD");

    let item = renderer.try_render_entry(&product).unwrap();
    assert_eq!(item.value(&["g:price"]), Some("20.00 USD"));
    assert_eq!(item.value(&["g:shipping", "g:price"]), Some("4.95 USD"));
}

#[test]
fn invariant_override_rescues_missing_field() {
    let renderer = create_renderer();
    let mut product = create_product("HAM-1");
    product.description = String::new();
    product.properties.insert("description_for_feed", "Smoked, twice.");

    let item = renderer.try_render_entry(&product).unwrap();
    assert_eq!(item.value(&["g:description"]), Some("Smoked, twice."));
}

#[test]
fn invariant_missing_group_field_drops_entry() {
    let renderer = create_renderer();
    let mut product = create_product("HAM-1");
    product.tax_category = None;

    let err = renderer.try_render_entry(&product).unwrap_err();
    assert_eq!(err.field, "tax_rate");
    assert!(renderer.render_entry(&product).is_none());
}

#[test]
fn invariant_catalog_order_preserved_in_parallel() {
    let renderer = create_renderer();
    let products: Vec<_> = (0..64)
        .map(|i| {
            let mut product = create_product(&format!("SKU-{:03}", i));
            if i % 5 == 0 {
                product.images.clear();
            }
            product
        })
        .collect();

    let document = renderer.render_catalog(&products);
    let expected: Vec<_> = (0..64)
        .filter(|i| i % 5 != 0)
        .map(|i| format!("SKU-{:03}", i))
        .collect();
    let skus: Vec<_> = document.items().iter().map(|item| item.sku.clone()).collect();
    assert_eq!(skus, expected);
}

#[test]
fn invariant_optional_properties_follow_base_schema() {
    let renderer = create_renderer();
    let mut product = create_product("HAM-1");
    product.properties.insert("Color", "pink");
    product.properties.insert("brand", "Acme");
    product.properties.insert("gtin", "00012345600012");
    product.properties.insert("internal_note", "not a feed field");

    let item = renderer.try_render_entry(&product).unwrap();
    let tags = item.tags();
    assert_eq!(&tags[11..], &["g:brand", "g:gtin", "g:color"]);
    assert_eq!(item.value(&["g:identifier_exists"]), Some("yes"));
    assert_eq!(item.value(&["g:color"]), Some("pink"));
}

#[test]
fn invariant_sale_fields_only_when_present() {
    let mut config = create_config();
    config.sale_strategy = SaleStrategyKind::Property;
    let url_builder = Arc::new(SlugUrlBuilder::new(config.channel.link.clone()));
    let renderer = FeedRenderer::new(config, url_builder);

    let mut product = create_product("HAM-1");
    product.properties.insert("sale_price", "15");
    let item = renderer.try_render_entry(&product).unwrap();
    assert!(!item.tags().contains(&"g:sale_price"));

    product.properties.insert("sale_price_effective_date", "2024-01-01/2024-02-01");
    let item = renderer.try_render_entry(&product).unwrap();
    assert_eq!(item.value(&["g:sale_price"]), Some("15.00 USD"));
    assert_eq!(item.value(&["g:sale_price_effective_date"]), Some("2024-01-01/2024-02-01"));
}

#[test]
fn invariant_sale_overrides_add_sale_fields() {
    let renderer = create_renderer();
    let mut product = create_product("HAM-1");
    product.properties.insert("sale_price_for_feed", "12.00 USD");
    product.properties.insert("sale_price_effective_date_for_feed", "2024-01-01/2024-02-01");

    let item = renderer.try_render_entry(&product).unwrap();
    assert_eq!(item.value(&["g:sale_price"]), Some("12.00 USD"));
}

struct CountingAvailability(Arc<AtomicUsize>);

impl AvailabilityStrategy for CountingAvailability {
    fn availability(&self, _product: &ProductSnapshot) -> Availability {
        self.0.fetch_add(1, Ordering::SeqCst);
        Availability::OutOfStock
    }
}

#[test]
fn invariant_fields_resolved_once_per_entry() {
    let calls = Arc::new(AtomicUsize::new(0));
    let renderer = create_renderer()
        .with_strategies(Strategies::default().with_availability(CountingAvailability(calls.clone())));

    let item = renderer.try_render_entry(&create_product("HAM-1")).unwrap();
    assert_eq!(item.value(&["g:availability"]), Some("out of stock"));
    // validate + render, one computation
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn invariant_check_entry_emits_nothing() {
    let renderer = create_renderer();
    let mut broken = create_product("HAM-2");
    broken.images.clear();
    let products = vec![create_product("HAM-1"), broken];

    let checks = renderer.check_catalog(&products);
    assert!(checks[0].valid);
    assert!(!checks[1].valid);
    assert_eq!(checks[1].missing_field.as_deref(), Some("image_link"));
}

#[test]
fn invariant_rss_document_contains_rendered_items() {
    let renderer = create_renderer();
    let document = renderer.render_catalog(&[create_product("HAM-1")]);
    let xml = document.to_rss().unwrap();

    assert!(xml.contains("<title>Ham Store</title>"));
    assert!(xml.contains("<item>"));
    assert!(xml.contains("<g:id>HAM-1</g:id>"));
    assert!(xml.find("<g:id>").unwrap() < xml.find("<g:title>2 Hams</g:title>").unwrap());
}

#[test]
fn invariant_catalog_and_config_load_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("catalog.json");
    let config_path = dir.path().join("feed.toml");

    let products = vec![create_product("HAM-1"), create_product("HAM-2")];
    std::fs::write(&catalog_path, serde_json::to_string(&products).unwrap()).unwrap();
    std::fs::write(
        &config_path,
        "base_condition = \"used\"\n[channel]\nlink = \"https://shop.example.com\"\n",
    )
    .unwrap();

    let config = FeedConfig::load(&config_path).unwrap();
    let url_builder = Arc::new(SlugUrlBuilder::new(config.channel.link.clone()));
    let renderer = FeedRenderer::new(config, url_builder);
    let loaded = productfeed_core::load_catalog(&catalog_path).unwrap();
    let document = renderer.render_catalog(&loaded);

    assert_eq!(document.len(), 2);
    assert_eq!(document.items()[1].value(&["g:condition"]), Some("used"));
}

#[test]
fn invariant_entry_schema_is_per_product() {
    let renderer = create_renderer();
    let mut branded = create_product("HAM-1");
    branded.properties.insert("brand", "Acme");

    let item = renderer.try_render_entry(&branded).unwrap();
    assert!(item.tags().contains(&"g:brand"));
    let item = renderer.try_render_entry(&create_product("HAM-2")).unwrap();
    assert!(!item.tags().contains(&"g:brand"));
    assert_eq!(renderer.schema(), &FieldSchema::product_feed());
}

#[cfg(feature = "test-hooks")]
#[test]
fn invariant_every_entry_is_validated() {
    productfeed_core::renderer::reset_validation_pass_count();
    let renderer = create_renderer();
    renderer.render_stream(vec![create_product("HAM-1"), create_product("HAM-2")]);
    assert!(productfeed_core::renderer::get_validation_pass_count() >= 2);
}
