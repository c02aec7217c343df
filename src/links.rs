//! Product Links

use crate::product::ProductSnapshot;

/// Builds the landing-page URL for a product.
pub trait ProductUrlBuilder: Send + Sync {
    fn build_product_url(&self, product: &ProductSnapshot) -> Option<String>;
}

/// `<store>/products/<slug>`
#[derive(Debug, Clone)]
pub struct SlugUrlBuilder {
    store_url: String,
}

impl SlugUrlBuilder {
    pub fn new(store_url: impl Into<String>) -> Self {
        let store_url: String = store_url.into();
        Self { store_url: store_url.trim_end_matches('/').to_string() }
    }
}

impl ProductUrlBuilder for SlugUrlBuilder {
    fn build_product_url(&self, product: &ProductSnapshot) -> Option<String> {
        let slug = product.slug.trim();
        if slug.is_empty() || self.store_url.is_empty() {
            return None;
        }
        Some(format!("{}/products/{}", self.store_url, slug))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_url() {
        let builder = SlugUrlBuilder::new("https://shop.example.com/");
        let product = ProductSnapshot { slug: "2-hams".into(), ..Default::default() };
        assert_eq!(
            builder.build_product_url(&product).as_deref(),
            Some("https://shop.example.com/products/2-hams")
        );
    }

    #[test]
    fn test_missing_slug_has_no_url() {
        let builder = SlugUrlBuilder::new("https://shop.example.com");
        assert!(builder.build_product_url(&ProductSnapshot::default()).is_none());
    }
}
