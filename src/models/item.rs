//! Harvested listing record.

use serde::{Deserialize, Serialize};

/// One product listing collected from a rendered page.
///
/// The product link is the record's identity: two listings with the same
/// link are the same product, whichever scan rendered them. Serialized field
/// names follow the persisted catalog format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedItem {
    #[serde(rename = "brand_name")]
    pub brand: Option<String>,
    #[serde(rename = "product_name")]
    pub title: Option<String>,
    pub price: Option<String>,
    pub image_url: Option<String>,
    #[serde(rename = "product_url")]
    pub source_link: String,
}

impl CollectedItem {
    /// Create an item with only its link resolved.
    pub fn new(source_link: impl Into<String>) -> Self {
        Self {
            brand: None,
            title: None,
            price: None,
            image_url: None,
            source_link: source_link.into(),
        }
    }

    /// Deduplication key (the absolute product link).
    pub fn identity_key(&self) -> &str {
        &self.source_link
    }

    /// Short `brand - title` label for progress logs.
    pub fn label(&self) -> String {
        let brand = self.brand.as_deref().unwrap_or("N/A");
        let title: String = self
            .title
            .as_deref()
            .unwrap_or("N/A")
            .chars()
            .take(40)
            .collect();
        format!("{} - {}", brand, title)
    }
}
