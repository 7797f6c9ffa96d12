//! Field extraction for one rendered listing card.

use tracing::debug;

use super::page::ItemHandle;
use crate::config::ItemSelectors;
use crate::error::FieldResult;
use crate::models::CollectedItem;

/// Turns rendered cards into [`CollectedItem`]s.
///
/// Every field is looked up independently. A lookup that fails nulls that
/// field and nothing else.
#[derive(Debug, Clone)]
pub struct ItemExtractor {
    selectors: ItemSelectors,
}

impl ItemExtractor {
    pub fn new(selectors: ItemSelectors) -> Self {
        Self { selectors }
    }

    pub fn selectors(&self) -> &ItemSelectors {
        &self.selectors
    }

    /// Resolve the card's identity key (its product link).
    ///
    /// `None` marks the card invalid: it can be neither deduplicated nor kept.
    pub async fn identity<H: ItemHandle + ?Sized>(&self, item: &H) -> Option<String> {
        let link = item
            .attribute(&self.selectors.link, &self.selectors.link_attribute)
            .await;
        field("product_url", link).filter(|href| !href.is_empty())
    }

    /// Extract a full record, or `None` if the card has no link.
    pub async fn extract<H: ItemHandle + ?Sized>(&self, item: &H) -> Option<CollectedItem> {
        let link = self.identity(item).await?;
        Some(self.extract_fields(item, link).await)
    }

    /// Extract the remaining fields of a card whose link is already known.
    pub async fn extract_fields<H: ItemHandle + ?Sized>(
        &self,
        item: &H,
        source_link: String,
    ) -> CollectedItem {
        let s = &self.selectors;

        let brand = field("brand_name", item.text(&s.brand).await);
        let title = field("product_name", item.text(&s.title).await);
        let price = field("price", item.texts(&s.price).await.map(|f| resolve_price(&f)));
        let image_url = field("image_url", item.attribute(&s.image, &s.image_attribute).await)
            .map(|src| normalize_image_url(&src));

        CollectedItem {
            brand,
            title,
            price,
            image_url,
            source_link,
        }
    }
}

/// Fold one lookup into an optional field value.
fn field(name: &str, lookup: FieldResult<Option<String>>) -> Option<String> {
    match lookup {
        Ok(value) => value,
        Err(e) => {
            debug!("Field {} unavailable: {}", name, e);
            None
        }
    }
}

/// Pick the displayed price out of the card's price fragments.
///
/// Discounted cards render the rate first and the price second
/// (`["-10%", "9,900원"]`); undiscounted cards render only the price.
pub fn resolve_price(fragments: &[String]) -> Option<String> {
    match fragments {
        [] => None,
        [only] => Some(only.clone()),
        [_, price, ..] => Some(price.clone()),
    }
}

/// Strip the query string (resize and cache-busting parameters).
pub fn normalize_image_url(src: &str) -> String {
    match src.split_once('?') {
        Some((base, _)) => base.to_string(),
        None => src.to_string(),
    }
}
