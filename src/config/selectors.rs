//! CSS selectors describing one listing card.

use serde::{Deserialize, Serialize};

/// Selectors used to find listing cards and read their fields.
///
/// Field selectors are evaluated relative to one card. The defaults match
/// the category listing markup (generated class names, so expect to update
/// them when the site redeploys).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemSelectors {
    /// One listing card.
    pub item: String,
    /// Present once the first batch of cards has rendered.
    pub ready_marker: String,
    /// Product link; its `link_attribute` is the item identity.
    pub link: String,
    pub link_attribute: String,
    pub brand: String,
    pub title: String,
    /// Price fragments (discount rate, then price).
    pub price: String,
    pub image: String,
    pub image_attribute: String,
}

impl Default for ItemSelectors {
    fn default() -> Self {
        Self {
            item: "div.sc-hdBJTi.gAWtWT".to_string(),
            ready_marker: ".sc-hdBJTi".to_string(),
            link: "a.sc-cOpnSz.keqfmf".to_string(),
            link_attribute: "href".to_string(),
            brand: "span.text-etc_11px_semibold.sc-hwkwBN.sc-kNOymR".to_string(),
            title: "span.text-body_13px_reg.sc-hwkwBN.sc-dYwGCk".to_string(),
            price: "span.text-body_13px_semi.sc-jJLAfE.gsJKfg.font-pretendard".to_string(),
            image: "img.max-w-full.w-full.absolute".to_string(),
            image_attribute: "src".to_string(),
        }
    }
}
