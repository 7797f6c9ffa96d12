//! Incremental harvesting of infinite-scroll listing pages.

mod collector;
mod dedup;
mod extract;
mod page;
mod state;

pub use collector::{CollectionLoop, Harvest, HarvestStats};
pub use dedup::DeduplicationIndex;
pub use extract::{normalize_image_url, resolve_price, ItemExtractor};
pub use page::{ItemHandle, PageNavigator, PageScanner};
pub use state::{CollectionState, Outcome, Transition};
