//! listharvest - harvest product listings from infinite-scroll pages.
//!
//! The [`harvest`] module holds the collection loop and its policy; it only
//! talks to the page through traits. [`browser`] provides the Chrome-backed
//! implementation, [`sink`] persists results, and [`runner`] ties them
//! together per category.

pub mod config;
pub mod error;
pub mod harvest;
pub mod models;
pub mod sink;

#[cfg(feature = "browser")]
pub mod browser;
#[cfg(feature = "browser")]
pub mod runner;

pub use error::{FieldError, HarvestError};
pub use harvest::{CollectionLoop, Harvest, ItemExtractor, Outcome};
pub use models::CollectedItem;
