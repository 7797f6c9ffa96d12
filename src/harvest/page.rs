//! Seams between the collection loop and the rendering collaborator.
//!
//! The loop never touches a browser directly. It drives anything that can
//! navigate and scroll ([`PageNavigator`]), report the cards currently
//! mounted in the document ([`PageScanner`]), and answer field lookups on
//! one card ([`ItemHandle`]). The Chrome session in `crate::browser`
//! implements all three; tests use scripted in-memory pages.

use async_trait::async_trait;

use crate::error::{FieldResult, HarvestResult};

/// Scroll and navigation control over one rendered document.
#[async_trait]
pub trait PageNavigator: Send + Sync {
    /// Navigate to `url`.
    async fn load(&self, url: &str) -> HarvestResult<()>;

    /// Wait until an element matching `marker` is present.
    async fn wait_for_marker(&self, marker: &str) -> HarvestResult<()>;

    /// Current vertical scroll offset.
    async fn scroll_position(&self) -> HarvestResult<i64>;

    /// Total scrollable height of the document.
    async fn page_height(&self) -> HarvestResult<i64>;

    /// Scroll so the viewport top sits at `position`.
    async fn scroll_to(&self, position: i64) -> HarvestResult<()>;
}

/// Snapshot of the listing cards currently mounted in the document.
///
/// Every call re-queries the live render state. Cards from earlier scans
/// usually stay mounted, so the same item shows up again and again.
#[async_trait]
pub trait PageScanner: Send + Sync {
    type Handle: ItemHandle;

    /// Cards in document order.
    async fn current_items(&self) -> HarvestResult<Vec<Self::Handle>>;
}

/// Field lookups relative to one rendered listing card.
///
/// `attribute` and `text` fail with [`FieldError::NotFound`] when nothing
/// matches the selector; `texts` returns an empty list instead.
///
/// [`FieldError::NotFound`]: crate::error::FieldError::NotFound
#[async_trait]
pub trait ItemHandle: Send + Sync {
    /// Value of `name` on the first element matching `selector`.
    async fn attribute(&self, selector: &str, name: &str) -> FieldResult<Option<String>>;

    /// Rendered text of the first element matching `selector`.
    async fn text(&self, selector: &str) -> FieldResult<Option<String>>;

    /// Rendered text of every element matching `selector`, in order.
    async fn texts(&self, selector: &str) -> FieldResult<Vec<String>>;
}
