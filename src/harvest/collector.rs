//! The scan/extract/evaluate/scroll loop.
//!
//! One run walks `SCANNING -> EXTRACTING -> EVALUATING` and then either
//! scans again (new items arrived), scrolls and scans again (nothing new),
//! or stops. It stops with [`Outcome::ReachedTarget`] once the target count
//! is collected, or with [`Outcome::Exhausted`] after `stall_threshold`
//! consecutive scans that found nothing new. Settle delays are awaited in
//! full before the next step; there is no concurrency inside a run.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use super::extract::ItemExtractor;
use super::page::{PageNavigator, PageScanner};
use super::state::{CollectionState, Outcome, Transition};
use crate::config::HarvestSettings;
use crate::error::HarvestResult;
use crate::models::CollectedItem;

/// Counters describing how a run went.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HarvestStats {
    /// Scan cycles performed.
    pub scans: u32,
    /// Scroll attempts performed.
    pub scrolls: u32,
    /// Cards skipped because they had no usable link.
    pub invalid_items: u32,
    /// Furthest scroll target requested.
    pub scroll_position: i64,
}

/// Result of a run that did not fault.
#[derive(Debug, Clone)]
pub struct Harvest {
    /// Unique items in first-seen order.
    pub items: Vec<CollectedItem>,
    pub outcome: Outcome,
    pub stats: HarvestStats,
}

/// Drives one page to completion.
///
/// Borrows the page: whoever opened the session closes it, on success and
/// on failure alike.
pub struct CollectionLoop<'a, P> {
    page: &'a P,
    extractor: ItemExtractor,
    settings: HarvestSettings,
}

impl<'a, P> CollectionLoop<'a, P>
where
    P: PageNavigator + PageScanner,
{
    pub fn new(page: &'a P, extractor: ItemExtractor, settings: HarvestSettings) -> Self {
        Self {
            page,
            extractor,
            settings,
        }
    }

    /// Load `target_url`, wait for the first render, then collect up to
    /// `target_count` items.
    pub async fn run(&self, target_url: &str, target_count: usize) -> HarvestResult<Harvest> {
        info!("Loading {}", target_url);
        self.page.load(target_url).await?;
        self.page
            .wait_for_marker(&self.extractor.selectors().ready_marker)
            .await?;
        settle(self.settings.initial_settle()).await;

        self.collect(target_count).await
    }

    /// Collect from the already loaded page.
    pub async fn collect(&self, target_count: usize) -> HarvestResult<Harvest> {
        let mut state = CollectionState::new(target_count, self.settings.stall_threshold);
        let mut stats = HarvestStats::default();

        info!("Collecting up to {} items", target_count);

        let outcome = loop {
            if state.target_reached() {
                break Outcome::ReachedTarget;
            }

            settle(self.settings.scan_settle()).await;
            let handles = self.page.current_items().await?;
            stats.scans += 1;
            debug!("Scan {}: {} cards rendered", stats.scans, handles.len());

            let mut new_items = 0;
            for handle in &handles {
                if state.target_reached() {
                    break;
                }

                let Some(key) = self.extractor.identity(handle).await else {
                    stats.invalid_items += 1;
                    continue;
                };
                if !state.is_new(&key) {
                    continue;
                }

                let item = self.extractor.extract_fields(handle, key).await;
                let label = item.label();
                if state.accept(item) {
                    new_items += 1;
                    if state.len() % 10 == 0 {
                        info!("[{}/{}] {}", state.len(), target_count, label);
                    }
                }
            }

            match state.evaluate(new_items) {
                Transition::Rescan => {
                    info!(
                        "Scan {}: {} rendered, {} new, {} total",
                        stats.scans,
                        handles.len(),
                        new_items,
                        state.len()
                    );
                }
                Transition::Scroll => {
                    debug!(
                        "No new items ({} consecutive), {}/{} collected",
                        state.stall_count(),
                        state.len(),
                        target_count
                    );
                    self.scroll(&mut state).await?;
                    stats.scrolls += 1;
                }
                Transition::Done(outcome) => break outcome,
            }
        };

        match outcome {
            Outcome::ReachedTarget => info!("Reached target of {} items", target_count),
            Outcome::Exhausted => info!(
                "No new items after {} consecutive scans, stopping at {} items",
                state.stall_count(),
                state.len()
            ),
        }

        stats.scroll_position = state.scroll_position();
        Ok(Harvest {
            items: state.into_items(),
            outcome,
            stats,
        })
    }

    async fn scroll(&self, state: &mut CollectionState) -> HarvestResult<()> {
        let current = self.page.scroll_position().await?;
        let height = self.page.page_height().await?;
        let target = current + self.settings.scroll_increment;

        debug!(
            "Scrolling {}px -> {}px (page height {}px)",
            current, target, height
        );
        self.page.scroll_to(target).await?;
        state.advance_scroll(target);

        settle(self.settings.scroll_settle()).await;
        Ok(())
    }
}

async fn settle(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
