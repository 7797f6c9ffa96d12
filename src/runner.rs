//! Category runs and batch orchestration.
//!
//! Every category gets its own browser session and collection state; a
//! failing category is logged and skipped so the rest of the batch still
//! runs.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::browser::{BrowserSession, ChromePage};
use crate::config::{Category, HarvestSettings, ItemSelectors, Settings};
use crate::harvest::{
    CollectionLoop, Harvest, ItemExtractor, Outcome, PageNavigator, PageScanner,
};
use crate::sink::{merge_category_files, JsonFileSink, MergeSummary, ResultSink};

/// A rendering session a category run happens in.
///
/// Implemented by [`BrowserSession`]; the runner only needs to open one
/// page, close it, and shut the session down.
#[async_trait]
pub trait HarvestSession: Send + Sync + Sized {
    type Page: PageNavigator + PageScanner;

    async fn open_page(
        &self,
        selectors: &ItemSelectors,
        settings: &HarvestSettings,
    ) -> Result<Self::Page>;

    async fn close_page(&self, page: Self::Page);

    async fn close(self);
}

#[async_trait]
impl HarvestSession for BrowserSession {
    type Page = ChromePage;

    async fn open_page(
        &self,
        selectors: &ItemSelectors,
        settings: &HarvestSettings,
    ) -> Result<ChromePage> {
        BrowserSession::open_page(self, selectors, settings).await
    }

    async fn close_page(&self, page: ChromePage) {
        page.close().await;
    }

    async fn close(self) {
        BrowserSession::close(self).await;
    }
}

/// Harvest one listing page into `output` with a freshly launched browser.
pub async fn harvest_page(
    settings: &Settings,
    url: &str,
    target_count: usize,
    output: &Path,
) -> Result<Harvest> {
    let session = BrowserSession::launch(settings.browser.clone()).await?;
    harvest_in(session, settings, url, target_count, output).await
}

/// Harvest one listing page inside `session`, then write `output`.
///
/// The session is closed whether the run succeeds or not, before any error
/// is returned.
pub async fn harvest_in<S: HarvestSession>(
    session: S,
    settings: &Settings,
    url: &str,
    target_count: usize,
    output: &Path,
) -> Result<Harvest> {
    let result = run_in_session(&session, settings, url, target_count).await;
    session.close().await;

    let harvest = result?;
    JsonFileSink::new(output)
        .write(&harvest.items)
        .with_context(|| format!("Failed to save results to {:?}", output))?;
    Ok(harvest)
}

async fn run_in_session<S: HarvestSession>(
    session: &S,
    settings: &Settings,
    url: &str,
    target_count: usize,
) -> Result<Harvest> {
    let page = session
        .open_page(&settings.selectors, &settings.harvest)
        .await?;

    let extractor = ItemExtractor::new(settings.selectors.clone());
    let result = CollectionLoop::new(&page, extractor, settings.harvest.clone())
        .run(url, target_count)
        .await;
    session.close_page(page).await;

    Ok(result?)
}

/// What happened to one category in a batch.
#[derive(Debug, Clone)]
pub struct CategoryReport {
    pub key: String,
    pub label: String,
    pub collected: usize,
    /// `None` when the run failed.
    pub outcome: Option<Outcome>,
    pub error: Option<String>,
}

/// Result of a batch run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub categories: Vec<CategoryReport>,
    pub merged: MergeSummary,
}

impl BatchReport {
    pub fn failed(&self) -> impl Iterator<Item = &CategoryReport> {
        self.categories.iter().filter(|c| c.error.is_some())
    }
}

/// Harvest `categories` one after another, then merge the results.
///
/// `on_done` is called after each category, e.g. to advance a progress bar.
pub async fn run_batch<F>(
    settings: &Settings,
    categories: &[Category],
    target_count: usize,
    mut on_done: F,
) -> Result<BatchReport>
where
    F: FnMut(&CategoryReport),
{
    info!(
        "Harvesting {} categories, {} items each",
        categories.len(),
        target_count
    );

    let mut reports = Vec::with_capacity(categories.len());
    for (position, category) in categories.iter().enumerate() {
        info!(
            "[{}/{}] {} ({})",
            position + 1,
            categories.len(),
            category.label,
            category.key
        );

        let output = settings.output.category_file(&category.key);
        let report = match harvest_page(settings, &category.url, target_count, &output).await {
            Ok(harvest) => {
                info!(
                    "{} ({}): {} items, {}",
                    category.label,
                    category.key,
                    harvest.items.len(),
                    harvest.outcome
                );
                CategoryReport {
                    key: category.key.clone(),
                    label: category.label.clone(),
                    collected: harvest.items.len(),
                    outcome: Some(harvest.outcome),
                    error: None,
                }
            }
            Err(e) => {
                warn!("{} ({}) failed: {:#}", category.label, category.key, e);
                CategoryReport {
                    key: category.key.clone(),
                    label: category.label.clone(),
                    collected: 0,
                    outcome: None,
                    error: Some(format!("{:#}", e)),
                }
            }
        };

        on_done(&report);
        reports.push(report);
    }

    let merged = merge_category_files(categories, &settings.output)
        .context("Failed to write merged catalog")?;

    Ok(BatchReport {
        categories: reports,
        merged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::error::{FieldError, FieldResult, HarvestError, HarvestResult};
    use crate::harvest::ItemHandle;

    type EventLog = Arc<Mutex<Vec<&'static str>>>;

    const CATEGORY_URL: &str = "https://www.musinsa.com/category/001004";

    struct LinkCard(String);

    #[async_trait]
    impl ItemHandle for LinkCard {
        async fn attribute(&self, selector: &str, _name: &str) -> FieldResult<Option<String>> {
            if selector == ItemSelectors::default().link {
                Ok(Some(self.0.clone()))
            } else {
                Err(FieldError::NotFound(selector.to_string()))
            }
        }

        async fn text(&self, selector: &str) -> FieldResult<Option<String>> {
            Err(FieldError::NotFound(selector.to_string()))
        }

        async fn texts(&self, _selector: &str) -> FieldResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    struct FakePage {
        unreachable: bool,
        links: Vec<String>,
    }

    #[async_trait]
    impl PageNavigator for FakePage {
        async fn load(&self, url: &str) -> HarvestResult<()> {
            if self.unreachable {
                return Err(HarvestError::Navigation {
                    url: url.to_string(),
                    reason: "net::ERR_CONNECTION_REFUSED".to_string(),
                });
            }
            Ok(())
        }

        async fn wait_for_marker(&self, _marker: &str) -> HarvestResult<()> {
            Ok(())
        }

        async fn scroll_position(&self) -> HarvestResult<i64> {
            Ok(0)
        }

        async fn page_height(&self) -> HarvestResult<i64> {
            Ok(0)
        }

        async fn scroll_to(&self, _position: i64) -> HarvestResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl PageScanner for FakePage {
        type Handle = LinkCard;

        async fn current_items(&self) -> HarvestResult<Vec<LinkCard>> {
            Ok(self.links.iter().cloned().map(LinkCard).collect())
        }
    }

    struct FakeSession {
        unreachable: bool,
        links: Vec<String>,
        events: EventLog,
    }

    impl FakeSession {
        fn new(unreachable: bool, links: &[&str]) -> (Self, EventLog) {
            let events = EventLog::default();
            let session = Self {
                unreachable,
                links: links.iter().map(|l| l.to_string()).collect(),
                events: events.clone(),
            };
            (session, events)
        }
    }

    #[async_trait]
    impl HarvestSession for FakeSession {
        type Page = FakePage;

        async fn open_page(
            &self,
            _selectors: &ItemSelectors,
            _settings: &HarvestSettings,
        ) -> Result<FakePage> {
            self.events.lock().unwrap().push("open_page");
            Ok(FakePage {
                unreachable: self.unreachable,
                links: self.links.clone(),
            })
        }

        async fn close_page(&self, _page: FakePage) {
            self.events.lock().unwrap().push("close_page");
        }

        async fn close(self) {
            self.events.lock().unwrap().push("close");
        }
    }

    fn settings() -> Settings {
        Settings {
            harvest: HarvestSettings {
                stall_threshold: 2,
                ..HarvestSettings::default()
            }
            .without_delays(),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_session_closed_when_navigation_fails() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("temp_hoodie.json");
        let (session, events) = FakeSession::new(true, &["https://www.musinsa.com/products/1"]);

        let err = harvest_in(session, &settings(), CATEGORY_URL, 10, &output)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<HarvestError>(),
            Some(HarvestError::Navigation { .. })
        ));
        assert_eq!(*events.lock().unwrap(), vec!["open_page", "close_page", "close"]);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_session_closed_and_output_written_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out").join("temp_hoodie.json");
        let (session, events) = FakeSession::new(
            false,
            &[
                "https://www.musinsa.com/products/1",
                "https://www.musinsa.com/products/2",
            ],
        );

        let harvest = harvest_in(session, &settings(), CATEGORY_URL, 10, &output)
            .await
            .unwrap();

        assert_eq!(harvest.outcome, Outcome::Exhausted);
        assert_eq!(harvest.items.len(), 2);
        assert_eq!(*events.lock().unwrap(), vec!["open_page", "close_page", "close"]);

        let saved: Vec<crate::models::CollectedItem> =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1].source_link, "https://www.musinsa.com/products/2");
    }
}
