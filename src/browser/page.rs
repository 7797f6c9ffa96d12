//! CDP-backed implementations of the harvest page traits.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use tracing::debug;

use super::stealth::STEALTH_SCRIPTS;
use crate::error::{FieldError, FieldResult, HarvestError, HarvestResult};
use crate::harvest::{ItemHandle, PageNavigator, PageScanner};

/// How often the ready marker is polled for.
const MARKER_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One browser tab showing a listing page.
pub struct ChromePage {
    page: Page,
    item_selector: String,
    marker_timeout: Duration,
    stealth: bool,
}

impl ChromePage {
    pub(crate) fn new(
        page: Page,
        item_selector: String,
        marker_timeout: Duration,
        stealth: bool,
    ) -> Self {
        Self {
            page,
            item_selector,
            marker_timeout,
            stealth,
        }
    }

    /// Close the tab.
    pub async fn close(self) {
        if let Err(e) = self.page.close().await {
            debug!("Failed to close tab: {}", e);
        }
    }

    async fn apply_stealth(&self) {
        for script in STEALTH_SCRIPTS {
            if let Err(e) = self.page.evaluate(script.to_string()).await {
                debug!("Stealth script injection skipped: {}", e);
            }
        }
    }

    async fn evaluate_number(&self, expression: &str) -> HarvestResult<i64> {
        let value: f64 = self
            .page
            .evaluate(expression.to_string())
            .await
            .map_err(session_error)?
            .into_value()
            .map_err(|e| HarvestError::Session(format!("`{}`: {}", expression, e)))?;
        Ok(value as i64)
    }
}

fn session_error(e: impl std::fmt::Display) -> HarvestError {
    HarvestError::Session(e.to_string())
}

#[async_trait]
impl PageNavigator for ChromePage {
    async fn load(&self, url: &str) -> HarvestResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| HarvestError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if self.stealth {
            self.apply_stealth().await;
        }
        Ok(())
    }

    async fn wait_for_marker(&self, marker: &str) -> HarvestResult<()> {
        let poll = async {
            loop {
                match self.page.find_element(marker).await {
                    Ok(_) => return,
                    Err(_) => tokio::time::sleep(MARKER_POLL_INTERVAL).await,
                }
            }
        };

        tokio::time::timeout(self.marker_timeout, poll)
            .await
            .map_err(|_| HarvestError::MarkerTimeout {
                marker: marker.to_string(),
                timeout: self.marker_timeout,
            })
    }

    async fn scroll_position(&self) -> HarvestResult<i64> {
        self.evaluate_number("window.pageYOffset").await
    }

    async fn page_height(&self) -> HarvestResult<i64> {
        self.evaluate_number("document.body.scrollHeight").await
    }

    async fn scroll_to(&self, position: i64) -> HarvestResult<()> {
        self.page
            .evaluate(format!("window.scrollTo(0, {});", position))
            .await
            .map_err(session_error)?;
        Ok(())
    }
}

#[async_trait]
impl PageScanner for ChromePage {
    type Handle = ChromeItem;

    async fn current_items(&self) -> HarvestResult<Vec<ChromeItem>> {
        let elements = self
            .page
            .find_elements(self.item_selector.as_str())
            .await
            .map_err(session_error)?;
        Ok(elements.into_iter().map(ChromeItem).collect())
    }
}

/// One rendered listing card.
pub struct ChromeItem(Element);

impl ChromeItem {
    async fn child(&self, selector: &str) -> FieldResult<Element> {
        self.0
            .find_element(selector)
            .await
            .map_err(|_| FieldError::NotFound(selector.to_string()))
    }
}

#[async_trait]
impl ItemHandle for ChromeItem {
    /// Reads the DOM property first so `href`/`src` come back absolute,
    /// falling back to the raw attribute.
    async fn attribute(&self, selector: &str, name: &str) -> FieldResult<Option<String>> {
        let element = self.child(selector).await?;

        let property = element
            .property(name)
            .await
            .map_err(|e| FieldError::Unreadable(e.to_string()))?;
        if let Some(serde_json::Value::String(value)) = property {
            return Ok(Some(value));
        }

        element
            .attribute(name)
            .await
            .map_err(|e| FieldError::Unreadable(e.to_string()))
    }

    async fn text(&self, selector: &str) -> FieldResult<Option<String>> {
        self.child(selector)
            .await?
            .inner_text()
            .await
            .map_err(|e| FieldError::Unreadable(e.to_string()))
    }

    async fn texts(&self, selector: &str) -> FieldResult<Vec<String>> {
        let elements = self
            .0
            .find_elements(selector)
            .await
            .map_err(|e| FieldError::Unreadable(e.to_string()))?;

        let mut texts = Vec::with_capacity(elements.len());
        for element in elements {
            let text = element
                .inner_text()
                .await
                .map_err(|e| FieldError::Unreadable(e.to_string()))?;
            texts.push(text.unwrap_or_default());
        }
        Ok(texts)
    }
}
