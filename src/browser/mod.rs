//! Chrome DevTools session backing the harvest loop.
//!
//! Uses chromiumoxide (CDP) to render listing pages the way a desktop
//! browser would, either by launching a local Chrome/Chromium or by
//! attaching to a remote DevTools endpoint.

mod page;
mod stealth;

pub use page::{ChromeItem, ChromePage};

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::handler::HandlerConfig;
use chromiumoxide::{Browser, BrowserConfig as CdpBrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{BrowserConfig, HarvestSettings, ItemSelectors};

/// Executable names searched for on `$PATH`.
const CHROME_COMMANDS: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

/// One browser owned by one category run.
pub struct BrowserSession {
    config: BrowserConfig,
    browser: Browser,
    handler: JoinHandle<()>,
    remote: bool,
}

impl BrowserSession {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/opt/google/chrome/google-chrome",
    ];

    /// Launch a local browser, or attach to `remote_url` when configured.
    pub async fn launch(config: BrowserConfig) -> Result<Self> {
        if let Some(remote_url) = config.remote_url.clone() {
            return Self::connect_remote(config, &remote_url).await;
        }

        info!("Launching browser (headless={})", config.headless);
        let chrome_path = Self::find_chrome()?;

        let mut builder = CdpBrowserConfig::builder()
            .chrome_executable(chrome_path)
            .request_timeout(Duration::from_secs(config.timeout));

        // with_head means NOT headless
        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--disable-gpu");

        for arg in &config.chrome_args {
            builder = builder.arg(arg);
        }

        let cdp_config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, handler) = Browser::launch(cdp_config)
            .await
            .context("Failed to launch browser")?;

        Ok(Self {
            config,
            browser,
            handler: spawn_handler(handler),
            remote: false,
        })
    }

    /// Find a Chrome executable in well-known locations, then on `$PATH`.
    fn find_chrome() -> Result<PathBuf> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                debug!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in CHROME_COMMANDS {
            if let Ok(path) = which::which(cmd) {
                debug!("Found Chrome in PATH: {:?}", path);
                return Ok(path);
            }
        }

        Err(anyhow::anyhow!(
            "Chrome/Chromium not found. Install it or set BROWSER_URL to a remote DevTools endpoint"
        ))
    }

    /// Attach to a remote Chrome instance.
    async fn connect_remote(config: BrowserConfig, url: &str) -> Result<Self> {
        info!("Connecting to remote browser at {}", url);

        // The WebSocket URL comes from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .timeout(Duration::from_secs(config.timeout))
            .send()
            .await
            .context("Failed to connect to remote browser")?
            .json()
            .await
            .context("Failed to parse browser version info")?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("No webSocketDebuggerUrl in response"))?;

        debug!("Connecting to WebSocket: {}", ws_url);

        let handler_config = HandlerConfig {
            request_timeout: Duration::from_secs(config.timeout),
            ..Default::default()
        };

        let (browser, handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .context("Failed to connect to remote browser")?;

        Ok(Self {
            config,
            browser,
            handler: spawn_handler(handler),
            remote: true,
        })
    }

    /// Open a blank tab prepared for harvesting.
    pub async fn open_page(
        &self,
        selectors: &ItemSelectors,
        settings: &HarvestSettings,
    ) -> Result<ChromePage> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open tab")?;

        page.execute(SetUserAgentOverrideParams::new(self.config.user_agent.clone()))
            .await
            .context("Failed to set user agent")?;

        Ok(ChromePage::new(
            page,
            selectors.item.clone(),
            settings.marker_timeout(),
            self.config.stealth,
        ))
    }

    /// Shut the session down.
    ///
    /// A launched browser is closed; a remote one is only detached from.
    pub async fn close(mut self) {
        if !self.remote {
            if let Err(e) = self.browser.close().await {
                warn!("Failed to close browser: {}", e);
            }
            if let Err(e) = self.browser.wait().await {
                debug!("Browser process wait failed: {}", e);
            }
        }
        self.handler.abort();
    }
}

fn spawn_handler(mut handler: chromiumoxide::handler::Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    })
}
