//! Browser session configuration.
//!
//! Always compiled so config parsing works without the `browser` feature.

use serde::{Deserialize, Serialize};

/// Desktop Chrome user agent sent instead of the headless default.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Browser session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run in headless mode (default: true).
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Inject evasion scripts after navigation (default: true).
    #[serde(default = "default_stealth")]
    pub stealth: bool,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    #[serde(default)]
    pub proxy: Option<String>,

    /// CDP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to an existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            stealth: default_stealth(),
            proxy: None,
            timeout: default_timeout(),
            user_agent: default_user_agent(),
            chrome_args: Vec::new(),
            remote_url: None,
        }
    }
}

impl BrowserConfig {
    /// Apply environment variable overrides.
    ///
    /// - `BROWSER_URL` - Remote Chrome DevTools URL
    /// - `SOCKS_PROXY` - Proxy for browser traffic, if none is configured
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("BROWSER_URL") {
            if !val.trim().is_empty() {
                self.remote_url = Some(val.trim().to_string());
            }
        }

        if self.proxy.is_none() {
            if let Ok(val) = std::env::var("SOCKS_PROXY") {
                if !val.trim().is_empty() {
                    self.proxy = Some(val.trim().to_string());
                }
            }
        }

        self
    }
}

pub fn default_headless() -> bool {
    true
}

fn default_stealth() -> bool {
    true
}

pub fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
