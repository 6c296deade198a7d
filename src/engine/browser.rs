// * Headless/headed Chromium session driven over CDP
// * The collector only sees the `PageDriver` trait, so scraping logic runs
// * unchanged against a real browser tab or an in-memory fake.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::CollectorConfig;
use crate::network::identity::IdentityProfile;

const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight);";
const SCROLL_HEIGHT_JS: &str = "document.body.scrollHeight";

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Page navigation failed: {0}")]
    Navigation(String),

    #[error("Page timeout after {0}ms")]
    Timeout(u64),

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Content extraction failed: {0}")]
    ContentExtraction(String),
}

/// The page operations the collector needs
#[allow(async_fn_in_trait)]
pub trait PageDriver {
    /// Navigates the tab to `url` and waits for the load event
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError>;

    /// The currently rendered DOM serialized as HTML
    async fn markup(&mut self) -> Result<String, BrowserError>;

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError>;

    /// `document.body.scrollHeight` in CSS pixels
    async fn scroll_height(&mut self) -> Result<i64, BrowserError>;
}

/// One browser with a single working tab
pub struct BrowserSession {
    browser: Option<Browser>,
    handler: Option<tokio::task::JoinHandle<()>>,
    page: Page,
    timeout: Duration,
}

impl BrowserSession {
    /// Launches Chromium with the collector's profile directory and identity
    pub async fn launch(
        config: &CollectorConfig,
        identity: &IdentityProfile,
    ) -> Result<Self, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .viewport(None)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", identity.user_agent));

        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(dir) = &config.user_data_dir {
            builder = builder.user_data_dir(dir);
        }

        let browser_config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // * The CDP event loop must be polled for any command to complete
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler event error");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;

        info!(headless = config.headless, "Browser session launched");

        Ok(Self {
            browser: Some(browser),
            handler: Some(handle),
            page,
            timeout: config.page_timeout,
        })
    }

    /// Closes the browser gracefully
    pub async fn shutdown(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!(error = %e, "Browser did not close cleanly");
            }
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        info!("Browser session shut down");
    }
}

impl PageDriver for BrowserSession {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        match tokio::time::timeout(self.timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::Navigation(e.to_string())),
            Err(_) => Err(BrowserError::Timeout(self.timeout.as_millis() as u64)),
        }
    }

    async fn markup(&mut self) -> Result<String, BrowserError> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::ContentExtraction(e.to_string()))
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError> {
        self.page
            .evaluate(SCROLL_TO_BOTTOM_JS)
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn scroll_height(&mut self) -> Result<i64, BrowserError> {
        let value = self
            .page
            .evaluate(SCROLL_HEIGHT_JS)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        value
            .into_value::<i64>()
            .map_err(|e| BrowserError::Script(e.to_string()))
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // * Best effort cleanup - can't await in drop
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_target_document_body() {
        assert!(SCROLL_TO_BOTTOM_JS.contains("scrollTo"));
        assert!(SCROLL_HEIGHT_JS.ends_with("scrollHeight"));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(BrowserError::Timeout(60_000).to_string(), "Page timeout after 60000ms");
        assert!(BrowserError::Launch("no chrome".into())
            .to_string()
            .contains("no chrome"));
    }
}
