//! Chromium-based feed session using chromiumoxide.

use super::{ElementHandle, FeedSession};
use crate::auth::Cookie;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, TimeSinceEpoch};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;

/// User agent presented to the feed. A desktop Chrome string; the feed
/// serves a different DOM to unrecognized agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. MEMETRACE_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("MEMETRACE_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.memetrace/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".memetrace/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".memetrace/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".memetrace/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".memetrace/chromium/chrome-linux64/chrome"),
                home.join(".memetrace/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    if let Ok(path) = which::which("google-chrome") {
        return Some(path);
    }
    if let Ok(path) = which::which("chromium") {
        return Some(path);
    }
    if let Ok(path) = which::which("chromium-browser") {
        return Some(path);
    }

    // 4. Common macOS locations
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// A live Chromium session owning one page.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: tokio::task::JoinHandle<()>,
}

impl ChromiumSession {
    /// Launch Chromium and open a blank page.
    ///
    /// `headless` is the default; a headed browser helps when the feed
    /// challenges the session interactively.
    pub async fn launch(headless: bool) -> Result<Self> {
        let chrome_path =
            find_chromium().context("Chromium not found. Install Chrome or set MEMETRACE_CHROMIUM_PATH.")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(1400, 1000)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={USER_AGENT}"));
        if headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut events) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // Drain CDP events for the lifetime of the session
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open page")?;

        // Hide the webdriver flag the feed sniffs for
        let _ = page
            .evaluate("Object.defineProperty(navigator, 'webdriver', {get: () => undefined})")
            .await;

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Inject session cookies and refresh so the feed sees a logged-in user.
    pub async fn apply_cookies(&self, base_url: &str, cookies: &[Cookie]) -> Result<()> {
        self.page
            .goto(base_url)
            .await
            .context("failed to reach feed host before cookie injection")?;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let mut params = Vec::with_capacity(cookies.len());
        for c in cookies {
            let mut b = CookieParam::builder().name(&c.name).value(&c.value);
            if let Some(domain) = &c.domain {
                b = b.domain(domain);
            }
            if let Some(path) = &c.path {
                b = b.path(path);
            }
            if let Some(secure) = c.secure {
                b = b.secure(secure);
            }
            if let Some(http_only) = c.http_only {
                b = b.http_only(http_only);
            }
            if let Some(expires) = c.expires {
                b = b.expires(TimeSinceEpoch::new(expires));
            }
            params.push(
                b.build()
                    .map_err(|e| anyhow::anyhow!("invalid cookie {}: {e}", c.name))?,
            );
        }

        self.page
            .set_cookies(params)
            .await
            .context("failed to set cookies")?;

        self.page.reload().await.context("failed to reload after cookies")?;
        tokio::time::sleep(Duration::from_secs(3)).await;
        Ok(())
    }
}

#[async_trait]
impl FeedSession for ChromiumSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("navigation to {url} failed"))?;
        let _ = self.page.wait_for_navigation().await;
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>> {
        let elements = match self.page.find_elements(selector).await {
            Ok(els) => els,
            // chromiumoxide errors when a selector matches nothing
            Err(_) => Vec::new(),
        };
        Ok(elements
            .into_iter()
            .map(|e| Box::new(ChromiumElement { inner: e }) as Box<dyn ElementHandle>)
            .collect())
    }

    async fn find_one(&self, selector: &str) -> Result<Option<Box<dyn ElementHandle>>> {
        match self.page.find_element(selector).await {
            Ok(e) => Ok(Some(Box::new(ChromiumElement { inner: e }))),
            Err(_) => Ok(None),
        }
    }

    async fn run_script(&self, js: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(js)
            .await
            .context("JS execution failed")?;
        result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert JS result: {e:?}"))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let mut this = *self;
        let _ = this.page.close().await;
        if this.browser.close().await.is_err() {
            bail!("failed to close browser");
        }
        this.handler.abort();
        Ok(())
    }
}

/// A single rendered element in the Chromium page.
pub struct ChromiumElement {
    inner: Element,
}

#[async_trait]
impl ElementHandle for ChromiumElement {
    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>> {
        let elements = match self.inner.find_elements(selector).await {
            Ok(els) => els,
            Err(_) => Vec::new(),
        };
        Ok(elements
            .into_iter()
            .map(|e| Box::new(ChromiumElement { inner: e }) as Box<dyn ElementHandle>)
            .collect())
    }

    async fn find_one(&self, selector: &str) -> Result<Option<Box<dyn ElementHandle>>> {
        match self.inner.find_element(selector).await {
            Ok(e) => Ok(Some(Box::new(ChromiumElement { inner: e }))),
            Err(_) => Ok(None),
        }
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.inner
            .attribute(name)
            .await
            .map_err(|e| anyhow::anyhow!("attribute read failed: {e}"))
    }

    async fn text(&self) -> Result<String> {
        Ok(self
            .inner
            .inner_text()
            .await
            .unwrap_or_default()
            .unwrap_or_default())
    }
}
