//! Browser session backed by a local Chrome/Chromium through chromiumoxide.

use crate::app::ports::{BrowserSession, PageElement, SessionLauncher};
use crate::config::BrowserConfig as HarvestBrowserConfig;
use crate::error::{Result, ScraperError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const EXIT_WAIT: Duration = Duration::from_secs(5);

const LAUNCH_ARGS: [&str; 5] = [
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-software-rasterizer",
    "--disable-extensions",
];

fn browser_error(e: impl std::fmt::Display) -> ScraperError {
    ScraperError::Browser(e.to_string())
}

#[derive(Debug, Deserialize)]
struct ElementProbe {
    class: Option<String>,
    visible: bool,
    enabled: bool,
}

/// Launches [`ChromiumSession`]s with the configured binary and flags.
pub struct ChromiumLauncher {
    config: HarvestBrowserConfig,
}

impl ChromiumLauncher {
    pub fn new(config: HarvestBrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn launch(&self, headless: bool) -> Result<Box<dyn BrowserSession>> {
        let session = ChromiumSession::launch(&self.config, headless).await?;
        Ok(Box::new(session))
    }
}

pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    released: bool,
}

impl ChromiumSession {
    pub async fn launch(config: &HarvestBrowserConfig, headless: bool) -> Result<Self> {
        let mut builder = BrowserConfig::builder();
        if !headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.chrome_path {
            info!(path = %path, "Using configured Chrome binary");
            builder = builder.chrome_executable(path);
        }
        for arg in LAUNCH_ARGS.iter().copied().chain(config.extra_args.iter().map(String::as_str)) {
            builder = builder.arg(arg);
        }
        let browser_config = builder.build().map_err(ScraperError::SessionSetup)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::SessionSetup(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(ScraperError::SessionSetup(e.to_string()));
            }
        };

        info!(headless, "Browser session started");
        Ok(Self {
            browser,
            page,
            handler,
            released: false,
        })
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page.goto(url).await.map_err(browser_error)?;
        Ok(())
    }

    async fn wait_for_element(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let page = &self.page;
        let found = tokio::time::timeout(timeout, async {
            loop {
                if page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
        .await;

        found.map_err(|_| {
            ScraperError::PageLoad(format!(
                "'{}' did not appear within {}s",
                selector,
                timeout.as_secs()
            ))
        })
    }

    async fn current_markup(&mut self) -> Result<String> {
        self.page.content().await.map_err(browser_error)
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<PageElement>> {
        let quoted = serde_json::to_string(selector)?;
        let script = format!(
            "Array.from(document.querySelectorAll({})).map(el => ({{ \
                class: el.getAttribute('class'), \
                visible: !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length), \
                enabled: !el.disabled && el.getAttribute('aria-disabled') !== 'true' \
            }}))",
            quoted
        );
        let probes: Vec<ElementProbe> = serde_json::from_value(self.evaluate_script(&script).await?)?;
        Ok(probes
            .into_iter()
            .enumerate()
            .map(|(index, probe)| PageElement {
                selector: selector.to_string(),
                index,
                class: probe.class,
                visible: probe.visible,
                enabled: probe.enabled,
            })
            .collect())
    }

    async fn activate(&mut self, element: &PageElement) -> Result<()> {
        let elements = self
            .page
            .find_elements(element.selector.as_str())
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        let target = elements.get(element.index).ok_or_else(|| {
            ScraperError::Navigation(format!(
                "'{}' no longer has a match at position {}",
                element.selector, element.index
            ))
        })?;
        target
            .click()
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn evaluate_script(&mut self, script: &str) -> Result<serde_json::Value> {
        let result = self.page.evaluate(script).await.map_err(browser_error)?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let result = shut_down(&mut self.browser, EXIT_WAIT).await;
        self.handler.abort();
        debug!("Browser process released");
        result
    }
}

/// The browser child process as seen by the shutdown sequence.
#[async_trait]
trait BrowserProcess: Send {
    /// Ask the browser to close over CDP.
    async fn request_close(&mut self) -> Result<()>;
    async fn wait_exit(&mut self) -> Result<()>;
    async fn force_kill(&mut self) -> Result<()>;
}

#[async_trait]
impl BrowserProcess for Browser {
    async fn request_close(&mut self) -> Result<()> {
        self.close().await.map(|_| ()).map_err(browser_error)
    }

    async fn wait_exit(&mut self) -> Result<()> {
        self.wait().await.map(|_| ())?;
        Ok(())
    }

    async fn force_kill(&mut self) -> Result<()> {
        match self.kill().await {
            Some(result) => Ok(result?),
            None => Ok(()),
        }
    }
}

/// Close the browser, killing it when the close request fails or the process
/// does not exit. The close request and the exit wait are each bounded by
/// `exit_wait`.
async fn shut_down<P: BrowserProcess + ?Sized>(process: &mut P, exit_wait: Duration) -> Result<()> {
    let requested = tokio::time::timeout(exit_wait, process.request_close()).await;
    let closed = requested.unwrap_or_else(|_| {
        Err(ScraperError::Browser(format!(
            "close request got no answer within {:?}",
            exit_wait
        )))
    });
    if let Err(e) = &closed {
        warn!("Browser close request failed, killing the process: {}", e);
        if let Err(e) = process.force_kill().await {
            warn!("Killing browser process failed: {}", e);
        }
    }

    let waited = tokio::time::timeout(exit_wait, process.wait_exit()).await;
    match waited {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Waiting for browser exit failed: {}", e),
        Err(_) => {
            warn!(?exit_wait, "Browser did not exit in time, killing the process");
            if let Err(e) = process.force_kill().await {
                warn!("Killing browser process failed: {}", e);
            }
        }
    }
    closed
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if !self.released {
            warn!("Browser session dropped without release; killing the process");
            self.handler.abort();
            // Browser's own Drop kills a child process it launched
        }
    }
}
