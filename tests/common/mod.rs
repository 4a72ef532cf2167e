#![allow(dead_code)]

use async_trait::async_trait;
use setlist_harvest::app::ports::{BrowserSession, PageElement, SessionLauncher};
use setlist_harvest::config::{Config, CrawlConfig};
use setlist_harvest::error::{Result, ScraperError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One show as it appears in the listing markup.
pub fn show_item(month: &str, day: &str, year: &str, artist: &str, venue: &str) -> String {
    format!(
        r#"<li class="setlist">
            <span class="smallDateBlock">
                <strong class="text-uppercase">{month}</strong>
                <strong class="big">{day}</strong>
                <span>{year}</span>
            </span>
            <div class="column content">
                <a href="/setlist/x.html"><strong>{artist}</strong></a>
                <span class="subline"><span>{venue}</span></span>
            </div>
        </li>"#
    )
}

pub fn listing_page(header: &str, items: &[String]) -> String {
    format!(
        "<html><body><div class=\"profile\">{}</div><ul>{}</ul></body></html>",
        header,
        items.join("\n")
    )
}

pub fn test_config() -> Config {
    Config {
        crawl: CrawlConfig {
            base_url: "https://setlist.test".to_string(),
            ..CrawlConfig::without_delays()
        },
        ..Config::default()
    }
}

/// Calls observed by a [`ScriptedSession`].
#[derive(Debug, Default)]
pub struct SessionLog {
    pub navigations: Vec<String>,
    pub activations: usize,
    pub markup_reads: usize,
    pub released: bool,
}

type PageSource = Box<dyn Fn(usize) -> Option<String> + Send + Sync>;

/// A browser session that serves pages from a script.
pub struct ScriptedSession {
    pages: Arc<PageSource>,
    current: usize,
    pub wait_times_out: bool,
    pub activate_fails: bool,
    pub fail_markup_on: Option<usize>,
    pub panic_on: Option<usize>,
    pub hang_on: Option<usize>,
    log: Arc<Mutex<SessionLog>>,
}

impl ScriptedSession {
    /// Pages served in order; the "next" control disappears after the last one.
    pub fn with_pages(pages: Vec<String>) -> Self {
        Self::from_fn(move |index| pages.get(index).cloned())
    }

    /// Page `index` (0-based) comes from `source`; `None` means it does not exist.
    pub fn from_fn(source: impl Fn(usize) -> Option<String> + Send + Sync + 'static) -> Self {
        let source: PageSource = Box::new(source);
        Self {
            pages: Arc::new(source),
            current: 0,
            wait_times_out: false,
            activate_fails: false,
            fail_markup_on: None,
            panic_on: None,
            hang_on: None,
            log: Arc::new(Mutex::new(SessionLog::default())),
        }
    }

    pub fn log(&self) -> Arc<Mutex<SessionLog>> {
        Arc::clone(&self.log)
    }

    fn has_next(&self) -> bool {
        (self.pages)(self.current + 1).is_some()
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.log.lock().unwrap().navigations.push(url.to_string());
        self.current = 0;
        Ok(())
    }

    async fn wait_for_element(&mut self, selector: &str, _timeout: Duration) -> Result<()> {
        if self.wait_times_out {
            return Err(ScraperError::PageLoad(format!("'{}' never appeared", selector)));
        }
        Ok(())
    }

    async fn current_markup(&mut self) -> Result<String> {
        self.log.lock().unwrap().markup_reads += 1;
        if self.panic_on == Some(self.current) {
            panic!("renderer crashed on page {}", self.current + 1);
        }
        if self.hang_on == Some(self.current) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail_markup_on == Some(self.current) {
            return Err(ScraperError::Browser("connection to browser lost".into()));
        }
        Ok((self.pages)(self.current).unwrap_or_default())
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<PageElement>> {
        if !self.has_next() {
            return Ok(Vec::new());
        }
        Ok(vec![
            PageElement {
                selector: selector.to_string(),
                index: 0,
                class: Some("pager-prev disabled".into()),
                visible: true,
                enabled: true,
            },
            PageElement {
                selector: selector.to_string(),
                index: 1,
                class: Some("pager-next".into()),
                visible: true,
                enabled: true,
            },
        ])
    }

    async fn activate(&mut self, element: &PageElement) -> Result<()> {
        assert_eq!(element.index, 1, "disabled control must not be clicked");
        if self.activate_fails {
            return Err(ScraperError::Navigation("element is not attached to the page".into()));
        }
        self.log.lock().unwrap().activations += 1;
        self.current += 1;
        Ok(())
    }

    async fn evaluate_script(&mut self, _script: &str) -> Result<serde_json::Value> {
        Ok(serde_json::Value::Bool(true))
    }

    async fn release(&mut self) -> Result<()> {
        self.log.lock().unwrap().released = true;
        Ok(())
    }
}

/// Hands out one prepared session, or fails like a missing browser binary.
pub struct ScriptedLauncher {
    session: Mutex<Option<ScriptedSession>>,
}

impl ScriptedLauncher {
    pub fn new(session: ScriptedSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            session: Mutex::new(None),
        }
    }
}

#[async_trait]
impl SessionLauncher for ScriptedLauncher {
    async fn launch(&self, _headless: bool) -> Result<Box<dyn BrowserSession>> {
        match self.session.lock().unwrap().take() {
            Some(session) => Ok(Box::new(session)),
            None => Err(ScraperError::SessionSetup("chrome executable not found".into())),
        }
    }
}
