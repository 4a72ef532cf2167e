use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// An element found on the current page, addressed by the selector that found
/// it and its position among that selector's matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageElement {
    pub selector: String,
    pub index: usize,
    pub class: Option<String>,
    pub visible: bool,
    pub enabled: bool,
}

impl PageElement {
    /// Visible, enabled and not styled as disabled.
    pub fn is_clickable(&self) -> bool {
        self.visible
            && self.enabled
            && !self
                .class
                .as_deref()
                .map(|class| class.to_lowercase().contains("disabled"))
                .unwrap_or(false)
    }

    /// Script that scrolls this element into view.
    pub fn scroll_script(&self) -> String {
        let selector = serde_json::to_string(&self.selector).unwrap_or_else(|_| "\"\"".into());
        format!(
            "(() => {{ const el = document.querySelectorAll({})[{}]; if (el) {{ el.scrollIntoView(true); }} return !!el; }})()",
            selector, self.index
        )
    }
}

/// A single stateful browser tab. Not shareable between concurrent crawls.
#[async_trait]
pub trait BrowserSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Wait until `selector` matches something. Times out with `ScraperError::PageLoad`.
    async fn wait_for_element(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    /// Rendered markup of the whole document.
    async fn current_markup(&mut self) -> Result<String>;

    async fn find_all(&mut self, selector: &str) -> Result<Vec<PageElement>>;

    /// Click the element.
    async fn activate(&mut self, element: &PageElement) -> Result<()>;

    async fn evaluate_script(&mut self, script: &str) -> Result<serde_json::Value>;

    /// Shut the browser down. Must be called once the crawl is over.
    async fn release(&mut self) -> Result<()>;
}

/// Starts browser sessions.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self, headless: bool) -> Result<Box<dyn BrowserSession>>;
}
