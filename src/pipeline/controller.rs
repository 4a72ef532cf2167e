use crate::app::ports::BrowserSession;
use crate::config::CrawlConfig;
use crate::constants::{NEXT_CONTROL_SELECTORS, SHOW_ITEM_SELECTOR};
use crate::error::Result;
use crate::metrics;
use crate::pipeline::extract::{parse_expected_total, PageExtractor};
use crate::pipeline::location::LocationResolver;
use crate::pipeline::pagination::{
    transition, CrawlLimits, PageEvent, PaginationState, Phase, TerminationReason,
};
use crate::types::{Collection, ShowRecord};
use std::mem;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// How a crawl ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub termination: TerminationReason,
    pub pages_visited: u32,
    pub expected_total: Option<usize>,
}

/// Drives one browser session through the paginated listing.
pub struct PaginationController<'a> {
    config: &'a CrawlConfig,
    limits: CrawlLimits,
    extractor: PageExtractor<'a>,
}

impl<'a> PaginationController<'a> {
    pub fn new(config: &'a CrawlConfig, resolver: &'a LocationResolver) -> Self {
        Self {
            config,
            limits: CrawlLimits {
                max_pages: config.max_pages,
                stagnation_threshold: config.stagnation_threshold,
            },
            extractor: PageExtractor::new(resolver),
        }
    }

    /// Crawl from `start_url` until a termination condition is met.
    ///
    /// Records go straight into `collection`, so whatever was gathered stays
    /// available even if the caller abandons this future.
    #[instrument(skip(self, session, collection))]
    pub async fn crawl<S>(
        &self,
        session: &mut S,
        start_url: &str,
        collection: &mut Collection,
    ) -> CrawlSummary
    where
        S: BrowserSession + ?Sized,
    {
        let mut state = PaginationState::new();
        let mut markup = String::new();
        let mut candidates: Vec<ShowRecord> = Vec::new();

        loop {
            let event = match &state.phase {
                Phase::Fetch => {
                    info!(page = state.page, "Fetching page");
                    match self.fetch(session, &state, start_url).await {
                        Ok(Some(content)) => {
                            metrics::crawl::page_fetched();
                            let expected_total = if state.expected_total.is_none() {
                                parse_expected_total(&content)
                            } else {
                                None
                            };
                            if let Some(total) = expected_total {
                                info!(total, "Profile reports attended shows");
                            }
                            markup = content;
                            PageEvent::Loaded { expected_total }
                        }
                        Ok(None) => {
                            info!("No further pages");
                            PageEvent::NavigationFailed
                        }
                        Err(e) => {
                            warn!("Crawl interrupted on page {}: {}", state.page, e);
                            PageEvent::Failed(e.to_string())
                        }
                    }
                }
                Phase::Extract => {
                    candidates = self.extractor.extract(&markup);
                    info!(found = candidates.len(), "Found attended shows on page");
                    PageEvent::Extracted
                }
                Phase::DedupCheck => {
                    let added = collection.absorb(mem::take(&mut candidates));
                    metrics::crawl::shows_collected(added);
                    metrics::crawl::collection_size(collection.len());
                    if added > 0 {
                        info!(added, total = collection.len(), "Added unique shows");
                    } else {
                        warn!(
                            stale_pages = state.stale_pages + 1,
                            threshold = self.limits.stagnation_threshold,
                            "Page produced no new shows"
                        );
                    }
                    PageEvent::Deduplicated {
                        added,
                        accumulated: collection.len(),
                    }
                }
                Phase::Terminated(reason) => {
                    metrics::crawl::terminated(reason.label());
                    info!(
                        reason = %reason,
                        pages = state.page,
                        collected = collection.len(),
                        "Crawl finished"
                    );
                    return CrawlSummary {
                        termination: reason.clone(),
                        pages_visited: state.page,
                        expected_total: state.expected_total,
                    };
                }
            };
            state = transition(state, event, &self.limits);
        }
    }

    /// Load the current page. `Ok(None)` means there is no next page.
    async fn fetch<S>(
        &self,
        session: &mut S,
        state: &PaginationState,
        start_url: &str,
    ) -> Result<Option<String>>
    where
        S: BrowserSession + ?Sized,
    {
        if state.page == 1 {
            info!(url = start_url, "Opening attended shows");
            session.navigate(start_url).await?;
            pause(self.config.initial_load_settle()).await;
        } else if !self.advance(session).await {
            return Ok(None);
        }

        match session
            .wait_for_element(SHOW_ITEM_SELECTOR, self.config.page_wait_timeout())
            .await
        {
            Ok(()) => pause(self.config.page_settle()).await,
            Err(e) => {
                metrics::crawl::page_load_timeout();
                warn!("Continuing with partially loaded page: {}", e);
            }
        }

        session.current_markup().await.map(Some)
    }

    /// Find and click the "next" control. `false` when there is none or the click fails.
    async fn advance<S>(&self, session: &mut S) -> bool
    where
        S: BrowserSession + ?Sized,
    {
        let mut next = None;
        for selector in NEXT_CONTROL_SELECTORS {
            match session.find_all(selector).await {
                Ok(elements) => {
                    next = elements.into_iter().find(|element| element.is_clickable());
                    if next.is_some() {
                        break;
                    }
                }
                Err(e) => debug!(selector, "Next control lookup failed: {}", e),
            }
        }

        let Some(next) = next else {
            info!("Next page control not found");
            return false;
        };
        debug!(selector = %next.selector, index = next.index, "Found next page control");

        if let Err(e) = session.evaluate_script(&next.scroll_script()).await {
            debug!("Could not scroll to next control: {}", e);
        }
        pause(self.config.scroll_settle()).await;

        if let Err(e) = session.activate(&next).await {
            warn!("Clicking next page control failed: {}", e);
            return false;
        }
        pause(self.config.navigation_settle()).await;
        true
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
