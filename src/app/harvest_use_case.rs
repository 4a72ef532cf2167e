use crate::app::ports::{BrowserSession, SessionLauncher};
use crate::config::Config;
use crate::constants::{attended_url, REPORT_FILE_NAME};
use crate::envelope::ScrapeResponse;
use crate::metrics;
use crate::pipeline::aggregate::aggregate;
use crate::pipeline::controller::PaginationController;
use crate::pipeline::location::{FestivalCityTable, LocationResolver};
use crate::pipeline::pagination::TerminationReason;
use crate::pipeline::report::build_report;
use crate::types::Collection;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct HarvestRequest {
    pub profile: String,
    pub headless: bool,
    /// Wall-clock budget for the crawl; `None` lets it run to completion
    pub deadline: Option<Duration>,
}

/// What a harvest produced, beyond the response itself.
#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    pub response: ScrapeResponse,
    /// `None` when the browser could not be started
    pub termination: Option<TerminationReason>,
    pub collected: usize,
}

/// Crawl a profile's attended shows and package them as a report.
pub struct HarvestUseCase<L: SessionLauncher> {
    launcher: L,
    config: Config,
    resolver: LocationResolver,
}

impl<L: SessionLauncher> HarvestUseCase<L> {
    pub fn new(launcher: L, config: Config) -> Self {
        let festivals = FestivalCityTable::default().with_entries(config.festivals.clone());
        Self {
            launcher,
            config,
            resolver: LocationResolver::new(festivals),
        }
    }

    pub async fn run(&self, request: &HarvestRequest) -> HarvestOutcome {
        let run_id = Uuid::new_v4();
        let span = info_span!("harvest", %run_id, profile = %request.profile);
        self.run_inner(request).instrument(span).await
    }

    async fn run_inner(&self, request: &HarvestRequest) -> HarvestOutcome {
        info!(
            festivals = self.resolver.festivals().len(),
            "Starting harvest"
        );

        let mut session = match self.launcher.launch(request.headless).await {
            Ok(session) => session,
            Err(e) => {
                error!("Could not start browser session: {}", e);
                return HarvestOutcome {
                    response: ScrapeResponse::failure(format!(
                        "Could not start browser session: {}",
                        e
                    )),
                    termination: None,
                    collected: 0,
                };
            }
        };

        let mut collection = Collection::new();
        let termination = self
            .crawl_guarded(session.as_mut(), request, &mut collection)
            .await;

        if let Err(e) = session.release().await {
            warn!("Browser release reported an error: {}", e);
        }
        drop(session);
        info!("Browser session closed");

        let collected = collection.len();
        let response = self.package(collection, &termination);
        HarvestOutcome {
            response,
            termination: Some(termination),
            collected,
        }
    }

    /// Run the crawl, turning a panic or an exceeded deadline into an aborted
    /// termination. Records gathered before that point stay in `collection`.
    async fn crawl_guarded(
        &self,
        session: &mut dyn BrowserSession,
        request: &HarvestRequest,
        collection: &mut Collection,
    ) -> TerminationReason {
        let controller = PaginationController::new(&self.config.crawl, &self.resolver);
        let start_url = attended_url(&self.config.crawl.base_url, &request.profile);

        let crawl = AssertUnwindSafe(controller.crawl(session, &start_url, collection)).catch_unwind();

        let result = match request.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, crawl).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(?deadline, "Crawl deadline exceeded");
                    metrics::crawl::terminated("aborted");
                    return TerminationReason::Aborted(format!(
                        "deadline of {:?} exceeded",
                        deadline
                    ));
                }
            },
            None => crawl.await,
        };

        match result {
            Ok(summary) => summary.termination,
            Err(panic) => {
                let detail = panic_message(panic.as_ref());
                error!("Crawl panicked: {}", detail);
                metrics::crawl::terminated("aborted");
                TerminationReason::Aborted(format!("panic: {}", detail))
            }
        }
    }

    fn package(&self, collection: Collection, termination: &TerminationReason) -> ScrapeResponse {
        if collection.is_empty() {
            warn!(%termination, "No shows were collected");
            return match termination {
                TerminationReason::Aborted(detail) => ScrapeResponse::failure(format!(
                    "No shows were collected: crawl aborted ({})",
                    detail
                )),
                _ => ScrapeResponse::failure("No shows were collected"),
            };
        }

        let views = aggregate(collection.into_records(), self.resolver.festivals());
        let shows = views.records.len();

        match build_report(&views) {
            Ok(bytes) => {
                metrics::report::build_success(bytes.len());
                info!(shows, bytes = bytes.len(), "Report generated");
                ScrapeResponse::success(
                    format!("{} shows collected", shows),
                    REPORT_FILE_NAME,
                    &bytes,
                )
            }
            Err(e) => {
                metrics::report::build_error();
                error!("Report generation failed: {}", e);
                ScrapeResponse::failure(format!("Failed to generate report: {}", e))
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
