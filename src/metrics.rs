//! Metric names and recording helpers for the harvest.
//!
//! Recording goes through the `metrics` facade; nothing is exported unless the
//! embedding process installs a recorder.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Crawl metrics
    CrawlPagesFetched,
    CrawlShowsCollected,
    CrawlPageLoadTimeouts,
    CrawlTerminations,
    CrawlCollectionSize,

    // Report metrics
    ReportBuildSuccess,
    ReportBuildError,
    ReportBytes,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::CrawlPagesFetched => "setlist_pages_fetched_total",
            MetricName::CrawlShowsCollected => "setlist_shows_collected_total",
            MetricName::CrawlPageLoadTimeouts => "setlist_page_load_timeouts_total",
            MetricName::CrawlTerminations => "setlist_crawl_terminations_total",
            MetricName::CrawlCollectionSize => "setlist_collection_size",
            MetricName::ReportBuildSuccess => "setlist_report_build_success_total",
            MetricName::ReportBuildError => "setlist_report_build_error_total",
            MetricName::ReportBytes => "setlist_report_bytes",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub mod crawl {
    use super::MetricName;

    pub fn page_fetched() {
        ::metrics::counter!(MetricName::CrawlPagesFetched.as_str()).increment(1);
    }

    pub fn page_load_timeout() {
        ::metrics::counter!(MetricName::CrawlPageLoadTimeouts.as_str()).increment(1);
    }

    pub fn shows_collected(count: usize) {
        ::metrics::counter!(MetricName::CrawlShowsCollected.as_str()).increment(count as u64);
    }

    pub fn collection_size(size: usize) {
        ::metrics::gauge!(MetricName::CrawlCollectionSize.as_str()).set(size as f64);
    }

    pub fn terminated(reason: &'static str) {
        ::metrics::counter!(MetricName::CrawlTerminations.as_str(), "reason" => reason).increment(1);
    }
}

pub mod report {
    use super::MetricName;

    pub fn build_success(bytes: usize) {
        ::metrics::counter!(MetricName::ReportBuildSuccess.as_str()).increment(1);
        ::metrics::histogram!(MetricName::ReportBytes.as_str()).record(bytes as f64);
    }

    pub fn build_error() {
        ::metrics::counter!(MetricName::ReportBuildError.as_str()).increment(1);
    }
}
