//! Crawl state and the pure transition function that advances it.
//!
//! The controller owns the browser session and feeds [`PageEvent`]s into
//! [`transition`]; the state itself never holds a session handle, so it can be
//! logged, serialized and tested on its own.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum TerminationReason {
    /// No usable "next" control was found, or activating it failed.
    NoMorePages,
    /// The collection reached the total announced on the profile page.
    TargetReached,
    /// Too many consecutive pages added nothing new.
    Stagnation,
    /// The page ceiling was hit.
    SafetyLimit,
    /// The crawl was cut short by an unexpected failure.
    Aborted(String),
}

impl TerminationReason {
    pub fn label(&self) -> &'static str {
        match self {
            TerminationReason::NoMorePages => "no_more_pages",
            TerminationReason::TargetReached => "target_reached",
            TerminationReason::Stagnation => "stagnation",
            TerminationReason::SafetyLimit => "safety_limit",
            TerminationReason::Aborted(_) => "aborted",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Aborted(detail) => write!(f, "aborted: {}", detail),
            other => f.write_str(other.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Fetch,
    Extract,
    DedupCheck,
    Terminated(TerminationReason),
}

/// Limits that bound the crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlLimits {
    pub max_pages: u32,
    pub stagnation_threshold: u32,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_pages: crate::constants::MAX_PAGES,
            stagnation_threshold: crate::constants::STAGNATION_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub phase: Phase,
    /// 1-based page currently being processed
    pub page: u32,
    /// Consecutive pages that produced no new records
    pub stale_pages: u32,
    pub expected_total: Option<usize>,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Fetch,
            page: 1,
            stale_pages: 0,
            expected_total: None,
        }
    }

    pub fn termination(&self) -> Option<&TerminationReason> {
        match &self.phase {
            Phase::Terminated(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.termination().is_some()
    }
}

/// What happened while the controller worked on the current phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// Content for the current page is available. Carries the expected total if
    /// this page announced one.
    Loaded { expected_total: Option<usize> },
    /// The "next" control was missing or could not be activated.
    NavigationFailed,
    /// Candidates were extracted from the loaded content.
    Extracted,
    /// Candidates were checked against the collection.
    Deduplicated { added: usize, accumulated: usize },
    /// Something unexpected went wrong.
    Failed(String),
}

/// Advance `state` by one event.
///
/// Events that do not fit the current phase leave the state unchanged, and a
/// terminated state absorbs every event.
pub fn transition(state: PaginationState, event: PageEvent, limits: &CrawlLimits) -> PaginationState {
    if state.is_terminal() {
        return state;
    }

    let phase = state.phase.clone();
    match (phase, event) {
        (_, PageEvent::Failed(detail)) => terminate(state, TerminationReason::Aborted(detail)),
        (Phase::Fetch, PageEvent::NavigationFailed) => {
            terminate(state, TerminationReason::NoMorePages)
        }
        (Phase::Fetch, PageEvent::Loaded { expected_total }) => PaginationState {
            phase: Phase::Extract,
            expected_total: state.expected_total.or(expected_total),
            ..state
        },
        (Phase::Extract, PageEvent::Extracted) => PaginationState {
            phase: Phase::DedupCheck,
            ..state
        },
        (Phase::DedupCheck, PageEvent::Deduplicated { added, accumulated }) => {
            after_dedup(state, added, accumulated, limits)
        }
        _ => state,
    }
}

fn after_dedup(
    mut state: PaginationState,
    added: usize,
    accumulated: usize,
    limits: &CrawlLimits,
) -> PaginationState {
    if added > 0 {
        state.stale_pages = 0;
        if let Some(total) = state.expected_total {
            if accumulated >= total {
                return terminate(state, TerminationReason::TargetReached);
            }
        }
    } else {
        state.stale_pages += 1;
        if state.stale_pages >= limits.stagnation_threshold {
            return terminate(state, TerminationReason::Stagnation);
        }
    }

    if state.page >= limits.max_pages {
        return terminate(state, TerminationReason::SafetyLimit);
    }

    PaginationState {
        phase: Phase::Fetch,
        page: state.page + 1,
        ..state
    }
}

fn terminate(state: PaginationState, reason: TerminationReason) -> PaginationState {
    PaginationState {
        phase: Phase::Terminated(reason),
        ..state
    }
}
