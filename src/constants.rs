/// Constants shared by the crawler, extractor and report.

// Listing location
pub const DEFAULT_BASE_URL: &str = "https://www.setlist.fm";
pub const ATTENDED_PATH: &str = "attended";

/// Placeholder for any field that could not be read from the page.
pub const UNRESOLVED: &str = "N/A";

// Markup selectors
pub const SHOW_ITEM_SELECTOR: &str = "li.setlist";
pub const NEXT_CONTROL_SELECTORS: [&str; 3] = [
    "a[title*='next' i]",
    "a:has(.fa-chevron-right)",
    ".pager a:last-child",
];

/// Text that marks a listing entry as not yet attended.
pub const UPCOMING_MARKER: &str = "upcoming";

// Pagination limits
pub const STAGNATION_THRESHOLD: u32 = 3;
pub const MAX_PAGES: u32 = 50;

// Timings, in milliseconds
pub const PAGE_WAIT_TIMEOUT_MS: u64 = 15_000;
pub const PAGE_SETTLE_MS: u64 = 2_000;
pub const SCROLL_SETTLE_MS: u64 = 1_000;
pub const NAVIGATION_SETTLE_MS: u64 = 3_000;
pub const INITIAL_LOAD_SETTLE_MS: u64 = 3_000;

// Report
pub const REPORT_FILE_NAME: &str = "setlistfm_complete.xlsx";
pub const TOP_ARTIST_LIMIT: usize = 50;
pub const MAX_COLUMN_WIDTH: usize = 50;
pub const COLLECTION_METHOD: &str = "Headless Chromium";

/// Build the attended-shows URL for a profile.
pub fn attended_url(base_url: &str, profile: &str) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        ATTENDED_PATH,
        profile
    )
}
