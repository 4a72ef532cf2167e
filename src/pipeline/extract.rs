use crate::constants::{SHOW_ITEM_SELECTOR, UNRESOLVED, UPCOMING_MARKER};
use crate::error::{Result, ScraperError};
use crate::pipeline::location::LocationResolver;
use crate::types::ShowRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

static SHOW_ITEM: Lazy<Selector> = Lazy::new(|| selector(SHOW_ITEM_SELECTOR));
static DATE_BLOCK: Lazy<Selector> = Lazy::new(|| selector("span.smallDateBlock"));
static DATE_MONTH: Lazy<Selector> = Lazy::new(|| selector("strong.text-uppercase"));
static DATE_DAY: Lazy<Selector> = Lazy::new(|| selector("strong.big"));
static DATE_YEAR: Lazy<Selector> = Lazy::new(|| selector("span"));
static CONTENT: Lazy<Selector> = Lazy::new(|| selector("div.column.content"));
static STRONG: Lazy<Selector> = Lazy::new(|| selector("strong"));
static SUBLINE: Lazy<Selector> = Lazy::new(|| selector("span.subline"));
static SUBLINE_LOCATION: Lazy<Selector> = Lazy::new(|| selector("span"));

static EXPECTED_TOTAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s+attended").expect("valid expected-total pattern"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

const MONTHS: [(&str, &str); 12] = [
    ("Jan", "01"),
    ("Feb", "02"),
    ("Mar", "03"),
    ("Apr", "04"),
    ("May", "05"),
    ("Jun", "06"),
    ("Jul", "07"),
    ("Aug", "08"),
    ("Sep", "09"),
    ("Oct", "10"),
    ("Nov", "11"),
    ("Dec", "12"),
];

/// Month number for a listing abbreviation. Unknown abbreviations fall back to January.
pub fn month_number(abbreviation: &str) -> &'static str {
    MONTHS
        .iter()
        .find(|(name, _)| *name == abbreviation)
        .map(|(_, number)| *number)
        .unwrap_or("01")
}

/// Join the three date-block fields into `dd/mm/yyyy`.
pub fn format_show_date(month: &str, day: &str, year: &str) -> Result<String> {
    let day = day.trim();
    let year = year.trim();
    if day.is_empty() || day.len() > 2 || !day.chars().all(|c| c.is_ascii_digit()) {
        return Err(ScraperError::Extraction(format!("unexpected day '{}'", day)));
    }
    if year.is_empty() || !year.chars().all(|c| c.is_ascii_digit()) {
        return Err(ScraperError::Extraction(format!("unexpected year '{}'", year)));
    }
    Ok(format!("{:0>2}/{}/{}", day, month_number(month.trim()), year))
}

/// The total number of attended shows announced on the profile page, if present.
pub fn parse_expected_total(markup: &str) -> Option<usize> {
    EXPECTED_TOTAL
        .captures(markup)
        .and_then(|captures| captures.get(1))
        .and_then(|total| total.as_str().parse().ok())
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Turns one rendered listing page into candidate show records.
pub struct PageExtractor<'a> {
    resolver: &'a LocationResolver,
}

impl<'a> PageExtractor<'a> {
    pub fn new(resolver: &'a LocationResolver) -> Self {
        Self { resolver }
    }

    #[instrument(skip_all)]
    pub fn extract(&self, markup: &str) -> Vec<ShowRecord> {
        let document = Html::parse_document(markup);
        let mut shows = Vec::new();
        let mut upcoming = 0;
        let mut skipped = 0;

        for item in document.select(&SHOW_ITEM) {
            if item.inner_html().to_lowercase().contains(UPCOMING_MARKER) {
                upcoming += 1;
                continue;
            }
            match self.extract_show(item) {
                Ok(Some(show)) => shows.push(show),
                Ok(None) => skipped += 1,
                Err(e) => {
                    debug!("Skipping show entry: {}", e);
                    skipped += 1;
                }
            }
        }

        debug!(
            found = shows.len(),
            upcoming, skipped, "Extracted shows from page"
        );
        shows
    }

    /// `Ok(None)` when the entry has no artist.
    fn extract_show(&self, item: ElementRef<'_>) -> Result<Option<ShowRecord>> {
        let artist = match item
            .select(&CONTENT)
            .next()
            .and_then(|content| content.select(&STRONG).next())
        {
            Some(node) => {
                let artist = element_text(node);
                if artist.is_empty() {
                    return Err(ScraperError::Extraction("empty artist name".into()));
                }
                artist
            }
            None => return Ok(None),
        };

        let date = match item.select(&DATE_BLOCK).next() {
            Some(block) => {
                let month = block.select(&DATE_MONTH).next().map(element_text);
                let day = block.select(&DATE_DAY).next().map(element_text);
                let year = block.select(&DATE_YEAR).next().map(element_text);
                match (month, day, year) {
                    (Some(month), Some(day), Some(year)) => format_show_date(&month, &day, &year)?,
                    _ => UNRESOLVED.to_string(),
                }
            }
            None => UNRESOLVED.to_string(),
        };

        let location_text = item
            .select(&SUBLINE)
            .next()
            .and_then(|subline| subline.select(&SUBLINE_LOCATION).next())
            .map(element_text);

        let (venue, city) = match location_text {
            Some(text) => {
                let location = self.resolver.resolve(&text);
                (location.venue, location.city)
            }
            None => (UNRESOLVED.to_string(), UNRESOLVED.to_string()),
        };

        Ok(Some(ShowRecord {
            date,
            artist,
            venue,
            city,
        }))
    }
}
