use crate::constants::{COLLECTION_METHOD, TOP_ARTIST_LIMIT, UNRESOLVED};
use crate::pipeline::location::FestivalCityTable;
use crate::types::ShowRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Headline numbers for the summary section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_shows: usize,
    pub unique_artists: usize,
    pub unique_venues: usize,
    pub unique_cities: usize,
    pub festival_shows: usize,
    pub most_recent: String,
    pub oldest: String,
    pub collection_method: String,
}

/// A label with the number of shows it appears in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub label: String,
    pub shows: usize,
}

impl GroupCount {
    fn new(label: impl Into<String>, shows: usize) -> Self {
        Self {
            label: label.into(),
            shows,
        }
    }
}

/// Everything the report needs, derived from one final record list.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateViews {
    /// Deduplicated records, most recent first
    pub records: Vec<ShowRecord>,
    pub summary: Summary,
    pub top_artists: Vec<GroupCount>,
    pub by_city: Vec<GroupCount>,
    pub by_year: Vec<GroupCount>,
}

/// Drop records whose identity was already seen, keeping the first occurrence.
pub fn dedup(records: Vec<ShowRecord>) -> Vec<ShowRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.identity()))
        .collect()
}

/// Orderable form of a `dd/mm/yyyy` date; `None` for anything unparseable.
pub fn sort_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%d/%m/%Y").ok()
}

/// Most recent first; unparseable dates after every valid one. Stable.
pub fn sort_most_recent_first(records: &mut [ShowRecord]) {
    records.sort_by(|a, b| match (sort_date(&a.date), sort_date(&b.date)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Count labels, highest count first. Equal counts keep first-seen order.
fn count_by<'a, I>(labels: I) -> Vec<GroupCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        let count = counts.entry(label).or_insert_with(|| {
            order.push(label);
            0
        });
        *count += 1;
    }

    let mut grouped: Vec<GroupCount> = order
        .into_iter()
        .map(|label| GroupCount::new(label, counts[label]))
        .collect();
    grouped.sort_by(|a, b| b.shows.cmp(&a.shows));
    grouped
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    values.collect::<HashSet<_>>().len()
}

fn year_of(date: &str) -> Option<&str> {
    if date == UNRESOLVED {
        return None;
    }
    date.rsplit('/').next().filter(|year| !year.is_empty())
}

/// Dedup, order and summarize the crawl result.
pub fn aggregate(records: Vec<ShowRecord>, festivals: &FestivalCityTable) -> AggregateViews {
    let mut records = dedup(records);
    sort_most_recent_first(&mut records);

    let summary = Summary {
        total_shows: records.len(),
        unique_artists: distinct(records.iter().map(|r| r.artist.as_str())),
        unique_venues: distinct(records.iter().map(|r| r.venue.as_str())),
        unique_cities: distinct(records.iter().map(|r| r.city.as_str())),
        festival_shows: records.iter().filter(|r| festivals.matches(&r.venue)).count(),
        most_recent: records
            .first()
            .map(|r| r.date.clone())
            .unwrap_or_else(|| UNRESOLVED.to_string()),
        oldest: records
            .last()
            .map(|r| r.date.clone())
            .unwrap_or_else(|| UNRESOLVED.to_string()),
        collection_method: COLLECTION_METHOD.to_string(),
    };

    let mut top_artists = count_by(records.iter().map(|r| r.artist.as_str()));
    top_artists.truncate(TOP_ARTIST_LIMIT);

    let by_city = count_by(records.iter().map(|r| r.city.as_str()));

    let mut years: BTreeMap<&str, usize> = BTreeMap::new();
    for year in records.iter().filter_map(|r| year_of(&r.date)) {
        *years.entry(year).or_insert(0) += 1;
    }
    let by_year = years
        .into_iter()
        .map(|(year, shows)| GroupCount::new(year, shows))
        .collect();

    AggregateViews {
        records,
        summary,
        top_artists,
        by_city,
        by_year,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(date: &str, artist: &str, venue: &str, city: &str) -> ShowRecord {
        ShowRecord::new(date, artist, venue, city)
    }

    fn sample() -> Vec<ShowRecord> {
        vec![
            show("10/05/2019", "Krisiun", "Tork n' Roll", "Curitiba"),
            show(UNRESOLVED, "Angra", "Opinião", UNRESOLVED),
            show("21/04/2023", "Sepultura", "Summer Breeze Brasil", "São Paulo"),
            show("10/05/2019", "Krisiun", "Tork n' Roll", "Curitiba"),
            show("02/02/2021", "Krisiun", "Carioca Club", "São Paulo"),
            show("03/03/2022", "Sepultura", "Live Curitiba", "Curitiba"),
        ]
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let once = dedup(sample());
        assert_eq!(once.len(), 5);
        let twice = dedup(once.clone());
        assert_eq!(twice, once);
    }

    #[test]
    fn test_unparseable_dates_sort_last() {
        let views = aggregate(sample(), &FestivalCityTable::default());
        let dates: Vec<&str> = views.records.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(
            dates,
            vec!["21/04/2023", "03/03/2022", "02/02/2021", "10/05/2019", UNRESOLVED]
        );
    }

    #[test]
    fn test_equal_dates_keep_original_order() {
        let mut records = vec![
            show("01/01/2020", "B", "x", "y"),
            show("bad", "Z", "x", "y"),
            show("01/01/2020", "A", "x", "y"),
        ];
        sort_most_recent_first(&mut records);
        let artists: Vec<&str> = records.iter().map(|r| r.artist.as_str()).collect();
        assert_eq!(artists, vec!["B", "A", "Z"]);
    }

    #[test]
    fn test_summary_counts() {
        let views = aggregate(sample(), &FestivalCityTable::default());
        let summary = &views.summary;
        assert_eq!(summary.total_shows, 5);
        assert_eq!(summary.unique_artists, 3);
        assert_eq!(summary.unique_venues, 5);
        assert_eq!(summary.unique_cities, 3);
        assert_eq!(summary.festival_shows, 1);
        assert_eq!(summary.most_recent, "21/04/2023");
        assert_eq!(summary.oldest, UNRESOLVED);
    }

    #[test]
    fn test_top_artist_ties_follow_sorted_order() {
        let views = aggregate(sample(), &FestivalCityTable::default());
        assert_eq!(
            views.top_artists,
            vec![
                GroupCount::new("Sepultura", 2),
                GroupCount::new("Krisiun", 2),
                GroupCount::new("Angra", 1),
            ]
        );
    }

    #[test]
    fn test_top_artists_capped_at_fifty() {
        let records = (0..60)
            .map(|i| show("01/01/2020", &format!("Band {i}"), "Venue", "City"))
            .collect();
        let views = aggregate(records, &FestivalCityTable::empty());
        assert_eq!(views.top_artists.len(), 50);
        assert_eq!(views.top_artists[0].label, "Band 0");
    }

    #[test]
    fn test_by_city_includes_unresolved() {
        let views = aggregate(sample(), &FestivalCityTable::default());
        assert_eq!(
            views.by_city,
            vec![
                GroupCount::new("São Paulo", 2),
                GroupCount::new("Curitiba", 2),
                GroupCount::new(UNRESOLVED, 1),
            ]
        );
    }

    #[test]
    fn test_by_year_ascending_without_unresolved() {
        let views = aggregate(sample(), &FestivalCityTable::default());
        assert_eq!(
            views.by_year,
            vec![
                GroupCount::new("2019", 1),
                GroupCount::new("2021", 1),
                GroupCount::new("2022", 1),
                GroupCount::new("2023", 1),
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        let views = aggregate(Vec::new(), &FestivalCityTable::default());
        assert_eq!(views.summary.total_shows, 0);
        assert_eq!(views.summary.most_recent, UNRESOLVED);
        assert!(views.top_artists.is_empty());
        assert!(views.by_year.is_empty());
    }
}
