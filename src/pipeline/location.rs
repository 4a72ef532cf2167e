//! Venue text -> (venue, city) resolution.
//!
//! Rules are evaluated in order and the first one that matches wins. Festival
//! names come first: a festival's location is authoritative even when the
//! listing text also looks like "venue, city".

use crate::constants::UNRESOLVED;
use std::sync::Arc;

/// Resolved location for one listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub venue: String,
    pub city: String,
}

impl Location {
    fn new(venue: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            venue: venue.into(),
            city: city.into(),
        }
    }
}

/// Festival name fragments mapped to the city where the festival happens.
#[derive(Debug, Clone)]
pub struct FestivalCityTable {
    entries: Vec<(String, String)>,
}

impl Default for FestivalCityTable {
    fn default() -> Self {
        let entries = [
            ("Bangers", "São Paulo"),
            ("Março Maldito", "São Paulo"),
            ("Summer Breeze", "São Paulo"),
            ("Armageddon", "Joinville"),
            ("Setembro Negro", "São Paulo"),
            ("Crossroads", "Curitiba"),
            ("Genocide", "Curitiba"),
            ("Overload", "São Paulo"),
            ("Liberation", "São Paulo"),
            ("Monsters of Rock", "São Paulo"),
            ("Zoombie", "Rio Negrinho"),
            ("Live 'N' Louder", "São Paulo"),
            ("Guaru", "Guarulhos"),
            ("Visions", "São Paulo"),
        ];
        Self {
            entries: entries
                .iter()
                .map(|(name, city)| (name.to_string(), city.to_string()))
                .collect(),
        }
    }
}

impl FestivalCityTable {
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Append entries after the existing ones; earlier entries keep priority.
    pub fn with_entries<I, K, V>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, city) in extra {
            let name = name.into();
            if !self.entries.iter().any(|(existing, _)| existing.eq_ignore_ascii_case(&name)) {
                self.entries.push((name, city.into()));
            }
        }
        self
    }

    /// City of the first festival whose name occurs in `text`, ignoring case.
    pub fn city_for(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.entries
            .iter()
            .find(|(name, _)| haystack.contains(&name.to_lowercase()))
            .map(|(_, city)| city.as_str())
    }

    pub fn matches(&self, text: &str) -> bool {
        self.city_for(text).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One resolution rule. Returning `None` passes the text to the next rule.
pub trait LocationRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn resolve(&self, text: &str) -> Option<Location>;
}

pub struct FestivalRule {
    table: Arc<FestivalCityTable>,
}

impl LocationRule for FestivalRule {
    fn name(&self) -> &'static str {
        "festival"
    }

    fn resolve(&self, text: &str) -> Option<Location> {
        self.table
            .city_for(text)
            .map(|city| Location::new(text, city))
    }
}

/// "Venue, City, State, Country": the segment after the first comma is the city.
pub struct CommaSplitRule;

impl LocationRule for CommaSplitRule {
    fn name(&self) -> &'static str {
        "comma_split"
    }

    fn resolve(&self, text: &str) -> Option<Location> {
        let (venue, rest) = text.split_once(',')?;
        let city = rest.split(',').next().unwrap_or(rest);
        Some(Location::new(venue.trim(), city.trim()))
    }
}

/// Known city names, checked as lowercase substrings in order.
pub struct KnownCityRule {
    cities: Vec<(&'static [&'static str], &'static str)>,
}

impl Default for KnownCityRule {
    fn default() -> Self {
        Self {
            cities: vec![
                (&["curitiba"][..], "Curitiba"),
                (&["são paulo", "sao paulo"][..], "São Paulo"),
                (&["rio de janeiro", "rio"][..], "Rio de Janeiro"),
                (&["joinville"][..], "Joinville"),
                (&["rio negrinho"][..], "Rio Negrinho"),
            ],
        }
    }
}

impl LocationRule for KnownCityRule {
    fn name(&self) -> &'static str {
        "known_city"
    }

    fn resolve(&self, text: &str) -> Option<Location> {
        let haystack = text.to_lowercase();
        self.cities
            .iter()
            .find(|(needles, _)| needles.iter().any(|needle| haystack.contains(needle)))
            .map(|(_, city)| Location::new(text, *city))
    }
}

pub struct LocationResolver {
    festivals: Arc<FestivalCityTable>,
    rules: Vec<Box<dyn LocationRule>>,
}

impl Default for LocationResolver {
    fn default() -> Self {
        Self::new(FestivalCityTable::default())
    }
}

impl LocationResolver {
    pub fn new(festivals: FestivalCityTable) -> Self {
        let festivals = Arc::new(festivals);
        let rules: Vec<Box<dyn LocationRule>> = vec![
            Box::new(FestivalRule {
                table: Arc::clone(&festivals),
            }),
            Box::new(CommaSplitRule),
            Box::new(KnownCityRule::default()),
        ];
        Self { festivals, rules }
    }

    pub fn festivals(&self) -> &FestivalCityTable {
        &self.festivals
    }

    pub fn resolve(&self, text: &str) -> Location {
        for rule in &self.rules {
            if let Some(location) = rule.resolve(text) {
                tracing::trace!(rule = rule.name(), venue = %location.venue, city = %location.city, "Resolved location");
                return location;
            }
        }
        Location::new(text, UNRESOLVED)
    }
}
