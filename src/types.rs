use crate::constants::UNRESOLVED;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One attended show as read from the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowRecord {
    /// `dd/mm/yyyy`, or [`UNRESOLVED`]
    pub date: String,
    pub artist: String,
    pub venue: String,
    /// Normalized city, or [`UNRESOLVED`]
    pub city: String,
}

/// The (artist, date, venue) triple that decides whether two records are the same event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub artist: String,
    pub date: String,
    pub venue: String,
}

impl ShowRecord {
    pub fn new(
        date: impl Into<String>,
        artist: impl Into<String>,
        venue: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            artist: artist.into(),
            venue: venue.into(),
            city: city.into(),
        }
    }

    pub fn identity(&self) -> IdentityKey {
        IdentityKey {
            artist: self.artist.clone(),
            date: self.date.clone(),
            venue: self.venue.clone(),
        }
    }

    pub fn has_resolved_date(&self) -> bool {
        self.date != UNRESOLVED
    }
}

/// Append-only record list accumulated during a crawl.
#[derive(Debug, Default, Clone)]
pub struct Collection {
    records: Vec<ShowRecord>,
    seen: HashSet<IdentityKey>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every candidate whose identity is not yet present.
    ///
    /// Returns how many records were added.
    pub fn absorb(&mut self, candidates: Vec<ShowRecord>) -> usize {
        let before = self.records.len();
        for record in candidates {
            if self.seen.insert(record.identity()) {
                self.records.push(record);
            }
        }
        self.records.len() - before
    }

    pub fn contains(&self, record: &ShowRecord) -> bool {
        self.seen.contains(&record.identity())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ShowRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ShowRecord> {
        self.records
    }
}
