//! Multi-sheet workbook built from the aggregate views.

use crate::constants::MAX_COLUMN_WIDTH;
use crate::error::Result;
use crate::pipeline::aggregate::{AggregateViews, GroupCount};
use rust_xlsxwriter::{Format, Workbook};
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    fn count(value: usize) -> Self {
        Cell::Number(value as f64)
    }

    fn display_len(&self) -> usize {
        match self {
            Cell::Text(text) => text.chars().count(),
            Cell::Number(number) => number.to_string().len(),
        }
    }
}

/// One labeled table: sheet name, header row and data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ReportSection {
    fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn grouped(name: &str, label_header: &str, groups: &[GroupCount]) -> Self {
        let mut section = Self::new(name, &[label_header, "Shows"]);
        section.rows = groups
            .iter()
            .map(|group| vec![Cell::text(&group.label), Cell::count(group.shows)])
            .collect();
        section
    }

    /// Widest cell (header included) plus padding, capped.
    pub fn column_widths(&self) -> Vec<usize> {
        (0..self.headers.len())
            .map(|col| {
                let widest = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(col))
                    .map(Cell::display_len)
                    .chain(std::iter::once(self.headers[col].chars().count()))
                    .max()
                    .unwrap_or(0);
                (widest + 2).min(MAX_COLUMN_WIDTH)
            })
            .collect()
    }
}

/// Lay out every view as a section, in report order.
pub fn build_sections(views: &AggregateViews) -> Vec<ReportSection> {
    let mut all_shows = ReportSection::new("All Shows", &["Date", "Artist", "Venue", "City"]);
    all_shows.rows = views
        .records
        .iter()
        .map(|record| {
            vec![
                Cell::text(&record.date),
                Cell::text(&record.artist),
                Cell::text(&record.venue),
                Cell::text(&record.city),
            ]
        })
        .collect();

    let summary = &views.summary;
    let mut summary_section = ReportSection::new("Summary", &["Metric", "Value"]);
    summary_section.rows = vec![
        vec![Cell::text("Total Shows"), Cell::count(summary.total_shows)],
        vec![Cell::text("Unique Artists"), Cell::count(summary.unique_artists)],
        vec![Cell::text("Unique Venues"), Cell::count(summary.unique_venues)],
        vec![Cell::text("Unique Cities"), Cell::count(summary.unique_cities)],
        vec![Cell::text("Festival Shows"), Cell::count(summary.festival_shows)],
        vec![Cell::text("Most Recent Show"), Cell::text(&summary.most_recent)],
        vec![Cell::text("Oldest Show"), Cell::text(&summary.oldest)],
        vec![Cell::text("Collection Method"), Cell::text(&summary.collection_method)],
    ];

    vec![
        all_shows,
        summary_section,
        ReportSection::grouped("Top Artists", "Artist", &views.top_artists),
        ReportSection::grouped("Shows by City", "City", &views.by_city),
        ReportSection::grouped("Shows by Year", "Year", &views.by_year),
    ]
}

/// Render the sections into an xlsx workbook held in memory.
#[instrument(skip_all, fields(sections = sections.len()))]
pub fn render_workbook(sections: &[ReportSection]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    for section in sections {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&section.name)?;

        for (col, header) in section.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, header, &bold)?;
        }

        for (row_index, row) in section.rows.iter().enumerate() {
            let row_number = (row_index + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(text) => {
                        worksheet.write_string(row_number, col as u16, text)?;
                    }
                    Cell::Number(number) => {
                        worksheet.write_number(row_number, col as u16, *number)?;
                    }
                }
            }
        }

        for (col, width) in section.column_widths().into_iter().enumerate() {
            worksheet.set_column_width(col as u16, width as f64)?;
        }
        debug!(sheet = %section.name, rows = section.rows.len(), "Wrote report sheet");
    }

    Ok(workbook.save_to_buffer()?)
}

/// The full report for a set of views, as xlsx bytes.
pub fn build_report(views: &AggregateViews) -> Result<Vec<u8>> {
    render_workbook(&build_sections(views))
}
