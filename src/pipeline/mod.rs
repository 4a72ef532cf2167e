// Crawl pipeline: extraction, location resolution, pagination, aggregation, report
pub mod aggregate;
pub mod controller;
pub mod extract;
pub mod location;
pub mod pagination;
pub mod report;
