pub mod config;
pub mod constants;
pub mod envelope;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod types;

// Application use cases and the ports they depend on
pub mod app;
// Adapters that implement the ports
pub mod infra;
