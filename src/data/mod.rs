//! Data module - dataset loading, time keys and cutoff queries

mod loader;
mod pipeline;
mod timeline;

pub use loader::{DataSource, DEFAULT_SOURCE};
pub use pipeline::{AggregateResult, DataPipeline, LoadOptions, LocationTotals, RecordSet, TOP_N};
pub use timeline::{TimeKey, Timeline};
