//! In-memory metrics source for tests and local runs.

mod source;

pub use source::InMemoryMetricsSource;
