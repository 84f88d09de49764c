//! Port contracts for fetching agent metrics.

mod source;

pub use source::{MetricsSource, MetricsSourceError};
