//! Metrics collection services.

mod collector;

pub use collector::MetricsCollector;
