//! Unit tests for the metrics module.
