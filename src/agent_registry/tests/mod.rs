//! Unit tests for Agent Card registration and resolution.

mod domain_tests;
pub(crate) mod fixtures;
