//! Unit tests for the retrieval module.

mod index_tests;
