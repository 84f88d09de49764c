//! Unit tests for the agent client module.

mod client_tests;
mod http_tests;
