//! Unit tests for task records and lifecycle services.
