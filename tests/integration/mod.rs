//! Integration tests for sqlrun.

pub mod config_test;
pub mod containment_test;
pub mod sqlite_test;
