//! Shared fixtures for database-backed tests.

mod db;

pub use context::TestContext;
