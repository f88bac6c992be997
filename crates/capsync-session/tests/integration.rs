//! Integration test runner.
//!
//! Run all integration tests:
//!   cargo test -p capsync-session --test integration

#[path = "integration/mod.rs"]
mod integration;

pub use integration::*;
