//! End-to-end tests over the full caption session with in-memory fakes.

pub mod fakes;
pub mod pipeline_tests;
pub mod playback_tests;
