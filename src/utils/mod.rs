//! Shared helpers

pub mod geo;
pub mod time;
