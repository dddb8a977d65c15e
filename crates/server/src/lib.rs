//! HTTP surface over a pool of converters.

pub mod api;
pub mod metrics;
pub mod state;
