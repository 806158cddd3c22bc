//! sitegen-worker library: wiring exposed for tests.

pub mod app;
pub mod commands;
