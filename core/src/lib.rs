pub mod api;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod runner;
pub mod task;
pub mod util;
