pub mod backend;
pub mod engine;
pub mod factory;
pub mod health;
