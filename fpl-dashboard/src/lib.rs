// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod app;
pub mod config;
pub mod fpl;
pub mod llm;
pub mod model;
pub mod protocol;
pub mod tui;
pub mod views;
