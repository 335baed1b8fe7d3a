pub mod app;
pub mod backend;
pub mod batch;
pub mod config;
pub mod content;
pub mod decision;
pub mod shared;
pub mod templates;
pub mod tui;
pub mod wizard;
