// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod audio;
pub mod ball;
pub mod capture;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod geometry;
pub mod history;
pub mod pose;
pub mod render;
pub mod replay;
pub mod runtime;
pub mod session;
pub mod simulate;
