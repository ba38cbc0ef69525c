//! Library entry for filmbox-cli used by integration tests and embedding.

pub mod commands;
pub mod config;
pub mod imageio;

// Re-export commands for convenience
pub use commands::*;
pub use config::{FormatConfig, FrameLayout};
