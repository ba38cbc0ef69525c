//! Subcommand implementations

pub mod capacity;
pub mod decode;
pub mod encode;
pub mod inspect;
