//! Command-line front end for the SPB codec.
//!
//! The binary lives in `main.rs`; everything it drives is exposed here so
//! the commands can be exercised from tests without spawning processes.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod summary;
