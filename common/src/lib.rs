//! Shared building blocks for the `nanowatch` workspace.
//!
//! * [`models`]: snapshots, service health and recovery records.
//! * [`config`]: the TOML configuration file and its defaults.
//! * [`error`]: error types shared across crates.
//! * [`clock`]: injectable time sources.
//! * [`network`]: primary interface selection.

pub mod clock;
pub mod config;
pub mod error;
pub mod log;
pub mod models;
pub mod network;
pub mod utils;
