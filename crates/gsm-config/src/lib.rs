//! Stack configuration management
//!
//! This crate provides configuration loading and parsing for the MS layer 1/2 stack:
//! - TOML configuration file parsing
//! - Stack configuration structures (PHY I/O, L1 scheduler, LAPDm timers and counters)
//! - Shared, mutable stack state (timing advance, MS power)

pub mod stack_config;
pub mod toml_config;

pub use stack_config::*;
pub use toml_config::*;
