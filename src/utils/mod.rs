//! Utility functions and helpers.
//!
//! Environment variable helpers.

pub mod env;

pub use env::get_env_with_prefix;

