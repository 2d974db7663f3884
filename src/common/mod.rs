//! # Common Components
//!
//! Shared utilities used by the codec, the container layer and the CLI.
//!
//! ## Modules
//!
//! - [`config`]: Codec settings and TOML loading
//! - [`error`]: The crate-wide error type

pub mod config;
pub mod error;
