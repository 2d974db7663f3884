//! # Configuration Utilities
//!
//! Codec settings shared by the encoder, the decoder and the CLI, plus the
//! TOML loader used to read them from disk.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::codec::bits::TextWidth;
use crate::common::error::{Result, StegoError};

/// Deepest per-channel depth the frame format can describe.
pub const MAX_SUPPORTED_DEPTH: u8 = 8;

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Arguments
/// - `path`: Path to the TOML configuration file
///
/// # Returns
/// - `Ok(T)`: Successfully loaded and parsed configuration
/// - `Err`: File I/O or parsing error
///
/// # Example
/// ```ignore
/// let config: CodecConfig = load_config("config/codec.toml")?;
/// ```
pub fn load_config<T, P>(path: P) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Codec parameters. Encoder and decoder must agree on `delimiter` and
/// `text_width`; `max_depth` only matters when encoding.
///
/// # Example TOML
///
/// ```toml
/// max_depth = 3
/// delimiter = ":"
/// text_width = "utf8"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Largest number of low-order bits per channel the encoder may use
    pub max_depth: u8,
    /// Terminates the decimal length field
    pub delimiter: char,
    /// Width of one header text unit
    pub text_width: TextWidth,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            delimiter: ':',
            text_width: TextWidth::Utf8,
        }
    }
}

impl CodecConfig {
    /// Loads and validates codec settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: CodecConfig = load_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the settings describe a frame both sides can parse.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_SUPPORTED_DEPTH).contains(&self.max_depth) {
            return Err(StegoError::InvalidOptions(format!(
                "max_depth must be between 1 and {}, got {}",
                MAX_SUPPORTED_DEPTH, self.max_depth
            )));
        }
        if self.delimiter.is_ascii_digit() {
            return Err(StegoError::InvalidOptions(format!(
                "delimiter {:?} collides with the decimal length field",
                self.delimiter
            )));
        }
        if self.text_width == TextWidth::Utf16 && self.delimiter.len_utf16() != 1 {
            return Err(StegoError::InvalidOptions(format!(
                "delimiter {:?} does not fit in one UTF-16 unit",
                self.delimiter
            )));
        }
        Ok(())
    }
}
