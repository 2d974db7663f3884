//! # lsb-stego
//!
//! Hides text or binary messages in the least-significant bits of RGB/RGBA
//! images. Messages are compressed, sealed with AES-256-GCM under a one-time
//! key, framed with a self-describing header, and spread across as few low
//! bits per channel as the image allows.
//!
//! ```ignore
//! use lsb_stego::{decode, encode};
//!
//! let carrier = image::open("cover.png")?;
//! let encoded = encode(&carrier, "meet at dawn")?;
//! let message = decode(&encoded.image, &encoded.key)?;
//! ```
//!
//! ## Modules
//!
//! - [`codec`]: the embedding codec (planning, framing, writing, reading)
//! - [`common`]: configuration and error types
//! - [`diagnostics`]: structured event sinks
//! - [`processing`]: lossless image container I/O

pub mod codec;
pub mod common;
pub mod diagnostics;
pub mod processing;

pub use codec::transform::{Message, SecretKey};
pub use codec::{decode, encode, Encoded, StegoCodec};
pub use common::config::CodecConfig;
pub use common::error::{Result, StegoError};
