//! # Image Containers
//!
//! Moves carrier and stego images between the codec and the outside world:
//! raw bytes (uploads and downloads) and files on disk. Only lossless
//! formats are accepted, since anything else would scramble the low bits.

pub mod container;

// Re-export main functions for convenience
pub use container::{embed_bytes, extract_bytes, load_carrier, save_stego};
