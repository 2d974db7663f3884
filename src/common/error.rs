//! # Error Types
//!
//! Every fallible operation in the library returns [`StegoError`]. Binaries wrap
//! it in `anyhow` at the edge.

use thiserror::Error;

/// Errors raised while embedding or recovering a hidden message.
#[derive(Error, Debug)]
pub enum StegoError {
    /// The framed message does not fit even at the maximum allowed depth.
    #[error("message too large for this image: needs {required} channel slots at depth {max_depth}, image has {available}")]
    MessageTooLarge {
        required: usize,
        available: usize,
        max_depth: u8,
    },

    /// The carrier is not an 8-bit RGB or RGBA image.
    #[error("unsupported image mode {0}: expected 8-bit RGB or RGBA")]
    UnsupportedMode(String),

    /// The key token is not a well-formed secret key.
    #[error("secret key is malformed")]
    InvalidKey,

    /// Authentication failed: wrong key or tampered carrier.
    #[error("decryption failed: cannot recover message (wrong key or tampered image)")]
    DecryptionFailed,

    /// The image ran out of channels before the frame was complete.
    #[error("truncated or corrupt stegano-stream: image exhausted after {channels_read} channels")]
    TruncatedStream { channels_read: usize },

    /// The embedded depth or length field could not be interpreted.
    #[error("malformed frame header: {0}")]
    MalformedHeader(String),

    /// The authenticated plaintext could not be turned back into a message.
    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    /// Writer and planner disagree about capacity. Always a defect.
    #[error("internal consistency error: {0}")]
    Internal(String),

    #[error("invalid codec options: {0}")]
    InvalidOptions(String),

    /// The container format would not preserve low-order bits.
    #[error("lossy container format {0} cannot carry LSB payloads")]
    LossyContainer(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, StegoError>;
