//! # Lossless Container I/O
//!
//! Thin adapters around the `image` crate so callers can hand the codec
//! encoded image bytes or file paths instead of decoded pixel buffers.
//!
//! ## Accepted formats
//! PNG, BMP, TIFF, TGA, PNM and QOI. Everything else is refused with
//! [`StegoError::LossyContainer`]; JPEG, WebP and AVIF recompress pixels
//! and would destroy the payload.
//!
//! In-memory embedding always produces PNG.

use image::{DynamicImage, ImageFormat};
use log::{debug, info};
use std::io::Cursor;
use std::path::Path;

use crate::codec::transform::{Message, SecretKey};
use crate::codec::StegoCodec;
use crate::common::error::{Result, StegoError};

fn ensure_lossless(format: ImageFormat) -> Result<()> {
    match format {
        ImageFormat::Png
        | ImageFormat::Bmp
        | ImageFormat::Tiff
        | ImageFormat::Tga
        | ImageFormat::Pnm
        | ImageFormat::Qoi => Ok(()),
        other => Err(StegoError::LossyContainer(format!("{:?}", other))),
    }
}

/// Embed a message into an encoded image and return PNG bytes plus the key.
///
/// # Arguments
/// - `image_bytes`: Raw bytes of the carrier image (any accepted format)
/// - `message`: Text or binary message to hide
/// - `codec`: Codec carrying the depth limit, delimiter and diagnostics
///
/// # Returns
/// - `Ok((png_bytes, key))`: PNG-encoded stego image and its one-time key
/// - `Err`: If the container is lossy or unreadable, the color mode is
///   unsupported, or the message does not fit
///
/// # Example
/// ```ignore
/// let carrier = std::fs::read("cover.png")?;
/// let (stego, key) = embed_bytes(&carrier, &Message::from("Secret message"), &StegoCodec::default())?;
/// std::fs::write("stego.png", stego)?;
/// println!("key: {}", key.to_token());
/// ```
pub fn embed_bytes(
    image_bytes: &[u8],
    message: &Message,
    codec: &StegoCodec,
) -> Result<(Vec<u8>, SecretKey)> {
    let carrier = decode_container(image_bytes)?;
    let encoded = codec.encode(&carrier, message)?;

    let mut output_bytes = Vec::new();
    encoded
        .image
        .write_to(&mut Cursor::new(&mut output_bytes), ImageFormat::Png)?;

    info!(
        "Embedded {} byte message at depth {} ({} byte PNG)",
        message.len(),
        encoded.depth,
        output_bytes.len()
    );
    Ok((output_bytes, encoded.key))
}

/// Extract a message from an encoded stego image.
///
/// # Errors
/// - The container is lossy or cannot be decoded
/// - Any decode error from [`StegoCodec::decode`]
pub fn extract_bytes(image_bytes: &[u8], key: &SecretKey, codec: &StegoCodec) -> Result<Message> {
    let stego = decode_container(image_bytes)?;
    codec.decode(&stego, key)
}

/// Open a carrier or stego image from disk. The format is taken from the
/// file extension and must be lossless.
pub fn load_carrier<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();
    ensure_lossless(ImageFormat::from_path(path)?)?;

    let image = image::open(path)?;
    debug!(
        "Loaded {} ({}x{}, {:?})",
        path.display(),
        image.width(),
        image.height(),
        image.color()
    );
    Ok(image)
}

/// Write a stego image to disk in the lossless format named by the extension.
pub fn save_stego<P: AsRef<Path>>(image: &DynamicImage, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path)?;
    ensure_lossless(format)?;

    image.save_with_format(path, format)?;
    debug!("Saved stego image to {}", path.display());
    Ok(())
}

fn decode_container(image_bytes: &[u8]) -> Result<DynamicImage> {
    ensure_lossless(image::guess_format(image_bytes)?)?;
    Ok(image::load_from_memory(image_bytes)?)
}
