//! # Variable-Depth LSB Codec
//!
//! Hides a sealed message in the low-order bits of an RGB or RGBA image.
//!
//! ## Encoding
//! 1. Seal the message ([`transform::seal`]): compress text, encrypt under a
//!    fresh key
//! 2. Size the header and pick the smallest depth that fits
//!    ([`capacity::plan`])
//! 3. Build the frame ([`frame::FrameBuilder`])
//! 4. Write it into a copy of the carrier ([`writer::write_frame`])
//!
//! ## Decoding
//! 1. Scan the image with [`reader::PixelStreamReader`], which recovers the
//!    depth, then the length, then exactly that many payload bits
//! 2. Open the payload with the caller's key ([`transform::open`])
//!
//! ## Modules
//!
//! - [`bits`]: bit/byte/text conversions
//! - [`transform`]: compression and authenticated encryption
//! - [`capacity`]: depth planning
//! - [`frame`]: frame building and incremental parsing
//! - [`writer`]: embedding pass
//! - [`reader`]: extraction pass

pub mod bits;
pub mod capacity;
pub mod frame;
pub mod reader;
pub mod transform;
pub mod writer;

use image::DynamicImage;
use std::sync::Arc;

use crate::common::config::CodecConfig;
use crate::common::error::{Result, StegoError};
use crate::diagnostics::{Diagnostics, LogDiagnostics, StegoEvent};
use frame::FrameBuilder;
use reader::PixelStreamReader;
use transform::{Message, SecretKey};

/// Output of a successful encode.
#[derive(Debug)]
pub struct Encoded {
    /// Stego image with the same dimensions and color type as the carrier
    pub image: DynamicImage,
    /// The only way to get the message back
    pub key: SecretKey,
    /// Bits per channel used for the payload
    pub depth: u8,
}

/// Encoder/decoder bound to one [`CodecConfig`].
///
/// Holds no per-call state, so one instance can serve many threads.
#[derive(Clone)]
pub struct StegoCodec {
    config: CodecConfig,
    diagnostics: Arc<dyn Diagnostics>,
}

impl std::fmt::Debug for StegoCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StegoCodec")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for StegoCodec {
    fn default() -> Self {
        Self {
            config: CodecConfig::default(),
            diagnostics: Arc::new(LogDiagnostics),
        }
    }
}

impl StegoCodec {
    /// Creates a codec after validating `config`. Events go to the `log`
    /// facade until [`StegoCodec::with_diagnostics`] says otherwise.
    pub fn new(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            diagnostics: Arc::new(LogDiagnostics),
        })
    }

    /// Routes codec events to `diagnostics`.
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Hides `message` in a copy of `carrier`.
    ///
    /// # Errors
    /// - [`StegoError::UnsupportedMode`] if the carrier is not 8-bit RGB/RGBA
    /// - [`StegoError::MessageTooLarge`] if the frame does not fit at
    ///   `max_depth`
    /// - [`StegoError::Internal`] if the writer runs out of pixels anyway
    pub fn encode(&self, carrier: &DynamicImage, message: &Message) -> Result<Encoded> {
        ensure_supported(carrier)?;

        let sealed = transform::seal(message)?;
        self.diagnostics.record(&StegoEvent::PayloadSealed {
            message_bytes: message.len(),
            sealed_bytes: sealed.payload.len(),
            compressed: sealed.compressed,
        });

        let payload = bits::bytes_to_bits(&sealed.payload);
        let builder = FrameBuilder::new(self.config.delimiter, self.config.text_width);
        let header_bits = builder.header_len(payload.len());
        let pixel_count = carrier.width() as usize * carrier.height() as usize;

        let depth = capacity::plan(pixel_count, header_bits, payload.len(), self.config.max_depth)?;
        self.diagnostics.record(&StegoEvent::DepthPlanned {
            depth,
            frame_bits: header_bits + payload.len(),
            required_slots: capacity::required_slots(header_bits, payload.len(), depth),
            available_slots: capacity::available_slots(pixel_count),
        });

        let frame = builder.build(depth, payload)?;

        let (image, channels_touched) = match carrier {
            DynamicImage::ImageRgb8(buffer) => {
                let mut stego = buffer.clone();
                let touched = writer::write_frame(&mut stego, &frame)?;
                (DynamicImage::ImageRgb8(stego), touched)
            }
            DynamicImage::ImageRgba8(buffer) => {
                let mut stego = buffer.clone();
                let touched = writer::write_frame(&mut stego, &frame)?;
                (DynamicImage::ImageRgba8(stego), touched)
            }
            other => return Err(unsupported(other)),
        };
        self.diagnostics
            .record(&StegoEvent::FrameWritten { channels_touched });

        Ok(Encoded {
            image,
            key: sealed.key,
            depth,
        })
    }

    /// Recovers the message hidden in `stego`.
    ///
    /// # Errors
    /// - [`StegoError::UnsupportedMode`] if the image is not 8-bit RGB/RGBA
    /// - [`StegoError::TruncatedStream`] if the image ends before the frame,
    ///   or the length field claims more bits than the image holds
    /// - [`StegoError::MalformedHeader`] if the header is not a valid frame
    /// - [`StegoError::DecryptionFailed`] if `key` does not open the payload
    pub fn decode(&self, stego: &DynamicImage, key: &SecretKey) -> Result<Message> {
        let reader = PixelStreamReader::new(
            self.config.delimiter,
            self.config.text_width,
            self.diagnostics.as_ref(),
        );

        let recovered = match stego {
            DynamicImage::ImageRgb8(buffer) => reader.read(buffer)?,
            DynamicImage::ImageRgba8(buffer) => reader.read(buffer)?,
            other => return Err(unsupported(other)),
        };

        transform::open(&bits::bits_to_bytes(&recovered.payload), key)
    }

    /// Like [`StegoCodec::decode`], taking the key in its token form. A
    /// malformed token is rejected before the image is scanned.
    pub fn decode_with_token(&self, stego: &DynamicImage, token: &str) -> Result<Message> {
        let key = SecretKey::from_token(token)?;
        self.decode(stego, &key)
    }
}

/// Encodes with the default configuration.
pub fn encode(carrier: &DynamicImage, message: impl Into<Message>) -> Result<Encoded> {
    StegoCodec::default().encode(carrier, &message.into())
}

/// Decodes with the default configuration.
pub fn decode(stego: &DynamicImage, key: &SecretKey) -> Result<Message> {
    StegoCodec::default().decode(stego, key)
}

fn ensure_supported(image: &DynamicImage) -> Result<()> {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => Ok(()),
        other => Err(unsupported(other)),
    }
}

fn unsupported(image: &DynamicImage) -> StegoError {
    StegoError::UnsupportedMode(format!("{:?}", image.color()))
}
