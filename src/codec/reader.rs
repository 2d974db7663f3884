//! # Pixel Stream Reader
//!
//! Walks the stego image in the same raster order the writer used and feeds a
//! [`FrameParser`] one channel at a time. The parser decides how many low
//! bits each channel contributes:
//!
//! | State         | Bits per channel              |
//! |---------------|-------------------------------|
//! | `ReadDepth`   | 1                             |
//! | `ReadHeader`  | 1                             |
//! | `ReadPayload` | `min(depth, bits remaining)`  |
//! | `Done`        | stop scanning                 |
//!
//! Running out of pixels before `Done` means the image is not the one that
//! was encoded, or was cropped, and is reported as
//! [`StegoError::TruncatedStream`]. A length field asking for more channels
//! than the image has left is reported the same way as soon as it is read.

use image::{ImageBuffer, Pixel};

use crate::codec::bits::{self, TextWidth};
use crate::codec::capacity::{self, CARRIER_CHANNELS};
use crate::codec::frame::{FrameParser, ParseState};
use crate::common::error::{Result, StegoError};
use crate::diagnostics::{Diagnostics, StegoEvent};

/// Payload recovered from a stego image, still sealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredFrame {
    pub depth: u8,
    pub payload: Vec<bool>,
    pub channels_read: usize,
}

pub struct PixelStreamReader<'d> {
    parser: FrameParser,
    diagnostics: &'d dyn Diagnostics,
    channels_read: usize,
    channel_budget: usize,
    scratch: Vec<bool>,
}

impl<'d> PixelStreamReader<'d> {
    pub fn new(delimiter: char, width: TextWidth, diagnostics: &'d dyn Diagnostics) -> Self {
        Self {
            parser: FrameParser::new(delimiter, width),
            diagnostics,
            channels_read: 0,
            channel_budget: 0,
            scratch: Vec::with_capacity(8),
        }
    }

    /// Scans `image` until the frame is complete.
    pub fn read<P>(mut self, image: &ImageBuffer<P, Vec<u8>>) -> Result<RecoveredFrame>
    where
        P: Pixel<Subpixel = u8>,
    {
        let pixel_count = image.width() as usize * image.height() as usize;
        self.channel_budget = capacity::available_slots(pixel_count);
        for pixel in image.pixels() {
            for &channel in pixel.channels().iter().take(CARRIER_CHANNELS) {
                if let Some(depth) = self.feed(channel)? {
                    return Ok(self.finish(depth));
                }
            }
        }

        Err(self.truncated())
    }

    /// Reports the channels a full scan of the image would have read.
    fn truncated(&self) -> StegoError {
        StegoError::TruncatedStream {
            channels_read: self.channels_read.max(self.channel_budget),
        }
    }

    /// Consumes one channel. Returns the depth once the frame is complete.
    fn feed(&mut self, channel: u8) -> Result<Option<u8>> {
        self.scratch.clear();
        bits::push_low_bits(channel, self.parser.bits_wanted(), &mut self.scratch);
        self.channels_read += 1;

        match self.parser.push(&self.scratch)? {
            Some(ParseState::ReadHeader { depth }) => {
                self.diagnostics.record(&StegoEvent::DepthRecovered { depth });
            }
            Some(ParseState::ReadPayload { payload_bits, .. }) => {
                self.record_header(payload_bits);
                let channels_left = self.channel_budget - self.channels_read;
                if self.parser.payload_channels_left() > channels_left {
                    return Err(self.truncated());
                }
            }
            Some(ParseState::Done {
                depth,
                payload_bits,
            }) => {
                if payload_bits == 0 {
                    self.record_header(0);
                }
                return Ok(Some(depth));
            }
            Some(ParseState::ReadDepth) | None => {}
        }
        Ok(None)
    }

    fn record_header(&self, payload_bits: usize) {
        self.diagnostics.record(&StegoEvent::HeaderRecovered {
            payload_bits,
            header_bits: self.parser.header_len(),
        });
    }

    fn finish(self, depth: u8) -> RecoveredFrame {
        let channels_read = self.channels_read;
        let payload = self.parser.into_payload();

        self.diagnostics.record(&StegoEvent::PayloadRecovered {
            payload_bits: payload.len(),
            channels_read,
        });

        RecoveredFrame {
            depth,
            payload,
            channels_read,
        }
    }
}
