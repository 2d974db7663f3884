//! # Pixel Stream Writer
//!
//! Lays a [`Frame`] into an image, walking pixels in raster order (rows top
//! to bottom, pixels left to right) and channels R, G, B within each pixel.
//! Header bits take one channel each. Payload bits take up to `depth` per
//! channel, and the last group only takes what is left. Alpha is never
//! touched, and nothing past the end of the frame is either.

use image::{ImageBuffer, Pixel};

use crate::codec::bits;
use crate::codec::capacity::CARRIER_CHANNELS;
use crate::codec::frame::Frame;
use crate::common::error::{Result, StegoError};

/// Hands out frame bits one channel's worth at a time.
struct FrameCursor<'a> {
    frame: &'a Frame,
    header_pos: usize,
    payload_pos: usize,
}

impl<'a> FrameCursor<'a> {
    fn new(frame: &'a Frame) -> Self {
        Self {
            frame,
            header_pos: 0,
            payload_pos: 0,
        }
    }

    fn is_finished(&self) -> bool {
        self.header_pos == self.frame.header.len() && self.payload_pos == self.frame.payload.len()
    }

    /// Bits for the next channel: one header bit, or up to `depth` payload bits.
    fn next_group(&mut self) -> &'a [bool] {
        let frame = self.frame;
        if self.header_pos < frame.header.len() {
            let start = self.header_pos;
            self.header_pos += 1;
            return &frame.header[start..self.header_pos];
        }

        let remaining = frame.payload.len() - self.payload_pos;
        let take = usize::from(frame.depth).min(remaining);
        let start = self.payload_pos;
        self.payload_pos += take;
        &frame.payload[start..self.payload_pos]
    }
}

/// Writes `frame` into `image` in place and returns how many channels were
/// modified.
///
/// Callers embed into a copy; the planner has already checked capacity, so
/// running out of pixels here is reported as [`StegoError::Internal`].
pub fn write_frame<P>(image: &mut ImageBuffer<P, Vec<u8>>, frame: &Frame) -> Result<usize>
where
    P: Pixel<Subpixel = u8>,
{
    let mut cursor = FrameCursor::new(frame);
    if cursor.is_finished() {
        return Ok(0);
    }

    let mut channels_touched = 0usize;
    for pixel in image.pixels_mut() {
        for channel in pixel.channels_mut().iter_mut().take(CARRIER_CHANNELS) {
            *channel = bits::set_low_bits(*channel, cursor.next_group());
            channels_touched += 1;

            if cursor.is_finished() {
                return Ok(channels_touched);
            }
        }
    }

    Err(StegoError::Internal(format!(
        "image exhausted after {} channels with {} of {} frame bits unwritten",
        channels_touched,
        frame.len() - cursor.header_pos - cursor.payload_pos,
        frame.len()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::bits::TextWidth;
    use crate::codec::frame::FrameBuilder;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_header_uses_one_bit_payload_uses_depth() {
        let frame = Frame {
            depth: 3,
            header: vec![true, false],
            payload: vec![true, true, false, true],
        };
        let mut image = RgbImage::from_pixel(2, 1, Rgb([0b1111_0000, 0b1111_1111, 0]));
        let touched = write_frame(&mut image, &frame).unwrap();

        assert_eq!(touched, 4);
        // Header bits
        assert_eq!(image.get_pixel(0, 0)[0], 0b1111_0001);
        assert_eq!(image.get_pixel(0, 0)[1], 0b1111_1110);
        // First payload group of 3, then a final group of 1
        assert_eq!(image.get_pixel(0, 0)[2], 0b0000_0110);
        assert_eq!(image.get_pixel(1, 0)[0], 0b1111_0001);
        // Untouched after the frame ends
        assert_eq!(image.get_pixel(1, 0)[1], 0b1111_1111);
        assert_eq!(image.get_pixel(1, 0)[2], 0);
    }

    #[test]
    fn test_exact_multiple_final_group() {
        let frame = Frame {
            depth: 2,
            header: vec![],
            payload: vec![true, false, true, true],
        };
        let mut image = RgbImage::from_pixel(1, 1, Rgb([0, 0, 0xFF]));
        assert_eq!(write_frame(&mut image, &frame).unwrap(), 2);
        assert_eq!(image.get_pixel(0, 0).0, [0b10, 0b11, 0xFF]);
    }

    #[test]
    fn test_alpha_is_skipped() {
        let builder = FrameBuilder::new(':', TextWidth::Utf8);
        let frame = builder.build(1, vec![true; 20]).unwrap();
        let mut image = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 77]));
        write_frame(&mut image, &frame).unwrap();
        assert!(image.pixels().all(|p| p[3] == 77));
    }

    #[test]
    fn test_raster_order_is_row_major() {
        let frame = Frame {
            depth: 1,
            header: vec![true; 4],
            payload: vec![],
        };
        let mut image = RgbImage::new(2, 2);
        write_frame(&mut image, &frame).unwrap();
        // The fourth channel is the red of pixel (1, 0), not (0, 1)
        assert_eq!(image.get_pixel(1, 0)[0], 1);
        assert_eq!(image.get_pixel(0, 1)[0], 0);
    }

    #[test]
    fn test_exhausted_image_is_internal_error() {
        let frame = Frame {
            depth: 1,
            header: vec![true; 4],
            payload: vec![],
        };
        let mut image = RgbImage::new(1, 1);
        assert!(matches!(
            write_frame(&mut image, &frame),
            Err(StegoError::Internal(_))
        ));
    }
}
