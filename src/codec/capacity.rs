//! # Capacity Planning
//!
//! Picks the per-channel depth for an embedding.
//!
//! Every color channel is one *slot*. Header bits always take one slot each,
//! while payload bits are packed `depth` to a slot, so the cost of a frame at
//! depth `n` is
//!
//! ```text
//! header_bits + ceil(payload_bits / n)
//! ```
//!
//! and an image offers `3 * pixel_count` slots (that is `3 * pixel_count * n`
//! bits of raw capacity at depth `n`). The planner returns the smallest depth
//! whose cost fits.

use crate::common::error::{Result, StegoError};

/// Color channels that carry data in every pixel. Alpha never does.
pub const CARRIER_CHANNELS: usize = 3;

/// Slots needed for a frame embedded at `depth`.
pub fn required_slots(header_bits: usize, payload_bits: usize, depth: u8) -> usize {
    header_bits + payload_bits.div_ceil(usize::from(depth))
}

/// Slots an image of `pixel_count` pixels offers.
pub fn available_slots(pixel_count: usize) -> usize {
    CARRIER_CHANNELS * pixel_count
}

/// Chooses the minimum depth in `1..=max_depth` at which the frame fits.
///
/// # Errors
/// - [`StegoError::MessageTooLarge`] when the frame does not fit even at
///   `max_depth`.
pub fn plan(pixel_count: usize, header_bits: usize, payload_bits: usize, max_depth: u8) -> Result<u8> {
    let available = available_slots(pixel_count);

    (1..=max_depth)
        .find(|&depth| required_slots(header_bits, payload_bits, depth) <= available)
        .ok_or(StegoError::MessageTooLarge {
            required: required_slots(header_bits, payload_bits, max_depth.max(1)),
            available,
            max_depth,
        })
}
