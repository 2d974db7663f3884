//! # Frame Format
//!
//! The embedded bitstream is self-describing:
//!
//! ```text
//! [depth unit][decimal payload bit length][delimiter][payload bits]
//!  \___________ 1 bit per channel ________________/  \ depth bits /
//!                                                      per channel
//! ```
//!
//! The depth unit is a single digit encoded as one text unit (8 bits for
//! UTF-8, 16 for UTF-16). The length field is plain decimal text, so the
//! delimiter must never be a digit.
//!
//! [`FrameBuilder`] produces the bits on the encode side. [`FrameParser`]
//! consumes them incrementally on the decode side and is driven by the pixel
//! reader one channel at a time.

use crate::codec::bits::{self, TextWidth};
use crate::common::config::MAX_SUPPORTED_DEPTH;
use crate::common::error::{Result, StegoError};

/// A fully built frame, split at the point where the per-channel depth changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub depth: u8,
    /// Depth unit plus length field, written one bit per channel
    pub header: Vec<bool>,
    /// Sealed payload, written `depth` bits per channel
    pub payload: Vec<bool>,
}

impl Frame {
    /// Total number of frame bits.
    pub fn len(&self) -> usize {
        self.header.len() + self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FrameBuilder {
    delimiter: char,
    width: TextWidth,
}

impl FrameBuilder {
    pub fn new(delimiter: char, width: TextWidth) -> Self {
        Self { delimiter, width }
    }

    fn length_field(&self, payload_bits: usize) -> String {
        format!("{}{}", payload_bits, self.delimiter)
    }

    /// Header size for a payload of `payload_bits`. The depth unit has a fixed
    /// width, so this does not depend on the depth that ends up being chosen.
    pub fn header_len(&self, payload_bits: usize) -> usize {
        self.width.bits() + bits::text_to_bits(&self.length_field(payload_bits), self.width).len()
    }

    /// Assembles the frame for `payload` embedded at `depth`.
    pub fn build(&self, depth: u8, payload: Vec<bool>) -> Result<Frame> {
        if !(1..=MAX_SUPPORTED_DEPTH).contains(&depth) {
            return Err(StegoError::InvalidOptions(format!(
                "depth must be between 1 and {}, got {}",
                MAX_SUPPORTED_DEPTH, depth
            )));
        }

        let mut header = bits::text_to_bits(&depth.to_string(), self.width);
        header.extend(bits::text_to_bits(&self.length_field(payload.len()), self.width));

        Ok(Frame {
            depth,
            header,
            payload,
        })
    }
}

/// Where the parser is in the frame. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    ReadDepth,
    ReadHeader { depth: u8 },
    ReadPayload { depth: u8, payload_bits: usize },
    Done { depth: u8, payload_bits: usize },
}

/// Incremental frame decoder.
///
/// The caller asks [`FrameParser::bits_wanted`] how many low bits to take from
/// the next channel, then hands them over with [`FrameParser::push`].
#[derive(Debug)]
pub struct FrameParser {
    delimiter: char,
    delimiter_bytes: Vec<u8>,
    width: TextWidth,
    state: ParseState,
    depth_bits: Vec<bool>,
    header_bit_count: usize,
    /// Bits of the byte currently being assembled
    pending_byte: Vec<bool>,
    /// Length field bytes, one byte appended per eight bits
    header_bytes: Vec<u8>,
    /// A delimiter-terminated prefix failed to decode; later prefixes contain
    /// it and cannot decode either.
    undecodable: bool,
    payload: Vec<bool>,
}

impl FrameParser {
    pub fn new(delimiter: char, width: TextWidth) -> Self {
        Self {
            delimiter,
            delimiter_bytes: width.encode(delimiter.encode_utf8(&mut [0u8; 4])),
            width,
            state: ParseState::ReadDepth,
            depth_bits: Vec::with_capacity(width.bits()),
            header_bit_count: 0,
            pending_byte: Vec::with_capacity(8),
            header_bytes: Vec::new(),
            undecodable: false,
            payload: Vec::new(),
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, ParseState::Done { .. })
    }

    /// Header bits consumed so far, depth unit included.
    pub fn header_len(&self) -> usize {
        self.depth_bits.len() + self.header_bit_count
    }

    /// Channels still needed to complete the payload. Zero outside `ReadPayload`.
    pub fn payload_channels_left(&self) -> usize {
        match self.state {
            ParseState::ReadPayload {
                depth,
                payload_bits,
            } => (payload_bits - self.payload.len()).div_ceil(usize::from(depth)),
            _ => 0,
        }
    }

    /// How many bits the next channel should contribute. Zero once done.
    pub fn bits_wanted(&self) -> usize {
        match self.state {
            ParseState::ReadDepth | ParseState::ReadHeader { .. } => 1,
            ParseState::ReadPayload {
                depth,
                payload_bits,
            } => usize::from(depth).min(payload_bits - self.payload.len()),
            ParseState::Done { .. } => 0,
        }
    }

    /// Feeds the bits read from one channel, MSB first.
    ///
    /// Returns the new state when this push caused a transition.
    pub fn push(&mut self, bits: &[bool]) -> Result<Option<ParseState>> {
        if bits.len() != self.bits_wanted() {
            return Err(StegoError::Internal(format!(
                "frame parser expected {} bits, got {}",
                self.bits_wanted(),
                bits.len()
            )));
        }

        let next = match self.state {
            ParseState::ReadDepth => {
                self.depth_bits.extend_from_slice(bits);
                if self.depth_bits.len() < self.width.bits() {
                    return Ok(None);
                }
                ParseState::ReadHeader {
                    depth: self.decode_depth()?,
                }
            }
            ParseState::ReadHeader { depth } => {
                self.push_header_bits(bits);
                match self.decode_length()? {
                    Some(0) => ParseState::Done {
                        depth,
                        payload_bits: 0,
                    },
                    Some(payload_bits) => ParseState::ReadPayload {
                        depth,
                        payload_bits,
                    },
                    None => return Ok(None),
                }
            }
            ParseState::ReadPayload {
                depth,
                payload_bits,
            } => {
                self.payload.extend_from_slice(bits);
                if self.payload.len() < payload_bits {
                    return Ok(None);
                }
                ParseState::Done {
                    depth,
                    payload_bits,
                }
            }
            ParseState::Done { .. } => return Ok(None),
        };

        self.state = next;
        Ok(Some(next))
    }

    /// Hands over the payload bits. Only meaningful once done.
    pub fn into_payload(self) -> Vec<bool> {
        self.payload
    }

    fn decode_depth(&self) -> Result<u8> {
        let text = bits::bits_to_text(&self.depth_bits, self.width).ok_or_else(|| {
            StegoError::MalformedHeader("depth unit is not valid text".to_string())
        })?;

        match text.parse::<u8>() {
            Ok(depth) if (1..=MAX_SUPPORTED_DEPTH).contains(&depth) => Ok(depth),
            _ => Err(StegoError::MalformedHeader(format!(
                "depth unit {:?} is not a depth between 1 and {}",
                text, MAX_SUPPORTED_DEPTH
            ))),
        }
    }

    fn push_header_bits(&mut self, bits: &[bool]) {
        for &bit in bits {
            self.pending_byte.push(bit);
            self.header_bit_count += 1;
            if self.pending_byte.len() == 8 {
                self.header_bytes.extend(bits::bits_to_bytes(&self.pending_byte));
                self.pending_byte.clear();
            }
        }
    }

    /// Tries to finish the length field. `None` means keep reading.
    fn decode_length(&mut self) -> Result<Option<usize>> {
        if self.undecodable
            || self.header_bit_count % self.width.bits() != 0
            || !self.header_bytes.ends_with(&self.delimiter_bytes)
        {
            return Ok(None);
        }

        let Some(text) = self.width.decode(&self.header_bytes) else {
            self.undecodable = true;
            return Ok(None);
        };
        let Some(digits) = text.strip_suffix(self.delimiter) else {
            return Ok(None);
        };

        digits.parse::<usize>().map(Some).map_err(|_| {
            StegoError::MalformedHeader(format!("length field {:?} is not a bit count", digits))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(parser: &mut FrameParser, frame: &Frame) {
        let mut stream = frame.header.iter().chain(frame.payload.iter()).copied();
        while !parser.is_done() {
            let wanted = parser.bits_wanted();
            let chunk: Vec<bool> = stream.by_ref().take(wanted).collect();
            parser.push(&chunk).unwrap();
        }
        assert_eq!(stream.next(), None);
    }

    #[test]
    fn test_build_layout() {
        let builder = FrameBuilder::new(':', TextWidth::Utf8);
        let payload = vec![true; 12];
        let frame = builder.build(2, payload.clone()).unwrap();

        // "2" then "12:"
        let mut expected = bits::text_to_bits("2", TextWidth::Utf8);
        expected.extend(bits::text_to_bits("12:", TextWidth::Utf8));
        assert_eq!(frame.header, expected);
        assert_eq!(frame.payload, payload);
        assert_eq!(builder.header_len(12), frame.header.len());
        assert_eq!(frame.len(), 32 + 12);
    }

    #[test]
    fn test_build_rejects_invalid_depth() {
        let builder = FrameBuilder::new(':', TextWidth::Utf8);
        assert!(builder.build(0, vec![]).is_err());
        assert!(builder.build(9, vec![]).is_err());
    }

    #[test]
    fn test_parser_walks_states_in_order() {
        let builder = FrameBuilder::new(':', TextWidth::Utf8);
        let payload: Vec<bool> = (0..10).map(|i| i % 3 == 0).collect();
        let frame = builder.build(3, payload.clone()).unwrap();

        let mut parser = FrameParser::new(':', TextWidth::Utf8);
        let mut transitions = Vec::new();
        let mut stream = frame.header.iter().chain(frame.payload.iter()).copied();
        while !parser.is_done() {
            let chunk: Vec<bool> = stream.by_ref().take(parser.bits_wanted()).collect();
            if let Some(state) = parser.push(&chunk).unwrap() {
                transitions.push(state);
            }
        }

        assert_eq!(
            transitions,
            vec![
                ParseState::ReadHeader { depth: 3 },
                ParseState::ReadPayload {
                    depth: 3,
                    payload_bits: 10
                },
                ParseState::Done {
                    depth: 3,
                    payload_bits: 10
                },
            ]
        );
        assert_eq!(parser.header_len(), frame.header.len());
        assert_eq!(parser.into_payload(), payload);
    }

    #[test]
    fn test_parser_takes_partial_final_group() {
        let builder = FrameBuilder::new('#', TextWidth::Utf8);
        let frame = builder.build(4, vec![true; 6]).unwrap();
        let mut parser = FrameParser::new('#', TextWidth::Utf8);

        let mut stream = frame.header.iter().chain(frame.payload.iter()).copied();
        while !matches!(parser.state(), ParseState::ReadPayload { .. }) {
            let chunk: Vec<bool> = stream.by_ref().take(1).collect();
            parser.push(&chunk).unwrap();
        }
        assert_eq!(parser.bits_wanted(), 4);
        parser.push(&[true; 4]).unwrap();
        assert_eq!(parser.bits_wanted(), 2);
        parser.push(&[true; 2]).unwrap();
        assert!(parser.is_done());
        assert_eq!(parser.bits_wanted(), 0);
    }

    #[test]
    fn test_parser_utf16_units() {
        let builder = FrameBuilder::new(':', TextWidth::Utf16);
        let frame = builder.build(1, vec![false, true, true]).unwrap();
        assert_eq!(frame.header.len(), 16 * 3);

        let mut parser = FrameParser::new(':', TextWidth::Utf16);
        feed_all(&mut parser, &frame);
        assert_eq!(parser.into_payload(), vec![false, true, true]);
    }

    #[test]
    fn test_empty_payload_finishes_after_header() {
        let builder = FrameBuilder::new(':', TextWidth::Utf8);
        let frame = builder.build(1, vec![]).unwrap();
        let mut parser = FrameParser::new(':', TextWidth::Utf8);
        feed_all(&mut parser, &frame);
        assert!(parser.into_payload().is_empty());
    }

    #[test]
    fn test_invalid_depth_unit_is_malformed() {
        let mut parser = FrameParser::new(':', TextWidth::Utf8);
        let bits = bits::text_to_bits("x", TextWidth::Utf8);
        for bit in &bits[..7] {
            assert_eq!(parser.push(&[*bit]).unwrap(), None);
        }
        assert!(matches!(
            parser.push(&bits[7..]),
            Err(StegoError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_header_keeps_reading_past_invalid_text() {
        let mut parser = FrameParser::new(':', TextWidth::Utf8);
        for bit in bits::text_to_bits("1", TextWidth::Utf8) {
            parser.push(&[bit]).unwrap();
        }
        // An invalid lead byte followed by ':' never decodes, so the parser
        // keeps accumulating instead of failing.
        let mut garbage = bits::bytes_to_bits(&[0xFF]);
        garbage.extend(bits::text_to_bits(":", TextWidth::Utf8));
        for bit in garbage {
            assert_eq!(parser.push(&[bit]).unwrap(), None);
        }
        assert_eq!(parser.state(), ParseState::ReadHeader { depth: 1 });
    }

    #[test]
    fn test_header_bytes_grow_one_per_eight_bits() {
        let mut parser = FrameParser::new(':', TextWidth::Utf8);
        for bit in bits::text_to_bits("1", TextWidth::Utf8) {
            parser.push(&[bit]).unwrap();
        }
        for i in 1..=8 * 64 {
            parser.push(&[false]).unwrap();
            assert_eq!(parser.header_bytes.len(), i / 8);
            assert_eq!(parser.pending_byte.len(), i % 8);
        }
        assert_eq!(parser.header_len(), 8 + 8 * 64);
        assert_eq!(parser.state(), ParseState::ReadHeader { depth: 1 });
    }

    #[test]
    fn test_undecodable_prefix_is_not_decoded_again() {
        let mut parser = FrameParser::new(':', TextWidth::Utf8);
        let mut stream = bits::text_to_bits("1", TextWidth::Utf8);
        stream.extend(bits::bytes_to_bits(&[0xFF]));
        stream.extend(bits::text_to_bits(":12:", TextWidth::Utf8));
        for bit in stream {
            assert_eq!(parser.push(&[bit]).unwrap(), None);
        }
        assert!(parser.undecodable);
        assert_eq!(parser.state(), ParseState::ReadHeader { depth: 1 });
    }

    #[test]
    fn test_payload_channels_left_counts_partial_group() {
        let builder = FrameBuilder::new(':', TextWidth::Utf8);
        let frame = builder.build(3, vec![true; 10]).unwrap();
        let mut parser = FrameParser::new(':', TextWidth::Utf8);
        assert_eq!(parser.payload_channels_left(), 0);

        for bit in &frame.header {
            parser.push(&[*bit]).unwrap();
        }
        assert_eq!(parser.payload_channels_left(), 4);
        parser.push(&[true; 3]).unwrap();
        assert_eq!(parser.payload_channels_left(), 3);
    }

    #[test]
    fn test_length_beyond_usize_is_malformed() {
        let mut parser = FrameParser::new(':', TextWidth::Utf8);
        let mut stream = bits::text_to_bits("1", TextWidth::Utf8);
        stream.extend(bits::text_to_bits(&format!("{}0:", usize::MAX), TextWidth::Utf8));
        let (last, head) = stream.split_last().unwrap();
        for bit in head {
            parser.push(&[*bit]).unwrap();
        }
        assert!(matches!(
            parser.push(&[*last]),
            Err(StegoError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_non_numeric_length_is_malformed() {
        let mut parser = FrameParser::new(':', TextWidth::Utf8);
        let mut stream = bits::text_to_bits("2", TextWidth::Utf8);
        stream.extend(bits::text_to_bits("ab:", TextWidth::Utf8));
        let (last, head) = stream.split_last().unwrap();
        for bit in head {
            parser.push(&[*bit]).unwrap();
        }
        assert!(matches!(
            parser.push(&[*last]),
            Err(StegoError::MalformedHeader(_))
        ));
    }
}
