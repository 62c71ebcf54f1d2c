//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::ops::Range;

use media_common::{parse_u16, Writable, Writer};

use crate::error::RtcpError;

pub const VERSION: u8 = 2;

fn is_padded_mask(is_padded: bool) -> u8 {
    if is_padded {
        RtcpHeader::PADDING_MASK
    } else {
        0b0
    }
}

/// Quick check run before walking a buffer: enough bytes for a header and
/// the version bits say 2.
pub fn looks_like_rtcp(packet: &[u8]) -> bool {
    packet.len() >= RtcpHeader::LENGTH && (packet[0] >> 6) == VERSION
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtcpHeader {
    pub version: u8,
    pub has_padding: bool,
    pub count_or_format: u8,
    pub packet_type: u8,
    /// length of the RTCP packet in words, minus the 1-word header
    pub length_in_words: u16,
}

impl RtcpHeader {
    pub const LENGTH: usize = 4;
    const PADDING_MASK: u8 = 0b00100000;
    const RC_MASK: u8 = 0b00011111;
    const PACKET_LENGTH_RANGE: Range<usize> = 2..4;

    // Parses the common header shared by every RTCP packet type.
    // See https://datatracker.ietf.org/doc/html/rfc3550#section-6.4.1
    //
    //     0                   1                   2                   3
    //     0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |V=2|P|  RC/FMT |      PT       |             length            |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    pub fn read_from(bytes: &[u8]) -> Result<Self, RtcpError> {
        RtcpError::check_len(bytes, Self::LENGTH)?;

        Ok(Self {
            version: bytes[0] >> 6,
            has_padding: bytes[0] & Self::PADDING_MASK > 0,
            count_or_format: bytes[0] & Self::RC_MASK,
            packet_type: bytes[1],
            length_in_words: parse_u16(&bytes[Self::PACKET_LENGTH_RANGE]),
        })
    }

    /// Header for a packet that serializes to `total_size` bytes, header included.
    /// `total_size` must already be 32-bit aligned.
    pub fn for_packet(count_or_format: u8, packet_type: u8, total_size: usize) -> Self {
        debug_assert_eq!(0, total_size % 4);
        Self {
            version: VERSION,
            has_padding: false,
            count_or_format: count_or_format & Self::RC_MASK,
            packet_type,
            length_in_words: ((total_size / 4) - 1) as u16,
        }
    }

    /// Number of bytes in the packet, header & padding included
    pub fn packet_length_in_bytes(&self) -> usize {
        (self.length_in_words as usize + 1) * 4
    }

    /// Offset within `packet` where the payload stops, after removing any
    /// trailing padding announced by the P bit.
    pub fn payload_end(&self, packet: &[u8]) -> Result<usize, RtcpError> {
        if !self.has_padding {
            return Ok(packet.len());
        }
        let padding = match packet.last() {
            Some(&padding) => padding as usize,
            None => return Err(RtcpError::Malformed("padding flag set on empty packet")),
        };
        if padding == 0 {
            return Err(RtcpError::Malformed("padding flag set with zero padding"));
        }
        if packet.len() < Self::LENGTH + padding {
            return Err(RtcpError::Malformed("padding longer than packet"));
        }
        Ok(packet.len() - padding)
    }
}

impl Writer for RtcpHeader {
    fn written_len(&self) -> usize {
        Self::LENGTH
    }

    fn write(&self, out: &mut dyn Writable) {
        let first_two_bytes = [
            (VERSION << 6) | is_padded_mask(self.has_padding) | self.count_or_format,
            self.packet_type,
        ];
        first_two_bytes.write(out);
        self.length_in_words.write(out);
    }
}
