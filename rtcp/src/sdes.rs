//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Source description packets (RFC 3550 section 6.5).

use media_common::{parse_u32, read_bytes, read_u8, round_up_to_multiple_of, Writable, Writer};
use strum_macros::{Display, FromRepr, IntoStaticStr};

use crate::{error::RtcpError, header::RtcpHeader, packet_type::PacketType, Ssrc};

const SSRC_LENGTH: usize = 4;
const ITEM_HEADER_LENGTH: usize = 2;
const END_ITEM: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr, IntoStaticStr)]
#[repr(u8)]
pub enum SdesItemType {
    #[strum(serialize = "CNAME")]
    Cname = 1,
    #[strum(serialize = "NAME")]
    Name = 2,
    #[strum(serialize = "EMAIL")]
    Email = 3,
    #[strum(serialize = "PHONE")]
    Phone = 4,
    #[strum(serialize = "LOC")]
    Location = 5,
    #[strum(serialize = "TOOL")]
    Tool = 6,
    #[strum(serialize = "NOTE")]
    Note = 7,
    #[strum(serialize = "PRIV")]
    Private = 8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdesItem {
    /// Kept as a number so that unregistered item types survive a round trip.
    pub item_type: u8,
    /// At most 255 bytes go on the wire.
    pub value: Vec<u8>,
}

impl SdesItem {
    pub fn new(item_type: SdesItemType, value: impl Into<Vec<u8>>) -> Self {
        Self {
            item_type: item_type as u8,
            value: value.into(),
        }
    }

    pub fn known_type(&self) -> Option<SdesItemType> {
        SdesItemType::from_repr(self.item_type)
    }

    pub fn type_name(&self) -> &'static str {
        self.known_type().map(Into::into).unwrap_or("UNKNOWN")
    }

    fn value_len(&self) -> usize {
        self.value.len().min(u8::MAX as usize)
    }
}

impl Writer for SdesItem {
    fn written_len(&self) -> usize {
        ITEM_HEADER_LENGTH + self.value_len()
    }

    fn write(&self, out: &mut dyn Writable) {
        [self.item_type, self.value_len() as u8].write(out);
        self.value[..self.value_len()].write(out);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdesChunk {
    pub ssrc: Ssrc,
    pub items: Vec<SdesItem>,
}

impl SdesChunk {
    // Returns the chunk and the number of bytes it used, terminator and padding included.
    //
    //     0                   1                   2                   3
    //     0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |                          SSRC/CSRC_1                          |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |     type      |    length     | value ...                     |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |   END = 0     |   padding to a 32-bit boundary                |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    fn read_from(chunk: &[u8]) -> Result<(Self, usize), RtcpError> {
        RtcpError::check_len(chunk, SSRC_LENGTH)?;
        let ssrc = parse_u32(chunk);

        let mut items = Vec::new();
        let mut rest = &chunk[SSRC_LENGTH..];
        loop {
            let (item_type, after_type) =
                read_u8(rest).ok_or_else(|| RtcpError::truncated(chunk.len() + 1, chunk.len()))?;
            if item_type == END_ITEM {
                let used = chunk.len() - after_type.len();
                let padded = round_up_to_multiple_of::<4>(used);
                RtcpError::check_len(chunk, padded)?;
                return Ok((Self { ssrc, items }, padded));
            }
            let (value_len, after_len) = read_u8(after_type)
                .ok_or_else(|| RtcpError::truncated(chunk.len() + 1, chunk.len()))?;
            let (value, after_value) = read_bytes(after_len, value_len as usize).ok_or_else(|| {
                let offset = chunk.len() - after_len.len();
                RtcpError::truncated(offset + value_len as usize, chunk.len())
            })?;
            items.push(SdesItem {
                item_type,
                value: value.to_vec(),
            });
            rest = after_value;
        }
    }

    fn unpadded_len(&self) -> usize {
        SSRC_LENGTH + self.items.written_len() + 1
    }
}

impl Writer for SdesChunk {
    fn written_len(&self) -> usize {
        round_up_to_multiple_of::<4>(self.unpadded_len())
    }

    fn write(&self, out: &mut dyn Writable) {
        self.ssrc.write(out);
        self.items.write(out);
        let terminator_and_padding = self.written_len() - self.unpadded_len() + 1;
        [0u8; 4][..terminator_and_padding].write(out);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SdesPacket {
    pub chunks: Vec<SdesChunk>,
}

impl SdesPacket {
    pub const MAX_CHUNKS: usize = 31;

    pub fn parse(packet: &[u8]) -> Result<Self, RtcpError> {
        let header = RtcpHeader::read_from(packet)?;
        if header.packet_type != PacketType::SourceDescription as u8 {
            return Err(RtcpError::Malformed("unexpected packet type"));
        }
        let end = header.payload_end(packet)?;

        let mut chunks = Vec::with_capacity(header.count_or_format as usize);
        let mut offset = RtcpHeader::LENGTH;
        while chunks.len() < header.count_or_format as usize {
            let (chunk, used) = SdesChunk::read_from(&packet[offset..end]).map_err(|err| {
                match err {
                    RtcpError::Truncated { needed, .. } => RtcpError::truncated(offset + needed, end),
                    err => err,
                }
            })?;
            chunks.push(chunk);
            offset += used;
        }
        Ok(Self { chunks })
    }

    pub fn count(&self) -> usize {
        self.chunks.len()
    }
}

impl Writer for SdesPacket {
    fn written_len(&self) -> usize {
        RtcpHeader::LENGTH + self.chunks.written_len()
    }

    fn write(&self, out: &mut dyn Writable) {
        debug_assert!(self.count() <= Self::MAX_CHUNKS);
        RtcpHeader::for_packet(
            self.count() as u8,
            PacketType::SourceDescription as u8,
            self.written_len(),
        )
        .write(out);
        self.chunks.write(out);
    }
}
