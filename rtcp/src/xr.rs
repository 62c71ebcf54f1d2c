//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Extended reports (RFC 3611) and the report blocks they carry.

use byteorder::{ReadBytesExt, BE};
use log::*;
use media_common::{parse_u16, parse_u32, parse_u64, Writable, Writer};

use crate::{error::RtcpError, header::RtcpHeader, packet_type::PacketType, Ssrc};

const SSRC_LENGTH: usize = 4;
const BLOCK_HEADER_LENGTH: usize = 4;

pub const BLOCK_TYPE_RECEIVER_REFERENCE_TIME: u8 = 4;
pub const BLOCK_TYPE_DELAY_SINCE_LAST_RR: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DlrrSubBlock {
    pub ssrc: Ssrc,
    /// Middle 32 bits of the NTP timestamp of the last RRT block received.
    pub last_receiver_report: u32,
    /// In units of 1/65536 seconds.
    pub delay_since_last_receiver_report: u32,
}

impl DlrrSubBlock {
    pub const LENGTH: usize = 12;
}

impl Writer for DlrrSubBlock {
    fn written_len(&self) -> usize {
        Self::LENGTH
    }

    fn write(&self, out: &mut dyn Writable) {
        self.ssrc.write(out);
        self.last_receiver_report.write(out);
        self.delay_since_last_receiver_report.write(out);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendedReportBlock {
    ReceiverReferenceTime { ntp_timestamp: u64 },
    DelaySinceLastRr { sub_blocks: Vec<DlrrSubBlock> },
}

impl ExtendedReportBlock {
    pub fn block_type(&self) -> u8 {
        match self {
            Self::ReceiverReferenceTime { .. } => BLOCK_TYPE_RECEIVER_REFERENCE_TIME,
            Self::DelaySinceLastRr { .. } => BLOCK_TYPE_DELAY_SINCE_LAST_RR,
        }
    }

    pub fn block_type_name(&self) -> &'static str {
        match self {
            Self::ReceiverReferenceTime { .. } => "RRT",
            Self::DelaySinceLastRr { .. } => "DLRR",
        }
    }

    // Returns the block and its declared size in bytes.
    //
    //     0                   1                   2                   3
    //     0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |      BT       | type-specific |         block length          |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    :             type-specific block contents                      :
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    fn read_from(bytes: &[u8]) -> Result<(Self, usize), RtcpError> {
        RtcpError::check_len(bytes, BLOCK_HEADER_LENGTH)?;
        let block_type = bytes[0];
        let length_in_words = parse_u16(&bytes[2..4]) as usize;
        let block_len = BLOCK_HEADER_LENGTH + length_in_words * 4;
        RtcpError::check_len(bytes, block_len)?;
        let contents = &bytes[BLOCK_HEADER_LENGTH..block_len];

        let block = match block_type {
            BLOCK_TYPE_RECEIVER_REFERENCE_TIME => {
                if contents.len() < 8 {
                    return Err(RtcpError::Malformed("RRT block too short for NTP timestamp"));
                }
                Self::ReceiverReferenceTime {
                    ntp_timestamp: parse_u64(contents),
                }
            }
            BLOCK_TYPE_DELAY_SINCE_LAST_RR => {
                if length_in_words % 3 != 0 {
                    return Err(RtcpError::Malformed(
                        "DLRR block length is not a multiple of 3 words",
                    ));
                }
                let mut reader = contents;
                let mut sub_blocks = Vec::with_capacity(length_in_words / 3);
                while !reader.is_empty() {
                    sub_blocks.push(DlrrSubBlock {
                        ssrc: reader.read_u32::<BE>()?,
                        last_receiver_report: reader.read_u32::<BE>()?,
                        delay_since_last_receiver_report: reader.read_u32::<BE>()?,
                    });
                }
                Self::DelaySinceLastRr { sub_blocks }
            }
            block_type => {
                return Err(RtcpError::UnsupportedType {
                    packet_type: PacketType::ExtendedReport as u8,
                    subtype: Some(block_type),
                })
            }
        };
        Ok((block, block_len))
    }

    fn contents_len(&self) -> usize {
        match self {
            Self::ReceiverReferenceTime { .. } => 8,
            Self::DelaySinceLastRr { sub_blocks } => sub_blocks.written_len(),
        }
    }
}

impl Writer for ExtendedReportBlock {
    fn written_len(&self) -> usize {
        BLOCK_HEADER_LENGTH + self.contents_len()
    }

    fn write(&self, out: &mut dyn Writable) {
        [self.block_type(), 0].write(out);
        ((self.contents_len() / 4) as u16).write(out);
        match self {
            Self::ReceiverReferenceTime { ntp_timestamp } => ntp_timestamp.write(out),
            Self::DelaySinceLastRr { sub_blocks } => sub_blocks.write(out),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedReportPacket {
    pub ssrc: Ssrc,
    pub blocks: Vec<ExtendedReportBlock>,
}

impl ExtendedReportPacket {
    pub const MIN_LENGTH: usize = RtcpHeader::LENGTH + SSRC_LENGTH;

    /// Blocks are read until the first one that fails; the blocks read so far
    /// are kept and the packet as a whole still parses.
    pub fn parse(packet: &[u8]) -> Result<Self, RtcpError> {
        let header = RtcpHeader::read_from(packet)?;
        if header.packet_type != PacketType::ExtendedReport as u8 {
            return Err(RtcpError::Malformed("unexpected packet type"));
        }
        RtcpError::check_len(packet, Self::MIN_LENGTH)?;
        let end = header.payload_end(packet)?;
        if end < Self::MIN_LENGTH {
            return Err(RtcpError::Malformed("padding overlaps XR SSRC"));
        }

        let ssrc = parse_u32(&packet[RtcpHeader::LENGTH..Self::MIN_LENGTH]);
        let mut blocks = Vec::new();
        let mut remaining = &packet[Self::MIN_LENGTH..end];
        while !remaining.is_empty() {
            if remaining.len() < BLOCK_HEADER_LENGTH {
                warn!("not enough space for a extended report block");
                break;
            }
            match ExtendedReportBlock::read_from(remaining) {
                Ok((block, block_len)) => {
                    trace!("parsed XR {} block of {} bytes", block.block_type_name(), block_len);
                    blocks.push(block);
                    remaining = &remaining[block_len..];
                }
                Err(RtcpError::UnsupportedType {
                    subtype: Some(block_type),
                    ..
                }) => {
                    warn!("unknown RTCP XR block type [block type:{}]", block_type);
                    break;
                }
                Err(err) => {
                    warn!("error parsing XR block type {}: {}", remaining[0], err);
                    break;
                }
            }
        }

        Ok(Self { ssrc, blocks })
    }

    /// True when a block's contents do not fit its 16-bit length field.
    pub fn has_oversized_block(&self) -> bool {
        self.blocks
            .iter()
            .any(|block| block.contents_len() / 4 > u16::MAX as usize)
    }

    /// XR carries no count; the field is reserved and written as zero.
    pub fn count(&self) -> usize {
        0
    }
}

impl Writer for ExtendedReportPacket {
    fn written_len(&self) -> usize {
        Self::MIN_LENGTH + self.blocks.written_len()
    }

    fn write(&self, out: &mut dyn Writable) {
        RtcpHeader::for_packet(0, PacketType::ExtendedReport as u8, self.written_len()).write(out);
        self.ssrc.write(out);
        self.blocks.write(out);
    }
}
