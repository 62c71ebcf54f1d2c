//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::ops::Range;

use media_common::{parse_u24, parse_u32, parse_u64, Writable, Writer, U24};

use crate::{
    error::RtcpError,
    header::RtcpHeader,
    packet_type::PacketType,
    Ssrc,
};

const SSRC_LENGTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportBlock {
    pub ssrc: Ssrc,
    pub fraction_lost: u8,
    pub cumulative_lost: U24,
    pub highest_sequence_number: u32,
    pub jitter: u32,
    /// Middle 32 bits of the NTP timestamp of the last sender report received.
    pub last_sender_report: u32,
    /// In units of 1/65536 seconds.
    pub delay_since_last_sender_report: u32,
}

impl ReportBlock {
    pub const LENGTH: usize = 24;
    const SSRC_RANGE: Range<usize> = 0..4;
    const FRACTION_LOST_OFFSET: usize = 4;
    const CUMULATIVE_LOST_RANGE: Range<usize> = 5..8;
    const HIGHEST_SEQUENCE_NUMBER_RANGE: Range<usize> = 8..12;
    const INTERARRIVAL_JITTER_RANGE: Range<usize> = 12..16;
    const LAST_SENDER_REPORT_RANGE: Range<usize> = 16..20;
    const DELAY_LAST_SENDER_REPORT_RANGE: Range<usize> = 20..24;

    fn read_from(bytes: &[u8]) -> Result<Self, RtcpError> {
        RtcpError::check_len(bytes, Self::LENGTH)?;

        Ok(Self {
            ssrc: parse_u32(&bytes[Self::SSRC_RANGE]),
            fraction_lost: bytes[Self::FRACTION_LOST_OFFSET],
            cumulative_lost: parse_u24(&bytes[Self::CUMULATIVE_LOST_RANGE]),
            highest_sequence_number: parse_u32(&bytes[Self::HIGHEST_SEQUENCE_NUMBER_RANGE]),
            jitter: parse_u32(&bytes[Self::INTERARRIVAL_JITTER_RANGE]),
            last_sender_report: parse_u32(&bytes[Self::LAST_SENDER_REPORT_RANGE]),
            delay_since_last_sender_report: parse_u32(
                &bytes[Self::DELAY_LAST_SENDER_REPORT_RANGE],
            ),
        })
    }
}

impl Writer for ReportBlock {
    fn written_len(&self) -> usize {
        Self::LENGTH
    }

    fn write(&self, out: &mut dyn Writable) {
        self.ssrc.write(out);
        [self.fraction_lost].write(out);
        self.cumulative_lost.write(out);
        self.highest_sequence_number.write(out);
        self.jitter.write(out);
        self.last_sender_report.write(out);
        self.delay_since_last_sender_report.write(out);
    }
}

// Reads `count` consecutive report blocks, all of which must lie within `bytes`.
fn read_report_blocks(bytes: &[u8], count: usize) -> Result<Vec<ReportBlock>, RtcpError> {
    RtcpError::check_len(bytes, count * ReportBlock::LENGTH)?;
    bytes
        .chunks_exact(ReportBlock::LENGTH)
        .take(count)
        .map(ReportBlock::read_from)
        .collect()
}

fn check_packet_type(header: &RtcpHeader, expected: PacketType) -> Result<(), RtcpError> {
    if header.packet_type != expected as u8 {
        return Err(RtcpError::Malformed("unexpected packet type"));
    }
    Ok(())
}

/// The sender info part of an SR. Report blocks carried in the same slot
/// are decoded into a separate [`ReceiverReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderReport {
    pub ssrc: Ssrc,
    pub ntp_timestamp: u64,
    pub rtp_timestamp: u32,
    pub packet_count: u32,
    pub octet_count: u32,
}

impl SenderReport {
    pub const LENGTH: usize = RtcpHeader::LENGTH + 24;
    const SSRC_RANGE: Range<usize> = 4..8;
    const NTP_TIMESTAMP_RANGE: Range<usize> = 8..16;
    const RTP_TIMESTAMP_RANGE: Range<usize> = 16..20;
    const PACKET_COUNT_RANGE: Range<usize> = 20..24;
    const OCTET_COUNT_RANGE: Range<usize> = 24..28;

    // See https://datatracker.ietf.org/doc/html/rfc3550#section-6.4.1
    //
    //     0                   1                   2                   3
    //     0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |V=2|P|    RC   |   PT=SR=200   |             length            | header
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |                         SSRC of sender                        |
    //    +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
    //    |              NTP timestamp, most significant word             | sender
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+ info
    //    |             NTP timestamp, least significant word             |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |                         RTP timestamp                         |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |                     sender's packet count                     |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |                      sender's octet count                     |
    //    +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
    //    |                         report blocks                         |
    //    :                              ...                              :
    pub fn parse(packet: &[u8]) -> Result<Self, RtcpError> {
        let header = RtcpHeader::read_from(packet)?;
        check_packet_type(&header, PacketType::SenderReport)?;
        RtcpError::check_len(packet, Self::LENGTH)?;

        Ok(Self {
            ssrc: parse_u32(&packet[Self::SSRC_RANGE]),
            ntp_timestamp: parse_u64(&packet[Self::NTP_TIMESTAMP_RANGE]),
            rtp_timestamp: parse_u32(&packet[Self::RTP_TIMESTAMP_RANGE]),
            packet_count: parse_u32(&packet[Self::PACKET_COUNT_RANGE]),
            octet_count: parse_u32(&packet[Self::OCTET_COUNT_RANGE]),
        })
    }

    /// Always zero: report blocks travel in a separate [`ReceiverReport`].
    pub fn count(&self) -> usize {
        0
    }

    pub(crate) fn write_body(&self, out: &mut dyn Writable) {
        self.ssrc.write(out);
        self.ntp_timestamp.write(out);
        self.rtp_timestamp.write(out);
        self.packet_count.write(out);
        self.octet_count.write(out);
    }
}

impl Writer for SenderReport {
    fn written_len(&self) -> usize {
        Self::LENGTH
    }

    fn write(&self, out: &mut dyn Writable) {
        RtcpHeader::for_packet(0, PacketType::SenderReport as u8, Self::LENGTH).write(out);
        self.write_body(out);
    }
}

/// Writes an SR and the report blocks of the RR that follows it as a single
/// SR packet, the inverse of what parsing an SR with RC > 0 produces.
pub(crate) struct SenderReportWithBlocks<'a> {
    pub sender_report: &'a SenderReport,
    pub receiver_report: &'a ReceiverReport,
}

impl Writer for SenderReportWithBlocks<'_> {
    fn written_len(&self) -> usize {
        SenderReport::LENGTH + self.receiver_report.report_blocks.written_len()
    }

    fn write(&self, out: &mut dyn Writable) {
        RtcpHeader::for_packet(
            self.receiver_report.count() as u8,
            PacketType::SenderReport as u8,
            self.written_len(),
        )
        .write(out);
        self.sender_report.write_body(out);
        self.receiver_report.report_blocks.write(out);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverReport {
    pub ssrc: Ssrc,
    pub report_blocks: Vec<ReportBlock>,
}

impl ReceiverReport {
    pub const MIN_LENGTH: usize = RtcpHeader::LENGTH + SSRC_LENGTH;
    pub const MAX_REPORT_BLOCKS: usize = 31;

    /// Parses binary into ReceiverReport. Format is similar to SenderReport without
    /// the sender info.
    pub fn parse(packet: &[u8]) -> Result<Self, RtcpError> {
        let header = RtcpHeader::read_from(packet)?;
        check_packet_type(&header, PacketType::ReceiverReport)?;
        RtcpError::check_len(packet, Self::MIN_LENGTH)?;

        let ssrc = parse_u32(&packet[RtcpHeader::LENGTH..Self::MIN_LENGTH]);
        Self::parse_embedded(packet, Self::MIN_LENGTH, header.count_or_format, ssrc)
    }

    /// Reads `count` report blocks starting at `offset` within `packet`, on
    /// behalf of the reporter `ssrc`. Used for the blocks that follow the
    /// sender info of an SR.
    pub fn parse_embedded(
        packet: &[u8],
        offset: usize,
        count: u8,
        ssrc: Ssrc,
    ) -> Result<Self, RtcpError> {
        let blocks = packet
            .get(offset..)
            .ok_or_else(|| RtcpError::truncated(offset, packet.len()))?;
        let report_blocks = read_report_blocks(blocks, count as usize).map_err(|err| match err {
            RtcpError::Truncated { needed, .. } => RtcpError::truncated(offset + needed, packet.len()),
            err => err,
        })?;

        Ok(Self {
            ssrc,
            report_blocks,
        })
    }

    pub fn count(&self) -> usize {
        self.report_blocks.len()
    }
}

impl Writer for ReceiverReport {
    fn written_len(&self) -> usize {
        Self::MIN_LENGTH + self.report_blocks.written_len()
    }

    fn write(&self, out: &mut dyn Writable) {
        debug_assert!(self.count() <= Self::MAX_REPORT_BLOCKS);
        RtcpHeader::for_packet(
            self.count() as u8,
            PacketType::ReceiverReport as u8,
            self.written_len(),
        )
        .write(out);
        self.ssrc.write(out);
        self.report_blocks.write(out);
    }
}
