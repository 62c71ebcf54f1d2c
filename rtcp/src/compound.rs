//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Walks a compound RTCP datagram into typed packets and writes them back out.

use std::fmt;

use log::*;
use media_common::{CheckedSplitAt, SliceWriter, Writable, Writer};

use crate::{
    bye::ByePacket,
    error::RtcpError,
    feedback::{PsFeedbackPacket, RtpFeedbackPacket},
    header::{looks_like_rtcp, RtcpHeader},
    packet_type::{packet_type_name, PacketType, PsFeedbackType, RtpFeedbackType},
    report::{ReceiverReport, SenderReport, SenderReportWithBlocks},
    sdes::SdesPacket,
    xr::ExtendedReportPacket,
};

/// Largest value the 5-bit count field can hold.
const MAX_COUNT: usize = 31;

/// Largest packet the 16-bit length field (in words, minus one) can describe.
const MAX_PACKET_LENGTH: usize = (u16::MAX as usize + 1) * 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtcpPacket {
    SenderReport(SenderReport),
    ReceiverReport(ReceiverReport),
    SourceDescription(SdesPacket),
    Bye(ByePacket),
    RtpFeedback(RtpFeedbackPacket),
    PsFeedback(PsFeedbackPacket),
    ExtendedReport(ExtendedReportPacket),
}

impl RtcpPacket {
    pub fn packet_type(&self) -> PacketType {
        match self {
            Self::SenderReport(_) => PacketType::SenderReport,
            Self::ReceiverReport(_) => PacketType::ReceiverReport,
            Self::SourceDescription(_) => PacketType::SourceDescription,
            Self::Bye(_) => PacketType::Bye,
            Self::RtpFeedback(_) => PacketType::RtpFeedback,
            Self::PsFeedback(_) => PacketType::PsFeedback,
            Self::ExtendedReport(_) => PacketType::ExtendedReport,
        }
    }

    /// The value written to the count/format field of the header.
    pub fn count(&self) -> usize {
        match self {
            Self::SenderReport(packet) => packet.count(),
            Self::ReceiverReport(packet) => packet.count(),
            Self::SourceDescription(packet) => packet.count(),
            Self::Bye(packet) => packet.count(),
            Self::RtpFeedback(packet) => packet.count(),
            Self::PsFeedback(packet) => packet.count(),
            Self::ExtendedReport(packet) => packet.count(),
        }
    }

    fn as_writer(&self) -> &dyn Writer {
        match self {
            Self::SenderReport(packet) => packet,
            Self::ReceiverReport(packet) => packet,
            Self::SourceDescription(packet) => packet,
            Self::Bye(packet) => packet,
            Self::RtpFeedback(packet) => packet,
            Self::PsFeedback(packet) => packet,
            Self::ExtendedReport(packet) => packet,
        }
    }
}

impl Writer for RtcpPacket {
    fn written_len(&self) -> usize {
        self.as_writer().written_len()
    }

    fn write(&self, out: &mut dyn Writable) {
        self.as_writer().write(out)
    }
}

/// One line per packet, plus one per XR block.
impl fmt::Display for RtcpPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [count:{}, size:{}]",
            self.packet_type(),
            self.count(),
            self.written_len()
        )?;
        match self {
            Self::SenderReport(sr) => write!(
                f,
                " ssrc:{} ntp:{} rtp:{} packets:{} octets:{}",
                sr.ssrc, sr.ntp_timestamp, sr.rtp_timestamp, sr.packet_count, sr.octet_count
            ),
            Self::ReceiverReport(rr) => {
                write!(f, " ssrc:{}", rr.ssrc)?;
                for block in &rr.report_blocks {
                    write!(
                        f,
                        "\n  report ssrc:{} fraction lost:{} lost:{} highest seq:{} jitter:{} lsr:{} dlsr:{}",
                        block.ssrc,
                        block.fraction_lost,
                        block.cumulative_lost,
                        block.highest_sequence_number,
                        block.jitter,
                        block.last_sender_report,
                        block.delay_since_last_sender_report
                    )?;
                }
                Ok(())
            }
            Self::SourceDescription(sdes) => {
                for chunk in &sdes.chunks {
                    write!(f, "\n  chunk ssrc:{}", chunk.ssrc)?;
                    for item in &chunk.items {
                        write!(
                            f,
                            " {}:{:?}",
                            item.type_name(),
                            String::from_utf8_lossy(&item.value)
                        )?;
                    }
                }
                Ok(())
            }
            Self::Bye(bye) => write!(f, " ssrcs:{:?} reason:{:?}", bye.ssrcs, bye.reason),
            Self::RtpFeedback(fb) => write!(
                f,
                " {} sender ssrc:{} media ssrc:{} {:?}",
                fb.format(),
                fb.sender_ssrc,
                fb.media_ssrc,
                fb.message
            ),
            Self::PsFeedback(fb) => write!(
                f,
                " {} sender ssrc:{} media ssrc:{} {:?}",
                fb.format(),
                fb.sender_ssrc,
                fb.media_ssrc,
                fb.message
            ),
            Self::ExtendedReport(xr) => {
                write!(f, " ssrc:{}", xr.ssrc)?;
                for block in &xr.blocks {
                    write!(
                        f,
                        "\n  block {} [size:{}] {:?}",
                        block.block_type_name(),
                        block.written_len(),
                        block
                    )?;
                }
                Ok(())
            }
        }
    }
}

// A single slot on the wire. An SR immediately followed by an RR from the
// same source is written back as one SR carrying the RR's report blocks.
enum Slot<'a> {
    Single(&'a RtcpPacket),
    SenderWithBlocks(SenderReportWithBlocks<'a>),
}

impl Slot<'_> {
    fn count(&self) -> usize {
        match self {
            Slot::Single(packet) => packet.count(),
            Slot::SenderWithBlocks(combined) => combined.receiver_report.count(),
        }
    }

    // The count and length fields must describe what gets written.
    fn check_fields(&self) -> Result<(), RtcpError> {
        if self.count() > MAX_COUNT {
            return Err(RtcpError::Malformed("too many items for the count field"));
        }
        if let Slot::Single(RtcpPacket::ExtendedReport(xr)) = self {
            if xr.has_oversized_block() {
                return Err(RtcpError::Malformed("XR block too long for its length field"));
            }
        }
        if self.written_len() > MAX_PACKET_LENGTH {
            return Err(RtcpError::Malformed("packet too long for the length field"));
        }
        Ok(())
    }
}

impl Writer for Slot<'_> {
    fn written_len(&self) -> usize {
        match self {
            Slot::Single(packet) => packet.written_len(),
            Slot::SenderWithBlocks(combined) => combined.written_len(),
        }
    }

    fn write(&self, out: &mut dyn Writable) {
        match self {
            Slot::Single(packet) => packet.write(out),
            Slot::SenderWithBlocks(combined) => combined.write(out),
        }
    }
}

/// An ordered sequence of RTCP packets that share one datagram.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundPacket {
    packets: Vec<RtcpPacket>,
}

impl CompoundPacket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses as many packets as possible from `buffer`. Parsing stops at the
    /// first slot that is not RTCP, does not fit, or fails to parse; the
    /// packets before it are returned.
    pub fn parse(buffer: &[u8]) -> Self {
        let mut packets = Vec::new();
        let mut remaining = buffer;
        while !remaining.is_empty() {
            if !looks_like_rtcp(remaining) {
                warn!("data is not a RTCP packet");
                break;
            }
            let header = match RtcpHeader::read_from(remaining) {
                Ok(header) => header,
                Err(err) => {
                    warn!("failed to read RTCP header: {}", err);
                    break;
                }
            };
            let packet_len = header.packet_length_in_bytes();
            let Some((packet, after_packet)) = remaining.checked_split_at(packet_len) else {
                warn!(
                    "packet length exceeds remaining data [len:{}, packet len:{}]",
                    remaining.len(),
                    packet_len
                );
                break;
            };

            if let Err(err) = Self::parse_slot(&header, packet, &mut packets) {
                warn!("error parsing {} Packet: {}", slot_name(&header), err);
                break;
            }
            trace!("parsed {} packet of {} bytes", slot_name(&header), packet_len);
            remaining = after_packet;
        }
        Self { packets }
    }

    // Appends the packet(s) in one slot. Nothing is appended on failure.
    fn parse_slot(
        header: &RtcpHeader,
        packet: &[u8],
        packets: &mut Vec<RtcpPacket>,
    ) -> Result<(), RtcpError> {
        let parsed = match PacketType::from_repr(header.packet_type) {
            Some(PacketType::SenderReport) => {
                let sender_report = SenderReport::parse(packet)?;
                if header.count_or_format > 0 {
                    let receiver_report = ReceiverReport::parse_embedded(
                        packet,
                        SenderReport::LENGTH,
                        header.count_or_format,
                        sender_report.ssrc,
                    )
                    .map_err(|err| RtcpError::EmbeddedParseFailure(Box::new(err)))?;
                    packets.push(RtcpPacket::SenderReport(sender_report));
                    RtcpPacket::ReceiverReport(receiver_report)
                } else {
                    RtcpPacket::SenderReport(sender_report)
                }
            }
            Some(PacketType::ReceiverReport) => {
                RtcpPacket::ReceiverReport(ReceiverReport::parse(packet)?)
            }
            Some(PacketType::SourceDescription) => {
                RtcpPacket::SourceDescription(SdesPacket::parse(packet)?)
            }
            Some(PacketType::Bye) => RtcpPacket::Bye(ByePacket::parse(packet)?),
            Some(PacketType::RtpFeedback) => {
                RtcpPacket::RtpFeedback(RtpFeedbackPacket::parse(packet)?)
            }
            Some(PacketType::PsFeedback) => {
                RtcpPacket::PsFeedback(PsFeedbackPacket::parse(packet)?)
            }
            Some(PacketType::ExtendedReport) => {
                RtcpPacket::ExtendedReport(ExtendedReportPacket::parse(packet)?)
            }
            Some(PacketType::App) | Some(PacketType::Fir) | Some(PacketType::Nack) => {
                return Err(RtcpError::UnsupportedType {
                    packet_type: header.packet_type,
                    subtype: None,
                });
            }
            None => {
                warn!(
                    "unknown RTCP packet type [packet type:{}]",
                    header.packet_type
                );
                return Err(RtcpError::UnsupportedType {
                    packet_type: header.packet_type,
                    subtype: None,
                });
            }
        };
        packets.push(parsed);
        Ok(())
    }

    pub fn packets(&self) -> &[RtcpPacket] {
        &self.packets
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RtcpPacket> {
        self.packets.iter()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn push(&mut self, packet: RtcpPacket) {
        self.packets.push(packet);
    }

    pub fn into_packets(self) -> Vec<RtcpPacket> {
        self.packets
    }

    fn slots(&self) -> Vec<Slot<'_>> {
        let mut slots = Vec::with_capacity(self.packets.len());
        let mut index = 0;
        while index < self.packets.len() {
            let packet = &self.packets[index];
            if let (
                RtcpPacket::SenderReport(sender_report),
                Some(RtcpPacket::ReceiverReport(receiver_report)),
            ) = (packet, self.packets.get(index + 1))
            {
                if receiver_report.ssrc == sender_report.ssrc
                    && !receiver_report.report_blocks.is_empty()
                {
                    slots.push(Slot::SenderWithBlocks(SenderReportWithBlocks {
                        sender_report,
                        receiver_report,
                    }));
                    index += 2;
                    continue;
                }
            }
            slots.push(Slot::Single(packet));
            index += 1;
        }
        slots
    }

    /// Number of bytes [`Self::serialize_into`] writes.
    pub fn written_len(&self) -> usize {
        self.slots().iter().map(Writer::written_len).sum()
    }

    /// Writes every packet into `buffer` in order and returns the number of
    /// bytes written.
    pub fn serialize_into(&self, buffer: &mut [u8]) -> Result<usize, RtcpError> {
        let slots = self.slots();
        for slot in &slots {
            slot.check_fields()?;
        }
        let needed: usize = slots.iter().map(Writer::written_len).sum();
        if buffer.len() < needed {
            return Err(RtcpError::BufferTooSmall {
                needed,
                available: buffer.len(),
            });
        }

        let mut out = SliceWriter::new(buffer);
        for slot in &slots {
            slot.write(&mut out);
        }
        Ok(out.position())
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, RtcpError> {
        let mut buffer = vec![0u8; self.written_len()];
        self.serialize_into(&mut buffer)?;
        Ok(buffer)
    }
}

impl From<Vec<RtcpPacket>> for CompoundPacket {
    fn from(packets: Vec<RtcpPacket>) -> Self {
        Self { packets }
    }
}

impl IntoIterator for CompoundPacket {
    type Item = RtcpPacket;
    type IntoIter = std::vec::IntoIter<RtcpPacket>;

    fn into_iter(self) -> Self::IntoIter {
        self.packets.into_iter()
    }
}

impl<'a> IntoIterator for &'a CompoundPacket {
    type Item = &'a RtcpPacket;
    type IntoIter = std::slice::Iter<'a, RtcpPacket>;

    fn into_iter(self) -> Self::IntoIter {
        self.packets.iter()
    }
}

// e.g. "RTPFB NACK" for feedback, "SR" otherwise.
fn slot_name(header: &RtcpHeader) -> String {
    let name = packet_type_name(header.packet_type);
    match PacketType::from_repr(header.packet_type) {
        Some(PacketType::RtpFeedback) => {
            format!("{} {}", name, RtpFeedbackType::name_of(header.count_or_format))
        }
        Some(PacketType::PsFeedback) => {
            format!("{} {}", name, PsFeedbackType::name_of(header.count_or_format))
        }
        _ => name.to_owned(),
    }
}
