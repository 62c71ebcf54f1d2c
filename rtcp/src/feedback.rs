//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Transport layer (RTPFB) and payload-specific (PSFB) feedback packets.
//! See https://datatracker.ietf.org/doc/html/rfc4585#section-6.1

use std::ops::Range;

use byteorder::{ReadBytesExt, BE};
use log::*;
use media_common::{
    parse_u32, round_up_to_multiple_of, Bits, ReadSliceExt, Writable, Writer, U24,
};

use crate::{
    error::RtcpError,
    header::RtcpHeader,
    packet_type::{PacketType, PsFeedbackType, RtpFeedbackType},
    Ssrc,
};

const SENDER_SSRC_RANGE: Range<usize> = 4..8;
const MEDIA_SSRC_RANGE: Range<usize> = 8..12;

//     0                   1                   2                   3
//     0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//    |V=2|P|   FMT   |       PT      |          length               |
//    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//    |                  SSRC of packet sender                        |
//    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//    |                  SSRC of media source                         |
//    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//    :            Feedback Control Information (FCI)                 :
//    :                                                               :
struct FeedbackCommon<'packet> {
    format: u8,
    sender_ssrc: Ssrc,
    media_ssrc: Ssrc,
    fci: &'packet [u8],
}

const FEEDBACK_MIN_LENGTH: usize = 12;

fn parse_common(packet: &[u8], expected: PacketType) -> Result<FeedbackCommon<'_>, RtcpError> {
    let header = RtcpHeader::read_from(packet)?;
    if header.packet_type != expected as u8 {
        return Err(RtcpError::Malformed("unexpected packet type"));
    }
    RtcpError::check_len(packet, FEEDBACK_MIN_LENGTH)?;
    let end = header.payload_end(packet)?;
    if end < FEEDBACK_MIN_LENGTH {
        return Err(RtcpError::Malformed("padding overlaps feedback SSRCs"));
    }

    Ok(FeedbackCommon {
        format: header.count_or_format,
        sender_ssrc: parse_u32(&packet[SENDER_SSRC_RANGE]),
        media_ssrc: parse_u32(&packet[MEDIA_SSRC_RANGE]),
        fci: &packet[FEEDBACK_MIN_LENGTH..end],
    })
}

fn write_common(
    packet_type: PacketType,
    format: u8,
    sender_ssrc: Ssrc,
    media_ssrc: Ssrc,
    fci: &dyn Writer,
    has_padding: bool,
    out: &mut dyn Writable,
) {
    let total = FEEDBACK_MIN_LENGTH + fci.written_len();
    let mut header = RtcpHeader::for_packet(format, packet_type as u8, total);
    header.has_padding = has_padding;
    header.write(out);
    sender_ssrc.write(out);
    media_ssrc.write(out);
    fci.write(out);
}

// Unaligned raw FCI is followed by RTP-style padding whose last octet holds
// the padding length, so the P bit lets a reader recover the exact FCI.
struct RawFci<'a>(&'a [u8]);

impl RawFci<'_> {
    fn padding(&self) -> usize {
        round_up_to_multiple_of::<4>(self.0.len()) - self.0.len()
    }

    fn is_padded(&self) -> bool {
        self.padding() > 0
    }
}

impl Writer for RawFci<'_> {
    fn written_len(&self) -> usize {
        self.0.len() + self.padding()
    }

    fn write(&self, out: &mut dyn Writable) {
        self.0.write(out);
        let padding = self.padding();
        [0, 0, padding as u8][3 - padding..].write(out);
    }
}

/// A generic NACK entry: a packet ID plus a bitmask of the 16 following lost packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NackItem {
    pub pid: u16,
    pub blp: u16,
}

impl NackItem {
    pub const LENGTH: usize = 4;

    pub fn lost_sequence_numbers(&self) -> impl Iterator<Item = u16> {
        let NackItem { pid, blp } = *self;
        std::iter::once(pid).chain((0..16u16).filter_map(move |index| {
            if blp.ls_bit(index as u8) {
                Some(pid.wrapping_add(index + 1))
            } else {
                None
            }
        }))
    }

    /// Packs lost sequence numbers into as few items as possible.
    /// Works best when the iterator provides seqnums in order.
    pub fn from_sequence_numbers(mut seqnums: impl Iterator<Item = u16>) -> Vec<NackItem> {
        let mut items = vec![];
        if let Some(mut pid) = seqnums.next() {
            let mut blp = 0u16;
            for seqnum in seqnums {
                let diff = seqnum.wrapping_sub(pid);
                if (1..=16).contains(&diff) {
                    blp = blp.set_ls_bit((diff - 1) as u8);
                } else {
                    // Record this item and start another
                    items.push(NackItem { pid, blp });
                    pid = seqnum;
                    blp = 0u16;
                }
            }
            items.push(NackItem { pid, blp });
        }
        items
    }
}

impl Writer for NackItem {
    fn written_len(&self) -> usize {
        Self::LENGTH
    }

    fn write(&self, out: &mut dyn Writable) {
        self.pid.write(out);
        self.blp.write(out);
    }
}

fn parse_nack_items(fci: &[u8]) -> Result<Vec<NackItem>, RtcpError> {
    let mut reader = fci;
    let mut items = Vec::with_capacity(fci.len() / NackItem::LENGTH);
    while !reader.is_empty() {
        let pid = reader.read_u16::<BE>()?;
        let blp = reader.read_u16::<BE>()?;
        items.push(NackItem { pid, blp });
    }
    Ok(items)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtpFeedbackMessage {
    Nack(Vec<NackItem>),
    /// Transport-wide congestion control feedback. Decoding it requires
    /// sequence number state, so it is kept as raw FCI.
    TransportCc(Vec<u8>),
    /// Any other registered message type, kept as raw FCI.
    Other {
        format: RtpFeedbackType,
        fci: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpFeedbackPacket {
    pub sender_ssrc: Ssrc,
    pub media_ssrc: Ssrc,
    pub message: RtpFeedbackMessage,
}

impl RtpFeedbackPacket {
    pub fn parse(packet: &[u8]) -> Result<Self, RtcpError> {
        let common = parse_common(packet, PacketType::RtpFeedback)?;
        let format = RtpFeedbackType::from_repr(common.format).ok_or(RtcpError::UnsupportedType {
            packet_type: PacketType::RtpFeedback as u8,
            subtype: Some(common.format),
        })?;

        let message = match format {
            RtpFeedbackType::Nack => RtpFeedbackMessage::Nack(parse_nack_items(common.fci)?),
            RtpFeedbackType::Tcc => RtpFeedbackMessage::TransportCc(common.fci.to_vec()),
            format => RtpFeedbackMessage::Other {
                format,
                fci: common.fci.to_vec(),
            },
        };

        Ok(Self {
            sender_ssrc: common.sender_ssrc,
            media_ssrc: common.media_ssrc,
            message,
        })
    }

    pub fn format(&self) -> RtpFeedbackType {
        match &self.message {
            RtpFeedbackMessage::Nack(_) => RtpFeedbackType::Nack,
            RtpFeedbackMessage::TransportCc(_) => RtpFeedbackType::Tcc,
            RtpFeedbackMessage::Other { format, .. } => *format,
        }
    }

    /// The FMT value carried in the count field.
    pub fn count(&self) -> usize {
        self.format() as usize
    }
}

impl Writer for RtpFeedbackPacket {
    fn written_len(&self) -> usize {
        FEEDBACK_MIN_LENGTH
            + match &self.message {
                RtpFeedbackMessage::Nack(items) => items.written_len(),
                RtpFeedbackMessage::TransportCc(fci) | RtpFeedbackMessage::Other { fci, .. } => {
                    RawFci(fci).written_len()
                }
            }
    }

    fn write(&self, out: &mut dyn Writable) {
        let raw;
        let (fci, has_padding): (&dyn Writer, bool) = match &self.message {
            RtpFeedbackMessage::Nack(items) => (items as &dyn Writer, false),
            RtpFeedbackMessage::TransportCc(fci) | RtpFeedbackMessage::Other { fci, .. } => {
                raw = RawFci(fci);
                (&raw as &dyn Writer, raw.is_padded())
            }
        };
        write_common(
            PacketType::RtpFeedback,
            self.format() as u8,
            self.sender_ssrc,
            self.media_ssrc,
            fci,
            has_padding,
            out,
        );
    }
}

/// Full intra request entry (RFC 5104 section 4.3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirItem {
    pub ssrc: Ssrc,
    pub sequence_number: u8,
}

impl FirItem {
    pub const LENGTH: usize = 8;
}

impl Writer for FirItem {
    fn written_len(&self) -> usize {
        Self::LENGTH
    }

    fn write(&self, out: &mut dyn Writable) {
        self.ssrc.write(out);
        [self.sequence_number, 0, 0, 0].write(out);
    }
}

fn parse_fir_items(fci: &[u8]) -> Result<Vec<FirItem>, RtcpError> {
    let mut reader = fci;
    let mut items = Vec::with_capacity(fci.len() / FirItem::LENGTH);
    while !reader.is_empty() {
        let ssrc = reader.read_u32::<BE>()?;
        let sequence_number = reader.read_u8()?;
        reader.skip_bytes(3)?;
        items.push(FirItem {
            ssrc,
            sequence_number,
        });
    }
    Ok(items)
}

/// Receiver estimated maximum bitrate, carried as application layer feedback.
/// See https://datatracker.ietf.org/doc/html/draft-alvestrand-rmcat-remb-03
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remb {
    /// Written as an 18-bit mantissa and a 6-bit exponent. Larger values lose
    /// their low bits on the wire.
    pub bitrate_bps: u64,
    pub ssrcs: Vec<Ssrc>,
}

impl Remb {
    const IDENTIFIER: &'static [u8; 4] = b"REMB";
    const MIN_LENGTH: usize = 8;
    const MANTISSA_BITS: u32 = 18;
    const MAX_MANTISSA: u64 = (1 << Self::MANTISSA_BITS) - 1;

    //     0                   1                   2                   3
    //     0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |  Unique identifier 'R' 'E' 'M' 'B'                            |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |  Num SSRC     | BR Exp    |  BR Mantissa                      |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |   SSRC feedback                                               |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |  ...                                                          |
    fn looks_like_remb(fci: &[u8]) -> bool {
        fci.len() >= Self::MIN_LENGTH && fci.starts_with(Self::IDENTIFIER)
    }

    fn parse(fci: &[u8]) -> Result<Self, RtcpError> {
        RtcpError::check_len(fci, Self::MIN_LENGTH)?;
        let ssrc_count = fci[4] as usize;
        let exponent = fci[5] >> 2;
        let mantissa = (u32::from(fci[5] & 0b11) << 16) | u32::from(fci[6]) << 8 | u32::from(fci[7]);
        let bitrate_bps = u64::from(mantissa)
            .checked_shl(exponent.into())
            .filter(|bitrate| bitrate >> exponent == u64::from(mantissa))
            .ok_or(RtcpError::Malformed("REMB bitrate overflows"))?;

        let needed = Self::MIN_LENGTH + ssrc_count * 4;
        RtcpError::check_len(fci, needed)?;
        let ssrcs = fci[Self::MIN_LENGTH..needed]
            .chunks_exact(4)
            .map(parse_u32)
            .collect();

        Ok(Self { bitrate_bps, ssrcs })
    }

    fn exponent_and_mantissa(&self) -> (u8, u32) {
        let mut exponent = 0u8;
        while (self.bitrate_bps >> exponent) > Self::MAX_MANTISSA {
            exponent += 1;
        }
        (exponent, (self.bitrate_bps >> exponent) as u32)
    }
}

impl Writer for Remb {
    fn written_len(&self) -> usize {
        Self::MIN_LENGTH + self.ssrcs.len().min(u8::MAX as usize) * 4
    }

    fn write(&self, out: &mut dyn Writable) {
        let ssrc_count = self.ssrcs.len().min(u8::MAX as usize);
        let (exponent, mantissa) = self.exponent_and_mantissa();
        Self::IDENTIFIER.write(out);
        [ssrc_count as u8].write(out);
        U24::truncate(u32::from(exponent) << Self::MANTISSA_BITS | mantissa).write(out);
        self.ssrcs[..ssrc_count].write(out);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PsFeedbackMessage {
    /// Picture loss indication; carries no FCI.
    Pli,
    Fir(Vec<FirItem>),
    Remb(Remb),
    /// Application layer feedback other than REMB, kept as raw FCI.
    Afb(Vec<u8>),
    /// Any other registered message type, kept as raw FCI.
    Other {
        format: PsFeedbackType,
        fci: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsFeedbackPacket {
    pub sender_ssrc: Ssrc,
    pub media_ssrc: Ssrc,
    pub message: PsFeedbackMessage,
}

impl PsFeedbackPacket {
    pub fn parse(packet: &[u8]) -> Result<Self, RtcpError> {
        let common = parse_common(packet, PacketType::PsFeedback)?;
        let format = PsFeedbackType::from_repr(common.format).ok_or(RtcpError::UnsupportedType {
            packet_type: PacketType::PsFeedback as u8,
            subtype: Some(common.format),
        })?;

        let message = match format {
            PsFeedbackType::Pli => {
                if !common.fci.is_empty() {
                    debug!("ignoring {} bytes of PLI FCI", common.fci.len());
                }
                PsFeedbackMessage::Pli
            }
            PsFeedbackType::Fir => PsFeedbackMessage::Fir(parse_fir_items(common.fci)?),
            PsFeedbackType::Afb if Remb::looks_like_remb(common.fci) => {
                PsFeedbackMessage::Remb(Remb::parse(common.fci)?)
            }
            PsFeedbackType::Afb => PsFeedbackMessage::Afb(common.fci.to_vec()),
            format => PsFeedbackMessage::Other {
                format,
                fci: common.fci.to_vec(),
            },
        };

        Ok(Self {
            sender_ssrc: common.sender_ssrc,
            media_ssrc: common.media_ssrc,
            message,
        })
    }

    pub fn format(&self) -> PsFeedbackType {
        match &self.message {
            PsFeedbackMessage::Pli => PsFeedbackType::Pli,
            PsFeedbackMessage::Fir(_) => PsFeedbackType::Fir,
            PsFeedbackMessage::Remb(_) | PsFeedbackMessage::Afb(_) => PsFeedbackType::Afb,
            PsFeedbackMessage::Other { format, .. } => *format,
        }
    }

    /// The FMT value carried in the count field.
    pub fn count(&self) -> usize {
        self.format() as usize
    }
}

impl Writer for PsFeedbackPacket {
    fn written_len(&self) -> usize {
        FEEDBACK_MIN_LENGTH
            + match &self.message {
                PsFeedbackMessage::Pli => 0,
                PsFeedbackMessage::Fir(items) => items.written_len(),
                PsFeedbackMessage::Remb(remb) => remb.written_len(),
                PsFeedbackMessage::Afb(fci) | PsFeedbackMessage::Other { fci, .. } => {
                    RawFci(fci).written_len()
                }
            }
    }

    fn write(&self, out: &mut dyn Writable) {
        let raw;
        let (fci, has_padding): (&dyn Writer, bool) = match &self.message {
            PsFeedbackMessage::Pli => (&[0u8; 0] as &dyn Writer, false),
            PsFeedbackMessage::Fir(items) => (items as &dyn Writer, false),
            PsFeedbackMessage::Remb(remb) => (remb as &dyn Writer, false),
            PsFeedbackMessage::Afb(fci) | PsFeedbackMessage::Other { fci, .. } => {
                raw = RawFci(fci);
                (&raw as &dyn Writer, raw.is_padded())
            }
        };
        write_common(
            PacketType::PsFeedback,
            self.format() as u8,
            self.sender_ssrc,
            self.media_ssrc,
            fci,
            has_padding,
            out,
        );
    }
}

#[cfg(test)]
mod test {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn nack_items_expand() {
        // Example from WebRTC modules/rtp_rtcp/source/rtcp_packet/nack_unittest.cc.
        let seqnums = vec![0u16, 1, 3, 8, 16];
        let items = NackItem::from_sequence_numbers(seqnums.iter().copied());
        assert_eq!(vec![NackItem { pid: 0, blp: 0x8085 }], items);
        assert_eq!(
            seqnums,
            items[0].lost_sequence_numbers().collect::<Vec<_>>()
        );

        let items = NackItem::from_sequence_numbers([10u16, 30, 31].into_iter());
        assert_eq!(
            vec![
                NackItem { pid: 10, blp: 0 },
                NackItem { pid: 30, blp: 0b1 }
            ],
            items
        );
        assert!(NackItem::from_sequence_numbers(std::iter::empty()).is_empty());
    }

    #[test]
    fn nack_items_wrap() {
        let items = NackItem::from_sequence_numbers([65535u16, 0, 1].into_iter());
        assert_eq!(vec![NackItem { pid: 65535, blp: 0b11 }], items);
        assert_eq!(
            vec![65535, 0, 1],
            items[0].lost_sequence_numbers().collect::<Vec<_>>()
        );
    }

    #[test]
    fn parse_nack() {
        let raw = hex!(
            "81 cd 00 04
             00 00 00 01
             01 02 03 04
             00 00 80 85
             00 20 00 00"
        );
        let packet = RtpFeedbackPacket::parse(&raw).unwrap();
        assert_eq!(
            RtpFeedbackPacket {
                sender_ssrc: 1,
                media_ssrc: 0x01020304,
                message: RtpFeedbackMessage::Nack(vec![
                    NackItem { pid: 0, blp: 0x8085 },
                    NackItem { pid: 32, blp: 0 },
                ]),
            },
            packet
        );
        assert_eq!(1, packet.count());
        assert_eq!(raw.to_vec(), packet.to_vec());
    }

    #[test]
    fn parse_nack_partial_item() {
        // Padding bit set with two bytes of padding leaves half an item.
        let raw = hex!(
            "a1 cd 00 03
             00 00 00 01
             00 00 00 02
             00 05 00 02"
        );
        assert!(matches!(
            RtpFeedbackPacket::parse(&raw),
            Err(RtcpError::Malformed(_))
        ));
    }

    #[test]
    fn parse_transport_cc_and_other() {
        let raw = hex!(
            "8f cd 00 03
             00 00 00 01
             00 00 00 02
             de ad be ef"
        );
        let packet = RtpFeedbackPacket::parse(&raw).unwrap();
        assert_eq!(
            RtpFeedbackMessage::TransportCc(hex!("de ad be ef").to_vec()),
            packet.message
        );
        assert_eq!(raw.to_vec(), packet.to_vec());

        let mut raw = raw;
        raw[0] = 0x83;
        let packet = RtpFeedbackPacket::parse(&raw).unwrap();
        assert_eq!(RtpFeedbackType::Tmmbr, packet.format());
        assert_eq!(raw.to_vec(), packet.to_vec());
    }

    #[test]
    fn padded_transport_cc_round_trips() {
        // Two bytes of FCI followed by two bytes of RTP padding.
        let raw = hex!(
            "af cd 00 03
             00 00 00 01
             00 00 00 02
             ab cd 00 02"
        );
        let packet = RtpFeedbackPacket::parse(&raw).unwrap();
        assert_eq!(
            RtpFeedbackMessage::TransportCc(vec![0xab, 0xcd]),
            packet.message
        );
        assert_eq!(raw.to_vec(), packet.to_vec());
        assert_eq!(packet, RtpFeedbackPacket::parse(&packet.to_vec()).unwrap());
    }

    #[test]
    fn unaligned_fci_is_padded() {
        for len in 1..=7 {
            let fci: Vec<u8> = (1..=len).collect();
            let packet = RtpFeedbackPacket {
                sender_ssrc: 1,
                media_ssrc: 2,
                message: RtpFeedbackMessage::TransportCc(fci.clone()),
            };
            let serialized = packet.to_vec();
            assert_eq!(0, serialized.len() % 4);
            assert_eq!(len % 4 != 0, serialized[0] & 0b0010_0000 != 0);
            assert_eq!(packet, RtpFeedbackPacket::parse(&serialized).unwrap());

            let packet = PsFeedbackPacket {
                sender_ssrc: 1,
                media_ssrc: 2,
                message: PsFeedbackMessage::Afb(fci),
            };
            assert_eq!(packet, PsFeedbackPacket::parse(&packet.to_vec()).unwrap());
        }

        let packet = PsFeedbackPacket {
            sender_ssrc: 1,
            media_ssrc: 2,
            message: PsFeedbackMessage::Other {
                format: PsFeedbackType::Sli,
                fci: vec![9],
            },
        };
        assert_eq!(
            hex!("a2 ce 00 03 00 00 00 01 00 00 00 02 09 00 00 03").to_vec(),
            packet.to_vec()
        );
    }

    #[test]
    fn unknown_rtp_feedback_format() {
        let raw = hex!("82 cd 00 02 00 00 00 01 00 00 00 02");
        assert_eq!(
            Err(RtcpError::UnsupportedType {
                packet_type: 205,
                subtype: Some(2)
            }),
            RtpFeedbackPacket::parse(&raw)
        );
    }

    #[test]
    fn feedback_too_short() {
        let raw = hex!("81 cd 00 01 00 00 00 01");
        assert_eq!(
            Err(RtcpError::Truncated {
                needed: 12,
                available: 8
            }),
            RtpFeedbackPacket::parse(&raw)
        );
        let raw = hex!("81 ce 00 01 00 00 00 01");
        assert!(PsFeedbackPacket::parse(&raw).is_err());
    }

    #[test]
    fn parse_pli() {
        let raw = hex!("81 ce 00 02 00 00 00 01 00 00 00 02");
        let packet = PsFeedbackPacket::parse(&raw).unwrap();
        assert_eq!(
            PsFeedbackPacket {
                sender_ssrc: 1,
                media_ssrc: 2,
                message: PsFeedbackMessage::Pli,
            },
            packet
        );
        assert_eq!(raw.to_vec(), packet.to_vec());
    }

    #[test]
    fn parse_fir() {
        let raw = hex!(
            "84 ce 00 06
             00 00 00 01
             00 00 00 00
             00 00 00 0a 07 00 00 00
             00 00 00 0b 08 00 00 00"
        );
        let packet = PsFeedbackPacket::parse(&raw).unwrap();
        assert_eq!(
            PsFeedbackMessage::Fir(vec![
                FirItem {
                    ssrc: 10,
                    sequence_number: 7
                },
                FirItem {
                    ssrc: 11,
                    sequence_number: 8
                },
            ]),
            packet.message
        );
        assert_eq!(4, packet.count());
        assert_eq!(raw.to_vec(), packet.to_vec());
    }

    #[test]
    fn parse_remb() {
        let raw = hex!(
            "8f ce 00 07
             12 34 56 78
             00 00 00 00
             52 45 4d 42
             03 b4 1e e4
             12 34 56 79
             12 34 56 7a
             12 34 56 7b"
        );
        let packet = PsFeedbackPacket::parse(&raw).unwrap();
        assert_eq!(
            PsFeedbackMessage::Remb(Remb {
                bitrate_bps: 0x1ee4 << 45,
                ssrcs: vec![0x12345679, 0x1234567a, 0x1234567b],
            }),
            packet.message
        );
        assert_eq!(PsFeedbackType::Afb, packet.format());
        // The writer normalizes to the largest mantissa, so compare values rather than bytes.
        let reserialized = packet.to_vec();
        assert_eq!(raw.len(), reserialized.len());
        assert_eq!(packet, PsFeedbackPacket::parse(&reserialized).unwrap());
    }

    #[test]
    fn remb_small_bitrate() {
        let remb = Remb {
            bitrate_bps: 300_000,
            ssrcs: vec![1],
        };
        let fci = remb.to_vec();
        assert_eq!(hex!("52 45 4d 42 01 06 49 f0 00 00 00 01").to_vec(), fci);
        assert_eq!(remb, Remb::parse(&fci).unwrap());
    }

    #[test]
    fn remb_rounds_down_to_mantissa_precision() {
        let remb = Remb {
            bitrate_bps: (1 << 18) + 1,
            ssrcs: vec![],
        };
        let fci = remb.to_vec();
        assert_eq!(hex!("52 45 4d 42 00 06 00 00").to_vec(), fci);
        assert_eq!(1 << 18, Remb::parse(&fci).unwrap().bitrate_bps);

        let exact = Remb {
            bitrate_bps: (1 << 18) - 1,
            ssrcs: vec![],
        };
        assert_eq!(exact, Remb::parse(&exact.to_vec()).unwrap());
    }

    #[test]
    fn remb_ssrcs_overrun() {
        let fci = hex!("52 45 4d 42 02 00 00 01 00 00 00 01");
        assert!(matches!(Remb::parse(&fci), Err(RtcpError::Truncated { .. })));
    }

    #[test]
    fn remb_overflow() {
        // Exponent 63 with a non-zero high mantissa bit.
        let fci = hex!("52 45 4d 42 00 fe 00 00");
        assert_eq!(
            Err(RtcpError::Malformed("REMB bitrate overflows")),
            Remb::parse(&fci)
        );
    }

    #[test]
    fn afb_without_remb() {
        let raw = hex!("8f ce 00 03 00 00 00 01 00 00 00 00 41 42 43 44");
        let packet = PsFeedbackPacket::parse(&raw).unwrap();
        assert_eq!(
            PsFeedbackMessage::Afb(hex!("41 42 43 44").to_vec()),
            packet.message
        );
        assert_eq!(raw.to_vec(), packet.to_vec());
    }

    #[test]
    fn unknown_ps_feedback_format() {
        let raw = hex!("8a ce 00 02 00 00 00 01 00 00 00 02");
        assert_eq!(
            Err(RtcpError::UnsupportedType {
                packet_type: 206,
                subtype: Some(10)
            }),
            PsFeedbackPacket::parse(&raw)
        );
    }
}
