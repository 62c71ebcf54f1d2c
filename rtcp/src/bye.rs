//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

use media_common::{read_bytes, read_u8, round_up_to_multiple_of, Writable, Writer};

use crate::{error::RtcpError, header::RtcpHeader, packet_type::PacketType, Ssrc};

const SSRC_LENGTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ByePacket {
    pub ssrcs: Vec<Ssrc>,
    /// At most 255 bytes go on the wire, cut at a character boundary.
    pub reason: Option<String>,
}

impl ByePacket {
    pub const MAX_SSRCS: usize = 31;

    //     0                   1                   2                   3
    //     0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |V=2|P|    SC   |   PT=BYE=203  |             length            |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    |                           SSRC/CSRC                           |
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //    :                              ...                              :
    //    +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
    //    |     length    |               reason for leaving             ... (opt)
    //    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    pub fn parse(packet: &[u8]) -> Result<Self, RtcpError> {
        let header = RtcpHeader::read_from(packet)?;
        if header.packet_type != PacketType::Bye as u8 {
            return Err(RtcpError::Malformed("unexpected packet type"));
        }
        let end = header.payload_end(packet)?;
        let ssrcs_end = RtcpHeader::LENGTH + header.count_or_format as usize * SSRC_LENGTH;
        if ssrcs_end > end {
            return Err(RtcpError::truncated(ssrcs_end, end));
        }

        let ssrcs = packet[RtcpHeader::LENGTH..ssrcs_end]
            .chunks_exact(SSRC_LENGTH)
            .map(media_common::parse_u32)
            .collect();

        let reason = match read_u8(&packet[ssrcs_end..end]) {
            None => None,
            Some((reason_len, rest)) => {
                let (reason, _) = read_bytes(rest, reason_len as usize).ok_or_else(|| {
                    RtcpError::truncated(ssrcs_end + 1 + reason_len as usize, end)
                })?;
                let reason = String::from_utf8(reason.to_vec())
                    .map_err(|_| RtcpError::Malformed("BYE reason is not valid UTF-8"))?;
                Some(reason)
            }
        };

        Ok(Self { ssrcs, reason })
    }

    pub fn count(&self) -> usize {
        self.ssrcs.len()
    }

    // Cut at a character boundary so the written reason stays valid UTF-8.
    fn reason_bytes(&self) -> Option<&[u8]> {
        self.reason.as_ref().map(|reason| {
            let mut len = reason.len().min(u8::MAX as usize);
            while !reason.is_char_boundary(len) {
                len -= 1;
            }
            &reason.as_bytes()[..len]
        })
    }
}

impl Writer for ByePacket {
    fn written_len(&self) -> usize {
        let reason_len = self
            .reason_bytes()
            .map(|reason| round_up_to_multiple_of::<4>(1 + reason.len()))
            .unwrap_or(0);
        RtcpHeader::LENGTH + self.ssrcs.written_len() + reason_len
    }

    fn write(&self, out: &mut dyn Writable) {
        debug_assert!(self.count() <= Self::MAX_SSRCS);
        RtcpHeader::for_packet(self.count() as u8, PacketType::Bye as u8, self.written_len())
            .write(out);
        self.ssrcs.write(out);
        if let Some(reason) = self.reason_bytes() {
            [reason.len() as u8].write(out);
            reason.write(out);
            let padding = round_up_to_multiple_of::<4>(1 + reason.len()) - (1 + reason.len());
            [0u8; 3][..padding].write(out);
        }
    }
}
