//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

use hex_literal::hex;
use media_common::U24;
use media_rtcp::{
    bye::ByePacket,
    feedback::{NackItem, PsFeedbackMessage, Remb, RtpFeedbackMessage},
    report::{ReceiverReport, ReportBlock, SenderReport},
    sdes::{SdesItem, SdesItemType},
    xr::ExtendedReportBlock,
    CompoundPacket, PacketType, RtcpError, RtcpPacket,
};

// SR(1 block), SDES, RTPFB NACK, PSFB REMB, XR(RRT), BYE.
const CAPTURED: [u8; 136] = hex!(
    "81 c8 00 0c 00 00 00 01
     e5 a1 b2 c3 d4 e5 f6 07
     00 01 e2 40 00 00 00 64 00 00 3a 98
     00 00 00 02 10 00 00 05 00 01 00 20 00 00 00 0f a1 b2 c3 d4 00 00 10 00

     81 ca 00 03 00 00 00 01 01 04 61 62 63 64 00 00

     81 cd 00 03 00 00 00 01 00 00 00 02 03 e8 00 05

     8f ce 00 05 00 00 00 01 00 00 00 00 52 45 4d 42 01 07 d0 90 00 00 00 02

     80 cf 00 04 00 00 00 02 04 00 00 02 01 02 03 04 05 06 07 08

     81 cb 00 01 00 00 00 01"
);

fn valid_rr_sdes_bye() -> Vec<u8> {
    hex!(
        "80 c9 00 01 00 00 00 01
         81 ca 00 02 00 00 00 01 00 00 00 00
         81 cb 00 01 00 00 00 01"
    )
    .to_vec()
}

#[test]
fn parse_captured_compound() {
    let compound = CompoundPacket::parse(&CAPTURED);
    assert_eq!(
        vec![
            PacketType::SenderReport,
            PacketType::ReceiverReport,
            PacketType::SourceDescription,
            PacketType::RtpFeedback,
            PacketType::PsFeedback,
            PacketType::ExtendedReport,
            PacketType::Bye,
        ],
        compound
            .iter()
            .map(RtcpPacket::packet_type)
            .collect::<Vec<_>>()
    );

    let packets = compound.packets();
    match &packets[0] {
        RtcpPacket::SenderReport(sr) => {
            assert_eq!(
                &SenderReport {
                    ssrc: 1,
                    ntp_timestamp: 0xe5a1b2c3d4e5f607,
                    rtp_timestamp: 123456,
                    packet_count: 100,
                    octet_count: 15000,
                },
                sr
            );
        }
        other => panic!("expected SR, got {:?}", other),
    }
    match &packets[1] {
        RtcpPacket::ReceiverReport(rr) => {
            assert_eq!(1, rr.ssrc);
            assert_eq!(
                vec![ReportBlock {
                    ssrc: 2,
                    fraction_lost: 0x10,
                    cumulative_lost: U24::from(5u16),
                    highest_sequence_number: 0x10020,
                    jitter: 15,
                    last_sender_report: 0xa1b2c3d4,
                    delay_since_last_sender_report: 0x1000,
                }],
                rr.report_blocks
            );
        }
        other => panic!("expected RR, got {:?}", other),
    }
    match &packets[2] {
        RtcpPacket::SourceDescription(sdes) => {
            assert_eq!(
                vec![SdesItem::new(SdesItemType::Cname, "abcd")],
                sdes.chunks[0].items
            );
        }
        other => panic!("expected SDES, got {:?}", other),
    }
    match &packets[3] {
        RtcpPacket::RtpFeedback(fb) => {
            assert_eq!(
                RtpFeedbackMessage::Nack(vec![NackItem { pid: 1000, blp: 5 }]),
                fb.message
            );
        }
        other => panic!("expected RTPFB, got {:?}", other),
    }
    match &packets[4] {
        RtcpPacket::PsFeedback(fb) => {
            assert_eq!(
                PsFeedbackMessage::Remb(Remb {
                    bitrate_bps: 500_000,
                    ssrcs: vec![2],
                }),
                fb.message
            );
        }
        other => panic!("expected PSFB, got {:?}", other),
    }
    match &packets[5] {
        RtcpPacket::ExtendedReport(xr) => {
            assert_eq!(
                vec![ExtendedReportBlock::ReceiverReferenceTime {
                    ntp_timestamp: 0x0102030405060708
                }],
                xr.blocks
            );
        }
        other => panic!("expected XR, got {:?}", other),
    }
}

#[test]
fn captured_compound_round_trips() {
    let compound = CompoundPacket::parse(&CAPTURED);
    assert_eq!(CAPTURED.len(), compound.written_len());
    assert_eq!(CAPTURED.to_vec(), compound.to_vec().unwrap());

    let mut buffer = [0u8; 200];
    let written = compound.serialize_into(&mut buffer).unwrap();
    assert_eq!(&CAPTURED[..], &buffer[..written]);
}

#[test]
fn every_prefix_parses_to_a_prefix() {
    let full = CompoundPacket::parse(&CAPTURED);
    for len in 0..=CAPTURED.len() {
        let partial = CompoundPacket::parse(&CAPTURED[..len]);
        assert!(
            full.packets().starts_with(partial.packets()),
            "prefix of {} bytes",
            len
        );
    }
    assert!(CompoundPacket::parse(&CAPTURED[..CAPTURED.len() - 1]).len() < full.len());
}

#[test]
fn corrupted_trailing_packet_keeps_the_rest() {
    let mut raw = valid_rr_sdes_bye();
    // A BYE claiming 3 SSRCs with room for one.
    raw.extend_from_slice(&hex!("83 cb 00 01 00 00 00 09"));

    let compound = CompoundPacket::parse(&raw);
    assert_eq!(3, compound.len());
    assert_eq!(
        CompoundPacket::parse(&valid_rr_sdes_bye()),
        compound
    );
}

#[test]
fn unknown_type_stops_the_walk() {
    let raw = hex!(
        "80 c9 00 01 00 00 00 01
         80 d3 00 01 00 00 00 00
         81 ca 00 02 00 00 00 01 00 00 00 00"
    );
    let compound = CompoundPacket::parse(&raw);
    assert_eq!(
        vec![RtcpPacket::ReceiverReport(ReceiverReport {
            ssrc: 1,
            report_blocks: vec![],
        })],
        compound.into_packets()
    );
}

#[test]
fn non_rtcp_input_is_empty() {
    assert!(CompoundPacket::parse(&[]).is_empty());
    assert!(CompoundPacket::parse(&hex!("80 c9 00")).is_empty());
    assert!(CompoundPacket::parse(&hex!("40 c9 00 01 00 00 00 01")).is_empty());
    assert!(CompoundPacket::parse(&hex!("00 00 00 00 00 00 00 00")).is_empty());

    // Garbage after a valid packet ends the walk without losing it.
    let raw = hex!("80 c9 00 01 00 00 00 01 12 34 56 78");
    assert_eq!(1, CompoundPacket::parse(&raw).len());
}

#[test]
fn sender_report_with_two_blocks() {
    let block = |ssrc| ReportBlock {
        ssrc,
        fraction_lost: 0,
        cumulative_lost: U24::ZERO,
        highest_sequence_number: 1,
        jitter: 2,
        last_sender_report: 3,
        delay_since_last_sender_report: 4,
    };
    let sender_report = SenderReport {
        ssrc: 5,
        ntp_timestamp: 6,
        rtp_timestamp: 7,
        packet_count: 8,
        octet_count: 9,
    };
    let compound = CompoundPacket::from(vec![
        RtcpPacket::SenderReport(sender_report.clone()),
        RtcpPacket::ReceiverReport(ReceiverReport {
            ssrc: 5,
            report_blocks: vec![block(10), block(11)],
        }),
    ]);

    let serialized = compound.to_vec().unwrap();
    assert_eq!(76, serialized.len());
    assert_eq!(hex!("82 c8 00 12"), serialized[..4]);

    let parsed = CompoundPacket::parse(&serialized);
    assert_eq!(compound, parsed);
    assert_eq!(
        Some(&RtcpPacket::SenderReport(sender_report)),
        parsed.packets().first()
    );
}

#[test]
fn extended_report_keeps_blocks_before_unknown_one() {
    let raw = hex!(
        "80 cf 00 07 00 00 00 02
         04 00 00 02 00 00 00 00 00 00 00 2a
         09 00 00 01 de ad be ef
         04 00 00 02"
    );
    let compound = CompoundPacket::parse(&raw);
    assert_eq!(1, compound.len());
    match &compound.packets()[0] {
        RtcpPacket::ExtendedReport(xr) => {
            assert_eq!(2, xr.ssrc);
            assert_eq!(
                vec![ExtendedReportBlock::ReceiverReferenceTime { ntp_timestamp: 42 }],
                xr.blocks
            );
        }
        other => panic!("expected XR, got {:?}", other),
    }
}

#[test]
fn write_errors() {
    let compound = CompoundPacket::from(vec![RtcpPacket::Bye(ByePacket {
        ssrcs: (0..40).collect(),
        reason: None,
    })]);
    assert_eq!(
        Err(RtcpError::Malformed("too many items for the count field")),
        compound.to_vec()
    );

    let compound = CompoundPacket::parse(&valid_rr_sdes_bye());
    let mut buffer = [0u8; 16];
    assert_eq!(
        Err(RtcpError::BufferTooSmall {
            needed: 28,
            available: 16
        }),
        compound.serialize_into(&mut buffer)
    );
}

#[test]
fn long_multibyte_bye_reason_keeps_the_chain() {
    let compound = CompoundPacket::from(vec![
        RtcpPacket::Bye(ByePacket {
            ssrcs: vec![1],
            reason: Some(format!("{}é", "a".repeat(254))),
        }),
        RtcpPacket::Bye(ByePacket {
            ssrcs: vec![2],
            reason: None,
        }),
    ]);
    let parsed = CompoundPacket::parse(&compound.to_vec().unwrap());
    assert_eq!(2, parsed.len());
    match &parsed.packets()[0] {
        RtcpPacket::Bye(bye) => assert_eq!(Some("a".repeat(254)), bye.reason),
        other => panic!("expected BYE, got {:?}", other),
    }
}

#[test]
fn unaligned_transport_cc_round_trips() {
    let compound = CompoundPacket::from(vec![
        RtcpPacket::RtpFeedback(media_rtcp::feedback::RtpFeedbackPacket {
            sender_ssrc: 1,
            media_ssrc: 2,
            message: RtpFeedbackMessage::TransportCc(vec![0xab, 0xcd]),
        }),
        RtcpPacket::Bye(ByePacket {
            ssrcs: vec![1],
            reason: None,
        }),
    ]);
    let serialized = compound.to_vec().unwrap();
    assert_eq!(
        hex!("af cd 00 03 00 00 00 01 00 00 00 02 ab cd 00 02 81 cb 00 01 00 00 00 01").to_vec(),
        serialized
    );
    assert_eq!(compound, CompoundPacket::parse(&serialized));
}
