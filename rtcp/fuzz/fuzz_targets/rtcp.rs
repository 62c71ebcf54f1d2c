//
// Copyright 2021 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

#![no_main]

use libfuzzer_sys::fuzz_target;
use media_common::Writer;
use media_rtcp::*;

fuzz_target!(|data: Vec<u8>| {
    let compound = CompoundPacket::parse(&data);
    if !looks_like_rtcp(&data) {
        assert!(compound.is_empty());
    }
    for packet in &compound {
        assert!(packet.written_len() >= RtcpHeader::LENGTH);
    }

    let serialized = compound
        .to_vec()
        .expect("parsed packets always serialize");
    assert_eq!(compound.written_len(), serialized.len());
    assert_eq!(compound.len(), CompoundPacket::parse(&serialized).len());
});
