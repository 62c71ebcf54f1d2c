//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

use thiserror::Error;

use crate::packet_type::packet_type_name;

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum RtcpError {
    #[error("truncated: needed {needed} bytes, only {available} available")]
    Truncated { needed: usize, available: usize },
    #[error("malformed: {0}")]
    Malformed(&'static str),
    #[error("unsupported {} packet (type {packet_type}, subtype {subtype:?})", type_name(.packet_type))]
    UnsupportedType {
        packet_type: u8,
        subtype: Option<u8>,
    },
    #[error("embedded packet failed to parse: {0}")]
    EmbeddedParseFailure(Box<RtcpError>),
    #[error("buffer too small: needed {needed} bytes, only {available} available")]
    BufferTooSmall { needed: usize, available: usize },
}

impl RtcpError {
    pub(crate) fn truncated(needed: usize, available: usize) -> Self {
        Self::Truncated { needed, available }
    }

    /// Ensures `bytes` holds at least `needed` bytes.
    pub(crate) fn check_len(bytes: &[u8], needed: usize) -> Result<(), Self> {
        if bytes.len() < needed {
            Err(Self::truncated(needed, bytes.len()))
        } else {
            Ok(())
        }
    }
}

fn type_name(packet_type: &u8) -> &'static str {
    packet_type_name(*packet_type)
}

// List parsers read with byteorder; running out of input is the only io error they can see.
impl From<std::io::Error> for RtcpError {
    fn from(_: std::io::Error) -> Self {
        Self::Malformed("item list ends mid-item")
    }
}
