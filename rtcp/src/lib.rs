//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Compound RTCP codec: parses a datagram of concatenated RTCP packets into
//! typed values and serializes them back.

pub mod bye;
pub mod compound;
pub mod config;
pub mod error;
pub mod feedback;
pub mod header;
pub mod packet_type;
pub mod report;
pub mod sdes;
pub mod xr;

pub type Ssrc = u32;

pub use compound::{CompoundPacket, RtcpPacket};
pub use error::RtcpError;
pub use header::{looks_like_rtcp, RtcpHeader};
pub use packet_type::{packet_type_name, PacketType, PsFeedbackType, RtpFeedbackType};
