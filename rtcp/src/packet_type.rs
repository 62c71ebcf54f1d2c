//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Registry of RTCP packet types and feedback message types; names are used for logging only.

use strum_macros::{Display, EnumIter, FromRepr, IntoStaticStr};

const UNKNOWN: &str = "UNKNOWN";

/// Top-level packet types, carried in the PT octet of the common header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, FromRepr, IntoStaticStr)]
#[repr(u8)]
pub enum PacketType {
    /// Legacy full intra request (RFC 2032).
    #[strum(serialize = "FIR")]
    Fir = 192,
    /// Legacy NACK (RFC 2032).
    #[strum(serialize = "NACK")]
    Nack = 193,
    #[strum(serialize = "SR")]
    SenderReport = 200,
    #[strum(serialize = "RR")]
    ReceiverReport = 201,
    #[strum(serialize = "SDES")]
    SourceDescription = 202,
    #[strum(serialize = "BYE")]
    Bye = 203,
    #[strum(serialize = "APP")]
    App = 204,
    #[strum(serialize = "RTPFB")]
    RtpFeedback = 205,
    #[strum(serialize = "PSFB")]
    PsFeedback = 206,
    #[strum(serialize = "XR")]
    ExtendedReport = 207,
}

impl PacketType {
    pub fn name(self) -> &'static str {
        self.into()
    }
}

pub fn packet_type_name(packet_type: u8) -> &'static str {
    PacketType::from_repr(packet_type)
        .map(PacketType::name)
        .unwrap_or(UNKNOWN)
}

/// Transport layer feedback message types (FMT field of an RTPFB packet).
/// See https://www.iana.org/assignments/rtp-parameters/rtp-parameters.xhtml#rtp-parameters-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, FromRepr, IntoStaticStr)]
#[repr(u8)]
pub enum RtpFeedbackType {
    #[strum(serialize = "NACK")]
    Nack = 1,
    #[strum(serialize = "TMMBR")]
    Tmmbr = 3,
    #[strum(serialize = "TMMBN")]
    Tmmbn = 4,
    #[strum(serialize = "SR_REQ")]
    SrReq = 5,
    #[strum(serialize = "RAMS")]
    Rams = 6,
    #[strum(serialize = "TLLEI")]
    Tllei = 7,
    #[strum(serialize = "ECN")]
    Ecn = 8,
    #[strum(serialize = "PS")]
    Ps = 9,
    /// Transport-wide congestion control feedback.
    #[strum(serialize = "TCC")]
    Tcc = 15,
}

impl RtpFeedbackType {
    pub fn name_of(format: u8) -> &'static str {
        Self::from_repr(format).map(Into::into).unwrap_or(UNKNOWN)
    }
}

/// Payload-specific feedback message types (FMT field of a PSFB packet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, FromRepr, IntoStaticStr)]
#[repr(u8)]
pub enum PsFeedbackType {
    #[strum(serialize = "PLI")]
    Pli = 1,
    #[strum(serialize = "SLI")]
    Sli = 2,
    #[strum(serialize = "RPSI")]
    Rpsi = 3,
    #[strum(serialize = "FIR")]
    Fir = 4,
    #[strum(serialize = "TSTR")]
    Tstr = 5,
    #[strum(serialize = "TSTN")]
    Tstn = 6,
    #[strum(serialize = "VBCM")]
    Vbcm = 7,
    #[strum(serialize = "PSLEI")]
    Pslei = 8,
    #[strum(serialize = "ROI")]
    Roi = 9,
    /// Application layer feedback, which is where REMB lives.
    #[strum(serialize = "AFB")]
    Afb = 15,
}

impl PsFeedbackType {
    pub fn name_of(format: u8) -> &'static str {
        Self::from_repr(format).map(Into::into).unwrap_or(UNKNOWN)
    }
}
