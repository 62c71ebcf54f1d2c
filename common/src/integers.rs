//
// Copyright 2021 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Contains non-standard integer lengths.

use std::{
    convert::TryFrom,
    fmt,
    fmt::{Debug, Display, Formatter},
};

use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
#[error("out of range integral type conversion attempted")]
pub struct TryFromIntError(());

/// A 24-bit unsigned integer, as used by the RTCP cumulative loss field.
#[derive(Copy, Clone, Default, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct U24(u32);

impl U24 {
    /// Number of bytes the type uses
    pub const SIZE: usize = 3;

    pub const MAX: U24 = U24((1 << 24) - 1);
    pub const ZERO: U24 = U24(0);

    pub fn truncate(value: u32) -> Self {
        Self(value & Self::MAX.0)
    }

    pub fn from_be_bytes(bytes: [u8; Self::SIZE]) -> Self {
        Self(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }

    pub fn to_be_bytes(self) -> [u8; Self::SIZE] {
        let [_, b0, b1, b2] = self.0.to_be_bytes();
        [b0, b1, b2]
    }
}

impl Debug for U24 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "U24({:#08x})", self.0)
    }
}

impl Display for U24 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for U24 {
    type Error = TryFromIntError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value > Self::MAX.0 {
            Err(TryFromIntError(()))
        } else {
            Ok(U24(value))
        }
    }
}

impl From<u16> for U24 {
    fn from(value: u16) -> Self {
        U24(value as u32)
    }
}

impl From<U24> for u32 {
    fn from(value: U24) -> Self {
        value.0
    }
}

impl From<U24> for usize {
    fn from(value: U24) -> Self {
        value.0 as usize
    }
}
