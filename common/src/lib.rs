//
// Copyright 2022 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Common functionality for the media wire codecs.

mod bits;
mod integers;
mod logging;
mod serialize;
mod slice;

pub use bits::*;
pub use integers::*;
pub use logging::*;
pub use serialize::*;
pub use slice::*;

// It's (value, rest)
pub type ReadOption<'a, T> = Option<(T, &'a [u8])>;

// Returns (read, rest)
pub fn read_bytes(input: &[u8], len: usize) -> ReadOption<&[u8]> {
    let bytes = input.get(0..len)?;
    let rest = &input[len..];
    Some((bytes, rest))
}

pub fn read_u8(input: &[u8]) -> ReadOption<u8> {
    let (first, rest) = input.split_first()?;
    Some((*first, rest))
}

// The parse_* functions panic on short input; callers check lengths first.
pub fn parse_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

pub fn parse_u24(bytes: &[u8]) -> U24 {
    U24::from_be_bytes([bytes[0], bytes[1], bytes[2]])
}

pub fn parse_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

pub fn parse_u64(bytes: &[u8]) -> u64 {
    let mut array = [0u8; 8];
    array.copy_from_slice(&bytes[0..8]);
    u64::from_be_bytes(array)
}

pub fn round_up_to_multiple_of<const M: usize>(n: usize) -> usize {
    n.div_ceil(M) * M
}

pub trait CheckedSplitAt {
    fn checked_split_at(&self, mid: usize) -> Option<(&[u8], &[u8])>;
}

impl CheckedSplitAt for [u8] {
    fn checked_split_at(&self, mid: usize) -> Option<(&[u8], &[u8])> {
        if self.len() < mid {
            None
        } else {
            Some(self.split_at(mid))
        }
    }
}
