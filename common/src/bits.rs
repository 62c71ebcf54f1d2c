//
// Copyright 2021 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::ops::{BitAnd, BitOr, Shl, Shr};

pub trait Bits: Sized + Copy {
    const BIT_WIDTH: u8 = (std::mem::size_of::<Self>() * 8) as u8;

    /// Returns true iff the bit at the index is one.
    ///
    /// # Arguments
    ///
    /// * `index` - The 0 based index starting at the least significant bit.
    fn ls_bit(self, index: u8) -> bool;

    /// Sets the bit to one at the index.
    ///
    /// # Arguments
    ///
    /// * `index` - The 0 based index starting at the least significant bit.
    fn set_ls_bit(self, index: u8) -> Self;
}

impl<T> Bits for T
where
    T: Copy
        + Shr<u8, Output = T>
        + Shl<u8, Output = T>
        + BitAnd<T, Output = T>
        + BitOr<T, Output = T>
        + From<u8>
        + Eq,
{
    fn ls_bit(self, index: u8) -> bool {
        assert!(index < Self::BIT_WIDTH);

        self >> index & T::from(1) == T::from(1)
    }

    fn set_ls_bit(self, index: u8) -> Self {
        assert!(index < Self::BIT_WIDTH);

        self | T::from(1) << index
    }
}

#[cfg(test)]
mod lsb_tests {
    use super::*;

    #[test]
    fn is_set_ls_bit_u16() {
        assert!(0b0000_0000_0000_0001u16.ls_bit(0));
        assert!(!0b0000_0000_0000_0010u16.ls_bit(0));
        assert!(0b1000_0000_0000_0000u16.ls_bit(15));
    }

    #[test]
    #[should_panic]
    fn get_panics_when_over_bit_length_u16() {
        0u16.ls_bit(16);
    }

    #[test]
    fn set_bits_u16() {
        let mask = 0u16.set_ls_bit(0);
        assert_eq!(0b1, mask);
        let mask = mask.set_ls_bit(0);
        assert_eq!(0b1, mask);
        let mask = mask.set_ls_bit(15);
        assert_eq!(0b1000_0000_0000_0001, mask);
    }
}
