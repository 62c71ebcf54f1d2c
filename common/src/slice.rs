//
// Copyright 2022 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

pub trait ReadSliceExt: std::io::Read {
    /// Like `std::io::read_exact`, but borrows from `self` instead.
    fn read_slice(&mut self, n: usize) -> std::io::Result<&[u8]>;

    /// Drops `n` bytes from the front, failing if fewer remain.
    fn skip_bytes(&mut self, n: usize) -> std::io::Result<()> {
        self.read_slice(n).map(|_| ())
    }
}

impl ReadSliceExt for &'_ [u8] {
    fn read_slice(&mut self, n: usize) -> std::io::Result<&[u8]> {
        if self.len() < n {
            Err(std::io::ErrorKind::UnexpectedEof.into())
        } else {
            let (result, rest) = self.split_at(n);
            *self = rest;
            Ok(result)
        }
    }
}
