/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::error::Error;
use std::io::{ErrorKind, Read, Write};

/// Sequential, streaming byte-by-byte reads.
pub trait ByteRead {
    type Error: Error + Send + Sync + 'static;

    /// Fill `buf` with the next bytes of the stream and return how many
    /// bytes were read.
    ///
    /// Implementations keep reading until the buffer is full or the stream
    /// is exhausted, so a count smaller than `buf.len()` means the end of
    /// the stream has been reached.
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Sequential, streaming byte-by-byte writes.
pub trait ByteWrite {
    type Error: Error + Send + Sync + 'static;

    /// Write all of `buf` and advance the current position.
    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), Self::Error>;
}

impl<R: Read> ByteRead for R {
    type Error = std::io::Error;

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, std::io::Error> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<W: Write> ByteWrite for W {
    type Error = std::io::Error;

    #[inline(always)]
    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), std::io::Error> {
        self.write_all(buf)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// A reader that hands out one byte at a time.
    struct OneByOne<'a>(&'a [u8]);

    impl Read for OneByOne<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match (self.0.split_first(), buf.is_empty()) {
                (Some((&byte, rest)), false) => {
                    buf[0] = byte;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn test_read_bytes_fills_across_short_reads() {
        let mut reader = OneByOne(&[1, 2, 3, 4, 5]);
        let mut buf = [0; 4];
        assert_eq!(reader.read_bytes(&mut buf).unwrap(), 4);
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(reader.read_bytes(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 5);
        assert_eq!(reader.read_bytes(&mut buf).unwrap(), 0);
    }
}
