/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use common_traits::*;
#[cfg(feature = "mem_dbg")]
use mem_dbg::{MemDbg, MemSize};

use crate::traits::{ByteRead, Pattern};

/// Errors returned by [`BitReader`] and the decompressors built on it.
#[derive(Debug, thiserror::Error)]
pub enum ReadError<E> {
    /// More bits were requested than the stream logically contains. For the
    /// decompressors this is the normal termination condition.
    #[error("end of stream")]
    EndOfStream,
    /// The underlying byte stream failed.
    #[error(transparent)]
    Backend(#[from] E),
}

impl<E> ReadError<E> {
    /// Whether this is the normal end-of-stream condition rather than an
    /// I/O failure.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, ReadError::EndOfStream)
    }
}

/// The read half of the bit workspace.
///
/// Mirrors [`BitWriter`](crate::impls::BitWriter): bits are served
/// LSB-first from the low end of the accumulator, which is refilled from
/// the backend in little-endian byte order. When the byte stream runs dry
/// the end marker (the padding `1` bits and the `0` below them) is
/// stripped, so `capacity` drops to exactly the number of logically
/// written bits and any further demand fails with
/// [`ReadError::EndOfStream`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "mem_dbg", derive(MemDbg, MemSize))]
pub struct BitReader<A: UnsignedInt, R: ByteRead> {
    backend: R,
    /// Buffered bits. Only the low `capacity` bits are meaningful; after
    /// the end marker is stripped the stale marker bits above them are
    /// masked out on every read.
    workspace: A,
    /// Number of valid bits in the workspace, in `0..=A::BITS`.
    capacity: usize,
    /// One byte of lookahead. A byte is committed to the workspace only
    /// once a successor proves it is not the final, marker-carrying byte.
    ahead: Option<u8>,
    /// The backend is exhausted and the end marker has been stripped.
    end: bool,
}

impl<A: UnsignedInt + CastableInto<u64> + AsBytes, R: ByteRead> BitReader<A, R>
where
    u64: CastableInto<A>,
{
    pub fn new(backend: R) -> Self {
        Self {
            backend,
            workspace: A::ZERO,
            capacity: 0,
            ahead: None,
            end: false,
        }
    }

    /// Read `n_bits` bits and return them in the lowest bits.
    ///
    /// `n_bits` must be at most `A::BITS - 7`, which a refill can always
    /// satisfy while the stream lasts.
    pub fn read_bits(&mut self, n_bits: usize) -> Result<u64, ReadError<R::Error>> {
        debug_assert!(n_bits <= 64);
        debug_assert!(n_bits <= A::BITS - 7);
        if n_bits == 0 {
            return Ok(0);
        }
        if self.capacity < n_bits {
            if !self.end {
                self.refill()?;
            }
            if self.capacity < n_bits {
                return Err(ReadError::EndOfStream);
            }
        }
        let value: u64 = ((self.workspace << (A::BITS - n_bits)) >> (A::BITS - n_bits)).cast();
        self.workspace >>= n_bits;
        self.capacity -= n_bits;
        Ok(value)
    }

    /// Read one full pattern.
    pub fn read_value<P>(&mut self) -> Result<P, ReadError<R::Error>>
    where
        P: Pattern<Workspace = A>,
        A: DowncastableInto<P>,
    {
        let value: A = self.read_bits(P::BITS)?.cast();
        Ok(value.downcast())
    }

    /// Pull bytes from the backend until the workspace is as full as whole
    /// bytes allow, detecting and stripping the end marker.
    fn refill(&mut self) -> Result<(), ReadError<R::Error>> {
        let expected = (A::BITS - self.capacity) / 8;
        let mut bytes = [0_u8; 17];
        let mut available = 0;
        if let Some(byte) = self.ahead.take() {
            bytes[0] = byte;
            available = 1;
        }
        // One byte beyond `expected`: a full read up to `expected` alone
        // cannot distinguish a drained backend from one with bytes left,
        // and the final byte needs the marker stripped before use.
        available += self
            .backend
            .read_bytes(&mut bytes[available..expected + 1])?;

        let commit = Ord::min(available, expected);
        for (offset, &byte) in bytes[..commit].iter().enumerate() {
            self.workspace |= u64::from(byte).cast() << (self.capacity + 8 * offset);
        }
        self.capacity += 8 * commit;

        if available > expected {
            self.ahead = Some(bytes[expected]);
        } else {
            self.end = true;
            if self.capacity > 0 {
                // Skip the padding ones, then the 0 bit below them.
                self.capacity -= 1;
                while self.capacity > 0
                    && (self.workspace >> self.capacity).cast() & 1_u64 == 1
                {
                    self.capacity -= 1;
                }
            }
        }
        Ok(())
    }

    pub fn into_inner(self) -> R {
        self.backend
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_stream() {
        // A logically empty stream is just the marker byte.
        let mut reader = BitReader::<u64, _>::new(&[0b11111110_u8][..]);
        assert!(reader.read_bits(1).unwrap_err().is_end_of_stream());
    }

    #[test]
    fn test_no_marker_at_all() {
        let mut reader = BitReader::<u64, _>::new(&[][..]);
        assert!(reader.read_bits(1).unwrap_err().is_end_of_stream());
    }

    #[test]
    fn test_marker_without_padding() {
        // Seven 1-bits of data, then the marker 0 completing the byte: the
        // stripping loop must stop at the marker and keep the data ones.
        let mut reader = BitReader::<u64, _>::new(&[0b01111111_u8][..]);
        assert_eq!(reader.read_bits(7).unwrap(), 0b1111111);
        assert!(reader.read_bits(1).unwrap_err().is_end_of_stream());
    }

    #[test]
    fn test_marker_on_refill_boundary() {
        // Nine bytes for a u64 accumulator: the first refill commits eight
        // and holds the marker byte back, so the data bit in it is not
        // served as payload.
        let mut bytes = vec![0_u8; 8];
        bytes.push(0b11111110);
        let mut reader = BitReader::<u64, _>::new(&bytes[..]);
        assert_eq!(reader.read_bits(57).unwrap(), 0);
        assert_eq!(reader.read_bits(7).unwrap(), 0);
        assert!(reader.read_bits(1).unwrap_err().is_end_of_stream());
    }

    #[test]
    fn test_partial_reads() {
        // Nine logical bits: a full byte plus the low bit of the marker
        // byte (0b11111100 = six pad ones, the marker 0, one data 0).
        let mut reader = BitReader::<u64, _>::new(&[0b10110011, 0b11111100_u8][..]);
        assert_eq!(reader.read_bits(3).unwrap(), 0b011);
        assert_eq!(reader.read_bits(5).unwrap(), 0b10110);
        assert_eq!(reader.read_bits(1).unwrap(), 0);
        assert!(reader.read_bits(1).unwrap_err().is_end_of_stream());
    }
}
