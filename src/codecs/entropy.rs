/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Bit-plane entropy codec.
//!
//! Values are staged in batches of 256 and transposed: for every bit
//! position, the batch contributes 8-bit slices (one bit from each of 8
//! consecutive values). A slice goes out either raw or entropy-coded as
//! its Hamming weight (one marker bit for which side is the minority,
//! then the minority count in unary) plus its rank within the weight
//! class; see [`weights`](super::weights). The choice is made per bit
//! plane from the previous slice of that plane: planes that were nearly
//! constant stay in entropy mode, noisy ones fall back to raw.
//!
//! A full batch is announced by a `1` bit, a trailing partial batch by a
//! `0` bit plus its 8-bit value count; partial octets are padded by
//! repeating the last value, which compresses to almost nothing.

use common_traits::*;

use crate::impls::{BitReader, BitWriter, ReadError};
use crate::traits::{ByteRead, ByteWrite, Value, WorkspaceOf};

use super::weights::TABLE;
use super::{Compressor, Decompressor};

/// Values staged per batch.
const BATCH: usize = 256;
/// Values per bit-plane slice.
const SLICE: usize = 8;

/// Batch-oriented entropy compressor.
///
/// Values are buffered until a batch fills or [`finish`](Self::finish) is
/// called, so the output lags the input by up to 255 values.
///
/// # Example
/// ```
/// use seqpress::prelude::*;
///
/// let mut compressor = EntropyCompressor::new(Vec::new());
/// for i in 0..1000_u32 {
///     compressor.add(i % 5).unwrap();
/// }
/// let compressed = compressor.finish().unwrap();
///
/// let mut decompressor = EntropyDecompressor::<u32, _>::new(&compressed[..]);
/// for i in 0..1000_u32 {
///     assert_eq!(decompressor.get().unwrap(), i % 5);
/// }
/// assert!(decompressor.get().unwrap_err().is_end_of_stream());
/// ```
pub struct EntropyCompressor<V: Value, W: ByteWrite> {
    bits: BitWriter<WorkspaceOf<V>, W>,
    batch: [V::Pattern; BATCH],
    len: usize,
    /// Per bit plane, the minority popcount of the previous slice; 8 means
    /// "no slice seen yet" and selects raw mode.
    counts: [u8; 64],
}

impl<V: Value, W: ByteWrite> EntropyCompressor<V, W>
where
    u64: CastableInto<WorkspaceOf<V>>,
{
    pub fn new(backend: W) -> Self {
        Self {
            bits: BitWriter::new(backend),
            batch: [<V::Pattern>::ZERO; BATCH],
            len: 0,
            counts: [SLICE as u8; 64],
        }
    }

    /// Stage one value, emitting the batch when it fills.
    pub fn add(&mut self, value: V) -> Result<(), W::Error> {
        self.batch[self.len] = value.to_bits();
        self.len += 1;
        if self.len == BATCH {
            self.bits.write_bits(1, 1)?;
            self.dump()?;
        }
        Ok(())
    }

    /// Emit any staged values and terminate the stream, returning the
    /// backend.
    pub fn finish(mut self) -> Result<W, W::Error> {
        if self.len > 0 {
            // A 0 marker bit with the 8-bit value count above it.
            self.bits.write_bits((self.len as u64) << 1, 9)?;
            let last = self.batch[self.len - 1];
            while self.len % SLICE != 0 {
                self.batch[self.len] = last;
                self.len += 1;
            }
            self.dump()?;
        }
        self.bits.finish()
    }

    fn dump(&mut self) -> Result<(), W::Error> {
        for position in (0..self.len).step_by(SLICE) {
            self.dump_slice(position)?;
        }
        self.len = 0;
        Ok(())
    }

    fn dump_slice(&mut self, position: usize) -> Result<(), W::Error> {
        for plane in 0..<V::Pattern>::BITS {
            // Keeps the accumulator shallow enough for the widest field.
            self.bits.flush()?;
            let mut slice = 0_u8;
            for (offset, &bits) in self.batch[position..position + SLICE].iter().enumerate() {
                if (bits >> plane) & <V::Pattern>::ONE == <V::Pattern>::ONE {
                    slice |= 1 << offset;
                }
            }
            let ones = slice.count_ones() as usize;
            let minority = Ord::min(ones, SLICE - ones);
            if self.counts[plane] > 1 {
                self.bits.write_bits(u64::from(slice), SLICE)?;
            } else {
                self.bits.write_bits(u64::from(2 * ones < SLICE), 1)?;
                self.bits.write_bits(1 << minority, minority + 1)?;
                self.bits.write_bits(
                    u64::from(TABLE.rank[slice as usize]),
                    usize::from(TABLE.code_len[ones]),
                )?;
            }
            self.counts[plane] = minority as u8;
        }
        Ok(())
    }
}

impl<V: Value, W: ByteWrite> Compressor<V> for EntropyCompressor<V, W>
where
    u64: CastableInto<WorkspaceOf<V>>,
{
    type Error = W::Error;
    type Backend = W;

    fn add(&mut self, value: V) -> Result<(), W::Error> {
        EntropyCompressor::add(self, value)
    }

    fn finish(self) -> Result<W, W::Error> {
        EntropyCompressor::finish(self)
    }
}

/// Batch-oriented entropy decompressor.
///
/// Must be configured with the same value width the stream was encoded
/// with; widths are not self-describing.
pub struct EntropyDecompressor<V: Value, R: ByteRead> {
    bits: BitReader<WorkspaceOf<V>, R>,
    batch: [V::Pattern; BATCH],
    position: usize,
    capacity: usize,
    counts: [u8; 64],
}

impl<V: Value, R: ByteRead> EntropyDecompressor<V, R>
where
    u64: CastableInto<WorkspaceOf<V>>,
{
    pub fn new(backend: R) -> Self {
        Self {
            bits: BitReader::new(backend),
            batch: [<V::Pattern>::ZERO; BATCH],
            position: 0,
            capacity: 0,
            counts: [SLICE as u8; 64],
        }
    }

    /// Decode the next value, or [`ReadError::EndOfStream`] past the last
    /// one.
    pub fn get(&mut self) -> Result<V, ReadError<R::Error>> {
        if self.position == self.capacity {
            self.refill()?;
            if self.position == self.capacity {
                return Err(ReadError::EndOfStream);
            }
        }
        let value = V::from_bits(self.batch[self.position]);
        self.position += 1;
        Ok(value)
    }

    fn refill(&mut self) -> Result<(), ReadError<R::Error>> {
        self.position = 0;
        self.batch = [<V::Pattern>::ZERO; BATCH];
        self.capacity = if self.bits.read_bits(1)? == 1 {
            BATCH
        } else {
            self.bits.read_bits(SLICE)? as usize
        };
        for position in (0..self.capacity).step_by(SLICE) {
            self.load_slice(position)?;
        }
        Ok(())
    }

    fn load_slice(&mut self, position: usize) -> Result<(), ReadError<R::Error>> {
        for plane in 0..<V::Pattern>::BITS {
            let (slice, ones) = if self.counts[plane] > 1 {
                let slice = self.bits.read_bits(SLICE)? as u8;
                (slice, slice.count_ones() as usize)
            } else {
                let ones_are_minority = self.bits.read_bits(1)? != 0;
                let mut minority = 0;
                while self.bits.read_bits(1)? == 0 {
                    minority += 1;
                }
                let ones = Ord::min(
                    if ones_are_minority {
                        minority
                    } else {
                        SLICE.saturating_sub(minority)
                    },
                    SLICE,
                );
                let rank = self.bits.read_bits(usize::from(TABLE.code_len[ones]))? as usize;
                // Out-of-class ranks only occur on corrupt input; any
                // stand-in value will do.
                (TABLE.mask[ones][..].get(rank).copied().unwrap_or(0), ones)
            };
            if slice != 0 {
                for offset in 0..SLICE {
                    if (slice >> offset) & 1 == 1 {
                        self.batch[position + offset] |= <V::Pattern>::ONE << plane;
                    }
                }
            }
            self.counts[plane] = Ord::min(ones, SLICE - ones) as u8;
        }
        Ok(())
    }

    pub fn into_inner(self) -> R {
        self.bits.into_inner()
    }
}

impl<V: Value, R: ByteRead> Decompressor<V> for EntropyDecompressor<V, R>
where
    u64: CastableInto<WorkspaceOf<V>>,
{
    type Error = R::Error;

    fn get(&mut self) -> Result<V, ReadError<R::Error>> {
        EntropyDecompressor::get(self)
    }
}
