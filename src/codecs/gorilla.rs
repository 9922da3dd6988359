/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Gorilla XOR-delta codec.
//!
//! The value compressor of Facebook's Gorilla time-series database
//! (Pelkonen et al., VLDB 2015). Each value is XORed with its predecessor:
//! an unchanged value costs one bit, and a changed one is sent as the
//! significant window of the delta. The window bounds (leading zeros and
//! width) are sent only when the new delta no longer fits the previous
//! window, so slowly drifting sequences pay for them rarely.
//!
//! Codewords for a width-W value:
//!
//! | delta | codeword |
//! |---|---|
//! | zero | `0` |
//! | fits previous window | `1` `0` + window bits |
//! | new window | `1` `1` + ⌈log₂W⌉-bit leading-zero count + (⌈log₂W⌉+1)-bit width + significant bits |

use common_traits::*;

use crate::impls::{BitReader, BitWriter, ReadError};
use crate::traits::{ByteRead, ByteWrite, Value, WorkspaceOf};

use super::{Compressor, Decompressor};

/// Streaming Gorilla compressor.
///
/// # Example
/// ```
/// use seqpress::prelude::*;
///
/// let mut compressor = GorillaCompressor::new(Vec::new());
/// compressor.add(12.5_f64).unwrap();
/// compressor.add(12.5_f64).unwrap();
/// let compressed = compressor.finish().unwrap();
///
/// let mut decompressor = GorillaDecompressor::<f64, _>::new(&compressed[..]);
/// assert_eq!(decompressor.get().unwrap(), 12.5);
/// assert_eq!(decompressor.get().unwrap(), 12.5);
/// assert!(decompressor.get().unwrap_err().is_end_of_stream());
/// ```
#[derive(Debug)]
pub struct GorillaCompressor<V: Value, W: ByteWrite> {
    bits: BitWriter<WorkspaceOf<V>, W>,
    prev: V::Pattern,
    prev_leading: usize,
    prev_trailing: usize,
}

impl<V: Value, W: ByteWrite> GorillaCompressor<V, W>
where
    u64: CastableInto<WorkspaceOf<V>>,
{
    pub fn new(backend: W) -> Self {
        Self {
            bits: BitWriter::new(backend),
            prev: <V::Pattern>::ZERO,
            // Sentinel wider than any real window, so the first nonzero
            // delta always opens a fresh one.
            prev_leading: <V::Pattern>::BITS,
            prev_trailing: <V::Pattern>::BITS,
        }
    }

    /// Append one value to the compressed stream.
    pub fn add(&mut self, value: V) -> Result<(), W::Error> {
        let bits = value.to_bits();
        let delta = bits ^ self.prev;
        self.prev = bits;

        if delta == <V::Pattern>::ZERO {
            self.bits.write_bits(0, 1)?;
            return self.bits.flush();
        }

        let leading = delta.leading_zeros() as usize;
        let trailing = delta.trailing_zeros() as usize;

        if leading >= self.prev_leading && trailing >= self.prev_trailing {
            self.bits.write_bits(0b01, 2)?;
            let width = <V::Pattern>::BITS - self.prev_leading - self.prev_trailing;
            self.bits
                .write_bits((delta >> self.prev_trailing).upcast(), width)?;
        } else {
            let log_width = <V::Pattern>::BITS.ilog2() as usize;
            let width = <V::Pattern>::BITS - leading - trailing;
            self.bits.write_bits(0b11, 2)?;
            self.bits.write_bits(leading as u64, log_width)?;
            self.bits.write_bits(width as u64, log_width + 1)?;
            self.bits.write_bits((delta >> trailing).upcast(), width)?;
            self.prev_leading = leading;
            self.prev_trailing = trailing;
        }

        self.bits.flush()
    }

    /// Terminate the stream and return the backend.
    pub fn finish(self) -> Result<W, W::Error> {
        self.bits.finish()
    }
}

impl<V: Value, W: ByteWrite> Compressor<V> for GorillaCompressor<V, W>
where
    u64: CastableInto<WorkspaceOf<V>>,
{
    type Error = W::Error;
    type Backend = W;

    fn add(&mut self, value: V) -> Result<(), W::Error> {
        GorillaCompressor::add(self, value)
    }

    fn finish(self) -> Result<W, W::Error> {
        GorillaCompressor::finish(self)
    }
}

/// Streaming Gorilla decompressor.
///
/// Must be configured with the same value width the stream was encoded
/// with; widths are not self-describing.
#[derive(Debug)]
pub struct GorillaDecompressor<V: Value, R: ByteRead> {
    bits: BitReader<WorkspaceOf<V>, R>,
    prev: V::Pattern,
    prev_leading: usize,
    prev_trailing: usize,
}

impl<V: Value, R: ByteRead> GorillaDecompressor<V, R>
where
    u64: CastableInto<WorkspaceOf<V>>,
{
    pub fn new(backend: R) -> Self {
        Self {
            bits: BitReader::new(backend),
            prev: <V::Pattern>::ZERO,
            prev_leading: <V::Pattern>::BITS,
            prev_trailing: <V::Pattern>::BITS,
        }
    }

    /// Decode the next value, or [`ReadError::EndOfStream`] past the last
    /// one.
    pub fn get(&mut self) -> Result<V, ReadError<R::Error>> {
        if self.bits.read_bits(1)? == 0 {
            return Ok(V::from_bits(self.prev));
        }

        let delta = if self.bits.read_bits(1)? == 0 {
            // Previous window. The shift amounts come from our own state,
            // which tracks the encoder exactly on well-formed streams.
            let width = <V::Pattern>::BITS
                .saturating_sub(self.prev_leading + self.prev_trailing);
            if width == 0 {
                <V::Pattern>::ZERO
            } else {
                self.read_pattern(width)? << self.prev_trailing
            }
        } else {
            let log_width = <V::Pattern>::BITS.ilog2() as usize;
            let leading = self.bits.read_bits(log_width)? as usize;
            let width = Ord::min(
                self.bits.read_bits(log_width + 1)? as usize,
                <V::Pattern>::BITS,
            );
            let slice = self.read_pattern(width)?;
            let shift = <V::Pattern>::BITS.saturating_sub(leading + width);
            let delta = if width == 0 { slice } else { slice << shift };
            // The window is re-derived from the delta itself, not from the
            // transmitted fields.
            self.prev_leading = delta.leading_zeros() as usize;
            self.prev_trailing = delta.trailing_zeros() as usize;
            delta
        };

        let bits = self.prev ^ delta;
        self.prev = bits;
        Ok(V::from_bits(bits))
    }

    fn read_pattern(&mut self, n_bits: usize) -> Result<V::Pattern, ReadError<R::Error>> {
        let value: WorkspaceOf<V> = self.bits.read_bits(n_bits)?.cast();
        Ok(value.downcast())
    }

    pub fn into_inner(self) -> R {
        self.bits.into_inner()
    }
}

impl<V: Value, R: ByteRead> Decompressor<V> for GorillaDecompressor<V, R>
where
    u64: CastableInto<WorkspaceOf<V>>,
{
    type Error = R::Error;

    fn get(&mut self) -> Result<V, ReadError<R::Error>> {
        GorillaDecompressor::get(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_zero_run_is_one_bit_per_value() {
        let mut compressor = GorillaCompressor::new(Vec::new());
        for _ in 0..800 {
            compressor.add(42.125_f64).unwrap();
        }
        let compressed = compressor.finish().unwrap();
        // One window for the first value, one bit per repeat, one marker
        // byte.
        assert!(compressed.len() <= 800 / 8 + 16);
    }

    #[test]
    fn test_window_reuse_and_renewal() {
        // Forces reuse (second delta nested in the first window) and then
        // renewal (third delta outgrows it).
        let values = [0_u64, 0b1111_0000, 0b0110_0000, 0b1, 0b1111_0000_0000];
        let mut compressor = GorillaCompressor::new(Vec::new());
        for &value in &values {
            compressor.add(value).unwrap();
        }
        let compressed = compressor.finish().unwrap();
        let mut decompressor = GorillaDecompressor::<u64, _>::new(&compressed[..]);
        for &value in &values {
            assert_eq!(decompressor.get().unwrap(), value);
        }
        assert!(decompressor.get().unwrap_err().is_end_of_stream());
    }
}
