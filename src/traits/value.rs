/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use common_traits::*;

/// The unsigned bit patterns the codecs operate on.
///
/// A pattern names the [`Workspace`](Pattern::Workspace) type twice its
/// width, which is what the bit workspace accumulates into: a full-width
/// field plus the residual sub-byte bits of a previous field always fit.
pub trait Pattern:
    UnsignedInt
    + ToBytes
    + FromBytes
    + UpcastableInto<u64>
    + UpcastableInto<Self::Workspace>
    + 'static
{
    /// The accumulator type, twice as wide as the pattern.
    type Workspace: UnsignedInt + CastableInto<u64> + DowncastableInto<Self> + AsBytes + 'static;
}

impl Pattern for u32 {
    type Workspace = u64;
}

impl Pattern for u64 {
    type Workspace = u128;
}

/// The accumulator type associated with a value type.
pub type WorkspaceOf<V> = <<V as Value>::Pattern as Pattern>::Workspace;

/// Values the codecs accept: 32- and 64-bit unsigned integers, and IEEE 754
/// floats reinterpreted bit for bit.
///
/// The codecs are bijective on the pattern view, so float round trips are
/// exact: NaN payloads, signed zeros, and subnormals all survive unchanged.
pub trait Value: Copy + 'static {
    type Pattern: Pattern;

    /// Reinterpret the value as its unsigned bit pattern.
    fn to_bits(self) -> Self::Pattern;

    /// Reinterpret an unsigned bit pattern as a value.
    fn from_bits(bits: Self::Pattern) -> Self;
}

impl Value for u32 {
    type Pattern = u32;

    #[inline(always)]
    fn to_bits(self) -> u32 {
        self
    }

    #[inline(always)]
    fn from_bits(bits: u32) -> u32 {
        bits
    }
}

impl Value for u64 {
    type Pattern = u64;

    #[inline(always)]
    fn to_bits(self) -> u64 {
        self
    }

    #[inline(always)]
    fn from_bits(bits: u64) -> u64 {
        bits
    }
}

impl Value for f32 {
    type Pattern = u32;

    #[inline(always)]
    fn to_bits(self) -> u32 {
        f32::to_bits(self)
    }

    #[inline(always)]
    fn from_bits(bits: u32) -> f32 {
        f32::from_bits(bits)
    }
}

impl Value for f64 {
    type Pattern = u64;

    #[inline(always)]
    fn to_bits(self) -> u64 {
        f64::to_bits(self)
    }

    #[inline(always)]
    fn from_bits(bits: u64) -> f64 {
        f64::from_bits(bits)
    }
}
