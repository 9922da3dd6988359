/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

The two codecs, behind a shared compressor/decompressor interface.

[Gorilla](gorilla) encodes one value at a time by XOR against its
predecessor and favors slowly drifting sequences; [Entropy](entropy)
stages batches of 256 values and exploits per-bit-position sparsity. They
share no state, only the bit workspace underneath, and their streams are
not self-describing: decode with the codec and width you encoded with.

The [`Compressor`] and [`Decompressor`] traits exist so that generic
drivers (the command-line tool, tests, benchmarks) can work with either
codec; each instantiation is monomorphized, there is no dynamic dispatch
in the value path.

*/

use crate::impls::ReadError;
use crate::traits::Value;

pub mod entropy;
pub use entropy::{EntropyCompressor, EntropyDecompressor};

pub mod gorilla;
pub use gorilla::{GorillaCompressor, GorillaDecompressor};

mod weights;

/// Streaming compression of a sequence of values.
pub trait Compressor<V: Value> {
    type Error: std::error::Error + Send + Sync + 'static;

    /// The byte sink the compressed stream is written to.
    type Backend;

    /// Append one value to the compressed stream.
    fn add(&mut self, value: V) -> Result<(), Self::Error>;

    /// Terminate the stream and return the backend.
    ///
    /// Must be called exactly once; a stream without its end marker does
    /// not decompress.
    fn finish(self) -> Result<Self::Backend, Self::Error>;
}

/// Streaming decompression of a sequence of values.
pub trait Decompressor<V: Value> {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Decode the next value, or [`ReadError::EndOfStream`] past the last
    /// one.
    fn get(&mut self) -> Result<V, ReadError<Self::Error>>;
}
