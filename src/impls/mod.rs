/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

The bit workspace: sub-byte reads and writes over a byte stream.

[`BitWriter`] and [`BitReader`] pack and unpack bit fields of arbitrary
width into and out of a [`ByteWrite`](crate::traits::ByteWrite) or
[`ByteRead`](crate::traits::ByteRead). Bits are LSB-first within each byte
(the i-th bit appended becomes bit `i mod 8` of some byte) and multi-byte
groups move through the accumulator in little-endian order, so the two
sides are exact mirrors.

Both sides buffer bits in an unsigned accumulator `A`. Codecs pick `A`
twice as wide as their value width, which guarantees that a full-width
field plus the sub-byte residue of earlier fields always fits; see
[`Pattern::Workspace`](crate::traits::Pattern::Workspace).

A stream is terminated by [`BitWriter::finish`], which appends a single `0`
bit and completes the byte with `1` bits. [`BitReader`] consumes this end
marker when the byte stream runs dry and afterwards reports exactly the
logically written bits, failing with [`ReadError::EndOfStream`] beyond
them.

## Examples

```rust
use seqpress::prelude::*;

let mut writer = BitWriter::<u64, _>::new(Vec::new());
writer.write_bits(0b1011, 4).unwrap();
writer.write_bits(1000, 10).unwrap();
let bytes = writer.finish().unwrap();

let mut reader = BitReader::<u64, _>::new(&bytes[..]);
assert_eq!(reader.read_bits(4).unwrap(), 0b1011);
assert_eq!(reader.read_bits(10).unwrap(), 1000);
assert!(reader.read_bits(1).unwrap_err().is_end_of_stream());
```

*/

mod bit_reader;
pub use bit_reader::{BitReader, ReadError};

mod bit_writer;
pub use bit_writer::BitWriter;
