/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Interface traits of the crate.

[`ByteRead`] and [`ByteWrite`] are the byte-granular sources and sinks the
bit workspace is built on; they are implemented for every
[`Read`](std::io::Read) and [`Write`](std::io::Write) type, so files,
standard streams, slices, and vectors all work out of the box.

[`Value`] describes the numeric types the codecs accept (`u32`, `u64`,
`f32`, and `f64`) through their unsigned bit [`Pattern`], and each pattern
names the double-width accumulator the bit workspace uses for it. All
widths are resolved at compile time; there is no runtime dispatch on width.

*/

mod byte_stream;
pub use byte_stream::*;

mod value;
pub use value::*;
