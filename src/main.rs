/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Command-line front end: compress or decompress width-aligned binary,
//! and convert between decimal text and little-endian binary.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use seqpress::prelude::*;
use tracing::debug;

const USAGE: &str = "\
usage: seqpress <compress|decompress|load|dump> [options]

options:
  -i PATH   input file (default: standard input)
  -o PATH   output file (default: standard output)
  -a ALGO   codec, `gorilla` or `entropy` (default: gorilla)
  -w BITS   value width, 32 or 64 (default: 32)
  -t TYPE   number type for load/dump, `int` or `float` (default: float)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Compress,
    Decompress,
    Load,
    Dump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Algorithm {
    Gorilla,
    Entropy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Width {
    W32,
    W64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberKind {
    Int,
    Float,
}

#[derive(Debug)]
struct Args {
    command: Command,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    algorithm: Algorithm,
    width: Width,
    kind: NumberKind,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let command = match args.next().as_deref() {
        Some("compress") => Command::Compress,
        Some("decompress") => Command::Decompress,
        Some("load") => Command::Load,
        Some("dump") => Command::Dump,
        Some(other) => bail!("unknown command `{other}`\n{USAGE}"),
        None => bail!("missing command\n{USAGE}"),
    };
    let mut parsed = Args {
        command,
        input: None,
        output: None,
        algorithm: Algorithm::Gorilla,
        width: Width::W32,
        kind: NumberKind::Float,
    };
    while let Some(flag) = args.next() {
        let value = args
            .next()
            .with_context(|| format!("flag `{flag}` requires a value"))?;
        match flag.as_str() {
            "-i" => parsed.input = Some(PathBuf::from(value)),
            "-o" => parsed.output = Some(PathBuf::from(value)),
            "-a" => {
                parsed.algorithm = match value.as_str() {
                    "gorilla" => Algorithm::Gorilla,
                    "entropy" => Algorithm::Entropy,
                    _ => bail!("unknown algorithm `{value}`"),
                }
            }
            "-w" => {
                parsed.width = match value.as_str() {
                    "32" => Width::W32,
                    "64" => Width::W64,
                    _ => bail!("unsupported width `{value}`"),
                }
            }
            "-t" => {
                parsed.kind = match value.as_str() {
                    "int" => NumberKind::Int,
                    "float" => NumberKind::Float,
                    _ => bail!("unknown number type `{value}`"),
                }
            }
            _ => bail!("unknown flag `{flag}`\n{USAGE}"),
        }
    }
    Ok(parsed)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    let input: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("cannot open {}", path.display()))?,
        )),
        None => Box::new(std::io::stdin().lock()),
    };
    let mut output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("cannot create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };

    match (args.command, args.width) {
        (Command::Compress, Width::W32) => compress::<u32>(args.algorithm, input, &mut output)?,
        (Command::Compress, Width::W64) => compress::<u64>(args.algorithm, input, &mut output)?,
        (Command::Decompress, Width::W32) => {
            decompress::<u32>(args.algorithm, input, &mut output)?
        }
        (Command::Decompress, Width::W64) => {
            decompress::<u64>(args.algorithm, input, &mut output)?
        }
        (Command::Load, _) => load(args.kind, args.width, input, &mut output)?,
        (Command::Dump, _) => dump(args.kind, args.width, input, &mut output)?,
    }

    output.flush().context("cannot flush output")?;
    Ok(())
}

fn compress<P>(algorithm: Algorithm, input: impl Read, output: impl Write) -> Result<()>
where
    P: Pattern + Value<Pattern = P>,
    u64: common_traits::CastableInto<P::Workspace>,
{
    match algorithm {
        Algorithm::Gorilla => compress_with(GorillaCompressor::<P, _>::new(output), input),
        Algorithm::Entropy => compress_with(EntropyCompressor::<P, _>::new(output), input),
    }
}

fn compress_with<P, C>(mut compressor: C, mut input: impl Read) -> Result<()>
where
    P: Pattern + Value<Pattern = P>,
    C: Compressor<P>,
{
    let mut count = 0_u64;
    loop {
        let mut block: P::Bytes = Default::default();
        let actual = input
            .read_bytes(block.as_mut())
            .context("cannot read input")?;
        count += 1;
        if actual == P::BYTES {
            compressor.add(P::from_le_bytes(block))?;
        } else {
            // Sentinel pad, stripped by `decompress`: a 0x01 byte, then
            // zeros up to the block boundary. Applied even to aligned
            // payloads (as a whole block) so stripping is unambiguous.
            let bytes = block.as_mut();
            bytes[actual] = 0x01;
            for byte in &mut bytes[actual + 1..] {
                *byte = 0;
            }
            compressor.add(P::from_le_bytes(block))?;
            break;
        }
    }
    compressor.finish()?;
    debug!(values = count, "compressed");
    Ok(())
}

fn decompress<P>(algorithm: Algorithm, input: impl Read, output: impl Write) -> Result<()>
where
    P: Pattern + Value<Pattern = P>,
    u64: common_traits::CastableInto<P::Workspace>,
{
    match algorithm {
        Algorithm::Gorilla => decompress_with(GorillaDecompressor::<P, _>::new(input), output),
        Algorithm::Entropy => decompress_with(EntropyDecompressor::<P, _>::new(input), output),
    }
}

fn decompress_with<P, D>(mut decompressor: D, mut output: impl Write) -> Result<()>
where
    P: Pattern + Value<Pattern = P>,
    D: Decompressor<P>,
{
    let mut pending: Option<P> = None;
    let mut count = 0_u64;
    loop {
        match decompressor.get() {
            Ok(value) => {
                if let Some(ready) = pending.replace(value) {
                    output
                        .write_all(ready.to_le_bytes().as_ref())
                        .context("cannot write output")?;
                }
                count += 1;
            }
            Err(error) if error.is_end_of_stream() => break,
            Err(error) => return Err(error.into()),
        }
    }
    if let Some(last) = pending {
        output
            .write_all(strip_pad(last.to_le_bytes().as_ref())?)
            .context("cannot write output")?;
    }
    debug!(values = count, "decompressed");
    Ok(())
}

/// Strip the `0x01` + `0x00`s sentinel pad from the final block.
fn strip_pad(block: &[u8]) -> Result<&[u8]> {
    let mut end = block.len();
    while end > 0 && block[end - 1] == 0 {
        end -= 1;
    }
    if end == 0 || block[end - 1] != 0x01 {
        bail!("corrupted stream: final block has no pad sentinel");
    }
    Ok(&block[..end - 1])
}

fn load(kind: NumberKind, width: Width, mut input: impl Read, mut output: impl Write) -> Result<()> {
    let mut text = String::new();
    input
        .read_to_string(&mut text)
        .context("cannot read input")?;
    let mut count = 0_u64;
    for token in text.split_whitespace() {
        match (kind, width) {
            (NumberKind::Int, Width::W32) => {
                let value: i32 = token
                    .parse()
                    .with_context(|| format!("invalid integer `{token}`"))?;
                output.write_all(&value.to_le_bytes())?;
            }
            (NumberKind::Int, Width::W64) => {
                let value: i64 = token
                    .parse()
                    .with_context(|| format!("invalid integer `{token}`"))?;
                output.write_all(&value.to_le_bytes())?;
            }
            (NumberKind::Float, Width::W32) => {
                let value: f32 = token
                    .parse()
                    .with_context(|| format!("invalid float `{token}`"))?;
                output.write_all(&value.to_le_bytes())?;
            }
            (NumberKind::Float, Width::W64) => {
                let value: f64 = token
                    .parse()
                    .with_context(|| format!("invalid float `{token}`"))?;
                output.write_all(&value.to_le_bytes())?;
            }
        }
        count += 1;
    }
    debug!(values = count, "loaded");
    Ok(())
}

fn dump(kind: NumberKind, width: Width, mut input: impl Read, mut output: impl Write) -> Result<()> {
    let mut count = 0_u64;
    match (kind, width) {
        (NumberKind::Int, Width::W32) => {
            while let Some(block) = read_block::<4>(&mut input)? {
                writeln!(output, "{}", i32::from_le_bytes(block))?;
                count += 1;
            }
        }
        (NumberKind::Int, Width::W64) => {
            while let Some(block) = read_block::<8>(&mut input)? {
                writeln!(output, "{}", i64::from_le_bytes(block))?;
                count += 1;
            }
        }
        (NumberKind::Float, Width::W32) => {
            while let Some(block) = read_block::<4>(&mut input)? {
                writeln!(output, "{}", f32::from_le_bytes(block))?;
                count += 1;
            }
        }
        (NumberKind::Float, Width::W64) => {
            while let Some(block) = read_block::<8>(&mut input)? {
                writeln!(output, "{}", f64::from_le_bytes(block))?;
                count += 1;
            }
        }
    }
    debug!(values = count, "dumped");
    Ok(())
}

fn read_block<const N: usize>(input: &mut impl Read) -> Result<Option<[u8; N]>> {
    let mut block = [0_u8; N];
    match input.read_bytes(&mut block).context("cannot read input")? {
        0 => Ok(None),
        n if n == N => Ok(Some(block)),
        n => bail!("corrupted input: {n} trailing bytes do not form a {N}-byte value"),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn roundtrip(payload: &[u8], algorithm: Algorithm) {
        let mut compressed = Vec::new();
        compress::<u32>(algorithm, payload, &mut compressed).unwrap();
        let mut restored = Vec::new();
        decompress::<u32>(algorithm, &compressed[..], &mut restored).unwrap();
        assert_eq!(restored, payload);
    }

    #[test]
    fn test_compress_roundtrip_all_paddings() {
        for algorithm in [Algorithm::Gorilla, Algorithm::Entropy] {
            for len in 0..24 {
                let payload: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(37)).collect();
                roundtrip(&payload, algorithm);
            }
            // Payloads ending in bytes the pad stripper looks for.
            roundtrip(&[5, 0, 0, 0, 1, 0, 0, 0], algorithm);
            roundtrip(&[1, 1, 1, 0], algorithm);
            roundtrip(&[0, 0, 0, 0], algorithm);
        }
    }

    #[test]
    fn test_strip_pad() {
        assert_eq!(strip_pad(&[0xaa, 0xbb, 0xcc, 0x01]).unwrap(), &[0xaa, 0xbb, 0xcc]);
        assert_eq!(strip_pad(&[0xaa, 0x01, 0, 0]).unwrap(), &[0xaa]);
        assert_eq!(strip_pad(&[0x01, 0, 0, 0]).unwrap(), &[] as &[u8]);
        assert!(strip_pad(&[0, 0, 0, 0]).is_err());
        assert!(strip_pad(&[0xaa, 0xbb, 0xcc, 0xdd]).is_err());
    }

    #[test]
    fn test_parse_args_defaults() {
        let args =
            parse_args(["compress"].into_iter().map(String::from)).unwrap();
        assert_eq!(args.command, Command::Compress);
        assert_eq!(args.algorithm, Algorithm::Gorilla);
        assert_eq!(args.width, Width::W32);
        assert_eq!(args.kind, NumberKind::Float);
        assert!(args.input.is_none() && args.output.is_none());
    }

    #[test]
    fn test_parse_args_flags() {
        let args = parse_args(
            ["dump", "-i", "in.bin", "-o", "out.txt", "-w", "64", "-t", "int"]
                .into_iter()
                .map(String::from),
        )
        .unwrap();
        assert_eq!(args.command, Command::Dump);
        assert_eq!(args.width, Width::W64);
        assert_eq!(args.kind, NumberKind::Int);
        assert_eq!(args.input.as_deref(), Some(std::path::Path::new("in.bin")));
        assert!(parse_args(["frobnicate"].into_iter().map(String::from)).is_err());
    }

    #[test]
    fn test_load_dump_inverse() {
        let text = "1 -2 3000000 -40";
        let mut binary = Vec::new();
        load(NumberKind::Int, Width::W32, text.as_bytes(), &mut binary).unwrap();
        assert_eq!(binary.len(), 16);
        let mut dumped = Vec::new();
        dump(NumberKind::Int, Width::W32, &binary[..], &mut dumped).unwrap();
        assert_eq!(String::from_utf8(dumped).unwrap(), "1\n-2\n3000000\n-40\n");
    }

    #[test]
    fn test_dump_rejects_trailing_fragment() {
        let mut dumped = Vec::new();
        assert!(dump(NumberKind::Int, Width::W32, &[1, 2, 3][..], &mut dumped).is_err());
    }
}
