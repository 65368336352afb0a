//! The decompressor: inflate zlib-wrapped or raw-deflate data
//! captured inside a buffer into a new child Real buffer, and a thin gzip
//! framing layer on top of the same engine.
//!
//! Built on `flate2`'s low-level [`Decompress`]/[`Status`] API rather than
//! its `Read` wrappers: this crate needs to retry a failed zlib-header parse
//! as raw deflate and needs the exact byte count actually produced on a
//! partial/failed run, neither of which the `Read` adapters expose.
//!
//! The historical source conflates "unrecoverable error" and "ran out of
//! output room mid-stream" into the same null return; this module keeps
//! them distinct via [`Decompressed`].

use std::fmt;

use flate2::{Decompress, DecompressError as Flate2Error, FlushDecompress, Status};

use crate::bounds::BoundsError;
use crate::buffer::real::new_real_child;
use crate::buffer::Tvb;
use crate::contiguity::resolve;

/// The growth factor applied to the output buffer each time a decompression
/// pass reports `Status::BufError` (output space exhausted, more is needed).
const GROWTH_FACTOR: usize = 2;

/// Starting guess for decompressed size: `max(2 × compressed_len, 32 KiB)`;
/// it grows geometrically afterward if that guess turns out short.
const INITIAL_GUESS_MULTIPLIER: usize = 2;
const INITIAL_GUESS_FLOOR: usize = 32 * 1024;

/// The outcome of a successful decompression pass, distinguishing a stream
/// that ran to completion from one that exhausted `size_cap` before
/// reaching its end — the stream is cut short by the output cap rather
/// than treated as a failure.
pub enum Decompressed {
    /// The stream was fully inflated.
    Complete(Tvb),
    /// `size_cap` was reached before the stream signaled end; `Tvb` holds
    /// everything decoded up to that point.
    Partial(Tvb),
}

impl Decompressed {
    /// The buffer either way, discarding whether it was complete.
    pub fn into_tvb(self) -> Tvb {
        match self {
            Decompressed::Complete(t) | Decompressed::Partial(t) => t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressError {
    /// The input offset/length did not resolve against the source buffer.
    Bounds(BoundsError),
    /// `flate2` rejected the stream outright (bad header, bad checksum, corrupt data).
    Corrupt,
    /// A gzip member's ten-byte fixed header (or a declared extra/name/comment
    /// field) ran past the end of the captured data.
    GzipHeaderTruncated,
    /// The first two bytes were not the gzip magic number `1f 8b`.
    NotGzip,
}

impl fmt::Display for DecompressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecompressError::Bounds(e) => write!(f, "decompress: {e}"),
            DecompressError::Corrupt => write!(f, "decompress: corrupt compressed stream"),
            DecompressError::GzipHeaderTruncated => {
                write!(f, "decompress: gzip header truncated")
            }
            DecompressError::NotGzip => write!(f, "decompress: missing gzip magic number"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecompressError {}

impl From<BoundsError> for DecompressError {
    fn from(e: BoundsError) -> Self {
        DecompressError::Bounds(e)
    }
}

impl From<Flate2Error> for DecompressError {
    fn from(_: Flate2Error) -> Self {
        DecompressError::Corrupt
    }
}

/// Equivalent to `tvb_uncompress`: inflate the `length` bytes at `offset`
/// within `tvb` (zlib-wrapped, falling back to raw deflate if the zlib
/// header check fails — the Rust equivalent of retrying `inflateInit2` with
/// negative window bits) into a brand-new, independent Real buffer.
///
/// `size_cap` bounds how large the output is allowed to grow; a stream
/// that has not signaled end by then comes back as [`Decompressed::Partial`]
/// rather than an error.
pub fn uncompress(
    tvb: &Tvb,
    offset: i64,
    length: i64,
    size_cap: usize,
) -> Result<Decompressed, DecompressError> {
    let input = resolve(tvb, offset, length)?;
    let (bytes, complete) = inflate(&input, size_cap)?;
    let real = crate::buffer::real::new_real(bytes, -1)?;
    Ok(wrap(real, complete))
}

/// Like [`uncompress`], but the resulting buffer is registered as a child of
/// `tvb` (`used_in`): freeing `tvb`'s chain also frees the decompressed data.
///
/// Equivalent to `tvb_child_uncompress`.
pub fn uncompress_child(
    tvb: &Tvb,
    offset: i64,
    length: i64,
    size_cap: usize,
) -> Result<Decompressed, DecompressError> {
    let input = resolve(tvb, offset, length)?;
    let (bytes, complete) = inflate(&input, size_cap)?;
    let real = new_real_child(tvb, bytes, -1)?;
    Ok(wrap(real, complete))
}

fn wrap(tvb: Tvb, complete: bool) -> Decompressed {
    if complete {
        Decompressed::Complete(tvb)
    } else {
        Decompressed::Partial(tvb)
    }
}

/// Run the zlib-then-raw-deflate fallback strategy. Returns the decoded
/// bytes and whether the stream reached its natural end (`true`) or was cut
/// short by `size_cap` (`false`).
fn inflate(input: &[u8], size_cap: usize) -> Result<(Vec<u8>, bool), DecompressError> {
    match inflate_with(input, true, size_cap) {
        Ok(out) => Ok(out),
        Err(DecompressError::Corrupt) => inflate_with(input, false, size_cap),
        Err(e) => Err(e),
    }
}

/// Run a single inflate pass with a fixed wrapping mode (`zlib` selects the
/// two-byte zlib header + Adler-32 trailer; `false` is raw deflate, used
/// both as the zlib-failure fallback and directly by [`gunzip`]).
///
/// Grows the output buffer geometrically and retries on `Status::BufError`
/// rather than allocating the whole decompressed size up front.
fn inflate_with(input: &[u8], zlib: bool, size_cap: usize) -> Result<(Vec<u8>, bool), DecompressError> {
    let mut decompressor = Decompress::new(zlib);
    let doubled_guess = input
        .len()
        .saturating_mul(INITIAL_GUESS_MULTIPLIER)
        .max(INITIAL_GUESS_FLOOR);
    // If doubling the input overshoots the cap, don't start there — fall
    // back to the conservative floor and let the growth loop below climb
    // toward the cap only if the stream actually needs it.
    let initial_len = if doubled_guess > size_cap {
        INITIAL_GUESS_FLOOR.min(size_cap.max(1))
    } else {
        doubled_guess
    };
    let mut out = vec![0u8; initial_len];

    loop {
        let before_in = decompressor.total_in();
        let before_out = decompressor.total_out();
        let status = decompressor
            .decompress(
                &input[before_in as usize..],
                &mut out[before_out as usize..],
                FlushDecompress::None,
            )
            .map_err(|_| DecompressError::Corrupt)?;

        match status {
            Status::StreamEnd => {
                out.truncate(decompressor.total_out() as usize);
                return Ok((out, true));
            }
            Status::Ok | Status::BufError => {
                if decompressor.total_out() as usize == before_out as usize
                    && decompressor.total_in() as usize == before_in as usize
                {
                    // No forward progress on a non-empty remaining input: the
                    // stream is truncated or otherwise cannot complete.
                    return Err(DecompressError::Corrupt);
                }
                if decompressor.total_out() as usize == out.len() {
                    if out.len() >= size_cap {
                        out.truncate(decompressor.total_out() as usize);
                        return Ok((out, false));
                    }
                    let next_len = out.len().saturating_mul(GROWTH_FACTOR).min(size_cap);
                    out.resize(next_len, 0);
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// gzip framing on top of the same raw-deflate engine
// ─────────────────────────────────────────────────────────────────────────────

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const FLAG_FTEXT: u8 = 0x01;
const FLAG_FHCRC: u8 = 0x02;
const FLAG_FEXTRA: u8 = 0x04;
const FLAG_FNAME: u8 = 0x08;
const FLAG_FCOMMENT: u8 = 0x10;

/// A gzip member's fixed ten-byte header, decoded enough to locate where the
/// raw deflate stream begins. Equivalent to the manual `gzip_header_t`
/// parsing `tvb_uncompress` performs before handing off to zlib's raw
/// inflate (a gzip member is a header, a raw deflate stream, then an 8-byte
/// CRC32 + ISIZE trailer — there is no zlib wrapper at all).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GzipHeader {
    pub mtime: u32,
    pub os: u8,
    pub text: bool,
    pub header_len: usize,
}

/// Equivalent to the gzip-specific branch of `tvb_uncompress`: verify the
/// magic number and deflate-only compression method, walk past any
/// FEXTRA/FNAME/FCOMMENT/FHCRC fields the flags declare, then inflate the
/// remainder as raw deflate (ignoring the trailing CRC32/ISIZE — this crate
/// does not re-validate the checksum). Every
/// pointer advance through the optional header fields is checked against
/// the end of the input before use — the concrete over-read this module
/// exists to rule out.
pub fn gunzip(
    tvb: &Tvb,
    offset: i64,
    length: i64,
    size_cap: usize,
) -> Result<Decompressed, DecompressError> {
    let input = resolve(tvb, offset, length)?;
    let (_header, body_start) = parse_gzip_header(&input)?;
    let (bytes, complete) = inflate_with(&input[body_start..], false, size_cap)?;
    let real = crate::buffer::real::new_real(bytes, -1)?;
    Ok(wrap(real, complete))
}

fn parse_gzip_header(input: &[u8]) -> Result<(GzipHeader, usize), DecompressError> {
    if input.len() < 10 {
        return Err(DecompressError::GzipHeaderTruncated);
    }
    if input[0..2] != GZIP_MAGIC {
        return Err(DecompressError::NotGzip);
    }
    let compression_method = input[2];
    if compression_method != 8 {
        return Err(DecompressError::Corrupt);
    }
    let flags = input[3];
    let mtime = u32::from_le_bytes([input[4], input[5], input[6], input[7]]);
    let os = input[9];
    let mut pos = 10usize;

    if flags & FLAG_FEXTRA != 0 {
        let xlen = *input.get(pos).ok_or(DecompressError::GzipHeaderTruncated)? as usize
            | (*input.get(pos + 1).ok_or(DecompressError::GzipHeaderTruncated)? as usize) << 8;
        pos += 2 + xlen;
        if pos > input.len() {
            return Err(DecompressError::GzipHeaderTruncated);
        }
    }
    if flags & FLAG_FNAME != 0 {
        pos = skip_cstring(input, pos)?;
    }
    if flags & FLAG_FCOMMENT != 0 {
        pos = skip_cstring(input, pos)?;
    }
    if flags & FLAG_FHCRC != 0 {
        pos += 2;
        if pos > input.len() {
            return Err(DecompressError::GzipHeaderTruncated);
        }
    }

    Ok((
        GzipHeader {
            mtime,
            os,
            text: flags & FLAG_FTEXT != 0,
            header_len: pos,
        },
        pos,
    ))
}

fn skip_cstring(input: &[u8], start: usize) -> Result<usize, DecompressError> {
    let rel = input[start..]
        .iter()
        .position(|&b| b == 0)
        .ok_or(DecompressError::GzipHeaderTruncated)?;
    Ok(start + rel + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::real::new_real;

    fn zlib_compress(data: &[u8]) -> Vec<u8> {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn gzip_compress(data: &[u8]) -> Vec<u8> {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn zlib_round_trip() {
        let plain = b"the quick brown fox jumps over the lazy dog".repeat(4);
        let compressed = zlib_compress(&plain);
        let tvb = new_real(compressed, -1).unwrap();
        match uncompress(&tvb, 0, -1, 1 << 20).unwrap() {
            Decompressed::Complete(out) => assert_eq!(out.length(), plain.len()),
            Decompressed::Partial(_) => panic!("expected a complete stream"),
        }
    }

    #[test]
    fn gzip_round_trip() {
        let plain = b"another payload entirely".repeat(8);
        let compressed = gzip_compress(&plain);
        let tvb = new_real(compressed, -1).unwrap();
        match gunzip(&tvb, 0, -1, 1 << 20).unwrap() {
            Decompressed::Complete(out) => assert_eq!(out.length(), plain.len()),
            Decompressed::Partial(_) => panic!("expected a complete stream"),
        }
    }

    #[test]
    fn rejects_truncated_gzip_header() {
        let tvb = new_real(vec![0x1f, 0x8b, 8, 0], -1).unwrap();
        assert_eq!(
            gunzip(&tvb, 0, -1, 1 << 20).unwrap_err(),
            DecompressError::GzipHeaderTruncated
        );
    }

    #[test]
    fn size_cap_yields_partial_instead_of_error() {
        let plain = vec![0u8; 1 << 20];
        let compressed = zlib_compress(&plain);
        let tvb = new_real(compressed, -1).unwrap();
        match uncompress(&tvb, 0, -1, 1024).unwrap() {
            Decompressed::Partial(out) => assert_eq!(out.length(), 1024),
            Decompressed::Complete(_) => panic!("expected a partial result at the size cap"),
        }
    }

    #[test]
    fn gzip_filename_field_is_skipped() {
        // A gzip stream whose header
        // carries a NUL-terminated filename before the deflate payload.
        let mut raw = vec![0x1f, 0x8b, 8, FLAG_FNAME, 0, 0, 0, 0, 0, 0xff];
        raw.extend_from_slice(b"payload.txt\0");
        let plain = b"hello";
        let mut deflater = flate2::Compress::new(flate2::Compression::default(), false);
        let mut body = vec![0u8; 64];
        deflater
            .compress(plain, &mut body, flate2::FlushCompress::Finish)
            .unwrap();
        body.truncate(deflater.total_out() as usize);
        raw.extend_from_slice(&body);

        let tvb = new_real(raw, -1).unwrap();
        match gunzip(&tvb, 0, -1, 1 << 20).unwrap() {
            Decompressed::Complete(out) => {
                let got = crate::strings::get_string(&out, 0, out.length() as i64).unwrap();
                assert_eq!(&got[..got.len() - 1], &plain[..]);
                assert_eq!(got.last(), Some(&0));
            }
            Decompressed::Partial(_) => panic!("expected a complete stream"),
        }
    }
}
