// Integration tests for the Decompressor: zlib/raw-deflate inflate and
// gzip framing, including a gzip header carrying a filename field.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

use tvb::buffer::real::new_real;
use tvb::decompress::{gunzip, uncompress, Decompressed};
use tvb::strings::get_string;

fn zlib_compress(data: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

#[test]
fn uncompress_zlib_payload() {
    let plain = b"dissection payload bytes repeated several times ".repeat(6);
    let compressed = zlib_compress(&plain);
    let tvb = new_real(compressed, -1).unwrap();
    let out = match uncompress(&tvb, 0, -1, 1 << 20).unwrap() {
        Decompressed::Complete(t) => t,
        Decompressed::Partial(_) => panic!("expected a complete stream"),
    };
    let got = get_string(&out, 0, out.length() as i64).unwrap();
    assert_eq!(&got[..got.len() - 1], &plain[..]);
    assert_eq!(got.last(), Some(&0));
}

#[test]
fn gzip_with_filename_flag_scenario() {
        let plain = b"hello";
    let gz = gzip_with_filename(plain, b"trace.bin");
    let tvb = new_real(gz, -1).unwrap();
    let out = match gunzip(&tvb, 0, -1, 1 << 20).unwrap() {
        Decompressed::Complete(t) => t,
        Decompressed::Partial(_) => panic!("expected a complete stream"),
    };
    assert_eq!(out.length(), 5);
    let got = get_string(&out, 0, 5).unwrap();
    assert_eq!(&got[..5], &plain[..]);
    assert_eq!(got.last(), Some(&0));
}

#[test]
fn gzip_missing_filename_terminator_is_rejected_without_overread() {
    // a filename field with no NUL
    // before the input ends must be rejected, not scanned past the buffer.
    let mut raw = vec![0x1f, 0x8b, 8, 0x08, 0, 0, 0, 0, 0, 0xff];
    raw.extend_from_slice(b"no_terminator_here");
    let tvb = new_real(raw, -1).unwrap();
    assert!(gunzip(&tvb, 0, -1, 1 << 20).is_err());
}

fn gzip_with_filename(plain: &[u8], filename: &[u8]) -> Vec<u8> {
    // Build a gzip member by hand so the header's FNAME field is
    // deterministic rather than left to `GzBuilder`'s own defaults.
    let mut raw = vec![0x1f, 0x8b, 8, 0x08, 0, 0, 0, 0, 0, 0xff];
    raw.extend_from_slice(filename);
    raw.push(0);

    let mut compressor = flate2::Compress::new(Compression::default(), false);
    let mut body = vec![0u8; 256];
    compressor
        .compress(plain, &mut body, flate2::FlushCompress::Finish)
        .unwrap();
    body.truncate(compressor.total_out() as usize);
    raw.extend_from_slice(&body);
    raw
}
