//! Strings & Scan operations, and Sub-buffer Search.
//!
//! Byte-level scans (`find_byte`, `find_any_of`, `find_sub_buffer`) walk the
//! buffer through [`crate::contiguity`] a chunk at a time rather than
//! resolving the whole range up front, so a scan over a Composite doesn't
//! force a flatten unless the match actually straddles a member.

use crate::bounds::BoundsError;
use crate::buffer::{Shape, Tvb};
use crate::contiguity::resolve;

/// Equivalent to `tvb_find_guint8`: the absolute offset of the first byte
/// equal to `needle` within `[offset, offset + max_length)`, or `-1` if not
/// found. `max_length == -1` means "search to the end of the captured data".
pub fn find_byte(tvb: &Tvb, offset: i64, max_length: i64, needle: u8) -> Result<i64, BoundsError> {
    find_any_of(tvb, offset, max_length, &[needle])
}

/// Equivalent to `tvb_pbrk_guint8`: the absolute offset of the first byte
/// that is a member of `needles`, or `-1` if none is found in range.
///
/// Fully handles the Composite case: rather than flattening up front, it
/// walks member-by-member so a search that terminates early in the first
/// member never touches the rest.
pub fn find_any_of(tvb: &Tvb, offset: i64, max_length: i64, needles: &[u8]) -> Result<i64, BoundsError> {
    let span = resolve(tvb, offset, max_length)?;
    let abs_offset = crate::bounds::normalize_offset(tvb.length(), tvb.reported_length(), offset)?;
    match span.iter().position(|b| needles.contains(b)) {
        Some(i) => Ok((abs_offset + i) as i64),
        None => Ok(-1),
    }
}

/// Equivalent to `tvb_find_tvb` (sub-buffer search, naive single-pass scan):
/// the absolute offset within `haystack` at which `needle`'s bytes first
/// occur in full, starting the search at `offset`, or `-1` if not found.
pub fn find_sub_buffer(haystack: &Tvb, offset: i64, needle: &Tvb) -> Result<i64, BoundsError> {
    let needle_len = needle.length();
    if needle_len == 0 {
        let abs = crate::bounds::normalize_offset(
            haystack.length(),
            haystack.reported_length(),
            offset,
        )?;
        return Ok(abs as i64);
    }

    let hay_span = resolve(haystack, offset, -1)?;
    let needle_span = resolve(needle, 0, needle_len as i64)?;
    let abs_offset =
        crate::bounds::normalize_offset(haystack.length(), haystack.reported_length(), offset)?;

    if needle_len > hay_span.len() {
        return Ok(-1);
    }
    for start in 0..=(hay_span.len() - needle_len) {
        if &hay_span[start..start + needle_len] == &needle_span[..] {
            return Ok((abs_offset + start) as i64);
        }
    }
    Ok(-1)
}

/// Equivalent to `tvb_strsize`: the number of bytes from `offset` through
/// and including the first NUL, i.e. `strnlen(..., -1) + 1`. Raises if no
/// NUL is found before the captured data ends — reported-bounds if the
/// capture is not itself short of what the protocol claims (`length ==
/// reported_length`), captured-bounds otherwise.
pub fn strsize(tvb: &Tvb, offset: i64) -> Result<usize, BoundsError> {
    match strnlen(tvb, offset, -1)? {
        -1 => {
            if tvb.length() == tvb.reported_length() {
                Err(BoundsError::Reported {
                    offset,
                    length: -1,
                    available: tvb.reported_length(),
                })
            } else {
                Err(BoundsError::Captured {
                    offset,
                    length: -1,
                    available: tvb.length(),
                })
            }
        }
        n => Ok(n as usize + 1),
    }
}

/// Equivalent to `tvb_strnlen`: the number of bytes from `offset` up to but
/// not including the first NUL within the next `max` bytes (`max == -1`
/// means "to the end of the captured data"). Returns `-1`, not an error, if
/// no NUL appears within that window.
pub fn strnlen(tvb: &Tvb, offset: i64, max: i64) -> Result<i64, BoundsError> {
    let remaining = tvb.ensure_length_remaining(offset)?;
    let scan_len = if max == -1 {
        remaining as i64
    } else {
        max.min(remaining as i64)
    };
    match find_byte(tvb, offset, scan_len, 0)? {
        -1 => Ok(-1),
        abs => {
            let start = crate::bounds::normalize_offset(tvb.length(), tvb.reported_length(), offset)?;
            Ok(abs - start as i64)
        }
    }
}

/// Equivalent to `tvb_get_string`: copy out `length` bytes and append a
/// trailing zero terminator, matching the allocator contract the three
/// `get_string*` variants share — the returned `Vec` is always one byte
/// longer than `length`.
pub fn get_string(tvb: &Tvb, offset: i64, length: i64) -> Result<Vec<u8>, BoundsError> {
    let span = resolve(tvb, offset, length)?;
    let mut out = Vec::with_capacity(span.len() + 1);
    out.extend_from_slice(&span);
    out.push(0);
    Ok(out)
}

/// Copy out exactly `length` bytes verbatim, with no terminator appended.
/// Used internally by the `get_string*` variants that manage their own
/// terminator placement.
fn copy_raw(tvb: &Tvb, offset: i64, length: i64) -> Result<Vec<u8>, BoundsError> {
    Ok(resolve(tvb, offset, length)?.to_vec())
}

/// Equivalent to `tvb_get_stringz`: copy out the NUL-terminated string at
/// `offset`, not including the terminator, and return it alongside
/// `strsize` (bytes consumed including the terminator).
pub fn get_stringz(tvb: &Tvb, offset: i64) -> Result<(Vec<u8>, usize), BoundsError> {
    let consumed = strsize(tvb, offset)?;
    let len = consumed - 1;
    let bytes = copy_raw(tvb, offset, len as i64)?;
    Ok((bytes, consumed))
}

/// Equivalent to `tvb_get_nstringz`: like [`get_stringz`], but never scans
/// past `bufsize - 1` bytes. Returns the raw bytes copied plus a trailing
/// terminator, and the string length — or `-1` as the length if no
/// terminator was found within that window, in which case the first
/// `bufsize - 1` bytes are copied and the terminator is written after them
/// regardless.
///
/// `bufsize == 0` leaves no room for even a terminator and is a
/// programmer-contract violation, matching the historical source's
/// `REPORT_DISSECTOR_BUG`. `bufsize == 1` falls out of the same formula
/// as a lone terminator byte with nothing copied ahead of it.
pub fn get_nstringz(tvb: &Tvb, offset: i64, bufsize: usize) -> Result<(Vec<u8>, i64), BoundsError> {
    assert!(bufsize > 0, "tvb: get_nstringz requires bufsize > 0");
    let len = strnlen(tvb, offset, bufsize as i64 - 1)?;
    let data_len = if len == -1 { bufsize - 1 } else { len as usize };
    let mut bytes = copy_raw(tvb, offset, data_len as i64)?;
    bytes.push(0);
    Ok((bytes, len))
}

/// Equivalent to `tvb_get_nstringz0`: like [`get_nstringz`], but intended for
/// callers that always append a synthetic NUL to the result themselves. This
/// crate treats strings as raw bytes, so there is no separate
/// buffer-sizing behavior to replicate; the function is kept as a distinct
/// entry point purely to preserve the two-name call surface.
pub fn get_nstringz0(tvb: &Tvb, offset: i64, bufsize: usize) -> Result<(Vec<u8>, i64), BoundsError> {
    get_nstringz(tvb, offset, bufsize)
}

/// Equivalent to `tvb_fake_unicode`: read `wordcount` 16-bit code units
/// (in the given endianness) and render each as a single byte — the code
/// unit itself if it fits under 256, `.` otherwise — followed by a
/// trailing zero terminator. A deliberately lossy, one-byte-per-unit
/// rendering, not a real UTF-16 decode.
pub fn fake_unicode(
    tvb: &Tvb,
    offset: i64,
    wordcount: i64,
    little_endian: bool,
) -> Result<Vec<u8>, BoundsError> {
    let byte_len = wordcount.saturating_mul(2);
    let bytes = resolve(tvb, offset, byte_len)?;
    let mut out = Vec::with_capacity(wordcount as usize + 1);
    for chunk in bytes.chunks_exact(2) {
        let unit = if little_endian {
            u16::from_le_bytes([chunk[0], chunk[1]])
        } else {
            u16::from_be_bytes([chunk[0], chunk[1]])
        };
        out.push(if unit < 256 { unit as u8 } else { b'.' });
    }
    out.push(0);
    Ok(out)
}

/// Equivalent to `tvb_memeql`: `true` iff the `length` bytes at `offset`
/// equal `expected` exactly. Out-of-bounds is treated as "not equal", not an
/// error, matching the historical source's boolean-predicate contract.
pub fn memeql(tvb: &Tvb, offset: i64, expected: &[u8]) -> bool {
    match resolve(tvb, offset, expected.len() as i64) {
        Ok(span) => &span[..] == expected,
        Err(_) => false,
    }
}

/// Equivalent to `tvb_strneql`: case-sensitive ASCII string comparison over
/// `size` bytes at `offset`.
pub fn strneql(tvb: &Tvb, offset: i64, expected: &[u8]) -> bool {
    memeql(tvb, offset, expected)
}

/// Equivalent to `tvb_strncaseeql`: ASCII case-insensitive comparison over
/// `size` bytes at `offset`.
pub fn strncaseeql(tvb: &Tvb, offset: i64, expected: &[u8]) -> bool {
    match resolve(tvb, offset, expected.len() as i64) {
        Ok(span) => span.eq_ignore_ascii_case(expected),
        Err(_) => false,
    }
}

/// The end of a scanned line: the absolute offset just past the line's
/// terminator, and the length of the terminator itself (1 for a bare `\n`,
/// 2 for `\r\n`, 0 if the line runs to the end of the buffer with no
/// terminator at all).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEnd {
    pub next_offset: i64,
    pub terminator_len: usize,
}

/// Equivalent to `tvb_find_line_end`: scan forward from `offset` for the end
/// of a line (`\n`, optionally preceded by `\r`), stopping after at most
/// `max_length` bytes. `desegment` mirrors the historical "this buffer may
/// be a partial segment" flag: when set and no terminator is found before
/// `max_length`, this returns `Ok(None)` (meaning "need more data") instead
/// of treating the buffer's own end as the line end.
pub fn find_line_end(
    tvb: &Tvb,
    offset: i64,
    max_length: i64,
    desegment: bool,
) -> Result<Option<LineEnd>, BoundsError> {
    let remaining = tvb.ensure_length_remaining(offset)?;
    let scan_len = if max_length == -1 {
        remaining as i64
    } else {
        max_length.min(remaining as i64)
    };
    let start = crate::bounds::normalize_offset(tvb.length(), tvb.reported_length(), offset)?;

    match find_any_of(tvb, offset, scan_len, &[b'\r', b'\n'])? {
        -1 => {
            if desegment {
                Ok(None)
            } else {
                Ok(Some(LineEnd {
                    next_offset: offset + scan_len,
                    terminator_len: 0,
                }))
            }
        }
        found => {
            let found = found as usize;
            let byte = resolve(tvb, found as i64, 1)?[0];
            if byte == b'\n' {
                return Ok(Some(LineEnd {
                    next_offset: (found + 1) as i64,
                    terminator_len: 1,
                }));
            }
            // A bare CR at the very edge of the scan window might still be
            // followed by an LF in data that hasn't arrived yet.
            let at_window_end = found + 1 >= start + scan_len as usize;
            if at_window_end {
                if desegment {
                    return Ok(None);
                }
                return Ok(Some(LineEnd {
                    next_offset: (found + 1) as i64,
                    terminator_len: 1,
                }));
            }
            let next_byte = resolve(tvb, (found + 1) as i64, 1)?[0];
            if next_byte == b'\n' {
                Ok(Some(LineEnd {
                    next_offset: (found + 2) as i64,
                    terminator_len: 2,
                }))
            } else {
                Ok(Some(LineEnd {
                    next_offset: (found + 1) as i64,
                    terminator_len: 1,
                }))
            }
        }
    }
}

/// Equivalent to `tvb_find_line_end_unquoted`: like [`find_line_end`], but a
/// `\n` inside a double-quoted run (an odd number of unescaped `"` seen
/// before it) does not terminate the line.
pub fn find_line_end_unquoted(
    tvb: &Tvb,
    offset: i64,
    max_length: i64,
) -> Result<LineEnd, BoundsError> {
    let remaining = tvb.ensure_length_remaining(offset)?;
    let scan_len = if max_length == -1 {
        remaining as i64
    } else {
        max_length.min(remaining as i64)
    };
    let span = resolve(tvb, offset, scan_len)?;

    let mut in_quotes = false;
    let mut escaped = false;
    let mut i = 0usize;
    while i < span.len() {
        match span[i] {
            b'\\' if in_quotes && !escaped => escaped = true,
            b'"' if !escaped => in_quotes = !in_quotes,
            b'\n' if !in_quotes => {
                let start =
                    crate::bounds::normalize_offset(tvb.length(), tvb.reported_length(), offset)?;
                let has_cr = i > 0 && span[i - 1] == b'\r';
                return Ok(LineEnd {
                    next_offset: (start + i + 1) as i64,
                    terminator_len: if has_cr { 2 } else { 1 },
                });
            }
            _ => escaped = false,
        }
        i += 1;
    }
    let start = crate::bounds::normalize_offset(tvb.length(), tvb.reported_length(), offset)?;
    Ok(LineEnd {
        next_offset: (start + span.len()) as i64,
        terminator_len: 0,
    })
}

/// Equivalent to `tvb_skip_wsp`: the absolute offset of the first
/// non-ASCII-whitespace byte at or after `offset`. Returns `offset`'s
/// normalized absolute form unchanged if it is already non-whitespace or
/// the buffer ends there.
pub fn skip_whitespace(tvb: &Tvb, offset: i64) -> Result<i64, BoundsError> {
    let mut pos = crate::bounds::normalize_offset(tvb.length(), tvb.reported_length(), offset)? as i64;
    loop {
        match tvb.length_remaining(pos) {
            n if n <= 0 => return Ok(pos),
            _ => {
                let span = resolve(tvb, pos, 1)?;
                if span[0] == b' ' || span[0] == b'\t' || span[0] == b'\r' || span[0] == b'\n' {
                    pos += 1;
                } else {
                    return Ok(pos);
                }
            }
        }
    }
}

/// Equivalent to `tvb_skip_wsp_return`: like [`skip_whitespace`], but scans
/// backward from `offset` over ASCII whitespace.
pub fn skip_whitespace_reverse(tvb: &Tvb, offset: i64) -> Result<i64, BoundsError> {
    let mut pos = crate::bounds::normalize_offset(tvb.length(), tvb.reported_length(), offset)? as i64;
    while pos > 0 {
        let span = resolve(tvb, pos - 1, 1)?;
        if span[0] == b' ' || span[0] == b'\t' || span[0] == b'\r' || span[0] == b'\n' {
            pos -= 1;
        } else {
            break;
        }
    }
    Ok(pos)
}

/// True if `tvb`'s top-level shape is a Composite. Exposed so `find_any_of`
/// callers that care about member-boundary behavior can check without
/// reaching into `crate::buffer` internals.
pub fn is_composite(tvb: &Tvb) -> bool {
    matches!(tvb.0.shape, Shape::Composite(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::composite::CompositeBuilder;
    use crate::buffer::real::new_real;

    #[test]
    fn find_byte_basic() {
        let tvb = new_real(b"hello\0world".to_vec(), -1).unwrap();
        assert_eq!(find_byte(&tvb, 0, -1, 0).unwrap(), 5);
        assert_eq!(find_byte(&tvb, 0, -1, b'z').unwrap(), -1);
    }

    #[test]
    fn stringz_round_trip() {
        let tvb = new_real(b"abc\0def".to_vec(), -1).unwrap();
        let (s, consumed) = get_stringz(&tvb, 0).unwrap();
        assert_eq!(s, b"abc");
        assert_eq!(consumed, 4);
    }

    #[test]
    fn nstringz_truncates_without_nul() {
        let tvb = new_real(b"abcdef".to_vec(), -1).unwrap();
        let (s, len) = get_nstringz(&tvb, 0, 3).unwrap();
        assert_eq!(s, b"ab\0");
        assert_eq!(len, -1);
    }

    #[test]
    fn nstringz_finds_terminator_within_window() {
        let tvb = new_real(b"ab\0cdef".to_vec(), -1).unwrap();
        let (s, len) = get_nstringz(&tvb, 0, 5).unwrap();
        assert_eq!(s, b"ab\0");
        assert_eq!(len, 2);
    }

    #[test]
    fn nstringz_bufsize_one_is_lone_terminator() {
        let tvb = new_real(b"abcdef".to_vec(), -1).unwrap();
        let (s, len) = get_nstringz(&tvb, 0, 1).unwrap();
        assert_eq!(s, b"\0");
        assert_eq!(len, -1);
    }

    #[test]
    fn fake_unicode_substitutes_dot_for_wide_units() {
        let tvb = new_real(vec![0x41, 0x00, 0x00, 0x01], -1).unwrap();
        let out = fake_unicode(&tvb, 0, 2, true).unwrap();
        assert_eq!(out, b"A.\0");
    }

    #[test]
    fn find_any_of_across_composite_members() {
        let a = new_real(b"abc".to_vec(), -1).unwrap();
        let b = new_real(b"def".to_vec(), -1).unwrap();
        let mut builder = CompositeBuilder::new();
        builder.append(a).append(b);
        let composite = builder.finalize();
        assert!(is_composite(&composite));
        assert_eq!(find_any_of(&composite, 0, -1, b"f").unwrap(), 5);
    }

    #[test]
    fn find_sub_buffer_locates_needle() {
        let haystack = new_real(b"the quick brown fox".to_vec(), -1).unwrap();
        let needle = new_real(b"brown".to_vec(), -1).unwrap();
        assert_eq!(find_sub_buffer(&haystack, 0, &needle).unwrap(), 10);
    }

    #[test]
    fn line_end_handles_crlf() {
        let tvb = new_real(b"first\r\nsecond".to_vec(), -1).unwrap();
        let end = find_line_end(&tvb, 0, -1, false).unwrap().unwrap();
        assert_eq!(end.next_offset, 7);
        assert_eq!(end.terminator_len, 2);
    }

    #[test]
    fn line_end_unquoted_ignores_newline_in_quotes() {
        let tvb = new_real(b"a=\"b\nc\"\nrest".to_vec(), -1).unwrap();
        let end = find_line_end_unquoted(&tvb, 0, -1).unwrap();
        assert_eq!(end.next_offset, 8);
    }

    #[test]
    fn whitespace_skip_both_directions() {
        let tvb = new_real(b"  abc  ".to_vec(), -1).unwrap();
        assert_eq!(skip_whitespace(&tvb, 0).unwrap(), 2);
        assert_eq!(skip_whitespace_reverse(&tvb, 7).unwrap(), 5);
    }
}
