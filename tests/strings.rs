// Integration tests for Strings & Scan, and Sub-buffer Search.

use tvb::buffer::real::new_real;
use tvb::strings::{
    fake_unicode, find_line_end, find_line_end_unquoted, find_sub_buffer, get_stringz,
};

#[test]
fn crlf_line_scanning_scenario() {
    // "abc\r\ndef" -> linelen=3, next_offset=5.
    let tvb = new_real(b"abc\r\ndef".to_vec(), -1).unwrap();
    let end = find_line_end(&tvb, 0, -1, false).unwrap().unwrap();
    assert_eq!(end.next_offset, 5);
    let linelen = end.next_offset - end.terminator_len as i64;
    assert_eq!(linelen, 3);
}

#[test]
fn quoted_string_newline_immunity_scenario() {
    // "a\"b\nc\"d\n" -> linelen=7, next_offset=8.
    let tvb = new_real(b"a\"b\nc\"d\n".to_vec(), -1).unwrap();
    let end = find_line_end_unquoted(&tvb, 0, -1).unwrap();
    assert_eq!(end.next_offset, 8);
    let linelen = end.next_offset - end.terminator_len as i64;
    assert_eq!(linelen, 7);
}

#[test]
fn fake_unicode_round_trip_law() {
    let tvb = new_real(vec![0x41, 0x00], -1).unwrap();
    let bytes = fake_unicode(&tvb, 0, 1, true).unwrap();
    assert_eq!(bytes, vec![0x41, 0x00]);
}

#[test]
fn find_sub_buffer_and_get_stringz_compose() {
    let haystack = new_real(b"header\0payload-marker-tail".to_vec(), -1).unwrap();
    let (header, consumed) = get_stringz(&haystack, 0).unwrap();
    assert_eq!(header, b"header");
    assert_eq!(consumed, 7);

    let needle = new_real(b"marker".to_vec(), -1).unwrap();
    let pos = find_sub_buffer(&haystack, consumed as i64, &needle).unwrap();
    assert_eq!(pos, 15);
}
