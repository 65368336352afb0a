// Integration tests for bounds.rs: offset/length normalization and the
// captured-vs-reported classification.

use tvb::bounds::{check, BoundsError};

#[test]
fn zero_length_subset_at_eof_scenario() {
        assert_eq!(check(10, 10, 10, 0), Ok((10, 0)));
}

#[test]
fn truncation_classification_scenario() {
    // captured 4, reported 16, bytes [1,2,3,4].
    assert_eq!(check(4, 16, 3, 1), Ok((3, 1)));
    assert!(matches!(
        check(4, 16, 4, 1),
        Err(BoundsError::Captured { .. })
    ));
    assert!(matches!(
        check(4, 16, 16, 1),
        Err(BoundsError::Reported { .. })
    ));
}

#[test]
fn reported_vs_captured_classification_property() {
    // For every (captured, reported, offset, length) with offset+length
    // past captured but within reported -> Captured; past reported -> Reported.
    for (captured, reported, offset, length) in
        [(4usize, 16usize, 2i64, 4i64), (4, 16, 15, 1), (0, 0, 0, 0)]
    {
        let end = offset as i64 + length as i64;
        match check(captured, reported, offset, length) {
            Ok(_) => assert!(end as usize <= captured),
            Err(BoundsError::Captured { .. }) => {
                assert!(end as usize > captured && end as usize <= reported);
            }
            Err(BoundsError::Reported { .. }) => assert!(end as usize > reported),
        }
    }
}
