//! Bounds arithmetic — normalizes possibly-negative offsets and sentinel
//! lengths against a buffer's two lengths, and classifies an out-of-range
//! access as *captured-bounds* or *reported-bounds*.
//!
//! Every accessor in this crate funnels through [`check`] (or its
//! non-raising twin [`check_opt`]) before touching a byte. No accessor may
//! bypass this module — a one-offset-off-by-one error here is the exact
//! class of bug this crate exists to prevent.

use core::fmt;

/// The two error kinds a bounds check can produce.
///
/// *Captured*: the request reads past what was actually captured but still
/// within what the wire protocol claims exists — the capture was truncated.
/// *Reported*: the request reads past what the protocol itself claims exists
/// — the protocol or packet is malformed.
///
/// Both variants carry the raw inputs that triggered them so a caller can
/// format a diagnostic ("field at offset 12 wants 4 bytes, only 2 captured")
/// without re-deriving the numbers it already had.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsError {
    /// Read would pass the captured length but stays within the reported length.
    Captured {
        offset: i64,
        length: i64,
        available: usize,
    },
    /// Read would pass the reported length.
    Reported {
        offset: i64,
        length: i64,
        available: usize,
    },
}

impl fmt::Display for BoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundsError::Captured {
                offset,
                length,
                available,
            } => write!(
                f,
                "captured-bounds: offset {offset} length {length} exceeds {available} captured bytes"
            ),
            BoundsError::Reported {
                offset,
                length,
                available,
            } => write!(
                f,
                "reported-bounds: offset {offset} length {length} exceeds {available} reported bytes"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BoundsError {}

/// Normalize `(offset, length)` against a buffer's captured/reported lengths
/// and return the absolute, in-range `(offset, length)` pair — or the
/// classified error.
///
/// `length == -1` means "to the end of the captured data". `length < -1` is
/// always a captured-bounds error, independent of `offset`.
///
/// The offset alone is only ever rejected against `reported_len` (a position
/// past everything the protocol claims to have is unreachable no matter what
/// length follows it). An offset past `captured_len` but still within
/// `reported_len` is left to the read's *end* (`offset + length`) to
/// classify below — a zero-length or short read landing there can still be
/// in-bounds, and a longer one can still turn out to be reported-bounds
/// rather than captured-bounds.
pub fn check(
    captured_len: usize,
    reported_len: usize,
    offset: i64,
    length: i64,
) -> Result<(usize, usize), BoundsError> {
    let abs_offset = if offset >= 0 {
        let o = offset as u64;
        if o > reported_len as u64 {
            return Err(BoundsError::Reported {
                offset,
                length,
                available: reported_len,
            });
        }
        o as usize
    } else {
        let ao = offset.unsigned_abs();
        if ao > reported_len as u64 {
            return Err(BoundsError::Reported {
                offset,
                length,
                available: reported_len,
            });
        }
        if ao > captured_len as u64 {
            return Err(BoundsError::Captured {
                offset,
                length,
                available: captured_len,
            });
        }
        captured_len - ao as usize
    };

    if length < -1 {
        return Err(BoundsError::Captured {
            offset,
            length,
            available: captured_len,
        });
    }

    let abs_length = if length == -1 {
        captured_len.saturating_sub(abs_offset)
    } else {
        length as usize
    };

    let end = abs_offset.saturating_add(abs_length);
    if end <= captured_len {
        Ok((abs_offset, abs_length))
    } else if end <= reported_len {
        Err(BoundsError::Captured {
            offset,
            length,
            available: captured_len,
        })
    } else {
        Err(BoundsError::Reported {
            offset,
            length,
            available: reported_len,
        })
    }
}

/// Non-raising twin of [`check`]: returns `None` instead of a classified error.
pub fn check_opt(
    captured_len: usize,
    reported_len: usize,
    offset: i64,
    length: i64,
) -> Option<(usize, usize)> {
    check(captured_len, reported_len, offset, length).ok()
}

/// Resolve a possibly-negative offset to an absolute, in-`captured_len` offset.
///
/// Used on its own by length queries (`length_remaining`, `offset_exists`)
/// that only need the offset resolved, not a full `(offset, length)` check.
pub fn normalize_offset(
    captured_len: usize,
    reported_len: usize,
    offset: i64,
) -> Result<usize, BoundsError> {
    if offset >= 0 {
        let o = offset as u64;
        if o > reported_len as u64 {
            return Err(BoundsError::Reported {
                offset,
                length: 0,
                available: reported_len,
            });
        }
        if o > captured_len as u64 {
            return Err(BoundsError::Captured {
                offset,
                length: 0,
                available: captured_len,
            });
        }
        Ok(o as usize)
    } else {
        let ao = offset.unsigned_abs();
        if ao > reported_len as u64 {
            return Err(BoundsError::Reported {
                offset,
                length: 0,
                available: reported_len,
            });
        }
        if ao > captured_len as u64 {
            return Err(BoundsError::Captured {
                offset,
                length: 0,
                available: captured_len,
            });
        }
        Ok(captured_len - ao as usize)
    }
}

/// Bounds rule for `ensure_bytes_exist`: unlike [`check`], any negative
/// `length` (including `-1`) is treated as "more bytes than could possibly
/// exist" and is a reported-bounds error unconditionally. This mirrors a
/// deliberate inconsistency in the historical bounds API that later callers
/// rely on: `ensure_bytes_exist` never treats `-1` as "to end of buffer".
pub fn check_bytes_exist(
    captured_len: usize,
    reported_len: usize,
    offset: i64,
    length: i64,
) -> Result<(usize, usize), BoundsError> {
    if length < 0 {
        return Err(BoundsError::Reported {
            offset,
            length,
            available: reported_len,
        });
    }
    check(captured_len, reported_len, offset, length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_at_eof_is_in_bounds() {
        // zero-length subset at EOF.
        assert_eq!(check(10, 10, 10, 0), Ok((10, 0)));
    }

    #[test]
    fn truncation_classification() {
        // length 4, reported 16.
        assert_eq!(check(4, 16, 3, 1), Ok((3, 1)));
        assert_eq!(
            check(4, 16, 4, 1),
            Err(BoundsError::Captured {
                offset: 4,
                length: 1,
                available: 4
            })
        );
        assert_eq!(
            check(4, 16, 16, 1),
            Err(BoundsError::Reported {
                offset: 16,
                length: 1,
                available: 16
            })
        );
    }

    #[test]
    fn negative_offset_resolves_from_end() {
        assert_eq!(check(10, 10, -1, 1), Ok((9, 1)));
        assert_eq!(check(10, 10, -10, 1), Ok((0, 1)));
        assert!(check(10, 10, -11, 1).is_err());
    }

    #[test]
    fn length_to_end_sentinel() {
        assert_eq!(check(10, 10, 4, -1), Ok((4, 6)));
    }

    #[test]
    fn length_below_negative_one_is_captured_error() {
        assert_eq!(
            check(10, 10, 0, -2),
            Err(BoundsError::Captured {
                offset: 0,
                length: -2,
                available: 10
            })
        );
    }

    #[test]
    fn overflowing_length_saturates_instead_of_wrapping() {
        let err = check(10, 10, 2, i64::MAX - 1).unwrap_err();
        assert!(matches!(err, BoundsError::Reported { .. }));
    }

    #[test]
    fn ensure_bytes_exist_rejects_negative_length_unconditionally() {
        assert!(matches!(
            check_bytes_exist(10, 10, 0, -1),
            Err(BoundsError::Reported { .. })
        ));
        assert!(matches!(
            check_bytes_exist(10, 10, 0, -5),
            Err(BoundsError::Reported { .. })
        ));
        assert_eq!(check_bytes_exist(10, 10, 0, 0), Ok((0, 0)));
    }
}
