//! The contiguity resolver: given `(buffer, offset, length)`,
//! return a contiguous slice — recursing through Subsets, and flattening a
//! Composite that straddles a member boundary.

use std::ops::Deref;
use std::rc::Rc;

use crate::bounds::{self, BoundsError};
use crate::buffer::composite;
use crate::buffer::{ContiguousRef, Shape, Tvb};

/// A resolved contiguous byte range: owns a cheap `Rc` clone of the
/// underlying storage so the slice it derefs to stays valid independent of
/// the `Tvb` that produced it.
pub struct Span {
    bytes: Rc<[u8]>,
    start: usize,
    len: usize,
}

impl Deref for Span {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.bytes[self.start..self.start + self.len]
    }
}

impl AsRef<[u8]> for Span {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

/// Resolve `(offset, length)` on `tvb` to a contiguous [`Span`].
///
/// Equivalent to `tvb_get_ptr`'s internal dispatch: uses the cached direct
/// pointer when one exists; otherwise recurses into a Subset's backing, or
/// — for a Composite whose requested range straddles a member boundary —
/// flattens the composite once and caches the result so every later access
/// is O(1).
pub fn resolve(tvb: &Tvb, offset: i64, length: i64) -> Result<Span, BoundsError> {
    let (abs_offset, abs_length) =
        bounds::check(tvb.length(), tvb.reported_length(), offset, length)?;
    Ok(resolve_abs(tvb, abs_offset, abs_length))
}

/// Fast variant for small reads (<= 8 bytes) where the caller already knows
/// `tvb` exposes a direct pointer. Still rejects negative offsets and
/// out-of-bounds ends — it only skips the variant dispatch, not bounds
/// checking.
///
/// Equivalent to `tvb_get_ptr`'s inlined fast path for fixed-width reads.
pub fn resolve_fast(tvb: &Tvb, offset: i64, length: usize) -> Result<Span, BoundsError> {
    debug_assert!(length <= 8, "resolve_fast is only for small fixed-width reads");
    let (abs_offset, abs_length) =
        bounds::check(tvb.length(), tvb.reported_length(), offset, length as i64)?;
    if let Some(direct) = tvb.0.direct.borrow().as_ref() {
        return Ok(Span {
            bytes: direct.bytes.clone(),
            start: direct.base_offset + abs_offset,
            len: abs_length,
        });
    }
    Ok(resolve_abs(tvb, abs_offset, abs_length))
}

/// Resolve an already-normalized, already-in-bounds `(abs_offset, abs_length)`
/// pair. Infallible: bounds were already checked by the caller.
fn resolve_abs(tvb: &Tvb, abs_offset: usize, abs_length: usize) -> Span {
    if let Some(direct) = tvb.0.direct.borrow().as_ref() {
        return Span {
            bytes: direct.bytes.clone(),
            start: direct.base_offset + abs_offset,
            len: abs_length,
        };
    }

    match &tvb.0.shape {
        Shape::Real(_) => unreachable!(
            "tvb: a Real buffer always has a direct pointer cache"
        ),
        Shape::Subset(s) => {
            resolve_abs(&s.backing, s.start + abs_offset, abs_length)
        }
        Shape::Composite(c) => {
            let (member_idx, member_start) = composite::member_containing(c, abs_offset)
                .expect("tvb: abs_offset within composite length must map to a member");
            let member = &c.members[member_idx];
            let offset_in_member = abs_offset - member_start;
            if offset_in_member + abs_length <= member.length() {
                resolve_abs(member, offset_in_member, abs_length)
            } else {
                let flattened = composite::flatten(tvb, c);
                Span {
                    bytes: flattened.bytes,
                    start: flattened.base_offset + abs_offset,
                    len: abs_length,
                }
            }
        }
    }
}

/// Resolve the entirety of `member`'s bytes, used internally by
/// [`composite::flatten`] to `memcpy` each member into the flattened array
/// in order. Not bounds-checked against a caller-supplied range because it
/// always requests exactly `[0, member.length())`.
pub(crate) fn resolve_for_flatten(member: &Tvb) -> Span {
    resolve_abs(member, 0, member.length())
}

/// Get a raw contiguous pointer to `tvb`'s full contents, flattening a
/// Composite if necessary. Equivalent to `tvb_get_ptr(tvb, 0, -1)`.
pub fn get_ptr(tvb: &Tvb, offset: i64, length: i64) -> Result<Span, BoundsError> {
    resolve(tvb, offset, length)
}
