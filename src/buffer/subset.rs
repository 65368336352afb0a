//! Subset buffers: zero-copy windows into a backing buffer.
//!
//! Equivalent to `tvbuff_subset.c`.

use super::{ContiguousRef, Shape, Tvb};
use crate::bounds::{self, BoundsError};

pub(crate) struct SubsetData {
    pub(crate) backing: Tvb,
    pub(crate) start: usize,
}

/// Create a Subset over `backing[backing_offset .. backing_offset + backing_length]`.
///
/// `reported_length == -1` inherits `backing.reported_length() - backing_offset`;
/// otherwise the supplied value is used as-is (it may legally exceed the
/// captured length, representing wire-claimed data beyond the capture).
///
/// Equivalent to `tvb_new_subset_length` / `tvb_new_subset_remaining`.
/// Bounds are validated against `backing` before anything is allocated,
/// so a failed call leaves no partially-built buffer behind.
pub fn new_subset(
    backing: &Tvb,
    backing_offset: i64,
    backing_length: i64,
    reported_length: i64,
) -> Result<Tvb, BoundsError> {
    let (start, length) = bounds::check(
        backing.length(),
        backing.reported_length(),
        backing_offset,
        backing_length,
    )?;

    let reported = if reported_length == -1 {
        backing.reported_length().saturating_sub(start)
    } else if reported_length < -1 {
        return Err(BoundsError::Reported {
            offset: backing_offset,
            length: reported_length,
            available: backing.reported_length(),
        });
    } else {
        reported_length as usize
    };

    let direct = backing
        .0
        .direct
        .borrow()
        .as_ref()
        .map(|backing_ref| ContiguousRef {
            bytes: backing_ref.bytes.clone(),
            base_offset: backing_ref.base_offset + start,
        });

    let shape = Shape::Subset(SubsetData {
        backing: backing.clone(),
        start,
    });
    let subset = Tvb::new(shape, length, reported, Some(backing.data_source()), direct);

    backing.increment_usage(1);
    backing.register_child(&subset);
    Ok(subset)
}
