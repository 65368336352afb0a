//! Real buffers: owned (or borrowed-then-owned) contiguous byte ranges.
//!
//! Equivalent to `tvbuff_real.c`. A Real buffer is always its own
//! `data_source` and always has a direct byte pointer
//! cache pointing at offset zero of its own storage.

use std::rc::Rc;

use super::{ContiguousRef, Shape, Tvb};
use crate::bounds::BoundsError;

pub(crate) struct RealData {
    pub(crate) bytes: Rc<[u8]>,
    release: std::cell::RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Drop for RealData {
    fn drop(&mut self) {
        if let Some(cb) = self.release.borrow_mut().take() {
            cb();
        }
    }
}

/// Create a new Real buffer owning `data`.
///
/// Equivalent to `tvb_new_real_data`. `reported_length` must be `>= -1`; a
/// value `< -1` raises `Reported` immediately, and — unlike the historical C
/// source, which allocates the header before validating this — no
/// allocation happens until validation succeeds.
pub fn new_real(data: Vec<u8>, reported_length: i64) -> Result<Tvb, BoundsError> {
    new_real_with_release(data, reported_length, None)
}

/// Like [`new_real`], but invokes `release` exactly once when the buffer's
/// storage is finally dropped (every handle *and* every `used_in`
/// registration released). Equivalent to a Real buffer constructed with a
/// non-null free-routine callback.
pub fn new_real_with_release(
    data: Vec<u8>,
    reported_length: i64,
    release: Option<Box<dyn FnOnce()>>,
) -> Result<Tvb, BoundsError> {
    if reported_length < -1 {
        return Err(BoundsError::Reported {
            offset: 0,
            length: reported_length,
            available: 0,
        });
    }
    let length = data.len();
    let reported = if reported_length == -1 {
        length
    } else {
        reported_length as usize
    };
    let bytes: Rc<[u8]> = Rc::from(data.into_boxed_slice());
    let direct = ContiguousRef {
        bytes: bytes.clone(),
        base_offset: 0,
    };
    let shape = Shape::Real(RealData {
        bytes,
        release: std::cell::RefCell::new(release),
    });
    Ok(Tvb::new(shape, length, reported, None, Some(direct)))
}

/// Create a new Real buffer that is a child of `parent`: `parent` is
/// registered as depending on the new buffer's teardown via `used_in`, so
/// freeing `parent` also releases this buffer.
///
/// Equivalent to `tvb_new_child_real_data`.
pub fn new_real_child(parent: &Tvb, data: Vec<u8>, reported_length: i64) -> Result<Tvb, BoundsError> {
    let child = new_real(data, reported_length)?;
    parent.register_child(&child);
    Ok(child)
}
