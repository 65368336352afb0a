//! The `Buffer` data model: three shapes — Real, Subset, Composite
//! — behind one reference-counted handle, plus construction, length queries,
//! and lifecycle.
//!
//! # Representation choice
//!
//! The historical source tracks `usage_count` / `used_in` by hand and frees
//! a buffer's storage exactly when the count drops to zero. This crate keeps
//! that *API* because dissectors are written
//! against it, but backs it with `Rc` so a caller that never calls `free` at
//! all still cannot leak-via-use-after-free or double-free: the Rust
//! allocator reclaims `TvbCore` the moment the last `Tvb` handle (own count
//! *or* `used_in` registration) drops. `increment_usage` / `decrement_usage`
//! / `free` / `free_chain` are thin wrappers around that.
//!
//! Direct-pointer caching is represented as a
//! `(Rc<[u8]>, base_offset)` pair rather than a raw pointer — it gives the
//! same O(1) skip-recursion benefit without the lifetime gymnastics a raw
//! cached pointer would need across an `Rc` graph.

pub mod composite;
pub mod real;
pub mod subset;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::bounds::{self, BoundsError};

/// A cached contiguous backing: the owning byte storage plus this buffer's
/// absolute byte offset within it. Lets single-field reads skip the
/// Subset/Composite recursion in [`crate::contiguity`].
#[derive(Clone)]
pub(crate) struct ContiguousRef {
    pub(crate) bytes: Rc<[u8]>,
    pub(crate) base_offset: usize,
}

pub(crate) enum Shape {
    Real(real::RealData),
    Subset(subset::SubsetData),
    Composite(composite::CompositeData),
}

pub(crate) struct TvbCore {
    pub(crate) shape: Shape,
    length: Cell<usize>,
    reported_length: Cell<usize>,
    initialized: Cell<bool>,
    /// `None` means this buffer *is* the data source (a Real buffer).
    data_source: Option<Tvb>,
    usage_count: Cell<usize>,
    used_in: RefCell<Vec<Tvb>>,
    pub(crate) direct: RefCell<Option<ContiguousRef>>,
}

/// A handle to a Buffer. Cheap to clone; clones share the same
/// underlying storage and lifecycle state.
#[derive(Clone)]
pub struct Tvb(pub(crate) Rc<TvbCore>);

impl PartialEq for Tvb {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Tvb {}

impl Tvb {
    pub(crate) fn new(
        shape: Shape,
        length: usize,
        reported_length: usize,
        data_source: Option<Tvb>,
        direct: Option<ContiguousRef>,
    ) -> Tvb {
        Tvb(Rc::new(TvbCore {
            shape,
            length: Cell::new(length),
            reported_length: Cell::new(reported_length),
            initialized: Cell::new(true),
            data_source,
            usage_count: Cell::new(1),
            used_in: RefCell::new(Vec::new()),
            direct: RefCell::new(direct),
        }))
    }

    fn assert_initialized(&self) {
        assert!(
            self.0.initialized.get(),
            "tvb: accessor called on an uninitialized buffer"
        );
    }

    /// Equivalent to `tvb_length`: bytes actually available.
    pub fn length(&self) -> usize {
        self.assert_initialized();
        self.0.length.get()
    }

    /// Equivalent to `tvb_reported_length`: bytes the wire protocol claims exist.
    pub fn reported_length(&self) -> usize {
        self.assert_initialized();
        self.0.reported_length.get()
    }

    pub(crate) fn set_length(&self, n: usize) {
        self.0.length.set(n);
    }

    /// The transitive root Real buffer this view ultimately derives from.
    pub fn data_source(&self) -> Tvb {
        match &self.0.data_source {
            Some(root) => root.clone(),
            None => self.clone(),
        }
    }

    /// Equivalent to `tvb_length_remaining`: normalized remaining length at
    /// `offset`, or `-1` (not an error) if `offset` is out of range.
    pub fn length_remaining(&self, offset: i64) -> i64 {
        self.assert_initialized();
        match bounds::normalize_offset(self.length(), self.reported_length(), offset) {
            Ok(abs_offset) => (self.length() - abs_offset) as i64,
            Err(_) => -1,
        }
    }

    /// Equivalent to `tvb_ensure_length_remaining`: like
    /// [`Tvb::length_remaining`] but raises when out of range or when zero
    /// bytes remain.
    pub fn ensure_length_remaining(&self, offset: i64) -> Result<usize, BoundsError> {
        self.assert_initialized();
        let abs_offset =
            bounds::normalize_offset(self.length(), self.reported_length(), offset)?;
        let remaining = self.length() - abs_offset;
        if remaining == 0 {
            return Err(if offset >= 0 && offset as usize >= self.reported_length() {
                BoundsError::Reported {
                    offset,
                    length: 0,
                    available: self.reported_length(),
                }
            } else {
                BoundsError::Captured {
                    offset,
                    length: 0,
                    available: self.length(),
                }
            });
        }
        Ok(remaining)
    }

    /// Equivalent to `tvb_bytes_exist`: boolean, never raises.
    pub fn bytes_exist(&self, offset: i64, length: i64) -> bool {
        self.assert_initialized();
        bounds::check(self.length(), self.reported_length(), offset, length).is_ok()
    }

    /// Equivalent to `tvb_ensure_bytes_exist`. Any negative `length`
    /// (including `-1`) is treated as "more bytes than could possibly
    /// exist" and raises reported-bounds unconditionally.
    pub fn ensure_bytes_exist(&self, offset: i64, length: i64) -> Result<(), BoundsError> {
        self.assert_initialized();
        bounds::check_bytes_exist(self.length(), self.reported_length(), offset, length)?;
        Ok(())
    }

    /// Equivalent to `tvb_offset_exists`: strictly `abs_offset < length`.
    pub fn offset_exists(&self, offset: i64) -> bool {
        self.assert_initialized();
        match bounds::normalize_offset(self.length(), self.reported_length(), offset) {
            Ok(abs) => abs < self.length(),
            Err(_) => false,
        }
    }

    /// Equivalent to `tvb_set_reported_length`. Reported length can only
    /// shrink monotonically; shrinking below the captured length also
    /// clamps it.
    ///
    /// A Composite's reported length is defined to equal its captured length
    /// at `finalize` time and has no independent wire-length
    /// semantics; the historical source's "only ever reduced" assertion is
    /// simply undefined for that case. Calling this on a Composite
    /// is therefore treated as a programmer-contract violation and panics,
    /// matching how this crate treats other variant-mismatched calls.
    pub fn set_reported_length(&self, new_reported: usize) -> Result<(), BoundsError> {
        self.assert_initialized();
        assert!(
            !matches!(self.0.shape, Shape::Composite(_)),
            "tvb: set_reported_length has no defined semantics on a Composite buffer"
        );
        if new_reported > self.reported_length() {
            return Err(BoundsError::Reported {
                offset: 0,
                length: new_reported as i64,
                available: self.reported_length(),
            });
        }
        self.0.reported_length.set(new_reported);
        if self.length() > new_reported {
            self.0.length.set(new_reported);
        }
        Ok(())
    }

    // ── Lifecycle  ──────────────────────────────────────────────

    /// Register `child` as depending on `self`: `self` will not be released
    /// until `child` is freed, even if all other references to `self` are
    /// gone. Called automatically by `new_subset` and composite `append`.
    pub(crate) fn register_child(&self, child: &Tvb) {
        self.0.used_in.borrow_mut().push(child.clone());
    }

    /// Equivalent to `tvb_increment_usage`.
    pub fn increment_usage(&self, n: usize) {
        self.0.usage_count.set(self.0.usage_count.get() + n);
    }

    /// Equivalent to `tvb_decrement_usage`: if `n >= usage_count`, free;
    /// otherwise subtract.
    pub fn decrement_usage(&self, n: usize) {
        if n >= self.0.usage_count.get() {
            self.free();
        } else {
            self.0.usage_count.set(self.0.usage_count.get() - n);
        }
    }

    /// Equivalent to `tvb_free`: decrement by one; at zero, dispatch on
    /// variant — a Subset decrements its backing's usage, a Composite
    /// decrements every member's — then release this buffer's own retained
    /// state (`used_in` registrations and, for a flattened Composite, its
    /// cached byte array). The underlying storage itself is reclaimed by
    /// `Rc`/`Drop` once every handle — including this one — goes out of
    /// scope.
    pub fn free(&self) {
        let count = self.0.usage_count.get();
        if count == 0 {
            return;
        }
        if count > 1 {
            self.0.usage_count.set(count - 1);
            return;
        }
        self.0.usage_count.set(0);
        match &self.0.shape {
            Shape::Real(_) => {}
            Shape::Subset(s) => s.backing.decrement_usage(1),
            Shape::Composite(c) => {
                for member in &c.members {
                    member.decrement_usage(1);
                }
            }
        }
        self.0.used_in.borrow_mut().clear();
        *self.0.direct.borrow_mut() = None;
    }

    /// Equivalent to `tvb_free_chain`: release `self` and, transitively,
    /// every buffer registered as "used in" it.
    ///
    /// The historical source walks the `used_in` list *after* recursing into
    /// it, which is only safe because the recursive call happens before the
    /// self-free. This implementation snapshots the list before recursing so
    /// that invariant isn't load-bearing here.
    pub fn free_chain(&self) {
        let children: Vec<Tvb> = self.0.used_in.borrow().clone();
        for child in &children {
            child.free_chain();
        }
        self.free();
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.0.initialized.get()
    }
}
