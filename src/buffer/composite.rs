//! Composite buffers: ordered concatenations of member buffers, logically
//! contiguous but physically split until flattened.
//!
//! Equivalent to `tvbuff_composite.c`. Construction is a two-phase builder
//! (`CompositeBuilder` → `finalize`) rather than the historical "zero-length
//! composite you mutate in place then seal": that shape lets this crate
//! validate nothing until `finalize`, when the final lengths and offset
//! tables can be computed and allocated in one step, instead of allocating
//! a header up front and hoping nothing fails before `finalize`.

use std::rc::Rc;

use super::{ContiguousRef, Shape, Tvb};

pub(crate) struct CompositeData {
    pub(crate) members: Vec<Tvb>,
    pub(crate) start_offsets: Vec<usize>,
    pub(crate) end_offsets_inclusive: Vec<usize>,
}

/// Builder for a Composite buffer. Collect members with [`append`]/[`prepend`],
/// then call [`finalize`] to seal it.
///
/// [`append`]: CompositeBuilder::append
/// [`prepend`]: CompositeBuilder::prepend
/// [`finalize`]: CompositeBuilder::finalize
#[derive(Default)]
pub struct CompositeBuilder {
    members: Vec<Tvb>,
}

/// Start a new composite. Equivalent to `tvb_composite_new` (an empty
/// composite with no length) — a free-function alias for
/// [`CompositeBuilder::new`] so the constructor surface reads the same way
/// as `new_real`/`new_subset` at the call site.
pub fn new_composite() -> CompositeBuilder {
    CompositeBuilder::new()
}

impl CompositeBuilder {
    /// Equivalent to `tvb_composite_new` (an empty composite with no length).
    pub fn new() -> Self {
        CompositeBuilder { members: Vec::new() }
    }

    /// Append `member` to the end of the composite-in-progress.
    /// Equivalent to `tvb_composite_append`.
    pub fn append(&mut self, member: Tvb) -> &mut Self {
        self.members.push(member);
        self
    }

    /// Prepend `member` to the front of the composite-in-progress.
    /// Equivalent to `tvb_composite_prepend`.
    pub fn prepend(&mut self, member: Tvb) -> &mut Self {
        self.members.insert(0, member);
        self
    }

    /// Seal the composite: compute `length` as the sum of member lengths,
    /// set `reported_length` equal to it (a Composite has no independent
    /// wire length — ), and materialize the offset tables.
    ///
    /// Equivalent to `tvb_composite_finalize`. After this call the composite
    /// is immutable; there is no further `append`/`prepend` entry point
    /// because `self` (the builder) was consumed.
    pub fn finalize(self) -> Tvb {
        let mut start_offsets = Vec::with_capacity(self.members.len());
        let mut end_offsets_inclusive = Vec::with_capacity(self.members.len());
        let mut running = 0usize;
        for member in &self.members {
            let start = running;
            running += member.length();
            start_offsets.push(start);
            // A zero-length member has no bytes, so there is no well-defined
            // inclusive end; use `start` so `member_containing` still treats
            // an exact-match offset as belonging to it without underflowing.
            end_offsets_inclusive.push(if member.length() == 0 { start } else { running - 1 });
        }
        let length = running;

        let data_source = self.members.first().map(|m| m.data_source());

        let shape = Shape::Composite(CompositeData {
            members: self.members.clone(),
            start_offsets,
            end_offsets_inclusive,
        });
        let composite = Tvb::new(shape, length, length, data_source, None);

        for member in &self.members {
            member.increment_usage(1);
            member.register_child(&composite);
        }
        composite
    }
}

/// Find which member index contains absolute offset `abs_offset`, along with
/// that member's start offset within the composite.
pub(crate) fn member_containing(data: &CompositeData, abs_offset: usize) -> Option<(usize, usize)> {
    // Linear scan: composites in dissection practice have a handful of
    // members (reassembled fragments, decompressed chunks); a binary search
    // over `end_offsets_inclusive` would be the move for a composite with
    // hundreds of members, which this crate does not expect to see.
    for (i, &end) in data.end_offsets_inclusive.iter().enumerate() {
        if abs_offset <= end {
            return Some((i, data.start_offsets[i]));
        }
    }
    None
}

/// Materialize the composite's bytes into a single owned, contiguous array
/// and cache it as the buffer's direct pointer. Equivalent to the
/// flatten-on-demand path in `tvb_get_ptr` for a Composite that straddles a
/// member boundary.
pub(crate) fn flatten(tvb: &Tvb, data: &CompositeData) -> ContiguousRef {
    if let Some(cached) = tvb.0.direct.borrow().as_ref() {
        return cached.clone();
    }
    let mut buf = Vec::with_capacity(tvb.length());
    for member in &data.members {
        let span = crate::contiguity::resolve_for_flatten(member);
        buf.extend_from_slice(&span);
    }
    let bytes: Rc<[u8]> = Rc::from(buf.into_boxed_slice());
    let direct = ContiguousRef {
        bytes,
        base_offset: 0,
    };
    *tvb.0.direct.borrow_mut() = Some(direct.clone());
    direct
}
