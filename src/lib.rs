//! TVB — a layered, bounds-checked byte-buffer engine for packet dissection.
//!
//! A Rust port of the `epan/tvbuff.c` testy virtual buffer abstraction: three
//! Buffer shapes (Real, Subset, Composite) behind one handle type, a
//! contiguity resolver that recurses through them transparently, typed
//! accessors, string/scan operations, sub-buffer search, and a zlib/gzip
//! decompressor — all funneled through one bounds-arithmetic module so every
//! out-of-range access is classified as either *captured-bounds* (the
//! capture was truncated) or *reported-bounds* (the protocol data itself is
//! malformed) rather than a single undifferentiated error.

pub mod accessors;
pub mod bounds;
pub mod buffer;
pub mod contiguity;
pub mod decompress;
pub mod error;
pub mod format;
pub mod strings;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level convenience re-exports for the most common entry points.
// ─────────────────────────────────────────────────────────────────────────────

/// The buffer handle type. Equivalent to `tvbuff_t *`.
pub use buffer::Tvb;

/// Bounds-check error, shared by every accessor in this crate.
/// Equivalent to the captured-vs-reported distinction `tvb_*` raises via
/// `ReportedBoundsError` / `BoundsError` in the historical source.
pub use bounds::BoundsError;

/// Aggregated error type for callers that want a single `Result` to
/// propagate with `?` across modules.
pub use error::{Result, TvbError};

/// Construct a Real buffer owning `data`. Equivalent to `tvb_new_real_data`.
pub use buffer::real::new_real;

/// Construct a Subset buffer over a backing buffer's window.
/// Equivalent to `tvb_new_subset_length` / `tvb_new_subset_remaining`.
pub use buffer::subset::new_subset;

/// Builder for Composite buffers. Equivalent to `tvb_composite_new` +
/// `tvb_composite_append`/`tvb_composite_prepend` + `tvb_composite_finalize`.
pub use buffer::composite::CompositeBuilder;

/// Start building a Composite buffer. Equivalent to `tvb_composite_new`.
pub use buffer::composite::new_composite;

/// Resolve `(offset, length)` to a contiguous byte span.
/// Equivalent to `tvb_get_ptr`.
pub use contiguity::resolve as get_ptr;

/// Inflate zlib/raw-deflate data captured inside a buffer.
/// Equivalent to `tvb_uncompress` / `tvb_child_uncompress`.
pub use decompress::{uncompress, uncompress_child, Decompressed};

/// Inflate a gzip member (header parse + raw deflate), supplementing the
/// historical single-codec decompressor with a distinct gzip entry point.
pub use decompress::gunzip;
