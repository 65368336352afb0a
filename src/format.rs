//! ASCII pretty-printing helpers: turn raw bytes into a
//! display string the way a dissector's hex/ASCII pane does.
//!
//! The behavior lives behind a trait so a caller embedding this crate in a
//! GUI or a different text pane can swap in its own rendering without
//! forking the byte-walking logic; [`AsciiPrinter`] is the default,
//! always-available implementation.

use crate::bounds::BoundsError;
use crate::buffer::Tvb;
use crate::contiguity::resolve;

/// Renders a byte slice as displayable text. Implementors decide how
/// non-printable bytes are shown; [`format_text`] and [`format_stringzpad`]
/// are generic over this trait so callers can plug in their own pane.
pub trait TextFormatter {
    /// Render `bytes` as a single-line display string.
    fn render(&self, bytes: &[u8]) -> String;
}

/// The default formatter: printable ASCII (0x20..=0x7e) passes through
/// unchanged, everything else becomes `.`. Equivalent to
/// `tvb_format_text`'s historical default rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiPrinter;

impl TextFormatter for AsciiPrinter {
    fn render(&self, bytes: &[u8]) -> String {
        bytes
            .iter()
            .map(|&b| if (0x20..=0x7e).contains(&b) { b as char } else { '.' })
            .collect()
    }
}

/// Equivalent to `tvb_format_text`: render `length` bytes at `offset` with
/// `formatter`.
pub fn format_text<F: TextFormatter>(
    tvb: &Tvb,
    offset: i64,
    length: i64,
    formatter: &F,
) -> Result<String, BoundsError> {
    let span = resolve(tvb, offset, length)?;
    Ok(formatter.render(&span))
}

/// Equivalent to `tvb_format_stringzpad`: render the NUL-terminated string
/// at `offset` (not including the terminator) with `formatter`.
pub fn format_stringzpad<F: TextFormatter>(
    tvb: &Tvb,
    offset: i64,
    formatter: &F,
) -> Result<String, BoundsError> {
    let len = crate::strings::strsize(tvb, offset)? - 1;
    format_text(tvb, offset, len as i64, formatter)
}
