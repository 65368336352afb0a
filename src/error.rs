//! Shared error plumbing: a single top-level [`TvbError`] that every public
//! fallible operation in this crate can be converted into, for callers that
//! want one `Result` type to propagate with `?` instead of matching each
//! module's own error.
//!
//! Individual modules keep their own narrow error type ([`crate::bounds::BoundsError`],
//! [`crate::decompress::DecompressError`]) as the primary return type — this
//! module is only the aggregation point, not a replacement for them.

use std::fmt;

use crate::bounds::BoundsError;
use crate::decompress::DecompressError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TvbError {
    Bounds(BoundsError),
    Decompress(DecompressError),
}

impl fmt::Display for TvbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TvbError::Bounds(e) => write!(f, "{e}"),
            TvbError::Decompress(e) => write!(f, "{e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TvbError {}

impl From<BoundsError> for TvbError {
    fn from(e: BoundsError) -> Self {
        TvbError::Bounds(e)
    }
}

impl From<DecompressError> for TvbError {
    fn from(e: DecompressError) -> Self {
        TvbError::Decompress(e)
    }
}

/// Convenience alias for code that wants to propagate any of this crate's
/// errors through a single `Result` type.
pub type Result<T> = std::result::Result<T, TvbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_error_converts_into_tvb_error() {
        let e: TvbError = BoundsError::Captured {
            offset: 0,
            length: 1,
            available: 0,
        }
        .into();
        assert!(matches!(e, TvbError::Bounds(_)));
    }
}
