//! Error types.

use thiserror::Error;

/// Errors that can occur while loading a font.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Error)]
pub enum ParseError {
    /// A read extended past the end of the font data.
    #[error("read past the end of the font data")]
    OutOfBounds,
    /// A table or subtable offset pointed outside the font data.
    #[error("invalid offset in table directory")]
    BadOffset,
    /// The container or a required table uses an unrecognized format.
    #[error("unknown table format")]
    UnknownTableFormat,
    /// A table required for shaping is missing.
    #[error("missing required table: {0}")]
    MissingRequiredTable(&'static str),
}

/// Errors that can occur while configuring variations. These are advisory:
/// the variation interfaces ignore unknown axes rather than failing.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Error)]
pub enum VariationError {
    /// The font has no axis with the requested tag.
    #[error("unknown variation axis")]
    UnknownAxis,
}
