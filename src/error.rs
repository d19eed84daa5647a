//! Structured error types for the Typeline layout engine.
//!
//! Errors only arise at the registration boundary: parsing a font
//! description and registering fonts/styles. Layout itself is total —
//! out-of-range positions clamp and unknown characters resolve to the
//! placeholder glyph.

use thiserror::Error;

/// The unified error type returned by fallible Typeline API functions.
#[derive(Debug, Error)]
pub enum TypelineError {
    /// A JSON font description failed to parse.
    #[error("failed to parse font description: {0}")]
    FontParse(#[from] serde_json::Error),

    /// A font with this name is already registered.
    #[error("font `{0}` is already registered")]
    DuplicateFont(String),

    /// The style variant is already defined for this font.
    #[error("variant {variant:?} is already defined for font `{font}`")]
    DuplicateStyle {
        font: String,
        variant: crate::format::Variant,
    },

    /// A font handle does not reference a registered font.
    #[error("unknown font handle {0}")]
    UnknownFont(u16),

    /// A font description referenced an unknown variant name.
    #[error("unknown style variant `{0}` in font description")]
    UnknownVariant(String),
}
