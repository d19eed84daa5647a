//! # Typeline
//!
//! An incremental rich-text layout engine.
//!
//! Most text layout code is batch-oriented: hand it a string, get back lines,
//! and throw everything away on the next keystroke. Typeline keeps the laid-out
//! document live instead. Every edit — insert, remove, reformat, rescale —
//! rebuilds only the lines the edit can actually affect, so a one-character
//! insertion into a ten-thousand-line document touches one line (plus whatever
//! the forward-packing pass re-absorbs), not ten thousand.
//!
//! ## Architecture
//!
//! ```text
//! (text, FormatDescriptor) runs
//!       ↓
//!   [font]     — GlyphStore: fonts, style variants, glyph + kerning tables
//!       ↓
//!   [line]     — CharacterCell resolution, Line buffers, LinePool recycling
//!       ↓
//!   [layout]   — Unwrapped / LineBroken / WordWrapped strategies
//!       ↓
//! positioned glyph lines (read-only view for a renderer)
//! ```
//!
//! The engine never renders. It produces, per line, the resolved glyph,
//! computed size, and horizontal offset of every character cell — enough for
//! a renderer to emit one draw primitive per glyph with no further layout.
//!
//! ## Strategies
//!
//! - **Unwrapped**: everything lives on line 0; line breaks are discarded.
//! - **LineBroken**: lines split exactly at `'\n'`.
//! - **WordWrapped**: greedy word wrap against a wrap width, with
//!   minimal-span rebuilds and a forward-packing pass after edits.

pub mod error;
pub mod font;
pub mod format;
pub mod layout;
pub mod line;

pub use error::TypelineError;
pub use font::{AtlasRect, Font, FontId, FontStyle, Glyph, GlyphStore};
pub use format::{Color, FormatDescriptor, StyleHandle, TextRun, Variant};
pub use layout::{LayoutEngine, Position, WrapMode};
pub use line::{CharacterCell, Line};
