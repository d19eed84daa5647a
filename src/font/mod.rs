//! # Glyph Store
//!
//! The registry of fonts, style variants, glyph tables, and kerning tables.
//!
//! The store is populated once at startup — typically from a declarative
//! JSON description (see [`loader`]) — and is a pure lookup service
//! thereafter. It never fails at resolution time: characters missing from a
//! glyph table resolve to the placeholder glyph, and handles that reference
//! nothing resolve to a zero-metric fallback. A store behind an `Arc` may be
//! read by any number of documents once registration has completed.

pub mod loader;

use std::collections::HashMap;

use log::debug;

use crate::error::TypelineError;
use crate::format::{StyleHandle, Variant};

/// Substituted for characters a style's glyph table does not define.
pub const PLACEHOLDER_CHAR: char = '\u{25A1}'; // □

/// Tab advance, in multiples of the space glyph's advance.
const TAB_SPACES: f64 = 6.0;

/// Index of a registered font in its [`GlyphStore`].
pub type FontId = u16;

/// A region of the glyph atlas texture, in texels.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AtlasRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Resolved metrics for one character in one font style.
///
/// Glyphs are small `Copy` values; character cells store them by value, so a
/// renderer reads the atlas region straight off the cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    /// Horizontal advance in style units (unscaled).
    pub advance: f64,
    /// Left-side bearing in style units.
    pub bearing: f64,
    /// Where the glyph's pixels live, or `None` for invisible glyphs
    /// (whitespace, control characters).
    pub atlas: Option<AtlasRect>,
}

impl Glyph {
    /// The zero-metric glyph returned when resolution has nothing better:
    /// an unregistered handle, or a style missing its placeholder glyph.
    pub const EMPTY: Glyph = Glyph {
        advance: 0.0,
        bearing: 0.0,
        atlas: None,
    };
}

/// One style variant of a font: its glyph table, kerning table, and
/// vertical metrics. Immutable once registered.
#[derive(Debug, Clone)]
pub struct FontStyle {
    glyphs: HashMap<char, Glyph>,
    kerning: HashMap<(char, char), f64>,
    /// Height one line of this style contributes, in style units.
    pub line_height: f64,
    /// Baseline offset from the line top, in style units.
    pub baseline: f64,
}

impl FontStyle {
    pub fn new(
        glyphs: HashMap<char, Glyph>,
        kerning: HashMap<(char, char), f64>,
        line_height: f64,
        baseline: f64,
    ) -> Self {
        Self {
            glyphs,
            kerning,
            line_height,
            baseline,
        }
    }

    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    /// Kerning adjustment for an adjacent pair; 0.0 when unregistered.
    pub fn kerning(&self, left: char, right: char) -> f64 {
        self.kerning.get(&(left, right)).copied().unwrap_or(0.0)
    }
}

/// A named collection of style variants sharing a base point size.
#[derive(Debug, Clone)]
pub struct Font {
    pub name: String,
    /// Base point size the glyph tables were authored at.
    pub point_size: f64,
    /// Scale applied to every resolution against this font, normalizing
    /// authored sizes across fonts.
    pub normalization_scale: f64,
    styles: Vec<Option<FontStyle>>,
}

impl Font {
    fn new(name: String, point_size: f64, normalization_scale: f64) -> Self {
        Self {
            name,
            point_size,
            normalization_scale,
            styles: vec![None; Variant::COUNT],
        }
    }

    pub fn style(&self, variant: Variant) -> Option<&FontStyle> {
        self.styles[variant.index()].as_ref()
    }
}

/// Registry of fonts → style variants → glyphs + kerning.
///
/// Populated once, read thereafter. Resolution is total: it always returns a
/// glyph, falling back to the placeholder and then to [`Glyph::EMPTY`].
#[derive(Debug, Default)]
pub struct GlyphStore {
    fonts: Vec<Font>,
}

impl GlyphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new font. Fails without mutating the store if the name is
    /// already taken.
    pub fn register_font(
        &mut self,
        name: &str,
        point_size: f64,
        normalization_scale: f64,
    ) -> Result<FontId, TypelineError> {
        if self.fonts.iter().any(|f| f.name == name) {
            return Err(TypelineError::DuplicateFont(name.to_string()));
        }
        let id = self.fonts.len() as FontId;
        self.fonts
            .push(Font::new(name.to_string(), point_size, normalization_scale));
        debug!("registered font `{name}` as handle {id}");
        Ok(id)
    }

    /// Define one style variant of a registered font. Fails if the variant
    /// is already defined.
    pub fn add_style(
        &mut self,
        font: FontId,
        variant: Variant,
        style: FontStyle,
    ) -> Result<(), TypelineError> {
        let entry = self
            .fonts
            .get_mut(font as usize)
            .ok_or(TypelineError::UnknownFont(font))?;
        let slot = &mut entry.styles[variant.index()];
        if slot.is_some() {
            return Err(TypelineError::DuplicateStyle {
                font: entry.name.clone(),
                variant,
            });
        }
        *slot = Some(style);
        Ok(())
    }

    pub fn font(&self, id: FontId) -> Option<&Font> {
        self.fonts.get(id as usize)
    }

    pub fn style(&self, handle: StyleHandle) -> Option<&FontStyle> {
        self.font(handle.font)?.style(handle.variant)
    }

    /// Normalization scale of the handle's font; 1.0 for unknown handles.
    pub fn normalization_scale(&self, handle: StyleHandle) -> f64 {
        self.font(handle.font)
            .map(|f| f.normalization_scale)
            .unwrap_or(1.0)
    }

    /// Line height of the handle's style, in style units; 0.0 when the
    /// handle resolves to nothing.
    pub fn line_height(&self, handle: StyleHandle) -> f64 {
        self.style(handle).map(|s| s.line_height).unwrap_or(0.0)
    }

    /// Baseline offset of the handle's style, in style units; 0.0 when the
    /// handle resolves to nothing.
    pub fn baseline(&self, handle: StyleHandle) -> f64 {
        self.style(handle).map(|s| s.baseline).unwrap_or(0.0)
    }

    /// Resolve one character against a style.
    ///
    /// Special characters: `'\n'` takes the line's vertical metrics but has
    /// zero advance and no visual glyph; `'\t'` advances by six spaces with
    /// no visual glyph. Anything else missing from the glyph table resolves
    /// to [`PLACEHOLDER_CHAR`]'s glyph; a style missing the placeholder
    /// itself (an authoring defect) resolves to [`Glyph::EMPTY`].
    pub fn resolve(&self, handle: StyleHandle, ch: char) -> Glyph {
        let Some(style) = self.style(handle) else {
            debug!(
                "resolve against unregistered handle {:?}; using empty glyph",
                handle
            );
            return Glyph::EMPTY;
        };
        match ch {
            '\n' => Glyph {
                advance: 0.0,
                bearing: 0.0,
                atlas: None,
            },
            '\t' => {
                let space = style.glyph(' ').copied().unwrap_or(Glyph::EMPTY);
                Glyph {
                    advance: space.advance * TAB_SPACES,
                    bearing: 0.0,
                    atlas: None,
                }
            }
            _ => style
                .glyph(ch)
                .or_else(|| style.glyph(PLACEHOLDER_CHAR))
                .copied()
                .unwrap_or(Glyph::EMPTY),
        }
    }

    /// Kerning adjustment for an adjacent pair; 0.0 when the pair (or the
    /// handle) is unregistered.
    pub fn kerning(&self, handle: StyleHandle, left: char, right: char) -> f64 {
        self.style(handle)
            .map(|s| s.kerning(left, right))
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(advance: f64) -> Glyph {
        Glyph {
            advance,
            bearing: 0.0,
            atlas: Some(AtlasRect {
                x: 0,
                y: 0,
                width: 8,
                height: 12,
            }),
        }
    }

    fn store_with_basic_font() -> (GlyphStore, StyleHandle) {
        let mut store = GlyphStore::new();
        let font = store.register_font("test", 16.0, 1.0).unwrap();
        let mut glyphs = HashMap::new();
        glyphs.insert(' ', glyph(5.0));
        glyphs.insert('a', glyph(10.0));
        glyphs.insert(PLACEHOLDER_CHAR, glyph(7.0));
        let mut kerning = HashMap::new();
        kerning.insert(('A', 'V'), -1.5);
        store
            .add_style(
                font,
                Variant::REGULAR,
                FontStyle::new(glyphs, kerning, 18.0, 14.0),
            )
            .unwrap();
        (store, StyleHandle::new(font, Variant::REGULAR))
    }

    #[test]
    fn duplicate_font_name_fails_without_mutation() {
        let (mut store, _) = store_with_basic_font();
        let err = store.register_font("test", 20.0, 1.0);
        assert!(matches!(err, Err(TypelineError::DuplicateFont(_))));
        assert_eq!(store.fonts.len(), 1);
    }

    #[test]
    fn duplicate_variant_fails() {
        let (mut store, handle) = store_with_basic_font();
        let err = store.add_style(
            handle.font,
            Variant::REGULAR,
            FontStyle::new(HashMap::new(), HashMap::new(), 18.0, 14.0),
        );
        assert!(matches!(err, Err(TypelineError::DuplicateStyle { .. })));
    }

    #[test]
    fn unknown_char_resolves_to_placeholder() {
        let (store, handle) = store_with_basic_font();
        let g = store.resolve(handle, 'z');
        assert_eq!(g.advance, 7.0);
    }

    #[test]
    fn newline_has_zero_advance_and_no_atlas() {
        let (store, handle) = store_with_basic_font();
        let g = store.resolve(handle, '\n');
        assert_eq!(g.advance, 0.0);
        assert!(g.atlas.is_none());
    }

    #[test]
    fn tab_is_six_spaces_wide() {
        let (store, handle) = store_with_basic_font();
        let g = store.resolve(handle, '\t');
        assert_eq!(g.advance, 30.0);
        assert!(g.atlas.is_none());
    }

    #[test]
    fn kerning_defaults_to_zero() {
        let (store, handle) = store_with_basic_font();
        assert_eq!(store.kerning(handle, 'A', 'V'), -1.5);
        assert_eq!(store.kerning(handle, 'Q', 'Q'), 0.0);
    }

    #[test]
    fn unregistered_handle_resolves_empty() {
        let (store, _) = store_with_basic_font();
        let bogus = StyleHandle::new(42, Variant::BOLD);
        assert_eq!(store.resolve(bogus, 'a'), Glyph::EMPTY);
        assert_eq!(store.kerning(bogus, 'a', 'b'), 0.0);
    }
}
