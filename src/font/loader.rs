//! # Font Description Loader
//!
//! Deserializes the declarative JSON font format into registered fonts.
//!
//! One description covers one font: its name, base point size, normalization
//! scale, and per style variant a glyph table (character → metrics + atlas
//! region) and a kerning-pair table. The loader is the only place font data
//! enters the engine; everything downstream works on the in-memory
//! [`Font`](super::Font) / [`FontStyle`] / [`Glyph`] objects it produces.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::TypelineError;
use crate::font::{AtlasRect, FontId, FontStyle, Glyph, GlyphStore};
use crate::format::Variant;

/// A complete declarative font description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontDescription {
    pub name: String,
    pub point_size: f64,
    #[serde(default = "default_scale")]
    pub normalization_scale: f64,
    pub styles: Vec<StyleDescription>,
}

fn default_scale() -> f64 {
    1.0
}

/// One style variant's tables and vertical metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDescription {
    #[serde(default)]
    pub variant: Variant,
    pub line_height: f64,
    pub baseline: f64,
    pub glyphs: Vec<GlyphEntry>,
    #[serde(default)]
    pub kerning: Vec<KerningEntry>,
}

/// One glyph table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphEntry {
    #[serde(rename = "char")]
    pub ch: char,
    pub advance: f64,
    #[serde(default)]
    pub bearing: f64,
    #[serde(default)]
    pub atlas: Option<AtlasRect>,
}

/// One kerning table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KerningEntry {
    pub left: char,
    pub right: char,
    pub offset: f64,
}

impl GlyphStore {
    /// Register a font from its parsed description.
    pub fn register_description(
        &mut self,
        desc: &FontDescription,
    ) -> Result<FontId, TypelineError> {
        let id = self.register_font(&desc.name, desc.point_size, desc.normalization_scale)?;
        for style in &desc.styles {
            let glyphs: HashMap<char, Glyph> = style
                .glyphs
                .iter()
                .map(|g| {
                    (
                        g.ch,
                        Glyph {
                            advance: g.advance,
                            bearing: g.bearing,
                            atlas: g.atlas,
                        },
                    )
                })
                .collect();
            let kerning: HashMap<(char, char), f64> = style
                .kerning
                .iter()
                .map(|k| ((k.left, k.right), k.offset))
                .collect();
            self.add_style(
                id,
                style.variant,
                FontStyle::new(glyphs, kerning, style.line_height, style.baseline),
            )?;
        }
        Ok(id)
    }

    /// Parse a JSON font description and register it.
    pub fn register_from_json(&mut self, json: &str) -> Result<FontId, TypelineError> {
        let desc: FontDescription = serde_json::from_str(json)?;
        self.register_description(&desc)
    }
}
