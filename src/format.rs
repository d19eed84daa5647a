//! # Format Descriptors
//!
//! The value types that describe how a span of text looks: which font and
//! style variant it uses, how large it is relative to the font's base size,
//! its color, and free-form flag bits.
//!
//! A `FormatDescriptor` is deliberately a small, flat, structurally-comparable
//! value. Two adjacent characters belong to the same format run exactly when
//! their descriptors compare equal, and descriptors cross serialization
//! boundaries unchanged.

use serde::{Deserialize, Serialize};

use crate::error::TypelineError;

/// An RGBA color, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// A style variant within a font: regular, or any combination of
/// bold / italic / underline.
///
/// Internally a three-bit mask, so a font holds at most
/// [`Variant::COUNT`] variants. Serializes as a hyphen-separated name,
/// e.g. `"regular"`, `"bold"`, `"bold-italic"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Variant(u8);

impl Variant {
    pub const REGULAR: Variant = Variant(0);
    pub const BOLD: Variant = Variant(0b001);
    pub const ITALIC: Variant = Variant(0b010);
    pub const UNDERLINE: Variant = Variant(0b100);

    /// Number of distinct variants a font can define.
    pub const COUNT: usize = 8;

    /// Combine two variants, e.g. `Variant::BOLD.with(Variant::ITALIC)`.
    pub fn with(self, other: Variant) -> Variant {
        Variant(self.0 | other.0)
    }

    pub fn contains(self, other: Variant) -> bool {
        self.0 & other.0 == other.0
    }

    /// Index of this variant in a font's variant table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<String> for Variant {
    type Error = TypelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let mut variant = Variant::REGULAR;
        for part in value.split('-') {
            variant = match part {
                "regular" | "" => variant,
                "bold" => variant.with(Variant::BOLD),
                "italic" => variant.with(Variant::ITALIC),
                "underline" => variant.with(Variant::UNDERLINE),
                _ => return Err(TypelineError::UnknownVariant(value.clone())),
            };
        }
        Ok(variant)
    }
}

impl From<Variant> for String {
    fn from(variant: Variant) -> String {
        if variant == Variant::REGULAR {
            return "regular".to_string();
        }
        let mut parts = Vec::new();
        if variant.contains(Variant::BOLD) {
            parts.push("bold");
        }
        if variant.contains(Variant::ITALIC) {
            parts.push("italic");
        }
        if variant.contains(Variant::UNDERLINE) {
            parts.push("underline");
        }
        parts.join("-")
    }
}

/// Identifies one style variant of one registered font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleHandle {
    /// Index of the font in the [`GlyphStore`](crate::font::GlyphStore).
    pub font: u16,
    /// Which style variant of that font.
    pub variant: Variant,
}

impl StyleHandle {
    pub fn new(font: u16, variant: Variant) -> Self {
        Self { font, variant }
    }
}

/// The complete formatting of one character.
///
/// Compared by value: a format run boundary exists exactly where two adjacent
/// characters' descriptors differ.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatDescriptor {
    /// Font + variant this character resolves against.
    pub style: StyleHandle,
    /// Size multiplier relative to the font's base point size.
    pub size: f64,
    /// Text color, passed through to the renderer untouched.
    pub color: Color,
    /// Free-form flag bits; the engine never interprets them.
    pub flags: u32,
}

impl FormatDescriptor {
    pub fn new(style: StyleHandle) -> Self {
        Self {
            style,
            size: 1.0,
            color: Color::BLACK,
            flags: 0,
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// One styled run of input text: the unit the mutation API consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub format: FormatDescriptor,
}

impl TextRun {
    pub fn new(text: impl Into<String>, format: FormatDescriptor) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }
}
