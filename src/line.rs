//! # Lines and Character Cells
//!
//! A [`CharacterCell`] is one resolved glyph instance: the character, its
//! format, the glyph it resolved to, and its computed size and horizontal
//! offset. A [`Line`] is an ordered sequence of cells with a cached
//! aggregate size.
//!
//! The aggregate size (and every cell offset) is valid only after
//! [`Line::update_size`]; the owning layout strategy calls it after any
//! mutation, before the size is read. Lines are recycled through
//! [`LinePool`] rather than dropped, so steady-state editing does not
//! allocate.

use crate::font::{Glyph, GlyphStore};
use crate::format::FormatDescriptor;

/// One laid-out character: glyph, format, computed size, and offset within
/// its line.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterCell {
    pub ch: char,
    pub format: FormatDescriptor,
    /// The resolved glyph, by value; carries the atlas region the renderer
    /// draws from.
    pub glyph: Glyph,
    /// Computed width: scaled advance, with the kerning adjustment against
    /// the preceding same-style character folded in at resolution time.
    pub width: f64,
    /// Computed height: the style's line height at the effective scale.
    pub height: f64,
    /// Horizontal offset from the line start. Maintained by
    /// [`Line::update_size`].
    pub offset: f64,
}

impl CharacterCell {
    /// Resolve one character against the store.
    ///
    /// `prev` is the character immediately before this one in layout order
    /// and its style, used for kerning; pairs only kern within the same
    /// style handle.
    pub fn resolve(
        store: &GlyphStore,
        ch: char,
        format: FormatDescriptor,
        external_scale: f64,
        prev: Option<(char, crate::format::StyleHandle)>,
    ) -> CharacterCell {
        let effective_scale =
            external_scale * format.size * store.normalization_scale(format.style);
        let glyph = store.resolve(format.style, ch);
        let mut advance = glyph.advance;
        if let Some((prev_ch, prev_style)) = prev {
            if prev_style == format.style {
                advance += store.kerning(format.style, prev_ch, ch);
            }
        }
        CharacterCell {
            ch,
            format,
            glyph,
            width: advance * effective_scale,
            height: store.line_height(format.style) * effective_scale,
            offset: 0.0,
        }
    }

    /// Fast-path rescale: multiplies the computed size without re-resolving
    /// the glyph. Valid because glyph identity does not change with scale.
    pub fn rescale(&mut self, factor: f64) {
        self.width *= factor;
        self.height *= factor;
        self.offset *= factor;
    }
}

/// An ordered sequence of character cells with a cached aggregate size.
#[derive(Debug)]
pub struct Line {
    id: u64,
    cells: Vec<CharacterCell>,
    width: f64,
    height: f64,
}

impl Line {
    fn new(id: u64) -> Self {
        Self {
            id,
            cells: Vec::new(),
            width: 0.0,
            height: 0.0,
        }
    }

    /// Identity of this line, assigned at pool acquisition. An edit that
    /// leaves a line's id in place did not rebuild that line.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cells(&self) -> &[CharacterCell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Aggregate width: sum of cell widths. Valid only after
    /// [`update_size`](Line::update_size).
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Aggregate height: max of cell heights. Valid only after
    /// [`update_size`](Line::update_size).
    pub fn height(&self) -> f64 {
        self.height
    }

    /// The line's characters in order.
    pub fn text(&self) -> String {
        self.cells.iter().map(|c| c.ch).collect()
    }

    pub fn insert(&mut self, index: usize, cells: impl IntoIterator<Item = CharacterCell>) {
        let index = index.min(self.cells.len());
        self.cells.splice(index..index, cells);
    }

    pub fn append(&mut self, cells: impl IntoIterator<Item = CharacterCell>) {
        self.cells.extend(cells);
    }

    /// Remove `count` cells starting at `start`, returning them in order.
    pub fn remove_range(&mut self, start: usize, count: usize) -> Vec<CharacterCell> {
        let start = start.min(self.cells.len());
        let end = (start + count).min(self.cells.len());
        self.cells.drain(start..end).collect()
    }

    pub(crate) fn cells_mut(&mut self) -> &mut Vec<CharacterCell> {
        &mut self.cells
    }

    pub(crate) fn take_cells(&mut self) -> Vec<CharacterCell> {
        self.width = 0.0;
        self.height = 0.0;
        std::mem::take(&mut self.cells)
    }

    /// Recompute cell offsets and the aggregate size. O(line length).
    pub fn update_size(&mut self) {
        let mut x = 0.0;
        let mut height: f64 = 0.0;
        for cell in &mut self.cells {
            cell.offset = x;
            x += cell.width;
            height = height.max(cell.height);
        }
        self.width = x;
        self.height = height;
    }

    /// Multiply the cached aggregate size and every cell's cached size and
    /// offset by `factor`. No glyph re-resolution.
    pub fn rescale(&mut self, factor: f64) {
        for cell in &mut self.cells {
            cell.rescale(factor);
        }
        self.width *= factor;
        self.height *= factor;
    }
}

/// Recycles [`Line`]s removed from the document so later edits reuse their
/// allocations instead of hitting the heap.
#[derive(Debug, Default)]
pub struct LinePool {
    free: Vec<Line>,
    next_id: u64,
}

impl LinePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take an empty line from the pool (or allocate one). The line gets a
    /// fresh id: reuse is an allocation detail, not an identity.
    pub fn acquire(&mut self) -> Line {
        let id = self.next_id;
        self.next_id += 1;
        match self.free.pop() {
            Some(mut line) => {
                line.id = id;
                line.width = 0.0;
                line.height = 0.0;
                line
            }
            None => Line::new(id),
        }
    }

    /// Return a line to the pool. Cells are cleared; capacity is kept.
    pub fn release(&mut self, mut line: Line) {
        line.cells.clear();
        self.free.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{StyleHandle, Variant};

    fn cell(ch: char, width: f64, height: f64) -> CharacterCell {
        CharacterCell {
            ch,
            format: FormatDescriptor::new(StyleHandle::new(0, Variant::REGULAR)),
            glyph: Glyph::EMPTY,
            width,
            height,
            offset: 0.0,
        }
    }

    #[test]
    fn update_size_computes_offsets_and_aggregates() {
        let mut pool = LinePool::new();
        let mut line = pool.acquire();
        line.append([cell('a', 10.0, 18.0), cell('b', 12.0, 20.0), cell('c', 8.0, 18.0)]);
        line.update_size();
        assert_eq!(line.width(), 30.0);
        assert_eq!(line.height(), 20.0);
        let offsets: Vec<f64> = line.cells().iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0.0, 10.0, 22.0]);
    }

    #[test]
    fn rescale_is_linear() {
        let mut pool = LinePool::new();
        let mut once = pool.acquire();
        once.append([cell('a', 10.0, 18.0), cell('b', 12.0, 20.0)]);
        once.update_size();
        let mut twice = pool.acquire();
        twice.append(once.cells().to_vec());
        twice.update_size();

        once.rescale(6.0);
        twice.rescale(2.0);
        twice.rescale(3.0);

        assert!((once.width() - twice.width()).abs() < 1e-9);
        assert!((once.height() - twice.height()).abs() < 1e-9);
        for (a, b) in once.cells().iter().zip(twice.cells()) {
            assert!((a.offset - b.offset).abs() < 1e-9);
            assert!((a.width - b.width).abs() < 1e-9);
        }
    }

    #[test]
    fn remove_range_clamps_and_returns_cells() {
        let mut pool = LinePool::new();
        let mut line = pool.acquire();
        line.append([cell('a', 1.0, 1.0), cell('b', 1.0, 1.0), cell('c', 1.0, 1.0)]);
        let removed = line.remove_range(1, 10);
        assert_eq!(removed.len(), 2);
        assert_eq!(line.text(), "a");
    }

    #[test]
    fn pool_reuse_assigns_fresh_ids() {
        let mut pool = LinePool::new();
        let a = pool.acquire();
        let first_id = a.id();
        pool.release(a);
        let b = pool.acquire();
        assert_ne!(b.id(), first_id);
        assert!(b.is_empty());
    }
}
