//! # Layout Engine
//!
//! This is the heart of Typeline.
//!
//! One engine type drives three interchangeable layout strategies,
//! dispatched by [`WrapMode`]:
//!
//! - **Unwrapped** — the document is a single line; line breaks in the
//!   input are discarded.
//! - **LineBroken** — lines split exactly at `'\n'` and nowhere else.
//! - **WordWrapped** — greedy word wrap against a wrap width (see
//!   [`word_wrap`] for the algorithm).
//!
//! All strategies share the same substrate: [`Line`]s of resolved
//! [`CharacterCell`]s, recycled through a [`LinePool`], and a scratch buffer
//! reused across edits. Every mutation is synchronous and rebuilds only the
//! lines it can affect; positions out of range clamp to the nearest valid
//! position instead of erroring.
//!
//! The document always holds at least one line, so `(0, 0)` is always a
//! valid position and an empty document is one empty line.

mod word_wrap;

use std::sync::Arc;

use log::debug;

use crate::font::GlyphStore;
use crate::format::{FormatDescriptor, StyleHandle, TextRun};
use crate::line::{CharacterCell, Line, LinePool};

/// A `(line, column)` address in the document.
///
/// `column` may equal the line's length (the position after its last cell).
/// Ordered lexicographically, line first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const ZERO: Position = Position { line: 0, column: 0 };

    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Which layout strategy the engine runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WrapMode {
    /// Everything on line 0; line breaks are discarded.
    Unwrapped,
    /// Lines split exactly at `'\n'`.
    LineBroken,
    /// Greedy word wrap against `max_width` (in scaled size units).
    WordWrapped { max_width: f64 },
}

/// The incremental layout engine: a live document of positioned lines.
///
/// Constructed with an injected [`GlyphStore`]; the store may be shared
/// read-only across any number of engines. All mutation goes through the
/// methods here — consumers read the result through [`lines`](Self::lines).
pub struct LayoutEngine {
    store: Arc<GlyphStore>,
    mode: WrapMode,
    lines: Vec<Line>,
    pool: LinePool,
    /// Working storage for rebuilds; cleared before each use, never part of
    /// the document.
    scratch: Vec<CharacterCell>,
    scale: f64,
    layout_revision: u64,
}

impl LayoutEngine {
    pub fn new(store: Arc<GlyphStore>, mode: WrapMode) -> Self {
        let mut pool = LinePool::new();
        let lines = vec![pool.acquire()];
        Self {
            store,
            mode,
            lines,
            pool,
            scratch: Vec::new(),
            scale: 1.0,
            layout_revision: 0,
        }
    }

    /// Construct and append `runs` in one step.
    pub fn with_runs(store: Arc<GlyphStore>, mode: WrapMode, runs: &[TextRun]) -> Self {
        let mut engine = Self::new(store, mode);
        engine.append(runs);
        engine
    }

    // ── Read-only view ─────────────────────────────────────────

    /// The laid-out lines, in document order. Never empty.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn mode(&self) -> WrapMode {
        self.mode
    }

    /// Current external scale factor.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// The wrap width, when the engine is word-wrapping.
    pub fn wrap_width(&self) -> Option<f64> {
        match self.mode {
            WrapMode::WordWrapped { max_width } => Some(max_width),
            _ => None,
        }
    }

    /// Bumped every time line layout is recomputed. Lets a renderer detect
    /// cheaply whether cached per-line draw data is stale.
    pub fn layout_revision(&self) -> u64 {
        self.layout_revision
    }

    /// All characters in reading order.
    pub fn text(&self) -> String {
        self.lines.iter().map(Line::text).collect()
    }

    pub fn char_count(&self) -> usize {
        self.lines.iter().map(Line::len).sum()
    }

    /// The document's format runs: maximal spans of adjacent cells sharing
    /// one descriptor, in reading order.
    pub fn runs(&self) -> Vec<(String, FormatDescriptor)> {
        let mut out: Vec<(String, FormatDescriptor)> = Vec::new();
        for cell in self.lines.iter().flat_map(|l| l.cells()) {
            match out.last_mut() {
                Some((text, format)) if *format == cell.format => text.push(cell.ch),
                _ => out.push((cell.ch.to_string(), cell.format)),
            }
        }
        out
    }

    pub fn run_count(&self) -> usize {
        self.runs().len()
    }

    // ── Mutation API ───────────────────────────────────────────

    /// Append runs at the end of the document.
    pub fn append(&mut self, runs: &[TextRun]) {
        self.insert(runs, self.end_position());
    }

    /// Insert runs at `position` (clamped).
    pub fn insert(&mut self, runs: &[TextRun], position: Position) {
        let pos = self.clamp(position);
        let cells = self.resolve_runs(runs, self.prev_info_before(pos));
        if cells.is_empty() {
            return;
        }
        self.layout_revision += 1;
        let last = cells.last().map(|c| (c.ch, c.format.style));
        self.reresolve_boundary_cell(pos, last);
        match self.mode {
            WrapMode::Unwrapped => self.insert_unwrapped(cells, pos),
            WrapMode::LineBroken => self.insert_line_broken(cells, pos),
            WrapMode::WordWrapped { max_width } => {
                self.insert_word_wrapped(cells, pos, max_width)
            }
        }
    }

    /// Re-resolve every cell in `[start, end)` with `format`.
    ///
    /// Glyphs are re-looked-up (a format change can change glyph identity
    /// and size); affected line sizes are recomputed, and the word-wrapped
    /// strategy re-wraps the affected range, since a size change can change
    /// which characters fit on a line.
    pub fn set_formatting(&mut self, start: Position, end: Position, format: FormatDescriptor) {
        let (start, end) = self.clamp_range(start, end);
        if start == end {
            return;
        }
        self.layout_revision += 1;
        self.reresolve_range(start, end, Some(format));
        match self.mode {
            WrapMode::Unwrapped | WrapMode::LineBroken => {
                for li in start.line..=end.line {
                    self.lines[li].update_size();
                }
            }
            WrapMode::WordWrapped { max_width } => {
                self.rewrap_span(start, end.line, max_width);
            }
        }
    }

    /// Remove every cell in `[start, end)` (clamped).
    pub fn remove_range(&mut self, start: Position, end: Position) {
        let (start, end) = self.clamp_range(start, end);
        if start == end {
            return;
        }
        self.layout_revision += 1;
        let prev = self.prev_info_before(start);
        self.reresolve_boundary_cell(end, prev);
        match self.mode {
            WrapMode::Unwrapped => {
                let line = &mut self.lines[0];
                line.remove_range(start.column, end.column - start.column);
                line.update_size();
            }
            WrapMode::LineBroken => self.remove_line_broken(start, end),
            WrapMode::WordWrapped { max_width } => {
                self.remove_word_wrapped(start, end, max_width)
            }
        }
    }

    /// Change the external scale factor.
    ///
    /// Fast path: multiplies every cached cell size and offset by the scale
    /// ratio without re-resolving any glyph — glyph identity does not change
    /// with scale, only computed size does. The wrap width is expressed in
    /// scaled size units and scales with the content, so relative fit is
    /// unchanged and no re-wrap runs.
    pub fn rescale(&mut self, scale: f64) {
        if scale == self.scale || scale <= 0.0 {
            return;
        }
        let factor = scale / self.scale;
        for line in &mut self.lines {
            line.rescale(factor);
        }
        if let WrapMode::WordWrapped { max_width } = &mut self.mode {
            *max_width *= factor;
        }
        self.scale = scale;
    }

    /// Switch layout strategy, re-laying-out existing content.
    ///
    /// Switching to Unwrapped concatenates every line's retained characters
    /// into line 0 (control characters below space are dropped, tab
    /// excepted) and releases the other lines to the pool.
    pub fn set_mode(&mut self, mode: WrapMode) {
        if mode == self.mode {
            return;
        }
        self.layout_revision += 1;
        let mut buf = std::mem::take(&mut self.scratch);
        buf.clear();
        for mut line in self.lines.drain(..) {
            buf.extend(line.take_cells());
            self.pool.release(line);
        }
        self.mode = mode;
        buf.retain(|cell| self.retains_char(cell.ch));
        let new_lines = match mode {
            WrapMode::Unwrapped => {
                let mut line = self.pool.acquire();
                line.append(buf.drain(..));
                line.update_size();
                vec![line]
            }
            WrapMode::LineBroken => split_at_newlines(&mut self.pool, &mut buf),
            WrapMode::WordWrapped { max_width } => {
                word_wrap::generate_lines(&mut self.pool, &mut buf, max_width, true)
            }
        };
        self.lines = new_lines;
        self.scratch = buf;
        debug!(
            "switched to {:?}: {} lines",
            self.mode,
            self.lines.len()
        );
    }

    // ── Shared plumbing ────────────────────────────────────────

    /// Clamp a position to the nearest valid address.
    pub fn clamp(&self, position: Position) -> Position {
        let line = position.line.min(self.lines.len() - 1);
        let column = position.column.min(self.lines[line].len());
        Position { line, column }
    }

    fn clamp_range(&self, start: Position, end: Position) -> (Position, Position) {
        let a = self.clamp(start);
        let b = self.clamp(end);
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    fn end_position(&self) -> Position {
        let line = self.lines.len() - 1;
        Position {
            line,
            column: self.lines[line].len(),
        }
    }

    /// Whether an input character survives this engine's filtering.
    ///
    /// Characters below space are dropped, except tab (defined metrics) and,
    /// outside Unwrapped, the newline.
    fn retains_char(&self, ch: char) -> bool {
        if ch >= ' ' || ch == '\t' {
            return true;
        }
        ch == '\n' && !matches!(self.mode, WrapMode::Unwrapped)
    }

    /// Resolve input runs into cells, chaining kerning through the batch.
    ///
    /// New cells whose descriptor matches the cell before the edit point
    /// simply extend that run; two non-adjacent runs with equal format are
    /// never merged.
    fn resolve_runs(
        &self,
        runs: &[TextRun],
        mut prev: Option<(char, StyleHandle)>,
    ) -> Vec<CharacterCell> {
        let mut cells = Vec::new();
        for run in runs {
            for ch in run.text.chars() {
                if !self.retains_char(ch) {
                    continue;
                }
                let cell = CharacterCell::resolve(&self.store, ch, run.format, self.scale, prev);
                prev = Some((ch, run.format.style));
                cells.push(cell);
            }
        }
        cells
    }

    /// The cell immediately before `pos` in reading order, for kerning.
    fn prev_info_before(&self, pos: Position) -> Option<(char, StyleHandle)> {
        let cell = if pos.column > 0 {
            self.lines[pos.line].cells().get(pos.column - 1)
        } else if pos.line > 0 {
            self.lines[pos.line - 1].cells().last()
        } else {
            None
        };
        cell.map(|c| (c.ch, c.format.style))
    }

    /// Re-resolve cells in `[start, end)`, assigning `format` when given,
    /// plus the one cell after the range (its kerning context changed).
    fn reresolve_range(&mut self, start: Position, end: Position, format: Option<FormatDescriptor>) {
        let store = Arc::clone(&self.store);
        let scale = self.scale;
        let mut prev = self.prev_info_before(start);
        for li in start.line..=end.line {
            let col_start = if li == start.line { start.column } else { 0 };
            let col_end = if li == end.line {
                end.column
            } else {
                self.lines[li].len()
            };
            for ci in col_start..col_end {
                let line = &mut self.lines[li];
                let ch = line.cells()[ci].ch;
                let fmt = format.unwrap_or(line.cells()[ci].format);
                line.cells_mut()[ci] = CharacterCell::resolve(&store, ch, fmt, scale, prev);
                prev = Some((ch, fmt.style));
            }
        }
        // The cell after the range kerns against a new predecessor.
        self.reresolve_boundary_cell(end, prev);
    }

    /// Re-resolve the first cell at or after `pos` in reading order. Called
    /// around every insert/remove edit: whatever the edit did, that cell's
    /// kerning predecessor changed.
    fn reresolve_boundary_cell(&mut self, pos: Position, prev: Option<(char, StyleHandle)>) {
        let store = Arc::clone(&self.store);
        let mut li = pos.line;
        let mut col = pos.column;
        while li < self.lines.len() {
            if col < self.lines[li].len() {
                let line = &mut self.lines[li];
                let ch = line.cells()[col].ch;
                let fmt = line.cells()[col].format;
                line.cells_mut()[col] = CharacterCell::resolve(&store, ch, fmt, self.scale, prev);
                line.update_size();
                return;
            }
            li += 1;
            col = 0;
        }
    }

    // ── Unwrapped ──────────────────────────────────────────────

    fn insert_unwrapped(&mut self, cells: Vec<CharacterCell>, pos: Position) {
        let line = &mut self.lines[0];
        line.insert(pos.column, cells);
        line.update_size();
    }

    // ── LineBroken ─────────────────────────────────────────────

    fn insert_line_broken(&mut self, cells: Vec<CharacterCell>, pos: Position) {
        let mut buf = std::mem::take(&mut self.scratch);
        buf.clear();
        let mut line = self.lines.remove(pos.line);
        let mut existing = line.take_cells();
        let tail = existing.split_off(pos.column);
        buf.extend(existing);
        buf.extend(cells);
        buf.extend(tail);
        self.pool.release(line);
        let new_lines = split_at_newlines(&mut self.pool, &mut buf);
        self.lines.splice(pos.line..pos.line, new_lines);
        self.scratch = buf;
    }

    fn remove_line_broken(&mut self, start: Position, end: Position) {
        let mut buf = std::mem::take(&mut self.scratch);
        buf.clear();
        let removed: Vec<Line> = self
            .lines
            .splice(start.line..=end.line, std::iter::empty())
            .collect();
        let last = removed.len() - 1;
        for (k, mut line) in removed.into_iter().enumerate() {
            let mut cells = line.take_cells();
            if k == 0 && k == last {
                let tail = cells.split_off(end.column);
                cells.truncate(start.column);
                buf.extend(cells);
                buf.extend(tail);
            } else if k == 0 {
                cells.truncate(start.column);
                buf.extend(cells);
            } else if k == last {
                buf.extend(cells.split_off(end.column));
            }
            self.pool.release(line);
        }
        let new_lines = split_at_newlines(&mut self.pool, &mut buf);
        self.lines.splice(start.line..start.line, new_lines);
        self.scratch = buf;
    }
}

/// Split a drained cell buffer into lines, one new line starting after each
/// `'\n'` cell — unless the buffer is exhausted. Always yields at least one
/// (possibly empty) line; sizes are up to date on return.
fn split_at_newlines(pool: &mut LinePool, buf: &mut Vec<CharacterCell>) -> Vec<Line> {
    let mut out = vec![pool.acquire()];
    let total = buf.len();
    for (i, cell) in buf.drain(..).enumerate() {
        let brk = cell.ch == '\n';
        out.last_mut().expect("never empty").append([cell]);
        if brk && i + 1 < total {
            out.push(pool.acquire());
        }
    }
    for line in &mut out {
        line.update_size();
    }
    out
}
