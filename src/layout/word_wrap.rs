//! # Greedy Word Wrap
//!
//! The word-wrapped strategy: greedy line filling with minimal-span
//! incremental rebuilds.
//!
//! A *word* runs from one break boundary to the next. A boundary sits before
//! a character when the previous character is a separator (space, hyphen,
//! underscore) and the character is not — so repeated separators extend the
//! word they trail — and always on either side of `'\n'`, which is a hard
//! break and attaches to the start of the line it opens.
//!
//! An edit rebuilds the smallest span that can change: walk back from the
//! edit point to the start of the word occupying it (crossing a line
//! boundary when the word was force-broken mid-word), take the containing
//! line from its start, regenerate lines greedily from the scratch buffer,
//! splice them in, then let `pull_into` pack following lines forward until a
//! line absorbs nothing. Lines outside that span keep their identity.
//!
//! Wrap decisions are float-exact: a wrap triggers strictly when the
//! remaining width is less than the next width, so a glyph that exactly
//! fills the remaining space does not wrap.

use log::{debug, trace};

use super::{LayoutEngine, Position, WrapMode};
use crate::line::{CharacterCell, Line, LinePool};

/// Width decreases larger than this trigger a re-wrap in
/// [`LayoutEngine::set_wrap_width`].
const WRAP_SHRINK_SLACK: f64 = 2.0;
/// Width increases larger than this trigger a re-wrap. Asymmetric so a
/// scrollbar flickering in and out does not thrash the layout.
const WRAP_GROW_SLACK: f64 = 4.0;

/// Word-break separators. A boundary follows a run of these.
pub(crate) fn is_separator(ch: char) -> bool {
    matches!(ch, ' ' | '-' | '_')
}

/// Is there a word boundary immediately before `cells[i]`?
///
/// Valid for `1 ..= cells.len()`; `i == cells.len()` asks whether a cell
/// appended at the end would start a new word.
fn boundary_before(cells: &[CharacterCell], i: usize) -> bool {
    let prev = cells[i - 1].ch;
    if prev == '\n' {
        return true;
    }
    if i == cells.len() {
        return is_separator(prev);
    }
    let cur = cells[i].ch;
    cur == '\n' || (is_separator(prev) && !is_separator(cur))
}

/// End (exclusive) of the word starting at `start`.
fn next_word_end(cells: &[CharacterCell], start: usize) -> usize {
    let mut i = start + 1;
    while i < cells.len() && !boundary_before(cells, i) {
        i += 1;
    }
    i
}

/// Start of the word occupying position `col` (clamped to the cell count).
fn word_start(cells: &[CharacterCell], col: usize) -> usize {
    let mut c = col.min(cells.len());
    while c > 0 && !boundary_before(cells, c) {
        c -= 1;
    }
    c
}

/// Greedy fill: drain `buf` into lines no wider than `max_width`.
///
/// Per word: a newline-leading word forces a new line (also at the document
/// start, where the break opens a leading blank line); a word that no longer
/// fits but could fit a fresh line forces a new line; a word wider than
/// `max_width` fills character by character, breaking mid-word when the next
/// character does not fit — the only way a line exceeds `max_width` is a
/// single character wider than it.
///
/// Always yields at least one line; sizes are up to date on return.
pub(crate) fn generate_lines(
    pool: &mut LinePool,
    buf: &mut Vec<CharacterCell>,
    max_width: f64,
    at_document_start: bool,
) -> Vec<Line> {
    let cells: &[CharacterCell] = buf;
    let mut out = vec![pool.acquire()];
    let mut remaining = max_width;
    let mut i = 0;
    while i < cells.len() {
        let end = next_word_end(cells, i);
        let word_width: f64 = cells[i..end].iter().map(|c| c.width).sum();
        let current_empty = out.last().expect("never empty").is_empty();
        let force = if cells[i].ch == '\n' {
            !current_empty || (at_document_start && i == 0)
        } else {
            remaining < word_width && word_width <= max_width
        };
        if force {
            out.push(pool.acquire());
            remaining = max_width;
        }
        if word_width <= remaining {
            out.last_mut().expect("never empty").append(cells[i..end].iter().cloned());
            remaining -= word_width;
        } else {
            for cell in &cells[i..end] {
                let line = out.last_mut().expect("never empty");
                if remaining < cell.width && !line.is_empty() {
                    out.push(pool.acquire());
                    remaining = max_width;
                }
                remaining -= cell.width;
                out.last_mut().expect("never empty").append([cell.clone()]);
            }
        }
        i = end;
    }
    buf.clear();
    for line in &mut out {
        line.update_size();
    }
    out
}

impl LayoutEngine {
    /// Change the wrap width, re-wrapping the whole document — unless the
    /// new width is within the hysteresis band around the current one, in
    /// which case the call is a no-op. The band keeps minor oscillations of
    /// available width (a scrollbar appearing and disappearing) from
    /// re-wrapping on every frame.
    pub fn set_wrap_width(&mut self, width: f64) {
        let WrapMode::WordWrapped { max_width } = &mut self.mode else {
            return;
        };
        let delta = width - *max_width;
        if (-WRAP_SHRINK_SLACK..=WRAP_GROW_SLACK).contains(&delta) {
            trace!("wrap width {width} within hysteresis of {max_width}; keeping layout");
            return;
        }
        *max_width = width;
        self.layout_revision += 1;
        let mut buf = std::mem::take(&mut self.scratch);
        buf.clear();
        for mut line in self.lines.drain(..) {
            buf.extend(line.take_cells());
            self.pool.release(line);
        }
        self.lines = generate_lines(&mut self.pool, &mut buf, width, true);
        self.scratch = buf;
        debug!("re-wrapped at width {width}: {} lines", self.lines.len());
    }

    pub(crate) fn insert_word_wrapped(
        &mut self,
        cells: Vec<CharacterCell>,
        pos: Position,
        max_width: f64,
    ) {
        let rebuild_li = self.rebuild_start_line(pos);
        let mut buf = std::mem::take(&mut self.scratch);
        buf.clear();
        let removed: Vec<Line> = self
            .lines
            .splice(rebuild_li..=pos.line, std::iter::empty())
            .collect();
        let last = removed.len() - 1;
        let mut inserted = Some(cells);
        for (k, mut line) in removed.into_iter().enumerate() {
            let mut existing = line.take_cells();
            if k == last {
                let tail = existing.split_off(pos.column);
                buf.extend(existing);
                buf.extend(inserted.take().expect("consumed once"));
                buf.extend(tail);
            } else {
                buf.extend(existing);
            }
            self.pool.release(line);
        }
        let generated = generate_lines(&mut self.pool, &mut buf, max_width, rebuild_li == 0);
        let count = generated.len();
        self.lines.splice(rebuild_li..rebuild_li, generated);
        self.scratch = buf;
        self.pack_forward(rebuild_li + count - 1, max_width);
        trace!("insert rebuilt lines {rebuild_li}..{}", rebuild_li + count);
    }

    /// Re-wrap the lines touched by a formatting change: from the start of
    /// the word containing `start` through `last_line`, then pack forward.
    pub(crate) fn rewrap_span(&mut self, start: Position, last_line: usize, max_width: f64) {
        let rebuild_li = self.rebuild_start_line(start);
        let mut buf = std::mem::take(&mut self.scratch);
        buf.clear();
        let removed: Vec<Line> = self
            .lines
            .splice(rebuild_li..=last_line, std::iter::empty())
            .collect();
        for mut line in removed {
            buf.extend(line.take_cells());
            self.pool.release(line);
        }
        let generated = generate_lines(&mut self.pool, &mut buf, max_width, rebuild_li == 0);
        let count = generated.len();
        self.lines.splice(rebuild_li..rebuild_li, generated);
        self.scratch = buf;
        self.pack_forward(rebuild_li + count - 1, max_width);
    }

    /// Remove characters directly, merge the boundary lines, and re-absorb
    /// now-fitting text from subsequent lines. A line emptied by the
    /// removal is released outright. The merged line is regenerated only
    /// when the removal left it overflowing or carrying an interior newline
    /// (e.g. the removal spanned up to a newline-led line); a removal
    /// starting at column 0 may have severed the line's leading break, so
    /// the heal span reaches one line back in that case.
    pub(crate) fn remove_word_wrapped(&mut self, start: Position, end: Position, max_width: f64) {
        if start.line == end.line {
            let line = &mut self.lines[start.line];
            line.remove_range(start.column, end.column - start.column);
            line.update_size();
        } else {
            let tail = {
                let line = &mut self.lines[end.line];
                line.remove_range(end.column, line.len() - end.column)
            };
            let dropped: Vec<Line> = self
                .lines
                .splice(start.line + 1..=end.line, std::iter::empty())
                .collect();
            for line in dropped {
                self.pool.release(line);
            }
            let line = &mut self.lines[start.line];
            let keep = line.len() - start.column;
            line.remove_range(start.column, keep);
            line.append(tail);
            line.update_size();
        }

        let heal_from = if start.column == 0 {
            start.line.saturating_sub(1)
        } else {
            start.line
        };

        if self.lines[start.line].is_empty() && self.lines.len() > 1 {
            let line = self.lines.remove(start.line);
            self.pool.release(line);
            self.pack_forward(heal_from, max_width);
            return;
        }

        let needs_rewrap = {
            let line = &self.lines[start.line];
            line.width() > max_width || line.cells().iter().skip(1).any(|c| c.ch == '\n')
        };
        if needs_rewrap {
            let mut buf = std::mem::take(&mut self.scratch);
            buf.clear();
            let removed: Vec<Line> = self
                .lines
                .splice(heal_from..=start.line, std::iter::empty())
                .collect();
            for mut line in removed {
                buf.extend(line.take_cells());
                self.pool.release(line);
            }
            let generated = generate_lines(&mut self.pool, &mut buf, max_width, heal_from == 0);
            let count = generated.len();
            self.lines.splice(heal_from..heal_from, generated);
            self.scratch = buf;
            self.pack_forward(heal_from + count - 1, max_width);
        } else {
            self.pack_forward(heal_from, max_width);
        }
    }

    /// Index of the line the rebuild span starts at: the line containing
    /// the start of the word occupying `pos`. Steps back across a line
    /// boundary when the previous line ends mid-word (a forced break).
    fn rebuild_start_line(&self, pos: Position) -> usize {
        let mut li = pos.line;
        let mut col = pos.column;
        loop {
            let start = word_start(self.lines[li].cells(), col);
            if start == 0 && li > 0 {
                let prev = self.lines[li - 1].cells();
                if let Some(last) = prev.last() {
                    if !is_separator(last.ch) && last.ch != '\n' {
                        li -= 1;
                        col = prev.len();
                        continue;
                    }
                }
            }
            return li;
        }
    }

    /// Cascade the forward-packing pass from `idx`: pull whole words into
    /// each line while they fit, moving to the next line after every line
    /// that absorbed something, stopping at the first that absorbs nothing.
    ///
    /// The cascade has no fixed cap: in the worst case (every following line
    /// can absorb one more word) it walks to the end of the document, which
    /// is exactly the set of lines whose layout actually changed.
    fn pack_forward(&mut self, mut idx: usize, max_width: f64) {
        while idx < self.lines.len() {
            if !self.pull_into(idx, max_width) {
                break;
            }
            idx += 1;
        }
    }

    /// Pull whole words from the following line(s) into `lines[idx]` while
    /// space permits and no line break is crossed. Returns whether anything
    /// moved. Fully drained lines go back to the pool.
    fn pull_into(&mut self, idx: usize, max_width: f64) -> bool {
        if self.lines[idx]
            .cells()
            .last()
            .is_some_and(|c| c.ch == '\n')
        {
            return false;
        }
        let mut used: f64 = self.lines[idx].cells().iter().map(|c| c.width).sum();
        let mut pulled = false;
        while idx + 1 < self.lines.len() {
            let (word_len, word_width) = {
                let next = self.lines[idx + 1].cells();
                match next.first() {
                    None => break, // nothing to pull
                    Some(c) if c.ch == '\n' => break,
                    Some(_) => {
                        let end = next_word_end(next, 0);
                        let w: f64 = next[..end].iter().map(|c| c.width).sum();
                        (end, w)
                    }
                }
            };
            if max_width - used < word_width {
                break;
            }
            let cells = self.lines[idx + 1].remove_range(0, word_len);
            self.lines[idx].append(cells);
            used += word_width;
            pulled = true;
            if self.lines[idx + 1].is_empty() {
                let line = self.lines.remove(idx + 1);
                self.pool.release(line);
            }
        }
        if pulled {
            self.lines[idx].update_size();
            if let Some(next) = self.lines.get_mut(idx + 1) {
                next.update_size();
            }
        }
        pulled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FontStyle, Glyph, GlyphStore};
    use crate::format::{FormatDescriptor, StyleHandle, TextRun, Variant};
    use std::collections::HashMap;
    use std::sync::Arc;

    /// 10-unit glyphs, 5-unit space, as in the wrap examples.
    fn wrap_store() -> Arc<GlyphStore> {
        let mut store = GlyphStore::new();
        let font = store.register_font("mono", 16.0, 1.0).unwrap();
        let mut glyphs = HashMap::new();
        for ch in 'a'..='z' {
            glyphs.insert(
                ch,
                Glyph {
                    advance: 10.0,
                    bearing: 0.0,
                    atlas: None,
                },
            );
        }
        for ch in ['-', '_', '□'] {
            glyphs.insert(
                ch,
                Glyph {
                    advance: 10.0,
                    bearing: 0.0,
                    atlas: None,
                },
            );
        }
        glyphs.insert(
            ' ',
            Glyph {
                advance: 5.0,
                bearing: 0.0,
                atlas: None,
            },
        );
        store
            .add_style(
                font,
                Variant::REGULAR,
                FontStyle::new(glyphs, HashMap::new(), 18.0, 14.0),
            )
            .unwrap();
        Arc::new(store)
    }

    fn fmt() -> FormatDescriptor {
        FormatDescriptor::new(StyleHandle::new(0, Variant::REGULAR))
    }

    fn run(text: &str) -> Vec<TextRun> {
        vec![TextRun::new(text, fmt())]
    }

    fn engine(max_width: f64, text: &str) -> LayoutEngine {
        LayoutEngine::with_runs(
            wrap_store(),
            WrapMode::WordWrapped { max_width },
            &run(text),
        )
    }

    fn line_texts(engine: &LayoutEngine) -> Vec<String> {
        engine.lines().iter().map(Line::text).collect()
    }

    fn cells(text: &str) -> Vec<CharacterCell> {
        text.chars()
            .map(|ch| CharacterCell {
                ch,
                format: fmt(),
                glyph: Glyph::EMPTY,
                width: if ch == ' ' { 5.0 } else if ch == '\n' { 0.0 } else { 10.0 },
                height: 18.0,
                offset: 0.0,
            })
            .collect()
    }

    #[test]
    fn separators_extend_the_preceding_word() {
        let buf = cells("a--b c");
        assert_eq!(next_word_end(&buf, 0), 3); // "a--"
        assert_eq!(next_word_end(&buf, 3), 5); // "b "
        assert_eq!(next_word_end(&buf, 5), 6); // "c"
        assert_eq!(word_start(&buf, 4), 3);
        assert_eq!(word_start(&buf, 2), 0);
    }

    #[test]
    fn newline_is_its_own_word() {
        let buf = cells("a\nb");
        assert_eq!(next_word_end(&buf, 0), 1);
        assert_eq!(next_word_end(&buf, 1), 2);
        assert_eq!(word_start(&buf, 2), 2);
    }

    #[test]
    fn greedy_example_at_65() {
        let engine = engine(65.0, "hello world");
        assert_eq!(line_texts(&engine), vec!["hello ", "world"]);
        assert_eq!(engine.lines()[0].width(), 55.0);
        assert_eq!(engine.lines()[1].width(), 50.0);
    }

    #[test]
    fn rewrap_at_45_fills_per_character() {
        // Both words are wider than the wrap width, so they fill character
        // by character, breaking exactly where the next glyph stops fitting;
        // the middle line fills to 45 exactly and does not wrap early.
        let mut engine = engine(65.0, "hello world");
        engine.set_wrap_width(45.0);
        assert_eq!(line_texts(&engine), vec!["hell", "o wor", "ld"]);
        assert_eq!(engine.lines()[1].width(), 45.0);
    }

    #[test]
    fn exact_fit_does_not_wrap() {
        // "abc def" = 30 + 5 + 30 = 65 exactly.
        let engine = engine(65.0, "abc def");
        assert_eq!(line_texts(&engine), vec!["abc def"]);
    }

    #[test]
    fn oversized_single_character_forces_overlong_line() {
        let engine = engine(8.0, "ab");
        assert_eq!(line_texts(&engine), vec!["a", "b"]);
        assert!(engine.lines()[0].width() > 8.0);
    }

    #[test]
    fn newline_words_open_their_lines() {
        let engine = engine(100.0, "ab\ncd");
        assert_eq!(line_texts(&engine), vec!["ab", "\ncd"]);
    }

    #[test]
    fn leading_newline_opens_a_blank_first_line() {
        let engine = engine(100.0, "\nab");
        assert_eq!(line_texts(&engine), vec!["", "\nab"]);
    }

    #[test]
    fn blank_line_between_paragraphs() {
        let engine = engine(100.0, "a\n\nb");
        assert_eq!(line_texts(&engine), vec!["a", "\n", "\nb"]);
    }

    #[test]
    fn wrap_width_invariant_holds() {
        let engine = engine(
            63.0,
            "the quick-brown fox_jumps over the lazy dog and runs on",
        );
        for line in engine.lines() {
            assert!(
                line.width() <= 63.0,
                "line `{}` is {} wide",
                line.text(),
                line.width()
            );
        }
    }

    #[test]
    fn insert_rebuilds_minimal_span() {
        let mut engine = engine(200.0, "aa bb\ncc dd\nee ff");
        assert_eq!(line_texts(&engine), vec!["aa bb", "\ncc dd", "\nee ff"]);
        let ids: Vec<u64> = engine.lines().iter().map(Line::id).collect();
        engine.insert(&run("x"), Position::new(1, 2));
        assert_eq!(line_texts(&engine), vec!["aa bb", "\ncxc dd", "\nee ff"]);
        assert_eq!(engine.lines()[0].id(), ids[0]);
        assert_ne!(engine.lines()[1].id(), ids[1]);
        assert_eq!(engine.lines()[2].id(), ids[2]);
    }

    #[test]
    fn insert_grows_word_across_wrap() {
        // "aaaa " is 45 wide, so "bbbb" (40) wraps at width 65.
        let mut engine = engine(65.0, "aaaa bbbb");
        assert_eq!(line_texts(&engine), vec!["aaaa ", "bbbb"]);
        // Inserting into the second word must rebuild from its line start,
        // not split the word.
        engine.insert(&run("b"), Position::new(1, 2));
        assert_eq!(line_texts(&engine), vec!["aaaa ", "bbbbb"]);
    }

    #[test]
    fn forward_pack_reabsorbs_after_removal() {
        let mut engine = engine(45.0, "aaaa bb cc");
        assert_eq!(line_texts(&engine), vec!["aaaa ", "bb cc"]);
        // Removing the first word frees room; packing pulls the rest up.
        engine.remove_range(Position::new(0, 0), Position::new(0, 5));
        assert_eq!(line_texts(&engine), vec!["bb cc"]);
    }

    #[test]
    fn forward_pack_stops_at_line_breaks() {
        let mut engine = engine(45.0, "aaaa\nbb");
        assert_eq!(line_texts(&engine), vec!["aaaa", "\nbb"]);
        engine.remove_range(Position::new(0, 0), Position::new(0, 2));
        // "bb" stays on its own line: the break may not be crossed.
        assert_eq!(line_texts(&engine), vec!["aa", "\nbb"]);
    }

    #[test]
    fn removing_an_entire_line_releases_it() {
        let mut engine = engine(100.0, "aa\nbb\ncc");
        assert_eq!(line_texts(&engine), vec!["aa", "\nbb", "\ncc"]);
        engine.remove_range(Position::new(1, 0), Position::new(1, 3));
        assert_eq!(line_texts(&engine), vec!["aa", "\ncc"]);
        assert_eq!(engine.text(), "aa\ncc");
    }

    #[test]
    fn removing_a_leading_break_rejoins_the_previous_line() {
        let mut engine = engine(100.0, "aa\nbb");
        assert_eq!(line_texts(&engine), vec!["aa", "\nbb"]);
        engine.remove_range(Position::new(1, 0), Position::new(1, 1));
        assert_eq!(line_texts(&engine), vec!["aabb"]);
    }

    #[test]
    fn shrinking_a_wrapped_word_repacks_into_the_previous_line() {
        let mut engine = engine(65.0, "aaaa bbbb");
        assert_eq!(line_texts(&engine), vec!["aaaa ", "bbbb"]);
        engine.remove_range(Position::new(1, 0), Position::new(1, 2));
        assert_eq!(line_texts(&engine), vec!["aaaa bb"]);
    }

    #[test]
    fn removal_spanning_a_break_rejoins_and_rewraps() {
        let mut engine = engine(100.0, "aa bb\ncc dd");
        assert_eq!(line_texts(&engine), vec!["aa bb", "\ncc dd"]);
        engine.remove_range(Position::new(0, 4), Position::new(1, 2));
        assert_eq!(engine.text(), "aa bc dd");
        assert_eq!(line_texts(&engine), vec!["aa bc dd"]);
    }

    #[test]
    fn set_wrap_width_within_hysteresis_is_noop() {
        let mut engine = engine(65.0, "hello world");
        let revision = engine.layout_revision();
        let ids: Vec<u64> = engine.lines().iter().map(Line::id).collect();
        engine.set_wrap_width(65.0);
        engine.set_wrap_width(64.0);
        engine.set_wrap_width(68.0);
        assert_eq!(engine.layout_revision(), revision);
        let after: Vec<u64> = engine.lines().iter().map(Line::id).collect();
        assert_eq!(after, ids);
        engine.set_wrap_width(45.0);
        assert_ne!(engine.layout_revision(), revision);
    }

    #[test]
    fn set_formatting_triggers_rewrap() {
        let mut engine = engine(65.0, "hello world");
        assert_eq!(line_texts(&engine), vec!["hello ", "world"]);
        // Shrinking the first word makes everything fit on one line:
        // "hello " at quarter size is 13.75, plus "world" (50) ≤ 65.
        engine.set_formatting(
            Position::new(0, 0),
            Position::new(0, 6),
            fmt().with_size(0.25),
        );
        assert_eq!(line_texts(&engine), vec!["hello world"]);
    }

    #[test]
    fn rescale_scales_wrap_width_with_content() {
        let mut engine = engine(65.0, "hello world");
        let texts = line_texts(&engine);
        engine.rescale(2.0);
        assert_eq!(line_texts(&engine), texts);
        assert_eq!(engine.wrap_width(), Some(130.0));
        assert_eq!(engine.lines()[0].width(), 110.0);
    }
}
