//! Terminal grid.
//!
//! ## Design
//!
//! - Fixed-width rows (every row holds exactly `cols` cells)
//! - Cursor with deferred-wrap semantics at the right margin
//! - Scroll region (DECSTBM) honored by line feeds and scrolls
//! - Tab stops as a sorted column set (default every 8)
//! - Damage tracking for efficient rendering
//! - Optional scrollback ring fed by lines retired through the top
//!
//! The grid implements the screen-buffer half of the dispatch contract:
//! the interpreter translates parsed sequences into the methods below and
//! the renderer reads rows, cursor, and damage back out.

mod cell;
mod damage;
mod row;

pub use cell::{AttrFlags, Attributes, Cell, Color, Rgb};
pub use damage::Damage;
pub use row::{Row, MAX_COMBINING};

use std::collections::BTreeSet;

use crate::scrollback::ScrollbackRing;

/// Cursor state: position, deferred wrap, visibility, and the current pen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Row (0-indexed from the top of the visible grid).
    pub row: u16,
    /// Column (0-indexed).
    pub col: u16,
    /// Set when the last write landed on the rightmost column; the wrap
    /// is deferred until the next printable write.
    pub pending_wrap: bool,
    /// Cursor visibility (DECTCEM).
    pub visible: bool,
    /// Cursor blink.
    pub blink: bool,
    /// Current SGR attributes applied to printed cells.
    pub attrs: Attributes,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            row: 0,
            col: 0,
            pending_wrap: false,
            visible: true,
            blink: false,
            attrs: Attributes::DEFAULT,
        }
    }
}

/// Saved cursor state for DECSC/DECRC.
#[derive(Debug, Clone, Copy)]
pub struct SavedCursor {
    /// Saved row.
    pub row: u16,
    /// Saved column.
    pub col: u16,
    /// Saved SGR attributes.
    pub attrs: Attributes,
    /// Whether origin mode was active at save time.
    pub origin_mode: bool,
}

/// Scroll region bounds (inclusive, 0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRegion {
    /// Top row of the region.
    pub top: u16,
    /// Bottom row of the region.
    pub bottom: u16,
}

impl ScrollRegion {
    /// Region covering the whole visible grid.
    #[must_use]
    #[inline]
    pub fn full(rows: u16) -> Self {
        Self {
            top: 0,
            bottom: rows.saturating_sub(1),
        }
    }
}

/// Interval between default tab stops.
const TAB_INTERVAL: u16 = 8;

/// A terminal grid: the active cell matrix plus cursor, scroll region,
/// tab stops, damage, and an optionally attached scrollback ring.
#[derive(Debug)]
pub struct Grid {
    rows: Vec<Row>,
    visible_rows: u16,
    cols: u16,
    cursor: Cursor,
    saved: Option<SavedCursor>,
    scroll_region: ScrollRegion,
    tab_stops: BTreeSet<u16>,
    damage: Damage,
    scrollback: Option<ScrollbackRing>,
}

impl Grid {
    /// Create a grid without scrollback (used for the alternate screen).
    #[must_use]
    pub fn new(rows: u16, cols: u16) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Self {
            rows: (0..rows).map(|_| Row::new(cols)).collect(),
            visible_rows: rows,
            cols,
            cursor: Cursor::default(),
            saved: None,
            scroll_region: ScrollRegion::full(rows),
            tab_stops: default_tab_stops(cols),
            damage: Damage::new(),
            scrollback: None,
        }
    }

    /// Create a grid with an attached scrollback ring.
    #[must_use]
    pub fn with_scrollback(rows: u16, cols: u16, capacity: usize) -> Self {
        let mut grid = Self::new(rows, cols);
        grid.scrollback = Some(ScrollbackRing::new(capacity));
        grid
    }

    // ------------------------------------------------------------------
    // Dimensions and cell access
    // ------------------------------------------------------------------

    /// Number of visible rows.
    #[must_use]
    #[inline]
    pub fn rows(&self) -> u16 {
        self.visible_rows
    }

    /// Number of columns.
    #[must_use]
    #[inline]
    pub fn cols(&self) -> u16 {
        self.cols
    }

    /// Get a row.
    #[must_use]
    pub fn row(&self, row: u16) -> Option<&Row> {
        self.rows.get(usize::from(row))
    }

    /// Get a cell.
    #[must_use]
    pub fn cell(&self, row: u16, col: u16) -> Option<&Cell> {
        self.row(row).and_then(|r| r.cell(col))
    }

    /// The visible grid as text, rows joined by `\n` (untrimmed).
    #[must_use]
    pub fn visible_content(&self) -> String {
        let mut out = String::new();
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&row.text());
        }
        out
    }

    // ------------------------------------------------------------------
    // Cursor
    // ------------------------------------------------------------------

    /// Current cursor state.
    #[must_use]
    #[inline]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Cursor row.
    #[must_use]
    #[inline]
    pub fn cursor_row(&self) -> u16 {
        self.cursor.row
    }

    /// Cursor column.
    #[must_use]
    #[inline]
    pub fn cursor_col(&self) -> u16 {
        self.cursor.col
    }

    /// Mutable cursor access for the interpreter (visibility, blink).
    #[inline]
    pub(crate) fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    /// Current pen attributes.
    #[must_use]
    #[inline]
    pub fn attrs(&self) -> Attributes {
        self.cursor.attrs
    }

    /// Set the pen attributes applied to subsequent writes.
    #[inline]
    pub fn set_attrs(&mut self, attrs: Attributes) {
        self.cursor.attrs = attrs;
    }

    /// Attributes used for erased cells: the pen's background only.
    #[must_use]
    #[inline]
    fn erased_attrs(&self) -> Attributes {
        Attributes::erased(self.cursor.attrs.bg)
    }

    /// Move the cursor to an absolute position. With origin mode on, the
    /// row is relative to the scroll region and confined to it.
    pub fn move_to(&mut self, row: u16, col: u16, origin: bool) {
        self.cursor.pending_wrap = false;
        let (base, limit) = if origin {
            (self.scroll_region.top, self.scroll_region.bottom)
        } else {
            (0, self.visible_rows - 1)
        };
        self.cursor.row = base.saturating_add(row).min(limit);
        self.cursor.col = col.min(self.cols - 1);
    }

    /// Move to an absolute row, keeping the column (VPA).
    pub fn move_to_row(&mut self, row: u16, origin: bool) {
        let col = self.cursor.col;
        self.move_to(row, col, origin);
    }

    /// Move to an absolute column, keeping the row (CHA).
    pub fn move_to_col(&mut self, col: u16) {
        self.cursor.pending_wrap = false;
        self.cursor.col = col.min(self.cols - 1);
    }

    /// Move the cursor up, stopping at the scroll region's top when the
    /// cursor starts inside the region.
    pub fn cursor_up(&mut self, n: u16) {
        self.cursor.pending_wrap = false;
        let top = if self.cursor.row >= self.scroll_region.top {
            self.scroll_region.top
        } else {
            0
        };
        self.cursor.row = self.cursor.row.saturating_sub(n).max(top);
    }

    /// Move the cursor down, stopping at the scroll region's bottom when
    /// the cursor starts inside the region.
    pub fn cursor_down(&mut self, n: u16) {
        self.cursor.pending_wrap = false;
        let bottom = if self.cursor.row <= self.scroll_region.bottom {
            self.scroll_region.bottom
        } else {
            self.visible_rows - 1
        };
        self.cursor.row = self.cursor.row.saturating_add(n).min(bottom);
    }

    /// Move the cursor right, clamped to the last column.
    pub fn cursor_forward(&mut self, n: u16) {
        self.cursor.pending_wrap = false;
        self.cursor.col = self.cursor.col.saturating_add(n).min(self.cols - 1);
    }

    /// Move the cursor left, clamped to column 0.
    pub fn cursor_backward(&mut self, n: u16) {
        self.cursor.pending_wrap = false;
        self.cursor.col = self.cursor.col.saturating_sub(n);
    }

    /// Carriage return.
    pub fn carriage_return(&mut self) {
        self.cursor.pending_wrap = false;
        self.cursor.col = 0;
    }

    /// Line feed: move down one row; at the scroll region's bottom the
    /// region scrolls up instead.
    pub fn line_feed(&mut self) {
        self.cursor.pending_wrap = false;
        if self.cursor.row == self.scroll_region.bottom {
            self.scroll_region_up(1);
        } else if self.cursor.row + 1 < self.visible_rows {
            self.cursor.row += 1;
        }
    }

    /// Reverse index: move up one row; at the region's top the region
    /// scrolls down instead.
    pub fn reverse_line_feed(&mut self) {
        self.cursor.pending_wrap = false;
        if self.cursor.row == self.scroll_region.top {
            self.scroll_region_down(1);
        } else if self.cursor.row > 0 {
            self.cursor.row -= 1;
        }
    }

    /// Backspace: one column left.
    pub fn backspace(&mut self) {
        self.cursor.pending_wrap = false;
        self.cursor.col = self.cursor.col.saturating_sub(1);
    }

    /// Save cursor position, pen, and origin mode (DECSC).
    pub fn save_cursor(&mut self, origin_mode: bool) {
        self.saved = Some(SavedCursor {
            row: self.cursor.row,
            col: self.cursor.col,
            attrs: self.cursor.attrs,
            origin_mode,
        });
    }

    /// Restore the saved cursor (DECRC). Returns the origin mode captured
    /// at save time, or `None` when nothing was saved.
    pub fn restore_cursor(&mut self) -> Option<bool> {
        let saved = self.saved?;
        self.cursor.pending_wrap = false;
        self.cursor.row = saved.row.min(self.visible_rows - 1);
        self.cursor.col = saved.col.min(self.cols - 1);
        self.cursor.attrs = saved.attrs;
        Some(saved.origin_mode)
    }

    // ------------------------------------------------------------------
    // Tab stops
    // ------------------------------------------------------------------

    /// Move to the next tab stop (HT), clamped to the last column.
    pub fn tab(&mut self) {
        self.cursor.pending_wrap = false;
        let next = self
            .tab_stops
            .range(self.cursor.col + 1..)
            .next()
            .copied()
            .unwrap_or(self.cols - 1);
        self.cursor.col = next.min(self.cols - 1);
    }

    /// Move forward `n` tab stops (CHT).
    pub fn tab_n(&mut self, n: u16) {
        for _ in 0..n.max(1) {
            self.tab();
        }
    }

    /// Move back one tab stop (CBT step).
    pub fn back_tab(&mut self) {
        self.cursor.pending_wrap = false;
        let prev = self
            .tab_stops
            .range(..self.cursor.col)
            .next_back()
            .copied()
            .unwrap_or(0);
        self.cursor.col = prev;
    }

    /// Move back `n` tab stops (CBT).
    pub fn back_tab_n(&mut self, n: u16) {
        for _ in 0..n.max(1) {
            self.back_tab();
        }
    }

    /// Set a tab stop at the cursor column (HTS).
    pub fn set_tab_stop(&mut self) {
        self.tab_stops.insert(self.cursor.col);
    }

    /// Clear the tab stop at the cursor column (TBC 0).
    pub fn clear_tab_stop(&mut self) {
        self.tab_stops.remove(&self.cursor.col);
    }

    /// Clear every tab stop (TBC 3).
    pub fn clear_all_tab_stops(&mut self) {
        self.tab_stops.clear();
    }

    /// Restore the default stops (every 8 columns).
    pub fn reset_tab_stops(&mut self) {
        self.tab_stops = default_tab_stops(self.cols);
    }

    /// Check for a tab stop at `col`.
    #[must_use]
    pub fn is_tab_stop(&self, col: u16) -> bool {
        self.tab_stops.contains(&col)
    }

    // ------------------------------------------------------------------
    // Printing
    // ------------------------------------------------------------------

    /// Print a character with auto-wrap (DECAWM on). `width` is 1 or 2.
    /// In insert mode existing cells shift right.
    pub fn write_char_wrap(&mut self, c: char, width: u8, insert: bool) {
        if self.cursor.pending_wrap {
            let row = self.cursor.row;
            if let Some(r) = self.rows.get_mut(usize::from(row)) {
                r.set_wrapped(true);
            }
            self.damage.mark(row);
            self.cursor.col = 0;
            self.cursor.pending_wrap = false;
            self.line_feed();
        }
        if width == 2 && self.cursor.col + 1 >= self.cols {
            // A wide character never splits across the margin: blank the
            // remainder of the row and wrap first.
            let row = self.cursor.row;
            let attrs = self.erased_attrs();
            if let Some(r) = self.rows.get_mut(usize::from(row)) {
                r.erase_range(self.cursor.col, self.cols, attrs);
                r.set_wrapped(true);
            }
            self.damage.mark(row);
            self.cursor.col = 0;
            self.line_feed();
        }
        self.put_cell(c, width, insert);
        let new_col = self.cursor.col.saturating_add(u16::from(width));
        if new_col >= self.cols {
            self.cursor.col = self.cols - 1;
            self.cursor.pending_wrap = true;
        } else {
            self.cursor.col = new_col;
        }
    }

    /// Print a character without auto-wrap (DECAWM off): writes clamp to
    /// the right margin, and a wide character that cannot fit at the last
    /// column is replaced by a space.
    pub fn write_char(&mut self, c: char, width: u8, insert: bool) {
        self.cursor.pending_wrap = false;
        if width == 2 && self.cursor.col + 1 >= self.cols {
            self.cursor.col = self.cols - 1;
            self.put_cell(' ', 1, insert);
            return;
        }
        if self.cursor.col.saturating_add(u16::from(width)) > self.cols {
            self.cursor.col = self.cols - u16::from(width);
        }
        self.put_cell(c, width, insert);
        self.cursor.col = self
            .cursor
            .col
            .saturating_add(u16::from(width))
            .min(self.cols - 1);
    }

    /// Attach a combining mark to the most recently written cell.
    pub fn attach_combining(&mut self, mark: char) {
        let row = self.cursor.row;
        let col = if self.cursor.pending_wrap {
            self.cursor.col
        } else if self.cursor.col > 0 {
            self.cursor.col - 1
        } else {
            return;
        };
        if let Some(r) = self.rows.get_mut(usize::from(row)) {
            let target = if r.cell(col).is_some_and(Cell::is_spacer) && col > 0 {
                col - 1
            } else {
                col
            };
            r.push_combining(target, mark);
        }
        self.damage.mark(row);
    }

    /// Write the cell (and its spacer for wide characters) at the cursor,
    /// repairing any wide pair the write splits.
    fn put_cell(&mut self, c: char, width: u8, insert: bool) {
        let (row, col) = (self.cursor.row, self.cursor.col);
        let attrs = self.cursor.attrs;
        let erased = self.erased_attrs();
        let cols = self.cols;
        let Some(r) = self.rows.get_mut(usize::from(row)) else {
            return;
        };
        let span_end = col.saturating_add(u16::from(width)).min(cols);
        for target in col..span_end {
            repair_wide_pair(r, target, erased);
        }
        if insert {
            r.insert_cells(col, u16::from(width), erased);
        }
        r.set_cell(col, Cell::new(c, width, attrs));
        if width == 2 && col + 1 < cols {
            r.set_cell(col + 1, Cell::spacer(attrs));
        }
        self.damage.mark(row);
    }

    // ------------------------------------------------------------------
    // Scrolling
    // ------------------------------------------------------------------

    /// Scroll the region up by `n`: lines leave through the region's top
    /// (into scrollback when that top is row 0 and a ring is attached)
    /// and blank lines appear at the bottom.
    pub fn scroll_region_up(&mut self, n: usize) {
        let ScrollRegion { top, bottom } = self.scroll_region;
        let n = n.min(usize::from(bottom - top) + 1);
        let blank = self.blank_row();
        for _ in 0..n {
            let retired = self.rows.remove(usize::from(top));
            if top == 0 {
                if let Some(ring) = &mut self.scrollback {
                    ring.push(retired);
                }
            }
            self.rows.insert(usize::from(bottom), blank.clone());
        }
        self.cursor.pending_wrap = false;
        self.damage.mark_range(top, bottom);
    }

    /// Scroll the region down by `n`: lines leave through the bottom and
    /// blank lines appear at the top. Nothing enters scrollback.
    pub fn scroll_region_down(&mut self, n: usize) {
        let ScrollRegion { top, bottom } = self.scroll_region;
        let n = n.min(usize::from(bottom - top) + 1);
        let blank = self.blank_row();
        for _ in 0..n {
            self.rows.remove(usize::from(bottom));
            self.rows.insert(usize::from(top), blank.clone());
        }
        self.cursor.pending_wrap = false;
        self.damage.mark_range(top, bottom);
    }

    /// Insert `n` blank lines at the cursor row (IL); lines at the
    /// region's bottom fall off. No-op when the cursor is outside the
    /// scroll region.
    pub fn insert_lines(&mut self, n: usize) {
        let row = self.cursor.row;
        let ScrollRegion { top, bottom } = self.scroll_region;
        if row < top || row > bottom {
            return;
        }
        let n = n.min(usize::from(bottom - row) + 1);
        let blank = self.blank_row();
        for _ in 0..n {
            self.rows.remove(usize::from(bottom));
            self.rows.insert(usize::from(row), blank.clone());
        }
        self.cursor.pending_wrap = false;
        self.damage.mark_range(row, bottom);
    }

    /// Delete `n` lines at the cursor row (DL); blank lines fill in at
    /// the region's bottom. No-op outside the scroll region.
    pub fn delete_lines(&mut self, n: usize) {
        let row = self.cursor.row;
        let ScrollRegion { top, bottom } = self.scroll_region;
        if row < top || row > bottom {
            return;
        }
        let n = n.min(usize::from(bottom - row) + 1);
        let blank = self.blank_row();
        for _ in 0..n {
            self.rows.remove(usize::from(row));
            self.rows.insert(usize::from(bottom), blank.clone());
        }
        self.cursor.pending_wrap = false;
        self.damage.mark_range(row, bottom);
    }

    /// Insert `n` blank cells at the cursor (ICH).
    pub fn insert_chars(&mut self, n: u16) {
        let (row, col) = (self.cursor.row, self.cursor.col);
        let attrs = self.erased_attrs();
        if let Some(r) = self.rows.get_mut(usize::from(row)) {
            r.insert_cells(col, n.max(1), attrs);
        }
        self.damage.mark(row);
    }

    /// Delete `n` cells at the cursor (DCH).
    pub fn delete_chars(&mut self, n: u16) {
        let (row, col) = (self.cursor.row, self.cursor.col);
        let attrs = self.erased_attrs();
        if let Some(r) = self.rows.get_mut(usize::from(row)) {
            r.delete_cells(col, n.max(1), attrs);
        }
        self.damage.mark(row);
    }

    /// Erase `n` cells from the cursor without moving anything (ECH).
    pub fn erase_chars(&mut self, n: u16) {
        let from = self.cursor.col;
        let to = from.saturating_add(n.max(1));
        self.erase_span(self.cursor.row, from, to);
    }

    // ------------------------------------------------------------------
    // Erasing
    // ------------------------------------------------------------------

    /// Erase from the cursor to the end of the line (EL 0).
    pub fn erase_to_end_of_line(&mut self) {
        self.erase_span(self.cursor.row, self.cursor.col, self.cols);
    }

    /// Erase from the start of the line through the cursor (EL 1).
    pub fn erase_from_start_of_line(&mut self) {
        self.erase_span(self.cursor.row, 0, self.cursor.col + 1);
    }

    /// Erase the cursor's whole line (EL 2).
    pub fn erase_line(&mut self) {
        let attrs = self.erased_attrs();
        let row = self.cursor.row;
        if let Some(r) = self.rows.get_mut(usize::from(row)) {
            r.erase_all(attrs);
        }
        self.damage.mark(row);
    }

    /// Erase from the cursor to the end of the screen (ED 0).
    pub fn erase_below(&mut self) {
        self.erase_to_end_of_line();
        let attrs = self.erased_attrs();
        let from = self.cursor.row + 1;
        for r in self.rows.iter_mut().skip(usize::from(from)) {
            r.erase_all(attrs);
        }
        if from < self.visible_rows {
            self.damage.mark_range(from, self.visible_rows - 1);
        }
    }

    /// Erase from the start of the screen through the cursor (ED 1).
    pub fn erase_above(&mut self) {
        let attrs = self.erased_attrs();
        let until = self.cursor.row;
        for r in self.rows.iter_mut().take(usize::from(until)) {
            r.erase_all(attrs);
        }
        if until > 0 {
            self.damage.mark_range(0, until - 1);
        }
        self.erase_from_start_of_line();
    }

    /// Erase the whole visible screen (ED 2).
    pub fn erase_screen(&mut self) {
        let attrs = self.erased_attrs();
        for r in &mut self.rows {
            r.erase_all(attrs);
        }
        self.damage.mark_all();
    }

    /// Drop the scrollback contents (ED 3).
    pub fn clear_scrollback(&mut self) {
        if let Some(ring) = &mut self.scrollback {
            ring.clear();
        }
    }

    /// Fill the screen with `E` cells (DECALN), homing the cursor and
    /// resetting the scroll region.
    pub fn screen_alignment_fill(&mut self) {
        for r in &mut self.rows {
            r.erase_all(Attributes::DEFAULT);
            for col in 0..self.cols {
                r.set_cell(col, Cell::new('E', 1, Attributes::DEFAULT));
            }
        }
        self.scroll_region = ScrollRegion::full(self.visible_rows);
        self.cursor.row = 0;
        self.cursor.col = 0;
        self.cursor.pending_wrap = false;
        self.damage.mark_all();
    }

    /// Erase `[from, to)` on `row`, widening the span so a wide pair is
    /// never left half-erased.
    fn erase_span(&mut self, row: u16, from: u16, to: u16) {
        let attrs = self.erased_attrs();
        let cols = self.cols;
        let Some(r) = self.rows.get_mut(usize::from(row)) else {
            return;
        };
        let mut from = from.min(cols);
        let mut to = to.min(cols);
        if r.cell(from).is_some_and(Cell::is_spacer) && from > 0 {
            from -= 1;
        }
        if to < cols && r.cell(to).is_some_and(Cell::is_spacer) {
            to += 1;
        }
        r.erase_range(from, to, attrs);
        self.damage.mark(row);
    }

    // ------------------------------------------------------------------
    // Scroll region
    // ------------------------------------------------------------------

    /// Current scroll region.
    #[must_use]
    #[inline]
    pub fn scroll_region(&self) -> ScrollRegion {
        self.scroll_region
    }

    /// Set the scroll region (DECSTBM), 0-indexed inclusive bounds.
    /// Invalid bounds are ignored.
    pub fn set_scroll_region(&mut self, top: u16, bottom: u16) {
        if top < bottom && bottom < self.visible_rows {
            self.scroll_region = ScrollRegion { top, bottom };
        }
    }

    /// Reset the region to the full grid.
    pub fn reset_scroll_region(&mut self) {
        self.scroll_region = ScrollRegion::full(self.visible_rows);
    }

    // ------------------------------------------------------------------
    // Damage
    // ------------------------------------------------------------------

    /// The damage tracker.
    #[must_use]
    #[inline]
    pub fn damage(&self) -> &Damage {
        &self.damage
    }

    /// Mutable damage access.
    #[inline]
    pub fn damage_mut(&mut self) -> &mut Damage {
        &mut self.damage
    }

    /// Consume and clear the dirty-row set.
    pub fn take_dirty(&mut self) -> Vec<u16> {
        self.damage.take(self.visible_rows)
    }

    // ------------------------------------------------------------------
    // Scrollback
    // ------------------------------------------------------------------

    /// The attached scrollback ring, if any.
    #[must_use]
    pub fn scrollback(&self) -> Option<&ScrollbackRing> {
        self.scrollback.as_ref()
    }

    // ------------------------------------------------------------------
    // Resize and reset
    // ------------------------------------------------------------------

    /// Resize the grid. Columns are right-clipped or right-padded; on row
    /// growth lines are reclaimed from the scrollback tail before blank
    /// rows are appended, and on row shrink blank bottom rows are dropped
    /// before top rows retire into scrollback. Returns `false` (and does
    /// nothing) when the dimensions are unchanged.
    pub fn resize(&mut self, cols: u16, rows: u16) -> bool {
        let cols = cols.max(1);
        let rows = rows.max(1);
        if cols == self.cols && rows == self.visible_rows {
            return false;
        }

        if cols != self.cols {
            let old_cols = self.cols;
            for row in &mut self.rows {
                row.resize(cols);
            }
            if let Some(ring) = &mut self.scrollback {
                ring.resize_lines(cols);
            }
            self.tab_stops.retain(|&stop| stop < cols);
            let mut stop = old_cols.saturating_add(TAB_INTERVAL - old_cols % TAB_INTERVAL);
            if old_cols % TAB_INTERVAL == 0 {
                stop = old_cols;
            }
            while stop < cols {
                self.tab_stops.insert(stop);
                stop += TAB_INTERVAL;
            }
            self.cols = cols;
        }

        if rows > self.visible_rows {
            let mut need = rows - self.visible_rows;
            while need > 0 {
                let Some(row) = self.scrollback.as_mut().and_then(ScrollbackRing::pop_newest)
                else {
                    break;
                };
                self.rows.insert(0, row);
                self.cursor.row += 1;
                if let Some(saved) = &mut self.saved {
                    saved.row = saved.row.saturating_add(1);
                }
                need -= 1;
            }
            for _ in 0..need {
                self.rows.push(Row::new(cols));
            }
            self.visible_rows = rows;
        } else if rows < self.visible_rows {
            let mut excess = self.visible_rows - rows;
            while excess > 0
                && self.rows.len() > usize::from(self.cursor.row) + 1
                && self.rows.last().is_some_and(Row::is_blank)
            {
                self.rows.pop();
                excess -= 1;
            }
            for _ in 0..excess {
                let retired = self.rows.remove(0);
                if let Some(ring) = &mut self.scrollback {
                    ring.push(retired);
                }
                self.cursor.row = self.cursor.row.saturating_sub(1);
                if let Some(saved) = &mut self.saved {
                    saved.row = saved.row.saturating_sub(1);
                }
            }
            self.visible_rows = rows;
        }

        self.cursor.row = self.cursor.row.min(rows - 1);
        self.cursor.col = self.cursor.col.min(cols - 1);
        self.cursor.pending_wrap = false;
        if let Some(saved) = &mut self.saved {
            saved.row = saved.row.min(rows - 1);
            saved.col = saved.col.min(cols - 1);
        }
        self.scroll_region = ScrollRegion::full(rows);
        self.damage.mark_all();
        true
    }

    /// Erase the visible grid and home the cursor, keeping scrollback,
    /// pen, and tab stops (the façade's `clear`).
    pub fn clear_visible(&mut self) {
        self.erase_screen();
        self.cursor.row = 0;
        self.cursor.col = 0;
        self.cursor.pending_wrap = false;
    }

    /// Full per-grid reset: blank cells, home cursor, default pen, default
    /// tab stops, full scroll region, empty scrollback.
    pub fn reset(&mut self) {
        for r in &mut self.rows {
            *r = Row::new(self.cols);
        }
        self.cursor = Cursor::default();
        self.saved = None;
        self.scroll_region = ScrollRegion::full(self.visible_rows);
        self.tab_stops = default_tab_stops(self.cols);
        if let Some(ring) = &mut self.scrollback {
            ring.clear();
        }
        self.damage.mark_all();
    }

    /// A blank row carrying the current erase background.
    fn blank_row(&self) -> Row {
        Row::filled(self.cols, Cell::erased(self.erased_attrs()))
    }
}

/// Default tab stops: every 8 columns starting at 8.
fn default_tab_stops(cols: u16) -> BTreeSet<u16> {
    (0..cols).filter(|col| col % TAB_INTERVAL == 0).collect()
}

/// If the cell at `col` is half of a wide pair, blank both halves.
fn repair_wide_pair(row: &mut Row, col: u16, attrs: Attributes) {
    if row.cell(col).is_some_and(Cell::is_spacer) {
        if col > 0 {
            row.set_cell(col - 1, Cell::erased(attrs));
        }
        row.set_cell(col, Cell::erased(attrs));
    } else if row.cell(col).is_some_and(Cell::is_wide) {
        row.set_cell(col, Cell::erased(attrs));
        if row.cell(col + 1).is_some_and(Cell::is_spacer) {
            row.set_cell(col + 1, Cell::erased(attrs));
        }
    }
}
