//! Selection engine.
//!
//! Translates pointer gestures (already mapped to cell coordinates by the
//! host adapter) into a normalized range over the active grid, and
//! materializes the selected cells as plain text. The engine holds no
//! grid reference; the grid is passed in wherever cell data is needed.
//!
//! Selection lifecycle: `None` → in progress (`begin_at`) → complete
//! (`finish`), with `select_word` / `select_all` producing completed
//! selections directly.

use std::cmp::Ordering;

use crate::grid::{Cell, Grid};

/// One end of a selection, in cell coordinates over the visible grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPoint {
    /// Column (0-indexed).
    pub col: u16,
    /// Row (0-indexed).
    pub row: u16,
}

impl SelectionPoint {
    /// Create a selection point.
    #[must_use]
    #[inline]
    pub const fn new(col: u16, row: u16) -> Self {
        Self { col, row }
    }
}

impl PartialOrd for SelectionPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SelectionPoint {
    /// Row-major order: rows compare first, columns break ties.
    fn cmp(&self, other: &Self) -> Ordering {
        self.row.cmp(&other.row).then(self.col.cmp(&other.col))
    }
}

/// A normalized selection: `start <= end` in row-major order, both ends
/// inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    /// First selected cell.
    pub start: SelectionPoint,
    /// Last selected cell.
    pub end: SelectionPoint,
}

/// Selection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SelectionState {
    /// No selection.
    #[default]
    None,
    /// Pointer held down, endpoint tracking the pointer.
    Selecting,
    /// Pointer released, range frozen.
    Complete,
}

/// Mouse-driven selection over the grid.
#[derive(Debug, Default)]
pub struct SelectionEngine {
    state: SelectionState,
    start: SelectionPoint,
    end: SelectionPoint,
}

impl SelectionPoint {
    const ORIGIN: Self = Self { col: 0, row: 0 };
}

impl Default for SelectionPoint {
    fn default() -> Self {
        Self::ORIGIN
    }
}

/// A cell participates in word selection iff its codepoint is nonzero and
/// matches `[A-Za-z0-9_-]`.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

impl SelectionEngine {
    /// Create an engine with no selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if any selection exists (in progress or complete).
    #[must_use]
    pub fn has_selection(&self) -> bool {
        self.state != SelectionState::None
    }

    /// Check if a drag is in progress.
    #[must_use]
    pub fn is_selecting(&self) -> bool {
        self.state == SelectionState::Selecting
    }

    /// Clear any prior selection and begin a new one at `(col, row)`.
    pub fn begin_at(&mut self, col: u16, row: u16) {
        self.state = SelectionState::Selecting;
        self.start = SelectionPoint::new(col, row);
        self.end = self.start;
    }

    /// While selecting, move the endpoint to `(col, row)`.
    pub fn extend_to(&mut self, col: u16, row: u16) {
        if self.state == SelectionState::Selecting {
            self.end = SelectionPoint::new(col, row);
        }
    }

    /// Leave the selecting state and materialize the selected text.
    /// Returns `None` when nothing was being selected or the text is
    /// empty.
    pub fn finish(&mut self, grid: &Grid) -> Option<String> {
        if self.state != SelectionState::Selecting {
            return None;
        }
        self.state = SelectionState::Complete;
        let text = self.text(grid);
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Select the word around `(col, row)`. Returns `true` when a word
    /// was found; on a non-word cell the selection is cleared.
    pub fn select_word(&mut self, grid: &Grid, col: u16, row: u16) -> bool {
        let Some(grid_row) = grid.row(row) else {
            self.clear();
            return false;
        };
        let cols = grid_row.cols();
        if col >= cols {
            self.clear();
            return false;
        }
        // A click on the spacer half of a wide character resolves to its
        // base cell.
        let anchor = if grid_row.cell(col).is_some_and(Cell::is_spacer) && col > 0 {
            col - 1
        } else {
            col
        };
        let anchor_char = grid_row.cell(anchor).map_or('\0', |c| c.cp);
        if anchor_char == '\0' || !is_word_char(anchor_char) {
            self.clear();
            return false;
        }

        let mut left = anchor;
        while left > 0 {
            let c = grid_row.cell(left - 1).map_or('\0', |c| c.cp);
            if c == '\0' || !is_word_char(c) {
                break;
            }
            left -= 1;
        }
        let mut right = anchor;
        while right + 1 < cols {
            let c = grid_row.cell(right + 1).map_or('\0', |c| c.cp);
            if c == '\0' || !is_word_char(c) {
                break;
            }
            right += 1;
        }

        self.start = SelectionPoint::new(left, row);
        self.end = SelectionPoint::new(right, row);
        self.state = SelectionState::Complete;
        true
    }

    /// Select the whole visible grid.
    pub fn select_all(&mut self, grid: &Grid) {
        self.start = SelectionPoint::new(0, 0);
        self.end = SelectionPoint::new(grid.cols() - 1, grid.rows() - 1);
        self.state = SelectionState::Complete;
    }

    /// Drop the selection.
    pub fn clear(&mut self) {
        self.state = SelectionState::None;
        self.start = SelectionPoint::ORIGIN;
        self.end = SelectionPoint::ORIGIN;
    }

    /// The normalized range, if a selection exists.
    #[must_use]
    pub fn range(&self) -> Option<SelectionRange> {
        if self.state == SelectionState::None {
            return None;
        }
        let (start, end) = if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };
        Some(SelectionRange { start, end })
    }

    /// Check if the cell at `(col, row)` falls inside the selection.
    #[must_use]
    pub fn contains(&self, col: u16, row: u16) -> bool {
        let Some(range) = self.range() else {
            return false;
        };
        let point = SelectionPoint::new(col, row);
        range.start <= point && point <= range.end
    }

    /// Materialize the selected cells as plain text.
    ///
    /// Wide-character spacers are skipped, never-written cells become
    /// spaces, combining marks follow their base character, and rows are
    /// joined with `\n`. Trailing spaces are not trimmed.
    #[must_use]
    pub fn text(&self, grid: &Grid) -> String {
        let Some(range) = self.range() else {
            return String::new();
        };
        let mut out = String::new();
        for row in range.start.row..=range.end.row {
            let Some(grid_row) = grid.row(row) else {
                continue;
            };
            if row > range.start.row {
                out.push('\n');
            }
            let from = if row == range.start.row {
                range.start.col
            } else {
                0
            };
            let to = if row == range.end.row {
                range.end.col.min(grid_row.cols() - 1)
            } else {
                grid_row.cols() - 1
            };
            for col in from..=to {
                let Some(cell) = grid_row.cell(col) else {
                    continue;
                };
                if cell.is_spacer() {
                    continue;
                }
                out.push(cell.display_char());
                out.extend(grid_row.combining_at(col));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Attributes, Cell, Grid};

    fn grid_with(lines: &[&str]) -> Grid {
        let mut grid = Grid::new(8, 20);
        for (r, line) in lines.iter().enumerate() {
            let mut col = 0;
            for c in line.chars() {
                grid.move_to(r as u16, col, false);
                grid.write_char_wrap(c, 1, false);
                col += 1;
            }
        }
        grid
    }

    #[test]
    fn begin_extend_finish() {
        let grid = grid_with(&["hello world"]);
        let mut sel = SelectionEngine::new();
        sel.begin_at(0, 0);
        assert!(sel.is_selecting());
        sel.extend_to(4, 0);
        let text = sel.finish(&grid);
        assert_eq!(text.as_deref(), Some("hello"));
        assert!(sel.has_selection());
        assert!(!sel.is_selecting());
    }

    #[test]
    fn backwards_drag_normalizes() {
        let grid = grid_with(&["hello"]);
        let mut sel = SelectionEngine::new();
        sel.begin_at(4, 0);
        sel.extend_to(1, 0);
        assert_eq!(sel.finish(&grid).as_deref(), Some("ello"));
        let range = sel.range().unwrap();
        assert_eq!(range.start, SelectionPoint::new(1, 0));
        assert_eq!(range.end, SelectionPoint::new(4, 0));
    }

    #[test]
    fn multi_row_selection_joins_with_newline() {
        let grid = grid_with(&["abc", "def"]);
        let mut sel = SelectionEngine::new();
        sel.begin_at(1, 0);
        sel.extend_to(1, 1);
        let text = sel.finish(&grid).unwrap();
        assert!(text.starts_with("bc"));
        assert!(text.contains('\n'));
        assert!(text.ends_with("de"));
    }

    #[test]
    fn extend_ignored_when_not_selecting() {
        let mut sel = SelectionEngine::new();
        sel.extend_to(5, 5);
        assert!(!sel.has_selection());
    }

    #[test]
    fn select_word_in_middle() {
        let grid = grid_with(&["foo-bar baz"]);
        let mut sel = SelectionEngine::new();
        assert!(sel.select_word(&grid, 2, 0));
        // "foo-bar" spans columns 0..=6 (hyphen is a word character).
        let range = sel.range().unwrap();
        assert_eq!(range.start, SelectionPoint::new(0, 0));
        assert_eq!(range.end, SelectionPoint::new(6, 0));
        assert_eq!(sel.text(&grid), "foo-bar");
    }

    #[test]
    fn select_word_on_space_selects_nothing() {
        let grid = grid_with(&["foo-bar baz"]);
        let mut sel = SelectionEngine::new();
        assert!(!sel.select_word(&grid, 7, 0));
        assert!(!sel.has_selection());
    }

    #[test]
    fn select_word_second_word() {
        let grid = grid_with(&["foo-bar baz"]);
        let mut sel = SelectionEngine::new();
        assert!(sel.select_word(&grid, 9, 0));
        assert_eq!(sel.text(&grid), "baz");
    }

    #[test]
    fn select_all_covers_grid() {
        let grid = grid_with(&["hi"]);
        let mut sel = SelectionEngine::new();
        sel.select_all(&grid);
        let range = sel.range().unwrap();
        assert_eq!(range.start, SelectionPoint::new(0, 0));
        assert_eq!(range.end, SelectionPoint::new(19, 7));
    }

    #[test]
    fn clear_drops_selection() {
        let grid = grid_with(&["hi"]);
        let mut sel = SelectionEngine::new();
        sel.begin_at(0, 0);
        sel.finish(&grid);
        sel.clear();
        assert!(!sel.has_selection());
        assert!(sel.range().is_none());
        assert_eq!(sel.text(&grid), "");
    }

    #[test]
    fn contains_respects_row_major_range() {
        let grid = grid_with(&["abc", "def", "ghi"]);
        let mut sel = SelectionEngine::new();
        sel.begin_at(2, 0);
        sel.extend_to(0, 2);
        sel.finish(&grid);
        assert!(sel.contains(2, 0));
        assert!(sel.contains(10, 1)); // middle rows fully covered
        assert!(sel.contains(0, 2));
        assert!(!sel.contains(1, 0));
        assert!(!sel.contains(1, 2));
    }

    #[test]
    fn wide_chars_materialize_once() {
        let mut grid = Grid::new(4, 10);
        grid.write_char_wrap('日', 2, false);
        grid.write_char_wrap('本', 2, false);
        let mut sel = SelectionEngine::new();
        sel.begin_at(0, 0);
        sel.extend_to(3, 0);
        assert_eq!(sel.finish(&grid).as_deref(), Some("日本"));
    }

    #[test]
    fn combining_marks_attached_to_base() {
        let mut grid = Grid::new(4, 10);
        grid.write_char_wrap('e', 1, false);
        grid.attach_combining('\u{0301}');
        let mut sel = SelectionEngine::new();
        sel.begin_at(0, 0);
        sel.extend_to(0, 0);
        assert_eq!(sel.finish(&grid).as_deref(), Some("e\u{0301}"));
    }

    #[test]
    fn unwritten_cells_materialize_as_spaces() {
        let grid = Grid::new(2, 5);
        let mut sel = SelectionEngine::new();
        sel.begin_at(0, 0);
        sel.extend_to(2, 0);
        let text = sel.finish(&grid);
        assert_eq!(text.as_deref(), Some("   "));
    }

    #[test]
    fn spacer_click_resolves_to_wide_base_word() {
        // Wide chars are not word characters, so this clears; the lookup
        // must still resolve the spacer without panicking.
        let mut grid = Grid::new(2, 10);
        grid.write_char_wrap('語', 2, false);
        let mut sel = SelectionEngine::new();
        assert!(!sel.select_word(&grid, 1, 0));
    }
}
