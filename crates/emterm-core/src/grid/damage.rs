//! Dirty-row tracking for the renderer.
//!
//! Every grid mutation records the touched row indices. The renderer
//! consumes the set each frame via [`Damage::take`], which also clears it.
//! Whole-screen invalidations (reset, alternate-screen switch) flip a
//! single flag instead of enumerating rows.

use rustc_hash::FxHashSet;

/// Set of row indices whose contents changed since the last snapshot.
#[derive(Debug, Default)]
pub struct Damage {
    rows: FxHashSet<u16>,
    all: bool,
}

impl Damage {
    /// Create an empty damage set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one row dirty.
    #[inline]
    pub fn mark(&mut self, row: u16) {
        if !self.all {
            self.rows.insert(row);
        }
    }

    /// Mark an inclusive row range dirty.
    pub fn mark_range(&mut self, from: u16, to: u16) {
        if self.all {
            return;
        }
        for row in from..=to {
            self.rows.insert(row);
        }
    }

    /// Mark every row dirty.
    #[inline]
    pub fn mark_all(&mut self) {
        self.all = true;
        self.rows.clear();
    }

    /// Check whether a row is currently dirty.
    #[must_use]
    pub fn is_dirty(&self, row: u16) -> bool {
        self.all || self.rows.contains(&row)
    }

    /// Check whether anything is dirty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.all && self.rows.is_empty()
    }

    /// Consume the set: returns the dirty rows in ascending order and
    /// clears the tracker. `total_rows` bounds the expansion of an
    /// all-dirty mark.
    pub fn take(&mut self, total_rows: u16) -> Vec<u16> {
        if self.all {
            self.all = false;
            self.rows.clear();
            return (0..total_rows).collect();
        }
        let mut rows: Vec<u16> = self.rows.drain().filter(|&r| r < total_rows).collect();
        rows.sort_unstable();
        rows
    }
}
