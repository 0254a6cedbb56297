#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # emterm-core
//!
//! Terminal-emulation core for embedding in a graphical host: a VT100/ANSI
//! parser, a cell grid with scrollback, a selection engine, and a thin
//! façade tying them together. The host owns rendering, fonts, input
//! capture, and PTY transport; this crate owns the byte stream's meaning.
//!
//! ## Architecture
//!
//! ```text
//! host bytes ──▶ Parser ──▶ ActionSink ──▶ Grid (+ ScrollbackRing)
//!                                            │
//!                renderer ◀── snapshots ◀────┤
//!                selection ◀── cell data ◀───┘
//! ```
//!
//! - [`parser::Parser`] is a Williams-style state machine over raw bytes.
//!   It dispatches a closed set of actions through [`parser::ActionSink`]
//!   and guarantees chunk-boundary invariance: splitting a stream at any
//!   byte yields the same screen.
//! - [`grid::Grid`] holds the active cell matrix, cursor (with deferred
//!   wrap), scroll region, tab stops, and damage tracking; retired lines
//!   feed a bounded [`scrollback::ScrollbackRing`].
//! - [`selection::SelectionEngine`] turns pointer gestures into a
//!   normalized range and materializes plain text.
//! - [`terminal::Terminal`] owns all of the above plus the primary and
//!   alternate screens, event emitters, palette, and addon lifecycles.
//!
//! ## Example
//!
//! ```
//! use emterm_core::{Terminal, TerminalOptions};
//!
//! let mut term = Terminal::new(TerminalOptions::default());
//! term.open()?;
//! term.write(b"\x1b[1;31mhello\x1b[0m")?;
//! assert_eq!(term.grid().visible_content().lines().next().map(str::trim_end), Some("hello"));
//! # Ok::<(), emterm_core::Error>(())
//! ```

pub mod error;
pub mod event;
pub mod grid;
pub mod parser;
pub mod scrollback;
pub mod selection;
pub mod terminal;

pub use error::{Error, Result};
pub use event::{EventEmitter, Subscription};
pub use grid::{AttrFlags, Attributes, Cell, Color, Cursor, Damage, Grid, Rgb, Row, ScrollRegion};
pub use parser::{ActionSink, Parser, State};
pub use scrollback::{ScrollbackRing, DEFAULT_SCROLLBACK};
pub use selection::{SelectionEngine, SelectionPoint, SelectionRange};
pub use terminal::{
    Addon, ClipboardSink, CursorSnapshot, CursorStyle, Modes, PointerEvent, PointerKind, Terminal,
    TerminalOptions, Theme,
};

#[cfg(test)]
mod tests;
