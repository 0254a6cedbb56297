//! Terminal façade.
//!
//! Orchestrates the pipeline: host writes bytes → parser dispatches
//! actions → the active grid mutates and marks damage → the renderer
//! polls read-only snapshots. The façade also owns the event emitters
//! (`on_data`, `on_resize`, `on_bell`, `on_title`, `on_selection`), the
//! selection engine, the color palette, and addon lifecycles.
//!
//! Threading: the core is single-threaded cooperative. `write` runs the
//! parser synchronously and completes every side effect (damage marking,
//! event emission, query replies) before returning. `write` and `resize`
//! must not run concurrently; hosts with threads gate the terminal
//! behind a lock.

mod palette;

pub use palette::{default_color, parse_color_spec, Palette};

use unicode_width::UnicodeWidthChar;

use crate::error::{Error, Result};
use crate::event::{EventEmitter, Subscription};
use crate::grid::{AttrFlags, Attributes, Color, Grid, Rgb, Row};
use crate::parser::{ActionSink, Parser};
use crate::scrollback::DEFAULT_SCROLLBACK;
use crate::selection::{SelectionEngine, SelectionRange};

/// Cursor rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    /// Filled block.
    #[default]
    Block,
    /// Underline bar.
    Underline,
    /// Vertical bar.
    Bar,
}

/// Renderer color theme. Colors are concrete RGB values; missing theme
/// entries in a host config fall back to these defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Default text color.
    pub foreground: Rgb,
    /// Default background color.
    pub background: Rgb,
    /// Cursor body color.
    pub cursor: Rgb,
    /// Color of text under a block cursor.
    pub cursor_accent: Rgb,
    /// Selection highlight color.
    pub selection_background: Rgb,
    /// Selection text color; `None` keeps each cell's own foreground.
    pub selection_foreground: Option<Rgb>,
    /// The 16 named ANSI colors (black through bright white).
    pub ansi: [Rgb; 16],
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            foreground: (229, 229, 229),
            background: (0, 0, 0),
            cursor: (255, 255, 255),
            cursor_accent: (0, 0, 0),
            selection_background: (88, 88, 88),
            selection_foreground: None,
            ansi: std::array::from_fn(|i| default_color(i as u8)),
        }
    }
}

/// Construction options. All fields have defaults.
#[derive(Debug, Clone)]
pub struct TerminalOptions {
    /// Column count.
    pub cols: u16,
    /// Row count.
    pub rows: u16,
    /// Scrollback capacity in lines.
    pub scrollback: usize,
    /// Whether the cursor blinks.
    pub cursor_blink: bool,
    /// Cursor rendering style.
    pub cursor_style: CursorStyle,
    /// Color theme.
    pub theme: Theme,
}

impl Default for TerminalOptions {
    fn default() -> Self {
        Self {
            cols: 80,
            rows: 24,
            scrollback: DEFAULT_SCROLLBACK,
            cursor_blink: false,
            cursor_style: CursorStyle::Block,
            theme: Theme::default(),
        }
    }
}

/// Pointer gesture kinds delivered by the host's input adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    /// Button pressed.
    Down,
    /// Pointer moved with the button held.
    Drag,
    /// Button released.
    Up,
    /// Double click (word selection).
    DoubleClick,
}

/// A pointer event in cell coordinates.
#[derive(Debug, Clone, Copy)]
pub struct PointerEvent {
    /// Gesture kind.
    pub kind: PointerKind,
    /// Cell column.
    pub col: u16,
    /// Cell row.
    pub row: u16,
}

/// Injected clipboard sink; the core performs no clipboard I/O itself.
pub trait ClipboardSink: Send {
    /// Store the materialized selection text.
    fn set_contents(&mut self, text: &str) -> std::io::Result<()>;
}

/// Addon contract: activated at load, disposed with the terminal.
pub trait Addon: Send {
    /// Called once when the addon is loaded. The handle is the public
    /// terminal API.
    fn activate(&mut self, terminal: &mut Terminal);
    /// Called at terminal dispose.
    fn dispose(&mut self) {}
}

/// Terminal mode flags toggled by SM/RM sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modes {
    /// DECAWM auto-wrap (default on).
    pub auto_wrap: bool,
    /// DECOM origin mode.
    pub origin: bool,
    /// IRM insert mode.
    pub insert: bool,
    /// DECCKM application cursor keys.
    pub app_cursor_keys: bool,
    /// Bracketed paste (mode 2004).
    pub bracketed_paste: bool,
}

impl Default for Modes {
    fn default() -> Self {
        Self {
            auto_wrap: true,
            origin: false,
            insert: false,
            app_cursor_keys: false,
            bracketed_paste: false,
        }
    }
}

/// Read-only cursor state handed to the renderer each frame.
#[derive(Debug, Clone, Copy)]
pub struct CursorSnapshot {
    /// Cursor column.
    pub col: u16,
    /// Cursor row.
    pub row: u16,
    /// Visibility (DECTCEM).
    pub visible: bool,
    /// Blink flag.
    pub blink: bool,
    /// Rendering style.
    pub style: CursorStyle,
    /// Pen attributes at the cursor.
    pub attrs: Attributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    New,
    Open,
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DcsRequest {
    Decrqss,
}

/// The terminal core.
pub struct Terminal {
    options: TerminalOptions,
    lifecycle: Lifecycle,
    primary: Grid,
    alternate: Grid,
    alt_active: bool,
    modes: Modes,
    parser: Parser,
    selection: SelectionEngine,
    palette: Palette,
    cursor_style: CursorStyle,
    title: String,
    focused: bool,
    clipboard: Option<Box<dyn ClipboardSink>>,
    clipboard_warned: bool,
    addons: Vec<Box<dyn Addon>>,
    dcs_request: Option<DcsRequest>,
    response: Vec<u8>,
    data_event: EventEmitter<String>,
    resize_event: EventEmitter<(u16, u16)>,
    bell_event: EventEmitter<()>,
    title_event: EventEmitter<String>,
    selection_event: EventEmitter<String>,
}

impl std::fmt::Debug for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminal")
            .field("lifecycle", &self.lifecycle)
            .field("cols", &self.active_grid().cols())
            .field("rows", &self.active_grid().rows())
            .field("alt_active", &self.alt_active)
            .finish_non_exhaustive()
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new(TerminalOptions::default())
    }
}

impl Terminal {
    /// Build an unopened terminal from options.
    #[must_use]
    pub fn new(options: TerminalOptions) -> Self {
        let cols = options.cols.max(1);
        let rows = options.rows.max(1);
        let mut primary = Grid::with_scrollback(rows, cols, options.scrollback);
        let mut alternate = Grid::new(rows, cols);
        primary.cursor_mut().blink = options.cursor_blink;
        alternate.cursor_mut().blink = options.cursor_blink;
        let cursor_style = options.cursor_style;
        Self {
            options,
            lifecycle: Lifecycle::New,
            primary,
            alternate,
            alt_active: false,
            modes: Modes::default(),
            parser: Parser::new(),
            selection: SelectionEngine::new(),
            palette: Palette::new(),
            cursor_style,
            title: String::new(),
            focused: false,
            clipboard: None,
            clipboard_warned: false,
            addons: Vec::new(),
            dcs_request: None,
            response: Vec::new(),
            data_event: EventEmitter::new(),
            resize_event: EventEmitter::new(),
            bell_event: EventEmitter::new(),
            title_event: EventEmitter::new(),
            selection_event: EventEmitter::new(),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Wire the terminal to its host and become ready. The width table is
    /// compiled in, so opening completes synchronously.
    pub fn open(&mut self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Disposed => Err(Error::Disposed),
            Lifecycle::Open => Err(Error::AlreadyOpen),
            Lifecycle::New => {
                self.lifecycle = Lifecycle::Open;
                Ok(())
            }
        }
    }

    /// Check if the terminal is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.lifecycle == Lifecycle::Open
    }

    /// Check if the terminal has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.lifecycle == Lifecycle::Disposed
    }

    /// Release all resources. Idempotent; after disposal every operation
    /// except `dispose` fails with [`Error::Disposed`].
    pub fn dispose(&mut self) {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }
        for mut addon in self.addons.drain(..) {
            addon.dispose();
        }
        // Release order: selection, parser, grids, scrollback (the ring
        // is cleared by its grid's reset).
        self.selection.clear();
        self.parser.reset();
        self.primary.reset();
        self.alternate.reset();
        self.alt_active = false;
        self.data_event.clear();
        self.resize_event.clear();
        self.bell_event.clear();
        self.title_event.clear();
        self.selection_event.clear();
        self.lifecycle = Lifecycle::Disposed;
    }

    /// Load an addon: `activate` runs now, `dispose` at terminal dispose.
    pub fn load_addon(&mut self, mut addon: Box<dyn Addon>) {
        addon.activate(self);
        self.addons.push(addon);
    }

    /// Inject the clipboard sink that receives selected text.
    pub fn set_clipboard(&mut self, sink: Box<dyn ClipboardSink>) {
        self.clipboard = Some(sink);
    }

    fn ensure_open(&self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Open => Ok(()),
            Lifecycle::New => Err(Error::NotOpen),
            Lifecycle::Disposed => Err(Error::Disposed),
        }
    }

    // ------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------

    /// Feed bytes to the parser, mutating the grid. All side effects
    /// (damage, events, query replies) complete before this returns.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let mut parser = std::mem::take(&mut self.parser);
        parser.advance(bytes, &mut Performer { term: self });
        self.parser = parser;
        self.flush_responses();
        Ok(())
    }

    /// Feed UTF-8 text.
    pub fn write_str(&mut self, text: &str) -> Result<()> {
        self.write(text.as_bytes())
    }

    /// Feed text followed by `\r\n`.
    pub fn writeln(&mut self, text: &str) -> Result<()> {
        self.write_str(text)?;
        self.write(b"\r\n")
    }

    /// Resize both grids. Fires `on_resize` only on an actual change.
    pub fn resize(&mut self, cols: u16, rows: u16) -> Result<()> {
        self.ensure_open()?;
        if cols == 0 || rows == 0 {
            return Err(Error::InvalidDimensions { cols, rows });
        }
        let changed = self.primary.resize(cols, rows);
        let changed_alt = self.alternate.resize(cols, rows);
        if changed || changed_alt {
            self.selection.clear();
            self.resize_event.emit(&(cols, rows));
        }
        Ok(())
    }

    /// Erase the visible grid and home the cursor; scrollback is kept.
    pub fn clear(&mut self) -> Result<()> {
        if self.lifecycle == Lifecycle::Disposed {
            return Err(Error::Disposed);
        }
        self.active_grid_mut().clear_visible();
        Ok(())
    }

    /// Full reset (RIS): default attributes, home cursor, cleared grids
    /// and scrollback, default tab stops and modes.
    pub fn reset(&mut self) -> Result<()> {
        if self.lifecycle == Lifecycle::Disposed {
            return Err(Error::Disposed);
        }
        self.full_reset();
        Ok(())
    }

    /// Focus passthrough. Never fails.
    pub fn focus(&mut self) {
        if self.lifecycle == Lifecycle::Open {
            self.focused = true;
        }
    }

    /// Blur passthrough. Never fails.
    pub fn blur(&mut self) {
        if self.lifecycle == Lifecycle::Open {
            self.focused = false;
        }
    }

    /// Whether the terminal currently has focus.
    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    // ------------------------------------------------------------------
    // Input adapter
    // ------------------------------------------------------------------

    /// Encoded keystrokes from the input adapter; forwarded to `on_data`
    /// subscribers.
    pub fn input(&mut self, bytes: &[u8]) {
        if self.lifecycle != Lifecycle::Open {
            return;
        }
        let data = String::from_utf8_lossy(bytes).into_owned();
        self.data_event.emit(&data);
    }

    /// A pointer gesture from the input adapter, routed to the selection
    /// engine.
    pub fn pointer(&mut self, event: PointerEvent) {
        if self.lifecycle != Lifecycle::Open {
            return;
        }
        let grid = if self.alt_active {
            &self.alternate
        } else {
            &self.primary
        };
        let col = event.col.min(grid.cols() - 1);
        let row = event.row.min(grid.rows() - 1);
        match event.kind {
            PointerKind::Down => self.selection.begin_at(col, row),
            PointerKind::Drag => self.selection.extend_to(col, row),
            PointerKind::Up => {
                let text = self.selection.finish(grid);
                if let Some(text) = text {
                    self.selection_event.emit(&text);
                    self.copy_to_clipboard(&text);
                }
            }
            PointerKind::DoubleClick => {
                self.selection.select_word(grid, col, row);
            }
        }
    }

    /// Select the whole visible grid.
    pub fn select_all(&mut self) {
        let grid = if self.alt_active {
            &self.alternate
        } else {
            &self.primary
        };
        self.selection.select_all(grid);
    }

    /// Drop any selection.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Subscribe to user-input data (and terminal query replies).
    pub fn on_data(&mut self, f: impl FnMut(&String) + Send + 'static) -> Subscription {
        self.data_event.subscribe(f)
    }

    /// Subscribe to dimension changes. Fires only on actual change.
    pub fn on_resize(&mut self, f: impl FnMut(&(u16, u16)) + Send + 'static) -> Subscription {
        self.resize_event.subscribe(f)
    }

    /// Subscribe to BEL.
    pub fn on_bell(&mut self, f: impl FnMut(&()) + Send + 'static) -> Subscription {
        self.bell_event.subscribe(f)
    }

    /// Subscribe to window-title changes (OSC 0/2).
    pub fn on_title(&mut self, f: impl FnMut(&String) + Send + 'static) -> Subscription {
        self.title_event.subscribe(f)
    }

    /// Subscribe to completed, nonempty selections.
    pub fn on_selection(&mut self, f: impl FnMut(&String) + Send + 'static) -> Subscription {
        self.selection_event.subscribe(f)
    }

    // ------------------------------------------------------------------
    // Renderer snapshots
    // ------------------------------------------------------------------

    /// Current `(cols, rows)`.
    #[must_use]
    pub fn dimensions(&self) -> (u16, u16) {
        let grid = self.active_grid();
        (grid.cols(), grid.rows())
    }

    /// The active grid (primary or alternate).
    #[must_use]
    pub fn grid(&self) -> &Grid {
        self.active_grid()
    }

    /// Snapshot of one row of the active grid.
    #[must_use]
    pub fn line_at(&self, row: u16) -> Option<Row> {
        self.active_grid().row(row).cloned()
    }

    /// Number of scrollback lines.
    #[must_use]
    pub fn scrollback_len(&self) -> usize {
        self.primary.scrollback().map_or(0, |ring| ring.len())
    }

    /// Snapshot of one scrollback line; `n = 0` is the oldest.
    #[must_use]
    pub fn scrollback_line_at(&self, n: usize) -> Option<Row> {
        self.primary.scrollback().and_then(|ring| ring.line(n)).cloned()
    }

    /// Cursor state for the renderer.
    #[must_use]
    pub fn cursor_snapshot(&self) -> CursorSnapshot {
        let cursor = self.active_grid().cursor();
        CursorSnapshot {
            col: cursor.col,
            row: cursor.row,
            visible: cursor.visible,
            blink: cursor.blink,
            style: self.cursor_style,
            attrs: cursor.attrs,
        }
    }

    /// Consume and clear the dirty-row set of the active grid.
    pub fn take_dirty(&mut self) -> Vec<u16> {
        self.active_grid_mut().take_dirty()
    }

    /// The current selection range, if any.
    #[must_use]
    pub fn selection_snapshot(&self) -> Option<SelectionRange> {
        self.selection.range()
    }

    /// Materialized text of the current selection.
    #[must_use]
    pub fn selected_text(&self) -> Option<String> {
        let text = self.selection.text(self.active_grid());
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// The window title set via OSC 0/2.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current mode flags.
    #[must_use]
    pub fn modes(&self) -> Modes {
        self.modes
    }

    /// Current cursor style (options or DECSCUSR).
    #[must_use]
    pub fn cursor_style(&self) -> CursorStyle {
        self.cursor_style
    }

    /// Construction options.
    #[must_use]
    pub fn options(&self) -> &TerminalOptions {
        &self.options
    }

    /// Resolve a cell color to concrete RGB through the palette overrides
    /// and theme.
    #[must_use]
    pub fn resolve_color(&self, color: Color, is_fg: bool) -> Rgb {
        match color {
            Color::Default => {
                if is_fg {
                    self.palette
                        .foreground()
                        .unwrap_or(self.options.theme.foreground)
                } else {
                    self.palette
                        .background()
                        .unwrap_or(self.options.theme.background)
                }
            }
            Color::Indexed(index) => self.palette.override_for(index).unwrap_or_else(|| {
                if index < 16 {
                    self.options.theme.ansi[usize::from(index)]
                } else {
                    default_color(index)
                }
            }),
            Color::Rgb(r, g, b) => (r, g, b),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn active_grid(&self) -> &Grid {
        if self.alt_active {
            &self.alternate
        } else {
            &self.primary
        }
    }

    fn active_grid_mut(&mut self) -> &mut Grid {
        if self.alt_active {
            &mut self.alternate
        } else {
            &mut self.primary
        }
    }

    fn flush_responses(&mut self) {
        if self.response.is_empty() {
            return;
        }
        let data = String::from_utf8_lossy(&self.response).into_owned();
        self.response.clear();
        self.data_event.emit(&data);
    }

    fn respond(&mut self, bytes: &[u8]) {
        self.response.extend_from_slice(bytes);
    }

    fn copy_to_clipboard(&mut self, text: &str) {
        let Some(clipboard) = &mut self.clipboard else {
            return;
        };
        if let Err(err) = clipboard.set_contents(text) {
            if !self.clipboard_warned {
                log::warn!("clipboard sink failed: {err}");
                self.clipboard_warned = true;
            }
        }
    }

    fn full_reset(&mut self) {
        self.primary.reset();
        self.alternate.reset();
        self.alt_active = false;
        self.modes = Modes::default();
        self.selection.clear();
        self.palette.reset_all();
        self.title.clear();
        self.cursor_style = self.options.cursor_style;
        self.dcs_request = None;
        let blink = self.options.cursor_blink;
        self.primary.cursor_mut().blink = blink;
        self.alternate.cursor_mut().blink = blink;
    }

    fn enter_alt(&mut self, save_cursor: bool) {
        if self.alt_active {
            return;
        }
        if save_cursor {
            self.primary.save_cursor(self.modes.origin);
        }
        let cursor = self.primary.cursor();
        self.alternate.reset();
        *self.alternate.cursor_mut() = cursor;
        self.alt_active = true;
        self.alternate.damage_mut().mark_all();
    }

    fn exit_alt(&mut self, restore_cursor: bool) {
        if !self.alt_active {
            return;
        }
        self.alternate.reset();
        self.alt_active = false;
        if restore_cursor {
            if let Some(origin) = self.primary.restore_cursor() {
                self.modes.origin = origin;
            }
        }
        self.primary.damage_mut().mark_all();
    }

    // ------------------------------------------------------------------
    // Action handlers (called by the parser through Performer)
    // ------------------------------------------------------------------

    fn do_print(&mut self, c: char) {
        let Some(width) = c.width() else { return };
        if width == 0 {
            self.active_grid_mut().attach_combining(c);
            return;
        }
        let width = width.min(2) as u8;
        let (wrap, insert) = (self.modes.auto_wrap, self.modes.insert);
        let grid = self.active_grid_mut();
        if wrap {
            grid.write_char_wrap(c, width, insert);
        } else {
            grid.write_char(c, width, insert);
        }
    }

    fn do_execute(&mut self, byte: u8) {
        match byte {
            0x07 => self.bell_event.emit(&()),
            0x08 => self.active_grid_mut().backspace(),
            0x09 => self.active_grid_mut().tab(),
            0x0A | 0x0B | 0x0C => self.active_grid_mut().line_feed(),
            0x0D => self.active_grid_mut().carriage_return(),
            _ => {}
        }
    }

    fn do_esc(&mut self, intermediates: &[u8], final_byte: u8) {
        match (intermediates.first().copied(), final_byte) {
            (None, b'7') => {
                let origin = self.modes.origin;
                self.active_grid_mut().save_cursor(origin);
            }
            (None, b'8') => {
                if let Some(origin) = self.active_grid_mut().restore_cursor() {
                    self.modes.origin = origin;
                }
            }
            (None, b'D') => self.active_grid_mut().line_feed(),
            (None, b'E') => {
                let grid = self.active_grid_mut();
                grid.carriage_return();
                grid.line_feed();
            }
            (None, b'H') => self.active_grid_mut().set_tab_stop(),
            (None, b'M') => self.active_grid_mut().reverse_line_feed(),
            (None, b'c') => self.full_reset(),
            (None, b'\\' | b'=' | b'>') => {}
            (Some(b'#'), b'8') => self.active_grid_mut().screen_alignment_fill(),
            (Some(b'(' | b')' | b'*' | b'+'), _) => {
                // Charset designation: consumed, G0-G3 mapping not kept.
            }
            _ => {
                log::debug!(
                    "ignored ESC sequence: intermediates={intermediates:?} final={final_byte:#04x}"
                );
            }
        }
    }

    fn do_csi(&mut self, params: &[u16], intermediates: &[u8], final_byte: u8) {
        let private = intermediates.first() == Some(&b'?');
        let n1 = params.first().copied().unwrap_or(1).max(1);
        let origin = self.modes.origin;
        match (private, final_byte) {
            (false, b'A') => self.active_grid_mut().cursor_up(n1),
            (false, b'B' | b'e') => self.active_grid_mut().cursor_down(n1),
            (false, b'C' | b'a') => self.active_grid_mut().cursor_forward(n1),
            (false, b'D') => self.active_grid_mut().cursor_backward(n1),
            (false, b'E') => {
                let grid = self.active_grid_mut();
                grid.cursor_down(n1);
                grid.carriage_return();
            }
            (false, b'F') => {
                let grid = self.active_grid_mut();
                grid.cursor_up(n1);
                grid.carriage_return();
            }
            (false, b'G' | b'`') => self.active_grid_mut().move_to_col(n1 - 1),
            (false, b'H' | b'f') => {
                let row = n1 - 1;
                let col = params.get(1).copied().unwrap_or(1).max(1) - 1;
                self.active_grid_mut().move_to(row, col, origin);
            }
            (false, b'd') => self.active_grid_mut().move_to_row(n1 - 1, origin),
            (false, b'I') => self.active_grid_mut().tab_n(n1),
            (false, b'Z') => self.active_grid_mut().back_tab_n(n1),
            (false, b'J') => match params.first().copied().unwrap_or(0) {
                0 => self.active_grid_mut().erase_below(),
                1 => self.active_grid_mut().erase_above(),
                2 => self.active_grid_mut().erase_screen(),
                3 => self.active_grid_mut().clear_scrollback(),
                _ => {}
            },
            (false, b'K') => match params.first().copied().unwrap_or(0) {
                0 => self.active_grid_mut().erase_to_end_of_line(),
                1 => self.active_grid_mut().erase_from_start_of_line(),
                2 => self.active_grid_mut().erase_line(),
                _ => {}
            },
            (false, b'L') => self.active_grid_mut().insert_lines(usize::from(n1)),
            (false, b'M') => self.active_grid_mut().delete_lines(usize::from(n1)),
            (false, b'@') => self.active_grid_mut().insert_chars(n1),
            (false, b'P') => self.active_grid_mut().delete_chars(n1),
            (false, b'X') => self.active_grid_mut().erase_chars(n1),
            (false, b'S') => self.active_grid_mut().scroll_region_up(usize::from(n1)),
            (false, b'T') => {
                if params.len() <= 1 {
                    self.active_grid_mut().scroll_region_down(usize::from(n1));
                }
            }
            (false, b'r') => {
                let grid_rows = self.active_grid().rows();
                let top = params.first().copied().unwrap_or(1).max(1) - 1;
                let bottom = match params.get(1).copied().unwrap_or(0) {
                    0 => grid_rows - 1,
                    b => b.min(grid_rows) - 1,
                };
                let grid = self.active_grid_mut();
                grid.set_scroll_region(top, bottom);
                grid.move_to(0, 0, origin);
            }
            (false, b'm') => self.do_sgr(params),
            (false, b'n') => self.do_dsr(params),
            (false, b's') => {
                let origin = self.modes.origin;
                self.active_grid_mut().save_cursor(origin);
            }
            (false, b'u') => {
                if let Some(saved_origin) = self.active_grid_mut().restore_cursor() {
                    self.modes.origin = saved_origin;
                }
            }
            (false, b'c') => self.respond(b"\x1b[?6c"),
            (false, b'g') => match params.first().copied().unwrap_or(0) {
                0 => self.active_grid_mut().clear_tab_stop(),
                3 => self.active_grid_mut().clear_all_tab_stops(),
                _ => {}
            },
            (false, b'q') if intermediates == [b' '] => {
                self.set_cursor_shape(params.first().copied().unwrap_or(0));
            }
            (false, b'h') => self.set_ansi_modes(params, true),
            (false, b'l') => self.set_ansi_modes(params, false),
            (false, b't') => {} // window manipulation: not applicable
            (true, b'h') => self.set_private_modes(params, true),
            (true, b'l') => self.set_private_modes(params, false),
            _ => {
                log::debug!(
                    "ignored CSI: params={params:?} intermediates={intermediates:?} \
                     final={final_byte:#04x}"
                );
            }
        }
    }

    fn set_ansi_modes(&mut self, params: &[u16], enable: bool) {
        for &mode in params {
            match mode {
                4 => self.modes.insert = enable,
                _ => log::debug!("ignored ANSI mode {mode}"),
            }
        }
    }

    fn set_private_modes(&mut self, params: &[u16], enable: bool) {
        for &mode in params {
            match mode {
                1 => self.modes.app_cursor_keys = enable,
                6 => {
                    self.modes.origin = enable;
                    self.active_grid_mut().move_to(0, 0, enable);
                }
                7 => self.modes.auto_wrap = enable,
                12 => {
                    self.primary.cursor_mut().blink = enable;
                    self.alternate.cursor_mut().blink = enable;
                }
                25 => {
                    self.primary.cursor_mut().visible = enable;
                    self.alternate.cursor_mut().visible = enable;
                    self.active_grid_mut().damage_mut().mark_all();
                }
                47 | 1047 => {
                    if enable {
                        self.enter_alt(false);
                    } else {
                        self.exit_alt(false);
                    }
                }
                1048 => {
                    if enable {
                        let origin = self.modes.origin;
                        self.active_grid_mut().save_cursor(origin);
                    } else if let Some(origin) = self.active_grid_mut().restore_cursor() {
                        self.modes.origin = origin;
                    }
                }
                1049 => {
                    if enable {
                        self.enter_alt(true);
                    } else {
                        self.exit_alt(true);
                    }
                }
                2004 => self.modes.bracketed_paste = enable,
                _ => log::debug!("ignored private mode {mode}"),
            }
        }
    }

    fn set_cursor_shape(&mut self, param: u16) {
        let (style, blink) = match param {
            0 | 1 => (CursorStyle::Block, true),
            2 => (CursorStyle::Block, false),
            3 => (CursorStyle::Underline, true),
            4 => (CursorStyle::Underline, false),
            5 => (CursorStyle::Bar, true),
            6 => (CursorStyle::Bar, false),
            _ => return,
        };
        self.cursor_style = style;
        self.primary.cursor_mut().blink = blink;
        self.alternate.cursor_mut().blink = blink;
    }

    fn do_sgr(&mut self, params: &[u16]) {
        let mut attrs = self.active_grid().attrs();
        if params.is_empty() {
            attrs = Attributes::DEFAULT;
        } else {
            let mut i = 0;
            while i < params.len() {
                match params[i] {
                    0 => attrs = Attributes::DEFAULT,
                    1 => attrs.flags |= AttrFlags::BOLD,
                    2 => attrs.flags |= AttrFlags::DIM,
                    3 => attrs.flags |= AttrFlags::ITALIC,
                    4 | 21 => attrs.flags |= AttrFlags::UNDERLINE,
                    5 => attrs.flags |= AttrFlags::BLINK,
                    7 => attrs.flags |= AttrFlags::INVERSE,
                    8 => attrs.flags |= AttrFlags::HIDDEN,
                    9 => attrs.flags |= AttrFlags::STRIKETHROUGH,
                    22 => attrs.flags -= AttrFlags::BOLD | AttrFlags::DIM,
                    23 => attrs.flags -= AttrFlags::ITALIC,
                    24 => attrs.flags -= AttrFlags::UNDERLINE,
                    25 => attrs.flags -= AttrFlags::BLINK,
                    27 => attrs.flags -= AttrFlags::INVERSE,
                    28 => attrs.flags -= AttrFlags::HIDDEN,
                    29 => attrs.flags -= AttrFlags::STRIKETHROUGH,
                    30..=37 => attrs.fg = Color::Indexed((params[i] - 30) as u8),
                    38 => {
                        if let Some(color) = parse_extended_color(params, &mut i) {
                            attrs.fg = color;
                        }
                    }
                    39 => attrs.fg = Color::Default,
                    40..=47 => attrs.bg = Color::Indexed((params[i] - 40) as u8),
                    48 => {
                        if let Some(color) = parse_extended_color(params, &mut i) {
                            attrs.bg = color;
                        }
                    }
                    49 => attrs.bg = Color::Default,
                    90..=97 => attrs.fg = Color::Indexed((params[i] - 90 + 8) as u8),
                    100..=107 => attrs.bg = Color::Indexed((params[i] - 100 + 8) as u8),
                    // Unknown parameters are skipped without aborting.
                    _ => {}
                }
                i += 1;
            }
        }
        self.active_grid_mut().set_attrs(attrs);
    }

    fn do_dsr(&mut self, params: &[u16]) {
        match params.first().copied().unwrap_or(0) {
            5 => self.respond(b"\x1b[0n"),
            6 => {
                let cursor = self.active_grid().cursor();
                let top = self.active_grid().scroll_region().top;
                let row = if self.modes.origin {
                    cursor.row.saturating_sub(top)
                } else {
                    cursor.row
                } + 1;
                let col = cursor.col + 1;
                let reply = format!("\x1b[{row};{col}R");
                self.respond(reply.as_bytes());
            }
            _ => {}
        }
    }

    fn do_osc(&mut self, params: &[&[u8]]) {
        let Some(&id) = params.first() else { return };
        let Ok(id) = std::str::from_utf8(id).map(str::trim) else {
            return;
        };
        let Ok(code) = id.parse::<u16>() else {
            log::debug!("ignored OSC with non-numeric identifier");
            return;
        };
        match code {
            0 | 2 => {
                let title = join_osc_payload(&params[1..]);
                self.title = title.clone();
                self.title_event.emit(&title);
            }
            4 => {
                let mut i = 1;
                while i + 1 < params.len() {
                    let index = std::str::from_utf8(params[i])
                        .ok()
                        .and_then(|s| s.parse::<u16>().ok())
                        .filter(|&n| n <= 255)
                        .map(|n| n as u8);
                    let spec = std::str::from_utf8(params[i + 1])
                        .ok()
                        .and_then(parse_color_spec);
                    if let (Some(index), Some(rgb)) = (index, spec) {
                        self.palette.set(index, rgb);
                        self.active_grid_mut().damage_mut().mark_all();
                    }
                    i += 2;
                }
            }
            10 => {
                if let Some(rgb) = params
                    .get(1)
                    .and_then(|s| std::str::from_utf8(s).ok())
                    .and_then(parse_color_spec)
                {
                    self.palette.set_foreground(rgb);
                    self.active_grid_mut().damage_mut().mark_all();
                }
            }
            11 => {
                if let Some(rgb) = params
                    .get(1)
                    .and_then(|s| std::str::from_utf8(s).ok())
                    .and_then(parse_color_spec)
                {
                    self.palette.set_background(rgb);
                    self.active_grid_mut().damage_mut().mark_all();
                }
            }
            52 => log::debug!("OSC 52 clipboard request ignored"),
            104 => {
                if params.len() <= 1 {
                    self.palette.reset_all();
                } else {
                    for part in &params[1..] {
                        if let Some(index) = std::str::from_utf8(part)
                            .ok()
                            .and_then(|s| s.parse::<u16>().ok())
                            .filter(|&n| n <= 255)
                        {
                            self.palette.reset(index as u8);
                        }
                    }
                }
                self.active_grid_mut().damage_mut().mark_all();
            }
            110 => self.palette.reset_foreground(),
            111 => self.palette.reset_background(),
            _ => log::debug!("ignored OSC {code}"),
        }
    }

    fn do_dcs_hook(&mut self, _params: &[u16], intermediates: &[u8], final_byte: u8) {
        self.dcs_request = if intermediates == [b'$'] && final_byte == b'q' {
            Some(DcsRequest::Decrqss)
        } else {
            None
        };
    }

    fn do_dcs_unhook(&mut self) {
        if self.dcs_request.take() == Some(DcsRequest::Decrqss) {
            // DECRPSS "invalid request": state is never echoed back.
            self.respond(b"\x1bP0$r\x1b\\");
        }
    }
}

/// Adapter implementing the parser's sink over the terminal. Kept
/// separate so the dispatch surface stays off the public `Terminal` API.
struct Performer<'a> {
    term: &'a mut Terminal,
}

impl ActionSink for Performer<'_> {
    fn print(&mut self, c: char) {
        self.term.do_print(c);
    }

    fn execute(&mut self, byte: u8) {
        self.term.do_execute(byte);
    }

    fn csi_dispatch(&mut self, params: &[u16], intermediates: &[u8], final_byte: u8) {
        self.term.do_csi(params, intermediates, final_byte);
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], final_byte: u8) {
        self.term.do_esc(intermediates, final_byte);
    }

    fn osc_dispatch(&mut self, params: &[&[u8]]) {
        self.term.do_osc(params);
    }

    fn dcs_hook(&mut self, params: &[u16], intermediates: &[u8], final_byte: u8) {
        self.term.do_dcs_hook(params, intermediates, final_byte);
    }

    fn dcs_unhook(&mut self) {
        self.term.do_dcs_unhook();
    }
}

/// SGR 38/48 extended color: `38;5;n` (palette) or `38;2;r;g;b`
/// (truecolor). Advances `i` past the consumed parameters.
fn parse_extended_color(params: &[u16], i: &mut usize) -> Option<Color> {
    match params.get(*i + 1).copied() {
        Some(5) => {
            let index = params.get(*i + 2).copied()?;
            *i += 2;
            Some(Color::Indexed(index.min(255) as u8))
        }
        Some(2) => {
            let r = params.get(*i + 2).copied()?.min(255) as u8;
            let g = params.get(*i + 3).copied()?.min(255) as u8;
            let b = params.get(*i + 4).copied()?.min(255) as u8;
            *i += 4;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}

/// Rejoin an OSC payload that was split on `;` (titles may contain it).
fn join_osc_payload(parts: &[&[u8]]) -> String {
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push(';');
        }
        out.push_str(&String::from_utf8_lossy(part));
    }
    out
}
