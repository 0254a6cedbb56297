//! Integration tests for terminal byte-stream processing.
//!
//! These tests exercise the full pipeline from input bytes to grid
//! output, validating that the terminal correctly interprets ANSI/VT
//! sequences.
//!
//! ## Test Categories
//!
//! - Basic text output, wrapping, and wide characters
//! - Cursor movement (CUP, CUU, CUD, CUF, CUB, VPA, CHA)
//! - SGR colors and styles
//! - Scroll regions (DECSTBM) and scrollback
//! - Erase operations (ED, EL, ECH) and line/char editing (IL, DL, ICH, DCH)
//! - Modes (DECAWM, IRM, DECOM, DECTCEM, alternate screen)
//! - Tab stops
//! - Resize behavior

use crate::grid::{AttrFlags, Cell, Color};
use crate::terminal::{Terminal, TerminalOptions};

/// Build an opened terminal of the given size.
fn term(rows: u16, cols: u16) -> Terminal {
    let mut term = Terminal::new(TerminalOptions {
        rows,
        cols,
        ..TerminalOptions::default()
    });
    term.open().unwrap();
    term
}

/// Helper to extract grid content as trimmed lines.
fn grid_lines(term: &Terminal) -> Vec<String> {
    term.grid()
        .visible_content()
        .lines()
        .map(|s| s.trim_end().to_string())
        .collect()
}

/// Helper to get a single line from the grid.
fn grid_line(term: &Terminal, row: usize) -> String {
    grid_lines(term).get(row).cloned().unwrap_or_default()
}

fn cell_at(term: &Terminal, row: u16, col: u16) -> Cell {
    term.grid().cell(row, col).copied().unwrap_or_default()
}

// ============================================================================
// Basic Text Output
// ============================================================================

#[test]
fn plain_write_moves_cursor_and_marks_dirty() {
    let mut t = term(24, 80);
    t.take_dirty();
    t.write(b"Hello").unwrap();

    assert_eq!(grid_line(&t, 0), "Hello");
    assert_eq!(t.grid().cursor_col(), 5);
    assert_eq!(t.grid().cursor_row(), 0);
    assert!(t.take_dirty().contains(&0));
}

#[test]
fn crlf_moves_to_start_of_next_line() {
    let mut t = term(24, 80);
    t.write(b"Line 1\r\nLine 2\r\nLine 3").unwrap();

    assert_eq!(grid_line(&t, 0), "Line 1");
    assert_eq!(grid_line(&t, 1), "Line 2");
    assert_eq!(grid_line(&t, 2), "Line 3");
}

#[test]
fn lf_alone_keeps_column() {
    let mut t = term(24, 80);
    t.write(b"abc\ndef").unwrap();

    assert_eq!(grid_line(&t, 0), "abc");
    assert_eq!(grid_line(&t, 1), "   def");
}

#[test]
fn carriage_return_overwrites_from_column_zero() {
    let mut t = term(24, 80);
    t.write(b"XXXXXX\rHello").unwrap();

    assert_eq!(grid_line(&t, 0), "HelloX");
}

#[test]
fn backspace_moves_cursor_left() {
    let mut t = term(24, 80);
    t.write(b"ABC\x08X").unwrap();

    assert_eq!(grid_line(&t, 0), "ABX");
}

#[test]
fn line_wrapping_on_narrow_terminal() {
    let mut t = term(24, 10);
    t.write(b"1234567890ABCDE").unwrap();

    assert_eq!(grid_line(&t, 0), "1234567890");
    assert_eq!(grid_line(&t, 1), "ABCDE");
    assert!(t.grid().row(0).is_some_and(crate::grid::Row::is_wrapped));
}

#[test]
fn pending_wrap_boundary() {
    let mut t = term(24, 5);
    t.write(b"ABCDA").unwrap();
    // Cursor stays on the last column with the wrap pending.
    assert_eq!(t.grid().cursor_col(), 4);
    assert!(t.grid().cursor().pending_wrap);

    t.write(b"B").unwrap();
    assert_eq!(t.grid().cursor_row(), 1);
    assert_eq!(cell_at(&t, 1, 0).cp, 'B');
}

#[test]
fn utf8_text_renders() {
    let mut t = term(24, 80);
    t.write("héllo wörld".as_bytes()).unwrap();
    assert_eq!(grid_line(&t, 0), "héllo wörld");
}

#[test]
fn invalid_utf8_becomes_replacement() {
    let mut t = term(24, 80);
    t.write(b"a\xc3(z").unwrap();
    assert!(grid_line(&t, 0).contains('\u{FFFD}'));
    assert!(grid_line(&t, 0).ends_with("(z"));
}

#[test]
fn utf8_split_across_writes() {
    let mut t = term(24, 80);
    let bytes = "あ".as_bytes();
    t.write(&bytes[..1]).unwrap();
    t.write(&bytes[1..]).unwrap();
    assert_eq!(cell_at(&t, 0, 0).cp, 'あ');
}

// ============================================================================
// Wide Characters and Combining Marks
// ============================================================================

#[test]
fn wide_char_occupies_two_columns() {
    let mut t = term(24, 80);
    t.write("日本".as_bytes()).unwrap();

    assert_eq!(cell_at(&t, 0, 0).cp, '日');
    assert!(cell_at(&t, 0, 1).is_spacer());
    assert_eq!(cell_at(&t, 0, 2).cp, '本');
    assert!(cell_at(&t, 0, 3).is_spacer());
    assert_eq!(t.grid().cursor_col(), 4);
}

#[test]
fn wide_char_wraps_at_margin_without_splitting() {
    let mut t = term(24, 5);
    t.write("AAAA待".as_bytes()).unwrap();

    assert_eq!(cell_at(&t, 0, 4).cp, ' ');
    assert_eq!(cell_at(&t, 1, 0).cp, '待');
    assert!(cell_at(&t, 1, 1).is_spacer());
}

#[test]
fn combining_mark_attaches_to_previous_cell() {
    let mut t = term(24, 80);
    t.write("e\u{0301}x".as_bytes()).unwrap();

    assert_eq!(t.grid().cursor_col(), 2);
    assert_eq!(
        t.grid().row(0).map(|r| r.combining_at(0).to_vec()),
        Some(vec!['\u{0301}'])
    );
    assert_eq!(grid_line(&t, 0), "e\u{0301}x");
}

#[test]
fn overwrite_wide_half_blanks_partner() {
    let mut t = term(24, 80);
    t.write("間".as_bytes()).unwrap();
    t.write(b"\x1b[1;2Hx").unwrap();

    assert_eq!(cell_at(&t, 0, 0).cp, ' ');
    assert_eq!(cell_at(&t, 0, 1).cp, 'x');
}

// ============================================================================
// Cursor Movement
// ============================================================================

#[test]
fn cup_moves_cursor_one_based() {
    let mut t = term(24, 80);
    t.write(b"\x1b[3;5HX").unwrap();

    assert_eq!(cell_at(&t, 2, 4).cp, 'X');
}

#[test]
fn cup_defaults_to_home() {
    let mut t = term(24, 80);
    t.write(b"Some text\x1b[HX").unwrap();

    assert_eq!(t.grid().cursor_row(), 0);
    assert_eq!(t.grid().cursor_col(), 1);
    assert_eq!(cell_at(&t, 0, 0).cp, 'X');
}

#[test]
fn relative_moves_clamp_at_edges() {
    let mut t = term(24, 80);
    t.write(b"\x1b[5;5H\x1b[2A").unwrap();
    assert_eq!(t.grid().cursor_row(), 2);
    t.write(b"\x1b[99A").unwrap();
    assert_eq!(t.grid().cursor_row(), 0);
    t.write(b"\x1b[99B").unwrap();
    assert_eq!(t.grid().cursor_row(), 23);
    t.write(b"\x1b[99C").unwrap();
    assert_eq!(t.grid().cursor_col(), 79);
    t.write(b"\x1b[99D").unwrap();
    assert_eq!(t.grid().cursor_col(), 0);
}

#[test]
fn zero_params_mean_one() {
    let mut t = term(24, 80);
    t.write(b"\x1b[5;5H\x1b[0A").unwrap();
    assert_eq!(t.grid().cursor_row(), 3);
}

#[test]
fn vpa_and_cha_absolute_positioning() {
    let mut t = term(24, 80);
    t.write(b"\x1b[10G").unwrap();
    assert_eq!(t.grid().cursor_col(), 9);
    t.write(b"\x1b[7d").unwrap();
    assert_eq!(t.grid().cursor_row(), 6);
    assert_eq!(t.grid().cursor_col(), 9);
}

#[test]
fn cnl_cpl_move_and_return() {
    let mut t = term(24, 80);
    t.write(b"\x1b[5;10H\x1b[2E").unwrap();
    assert_eq!((t.grid().cursor_row(), t.grid().cursor_col()), (6, 0));
    t.write(b"\x1b[5;10H\x1b[2F").unwrap();
    assert_eq!((t.grid().cursor_row(), t.grid().cursor_col()), (2, 0));
}

#[test]
fn decsc_decrc_restores_position_and_sgr() {
    let mut t = term(24, 80);
    t.write(b"\x1b[5;10H\x1b[1;31m\x1b7").unwrap();
    t.write(b"\x1b[H\x1b[0m").unwrap();
    assert_eq!((t.grid().cursor_row(), t.grid().cursor_col()), (0, 0));

    t.write(b"\x1b8").unwrap();
    assert_eq!((t.grid().cursor_row(), t.grid().cursor_col()), (4, 9));
    let attrs = t.grid().attrs();
    assert!(attrs.flags.contains(AttrFlags::BOLD));
    assert_eq!(attrs.fg, Color::Indexed(1));
}

#[test]
fn ansi_save_restore_cursor() {
    let mut t = term(24, 80);
    t.write(b"\x1b[12;20H\x1b[s\x1b[H\x1b[u").unwrap();
    assert_eq!((t.grid().cursor_row(), t.grid().cursor_col()), (11, 19));
}

// ============================================================================
// SGR
// ============================================================================

#[test]
fn sgr_bold_red_then_reset() {
    let mut t = term(24, 80);
    t.write(b"\x1b[1;31mRed\x1b[0m!").unwrap();

    for col in 0..3 {
        let cell = cell_at(&t, 0, col);
        assert!(cell.attrs.flags.contains(AttrFlags::BOLD));
        assert_eq!(cell.attrs.fg, Color::Indexed(1));
    }
    let bang = cell_at(&t, 0, 3);
    assert_eq!(bang.cp, '!');
    assert!(bang.attrs.is_default());
}

#[test]
fn sgr_all_flags_set_and_clear() {
    let cases: &[(u16, u16, AttrFlags)] = &[
        (1, 22, AttrFlags::BOLD),
        (2, 22, AttrFlags::DIM),
        (3, 23, AttrFlags::ITALIC),
        (4, 24, AttrFlags::UNDERLINE),
        (5, 25, AttrFlags::BLINK),
        (7, 27, AttrFlags::INVERSE),
        (8, 28, AttrFlags::HIDDEN),
        (9, 29, AttrFlags::STRIKETHROUGH),
    ];
    for &(set, clear, flag) in cases {
        let mut t = term(4, 10);
        t.write(format!("\x1b[{set}m").as_bytes()).unwrap();
        assert!(t.grid().attrs().flags.contains(flag), "set {set}");
        t.write(format!("\x1b[{clear}m").as_bytes()).unwrap();
        assert!(!t.grid().attrs().flags.contains(flag), "clear {clear}");
    }
}

#[test]
fn sgr_empty_is_reset() {
    let mut t = term(24, 80);
    t.write(b"\x1b[1;4;31m\x1b[m").unwrap();
    assert!(t.grid().attrs().is_default());
}

#[test]
fn sgr_bright_and_background_colors() {
    let mut t = term(24, 80);
    t.write(b"\x1b[94;41mX").unwrap();
    let cell = cell_at(&t, 0, 0);
    assert_eq!(cell.attrs.fg, Color::Indexed(12));
    assert_eq!(cell.attrs.bg, Color::Indexed(1));
}

#[test]
fn sgr_256_color() {
    let mut t = term(24, 80);
    t.write(b"\x1b[38;5;196m\x1b[48;5;21mX").unwrap();
    let cell = cell_at(&t, 0, 0);
    assert_eq!(cell.attrs.fg, Color::Indexed(196));
    assert_eq!(cell.attrs.bg, Color::Indexed(21));
}

#[test]
fn sgr_true_color() {
    let mut t = term(24, 80);
    t.write(b"\x1b[38;2;10;20;30mX").unwrap();
    assert_eq!(cell_at(&t, 0, 0).attrs.fg, Color::Rgb(10, 20, 30));
}

#[test]
fn sgr_colon_form_256_color() {
    let mut t = term(24, 80);
    t.write(b"\x1b[38:5:100mX").unwrap();
    assert_eq!(cell_at(&t, 0, 0).attrs.fg, Color::Indexed(100));
}

#[test]
fn sgr_default_fg_bg_reset_colors_only() {
    let mut t = term(24, 80);
    t.write(b"\x1b[1;31;41m\x1b[39;49m").unwrap();
    let attrs = t.grid().attrs();
    assert_eq!(attrs.fg, Color::Default);
    assert_eq!(attrs.bg, Color::Default);
    assert!(attrs.flags.contains(AttrFlags::BOLD));
}

#[test]
fn sgr_unknown_params_skipped() {
    let mut t = term(24, 80);
    t.write(b"\x1b[1;99;31m").unwrap();
    let attrs = t.grid().attrs();
    assert!(attrs.flags.contains(AttrFlags::BOLD));
    assert_eq!(attrs.fg, Color::Indexed(1));
}

#[test]
fn sgr_overflow_color_values_clamp() {
    let mut t = term(24, 80);
    t.write(b"\x1b[38;2;999;999;999mX").unwrap();
    assert_eq!(cell_at(&t, 0, 0).attrs.fg, Color::Rgb(255, 255, 255));
}

#[test]
fn sgr_style_persists_across_lines() {
    let mut t = term(24, 80);
    t.write(b"\x1b[32mab\r\ncd").unwrap();
    assert_eq!(cell_at(&t, 1, 1).attrs.fg, Color::Indexed(2));
}

// ============================================================================
// Erase Operations
// ============================================================================

#[test]
fn clear_and_home() {
    let mut t = term(24, 80);
    t.write(b"dirty screen\r\nmore").unwrap();
    t.take_dirty();
    t.write(b"\x1b[2J\x1b[H").unwrap();

    for line in grid_lines(&t) {
        assert_eq!(line, "");
    }
    assert_eq!((t.grid().cursor_row(), t.grid().cursor_col()), (0, 0));
    assert_eq!(t.take_dirty().len(), 24);
}

#[test]
fn erase_below_and_above() {
    let mut t = term(5, 10);
    t.write(b"aaa\r\nbbb\r\nccc\r\nddd\r\neee").unwrap();
    t.write(b"\x1b[3;2H\x1b[0J").unwrap();
    assert_eq!(grid_line(&t, 1), "bbb");
    assert_eq!(grid_line(&t, 2), "c");
    assert_eq!(grid_line(&t, 3), "");

    let mut t = term(5, 10);
    t.write(b"aaa\r\nbbb\r\nccc\r\nddd\r\neee").unwrap();
    t.write(b"\x1b[3;2H\x1b[1J").unwrap();
    assert_eq!(grid_line(&t, 0), "");
    assert_eq!(grid_line(&t, 2), "  c");
    assert_eq!(grid_line(&t, 3), "ddd");
}

#[test]
fn erase_in_line_variants() {
    let mut t = term(4, 10);
    t.write(b"0123456789\x1b[1;5H\x1b[K").unwrap();
    assert_eq!(grid_line(&t, 0), "0123");

    let mut t = term(4, 10);
    t.write(b"0123456789\x1b[1;5H\x1b[1K").unwrap();
    assert_eq!(grid_line(&t, 0), "     56789");

    let mut t = term(4, 10);
    t.write(b"0123456789\x1b[1;5H\x1b[2K").unwrap();
    assert_eq!(grid_line(&t, 0), "");
}

#[test]
fn erase_uses_current_background_only() {
    let mut t = term(4, 10);
    t.write(b"\x1b[1;31;44m\x1b[2J").unwrap();
    let cell = cell_at(&t, 2, 3);
    assert_eq!(cell.cp, ' ');
    assert_eq!(cell.attrs.bg, Color::Indexed(4));
    assert_eq!(cell.attrs.fg, Color::Default);
    assert!(cell.attrs.flags.is_empty());
}

#[test]
fn erase_characters_ech() {
    let mut t = term(4, 10);
    t.write(b"0123456789\x1b[1;3H\x1b[4X").unwrap();
    assert_eq!(grid_line(&t, 0), "01    6789");
    // ECH does not move the cursor.
    assert_eq!(t.grid().cursor_col(), 2);
}

#[test]
fn insert_and_delete_characters() {
    let mut t = term(4, 10);
    t.write(b"ABCDEF\x1b[1;2H\x1b[2@").unwrap();
    assert_eq!(grid_line(&t, 0), "A  BCDEF");

    t.write(b"\x1b[1;2H\x1b[2P").unwrap();
    assert_eq!(grid_line(&t, 0), "ABCDEF");
}

#[test]
fn insert_and_delete_lines() {
    let mut t = term(5, 10);
    t.write(b"one\r\ntwo\r\nthree").unwrap();
    t.write(b"\x1b[2;1H\x1b[L").unwrap();
    assert_eq!(grid_line(&t, 0), "one");
    assert_eq!(grid_line(&t, 1), "");
    assert_eq!(grid_line(&t, 2), "two");

    t.write(b"\x1b[M").unwrap();
    assert_eq!(grid_line(&t, 1), "two");
    assert_eq!(grid_line(&t, 2), "three");
}

// ============================================================================
// Scroll Regions and Scrollback
// ============================================================================

#[test]
fn scroll_region_confines_linefeed() {
    let mut t = term(6, 10);
    for i in 0..6 {
        t.write(format!("\x1b[{};1Hr{i}", i + 1).as_bytes()).unwrap();
    }
    // Region rows 2-4 (1-based), cursor homes after DECSTBM.
    t.write(b"\x1b[2;4r").unwrap();
    assert_eq!((t.grid().cursor_row(), t.grid().cursor_col()), (0, 0));

    // LF at the region bottom scrolls only the region.
    t.write(b"\x1b[4;1H\n").unwrap();
    assert_eq!(grid_line(&t, 0), "r0");
    assert_eq!(grid_line(&t, 1), "r2");
    assert_eq!(grid_line(&t, 2), "r3");
    assert_eq!(grid_line(&t, 3), "");
    assert_eq!(grid_line(&t, 4), "r4");
    assert_eq!(grid_line(&t, 5), "r5");
}

#[test]
fn scroll_region_reverse_index() {
    let mut t = term(6, 10);
    for i in 0..6 {
        t.write(format!("\x1b[{};1Hr{i}", i + 1).as_bytes()).unwrap();
    }
    t.write(b"\x1b[2;4r\x1b[2;1H\x1bM").unwrap();
    assert_eq!(grid_line(&t, 0), "r0");
    assert_eq!(grid_line(&t, 1), "");
    assert_eq!(grid_line(&t, 2), "r1");
    assert_eq!(grid_line(&t, 3), "r2");
    assert_eq!(grid_line(&t, 4), "r4");
}

#[test]
fn su_sd_scroll_region() {
    let mut t = term(4, 10);
    t.write(b"a\r\nb\r\nc\r\nd").unwrap();
    t.write(b"\x1b[2S").unwrap();
    assert_eq!(grid_line(&t, 0), "c");
    assert_eq!(grid_line(&t, 1), "d");

    t.write(b"\x1b[1T").unwrap();
    assert_eq!(grid_line(&t, 0), "");
    assert_eq!(grid_line(&t, 1), "c");
}

#[test]
fn scrolled_lines_enter_scrollback() {
    let mut t = term(3, 10);
    t.write(b"one\r\ntwo\r\nthree\r\nfour\r\nfive").unwrap();
    assert_eq!(t.scrollback_len(), 2);
    assert_eq!(
        t.scrollback_line_at(0).map(|r| r.text().trim_end().to_string()),
        Some("one".into())
    );
    assert_eq!(
        t.scrollback_line_at(1).map(|r| r.text().trim_end().to_string()),
        Some("two".into())
    );
}

#[test]
fn scrollback_capacity_is_strict() {
    let mut t = Terminal::new(TerminalOptions {
        rows: 2,
        cols: 8,
        scrollback: 3,
        ..TerminalOptions::default()
    });
    t.open().unwrap();
    for i in 0..10 {
        t.write(format!("l{i}\r\n").as_bytes()).unwrap();
    }
    assert_eq!(t.scrollback_len(), 3);
}

#[test]
fn ed3_clears_scrollback_keeps_screen() {
    let mut t = term(3, 10);
    t.write(b"one\r\ntwo\r\nthree\r\nfour").unwrap();
    assert!(t.scrollback_len() > 0);
    let before = grid_lines(&t);
    t.write(b"\x1b[3J").unwrap();
    assert_eq!(t.scrollback_len(), 0);
    assert_eq!(grid_lines(&t), before);
}

// ============================================================================
// Modes
// ============================================================================

#[test]
fn decawm_off_clamps_at_margin() {
    let mut t = term(24, 5);
    t.write(b"\x1b[?7l").unwrap();
    t.write(b"ABCDEFG").unwrap();
    // Overwrites at the last column instead of wrapping.
    assert_eq!(grid_line(&t, 0), "ABCDG");
    assert_eq!(t.grid().cursor_row(), 0);
    t.write(b"\x1b[?7h").unwrap();
    assert!(t.modes().auto_wrap);
}

#[test]
fn insert_mode_shifts_existing_text() {
    let mut t = term(4, 10);
    t.write(b"ABC\x1b[1;1H\x1b[4hXY\x1b[4l").unwrap();
    assert_eq!(grid_line(&t, 0), "XYABC");
    assert!(!t.modes().insert);
}

#[test]
fn origin_mode_homes_into_region() {
    let mut t = term(24, 80);
    t.write(b"\x1b[5;20r\x1b[?6h\x1b[HX").unwrap();
    assert_eq!(cell_at(&t, 4, 0).cp, 'X');
    // CUP is confined to the region while origin mode is on.
    t.write(b"\x1b[99;1H").unwrap();
    assert_eq!(t.grid().cursor_row(), 19);
    t.write(b"\x1b[?6l\x1b[H").unwrap();
    assert_eq!(t.grid().cursor_row(), 0);
}

#[test]
fn cursor_visibility_toggle() {
    let mut t = term(24, 80);
    assert!(t.cursor_snapshot().visible);
    t.write(b"\x1b[?25l").unwrap();
    assert!(!t.cursor_snapshot().visible);
    t.write(b"\x1b[?25h").unwrap();
    assert!(t.cursor_snapshot().visible);
}

#[test]
fn app_cursor_and_bracketed_paste_flags() {
    let mut t = term(24, 80);
    t.write(b"\x1b[?1h\x1b[?2004h").unwrap();
    assert!(t.modes().app_cursor_keys);
    assert!(t.modes().bracketed_paste);
    t.write(b"\x1b[?1l\x1b[?2004l").unwrap();
    assert!(!t.modes().app_cursor_keys);
    assert!(!t.modes().bracketed_paste);
}

// ============================================================================
// Alternate Screen
// ============================================================================

#[test]
fn alt_screen_1049_round_trip() {
    let mut t = term(24, 80);
    t.write(b"primary content\x1b[5;10H").unwrap();
    let before = grid_lines(&t);

    t.write(b"\x1b[?1049h").unwrap();
    // Alternate starts cleared; the cursor position carries over.
    assert!(grid_lines(&t).iter().all(String::is_empty));
    assert_eq!((t.grid().cursor_row(), t.grid().cursor_col()), (4, 9));
    t.write(b"\x1b[Halt stuff").unwrap();
    assert_eq!(grid_line(&t, 0), "alt stuff");

    t.write(b"\x1b[?1049l").unwrap();
    assert_eq!(grid_lines(&t), before);
    assert_eq!((t.grid().cursor_row(), t.grid().cursor_col()), (4, 9));
}

#[test]
fn alt_screen_does_not_feed_scrollback() {
    let mut t = term(3, 10);
    t.write(b"\x1b[?1049h").unwrap();
    for i in 0..10 {
        t.write(format!("x{i}\r\n").as_bytes()).unwrap();
    }
    assert_eq!(t.scrollback_len(), 0);
    t.write(b"\x1b[?1049l").unwrap();
}

#[test]
fn alt_screen_47_variant_keeps_cursor() {
    let mut t = term(24, 80);
    t.write(b"\x1b[5;10H\x1b[?47h").unwrap();
    // Cursor position carries into the alternate screen.
    assert_eq!((t.grid().cursor_row(), t.grid().cursor_col()), (4, 9));
    t.write(b"\x1b[?47l").unwrap();
}

#[test]
fn alt_screen_switch_marks_all_dirty() {
    let mut t = term(24, 80);
    t.take_dirty();
    t.write(b"\x1b[?1049h").unwrap();
    assert_eq!(t.take_dirty().len(), 24);
}

// ============================================================================
// Tab Stops
// ============================================================================

#[test]
fn default_tab_stops_every_eight() {
    let mut t = term(24, 80);
    t.write(b"\tX").unwrap();
    assert_eq!(cell_at(&t, 0, 8).cp, 'X');
    t.write(b"\t").unwrap();
    assert_eq!(t.grid().cursor_col(), 16);
}

#[test]
fn hts_and_tbc() {
    let mut t = term(24, 80);
    // Clear all stops, set one at column 5.
    t.write(b"\x1b[3g\x1b[1;6H\x1bH\x1b[H\t").unwrap();
    assert_eq!(t.grid().cursor_col(), 5);
    // Tab past the only stop lands on the last column.
    t.write(b"\t").unwrap();
    assert_eq!(t.grid().cursor_col(), 79);
}

#[test]
fn cht_and_cbt() {
    let mut t = term(24, 80);
    t.write(b"\x1b[2I").unwrap();
    assert_eq!(t.grid().cursor_col(), 16);
    t.write(b"\x1b[Z").unwrap();
    assert_eq!(t.grid().cursor_col(), 8);
}

// ============================================================================
// C1 Controls and ESC Sequences
// ============================================================================

#[test]
fn c1_nel_and_ri() {
    let mut t = term(24, 80);
    t.write(b"ab\x85cd").unwrap();
    assert_eq!(grid_line(&t, 1), "cd");
    t.write(b"\x8d").unwrap();
    assert_eq!(t.grid().cursor_row(), 0);
}

#[test]
fn nel_moves_to_next_line_start() {
    let mut t = term(24, 80);
    t.write(b"ab\x1bEcd").unwrap();
    assert_eq!(grid_line(&t, 0), "ab");
    assert_eq!(grid_line(&t, 1), "cd");
}

#[test]
fn ind_moves_down_keeping_column() {
    let mut t = term(24, 80);
    t.write(b"ab\x1bDc").unwrap();
    assert_eq!(grid_line(&t, 1), "  c");
}

#[test]
fn decaln_fills_screen() {
    let mut t = term(3, 4);
    t.write(b"\x1b#8").unwrap();
    assert_eq!(grid_lines(&t), vec!["EEEE", "EEEE", "EEEE"]);
}

#[test]
fn ris_resets_everything() {
    let mut t = term(3, 10);
    t.write(b"\x1b[1;31mstuff\r\nmore\r\nyet\r\nmore").unwrap();
    assert!(t.scrollback_len() > 0);
    t.write(b"\x1bc").unwrap();

    assert_eq!(t.scrollback_len(), 0);
    assert!(t.grid().attrs().is_default());
    assert_eq!((t.grid().cursor_row(), t.grid().cursor_col()), (0, 0));
    for line in grid_lines(&t) {
        assert_eq!(line, "");
    }
}

#[test]
fn charset_designation_is_consumed() {
    let mut t = term(24, 80);
    t.write(b"\x1b(Bhello").unwrap();
    assert_eq!(grid_line(&t, 0), "hello");
}

// ============================================================================
// Malformed Input
// ============================================================================

#[test]
fn malformed_sequences_never_corrupt_state() {
    let mut t = term(24, 80);
    let attacks: &[&[u8]] = &[
        b"\x1b[99999999;99999999H",
        b"\x1b[-1;-1H",
        b"\x1b[100;1r",
        b"\x1b[;;;;;;;;m",
        b"\x1b[\x1b[\x1b[\x1b[",
        b"\x1b]0;unterminated",
        b"\xc0\xaf\x80\x80",
        b"\x1b[99999999L\x1b[99999999@",
    ];
    for attack in attacks {
        t.write(attack).unwrap();
    }
    t.write(b"\x18still alive").unwrap();
    assert!(t.grid().visible_content().contains("still alive"));
}

#[test]
fn huge_cursor_position_clamps() {
    let mut t = term(24, 80);
    t.write(b"\x1b[99999999;99999999H").unwrap();
    assert_eq!(t.grid().cursor_row(), 23);
    assert_eq!(t.grid().cursor_col(), 79);
}

#[test]
fn inverted_scroll_region_is_ignored() {
    let mut t = term(24, 80);
    t.write(b"\x1b[10;5r").unwrap();
    let region = t.grid().scroll_region();
    assert_eq!((region.top, region.bottom), (0, 23));
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn resize_upward_preserves_content() {
    let mut t = term(24, 80);
    t.write(b"keep me").unwrap();
    t.resize(100, 30).unwrap();

    assert_eq!(t.dimensions(), (100, 30));
    assert_eq!(grid_line(&t, 0), "keep me");
    for r in 0..30 {
        assert_eq!(t.grid().row(r).map(crate::grid::Row::cols), Some(100));
    }
}

#[test]
fn resize_narrower_clips_lines() {
    let mut t = term(4, 10);
    t.write(b"0123456789").unwrap();
    t.resize(4, 4).unwrap();
    assert_eq!(grid_line(&t, 0), "0123");
}

#[test]
fn chunked_writes_equal_single_write() {
    let input: &[u8] = b"\x1b[1;31mhello\x1b[0m \x1b[4munder\x1b[24m\r\nnext line \x1b[38;5;42mcolor";
    let mut whole = term(24, 80);
    whole.write(input).unwrap();

    for split in 1..input.len() {
        let mut chunked = term(24, 80);
        chunked.write(&input[..split]).unwrap();
        chunked.write(&input[split..]).unwrap();
        assert_eq!(
            chunked.grid().visible_content(),
            whole.grid().visible_content(),
            "split at {split}"
        );
        assert_eq!(
            (chunked.grid().cursor_row(), chunked.grid().cursor_col()),
            (whole.grid().cursor_row(), whole.grid().cursor_col()),
            "split at {split}"
        );
    }
}

#[test]
fn full_grid_text_round_trips_plain_input() {
    let mut t = term(4, 10);
    t.write(b"alpha\r\nbeta\r\ngamma").unwrap();
    t.select_all();
    let text = t.selected_text().unwrap();
    let trimmed: Vec<&str> = text.lines().map(str::trim_end).collect();
    assert_eq!(trimmed, vec!["alpha", "beta", "gamma", ""]);
}
