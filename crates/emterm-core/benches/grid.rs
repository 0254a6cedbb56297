//! Grid and parser benchmarks.
//!
//! Run with: cargo bench --package emterm-core --bench grid

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use emterm_core::{Grid, Terminal, TerminalOptions};

fn bench_grid_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_write");

    let sizes = [(24u16, 80u16), (50, 132), (100, 200)];

    for (rows, cols) in sizes {
        let name = format!("{rows}x{cols}");
        let chars_per_screen = u64::from(rows) * u64::from(cols);
        group.throughput(Throughput::Elements(chars_per_screen));

        group.bench_with_input(
            BenchmarkId::new("write_char_wrap", &name),
            &(rows, cols),
            |b, &(rows, cols)| {
                b.iter(|| {
                    let mut grid = Grid::new(rows, cols);
                    for _ in 0..(u32::from(rows) * u32::from(cols) * 2) {
                        grid.write_char_wrap(black_box('X'), 1, false);
                    }
                    grid.cursor_row()
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("scroll_full_screen", &name),
            &(rows, cols),
            |b, &(rows, cols)| {
                b.iter(|| {
                    let mut grid = Grid::with_scrollback(rows, cols, 1000);
                    for _ in 0..rows {
                        grid.scroll_region_up(1);
                    }
                    grid.scrollback().map_or(0, |s| s.len())
                });
            },
        );
    }

    group.finish();
}

fn bench_terminal_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("terminal_process");

    // Plain ASCII stream.
    let ascii: Vec<u8> = b"The quick brown fox jumps over the lazy dog. \r\n"
        .iter()
        .copied()
        .cycle()
        .take(64 * 1024)
        .collect();

    // Heavily styled stream (SGR on every word).
    let mut styled = Vec::with_capacity(64 * 1024);
    while styled.len() < 64 * 1024 {
        styled.extend_from_slice(b"\x1b[1;31mred\x1b[0m \x1b[38;5;42mgreen\x1b[0m \r\n");
    }

    for (label, input) in [("ascii", &ascii), ("styled", &styled)] {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("write", label), input, |b, input| {
            b.iter(|| {
                let mut term = Terminal::new(TerminalOptions::default());
                term.open().ok();
                term.write(black_box(input)).ok();
                term.grid().cursor_row()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_grid_write, bench_terminal_process);
criterion_main!(benches);
