//! Parses ><> source text into a populated [`Grid`].

use crate::grid::Grid;

/// Parses `source` into a grid, one line per row, one `char` per column.
///
/// Lines are split the same way [`str::lines`] does (so a trailing
/// newline produces no extra empty row), and each line is walked by
/// Unicode scalar value, not by byte, so multi-byte glyphs occupy a
/// single column.
pub fn parse(source: &str) -> Grid {
    let mut grid = Grid::new();
    for (y, line) in source.lines().enumerate() {
        for (x, ch) in line.chars().enumerate() {
            grid.put(x as i64, y as i64, ch as u32);
        }
    }
    grid
}
