use std::collections::BTreeSet;

use crate::core::board::{Board, CellCoord};

/// Full rows and columns found on a board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineClear {
    /// Number of full lines, counted once per axis.
    pub lines: usize,
    /// Distinct cells belonging to at least one full line.
    pub cells: BTreeSet<CellCoord>,
}

impl LineClear {
    #[must_use]
    pub fn blocks(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }
}

/// Finds every completely occupied column and row.
///
/// A cell at the crossing of a full row and a full column is counted once in
/// [`LineClear::cells`] while both lines count towards [`LineClear::lines`].
/// Each axis is measured against its own length.
#[must_use]
pub fn detect_full_lines(board: &Board) -> LineClear {
    let mut clear = LineClear::default();

    for x in 0..board.cols() {
        if board.column_fill(x) == board.rows() {
            clear.lines += 1;
            clear.cells.extend((0..board.rows()).map(|y| CellCoord::new(x, y)));
        }
    }

    for y in 0..board.rows() {
        if board.row_fill(y) == board.cols() {
            clear.lines += 1;
            clear.cells.extend((0..board.cols()).map(|x| CellCoord::new(x, y)));
        }
    }

    clear
}
