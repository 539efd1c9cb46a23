use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use crate::{OutOfBoundsError, PieceCollisionError};

use super::piece::{ColourCode, EMPTY, Piece};

/// Coordinates of a single board cell.
///
/// `x` is the column (increasing rightward), `y` the row (increasing downward).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: usize,
    pub y: usize,
}

impl CellCoord {
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl From<(usize, usize)> for CellCoord {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

/// Fixed-size grid of colour-codes.
///
/// Every cell holds [`EMPTY`] or the colour-code of the piece kind occupying
/// it. The dimensions are fixed at construction.
///
/// # Example
///
/// ```
/// use blockgrid_engine::{Board, Piece, PieceKind};
///
/// let mut board = Board::new(5, 5);
/// let plus = Piece::new(PieceKind::Plus);
///
/// assert!(board.can_place(plus, 2, 2));
/// board.place(plus, 2, 2).unwrap();
/// assert_eq!(board.get(2, 1).unwrap(), plus.colour());
///
/// // The centre is now occupied
/// assert!(!board.can_place(plus, 2, 2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cols: usize,
    rows: usize,
    cells: Vec<ColourCode>,
}

impl Board {
    /// Creates an empty board.
    #[must_use]
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![EMPTY; cols * rows],
        }
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.cols && y < self.rows).then_some(y * self.cols + x)
    }

    /// Returns the colour-code at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Result<ColourCode, OutOfBoundsError> {
        self.index(x, y)
            .map(|i| self.cells[i])
            .ok_or(OutOfBoundsError {
                x,
                y,
                cols: self.cols,
                rows: self.rows,
            })
    }

    #[must_use]
    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_ok_and(|c| c != EMPTY)
    }

    /// Maps the occupied footprint cells of `piece` anchored at `(x, y)` to
    /// board coordinates.
    ///
    /// Yields `None` for a cell that falls outside the board.
    fn target_cells(
        &self,
        piece: Piece,
        x: usize,
        y: usize,
    ) -> impl Iterator<Item = Option<usize>> + '_ {
        piece
            .footprint()
            .occupied_offsets()
            .into_iter()
            .map(move |(dx, dy)| {
                let cx = x.checked_add(dx)?.checked_sub(1)?;
                let cy = y.checked_add(dy)?.checked_sub(1)?;
                self.index(cx, cy)
            })
    }

    /// Returns `true` if every occupied footprint cell lands on an empty cell
    /// inside the board.
    #[must_use]
    pub fn can_place(&self, piece: Piece, x: usize, y: usize) -> bool {
        self.target_cells(piece, x, y)
            .all(|i| i.is_some_and(|i| self.cells[i] == EMPTY))
    }

    /// Writes the piece colour into every occupied footprint cell.
    ///
    /// Leaves the board untouched and fails if [`can_place`](Self::can_place)
    /// does not hold.
    pub fn place(&mut self, piece: Piece, x: usize, y: usize) -> Result<(), PieceCollisionError> {
        if !self.can_place(piece, x, y) {
            return Err(PieceCollisionError);
        }
        let targets = self.target_cells(piece, x, y).flatten().collect::<Vec<_>>();
        for i in targets {
            self.cells[i] = piece.colour();
        }
        Ok(())
    }

    /// Empties every listed cell.
    ///
    /// All coordinates are validated before any cell is touched.
    pub fn clear<'a, I>(&mut self, coords: I) -> Result<(), OutOfBoundsError>
    where
        I: IntoIterator<Item = &'a CellCoord>,
        I::IntoIter: Clone,
    {
        let coords = coords.into_iter();
        for c in coords.clone() {
            self.get(c.x, c.y)?;
        }
        for c in coords {
            let i = c.y * self.cols + c.x;
            self.cells[i] = EMPTY;
        }
        Ok(())
    }

    /// Number of occupied cells in column `x`.
    #[must_use]
    pub fn column_fill(&self, x: usize) -> usize {
        (0..self.rows).filter(|&y| self.is_occupied(x, y)).count()
    }

    /// Number of occupied cells in row `y`.
    #[must_use]
    pub fn row_fill(&self, y: usize) -> usize {
        (0..self.cols).filter(|&x| self.is_occupied(x, y)).count()
    }

    /// Returns an iterator over the rows, top to bottom.
    pub fn rows_iter(&self) -> impl Iterator<Item = &[ColourCode]> {
        self.cells.chunks(self.cols.max(1)).take(self.rows)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|&c| c == EMPTY)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows_iter() {
            for &cell in row {
                if cell == EMPTY {
                    f.write_char('.')?;
                } else {
                    write!(f, "{cell:x}")?;
                }
            }
            f.write_char('\n')?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::PieceKind;

    use super::*;

    fn snapshot(board: &Board) -> Vec<ColourCode> {
        board.cells.clone()
    }

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new(5, 4);
        assert_eq!(board.cols(), 5);
        assert_eq!(board.rows(), 4);
        assert!(board.is_empty());
        for y in 0..4 {
            for x in 0..5 {
                assert_eq!(board.get(x, y).unwrap(), EMPTY);
            }
        }
    }

    #[test]
    fn test_get_out_of_bounds() {
        let board = Board::new(5, 5);
        let err = board.get(5, 0).unwrap_err();
        assert_eq!((err.x, err.y), (5, 0));
        assert!(board.get(0, 5).is_err());
        assert!(board.get(usize::MAX, usize::MAX).is_err());
    }

    #[test]
    fn test_place_writes_only_footprint_cells() {
        let mut board = Board::new(5, 5);
        let piece = Piece::new(PieceKind::Corner);
        let before = snapshot(&board);

        board.place(piece, 2, 2).unwrap();

        let expected = [(1, 2), (2, 2), (1, 3)];
        for y in 0..5 {
            for x in 0..5 {
                let cell = board.get(x, y).unwrap();
                if expected.contains(&(x, y)) {
                    assert_eq!(cell, piece.colour(), "({x}, {y})");
                } else {
                    assert_eq!(cell, before[y * 5 + x], "({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn test_can_place_respects_bounds() {
        let board = Board::new(5, 5);
        let plus = Piece::new(PieceKind::Plus);
        assert!(board.can_place(plus, 1, 1));
        assert!(board.can_place(plus, 3, 3));
        assert!(!board.can_place(plus, 0, 2));
        assert!(!board.can_place(plus, 2, 0));
        assert!(!board.can_place(plus, 4, 2));
        assert!(!board.can_place(plus, 2, 4));
        assert!(!board.can_place(plus, 10, 10));
    }

    #[test]
    fn test_anchor_near_usize_max_is_rejected() {
        let mut board = Board::new(5, 5);
        let before = board.clone();
        for kind in PieceKind::ALL {
            for turns in 0..4 {
                let piece = Piece::new(kind).rotated(turns);
                for (x, y) in [(usize::MAX, usize::MAX), (usize::MAX, 1), (1, usize::MAX)] {
                    assert!(!board.can_place(piece, x, y));
                    assert!(board.place(piece, x, y).is_err());
                }
            }
        }
        assert_eq!(board, before);
    }

    #[test]
    fn test_only_occupied_cells_need_to_be_inside() {
        let board = Board::new(5, 5);
        let dot = Piece::new(PieceKind::Dot);
        for y in 0..5 {
            for x in 0..5 {
                assert!(board.can_place(dot, x, y));
            }
        }
        // Line occupies only the middle footprint row
        let line = Piece::new(PieceKind::Line);
        assert!(board.can_place(line, 1, 0));
        assert!(board.can_place(line, 3, 4));
    }

    #[test]
    fn test_place_rejects_overlap_without_mutation() {
        let mut board = Board::new(5, 5);
        board.place(Piece::new(PieceKind::Dot), 2, 2).unwrap();
        let before = board.clone();

        let plus = Piece::new(PieceKind::Plus);
        assert!(!board.can_place(plus, 2, 2));
        assert!(board.place(plus, 2, 2).is_err());
        assert_eq!(board, before);

        // Out of bounds is rejected the same way
        assert!(board.place(plus, 0, 0).is_err());
        assert_eq!(board, before);
    }

    #[test]
    fn test_can_place_iff_place_succeeds() {
        let mut board = Board::new(5, 5);
        board.place(Piece::new(PieceKind::X), 2, 2).unwrap();

        for kind in PieceKind::ALL {
            for turns in 0..4 {
                let piece = Piece::new(kind).rotated(turns);
                for y in 0..6 {
                    for x in 0..6 {
                        let mut trial = board.clone();
                        let fits = board.can_place(piece, x, y);
                        assert_eq!(trial.place(piece, x, y).is_ok(), fits);
                        if !fits {
                            assert_eq!(trial, board);
                            continue;
                        }
                        let changed = (0..25)
                            .filter(|i| trial.cells[*i] != board.cells[*i])
                            .count();
                        assert_eq!(changed, piece.footprint().occupied_offsets().len());
                    }
                }
            }
        }
    }

    #[test]
    fn test_clear_cells() {
        let mut board = Board::new(5, 5);
        board.place(Piece::new(PieceKind::Plus), 2, 2).unwrap();
        board
            .clear(&[CellCoord::new(2, 1), CellCoord::new(2, 2)])
            .unwrap();
        assert_eq!(board.get(2, 1).unwrap(), EMPTY);
        assert_eq!(board.get(2, 2).unwrap(), EMPTY);
        assert!(board.is_occupied(1, 2));
        assert!(board.is_occupied(2, 3));
    }

    #[test]
    fn test_clear_out_of_bounds_is_atomic() {
        let mut board = Board::new(5, 5);
        board.place(Piece::new(PieceKind::Dot), 0, 0).unwrap();
        let before = board.clone();
        let result = board.clear(&[CellCoord::new(0, 0), CellCoord::new(9, 0)]);
        assert!(result.is_err());
        assert_eq!(board, before);
    }

    #[test]
    fn test_row_and_column_fill() {
        let mut board = Board::new(5, 5);
        board.place(Piece::new(PieceKind::Line), 2, 0).unwrap();
        assert_eq!(board.row_fill(0), 3);
        assert_eq!(board.column_fill(1), 1);
        assert_eq!(board.column_fill(4), 0);
    }

    #[test]
    fn test_display() {
        let mut board = Board::new(3, 2);
        board.place(Piece::new(PieceKind::Dot), 1, 0).unwrap();
        assert_eq!(board.to_string(), ".4.\n...\n");
    }
}
