//! Row-major traversal of a `GridSpec`.
//!
//! The iterator is lazy, finite and restartable (call `GridSpec::cells` again),
//! and decouples traversal order from how results are stored.

use crate::domain::GridCell;
use crate::grid::GridSpec;

/// One step of the sweep: outer index, inner index, and the full input tuple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedCell {
    pub row: usize,
    pub col: usize,
    pub cell: GridCell,
}

/// Iterator over `(row, col, GridCell)` in row-major order.
#[derive(Debug, Clone)]
pub struct Cells<'a> {
    spec: &'a GridSpec,
    next: usize,
    end: usize,
}

impl GridSpec {
    pub fn cells(&self) -> Cells<'_> {
        Cells {
            spec: self,
            next: 0,
            end: self.total_cells(),
        }
    }

    /// Cells of a single outer row.
    pub fn row_cells(&self, row: usize) -> Cells<'_> {
        let cols = self.inner().len();
        let start = (row * cols).min(self.total_cells());
        Cells {
            spec: self,
            next: start,
            end: (start + cols).min(self.total_cells()),
        }
    }

    /// The input tuple at `(row, col)`.
    pub fn cell_at(&self, row: usize, col: usize) -> GridCell {
        let fixed = self.fixed();
        GridCell::from_inputs([
            (self.outer().kind(), self.outer().values()[row]),
            (self.inner().kind(), self.inner().values()[col]),
            (fixed.kinds[0], fixed.values[0]),
            (fixed.kinds[1], fixed.values[1]),
        ])
    }
}

impl Iterator for Cells<'_> {
    type Item = IndexedCell;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let cols = self.spec.inner().len();
        let (row, col) = (self.next / cols, self.next % cols);
        self.next += 1;
        Some(IndexedCell {
            row,
            col,
            cell: self.spec.cell_at(row, col),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end - self.next;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Cells<'_> {}

#[cfg(test)]
mod tests {
    use crate::domain::{Axis, InputKind};
    use crate::grid::GridSpec;

    fn small_spec() -> GridSpec {
        GridSpec::from_axes(
            Axis::new(InputKind::Temperature, vec![10.0, 20.0]),
            Axis::new(InputKind::CoolerPower, vec![0.0, 50.0, 100.0]),
            [0.0, 50.0],
        )
        .unwrap()
    }

    #[test]
    fn traversal_is_row_major() {
        let spec = small_spec();
        let order: Vec<(usize, usize)> = spec.cells().map(|c| (c.row, c.col)).collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
        assert_eq!(spec.cells().len(), 6);
    }

    #[test]
    fn cells_place_values_in_argument_order() {
        let spec = small_spec();
        let last = spec.cells().last().unwrap();
        assert_eq!(last.cell.values(), [20.0, 0.0, 100.0, 50.0]);
    }

    #[test]
    fn iterator_is_restartable() {
        let spec = small_spec();
        let a: Vec<_> = spec.cells().collect();
        let b: Vec<_> = spec.cells().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn row_cells_cover_one_row() {
        let spec = small_spec();
        let row: Vec<_> = spec.row_cells(1).map(|c| (c.row, c.col)).collect();
        assert_eq!(row, vec![(1, 0), (1, 1), (1, 2)]);
    }
}
