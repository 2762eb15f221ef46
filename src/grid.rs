//! Grid navigation.
//!
//! The [`GridNav`] struct lays `count` items out row-major in rows of
//! `columns` cells and moves a selected index across that layout.  Moves
//! never wrap: a move that would leave the grid is a no-op.  Only the 1-D
//! [`next`](GridNav::next) / [`previous`](GridNav::previous) cycle wraps.

use crate::item::Direction;

/// Columns per row for `count` items, given the configured maximum.
///
/// Always at least 1, so row/column arithmetic never divides by zero.
pub fn columns_for(count: usize, configured_max: usize) -> usize {
    count.min(configured_max).max(1)
}

/// Row-major grid over a fixed number of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridNav {
    count: usize,
    columns: usize,
}

impl GridNav {
    /// Create a grid for `count` items with at most `configured_max` columns.
    pub fn new(count: usize, configured_max: usize) -> Self {
        Self {
            count,
            columns: columns_for(count, configured_max),
        }
    }

    /// Grid dimensions as `(columns, rows)`.
    pub fn dimensions(&self) -> (usize, usize) {
        let rows = if self.count == 0 {
            0
        } else {
            self.count.div_ceil(self.columns)
        };
        (self.columns, rows)
    }

    /// Number of columns per row.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Position of `index` as `(col, row)`.
    pub fn position(&self, index: usize) -> (usize, usize) {
        (index % self.columns, index / self.columns)
    }

    /// Move one cell in `direction`.
    ///
    /// Returns the new index, or `None` when the move would leave the grid.
    pub fn go(&self, index: usize, direction: Direction) -> Option<usize> {
        if index >= self.count {
            return None;
        }
        let (col, _) = self.position(index);
        match direction {
            Direction::Up => index.checked_sub(self.columns),
            Direction::Down => {
                let next = index + self.columns;
                (next < self.count).then_some(next)
            }
            Direction::Left => (col > 0).then(|| index - 1),
            Direction::Right => {
                (col < self.columns - 1 && index + 1 < self.count).then_some(index + 1)
            }
        }
    }

    /// Next index in the 1-D cycle.
    pub fn next(&self, index: usize) -> usize {
        if self.count == 0 {
            return 0;
        }
        (index + 1) % self.count
    }

    /// Previous index in the 1-D cycle.
    pub fn previous(&self, index: usize) -> usize {
        if self.count == 0 {
            return 0;
        }
        (index + self.count - 1) % self.count
    }
}

//  Tests
