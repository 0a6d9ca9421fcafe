//! This module contains the [Cell] type, which holds the state of a single
//! cell of a [Grid](crate::Grid), and the [CellChange] notification that is
//! raised whenever that state changes.

use crate::util::DigitSet;

/// A single cell of the grid. Besides its position, it stores the digit that
/// was committed to it (if any), the digits that are still viable, and
/// whether it was given by the puzzle.
///
/// Cells are owned by the grid and can only be changed through its methods,
/// which keep the regions containing the cell up to date.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Cell {
    id: usize,
    row: usize,
    column: usize,
    value: usize,
    options: DigitSet,
    given: bool,
    hinted_eliminations: DigitSet
}

impl Cell {

    pub(crate) fn new(id: usize, row: usize, column: usize, size: usize)
            -> Cell {
        Cell {
            id,
            row,
            column,
            value: 0,
            options: DigitSet::range(size),
            given: false,
            hinted_eliminations: DigitSet::new()
        }
    }

    /// Gets the linear id of this cell, which is `row * size + column`.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Gets the row index of this cell.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Gets the column index of this cell.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Gets the digit committed to this cell, or 0 if it is not solved yet.
    pub fn value(&self) -> usize {
        self.value
    }

    /// Gets the digits that are still viable for this cell.
    pub fn options(&self) -> DigitSet {
        self.options
    }

    /// Indicates whether the value of this cell was given by the puzzle.
    pub fn is_given(&self) -> bool {
        self.given
    }

    /// Indicates whether a digit was committed to this cell.
    pub fn is_solved(&self) -> bool {
        self.value != 0
    }

    /// Gets the digits which the user has marked as eliminated in this cell.
    /// These hints do not take part in logical deduction, but can be used as
    /// constraints by the brute force solver.
    pub fn hinted_eliminations(&self) -> DigitSet {
        self.hinted_eliminations
    }

    pub(crate) fn set_value(&mut self, value: usize) {
        self.value = value;
    }

    pub(crate) fn set_options(&mut self, options: DigitSet) {
        self.options = options;
    }

    pub(crate) fn set_given(&mut self, given: bool) {
        self.given = given;
    }

    pub(crate) fn set_hinted_eliminations(&mut self, hints: DigitSet) {
        self.hinted_eliminations = hints;
    }
}

/// A notification about a committed change to a cell, passed to the observer
/// registered with [Grid::set_observer](crate::Grid::set_observer).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CellChange {

    /// The viable digits of the cell with the given linear id changed.
    Options {

        /// The linear id of the changed cell.
        cell: usize,

        /// The new set of viable digits.
        options: DigitSet
    },

    /// A digit was committed to the cell with the given linear id, or the
    /// committed digit was reset (in which case `value` is 0).
    Value {

        /// The linear id of the changed cell.
        cell: usize,

        /// The new value of the cell.
        value: usize
    }
}
