//! This module contains some error and result definitions used in this crate.
//!
//! Note that contradictions discovered while solving a puzzle are not errors
//! in this sense. They are represented as fatal [Progress](crate::Progress)
//! deductions and reported through the solver's status. The errors defined
//! here are raised when the caller uses the construction API incorrectly.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Miscellaneous errors that can occur when constructing or querying a
/// [Grid](crate::Grid) or one of the solvers operating on it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SudokuError {

    /// Indicates that the dimensions specified for a created grid are
    /// invalid. This is the case if they are less than 1 or if the resulting
    /// size exceeds the largest supported digit.
    InvalidDimensions,

    /// Indicates that some number is invalid for the size of the grid in
    /// question. This is the case if it is less than 1 or greater than the
    /// size.
    InvalidNumber,

    /// Indicates that the specified coordinates (column and row) lie outside
    /// the grid in question. This is the case if they are greater than or
    /// equal to the size.
    OutOfBounds,

    /// Indicates that a region was defined without any cells.
    EmptyRegion,

    /// Indicates that a region was defined with more cells than there are
    /// digits, so it cannot possibly contain each digit at most once.
    RegionTooLarge,

    /// Indicates that a region was defined which lists the same cell more
    /// than once.
    DuplicateCells,

    /// Indicates that a region was defined with the kind
    /// [Derived](crate::region::RegionKind::Derived) or
    /// [Ghost](crate::region::RegionKind::Ghost), which are reserved for
    /// regions the solver creates itself.
    InvalidRegionKind,

    /// Indicates that a killer cage was defined with a total that no
    /// combination of distinct digits of the cage's size reaches.
    InvalidCageTotal,

    /// Indicates that an operation which requires boxes (such as defining the
    /// standard regions) was called on a grid that was created without box
    /// dimensions.
    MissingBoxes,

    /// Indicates that the worker thread of a
    /// [SolverEngine](crate::engine::SolverEngine) has terminated and can no
    /// longer accept jobs.
    EngineStopped
}

impl Display for SudokuError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let message = match self {
            SudokuError::InvalidDimensions => "invalid grid dimensions",
            SudokuError::InvalidNumber => "number outside the grid's digits",
            SudokuError::OutOfBounds => "coordinates outside the grid",
            SudokuError::EmptyRegion => "region without cells",
            SudokuError::RegionTooLarge => "region has more cells than digits",
            SudokuError::DuplicateCells => "region lists a cell twice",
            SudokuError::InvalidRegionKind =>
                "region kind is reserved for derived regions",
            SudokuError::InvalidCageTotal =>
                "no digit combination reaches the cage total",
            SudokuError::MissingBoxes => "grid has no box dimensions",
            SudokuError::EngineStopped => "solver engine has stopped"
        };

        f.write_str(message)
    }
}

impl Error for SudokuError { }

/// Syntactic sugar for `Result<V, SudokuError>`.
pub type SudokuResult<V> = Result<V, SudokuError>;
