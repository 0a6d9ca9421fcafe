// Code lints

#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]
#![warn(unreachable_pub)]
#![warn(unused_import_braces)]
#![warn(unused_lifetimes)]
#![warn(unused_qualifications)]

// Doc lints

#![warn(broken_intra_doc_links)]
#![warn(missing_docs)]
#![warn(missing_crate_level_docs)]
#![warn(invalid_codeblock_attributes)]

//! This crate implements a deduction engine for variant Sudoku. It supports
//! the following key features:
//!
//! * Grids of any size up to 63 digits, with rows, columns, boxes,
//! diagonals, arbitrary regions, and killer cages
//! * Logical solving in small, interruptible steps, using locked candidates,
//! naked and hidden subsets, (finned) fish, and innies and outies
//! * Bounded guessing (bifurcation) when pure logic stalls
//! * Counting and enumerating solutions with a Dancing Links exact cover
//! search
//! * A worker thread that runs both solvers off the caller's thread
//!
//! Note in this introduction we will mostly be using 4x4 Sudoku due to their
//! simpler nature. These are divided in 4 2x2 blocks, each with the digits 1
//! to 4, just like each row and column.
//!
//! # Building a puzzle
//!
//! A [Grid] is created with its box dimensions, and then its regions and
//! givens are entered. Every region is a set of cells which must contain
//! distinct digits. Regions with as many cells as there are digits (such as
//! rows) must contain every digit exactly once.
//!
//! ```
//! use sudoku_regions::Grid;
//!
//! let mut grid = Grid::new(2, 2).unwrap();
//! grid.define_standard_regions().unwrap();
//! grid.define_killer_cage(&[(0, 0), (0, 1)], 3).unwrap();
//! grid.add_given_cell(3, 3, 4).unwrap();
//!
//! // The cage only has the combination {1,2}.
//! assert_eq!(2, grid.options_get(0, 0).unwrap().len());
//! ```
//!
//! # Logical solving
//!
//! The grid keeps its regions consistent with the cells on its own and
//! queues every conclusion it draws as a [Progress]. A
//! [GridProgressManager](solver::GridProgressManager) applies those
//! deductions and runs the solving techniques until the puzzle is solved,
//! found unsolvable, or no technique makes progress anymore. Each call of
//! `next_step` only does a small amount of work, so the caller may stop at
//! any time.
//!
//! ```
//! use sudoku_regions::{Grid, SolverConfig};
//! use sudoku_regions::solver::{GridProgressManager, SolveStatus};
//!
//! // ╔═══╤═══╦═══╤═══╗
//! // ║ 1 │   ║   │   ║
//! // ╟───┼───╫───┼───╢
//! // ║   │   ║ 1 │ 2 ║
//! // ╠═══╪═══╬═══╪═══╣
//! // ║ 2 │   ║   │ 3 ║
//! // ╟───┼───╫───┼───╢
//! // ║   │ 3 ║   │   ║
//! // ╚═══╧═══╩═══╧═══╝
//! let mut grid = Grid::new(2, 2).unwrap();
//! grid.define_standard_regions().unwrap();
//!
//! for &(row, column, value) in [(0, 0, 1), (1, 2, 1), (1, 3, 2), (2, 0, 2),
//!         (2, 3, 3), (3, 1, 3)].iter() {
//!     grid.add_given_cell(row, column, value).unwrap();
//! }
//!
//! let mut manager = GridProgressManager::new(&SolverConfig::logic_only());
//!
//! while !manager.is_finished() {
//!     manager.next_step(&mut grid);
//! }
//!
//! assert_eq!(SolveStatus::Solved, manager.status());
//! ```
//!
//! # Brute force
//!
//! The [BruteForceSolver](exact_cover::BruteForceSolver) finds complete
//! solutions independently of the logical solver. This can be used to check
//! that a puzzle has a unique solution.
//!
//! ```
//! use sudoku_regions::Grid;
//! use sudoku_regions::exact_cover::{BruteForceSolver, SolutionCount};
//!
//! let mut grid = Grid::new(2, 2).unwrap();
//! grid.define_standard_regions().unwrap();
//! grid.add_given_cell(0, 0, 1).unwrap();
//!
//! let result = BruteForceSolver::new().generate_solutions(&grid, 2, false);
//! assert_eq!(SolutionCount::Ambiguous, result.solution_count());
//! ```
//!
//! # Logging
//!
//! The crate logs through the [log](https://docs.rs/log) facade. Applied
//! deductions are logged at debug level with the target `deduction`, the
//! outcome of a solve at info level. Techniques log their internals at trace
//! level with the targets `technique` and `bifurcation`.
//!
//! # Note regarding performance
//!
//! Bifurcation solves nested copies of the grid and can get expensive for
//! large depths. It is strongly recommended to use at least `opt-level = 2`,
//! even in tests.

pub mod cell;
pub mod config;
pub mod constraint;
pub mod engine;
pub mod error;
pub mod exact_cover;
pub mod grid;
pub mod progress;
pub mod region;
pub mod solver;
pub mod technique;
pub mod util;

mod journal;

pub use cell::{Cell, CellChange};
pub use config::SolverConfig;
pub use error::{SudokuError, SudokuResult};
pub use grid::Grid;
pub use progress::Progress;


#[cfg(test)]
mod scenario_tests;
