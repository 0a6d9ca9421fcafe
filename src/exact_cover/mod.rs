//! This module contains the brute force solver, which finds complete
//! solutions of a [Grid] by encoding it as an exact cover problem and
//! searching it with [DancingLinks].
//!
//! The brute force solver is independent of the logical solver. It only
//! looks at the regions as the puzzle defined them and the current options
//! of the cells, so it can be used to verify that a puzzle has a unique
//! solution or to count its solutions.
//!
//! ```
//! use sudoku_regions::Grid;
//! use sudoku_regions::exact_cover::{BruteForceSolver, SolutionCount};
//!
//! let mut grid = Grid::new(2, 2).unwrap();
//! grid.define_standard_regions().unwrap();
//!
//! let mut solver = BruteForceSolver::new();
//! let result = solver.generate_solutions(&grid, 1000, false);
//!
//! assert_eq!(288, result.solutions.len());
//! assert_eq!(SolutionCount::Ambiguous, result.solution_count());
//! ```

pub mod dancing_links;

use crate::grid::Grid;
use crate::util::DigitSet;

use dancing_links::DancingLinks;

use log::debug;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The meaning of one row of an [ExactCoverMatrix].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatrixRow {

    /// The row places `digit` in `cell`.
    Placement {

        /// The linear id of the cell.
        cell: usize,

        /// The placed digit.
        digit: usize
    },

    /// The row chooses the combination of digits which a killer cage
    /// contains.
    Combination {

        /// The index of the cage among the regions defined by the puzzle.
        region: usize,

        /// The digits of the combination.
        digits: DigitSet
    }
}

#[derive(Clone, Copy, Debug)]
enum Column {
    Primary(usize),
    Secondary(usize)
}

struct RegionLayout {
    digit_columns: Column,
    combinations: Option<(usize, Vec<DigitSet>)>
}

/// The exact cover encoding of a [Grid].
///
/// Every cell has a primary column which is covered by the row that places
/// a digit in it. Every region with as many cells as there are digits has a
/// primary column for each digit, as each digit must appear exactly once.
/// Smaller regions have secondary columns instead, so each digit appears at
/// most once.
///
/// A killer cage additionally has a primary column that is covered by
/// exactly one of its combination rows. A combination row covers the
/// secondary columns of all digits the combination does not contain, which
/// keeps those digits out of the cage.
#[derive(Clone, Debug)]
pub struct ExactCoverMatrix {
    links: DancingLinks,
    rows: Vec<MatrixRow>,
    cell_count: usize
}

impl ExactCoverMatrix {

    /// Builds the exact cover encoding of the given grid. Rows are only
    /// created for the current options of every cell, without the digits
    /// eliminated by hints if `use_hints` is `true`.
    pub fn new(grid: &Grid, use_hints: bool) -> ExactCoverMatrix {
        let size = grid.size();
        let cell_count = grid.cell_count();
        let mut primary = cell_count;
        let mut secondary = 0;
        let mut layouts = Vec::new();
        let mut regions_of_cell = vec![Vec::new(); cell_count];

        for (index, (cells, _, constraint)) in grid.definitions().enumerate() {
            let killer = constraint.and_then(|c| c.as_killer());
            let layout = if let Some(killer) = killer {
                let layout = RegionLayout {
                    digit_columns: Column::Secondary(secondary),
                    combinations: Some(
                        (primary, killer.combinations().to_vec()))
                };
                secondary += size;
                primary += 1;
                layout
            }
            else if cells.len() == size {
                primary += size;
                RegionLayout {
                    digit_columns: Column::Primary(primary - size),
                    combinations: None
                }
            }
            else {
                secondary += size;
                RegionLayout {
                    digit_columns: Column::Secondary(secondary - size),
                    combinations: None
                }
            };

            for &cell in cells {
                regions_of_cell[cell].push(index);
            }

            layouts.push(layout);
        }

        let resolve = |column: Column, offset: usize| match column {
            Column::Primary(base) => base + offset,
            Column::Secondary(base) => primary + base + offset
        };
        let mut links = DancingLinks::new(primary, secondary);
        let mut rows = Vec::new();

        for (cell, regions) in regions_of_cell.iter().enumerate() {
            let mut options = grid.cells()[cell].options();

            if use_hints {
                options -= grid.cells()[cell].hinted_eliminations();
            }

            for digit in options.iter() {
                let excluded = regions.iter().any(|&region| {
                    match &layouts[region].combinations {
                        Some((_, combinations)) =>
                            !combinations.iter().any(|c| c.contains(digit)),
                        None => false
                    }
                });

                if excluded {
                    continue;
                }

                let mut columns = vec![cell];
                columns.extend(regions.iter().map(|&region|
                    resolve(layouts[region].digit_columns, digit - 1)));
                links.add_row(&columns);
                rows.push(MatrixRow::Placement { cell, digit });
            }
        }

        for (region, layout) in layouts.iter().enumerate() {
            if let Some((column, combinations)) = &layout.combinations {
                let union: DigitSet = combinations.iter()
                    .fold(DigitSet::new(), |acc, &c| acc | c);

                for &digits in combinations {
                    let mut columns = vec![*column];
                    columns.extend((union - digits).iter()
                        .map(|digit| resolve(layout.digit_columns, digit - 1)));
                    links.add_row(&columns);
                    rows.push(MatrixRow::Combination { region, digits });
                }
            }
        }

        ExactCoverMatrix {
            links,
            rows,
            cell_count
        }
    }

    /// Gets the meaning of every row of the matrix, indexed by row.
    pub fn rows(&self) -> &[MatrixRow] {
        &self.rows
    }

    /// Gets the number of primary columns, i.e. conditions that must hold
    /// exactly once.
    pub fn primary_columns(&self) -> usize {
        self.links.primary_columns()
    }

    fn decode(&self, chosen: &[usize]) -> Vec<usize> {
        let mut values = vec![0; self.cell_count];

        for &row in chosen {
            if let MatrixRow::Placement { cell, digit } = self.rows[row] {
                values[cell] = digit;
            }
        }

        values
    }

    /// Searches for up to `max_solutions` solutions, checking `abort`
    /// throughout the search.
    pub fn solve(&mut self, max_solutions: usize, abort: &AtomicBool)
            -> BruteForceResult {
        let result = self.links.search(max_solutions, abort);
        let solutions = result.solutions.iter()
            .map(|chosen| self.decode(chosen))
            .collect();

        BruteForceResult {
            solutions,
            complete: result.complete,
            aborted: result.aborted
        }
    }
}

/// A classification of the number of solutions of a puzzle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SolutionCount {

    /// The puzzle has no solution.
    Impossible,

    /// The puzzle has exactly one solution, which is wrapped in this
    /// instance as the digit of every cell.
    Unique(Vec<usize>),

    /// The puzzle has more than one solution.
    Ambiguous,

    /// The search stopped before the number of solutions could be
    /// determined.
    Unknown
}

/// The solutions found by a [BruteForceSolver].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BruteForceResult {

    /// The found solutions, each as the digit of every cell in the order of
    /// the cells' linear ids.
    pub solutions: Vec<Vec<usize>>,

    /// Whether all solutions were found.
    pub complete: bool,

    /// Whether the search was aborted.
    pub aborted: bool
}

impl BruteForceResult {

    /// Classifies the number of solutions. At least two solutions must have
    /// been requested for a search to tell unique puzzles from ambiguous
    /// ones.
    pub fn solution_count(&self) -> SolutionCount {
        match self.solutions.len() {
            0 if self.complete => SolutionCount::Impossible,
            1 if self.complete => SolutionCount::Unique(self.solutions[0].clone()),
            0 | 1 => SolutionCount::Unknown,
            _ => SolutionCount::Ambiguous
        }
    }

    fn truncated(&self, max_solutions: usize) -> BruteForceResult {
        if self.solutions.len() <= max_solutions {
            return self.clone();
        }

        BruteForceResult {
            solutions: self.solutions[..max_solutions].to_vec(),
            complete: false,
            aborted: false
        }
    }
}

#[derive(Debug)]
struct CachedSearch {
    revision: u64,
    use_hints: bool,
    max_solutions: usize,
    result: BruteForceResult
}

/// Finds solutions of a [Grid] with an exact cover search. The solutions of
/// the last search are kept until the grid's contents are edited, the cache
/// is invalidated with [BruteForceSolver::dirty_solutions], or a search with
/// more solutions or different hint usage is requested.
#[derive(Debug, Default)]
pub struct BruteForceSolver {
    abort: Arc<AtomicBool>,
    cache: Option<CachedSearch>
}

impl BruteForceSolver {

    /// Creates a new brute force solver with its own abort flag.
    pub fn new() -> BruteForceSolver {
        BruteForceSolver::default()
    }

    /// Creates a new brute force solver which stops its searches once the
    /// given flag is set.
    pub fn with_abort_flag(abort: Arc<AtomicBool>) -> BruteForceSolver {
        BruteForceSolver {
            abort,
            cache: None
        }
    }

    /// Gets the flag which aborts a running search when set. The flag is not
    /// cleared by the solver.
    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// Invalidates the cached solutions.
    pub fn dirty_solutions(&mut self) {
        self.cache = None;
    }

    fn cached(&self, grid: &Grid, max_solutions: usize, use_hints: bool)
            -> Option<BruteForceResult> {
        let cache = self.cache.as_ref()?;

        if cache.revision != grid.revision() || cache.use_hints != use_hints {
            return None;
        }

        if cache.result.complete || max_solutions <= cache.max_solutions {
            Some(cache.result.truncated(max_solutions))
        }
        else {
            None
        }
    }

    /// Generates up to `max_solutions` solutions of the given grid. If
    /// `use_hints` is `true`, the digits the user marked as eliminated are
    /// excluded like options the cell no longer has.
    ///
    /// Aborted searches are not cached.
    pub fn generate_solutions(&mut self, grid: &Grid, max_solutions: usize,
            use_hints: bool) -> BruteForceResult {
        if let Some(result) = self.cached(grid, max_solutions, use_hints) {
            debug!(target: "exact_cover", "reusing {} cached solutions",
                result.solutions.len());
            return result;
        }

        let mut matrix = ExactCoverMatrix::new(grid, use_hints);
        let result = matrix.solve(max_solutions, &self.abort);

        debug!(target: "exact_cover",
            "found {} solutions with {} rows (complete: {}, aborted: {})",
            result.solutions.len(), matrix.rows().len(), result.complete,
            result.aborted);

        if result.aborted || self.abort.load(Ordering::Relaxed) {
            self.cache = None;
        }
        else {
            self.cache = Some(CachedSearch {
                revision: grid.revision(),
                use_hints,
                max_solutions,
                result: result.clone()
            });
        }

        result
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    use crate::region::RegionKind;

    fn empty_grid() -> Grid {
        let mut grid = Grid::new(2, 2).unwrap();
        grid.define_standard_regions().unwrap();
        grid
    }

    fn digits(v: &[usize]) -> DigitSet {
        v.iter().cloned().collect()
    }

    #[test]
    fn empty_4x4_has_288_solutions() {
        let mut solver = BruteForceSolver::new();
        let result = solver.generate_solutions(&empty_grid(), 1000, false);

        assert_eq!(288, result.solutions.len());
        assert!(result.complete);
        assert!(!result.aborted);

        let mut sorted = result.solutions.clone();
        sorted.sort();
        sorted.dedup();

        assert_eq!(288, sorted.len());
    }

    #[test]
    fn maximum_limits_solutions() {
        let mut solver = BruteForceSolver::new();
        let result = solver.generate_solutions(&empty_grid(), 10, false);

        assert_eq!(10, result.solutions.len());
        assert!(!result.complete);
    }

    #[test]
    fn single_requested_solution_can_be_unique() {
        let mut grid = empty_grid();

        for &(row, column, value) in [(0, 0, 1), (1, 2, 1), (1, 3, 2),
                (2, 0, 2), (2, 3, 3), (3, 1, 3)].iter() {
            grid.add_given_cell(row, column, value).unwrap();
        }

        let mut solver = BruteForceSolver::new();
        let result = solver.generate_solutions(&grid, 1, false);

        assert!(result.complete);
        assert!(matches!(result.solution_count(), SolutionCount::Unique(_)));
    }

    #[test]
    fn set_abort_flag_is_honored() {
        let abort = Arc::new(AtomicBool::new(true));
        let mut solver = BruteForceSolver::with_abort_flag(Arc::clone(&abort));
        let result = solver.generate_solutions(&empty_grid(), 1000, false);

        assert!(result.aborted);
        assert!(result.solutions.is_empty());
        assert_eq!(SolutionCount::Unknown, result.solution_count());

        abort.store(false, Ordering::Relaxed);
        let result = solver.generate_solutions(&empty_grid(), 1000, false);

        assert_eq!(288, result.solutions.len());
    }

    #[test]
    fn solutions_respect_givens() {
        let mut grid = empty_grid();
        grid.add_given_cell(0, 0, 1).unwrap();
        let mut solver = BruteForceSolver::new();
        let result = solver.generate_solutions(&grid, 1000, false);

        assert_eq!(72, result.solutions.len());
        assert!(result.solutions.iter().all(|s| s[0] == 1));
    }

    #[test]
    fn killer_cage_restricts_combinations() {
        let mut grid = empty_grid();
        grid.define_killer_cage(&[(0, 0), (0, 1)], 3).unwrap();
        let mut solver = BruteForceSolver::new();
        let result = solver.generate_solutions(&grid, 1000, false);

        assert_eq!(48, result.solutions.len());
        assert!(result.solutions.iter().all(|s| s[0] + s[1] == 3));
    }

    #[test]
    fn small_region_is_distinct() {
        let mut all = BruteForceSolver::new()
            .generate_solutions(&empty_grid(), 1000, false).solutions;
        all.retain(|s| s[0] != s[6]);

        let mut grid = empty_grid();
        grid.define_region(&[(0, 0), (1, 2)], RegionKind::Generic, None)
            .unwrap();
        let mut found = BruteForceSolver::new()
            .generate_solutions(&grid, 1000, false).solutions;
        found.sort();
        all.sort();

        assert_eq!(all, found);
    }

    #[test]
    fn hints_are_only_used_on_request() {
        let mut grid = empty_grid();
        grid.set_cell_elimination_hints(0, 0, digits(&[2, 3, 4])).unwrap();
        let mut solver = BruteForceSolver::new();

        assert_eq!(288,
            solver.generate_solutions(&grid, 1000, false).solutions.len());
        assert_eq!(72,
            solver.generate_solutions(&grid, 1000, true).solutions.len());
    }

    #[test]
    fn unique_puzzle_is_classified() {
        let mut grid = empty_grid();

        for &(row, column, value) in [(0, 0, 1), (1, 2, 1), (1, 3, 2),
                (2, 0, 2), (2, 3, 3), (3, 1, 3)].iter() {
            grid.add_given_cell(row, column, value).unwrap();
        }

        let result = BruteForceSolver::new().generate_solutions(&grid, 2, false);
        let expected = vec![1, 2, 3, 4, 3, 4, 1, 2, 2, 1, 4, 3, 4, 3, 2, 1];

        assert_eq!(SolutionCount::Unique(expected), result.solution_count());
    }

    #[test]
    fn clashing_givens_are_impossible() {
        let mut grid = empty_grid();
        grid.add_given_cell(0, 0, 1).unwrap();
        grid.add_given_cell(0, 1, 1).unwrap();
        let result = BruteForceSolver::new().generate_solutions(&grid, 2, false);

        assert_eq!(SolutionCount::Impossible, result.solution_count());
    }

    #[test]
    fn results_are_cached_until_edit() {
        let mut grid = empty_grid();
        let mut solver = BruteForceSolver::new();
        solver.generate_solutions(&grid, 1000, false);

        // A set abort flag would make every real search fail.
        solver.abort_flag().store(true, Ordering::Relaxed);
        let cached = solver.generate_solutions(&grid, 5, false);

        assert_eq!(5, cached.solutions.len());
        assert!(!cached.aborted);

        grid.add_given_cell(0, 0, 1).unwrap();

        assert!(solver.generate_solutions(&grid, 5, false).aborted);
    }

    #[test]
    fn cell_edits_invalidate_cache() {
        let mut grid = empty_grid();
        let mut solver = BruteForceSolver::new();

        assert_eq!(288,
            solver.generate_solutions(&grid, 1000, false).solutions.len());

        grid.make_given(0, 1).unwrap();
        assert_eq!(72,
            solver.generate_solutions(&grid, 1000, false).solutions.len());

        grid.remove_option(1, 2).unwrap();
        assert_eq!(48,
            solver.generate_solutions(&grid, 1000, false).solutions.len());

        grid.remove_all_other_options(2, digits(&[2, 3])).unwrap();
        grid.solve_cell(15, 4).unwrap();
        let fresh = BruteForceSolver::new().generate_solutions(&grid, 1000,
            false);

        assert_eq!(fresh, solver.generate_solutions(&grid, 1000, false));
    }

    #[test]
    fn rollback_invalidates_cache() {
        let mut grid = empty_grid();
        let mut solver = BruteForceSolver::new();
        grid.start_transaction();
        grid.make_given(0, 1).unwrap();

        assert_eq!(72,
            solver.generate_solutions(&grid, 1000, false).solutions.len());

        grid.rollback();
        grid.commit();

        assert_eq!(288,
            solver.generate_solutions(&grid, 1000, false).solutions.len());
    }

    #[test]
    fn diverging_clones_do_not_share_cache() {
        let base = empty_grid();
        let mut first = base.clone();
        let mut second = base.clone();
        first.make_given(0, 1).unwrap();
        second.make_given(0, 1).unwrap();
        second.make_given(1, 2).unwrap();
        let mut solver = BruteForceSolver::new();

        assert_eq!(72,
            solver.generate_solutions(&first, 1000, false).solutions.len());
        assert_eq!(24,
            solver.generate_solutions(&second, 1000, false).solutions.len());
    }

    #[test]
    fn dirty_solutions_forces_new_search() {
        let grid = empty_grid();
        let mut solver = BruteForceSolver::new();
        solver.generate_solutions(&grid, 10, false);
        solver.dirty_solutions();
        solver.abort_flag().store(true, Ordering::Relaxed);

        assert!(solver.generate_solutions(&grid, 10, false).aborted);
    }

    #[test]
    fn larger_maximum_forces_new_search() {
        let grid = empty_grid();
        let mut solver = BruteForceSolver::new();
        solver.generate_solutions(&grid, 10, false);

        assert_eq!(20,
            solver.generate_solutions(&grid, 20, false).solutions.len());
    }
}
