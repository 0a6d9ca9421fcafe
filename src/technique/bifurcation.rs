//! This module contains the [BifurcationTechnique], which guesses digits and
//! develops each guess with a nested solver.

use crate::config::SolverConfig;
use crate::grid::Grid;
use crate::progress::Progress;
use crate::solver::{GridProgressManager, SolveStatus};
use crate::technique::{SolvingTechnique, TechniqueKind};
use crate::util::DigitSet;

use log::{debug, trace};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// The result of developing a single guess.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BranchOutcome {

    /// The guess led to a contradiction, so the guessed digit can be removed.
    Contradiction,

    /// The nested solver stopped without finding a contradiction. Contains
    /// the options of every cell at that point, in order of linear ids.
    Valid(Vec<DigitSet>),

    /// The nested solver was cancelled before it could finish.
    Aborted
}

/// A [SolvingTechnique] which tries every option of a cell (the *pivot*)
/// and lets a nested solver develop each guess on a scratch copy of the
/// grid.
///
/// * If a guess leads to a contradiction, the guessed digit is removed from
/// the pivot ([Progress::ValueRemovedByGuess]).
/// * Options that are removed in every branch without contradiction are
/// removed from the real grid as well
/// ([Progress::BifurcationElimination]).
/// * If every branch leads to a contradiction, the puzzle has no solution
/// ([Progress::NoValidBifurcationBranch]).
///
/// Pivots are chosen weakest first, i.e. cells with fewer options are tried
/// earlier. Cells with the same number of options are tried in a random
/// order, which is reproducible if the [SolverConfig] contains a seed.
///
/// The nested solvers do not bifurcate themselves at first. Only once every
/// pivot was tried without result, the technique starts over and allows one
/// more level of nested bifurcation, up to the depth it was created with.
/// The scratch grid is copied once per activation and reset between branches
/// by rolling back its journal.
#[derive(Debug)]
pub struct BifurcationTechnique {
    config: SolverConfig,
    max_depth: usize,
    cancel: Option<Arc<AtomicBool>>,
    rng: StdRng,
    scratch: Option<Grid>,
    pivots: Vec<usize>,
    position: usize,
    level: usize,
    finished: bool
}

fn create_rng(config: &SolverConfig) -> StdRng {
    match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy()
    }
}

fn choose_pivots(grid: &Grid, rng: &mut StdRng) -> Vec<usize> {
    let mut pivots: Vec<usize> = grid.cells().iter()
        .filter(|c| !c.is_solved() && c.options().len() > 1)
        .map(|c| c.id())
        .collect();
    pivots.shuffle(rng);
    pivots.sort_by_key(|&c| grid.cells()[c].options().len());
    pivots
}

/// Queues the deductions that follow from the outcomes of all branches on
/// the given pivot. Returns `true` if anything was queued.
fn conclude(grid: &mut Grid, pivot: usize,
        outcomes: &[(usize, BranchOutcome)]) -> bool {
    let mut union: Option<Vec<DigitSet>> = None;
    let mut found = false;

    for (digit, outcome) in outcomes.iter() {
        match outcome {
            BranchOutcome::Contradiction => {
                found |= grid.queue.push(Progress::ValueRemovedByGuess {
                    cell: pivot,
                    value: *digit
                });
            },
            BranchOutcome::Valid(options) => {
                union = Some(match union {
                    Some(mut union) => {
                        for (acc, &options) in union.iter_mut().zip(options) {
                            *acc |= options;
                        }

                        union
                    },
                    None => options.clone()
                });
            },
            BranchOutcome::Aborted => return false
        }
    }

    let union = match union {
        Some(union) => union,
        None => {
            if outcomes.is_empty() {
                return false;
            }

            grid.queue.push(Progress::NoValidBifurcationBranch {
                cell: pivot
            });
            return true;
        }
    };

    for (cell, &options) in union.iter().enumerate() {
        if cell == pivot {
            continue;
        }

        let removed = grid.cells()[cell].options() - options;

        if !removed.is_empty() {
            found |= grid.queue.push(Progress::BifurcationElimination {
                pivot,
                cell,
                values: removed
            });
        }
    }

    found
}

impl BifurcationTechnique {

    /// Creates a new bifurcation technique.
    ///
    /// # Arguments
    ///
    /// * `config`: The configuration for the nested solvers.
    /// * `max_depth`: The number of nested bifurcation levels this technique
    /// may try, including its own. A depth of 0 disables the technique.
    /// * `cancel`: An optional flag which cancels the nested solvers once it
    /// is set.
    pub fn new(config: SolverConfig, max_depth: usize,
            cancel: Option<Arc<AtomicBool>>) -> BifurcationTechnique {
        let rng = create_rng(&config);

        BifurcationTechnique {
            config,
            max_depth,
            cancel,
            rng,
            scratch: None,
            pivots: Vec::new(),
            position: 0,
            level: 0,
            finished: false
        }
    }

    /// Tries every option of the given pivot cell on the given grid and
    /// returns the outcome of each branch, paired with the guessed digit.
    /// The grid is used as a scratch grid: a journal transaction is started
    /// if none is active, and the grid is rolled back to the state at the
    /// start of the transaction before each branch and after the last one.
    ///
    /// The nested solvers may bifurcate themselves up to `level` levels
    /// deep. Exploration stops early if a branch is aborted.
    pub fn explore_pivot(&self, grid: &mut Grid, pivot: usize, level: usize)
            -> Vec<(usize, BranchOutcome)> {
        if !grid.journal.is_active() {
            grid.start_transaction();
        }

        grid.rollback();
        let options = grid.cells()[pivot].options();
        let mut outcomes = Vec::with_capacity(options.len());

        for digit in options.iter() {
            grid.discard_options(pivot, options - DigitSet::singleton(digit));
            let mut manager = GridProgressManager::nested(&self.config, level,
                self.cancel.clone());
            let outcome = match manager.run_to_completion(grid) {
                SolveStatus::Aborted => BranchOutcome::Aborted,
                SolveStatus::Unsolvable => BranchOutcome::Contradiction,
                _ if grid.is_broken() => BranchOutcome::Contradiction,
                _ => BranchOutcome::Valid(grid.cells().iter()
                    .map(|c| c.options())
                    .collect())
            };

            trace!(target: "bifurcation", "guessed {} in cell #{} at level {}: \
                {}", digit, pivot, level, match &outcome {
                    BranchOutcome::Contradiction => "contradiction",
                    BranchOutcome::Valid(_) => "valid",
                    BranchOutcome::Aborted => "aborted"
                });

            grid.rollback();
            let aborted = outcome == BranchOutcome::Aborted;
            outcomes.push((digit, outcome));

            if aborted {
                break;
            }
        }

        outcomes
    }
}

impl SolvingTechnique for BifurcationTechnique {

    fn kind(&self) -> TechniqueKind {
        TechniqueKind::Bifurcation
    }

    fn next_step(&mut self, grid: &mut Grid) -> bool {
        loop {
            if self.finished {
                return false;
            }

            if self.level >= self.max_depth {
                self.finished = true;
                return false;
            }

            let mut scratch = match self.scratch.take() {
                Some(scratch) => scratch,
                None => {
                    let mut scratch = grid.clone();
                    scratch.queue.clear();
                    scratch.start_transaction();
                    self.pivots = choose_pivots(grid, &mut self.rng);
                    self.position = 0;
                    scratch
                }
            };

            if self.position >= self.pivots.len() {
                self.scratch = Some(scratch);
                self.level += 1;
                self.position = 0;
                continue;
            }

            let pivot = self.pivots[self.position];
            self.position += 1;
            let outcomes = self.explore_pivot(&mut scratch, pivot, self.level);
            self.scratch = Some(scratch);

            if outcomes.iter().any(|(_, o)| *o == BranchOutcome::Aborted) {
                self.finished = true;
                return false;
            }

            let found = conclude(grid, pivot, &outcomes);

            if found {
                debug!(target: "bifurcation",
                    "bifurcation on cell #{} at level {} found deductions",
                    pivot, self.level);
            }

            return found;
        }
    }

    fn reset(&mut self) {
        self.scratch = None;
        self.pivots.clear();
        self.position = 0;
        self.level = 0;
        self.finished = false;
    }

    fn has_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    use std::sync::atomic::Ordering;

    fn digits(v: &[usize]) -> DigitSet {
        v.iter().cloned().collect()
    }

    fn config() -> SolverConfig {
        SolverConfig {
            rng_seed: Some(42),
            ..SolverConfig::default()
        }
    }

    // Guessing 1 in the top-left cell leaves only 3 for the two cells below
    // and to the bottom right of it, which share a row.
    fn guessing_grid() -> Grid {
        let mut grid = Grid::new(2, 2).unwrap();
        grid.define_standard_regions().unwrap();
        grid.set_cell_options(0, 0, digits(&[1, 2])).unwrap();
        grid.set_cell_options(1, 0, digits(&[1, 3])).unwrap();
        grid.set_cell_options(1, 1, digits(&[1, 3])).unwrap();
        while grid.queue.pop().is_some() { }
        grid
    }

    #[test]
    fn contradicting_guess_is_removed() {
        let mut grid = guessing_grid();
        let technique = BifurcationTechnique::new(config(), 1, None);
        let mut scratch = grid.clone();
        let outcomes = technique.explore_pivot(&mut scratch, 0, 0);

        assert_eq!(2, outcomes.len());
        assert_eq!((1, BranchOutcome::Contradiction), outcomes[0]);
        assert!(matches!(outcomes[1], (2, BranchOutcome::Valid(_))));

        // The scratch grid is back at its starting state.
        assert_eq!(digits(&[1, 2]), scratch.cells()[0].options());

        assert!(conclude(&mut grid, 0, &outcomes));
        assert!(grid.queue().iter().any(|p| *p ==
            Progress::ValueRemovedByGuess { cell: 0, value: 1 }));

        while let Some(progress) = grid.queue.pop() {
            progress.apply(&mut grid);
        }

        assert!(!grid.is_broken());
        assert_eq!(2, grid.cells()[0].value());
    }

    #[test]
    fn no_valid_branch_is_fatal() {
        let mut grid = guessing_grid();
        let outcomes = vec![
            (1, BranchOutcome::Contradiction),
            (2, BranchOutcome::Contradiction)
        ];

        assert!(conclude(&mut grid, 0, &outcomes));
        assert!(grid.queue().iter().any(|p| *p ==
            Progress::NoValidBifurcationBranch { cell: 0 }));
        assert!(grid.queue().has_high_priority());
    }

    #[test]
    fn options_removed_in_all_branches_are_eliminated() {
        let mut grid = guessing_grid();
        let mut first = vec![DigitSet::range(4); 16];
        let mut second = first.clone();
        first[7] = digits(&[2]);
        second[7] = digits(&[4]);
        let outcomes = vec![
            (1, BranchOutcome::Valid(first)),
            (2, BranchOutcome::Valid(second))
        ];

        assert!(conclude(&mut grid, 0, &outcomes));
        assert!(grid.queue().iter().any(|p| *p ==
            Progress::BifurcationElimination {
                pivot: 0,
                cell: 7,
                values: digits(&[1, 3])
            }));
    }

    #[test]
    fn cancelled_branches_are_aborted() {
        let grid = guessing_grid();
        let flag = Arc::new(AtomicBool::new(false));
        flag.store(true, Ordering::SeqCst);
        let technique = BifurcationTechnique::new(config(), 1, Some(flag));
        let mut scratch = grid.clone();
        let outcomes = technique.explore_pivot(&mut scratch, 0, 0);

        assert_eq!(vec![(1, BranchOutcome::Aborted)], outcomes);
    }

    #[test]
    fn zero_depth_finishes_immediately() {
        let mut grid = guessing_grid();
        let mut technique = BifurcationTechnique::new(config(), 0, None);

        assert!(!technique.next_step(&mut grid));
        assert!(technique.has_finished());
        assert!(grid.queue().is_empty());
    }

    #[test]
    fn technique_finds_deductions_on_its_own() {
        let mut grid = guessing_grid();
        let mut technique = BifurcationTechnique::new(config(), 1, None);
        let mut found = false;

        while !technique.has_finished() && !found {
            found = technique.next_step(&mut grid);
        }

        assert!(found);
        assert!(!grid.queue().has_high_priority());
    }
}
