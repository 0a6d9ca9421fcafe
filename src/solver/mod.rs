//! This module contains the [GridProgressManager], which drives the logical
//! solution of a [Grid] one small step at a time.
//!
//! Every call of [GridProgressManager::next_step] does one of the following:
//!
//! * Apply the next fatal deduction, if one is queued on the grid. The puzzle
//! is then known to be unsolvable and the manager finishes.
//! * Otherwise, apply the next ordinary deduction, if one is queued.
//! * Otherwise, advance the current [SolvingTechnique] by one unit of work.
//! Once it has finished, the next technique takes over. If the last
//! technique has finished without finding anything, the manager is stalled.
//!
//! After every applied deduction, all techniques are reset and the first one
//! takes over again, since the deduction may have split regions the
//! techniques were walking. Since the steps are small, the caller can stop in
//! between, for example to check whether the user cancelled the solve.
//!
//! ```
//! use sudoku_regions::{Grid, SolverConfig};
//! use sudoku_regions::solver::{GridProgressManager, SolveStatus};
//!
//! let mut grid = Grid::new(2, 2).unwrap();
//! grid.define_standard_regions().unwrap();
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
//! for &(row, column, value) in [(0, 0, 1), (1, 2, 1), (1, 3, 2), (2, 0, 2),
//!         (2, 3, 3), (3, 1, 3)].iter() {
//!     grid.add_given_cell(row, column, value).unwrap();
//! }
//!
//! let mut manager = GridProgressManager::new(&SolverConfig::default());
//! assert_eq!(SolveStatus::Solved, manager.run_to_completion(&mut grid));
//! assert_eq!(1, grid.value_get(3, 3).unwrap());
//! ```

use crate::config::SolverConfig;
use crate::grid::Grid;
use crate::progress::Progress;
use crate::technique::{self, SolvingTechnique};

use log::{debug, info};

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The state of a [GridProgressManager].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SolveStatus {

    /// The manager has not finished yet.
    Running,

    /// Every cell of the grid is solved.
    Solved,

    /// No technique can make further progress, but the grid is not solved.
    Stalled,

    /// A contradiction was found, so the puzzle has no solution.
    Unsolvable,

    /// The manager was aborted or cancelled before it finished.
    Aborted
}

impl SolveStatus {

    /// Indicates whether a manager with this status has finished.
    pub fn is_finished(self) -> bool {
        self != SolveStatus::Running
    }
}

/// The type of the callback which receives every deduction a
/// [GridProgressManager] applies.
pub type ProgressSink = Box<dyn FnMut(&Progress) + Send>;

/// Drives the logical solution of a grid. See the
/// [module documentation](self) for the details of a step.
pub struct GridProgressManager {
    config: SolverConfig,
    depth: usize,
    nested: bool,
    techniques: Vec<Box<dyn SolvingTechnique + Send>>,
    current: usize,
    status: SolveStatus,
    cancel: Option<Arc<AtomicBool>>,
    sink: Option<ProgressSink>,
    applied: usize
}

impl Debug for GridProgressManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridProgressManager")
            .field("depth", &self.depth)
            .field("nested", &self.nested)
            .field("current", &self.current)
            .field("status", &self.status)
            .field("applied", &self.applied)
            .finish()
    }
}

impl GridProgressManager {

    fn create(config: &SolverConfig, depth: usize, nested: bool,
            cancel: Option<Arc<AtomicBool>>) -> GridProgressManager {
        let techniques = technique::create_techniques(config, depth, nested,
            cancel.as_ref());

        GridProgressManager {
            config: config.clone(),
            depth,
            nested,
            techniques,
            current: 0,
            status: SolveStatus::Running,
            cancel,
            sink: None,
            applied: 0
        }
    }

    /// Creates a new manager for the outermost solve of a grid, using the
    /// techniques enabled in the given configuration.
    pub fn new(config: &SolverConfig) -> GridProgressManager {
        GridProgressManager::create(config, config.max_bifurcation_depth,
            false, None)
    }

    /// Creates a manager for a bifurcation branch. It does not search for
    /// fish and may bifurcate at most `depth` levels deep.
    pub(crate) fn nested(config: &SolverConfig, depth: usize,
            cancel: Option<Arc<AtomicBool>>) -> GridProgressManager {
        GridProgressManager::create(config, depth, true, cancel)
    }

    /// Sets a flag which is polled by [GridProgressManager::run_to_completion]
    /// and by the branches of a bifurcation. Once it is set, the manager
    /// aborts.
    pub fn set_cancel_flag(&mut self, flag: Arc<AtomicBool>) {
        self.cancel = Some(flag);
        self.techniques = technique::create_techniques(&self.config,
            self.depth, self.nested, self.cancel.as_ref());
        self.current = 0;
    }

    /// Sets a callback which receives every deduction before it is applied.
    pub fn set_sink(&mut self, sink: ProgressSink) {
        self.sink = Some(sink);
    }

    /// Gets the current status of this manager.
    pub fn status(&self) -> SolveStatus {
        self.status
    }

    /// Indicates whether this manager has finished, for whatever reason.
    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Gets the number of deductions this manager has applied so far.
    pub fn applied_count(&self) -> usize {
        self.applied
    }

    /// Finishes this manager without changing the grid. Subsequent calls of
    /// [GridProgressManager::next_step] do nothing. Aborting a manager that
    /// has already finished has no effect.
    pub fn abort(&mut self) {
        if self.status == SolveStatus::Running {
            self.status = SolveStatus::Aborted;
        }
    }

    fn is_cancelled(&self) -> bool {
        match &self.cancel {
            Some(flag) => flag.load(Ordering::Relaxed),
            None => false
        }
    }

    fn reset_techniques(&mut self) {
        for technique in self.techniques.iter_mut() {
            technique.reset();
        }

        self.current = 0;
    }

    fn apply(&mut self, grid: &mut Grid, progress: Progress) {
        debug!(target: "deduction", "{}", progress);

        if let Some(sink) = &mut self.sink {
            sink(&progress);
        }

        progress.apply(grid);
        self.applied += 1;

        if progress.is_fatal() {
            grid.queue.clear();
            self.status = SolveStatus::Unsolvable;

            if !self.nested {
                info!(target: "deduction", "the puzzle is unsolvable: {}",
                    progress);
            }
        }
    }

    /// Performs a single step on the given grid, as described in the
    /// [module documentation](self), and returns the resulting status. If
    /// the manager has already finished, nothing happens.
    pub fn next_step(&mut self, grid: &mut Grid) -> SolveStatus {
        if self.status.is_finished() {
            return self.status;
        }

        if grid.is_broken() {
            grid.queue.clear();
            self.status = SolveStatus::Unsolvable;
            return self.status;
        }

        if let Some(progress) = grid.queue.pop() {
            self.reset_techniques();
            self.apply(grid, progress);
        }
        else if let Some(technique) = self.techniques.get_mut(self.current) {
            technique.next_step(grid);

            if technique.has_finished() {
                self.current += 1;
            }
        }
        else {
            self.status = SolveStatus::Stalled;
        }

        if self.status == SolveStatus::Running && grid.is_solved() &&
                !grid.queue.has_high_priority() {
            grid.queue.clear();
            self.status = SolveStatus::Solved;

            if !self.nested {
                info!(target: "deduction", "the puzzle is solved after {} \
                    deductions", self.applied);
            }
        }

        self.status
    }

    /// Calls [GridProgressManager::next_step] until the manager finishes and
    /// returns the final status. Before every step, the cancel flag (if any)
    /// is polled, and the manager aborts once it is set.
    pub fn run_to_completion(&mut self, grid: &mut Grid) -> SolveStatus {
        loop {
            if self.is_cancelled() {
                self.abort();
            }

            let status = self.next_step(grid);

            if status.is_finished() {
                return status;
            }
        }
    }
}
