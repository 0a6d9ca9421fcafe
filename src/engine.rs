//! This module contains the [SolverEngine], which runs the logical solver and
//! the brute force solver on a dedicated worker thread.
//!
//! The engine owns the [Grid] behind a lock that the worker holds for a whole
//! solve pass, so logical propagation and brute force never run at the same
//! time. Edits to the puzzle do not wait for that lock. They are collected in
//! a pending queue, which the worker drains at the start of every pass.
//! Results are reported as [EngineEvent]s on the receiver returned by
//! [SolverEngine::new].
//!
//! ```
//! use sudoku_regions::{Grid, SolverConfig};
//! use sudoku_regions::engine::{Edit, EngineEvent, SolverEngine};
//! use sudoku_regions::solver::SolveStatus;
//!
//! let mut grid = Grid::new(2, 2).unwrap();
//! grid.define_standard_regions().unwrap();
//!
//! let (engine, events) = SolverEngine::new(grid, SolverConfig::default());
//!
//! for &(row, column, value) in [(0, 0, 1), (1, 2, 1), (1, 3, 2), (2, 0, 2),
//!         (2, 3, 3), (3, 1, 3)].iter() {
//!     engine.edit(Edit::Given { row, column, value });
//! }
//!
//! engine.propagate().unwrap();
//!
//! let status = events.iter()
//!     .find_map(|event| match event {
//!         EngineEvent::Finished(status) => Some(status),
//!         _ => None
//!     });
//!
//! assert_eq!(Some(SolveStatus::Solved), status);
//! ```

use crate::cell::CellChange;
use crate::config::SolverConfig;
use crate::constraint::VariantConstraint;
use crate::error::{SudokuError, SudokuResult};
use crate::exact_cover::{BruteForceResult, BruteForceSolver};
use crate::grid::Grid;
use crate::region::RegionKind;
use crate::solver::{GridProgressManager, SolveStatus};
use crate::util::DigitSet;

use log::{info, warn};

use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// A change to the puzzle, queued with [SolverEngine::edit] and applied by
/// the worker at the start of the next pass.
#[derive(Clone, Debug, PartialEq)]
pub enum Edit {

    /// Enters a given digit. See [Grid::add_given_cell].
    Given {

        /// The row of the cell.
        row: usize,

        /// The column of the cell.
        column: usize,

        /// The given digit.
        value: usize
    },

    /// Restricts the options of a cell. See [Grid::set_cell_options].
    Options {

        /// The row of the cell.
        row: usize,

        /// The column of the cell.
        column: usize,

        /// The digits that remain options.
        options: DigitSet
    },

    /// Sets the digits the user eliminated in a cell. See
    /// [Grid::set_cell_elimination_hints].
    Hints {

        /// The row of the cell.
        row: usize,

        /// The column of the cell.
        column: usize,

        /// The eliminated digits.
        hints: DigitSet
    },

    /// Defines a region. See [Grid::define_region].
    Region {

        /// The `(row, column)` coordinates of the region's cells.
        cells: Vec<(usize, usize)>,

        /// The kind of the region.
        kind: RegionKind,

        /// The variant constraint of the region, if any.
        constraint: Option<VariantConstraint>
    },

    /// Defines a killer cage. See [Grid::define_killer_cage].
    KillerCage {

        /// The `(row, column)` coordinates of the cage's cells.
        cells: Vec<(usize, usize)>,

        /// The total of the cage.
        total: usize
    }
}

impl Edit {
    fn apply(&self, grid: &mut Grid) -> SudokuResult<()> {
        match self {
            Edit::Given { row, column, value } =>
                grid.add_given_cell(*row, *column, *value),
            Edit::Options { row, column, options } =>
                grid.set_cell_options(*row, *column, *options),
            Edit::Hints { row, column, hints } =>
                grid.set_cell_elimination_hints(*row, *column, *hints),
            Edit::Region { cells, kind, constraint } =>
                grid.define_region(cells, *kind, constraint.clone()).map(|_| ()),
            Edit::KillerCage { cells, total } =>
                grid.define_killer_cage(cells, *total).map(|_| ())
        }
    }
}

/// A notification sent by the worker thread of a [SolverEngine].
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {

    /// A cell of the grid changed.
    CellChanged(CellChange),

    /// The logical solver applied a deduction, described by the wrapped
    /// message.
    Deduction(String),

    /// A queued edit could not be applied.
    EditRejected(Edit, SudokuError),

    /// A logical solve pass finished with the wrapped status.
    Finished(SolveStatus),

    /// A brute force pass finished with the wrapped result.
    Solutions(BruteForceResult)
}

#[derive(Debug)]
enum Job {
    Propagate,
    BruteForce {
        max_solutions: usize,
        use_hints: bool
    }
}

#[derive(Debug, Default)]
struct PendingEdits {
    edits: Vec<Edit>,
    reload: bool
}

struct SolverState {
    grid: Grid,
    brute_force: BruteForceSolver
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Worker {
    config: SolverConfig,
    state: Arc<Mutex<SolverState>>,
    pending: Arc<Mutex<PendingEdits>>,
    cancel: Arc<AtomicBool>,
    cancelled: Arc<AtomicU64>,
    stopping: Arc<AtomicBool>,
    events: Sender<EngineEvent>
}

impl Worker {
    fn send(&self, event: EngineEvent) {
        // The receiver may be gone, in which case nobody is interested.
        let _ = self.events.send(event);
    }

    fn drain_edits(&self, state: &mut SolverState) {
        let PendingEdits { edits, reload } = mem::take(&mut *lock(&self.pending));

        if reload {
            info!(target: "engine", "reloading puzzle from {} edits",
                edits.len());
            state.grid.clear();
            state.brute_force.dirty_solutions();
        }

        for edit in edits {
            if let Err(e) = edit.apply(&mut state.grid) {
                warn!(target: "engine", "rejected {:?}: {}", edit, e);
                self.send(EngineEvent::EditRejected(edit, e));
            }
        }
    }

    fn propagate(&self, state: &mut SolverState) {
        let mut manager = GridProgressManager::new(&self.config);
        let events = self.events.clone();
        manager.set_cancel_flag(Arc::clone(&self.cancel));
        manager.set_sink(Box::new(move |progress| {
            let _ = events.send(EngineEvent::Deduction(progress.to_string()));
        }));

        let status = manager.run_to_completion(&mut state.grid);
        info!(target: "engine", "propagation finished as {:?} after {} deductions",
            status, manager.applied_count());
        self.send(EngineEvent::Finished(status));
    }

    fn brute_force(&self, state: &mut SolverState, max_solutions: usize,
            use_hints: bool) {
        let SolverState { grid, brute_force } = state;
        let result = brute_force.generate_solutions(grid, max_solutions,
            use_hints);
        info!(target: "engine", "brute force found {} solutions",
            result.solutions.len());
        self.send(EngineEvent::Solutions(result));
    }

    fn run(self, jobs: Receiver<(u64, Job)>) {
        for (generation, job) in jobs {
            self.cancel.store(false, Ordering::SeqCst);

            if generation <= self.cancelled.load(Ordering::SeqCst) {
                self.cancel.store(true, Ordering::SeqCst);
            }

            if self.stopping.load(Ordering::SeqCst) {
                break;
            }

            let mut state = lock(&self.state);
            self.drain_edits(&mut state);

            match job {
                Job::Propagate => self.propagate(&mut state),
                Job::BruteForce { max_solutions, use_hints } =>
                    self.brute_force(&mut state, max_solutions, use_hints)
            }
        }

        info!(target: "engine", "worker stopped");
    }
}

/// Runs solve passes on a worker thread. See the
/// [module documentation](self) for an overview.
///
/// Dropping the engine cancels the running pass and joins the worker.
pub struct SolverEngine {
    config: SolverConfig,
    state: Arc<Mutex<SolverState>>,
    pending: Arc<Mutex<PendingEdits>>,
    cancel: Arc<AtomicBool>,
    submitted: AtomicU64,
    cancelled: Arc<AtomicU64>,
    stopping: Arc<AtomicBool>,
    jobs: Option<Sender<(u64, Job)>>,
    worker: Option<JoinHandle<()>>
}

impl SolverEngine {

    /// Creates a new engine for the given grid and starts its worker thread.
    /// Returns the engine together with the receiver of its events. Every
    /// committed change to the grid is reported as an
    /// [EngineEvent::CellChanged], replacing any observer the grid had.
    pub fn new(mut grid: Grid, config: SolverConfig)
            -> (SolverEngine, Receiver<EngineEvent>) {
        let (event_sender, event_receiver) = mpsc::channel();
        let (job_sender, job_receiver) = mpsc::channel();
        let observer_events = event_sender.clone();
        grid.set_observer(Box::new(move |change| {
            let _ = observer_events.send(EngineEvent::CellChanged(change));
        }));

        let cancel = Arc::new(AtomicBool::new(false));
        let state = Arc::new(Mutex::new(SolverState {
            grid,
            brute_force: BruteForceSolver::with_abort_flag(Arc::clone(&cancel))
        }));
        let pending = Arc::new(Mutex::new(PendingEdits::default()));
        let cancelled = Arc::new(AtomicU64::new(0));
        let stopping = Arc::new(AtomicBool::new(false));
        let worker = Worker {
            config: config.clone(),
            state: Arc::clone(&state),
            pending: Arc::clone(&pending),
            cancel: Arc::clone(&cancel),
            cancelled: Arc::clone(&cancelled),
            stopping: Arc::clone(&stopping),
            events: event_sender
        };
        let handle = thread::spawn(move || worker.run(job_receiver));

        let engine = SolverEngine {
            config,
            state,
            pending,
            cancel,
            submitted: AtomicU64::new(0),
            cancelled,
            stopping,
            jobs: Some(job_sender),
            worker: Some(handle)
        };

        (engine, event_receiver)
    }

    /// Gets the configuration of the logical solver.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Queues an edit, which is applied at the start of the next pass.
    pub fn edit(&self, edit: Edit) {
        lock(&self.pending).edits.push(edit);
    }

    /// Replaces all pending edits. At the start of the next pass, the grid is
    /// cleared completely (including its regions) and rebuilt from the given
    /// edits.
    pub fn reload(&self, edits: Vec<Edit>) {
        let mut pending = lock(&self.pending);
        pending.edits = edits;
        pending.reload = true;
    }

    fn submit(&self, job: Job) -> SudokuResult<()> {
        let jobs = self.jobs.as_ref().ok_or(SudokuError::EngineStopped)?;
        let generation = self.submitted.fetch_add(1, Ordering::SeqCst) + 1;
        jobs.send((generation, job)).map_err(|_| SudokuError::EngineStopped)
    }

    /// Queues a logical solve pass, which runs until the grid is solved, found
    /// unsolvable, stalled, or cancelled.
    ///
    /// # Errors
    ///
    /// `SudokuError::EngineStopped` if the worker thread has terminated.
    pub fn propagate(&self) -> SudokuResult<()> {
        self.submit(Job::Propagate)
    }

    /// Queues a brute force pass, which searches for up to `max_solutions`
    /// solutions. If `use_hints` is `None`, the configuration decides whether
    /// hints are used as constraints.
    ///
    /// # Errors
    ///
    /// `SudokuError::EngineStopped` if the worker thread has terminated.
    pub fn brute_force(&self, max_solutions: usize, use_hints: Option<bool>)
            -> SudokuResult<()> {
        let use_hints =
            use_hints.unwrap_or(self.config.use_hints_as_constraints);
        self.submit(Job::BruteForce {
            max_solutions,
            use_hints
        })
    }

    /// Cancels the pass that is currently running and every pass that was
    /// queued before this call but has not started yet. Cancelled passes
    /// still drain the pending edits and report an aborted result. Passes
    /// queued afterwards are not affected.
    pub fn cancel(&self) {
        let latest = self.submitted.load(Ordering::SeqCst);
        self.cancelled.fetch_max(latest, Ordering::SeqCst);
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Runs the given function on the grid. This waits until the current
    /// pass has finished.
    pub fn with_grid<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&Grid) -> R
    {
        f(&lock(&self.state).grid)
    }
}

impl Drop for SolverEngine {
    fn drop(&mut self) {
        self.stopping.store(true, Ordering::SeqCst);
        self.cancel();
        self.jobs = None;

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(target: "engine", "worker thread panicked");
            }
        }
    }
}
