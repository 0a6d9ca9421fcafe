//! This module contains the solving techniques the
//! [GridProgressManager](crate::solver::GridProgressManager) cycles through
//! once the queue of deductions runs dry.
//!
//! Every technique implements the [SolvingTechnique] trait. A technique does
//! not change the grid itself. Instead, each call of
//! [SolvingTechnique::next_step] performs a small, bounded unit of work
//! (usually looking at a single region or digit) and queues whatever it
//! finds as [Progress](crate::Progress) on the grid. The manager applies the
//! queued deductions before asking any technique for more, and resets all
//! techniques afterwards, since applying a deduction can split regions and
//! thereby invalidate the snapshot a technique is walking.
//!
//! Region-based techniques only look at regions the
//! [RegionUpdatesManager](crate::region::RegionUpdatesManager) marks as hot
//! for them. When they find nothing in a region, they clear its hot set, so
//! the region is not examined again until something in it changes.
//!
//! # Implementing a custom technique
//!
//! As an example, the following technique confirms nothing and eliminates
//! nothing, but reports how many leaf regions it visited.
//!
//! ```
//! use sudoku_regions::Grid;
//! use sudoku_regions::technique::{
//!     LeafCursor,
//!     SolvingTechnique,
//!     TechniqueKind
//! };
//!
//! struct CountingTechnique {
//!     cursor: LeafCursor,
//!     visited: usize
//! }
//!
//! impl SolvingTechnique for CountingTechnique {
//!     fn kind(&self) -> TechniqueKind {
//!         TechniqueKind::LockedCandidates
//!     }
//!
//!     fn next_step(&mut self, grid: &mut Grid) -> bool {
//!         if self.cursor.next(grid).is_some() {
//!             self.visited += 1;
//!         }
//!
//!         false
//!     }
//!
//!     fn reset(&mut self) {
//!         self.cursor.reset();
//!     }
//!
//!     fn has_finished(&self) -> bool {
//!         self.cursor.is_finished()
//!     }
//! }
//!
//! let mut grid = Grid::new(2, 2).unwrap();
//! grid.define_standard_regions().unwrap();
//! let mut technique = CountingTechnique {
//!     cursor: LeafCursor::new(),
//!     visited: 0
//! };
//!
//! while !technique.has_finished() {
//!     technique.next_step(&mut grid);
//! }
//!
//! assert_eq!(12, technique.visited);
//! ```

use crate::config::SolverConfig;
use crate::grid::Grid;
use crate::region::{Region, RegionId};

use serde::{Deserialize, Serialize};

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub mod bifurcation;
pub mod fish;
pub mod innies_outies;
pub mod locked_candidates;
pub mod subsets;

pub use bifurcation::{BifurcationTechnique, BranchOutcome};
pub use fish::FishTechnique;
pub use innies_outies::InniesAndOutiesTechnique;
pub use locked_candidates::LockedCandidatesTechnique;
pub use subsets::{HiddenSubsetTechnique, NakedSubsetTechnique};

/// Identifies one of the solving techniques.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize
)]
pub enum TechniqueKind {

    /// See [LockedCandidatesTechnique].
    LockedCandidates,

    /// See [NakedSubsetTechnique].
    NakedSubset,

    /// See [HiddenSubsetTechnique].
    HiddenSubset,

    /// See [FishTechnique].
    Fish,

    /// See [InniesAndOutiesTechnique].
    InniesAndOuties,

    /// See [BifurcationTechnique].
    Bifurcation
}

impl TechniqueKind {

    /// All techniques in the order in which the solver tries them.
    pub const ALL: [TechniqueKind; 6] = [
        TechniqueKind::LockedCandidates,
        TechniqueKind::NakedSubset,
        TechniqueKind::HiddenSubset,
        TechniqueKind::Fish,
        TechniqueKind::InniesAndOuties,
        TechniqueKind::Bifurcation
    ];
}

impl Display for TechniqueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            TechniqueKind::LockedCandidates => "locked candidates",
            TechniqueKind::NakedSubset => "naked subset",
            TechniqueKind::HiddenSubset => "hidden subset",
            TechniqueKind::Fish => "fish",
            TechniqueKind::InniesAndOuties => "innies and outies",
            TechniqueKind::Bifurcation => "bifurcation"
        };

        f.write_str(name)
    }
}

/// A trait for resumable solving techniques. See the
/// [module documentation](self) for the contract.
pub trait SolvingTechnique {

    /// Gets the kind of this technique.
    fn kind(&self) -> TechniqueKind;

    /// Performs one unit of work on the given grid and queues all deductions
    /// found on the grid's queue. Returns `true` if anything was queued.
    fn next_step(&mut self, grid: &mut Grid) -> bool;

    /// Restarts the technique from the beginning.
    fn reset(&mut self);

    /// Indicates whether the technique has nothing left to examine until it
    /// is reset.
    fn has_finished(&self) -> bool;
}

/// A resumable cursor over a snapshot of the leaf regions of a grid. The
/// snapshot is taken on the first call to [LeafCursor::next] after creation
/// or a reset. Regions that stopped being leaves since are skipped.
#[derive(Clone, Debug, Default)]
pub struct LeafCursor {
    snapshot: Option<Vec<RegionId>>,
    position: usize
}

impl LeafCursor {

    /// Creates a new cursor that takes its snapshot on first use.
    pub fn new() -> LeafCursor {
        LeafCursor::default()
    }

    /// Gets the next region of the snapshot that is still a leaf, or `None`
    /// if the snapshot is exhausted.
    pub fn next(&mut self, grid: &Grid) -> Option<RegionId> {
        let snapshot = self.snapshot
            .get_or_insert_with(|| grid.regions().leaves().collect());

        while self.position < snapshot.len() {
            let id = snapshot[self.position];
            self.position += 1;

            if grid.regions().is_leaf(id) {
                return Some(id);
            }
        }

        None
    }

    /// Forgets the snapshot, so the next call to [LeafCursor::next] starts
    /// over with the current leaves.
    pub fn reset(&mut self) {
        self.snapshot = None;
        self.position = 0;
    }

    /// Indicates whether a snapshot was taken and is exhausted.
    pub fn is_finished(&self) -> bool {
        match &self.snapshot {
            Some(snapshot) => self.position >= snapshot.len(),
            None => false
        }
    }
}

/// Indicates whether a leaf region still needs technique work, i.e. it has
/// more than one cell and at least one unsolved cell.
pub(crate) fn needs_work(grid: &Grid, region: &Region) -> bool {
    region.len() > 1 &&
        region.cells().iter().any(|&c| !grid.cells()[c].is_solved())
}

/// Creates the techniques enabled for a solver, in the order of
/// [TechniqueKind::ALL]. `depth` is the number of nested bifurcations the
/// solver may still start, and `nested` indicates whether the solver runs
/// inside a bifurcation branch, where fish are not searched. The cancel flag
/// is handed to the bifurcation, which polls it between branches.
pub(crate) fn create_techniques(config: &SolverConfig, depth: usize,
        nested: bool, cancel: Option<&Arc<AtomicBool>>)
        -> Vec<Box<dyn SolvingTechnique + Send>> {
    let mut techniques: Vec<Box<dyn SolvingTechnique + Send>> = Vec::new();

    for &kind in TechniqueKind::ALL.iter() {
        if !config.is_enabled(kind) {
            continue;
        }

        match kind {
            TechniqueKind::LockedCandidates =>
                techniques.push(Box::new(LockedCandidatesTechnique::new())),
            TechniqueKind::NakedSubset =>
                techniques.push(Box::new(
                    NakedSubsetTechnique::new(config.max_subset_size))),
            TechniqueKind::HiddenSubset =>
                techniques.push(Box::new(
                    HiddenSubsetTechnique::new(config.max_subset_size))),
            TechniqueKind::Fish => {
                if !nested {
                    techniques.push(Box::new(
                        FishTechnique::new(config.max_fish_size,
                            config.max_fins)));
                }
            },
            TechniqueKind::InniesAndOuties =>
                techniques.push(Box::new(InniesAndOutiesTechnique::new())),
            TechniqueKind::Bifurcation => {
                if depth > 0 {
                    techniques.push(Box::new(
                        BifurcationTechnique::new(config.clone(), depth,
                            cancel.cloned())));
                }
            }
        }
    }

    techniques
}
