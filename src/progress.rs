//! This module contains the [Progress] type, which describes a single
//! deduction about the grid, and the [ProgressQueue] in which deductions wait
//! until the [GridProgressManager](crate::solver::GridProgressManager) applies
//! them.
//!
//! Deductions follow the command pattern: they are created by the grid itself
//! (for example when a cell is left with a single option) or by a technique,
//! queued, and applied to the grid exactly once. Applying a deduction that has
//! become stale in the meantime is harmless, since every effect is expressed
//! as the removal of options or the confirmation of digits, which are
//! idempotent.
//!
//! Some deductions are *fatal*: they state that the puzzle, in its current
//! state, has no solution. Those have high priority and always leave the
//! queue before any other deduction.

use crate::constraint::{GhostCage, GhostKind};
use crate::grid::Grid;
use crate::region::RegionId;
use crate::util::DigitSet;

use std::collections::{HashSet, VecDeque};
use std::fmt::{self, Display, Formatter};

/// The flavor of a fish found by the fish technique.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FishKind {

    /// All candidates of the base regions are covered by the cover regions.
    Plain,

    /// Some candidates of the base regions (the fins) are not covered, so
    /// only cells that see every fin are affected.
    Finned,

    /// A candidate of the base regions is covered by two cover regions, so
    /// it can be eliminated directly.
    Cannibal
}

fn fish_name(size: usize) -> &'static str {
    match size {
        2 => "X-Wing",
        3 => "Swordfish",
        4 => "Jellyfish",
        _ => "fish"
    }
}

/// A single deduction about the grid. See the
/// [module documentation](self) for details.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Progress {

    /// A given digit was entered into a cell. Applying it removes the digit
    /// from all regions around the cell.
    GivenCellAdded {

        /// The linear id of the cell.
        cell: usize,

        /// The given digit.
        value: usize
    },

    /// Only one option is left in an unsolved cell (a naked single).
    SingleOptionLeft {

        /// The linear id of the cell.
        cell: usize
    },

    /// A digit confirmed in a region can only go into one of its cells (a
    /// hidden single).
    HiddenSingle {

        /// The region in which the digit has a single host.
        region: RegionId,

        /// The linear id of the host cell.
        cell: usize,

        /// The digit.
        value: usize
    },

    /// A region became closed, so its cells form a closed subset in every
    /// other region containing them.
    RegionBecameClosed {

        /// The closed region.
        region: RegionId
    },

    /// The options of a cell in a killer cage changed, so the placements of
    /// the cage's combinations must be checked.
    CheckCage {

        /// The region carrying the killer constraint.
        region: RegionId
    },

    /// All candidates of a confirmed digit in a region lie in cells that are
    /// seen by other cells, or contained in other regions.
    LockedCandidates {

        /// The region in which the digit is locked.
        region: RegionId,

        /// The locked digit.
        value: usize,

        /// The cells from which the digit is eliminated.
        eliminations: Vec<usize>,

        /// The regions in which the digit is confirmed.
        confirm_in: Vec<RegionId>
    },

    /// A set of cells in a region whose options together contain exactly as
    /// many digits as there are cells.
    NakedSubset {

        /// The region in which the subset was found.
        region: RegionId,

        /// The cells of the subset.
        cells: Vec<usize>,

        /// The digits of the subset.
        values: DigitSet
    },

    /// A set of confirmed digits in a region which together can only go into
    /// as many cells as there are digits.
    HiddenSubset {

        /// The region in which the subset was found.
        region: RegionId,

        /// The cells of the subset.
        cells: Vec<usize>,

        /// The digits of the subset.
        values: DigitSet
    },

    /// A fish pattern on a digit.
    Fish {

        /// The digit.
        value: usize,

        /// The number of base (and cover) regions.
        size: usize,

        /// The flavor of the fish.
        kind: FishKind,

        /// The base regions, in each of which the digit is confirmed.
        base: Vec<RegionId>,

        /// The cover regions, which contain all non-fin candidates of the
        /// base regions.
        cover: Vec<RegionId>,

        /// The cells from which the digit is eliminated.
        eliminations: Vec<usize>
    },

    /// The options of some cells of a killer cage were reduced to the digits
    /// used by a placement of one of its combinations.
    CageCombinationElimination {

        /// The region carrying the killer constraint.
        region: RegionId,

        /// The linear id of the cell.
        cell: usize,

        /// The digits eliminated from the cell.
        values: DigitSet
    },

    /// An innie or outie was derived from a house and the killer cages
    /// around it.
    GhostCageFound {

        /// The derived cage.
        cage: GhostCage
    },

    /// A sum-only ghost cage rules out some options of a cell.
    GhostCageElimination {

        /// The linear id of the cell.
        cell: usize,

        /// The digits eliminated from the cell.
        values: DigitSet
    },

    /// Assuming a digit in a cell led to a contradiction.
    ValueRemovedByGuess {

        /// The linear id of the pivot cell.
        cell: usize,

        /// The digit that was guessed.
        value: usize
    },

    /// Digits of a cell that were eliminated in every valid branch of a
    /// bifurcation.
    BifurcationElimination {

        /// The linear id of the pivot cell of the bifurcation.
        pivot: usize,

        /// The linear id of the affected cell.
        cell: usize,

        /// The eliminated digits.
        values: DigitSet
    },

    /// A digit was placed in a cell that already holds a different given
    /// digit, or a given digit is not an option of its cell.
    ClashWithGiven {

        /// The linear id of the cell.
        cell: usize,

        /// The clashing digit.
        value: usize
    },

    /// A digit was placed in a cell that is already solved with a different
    /// digit, or that does not have the digit as an option.
    ClashWithSolved {

        /// The linear id of the cell.
        cell: usize,

        /// The clashing digit.
        value: usize
    },

    /// The given digit of a cell was eliminated.
    ImpossibleGivenCell {

        /// The linear id of the cell.
        cell: usize
    },

    /// The committed digit of a cell was eliminated.
    ImpossibleSolvedCell {

        /// The linear id of the cell.
        cell: usize
    },

    /// An unsolved cell has no options left.
    ImpossibleEmptyCell {

        /// The linear id of the cell.
        cell: usize
    },

    /// A digit that must appear in a region has no cell left to go into, or
    /// a digit that is not allowed was confirmed.
    NoCellLeftForValueInRegion {

        /// The region.
        region: RegionId,

        /// The digit.
        value: usize
    },

    /// A region allows fewer digits than it has cells.
    TooFewValuesForRegion {

        /// The region.
        region: RegionId
    },

    /// A region confirms more digits than it has cells.
    TooManyValuesForRegion {

        /// The region.
        region: RegionId
    },

    /// A region was split along cells that are not a proper subset of it.
    InconsistentPartition {

        /// The region.
        region: RegionId
    },

    /// The candidates of a digit in some base regions are covered by fewer
    /// regions than there are bases.
    InvalidFish {

        /// The digit.
        value: usize,

        /// The number of base regions.
        size: usize
    },

    /// No combination of a killer cage can be placed anymore.
    NoValidKillerSum {

        /// The region carrying the killer constraint.
        region: RegionId
    },

    /// Every branch of a bifurcation led to a contradiction.
    NoValidBifurcationBranch {

        /// The linear id of the pivot cell.
        cell: usize
    },

    /// A derived innie or outie cannot be satisfied.
    BrokenGhostCage {

        /// The cells of the derived cage.
        cells: Vec<usize>,

        /// The derived total.
        total: i64,

        /// How the cage was derived.
        kind: GhostKind
    }
}

impl Progress {

    /// Indicates whether this deduction states that the puzzle has no
    /// solution. These are exactly the high-priority deductions.
    pub fn is_high_priority(&self) -> bool {
        matches!(self,
            Progress::ClashWithGiven { .. } |
            Progress::ClashWithSolved { .. } |
            Progress::ImpossibleGivenCell { .. } |
            Progress::ImpossibleSolvedCell { .. } |
            Progress::ImpossibleEmptyCell { .. } |
            Progress::NoCellLeftForValueInRegion { .. } |
            Progress::TooFewValuesForRegion { .. } |
            Progress::TooManyValuesForRegion { .. } |
            Progress::InconsistentPartition { .. } |
            Progress::InvalidFish { .. } |
            Progress::NoValidKillerSum { .. } |
            Progress::NoValidBifurcationBranch { .. } |
            Progress::BrokenGhostCage { .. })
    }

    /// Equivalent to [Progress::is_high_priority].
    pub fn is_fatal(&self) -> bool {
        self.is_high_priority()
    }

    /// Applies the effect of this deduction to the given grid. Fatal
    /// deductions mark the grid as broken.
    pub fn apply(&self, grid: &mut Grid) {
        match self {
            Progress::GivenCellAdded { cell, value } => {
                if grid.cells[*cell].value() == *value {
                    grid.register_closed_subset(&[*cell],
                        DigitSet::singleton(*value));
                }
            },
            Progress::SingleOptionLeft { cell } => {
                let options = grid.cells[*cell].options();

                if let (Some(value), 1) = (options.min(), options.len()) {
                    grid.place_value(*cell, value);
                }
            },
            Progress::HiddenSingle { cell, value, .. } =>
                grid.place_value(*cell, *value),
            Progress::RegionBecameClosed { region } => {
                let region = grid.regions.get(*region);

                if region.is_closed() {
                    let cells = region.cells().to_vec();
                    let values = region.confirmed();
                    grid.register_closed_subset(&cells, values);
                }
            },
            Progress::CheckCage { region } => grid.check_cage(*region),
            Progress::LockedCandidates {
                value,
                eliminations,
                confirm_in,
                ..
            } => {
                for &cell in eliminations.iter() {
                    grid.eliminate(cell, DigitSet::singleton(*value));
                }

                for &region in confirm_in.iter() {
                    if grid.regions.is_leaf(region) {
                        grid.add_confirmed_value(region, *value);
                    }
                }

                grid.settle();
            },
            Progress::NakedSubset { cells, values, .. } => {
                let seeing = grid.regions.cells_seeing_all(
                    cells.iter().cloned());

                for cell in seeing.iter() {
                    grid.eliminate(cell, *values);
                }

                grid.register_closed_subset(cells, *values);
            },
            Progress::HiddenSubset { cells, values, .. } => {
                for &cell in cells.iter() {
                    let others = grid.cells[cell].options() - *values;
                    grid.eliminate(cell, others);
                }

                grid.register_closed_subset(cells, *values);
            },
            Progress::Fish { value, eliminations, .. } => {
                for &cell in eliminations.iter() {
                    grid.eliminate(cell, DigitSet::singleton(*value));
                }

                grid.settle();
            },
            Progress::GhostCageFound { cage } =>
                grid.register_ghost(cage.clone()),
            Progress::ValueRemovedByGuess { cell, value } =>
                grid.discard_options(*cell, DigitSet::singleton(*value)),
            Progress::CageCombinationElimination { cell, values, .. } |
            Progress::GhostCageElimination { cell, values } |
            Progress::BifurcationElimination { cell, values, .. } => {
                grid.eliminate(*cell, *values);
                grid.settle();
            },
            _ => grid.mark_broken()
        }
    }
}

fn cell_name(cell: usize) -> String {
    format!("cell #{}", cell)
}

fn cell_list(cells: &[usize]) -> String {
    let names: Vec<String> = cells.iter().map(|c| format!("#{}", c)).collect();
    format!("cells {}", names.join(", "))
}

impl Display for Progress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Progress::GivenCellAdded { cell, value } =>
                write!(f, "{} is given as {}", cell_name(*cell), value),
            Progress::SingleOptionLeft { cell } =>
                write!(f, "{} has a single option left", cell_name(*cell)),
            Progress::HiddenSingle { region, cell, value } =>
                write!(f, "{} can only go into {} in region {}", value,
                    cell_name(*cell), region),
            Progress::RegionBecameClosed { region } =>
                write!(f, "region {} is closed", region),
            Progress::CheckCage { region } =>
                write!(f, "checked the combinations of killer region {}",
                    region),
            Progress::LockedCandidates { region, value, eliminations, .. } =>
                write!(f, "{} is locked in region {}, eliminated from {}",
                    value, region, cell_list(eliminations)),
            Progress::NakedSubset { region, cells, values } =>
                write!(f, "naked subset {} on {} in region {}", values,
                    cell_list(cells), region),
            Progress::HiddenSubset { region, cells, values } =>
                write!(f, "hidden subset {} on {} in region {}", values,
                    cell_list(cells), region),
            Progress::Fish { value, size, kind, eliminations, .. } => {
                let flavor = match kind {
                    FishKind::Plain => "",
                    FishKind::Finned => "finned ",
                    FishKind::Cannibal => "cannibal "
                };

                write!(f, "{}{} on {}, eliminated from {}", flavor,
                    fish_name(*size), value, cell_list(eliminations))
            },
            Progress::CageCombinationElimination { region, cell, values } =>
                write!(f, "killer region {} rules out {} in {}", region,
                    values, cell_name(*cell)),
            Progress::GhostCageFound { cage } =>
                write!(f, "{:?} of total {} on {}", cage.kind, cage.total,
                    cell_list(&cage.cells)),
            Progress::GhostCageElimination { cell, values } =>
                write!(f, "ghost cage rules out {} in {}", values,
                    cell_name(*cell)),
            Progress::ValueRemovedByGuess { cell, value } =>
                write!(f, "guessing {} in {} leads to a contradiction", value,
                    cell_name(*cell)),
            Progress::BifurcationElimination { pivot, cell, values } =>
                write!(f, "every branch on {} rules out {} in {}",
                    cell_name(*pivot), values, cell_name(*cell)),
            Progress::ClashWithGiven { cell, value } =>
                write!(f, "{} clashes with the given digit of {}", value,
                    cell_name(*cell)),
            Progress::ClashWithSolved { cell, value } =>
                write!(f, "{} clashes with the digit of {}", value,
                    cell_name(*cell)),
            Progress::ImpossibleGivenCell { cell } =>
                write!(f, "the given digit of {} was eliminated",
                    cell_name(*cell)),
            Progress::ImpossibleSolvedCell { cell } =>
                write!(f, "the digit of {} was eliminated", cell_name(*cell)),
            Progress::ImpossibleEmptyCell { cell } =>
                write!(f, "{} has no options left", cell_name(*cell)),
            Progress::NoCellLeftForValueInRegion { region, value } =>
                write!(f, "no cell left for {} in region {}", value, region),
            Progress::TooFewValuesForRegion { region } =>
                write!(f, "too few digits left for region {}", region),
            Progress::TooManyValuesForRegion { region } =>
                write!(f, "too many digits required in region {}", region),
            Progress::InconsistentPartition { region } =>
                write!(f, "inconsistent partition of region {}", region),
            Progress::InvalidFish { value, size } =>
                write!(f, "invalid {} on {}", fish_name(*size), value),
            Progress::NoValidKillerSum { region } =>
                write!(f, "no valid sum left for killer region {}", region),
            Progress::NoValidBifurcationBranch { cell } =>
                write!(f, "every guess in {} leads to a contradiction",
                    cell_name(*cell)),
            Progress::BrokenGhostCage { cells, total, kind } =>
                write!(f, "{:?} of total {} on {} is impossible", kind, total,
                    cell_list(cells))
        }
    }
}

/// The queue of pending deductions, with one FIFO for fatal deductions and
/// one for all others. Deductions equal to one that is still queued are
/// dropped.
#[derive(Clone, Debug, Default)]
pub struct ProgressQueue {
    high: VecDeque<Progress>,
    normal: VecDeque<Progress>,
    queued: HashSet<Progress>
}

impl ProgressQueue {

    /// Creates a new, empty queue.
    pub fn new() -> ProgressQueue {
        ProgressQueue::default()
    }

    /// Adds a deduction to the queue matching its priority. Returns `false`
    /// if an equal deduction is already queued.
    pub fn push(&mut self, progress: Progress) -> bool {
        if !self.queued.insert(progress.clone()) {
            return false;
        }

        if progress.is_high_priority() {
            self.high.push_back(progress);
        }
        else {
            self.normal.push_back(progress);
        }

        true
    }

    /// Removes the next deduction, preferring fatal ones.
    pub fn pop(&mut self) -> Option<Progress> {
        let progress = self.high.pop_front()
            .or_else(|| self.normal.pop_front())?;
        self.queued.remove(&progress);
        Some(progress)
    }

    /// Indicates whether a fatal deduction is queued.
    pub fn has_high_priority(&self) -> bool {
        !self.high.is_empty()
    }

    /// Gets the number of queued deductions.
    pub fn len(&self) -> usize {
        self.high.len() + self.normal.len()
    }

    /// Indicates whether no deduction is queued.
    pub fn is_empty(&self) -> bool {
        self.high.is_empty() && self.normal.is_empty()
    }

    /// Iterates over the queued deductions in the order they would be
    /// popped.
    pub fn iter(&self) -> impl Iterator<Item = &Progress> {
        self.high.iter().chain(self.normal.iter())
    }

    /// Removes all deductions.
    pub fn clear(&mut self) {
        self.high.clear();
        self.normal.clear();
        self.queued.clear();
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn fatal_deductions_leave_first() {
        let mut queue = ProgressQueue::new();
        queue.push(Progress::SingleOptionLeft { cell: 1 });
        queue.push(Progress::ImpossibleEmptyCell { cell: 2 });
        queue.push(Progress::SingleOptionLeft { cell: 3 });

        assert!(queue.has_high_priority());
        assert_eq!(Some(Progress::ImpossibleEmptyCell { cell: 2 }),
            queue.pop());
        assert_eq!(Some(Progress::SingleOptionLeft { cell: 1 }), queue.pop());
        assert_eq!(Some(Progress::SingleOptionLeft { cell: 3 }), queue.pop());
        assert_eq!(None, queue.pop());
    }

    #[test]
    fn equal_deductions_are_queued_once() {
        let mut queue = ProgressQueue::new();
        assert!(queue.push(Progress::CheckCage { region: 4 }));
        assert!(!queue.push(Progress::CheckCage { region: 4 }));
        assert_eq!(1, queue.len());

        queue.pop();
        assert!(queue.push(Progress::CheckCage { region: 4 }));
    }

    #[test]
    fn priorities_of_kinds() {
        assert!(Progress::NoValidKillerSum { region: 0 }.is_high_priority());
        assert!(Progress::InvalidFish { value: 1, size: 2 }.is_fatal());
        assert!(!Progress::ValueRemovedByGuess { cell: 0, value: 1 }
            .is_high_priority());
        assert!(!Progress::RegionBecameClosed { region: 0 }
            .is_high_priority());
    }

    #[test]
    fn messages_name_the_technique() {
        let fish = Progress::Fish {
            value: 3,
            size: 2,
            kind: FishKind::Finned,
            base: vec![0, 1],
            cover: vec![4, 5],
            eliminations: vec![7]
        };

        assert_eq!("finned X-Wing on 3, eliminated from cells #7",
            fish.to_string());
        assert_eq!("no cell left for 3 in region 2",
            Progress::NoCellLeftForValueInRegion { region: 2, value: 3 }
                .to_string());
    }
}
