//! This module contains the [Region] type and its bookkeeping structures.
//!
//! A region is a set of cells in which every digit appears at most once.
//! Regions defined by the puzzle (rows, columns, boxes, diagonals, generic
//! regions and killer cages) are called *starting regions*. Whenever a subset
//! of a region's cells is found to contain exactly a known set of digits, the
//! region is split into a *left* child (the subset) and a *right* child (the
//! rest). This yields a binary partition tree per starting region, whose
//! leaves are the only regions that techniques operate on.
//!
//! Regions are stored in an arena owned by the [RegionsManager] and referenced
//! by their [RegionId]. Parent and child links are ids into that arena, so a
//! region which is the child of two different splits simply lists both
//! parents.
//!
//! The operations that modify regions, such as confirming a digit or
//! partitioning a region, are defined on the [Grid](crate::Grid), since they
//! cascade into the cells.

pub mod manager;
pub mod updates;

pub use manager::RegionsManager;
pub use updates::{HotSet, RegionUpdatesManager};

use crate::cell::Cell;
use crate::constraint::VariantConstraint;
use crate::util::{CellSet, DigitSet};

/// The index of a [Region] in the arena of its [RegionsManager].
pub type RegionId = usize;

/// The kind of a region, which indicates where it came from.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum RegionKind {

    /// A row of the grid.
    Row,

    /// A column of the grid.
    Column,

    /// A box (block) of the grid.
    Box,

    /// One of the two main diagonals.
    Diagonal,

    /// Any other region defined by the puzzle without a sum.
    Generic,

    /// A killer cage defined by the puzzle.
    KillerCage,

    /// A region created by splitting another region.
    Derived,

    /// A ghost cage derived from a house and the killer cages around it.
    Ghost
}

impl RegionKind {

    /// Indicates whether regions of this kind are defined by the puzzle (or
    /// derived ghost cages, which act as such) as opposed to being created by
    /// a split.
    pub fn is_starting(self) -> bool {
        self != RegionKind::Derived
    }

    /// Indicates whether regions of this kind are defined by the puzzle
    /// setter and therefore take part in the exact cover encoding.
    pub fn is_defined_by_puzzle(self) -> bool {
        !matches!(self, RegionKind::Derived | RegionKind::Ghost)
    }
}

/// The children of a split region. A region that was merged with a congruent
/// region has only a right child.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Children {

    /// The part of the region that was found to contain exactly a known set
    /// of digits, if this was a split.
    pub left: Option<RegionId>,

    /// The remainder of the region, or the congruent region it was merged
    /// with.
    pub right: RegionId
}

/// A set of cells in which every digit appears at most once, together with
/// the digits it must contain (*confirmed*) and the digits it may contain
/// (*allowed*).
///
/// A region is closed once the number of confirmed digits, the number of
/// allowed digits, and the number of cells agree. At that point each cell can
/// only contain a confirmed digit.
#[derive(Clone, Debug)]
pub struct Region {
    pub(crate) id: RegionId,
    pub(crate) kind: RegionKind,
    pub(crate) cells: Vec<usize>,
    pub(crate) cell_set: CellSet,
    pub(crate) confirmed: DigitSet,
    pub(crate) allowed: DigitSet,
    pub(crate) constraint: Option<VariantConstraint>,
    pub(crate) parents: Vec<RegionId>,
    pub(crate) children: Option<Children>,
    pub(crate) closed: bool
}

impl Region {

    pub(crate) fn new(id: RegionId, kind: RegionKind, mut cells: Vec<usize>,
            cell_count: usize, allowed: DigitSet, confirmed: DigitSet)
            -> Region {
        cells.sort_unstable();
        let cell_set = CellSet::from_cells(cell_count, cells.iter().cloned());

        Region {
            id,
            kind,
            cells,
            cell_set,
            confirmed,
            allowed,
            constraint: None,
            parents: Vec::new(),
            children: None,
            closed: false
        }
    }

    /// Gets the id of this region.
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Gets the kind of this region.
    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    /// Gets the linear ids of the cells of this region in ascending order.
    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    /// Gets the cells of this region as a [CellSet].
    pub fn cell_set(&self) -> &CellSet {
        &self.cell_set
    }

    /// Gets the number of cells in this region.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Indicates whether this region has no cells. This is never the case for
    /// regions managed by a grid.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Gets the digits which must appear in this region.
    pub fn confirmed(&self) -> DigitSet {
        self.confirmed
    }

    /// Gets the digits which may appear in this region.
    pub fn allowed(&self) -> DigitSet {
        self.allowed
    }

    /// Gets the variant constraint attached to this region, if any.
    pub fn constraint(&self) -> Option<&VariantConstraint> {
        self.constraint.as_ref()
    }

    /// Gets the regions this region is a child of.
    pub fn parents(&self) -> &[RegionId] {
        &self.parents
    }

    /// Gets the children of this region, if it was split or merged.
    pub fn children(&self) -> Option<Children> {
        self.children
    }

    /// Indicates whether this region is a leaf of the partition tree.
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Indicates whether the confirmed digits, the allowed digits and the
    /// cells of this region have the same count.
    pub fn is_closed(&self) -> bool {
        let len = self.cells.len();
        self.confirmed.len() == len && self.allowed.len() == len
    }

    /// Gets the position of the given cell within [Region::cells], if it is
    /// contained.
    pub fn position(&self, cell: usize) -> Option<usize> {
        self.cells.binary_search(&cell).ok()
    }

    /// Indicates whether the given cell belongs to this region.
    pub fn contains(&self, cell: usize) -> bool {
        self.cell_set.contains(cell)
    }

    /// Gets the cells of this region which still have `digit` as an option.
    pub fn hosts(&self, cells: &[Cell], digit: usize) -> Vec<usize> {
        self.cells.iter()
            .cloned()
            .filter(|&c| cells[c].options().contains(digit))
            .collect()
    }

    /// Counts the cells of this region which still have `digit` as an option.
    pub fn host_count(&self, cells: &[Cell], digit: usize) -> usize {
        self.cells.iter()
            .filter(|&&c| cells[c].options().contains(digit))
            .count()
    }

    /// Gets the union of the options of all cells of this region.
    pub fn options_union(&self, cells: &[Cell]) -> DigitSet {
        self.cells.iter()
            .fold(DigitSet::new(), |acc, &c| acc | cells[c].options())
    }

    /// Gets the cells of this region to which no digit was committed yet.
    pub fn unsolved_cells(&self, cells: &[Cell]) -> Vec<usize> {
        self.cells.iter()
            .cloned()
            .filter(|&c| !cells[c].is_solved())
            .collect()
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn cells(size: usize) -> Vec<Cell> {
        (0..size * size)
            .map(|id| Cell::new(id, id / size, id % size, size))
            .collect()
    }

    #[test]
    fn new_region_sorts_cells() {
        let region = Region::new(0, RegionKind::Generic, vec![5, 1, 3], 16,
            DigitSet::range(4), DigitSet::new());

        assert_eq!(&[1, 3, 5], region.cells());
        assert_eq!(Some(1), region.position(3));
        assert_eq!(None, region.position(2));
        assert!(region.contains(5));
        assert!(region.is_leaf());
        assert!(!region.is_closed());
    }

    #[test]
    fn hosts_follow_cell_options() {
        let mut cells = cells(4);
        cells[1].set_options(DigitSet::singleton(2));
        let region = Region::new(0, RegionKind::Row, vec![0, 1, 2, 3], 16,
            DigitSet::range(4), DigitSet::range(4));

        assert_eq!(vec![0, 2, 3], region.hosts(&cells, 1));
        assert_eq!(4, region.host_count(&cells, 2));
        assert!(region.is_closed());
    }

    #[test]
    fn derived_regions_are_not_starting() {
        assert!(!RegionKind::Derived.is_starting());
        assert!(RegionKind::Ghost.is_starting());
        assert!(!RegionKind::Ghost.is_defined_by_puzzle());
        assert!(RegionKind::KillerCage.is_defined_by_puzzle());
    }
}
