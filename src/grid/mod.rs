//! This module contains the [Grid], which owns the cells, the regions and the
//! queue of pending deductions of a puzzle.
//!
//! A grid is constructed through a small mutation API: it is created with its
//! dimensions, its regions are defined with [Grid::define_region] (or the
//! convenience methods [Grid::define_standard_regions],
//! [Grid::define_diagonals] and [Grid::define_killer_cage]), and the puzzle's
//! digits are entered with [Grid::add_given_cell] or
//! [Grid::set_cell_options]. Every change to a cell is reported to the
//! observer registered with [Grid::set_observer].
//!
//! The grid keeps the regions consistent with the cells by itself, i.e.
//! removing an option from a cell updates all regions containing the cell
//! and queues the resulting deductions. Applying those deductions and running
//! the solving techniques is the task of the
//! [GridProgressManager](crate::solver::GridProgressManager).
//!
//! ```
//! use sudoku_regions::Grid;
//!
//! let mut grid = Grid::new(2, 2).unwrap();
//! grid.define_standard_regions().unwrap();
//! grid.add_given_cell(0, 0, 1).unwrap();
//!
//! assert_eq!(1, grid.value_get(0, 0).unwrap());
//! assert!(grid.is_given(0, 0).unwrap());
//! assert!(!grid.is_solved());
//! ```

mod partition;

use crate::cell::{Cell, CellChange};
use crate::constraint::{GhostCagesManager, VariantConstraint};
use crate::error::{SudokuError, SudokuResult};
use crate::journal::{Journal, Undo};
use crate::progress::{Progress, ProgressQueue};
use crate::region::{
    Region,
    RegionId,
    RegionKind,
    RegionsManager,
    RegionUpdatesManager
};
use crate::util::{self, DigitSet, MAX_DIGIT};

use std::collections::BTreeSet;
use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

static REVISIONS: AtomicU64 = AtomicU64::new(0);

/// Hands out revisions that are unique among all grids of the process, so
/// two grids only share a revision if one is an unedited clone of the other.
fn next_revision() -> u64 {
    REVISIONS.fetch_add(1, Ordering::Relaxed) + 1
}

/// The type of the observer that is notified about every committed change to
/// a cell.
pub type CellObserver = Box<dyn FnMut(CellChange) + Send>;

#[derive(Clone, Debug)]
struct RegionDefinition {
    cells: Vec<usize>,
    kind: RegionKind,
    constraint: Option<VariantConstraint>
}

/// A puzzle grid of `size`x`size` cells containing digits from 1 to `size`,
/// together with its regions and pending deductions. See the
/// [module documentation](self) for an overview.
pub struct Grid {
    pub(crate) size: usize,
    pub(crate) boxes: Option<(usize, usize)>,
    pub(crate) cells: Vec<Cell>,
    pub(crate) regions: RegionsManager,
    pub(crate) updates: RegionUpdatesManager,
    pub(crate) ghosts: GhostCagesManager,
    pub(crate) queue: ProgressQueue,
    pub(crate) journal: Journal,
    pending: BTreeSet<RegionId>,
    settling: bool,
    broken: bool,
    changes: u64,
    revision: u64,
    definitions: Vec<RegionDefinition>,
    observer: Option<CellObserver>
}

impl Clone for Grid {

    /// Clones the grid without its observer and without the journal's
    /// transaction, so the clone can be used as a scratch grid.
    fn clone(&self) -> Grid {
        Grid {
            size: self.size,
            boxes: self.boxes,
            cells: self.cells.clone(),
            regions: self.regions.clone(),
            updates: self.updates.clone(),
            ghosts: self.ghosts.clone(),
            queue: self.queue.clone(),
            journal: Journal::new(),
            pending: self.pending.clone(),
            settling: false,
            broken: self.broken,
            changes: self.changes,
            revision: self.revision,
            definitions: self.definitions.clone(),
            observer: None
        }
    }
}

impl Debug for Grid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("size", &self.size)
            .field("boxes", &self.boxes)
            .field("values", &self.values())
            .field("broken", &self.broken)
            .finish()
    }
}

impl Grid {

    fn with_dimensions(size: usize, boxes: Option<(usize, usize)>)
            -> SudokuResult<Grid> {
        if size == 0 || size > MAX_DIGIT {
            return Err(SudokuError::InvalidDimensions);
        }

        let cell_count = size * size;
        let cells = (0..cell_count)
            .map(|id| Cell::new(id, id / size, id % size, size))
            .collect();

        Ok(Grid {
            size,
            boxes,
            cells,
            regions: RegionsManager::new(cell_count),
            updates: RegionUpdatesManager::new(),
            ghosts: GhostCagesManager::new(),
            queue: ProgressQueue::new(),
            journal: Journal::new(),
            pending: BTreeSet::new(),
            settling: false,
            broken: false,
            changes: 0,
            revision: next_revision(),
            definitions: Vec::new(),
            observer: None
        })
    }

    /// Creates a new, empty grid divided into boxes of the given width and
    /// height. The grid has a size (width and height) of
    /// `block_width * block_height`. No regions are defined yet; use
    /// [Grid::define_standard_regions] to add rows, columns and boxes.
    ///
    /// # Errors
    ///
    /// `SudokuError::InvalidDimensions` if either dimension is zero or the
    /// size exceeds [MAX_DIGIT].
    pub fn new(block_width: usize, block_height: usize)
            -> SudokuResult<Grid> {
        let size = block_width.checked_mul(block_height)
            .ok_or(SudokuError::InvalidDimensions)?;

        if block_width == 0 || block_height == 0 {
            return Err(SudokuError::InvalidDimensions);
        }

        Grid::with_dimensions(size, Some((block_width, block_height)))
    }

    /// Creates a new, empty grid of the given size without boxes. This is
    /// useful for puzzles with irregular regions, which are defined with
    /// [Grid::define_region].
    ///
    /// # Errors
    ///
    /// `SudokuError::InvalidDimensions` if the size is zero or exceeds
    /// [MAX_DIGIT].
    pub fn with_size(size: usize) -> SudokuResult<Grid> {
        Grid::with_dimensions(size, None)
    }

    /// Gets the size of this grid, which is its width, its height, and the
    /// largest digit.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Gets the width and height of the boxes, if the grid has boxes.
    pub fn boxes(&self) -> Option<(usize, usize)> {
        self.boxes
    }

    /// Gets the number of cells, i.e. `size * size`.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Gets all cells in order of their linear id.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Gets the regions of this grid.
    pub fn regions(&self) -> &RegionsManager {
        &self.regions
    }

    /// Gets the deductions that are queued but not applied yet.
    pub fn queue(&self) -> &ProgressQueue {
        &self.queue
    }

    /// Gets the linear id of the cell in the given row and column.
    ///
    /// # Errors
    ///
    /// `SudokuError::OutOfBounds` if either coordinate is at least the size.
    pub fn cell_id(&self, row: usize, column: usize) -> SudokuResult<usize> {
        if row >= self.size || column >= self.size {
            Err(SudokuError::OutOfBounds)
        }
        else {
            Ok(row * self.size + column)
        }
    }

    /// Gets the cell in the given row and column.
    ///
    /// # Errors
    ///
    /// `SudokuError::OutOfBounds` if either coordinate is at least the size.
    pub fn cell(&self, row: usize, column: usize) -> SudokuResult<&Cell> {
        let id = self.cell_id(row, column)?;
        Ok(&self.cells[id])
    }

    /// Gets the options of the cell in the given row and column.
    ///
    /// # Errors
    ///
    /// `SudokuError::OutOfBounds` if either coordinate is at least the size.
    pub fn options_get(&self, row: usize, column: usize)
            -> SudokuResult<DigitSet> {
        self.cell(row, column).map(|c| c.options())
    }

    /// Gets the digits hinted as eliminated in the cell in the given row and
    /// column.
    ///
    /// # Errors
    ///
    /// `SudokuError::OutOfBounds` if either coordinate is at least the size.
    pub fn hinted_eliminations_get(&self, row: usize, column: usize)
            -> SudokuResult<DigitSet> {
        self.cell(row, column).map(|c| c.hinted_eliminations())
    }

    /// Gets the digit of the cell in the given row and column, or 0 if it is
    /// not solved.
    ///
    /// # Errors
    ///
    /// `SudokuError::OutOfBounds` if either coordinate is at least the size.
    pub fn value_get(&self, row: usize, column: usize) -> SudokuResult<usize> {
        self.cell(row, column).map(|c| c.value())
    }

    /// Indicates whether the digit of the cell in the given row and column
    /// was given by the puzzle.
    ///
    /// # Errors
    ///
    /// `SudokuError::OutOfBounds` if either coordinate is at least the size.
    pub fn is_given(&self, row: usize, column: usize) -> SudokuResult<bool> {
        self.cell(row, column).map(|c| c.is_given())
    }

    /// Gets all starting regions of the given kind in order of definition.
    pub fn regions_of_kind(&self, kind: RegionKind) -> Vec<&Region> {
        self.regions.starting_of_kind(kind)
            .into_iter()
            .map(|id| self.regions.get(id))
            .collect()
    }

    /// Gets the values of all cells in order of their linear id, with 0 for
    /// unsolved cells.
    pub fn values(&self) -> Vec<usize> {
        self.cells.iter().map(|c| c.value()).collect()
    }

    /// Indicates whether every cell is solved and no contradiction was found.
    pub fn is_solved(&self) -> bool {
        !self.broken && self.cells.iter().all(|c| c.is_solved())
    }

    /// Indicates whether a contradiction was applied to this grid, meaning
    /// the puzzle has no solution.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Gets the values of all cells if the grid is solved.
    pub fn solution_values(&self) -> Option<Vec<usize>> {
        if self.is_solved() {
            Some(self.values())
        }
        else {
            None
        }
    }

    /// Gets a revision number that changes with every call to the public
    /// mutation API, but not with deductions. Revisions are unique across
    /// grids. Solvers that cache results derived from the puzzle compare it
    /// to detect edits.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Gets a counter that is increased by every change to a cell or region,
    /// including those made by deductions.
    pub fn change_count(&self) -> u64 {
        self.changes
    }

    /// Iterates over the regions as the puzzle defined them, i.e. with their
    /// original cells and unrestricted constraints.
    pub(crate) fn definitions(&self)
            -> impl Iterator<Item = (&[usize], RegionKind, Option<&VariantConstraint>)> {
        self.definitions.iter()
            .map(|d| (d.cells.as_slice(), d.kind, d.constraint.as_ref()))
    }

    /// Registers an observer that is notified about every committed change
    /// to a cell, replacing any previous observer.
    pub fn set_observer(&mut self, observer: CellObserver) {
        self.observer = Some(observer);
    }

    /// Removes the observer, if any.
    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    fn notify(&mut self, change: CellChange) {
        if let Some(observer) = self.observer.as_mut() {
            observer(change);
        }
    }

    fn check_digit(&self, digit: usize) -> SudokuResult<()> {
        if digit == 0 || digit > self.size {
            Err(SudokuError::InvalidNumber)
        }
        else {
            Ok(())
        }
    }

    fn check_digits(&self, digits: DigitSet) -> SudokuResult<()> {
        if digits.is_subset(DigitSet::range(self.size)) {
            Ok(())
        }
        else {
            Err(SudokuError::InvalidNumber)
        }
    }

    /// Enters a given digit into the cell in the given row and column. A
    /// value of 0 is ignored. If the digit is not an option of the cell, a
    /// fatal [Progress::ClashWithGiven] is queued.
    ///
    /// # Errors
    ///
    /// * `SudokuError::OutOfBounds` if either coordinate is at least the
    /// size.
    /// * `SudokuError::InvalidNumber` if `value` is greater than the size.
    pub fn add_given_cell(&mut self, row: usize, column: usize, value: usize)
            -> SudokuResult<()> {
        let id = self.cell_id(row, column)?;
        self.make_given(id, value)
    }

    /// Restricts the options of the cell in the given row and column to the
    /// given digits. Options can only be removed, so digits in `options`
    /// which the cell no longer has are ignored.
    ///
    /// # Errors
    ///
    /// * `SudokuError::OutOfBounds` if either coordinate is at least the
    /// size.
    /// * `SudokuError::InvalidNumber` if `options` contains a digit greater
    /// than the size.
    pub fn set_cell_options(&mut self, row: usize, column: usize,
            options: DigitSet) -> SudokuResult<()> {
        let id = self.cell_id(row, column)?;
        self.check_digits(options)?;
        self.revision = next_revision();
        let removed = self.cells[id].options() - options;
        self.eliminate(id, removed);
        self.settle();
        Ok(())
    }

    /// Sets the digits which the user marked as eliminated in the cell in the
    /// given row and column. Hints do not take part in logical deduction, but
    /// the brute force solver can use them as constraints.
    ///
    /// # Errors
    ///
    /// * `SudokuError::OutOfBounds` if either coordinate is at least the
    /// size.
    /// * `SudokuError::InvalidNumber` if `hints` contains a digit greater
    /// than the size.
    pub fn set_cell_elimination_hints(&mut self, row: usize, column: usize,
            hints: DigitSet) -> SudokuResult<()> {
        let id = self.cell_id(row, column)?;
        self.check_digits(hints)?;
        self.revision = next_revision();
        self.journal.record_cell(&self.cells[id]);
        self.cells[id].set_hinted_eliminations(hints);
        Ok(())
    }

    /// Defines a new starting region consisting of the cells at the given
    /// `(row, column)` coordinates, optionally with a variant constraint.
    /// The cells' options are restricted to the digits the region allows and
    /// the resulting deductions are queued. Returns the id of the new region.
    ///
    /// If a leaf region with exactly the same cells exists already, the new
    /// region is merged into it: the existing leaf gets the new region as
    /// its only child.
    ///
    /// # Errors
    ///
    /// * `SudokuError::EmptyRegion` if `cells` is empty.
    /// * `SudokuError::OutOfBounds` if any coordinate is at least the size.
    /// * `SudokuError::DuplicateCells` if a cell is listed twice.
    /// * `SudokuError::RegionTooLarge` if there are more cells than digits.
    /// * `SudokuError::InvalidRegionKind` if `kind` is
    /// [RegionKind::Derived] or [RegionKind::Ghost].
    /// * `SudokuError::InvalidCageTotal` if the constraint was created for a
    /// different number of cells.
    pub fn define_region(&mut self, cells: &[(usize, usize)],
            kind: RegionKind, constraint: Option<VariantConstraint>)
            -> SudokuResult<RegionId> {
        if cells.is_empty() {
            return Err(SudokuError::EmptyRegion);
        }

        let ids = cells.iter()
            .map(|&(row, column)| self.cell_id(row, column))
            .collect::<SudokuResult<Vec<usize>>>()?;

        if util::contains_duplicate(ids.iter()) {
            return Err(SudokuError::DuplicateCells);
        }

        if ids.len() > self.size {
            return Err(SudokuError::RegionTooLarge);
        }

        if !kind.is_defined_by_puzzle() {
            return Err(SudokuError::InvalidRegionKind);
        }

        if let Some(constraint) = &constraint {
            if constraint.size() != ids.len() {
                return Err(SudokuError::InvalidCageTotal);
            }
        }

        self.revision = next_revision();
        self.definitions.push(RegionDefinition {
            cells: ids.clone(),
            kind,
            constraint: constraint.clone()
        });
        let id = self.add_starting_region(ids, kind, constraint);
        self.settle();
        Ok(id)
    }

    /// Defines a killer cage on the cells at the given `(row, column)`
    /// coordinates, whose digits must add up to `total`.
    ///
    /// # Errors
    ///
    /// Any error of [Grid::define_region], and
    /// `SudokuError::InvalidCageTotal` if no combination of distinct digits
    /// reaches the total.
    pub fn define_killer_cage(&mut self, cells: &[(usize, usize)],
            total: usize) -> SudokuResult<RegionId> {
        if cells.is_empty() {
            return Err(SudokuError::EmptyRegion);
        }

        if cells.len() > self.size {
            return Err(SudokuError::RegionTooLarge);
        }

        let constraint = VariantConstraint::killer(total, cells.len(),
            self.size)?;
        self.define_region(cells, RegionKind::KillerCage, Some(constraint))
    }

    /// Defines all rows, columns, and boxes of the grid as regions.
    ///
    /// # Errors
    ///
    /// `SudokuError::MissingBoxes` if the grid was created without box
    /// dimensions.
    pub fn define_standard_regions(&mut self) -> SudokuResult<()> {
        let (block_width, block_height) =
            self.boxes.ok_or(SudokuError::MissingBoxes)?;
        let size = self.size;

        for row in 0..size {
            let cells: Vec<(usize, usize)> =
                (0..size).map(|column| (row, column)).collect();
            self.define_region(&cells, RegionKind::Row, None)?;
        }

        for column in 0..size {
            let cells: Vec<(usize, usize)> =
                (0..size).map(|row| (row, column)).collect();
            self.define_region(&cells, RegionKind::Column, None)?;
        }

        for block_row in 0..block_width {
            for block_column in 0..block_height {
                let mut cells = Vec::with_capacity(size);

                for row in 0..block_height {
                    for column in 0..block_width {
                        cells.push((block_row * block_height + row,
                            block_column * block_width + column));
                    }
                }

                self.define_region(&cells, RegionKind::Box, None)?;
            }
        }

        Ok(())
    }

    /// Defines the two main diagonals of the grid as regions.
    pub fn define_diagonals(&mut self) -> SudokuResult<()> {
        let size = self.size;
        let main: Vec<(usize, usize)> = (0..size).map(|i| (i, i)).collect();
        let anti: Vec<(usize, usize)> =
            (0..size).map(|i| (i, size - 1 - i)).collect();
        self.define_region(&main, RegionKind::Diagonal, None)?;
        self.define_region(&anti, RegionKind::Diagonal, None)?;
        Ok(())
    }

    fn reset_to_definitions(&mut self, definitions: Vec<RegionDefinition>) {
        let observer = self.observer.take();
        let revision = next_revision();

        if let Ok(fresh) = Grid::with_dimensions(self.size, self.boxes) {
            *self = fresh;
        }

        self.observer = observer;
        self.revision = revision;

        for id in 0..self.cells.len() {
            let options = self.cells[id].options();
            self.notify(CellChange::Value {
                cell: id,
                value: 0
            });
            self.notify(CellChange::Options {
                cell: id,
                options
            });
        }

        for definition in definitions {
            let RegionDefinition { cells, kind, constraint } = definition;
            self.definitions.push(RegionDefinition {
                cells: cells.clone(),
                kind,
                constraint: constraint.clone()
            });
            self.add_starting_region(cells, kind, constraint);
        }

        self.settle();
    }

    /// Clears all values, options, hints and deductions, but keeps the
    /// regions defined by the puzzle (including their constraints).
    pub fn reset_contents(&mut self) {
        let definitions = std::mem::take(&mut self.definitions);
        self.reset_to_definitions(definitions);
    }

    /// Clears everything, including the regions.
    pub fn clear(&mut self) {
        self.reset_to_definitions(Vec::new());
    }

    pub(crate) fn mark_broken(&mut self) {
        self.broken = true;
    }

    pub(crate) fn fail(&mut self, progress: Progress) {
        self.queue.push(progress);
    }

    /// Removes the given digits from the options of a cell and updates the
    /// regions containing it. Does not settle the regions. Returns `true` if
    /// any option was removed.
    pub(crate) fn eliminate(&mut self, cell: usize, digits: DigitSet) -> bool {
        let old = self.cells[cell];
        let removed = old.options() & digits;

        if removed.is_empty() {
            return false;
        }

        self.journal.record_cell(&old);
        let options = old.options() - removed;
        self.cells[cell].set_options(options);
        self.changes += 1;
        self.notify(CellChange::Options {
            cell,
            options
        });

        let leaves = self.regions.leaves_of_cell(cell).to_vec();

        for leaf in leaves {
            let region = self.regions.get(leaf);

            if let Some(position) = region.position(cell) {
                self.updates.cell_changed(leaf, position, removed);
            }

            if region.constraint.is_some() {
                self.queue.push(Progress::CheckCage {
                    region: leaf
                });
            }

            self.pending.insert(leaf);
        }

        self.ghosts.cell_changed(cell);

        match options.len() {
            0 => {
                let progress = if old.is_given() {
                    Progress::ImpossibleGivenCell { cell }
                }
                else if old.is_solved() {
                    Progress::ImpossibleSolvedCell { cell }
                }
                else {
                    Progress::ImpossibleEmptyCell { cell }
                };

                self.fail(progress);
            },
            1 if !self.cells[cell].is_solved() => {
                self.queue.push(Progress::SingleOptionLeft { cell });
            },
            _ => { }
        }

        true
    }

    fn check_cell(&self, cell: usize) -> SudokuResult<()> {
        if cell >= self.cells.len() {
            Err(SudokuError::OutOfBounds)
        }
        else {
            Ok(())
        }
    }

    /// Removes a single option from the cell with the given linear id.
    /// Removing an option the cell does not have is a no-op. If one option
    /// remains, a [Progress::SingleOptionLeft] is queued, and if none
    /// remains, one of the fatal `Impossible*` deductions.
    ///
    /// # Errors
    ///
    /// * `SudokuError::OutOfBounds` if `cell` is not less than the number of
    /// cells.
    /// * `SudokuError::InvalidNumber` if `digit` is 0 or greater than the
    /// size.
    pub fn remove_option(&mut self, cell: usize, digit: usize)
            -> SudokuResult<()> {
        self.check_cell(cell)?;
        self.check_digit(digit)?;
        self.revision = next_revision();
        self.discard_options(cell, DigitSet::singleton(digit));
        Ok(())
    }

    /// Removes all options of the cell with the given linear id except those
    /// in `keep`.
    ///
    /// # Errors
    ///
    /// * `SudokuError::OutOfBounds` if `cell` is not less than the number of
    /// cells.
    /// * `SudokuError::InvalidNumber` if `keep` contains a digit greater than
    /// the size.
    pub fn remove_all_other_options(&mut self, cell: usize, keep: DigitSet)
            -> SudokuResult<()> {
        self.check_cell(cell)?;
        self.check_digits(keep)?;
        self.revision = next_revision();
        let others = self.cells[cell].options() - keep;
        self.discard_options(cell, others);
        Ok(())
    }

    /// Marks the cell with the given linear id as given with the given digit,
    /// removes its other options, and queues a [Progress::GivenCellAdded]. A
    /// value of 0 is ignored. If the digit is not an option of the cell, a
    /// fatal [Progress::ClashWithGiven] is queued instead.
    ///
    /// # Errors
    ///
    /// * `SudokuError::OutOfBounds` if `cell` is not less than the number of
    /// cells.
    /// * `SudokuError::InvalidNumber` if `value` is greater than the size.
    pub fn make_given(&mut self, cell: usize, value: usize)
            -> SudokuResult<()> {
        self.check_cell(cell)?;

        if value == 0 {
            return Ok(());
        }

        self.check_digit(value)?;
        self.revision = next_revision();
        self.place_given(cell, value);
        Ok(())
    }

    /// Commits a digit to the cell with the given linear id and registers
    /// the cell as a closed subset of its regions. Committing the digit a
    /// cell already holds is a no-op. If the cell holds a different digit or
    /// does not have the digit as an option, a fatal clash is queued instead.
    ///
    /// # Errors
    ///
    /// * `SudokuError::OutOfBounds` if `cell` is not less than the number of
    /// cells.
    /// * `SudokuError::InvalidNumber` if `value` is 0 or greater than the
    /// size.
    pub fn solve_cell(&mut self, cell: usize, value: usize)
            -> SudokuResult<()> {
        self.check_cell(cell)?;
        self.check_digit(value)?;
        self.revision = next_revision();
        self.place_value(cell, value);
        Ok(())
    }

    /// Eliminates the given digits from a cell and settles the regions.
    pub(crate) fn discard_options(&mut self, cell: usize, digits: DigitSet) {
        self.eliminate(cell, digits);
        self.settle();
    }

    pub(crate) fn place_given(&mut self, cell: usize, value: usize) {
        let old = self.cells[cell];

        if old.is_given() && old.value() == value {
            return;
        }

        if !old.options().contains(value) ||
                (old.is_solved() && old.value() != value) {
            self.fail(Progress::ClashWithGiven { cell, value });
            return;
        }

        self.journal.record_cell(&old);
        self.cells[cell].set_given(true);
        self.cells[cell].set_value(value);
        self.changes += 1;
        self.notify(CellChange::Value { cell, value });
        self.eliminate(cell, old.options() - DigitSet::singleton(value));
        self.queue.push(Progress::GivenCellAdded { cell, value });
        self.settle();
    }

    pub(crate) fn place_value(&mut self, cell: usize, value: usize) {
        let old = self.cells[cell];

        if old.value() == value {
            return;
        }

        if old.is_solved() && old.is_given() {
            self.fail(Progress::ClashWithGiven { cell, value });
            return;
        }

        if old.is_solved() || !old.options().contains(value) {
            self.fail(Progress::ClashWithSolved { cell, value });
            return;
        }

        self.journal.record_cell(&old);
        self.cells[cell].set_value(value);
        self.changes += 1;
        self.notify(CellChange::Value { cell, value });
        self.eliminate(cell, old.options() - DigitSet::singleton(value));
        self.register_closed_subset(&[cell], DigitSet::singleton(value));
    }

    /// Refreshes every region whose cells or digits changed, until no region
    /// is pending or a fatal deduction is queued. Calls while already
    /// settling return immediately, the outer call picks up the work.
    pub(crate) fn settle(&mut self) {
        if self.settling {
            return;
        }

        self.settling = true;

        while let Some(&id) = self.pending.iter().next() {
            self.pending.remove(&id);

            if self.queue.has_high_priority() {
                self.pending.clear();
                break;
            }

            if self.regions.is_leaf(id) {
                self.refresh_region(id);
            }
        }

        self.settling = false;
    }

    /// Starts a journal transaction. All changes from now on can be undone
    /// with [Grid::rollback].
    pub fn start_transaction(&mut self) {
        let broken = self.broken;
        self.journal.start(broken);
    }

    /// Ends the journal transaction, keeping all changes.
    pub fn commit(&mut self) {
        self.journal.stop();
    }

    /// Undoes all changes since the transaction was started (or last rolled
    /// back). The transaction stays active. Pending deductions are dropped
    /// and every region is considered changed afterwards. Rolling back counts
    /// as an edit for [Grid::revision].
    pub fn rollback(&mut self) {
        let (entries, broken) = self.journal.take_for_rollback();

        for undo in entries.into_iter().rev() {
            match undo {
                Undo::Cell(cell) => {
                    let id = cell.id();
                    let current = self.cells[id];
                    self.cells[id] = cell;

                    if current.options() != cell.options() {
                        self.notify(CellChange::Options {
                            cell: id,
                            options: cell.options()
                        });
                    }

                    if current.value() != cell.value() {
                        self.notify(CellChange::Value {
                            cell: id,
                            value: cell.value()
                        });
                    }
                },
                Undo::Region(region) => {
                    let id = region.id;
                    *self.regions.get_mut(id) = *region;
                },
                Undo::RegionAdded => self.regions.pop(),
                Undo::StartingAdded => self.regions.pop_starting(),
                Undo::Ghosts(ghosts) => self.ghosts = *ghosts
            }
        }

        self.regions.rebuild_index();
        let count = self.regions.len();
        self.updates.reset(self.regions.iter(), count);
        self.ghosts.mark_all_dirty();
        self.queue.clear();
        self.pending.clear();
        self.broken = broken;
        self.changes += 1;
        self.revision = next_revision();
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    use std::sync::{Arc, Mutex};

    fn grid_4x4() -> Grid {
        let mut grid = Grid::new(2, 2).unwrap();
        grid.define_standard_regions().unwrap();
        grid
    }

    fn digits(v: &[usize]) -> DigitSet {
        v.iter().cloned().collect()
    }

    #[test]
    fn invalid_dimensions_are_rejected() {
        assert_eq!(Err(SudokuError::InvalidDimensions),
            Grid::new(0, 3).map(|_| ()));
        assert_eq!(Err(SudokuError::InvalidDimensions),
            Grid::with_size(64).map(|_| ()));
        assert!(Grid::with_size(6).is_ok());
    }

    #[test]
    fn standard_regions_are_defined() {
        let grid = Grid::new(3, 2).unwrap();
        let mut grid = grid;
        grid.define_standard_regions().unwrap();

        assert_eq!(6, grid.regions_of_kind(RegionKind::Row).len());
        assert_eq!(6, grid.regions_of_kind(RegionKind::Column).len());
        let boxes = grid.regions_of_kind(RegionKind::Box);
        assert_eq!(6, boxes.len());

        // The first box is 3 wide and 2 high.
        assert_eq!(&[0, 1, 2, 6, 7, 8], boxes[0].cells());
        assert_eq!(&[3, 4, 5, 9, 10, 11], boxes[1].cells());
        assert_eq!(&[12, 13, 14, 18, 19, 20], boxes[2].cells());
    }

    #[test]
    fn standard_regions_require_boxes() {
        let mut grid = Grid::with_size(4).unwrap();
        assert_eq!(Err(SudokuError::MissingBoxes),
            grid.define_standard_regions());
    }

    #[test]
    fn invalid_regions_are_rejected() {
        let mut grid = grid_4x4();

        assert_eq!(Err(SudokuError::EmptyRegion),
            grid.define_region(&[], RegionKind::Generic, None));
        assert_eq!(Err(SudokuError::OutOfBounds),
            grid.define_region(&[(0, 4)], RegionKind::Generic, None));
        assert_eq!(Err(SudokuError::DuplicateCells),
            grid.define_region(&[(0, 1), (0, 1)], RegionKind::Generic, None));
        assert_eq!(Err(SudokuError::InvalidRegionKind),
            grid.define_region(&[(0, 1)], RegionKind::Derived, None));
        assert_eq!(Err(SudokuError::InvalidCageTotal),
            grid.define_killer_cage(&[(0, 0), (1, 1)], 17));
    }

    #[test]
    fn given_cell_removes_other_options() {
        let mut grid = grid_4x4();
        grid.add_given_cell(1, 2, 3).unwrap();

        assert_eq!(DigitSet::singleton(3), grid.options_get(1, 2).unwrap());
        assert_eq!(3, grid.value_get(1, 2).unwrap());
        assert!(grid.is_given(1, 2).unwrap());
        assert!(grid.queue().iter().any(|p|
            p == &Progress::GivenCellAdded { cell: 6, value: 3 }));
    }

    #[test]
    fn zero_given_is_ignored() {
        let mut grid = grid_4x4();
        grid.add_given_cell(0, 0, 0).unwrap();

        assert_eq!(0, grid.value_get(0, 0).unwrap());
        assert_eq!(DigitSet::range(4), grid.options_get(0, 0).unwrap());
        assert_eq!(Err(SudokuError::InvalidNumber),
            grid.add_given_cell(0, 0, 5));
    }

    #[test]
    fn remove_option_is_idempotent() {
        let mut grid = grid_4x4();
        grid.remove_option(0, 2).unwrap();
        let changes = grid.change_count();
        let queued = grid.queue().len();

        grid.remove_option(0, 2).unwrap();

        assert_eq!(changes, grid.change_count());
        assert_eq!(queued, grid.queue().len());
        assert_eq!(digits(&[1, 3, 4]), grid.options_get(0, 0).unwrap());
    }

    #[test]
    fn cell_mutators_reject_invalid_input() {
        let mut grid = grid_4x4();
        let revision = grid.revision();

        assert_eq!(Err(SudokuError::OutOfBounds), grid.remove_option(16, 1));
        assert_eq!(Err(SudokuError::InvalidNumber), grid.remove_option(0, 5));
        assert_eq!(Err(SudokuError::InvalidNumber), grid.remove_option(0, 0));
        assert_eq!(Err(SudokuError::OutOfBounds),
            grid.remove_all_other_options(16, digits(&[1])));
        assert_eq!(Err(SudokuError::InvalidNumber),
            grid.remove_all_other_options(0, digits(&[1, 5])));
        assert_eq!(Err(SudokuError::OutOfBounds), grid.make_given(99, 1));
        assert_eq!(Err(SudokuError::InvalidNumber), grid.make_given(0, 5));
        assert_eq!(Err(SudokuError::OutOfBounds), grid.solve_cell(16, 1));
        assert_eq!(Err(SudokuError::InvalidNumber), grid.solve_cell(0, 0));

        assert_eq!(revision, grid.revision());
        assert_eq!(DigitSet::range(4), grid.options_get(0, 0).unwrap());
        assert!(grid.queue().is_empty());
    }

    #[test]
    fn cell_mutators_change_revision() {
        let mut grid = grid_4x4();
        let mut revisions = vec![grid.revision()];

        grid.remove_option(0, 4).unwrap();
        revisions.push(grid.revision());
        grid.remove_all_other_options(0, digits(&[1, 2])).unwrap();
        revisions.push(grid.revision());
        grid.make_given(0, 1).unwrap();
        revisions.push(grid.revision());
        grid.solve_cell(5, 2).unwrap();
        revisions.push(grid.revision());

        let mut distinct = revisions.clone();
        distinct.sort();
        distinct.dedup();

        assert_eq!(revisions.len(), distinct.len());
    }

    #[test]
    fn single_option_left_is_queued() {
        let mut grid = grid_4x4();
        grid.set_cell_options(0, 0, digits(&[2, 3])).unwrap();
        assert!(grid.queue().is_empty());

        grid.remove_option(0, 3).unwrap();
        assert_eq!(vec![&Progress::SingleOptionLeft { cell: 0 }],
            grid.queue().iter().collect::<Vec<_>>());
    }

    #[test]
    fn removing_the_last_option_is_fatal() {
        let mut grid = grid_4x4();
        grid.set_cell_options(0, 0, DigitSet::singleton(2)).unwrap();
        grid.remove_option(0, 2).unwrap();
        assert!(grid.queue().iter()
            .any(|p| p == &Progress::ImpossibleEmptyCell { cell: 0 }));

        let mut grid = grid_4x4();
        grid.add_given_cell(0, 0, 2).unwrap();
        grid.remove_option(0, 2).unwrap();
        assert!(grid.queue().iter()
            .any(|p| p == &Progress::ImpossibleGivenCell { cell: 0 }));
    }

    #[test]
    fn observer_receives_changes() {
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&changes);
        let mut grid = grid_4x4();
        grid.set_observer(Box::new(move |change|
            sink.lock().unwrap().push(change)));
        grid.add_given_cell(0, 1, 4).unwrap();

        let changes = changes.lock().unwrap();
        assert_eq!(CellChange::Value { cell: 1, value: 4 }, changes[0]);
        assert_eq!(CellChange::Options {
            cell: 1,
            options: DigitSet::singleton(4)
        }, changes[1]);
    }

    #[test]
    fn hints_are_stored_without_elimination() {
        let mut grid = grid_4x4();
        grid.set_cell_elimination_hints(2, 2, digits(&[1, 2])).unwrap();

        assert_eq!(digits(&[1, 2]),
            grid.hinted_eliminations_get(2, 2).unwrap());
        assert_eq!(DigitSet::range(4), grid.options_get(2, 2).unwrap());
    }

    #[test]
    fn reset_contents_keeps_regions() {
        let mut grid = grid_4x4();
        grid.define_killer_cage(&[(0, 0), (0, 1)], 3).unwrap();
        grid.add_given_cell(3, 3, 1).unwrap();
        grid.reset_contents();

        assert_eq!(0, grid.value_get(3, 3).unwrap());
        assert_eq!(1, grid.regions_of_kind(RegionKind::KillerCage).len());
        assert_eq!(digits(&[1, 2]), grid.options_get(0, 0).unwrap());

        grid.clear();
        assert!(grid.regions().is_empty());
        assert_eq!(DigitSet::range(4), grid.options_get(0, 0).unwrap());
    }

    #[test]
    fn rollback_restores_cells_and_regions() {
        let mut grid = grid_4x4();
        let leaves_before: Vec<RegionId> = grid.regions().leaves().collect();
        let region_count = grid.regions().len();

        grid.start_transaction();
        grid.solve_cell(0, 1).unwrap();
        assert_eq!(1, grid.value_get(0, 0).unwrap());
        assert!(grid.regions().len() > region_count);

        grid.rollback();
        assert_eq!(0, grid.value_get(0, 0).unwrap());
        assert_eq!(DigitSet::range(4), grid.options_get(0, 1).unwrap());
        assert_eq!(region_count, grid.regions().len());
        assert_eq!(leaves_before, grid.regions().leaves().collect::<Vec<_>>());
        assert!(grid.queue().is_empty());

        grid.solve_cell(0, 2).unwrap();
        grid.rollback();
        grid.commit();
        assert_eq!(DigitSet::range(4), grid.options_get(0, 0).unwrap());
    }

    #[test]
    fn clone_drops_observer_and_transaction() {
        let mut grid = grid_4x4();
        grid.set_observer(Box::new(|_| { }));
        grid.start_transaction();
        let clone = grid.clone();

        assert!(clone.observer.is_none());
        assert!(!clone.journal.is_active());
        assert_eq!(grid.values(), clone.values());
    }
}
