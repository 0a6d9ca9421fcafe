//! This module contains the [Journal], a transactional log of the changes
//! made to a grid. While a transaction is active, the first change to any cell
//! or region records its previous state, so the grid can later be rolled back
//! by replaying the recorded states backwards. This is how bifurcation resets
//! its scratch grid between the branches of a pivot cell without copying the
//! whole grid for every branch.

use crate::cell::Cell;
use crate::constraint::GhostCagesManager;
use crate::region::Region;

/// A single recorded change, holding the state before the change.
#[derive(Clone, Debug)]
pub(crate) enum Undo {

    /// A cell had this state before it was changed.
    Cell(Cell),

    /// A region had this state before it was changed.
    Region(Box<Region>),

    /// A region was appended to the arena.
    RegionAdded,

    /// A starting region was registered.
    StartingAdded,

    /// The ghost cages had this state before a ghost was registered.
    Ghosts(Box<GhostCagesManager>)
}

/// A transactional log of changes. See the [module documentation](self) for
/// details.
#[derive(Clone, Debug, Default)]
pub(crate) struct Journal {
    active: bool,
    epoch: u64,
    entries: Vec<Undo>,
    cell_epochs: Vec<u64>,
    region_epochs: Vec<u64>,
    ghosts_epoch: u64,
    broken_at_start: bool
}

fn first_in_epoch(epochs: &mut Vec<u64>, index: usize, epoch: u64) -> bool {
    if epochs.len() <= index {
        epochs.resize(index + 1, 0);
    }

    if epochs[index] == epoch {
        false
    }
    else {
        epochs[index] = epoch;
        true
    }
}

impl Journal {

    /// Creates a new, inactive journal.
    pub(crate) fn new() -> Journal {
        Journal::default()
    }

    /// Indicates whether a transaction is active.
    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    /// Gets the number of recorded changes of the active transaction.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Indicates whether no change was recorded in the active transaction.
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn start(&mut self, broken: bool) {
        self.active = true;
        self.epoch += 1;
        self.entries.clear();
        self.broken_at_start = broken;
    }

    pub(crate) fn stop(&mut self) {
        self.active = false;
        self.epoch += 1;
        self.entries.clear();
    }

    /// Takes all entries of the active transaction, which stays active, so
    /// that changes after the rollback are recorded afresh. Also returns
    /// whether the grid was broken when the transaction started.
    pub(crate) fn take_for_rollback(&mut self) -> (Vec<Undo>, bool) {
        self.epoch += 1;
        (std::mem::take(&mut self.entries), self.broken_at_start)
    }

    pub(crate) fn record_cell(&mut self, cell: &Cell) {
        if self.active &&
                first_in_epoch(&mut self.cell_epochs, cell.id(), self.epoch) {
            self.entries.push(Undo::Cell(*cell));
        }
    }

    pub(crate) fn record_region(&mut self, region: &Region) {
        if self.active &&
                first_in_epoch(&mut self.region_epochs, region.id, self.epoch) {
            self.entries.push(Undo::Region(Box::new(region.clone())));
        }
    }

    /// Records that a region is about to be appended with the given id. The
    /// region counts as recorded for the rest of the transaction, since
    /// rolling back removes it entirely.
    pub(crate) fn record_region_added(&mut self, id: usize) {
        if self.active {
            first_in_epoch(&mut self.region_epochs, id, self.epoch);
            self.entries.push(Undo::RegionAdded);
        }
    }

    pub(crate) fn record_starting_added(&mut self) {
        if self.active {
            self.entries.push(Undo::StartingAdded);
        }
    }

    pub(crate) fn record_ghosts(&mut self, ghosts: &GhostCagesManager) {
        if self.active && self.ghosts_epoch != self.epoch {
            self.ghosts_epoch = self.epoch;
            self.entries.push(Undo::Ghosts(Box::new(ghosts.clone())));
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    use crate::region::RegionKind;
    use crate::util::DigitSet;

    #[test]
    fn inactive_journal_records_nothing() {
        let mut journal = Journal::new();
        journal.record_cell(&Cell::new(0, 0, 0, 4));
        journal.record_region_added(0);
        assert!(journal.is_empty());
    }

    #[test]
    fn each_cell_is_recorded_once_per_transaction() {
        let mut journal = Journal::new();
        let cell = Cell::new(3, 0, 3, 4);
        journal.start(false);
        journal.record_cell(&cell);
        journal.record_cell(&cell);
        assert_eq!(1, journal.len());

        let (entries, broken) = journal.take_for_rollback();
        assert_eq!(1, entries.len());
        assert!(!broken);
        assert!(journal.is_active());

        journal.record_cell(&cell);
        assert_eq!(1, journal.len());

        journal.stop();
        assert!(!journal.is_active());
        assert!(journal.is_empty());
    }

    #[test]
    fn added_regions_are_not_recorded_again() {
        let mut journal = Journal::new();
        let region = Region::new(2, RegionKind::Derived, vec![0, 1], 16,
            DigitSet::range(4), DigitSet::new());
        journal.start(true);
        journal.record_region_added(2);
        journal.record_region(&region);

        let (entries, broken) = journal.take_for_rollback();
        assert_eq!(1, entries.len());
        assert!(broken);
    }
}
