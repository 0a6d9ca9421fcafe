//! This module contains the [InniesAndOutiesTechnique].

use crate::constraint::GhostCage;
use crate::constraint::ghost::{derive_innies, derive_outies};
use crate::grid::Grid;
use crate::progress::Progress;
use crate::region::{RegionId, RegionKind};
use crate::technique::{SolvingTechnique, TechniqueKind};
use crate::util::CellSet;

use log::trace;

/// A [SolvingTechnique] which derives ghost cages from the houses of a
/// killer puzzle.
///
/// The digits of a house always add up to `1 + 2 + ... + size`. If some
/// killer cages lie inside a house, the remaining cells of the house (the
/// *innie*) must add up to the difference between the house's total and the
/// cages' totals. If the cages intersecting a house cover it completely, the
/// cells of those cages outside the house (the *outie*) must add up to the
/// difference between the cages' totals and the house's total.
///
/// ```text
/// ╔═══╤═══╦═══╤═══╗
/// ║ 3 ·   ║ I │ I ║
/// ╟───┼───╫───┼───╢
/// ║   │   ║   │   ║
/// ╚═══╧═══╩═══╧═══╝
/// ```
///
/// In the example above, the cage of total 3 lies in the first row, so the
/// cells marked with I add up to `10 - 3 = 7`.
///
/// Every house is scanned once, and again whenever a killer cage is added
/// to the grid. Derived cages are queued as
/// [Progress::GhostCageFound]. Afterwards, the technique prunes the options
/// of those ghost cages which the grid could not turn into regions because
/// their cells do not all see each other.
#[derive(Clone, Debug, Default)]
pub struct InniesAndOutiesTechnique {
    next_cage: usize,
    finished: bool
}

fn houses(grid: &Grid) -> Vec<RegionId> {
    grid.regions().starting().iter()
        .cloned()
        .filter(|&id| {
            let region = grid.regions().get(id);
            region.kind() != RegionKind::Ghost && region.len() == grid.size()
        })
        .collect()
}

fn cages(grid: &Grid) -> Vec<(CellSet, usize)> {
    grid.regions().starting_of_kind(RegionKind::KillerCage)
        .into_iter()
        .filter_map(|id| {
            let region = grid.regions().get(id);
            let killer = region.constraint()?.as_killer()?;
            Some((region.cell_set().clone(), killer.total()))
        })
        .collect()
}

impl InniesAndOutiesTechnique {

    /// Creates a new innies and outies technique.
    pub fn new() -> InniesAndOutiesTechnique {
        InniesAndOutiesTechnique::default()
    }

    fn queue_ghost(grid: &mut Grid, cage: GhostCage) -> bool {
        if grid.ghosts.is_known(&cage.cells) && !cage.is_broken(grid.size()) {
            return false;
        }

        trace!(target: "technique", "{:?} of total {} on {:?}", cage.kind,
            cage.total, cage.cells);
        grid.queue.push(Progress::GhostCageFound { cage })
    }

    fn scan_house(grid: &mut Grid, house: RegionId) -> bool {
        let cages = cages(grid);

        if cages.is_empty() {
            return false;
        }

        let size = grid.size();
        let house_total = size * (size + 1) / 2;
        let cells = grid.regions().get(house).cell_set().clone();
        let mut found = false;

        for ghost in derive_innies(&cells, house_total, &cages).into_iter()
                .chain(derive_outies(&cells, house_total, &cages)) {
            found |= InniesAndOutiesTechnique::queue_ghost(grid, ghost);
        }

        found
    }

    fn prune_next_sum_cage(&mut self, grid: &mut Grid) -> Option<bool> {
        let index = self.next_cage;
        let dirty = grid.ghosts.sum_cages().get(index)?.dirty;
        self.next_cage += 1;

        if !dirty {
            return Some(false);
        }

        grid.journal.record_ghosts(&grid.ghosts);
        grid.ghosts.take_dirty(index);
        let found = grid.prune_sum_cage(index);
        let any = !found.is_empty();

        for progress in found {
            grid.queue.push(progress);
        }

        Some(any)
    }
}

impl SolvingTechnique for InniesAndOutiesTechnique {

    fn kind(&self) -> TechniqueKind {
        TechniqueKind::InniesAndOuties
    }

    fn next_step(&mut self, grid: &mut Grid) -> bool {
        let houses = houses(grid);
        let scanned = grid.ghosts.scanned_houses();

        if scanned < houses.len() {
            grid.journal.record_ghosts(&grid.ghosts);
            grid.ghosts.house_scanned();
            return InniesAndOutiesTechnique::scan_house(grid, houses[scanned]);
        }

        while let Some(found) = self.prune_next_sum_cage(grid) {
            if found {
                return true;
            }
        }

        self.finished = true;
        false
    }

    fn reset(&mut self) {
        self.next_cage = 0;
        self.finished = false;
    }

    fn has_finished(&self) -> bool {
        self.finished
    }
}
