//! This module contains the [LockedCandidatesTechnique].

use crate::grid::Grid;
use crate::progress::Progress;
use crate::region::RegionId;
use crate::technique::{needs_work, LeafCursor, SolvingTechnique, TechniqueKind};
use crate::util::CellSet;

use log::trace;

/// Gets all cells that see every cell of the region with the given id which
/// still has `digit` as an option, and which have the option themselves. If
/// the digit must go into the region, it cannot go into any of these cells.
/// Fish use this set to handle their fins.
pub fn cells_seeing_candidates(grid: &Grid, region: RegionId, digit: usize)
        -> CellSet {
    let hosts = grid.regions().get(region).hosts(grid.cells(), digit);
    let mut result = grid.regions().cells_seeing_all(hosts);
    let without: Vec<usize> = result.iter()
        .filter(|&c| !grid.cells()[c].options().contains(digit))
        .collect();

    for cell in without {
        result.remove(cell);
    }

    result
}

/// A [SolvingTechnique] which finds digits that are *locked* in a part of a
/// region.
///
/// If a region confirms a digit, i.e. the digit must appear in it, then it
/// must appear in one of the cells of the region which still have it as an
/// option. Consequently, the digit can be removed from every cell which sees
/// all of those cells. Furthermore, every other region which contains all of
/// those cells must contain the digit as well, so it is confirmed there.
///
/// In the following example, the 1 of the top-left box must be in its first
/// row (cells marked with X). Hence, the 1 can be removed from the cells
/// marked with O.
///
/// ```text
/// ╔═══╤═══╦═══╤═══╗
/// ║ X │ X ║ O │ O ║
/// ╟───┼───╫───┼───╢
/// ║   │   ║ 1 │   ║
/// ╠═══╪═══╬═══╪═══╣
/// ║   │   ║   │   ║
/// ╟───┼───╫───┼───╢
/// ║   │   ║   │   ║
/// ╚═══╧═══╩═══╧═══╝
/// ```
#[derive(Clone, Debug, Default)]
pub struct LockedCandidatesTechnique {
    cursor: LeafCursor
}

impl LockedCandidatesTechnique {

    /// Creates a new locked candidates technique.
    pub fn new() -> LockedCandidatesTechnique {
        LockedCandidatesTechnique::default()
    }

    fn examine(&self, grid: &mut Grid, id: RegionId) -> bool {
        let kind = TechniqueKind::LockedCandidates;
        let hot = match grid.updates.hot(id, kind) {
            Some(hot) if !hot.is_empty() => hot,
            _ => return false
        };
        let region = grid.regions().get(id);

        if !needs_work(grid, region) {
            grid.updates.take(id, kind);
            return false;
        }

        let digits = if hot.cells != 0 {
            region.confirmed()
        }
        else {
            hot.values & region.confirmed()
        };

        for digit in digits.iter() {
            let region = grid.regions().get(id);
            let hosts = region.hosts(grid.cells(), digit);

            if hosts.len() < 2 {
                continue;
            }

            let eliminations: Vec<usize> =
                cells_seeing_candidates(grid, id, digit).iter().collect();
            let confirm_in: Vec<RegionId> = grid.regions()
                .leaves_containing_all(&hosts)
                .into_iter()
                .filter(|&leaf| leaf != id &&
                    !grid.regions().get(leaf).confirmed().contains(digit))
                .collect();

            if eliminations.is_empty() && confirm_in.is_empty() {
                continue;
            }

            trace!(target: "technique", "{} locked in region {} on {:?}",
                digit, id, hosts);
            grid.updates.clear_value(id, kind, digit);
            grid.queue.push(Progress::LockedCandidates {
                region: id,
                value: digit,
                eliminations,
                confirm_in
            });
            return true;
        }

        grid.updates.take(id, kind);
        false
    }
}

impl SolvingTechnique for LockedCandidatesTechnique {

    fn kind(&self) -> TechniqueKind {
        TechniqueKind::LockedCandidates
    }

    fn next_step(&mut self, grid: &mut Grid) -> bool {
        while let Some(id) = self.cursor.next(grid) {
            if grid.updates.is_hot(id, TechniqueKind::LockedCandidates) {
                return self.examine(grid, id);
            }
        }

        false
    }

    fn reset(&mut self) {
        self.cursor.reset();
    }

    fn has_finished(&self) -> bool {
        self.cursor.is_finished()
    }
}
