//! This module contains the [NakedSubsetTechnique] and the
//! [HiddenSubsetTechnique].

use crate::grid::Grid;
use crate::progress::Progress;
use crate::region::{Region, RegionId};
use crate::technique::{needs_work, LeafCursor, SolvingTechnique, TechniqueKind};
use crate::util::DigitSet;

use log::trace;

enum Search {
    Nothing,
    Found(Vec<usize>),
    Contradiction
}

/// Searches combinations of the given items, each of which contributes a bit
/// mask, for one of at least 2 and at most `cap` items whose masks combine to
/// exactly as many bits as there are items. Items are expected to be sorted
/// by ascending mask size. A combination whose masks combine to fewer bits
/// than it has items is a contradiction.
fn search_subsets(masks: &[u64], cap: usize, start: usize,
        chosen: &mut Vec<usize>, union: u64) -> Search {
    for index in start..masks.len() {
        let new_union = union | masks[index];
        let bits = new_union.count_ones() as usize;

        if bits > cap {
            continue;
        }

        chosen.push(index);

        if bits < chosen.len() {
            return Search::Contradiction;
        }

        if bits == chosen.len() && chosen.len() >= 2 {
            return Search::Found(chosen.clone());
        }

        match search_subsets(masks, cap, index + 1, chosen, new_union) {
            Search::Nothing => { },
            result => return result
        }

        chosen.pop();
    }

    Search::Nothing
}

fn subset_cap(region: &Region, items: usize, max_size: Option<usize>)
        -> usize {
    let cap = if region.is_closed() {
        items / 2
    }
    else {
        items.saturating_sub(1)
    };

    match max_size {
        Some(max_size) => cap.min(max_size),
        None => cap
    }
}

/// A [SolvingTechnique] which finds naked subsets, that is, `n` cells of a
/// region whose options together contain only `n` digits. Those digits must
/// then be distributed among these cells, so they can be removed from every
/// other cell which sees all of them. The cells are registered as a closed
/// subset, which splits the region.
///
/// As an example, the two cells marked with X in the following grid can only
/// contain a 1 or a 2, which means the cells marked with O cannot.
///
/// ```text
/// ╔═══╤═══╦═══╤═══╗
/// ║ X │ O ║ 3 │ X ║
/// ╟───┼───╫───┼───╢
/// ║   │   ║   │ 4 ║
/// ╠═══╪═══╬═══╪═══╣
/// ║ 4 │   ║   │   ║
/// ╟───┼───╫───┼───╢
/// ║ 3 │   ║   │   ║
/// ╚═══╧═══╩═══╧═══╝
/// ```
///
/// Subsets are searched with cells sorted by ascending number of options.
/// Their size is limited to one less than the number of unsolved cells (half
/// of it for closed regions, where every naked subset has a hidden
/// counterpart of the complementary size) and optionally by a configured
/// maximum.
#[derive(Clone, Debug, Default)]
pub struct NakedSubsetTechnique {
    cursor: LeafCursor,
    max_size: Option<usize>
}

impl NakedSubsetTechnique {

    /// Creates a new naked subset technique which considers subsets of at
    /// most `max_size` cells, or of any useful size if `max_size` is `None`.
    pub fn new(max_size: Option<usize>) -> NakedSubsetTechnique {
        NakedSubsetTechnique {
            cursor: LeafCursor::new(),
            max_size
        }
    }

    fn examine(&self, grid: &mut Grid, id: RegionId) -> bool {
        let kind = TechniqueKind::NakedSubset;
        let region = grid.regions().get(id);

        if !needs_work(grid, region) {
            grid.updates.take(id, kind);
            return false;
        }

        let mut cells = region.unsolved_cells(grid.cells());
        cells.sort_by_key(|&c| grid.cells()[c].options().len());
        let masks: Vec<u64> = cells.iter()
            .map(|&c| grid.cells()[c].options().bits())
            .collect();
        let cap = subset_cap(region, cells.len(), self.max_size);

        match search_subsets(&masks, cap, 0, &mut Vec::new(), 0) {
            Search::Found(indices) => {
                let mut subset: Vec<usize> =
                    indices.iter().map(|&i| cells[i]).collect();
                subset.sort_unstable();
                let values = subset.iter()
                    .fold(DigitSet::new(),
                        |acc, &c| acc | grid.cells()[c].options());

                trace!(target: "technique", "naked subset {} on {:?}",
                    values, subset);
                grid.queue.push(Progress::NakedSubset {
                    region: id,
                    cells: subset,
                    values
                });
                true
            },
            Search::Contradiction => {
                grid.queue.push(Progress::TooFewValuesForRegion {
                    region: id
                });
                true
            },
            Search::Nothing => {
                grid.updates.take(id, kind);
                false
            }
        }
    }
}

impl SolvingTechnique for NakedSubsetTechnique {

    fn kind(&self) -> TechniqueKind {
        TechniqueKind::NakedSubset
    }

    fn next_step(&mut self, grid: &mut Grid) -> bool {
        while let Some(id) = self.cursor.next(grid) {
            if grid.updates.is_hot(id, TechniqueKind::NakedSubset) {
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

/// A [SolvingTechnique] which finds hidden subsets, that is, `n` digits which
/// must appear in a region but can only go into the same `n` cells of it.
/// All other options can be removed from these cells, which are registered
/// as a closed subset.
///
/// As an example, in the top-right box of the following grid, the 1 and the
/// 2 can only go into the cells marked with X, so these cannot contain a 3
/// or a 4.
///
/// ```text
/// ╔═══╤═══╦═══╤═══╗
/// ║   │   ║ X │ X ║
/// ╟───┼───╫───┼───╢
/// ║ 1 │ 2 ║   │   ║
/// ╠═══╪═══╬═══╪═══╣
/// ║   │   ║   │   ║
/// ╟───┼───╫───┼───╢
/// ║   │   ║   │   ║
/// ╚═══╧═══╩═══╧═══╝
/// ```
///
/// Subsets are searched with digits sorted by ascending number of cells that
/// can host them, and limited in size like naked subsets.
#[derive(Clone, Debug, Default)]
pub struct HiddenSubsetTechnique {
    cursor: LeafCursor,
    max_size: Option<usize>
}

impl HiddenSubsetTechnique {

    /// Creates a new hidden subset technique which considers subsets of at
    /// most `max_size` digits, or of any useful size if `max_size` is `None`.
    pub fn new(max_size: Option<usize>) -> HiddenSubsetTechnique {
        HiddenSubsetTechnique {
            cursor: LeafCursor::new(),
            max_size
        }
    }

    fn examine(&self, grid: &mut Grid, id: RegionId) -> bool {
        let kind = TechniqueKind::HiddenSubset;
        let region = grid.regions().get(id);

        if !needs_work(grid, region) {
            grid.updates.take(id, kind);
            return false;
        }

        let unsolved = region.unsolved_cells(grid.cells());
        let solved_values = region.cells().iter()
            .fold(DigitSet::new(), |acc, &c| {
                match grid.cells()[c].value() {
                    0 => acc,
                    value => acc | DigitSet::singleton(value)
                }
            });
        let mut values: Vec<usize> =
            (region.confirmed() - solved_values).iter().collect();
        let host_mask = |digit: usize| unsolved.iter()
            .enumerate()
            .filter(|&(_, &c)| grid.cells()[c].options().contains(digit))
            .fold(0u64, |acc, (i, _)| acc | (1u64 << i));
        values.sort_by_key(|&d| host_mask(d).count_ones());
        let masks: Vec<u64> = values.iter().map(|&d| host_mask(d)).collect();
        let cap = subset_cap(region, values.len(), self.max_size)
            .min(unsolved.len().saturating_sub(1));

        match search_subsets(&masks, cap, 0, &mut Vec::new(), 0) {
            Search::Found(indices) => {
                let digits: DigitSet =
                    indices.iter().map(|&i| values[i]).collect();
                let hosts = indices.iter().fold(0u64, |acc, &i| acc | masks[i]);
                let cells: Vec<usize> = unsolved.iter()
                    .enumerate()
                    .filter(|&(i, _)| hosts & (1u64 << i) != 0)
                    .map(|(_, &c)| c)
                    .collect();

                trace!(target: "technique", "hidden subset {} on {:?}",
                    digits, cells);

                for digit in digits.iter() {
                    grid.updates.clear_value(id, kind, digit);
                }

                grid.queue.push(Progress::HiddenSubset {
                    region: id,
                    cells,
                    values: digits
                });
                true
            },
            Search::Contradiction => {
                grid.queue.push(Progress::TooManyValuesForRegion {
                    region: id
                });
                true
            },
            Search::Nothing => {
                grid.updates.take(id, kind);
                false
            }
        }
    }
}

impl SolvingTechnique for HiddenSubsetTechnique {

    fn kind(&self) -> TechniqueKind {
        TechniqueKind::HiddenSubset
    }

    fn next_step(&mut self, grid: &mut Grid) -> bool {
        while let Some(id) = self.cursor.next(grid) {
            if grid.updates.is_hot(id, TechniqueKind::HiddenSubset) {
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

#[cfg(test)]
mod tests {

    use super::*;

    use crate::region::RegionKind;

    fn digits(v: &[usize]) -> DigitSet {
        v.iter().cloned().collect()
    }

    fn run_once(technique: &mut dyn SolvingTechnique, grid: &mut Grid)
            -> Vec<Progress> {
        while grid.queue.pop().is_some() { }

        while !technique.has_finished() {
            technique.next_step(grid);
        }

        grid.queue().iter().cloned().collect()
    }

    #[test]
    fn search_finds_smallest_subset() {
        let masks = [0b011, 0b011, 0b111, 0b1100];
        let mut chosen = Vec::new();

        match search_subsets(&masks, 3, 0, &mut chosen, 0) {
            Search::Found(indices) => assert_eq!(vec![0, 1], indices),
            _ => panic!("no subset found")
        }
    }

    #[test]
    fn search_detects_contradiction() {
        let masks = [0b001, 0b001, 0b110];

        assert!(matches!(search_subsets(&masks, 2, 0, &mut Vec::new(), 0),
            Search::Contradiction));
    }

    #[test]
    fn search_respects_cap() {
        let masks = [0b0111, 0b0111, 0b0111, 0b1000];

        assert!(matches!(search_subsets(&masks, 2, 0, &mut Vec::new(), 0),
            Search::Nothing));
    }

    #[test]
    fn naked_pair_is_found() {
        let mut grid = Grid::new(2, 2).unwrap();
        grid.define_standard_regions().unwrap();
        grid.set_cell_options(0, 0, digits(&[1, 2])).unwrap();
        grid.set_cell_options(0, 3, digits(&[1, 2])).unwrap();

        let mut technique = NakedSubsetTechnique::new(None);
        let found = run_once(&mut technique, &mut grid);
        let row = grid.regions_of_kind(RegionKind::Row)[0].id();

        assert!(found.contains(&Progress::NakedSubset {
            region: row,
            cells: vec![0, 3],
            values: digits(&[1, 2])
        }));

        let progress = found.iter()
            .find(|p| matches!(p, Progress::NakedSubset { .. }))
            .cloned()
            .unwrap();
        progress.apply(&mut grid);

        assert_eq!(digits(&[3, 4]), grid.options_get(0, 1).unwrap());
        assert_eq!(digits(&[3, 4]), grid.options_get(0, 2).unwrap());
        assert!(!grid.regions().is_leaf(row));
    }

    #[test]
    fn cells_sharing_a_single_option_are_fatal() {
        let mut grid = Grid::new(2, 2).unwrap();
        grid.define_standard_regions().unwrap();
        grid.set_cell_options(0, 0, DigitSet::singleton(1)).unwrap();
        grid.set_cell_options(0, 1, DigitSet::singleton(1)).unwrap();

        let mut technique = NakedSubsetTechnique::new(None);
        let found = run_once(&mut technique, &mut grid);
        let row = grid.regions_of_kind(RegionKind::Row)[0].id();

        assert!(found.contains(&Progress::TooFewValuesForRegion {
            region: row
        }));
    }

    #[test]
    fn hidden_pair_is_found() {
        let mut grid = Grid::new(2, 2).unwrap();
        grid.define_standard_regions().unwrap();

        // 1 and 2 can only go into the first two cells of the first row.
        grid.set_cell_options(0, 2, digits(&[3, 4])).unwrap();
        grid.set_cell_options(0, 3, digits(&[3, 4])).unwrap();

        let mut technique = HiddenSubsetTechnique::new(None);
        let found = run_once(&mut technique, &mut grid);
        let row = grid.regions_of_kind(RegionKind::Row)[0].id();

        assert!(found.iter().any(|p| matches!(p,
            Progress::HiddenSubset { region, cells, values }
                if *region == row && cells == &vec![0, 1] &&
                    *values == digits(&[1, 2]))));
    }

    #[test]
    fn cold_regions_are_skipped() {
        let mut grid = Grid::new(2, 2).unwrap();
        grid.define_standard_regions().unwrap();
        let mut technique = HiddenSubsetTechnique::new(None);
        run_once(&mut technique, &mut grid);

        for id in grid.regions().leaves() {
            assert!(!grid.updates.is_hot(id, TechniqueKind::HiddenSubset));
        }

        technique.reset();
        assert!(!technique.next_step(&mut grid));
        assert!(technique.has_finished());
    }
}
