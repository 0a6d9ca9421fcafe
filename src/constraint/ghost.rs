//! This module contains the [GhostCagesManager], which keeps track of the
//! cages that are not defined by the puzzle but derived from it.
//!
//! If the killer cages inside a house do not cover the whole house, the
//! remaining cells (the "innie") must add up to the house's total minus the
//! totals of the cages. Likewise, if the killer cages intersecting a house
//! cover it completely, the cells sticking out of the house (the "outie") must
//! add up to the cages' totals minus the house's total.
//!
//! A ghost cage whose cells all see each other behaves like an ordinary killer
//! cage, so it is turned into a region of kind
//! [Ghost](crate::region::RegionKind::Ghost) by the grid. All other ghost
//! cages are kept here as sum-only cages, which are pruned by searching for
//! assignments that respect the cells' options and the sum.

use crate::util::{CellSet, DigitSet};

use std::collections::BTreeSet;

/// The way in which a ghost cage was derived from a house.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GhostKind {

    /// The cells of a house which are not covered by the killer cages it
    /// contains.
    Innie,

    /// The cells outside a house which belong to the killer cages that
    /// together cover it.
    Outie
}

/// The result of deriving a ghost cage from a house, before it is
/// registered.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct GhostCage {

    /// The linear ids of the cells of the cage, in ascending order.
    pub cells: Vec<usize>,

    /// The total the digits of the cage must add up to. This may be zero or
    /// negative, in which case the cage is broken.
    pub total: i64,

    /// How the cage was derived.
    pub kind: GhostKind
}

impl GhostCage {

    /// Indicates whether this cage can never be satisfied by digits from 1 to
    /// `size`. This is a cheap check on the total and cell count only; it
    /// does not consider whether the cells see each other.
    pub fn is_broken(&self, size: usize) -> bool {
        let cells = self.cells.len() as i64;

        if cells == 0 {
            return self.total != 0;
        }

        // Without distinctness, every cell contributes between 1 and size.
        self.total < cells || self.total > cells * size as i64
    }
}

/// At most this many innies, and as many outies, are derived from a single
/// house.
pub const MAX_GHOSTS_PER_HOUSE: usize = 16;

fn innie_families(inside: &[&(CellSet, usize)], index: usize,
        covered: &CellSet, chosen: &mut Vec<usize>,
        families: &mut Vec<Vec<usize>>) {
    if families.len() >= MAX_GHOSTS_PER_HOUSE {
        return;
    }

    if index == inside.len() {
        let maximal = inside.iter()
            .enumerate()
            .all(|(i, (cells, _))|
                chosen.contains(&i) || !cells.is_disjoint(covered));

        if maximal && !chosen.is_empty() {
            families.push(chosen.clone());
        }

        return;
    }

    let (cells, _) = inside[index];

    if cells.is_disjoint(covered) {
        let mut with = covered.clone();
        with.union_assign(cells);
        chosen.push(index);
        innie_families(inside, index + 1, &with, chosen, families);
        chosen.pop();
    }

    innie_families(inside, index + 1, covered, chosen, families);
}

/// Computes the innies of a house: for every maximal family of pairwise
/// disjoint cages lying entirely within the house, the cells the family does
/// not cover. Returns an empty list if no cage lies within the house, and at
/// most [MAX_GHOSTS_PER_HOUSE] innies.
///
/// # Arguments
///
/// * `house`: The cells of the house.
/// * `house_total`: The sum of the digits of the house.
/// * `cages`: The cells and total of every killer cage of the puzzle.
pub fn derive_innies(house: &CellSet, house_total: usize,
        cages: &[(CellSet, usize)]) -> Vec<GhostCage> {
    let inside: Vec<&(CellSet, usize)> = cages.iter()
        .filter(|(cells, _)| cells.is_subset(house))
        .collect();
    let mut empty = house.clone();
    empty.clear();
    let mut families = Vec::new();
    innie_families(&inside, 0, &empty, &mut Vec::new(), &mut families);

    families.into_iter()
        .map(|family| {
            let mut covered = empty.clone();
            let mut total = house_total as i64;

            for &i in family.iter() {
                covered.union_assign(&inside[i].0);
                total -= inside[i].1 as i64;
            }

            GhostCage {
                cells: house.difference(&covered).iter().collect(),
                total,
                kind: GhostKind::Innie
            }
        })
        .collect()
}

fn outie_families(house: &CellSet, touching: &[&(CellSet, usize)],
        covered: &CellSet, chosen: &mut Vec<usize>,
        families: &mut Vec<Vec<usize>>) {
    if families.len() >= MAX_GHOSTS_PER_HOUSE {
        return;
    }

    let next = match house.difference(covered).iter().next() {
        Some(cell) => cell,
        None => {
            families.push(chosen.clone());
            return;
        }
    };

    for (i, (cells, _)) in touching.iter().enumerate() {
        if cells.contains(next) && cells.is_disjoint(covered) {
            let mut with = covered.clone();
            with.union_assign(cells);
            chosen.push(i);
            outie_families(house, touching, &with, chosen, families);
            chosen.pop();
        }
    }
}

/// Computes the outies of a house: for every family of pairwise disjoint
/// cages that intersect the house and together cover it, the cells of those
/// cages outside the house. Families lying entirely within the house yield
/// no outie. At most [MAX_GHOSTS_PER_HOUSE] outies are returned.
///
/// # Arguments
///
/// * `house`: The cells of the house.
/// * `house_total`: The sum of the digits of the house.
/// * `cages`: The cells and total of every killer cage of the puzzle.
pub fn derive_outies(house: &CellSet, house_total: usize,
        cages: &[(CellSet, usize)]) -> Vec<GhostCage> {
    let touching: Vec<&(CellSet, usize)> = cages.iter()
        .filter(|(cells, _)| !cells.is_disjoint(house))
        .collect();
    let mut empty = house.clone();
    empty.clear();
    let mut families = Vec::new();
    outie_families(house, &touching, &empty, &mut Vec::new(), &mut families);

    families.into_iter()
        .filter_map(|family| {
            let mut covered = empty.clone();
            let mut total = 0i64;

            for &i in family.iter() {
                covered.union_assign(&touching[i].0);
                total += touching[i].1 as i64;
            }

            let outside: Vec<usize> = covered.difference(house)
                .iter()
                .collect();

            if outside.is_empty() {
                return None;
            }

            Some(GhostCage {
                cells: outside,
                total: total - house_total as i64,
                kind: GhostKind::Outie
            })
        })
        .collect()
}

fn sum_placements_rec(options: &[DigitSet], sees: &[Vec<bool>],
        chosen: &mut Vec<usize>, remaining: i64, min_rest: &[i64],
        max_rest: &[i64], new_options: &mut Vec<DigitSet>) -> bool {
    let index = chosen.len();

    if index == options.len() {
        return remaining == 0;
    }

    if remaining < min_rest[index] || remaining > max_rest[index] {
        return false;
    }

    let mut result = false;

    for digit in options[index].iter() {
        let clashes = chosen.iter()
            .enumerate()
            .any(|(i, &d)| d == digit && sees[i][index]);

        if clashes {
            continue;
        }

        chosen.push(digit);

        if sum_placements_rec(options, sees, chosen, remaining - digit as i64,
                min_rest, max_rest, new_options) {
            new_options[index].insert(digit);
            result = true;
        }

        chosen.pop();
    }

    result
}

/// Finds all digits that can appear in each cell of a sum-only cage. Cells
/// that see each other (as given by `sees`) must contain different digits.
/// Returns `None` if there is no assignment at all.
pub fn sum_placements(options: &[DigitSet], sees: &[Vec<bool>], total: i64)
        -> Option<Vec<DigitSet>> {
    let len = options.len();
    let mut min_rest = vec![0i64; len + 1];
    let mut max_rest = vec![0i64; len + 1];

    for i in (0..len).rev() {
        min_rest[i] = min_rest[i + 1] + options[i].min().unwrap_or(0) as i64;
        max_rest[i] = max_rest[i + 1] + options[i].max().unwrap_or(0) as i64;
    }

    let mut new_options = vec![DigitSet::new(); len];
    let mut chosen = Vec::with_capacity(len);

    if sum_placements_rec(options, sees, &mut chosen, total, &min_rest,
            &max_rest, &mut new_options) {
        Some(new_options)
    }
    else {
        None
    }
}

/// A sum-only ghost cage registered with the [GhostCagesManager].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SumCage {

    /// The cells of the cage.
    pub cells: Vec<usize>,

    /// The cells of the cage as a set, for quick membership queries.
    pub cell_set: CellSet,

    /// The total the digits of the cage must add up to.
    pub total: i64,

    /// How the cage was derived.
    pub kind: GhostKind,

    /// Whether the options of a cell of this cage changed since it was last
    /// pruned.
    pub dirty: bool
}

/// Keeps track of all derived ghost cages of a grid. The cell sets of all
/// ghosts that were registered, as region or as sum-only cage, are
/// remembered, so every ghost is derived only once.
#[derive(Clone, Debug, Default)]
pub struct GhostCagesManager {
    known: BTreeSet<Vec<usize>>,
    sum_cages: Vec<SumCage>,
    scanned_houses: usize
}

impl GhostCagesManager {

    /// Creates a new manager without any ghost cages.
    pub fn new() -> GhostCagesManager {
        GhostCagesManager::default()
    }

    /// Indicates whether a ghost cage with exactly these cells has already
    /// been registered.
    pub fn is_known(&self, cells: &[usize]) -> bool {
        self.known.contains(cells)
    }

    /// Remembers the cells of a ghost cage that was turned into a region.
    /// Returns `false` if it was already known.
    pub fn register_region(&mut self, cells: &[usize]) -> bool {
        self.known.insert(cells.to_vec())
    }

    /// Registers a sum-only ghost cage. Returns `false` if a ghost with the
    /// same cells was already known.
    pub fn register_sum_cage(&mut self, cells: Vec<usize>, total: i64,
            kind: GhostKind, cell_count: usize) -> bool {
        if !self.known.insert(cells.clone()) {
            return false;
        }

        let cell_set = CellSet::from_cells(cell_count, cells.iter().cloned());
        self.sum_cages.push(SumCage {
            cells,
            cell_set,
            total,
            kind,
            dirty: true
        });
        true
    }

    /// Gets all sum-only ghost cages.
    pub fn sum_cages(&self) -> &[SumCage] {
        &self.sum_cages
    }

    /// Marks every sum-only cage containing the given cell as dirty.
    pub fn cell_changed(&mut self, cell: usize) {
        for cage in self.sum_cages.iter_mut() {
            if cage.cell_set.contains(cell) {
                cage.dirty = true;
            }
        }
    }

    /// Marks every sum-only cage as dirty.
    pub fn mark_all_dirty(&mut self) {
        for cage in self.sum_cages.iter_mut() {
            cage.dirty = true;
        }
    }

    /// Clears the dirty flag of the sum-only cage with the given index and
    /// returns whether it was set.
    pub fn take_dirty(&mut self, index: usize) -> bool {
        match self.sum_cages.get_mut(index) {
            Some(cage) => {
                let dirty = cage.dirty;
                cage.dirty = false;
                dirty
            },
            None => false
        }
    }

    /// Gets the number of houses that have already been scanned for innies
    /// and outies.
    pub fn scanned_houses(&self) -> usize {
        self.scanned_houses
    }

    /// Records that another house has been scanned.
    pub fn house_scanned(&mut self) {
        self.scanned_houses += 1;
    }

    /// Makes every house subject to scanning again, e.g. after a killer cage
    /// was added. Ghosts that are already known are not derived twice.
    pub fn rescan_houses(&mut self) {
        self.scanned_houses = 0;
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn cells(v: &[usize]) -> CellSet {
        CellSet::from_cells(16, v.iter().cloned())
    }

    fn digits(v: &[usize]) -> DigitSet {
        v.iter().cloned().collect()
    }

    #[test]
    fn innie_of_row_with_one_cage() {
        let row = cells(&[0, 1, 2, 3]);
        let cages = vec![(cells(&[0, 1]), 3), (cells(&[5, 6]), 7)];
        let innies = derive_innies(&row, 10, &cages);
        assert_eq!(1, innies.len());
        let innie = &innies[0];

        assert_eq!(vec![2, 3], innie.cells);
        assert_eq!(7, innie.total);
        assert_eq!(GhostKind::Innie, innie.kind);
        assert!(!innie.is_broken(4));
    }

    #[test]
    fn no_innie_without_contained_cage() {
        let row = cells(&[0, 1, 2, 3]);
        let cages = vec![(cells(&[3, 7]), 3)];
        assert!(derive_innies(&row, 10, &cages).is_empty());
    }

    #[test]
    fn outie_of_covered_row() {
        let row = cells(&[0, 1, 2, 3]);
        let cages = vec![(cells(&[0, 1, 4]), 7), (cells(&[2, 3]), 7)];
        let outies = derive_outies(&row, 10, &cages);
        assert_eq!(1, outies.len());
        let outie = &outies[0];

        assert_eq!(vec![4], outie.cells);
        assert_eq!(4, outie.total);
        assert_eq!(GhostKind::Outie, outie.kind);
    }

    #[test]
    fn overlapping_cages_yield_every_innie() {
        let row = cells(&[0, 1, 2, 3]);

        // The second cage overlaps both others, so it forms a family of its
        // own.
        let cages = vec![
            (cells(&[0, 1]), 3),
            (cells(&[1, 2]), 5),
            (cells(&[3]), 4)
        ];
        let mut innies: Vec<(Vec<usize>, i64)> =
            derive_innies(&row, 10, &cages).into_iter()
            .map(|g| (g.cells, g.total))
            .collect();
        innies.sort();

        assert_eq!(vec![(vec![0], 1), (vec![2], 3)], innies);
    }

    #[test]
    fn overlapping_cages_yield_every_outie() {
        let row = cells(&[0, 1, 2, 3]);
        let cages = vec![
            (cells(&[0, 1, 4]), 7),
            (cells(&[0, 1, 5]), 8),
            (cells(&[2, 3]), 7)
        ];
        let mut outies: Vec<(Vec<usize>, i64)> =
            derive_outies(&row, 10, &cages).into_iter()
            .map(|g| (g.cells, g.total))
            .collect();
        outies.sort();

        assert_eq!(vec![(vec![4], 4), (vec![5], 5)], outies);
    }

    #[test]
    fn cages_within_house_yield_no_outie() {
        let row = cells(&[0, 1, 2, 3]);
        let cages = vec![(cells(&[0, 1]), 3), (cells(&[2, 3]), 7)];

        assert!(derive_outies(&row, 10, &cages).is_empty());
    }

    #[test]
    fn broken_totals_are_detected() {
        let cage = GhostCage {
            cells: vec![4],
            total: 0,
            kind: GhostKind::Outie
        };
        assert!(cage.is_broken(4));

        let cage = GhostCage {
            cells: vec![],
            total: 1,
            kind: GhostKind::Innie
        };
        assert!(cage.is_broken(4));
    }

    #[test]
    fn sum_placements_respect_distinctness_of_peers() {
        let options = vec![digits(&[1, 2, 3]), digits(&[1, 2, 3])];

        // Peers: 2 = 1 + 1 is impossible.
        let sees = vec![vec![false, true], vec![true, false]];
        assert!(sum_placements(&options, &sees, 2).is_none());

        // Non-peers may repeat digits.
        let sees = vec![vec![false, false], vec![false, false]];
        assert_eq!(Some(vec![digits(&[1]), digits(&[1])]),
            sum_placements(&options, &sees, 2));
    }

    #[test]
    fn sum_placements_restrict_options() {
        let options = vec![digits(&[1, 4]), digits(&[2, 3]), digits(&[1])];
        let sees = vec![vec![false; 3]; 3];
        let result = sum_placements(&options, &sees, 7).unwrap();

        assert_eq!(vec![digits(&[4]), digits(&[2]), digits(&[1])], result);
    }

    #[test]
    fn manager_remembers_ghosts() {
        let mut manager = GhostCagesManager::new();
        assert!(manager.register_sum_cage(vec![1, 6], 5,
            GhostKind::Outie, 16));
        assert!(!manager.register_sum_cage(vec![1, 6], 5,
            GhostKind::Outie, 16));
        assert!(manager.is_known(&[1, 6]));
        assert!(manager.take_dirty(0));
        assert!(!manager.take_dirty(0));

        manager.cell_changed(6);
        assert!(manager.take_dirty(0));
        assert!(manager.register_region(&[2, 3]));
        assert!(!manager.register_region(&[2, 3]));
    }
}
