//! This module contains the [RegionsManager], the arena owning all regions of
//! a grid along with the indices used to query them.

use crate::region::{Region, RegionId, RegionKind};
use crate::util::CellSet;

use std::collections::BTreeSet;

/// Owns every [Region] of a grid and keeps track of which of them are
/// starting regions and which are leaves of the partition tree. It also
/// maintains, for every cell, the leaves containing it, and for every cell
/// the set of its peers, i.e. the other cells sharing a starting region with
/// it.
#[derive(Clone, Debug)]
pub struct RegionsManager {
    cell_count: usize,
    regions: Vec<Region>,
    starting: Vec<RegionId>,
    leaves: BTreeSet<RegionId>,
    cell_leaves: Vec<Vec<RegionId>>,
    peers: Vec<CellSet>
}

impl RegionsManager {

    /// Creates a new manager without regions for a grid with the given
    /// number of cells.
    pub fn new(cell_count: usize) -> RegionsManager {
        RegionsManager {
            cell_count,
            regions: Vec::new(),
            starting: Vec::new(),
            leaves: BTreeSet::new(),
            cell_leaves: vec![Vec::new(); cell_count],
            peers: vec![CellSet::new(cell_count); cell_count]
        }
    }

    /// Gets the number of cells of the grid this manager belongs to.
    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    /// Gets the total number of regions in the arena, including internal
    /// nodes of the partition trees.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Indicates whether there are no regions at all.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Gets the region with the given id.
    ///
    /// # Panics
    ///
    /// If there is no region with the given id. Ids handed out by this
    /// manager are always valid.
    pub fn get(&self, id: RegionId) -> &Region {
        &self.regions[id]
    }

    pub(crate) fn get_mut(&mut self, id: RegionId) -> &mut Region {
        &mut self.regions[id]
    }

    /// Iterates over all regions of the arena in order of creation.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    /// Gets the ids of all starting regions in order of definition.
    pub fn starting(&self) -> &[RegionId] {
        &self.starting
    }

    /// Gets the ids of all starting regions of the given kind in order of
    /// definition.
    pub fn starting_of_kind(&self, kind: RegionKind) -> Vec<RegionId> {
        self.starting.iter()
            .cloned()
            .filter(|&id| self.regions[id].kind == kind)
            .collect()
    }

    /// Iterates over the ids of all leaf regions in ascending order.
    pub fn leaves(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.leaves.iter().cloned()
    }

    /// Indicates whether the region with the given id is a leaf.
    pub fn is_leaf(&self, id: RegionId) -> bool {
        self.leaves.contains(&id)
    }

    /// Gets the ids of the leaves containing the given cell.
    pub fn leaves_of_cell(&self, cell: usize) -> &[RegionId] {
        &self.cell_leaves[cell]
    }

    /// Gets the ids of all leaves which contain every one of the given cells.
    /// If `cells` is empty, the result is empty.
    pub fn leaves_containing_all(&self, cells: &[usize]) -> Vec<RegionId> {
        match cells.first() {
            Some(&first) => self.cell_leaves[first].iter()
                .cloned()
                .filter(|&id| {
                    let region = &self.regions[id];
                    cells.iter().all(|&c| region.contains(c))
                })
                .collect(),
            None => Vec::new()
        }
    }

    /// Finds a leaf consisting of exactly the given cells.
    pub fn find_leaf(&self, cells: &CellSet) -> Option<RegionId> {
        let first = cells.iter().next()?;

        self.cell_leaves[first].iter()
            .cloned()
            .find(|&id| &self.regions[id].cell_set == cells)
    }

    /// Gets the peers of a cell, i.e. all other cells sharing a starting
    /// region with it.
    pub fn peers(&self, cell: usize) -> &CellSet {
        &self.peers[cell]
    }

    /// Indicates whether two different cells share a starting region.
    pub fn sees(&self, a: usize, b: usize) -> bool {
        self.peers[a].contains(b)
    }

    /// Gets all cells that see every one of the given cells. None of the
    /// given cells is contained in the result. If `cells` is empty, the
    /// result is empty.
    pub fn cells_seeing_all<I>(&self, cells: I) -> CellSet
    where
        I: IntoIterator<Item = usize>
    {
        let mut iter = cells.into_iter();

        let mut result = match iter.next() {
            Some(first) => self.peers[first].clone(),
            None => return CellSet::new(self.cell_count)
        };

        for cell in iter {
            result.intersect_assign(&self.peers[cell]);
        }

        result
    }

    /// Adds a region to the arena as a new leaf and returns its id. The id
    /// stored in `region` is overwritten.
    pub(crate) fn push(&mut self, mut region: Region) -> RegionId {
        let id = self.regions.len();
        region.id = id;

        for &cell in region.cells.iter() {
            self.cell_leaves[cell].push(id);
        }

        self.leaves.insert(id);
        self.regions.push(region);
        id
    }

    /// Removes the most recently added region from the arena. Used when
    /// rolling back the journal; the leaf index must be rebuilt afterwards.
    pub(crate) fn pop(&mut self) {
        if let Some(region) = self.regions.pop() {
            self.leaves.remove(&region.id);
        }
    }

    /// Registers the region with the given id as a starting region and
    /// updates the peers of its cells.
    pub(crate) fn add_starting(&mut self, id: RegionId) {
        self.starting.push(id);
        let cells = self.regions[id].cells.clone();

        for &cell in cells.iter() {
            for &other in cells.iter() {
                if other != cell {
                    self.peers[cell].insert(other);
                }
            }
        }
    }

    /// Removes the most recently registered starting region. Peers are left
    /// untouched, which is only correct for regions whose cells were already
    /// peers of each other.
    pub(crate) fn pop_starting(&mut self) {
        self.starting.pop();
    }

    /// Removes the region with the given id from the set of leaves.
    pub(crate) fn retire_leaf(&mut self, id: RegionId) {
        if self.leaves.remove(&id) {
            for &cell in self.regions[id].cells.iter() {
                self.cell_leaves[cell].retain(|&l| l != id);
            }
        }
    }

    /// Recomputes the leaf set and the cell index from the children of all
    /// regions.
    pub(crate) fn rebuild_index(&mut self) {
        self.leaves.clear();

        for leaves in self.cell_leaves.iter_mut() {
            leaves.clear();
        }

        for region in self.regions.iter() {
            if region.children.is_none() {
                self.leaves.insert(region.id);

                for &cell in region.cells.iter() {
                    self.cell_leaves[cell].push(region.id);
                }
            }
        }
    }

    /// Removes all regions and peers.
    pub(crate) fn clear(&mut self) {
        *self = RegionsManager::new(self.cell_count);
    }
}
